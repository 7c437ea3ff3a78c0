//! # Trajectory Validation Test Suite
//!
//! Unified test crate exercising the engine through its public API only.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs      # Peers sharing one gravity field, event delivery
//!     └── byzantine.rs  # Lying validators, shuffled vote delivery
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p tv-tests
//!
//! # By category
//! cargo test -p tv-tests integration::flows
//! cargo test -p tv-tests integration::byzantine
//!
//! # Benchmarks
//! cargo bench -p tv-tests
//! ```

pub mod integration;
