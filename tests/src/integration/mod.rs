//! Cross-component scenarios
//!
//! Every test here builds real engines over real gravity adapters. Nothing is
//! mocked except the clock.

pub mod byzantine;
pub mod flows;
