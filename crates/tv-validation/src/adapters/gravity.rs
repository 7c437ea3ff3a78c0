//! Gravity model adapters
//!
//! Stand-ins for the host's orbital solver. Both keep their bodies in a
//! generational arena: despawning bumps the slot generation, so handles the
//! engine still holds go stale and lookups through them return `None`.

use crate::domain::{BodyHandle, Vec3};
use crate::ports::GravityModel;
use parking_lot::RwLock;

/// Newtonian gravitational constant (m³ kg⁻¹ s⁻²)
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_30e-11;

/// Softening length keeping close encounters finite (m)
pub const DEFAULT_SOFTENING: f64 = 1.0;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational slot arena
pub struct BodyArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> BodyArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> BodyHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return BodyHandle::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        BodyHandle::new(index, 0)
    }

    pub fn remove(&mut self, handle: BodyHandle) -> Option<T> {
        let slot = self.slot_mut(handle)?;
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        value
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut T> {
        self.slot_mut(handle).and_then(|slot| slot.value.as_mut())
    }

    fn slot_mut(&mut self, handle: BodyHandle) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation() && slot.value.is_some())
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (BodyHandle::new(index as u32, slot.generation), value))
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for BodyArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Same acceleration everywhere, for every live body
pub struct UniformGravity {
    acceleration: Vec3,
    bodies: RwLock<BodyArena<()>>,
}

impl UniformGravity {
    pub fn new(acceleration: Vec3) -> Self {
        Self {
            acceleration,
            bodies: RwLock::new(BodyArena::new()),
        }
    }

    /// Surface gravity pointing down the z axis
    pub fn earth() -> Self {
        Self::new(Vec3::new(0.0, 0.0, -9.8))
    }

    pub fn spawn_body(&self) -> BodyHandle {
        self.bodies.write().insert(())
    }

    pub fn despawn_body(&self, handle: BodyHandle) -> bool {
        self.bodies.write().remove(handle).is_some()
    }
}

impl GravityModel for UniformGravity {
    fn acceleration_at(&self, body: BodyHandle, _position: &Vec3) -> Option<Vec3> {
        self.bodies.read().get(body).map(|_| self.acceleration)
    }

    fn is_live(&self, body: BodyHandle) -> bool {
        self.bodies.read().get(body).is_some()
    }
}

/// One massive body in a `PointMassField`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointMass {
    pub mass: f64,
    pub position: Vec3,
}

/// Newtonian field summed over every other body in the arena
///
/// Players and planets live in the same arena. The body asking is excluded
/// from its own field.
pub struct PointMassField {
    bodies: RwLock<BodyArena<PointMass>>,
    softening: f64,
}

impl PointMassField {
    pub fn new() -> Self {
        Self::with_softening(DEFAULT_SOFTENING)
    }

    pub fn with_softening(softening: f64) -> Self {
        Self {
            bodies: RwLock::new(BodyArena::new()),
            softening: softening.abs(),
        }
    }

    pub fn spawn_body(&self, mass: f64, position: Vec3) -> BodyHandle {
        self.bodies.write().insert(PointMass { mass, position })
    }

    pub fn despawn_body(&self, handle: BodyHandle) -> bool {
        self.bodies.write().remove(handle).is_some()
    }

    /// Host-side position update after its own integration step
    pub fn move_body(&self, handle: BodyHandle, position: Vec3) -> bool {
        match self.bodies.write().get_mut(handle) {
            Some(body) => {
                body.position = position;
                true
            }
            None => false,
        }
    }

    pub fn body(&self, handle: BodyHandle) -> Option<PointMass> {
        self.bodies.read().get(handle).copied()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.read().len()
    }
}

impl Default for PointMassField {
    fn default() -> Self {
        Self::new()
    }
}

impl GravityModel for PointMassField {
    fn acceleration_at(&self, body: BodyHandle, position: &Vec3) -> Option<Vec3> {
        let bodies = self.bodies.read();
        bodies.get(body)?;

        let eps2 = self.softening * self.softening;
        let acceleration = bodies
            .iter()
            .filter(|(handle, _)| *handle != body)
            .fold(Vec3::zeros(), |acc, (_, source)| {
                let offset = source.position - position;
                let dist2 = offset.norm_squared() + eps2;
                if dist2 == 0.0 {
                    return acc;
                }
                acc + offset * (GRAVITATIONAL_CONSTANT * source.mass / (dist2 * dist2.sqrt()))
            });
        Some(acceleration)
    }

    fn is_live(&self, body: BodyHandle) -> bool {
        self.bodies.read().get(body).is_some()
    }
}
