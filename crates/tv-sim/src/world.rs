//! Shared physical world
//!
//! One small planet and a ring of ships in circular orbit. Ships are
//! integrated here (velocity Verlet over the same `PointMassField` the
//! engines query), which stands in for the host game's physics.

use std::f64::consts::TAU;
use std::sync::Arc;

use tv_validation::{
    BodyHandle, GravityModel, PlayerId, PointMassField, PositionReport, Vec3,
    GRAVITATIONAL_CONSTANT,
};

/// Planet mass (kg), small enough for game-scale orbital speeds
pub const PLANET_MASS: f64 = 1.0e20;

/// Radius of the innermost orbit (m)
pub const ORBIT_RADIUS: f64 = 100_000.0;

/// Spacing between successive ship orbits (m)
pub const ORBIT_SPACING: f64 = 500.0;

/// Thrust honest pilots use for manoeuvres (N)
pub const MANOEUVRE_THRUST: f64 = 20_000.0;

#[derive(Debug, Clone)]
pub struct Ship {
    pub player_id: PlayerId,
    pub body: BodyHandle,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Thrust applied during the current tick
    pub thrust: Vec3,
    pub sequence: u64,
    pub active: bool,
}

impl Ship {
    fn report(&mut self, timestamp: f64) -> PositionReport {
        let report = PositionReport::new(
            self.player_id,
            self.sequence,
            timestamp,
            self.position,
            self.velocity,
        )
        .with_thrust(self.thrust);
        self.sequence += 1;
        report
    }
}

pub struct World {
    field: Arc<PointMassField>,
    planet: BodyHandle,
    ships: Vec<Ship>,
    ship_mass: f64,
    time: f64,
}

impl World {
    /// Planet at the origin, ships `1..=ship_count` evenly spaced in the xy plane
    pub fn new(ship_count: u64, ship_mass: f64) -> Self {
        let field = Arc::new(PointMassField::new());
        let planet = field.spawn_body(PLANET_MASS, Vec3::zeros());
        let mu = GRAVITATIONAL_CONSTANT * PLANET_MASS;

        let ships = (1..=ship_count)
            .map(|id| {
                let angle = TAU * (id - 1) as f64 / ship_count as f64;
                let radius = ORBIT_RADIUS + ORBIT_SPACING * (id - 1) as f64;
                let radial = Vec3::new(angle.cos(), angle.sin(), 0.0);
                let tangent = Vec3::new(-angle.sin(), angle.cos(), 0.0);
                let position = radial * radius;

                Ship {
                    player_id: PlayerId(id),
                    body: field.spawn_body(ship_mass, position),
                    position,
                    velocity: tangent * (mu / radius).sqrt(),
                    thrust: Vec3::zeros(),
                    sequence: 0,
                    active: true,
                }
            })
            .collect();

        Self {
            field,
            planet,
            ships,
            ship_mass,
            time: 0.0,
        }
    }

    pub fn field(&self) -> &Arc<PointMassField> {
        &self.field
    }

    pub fn planet(&self) -> BodyHandle {
        self.planet
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship_mut(&mut self, player_id: PlayerId) -> Option<&mut Ship> {
        self.ships.iter_mut().find(|s| s.player_id == player_id)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Honest pilot schedule: a short prograde burn every eight ticks
    pub fn plan_manoeuvres(&mut self, tick: u64) {
        for ship in self.ships.iter_mut().filter(|s| s.active) {
            let burning = (tick + ship.player_id.as_u64()) % 8 < 2;
            ship.thrust = match ship.velocity.try_normalize(1e-9) {
                Some(prograde) if burning => prograde * MANOEUVRE_THRUST,
                _ => Vec3::zeros(),
            };
        }
    }

    /// Advance every active ship by `dt`
    pub fn step(&mut self, dt: f64, substeps: u32) {
        let substeps = substeps.max(1);
        let h = dt / substeps as f64;
        let field = &self.field;
        let mass = self.ship_mass;

        for ship in self.ships.iter_mut().filter(|s| s.active) {
            let body = ship.body;
            let thrust_accel = ship.thrust / mass;
            let accel_at = |position: &Vec3| {
                field
                    .acceleration_at(body, position)
                    .unwrap_or_else(Vec3::zeros)
                    + thrust_accel
            };

            let mut accel = accel_at(&ship.position);
            for _ in 0..substeps {
                let position = ship.position + ship.velocity * h + accel * (0.5 * h * h);
                let next_accel = accel_at(&position);
                ship.velocity += (accel + next_accel) * (0.5 * h);
                ship.position = position;
                accel = next_accel;
            }
            field.move_body(body, ship.position);
        }

        self.time += dt;
    }

    /// Jump a ship forward along its velocity without any thrust to show for it
    pub fn teleport(&mut self, player_id: PlayerId, distance: f64) -> bool {
        let field = Arc::clone(&self.field);
        match self.ship_mut(player_id) {
            Some(ship) if ship.active => {
                let heading = ship.velocity.try_normalize(1e-9).unwrap_or_else(Vec3::x);
                ship.position += heading * distance;
                field.move_body(ship.body, ship.position)
            }
            _ => false,
        }
    }

    /// Remove a ship from the world
    pub fn despawn(&mut self, player_id: PlayerId) -> bool {
        let field = Arc::clone(&self.field);
        match self.ship_mut(player_id) {
            Some(ship) if ship.active => {
                ship.active = false;
                field.despawn_body(ship.body)
            }
            _ => false,
        }
    }

    /// Current reports of every active ship
    pub fn reports(&mut self) -> Vec<PositionReport> {
        let time = self.time;
        self.ships
            .iter_mut()
            .filter(|s| s.active)
            .map(|s| s.report(time))
            .collect()
    }
}
