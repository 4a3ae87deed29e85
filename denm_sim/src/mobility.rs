//! Ground-truth mobility for the simulated road.
//!
//! Positions are closed-form (constant velocity from spawn, frozen once a
//! stop effect hits), so the event loop can ask "where is station X at
//! time t" without stepping physics between events.

use crate::error::SimError;
use denm_env::{Position, SimTime, StationId};
use nalgebra::Vector2;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;

/// A moving (or static) body on the map.
#[derive(Debug, Clone)]
pub struct MobileEntity {
    /// Position at t = 0
    pub origin: Position,
    
    /// Velocity in m/s
    pub velocity: Vector2<f64>,
    
    /// When a stop effect froze this entity
    pub stopped_at: Option<SimTime>,
}

impl MobileEntity {
    /// Position at `time`.
    pub fn position_at(&self, time: SimTime) -> Position {
        let t = match self.stopped_at {
            Some(stop) if stop < time => stop,
            _ => time,
        };
        self.origin + self.velocity * t.as_secs_f64()
    }
}

/// Mobility model for every station in the world.
pub struct Mobility {
    /// RNG for speed sampling (separate stream from the relays)
    rng: ChaCha8Rng,
    
    /// Vehicle speed distribution
    speed: Normal<f64>,
    
    entities: HashMap<StationId, MobileEntity>,
}

impl Mobility {
    /// Creates a mobility model with normally distributed vehicle speeds.
    pub fn new(rng: ChaCha8Rng, mean_speed_mps: f64, speed_std_mps: f64) -> Result<Self, SimError> {
        let speed = Normal::new(mean_speed_mps, speed_std_mps).map_err(|e| {
            SimError::InvalidParameter(format!("speed distribution: {}", e))
        })?;
        
        Ok(Self {
            rng,
            speed,
            entities: HashMap::new(),
        })
    }
    
    /// Spawns a vehicle driving along +x with a sampled speed (never
    /// negative).
    pub fn spawn_vehicle(&mut self, id: StationId, origin: Position) -> f64 {
        let speed = self.speed.sample(&mut self.rng).max(0.0);
        self.entities.insert(
            id,
            MobileEntity {
                origin,
                velocity: Vector2::new(speed, 0.0),
                stopped_at: None,
            },
        );
        speed
    }
    
    /// Places a static body (antenna, ground station).
    pub fn spawn_static(&mut self, id: StationId, position: Position) {
        self.entities.insert(
            id,
            MobileEntity {
                origin: position,
                velocity: Vector2::zeros(),
                stopped_at: None,
            },
        );
    }
    
    /// Freezes an entity in place from `at` on. The first stop wins.
    pub fn stop(&mut self, id: StationId, at: SimTime) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) if entity.stopped_at.is_none() => {
                entity.stopped_at = Some(at);
                true
            }
            _ => false,
        }
    }
    
    /// Position of `id` at `time`.
    pub fn position(&self, id: StationId, time: SimTime) -> Option<Position> {
        self.entities.get(&id).map(|e| e.position_at(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    
    fn mobility(seed: u64) -> Mobility {
        Mobility::new(ChaCha8Rng::seed_from_u64(seed), 25.0, 3.0).unwrap()
    }
    
    #[test]
    fn test_constant_velocity() {
        let mut m = mobility(42);
        let id = StationId::from_seed(1);
        let speed = m.spawn_vehicle(id, Position::new(100.0, 0.0));
        
        let p = m.position(id, SimTime::from_secs_f64(2.0)).unwrap();
        assert!((p.x - (100.0 + 2.0 * speed)).abs() < 1e-9);
        assert_eq!(p.y, 0.0);
    }
    
    #[test]
    fn test_stop_freezes_position() {
        let mut m = mobility(42);
        let id = StationId::from_seed(1);
        m.spawn_vehicle(id, Position::zeros());
        
        assert!(m.stop(id, SimTime::from_secs_f64(10.0)));
        assert!(!m.stop(id, SimTime::from_secs_f64(20.0)));
        
        let at_stop = m.position(id, SimTime::from_secs_f64(10.0)).unwrap();
        let later = m.position(id, SimTime::from_secs_f64(50.0)).unwrap();
        assert_eq!(at_stop, later);
        
        let before = m.position(id, SimTime::from_secs_f64(5.0)).unwrap();
        assert!(before.x < at_stop.x);
    }
    
    #[test]
    fn test_static_body_never_moves() {
        let mut m = mobility(1);
        let id = StationId::from_seed(9);
        m.spawn_static(id, Position::new(5.0, 30.0));
        
        assert_eq!(m.position(id, SimTime::from_secs_f64(1000.0)), Some(Position::new(5.0, 30.0)));
        assert_eq!(m.position(StationId::from_seed(10), SimTime::ZERO), None);
    }
    
    #[test]
    fn test_deterministic_speeds() {
        let mut m1 = mobility(42);
        let mut m2 = mobility(42);
        
        let s1: Vec<f64> = (0..5).map(|i| m1.spawn_vehicle(StationId::from_seed(i), Position::zeros())).collect();
        let s2: Vec<f64> = (0..5).map(|i| m2.spawn_vehicle(StationId::from_seed(i), Position::zeros())).collect();
        
        // Same seed = same speeds
        assert_eq!(s1, s2);
        assert!(s1.iter().all(|&s| s >= 0.0));
    }
    
    #[test]
    fn test_invalid_distribution_rejected() {
        assert!(Mobility::new(ChaCha8Rng::seed_from_u64(0), 25.0, -1.0).is_err());
    }
}
