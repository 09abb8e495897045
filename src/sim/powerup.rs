//! Power-ups: weighted spawning, lifetime and pickup

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Absorbs one obstacle hit
    Shield,
    /// Forces slow motion on, ignoring the skill cooldown
    Slow,
    /// Halves the hitbox
    Shrink,
    /// Aura that pushes nearby obstacles away (it repels, despite the name)
    Magnet,
    /// Display only
    TimeBonus,
}

impl PowerupKind {
    /// Spawn weights in selection order (sum 100)
    pub const SPAWN_WEIGHTS: [(PowerupKind, u32); 5] = [
        (PowerupKind::TimeBonus, 35),
        (PowerupKind::Shrink, 25),
        (PowerupKind::Slow, 20),
        (PowerupKind::Shield, 12),
        (PowerupKind::Magnet, 8),
    ];

    pub fn name(self) -> &'static str {
        match self {
            PowerupKind::Shield => "Shield",
            PowerupKind::Slow => "Slow",
            PowerupKind::Shrink => "Shrink",
            PowerupKind::Magnet => "Magnet",
            PowerupKind::TimeBonus => "+10s",
        }
    }

    /// Pick a kind from the weight table given a roll in `[0, total)`
    pub fn from_roll(roll: f32) -> Self {
        let mut remaining = roll;
        for (kind, weight) in Self::SPAWN_WEIGHTS {
            remaining -= weight as f32;
            if remaining <= 0.0 {
                return kind;
            }
        }
        PowerupKind::TimeBonus
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let total: u32 = Self::SPAWN_WEIGHTS.iter().map(|(_, w)| w).sum();
        Self::from_roll(rng.random::<f32>() * total as f32)
    }
}

/// A collectible on the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Powerup {
    pub kind: PowerupKind,
    pub pos: Vec2,
    pub radius: f32,
    pub alive: bool,
    pub age: f32,
    pub lifetime: f32,
    /// Cosmetic pulse animation phase
    pub pulse_phase: f32,
}

impl Powerup {
    pub fn new(kind: PowerupKind, pos: Vec2) -> Self {
        Self {
            kind,
            pos,
            radius: POWERUP_RADIUS,
            alive: true,
            age: 0.0,
            lifetime: POWERUP_LIFETIME_MS,
            pulse_phase: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.age += dt;
        self.pulse_phase += 0.1;
        if self.age >= self.lifetime {
            self.alive = false;
        }
    }

    /// Last two seconds before expiry, for render blinking
    pub fn is_expiring(&self) -> bool {
        self.lifetime - self.age < 2000.0
    }
}

/// Owns the live power-up set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerupManager {
    pub powerups: Vec<Powerup>,
    pub spawn_timer: f32,
}

impl PowerupManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a random power-up inside the margin, away from the player when
    /// possible (best effort).
    pub fn spawn<R: Rng>(&mut self, bounds: Vec2, player_pos: Vec2, rng: &mut R) {
        let span = (bounds - Vec2::splat(POWERUP_EDGE_MARGIN * 2.0)).max(Vec2::ZERO);
        let mut pos = Vec2::ZERO;
        for _ in 0..POWERUP_PLACEMENT_ATTEMPTS {
            pos = Vec2::new(rng.random::<f32>(), rng.random::<f32>()) * span
                + Vec2::splat(POWERUP_EDGE_MARGIN);
            if pos.distance(player_pos) >= POWERUP_PLAYER_CLEARANCE {
                break;
            }
        }

        let mut powerup = Powerup::new(PowerupKind::random(rng), pos);
        powerup.pulse_phase = rng.random::<f32>() * std::f32::consts::TAU;
        self.powerups.push(powerup);
    }

    /// Advance the spawn timer (unscaled time) and age every power-up
    pub fn update<R: Rng>(&mut self, dt: f32, bounds: Vec2, player_pos: Vec2, rng: &mut R) {
        self.spawn_timer += dt;
        if self.spawn_timer >= POWERUP_SPAWN_INTERVAL_MS && self.powerups.len() < MAX_POWERUPS {
            self.spawn_timer = 0.0;
            self.spawn(bounds, player_pos, rng);
        }

        for powerup in &mut self.powerups {
            powerup.update(dt);
        }
        self.powerups.retain(|p| p.alive);
    }

    /// Remove and return the first power-up touching the player.
    ///
    /// Scans newest first, so the most recent spawn wins an overlap.
    pub fn take_colliding(&mut self, player_pos: Vec2, player_radius: f32) -> Option<Powerup> {
        let index = self
            .powerups
            .iter()
            .rposition(|p| p.pos.distance(player_pos) < p.radius + player_radius)?;
        Some(self.powerups.remove(index))
    }

    pub fn clear(&mut self) {
        self.powerups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const BOUNDS: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn test_weight_table_boundaries() {
        assert_eq!(PowerupKind::from_roll(0.0), PowerupKind::TimeBonus);
        assert_eq!(PowerupKind::from_roll(35.0), PowerupKind::TimeBonus);
        assert_eq!(PowerupKind::from_roll(35.5), PowerupKind::Shrink);
        assert_eq!(PowerupKind::from_roll(60.5), PowerupKind::Slow);
        assert_eq!(PowerupKind::from_roll(80.5), PowerupKind::Shield);
        assert_eq!(PowerupKind::from_roll(92.5), PowerupKind::Magnet);
        assert_eq!(PowerupKind::from_roll(99.99), PowerupKind::Magnet);
    }

    #[test]
    fn test_weighted_distribution_is_roughly_right() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut magnets = 0;
        let mut bonuses = 0;
        for _ in 0..10_000 {
            match PowerupKind::random(&mut rng) {
                PowerupKind::Magnet => magnets += 1,
                PowerupKind::TimeBonus => bonuses += 1,
                _ => {}
            }
        }
        assert!((600..1000).contains(&magnets));
        assert!((3100..3900).contains(&bonuses));
    }

    #[test]
    fn test_spawn_avoids_player() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut manager = PowerupManager::new();
        let player = Vec2::new(400.0, 300.0);
        for _ in 0..30 {
            manager.spawn(BOUNDS, player, &mut rng);
        }
        for p in &manager.powerups {
            assert!(p.pos.x >= 50.0 && p.pos.x <= 750.0);
            assert!(p.pos.y >= 50.0 && p.pos.y <= 550.0);
        }
        let near = manager
            .powerups
            .iter()
            .filter(|p| p.pos.distance(player) < POWERUP_PLAYER_CLEARANCE)
            .count();
        assert!(near <= 1);
    }

    #[test]
    fn test_concurrency_cap_and_expiry() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut manager = PowerupManager::new();
        let player = Vec2::new(400.0, 300.0);
        // 4 spawn intervals of time in 50ms frames
        for _ in 0..400 {
            manager.update(50.0, BOUNDS, player, &mut rng);
            assert!(manager.powerups.len() <= MAX_POWERUPS);
            assert!(manager.powerups.iter().all(|p| p.age < POWERUP_LIFETIME_MS));
        }
    }

    #[test]
    fn test_take_colliding_prefers_newest() {
        let mut manager = PowerupManager::new();
        manager.powerups.push(Powerup::new(PowerupKind::Shield, Vec2::new(10.0, 0.0)));
        manager.powerups.push(Powerup::new(PowerupKind::Magnet, Vec2::new(-10.0, 0.0)));
        let taken = manager.take_colliding(Vec2::ZERO, 15.0);
        assert_eq!(taken.map(|p| p.kind), Some(PowerupKind::Magnet));
        assert_eq!(manager.powerups.len(), 1);
        assert!(manager.take_colliding(Vec2::new(500.0, 500.0), 15.0).is_none());
    }
}
