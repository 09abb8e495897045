//! Obstacle field: difficulty curve, spawn policy and collection lifecycle

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::obstacle::{Obstacle, ObstacleKind};
use crate::consts::*;

/// Difficulty derived from elapsed play time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Difficulty {
    /// Speed multiplier applied to newly spawned obstacles
    pub multiplier: f32,
    /// Milliseconds between regular spawn batches
    pub spawn_interval: f64,
    /// Kinds in the spawn pool, in unlock order. Only grows.
    pub unlocked: Vec<ObstacleKind>,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            spawn_interval: BASE_SPAWN_INTERVAL_MS,
            unlocked: vec![ObstacleKind::Normal],
        }
    }
}

impl Difficulty {
    pub fn multiplier_at(elapsed_ms: f64) -> f32 {
        (1.0 + elapsed_ms / DIFFICULTY_RAMP_MS) as f32
    }

    pub fn spawn_interval_at(elapsed_ms: f64) -> f64 {
        (BASE_SPAWN_INTERVAL_MS - elapsed_ms / SPAWN_INTERVAL_DIVISOR).max(MIN_SPAWN_INTERVAL_MS)
    }

    pub fn update(&mut self, elapsed_ms: f64) {
        self.multiplier = Self::multiplier_at(elapsed_ms);
        self.spawn_interval = Self::spawn_interval_at(elapsed_ms);

        for kind in ObstacleKind::ALL {
            if elapsed_ms >= kind.unlock_ms() && !self.unlocked.contains(&kind) {
                log::info!("Obstacle type unlocked: {}", kind.as_str());
                self.unlocked.push(kind);
            }
        }
    }

    pub fn is_unlocked(&self, kind: ObstacleKind) -> bool {
        self.unlocked.contains(&kind)
    }

    /// Obstacles per spawn batch: 1..=3, growing with the multiplier
    pub fn batch_size(&self) -> u32 {
        (self.multiplier.floor() as u32).clamp(1, MAX_SPAWN_BATCH)
    }
}

/// Owns the live obstacle set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleManager {
    pub obstacles: Vec<Obstacle>,
    pub spawn_timer: f64,
    pub difficulty: Difficulty,
}

impl ObstacleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_difficulty(&mut self, elapsed_ms: f64) {
        self.difficulty.update(elapsed_ms);
    }

    /// Spawn one obstacle of a random unlocked kind just outside a random
    /// edge, aimed near the player and scaled by the current multiplier.
    ///
    /// Returns whether the spawn should be audible (sampled).
    pub fn spawn<R: Rng>(&mut self, bounds: Vec2, player_pos: Vec2, rng: &mut R) -> bool {
        let unlocked = &self.difficulty.unlocked;
        let kind = unlocked[rng.random_range(0..unlocked.len())];

        let pos = match rng.random_range(0..4) {
            0 => Vec2::new(rng.random::<f32>() * bounds.x, -OBSTACLE_SPAWN_OFFSET),
            1 => Vec2::new(bounds.x + OBSTACLE_SPAWN_OFFSET, rng.random::<f32>() * bounds.y),
            2 => Vec2::new(rng.random::<f32>() * bounds.x, bounds.y + OBSTACLE_SPAWN_OFFSET),
            _ => Vec2::new(-OBSTACLE_SPAWN_OFFSET, rng.random::<f32>() * bounds.y),
        };

        let mut obstacle = Obstacle::new(kind, pos);
        let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5)
            * OBSTACLE_AIM_JITTER;
        obstacle.aim_at(player_pos + jitter);
        obstacle.scale_speed(self.difficulty.multiplier);
        self.obstacles.push(obstacle);

        rng.random::<f32>() < SPAWN_SOUND_CHANCE
    }

    /// Ring of normal obstacles around the player, all converging on it at
    /// reduced speed. Not scaled by difficulty.
    pub fn spawn_surround(&mut self, player_pos: Vec2, count: usize) {
        for i in 0..count {
            let angle = std::f32::consts::TAU / count as f32 * i as f32;
            let pos = player_pos + Vec2::from_angle(angle) * SURROUND_RADIUS;
            let mut obstacle = Obstacle::new(ObstacleKind::Normal, pos);
            obstacle.speed *= SURROUND_SPEED_SCALE;
            obstacle.aim_at(player_pos);
            self.obstacles.push(obstacle);
        }
    }

    /// A fast obstacle dropped straight down from above the screen
    pub fn spawn_rain_drop(&mut self, x: f32) {
        let mut obstacle = Obstacle::new(ObstacleKind::Fast, Vec2::new(x, -OBSTACLE_SPAWN_OFFSET));
        obstacle.set_direction(std::f32::consts::FRAC_PI_2);
        self.obstacles.push(obstacle);
    }

    /// Advance spawn timer and every obstacle, then cull.
    ///
    /// `dt` is the unscaled frame delta; both spawning and motion run at
    /// `slow_factor` speed. Returns the number of audible spawns.
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        bounds: Vec2,
        player_pos: Vec2,
        slow_factor: f32,
        rng: &mut R,
    ) -> u32 {
        let scaled_dt = dt * slow_factor;
        let mut audible = 0;

        self.spawn_timer += scaled_dt as f64;
        if self.spawn_timer >= self.difficulty.spawn_interval {
            self.spawn_timer = 0.0;
            for _ in 0..self.difficulty.batch_size() {
                if self.spawn(bounds, player_pos, rng) {
                    audible += 1;
                }
            }
        }

        for obstacle in &mut self.obstacles {
            obstacle.update(scaled_dt, player_pos, slow_factor, rng);
        }
        self.cull(bounds);

        audible
    }

    /// Drop dead and far-off-screen obstacles
    pub fn cull(&mut self, bounds: Vec2) {
        self.obstacles.retain(|o| {
            o.alive && !o.is_out_of_bounds(bounds.x, bounds.y, OBSTACLE_CULL_MARGIN)
        });
    }

    /// Push obstacles within `radius` away from `center`, stronger when closer
    pub fn apply_magnet(&mut self, center: Vec2, radius: f32, force: f32) {
        for obstacle in &mut self.obstacles {
            let away = obstacle.pos - center;
            let dist = away.length();
            if dist < radius && dist > 0.0 {
                let push = (1.0 - dist / radius) * force;
                obstacle.vel += away / dist * push;
            }
        }
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const BOUNDS: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn test_unlock_thresholds() {
        let mut difficulty = Difficulty::default();
        difficulty.update(44_999.0);
        assert!(difficulty.is_unlocked(ObstacleKind::Homing));
        assert!(!difficulty.is_unlocked(ObstacleKind::Splitter));
        difficulty.update(45_000.0);
        assert!(difficulty.is_unlocked(ObstacleKind::Splitter));
        assert!(!difficulty.is_unlocked(ObstacleKind::Wave));
        difficulty.update(120_000.0);
        assert_eq!(difficulty.unlocked.len(), ObstacleKind::ALL.len());
    }

    #[test]
    fn test_spawn_interval_curve() {
        assert_eq!(Difficulty::spawn_interval_at(0.0), 1000.0);
        assert_eq!(Difficulty::spawn_interval_at(15_000.0), 850.0);
        assert_eq!(Difficulty::spawn_interval_at(200_000.0), 200.0);
        assert_eq!(Difficulty::multiplier_at(60_000.0), 2.0);
    }

    #[test]
    fn test_batch_size() {
        let mut difficulty = Difficulty::default();
        assert_eq!(difficulty.batch_size(), 1);
        difficulty.update(150_000.0);
        assert_eq!(difficulty.batch_size(), 3);
        difficulty.update(500_000.0);
        assert_eq!(difficulty.batch_size(), 3);
    }

    #[test]
    fn test_spawn_starts_off_screen_and_scaled() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut manager = ObstacleManager::new();
        manager.update_difficulty(60_000.0);
        for _ in 0..50 {
            manager.spawn(BOUNDS, BOUNDS / 2.0, &mut rng);
        }
        for obs in &manager.obstacles {
            let outside = obs.pos.x < 0.0 || obs.pos.x > BOUNDS.x || obs.pos.y < 0.0 || obs.pos.y > BOUNDS.y;
            assert!(outside);
            assert!((obs.speed - obs.kind.speed() * 2.0).abs() < 1e-4);
            assert!(manager.difficulty.is_unlocked(obs.kind));
        }
    }

    #[test]
    fn test_update_spawns_on_interval() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut manager = ObstacleManager::new();
        for _ in 0..62 {
            manager.update(16.0, BOUNDS, BOUNDS / 2.0, 1.0, &mut rng);
        }
        assert!(manager.is_empty());
        manager.update(16.0, BOUNDS, BOUNDS / 2.0, 1.0, &mut rng);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.spawn_timer, 0.0);
    }

    #[test]
    fn test_slow_factor_delays_spawn() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut manager = ObstacleManager::new();
        for _ in 0..63 {
            manager.update(16.0, BOUNDS, BOUNDS / 2.0, SLOW_FACTOR, &mut rng);
        }
        assert!(manager.is_empty());
    }

    #[test]
    fn test_surround_ring() {
        let mut manager = ObstacleManager::new();
        let center = Vec2::new(400.0, 300.0);
        manager.spawn_surround(center, 12);
        assert_eq!(manager.len(), 12);
        for obs in &manager.obstacles {
            assert!((obs.pos.distance(center) - SURROUND_RADIUS).abs() < 1e-3);
            let expected = ObstacleKind::Normal.speed() * SURROUND_SPEED_SCALE;
            assert!((obs.vel.length() - expected).abs() < 1e-4);
            // Heading at the player
            assert!(obs.vel.normalize().dot((center - obs.pos).normalize()) > 0.999);
        }
    }

    #[test]
    fn test_rain_drop_falls_straight() {
        let mut manager = ObstacleManager::new();
        manager.spawn_rain_drop(120.0);
        let raindrop = &manager.obstacles[0];
        assert_eq!(raindrop.kind, ObstacleKind::Fast);
        assert!(raindrop.vel.x.abs() < 1e-5);
        assert!((raindrop.vel.y - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_magnet_repels_nearby_only() {
        let mut manager = ObstacleManager::new();
        manager.obstacles.push(Obstacle::new(ObstacleKind::Normal, Vec2::new(50.0, 0.0)));
        manager.obstacles.push(Obstacle::new(ObstacleKind::Normal, Vec2::new(200.0, 0.0)));
        manager.apply_magnet(Vec2::ZERO, 150.0, 0.5);
        let expected = (1.0 - 50.0 / 150.0) * 0.5;
        assert!((manager.obstacles[0].vel.x - expected).abs() < 1e-5);
        assert_eq!(manager.obstacles[1].vel, Vec2::ZERO);
    }

    #[test]
    fn test_cull_removes_dead_and_far() {
        let mut manager = ObstacleManager::new();
        let mut dead = Obstacle::new(ObstacleKind::Normal, Vec2::new(10.0, 10.0));
        dead.alive = false;
        manager.obstacles.push(dead);
        manager.obstacles.push(Obstacle::new(ObstacleKind::Normal, Vec2::new(-150.0, 10.0)));
        manager.obstacles.push(Obstacle::new(ObstacleKind::Normal, Vec2::new(10.0, 10.0)));
        manager.cull(BOUNDS);
        assert_eq!(manager.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_unlocked_set_only_grows(times in prop::collection::vec(0.0f64..200_000.0, 1..20)) {
            let mut times = times;
            times.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let mut difficulty = Difficulty::default();
            let mut previous = difficulty.unlocked.len();
            for t in times {
                difficulty.update(t);
                prop_assert!(difficulty.unlocked.len() >= previous);
                previous = difficulty.unlocked.len();
                for kind in ObstacleKind::ALL {
                    prop_assert_eq!(difficulty.is_unlocked(kind), t >= kind.unlock_ms());
                }
            }
        }

        #[test]
        fn prop_spawn_interval_bounded(elapsed in 0.0f64..1_000_000.0) {
            let interval = Difficulty::spawn_interval_at(elapsed);
            prop_assert!((MIN_SPAWN_INTERVAL_MS..=BASE_SPAWN_INTERVAL_MS).contains(&interval));
        }
    }
}
