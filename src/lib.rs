//! Evade Infinity - A real-time arcade survival game
//!
//! Core modules:
//! - `sim`: Simulation core (player, obstacles, power-ups, collisions, events)
//! - `session`: Host glue that routes simulation events to audio and storage
//! - `renderer`: WebGPU rendering pipeline
//! - `persistence`: Best time, ranking, statistics and settings storage
//! - `audio`: Procedural sound cues

pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use session::Session;
pub use settings::{ParticleLevel, Settings};

/// Game configuration constants
///
/// Distances are in canvas pixels, times in milliseconds. Obstacle velocities
/// are pixels per frame.
pub mod consts {
    /// Largest frame delta the simulation will accept
    pub const MAX_FRAME_DELTA_MS: f32 = 50.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 15.0;
    pub const PLAYER_HITBOX_RADIUS: f32 = 12.0;
    pub const PLAYER_SHRUNK_HITBOX_RADIUS: f32 = 6.0;
    /// Per-frame exponential smoothing toward the target (not frame-rate normalized)
    pub const PLAYER_LERP_FACTOR: f32 = 0.15;
    pub const PLAYER_KEYBOARD_SPEED: f32 = 10.0;
    pub const PLAYER_TRAIL_LENGTH: usize = 10;
    pub const NEAR_MISS_RADIUS: f32 = 50.0;
    /// Gap between the hit radius and the start of the near-miss band
    pub const NEAR_MISS_DEAD_ZONE: f32 = 5.0;
    /// Invincibility granted when the clock starts
    pub const GRACE_INVINCIBILITY_MS: f32 = 3000.0;

    /// Skills
    pub const SLOW_SKILL_DURATION_MS: f32 = 3000.0;
    pub const SLOW_SKILL_COOLDOWN_MS: f32 = 20000.0;
    pub const EVADE_SKILL_DURATION_MS: f32 = 500.0;
    pub const EVADE_SKILL_COOLDOWN_MS: f32 = 30000.0;
    /// Time scale applied to obstacles while slow motion is active
    pub const SLOW_FACTOR: f32 = 0.3;

    /// Obstacle field
    pub const OBSTACLE_CULL_MARGIN: f32 = 100.0;
    pub const OBSTACLE_SPAWN_OFFSET: f32 = 30.0;
    /// Aim jitter is +/- half of this on each axis
    pub const OBSTACLE_AIM_JITTER: f32 = 200.0;
    pub const MAX_SPAWN_BATCH: u32 = 3;
    pub const SPAWN_SOUND_CHANCE: f32 = 0.3;
    pub const SURROUND_RADIUS: f32 = 300.0;
    pub const SURROUND_SPEED_SCALE: f32 = 0.7;
    pub const PASS_DISTANCE: f32 = 100.0;
    pub const PASS_AXIS_OFFSET: f32 = 50.0;

    /// Difficulty curve
    pub const DIFFICULTY_RAMP_MS: f64 = 60000.0;
    pub const BASE_SPAWN_INTERVAL_MS: f64 = 1000.0;
    pub const MIN_SPAWN_INTERVAL_MS: f64 = 200.0;
    pub const SPAWN_INTERVAL_DIVISOR: f64 = 100.0;

    /// Magnet aura
    pub const MAGNET_RADIUS: f32 = 150.0;
    pub const MAGNET_FORCE: f32 = 0.5;

    /// Power-ups
    pub const POWERUP_RADIUS: f32 = 18.0;
    pub const POWERUP_LIFETIME_MS: f32 = 8000.0;
    pub const POWERUP_SPAWN_INTERVAL_MS: f32 = 5000.0;
    pub const MAX_POWERUPS: usize = 3;
    pub const POWERUP_PLAYER_CLEARANCE: f32 = 150.0;
    pub const POWERUP_PLACEMENT_ATTEMPTS: u32 = 10;
    pub const POWERUP_EDGE_MARGIN: f32 = 50.0;
    pub const SLOW_POWERUP_DURATION_MS: f32 = 5000.0;
    pub const SHRINK_DURATION_MS: f32 = 8000.0;
    pub const MAGNET_DURATION_MS: f32 = 6000.0;

    /// Combo / scoring
    pub const COMBO_DECAY_MS: f32 = 2000.0;
    pub const NEAR_MISS_BASE_SCORE: u32 = 50;

    /// Danger heuristic
    pub const DANGER_DISTANCE: f32 = 150.0;

    /// Countdown and scripted events
    pub const COUNTDOWN_FROM: u8 = 3;
    pub const COUNTDOWN_STEP_MS: f64 = 1000.0;
    pub const GO_DELAY_MS: f64 = 500.0;
    pub const RESULTS_DELAY_MS: f64 = 1000.0;
    pub const EVENT_START_MS: f64 = 30000.0;
    pub const EVENT_INTERVAL_MS: f64 = 45000.0;
    pub const EVENT_WARNING_MS: f64 = 1500.0;
    pub const SURROUND_COUNT: usize = 12;
    pub const WAVE_EVENT_SPAWNS: u32 = 15;
    pub const WAVE_EVENT_STAGGER_MS: f64 = 100.0;
    pub const RAIN_EVENT_DROPS: u32 = 20;
    pub const RAIN_EVENT_STAGGER_MS: f64 = 80.0;
}

/// Format a run time as `MM:SS.cc`
pub fn format_time(ms: f64) -> String {
    let ms = ms.max(0.0);
    let total_secs = (ms / 1000.0).floor() as u64;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    let centis = ((ms % 1000.0) / 10.0).floor() as u64;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centis)
}

/// Format an accumulated play time as `HH:MM:SS`
pub fn format_long_time(ms: f64) -> String {
    let total_secs = (ms.max(0.0) / 1000.0).floor() as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
