//! Simulation module
//!
//! All gameplay logic lives here:
//! - Wall-clock driven frames, clamped deltas
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod events;
pub mod obstacle;
pub mod player;
pub mod powerup;
pub mod schedule;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{Proximity, classify, danger_level, has_passed, is_hit, is_near_miss};
pub use events::{EventClock, SpecialEventKind};
pub use obstacle::{Behavior, Obstacle, ObstacleKind};
pub use player::{Player, Skill, SkillKind};
pub use powerup::{Powerup, PowerupKind, PowerupManager};
pub use schedule::{ScheduledTask, Scheduler, TaskAction};
pub use spawner::{Difficulty, ObstacleManager};
pub use state::{Combo, GameEvent, GamePhase, GameState, RunSummary, ScorePopup, near_miss_score};
pub use tick::{
    TickInput, clamp_delta, frame, game_over, pause, resume, return_to_idle, start, update,
    use_skill,
};
