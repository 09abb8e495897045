//! Game state and core simulation types
//!
//! Everything a run mutates lives here, owned by one `GameState`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{EventClock, SpecialEventKind};
use super::player::{Player, SkillKind};
use super::powerup::{PowerupKind, PowerupManager};
use super::schedule::Scheduler;
use super::spawner::ObstacleManager;
use crate::consts::*;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing simulated
    Idle,
    /// 3-2-1-GO before the clock starts
    Countdown,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended
    GameOver,
}

/// Notifications from the simulation to its collaborators (audio, HUD,
/// persistence), drained by the host once per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    /// Countdown display: 3, 2, 1
    CountdownTick(u8),
    CountdownGo,
    /// Clock started, music on
    PlayStarted,
    Paused,
    Resumed,
    SkillActivated(SkillKind),
    PowerupCollected(PowerupKind),
    /// Shield consumed by an obstacle at this position
    ShieldAbsorbed(Vec2),
    NearMiss { combo: u32, score: u32 },
    /// An audible regular spawn (sampled)
    ObstacleSpawned,
    EventWarning(SpecialEventKind),
    EventStarted(SpecialEventKind),
    GameOver(RunSummary),
    /// Results screen is due
    ShowResults(RunSummary),
}

/// End-of-run statistics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub elapsed_ms: f64,
    pub near_misses: u32,
    pub items: u32,
    pub max_combo: u32,
    pub score: u64,
}

/// Floating "+score" text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePopup {
    pub pos: Vec2,
    pub score: u32,
    pub combo: u32,
    pub alpha: f32,
}

impl ScorePopup {
    /// Drift up and fade, per frame
    pub fn update(&mut self) {
        self.pos.y -= 1.0;
        self.alpha -= 0.02;
    }
}

/// Consecutive near misses within the decay window
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Combo {
    pub count: u32,
    pub timer: f32,
    pub max: u32,
}

impl Combo {
    /// Count a near miss and restart the decay window. Returns the new count.
    pub fn register(&mut self) -> u32 {
        self.count += 1;
        self.timer = COMBO_DECAY_MS;
        self.max = self.max.max(self.count);
        self.count
    }

    pub fn decay(&mut self, dt: f32) {
        if self.timer > 0.0 {
            self.timer -= dt;
            if self.timer <= 0.0 {
                self.timer = 0.0;
                self.count = 0;
            }
        }
    }
}

/// Score for a near miss at combo `c`: `50 + floor(50 * c * 0.5)`
pub fn near_miss_score(combo: u32) -> u32 {
    let base = NEAR_MISS_BASE_SCORE as f64;
    NEAR_MISS_BASE_SCORE + (base * combo as f64 * 0.5).floor() as u32
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Seed of the current run
    pub seed: u64,
    #[serde(skip, default = "default_rng")]
    pub rng: Pcg32,
    /// Bumped on every start; deferred tasks carry it
    pub run_id: u64,
    pub phase: GamePhase,
    /// Play area size in pixels
    pub bounds: Vec2,
    pub player: Player,
    pub obstacles: ObstacleManager,
    pub powerups: PowerupManager,
    pub combo: Combo,
    pub popups: Vec<ScorePopup>,
    /// Nearest-obstacle proximity in `[0, 1]`
    pub danger: f32,
    pub near_miss_count: u32,
    /// Power-ups collected this run
    pub items: u32,
    pub score: u64,
    /// Wall-clock origin of the run clock (shifted on resume)
    pub start_time: f64,
    pub pause_time: f64,
    pub elapsed_ms: f64,
    /// Countdown display value; `Some(0)` shows "GO"
    pub countdown: Option<u8>,
    /// Wall-clock time of the previous frame
    pub last_frame_time: Option<f64>,
    /// Clamped delta of the last frame
    pub frame_delta: f32,
    pub event_clock: EventClock,
    pub scheduler: Scheduler,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

fn default_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

impl GameState {
    pub fn new(seed: u64, bounds: Vec2) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            run_id: 0,
            phase: GamePhase::Idle,
            bounds,
            player: Player::new(bounds / 2.0),
            obstacles: ObstacleManager::new(),
            powerups: PowerupManager::new(),
            combo: Combo::default(),
            popups: Vec::new(),
            danger: 0.0,
            near_miss_count: 0,
            items: 0,
            score: 0,
            start_time: 0.0,
            pause_time: 0.0,
            elapsed_ms: 0.0,
            countdown: None,
            last_frame_time: None,
            frame_delta: 0.0,
            event_clock: EventClock::default(),
            scheduler: Scheduler::new(),
            events: Vec::new(),
        }
    }

    /// Clear per-run state for a fresh run with a new seed
    pub fn reset_run(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.player = Player::new(self.bounds / 2.0);
        self.obstacles = ObstacleManager::new();
        self.powerups = PowerupManager::new();
        self.combo = Combo::default();
        self.popups.clear();
        self.danger = 0.0;
        self.near_miss_count = 0;
        self.items = 0;
        self.score = 0;
        self.start_time = 0.0;
        self.pause_time = 0.0;
        self.elapsed_ms = 0.0;
        self.countdown = None;
        self.event_clock = EventClock::default();
    }

    /// Resize the play area (window resize). Entities are left in place.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds = Vec2::new(width, height);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            elapsed_ms: self.elapsed_ms,
            near_misses: self.near_miss_count,
            items: self.items,
            max_combo: self.combo.max,
            score: self.score,
        }
    }

    /// Take all pending events in emission order
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, GamePhase::Playing | GamePhase::Paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_near_miss_score_examples() {
        assert_eq!(near_miss_score(1), 75);
        assert_eq!(near_miss_score(2), 100);
        assert_eq!(near_miss_score(4), 150);
    }

    #[test]
    fn test_combo_decay_resets_count_and_keeps_max() {
        let mut combo = Combo::default();
        combo.register();
        combo.register();
        combo.decay(1500.0);
        assert_eq!(combo.count, 2);
        assert_eq!(combo.register(), 3);
        combo.decay(2000.0);
        assert_eq!(combo.count, 0);
        assert_eq!(combo.max, 3);
    }

    #[test]
    fn test_popup_fades_out_in_fifty_frames() {
        let mut popup = ScorePopup {
            pos: Vec2::new(100.0, 100.0),
            score: 75,
            combo: 1,
            alpha: 1.0,
        };
        let mut frames = 0;
        while popup.alpha > 0.0 {
            popup.update();
            frames += 1;
        }
        assert!((49..=51).contains(&frames));
        assert!(popup.pos.y < 100.0);
    }

    #[test]
    fn test_new_state_is_idle_and_centered() {
        let state = GameState::new(7, Vec2::new(800.0, 600.0));
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.player.pos, Vec2::new(400.0, 300.0));
        assert!(state.obstacles.is_empty());
    }

    proptest! {
        #[test]
        fn prop_near_miss_score_formula(c in 1u32..10_000) {
            prop_assert_eq!(near_miss_score(c), 50 + 25 * c);
        }
    }
}
