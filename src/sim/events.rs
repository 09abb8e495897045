//! Scripted special events (surround, wave, rain)

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::schedule::TaskAction;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialEventKind {
    /// Ring of obstacles closing in on the player
    Surround,
    /// Burst of regular spawns
    Wave,
    /// Fast obstacles falling from the top edge
    Rain,
}

impl SpecialEventKind {
    pub const ALL: [SpecialEventKind; 3] = [
        SpecialEventKind::Surround,
        SpecialEventKind::Wave,
        SpecialEventKind::Rain,
    ];

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Warning banner text
    pub fn warning(self) -> &'static str {
        match self {
            SpecialEventKind::Surround => "SURROUNDED!",
            SpecialEventKind::Wave => "WAVE INCOMING!",
            SpecialEventKind::Rain => "METEOR RAIN!",
        }
    }

    /// Staggered spawn tasks as `(offset_ms, action)`.
    ///
    /// Surround is immediate and has no staggered part.
    pub fn staggered_spawns(self) -> Vec<(f64, TaskAction)> {
        match self {
            SpecialEventKind::Surround => Vec::new(),
            SpecialEventKind::Wave => (0..WAVE_EVENT_SPAWNS)
                .map(|i| (i as f64 * WAVE_EVENT_STAGGER_MS, TaskAction::SpawnObstacle))
                .collect(),
            SpecialEventKind::Rain => (0..RAIN_EVENT_DROPS)
                .map(|i| (i as f64 * RAIN_EVENT_STAGGER_MS, TaskAction::SpawnRainDrop))
                .collect(),
        }
    }
}

/// Timing of special events within a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventClock {
    /// Elapsed time of the last trigger (0 before the first)
    pub last_event_ms: f64,
    pub triggered: u32,
}

impl EventClock {
    /// Whether an event fires at this elapsed time; records the trigger.
    ///
    /// Nothing fires before `EVENT_START_MS`. Because the interval is
    /// measured from 0, the first event lands at `EVENT_INTERVAL_MS`.
    pub fn poll(&mut self, elapsed_ms: f64) -> bool {
        if elapsed_ms < EVENT_START_MS {
            return false;
        }
        if elapsed_ms - self.last_event_ms >= EVENT_INTERVAL_MS {
            self.last_event_ms = elapsed_ms;
            self.triggered += 1;
            return true;
        }
        false
    }
}
