//! Host-side glue around the simulation
//!
//! A `Session` owns the game state, the save data and the audio sink. The
//! host feeds it input and wall-clock time once per frame; the session steps
//! the simulation and routes its events to audio and persistence.

use glam::Vec2;

use crate::audio::{AudioSink, SoundEffect};
use crate::persistence::{Persistence, Storage};
use crate::settings::Settings;
use crate::format_time;
use crate::sim::{self, GameEvent, GamePhase, GameState, RunSummary, Skill, SkillKind, TickInput};

/// Results screen data for a finished run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunResults {
    pub summary: RunSummary,
    pub is_new_record: bool,
    /// Leaderboard position (1-indexed) if the run ranked
    pub rank: Option<usize>,
    pub best_time: f64,
}

/// Display-ready HUD values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hud {
    pub time: String,
    pub best: String,
    pub combo: u32,
    pub danger: f32,
    pub slow: SkillHud,
    pub evade: SkillHud,
    pub powerups: Vec<String>,
    /// "3", "2", "1", "GO" during the countdown
    pub countdown: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillHud {
    /// Whole seconds of cooldown left, "ACTIVE", or empty when ready
    pub label: String,
    pub disabled: bool,
}

impl SkillHud {
    fn from_skill(skill: &Skill) -> Self {
        let cooldown = skill.cooldown_remaining();
        if cooldown > 0.0 {
            Self {
                label: format!("{}s", (cooldown / 1000.0).ceil()),
                disabled: true,
            }
        } else {
            Self {
                label: if skill.active { "ACTIVE".to_string() } else { String::new() },
                disabled: false,
            }
        }
    }
}

pub struct Session<S: Storage, A: AudioSink> {
    pub state: GameState,
    persistence: Persistence<S>,
    audio: A,
    pending_result: Option<(bool, Option<usize>)>,
    results: Option<RunResults>,
}

impl<S: Storage, A: AudioSink> Session<S, A> {
    pub fn new(seed: u64, bounds: Vec2, storage: S, mut audio: A) -> Self {
        let persistence = Persistence::load(storage);
        audio.apply_settings(&persistence.settings());
        Self {
            state: GameState::new(seed, bounds),
            persistence,
            audio,
            pending_result: None,
            results: None,
        }
    }

    pub fn start(&mut self, now: f64) {
        self.results = None;
        self.pending_result = None;
        sim::start(&mut self.state, now);
        self.dispatch_events(now);
    }

    pub fn pause(&mut self, now: f64) -> bool {
        let paused = sim::pause(&mut self.state, now);
        self.dispatch_events(now);
        paused
    }

    pub fn resume(&mut self, now: f64) -> bool {
        let resumed = sim::resume(&mut self.state, now);
        self.dispatch_events(now);
        resumed
    }

    pub fn use_skill(&mut self, kind: SkillKind, now: f64) -> bool {
        let used = sim::use_skill(&mut self.state, kind);
        self.dispatch_events(now);
        used
    }

    /// Back to the title screen from any phase
    pub fn return_to_idle(&mut self) {
        if self.state.is_running() {
            self.audio.stop_music();
        }
        sim::return_to_idle(&mut self.state);
        self.state.events.clear();
        self.results = None;
    }

    /// Step one frame and route its events. Returns them for the UI.
    pub fn frame(&mut self, input: &TickInput, now: f64) -> Vec<GameEvent> {
        sim::frame(&mut self.state, input, now);
        self.audio.update(now);
        self.dispatch_events(now)
    }

    fn dispatch_events(&mut self, now: f64) -> Vec<GameEvent> {
        let events = self.state.drain_events();
        for event in &events {
            self.handle_event(event, now);
        }
        events
    }

    fn handle_event(&mut self, event: &GameEvent, now: f64) {
        match event {
            GameEvent::RunStarted => self.audio.play(SoundEffect::Start),
            GameEvent::CountdownTick(_) => self.audio.play(SoundEffect::CountdownTick),
            GameEvent::CountdownGo => self.audio.play(SoundEffect::CountdownGo),
            GameEvent::PlayStarted | GameEvent::Resumed => self.audio.start_music(now),
            GameEvent::Paused => self.audio.stop_music(),
            GameEvent::SkillActivated(_) => self.audio.play(SoundEffect::Skill),
            GameEvent::PowerupCollected(_) | GameEvent::ShieldAbsorbed(_) => {
                self.audio.play(SoundEffect::Powerup)
            }
            GameEvent::NearMiss { .. } => {
                self.audio.play(SoundEffect::NearMiss);
                self.persistence.record_near_miss(1);
            }
            GameEvent::ObstacleSpawned => self.audio.play(SoundEffect::ObstacleSpawn),
            GameEvent::EventWarning(kind) => log::info!("Event warning: {}", kind.warning()),
            GameEvent::EventStarted(_) => {}
            GameEvent::GameOver(summary) => {
                self.audio.stop_music();
                self.audio.play(SoundEffect::Death);

                let rank = self.persistence.top_scores().potential_rank(summary.elapsed_ms);
                let is_new_record = self.persistence.record_run(summary.elapsed_ms);
                self.persistence.record_play_time(summary.elapsed_ms);
                if is_new_record {
                    log::info!("New best time: {}", format_time(summary.elapsed_ms));
                    self.audio.play(SoundEffect::NewRecord);
                }
                self.pending_result = Some((is_new_record, rank));
            }
            GameEvent::ShowResults(summary) => {
                let (is_new_record, rank) = self.pending_result.take().unwrap_or((false, None));
                self.results = Some(RunResults {
                    summary: *summary,
                    is_new_record,
                    rank,
                    best_time: self.persistence.best_time(),
                });
            }
        }
    }

    /// Results of the last run once the summary delay has passed
    pub fn results(&self) -> Option<&RunResults> {
        self.results.as_ref()
    }

    pub fn hud(&self) -> Hud {
        let state = &self.state;
        let countdown = match (state.phase, state.countdown) {
            (GamePhase::Countdown, Some(0)) => Some("GO".to_string()),
            (GamePhase::Countdown, Some(n)) => Some(n.to_string()),
            _ => None,
        };
        Hud {
            time: format_time(state.elapsed_ms),
            best: format_time(self.persistence.best_time()),
            combo: state.combo.count,
            danger: state.danger,
            slow: SkillHud::from_skill(&state.player.skills.slow),
            evade: SkillHud::from_skill(&state.player.skills.evade),
            powerups: state.player.active_powerups(),
            countdown,
        }
    }

    pub fn settings(&self) -> Settings {
        self.persistence.settings()
    }

    pub fn save_settings(&mut self, settings: Settings) {
        self.persistence.save_settings(settings);
        self.audio.apply_settings(&self.persistence.settings());
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }
}
