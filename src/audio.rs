//! Audio system using Web Audio API
//!
//! Procedurally generated cues and a step-sequenced background beat, no
//! external files. Every call is fire-and-forget: without an AudioContext
//! (native builds, blocked autoplay, insecure context) they do nothing.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Run started
    Start,
    /// Countdown 3, 2, 1
    CountdownTick,
    /// Countdown "GO"
    CountdownGo,
    NearMiss,
    /// Power-up collected or shield consumed
    Powerup,
    /// Skill activated
    Skill,
    Death,
    /// New best time
    NewRecord,
    /// Obstacle entered the field (sampled)
    ObstacleSpawn,
}

/// Where the session sends audio cues
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
    fn start_music(&mut self, now_ms: f64);
    fn stop_music(&mut self);
    /// Drive the music sequencer; called once per frame
    fn update(&mut self, _now_ms: f64) {}
    fn apply_settings(&mut self, _settings: &Settings) {}
}

/// Background beat tempo
pub const BGM_BPM: f64 = 140.0;
/// One sixteenth note
pub const BGM_STEP_MS: f64 = 60_000.0 / BGM_BPM / 4.0;
/// Steps caught up per frame at most (tab stalls drop the rest)
const MAX_STEPS_PER_UPDATE: usize = 4;

const BASS_NOTES: [f32; 8] = [65.41, 65.41, 87.31, 87.31, 98.0, 98.0, 87.31, 87.31];
const MELODY_NOTES: [f32; 8] = [261.63, 293.66, 329.63, 392.0, 440.0, 392.0, 329.63, 293.66];

/// Voices to sound on one sequencer step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BgmStep {
    pub kick: bool,
    pub hihat: bool,
    pub bass: Option<f32>,
    pub melody: Option<f32>,
}

/// 16-step bar: kick on quarters, hi-hat on eighths, a bass note every half
/// bar and a coin-flip melody note on the off-beats
#[derive(Debug, Clone)]
pub struct BgmSequencer {
    beat: u32,
    next_step_ms: Option<f64>,
    rng: Pcg32,
}

impl BgmSequencer {
    pub fn new(seed: u64) -> Self {
        Self {
            beat: 0,
            next_step_ms: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn start(&mut self, now_ms: f64) {
        self.beat = 0;
        self.next_step_ms = Some(now_ms);
    }

    pub fn stop(&mut self) {
        self.next_step_ms = None;
    }

    pub fn is_playing(&self) -> bool {
        self.next_step_ms.is_some()
    }

    /// Steps due by `now_ms`
    pub fn advance(&mut self, now_ms: f64) -> Vec<BgmStep> {
        let mut steps = Vec::new();
        while let Some(next) = self.next_step_ms {
            if next > now_ms {
                break;
            }
            if steps.len() == MAX_STEPS_PER_UPDATE {
                self.next_step_ms = Some(now_ms + BGM_STEP_MS);
                break;
            }
            steps.push(self.step());
            self.next_step_ms = Some(next + BGM_STEP_MS);
        }
        steps
    }

    fn step(&mut self) -> BgmStep {
        let beat_in_bar = self.beat % 16;
        let mut step = BgmStep {
            kick: beat_in_bar % 4 == 0,
            hihat: beat_in_bar % 2 == 0,
            ..Default::default()
        };
        if beat_in_bar % 8 == 0 {
            step.bass = Some(BASS_NOTES[(self.beat / 8) as usize % BASS_NOTES.len()]);
        }
        if beat_in_bar % 4 == 2 && self.rng.random::<f32>() > 0.5 {
            step.melody = Some(MELODY_NOTES[self.rng.random_range(0..MELODY_NOTES.len())]);
        }
        self.beat += 1;
        step
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioNode, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, BgmSequencer, BgmStep, SoundEffect};
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        se_bus: Option<GainNode>,
        bgm_bus: Option<GainNode>,
        music: BgmSequencer,
    }

    impl AudioManager {
        pub fn new(settings: &Settings) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            let se_bus = ctx.as_ref().and_then(create_bus);
            let bgm_bus = ctx.as_ref().and_then(create_bus);
            let mut manager = Self {
                ctx,
                se_bus,
                bgm_bus,
                music: BgmSequencer::new(js_sys::Date::now() as u64),
            };
            manager.apply_settings(settings);
            manager
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Create an oscillator with gain envelope routed into `bus`
        fn create_osc(
            ctx: &AudioContext,
            bus: &AudioNode,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(bus).ok()?;

            Some((osc, gain))
        }

        /// Plain enveloped tone starting `delay` seconds from now
        fn tone(
            ctx: &AudioContext,
            bus: &AudioNode,
            freq: f32,
            osc_type: OscillatorType,
            level: f32,
            delay: f64,
            duration: f64,
        ) -> Option<OscillatorNode> {
            let (osc, gain) = Self::create_osc(ctx, bus, freq, osc_type)?;
            let t = ctx.current_time() + delay;
            gain.gain().set_value_at_time(level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + duration)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + duration).ok();
            Some(osc)
        }

        fn arpeggio(ctx: &AudioContext, bus: &AudioNode, notes: &[f32], spacing: f64, level: f32, duration: f64) {
            for (i, freq) in notes.iter().enumerate() {
                Self::tone(ctx, bus, *freq, OscillatorType::Sine, level, i as f64 * spacing, duration);
            }
        }

        fn play_step(&self, step: BgmStep) {
            let (Some(ctx), Some(bus)) = (&self.ctx, &self.bgm_bus) else {
                return;
            };
            let t = ctx.current_time();

            if step.kick {
                if let Some((osc, gain)) = Self::create_osc(ctx, bus, 150.0, OscillatorType::Sine) {
                    gain.gain().set_value_at_time(0.5, t).ok();
                    gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.15).ok();
                    osc.frequency().exponential_ramp_to_value_at_time(50.0, t + 0.1).ok();
                    osc.start().ok();
                    osc.stop_with_when(t + 0.15).ok();
                }
            }
            if step.hihat {
                Self::tone(ctx, bus, 8000.0, OscillatorType::Square, 0.03, 0.0, 0.05);
            }
            if let Some(freq) = step.bass {
                Self::tone(ctx, bus, freq, OscillatorType::Sawtooth, 0.15, 0.0, 0.4);
            }
            if let Some(freq) = step.melody {
                Self::tone(ctx, bus, freq, OscillatorType::Square, 0.05, 0.0, 0.2);
            }
        }
    }

    fn create_bus(ctx: &AudioContext) -> Option<GainNode> {
        let gain = ctx.create_gain().ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;
        Some(gain)
    }

    impl AudioSink for AudioManager {
        fn play(&mut self, effect: SoundEffect) {
            let (Some(ctx), Some(bus)) = (&self.ctx, &self.se_bus) else {
                return;
            };

            // Browsers start the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Start => {
                    Self::arpeggio(ctx, bus, &[523.25, 659.25, 783.99], 0.1, 0.2, 0.3);
                }
                SoundEffect::CountdownTick => {
                    Self::tone(ctx, bus, 440.0, OscillatorType::Sine, 0.3, 0.0, 0.2);
                }
                SoundEffect::CountdownGo => {
                    Self::tone(ctx, bus, 880.0, OscillatorType::Sine, 0.3, 0.0, 0.5);
                }
                SoundEffect::NearMiss => {
                    if let Some(osc) = Self::tone(ctx, bus, 1200.0, OscillatorType::Sine, 0.15, 0.0, 0.15) {
                        osc.frequency()
                            .exponential_ramp_to_value_at_time(800.0, ctx.current_time() + 0.15)
                            .ok();
                    }
                }
                SoundEffect::Powerup => {
                    Self::arpeggio(ctx, bus, &[523.25, 659.25, 783.99, 1046.5], 0.05, 0.15, 0.15);
                }
                SoundEffect::Skill => {
                    if let Some(osc) = Self::tone(ctx, bus, 200.0, OscillatorType::Sawtooth, 0.1, 0.0, 0.3) {
                        let t = ctx.current_time();
                        osc.frequency().exponential_ramp_to_value_at_time(800.0, t + 0.1).ok();
                        osc.frequency().exponential_ramp_to_value_at_time(400.0, t + 0.3).ok();
                    }
                }
                SoundEffect::Death => {
                    if let Some(osc) = Self::tone(ctx, bus, 100.0, OscillatorType::Sawtooth, 0.4, 0.0, 0.5) {
                        osc.frequency()
                            .exponential_ramp_to_value_at_time(30.0, ctx.current_time() + 0.5)
                            .ok();
                    }
                    Self::tone(ctx, bus, 1500.0, OscillatorType::Square, 0.15, 0.0, 0.1);
                }
                SoundEffect::NewRecord => {
                    Self::arpeggio(
                        ctx,
                        bus,
                        &[523.25, 659.25, 783.99, 1046.5, 783.99, 1046.5],
                        0.15,
                        0.2,
                        0.2,
                    );
                }
                SoundEffect::ObstacleSpawn => {
                    Self::tone(ctx, bus, 150.0, OscillatorType::Sine, 0.05, 0.0, 0.1);
                }
            }
        }

        fn start_music(&mut self, now_ms: f64) {
            self.music.start(now_ms);
        }

        fn stop_music(&mut self) {
            self.music.stop();
        }

        fn update(&mut self, now_ms: f64) {
            for step in self.music.advance(now_ms) {
                self.play_step(step);
            }
        }

        fn apply_settings(&mut self, settings: &Settings) {
            if let Some(bus) = &self.se_bus {
                bus.gain().set_value(settings.se_gain());
            }
            if let Some(bus) = &self.bgm_bus {
                bus.gain().set_value(settings.bgm_gain() * 0.5);
            }
        }
    }
}

/// Native stand-in: no output, keeps the sequencer clock so behavior
/// matches the browser build
#[cfg(not(target_arch = "wasm32"))]
pub struct AudioManager {
    music: BgmSequencer,
    se_gain: f32,
}

#[cfg(not(target_arch = "wasm32"))]
impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        log::debug!("No audio backend on this target");
        Self {
            music: BgmSequencer::new(0),
            se_gain: settings.se_gain(),
        }
    }

    pub fn resume(&self) {}
}

#[cfg(not(target_arch = "wasm32"))]
impl AudioSink for AudioManager {
    fn play(&mut self, effect: SoundEffect) {
        if self.se_gain > 0.0 {
            log::trace!("sound: {:?}", effect);
        }
    }

    fn start_music(&mut self, now_ms: f64) {
        self.music.start(now_ms);
    }

    fn stop_music(&mut self) {
        self.music.stop();
    }

    fn update(&mut self, now_ms: f64) {
        self.music.advance(now_ms);
    }

    fn apply_settings(&mut self, settings: &Settings) {
        self.se_gain = settings.se_gain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequencer_bar_pattern() {
        let mut seq = BgmSequencer::new(1);
        seq.start(0.0);
        let mut steps = Vec::new();
        let mut now = 0.0;
        while steps.len() < 16 {
            steps.extend(seq.advance(now));
            now += 16.0;
        }
        assert!(steps[0].kick && steps[0].hihat);
        assert_eq!(steps[0].bass, Some(65.41));
        assert!(!steps[1].kick && !steps[1].hihat);
        assert!(steps[4].kick);
        assert_eq!(steps[8].bass, Some(65.41));
        assert!(steps.iter().enumerate().all(|(i, s)| s.melody.is_none() || i % 4 == 2));
    }

    #[test]
    fn test_sequencer_stall_is_capped() {
        let mut seq = BgmSequencer::new(1);
        seq.start(0.0);
        assert_eq!(seq.advance(10_000.0).len(), 4);
        assert!(seq.advance(10_000.0).is_empty());
    }

    #[test]
    fn test_stopped_sequencer_is_silent() {
        let mut seq = BgmSequencer::new(1);
        assert!(seq.advance(1000.0).is_empty());
        seq.start(0.0);
        seq.stop();
        assert!(!seq.is_playing());
        assert!(seq.advance(1000.0).is_empty());
    }
}
