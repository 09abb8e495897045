//! Obstacle entity and its per-kind motion rules

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Obstacle types, in unlock order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Normal,
    Fast,
    Large,
    Homing,
    Splitter,
    Wave,
    Ghost,
    Laser,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 8] = [
        ObstacleKind::Normal,
        ObstacleKind::Fast,
        ObstacleKind::Large,
        ObstacleKind::Homing,
        ObstacleKind::Splitter,
        ObstacleKind::Wave,
        ObstacleKind::Ghost,
        ObstacleKind::Laser,
    ];

    /// Base collision radius
    pub fn radius(self) -> f32 {
        match self {
            ObstacleKind::Normal => 12.0,
            ObstacleKind::Fast => 8.0,
            ObstacleKind::Large => 25.0,
            ObstacleKind::Homing => 10.0,
            ObstacleKind::Splitter => 18.0,
            ObstacleKind::Wave => 10.0,
            ObstacleKind::Ghost => 12.0,
            ObstacleKind::Laser => 5.0,
        }
    }

    /// Base speed in pixels per frame
    pub fn speed(self) -> f32 {
        match self {
            ObstacleKind::Normal => 3.0,
            ObstacleKind::Fast => 6.0,
            ObstacleKind::Large => 1.5,
            ObstacleKind::Homing => 2.0,
            ObstacleKind::Splitter => 2.5,
            ObstacleKind::Wave => 3.0,
            ObstacleKind::Ghost => 2.5,
            ObstacleKind::Laser => 15.0,
        }
    }

    /// Elapsed play time (ms) at which this kind joins the spawn pool
    pub fn unlock_ms(self) -> f64 {
        match self {
            ObstacleKind::Normal => 0.0,
            ObstacleKind::Fast => 15_000.0,
            ObstacleKind::Large => 20_000.0,
            ObstacleKind::Homing => 30_000.0,
            ObstacleKind::Splitter => 45_000.0,
            ObstacleKind::Wave => 60_000.0,
            ObstacleKind::Ghost => 90_000.0,
            ObstacleKind::Laser => 120_000.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObstacleKind::Normal => "normal",
            ObstacleKind::Fast => "fast",
            ObstacleKind::Large => "large",
            ObstacleKind::Homing => "homing",
            ObstacleKind::Splitter => "splitter",
            ObstacleKind::Wave => "wave",
            ObstacleKind::Ghost => "ghost",
            ObstacleKind::Laser => "laser",
        }
    }
}

pub const HOMING_STRENGTH: f32 = 0.02;
pub const WAVE_AMPLITUDE: f32 = 50.0;
pub const WAVE_FREQUENCY: f32 = 0.05;
/// Fraction of the sinusoidal offset applied per frame
pub const WAVE_STEP_FACTOR: f32 = 0.1;
pub const GHOST_FLICKER_RATE: f32 = 0.1;
pub const LASER_LENGTH: f32 = 100.0;
pub const FRAGMENT_COUNT: usize = 3;
pub const FRAGMENT_RADIUS: f32 = 6.0;
/// Random spread added to each fragment's launch angle (radians)
pub const FRAGMENT_ANGLE_JITTER: f32 = 0.5;

/// Kind-specific motion state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Fixed velocity (normal, fast, large, laser)
    Linear,
    /// Steers toward the player, capped at `speed`
    Homing { strength: f32 },
    /// Linear; breaks into fragments when absorbed by a shield
    Splitter,
    /// Base heading plus a sinusoidal lateral offset
    Wave {
        amplitude: f32,
        frequency: f32,
        base_vel: Option<Vec2>,
    },
    /// Linear; visibility flickers for rendering only
    Ghost { visible: bool, flicker_rate: f32 },
}

impl Behavior {
    fn for_kind(kind: ObstacleKind) -> Self {
        match kind {
            ObstacleKind::Homing => Behavior::Homing {
                strength: HOMING_STRENGTH,
            },
            ObstacleKind::Splitter => Behavior::Splitter,
            ObstacleKind::Wave => Behavior::Wave {
                amplitude: WAVE_AMPLITUDE,
                frequency: WAVE_FREQUENCY,
                base_vel: None,
            },
            ObstacleKind::Ghost => Behavior::Ghost {
                visible: true,
                flicker_rate: GHOST_FLICKER_RATE,
            },
            _ => Behavior::Linear,
        }
    }
}

/// An obstacle entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub pos: Vec2,
    /// Pixels per frame
    pub vel: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub alive: bool,
    /// Time alive (ms, slow-scaled)
    pub age: f32,
    /// Set once a near miss was scored or the obstacle moved past the player
    pub passed_player: bool,
    /// Splitter debris (drawn in its own colour)
    pub fragment: bool,
    pub behavior: Behavior,
}

impl Obstacle {
    pub fn new(kind: ObstacleKind, pos: Vec2) -> Self {
        Self {
            kind,
            pos,
            vel: Vec2::ZERO,
            radius: kind.radius(),
            speed: kind.speed(),
            alive: true,
            age: 0.0,
            passed_player: false,
            fragment: false,
            behavior: Behavior::for_kind(kind),
        }
    }

    /// Point velocity along `angle` at the current speed
    pub fn set_direction(&mut self, angle: f32) {
        self.vel = Vec2::from_angle(angle) * self.speed;
        self.sync_base_velocity();
    }

    /// Aim at a point at the current speed. No-op when already on it.
    pub fn aim_at(&mut self, target: Vec2) {
        let delta = target - self.pos;
        let dist = delta.length();
        if dist > 0.0 {
            self.vel = delta / dist * self.speed;
            self.sync_base_velocity();
        }
    }

    /// Multiply speed and current velocity (spawn-time difficulty scaling)
    pub fn scale_speed(&mut self, factor: f32) {
        self.speed *= factor;
        self.vel *= factor;
        if let Behavior::Wave {
            base_vel: Some(base),
            ..
        } = &mut self.behavior
        {
            *base *= factor;
        }
    }

    fn sync_base_velocity(&mut self) {
        if let Behavior::Wave { base_vel, .. } = &mut self.behavior {
            *base_vel = Some(self.vel);
        }
    }

    /// Advance one frame.
    ///
    /// `dt` is already slow-scaled and only drives `age`; displacement is per
    /// frame, multiplied by `slow_factor`.
    pub fn update<R: Rng>(&mut self, dt: f32, player_pos: Vec2, slow_factor: f32, rng: &mut R) {
        self.age += dt;

        match &mut self.behavior {
            Behavior::Linear | Behavior::Splitter => {}
            Behavior::Homing { strength } => {
                let to_player = player_pos - self.pos;
                let dist = to_player.length();
                if dist > 0.0 {
                    self.vel += to_player / dist * *strength;
                    self.vel = self.vel.clamp_length_max(self.speed);
                }
            }
            Behavior::Wave {
                amplitude,
                frequency,
                base_vel,
            } => {
                if let Some(base) = *base_vel {
                    let perp = Vec2::new(-base.y, base.x);
                    if perp.length() > 0.0 {
                        let offset = (self.age * *frequency).sin() * *amplitude;
                        self.pos += base * slow_factor
                            + perp.normalize() * offset * WAVE_STEP_FACTOR;
                        return;
                    }
                }
            }
            Behavior::Ghost {
                visible,
                flicker_rate,
            } => {
                if rng.random::<f32>() < *flicker_rate {
                    *visible = !*visible;
                }
            }
        }

        self.pos += self.vel * slow_factor;
    }

    /// Render hint; ghosts stay collidable while hidden
    pub fn is_visible(&self) -> bool {
        match self.behavior {
            Behavior::Ghost { visible, .. } => visible,
            _ => true,
        }
    }

    pub fn is_out_of_bounds(&self, width: f32, height: f32, margin: f32) -> bool {
        self.pos.x < -margin
            || self.pos.x > width + margin
            || self.pos.y < -margin
            || self.pos.y > height + margin
    }

    /// Break a splitter into fast fragments 120 degrees apart.
    ///
    /// Marks the splitter dead. Returns nothing for other kinds.
    pub fn split<R: Rng>(&mut self, rng: &mut R) -> Vec<Obstacle> {
        if !matches!(self.behavior, Behavior::Splitter) {
            return Vec::new();
        }
        self.alive = false;

        (0..FRAGMENT_COUNT)
            .map(|i| {
                let angle = std::f32::consts::TAU / FRAGMENT_COUNT as f32 * i as f32
                    + rng.random::<f32>() * FRAGMENT_ANGLE_JITTER;
                let mut fragment = Obstacle::new(ObstacleKind::Fast, self.pos);
                fragment.radius = FRAGMENT_RADIUS;
                fragment.fragment = true;
                fragment.set_direction(angle);
                fragment
            })
            .collect()
    }
}
