//! Frame assembly: turns the game state into one triangle list
//!
//! Cosmetic state that never feeds back into the simulation (background
//! stars, particles, screen shake) lives in [`Effects`], driven by the
//! simulation's events.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::shapes;
use super::vertex::{Vertex, colors, with_alpha};
use crate::settings::Settings;
use crate::sim::obstacle::LASER_LENGTH;
use crate::sim::{GameEvent, GamePhase, GameState, ObstacleKind, SkillKind};

const CIRCLE_SEGMENTS: u32 = 24;
const SMALL_SEGMENTS: u32 = 10;

/// A particle for visual effects
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: [f32; 4],
    /// 0-1, decreases over time
    pub life: f32,
    pub size: f32,
}

#[derive(Debug, Clone, Copy)]
struct Star {
    pos: Vec2,
    speed: f32,
    size: f32,
}

/// Cosmetic effects layered over the simulation
pub struct Effects {
    pub particles: Vec<Particle>,
    stars: Vec<Star>,
    /// Shake intensity in pixels, decays every frame
    pub shake: f32,
    max_particles: usize,
    screen_shake: bool,
    rng: Pcg32,
}

impl Effects {
    pub fn new(seed: u64, bounds: Vec2, settings: &Settings) -> Self {
        let mut effects = Self {
            particles: Vec::new(),
            stars: Vec::new(),
            shake: 0.0,
            max_particles: settings.max_particles(),
            screen_shake: settings.screen_shake,
            rng: Pcg32::seed_from_u64(seed),
        };
        effects.populate_stars(bounds, settings.particle_level.star_count());
        effects
    }

    pub fn apply_settings(&mut self, settings: &Settings, bounds: Vec2) {
        self.max_particles = settings.max_particles();
        self.screen_shake = settings.screen_shake;
        self.particles.truncate(self.max_particles);
        self.populate_stars(bounds, settings.particle_level.star_count());
    }

    fn populate_stars(&mut self, bounds: Vec2, count: usize) {
        let rng = &mut self.rng;
        self.stars = (0..count)
            .map(|_| Star {
                pos: Vec2::new(rng.random::<f32>() * bounds.x, rng.random::<f32>() * bounds.y),
                speed: rng.random_range(0.2..1.0),
                size: rng.random_range(0.5..2.0),
            })
            .collect();
    }

    /// Spawn particles or shake for a simulation event
    pub fn on_event(&mut self, event: &GameEvent, state: &GameState) {
        match event {
            GameEvent::GameOver(_) => {
                self.burst(state.player.pos, 50, colors::obstacle(ObstacleKind::Normal), 8.0);
                self.add_shake(15.0);
            }
            GameEvent::ShieldAbsorbed(pos) => {
                self.burst(*pos, 20, colors::PLAYER_SHIELD, 5.0);
                self.add_shake(5.0);
            }
            GameEvent::NearMiss { .. } => {
                self.burst(state.player.pos, 8, colors::POPUP, 3.0);
            }
            GameEvent::PowerupCollected(kind) => {
                self.burst(state.player.pos, 15, colors::powerup(*kind), 4.0);
            }
            _ => {}
        }
    }

    fn add_shake(&mut self, amount: f32) {
        if self.screen_shake {
            self.shake = self.shake.max(amount);
        }
    }

    fn burst(&mut self, pos: Vec2, count: usize, color: [f32; 4], speed: f32) {
        let room = self.max_particles.saturating_sub(self.particles.len());
        for _ in 0..count.min(room) {
            let angle = self.rng.random::<f32>() * std::f32::consts::TAU;
            let vel = Vec2::from_angle(angle) * self.rng.random_range(0.3..1.0) * speed;
            self.particles.push(Particle {
                pos,
                vel,
                color,
                life: 1.0,
                size: self.rng.random_range(1.5..4.0),
            });
        }
    }

    /// Advance one frame
    pub fn update(&mut self, bounds: Vec2) {
        for star in &mut self.stars {
            star.pos.y += star.speed;
            if star.pos.y > bounds.y {
                star.pos.y = 0.0;
                star.pos.x = self.rng.random::<f32>() * bounds.x;
            }
        }

        for particle in &mut self.particles {
            particle.pos += particle.vel;
            particle.vel *= 0.95;
            particle.life -= 0.02;
        }
        self.particles.retain(|p| p.life > 0.0);

        self.shake *= 0.9;
        if self.shake < 0.5 {
            self.shake = 0.0;
        }
    }

    /// Random camera offset for this frame
    pub fn shake_offset(&mut self) -> Vec2 {
        if self.shake <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(self.rng.random::<f32>() - 0.5, self.rng.random::<f32>() - 0.5) * 2.0 * self.shake
    }
}

/// Build every vertex of a frame in screen pixels
pub fn build_scene(
    state: &GameState,
    effects: &Effects,
    settings: &Settings,
    time_ms: f64,
    offset: Vec2,
) -> Vec<Vertex> {
    let mut v = Vec::with_capacity(8192);

    for star in &effects.stars {
        v.extend(shapes::circle(star.pos, star.size, colors::STAR, 4));
    }

    if state.phase != GamePhase::Idle {
        draw_powerups(&mut v, state, time_ms);
        draw_obstacles(&mut v, state);
        if state.phase != GamePhase::GameOver {
            draw_player(&mut v, state, settings);
        }
        draw_popups(&mut v, state);
    }

    for particle in &effects.particles {
        let color = with_alpha(particle.color, particle.life);
        v.extend(shapes::circle(particle.pos, particle.size, color, 6));
    }

    if state.danger > 0.0 && state.phase == GamePhase::Playing {
        draw_danger_border(&mut v, state.bounds, state.danger);
    }

    if offset != Vec2::ZERO {
        for vertex in &mut v {
            vertex.position[0] += offset.x;
            vertex.position[1] += offset.y;
        }
    }

    v
}

fn draw_powerups(v: &mut Vec<Vertex>, state: &GameState, time_ms: f64) {
    for powerup in &state.powerups.powerups {
        // Blink during the last two seconds
        if powerup.is_expiring() && (time_ms / 100.0) as u64 % 2 == 0 {
            continue;
        }
        let color = colors::powerup(powerup.kind);
        let radius = powerup.radius + powerup.pulse_phase.sin() * 3.0;
        v.extend(shapes::glow(powerup.pos, radius * 1.8, with_alpha(color, 0.3), CIRCLE_SEGMENTS));
        v.extend(shapes::circle(powerup.pos, radius * 0.7, color, CIRCLE_SEGMENTS));
        v.extend(shapes::ring(powerup.pos, radius - 2.0, radius, color, CIRCLE_SEGMENTS));
    }
}

fn draw_obstacles(v: &mut Vec<Vertex>, state: &GameState) {
    for obstacle in &state.obstacles.obstacles {
        let base = if obstacle.fragment {
            colors::FRAGMENT
        } else {
            colors::obstacle(obstacle.kind)
        };
        let alpha = if obstacle.is_visible() { 1.0 } else { 0.3 };
        let color = with_alpha(base, alpha);

        if obstacle.kind == ObstacleKind::Laser {
            let dir = obstacle.vel.normalize_or_zero();
            let tail = obstacle.pos - dir * LASER_LENGTH;
            v.extend(shapes::line(tail, obstacle.pos, obstacle.radius * 2.0, color));
            v.extend(shapes::circle(obstacle.pos, obstacle.radius, colors::PLAYER_INVINCIBLE, SMALL_SEGMENTS));
            continue;
        }

        v.extend(shapes::glow(obstacle.pos, obstacle.radius * 2.0, with_alpha(base, 0.4 * alpha), CIRCLE_SEGMENTS));
        v.extend(shapes::circle(obstacle.pos, obstacle.radius, color, CIRCLE_SEGMENTS));
    }
}

fn player_color(state: &GameState) -> [f32; 4] {
    let player = &state.player;
    if player.is_skill_active(SkillKind::Evade) {
        colors::PLAYER_EVADE
    } else if player.shrunk {
        colors::PLAYER_SHRUNK
    } else if player.invincible {
        colors::PLAYER_INVINCIBLE
    } else if player.shield {
        colors::PLAYER_SHIELD
    } else {
        colors::PLAYER
    }
}

fn draw_player(v: &mut Vec<Vertex>, state: &GameState, settings: &Settings) {
    let player = &state.player;
    let color = player_color(state);

    let trail_len = ((player.trail.len() as f32) * settings.particle_level.trail_quality()).ceil() as usize;
    v.extend(shapes::trail(&player.trail[..trail_len.min(player.trail.len())], player.radius * 0.6, color));

    if player.magnet {
        v.extend(shapes::circle(player.pos, crate::consts::MAGNET_RADIUS, colors::MAGNET_AURA, CIRCLE_SEGMENTS * 2));
    }
    if player.shield {
        v.extend(shapes::ring(player.pos, player.radius + 5.0, player.radius + 8.0, colors::PLAYER_SHIELD, CIRCLE_SEGMENTS));
    }

    // Invincibility flashes
    let body_alpha = if player.invincible && (player.invincible_time / 100.0) as u32 % 2 == 0 {
        0.5
    } else {
        1.0
    };
    v.extend(shapes::glow(player.pos, player.radius * 2.0, with_alpha(color, 0.4), CIRCLE_SEGMENTS));
    v.extend(shapes::circle(player.pos, player.radius, with_alpha(color, body_alpha), CIRCLE_SEGMENTS));
    v.extend(shapes::circle(player.pos, player.hitbox_radius.min(4.0), colors::HITBOX, SMALL_SEGMENTS));
}

fn draw_popups(v: &mut Vec<Vertex>, state: &GameState) {
    for popup in &state.popups {
        let color = with_alpha(colors::POPUP, popup.alpha);
        let size = 4.0 + popup.combo.min(10) as f32;
        v.extend(shapes::ring(popup.pos, size - 1.5, size, color, SMALL_SEGMENTS));
    }
}

fn draw_danger_border(v: &mut Vec<Vertex>, bounds: Vec2, danger: f32) {
    let color = with_alpha(colors::DANGER, danger * 0.4);
    let width = 6.0 + danger * 10.0;
    let corners = [
        Vec2::ZERO,
        Vec2::new(bounds.x, 0.0),
        bounds,
        Vec2::new(0.0, bounds.y),
    ];
    for i in 0..4 {
        v.extend(shapes::line(corners[i], corners[(i + 1) % 4], width, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ParticleLevel;
    use crate::sim::{Obstacle, RunSummary};

    const BOUNDS: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn test_idle_scene_is_only_background() {
        let settings = Settings::default();
        let state = GameState::new(1, BOUNDS);
        let effects = Effects::new(1, BOUNDS, &settings);
        let vertices = build_scene(&state, &effects, &settings, 0.0, Vec2::ZERO);
        assert_eq!(vertices.len(), settings.particle_level.star_count() * 12);
    }

    #[test]
    fn test_obstacles_add_geometry() {
        let settings = Settings::default();
        let mut state = GameState::new(1, BOUNDS);
        state.phase = GamePhase::Playing;
        let effects = Effects::new(1, BOUNDS, &settings);
        let before = build_scene(&state, &effects, &settings, 0.0, Vec2::ZERO).len();
        state
            .obstacles
            .obstacles
            .push(Obstacle::new(ObstacleKind::Normal, Vec2::new(100.0, 100.0)));
        let after = build_scene(&state, &effects, &settings, 0.0, Vec2::ZERO).len();
        assert!(after > before);
    }

    #[test]
    fn test_particles_respect_level_cap() {
        let settings = Settings {
            particle_level: ParticleLevel::Low,
            ..Default::default()
        };
        let state = GameState::new(1, BOUNDS);
        let mut effects = Effects::new(1, BOUNDS, &settings);
        for _ in 0..5 {
            effects.on_event(&GameEvent::GameOver(RunSummary::default()), &state);
        }
        assert_eq!(effects.particles.len(), 100);

        for _ in 0..60 {
            effects.update(BOUNDS);
        }
        assert!(effects.particles.is_empty());
    }

    #[test]
    fn test_shake_respects_setting_and_decays() {
        let state = GameState::new(1, BOUNDS);
        let off = Settings {
            screen_shake: false,
            ..Default::default()
        };
        let mut effects = Effects::new(1, BOUNDS, &off);
        effects.on_event(&GameEvent::GameOver(RunSummary::default()), &state);
        assert_eq!(effects.shake_offset(), Vec2::ZERO);

        let mut effects = Effects::new(1, BOUNDS, &Settings::default());
        effects.on_event(&GameEvent::GameOver(RunSummary::default()), &state);
        assert!(effects.shake > 0.0);
        for _ in 0..100 {
            effects.update(BOUNDS);
        }
        assert_eq!(effects.shake, 0.0);
    }
}
