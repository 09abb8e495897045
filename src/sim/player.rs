//! The player avatar: smoothed movement, timed power-up states and skills

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Player-triggered abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    /// Slow motion for obstacles
    Slow,
    /// Brief collision immunity
    Evade,
}

impl SkillKind {
    pub fn duration_ms(self) -> f32 {
        match self {
            SkillKind::Slow => SLOW_SKILL_DURATION_MS,
            SkillKind::Evade => EVADE_SKILL_DURATION_MS,
        }
    }

    pub fn max_cooldown_ms(self) -> f32 {
        match self {
            SkillKind::Slow => SLOW_SKILL_COOLDOWN_MS,
            SkillKind::Evade => EVADE_SKILL_COOLDOWN_MS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkillKind::Slow => "slow",
            SkillKind::Evade => "evade",
        }
    }
}

/// Cooldown and activation state of one skill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    /// Remaining cooldown; may dip below zero by up to one frame
    pub cooldown: f32,
    pub max_cooldown: f32,
    /// Remaining active time
    pub duration: f32,
    pub active: bool,
}

impl Skill {
    fn new(kind: SkillKind) -> Self {
        Self {
            cooldown: 0.0,
            max_cooldown: kind.max_cooldown_ms(),
            duration: 0.0,
            active: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown <= 0.0 && !self.active
    }

    /// Remaining cooldown clamped for display
    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown.max(0.0)
    }

    fn tick(&mut self, dt: f32) {
        if self.cooldown > 0.0 {
            self.cooldown -= dt;
        }
        if self.active {
            self.duration -= dt;
            if self.duration <= 0.0 {
                self.active = false;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skills {
    pub slow: Skill,
    pub evade: Skill,
}

impl Default for Skills {
    fn default() -> Self {
        Self {
            slow: Skill::new(SkillKind::Slow),
            evade: Skill::new(SkillKind::Evade),
        }
    }
}

impl Skills {
    pub fn get(&self, kind: SkillKind) -> &Skill {
        match kind {
            SkillKind::Slow => &self.slow,
            SkillKind::Evade => &self.evade,
        }
    }

    pub fn get_mut(&mut self, kind: SkillKind) -> &mut Skill {
        match kind {
            SkillKind::Slow => &mut self.slow,
            SkillKind::Evade => &mut self.evade,
        }
    }
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Where pointer or keyboard input wants the avatar to be
    pub target: Vec2,
    /// Visual radius, also used for power-up pickup
    pub radius: f32,
    /// Collision radius (shrinks under the shrink power-up)
    pub hitbox_radius: f32,
    pub invincible: bool,
    pub invincible_time: f32,
    /// One-shot obstacle absorb
    pub shield: bool,
    pub shrunk: bool,
    pub shrink_time: f32,
    pub magnet: bool,
    pub magnet_time: f32,
    pub skills: Skills,
    /// Position history for rendering (newest first)
    #[serde(skip)]
    pub trail: Vec<Vec2>,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            target: pos,
            radius: PLAYER_RADIUS,
            hitbox_radius: PLAYER_HITBOX_RADIUS,
            invincible: false,
            invincible_time: 0.0,
            shield: false,
            shrunk: false,
            shrink_time: 0.0,
            magnet: false,
            magnet_time: 0.0,
            skills: Skills::default(),
            trail: Vec::with_capacity(PLAYER_TRAIL_LENGTH),
        }
    }

    /// Pointer / touch control: overwrite the target
    pub fn set_target(&mut self, x: f32, y: f32) {
        self.target = Vec2::new(x, y);
    }

    /// Keyboard control: displace the target. Callers normalize diagonals.
    pub fn move_by(&mut self, dx: f32, dy: f32, speed: f32) {
        self.target += Vec2::new(dx, dy) * speed;
    }

    /// Advance one frame.
    ///
    /// Smoothing is a fixed fraction per call, so the avatar converges faster
    /// at higher frame rates. Timers do use `dt`.
    pub fn update(&mut self, dt: f32, bounds_w: f32, bounds_h: f32) {
        self.pos += (self.target - self.pos) * PLAYER_LERP_FACTOR;

        let min = Vec2::splat(self.radius);
        // Degenerate bounds collapse to the minimum corner rather than panicking in clamp
        let max = Vec2::new(bounds_w - self.radius, bounds_h - self.radius).max(min);
        self.pos = self.pos.clamp(min, max);
        self.target = self.target.clamp(min, max);

        self.trail.insert(0, self.pos);
        self.trail.truncate(PLAYER_TRAIL_LENGTH);

        if self.invincible {
            self.invincible_time -= dt;
            if self.invincible_time <= 0.0 {
                self.invincible = false;
            }
        }

        if self.shrunk {
            self.shrink_time -= dt;
            if self.shrink_time <= 0.0 {
                self.shrunk = false;
                self.hitbox_radius = PLAYER_HITBOX_RADIUS;
            }
        }

        if self.magnet {
            self.magnet_time -= dt;
            if self.magnet_time <= 0.0 {
                self.magnet = false;
            }
        }

        self.skills.slow.tick(dt);
        self.skills.evade.tick(dt);
    }

    /// Collision radius; zero while invincible or evading
    pub fn hitbox_radius(&self) -> f32 {
        if self.is_immune() {
            0.0
        } else {
            self.hitbox_radius
        }
    }

    /// Whether obstacle contact is currently harmless
    pub fn is_immune(&self) -> bool {
        self.invincible || self.skills.evade.active
    }

    pub fn set_invincible(&mut self, duration: f32) {
        self.invincible = true;
        self.invincible_time = duration;
    }

    pub fn give_shield(&mut self) {
        self.shield = true;
    }

    /// Consume the shield if present
    pub fn use_shield(&mut self) -> bool {
        std::mem::replace(&mut self.shield, false)
    }

    pub fn shrink(&mut self, duration: f32) {
        self.shrunk = true;
        self.shrink_time = duration;
        self.hitbox_radius = PLAYER_SHRUNK_HITBOX_RADIUS;
    }

    /// Grant the magnet aura. The aura pushes obstacles away.
    pub fn give_magnet(&mut self, duration: f32) {
        self.magnet = true;
        self.magnet_time = duration;
    }

    /// Activate a skill if it is off cooldown and not already running
    pub fn use_skill(&mut self, kind: SkillKind) -> bool {
        let skill = self.skills.get_mut(kind);
        if !skill.is_ready() {
            return false;
        }
        skill.active = true;
        skill.duration = kind.duration_ms();
        skill.cooldown = skill.max_cooldown;
        true
    }

    /// Force slow motion on without touching the cooldown (slow power-up)
    pub fn force_slow(&mut self, duration: f32) {
        let skill = &mut self.skills.slow;
        skill.active = true;
        skill.duration = duration;
    }

    pub fn can_use_skill(&self, kind: SkillKind) -> bool {
        self.skills.get(kind).is_ready()
    }

    pub fn is_skill_active(&self, kind: SkillKind) -> bool {
        self.skills.get(kind).active
    }

    /// Obstacle time scale for this frame
    pub fn slow_factor(&self) -> f32 {
        if self.is_skill_active(SkillKind::Slow) {
            SLOW_FACTOR
        } else {
            1.0
        }
    }

    /// Active effects for the HUD
    pub fn active_powerups(&self) -> Vec<String> {
        let mut active = Vec::new();
        if self.shield {
            active.push("Shield".to_string());
        }
        if self.shrunk {
            active.push(format!("Shrink {}s", (self.shrink_time / 1000.0).ceil()));
        }
        if self.magnet {
            active.push(format!("Magnet {}s", (self.magnet_time / 1000.0).ceil()));
        }
        if self.skills.slow.active {
            active.push("Slow".to_string());
        }
        if self.skills.evade.active {
            active.push("Evade".to_string());
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_smooths_toward_target() {
        let mut player = Player::new(Vec2::new(100.0, 100.0));
        player.set_target(200.0, 100.0);
        player.update(16.0, 800.0, 600.0);
        assert!((player.pos.x - 115.0).abs() < 1e-4);
        assert_eq!(player.trail.len(), 1);
    }

    #[test]
    fn test_update_clamps_to_bounds() {
        let mut player = Player::new(Vec2::new(400.0, 300.0));
        player.move_by(-1.0, 0.0, 10_000.0);
        player.update(16.0, 800.0, 600.0);
        assert_eq!(player.target.x, PLAYER_RADIUS);
        assert!(player.pos.x >= PLAYER_RADIUS);
    }

    #[test]
    fn test_skill_accepted_then_rejected() {
        let mut player = Player::new(Vec2::ZERO);
        assert!(player.use_skill(SkillKind::Slow));
        assert_eq!(player.skills.slow.duration, 3000.0);
        assert_eq!(player.skills.slow.cooldown, 20000.0);
        // Already active and on cooldown
        assert!(!player.use_skill(SkillKind::Slow));

        // Let it expire but stay on cooldown
        player.update(3000.0, 800.0, 600.0);
        assert!(!player.skills.slow.active);
        assert!(!player.use_skill(SkillKind::Slow));

        player.update(17000.0, 800.0, 600.0);
        assert!(player.use_skill(SkillKind::Slow));
    }

    #[test]
    fn test_evade_grants_immunity() {
        let mut player = Player::new(Vec2::ZERO);
        assert_eq!(player.hitbox_radius(), PLAYER_HITBOX_RADIUS);
        assert!(player.use_skill(SkillKind::Evade));
        assert_eq!(player.hitbox_radius(), 0.0);
        assert_eq!(player.skills.evade.cooldown, 30000.0);
        player.update(500.0, 800.0, 600.0);
        assert_eq!(player.hitbox_radius(), PLAYER_HITBOX_RADIUS);
    }

    #[test]
    fn test_shield_is_one_shot() {
        let mut player = Player::new(Vec2::ZERO);
        assert!(!player.use_shield());
        player.give_shield();
        assert!(player.use_shield());
        assert!(!player.use_shield());
    }

    #[test]
    fn test_shrink_expires() {
        let mut player = Player::new(Vec2::new(50.0, 50.0));
        player.shrink(8000.0);
        assert_eq!(player.hitbox_radius(), PLAYER_SHRUNK_HITBOX_RADIUS);
        player.update(7999.0, 800.0, 600.0);
        assert_eq!(player.hitbox_radius(), PLAYER_SHRUNK_HITBOX_RADIUS);
        player.update(1.0, 800.0, 600.0);
        assert_eq!(player.hitbox_radius(), PLAYER_HITBOX_RADIUS);
    }

    #[test]
    fn test_forced_slow_keeps_cooldown() {
        let mut player = Player::new(Vec2::ZERO);
        player.force_slow(5000.0);
        assert!(player.is_skill_active(SkillKind::Slow));
        assert_eq!(player.skills.slow.cooldown, 0.0);
        assert_eq!(player.slow_factor(), SLOW_FACTOR);
    }
}
