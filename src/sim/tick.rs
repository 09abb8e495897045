//! Per-frame simulation and run state machine
//!
//! `idle -> countdown -> playing <-> paused -> gameover -> idle`.
//! The host calls [`frame`] once per animation frame with the wall-clock
//! time; everything else (countdown, event delays, staggered spawns) is
//! driven by the run's scheduled tasks pumped at the top of each frame.

use glam::Vec2;
use rand::Rng;

use super::collision::{danger_level, has_passed, is_hit, is_near_miss};
use super::events::SpecialEventKind;
use super::player::SkillKind;
use super::powerup::PowerupKind;
use super::schedule::{ScheduledTask, TaskAction};
use super::state::{GameEvent, GamePhase, GameState, ScorePopup, near_miss_score};
use crate::consts::*;

/// Input gathered since the previous frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Latest pointer/touch position in play-area pixels
    pub pointer: Option<Vec2>,
    /// Held movement axes, each in -1..=1 (keyboard)
    pub move_dir: Vec2,
    /// Pause toggle (edge)
    pub pause: bool,
    /// Slow skill trigger (edge)
    pub slow: bool,
    /// Evade skill trigger (edge)
    pub evade: bool,
}

/// Clamp a raw frame delta to `[0, MAX_FRAME_DELTA_MS]`
pub fn clamp_delta(raw_ms: f64) -> f32 {
    raw_ms.clamp(0.0, MAX_FRAME_DELTA_MS as f64) as f32
}

/// Begin a new run: cancel the previous run's tasks, reset per-run state and
/// enter the countdown. Valid from any phase.
pub fn start(state: &mut GameState, now: f64) {
    let cancelled = state.scheduler.cancel_run(state.run_id);
    if cancelled > 0 {
        log::debug!("Cancelled {} pending task(s) of run {}", cancelled, state.run_id);
    }

    state.run_id += 1;
    let seed = state.seed.wrapping_add(state.run_id);
    state.reset_run(seed);
    state.phase = GamePhase::Countdown;
    state.events.push(GameEvent::RunStarted);
    log::info!("Run {} starting (seed {})", state.run_id, seed);

    state
        .scheduler
        .schedule(state.run_id, now, TaskAction::Countdown(COUNTDOWN_FROM));
}

/// Pause a running game. No-op unless playing.
pub fn pause(state: &mut GameState, now: f64) -> bool {
    if state.phase != GamePhase::Playing {
        return false;
    }
    state.phase = GamePhase::Paused;
    state.pause_time = now;
    state.events.push(GameEvent::Paused);
    true
}

/// Resume a paused game, shifting the clock origin by the paused duration.
/// No-op unless paused.
pub fn resume(state: &mut GameState, now: f64) -> bool {
    if state.phase != GamePhase::Paused {
        return false;
    }
    state.start_time += now - state.pause_time;
    state.phase = GamePhase::Playing;
    state.events.push(GameEvent::Resumed);
    true
}

/// Leave the current run for the title screen, dropping its pending tasks
pub fn return_to_idle(state: &mut GameState) {
    state.scheduler.cancel_run(state.run_id);
    state.obstacles.clear();
    state.powerups.clear();
    state.popups.clear();
    state.countdown = None;
    state.phase = GamePhase::Idle;
}

/// Try to activate a skill. Only while playing; silent `false` otherwise.
pub fn use_skill(state: &mut GameState, kind: SkillKind) -> bool {
    if state.phase != GamePhase::Playing {
        return false;
    }
    let used = state.player.use_skill(kind);
    if used {
        state.events.push(GameEvent::SkillActivated(kind));
    }
    used
}

/// Advance one animation frame at wall-clock time `now` (ms)
pub fn frame(state: &mut GameState, input: &TickInput, now: f64) {
    let dt = match state.last_frame_time {
        Some(last) => clamp_delta(now - last),
        None => 0.0,
    };
    state.last_frame_time = Some(now);
    state.frame_delta = dt;

    run_due_tasks(state, now);

    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                pause(state, now);
            }
            GamePhase::Paused => {
                resume(state, now);
            }
            _ => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    if let Some(pointer) = input.pointer {
        state.player.set_target(pointer.x, pointer.y);
    }
    if input.slow {
        use_skill(state, SkillKind::Slow);
    }
    if input.evade {
        use_skill(state, SkillKind::Evade);
    }
    if input.move_dir != Vec2::ZERO {
        let dir = input.move_dir.normalize_or_zero();
        state.player.move_by(dir.x, dir.y, PLAYER_KEYBOARD_SPEED);
    }

    update(state, dt, now);
}

/// One playing-state simulation step with an already clamped `dt`
pub fn update(state: &mut GameState, dt: f32, now: f64) {
    state.elapsed_ms = now - state.start_time;

    let slow_factor = state.player.slow_factor();
    let bounds = state.bounds;
    state.player.update(dt, bounds.x, bounds.y);
    let player_pos = state.player.pos;

    if state.player.magnet {
        state
            .obstacles
            .apply_magnet(player_pos, MAGNET_RADIUS, MAGNET_FORCE);
    }

    state.obstacles.update_difficulty(state.elapsed_ms);
    let audible = state
        .obstacles
        .update(dt, bounds, player_pos, slow_factor, &mut state.rng);
    for _ in 0..audible {
        state.events.push(GameEvent::ObstacleSpawned);
    }

    state.powerups.update(dt, bounds, player_pos, &mut state.rng);

    resolve_collisions(state, now);
    if state.phase != GamePhase::Playing {
        return;
    }

    state.combo.decay(dt);

    for popup in &mut state.popups {
        popup.update();
    }
    state.popups.retain(|p| p.alpha > 0.0);

    let nearest = state
        .obstacles
        .obstacles
        .iter()
        .map(|o| o.pos.distance(player_pos))
        .fold(f32::INFINITY, f32::min);
    state.danger = danger_level(nearest);

    if state.event_clock.poll(state.elapsed_ms) {
        trigger_special_event(state, now);
    }
}

/// Power-up pickup, then obstacle hits, near misses and pass-through flags
fn resolve_collisions(state: &mut GameState, now: f64) {
    let player_pos = state.player.pos;

    if let Some(powerup) = state
        .powerups
        .take_colliding(player_pos, state.player.radius)
    {
        collect_powerup(state, powerup.kind);
    }

    let hitbox = state.player.hitbox_radius();
    let immune = state.player.is_immune();
    let mut fragments = Vec::new();
    let mut near_misses = 0u32;
    let mut died = false;

    for obstacle in state.obstacles.obstacles.iter_mut() {
        if !obstacle.alive {
            continue;
        }
        let dist = obstacle.pos.distance(player_pos);

        if !immune && is_hit(dist, obstacle.radius, hitbox) {
            if state.player.use_shield() {
                obstacle.alive = false;
                fragments.extend(obstacle.split(&mut state.rng));
                state.events.push(GameEvent::ShieldAbsorbed(obstacle.pos));
                continue;
            }
            died = true;
            break;
        }

        if !obstacle.passed_player
            && is_near_miss(dist, obstacle.radius, hitbox, NEAR_MISS_RADIUS)
        {
            obstacle.passed_player = true;
            near_misses += 1;
        }

        if has_passed(obstacle.pos, obstacle.vel, player_pos) {
            obstacle.passed_player = true;
        }
    }

    state.obstacles.obstacles.extend(fragments);
    state.obstacles.obstacles.retain(|o| o.alive);

    for _ in 0..near_misses {
        register_near_miss(state);
    }

    if died {
        game_over(state, now);
    }
}

fn register_near_miss(state: &mut GameState) {
    state.near_miss_count += 1;
    let combo = state.combo.register();
    let score = near_miss_score(combo);
    state.score += score as u64;

    let side = if state.rng.random::<bool>() { 1.0 } else { -1.0 };
    state.popups.push(ScorePopup {
        pos: state.player.pos + Vec2::new(side * 15.0, -30.0),
        score,
        combo,
        alpha: 1.0,
    });
    state.events.push(GameEvent::NearMiss { combo, score });
}

fn collect_powerup(state: &mut GameState, kind: PowerupKind) {
    state.items += 1;
    match kind {
        PowerupKind::Shield => state.player.give_shield(),
        PowerupKind::Slow => state.player.force_slow(SLOW_POWERUP_DURATION_MS),
        PowerupKind::Shrink => state.player.shrink(SHRINK_DURATION_MS),
        PowerupKind::Magnet => state.player.give_magnet(MAGNET_DURATION_MS),
        PowerupKind::TimeBonus => {}
    }
    state.events.push(GameEvent::PowerupCollected(kind));
}

/// End the run: stop simulating, report the summary, and queue the results
/// screen.
pub fn game_over(state: &mut GameState, now: f64) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    state.phase = GamePhase::GameOver;
    let summary = state.summary();
    log::info!(
        "Run {} over after {:.0} ms ({} near misses, max combo {})",
        state.run_id,
        summary.elapsed_ms,
        summary.near_misses,
        summary.max_combo
    );
    state.events.push(GameEvent::GameOver(summary));
    state
        .scheduler
        .schedule(state.run_id, now + RESULTS_DELAY_MS, TaskAction::ShowResults);
}

fn trigger_special_event(state: &mut GameState, now: f64) {
    let kind = SpecialEventKind::random(&mut state.rng);
    log::debug!("Special event {:?} at {:.0} ms", kind, state.elapsed_ms);
    state.events.push(GameEvent::EventWarning(kind));
    state.scheduler.schedule(
        state.run_id,
        now + EVENT_WARNING_MS,
        TaskAction::ExecuteEvent(kind),
    );
}

/// Fire every due task of the current run, including tasks that become due
/// while earlier ones run
fn run_due_tasks(state: &mut GameState, now: f64) {
    loop {
        let due = state.scheduler.take_due(state.run_id, now);
        if due.is_empty() {
            break;
        }
        for task in due {
            run_task(state, task, now);
        }
    }
}

fn run_task(state: &mut GameState, task: ScheduledTask, now: f64) {
    let run_id = state.run_id;
    match task.action {
        TaskAction::Countdown(0) => {
            state.countdown = Some(0);
            state.events.push(GameEvent::CountdownGo);
            state
                .scheduler
                .schedule(run_id, task.due_ms + GO_DELAY_MS, TaskAction::BeginPlay);
        }
        TaskAction::Countdown(n) => {
            state.countdown = Some(n);
            state.events.push(GameEvent::CountdownTick(n));
            state.scheduler.schedule(
                run_id,
                task.due_ms + COUNTDOWN_STEP_MS,
                TaskAction::Countdown(n - 1),
            );
        }
        TaskAction::BeginPlay => {
            if state.phase != GamePhase::Countdown {
                return;
            }
            state.countdown = None;
            state.phase = GamePhase::Playing;
            state.start_time = now;
            state.elapsed_ms = 0.0;
            state.player.set_invincible(GRACE_INVINCIBILITY_MS);
            state.events.push(GameEvent::PlayStarted);
        }
        TaskAction::ShowResults => {
            let summary = state.summary();
            state.events.push(GameEvent::ShowResults(summary));
        }
        TaskAction::ExecuteEvent(kind) => {
            if !state.is_running() {
                return;
            }
            state.events.push(GameEvent::EventStarted(kind));
            if kind == SpecialEventKind::Surround {
                let player_pos = state.player.pos;
                state.obstacles.spawn_surround(player_pos, SURROUND_COUNT);
            }
            for (offset, action) in kind.staggered_spawns() {
                state.scheduler.schedule(run_id, task.due_ms + offset, action);
            }
        }
        TaskAction::SpawnObstacle => {
            if !state.is_running() {
                return;
            }
            let player_pos = state.player.pos;
            if state.obstacles.spawn(state.bounds, player_pos, &mut state.rng) {
                state.events.push(GameEvent::ObstacleSpawned);
            }
        }
        TaskAction::SpawnRainDrop => {
            if !state.is_running() {
                return;
            }
            let x = state.rng.random::<f32>() * state.bounds.x;
            state.obstacles.spawn_rain_drop(x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacle::{Obstacle, ObstacleKind};
    use proptest::prelude::*;

    const BOUNDS: Vec2 = Vec2::new(800.0, 600.0);
    const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Start a run at t=0 and step frames until playing; returns the time
    fn start_playing(state: &mut GameState) -> f64 {
        start(state, 0.0);
        let mut now = 0.0;
        while state.phase != GamePhase::Playing {
            now += FRAME_MS;
            frame(state, &TickInput::default(), now);
            assert!(now < 5000.0, "countdown never finished");
        }
        now
    }

    fn obstacle_at(kind: ObstacleKind, pos: Vec2) -> Obstacle {
        let mut obstacle = Obstacle::new(kind, pos);
        obstacle.vel = Vec2::ZERO;
        obstacle
    }

    #[test]
    fn test_countdown_sequence_and_grace() {
        let mut state = GameState::new(1, BOUNDS);
        start(&mut state, 0.0);
        frame(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.countdown, Some(3));
        frame(&mut state, &TickInput::default(), 1000.0);
        assert_eq!(state.countdown, Some(2));
        frame(&mut state, &TickInput::default(), 2000.0);
        assert_eq!(state.countdown, Some(1));
        frame(&mut state, &TickInput::default(), 3000.0);
        assert_eq!(state.countdown, Some(0));
        assert_eq!(state.phase, GamePhase::Countdown);
        frame(&mut state, &TickInput::default(), 3500.0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.start_time, 3500.0);
        assert!(state.player.invincible);

        let events = state.drain_events();
        assert_eq!(
            events[..6],
            [
                GameEvent::RunStarted,
                GameEvent::CountdownTick(3),
                GameEvent::CountdownTick(2),
                GameEvent::CountdownTick(1),
                GameEvent::CountdownGo,
                GameEvent::PlayStarted,
            ]
        );
    }

    #[test]
    fn test_stalled_frame_is_clamped() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        frame(&mut state, &TickInput::default(), now + 5000.0);
        assert_eq!(state.frame_delta, 50.0);
    }

    #[test]
    fn test_pause_resume_shifts_origin_by_paused_duration() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        let origin = state.start_time;

        assert!(pause(&mut state, now + 100.0));
        assert!(!pause(&mut state, now + 200.0));
        assert!(resume(&mut state, now + 2600.0));
        assert_eq!(state.start_time, origin + 2500.0);
        assert!(!resume(&mut state, now + 2700.0));
    }

    #[test]
    fn test_pause_toggle_from_input() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        let toggle = TickInput {
            pause: true,
            ..Default::default()
        };
        frame(&mut state, &toggle, now + 16.0);
        assert_eq!(state.phase, GamePhase::Paused);
        let elapsed = state.elapsed_ms;
        frame(&mut state, &TickInput::default(), now + 1000.0);
        assert_eq!(state.elapsed_ms, elapsed);
        frame(&mut state, &toggle, now + 2000.0);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_skills_only_while_playing() {
        let mut state = GameState::new(1, BOUNDS);
        assert!(!use_skill(&mut state, SkillKind::Slow));
        start_playing(&mut state);
        assert!(use_skill(&mut state, SkillKind::Slow));
        assert!(!use_skill(&mut state, SkillKind::Slow));
        assert_eq!(state.player.skills.slow.duration, 3000.0);
        assert_eq!(state.player.skills.slow.cooldown, 20000.0);
    }

    #[test]
    fn test_hit_without_shield_ends_run() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.player.invincible = false;
        let pos = state.player.pos;
        state.obstacles.obstacles.push(obstacle_at(ObstacleKind::Normal, pos));

        resolve_collisions(&mut state, now);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::GameOver(_)))
        );

        frame(&mut state, &TickInput::default(), now + RESULTS_DELAY_MS);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::ShowResults(_)))
        );
    }

    #[test]
    fn test_invincible_player_is_not_hit() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        let pos = state.player.pos;
        state.obstacles.obstacles.push(obstacle_at(ObstacleKind::Normal, pos + Vec2::new(5.0, 0.0)));
        resolve_collisions(&mut state, now);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_shield_absorbs_normal_obstacle() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.player.invincible = false;
        state.player.give_shield();
        let pos = state.player.pos;
        state.obstacles.obstacles.push(obstacle_at(ObstacleKind::Normal, pos));

        resolve_collisions(&mut state, now);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(!state.player.shield);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_shield_splits_splitter_into_three_fast() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.player.invincible = false;
        state.player.give_shield();
        let pos = state.player.pos + Vec2::new(10.0, 0.0);
        state.obstacles.obstacles.push(obstacle_at(ObstacleKind::Splitter, pos));

        resolve_collisions(&mut state, now);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.obstacles.len(), 3);
        for fragment in &state.obstacles.obstacles {
            assert_eq!(fragment.kind, ObstacleKind::Fast);
            assert_eq!(fragment.pos, pos);
        }
    }

    #[test]
    fn test_near_miss_fires_once_per_obstacle() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.player.invincible = false;
        let pos = state.player.pos + Vec2::new(40.0, 0.0);
        state.obstacles.obstacles.push(obstacle_at(ObstacleKind::Normal, pos));

        resolve_collisions(&mut state, now);
        resolve_collisions(&mut state, now);
        assert_eq!(state.near_miss_count, 1);
        assert_eq!(state.combo.count, 1);
        assert_eq!(state.score, 75);
        assert_eq!(state.popups.len(), 1);
    }

    #[test]
    fn test_powerup_pickup_applies_effect() {
        use crate::sim::powerup::Powerup;

        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        let pos = state.player.pos;
        state.powerups.powerups.push(Powerup::new(PowerupKind::Shrink, pos));
        resolve_collisions(&mut state, now);
        assert!(state.player.shrunk);
        assert_eq!(state.items, 1);
        assert!(state.powerups.powerups.is_empty());
    }

    #[test]
    fn test_shield_absorbs_only_the_first_of_two_hits() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.player.invincible = false;
        state.player.give_shield();
        let pos = state.player.pos;
        state.obstacles.obstacles.push(obstacle_at(ObstacleKind::Normal, pos));
        state.obstacles.obstacles.push(obstacle_at(ObstacleKind::Normal, pos + Vec2::new(4.0, 0.0)));

        resolve_collisions(&mut state, now);
        assert!(!state.player.shield);
        assert_eq!(state.phase, GamePhase::GameOver);
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::ShieldAbsorbed(_))));
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameOver(_))));
    }

    #[test]
    fn test_magnet_pushes_nearby_obstacle_away() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.player.invincible_time = f32::MAX;
        state.player.give_magnet(MAGNET_DURATION_MS);
        state.obstacles.clear();
        let pos = state.player.pos + Vec2::new(50.0, 0.0);
        state.obstacles.obstacles.push(obstacle_at(ObstacleKind::Normal, pos));

        update(&mut state, 16.0, now + 16.0);
        let obstacle = &state.obstacles.obstacles[0];
        // (1 - 50/150) * 0.5 along +x
        assert!((obstacle.vel.x - 1.0 / 3.0).abs() < 1e-4);
        assert_eq!(obstacle.vel.y, 0.0);
    }

    #[test]
    fn test_slow_and_magnet_pickups() {
        use crate::sim::powerup::Powerup;

        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        let pos = state.player.pos;

        state.powerups.powerups.push(Powerup::new(PowerupKind::Slow, pos));
        resolve_collisions(&mut state, now);
        let slow = &state.player.skills.slow;
        assert!(slow.active);
        assert_eq!(slow.duration, 5000.0);
        assert_eq!(slow.cooldown, 0.0);

        state.powerups.powerups.push(Powerup::new(PowerupKind::Magnet, pos));
        resolve_collisions(&mut state, now);
        assert!(state.player.magnet);
        assert_eq!(state.player.magnet_time, 6000.0);
        assert_eq!(state.items, 2);
    }

    #[test]
    fn test_special_event_surround_and_wave() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.player.invincible_time = f32::MAX;
        state.obstacles.clear();

        state.scheduler.schedule(
            state.run_id,
            now,
            TaskAction::ExecuteEvent(SpecialEventKind::Surround),
        );
        run_due_tasks(&mut state, now);
        assert_eq!(state.obstacles.len(), 12);
        let center = state.player.pos;
        for obstacle in &state.obstacles.obstacles {
            assert_eq!(obstacle.kind, ObstacleKind::Normal);
            assert!(obstacle.vel.dot(center - obstacle.pos) > 0.0);
        }

        state.scheduler.schedule(
            state.run_id,
            now,
            TaskAction::ExecuteEvent(SpecialEventKind::Wave),
        );
        run_due_tasks(&mut state, now + 100.0 * 13.0);
        assert_eq!(state.obstacles.len(), 12 + 14);
        run_due_tasks(&mut state, now + 100.0 * 14.0);
        assert_eq!(state.obstacles.len(), 12 + 15);
    }

    #[test]
    fn test_event_due_while_paused_still_fires() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.obstacles.clear();
        assert!(pause(&mut state, now));

        state.scheduler.schedule(
            state.run_id,
            now + 10.0,
            TaskAction::ExecuteEvent(SpecialEventKind::Surround),
        );
        frame(&mut state, &TickInput::default(), now + 20.0);
        assert_eq!(state.phase, GamePhase::Paused);
        assert_eq!(state.obstacles.len(), 12);
    }

    #[test]
    fn test_restart_cancels_previous_run_tasks() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.scheduler.schedule(state.run_id, now + 100.0, TaskAction::SpawnRainDrop);
        start(&mut state, now + 10.0);
        assert_eq!(state.scheduler.pending(state.run_id - 1), 0);
        frame(&mut state, &TickInput::default(), now + 200.0);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_return_to_idle_drops_event_spawns() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.scheduler.schedule(
            state.run_id,
            now + 100.0,
            TaskAction::ExecuteEvent(SpecialEventKind::Rain),
        );
        return_to_idle(&mut state);
        assert_eq!(state.phase, GamePhase::Idle);
        frame(&mut state, &TickInput::default(), now + 5000.0);
        assert!(state.obstacles.is_empty());
        assert!(state.scheduler.is_empty());
    }

    #[test]
    fn test_special_event_rain_spawns_twenty_drops() {
        let mut state = GameState::new(1, BOUNDS);
        let now = start_playing(&mut state);
        state.player.invincible = true;
        state.player.invincible_time = f32::MAX;
        state.scheduler.schedule(
            state.run_id,
            now,
            TaskAction::ExecuteEvent(SpecialEventKind::Rain),
        );
        run_due_tasks(&mut state, now + 80.0 * 19.0);
        let drops = state
            .obstacles
            .obstacles
            .iter()
            .filter(|o| o.kind == ObstacleKind::Fast && o.pos.y < 0.0)
            .count();
        assert_eq!(drops, 20);
    }

    #[test]
    fn test_fifteen_seconds_unlocks_fast() {
        let mut state = GameState::new(42, BOUNDS);
        let mut now = start_playing(&mut state);
        let begin = now;
        // Keep the player alive and parked
        state.player.invincible_time = f32::MAX;

        while now - begin < 15_000.0 {
            now += FRAME_MS;
            frame(&mut state, &TickInput::default(), now);
            assert_eq!(state.phase, GamePhase::Playing);
        }
        frame(&mut state, &TickInput::default(), begin + 15_000.0);

        let difficulty = &state.obstacles.difficulty;
        assert!(difficulty.is_unlocked(ObstacleKind::Fast));
        assert!(!difficulty.is_unlocked(ObstacleKind::Large));
        assert!((difficulty.spawn_interval - 850.0).abs() < 1.0);
        assert!(difficulty.spawn_interval < BASE_SPAWN_INTERVAL_MS);
    }

    #[test]
    fn test_first_special_event_warns_at_45_seconds() {
        let mut state = GameState::new(3, BOUNDS);
        let begin = start_playing(&mut state);
        state.player.invincible_time = f32::MAX;
        state.drain_events();

        update(&mut state, 16.0, begin + 44_000.0);
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::EventWarning(_)))
        );
        update(&mut state, 16.0, begin + 45_000.0);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::EventWarning(_)))
        );
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = GameState::new(99, BOUNDS);
        let mut b = GameState::new(99, BOUNDS);
        let mut now_a = start_playing(&mut a);
        let mut now_b = start_playing(&mut b);
        let input = TickInput {
            pointer: Some(Vec2::new(200.0, 150.0)),
            ..Default::default()
        };
        for _ in 0..600 {
            now_a += FRAME_MS;
            now_b += FRAME_MS;
            frame(&mut a, &input, now_a);
            frame(&mut b, &input, now_b);
        }
        assert_eq!(a.phase, b.phase);
        assert_eq!(a.obstacles.len(), b.obstacles.len());
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.near_miss_count, b.near_miss_count);
    }

    proptest! {
        #[test]
        fn prop_delta_never_exceeds_cap(raw in -1000.0f64..100_000.0) {
            let dt = clamp_delta(raw);
            prop_assert!((0.0..=50.0).contains(&dt));
            if raw > 50.0 {
                prop_assert_eq!(dt, 50.0);
            }
        }
    }
}
