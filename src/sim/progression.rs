//! Round, score and health progression

use serde::{Deserialize, Serialize};

use super::timer::IntervalTimer;
use crate::tuning::WorldTuning;

pub const MAX_HEALTH: f32 = 100.0;

/// Ground level after `round` completions, never below the floor
pub fn ground_level_for_round(world: &WorldTuning, round: u32) -> f32 {
    (world.initial_ground_level - round as f32 * world.round_depth).max(world.ground_floor)
}

/// Counts completed descents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundManager {
    current_round: u32,
    round_end_buffer: f32,
}

impl RoundManager {
    pub fn new(round_end_buffer: f32) -> Self {
        Self {
            current_round: 1,
            round_end_buffer,
        }
    }

    /// True (and the round advances) once the player is within the
    /// round-end buffer of the ground
    pub fn check_round_end(&mut self, player_y: f32, ground_level: f32) -> bool {
        if player_y <= ground_level + self.round_end_buffer {
            self.current_round += 1;
            true
        } else {
            false
        }
    }

    pub fn find_round_num(&self) -> u32 {
        self.current_round
    }

    pub fn reset(&mut self) {
        self.current_round = 1;
    }
}

/// Halos collected this game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreManager {
    score: u32,
}

impl ScoreManager {
    /// Count one collected halo; returns the new score
    pub fn update(&mut self) -> u32 {
        self.score = self.score.saturating_add(1);
        self.score
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn reset(&mut self) {
        self.score = 0;
    }
}

#[derive(Debug, Clone)]
struct Decay {
    amount: f32,
    timer: IntervalTimer,
}

/// What a clock advance did to health
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayReport {
    /// Decay steps applied
    pub steps: u32,
    /// Health reached zero during this advance
    pub depleted: bool,
}

/// Health in `[0, MAX_HEALTH]` with timed decay.
///
/// Depletion is reported exactly once: the call that takes health to zero
/// returns true, later calls while still at zero do not.
#[derive(Debug, Clone)]
pub struct HealthModel {
    health: f32,
    depleted: bool,
    decay: Option<Decay>,
}

impl Default for HealthModel {
    fn default() -> Self {
        Self {
            health: MAX_HEALTH,
            depleted: false,
            decay: None,
        }
    }
}

impl HealthModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    /// Health as a percentage of the maximum
    pub fn get_health_percentage(&self) -> f32 {
        self.health / MAX_HEALTH * 100.0
    }

    pub fn is_depleted(&self) -> bool {
        self.depleted
    }

    /// Set health directly, clamped. Raising it above zero re-arms depletion.
    pub fn set_health(&mut self, health: f32) {
        self.health = if health.is_nan() { 0.0 } else { health.clamp(0.0, MAX_HEALTH) };
        if self.health > 0.0 {
            self.depleted = false;
        }
    }

    /// Subtract `amount`; returns true if this call depleted health.
    ///
    /// Depletion also cancels the decay schedule.
    pub fn decrease_health(&mut self, amount: f32) -> bool {
        if amount > 0.0 {
            self.health = (self.health - amount).max(0.0);
        }
        if self.health <= 0.0 && !self.depleted {
            self.depleted = true;
            self.cancel_decay();
            log::debug!("Health depleted");
            return true;
        }
        false
    }

    /// Decrease by `amount` every `interval_ms` until depleted.
    ///
    /// Replaces any schedule already running.
    pub fn decrease_health_over_time(&mut self, amount: f32, interval_ms: f32) {
        let mut timer = IntervalTimer::default();
        timer.start(interval_ms);
        if self.is_decaying() {
            log::debug!("Replacing active health decay schedule");
        }
        self.decay = Some(Decay { amount, timer });
    }

    pub fn is_decaying(&self) -> bool {
        self.decay.as_ref().is_some_and(|d| d.timer.is_active())
    }

    /// Stop the schedule; no further decay step is applied
    pub fn cancel_decay(&mut self) {
        if let Some(decay) = self.decay.as_mut() {
            decay.timer.cancel();
        }
    }

    /// Feed wall-clock time to the decay schedule
    pub fn advance(&mut self, dt_ms: f32) -> DecayReport {
        let mut report = DecayReport::default();
        let Some(decay) = self.decay.as_mut() else {
            return report;
        };
        let amount = decay.amount;
        let steps = decay.timer.advance(dt_ms);

        for _ in 0..steps {
            report.steps += 1;
            if self.decrease_health(amount) {
                report.depleted = true;
                break;
            }
        }
        report
    }

    /// Full health, no schedule
    pub fn reset(&mut self) {
        self.cancel_decay();
        self.health = MAX_HEALTH;
        self.depleted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_end_scenario() {
        let world = WorldTuning::default();
        let mut rounds = RoundManager::new(world.round_end_buffer);
        let ground = ground_level_for_round(&world, 0);
        assert_eq!(ground, -100.0);

        let mut y = 200.0;
        while y > 0.5 {
            assert!(!rounds.check_round_end(y, ground));
            y -= 1.0;
        }
        assert_eq!(rounds.find_round_num(), 1);

        assert!(rounds.check_round_end(-50.0, ground));
        assert_eq!(rounds.find_round_num(), 2);
        assert_eq!(ground_level_for_round(&world, rounds.find_round_num()), -500.0);
    }

    #[test]
    fn test_ground_level_respects_floor() {
        let world = WorldTuning {
            ground_floor: -300.0,
            ..WorldTuning::default()
        };
        assert_eq!(ground_level_for_round(&world, 2), -300.0);
        assert_eq!(ground_level_for_round(&world, 40), -300.0);
    }

    #[test]
    fn test_score_counts_and_resets() {
        let mut score = ScoreManager::default();
        assert_eq!(score.update(), 1);
        assert_eq!(score.update(), 2);
        score.reset();
        assert_eq!(score.score(), 0);
    }

    #[test]
    fn test_depletion_fires_once() {
        let mut health = HealthModel::new();
        assert!(!health.decrease_health(60.0));
        assert!(health.decrease_health(60.0));
        assert_eq!(health.health(), 0.0);
        assert!(!health.decrease_health(10.0));
        assert!(!health.decrease_health(0.0));

        // Refilling re-arms the one-shot
        health.set_health(5.0);
        assert!(health.decrease_health(5.0));
    }

    #[test]
    fn test_set_health_clamps() {
        let mut health = HealthModel::new();
        health.set_health(250.0);
        assert_eq!(health.get_health_percentage(), 100.0);
        health.set_health(-3.0);
        assert_eq!(health.health(), 0.0);
        health.set_health(f32::NAN);
        assert_eq!(health.health(), 0.0);
    }

    #[test]
    fn test_decay_runs_until_depleted_then_stops() {
        let mut health = HealthModel::new();
        health.decrease_health_over_time(10.0, 1000.0);
        assert!(health.is_decaying());

        assert_eq!(health.advance(999.0).steps, 0);
        let report = health.advance(1.0);
        assert_eq!(report, DecayReport { steps: 1, depleted: false });
        assert_eq!(health.health(), 90.0);

        let report = health.advance(20_000.0);
        assert_eq!(report, DecayReport { steps: 9, depleted: true });
        assert_eq!(health.health(), 0.0);
        assert!(!health.is_decaying());
        assert_eq!(health.advance(5_000.0), DecayReport::default());
    }

    #[test]
    fn test_restarting_decay_replaces_schedule() {
        let mut health = HealthModel::new();
        health.decrease_health_over_time(1.0, 1000.0);
        health.decrease_health_over_time(1.0, 1000.0);
        // One schedule, not two
        health.advance(1000.0);
        assert_eq!(health.health(), 99.0);
    }

    #[test]
    fn test_cancel_stops_pending_steps() {
        let mut health = HealthModel::new();
        health.decrease_health_over_time(5.0, 1000.0);
        health.advance(900.0);
        health.cancel_decay();
        assert!(!health.is_decaying());

        // The 100 ms left on the interval never fires
        assert_eq!(health.advance(5_000.0), DecayReport::default());
        assert_eq!(health.health(), MAX_HEALTH);

        health.decrease_health_over_time(5.0, 1000.0);
        assert!(health.is_decaying());
        assert_eq!(health.advance(1000.0).steps, 1);
    }

    #[test]
    fn test_reset_restores_and_cancels() {
        let mut health = HealthModel::new();
        health.decrease_health_over_time(50.0, 100.0);
        health.advance(250.0);
        assert!(health.is_depleted());

        health.reset();
        assert_eq!(health.health(), MAX_HEALTH);
        assert!(!health.is_depleted());
        assert!(!health.is_decaying());
        health.advance(10_000.0);
        assert_eq!(health.health(), MAX_HEALTH);
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_range_and_depletes_once(
            amounts in proptest::collection::vec(-50.0f32..80.0, 0..40),
        ) {
            let mut health = HealthModel::new();
            let mut depletions = 0;
            for amount in amounts {
                if health.decrease_health(amount) {
                    depletions += 1;
                }
                prop_assert!((0.0..=MAX_HEALTH).contains(&health.health()));
            }
            prop_assert!(depletions <= 1);
            prop_assert_eq!(depletions == 1, health.health() == 0.0);
        }

        #[test]
        fn prop_false_round_check_never_mutates(y in -1000.0f32..1000.0, ground in -1000.0f32..0.0) {
            let mut rounds = RoundManager::new(100.0);
            let ended = rounds.check_round_end(y, ground);
            prop_assert_eq!(ended, y <= ground + 100.0);
            prop_assert_eq!(rounds.find_round_num(), if ended { 2 } else { 1 });
        }
    }
}
