//! Scripted reward sequence
//!
//! A list of `(offset, action)` pairs fired relative to one trigger instant.
//! Offsets are absolute from the trigger, never chained, and nothing can be
//! cancelled or re-run once triggered. Time comes from a [`Clock`] so the
//! sequence can be stepped without real waits.

use std::cell::Cell;

use crate::tuning::TimelineTuning;

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Manually advanced clock for tests and headless runs
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Cell<f64>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Things the reward sequence does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardAction {
    /// Play the chest's opening clip once, clamped at its last frame
    StartChestAnimation,
    /// Opening sound
    PlayChestOpenSound,
    /// Coin rises out of the chest
    PopCoin,
    /// Stop the animation mixer
    FreezeChestAnimation,
    /// Celebration sounds and fireworks
    Celebrate,
    /// Final overlay
    RevealEndScreen,
}

/// One scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineStep {
    pub offset_ms: u32,
    pub action: RewardAction,
}

/// The reward sequence for one session
#[derive(Debug, Clone)]
pub struct RewardTimeline {
    steps: Vec<TimelineStep>,
    triggered_at: Option<f64>,
    /// Index of the first step that has not fired
    next: usize,
}

impl RewardTimeline {
    /// Steps are ordered by offset; steps sharing an offset keep their order
    pub fn new(mut steps: Vec<TimelineStep>) -> Self {
        steps.sort_by_key(|s| s.offset_ms);
        Self {
            steps,
            triggered_at: None,
            next: 0,
        }
    }

    pub fn from_tuning(tuning: &TimelineTuning) -> Self {
        use RewardAction::*;
        Self::new(vec![
            TimelineStep {
                offset_ms: tuning.chest_open_ms,
                action: StartChestAnimation,
            },
            TimelineStep {
                offset_ms: tuning.chest_open_ms,
                action: PlayChestOpenSound,
            },
            TimelineStep {
                offset_ms: tuning.coin_pop_ms,
                action: PopCoin,
            },
            TimelineStep {
                offset_ms: tuning.animation_freeze_ms,
                action: FreezeChestAnimation,
            },
            TimelineStep {
                offset_ms: tuning.celebrate_ms,
                action: Celebrate,
            },
            TimelineStep {
                offset_ms: tuning.end_screen_ms,
                action: RevealEndScreen,
            },
        ])
    }

    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    pub fn triggered_at(&self) -> Option<f64> {
        self.triggered_at
    }

    /// Start the sequence; returns false if it was already started
    pub fn trigger(&mut self, now_ms: f64) -> bool {
        if self.triggered_at.is_some() {
            return false;
        }
        log::info!("Reward timeline triggered ({} steps)", self.steps.len());
        self.triggered_at = Some(now_ms);
        true
    }

    /// Absolute times of the steps still waiting to fire
    pub fn pending_deadlines(&self) -> Vec<f64> {
        let Some(start) = self.triggered_at else {
            return Vec::new();
        };
        self.steps[self.next..]
            .iter()
            .map(|s| start + s.offset_ms as f64)
            .collect()
    }

    /// Pop every action whose time has come, in order
    pub fn due(&mut self, now_ms: f64) -> Vec<RewardAction> {
        let Some(start) = self.triggered_at else {
            return Vec::new();
        };

        let mut fired = Vec::new();
        while let Some(step) = self.steps.get(self.next) {
            if start + step.offset_ms as f64 > now_ms {
                break;
            }
            log::debug!("Timeline +{}ms: {:?}", step.offset_ms, step.action);
            fired.push(step.action);
            self.next += 1;
        }
        fired
    }

    pub fn is_finished(&self) -> bool {
        self.triggered_at.is_some() && self.next >= self.steps.len()
    }
}
