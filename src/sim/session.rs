//! Per-session context
//!
//! A `Session` is created when the AR session starts and dropped when it
//! ends. It owns every piece of session state, is driven by one `frame` call
//! per rendered frame plus code input events, and reports what the stage,
//! overlay and audio should do as a queue of [`SessionEvent`]s.

use glam::{Mat4, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::code::{CodeEntry, CodeGate, CodeOutcome};
use super::coin::Coin;
use super::distance::DistanceMonitor;
use super::fireworks::{Firework, FireworkEvent, FireworksController};
use super::placement::{HitTestOutcome, Placement, PlacementController};
use super::stream::ParticleStream;
use super::timeline::{RewardAction, RewardTimeline};
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    ChestOpen,
    Celebration,
    Victory,
    /// Firework explosion
    Firework,
    /// Wrong code buzz
    CodeRejected,
}

/// Things that happened during a frame or input event
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Reticle should sit at this pose
    ReticleMoved(Mat4),
    ReticleHidden,
    AssetsPlaced(Placement),
    /// New distance readout value (metres)
    DistanceChanged(f32),
    /// Show the keypad and the particle stream around `anchor`
    CodeEntryRevealed { anchor: Vec3 },
    /// Hide the keypad for good
    CodeAccepted,
    /// Flash the keypad border
    CodeRejected,
    /// Reward sequence started; absolute times the remaining steps are due
    TimelineStarted { deadlines: Vec<f64> },
    ChestAnimationStarted,
    ChestAnimationFrozen,
    CoinPopped { position: Vec3 },
    PlaySound(Sound),
    EndScreenRevealed,
    Firework(FireworkEvent),
}

/// One frame's worth of platform input
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub now_ms: f64,
    pub camera: Vec3,
    /// Hit poses, closest first
    pub hits: &'a [Mat4],
}

/// Which optional assets made it through loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssetStatus {
    /// Chest and marker models
    pub models: bool,
    /// The chest's opening clip
    pub chest_animation: bool,
}

impl AssetStatus {
    pub fn ready() -> Self {
        Self {
            models: true,
            chest_animation: true,
        }
    }
}

pub struct Session {
    seed: u64,
    rng: Pcg32,
    assets: AssetStatus,
    fireworks_enabled: bool,
    code: CodeGate,
    placement: PlacementController,
    distance: DistanceMonitor,
    timeline: RewardTimeline,
    fireworks: FireworksController,
    stream: ParticleStream,
    coin: Option<Coin>,
    frames: u64,
    events: Vec<SessionEvent>,
}

impl Session {
    pub fn new(tuning: &Tuning, settings: &Settings, assets: AssetStatus, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let stream = ParticleStream::new(settings.stream_particles(), &mut rng);

        log::info!(
            "Session created (seed {}, models {}, animation {})",
            seed,
            assets.models,
            assets.chest_animation
        );

        Self {
            seed,
            rng,
            assets,
            fireworks_enabled: settings.fireworks,
            code: CodeGate::from_tuning(&tuning.code),
            placement: PlacementController::new(tuning.placement.clone(), assets.models),
            distance: DistanceMonitor::new(tuning.distance.reveal_threshold),
            timeline: RewardTimeline::from_tuning(&tuning.timeline),
            fireworks: FireworksController::new(
                tuning.fireworks.clone(),
                settings.firework_particles(),
                settings.periodic_fireworks(),
            ),
            stream,
            coin: None,
            frames: 0,
            events: Vec::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.placement()
    }

    pub fn is_revealed(&self) -> bool {
        self.distance.is_revealed()
    }

    pub fn is_unlocked(&self) -> bool {
        self.code.is_unlocked()
    }

    pub fn code_buffer(&self) -> &str {
        self.code.buffer()
    }

    pub fn timeline(&self) -> &RewardTimeline {
        &self.timeline
    }

    pub fn fireworks(&self) -> &[Firework] {
        self.fireworks.fireworks()
    }

    pub fn fireworks_active(&self) -> bool {
        self.fireworks.is_active()
    }

    pub fn stream(&self) -> &ParticleStream {
        &self.stream
    }

    pub fn coin(&self) -> Option<&Coin> {
        self.coin.as_ref()
    }

    /// Take everything queued since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance one rendered frame
    pub fn frame(&mut self, input: &FrameInput<'_>) {
        self.frames += 1;
        let chest = self.placement.chest_position();

        let firework_events = self.fireworks.update(chest, &mut self.rng);
        self.push_firework_events(firework_events);

        match self.placement.update(input.hits) {
            HitTestOutcome::Done => {}
            HitTestOutcome::NoSurface => self.events.push(SessionEvent::ReticleHidden),
            HitTestOutcome::Tracking(pose) => self.events.push(SessionEvent::ReticleMoved(pose)),
            HitTestOutcome::Placed(placement) => {
                self.events.push(SessionEvent::AssetsPlaced(placement));
                self.events.push(SessionEvent::ReticleHidden);
            }
        }

        let chest = self.placement.chest_position();
        if let Some(reading) = self.distance.update(input.camera, chest) {
            self.events.push(SessionEvent::DistanceChanged(reading.distance));
            if reading.revealed_now {
                if let Some(anchor) = chest {
                    self.stream.reveal(anchor);
                    self.events.push(SessionEvent::CodeEntryRevealed { anchor });
                }
            }
        }

        self.stream = std::mem::take(&mut self.stream).step();

        if let Some(coin) = self.coin.take() {
            self.coin = Some(coin.step(input.now_ms));
        }

        self.advance_timeline(input.now_ms);
    }

    /// Feed the keypad's full raw value
    pub fn enter_code(&mut self, raw: &str, now_ms: f64) -> CodeEntry {
        let entry = self.code.input(raw);
        match entry.outcome {
            CodeOutcome::Accepted => {
                self.distance.disable();
                self.events.push(SessionEvent::CodeAccepted);
                if self.timeline.trigger(now_ms) {
                    self.events.push(SessionEvent::TimelineStarted {
                        deadlines: self.timeline.pending_deadlines(),
                    });
                }
                self.advance_timeline(now_ms);
            }
            CodeOutcome::Rejected => {
                self.events.push(SessionEvent::CodeRejected);
                self.events.push(SessionEvent::PlaySound(Sound::CodeRejected));
            }
            CodeOutcome::Incomplete | CodeOutcome::Ignored => {}
        }
        entry
    }

    /// Run every reward step that is due; safe to call from timers and frames alike
    pub fn advance_timeline(&mut self, now_ms: f64) {
        for action in self.timeline.due(now_ms) {
            self.apply(action, now_ms);
        }
    }

    fn apply(&mut self, action: RewardAction, now_ms: f64) {
        let chest = self.placement.chest_position();
        let has_clip = chest.is_some() && self.assets.chest_animation;

        match action {
            RewardAction::StartChestAnimation => {
                if has_clip {
                    self.events.push(SessionEvent::ChestAnimationStarted);
                }
            }
            RewardAction::PlayChestOpenSound => {
                self.events.push(SessionEvent::PlaySound(Sound::ChestOpen));
            }
            RewardAction::PopCoin => {
                if let Some(chest) = chest {
                    let coin = Coin::pop(chest, now_ms);
                    self.events.push(SessionEvent::CoinPopped {
                        position: coin.position,
                    });
                    self.coin = Some(coin);
                }
            }
            RewardAction::FreezeChestAnimation => {
                if has_clip {
                    self.events.push(SessionEvent::ChestAnimationFrozen);
                }
            }
            RewardAction::Celebrate => {
                if chest.is_none() {
                    return;
                }
                self.events.push(SessionEvent::PlaySound(Sound::Celebration));
                if self.fireworks_enabled {
                    let burst = self.fireworks.start(chest, &mut self.rng);
                    self.push_firework_events(burst);
                }
                self.events.push(SessionEvent::PlaySound(Sound::Victory));
            }
            RewardAction::RevealEndScreen => {
                self.events.push(SessionEvent::EndScreenRevealed);
            }
        }
    }

    fn push_firework_events(&mut self, events: Vec<FireworkEvent>) {
        for event in events {
            let exploded = matches!(event, FireworkEvent::Exploded { .. });
            self.events.push(SessionEvent::Firework(event));
            if exploded {
                self.events.push(SessionEvent::PlaySound(Sound::Firework));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "7 8 12 6 5 127 3 10 8";

    fn session(assets: AssetStatus) -> Session {
        Session::new(&Tuning::default(), &Settings::default(), assets, 7)
    }

    fn floor() -> Mat4 {
        Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
    }

    fn frame(session: &mut Session, now_ms: f64, camera: Vec3, hits: &[Mat4]) -> Vec<SessionEvent> {
        session.frame(&FrameInput { now_ms, camera, hits });
        session.drain_events()
    }

    fn count(events: &[SessionEvent], wanted: &SessionEvent) -> usize {
        events.iter().filter(|e| *e == wanted).count()
    }

    #[test]
    fn test_reticle_tracks_until_placed() {
        let mut s = session(AssetStatus::ready());
        let far = Vec3::new(0.0, 0.0, 20.0);

        assert_eq!(frame(&mut s, 0.0, far, &[]), vec![SessionEvent::ReticleHidden]);

        let events = frame(&mut s, 16.0, far, &[floor()]);
        assert!(matches!(events[0], SessionEvent::AssetsPlaced(_)));
        assert_eq!(events[1], SessionEvent::ReticleHidden);

        // Hit-testing is over once placed
        let events = frame(&mut s, 32.0, far, &[floor()]);
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::AssetsPlaced(_) | SessionEvent::ReticleMoved(_))));
    }

    #[test]
    fn test_missing_models_keep_reticle_moving() {
        let mut s = session(AssetStatus::default());
        for i in 0..3 {
            let events = frame(&mut s, i as f64 * 16.0, Vec3::ZERO, &[floor()]);
            assert_eq!(events, vec![SessionEvent::ReticleMoved(floor())]);
        }
        assert!(s.placement().is_none());
    }

    #[test]
    fn test_reveal_when_close() {
        let mut s = session(AssetStatus::ready());
        frame(&mut s, 0.0, Vec3::ZERO, &[floor()]);
        let chest = s.placement().unwrap().chest.position;

        let far = frame(&mut s, 16.0, chest + Vec3::Z * 3.0, &[]);
        assert_eq!(far.len(), 1);
        let SessionEvent::DistanceChanged(d) = far[0] else {
            panic!("expected a distance reading, got {:?}", far[0]);
        };
        assert!((d - 3.0).abs() < 1e-4);

        let near = frame(&mut s, 32.0, chest + Vec3::Z * 2.0, &[]);
        assert!(near.contains(&SessionEvent::CodeEntryRevealed { anchor: chest }));
        assert!(s.stream().visible);

        let back = frame(&mut s, 48.0, chest + Vec3::Z * 3.0, &[]);
        assert!(!back.iter().any(|e| matches!(e, SessionEvent::CodeEntryRevealed { .. })));
        assert!(s.is_revealed());
    }

    #[test]
    fn test_wrong_code_buzzes() {
        let mut s = session(AssetStatus::ready());
        let entry = s.enter_code("7 8 12 6 5 127 3 10 9", 0.0);
        assert_eq!(entry.outcome, CodeOutcome::Rejected);
        assert_eq!(
            s.drain_events(),
            vec![SessionEvent::CodeRejected, SessionEvent::PlaySound(Sound::CodeRejected)]
        );
        assert!(s.timeline().triggered_at().is_none());
    }

    #[test]
    fn test_accept_starts_timeline_and_stops_distance() {
        let mut s = session(AssetStatus::ready());
        frame(&mut s, 0.0, Vec3::ZERO, &[floor()]);
        s.drain_events();

        let entry = s.enter_code("781265127310 8", 1000.0);
        assert_eq!(entry.outcome, CodeOutcome::Accepted);
        assert_eq!(entry.display, "");

        let events = s.drain_events();
        assert_eq!(events[0], SessionEvent::CodeAccepted);
        assert_eq!(
            events[1],
            SessionEvent::TimelineStarted {
                deadlines: vec![1000.0, 1000.0, 5000.0, 6000.0, 8000.0, 20_000.0]
            }
        );
        assert_eq!(events[2], SessionEvent::ChestAnimationStarted);
        assert_eq!(events[3], SessionEvent::PlaySound(Sound::ChestOpen));

        // Distance readout stops for good
        let events = frame(&mut s, 1016.0, Vec3::ZERO, &[]);
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::DistanceChanged(_))));

        // Typing the code again does nothing
        assert_eq!(s.enter_code(CODE, 1100.0).outcome, CodeOutcome::Ignored);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_reward_sequence_without_placement_is_inert() {
        let mut s = session(AssetStatus::ready());
        s.enter_code(CODE, 0.0);
        s.advance_timeline(30_000.0);
        let events = s.drain_events();

        assert_eq!(count(&events, &SessionEvent::PlaySound(Sound::ChestOpen)), 1);
        assert_eq!(count(&events, &SessionEvent::EndScreenRevealed), 1);
        assert_eq!(count(&events, &SessionEvent::ChestAnimationStarted), 0);
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::CoinPopped { .. })));
        assert!(!s.fireworks_active());
    }

    #[test]
    fn test_missing_clip_skips_animation_only() {
        let assets = AssetStatus {
            models: true,
            chest_animation: false,
        };
        let mut s = session(assets);
        frame(&mut s, 0.0, Vec3::ZERO, &[floor()]);
        s.enter_code(CODE, 0.0);
        s.advance_timeline(8000.0);
        let events = s.drain_events();

        assert_eq!(count(&events, &SessionEvent::ChestAnimationStarted), 0);
        assert_eq!(count(&events, &SessionEvent::ChestAnimationFrozen), 0);
        assert_eq!(count(&events, &SessionEvent::PlaySound(Sound::Celebration)), 1);
        assert!(s.coin().is_some());
    }

    #[test]
    fn test_celebrate_bursts_with_explosion_sounds() {
        let mut s = session(AssetStatus::ready());
        frame(&mut s, 0.0, Vec3::ZERO, &[floor()]);
        s.enter_code(CODE, 0.0);
        s.advance_timeline(7000.0);
        let events = s.drain_events();

        assert!(s.fireworks_active());
        assert_eq!(s.fireworks().len(), 10);
        assert_eq!(count(&events, &SessionEvent::PlaySound(Sound::Firework)), 10);
        assert_eq!(count(&events, &SessionEvent::PlaySound(Sound::Victory)), 1);
    }

    #[test]
    fn test_fireworks_off_still_celebrates() {
        let settings = Settings {
            fireworks: false,
            ..Settings::default()
        };
        let mut s = Session::new(&Tuning::default(), &settings, AssetStatus::ready(), 7);
        frame(&mut s, 0.0, Vec3::ZERO, &[floor()]);
        s.enter_code(CODE, 0.0);
        s.advance_timeline(7000.0);
        let events = s.drain_events();

        assert!(s.fireworks().is_empty());
        assert_eq!(count(&events, &SessionEvent::PlaySound(Sound::Celebration)), 1);
    }

    #[test]
    fn test_coin_follows_frames() {
        let mut s = session(AssetStatus::ready());
        frame(&mut s, 0.0, Vec3::ZERO, &[floor()]);
        s.enter_code(CODE, 0.0);
        s.advance_timeline(4000.0);
        let start = s.coin().unwrap().position;

        frame(&mut s, 6000.0, Vec3::ZERO, &[]);
        let coin = s.coin().unwrap();
        assert!((coin.position.y - (start.y + 0.8)).abs() < 1e-5);
        assert!(coin.spin > 0.0);
    }
}
