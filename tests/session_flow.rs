//! End-to-end session flows driven through the public API on a virtual clock

use escape_ar::sim::{
    AssetStatus, ButtonView, Clock, FireworkColor, FireworkEvent, FireworksController, FrameInput,
    GateCommand, Session, SessionEvent, SessionGate, SessionPhase, Sound, VirtualClock, XrAvailability,
};
use escape_ar::tuning::FireworkTuning;
use escape_ar::{Settings, Tuning};
use glam::{Mat4, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;

const CODE: &str = "7 8 12 6 5 127 3 10 8";
const FRAME_MS: f64 = 16.0;

fn hit() -> Mat4 {
    Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
}

/// Session with the chest already placed; returns the chest position
fn placed_session(clock: &VirtualClock, seed: u64) -> (Session, Vec3) {
    let mut session = Session::new(&Tuning::default(), &Settings::default(), AssetStatus::ready(), seed);
    session.frame(&FrameInput {
        now_ms: clock.now_ms(),
        camera: Vec3::new(0.0, 0.0, 50.0),
        hits: &[hit()],
    });
    let chest = session.placement().expect("placed on first hit").chest.position;
    session.drain_events();
    (session, chest)
}

fn step(session: &mut Session, clock: &VirtualClock, camera: Vec3) -> Vec<SessionEvent> {
    clock.advance(FRAME_MS);
    session.frame(&FrameInput {
        now_ms: clock.now_ms(),
        camera,
        hits: &[hit()],
    });
    session.drain_events()
}

fn count(events: &[SessionEvent], pred: impl Fn(&SessionEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[test]
fn test_reveal_survives_walking_away() {
    let clock = VirtualClock::new();
    let (mut session, chest) = placed_session(&clock, 1);

    let mut events = Vec::new();
    for d in [3.0, 2.0, 3.0] {
        events.extend(step(&mut session, &clock, chest + Vec3::new(0.0, 0.0, d)));
    }

    let distances: Vec<f32> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::DistanceChanged(d) => Some(*d),
            _ => None,
        })
        .collect();
    assert_eq!(distances.len(), 3);
    for (got, want) in distances.iter().zip([3.0, 2.0, 3.0]) {
        assert!((got - want).abs() < 1e-4, "distance {} != {}", got, want);
    }

    assert_eq!(
        count(&events, |e| matches!(e, SessionEvent::CodeEntryRevealed { .. })),
        1
    );
    assert!(session.is_revealed());
}

#[test]
fn test_accepting_twice_starts_timeline_once() {
    let clock = VirtualClock::new();
    let (mut session, chest) = placed_session(&clock, 2);
    step(&mut session, &clock, chest + Vec3::Z);

    session.enter_code(CODE, clock.now_ms());
    let first = session.drain_events();
    assert!(first.contains(&SessionEvent::CodeAccepted));
    assert_eq!(
        count(&first, |e| matches!(e, SessionEvent::TimelineStarted { .. })),
        1
    );
    let triggered = session.timeline().triggered_at();

    // Retyping (or a paste) after unlock is ignored
    session.enter_code(CODE, clock.now_ms() + 500.0);
    assert!(session.drain_events().is_empty());
    assert_eq!(session.timeline().triggered_at(), triggered);
}

#[test]
fn test_distance_stops_after_unlock() {
    let clock = VirtualClock::new();
    let (mut session, chest) = placed_session(&clock, 3);
    step(&mut session, &clock, chest + Vec3::Z);
    session.enter_code(CODE, clock.now_ms());
    session.drain_events();

    let events = step(&mut session, &clock, chest + Vec3::new(0.0, 0.0, 5.0));
    assert_eq!(count(&events, |e| matches!(e, SessionEvent::DistanceChanged(_))), 0);
}

#[test]
fn test_timeline_runs_from_deadlines_alone() {
    let clock = VirtualClock::new();
    clock.set(1000.0);
    let (mut session, chest) = placed_session(&clock, 4);
    step(&mut session, &clock, chest + Vec3::Z);

    session.enter_code(CODE, clock.now_ms());
    let mut events = session.drain_events();
    let deadlines = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::TimelineStarted { deadlines } => Some(deadlines.clone()),
            _ => None,
        })
        .expect("timeline started");
    assert!(deadlines.windows(2).all(|w| w[0] <= w[1]));

    // No frames at all: only the timers a browser would schedule
    for deadline in deadlines {
        session.advance_timeline(deadline);
        events.extend(session.drain_events());
    }

    let position = |wanted: &SessionEvent| {
        events
            .iter()
            .position(|e| e == wanted)
            .unwrap_or_else(|| panic!("missing {:?}", wanted))
    };
    let open = position(&SessionEvent::PlaySound(Sound::ChestOpen));
    let animation = position(&SessionEvent::ChestAnimationStarted);
    let frozen = position(&SessionEvent::ChestAnimationFrozen);
    let celebration = position(&SessionEvent::PlaySound(Sound::Celebration));
    let victory = position(&SessionEvent::PlaySound(Sound::Victory));
    let end = position(&SessionEvent::EndScreenRevealed);
    let coin = events
        .iter()
        .position(|e| matches!(e, SessionEvent::CoinPopped { .. }))
        .expect("coin popped");

    assert!(animation < coin && open < coin);
    assert!(coin < frozen);
    assert!(frozen < celebration);
    assert!(celebration < victory);
    assert!(victory < end);
    assert!(session.timeline().is_finished());
    assert!(session.fireworks_active());
    assert_eq!(count(&events, |e| *e == SessionEvent::EndScreenRevealed), 1);
}

#[test]
fn test_same_seed_same_show() {
    let run = |seed: u64| {
        let clock = VirtualClock::new();
        let (mut session, chest) = placed_session(&clock, seed);
        let mut events = step(&mut session, &clock, chest + Vec3::Z);
        session.enter_code(CODE, clock.now_ms());
        events.extend(session.drain_events());
        for _ in 0..1500 {
            events.extend(step(&mut session, &clock, chest + Vec3::Z));
        }
        events
    };

    let a = run(99);
    assert_eq!(a, run(99));
    assert!(count(&a, |e| matches!(e, SessionEvent::Firework(FireworkEvent::Spawned { .. }))) >= 10);
}

#[test]
fn test_burst_spreads_hues_evenly() {
    let mut rng = Pcg32::seed_from_u64(5);
    let mut controller = FireworksController::new(FireworkTuning::default(), 20, true);
    let anchor = Vec3::new(0.0, -1.5, -2.0);

    let events = controller.burst(10, Some(anchor), &mut rng);
    assert_eq!(count_spawned(&events), 10);
    assert_eq!(controller.fireworks().len(), 10);

    for (i, firework) in controller.fireworks().iter().enumerate() {
        assert_eq!(firework.color, FireworkColor::Hue(i as f32 / 10.0));
        assert!(firework.is_exploded());
        let offset = firework.position - anchor;
        assert!(Vec3::new(offset.x, 0.0, offset.z).length() <= 2.0 + 1e-4);
        assert!((-1e-4..=1.5 + 1e-4).contains(&offset.y));
    }

    assert!(controller.burst(10, None, &mut rng).is_empty());
}

fn count_spawned(events: &[FireworkEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, FireworkEvent::Spawned { .. }))
        .count()
}

#[test]
fn test_gate_round_trip() {
    let mut gate = SessionGate::new();
    gate.set_availability(XrAvailability::detect(true, true, Some(true)));
    assert_eq!(gate.view("https://example.com/"), ButtonView::Active { label: "Enter AR" });

    assert_eq!(gate.click(), GateCommand::RequestSession);
    assert_eq!(gate.click(), GateCommand::Nothing);
    gate.session_started();
    assert_eq!(gate.phase(), SessionPhase::Active);
    assert_eq!(gate.view("https://example.com/"), ButtonView::Active { label: "Exit AR" });

    assert_eq!(gate.click(), GateCommand::EndSession);
    gate.session_ended();
    assert_eq!(gate.phase(), SessionPhase::Idle);
    assert!(!gate.intro_visible());
}
