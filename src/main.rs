//! Escape AR entry point
//!
//! On the web this hands off to the platform layer. Natively there is no AR
//! device, so it walks a scripted session end to end on a virtual clock.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = escape_ar::platform::run().await {
        log::error!("Escape AR failed to start: {:?}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Escape AR (native) starting...");
    log::info!("Native mode has no WebXR device - serve the wasm build over https for the real thing");

    println!("\nRunning headless session walkthrough...");
    headless_walkthrough();
}

/// Place, approach, unlock, then let the reward sequence run out
#[cfg(not(target_arch = "wasm32"))]
fn headless_walkthrough() {
    use escape_ar::sim::{AssetStatus, Clock, FrameInput, Session, SessionEvent, Sound, VirtualClock};
    use escape_ar::{Settings, Tuning};
    use glam::{Mat4, Vec3};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    let tuning = Tuning::load();
    let settings = Settings::load();
    let clock = VirtualClock::new();
    let mut session = Session::new(&tuning, &settings, AssetStatus::ready(), 42);

    let floor = [Mat4::from_translation(Vec3::new(0.0, -1.0, -1.5))];
    let mut camera = Vec3::new(0.0, -2.0, 8.0);
    let log_events = |events: Vec<SessionEvent>, counts: &mut [usize; 4]| {
        for event in events {
            match event {
                SessionEvent::AssetsPlaced(_) => counts[0] += 1,
                SessionEvent::CodeEntryRevealed { .. } => counts[1] += 1,
                SessionEvent::PlaySound(Sound::Firework) => counts[2] += 1,
                SessionEvent::EndScreenRevealed => counts[3] += 1,
                SessionEvent::DistanceChanged(_) | SessionEvent::Firework(_) => continue,
                _ => {}
            }
            log::info!("{:>8.0} ms  {:?}", clock.now_ms(), event);
        }
    };

    // [placed, revealed, explosions, end screens]
    let mut counts = [0usize; 4];

    // Walk towards the chest until the keypad shows
    while !session.is_revealed() && clock.now_ms() < 10_000.0 {
        session.frame(&FrameInput {
            now_ms: clock.now_ms(),
            camera,
            hits: &floor,
        });
        log_events(session.drain_events(), &mut counts);
        camera.z -= 0.05;
        clock.advance(FRAME_MS);
    }
    assert_eq!(counts[0], 1, "chest should be placed exactly once");
    assert_eq!(counts[1], 1, "keypad should be revealed");
    println!("✓ Chest placed and keypad revealed at {:.0} ms", clock.now_ms());

    let wrong = session.enter_code("7 8 12 6 5 127 3 10 9", clock.now_ms());
    log_events(session.drain_events(), &mut counts);
    assert!(!session.is_unlocked(), "wrong code must not unlock ({:?})", wrong.outcome);

    session.enter_code("781265127310 8", clock.now_ms());
    log_events(session.drain_events(), &mut counts);
    assert!(session.is_unlocked());
    println!("✓ Code accepted at {:.0} ms", clock.now_ms());

    let end = clock.now_ms() + tuning.timeline.end_screen_ms as f64 + 1000.0;
    while clock.now_ms() < end {
        clock.advance(FRAME_MS);
        session.frame(&FrameInput {
            now_ms: clock.now_ms(),
            camera,
            hits: &[],
        });
        log_events(session.drain_events(), &mut counts);
    }

    assert_eq!(counts[3], 1, "end screen should be revealed exactly once");
    assert!(session.timeline().is_finished());
    println!(
        "✓ Reward sequence finished ({} firework explosions, {} live fireworks)",
        counts[2],
        session.fireworks().len()
    );
    println!("  seed {} over {} frames", session.seed(), session.frames());
}
