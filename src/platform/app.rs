//! App wiring: startup, AR session lifecycle, frame loop and reward timers
//!
//! State is shared between the frame closure, DOM listeners and timers as
//! `Rc<RefCell<_>>`. The browser never runs two of them at once, so a borrow
//! is only ever held for the duration of one callback.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Mat4;
use wasm_bindgen::prelude::*;

use super::overlay::Overlay;
use super::stage::Stage;
use super::PerformanceClock;
use crate::audio::AudioManager;
use crate::settings::Settings;
use crate::sim::{
    AssetStatus, Clock, FireworkEvent, FrameInput, GateCommand, Session, SessionEvent, SessionGate,
    XrAvailability, format_distance,
};
use crate::tuning::Tuning;

type Shared<T> = Rc<RefCell<T>>;

/// Everything that outlives a single AR session
struct App {
    tuning: Tuning,
    settings: Settings,
    stage: Stage,
    overlay: Overlay,
    audio: AudioManager,
    clock: PerformanceClock,
    gate: SessionGate,
    assets: AssetStatus,
    page_url: String,
    session: Option<Shared<Session>>,
    frame_loop: Option<Closure<dyn FnMut(f64, JsValue)>>,
    last_frame_time: Option<f64>,
}

impl App {
    fn refresh_button(&mut self) {
        let view = self.gate.view(&self.page_url);
        self.overlay.show_button(&view);
        self.overlay.set_intro_visible(self.gate.intro_visible());
    }

    /// Mirror one session event onto the stage, overlay and speakers
    fn apply(&mut self, event: SessionEvent, session: &Session) {
        match event {
            SessionEvent::ReticleMoved(pose) => self.stage.set_reticle(&pose),
            SessionEvent::ReticleHidden => self.stage.hide_reticle(),
            SessionEvent::AssetsPlaced(placement) => {
                self.stage.place_assets(&placement);
                self.overlay.show_distance();
            }
            SessionEvent::DistanceChanged(d) => self.overlay.set_distance(&format_distance(d)),
            SessionEvent::CodeEntryRevealed { anchor } => {
                self.overlay.reveal_code_entry();
                if !session.stream().positions.is_empty() {
                    self.stage.show_stream(anchor, &session.stream().positions);
                }
            }
            SessionEvent::CodeAccepted => self.overlay.hide_code_entry(),
            SessionEvent::CodeRejected => self.overlay.flash_code_error(self.tuning.code.error_flash_ms),
            // Scheduled by `pump`, which owns the shared handles
            SessionEvent::TimelineStarted { .. } => {}
            SessionEvent::ChestAnimationStarted => self.stage.play_chest_animation(),
            SessionEvent::ChestAnimationFrozen => self.stage.freeze_chest_animation(),
            SessionEvent::CoinPopped { position } => {
                self.stage.add_coin(&self.tuning.assets.coin_texture, position)
            }
            SessionEvent::PlaySound(sound) => self.audio.play(sound),
            SessionEvent::EndScreenRevealed => self.overlay.show_end_screen(),
            SessionEvent::Firework(FireworkEvent::Spawned { id, color, particles }) => {
                self.stage.add_firework(id, color, particles)
            }
            SessionEvent::Firework(FireworkEvent::Removed { id }) => self.stage.remove_firework(id),
            SessionEvent::Firework(FireworkEvent::Exploded { .. }) => {}
        }
    }

    /// Push continuous state to the stage and draw
    fn sync_and_render(&mut self, session: &Session, timestamp: f64) {
        let dt = self
            .last_frame_time
            .map(|last| ((timestamp - last) / 1000.0) as f32)
            .unwrap_or(0.0);
        self.last_frame_time = Some(timestamp);
        self.stage.update_mixer(dt);

        for firework in session.fireworks() {
            self.stage
                .update_firework(firework.id, &firework.positions, &firework.sizes);
        }

        let stream = session.stream();
        if stream.visible && !stream.positions.is_empty() {
            self.stage.update_stream(&stream.positions);
        }

        if let Some(coin) = session.coin() {
            self.stage.set_coin(coin.position, coin.spin);
        }

        self.stage.render();
    }
}

/// Apply everything the session queued
fn pump(app: &Shared<App>, session: &Shared<Session>) {
    let events = session.borrow_mut().drain_events();
    for event in events {
        match event {
            SessionEvent::TimelineStarted { deadlines } => schedule_timeline(app, session, &deadlines),
            other => app.borrow_mut().apply(other, &session.borrow()),
        }
    }
}

/// One timeout per future deadline; a timer outliving its AR session does nothing
fn schedule_timeline(app: &Shared<App>, session: &Shared<Session>, deadlines: &[f64]) {
    let Some(window) = web_sys::window() else { return };
    let (now, generation) = {
        let a = app.borrow();
        (a.clock.now_ms(), a.gate.generation())
    };

    let mut previous = None;
    for &deadline in deadlines {
        if deadline <= now || previous == Some(deadline) {
            continue;
        }
        previous = Some(deadline);

        let app = app.clone();
        let session = session.clone();
        let callback = Closure::once_into_js(move || {
            if !app.borrow().gate.is_current(generation) {
                log::debug!("Dropping reward step from an ended session");
                return;
            }
            // Timers can fire a hair early relative to performance.now()
            let now = app.borrow().clock.now_ms().max(deadline);
            session.borrow_mut().advance_timeline(now);
            pump(&app, &session);
        });
        let delay = (deadline - now).ceil() as i32;
        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
        {
            log::error!("Failed to schedule reward step: {:?}", e);
        }
    }
}

fn on_frame(app: &Shared<App>, timestamp: f64, frame: JsValue) {
    if frame.is_undefined() || frame.is_null() {
        return;
    }
    let Some(session) = app.borrow().session.clone() else {
        return;
    };

    let (now_ms, camera, hits) = {
        let a = app.borrow();
        let hits: Vec<Mat4> = a.stage.hit_pose(&frame).into_iter().collect();
        (a.clock.now_ms(), a.stage.camera_position(), hits)
    };

    session.borrow_mut().frame(&FrameInput {
        now_ms,
        camera,
        hits: &hits,
    });
    pump(app, &session);
    app.borrow_mut().sync_and_render(&session.borrow(), timestamp);
}

async fn start_session(app: Shared<App>) {
    let (stage, root) = {
        let a = app.borrow();
        (a.stage.clone(), a.overlay.root().clone())
    };

    if let Err(e) = stage.start_session(&root).await {
        log::error!("{}", e);
        let mut a = app.borrow_mut();
        a.gate.request_failed();
        a.refresh_button();
        return;
    }

    let seed = js_sys::Date::now() as u64;
    let mut a = app.borrow_mut();
    let session = Session::new(&a.tuning, &a.settings, a.assets, seed);
    a.session = Some(Rc::new(RefCell::new(session)));
    a.gate.session_started();
    a.last_frame_time = None;
    a.refresh_button();

    let frame_app = app.clone();
    let frame_loop = Closure::<dyn FnMut(f64, JsValue)>::new(move |timestamp: f64, frame: JsValue| {
        on_frame(&frame_app, timestamp, frame);
    });
    a.stage.set_animation_loop(Some(frame_loop.as_ref().unchecked_ref()));
    a.frame_loop = Some(frame_loop);

    log::info!("AR session started");
}

fn end_session(app: &Shared<App>) {
    let mut a = app.borrow_mut();
    a.session = None;
    a.frame_loop = None;
    a.gate.session_ended();
    a.overlay.session_ended();
    a.stage.reset_scene();
    a.refresh_button();
    log::info!("AR session ended");
}

fn setup_button(app: &Shared<App>) {
    let button = app.borrow().overlay.button().clone();
    let app = app.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
        let command = {
            let mut a = app.borrow_mut();
            let command = a.gate.click();
            a.refresh_button();
            command
        };
        match command {
            GateCommand::RequestSession => {
                app.borrow().audio.resume();
                wasm_bindgen_futures::spawn_local(start_session(app.clone()));
            }
            GateCommand::EndSession => app.borrow().stage.end_session(),
            GateCommand::Nothing => {}
        }
    });
    let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn setup_code_input(app: &Shared<App>) {
    let input = app.borrow().overlay.code_input().clone();
    let app = app.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        let Some(session) = app.borrow().session.clone() else {
            return;
        };
        let raw = app.borrow().overlay.code_input().value();
        let now = app.borrow().clock.now_ms();
        let entry = session.borrow_mut().enter_code(&raw, now);
        app.borrow().overlay.set_code_display(&entry.display);
        pump(&app, &session);
    });
    let _ = input.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn setup_session_end(app: &Shared<App>) {
    let stage = app.borrow().stage.clone();
    let app = app.clone();
    let closure = Closure::<dyn FnMut()>::new(move || end_session(&app));
    stage.on_session_end(closure.as_ref().unchecked_ref());
    closure.forget();
}

fn setup_resize(app: &Shared<App>) {
    let Some(window) = web_sys::window() else { return };
    let app = app.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        let Some(window) = web_sys::window() else { return };
        let width = window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(1.0);
        let height = window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or(1.0);
        app.borrow().stage.resize(width.max(1.0) as u32, height.max(1.0) as u32);
    });
    let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Settings from LocalStorage, with URL overrides persisted
fn load_settings(window: &web_sys::Window) -> Settings {
    let mut settings = Settings::load();
    let query = window.location().search().unwrap_or_default();
    if settings.apply_query(&query) {
        log::info!("Settings overridden from URL ({})", settings.quality.as_str());
        settings.save();
    }
    settings
}

pub async fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialised".into());
    }

    log::info!("Escape AR starting...");

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;

    let tuning = Tuning::load();
    let settings = load_settings(&window);

    let stage = Stage::create().map_err(|e| JsValue::from_str(&e.to_string()))?;
    body.append_child(&stage.canvas())?;
    let overlay = Overlay::build(&document)?;

    if let Err(e) = stage.load_environment(&tuning.assets.environment).await {
        log::error!("{}", e);
    } else {
        log::info!("Environment loaded");
    }

    let assets = match stage
        .load_models(&tuning.assets.chest_model, &tuning.assets.marker_model)
        .await
    {
        Ok(has_clip) => {
            log::info!("Models loaded (opening clip: {})", has_clip);
            AssetStatus {
                models: true,
                chest_animation: has_clip,
            }
        }
        Err(e) => {
            log::error!("{}", e);
            AssetStatus::default()
        }
    };

    let audio = AudioManager::new(&tuning.assets, &settings);
    let page_url = window.location().href().unwrap_or_default();

    let app = Rc::new(RefCell::new(App {
        tuning,
        settings,
        stage,
        overlay,
        audio,
        clock: PerformanceClock::new(),
        gate: SessionGate::new(),
        assets,
        page_url,
        session: None,
        frame_loop: None,
        last_frame_time: None,
    }));

    setup_button(&app);
    setup_code_input(&app);
    setup_session_end(&app);
    setup_resize(&app);

    let (has_xr, ar_supported) = Stage::probe_ar().await;
    let availability = XrAvailability::detect(has_xr, window.is_secure_context(), ar_supported);
    {
        let mut a = app.borrow_mut();
        a.gate.set_availability(availability);
        a.refresh_button();
    }

    log::info!("Escape AR ready");
    Ok(())
}
