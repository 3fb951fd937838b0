//! Bindings to the three.js stage in `web/stage.js`

use glam::{Mat4, Vec3};
use js_sys::Function;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlCanvasElement};

use super::describe;
use crate::sim::placement::PlacedAsset;
use crate::sim::Placement;

/// Stage failures; every one of them degrades a feature rather than stopping the app
#[derive(Error, Debug)]
pub enum StageError {
    /// The renderer could not be created
    #[error("Stage initialisation failed: {reason}")]
    Init { reason: String },

    /// An asset failed to load
    #[error("Failed to load {what} from {url}: {reason}")]
    Asset {
        /// Which asset ("environment", "models")
        what: &'static str,
        url: String,
        reason: String,
    },

    /// The immersive session request was refused or failed part-way
    #[error("AR session request failed: {reason}")]
    Session { reason: String },
}

#[wasm_bindgen(module = "/web/stage.js")]
extern "C" {
    #[derive(Debug, Clone)]
    pub type Stage;

    #[wasm_bindgen(constructor, catch)]
    fn new() -> Result<Stage, JsValue>;

    #[wasm_bindgen(method, getter)]
    pub fn canvas(this: &Stage) -> HtmlCanvasElement;

    #[wasm_bindgen(static_method_of = Stage, js_name = hasXr)]
    fn has_xr() -> bool;

    #[wasm_bindgen(static_method_of = Stage, js_name = isArSupported, catch)]
    async fn is_ar_supported() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = loadEnvironment)]
    async fn load_environment_raw(this: &Stage, url: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = loadModels)]
    async fn load_models_raw(this: &Stage, chest_url: &str, marker_url: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = startSession)]
    async fn start_session_raw(this: &Stage, overlay_root: &Element) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, js_name = endSession)]
    pub fn end_session(this: &Stage);

    #[wasm_bindgen(method, js_name = onSessionEnd)]
    pub fn on_session_end(this: &Stage, callback: &Function);

    #[wasm_bindgen(method, js_name = setAnimationLoop)]
    pub fn set_animation_loop(this: &Stage, callback: Option<&Function>);

    #[wasm_bindgen(method, js_name = hitPose)]
    fn hit_pose_raw(this: &Stage, frame: &JsValue) -> Option<Vec<f32>>;

    #[wasm_bindgen(method, js_name = cameraPosition)]
    fn camera_position_raw(this: &Stage) -> Vec<f32>;

    #[wasm_bindgen(method, js_name = setReticle)]
    fn set_reticle_raw(this: &Stage, matrix: &[f32]);

    #[wasm_bindgen(method, js_name = hideReticle)]
    pub fn hide_reticle(this: &Stage);

    #[wasm_bindgen(method, js_name = placeAssets)]
    fn place_assets_raw(
        this: &Stage,
        chest_position: &[f32],
        chest_scale: &[f32],
        marker_position: &[f32],
        marker_scale: &[f32],
    );

    #[wasm_bindgen(method, js_name = playChestAnimation)]
    pub fn play_chest_animation(this: &Stage);

    #[wasm_bindgen(method, js_name = freezeChestAnimation)]
    pub fn freeze_chest_animation(this: &Stage);

    #[wasm_bindgen(method, js_name = updateMixer)]
    pub fn update_mixer(this: &Stage, dt: f32);

    #[wasm_bindgen(method, js_name = addCoin)]
    fn add_coin_raw(this: &Stage, texture_url: &str, position: &[f32]);

    #[wasm_bindgen(method, js_name = setCoin)]
    fn set_coin_raw(this: &Stage, position: &[f32], spin: f32);

    #[wasm_bindgen(method, js_name = addFirework)]
    fn add_firework_raw(this: &Stage, id: u32, rgb: &[f32], count: usize);

    #[wasm_bindgen(method, js_name = updateFirework)]
    fn update_firework_raw(this: &Stage, id: u32, positions: &[f32], sizes: &[f32]);

    #[wasm_bindgen(method, js_name = removeFirework)]
    pub fn remove_firework(this: &Stage, id: u32);

    #[wasm_bindgen(method, js_name = showStream)]
    fn show_stream_raw(this: &Stage, anchor: &[f32], positions: &[f32]);

    #[wasm_bindgen(method, js_name = updateStream)]
    fn update_stream_raw(this: &Stage, positions: &[f32]);

    /// Remove everything placed during a session (chest, marker, coin, stream, fireworks)
    #[wasm_bindgen(method, js_name = resetScene)]
    pub fn reset_scene(this: &Stage);

    #[wasm_bindgen(method)]
    pub fn resize(this: &Stage, width: u32, height: u32);

    #[wasm_bindgen(method)]
    pub fn render(this: &Stage);
}

impl Stage {
    pub fn create() -> Result<Self, StageError> {
        Stage::new().map_err(|e| StageError::Init { reason: describe(&e) })
    }

    /// Availability inputs for the session gate: (has WebXR, AR support query result)
    pub async fn probe_ar() -> (bool, Option<bool>) {
        if !Stage::has_xr() {
            return (false, None);
        }
        match Stage::is_ar_supported().await {
            Ok(supported) => (true, supported.as_bool()),
            Err(e) => {
                log::warn!("AR support query failed: {}", describe(&e));
                (true, None)
            }
        }
    }

    pub async fn load_environment(&self, url: &str) -> Result<(), StageError> {
        self.load_environment_raw(url)
            .await
            .map(|_| ())
            .map_err(|e| StageError::Asset {
                what: "environment",
                url: url.to_string(),
                reason: describe(&e),
            })
    }

    /// Load chest and marker; `Ok(true)` if the chest has an opening clip
    pub async fn load_models(&self, chest_url: &str, marker_url: &str) -> Result<bool, StageError> {
        self.load_models_raw(chest_url, marker_url)
            .await
            .map(|has_clip| has_clip.as_bool().unwrap_or(false))
            .map_err(|e| StageError::Asset {
                what: "models",
                url: format!("{}, {}", chest_url, marker_url),
                reason: describe(&e),
            })
    }

    pub async fn start_session(&self, overlay_root: &Element) -> Result<(), StageError> {
        self.start_session_raw(overlay_root)
            .await
            .map(|_| ())
            .map_err(|e| StageError::Session { reason: describe(&e) })
    }

    /// Closest hit pose for this XR frame
    pub fn hit_pose(&self, frame: &JsValue) -> Option<Mat4> {
        let matrix = self.hit_pose_raw(frame)?;
        let cols: &[f32; 16] = matrix.as_slice().try_into().ok()?;
        Some(Mat4::from_cols_array(cols))
    }

    pub fn camera_position(&self) -> Vec3 {
        let p = self.camera_position_raw();
        match p.as_slice() {
            [x, y, z] => Vec3::new(*x, *y, *z),
            _ => Vec3::ZERO,
        }
    }

    pub fn set_reticle(&self, pose: &Mat4) {
        self.set_reticle_raw(&pose.to_cols_array());
    }

    pub fn place_assets(&self, placement: &Placement) {
        let PlacedAsset { position: cp, scale: cs } = placement.chest;
        let PlacedAsset { position: mp, scale: ms } = placement.marker;
        self.place_assets_raw(&cp.to_array(), &cs.to_array(), &mp.to_array(), &ms.to_array());
    }

    pub fn add_coin(&self, texture_url: &str, position: Vec3) {
        self.add_coin_raw(texture_url, &position.to_array());
    }

    pub fn set_coin(&self, position: Vec3, spin: f32) {
        self.set_coin_raw(&position.to_array(), spin);
    }

    pub fn add_firework(&self, id: u32, rgb: Vec3, count: usize) {
        self.add_firework_raw(id, &rgb.to_array(), count);
    }

    pub fn update_firework(&self, id: u32, positions: &[Vec3], sizes: &[f32]) {
        self.update_firework_raw(id, bytemuck::cast_slice(positions), sizes);
    }

    pub fn show_stream(&self, anchor: Vec3, positions: &[Vec3]) {
        self.show_stream_raw(&anchor.to_array(), bytemuck::cast_slice(positions));
    }

    pub fn update_stream(&self, positions: &[Vec3]) {
        self.update_stream_raw(bytemuck::cast_slice(positions));
    }
}
