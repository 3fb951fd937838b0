//! Data-driven experience tuning
//!
//! Every number the scripted experience depends on lives here so a deployment
//! can override it with a JSON block in the page:
//!
//! ```html
//! <script type="application/json" id="escape-ar-tuning">
//!   { "code": { "allowed_codes": ["1 2 34 5 6 789 0 12 3"] } }
//! </script>
//! ```
//!
//! Missing fields fall back to the built-in defaults.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::CodeFormat;

/// Element id of the optional JSON override
pub const TUNING_ELEMENT_ID: &str = "escape-ar-tuning";

/// Top-level tuning document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub code: CodeTuning,
    pub placement: PlacementTuning,
    pub distance: DistanceTuning,
    pub timeline: TimelineTuning,
    pub fireworks: FireworkTuning,
    pub assets: AssetUrls,
}

/// Code entry pattern and allow-list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeTuning {
    /// Digits per group, in order
    pub group_lengths: Vec<usize>,
    /// Accepted codes, formatted with single spaces between groups
    pub allowed_codes: Vec<String>,
    /// How long the input border stays red after a wrong code
    pub error_flash_ms: u32,
}

impl Default for CodeTuning {
    fn default() -> Self {
        Self {
            group_lengths: vec![1, 1, 2, 1, 1, 3, 1, 2, 1],
            allowed_codes: vec!["7 8 12 6 5 127 3 10 8".to_string()],
            error_flash_ms: 500,
        }
    }
}

/// Offset and scale of a placed asset relative to the hit position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetTransform {
    pub offset: Vec3,
    pub scale: Vec3,
}

/// Where the chest and the marker land once a surface is found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementTuning {
    pub chest: AssetTransform,
    pub marker: AssetTransform,
}

impl Default for PlacementTuning {
    fn default() -> Self {
        Self {
            // Negative z scale mirrors the chest so its lid faces the viewer
            chest: AssetTransform {
                offset: Vec3::new(0.0, -1.5, 2.8),
                scale: Vec3::new(0.7, 0.7, -0.7),
            },
            marker: AssetTransform {
                offset: Vec3::new(0.0, 0.7, -2.0),
                scale: Vec3::splat(0.17),
            },
        }
    }
}

/// Proximity reveal of the code entry UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceTuning {
    /// Camera-to-chest distance (metres) below which the keypad appears
    pub reveal_threshold: f32,
}

impl Default for DistanceTuning {
    fn default() -> Self {
        Self {
            reveal_threshold: 2.5,
        }
    }
}

/// Reward timeline offsets, all measured from the moment the code is accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineTuning {
    pub chest_open_ms: u32,
    pub coin_pop_ms: u32,
    pub animation_freeze_ms: u32,
    pub celebrate_ms: u32,
    pub end_screen_ms: u32,
}

impl Default for TimelineTuning {
    fn default() -> Self {
        Self {
            chest_open_ms: 0,
            coin_pop_ms: 4000,
            animation_freeze_ms: 5000,
            celebrate_ms: 7000,
            end_screen_ms: 19000,
        }
    }
}

/// Fireworks spawning behaviour (the per-particle physics is fixed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireworkTuning {
    /// Chance per frame of launching a new firework while the show is active
    pub spawn_chance: f32,
    /// Chance that a launched firework uses a random hue instead of a theme colour
    pub colorful_chance: f32,
    /// Fireworks created by the opening burst
    pub burst_count: usize,
    /// Horizontal launch distance from the chest (min, max)
    pub spawn_distance: (f32, f32),
    /// Launch height relative to the chest (min, max)
    pub spawn_height: (f32, f32),
    /// Burst fireworks land within this horizontal radius of the chest
    pub burst_radius: f32,
    /// Burst fireworks land up to this far above the chest
    pub burst_height: f32,
}

impl Default for FireworkTuning {
    fn default() -> Self {
        Self {
            spawn_chance: 0.03,
            colorful_chance: 0.3,
            burst_count: 10,
            spawn_distance: (0.3, 0.7),
            spawn_height: (-0.6, -0.4),
            burst_radius: 2.0,
            burst_height: 1.5,
        }
    }
}

/// Asset locations, relative to the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetUrls {
    pub environment: String,
    pub chest_model: String,
    pub marker_model: String,
    pub coin_texture: String,
    pub chest_open_sound: String,
    pub celebration_sound: String,
    pub victory_sound: String,
    pub firework_sound: String,
}

impl Default for AssetUrls {
    fn default() -> Self {
        Self {
            environment: "assets/hdr/studio.hdr".to_string(),
            chest_model: "assets/models/chest.glb".to_string(),
            marker_model: "assets/models/Place_Object.glb".to_string(),
            coin_texture: "assets/textures/aztec.jpg".to_string(),
            chest_open_sound: "assets/audio/chest_open_2.mp3".to_string(),
            celebration_sound: "assets/audio/celebration.mp3".to_string(),
            victory_sound: "assets/audio/victory_3.mp3".to_string(),
            firework_sound: "assets/audio/firework_01.mp3".to_string(),
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Tuning>(json).map(Tuning::sanitized)
    }

    /// Drop values that would make the experience unwinnable or degenerate
    pub fn sanitized(mut self) -> Self {
        if self.code.group_lengths.iter().any(|&len| len == 0) {
            log::warn!("Ignoring zero-length code groups");
            self.code.group_lengths.retain(|&len| len > 0);
        }
        if self.code.group_lengths.is_empty() {
            log::warn!("Empty code pattern, using default");
            self.code.group_lengths = CodeTuning::default().group_lengths;
        }

        // A code survives only if typing it reproduces it exactly
        let format = CodeFormat::new(self.code.group_lengths.clone());
        let before = self.code.allowed_codes.len();
        self.code.allowed_codes.retain(|code| {
            let formatted = format.format(code);
            formatted.groups == format.group_count() && formatted.text == *code
        });
        if self.code.allowed_codes.len() != before {
            log::warn!(
                "Dropped {} allowed code(s) that do not fit the {:?} pattern",
                before - self.code.allowed_codes.len(),
                self.code.group_lengths
            );
        }

        let fw = &mut self.fireworks;
        fw.spawn_chance = fw.spawn_chance.clamp(0.0, 1.0);
        fw.colorful_chance = fw.colorful_chance.clamp(0.0, 1.0);
        if fw.spawn_distance.0 > fw.spawn_distance.1 {
            fw.spawn_distance = (fw.spawn_distance.1, fw.spawn_distance.0);
        }
        if fw.spawn_height.0 > fw.spawn_height.1 {
            fw.spawn_height = (fw.spawn_height.1, fw.spawn_height.0);
        }

        self
    }

    /// Load tuning from the page's JSON block (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(TUNING_ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = json {
            match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning overrides from #{}", TUNING_ELEMENT_ID);
                    return tuning;
                }
                Err(e) => log::warn!("Invalid tuning JSON, using defaults: {}", e),
            }
        }

        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_code_matches_pattern() {
        let tuning = Tuning::default();
        let groups = tuning.code.group_lengths.len();
        for code in &tuning.code.allowed_codes {
            let parts: Vec<&str> = code.split(' ').collect();
            assert_eq!(parts.len(), groups);
            for (part, &len) in parts.iter().zip(&tuning.code.group_lengths) {
                assert_eq!(part.len(), len);
            }
        }
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "distance": { "reveal_threshold": 1.0 } }"#).unwrap();
        assert_eq!(tuning.distance.reveal_threshold, 1.0);
        assert_eq!(tuning.code, CodeTuning::default());
        assert_eq!(tuning.timeline, TimelineTuning::default());
    }

    #[test]
    fn test_vec3_fields_parse_as_arrays() {
        let json = r#"{ "placement": { "chest": { "offset": [1, 2, 3], "scale": [1, 1, 1] } } }"#;
        let tuning = Tuning::from_json(json).unwrap();
        assert_eq!(tuning.placement.chest.offset, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(tuning.placement.marker, PlacementTuning::default().marker);
    }

    #[test]
    fn test_sanitize_drops_mismatched_codes() {
        let json = r#"{ "code": { "group_lengths": [2, 0, 2], "allowed_codes": ["12 34", "1 2 3"] } }"#;
        let tuning = Tuning::from_json(json).unwrap();
        assert_eq!(tuning.code.group_lengths, vec![2, 2]);
        assert_eq!(tuning.code.allowed_codes, vec!["12 34".to_string()]);
    }

    #[test]
    fn test_sanitize_drops_unreachable_codes() {
        let json = r#"{ "code": {
            "group_lengths": [2, 2],
            "allowed_codes": ["12 345", "1 234", "12", "12  34", "ab cd", "56 78"]
        } }"#;
        let tuning = Tuning::from_json(json).unwrap();
        assert_eq!(tuning.code.allowed_codes, vec!["56 78".to_string()]);

        let mut gate = crate::sim::CodeGate::from_tuning(&tuning.code);
        assert_eq!(gate.input("5678").outcome, crate::sim::CodeOutcome::Accepted);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Tuning::from_json("{ not json").is_err());
    }
}
