//! User preferences
//!
//! Persisted in LocalStorage, separate from the deployment tuning.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particles per firework
    pub fn firework_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 120,
            QualityPreset::Medium => 300,
            QualityPreset::High => 500,
        }
    }

    /// Particles in the rising stream around the chest
    pub fn stream_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 80,
            QualityPreset::Medium => 200,
            QualityPreset::High => 300,
        }
    }
}

/// Experience settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Particle density preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Firework particles (the burst and the periodic launches)
    pub fireworks: bool,
    /// Decorative particle stream around the chest
    pub particle_stream: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Silence everything
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (keeps the opening burst, skips periodic launches)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            fireworks: true,
            particle_stream: true,

            master_volume: 1.0,
            sfx_volume: 1.0,
            muted: false,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Particles per firework (0 when fireworks are off)
    pub fn firework_particles(&self) -> usize {
        if self.fireworks {
            self.quality.firework_particles()
        } else {
            0
        }
    }

    /// Stream particle count (0 when the stream is off)
    pub fn stream_particles(&self) -> usize {
        if self.particle_stream {
            self.quality.stream_particles()
        } else {
            0
        }
    }

    /// Whether fireworks keep launching after the opening burst
    pub fn periodic_fireworks(&self) -> bool {
        self.fireworks && !self.reduced_motion
    }

    /// Effective volume multiplier for sound effects
    pub fn effective_volume(&self) -> f32 {
        let volume = self.master_volume * self.sfx_volume;
        if self.muted || !volume.is_finite() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        }
    }

    /// Apply `?quality=high&muted=1&reduced_motion=1` style overrides.
    /// Returns true if anything changed.
    pub fn apply_query(&mut self, query: &str) -> bool {
        let before = self.clone();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, "1"));
            match key {
                "quality" => match QualityPreset::from_name(value) {
                    Some(preset) => self.quality = preset,
                    None => log::warn!("Unknown quality preset '{}'", value),
                },
                "muted" => self.muted = parse_flag(value),
                "fireworks" => self.fireworks = parse_flag(value),
                "stream" => self.particle_stream = parse_flag(value),
                "reduced_motion" => self.reduced_motion = parse_flag(value),
                "volume" => {
                    match value.parse::<f32>() {
                        Ok(volume) if volume.is_finite() => self.master_volume = volume.clamp(0.0, 1.0),
                        _ => log::warn!("Ignoring volume '{}'", value),
                    }
                }
                _ => {}
            }
        }
        *self != before
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "escape_ar_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str::<Settings>(&json) {
                    log::info!("Loaded settings from LocalStorage ({})", settings.quality.as_str());
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names() {
        assert_eq!(QualityPreset::from_name("LOW"), Some(QualityPreset::Low));
        assert_eq!(QualityPreset::from_name("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_name("ultra"), None);
    }

    #[test]
    fn test_medium_matches_classic_density() {
        let settings = Settings::default();
        assert_eq!(settings.firework_particles(), 300);
        assert_eq!(settings.stream_particles(), 200);
    }

    #[test]
    fn test_reduced_motion_stops_periodic_launches() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.periodic_fireworks());
        assert!(settings.firework_particles() > 0);
    }

    #[test]
    fn test_fireworks_off_means_no_particles() {
        let settings = Settings {
            fireworks: false,
            ..Settings::from_preset(QualityPreset::High)
        };
        assert_eq!(settings.firework_particles(), 0);
        assert!(!settings.periodic_fireworks());
    }

    #[test]
    fn test_muted_volume() {
        let mut settings = Settings::default();
        settings.master_volume = 0.5;
        assert!((settings.effective_volume() - 0.5).abs() < 1e-6);
        settings.muted = true;
        assert_eq!(settings.effective_volume(), 0.0);
    }

    #[test]
    fn test_settings_json_round_trip_defaults_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{ "quality": "Low" }"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::Low);
        assert!(settings.fireworks);
        assert_eq!(settings.master_volume, 1.0);
    }

    #[test]
    fn test_query_overrides() {
        let mut settings = Settings::default();
        assert!(settings.apply_query("?quality=high&muted=1&volume=0.25&unknown=3"));
        assert_eq!(settings.quality, QualityPreset::High);
        assert!(settings.muted);
        assert_eq!(settings.master_volume, 0.25);

        // Bare key means on
        assert!(settings.apply_query("reduced_motion"));
        assert!(settings.reduced_motion);
    }

    #[test]
    fn test_query_rejects_non_finite_volume() {
        let mut settings = Settings::default();
        for query in ["?volume=nan", "?volume=inf", "?volume=-infinity", "?volume=loud"] {
            assert!(!settings.apply_query(query), "{} changed settings", query);
        }
        assert_eq!(settings.master_volume, 1.0);

        // Still persists and reloads cleanly
        let json = serde_json::to_string(&settings).unwrap();
        let reloaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn test_effective_volume_never_nan() {
        let settings = Settings {
            master_volume: f32::NAN,
            ..Settings::default()
        };
        assert_eq!(settings.effective_volume(), 0.0);

        let settings = Settings {
            sfx_volume: f32::INFINITY,
            ..Settings::default()
        };
        assert_eq!(settings.effective_volume(), 0.0);
    }

    #[test]
    fn test_query_without_changes() {
        let mut settings = Settings::default();
        assert!(!settings.apply_query(""));
        assert!(!settings.apply_query("?quality=medium&fireworks=true"));
        assert!(!settings.apply_query("?quality=ultra"));
        assert_eq!(settings, Settings::default());
    }
}
