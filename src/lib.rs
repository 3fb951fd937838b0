//! Escape AR - a WebXR treasure chest hunt
//!
//! Core modules:
//! - `sim`: Deterministic session logic (placement, code gate, reward timeline, fireworks)
//! - `tuning`: Data-driven constants (code pattern, offsets, timings, asset URLs)
//! - `settings`: Persisted user preferences
//! - `audio`: Clip playback and procedural cues (WASM only)
//! - `platform`: three.js stage bindings, DOM overlay and frame loop (WASM only)

pub mod settings;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod platform;

pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec3;

/// Experience constants
pub mod consts {
    /// Cyan used for the keypad glow and half of the themed fireworks
    pub const THEME_CYAN: u32 = 0x15F4EE;
    /// Gold used for the other half of the themed fireworks
    pub const THEME_GOLD: u32 = 0xFFD700;

    /// Saturation and lightness of hue-based firework colours
    pub const FIREWORK_SATURATION: f32 = 1.0;
    pub const FIREWORK_LIGHTNESS: f32 = 0.7;

    /// Code input border colours
    pub const CODE_BORDER: &str = "#15F4EE";
    pub const CODE_BORDER_ERROR: &str = "red";

    /// Intro copy shown before the AR session starts
    pub const TITLE_TEXT: &str = "WELCOME TO ESCAPE AR";
    pub const SUBTITLE_TEXT: &str =
        "Activate the virtual reality and look around to find a box with artifact.";
    pub const INSTRUCTION_TEXT: &str = "Enter the code to open the box";

    /// Where to send users whose browser has no WebXR at all
    pub const WEBXR_INFO_URL: &str = "https://immersiveweb.dev/";
}

/// Convert a packed 0xRRGGBB colour to linear-ish [0, 1] components
#[inline]
pub fn hex_to_rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    )
}

/// Convert HSL (all components in [0, 1]) to RGB
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Vec3 {
    let h = hue.rem_euclid(1.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s <= 0.0 {
        return Vec3::splat(l);
    }

    let p = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let q = 2.0 * l - p;

    Vec3::new(
        hue_to_channel(q, p, h + 1.0 / 3.0),
        hue_to_channel(q, p, h),
        hue_to_channel(q, p, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn test_hex_to_rgb() {
        assert!(close(hex_to_rgb(0xFF0000), Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(hex_to_rgb(consts::THEME_GOLD), Vec3::new(1.0, 215.0 / 255.0, 0.0)));
    }

    #[test]
    fn test_hsl_primaries() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 1.0, 0.0)));
        assert!(close(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_hsl_light_red() {
        // l = 0.7, s = 1 -> p = 1.0, q = 0.4
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.7), Vec3::new(1.0, 0.4, 0.4)));
    }

    #[test]
    fn test_hsl_greyscale() {
        assert!(close(hsl_to_rgb(0.42, 0.0, 0.3), Vec3::splat(0.3)));
    }
}
