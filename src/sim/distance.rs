//! Camera-to-chest distance readout and the proximity reveal

use glam::Vec3;

/// One frame's reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceReading {
    pub distance: f32,
    /// True only on the frame the keypad is first revealed
    pub revealed_now: bool,
}

/// Tracks the distance until the keypad has done its job
#[derive(Debug, Clone)]
pub struct DistanceMonitor {
    threshold: f32,
    enabled: bool,
    revealed: bool,
}

impl DistanceMonitor {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            enabled: true,
            revealed: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the keypad has been revealed (never reverts)
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Stop measuring for good
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Measure for one frame; `None` when disabled or nothing is placed
    pub fn update(&mut self, camera: Vec3, target: Option<Vec3>) -> Option<DistanceReading> {
        if !self.enabled {
            return None;
        }
        let target = target?;

        let distance = camera.distance(target);
        let revealed_now = !self.revealed && distance < self.threshold;
        if revealed_now {
            log::info!("Chest within {:.2} m, revealing keypad", distance);
            self.revealed = true;
        }

        Some(DistanceReading {
            distance,
            revealed_now,
        })
    }
}

/// Readout text for a distance in metres
pub fn format_distance(distance: f32) -> String {
    format!("Distance: {:.2} meters", distance)
}
