//! One-shot placement of the chest and marker on a detected surface

use glam::{Mat4, Vec3};

use crate::tuning::{AssetTransform, PlacementTuning};

/// World transform of a placed asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedAsset {
    pub position: Vec3,
    pub scale: Vec3,
}

impl PlacedAsset {
    fn at(anchor: Vec3, transform: &AssetTransform) -> Self {
        Self {
            position: anchor + transform.offset,
            scale: transform.scale,
        }
    }
}

/// The result of the one placement a session gets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Hit position everything is relative to
    pub anchor: Vec3,
    pub chest: PlacedAsset,
    pub marker: PlacedAsset,
}

/// What a frame's hit-test results led to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTestOutcome {
    /// Already placed, hit-testing is over
    Done,
    /// No surface under the reticle this frame
    NoSurface,
    /// Surface found but the models are not available, only the reticle moves
    Tracking(Mat4),
    /// Assets placed this frame
    Placed(Placement),
}

/// Runs every frame until the first successful placement
#[derive(Debug, Clone)]
pub struct PlacementController {
    tuning: PlacementTuning,
    models_ready: bool,
    placement: Option<Placement>,
}

impl PlacementController {
    pub fn new(tuning: PlacementTuning, models_ready: bool) -> Self {
        Self {
            tuning,
            models_ready,
            placement: None,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.placement.is_some()
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    /// Chest position, once placed
    pub fn chest_position(&self) -> Option<Vec3> {
        self.placement.map(|p| p.chest.position)
    }

    /// Process hit poses for one frame, closest first
    pub fn update(&mut self, hits: &[Mat4]) -> HitTestOutcome {
        if self.placement.is_some() {
            return HitTestOutcome::Done;
        }

        let Some(pose) = hits.first() else {
            return HitTestOutcome::NoSurface;
        };

        if !self.models_ready {
            return HitTestOutcome::Tracking(*pose);
        }

        let anchor = pose.w_axis.truncate();
        let placement = Placement {
            anchor,
            chest: PlacedAsset::at(anchor, &self.tuning.chest),
            marker: PlacedAsset::at(anchor, &self.tuning.marker),
        };
        log::info!(
            "Placed chest at ({:.2}, {:.2}, {:.2})",
            placement.chest.position.x,
            placement.chest.position.y,
            placement.chest.position.z
        );
        self.placement = Some(placement);

        HitTestOutcome::Placed(placement)
    }
}
