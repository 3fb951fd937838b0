//! Decorative particle stream rising around the chest once the keypad shows

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

/// Rise per frame
const RISE_PER_FRAME: f32 = 0.005;
/// Particles wrap back to the floor of the box above this height
const WRAP_HEIGHT: f32 = 1.0;
/// Horizontal extent of the box (centred on the anchor)
const BOX_WIDTH: f32 = 1.0;

/// Particle positions are local to `anchor`
#[derive(Debug, Clone, Default)]
pub struct ParticleStream {
    pub positions: Vec<Vec3>,
    pub anchor: Vec3,
    pub visible: bool,
}

impl ParticleStream {
    /// Scatter `count` particles through a unit box, hidden
    pub fn new(count: usize, rng: &mut Pcg32) -> Self {
        let positions = (0..count)
            .map(|_| {
                Vec3::new(
                    (rng.random::<f32>() - 0.5) * BOX_WIDTH,
                    rng.random::<f32>() * WRAP_HEIGHT,
                    (rng.random::<f32>() - 0.5) * BOX_WIDTH,
                )
            })
            .collect();
        Self {
            positions,
            anchor: Vec3::ZERO,
            visible: false,
        }
    }

    /// Show the stream around `anchor`
    pub fn reveal(&mut self, anchor: Vec3) {
        self.anchor = anchor;
        self.visible = true;
    }

    /// Next frame's stream; hidden streams do not move
    pub fn step(mut self) -> Self {
        if !self.visible {
            return self;
        }
        for p in &mut self.positions {
            p.y += RISE_PER_FRAME;
            if p.y > WRAP_HEIGHT {
                p.y = 0.0;
            }
        }
        self
    }
}
