//! Fireworks particle simulation
//!
//! Each firework rises as a single point, explodes once into a cloud of
//! particles, then drifts down while its particles shrink. Integration is a
//! pure step function: `Firework::step` consumes the current state and returns
//! the next one, or `None` once the firework is spent.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::consts::{FIREWORK_LIGHTNESS, FIREWORK_SATURATION, THEME_CYAN, THEME_GOLD};
use crate::tuning::FireworkTuning;
use crate::{hex_to_rgb, hsl_to_rgb};

/// Lifetime cap range in frames (inclusive)
pub const MIN_LIFETIME: u32 = 100;
pub const MAX_LIFETIME: u32 = 150;

/// Fraction of the lifetime cap after which a rising firework explodes regardless of height
const EXPLODE_LIFETIME_FRACTION: f32 = 0.7;
/// Rising fireworks explode above this height plus a fresh U[0, 1) sample each frame
const EXPLODE_HEIGHT_BASE: f32 = 1.0;

/// Rise velocity: horizontal drift in ±RISE_DRIFT/2, vertical in [RISE_SPEED, 2 * RISE_SPEED)
const RISE_DRIFT: f32 = 0.02;
const RISE_SPEED: f32 = 0.02;

/// Explosion displacement speed range
const EXPLOSION_SPEED_MIN: f32 = 0.05;
const EXPLOSION_SPEED_RANGE: f32 = 0.1;

/// Per-frame jitter span per axis once exploded (centred on zero)
const JITTER: f32 = 0.05;
/// Downward drift per frame once exploded
const GRAVITY: f32 = 0.005;
/// Size multiplier per frame once exploded
const SIZE_DECAY: f32 = 0.98;
/// An exploded firework whose lead particle is smaller than this is removed
const REMOVAL_SIZE: f32 = 0.01;

/// Initial particle size range
const SIZE_MIN: f32 = 0.1;
const SIZE_RANGE: f32 = 0.2;

/// Theme colours launched fireworks alternate between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeColor {
    Cyan,
    Gold,
}

impl ThemeColor {
    pub fn next(self) -> Self {
        match self {
            ThemeColor::Cyan => ThemeColor::Gold,
            ThemeColor::Gold => ThemeColor::Cyan,
        }
    }

    pub fn hex(self) -> u32 {
        match self {
            ThemeColor::Cyan => THEME_CYAN,
            ThemeColor::Gold => THEME_GOLD,
        }
    }
}

/// Colour policy of a firework
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireworkColor {
    /// Full-saturation hue in [0, 1)
    Hue(f32),
    Theme(ThemeColor),
}

impl FireworkColor {
    pub fn to_rgb(self) -> Vec3 {
        match self {
            FireworkColor::Hue(h) => hsl_to_rgb(h, FIREWORK_SATURATION, FIREWORK_LIGHTNESS),
            FireworkColor::Theme(theme) => hex_to_rgb(theme.hex()),
        }
    }
}

/// Lifecycle phase; the only transition is Rising -> Exploded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireworkPhase {
    Rising { velocity: Vec3 },
    Exploded,
}

/// A single firework
#[derive(Debug, Clone)]
pub struct Firework {
    pub id: u32,
    /// Head position while rising; frozen at the explosion point afterwards
    pub position: Vec3,
    pub positions: Vec<Vec3>,
    pub sizes: Vec<f32>,
    /// Frames lived
    pub lifetime: u32,
    /// Removal happens no later than this many frames
    pub max_lifetime: u32,
    pub phase: FireworkPhase,
    pub color: FireworkColor,
}

impl Firework {
    /// Create a rising firework at `position`
    pub fn launch(
        id: u32,
        position: Vec3,
        color: FireworkColor,
        particle_count: usize,
        rng: &mut Pcg32,
    ) -> Self {
        let velocity = Vec3::new(
            (rng.random::<f32>() - 0.5) * RISE_DRIFT,
            RISE_SPEED + rng.random::<f32>() * RISE_SPEED,
            (rng.random::<f32>() - 0.5) * RISE_DRIFT,
        );
        let sizes = (0..particle_count)
            .map(|_| SIZE_MIN + rng.random::<f32>() * SIZE_RANGE)
            .collect();

        Self {
            id,
            position,
            positions: vec![position; particle_count],
            sizes,
            lifetime: 0,
            max_lifetime: rng.random_range(MIN_LIFETIME..=MAX_LIFETIME),
            phase: FireworkPhase::Rising { velocity },
            color,
        }
    }

    pub fn is_exploded(&self) -> bool {
        matches!(self.phase, FireworkPhase::Exploded)
    }

    /// Scatter the particles; returns false if already exploded
    pub fn explode(&mut self, rng: &mut Pcg32) -> bool {
        if self.is_exploded() {
            return false;
        }
        self.phase = FireworkPhase::Exploded;

        for p in &mut self.positions {
            *p = self.position;
            let azimuth = rng.random::<f32>() * TAU;
            let polar = rng.random::<f32>() * PI;
            let speed = EXPLOSION_SPEED_MIN + rng.random::<f32>() * EXPLOSION_SPEED_RANGE;
            *p += Vec3::new(
                azimuth.cos() * polar.sin(),
                polar.cos(),
                azimuth.sin() * polar.sin(),
            ) * speed;
        }
        true
    }

    /// Whether the firework has run its course
    pub fn is_spent(&self) -> bool {
        if self.lifetime >= self.max_lifetime {
            return true;
        }
        // An empty firework has nothing left to show once exploded
        self.is_exploded() && self.sizes.first().is_none_or(|&s| s < REMOVAL_SIZE)
    }

    /// Advance one frame; `None` means the firework should be removed
    pub fn step(mut self, rng: &mut Pcg32) -> Option<Self> {
        match self.phase {
            FireworkPhase::Rising { velocity } => {
                self.position += velocity;
                let height_trigger = EXPLODE_HEIGHT_BASE + rng.random::<f32>();
                let age_trigger = self.max_lifetime as f32 * EXPLODE_LIFETIME_FRACTION;
                if self.position.y > height_trigger || self.lifetime as f32 > age_trigger {
                    self.explode(rng);
                } else {
                    self.positions.fill(self.position);
                }
            }
            FireworkPhase::Exploded => {
                for p in &mut self.positions {
                    *p += Vec3::new(
                        (rng.random::<f32>() - 0.5) * JITTER,
                        (rng.random::<f32>() - 0.5) * JITTER - GRAVITY,
                        (rng.random::<f32>() - 0.5) * JITTER,
                    );
                }
                for s in &mut self.sizes {
                    *s *= SIZE_DECAY;
                }
            }
        }

        self.lifetime += 1;

        if self.is_spent() { None } else { Some(self) }
    }
}

/// Something the stage needs to mirror
#[derive(Debug, Clone, PartialEq)]
pub enum FireworkEvent {
    Spawned {
        id: u32,
        color: Vec3,
        particles: usize,
    },
    Exploded {
        id: u32,
    },
    Removed {
        id: u32,
    },
}

/// Owns the live fireworks and launches new ones while the show is on
#[derive(Debug, Clone)]
pub struct FireworksController {
    tuning: FireworkTuning,
    particles_per_firework: usize,
    periodic: bool,
    fireworks: Vec<Firework>,
    active: bool,
    next_id: u32,
    next_theme: ThemeColor,
}

impl FireworksController {
    pub fn new(tuning: FireworkTuning, particles_per_firework: usize, periodic: bool) -> Self {
        Self {
            tuning,
            particles_per_firework,
            periodic,
            fireworks: Vec::new(),
            active: false,
            next_id: 1,
            next_theme: ThemeColor::Cyan,
        }
    }

    pub fn fireworks(&self) -> &[Firework] {
        &self.fireworks
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn next_firework_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Turn the show on with an opening burst; nothing to anchor means no burst
    pub fn start(&mut self, anchor: Option<Vec3>, rng: &mut Pcg32) -> Vec<FireworkEvent> {
        self.active = true;
        self.burst(self.tuning.burst_count, anchor, rng)
    }

    /// Stop launching; live fireworks play out
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Create `count` already-exploded fireworks with evenly spread hues
    pub fn burst(&mut self, count: usize, anchor: Option<Vec3>, rng: &mut Pcg32) -> Vec<FireworkEvent> {
        let Some(anchor) = anchor else {
            return Vec::new();
        };

        let mut events = Vec::with_capacity(count * 2);
        for i in 0..count {
            let angle = rng.random::<f32>() * TAU;
            let distance = rng.random::<f32>() * self.tuning.burst_radius;
            let position = anchor
                + Vec3::new(
                    angle.cos() * distance,
                    rng.random::<f32>() * self.tuning.burst_height,
                    angle.sin() * distance,
                );
            let color = FireworkColor::Hue(i as f32 / count as f32);

            let id = self.next_firework_id();
            let mut firework = Firework::launch(id, position, color, self.particles_per_firework, rng);
            firework.explode(rng);

            events.push(FireworkEvent::Spawned {
                id,
                color: color.to_rgb(),
                particles: self.particles_per_firework,
            });
            events.push(FireworkEvent::Exploded { id });
            self.fireworks.push(firework);
        }
        events
    }

    /// Launch one rising firework near the anchor
    fn launch(&mut self, anchor: Vec3, rng: &mut Pcg32) -> FireworkEvent {
        let angle = rng.random::<f32>() * TAU;
        let (near, far) = self.tuning.spawn_distance;
        let (low, high) = self.tuning.spawn_height;
        let distance = near + rng.random::<f32>() * (far - near);
        let height = low + rng.random::<f32>() * (high - low);
        let position = anchor + Vec3::new(angle.cos() * distance, height, angle.sin() * distance);

        let color = if rng.random::<f32>() < self.tuning.colorful_chance {
            FireworkColor::Hue(rng.random::<f32>())
        } else {
            let theme = self.next_theme;
            self.next_theme = theme.next();
            FireworkColor::Theme(theme)
        };

        let id = self.next_firework_id();
        self.fireworks
            .push(Firework::launch(id, position, color, self.particles_per_firework, rng));
        FireworkEvent::Spawned {
            id,
            color: color.to_rgb(),
            particles: self.particles_per_firework,
        }
    }

    /// Step every firework, drop spent ones, maybe launch a new one
    pub fn update(&mut self, anchor: Option<Vec3>, rng: &mut Pcg32) -> Vec<FireworkEvent> {
        let mut events = Vec::new();

        let live = std::mem::take(&mut self.fireworks);
        self.fireworks.reserve(live.len());
        for firework in live {
            let id = firework.id;
            let was_rising = !firework.is_exploded();
            match firework.step(rng) {
                Some(next) => {
                    if was_rising && next.is_exploded() {
                        events.push(FireworkEvent::Exploded { id });
                    }
                    self.fireworks.push(next);
                }
                None => events.push(FireworkEvent::Removed { id }),
            }
        }

        if self.active && self.periodic {
            if let Some(anchor) = anchor {
                if rng.random::<f32>() < self.tuning.spawn_chance {
                    events.push(self.launch(anchor, rng));
                }
            }
        }

        events
    }
}
