//! Deterministic session logic
//!
//! Everything that decides what happens lives here. This module must stay pure:
//! - Seeded RNG only
//! - Time comes in as arguments or through a `Clock`
//! - Stable iteration order (by entity ID)
//! - No rendering, DOM or audio dependencies

pub mod code;
pub mod coin;
pub mod distance;
pub mod fireworks;
pub mod gate;
pub mod placement;
pub mod session;
pub mod stream;
pub mod timeline;

pub use code::{CodeEntry, CodeFormat, CodeGate, CodeOutcome};
pub use coin::Coin;
pub use distance::{DistanceMonitor, format_distance};
pub use fireworks::{Firework, FireworkColor, FireworkEvent, FireworkPhase, FireworksController};
pub use gate::{ButtonView, GateCommand, SessionGate, SessionPhase, XrAvailability};
pub use placement::{HitTestOutcome, Placement, PlacementController};
pub use session::{AssetStatus, FrameInput, Session, SessionEvent, Sound};
pub use stream::ParticleStream;
pub use timeline::{Clock, RewardAction, RewardTimeline, TimelineStep, VirtualClock};
