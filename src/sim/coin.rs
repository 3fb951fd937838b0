//! Reward coin that pops out of the opened chest

use glam::Vec3;

/// Coin starts this far above the chest origin
pub const START_HEIGHT: f32 = 0.4;
/// Extra height gained during the pop
pub const RISE_HEIGHT: f32 = 0.8;
/// Duration of the pop
pub const RISE_MS: f64 = 2000.0;
/// Spin per frame (radians), forever
pub const SPIN_PER_FRAME: f32 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    chest: Vec3,
    started_at_ms: f64,
    pub position: Vec3,
    /// Accumulated spin around the coin's face normal
    pub spin: f32,
}

impl Coin {
    pub fn pop(chest: Vec3, now_ms: f64) -> Self {
        Self {
            chest,
            started_at_ms: now_ms,
            position: chest + Vec3::Y * START_HEIGHT,
            spin: 0.0,
        }
    }

    /// Pop progress in [0, 1]
    pub fn progress(&self, now_ms: f64) -> f32 {
        ((now_ms - self.started_at_ms) / RISE_MS).clamp(0.0, 1.0) as f32
    }

    pub fn step(mut self, now_ms: f64) -> Self {
        let progress = self.progress(now_ms);
        self.position = self.chest + Vec3::Y * (START_HEIGHT + progress * RISE_HEIGHT);
        self.spin += SPIN_PER_FRAME;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_rises_then_holds() {
        let chest = Vec3::new(0.0, -1.5, 2.8);
        let coin = Coin::pop(chest, 1000.0);
        assert!((coin.position.y - (-1.1)).abs() < 1e-5);

        let coin = coin.step(2000.0);
        assert!((coin.position.y - (-1.1 + 0.4)).abs() < 1e-5);

        let coin = coin.step(3000.0);
        assert!((coin.position.y - (-0.3)).abs() < 1e-5);

        let coin = coin.step(10_000.0);
        assert!((coin.position.y - (-0.3)).abs() < 1e-5);
        assert_eq!(coin.position.x, 0.0);
        assert!((coin.spin - 3.0 * SPIN_PER_FRAME).abs() < 1e-6);
    }
}
