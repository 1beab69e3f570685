//! Scrolling obstacles: a top and a bottom piece around a random gap.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ObstacleParams;

/// One obstacle column.
///
/// The passable band is `[gap_top, gap_bottom)`. The top piece is drawn with
/// its origin at `top_sprite_y` so that its lower edge meets `gap_top`; the
/// bottom piece is drawn with its origin at `gap_bottom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub gap_top: f32,
    pub top_sprite_y: f32,
    pub gap_bottom: f32,
    /// Set once the first bird scores through this obstacle. Never cleared.
    passed: bool,
}

impl Obstacle {
    /// Create an obstacle at `x` with a gap height drawn from the configured range.
    pub fn spawn<R: Rng + ?Sized>(x: f32, params: &ObstacleParams, rng: &mut R) -> Self {
        let gap_top = rng.gen_range(params.gap_min..params.gap_max) as f32;
        Self::with_gap_top(x, gap_top, params)
    }

    /// Create an obstacle with a known gap height.
    pub fn with_gap_top(x: f32, gap_top: f32, params: &ObstacleParams) -> Self {
        Self {
            x,
            gap_top,
            top_sprite_y: gap_top - params.sprite_height as f32,
            gap_bottom: gap_top + params.gap,
            passed: false,
        }
    }

    pub fn advance(&mut self, params: &ObstacleParams) {
        self.x -= params.velocity;
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Mark as passed. Returns true only on the transition.
    pub fn mark_passed(&mut self) -> bool {
        !std::mem::replace(&mut self.passed, true)
    }

    pub fn right_edge(&self, params: &ObstacleParams) -> f32 {
        self.x + params.sprite_width as f32
    }

    /// Fully scrolled past the left edge of the playfield.
    pub fn is_offscreen(&self, params: &ObstacleParams) -> bool {
        self.right_edge(params) < 0.0
    }
}

/// Remove every obstacle that has scrolled off the left edge.
///
/// Returns how many were removed. Order of the survivors is kept.
pub fn retire_offscreen(obstacles: &mut Vec<Obstacle>, params: &ObstacleParams) -> usize {
    let before = obstacles.len();
    obstacles.retain(|o| !o.is_offscreen(params));
    let removed = before - obstacles.len();
    if removed > 0 {
        log::debug!("retired {} obstacle(s), {} remain", removed, obstacles.len());
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spawn_draws_from_gap_range() {
        let params = ObstacleParams::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let o = Obstacle::spawn(params.spawn_x, &params, &mut rng);
            assert!(o.gap_top >= 50.0 && o.gap_top < 450.0);
            assert_eq!(o.gap_top.fract(), 0.0);
            assert_eq!(o.gap_bottom - o.gap_top, params.gap);
            assert_eq!(o.top_sprite_y, o.gap_top - params.sprite_height as f32);
            assert!(!o.passed());
        }
    }

    #[test]
    fn same_seed_same_gaps() {
        let params = ObstacleParams::default();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(
                Obstacle::spawn(700.0, &params, &mut a),
                Obstacle::spawn(700.0, &params, &mut b)
            );
        }
    }

    #[test]
    fn advance_keeps_moving_offscreen() {
        let params = ObstacleParams::default();
        let mut o = Obstacle::with_gap_top(-200.0, 100.0, &params);
        o.advance(&params);
        assert_eq!(o.x, -202.5);
        assert!(o.is_offscreen(&params));
    }

    #[test]
    fn passed_flips_once() {
        let mut o = Obstacle::with_gap_top(700.0, 100.0, &ObstacleParams::default());
        assert!(o.mark_passed());
        assert!(!o.mark_passed());
        assert!(o.passed());
    }

    #[test]
    fn retirement_uses_right_edge() {
        let params = ObstacleParams::default();
        let mut obstacles = vec![
            Obstacle::with_gap_top(-104.0, 100.0, &params),
            Obstacle::with_gap_top(-104.5, 100.0, &params),
            Obstacle::with_gap_top(300.0, 200.0, &params),
        ];
        assert_eq!(retire_offscreen(&mut obstacles, &params), 1);
        assert_eq!(obstacles.len(), 2);
        assert_eq!(obstacles[0].x, -104.0);
        assert_eq!(obstacles[1].x, 300.0);
    }

    #[test]
    fn retirement_is_idempotent() {
        let params = ObstacleParams::default();
        let mut obstacles = vec![
            Obstacle::with_gap_top(-500.0, 100.0, &params),
            Obstacle::with_gap_top(50.0, 150.0, &params),
        ];
        retire_offscreen(&mut obstacles, &params);
        let snapshot = obstacles.clone();
        assert_eq!(retire_offscreen(&mut obstacles, &params), 0);
        assert_eq!(retire_offscreen(&mut obstacles, &params), 0);
        assert_eq!(obstacles, snapshot);
    }
}
