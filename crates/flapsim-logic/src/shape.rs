//! Opaque-pixel masks and the sprite silhouettes built from them.
//!
//! A [`Mask`] is a row-major bitmap. Overlap tests place one mask at an
//! integer offset in the other's coordinates and look for a pixel set in
//! both, which is what a pixel-perfect sprite collision needs.
//!
//! The bird silhouette changes with its tilt, so [`SpriteMasks`] keeps one
//! pre-rotated mask per tilt bucket. Rotation follows how the bird is drawn:
//! the rotated image is re-centred on the unrotated sprite's centre, and its
//! bounding box grows to fit.

use crate::config::SimConfig;
use crate::constants::run;

/// Row-major opaque-pixel bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    pub fn filled(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![true; width * height],
        }
    }

    /// Build a mask by asking `opaque(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut opaque: impl FnMut(usize, usize) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.bits[y * width + x] = opaque(x, y);
            }
        }
        mask
    }

    /// Filled ellipse inscribed in a `width`×`height` box.
    pub fn ellipse(width: usize, height: usize) -> Self {
        let a = width as f32 / 2.0;
        let b = height as f32 / 2.0;
        Self::from_fn(width, height, |x, y| {
            let dx = (x as f32 + 0.5 - a) / a;
            let dy = (y as f32 + 0.5 - b) / b;
            dx * dx + dy * dy <= 1.0
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, opaque: bool) {
        if x < self.width && y < self.height {
            self.bits[y * self.width + x] = opaque;
        }
    }

    /// Number of opaque pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn flipped_vertical(&self) -> Self {
        Self::from_fn(self.width, self.height, |x, y| self.get(x, self.height - 1 - y))
    }

    /// Rotate counter-clockwise (as seen on screen) by `degrees`.
    ///
    /// The result is large enough to hold the whole rotated image and is
    /// centred on the same point as `self`.
    pub fn rotated(&self, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let w = self.width as f32;
        let h = self.height as f32;
        let rw = (w * cos.abs() + h * sin.abs() - 1e-3).ceil().max(1.0) as usize;
        let rh = (w * sin.abs() + h * cos.abs() - 1e-3).ceil().max(1.0) as usize;

        let (src_cx, src_cy) = (w / 2.0, h / 2.0);
        let (dst_cx, dst_cy) = (rw as f32 / 2.0, rh as f32 / 2.0);

        Self::from_fn(rw, rh, |x, y| {
            let dx = x as f32 + 0.5 - dst_cx;
            let dy = y as f32 + 0.5 - dst_cy;
            // Inverse of the screen-space rotation x' = x·cos + y·sin, y' = -x·sin + y·cos
            let sx = dx * cos - dy * sin + src_cx;
            let sy = dx * sin + dy * cos + src_cy;
            sx >= 0.0 && sy >= 0.0 && self.get(sx as usize, sy as usize)
        })
    }

    /// First pixel set in both masks, with `other`'s origin placed at `offset`
    /// in this mask's coordinates. The point is reported in this mask's
    /// coordinates.
    pub fn overlap(&self, other: &Mask, offset: (i32, i32)) -> Option<(i32, i32)> {
        let (ox, oy) = offset;
        let x0 = ox.max(0);
        let y0 = oy.max(0);
        let x1 = (ox + other.width as i32).min(self.width as i32);
        let y1 = (oy + other.height as i32).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        for y in y0..y1 {
            let row = y as usize * self.width;
            let other_row = (y - oy) as usize * other.width;
            for x in x0..x1 {
                if self.bits[row + x as usize] && other.bits[other_row + (x - ox) as usize] {
                    return Some((x, y));
                }
            }
        }
        None
    }
}

/// Obstacle piece: full-width lip at the open end, inset body behind it.
/// The open end is at the top, as for the bottom piece.
pub fn obstacle_piece(width: usize, height: usize, lip_height: usize, inset: usize) -> Mask {
    Mask::from_fn(width, height, |x, y| {
        y < lip_height || (x >= inset && x + inset < width)
    })
}

/// Every mask a collision test needs, built once per run.
#[derive(Debug, Clone)]
pub struct SpriteMasks {
    bird_by_tilt: Vec<Mask>,
    min_tilt: f32,
    tilt_bucket: f32,
    bird_size: (usize, usize),
    pub obstacle_top: Mask,
    pub obstacle_bottom: Mask,
}

impl SpriteMasks {
    pub fn new(config: &SimConfig) -> Self {
        let bird = &config.bird;
        let bird_size = (bird.sprite_width as usize, bird.sprite_height as usize);
        let base = Mask::ellipse(bird_size.0, bird_size.1);

        let bucket = config.tilt_bucket;
        let steps = ((bird.max_tilt - bird.min_tilt) / bucket).round();
        // Unvalidated configs: zero or NaN buckets give one mask, tiny ones hit the cap.
        let buckets = if steps.is_finite() && steps >= 0.0 {
            (steps as usize).min(run::MAX_TILT_BUCKETS - 1) + 1
        } else {
            1
        };
        let bird_by_tilt = (0..buckets)
            .map(|i| base.rotated(bird.min_tilt + i as f32 * bucket))
            .collect();

        let ob = &config.obstacle;
        let obstacle_bottom = obstacle_piece(
            ob.sprite_width as usize,
            ob.sprite_height as usize,
            ob.lip_height as usize,
            ob.body_inset as usize,
        );
        let obstacle_top = obstacle_bottom.flipped_vertical();

        Self {
            bird_by_tilt,
            min_tilt: bird.min_tilt,
            tilt_bucket: bucket,
            bird_size,
            obstacle_top,
            obstacle_bottom,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bird_by_tilt.len()
    }

    fn bucket_index(&self, tilt: f32) -> usize {
        let idx = ((tilt - self.min_tilt) / self.tilt_bucket).round();
        (idx.max(0.0) as usize).min(self.bird_by_tilt.len() - 1)
    }

    /// Bird silhouette for a tilt.
    pub fn bird(&self, tilt: f32) -> &Mask {
        &self.bird_by_tilt[self.bucket_index(tilt)]
    }

    /// Top-left of the rotated bird mask for a bird whose unrotated sprite
    /// sits at `(x, y)`.
    pub fn bird_origin(&self, x: f32, y: f32, tilt: f32) -> (i32, i32) {
        let mask = self.bird(tilt);
        let cx = x + self.bird_size.0 as f32 / 2.0;
        let cy = y + self.bird_size.1 as f32 / 2.0;
        (
            (cx - mask.width() as f32 / 2.0).round() as i32,
            (cy - mask.height() as f32 / 2.0).round() as i32,
        )
    }
}
