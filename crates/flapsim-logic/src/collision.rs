//! Bird-vs-obstacle collision on opaque pixels.

use crate::entity::Bird;
use crate::obstacle::Obstacle;
use crate::shape::SpriteMasks;

/// Which part of an obstacle was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Top,
    Bottom,
}

/// Test a bird against both pieces of an obstacle, using the silhouette for
/// the bird's current tilt. Returns the first piece that overlaps.
pub fn check(bird: &Bird, obstacle: &Obstacle, masks: &SpriteMasks) -> Option<Hit> {
    let bird_mask = masks.bird(bird.tilt);
    let (bx, by) = masks.bird_origin(bird.x, bird.y, bird.tilt);
    let ox = obstacle.x.round() as i32;

    let top_offset = (ox - bx, obstacle.top_sprite_y.round() as i32 - by);
    let bottom_offset = (ox - bx, obstacle.gap_bottom.round() as i32 - by);

    if bird_mask.overlap(&masks.obstacle_top, top_offset).is_some() {
        Some(Hit::Top)
    } else if bird_mask
        .overlap(&masks.obstacle_bottom, bottom_offset)
        .is_some()
    {
        Some(Hit::Bottom)
    } else {
        None
    }
}

pub fn collides(bird: &Bird, obstacle: &Obstacle, masks: &SpriteMasks) -> bool {
    check(bird, obstacle, masks).is_some()
}
