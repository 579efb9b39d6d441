use nalgebra as na;

use crate::bbox::BBox;
use crate::track::{ObjectClass, TrackData};

/// Representative pixel point of a bounding box: feet midpoint for people,
/// box center for the ball.
#[inline]
pub fn anchor_for(class: ObjectClass, bbox: &BBox) -> na::Point2<f32> {
    match class {
        ObjectClass::Ball => bbox.center(),
        ObjectClass::Player | ObjectClass::Referee => bbox.foot(),
    }
}

/// Fills `anchor_pixel` for every record of every frame.
pub fn add_anchor_points(tracks: &mut TrackData) {
    for frame in &mut tracks.frames {
        for class in ObjectClass::ALL {
            for rec in frame.class_mut(class).iter_mut() {
                rec.anchor_pixel = Some(anchor_for(class, &rec.bbox));
            }
        }
    }
}
