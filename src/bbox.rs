use serde_derive::{Deserialize, Serialize};

use nalgebra as na;

/// Pixel rectangle in left-top-right-bottom order, as delivered by the
/// upstream tracker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BBox {
    #[inline]
    pub fn ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Box center, the ball anchor.
    #[inline]
    pub fn center(&self) -> na::Point2<f32> {
        na::Point2::new(self.cx(), self.cy())
    }

    /// Feet midpoint, the player/referee anchor.
    #[inline]
    pub fn foot(&self) -> na::Point2<f32> {
        na::Point2::new(self.cx(), self.bottom)
    }

    /// A box without area contributes no pixels and no distances.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Component-wise linear interpolation towards `other`, `t` in `0.0..=1.0`.
    pub fn lerp(&self, other: &BBox, t: f32) -> BBox {
        let t = t.clamp(0.0, 1.0);

        BBox {
            left: crate::math::lerp(self.left, other.left, t),
            top: crate::math::lerp(self.top, other.top, t),
            right: crate::math::lerp(self.right, other.right, t),
            bottom: crate::math::lerp(self.bottom, other.bottom, t),
        }
    }
}
