use nalgebra as na;
use num_traits::Float;

#[inline]
pub fn lerp<T: na::RealField + Float>(a: T, b: T, t: T) -> T {
    a * (T::one() - t) + b * t
}

/// Ray-casting point-in-polygon test over an arbitrary (possibly
/// non-convex) polygon.
pub fn point_in_polygon<T>(p: na::Point2<T>, poly: &[na::Point2<T>]) -> bool
where
    T: na::RealField + Float,
{
    let n = poly.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut p1 = poly[0];
    let mut xints = T::zero();

    for i in 1..=n {
        let p2 = poly[i % n];

        if p.y > Float::min(p1.y, p2.y)
            && p.y <= Float::max(p1.y, p2.y)
            && p.x <= Float::max(p1.x, p2.x)
        {
            if Float::abs(p1.y - p2.y) > T::epsilon() {
                xints = (p.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            }

            if Float::abs(p1.x - p2.x) < T::epsilon() || p.x <= xints {
                inside = !inside;
            }
        }

        p1 = p2;
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<na::Point2<f32>> {
        vec![
            na::Point2::new(0.0, 0.0),
            na::Point2::new(10.0, 0.0),
            na::Point2::new(10.0, 10.0),
            na::Point2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn inside_and_outside() {
        let poly = square();

        assert!(point_in_polygon(na::Point2::new(5.0, 5.0), &poly));
        assert!(point_in_polygon(na::Point2::new(0.5, 9.5), &poly));
        assert!(!point_in_polygon(na::Point2::new(-1.0, 5.0), &poly));
        assert!(!point_in_polygon(na::Point2::new(5.0, 11.0), &poly));
        assert!(!point_in_polygon(na::Point2::new(15.0, 5.0), &poly));
    }

    #[test]
    fn non_convex() {
        // L-shape: the notch at the top right is outside
        let poly = vec![
            na::Point2::new(0.0, 0.0),
            na::Point2::new(10.0, 0.0),
            na::Point2::new(10.0, 5.0),
            na::Point2::new(5.0, 5.0),
            na::Point2::new(5.0, 10.0),
            na::Point2::new(0.0, 10.0),
        ];

        assert!(point_in_polygon(na::Point2::new(2.0, 8.0), &poly));
        assert!(point_in_polygon(na::Point2::new(8.0, 2.0), &poly));
        assert!(!point_in_polygon(na::Point2::new(8.0, 8.0), &poly));
    }

    #[test]
    fn too_few_vertices() {
        let poly = vec![na::Point2::new(0.0, 0.0), na::Point2::new(10.0, 0.0)];
        assert!(!point_in_polygon(na::Point2::new(5.0, 0.0), &poly));
    }
}
