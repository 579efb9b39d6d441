use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use nalgebra as na;

use crate::error::Error;
use crate::math::point_in_polygon;
use crate::track::TrackData;

/// One calibration point pair: a pixel location and the pitch location it
/// corresponds to, in meters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub pixel: [f32; 2],
    pub pitch: [f32; 2],
}

/// Fixed calibration of one camera setup: at least four pixel/pitch pairs
/// plus the playable region in pixel space. An empty `playable_area` falls
/// back to the polygon formed by the pixel-side points in order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PitchCalibration {
    pub points: Vec<Correspondence>,
    #[serde(default)]
    pub playable_area: Vec<[f32; 2]>,
}

impl PitchCalibration {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        Ok(std::fs::write(path, serde_json::to_string_pretty(self)?)?)
    }
}

/// 3x3 projective transform from compensated pixel coordinates to the pitch
/// plane, computed once per calibration via normalized DLT.
#[derive(Debug, Clone)]
pub struct Homography {
    matrix: na::Matrix3<f32>,
}

impl Homography {
    pub fn from_points(points: &[Correspondence]) -> Result<Self, Error> {
        if points.len() < 4 {
            return Err(Error::NotEnoughCorrespondences(points.len()));
        }

        let src: Vec<(f64, f64)> = points
            .iter()
            .map(|c| (c.pixel[0] as f64, c.pixel[1] as f64))
            .collect();
        let dst: Vec<(f64, f64)> = points
            .iter()
            .map(|c| (c.pitch[0] as f64, c.pitch[1] as f64))
            .collect();

        let (t_src, src) = normalize(&src)?;
        let (t_dst, dst) = normalize(&dst)?;

        // Direct linear transform over the normalized pairs
        let mut a = na::DMatrix::<f64>::zeros(2 * src.len(), 9);
        for (i, (&(x, y), &(u, v))) in src.iter().zip(dst.iter()).enumerate() {
            let rows = [
                [-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u],
                [0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v],
            ];

            for (j, row) in rows.iter().enumerate() {
                for (k, &value) in row.iter().enumerate() {
                    a[(2 * i + j, k)] = value;
                }
            }
        }

        // h is the eigenvector of A^T A with the smallest eigenvalue
        let ata = a.transpose() * &a;
        let eigen = na::SymmetricEigen::new(ata);

        let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
        order.sort_by(|&i, &j| {
            eigen.eigenvalues[i]
                .partial_cmp(&eigen.eigenvalues[j])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // a second vanishing eigenvalue means the solution is not unique:
        // the correspondences are collinear or duplicated
        let largest = eigen.eigenvalues[order[order.len() - 1]];
        if largest <= 0.0 || eigen.eigenvalues[order[1]] < largest * 1e-12 {
            return Err(Error::DegenerateHomography);
        }

        let h = eigen.eigenvectors.column(order[0]);
        let hn = na::Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

        let t_dst_inv = t_dst.try_inverse().ok_or(Error::DegenerateHomography)?;
        let matrix = t_dst_inv * hn * t_src;

        if matrix.determinant().abs() < 1e-12 || matrix.try_inverse().is_none() {
            return Err(Error::DegenerateHomography);
        }

        Ok(Self {
            matrix: matrix.map(|v| v as f32),
        })
    }

    /// Pure function of the fixed matrix: the same input always maps to the
    /// same pitch point.
    pub fn project(&self, p: na::Point2<f32>) -> na::Point2<f32> {
        let v = self.matrix * na::Vector3::new(p.x, p.y, 1.0);
        let w = if v.z == 0.0 { f32::EPSILON } else { v.z };

        na::Point2::new(v.x / w, v.y / w)
    }
}

/// Hartley normalization: centroid to origin, mean distance to sqrt(2).
fn normalize(points: &[(f64, f64)]) -> Result<(na::Matrix3<f64>, Vec<(f64, f64)>), Error> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mean_dist = points
        .iter()
        .map(|p| ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    if mean_dist < 1e-12 {
        // all points coincide
        return Err(Error::DegenerateHomography);
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = na::Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = points
        .iter()
        .map(|p| ((p.0 - cx) * s, (p.1 - cy) * s))
        .collect();

    Ok((t, normalized))
}

/// Maps compensated pixel anchors onto the pitch plane, gated by the playable
/// polygon: anchors whose pixel point falls outside it get no pitch position
/// at all rather than an out-of-range one.
pub struct PitchProjector {
    homography: Homography,
    playable_area: Vec<na::Point2<f32>>,
}

impl PitchProjector {
    pub fn new(calibration: &PitchCalibration) -> Result<Self, Error> {
        let homography = Homography::from_points(&calibration.points)?;

        let playable_area = if calibration.playable_area.is_empty() {
            calibration
                .points
                .iter()
                .map(|c| na::Point2::new(c.pixel[0], c.pixel[1]))
                .collect()
        } else {
            calibration
                .playable_area
                .iter()
                .map(|p| na::Point2::new(p[0], p[1]))
                .collect()
        };

        Ok(Self {
            homography,
            playable_area,
        })
    }

    pub fn project(&self, p: na::Point2<f32>) -> Option<na::Point2<f32>> {
        if !point_in_polygon(p, &self.playable_area) {
            return None;
        }

        Some(self.homography.project(p))
    }

    /// Fills `anchor_pitch` from `anchor_compensated` for every record.
    pub fn add_pitch_positions(&self, tracks: &mut TrackData) {
        for frame in &mut tracks.frames {
            for rec in frame.records_mut() {
                rec.anchor_pitch = rec.anchor_compensated.and_then(|p| self.project(p));
            }
        }
    }
}
