use nalgebra as na;

use opencv::{
    core::{self, Mat, Point2f, Rect, Scalar, Size, TermCriteria, TermCriteria_Type, Vector},
    imgproc,
    prelude::*,
    video,
};

use crate::error::Error;
use crate::track::TrackData;

/// Image-space shift of the static background between two consecutive
/// frames. Positive x means the scene content moved right, i.e. the camera
/// panned left. The cumulative sum over frames is the total drift since the
/// start of the video.
pub type CameraMovement = [f32; 2];

#[derive(Debug, Clone)]
pub struct CameraMotionConfig {
    pub max_corners: i32,
    pub quality_level: f64,
    pub min_corner_distance: f64,
    pub block_size: i32,
    /// Width of the column bands on each side of the frame used as the
    /// feature mask. The bands see stands and boards, not moving players.
    pub left_band: i32,
    pub right_band: i32,
    /// Shifts below this magnitude (px) are camera jitter, not panning.
    pub min_movement: f32,
    /// Corners are re-detected once fewer than this survive tracking.
    pub min_features: usize,
    pub win_size: i32,
    pub max_level: i32,
}

impl Default for CameraMotionConfig {
    fn default() -> Self {
        Self {
            max_corners: 100,
            quality_level: 0.3,
            min_corner_distance: 3.0,
            block_size: 7,
            left_band: 20,
            right_band: 150,
            min_movement: 5.0,
            min_features: 20,
            win_size: 15,
            max_level: 2,
        }
    }
}

/// Corner features currently being tracked across frames, with explicit
/// count instead of implicit array identity.
#[derive(Debug, Default)]
pub struct FeaturePoints {
    points: Vector<Point2f>,
}

impl FeaturePoints {
    pub fn detect(gray: &Mat, mask: &Mat, config: &CameraMotionConfig) -> Result<Self, Error> {
        let mut points = Vector::<Point2f>::new();
        imgproc::good_features_to_track(
            gray,
            &mut points,
            config.max_corners,
            config.quality_level,
            config.min_corner_distance,
            mask,
            config.block_size,
            false,
            0.04,
        )?;

        Ok(Self { points })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Still enough features to trust the next flow step?
    #[inline]
    pub fn is_valid(&self, min_features: usize) -> bool {
        self.points.len() >= min_features
    }
}

/// Estimates per-frame camera panning from sparse optical flow over the
/// masked frame edges, where the background is static.
pub struct CameraMotionEstimator {
    config: CameraMotionConfig,
}

impl CameraMotionEstimator {
    pub fn new(config: CameraMotionConfig) -> Self {
        Self { config }
    }

    fn band_mask(&self, size: Size) -> Result<Mat, Error> {
        let mut mask = Mat::zeros(size.height, size.width, core::CV_8UC1)?.to_mat()?;

        let left = self.config.left_band.clamp(0, size.width);
        if left > 0 {
            imgproc::rectangle(
                &mut mask,
                Rect::new(0, 0, left, size.height),
                Scalar::all(255.0),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?;
        }

        let right = self.config.right_band.clamp(0, size.width);
        if right > 0 {
            imgproc::rectangle(
                &mut mask,
                Rect::new(size.width - right, 0, right, size.height),
                Scalar::all(255.0),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?;
        }

        Ok(mask)
    }

    /// One movement vector per frame, frame 0 always zero. Frames where flow
    /// cannot be established degrade to zero movement, never to an error.
    pub fn estimate(&self, frames: &[Mat]) -> Result<Vec<CameraMovement>, Error> {
        let mut movements = vec![[0.0f32, 0.0]; frames.len()];

        let first = match frames.first() {
            Some(first) => first,
            None => return Ok(movements),
        };

        let mut prev_gray = Mat::default();
        imgproc::cvt_color(first, &mut prev_gray, imgproc::COLOR_BGR2GRAY, 0)?;

        let mask = self.band_mask(prev_gray.size()?)?;
        let mut features = FeaturePoints::detect(&prev_gray, &mask, &self.config)?;

        let criteria = TermCriteria::new(
            TermCriteria_Type::COUNT as i32 + TermCriteria_Type::EPS as i32,
            10,
            0.03,
        )?;

        for (idx, frame) in frames.iter().enumerate().skip(1) {
            let mut gray = Mat::default();
            imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

            if features.is_empty() {
                log::warn!("frame {}: no trackable features, assuming still camera", idx);
                features = FeaturePoints::detect(&gray, &mask, &self.config)?;
                prev_gray = gray;
                continue;
            }

            let mut next_points = Vector::<Point2f>::new();
            let mut status = Vector::<u8>::new();
            let mut flow_err = Vector::<f32>::new();

            video::calc_optical_flow_pyr_lk(
                &prev_gray,
                &gray,
                &features.points,
                &mut next_points,
                &mut status,
                &mut flow_err,
                Size::new(self.config.win_size, self.config.win_size),
                self.config.max_level,
                criteria,
                0,
                1e-4,
            )?;

            // the strongest consistent shift among static background features
            // is the global pan; everything else is outlier or jitter
            let mut best: Option<na::Vector2<f32>> = None;
            let mut survivors = Vector::<Point2f>::new();

            for i in 0..status.len() {
                if status.get(i)? == 0 {
                    continue;
                }

                let old = features.points.get(i)?;
                let new = next_points.get(i)?;
                survivors.push(new);

                let shift = na::Vector2::new(new.x - old.x, new.y - old.y);
                if best.map_or(true, |b| shift.norm() > b.norm()) {
                    best = Some(shift);
                }
            }

            match best {
                Some(shift) if shift.norm() > self.config.min_movement => {
                    movements[idx] = [shift.x, shift.y];
                }
                Some(_) => {}
                None => {
                    log::warn!("frame {}: optical flow lost every feature", idx);
                }
            }

            features.points = survivors;
            if !features.is_valid(self.config.min_features) {
                features = FeaturePoints::detect(&gray, &mask, &self.config)?;
            }

            prev_gray = gray;
        }

        Ok(movements)
    }
}

/// Fills `anchor_compensated` by subtracting the cumulative camera drift
/// from every pixel anchor, so a point that is stationary on the pitch stays
/// stationary in compensated coordinates while the camera pans.
pub fn add_adjusted_positions(tracks: &mut TrackData, movements: &[CameraMovement]) {
    let mut drift = na::Vector2::new(0.0f32, 0.0);

    for (frame, movement) in tracks.frames.iter_mut().zip(movements) {
        drift += na::Vector2::new(movement[0], movement[1]);

        for rec in frame.records_mut() {
            rec.anchor_compensated = rec.anchor_pixel.map(|p| p - drift);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::track::TrackRecord;
    use approx::assert_relative_eq;

    #[test]
    fn stationary_point_compensates_to_zero_drift() {
        // constant pan: background shifts (-3, -1) px per frame
        let movements: Vec<CameraMovement> = std::iter::once([0.0, 0.0])
            .chain(std::iter::repeat([-3.0, -1.0]).take(5))
            .collect();

        let mut data = TrackData::with_frames(movements.len());
        for (idx, frame) in data.frames.iter_mut().enumerate() {
            let mut rec = TrackRecord::new(4, BBox::ltrb(0.0, 0.0, 10.0, 20.0));
            // a world-stationary point drifts with the background
            rec.anchor_pixel = Some(na::Point2::new(
                200.0 - 3.0 * idx as f32,
                150.0 - 1.0 * idx as f32,
            ));
            frame.players.push(rec);
        }

        add_adjusted_positions(&mut data, &movements);

        for frame in &data.frames {
            let compensated = frame.players[0].anchor_compensated.unwrap();
            assert_relative_eq!(compensated.x, 200.0, epsilon = 1e-4);
            assert_relative_eq!(compensated.y, 150.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn zero_movement_leaves_anchors_in_place() {
        let movements = vec![[0.0, 0.0]; 3];
        let mut data = TrackData::with_frames(3);
        for frame in &mut data.frames {
            let mut rec = TrackRecord::new(2, BBox::ltrb(0.0, 0.0, 4.0, 4.0));
            rec.anchor_pixel = Some(na::Point2::new(10.0, 20.0));
            frame.ball.push(rec);
        }

        add_adjusted_positions(&mut data, &movements);

        for frame in &data.frames {
            assert_eq!(
                frame.ball[0].anchor_compensated,
                frame.ball[0].anchor_pixel
            );
        }
    }

    #[test]
    fn records_without_anchor_stay_uncompensated() {
        let movements = vec![[0.0, 0.0], [5.0, 0.0]];
        let mut data = TrackData::with_frames(2);
        data.frames[1]
            .players
            .push(TrackRecord::new(1, BBox::ltrb(0.0, 0.0, 4.0, 4.0)));

        add_adjusted_positions(&mut data, &movements);

        assert!(data.frames[1].players[0].anchor_compensated.is_none());
    }
}
