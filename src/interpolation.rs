use crate::track::{TrackData, TrackRecord};

/// Fills frames where the ball was not detected by interpolating its box
/// between the nearest detections. Leading gaps hold the first known box,
/// trailing gaps the last one, so the output covers every frame whenever the
/// ball was seen at least once.
#[derive(Debug, Default)]
pub struct BallInterpolator;

impl BallInterpolator {
    /// Returns the number of frames that were filled in.
    pub fn interpolate(&self, tracks: &mut TrackData) -> usize {
        let known: Vec<(usize, u32, crate::bbox::BBox)> = tracks
            .frames
            .iter()
            .enumerate()
            .filter_map(|(idx, f)| f.ball.first().map(|b| (idx, b.track_id, b.bbox)))
            .collect();

        if known.is_empty() {
            // ball never detected, nothing to anchor the fill on
            return 0;
        }

        let mut filled = 0;
        let mut upper = 0usize;

        for idx in 0..tracks.frames.len() {
            while upper < known.len() && known[upper].0 < idx {
                upper += 1;
            }

            if upper < known.len() && known[upper].0 == idx {
                continue;
            }

            let rec = if upper == 0 {
                let (_, id, bbox) = known[0];
                TrackRecord::new(id, bbox)
            } else if upper == known.len() {
                let (_, id, bbox) = known[known.len() - 1];
                TrackRecord::new(id, bbox)
            } else {
                let (prev_frame, id, prev) = known[upper - 1];
                let (next_frame, _, next) = known[upper];
                let t = (idx - prev_frame) as f32 / (next_frame - prev_frame) as f32;

                TrackRecord::new(id, prev.lerp(&next, t))
            };

            tracks.frames[idx].ball.push(rec);
            filled += 1;
        }

        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use approx::assert_relative_eq;

    fn ball_data(detections: &[(usize, BBox)], frame_count: usize) -> TrackData {
        let mut data = TrackData::with_frames(frame_count);
        for &(frame, bbox) in detections {
            data.frames[frame].ball.push(TrackRecord::new(1, bbox));
        }
        data
    }

    fn centered(x: f32, y: f32) -> BBox {
        BBox::ltrb(x - 2.0, y - 2.0, x + 2.0, y + 2.0)
    }

    #[test]
    fn midpoint_of_a_gap() {
        let mut data = ball_data(
            &[(0, centered(0.0, 0.0)), (10, centered(100.0, 100.0))],
            11,
        );

        let filled = BallInterpolator.interpolate(&mut data);
        assert_eq!(filled, 9);

        let mid = data.frames[5].ball[0].bbox.center();
        assert_relative_eq!(mid.x, 50.0);
        assert_relative_eq!(mid.y, 50.0);

        for frame in &data.frames {
            assert_eq!(frame.ball.len(), 1);
        }
    }

    #[test]
    fn edges_hold_nearest_known_value() {
        let mut data = ball_data(
            &[(3, centered(30.0, 30.0)), (6, centered(60.0, 60.0))],
            10,
        );

        BallInterpolator.interpolate(&mut data);

        for idx in 0..3 {
            assert_relative_eq!(data.frames[idx].ball[0].bbox.center().x, 30.0);
        }
        for idx in 7..10 {
            assert_relative_eq!(data.frames[idx].ball[0].bbox.center().x, 60.0);
        }
    }

    #[test]
    fn never_detected_stays_absent() {
        let mut data = TrackData::with_frames(5);

        assert_eq!(BallInterpolator.interpolate(&mut data), 0);
        assert!(data.frames.iter().all(|f| f.ball.is_empty()));
    }

    #[test]
    fn fully_detected_is_untouched() {
        let mut data = ball_data(&[(0, centered(1.0, 1.0)), (1, centered(2.0, 2.0))], 2);
        let before = data.clone();

        assert_eq!(BallInterpolator.interpolate(&mut data), 0);
        assert_eq!(data, before);
    }

    #[test]
    fn carries_the_known_track_id() {
        let mut data = ball_data(&[(2, centered(10.0, 10.0))], 5);
        data.frames[2].ball[0].track_id = 42;

        BallInterpolator.interpolate(&mut data);

        assert!(data.frames.iter().all(|f| f.ball[0].track_id == 42));
    }
}
