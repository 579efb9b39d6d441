use std::collections::HashMap;

use nalgebra as na;

use crate::track::{ObjectClass, TrackData};

#[derive(Debug, Clone)]
pub struct KinematicsConfig {
    /// Speed is measured between window endpoints rather than consecutive
    /// frames, which would amplify projection noise.
    pub frame_window: usize,
    pub frame_rate: f32,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            frame_window: 5,
            frame_rate: 24.0,
        }
    }
}

/// Derives per-track speed (km/h) and cumulative distance (m) from projected
/// pitch positions. Players and referees only: the ball's interpolated boxes
/// would produce artifactual readings.
pub struct KinematicsEstimator {
    config: KinematicsConfig,
}

impl KinematicsEstimator {
    pub fn new(config: KinematicsConfig) -> Self {
        Self { config }
    }

    pub fn add_speed_and_distance(&self, tracks: &mut TrackData) {
        let window = self.config.frame_window.max(1);
        let count = tracks.len();
        if count < 2 {
            return;
        }

        for class in [ObjectClass::Player, ObjectClass::Referee] {
            let mut covered: HashMap<u32, f32> = HashMap::new();
            let mut start = 0;

            while start < count - 1 {
                let end = (start + window).min(count - 1);

                let ids: Vec<u32> = tracks.frames[start]
                    .class(class)
                    .iter()
                    .map(|r| r.track_id)
                    .collect();

                for id in ids {
                    // windows missing a pitch position at either endpoint are
                    // skipped: absent, not zero speed
                    let p0 = match tracks.record(start, class, id).and_then(|r| r.anchor_pitch) {
                        Some(p) => p,
                        None => continue,
                    };
                    let p1 = match tracks.record(end, class, id).and_then(|r| r.anchor_pitch) {
                        Some(p) => p,
                        None => continue,
                    };

                    let segment = na::distance(&p0, &p1);
                    let elapsed = (end - start) as f32 / self.config.frame_rate;
                    let speed_kmh = segment / elapsed * 3.6;

                    let total = covered.entry(id).or_insert(0.0);
                    *total += segment;
                    let total = *total;

                    for frame in start..end {
                        if let Some(rec) = tracks.record_mut(frame, class, id) {
                            rec.speed = Some(speed_kmh);
                            rec.distance = Some(total);
                        }
                    }
                }

                start = end;
            }
        }
    }
}
