use std::path::PathBuf;

use opencv::core::Mat;

use crate::anchor;
use crate::cache;
use crate::camera::{self, CameraMotionConfig, CameraMotionEstimator, CameraMovement};
use crate::error::Error;
use crate::interpolation::BallInterpolator;
use crate::kinematics::{KinematicsConfig, KinematicsEstimator};
use crate::possession::{PossessionAssigner, PossessionConfig};
use crate::projection::{PitchCalibration, PitchProjector};
use crate::team::{TeamClassifier, TeamConfig, TeamModel};
use crate::track::{TeamId, TrackData};

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub camera: CameraMotionConfig,
    pub kinematics: KinematicsConfig,
    pub team: TeamConfig,
    pub possession: PossessionConfig,
    /// Optional recoverable cache for the camera movement pass; a miss falls
    /// back to recomputation.
    pub camera_stub: Option<PathBuf>,
}

/// Whole-video analysis: runs every stage in order over a batch of decoded
/// frames and the tracker's detections, enriching the records in place.
pub struct Pipeline {
    projector: PitchProjector,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(calibration: &PitchCalibration, config: PipelineConfig) -> Result<Self, Error> {
        Ok(Self {
            projector: PitchProjector::new(calibration)?,
            config,
        })
    }

    /// Returns the per-frame team-in-possession series.
    pub fn run(
        &self,
        frames: &[Mat],
        tracks: &mut TrackData,
    ) -> Result<Vec<Option<TeamId>>, Error> {
        if frames.len() != tracks.len() {
            return Err(Error::FrameCountMismatch {
                tracks: tracks.len(),
                video: frames.len(),
            });
        }

        if frames.is_empty() {
            return Ok(Vec::new());
        }

        anchor::add_anchor_points(tracks);

        let movements = self.camera_movement(frames)?;
        camera::add_adjusted_positions(tracks, &movements);
        self.projector.add_pitch_positions(tracks);

        let filled = BallInterpolator.interpolate(tracks);
        if filled > 0 {
            log::debug!("interpolated {} ball frames", filled);
            // filled boxes go through the same anchor, compensation and
            // projection passes as detected ones; all three are idempotent
            anchor::add_anchor_points(tracks);
            camera::add_adjusted_positions(tracks, &movements);
            self.projector.add_pitch_positions(tracks);
        }

        KinematicsEstimator::new(self.config.kinematics.clone()).add_speed_and_distance(tracks);

        let model = TeamModel::fit(&frames[0], tracks, &self.config.team)?;
        let mut classifier = TeamClassifier::new(model, self.config.team.clone());
        classifier.add_teams(frames, tracks);

        Ok(PossessionAssigner::new(self.config.possession.clone()).assign(tracks))
    }

    fn camera_movement(&self, frames: &[Mat]) -> Result<Vec<CameraMovement>, Error> {
        let estimator = CameraMotionEstimator::new(self.config.camera.clone());

        let stub_path = match &self.config.camera_stub {
            Some(path) => path,
            None => return estimator.estimate(frames),
        };

        let key = cache::video_key(frames)?;
        if let Some(movements) = cache::load_camera_stub(stub_path, &key) {
            if movements.len() == frames.len() {
                log::debug!("camera movement loaded from {}", stub_path.display());
                return Ok(movements);
            }

            log::warn!(
                "camera stub covers {} frames, video has {}; recomputing",
                movements.len(),
                frames.len()
            );
        }

        let movements = estimator.estimate(frames)?;
        if let Err(err) = cache::save_camera_stub(stub_path, &key, &movements) {
            log::warn!("camera stub {} not written: {}", stub_path.display(), err);
        }

        Ok(movements)
    }
}
