use std::collections::HashMap;

use opencv::{
    core::{self, Mat, Rect, TermCriteria, TermCriteria_Type},
    prelude::*,
};

use crate::bbox::BBox;
use crate::error::Error;
use crate::track::{TeamId, TrackData};

/// Color triple in OpenCV channel order (blue, green, red).
pub type Bgr = [f32; 3];

#[derive(Debug, Clone)]
pub struct TeamConfig {
    /// Track IDs never clustered into a jersey team, e.g. goalkeepers in a
    /// distinct kit.
    pub excluded_ids: Vec<u32>,
    pub kmeans_attempts: i32,
}

impl TeamConfig {
    pub fn new(excluded_ids: Vec<u32>) -> Self {
        Self {
            excluded_ids,
            kmeans_attempts: 3,
        }
    }
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// The two team centroid colors, fit once from the first frame's player
/// crops and reused for the rest of the video.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamModel {
    pub colors: [Bgr; 2],
}

impl TeamModel {
    /// Clusters first-frame jersey colors into the two team centroids.
    pub fn fit(frame: &Mat, tracks: &TrackData, config: &TeamConfig) -> Result<Self, Error> {
        let first = match tracks.frames.first() {
            Some(first) => first,
            None => return Err(Error::NotEnoughPlayers(0)),
        };

        let mut samples = Vec::new();
        for rec in &first.players {
            if config.excluded_ids.contains(&rec.track_id) || rec.bbox.is_degenerate() {
                continue;
            }

            match jersey_color(frame, &rec.bbox, config.kmeans_attempts.max(1)) {
                Ok(color) => samples.push(color),
                Err(err) => {
                    log::warn!("player {}: jersey sampling failed: {}", rec.track_id, err);
                }
            }
        }

        if samples.len() < 2 {
            return Err(Error::NotEnoughPlayers(samples.len()));
        }

        let (_, colors) = kmeans2(&samples, config.kmeans_attempts.max(1))?;
        Ok(Self { colors })
    }

    /// Nearest centroid by squared color distance.
    pub fn classify(&self, color: Bgr) -> TeamId {
        let d0 = squared_distance(color, self.colors[0]);
        let d1 = squared_distance(color, self.colors[1]);

        if d0 <= d1 {
            TeamId(0)
        } else {
            TeamId(1)
        }
    }
}

#[inline]
fn squared_distance(a: Bgr, b: Bgr) -> f32 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Labels player tracks by nearest team centroid. The first classification
/// of a track ID is cached for the rest of the video, so one noisy sample in
/// a later frame cannot flip a team mid-match.
pub struct TeamClassifier {
    model: TeamModel,
    config: TeamConfig,
    assigned: HashMap<u32, TeamId>,
}

impl TeamClassifier {
    pub fn new(model: TeamModel, config: TeamConfig) -> Self {
        Self {
            model,
            config,
            assigned: HashMap::new(),
        }
    }

    #[inline]
    pub fn model(&self) -> &TeamModel {
        &self.model
    }

    /// Cached label for the ID, or classify `sample` and cache the result.
    /// Excluded IDs never get a team.
    pub fn team_for(&mut self, track_id: u32, sample: Option<Bgr>) -> Option<TeamId> {
        if self.config.excluded_ids.contains(&track_id) {
            return None;
        }

        if let Some(team) = self.assigned.get(&track_id) {
            return Some(*team);
        }

        let team = self.model.classify(sample?);
        self.assigned.insert(track_id, team);

        Some(team)
    }

    /// Fills `team` and `team_color` for every player record. Frames are
    /// only sampled for IDs that have no cached label yet.
    pub fn add_teams(&mut self, frames: &[Mat], tracks: &mut TrackData) {
        let attempts = self.config.kmeans_attempts.max(1);

        for (image, frame) in frames.iter().zip(tracks.frames.iter_mut()) {
            for rec in &mut frame.players {
                let sample = if self.assigned.contains_key(&rec.track_id)
                    || rec.bbox.is_degenerate()
                {
                    None
                } else {
                    match jersey_color(image, &rec.bbox, attempts) {
                        Ok(color) => Some(color),
                        Err(err) => {
                            log::warn!(
                                "player {}: jersey sampling failed: {}",
                                rec.track_id,
                                err
                            );
                            None
                        }
                    }
                };

                if let Some(team) = self.team_for(rec.track_id, sample) {
                    rec.team = Some(team);
                    rec.team_color = Some(self.model.colors[team.0 as usize]);
                }
            }
        }
    }
}

/// Dominant jersey color of a player crop: pixel-level k=2 over the upper
/// half of the box, with the cluster owning the crop corners rejected as
/// background (grass, stands).
pub fn jersey_color(image: &Mat, bbox: &BBox, attempts: i32) -> Result<Bgr, Error> {
    let cols = image.cols();
    let rows = image.rows();

    let left = (bbox.left.round().max(0.0) as i32).min(cols);
    let top = (bbox.top.round().max(0.0) as i32).min(rows);
    let right = (bbox.right.round() as i32).clamp(left, cols);
    let bottom = (bbox.bottom.round() as i32).clamp(top, rows);

    let width = right - left;
    let half = (bottom - top) / 2;

    if width <= 0 || half <= 0 {
        return Err(Error::EmptyCrop);
    }

    let crop = Mat::roi(image, Rect::new(left, top, width, half))?;

    let mut samples = Vec::with_capacity((width * half) as usize);
    for r in 0..half {
        for c in 0..width {
            let px = crop.at_2d::<core::Vec3b>(r, c)?;
            samples.push([px[0] as f32, px[1] as f32, px[2] as f32]);
        }
    }

    if samples.len() < 2 {
        return Err(Error::EmptyCrop);
    }

    let (labels, centers) = kmeans2(&samples, attempts)?;

    let corners = [
        0,
        (width - 1) as usize,
        ((half - 1) * width) as usize,
        (half * width - 1) as usize,
    ];
    let background_votes = corners.iter().filter(|&&idx| labels[idx] == 0).count();
    let jersey = if background_votes >= 2 { 1 } else { 0 };

    Ok(centers[jersey])
}

fn kmeans2(colors: &[Bgr], attempts: i32) -> Result<(Vec<i32>, [Bgr; 2]), Error> {
    let mut flat = Vec::with_capacity(colors.len() * 3);
    for color in colors {
        flat.extend_from_slice(color);
    }

    let data = Mat::from_slice(&flat)?;
    let data = data.reshape(1, colors.len() as i32)?;

    let mut labels = Mat::default();
    let mut centers = Mat::default();
    let criteria = TermCriteria::new(
        TermCriteria_Type::COUNT as i32 + TermCriteria_Type::EPS as i32,
        10,
        1.0,
    )?;

    core::kmeans(
        &data,
        2,
        &mut labels,
        criteria,
        attempts,
        core::KMEANS_PP_CENTERS,
        &mut centers,
    )?;

    let mut out_labels = Vec::with_capacity(colors.len());
    for i in 0..colors.len() {
        out_labels.push(*labels.at::<i32>(i as i32)?);
    }

    let mut out_centers = [[0.0f32; 3]; 2];
    for (k, center) in out_centers.iter_mut().enumerate() {
        for (ch, value) in center.iter_mut().enumerate() {
            *value = *centers.at_2d::<f32>(k as i32, ch as i32)?;
        }
    }

    Ok((out_labels, out_centers))
}
