use nalgebra as na;

use crate::track::{TeamId, TrackData};

#[derive(Debug, Clone)]
pub struct PossessionConfig {
    /// Maximum player-to-ball distance in pitch meters; within it the nearest
    /// player is considered to be playing the ball.
    pub max_distance: f32,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self { max_distance: 2.0 }
    }
}

/// Assigns ball possession per frame to the nearest eligible player, and
/// builds the team-in-possession series the control display runs on.
pub struct PossessionAssigner {
    config: PossessionConfig,
}

impl PossessionAssigner {
    pub fn new(config: PossessionConfig) -> Self {
        Self { config }
    }

    /// Flags `has_ball` on the winning player of each frame and returns one
    /// series entry per frame. Frames where nobody is within reach carry the
    /// previous value forward; entries before any possession ever happened
    /// stay `None`.
    pub fn assign(&self, tracks: &mut TrackData) -> Vec<Option<TeamId>> {
        let mut series: Vec<Option<TeamId>> = Vec::with_capacity(tracks.len());

        for frame in &mut tracks.frames {
            let ball = frame.ball.first().and_then(|b| b.anchor_pitch);

            let mut winner = None;
            if let Some(ball) = ball {
                let mut best = self.config.max_distance;

                for (idx, rec) in frame.players.iter().enumerate() {
                    if rec.bbox.is_degenerate() {
                        continue;
                    }

                    let anchor = match rec.anchor_pitch {
                        Some(anchor) => anchor,
                        None => continue,
                    };

                    let dist = na::distance(&anchor, &ball);
                    if dist <= best {
                        best = dist;
                        winner = Some(idx);
                    }
                }
            }

            let carried = series.last().copied().flatten();
            let value = match winner {
                Some(idx) => {
                    frame.players[idx].has_ball = true;
                    frame.players[idx].team.or(carried)
                }
                None => carried,
            };

            series.push(value);
        }

        series
    }
}

/// Fraction of decided frames held by each team, for the running possession
/// display. Both entries are zero while nothing has been decided yet.
pub fn share(series: &[Option<TeamId>]) -> [f32; 2] {
    let mut counts = [0usize; 2];
    for team in series.iter().flatten() {
        if let Some(count) = counts.get_mut(team.0 as usize) {
            *count += 1;
        }
    }

    let decided = counts[0] + counts[1];
    if decided == 0 {
        return [0.0, 0.0];
    }

    [
        counts[0] as f32 / decided as f32,
        counts[1] as f32 / decided as f32,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::track::TrackRecord;
    use approx::assert_relative_eq;

    fn player(id: u32, team: u8, x: f32, y: f32) -> TrackRecord {
        let mut rec = TrackRecord::new(id, BBox::ltrb(0.0, 0.0, 10.0, 20.0));
        rec.anchor_pitch = Some(na::Point2::new(x, y));
        rec.team = Some(TeamId(team));
        rec
    }

    fn ball(x: f32, y: f32) -> TrackRecord {
        let mut rec = TrackRecord::new(1, BBox::ltrb(0.0, 0.0, 4.0, 4.0));
        rec.anchor_pitch = Some(na::Point2::new(x, y));
        rec
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut data = TrackData::with_frames(1);
        // exactly at the 2m threshold vs just beyond it
        data.frames[0].players.push(player(1, 0, 2.0, 0.0));
        data.frames[0].players.push(player(2, 1, 2.001, 0.0));
        data.frames[0].ball.push(ball(0.0, 0.0));

        let series = PossessionAssigner::new(PossessionConfig::default()).assign(&mut data);

        assert_eq!(series, vec![Some(TeamId(0))]);
        assert!(data.frames[0].players[0].has_ball);
        assert!(!data.frames[0].players[1].has_ball);
    }

    #[test]
    fn nearest_player_wins() {
        let mut data = TrackData::with_frames(1);
        data.frames[0].players.push(player(1, 0, 1.5, 0.0));
        data.frames[0].players.push(player(2, 1, 0.5, 0.0));
        data.frames[0].ball.push(ball(0.0, 0.0));

        let series = PossessionAssigner::new(PossessionConfig::default()).assign(&mut data);

        assert_eq!(series, vec![Some(TeamId(1))]);
        assert!(data.frames[0].players[1].has_ball);
    }

    #[test]
    fn unknown_frames_carry_forward() {
        let mut data = TrackData::with_frames(3);
        data.frames[0].players.push(player(1, 1, 0.5, 0.0));
        data.frames[0].ball.push(ball(0.0, 0.0));
        // frame 1: ball far from everyone
        data.frames[1].players.push(player(1, 1, 0.5, 0.0));
        data.frames[1].ball.push(ball(50.0, 0.0));
        // frame 2: no ball at all
        data.frames[2].players.push(player(1, 1, 0.5, 0.0));

        let series = PossessionAssigner::new(PossessionConfig::default()).assign(&mut data);

        assert_eq!(series, vec![Some(TeamId(1)); 3]);
    }

    #[test]
    fn no_possession_before_the_first_contact() {
        let mut data = TrackData::with_frames(2);
        data.frames[0].players.push(player(1, 0, 40.0, 0.0));
        data.frames[0].ball.push(ball(0.0, 0.0));
        data.frames[1].players.push(player(1, 0, 0.5, 0.0));
        data.frames[1].ball.push(ball(0.0, 0.0));

        let series = PossessionAssigner::new(PossessionConfig::default()).assign(&mut data);

        assert_eq!(series, vec![None, Some(TeamId(0))]);
    }

    #[test]
    fn degenerate_and_unprojected_players_are_ineligible() {
        let mut data = TrackData::with_frames(1);

        let mut flat = player(1, 0, 0.1, 0.0);
        flat.bbox = BBox::ltrb(5.0, 5.0, 5.0, 25.0);
        data.frames[0].players.push(flat);

        let mut off_pitch = player(2, 1, 0.2, 0.0);
        off_pitch.anchor_pitch = None;
        data.frames[0].players.push(off_pitch);

        data.frames[0].ball.push(ball(0.0, 0.0));

        let series = PossessionAssigner::new(PossessionConfig::default()).assign(&mut data);
        assert_eq!(series, vec![None]);
    }

    #[test]
    fn possession_share() {
        let series = vec![
            None,
            Some(TeamId(0)),
            Some(TeamId(0)),
            Some(TeamId(1)),
            Some(TeamId(0)),
        ];

        let [a, b] = share(&series);
        assert_relative_eq!(a, 0.75);
        assert_relative_eq!(b, 0.25);

        assert_eq!(share(&[None, None]), [0.0, 0.0]);
    }
}
