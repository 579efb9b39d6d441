use serde_derive::{Deserialize, Serialize};

use nalgebra as na;

use crate::bbox::BBox;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Player,
    Referee,
    Ball,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 3] = [ObjectClass::Player, ObjectClass::Referee, ObjectClass::Ball];
}

/// Jersey cluster label, 0 or 1. Sides are not distinguished.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TeamId(pub u8);

/// One tracked entity in one frame. Fixed schema: every stage fills its own
/// fields and leaves the rest untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub track_id: u32,
    pub bbox: BBox,
    pub anchor_pixel: Option<na::Point2<f32>>,
    pub anchor_compensated: Option<na::Point2<f32>>,
    /// Pitch-plane position in meters; absent when the projected point falls
    /// off the playable area.
    pub anchor_pitch: Option<na::Point2<f32>>,
    pub team: Option<TeamId>,
    pub team_color: Option<[f32; 3]>,
    pub has_ball: bool,
    /// km/h over the kinematics window covering this frame.
    pub speed: Option<f32>,
    /// Cumulative meters covered since the track first appeared.
    pub distance: Option<f32>,
}

impl TrackRecord {
    pub fn new(track_id: u32, bbox: BBox) -> Self {
        Self {
            track_id,
            bbox,
            anchor_pixel: None,
            anchor_compensated: None,
            anchor_pitch: None,
            team: None,
            team_color: None,
            has_ball: false,
            speed: None,
            distance: None,
        }
    }
}

/// All tracked entities of a single frame, partitioned by class.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FrameTracks {
    pub players: Vec<TrackRecord>,
    pub referees: Vec<TrackRecord>,
    pub ball: Vec<TrackRecord>,
}

impl FrameTracks {
    #[inline]
    pub fn class(&self, class: ObjectClass) -> &[TrackRecord] {
        match class {
            ObjectClass::Player => &self.players,
            ObjectClass::Referee => &self.referees,
            ObjectClass::Ball => &self.ball,
        }
    }

    #[inline]
    pub fn class_mut(&mut self, class: ObjectClass) -> &mut Vec<TrackRecord> {
        match class {
            ObjectClass::Player => &mut self.players,
            ObjectClass::Referee => &mut self.referees,
            ObjectClass::Ball => &mut self.ball,
        }
    }

    pub fn get(&self, class: ObjectClass, track_id: u32) -> Option<&TrackRecord> {
        self.class(class).iter().find(|r| r.track_id == track_id)
    }

    pub fn get_mut(&mut self, class: ObjectClass, track_id: u32) -> Option<&mut TrackRecord> {
        self.class_mut(class)
            .iter_mut()
            .find(|r| r.track_id == track_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &TrackRecord> {
        self.players
            .iter()
            .chain(self.referees.iter())
            .chain(self.ball.iter())
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut TrackRecord> {
        self.players
            .iter_mut()
            .chain(self.referees.iter_mut())
            .chain(self.ball.iter_mut())
    }
}

/// Per-frame track records for a whole video, indexed by frame number.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TrackData {
    pub frames: Vec<FrameTracks>,
}

impl TrackData {
    pub fn with_frames(count: usize) -> Self {
        Self {
            frames: vec![FrameTracks::default(); count],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn record(&self, frame: usize, class: ObjectClass, track_id: u32) -> Option<&TrackRecord> {
        self.frames.get(frame)?.get(class, track_id)
    }

    pub fn record_mut(
        &mut self,
        frame: usize,
        class: ObjectClass,
        track_id: u32,
    ) -> Option<&mut TrackRecord> {
        self.frames.get_mut(frame)?.get_mut(class, track_id)
    }
}
