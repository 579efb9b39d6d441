use std::fs;
use std::path::Path;

use opencv::{core::Mat, prelude::*};
use serde_derive::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::camera::CameraMovement;
use crate::error::Error;
use crate::track::TrackData;

/// Content key of a video: hash of the first frame's pixels, its dimensions
/// and the frame count. Enough to notice that a stub belongs to a different
/// video without hashing every frame.
pub fn video_key(frames: &[Mat]) -> Result<String, Error> {
    let mut hasher = Sha256::new();

    if let Some(first) = frames.first() {
        hasher.update(first.data_bytes()?);
        hasher.update(first.rows().to_le_bytes());
        hasher.update(first.cols().to_le_bytes());
    }
    hasher.update((frames.len() as u64).to_le_bytes());

    Ok(format!("{:x}", hasher.finalize()))
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CameraMovementStub {
    pub video_key: String,
    pub movements: Vec<CameraMovement>,
}

/// `None` on any kind of miss: absent, unreadable, corrupt, or written for
/// another video. A miss always means "recompute", never an error.
pub fn load_camera_stub(path: &Path, video_key: &str) -> Option<Vec<CameraMovement>> {
    let stub: CameraMovementStub = load_json(path)?;

    if stub.video_key != video_key {
        log::warn!(
            "camera stub {} belongs to another video, recomputing",
            path.display()
        );
        return None;
    }

    Some(stub.movements)
}

pub fn save_camera_stub(
    path: &Path,
    video_key: &str,
    movements: &[CameraMovement],
) -> Result<(), Error> {
    let stub = CameraMovementStub {
        video_key: video_key.to_string(),
        movements: movements.to_vec(),
    };

    save_json(path, &stub)
}

pub fn load_track_stub(path: &Path) -> Option<TrackData> {
    load_json(path)
}

pub fn save_track_stub(path: &Path, tracks: &TrackData) -> Result<(), Error> {
    save_json(path, tracks)
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::warn!("stub {}: {}", path.display(), err);
            }
            return None;
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("stub {} is corrupt: {}", path.display(), err);
            None
        }
    }
}

fn save_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    Ok(fs::write(path, serde_json::to_string(value)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pitchtrack-cache-{}-{}", std::process::id(), name))
    }

    #[test]
    fn camera_stub_roundtrip() {
        let path = tmp_path("roundtrip.json");
        let movements = vec![[0.0, 0.0], [3.5, -1.25]];

        save_camera_stub(&path, "key-a", &movements).unwrap();
        assert_eq!(load_camera_stub(&path, "key-a"), Some(movements));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn stub_for_another_video_misses() {
        let path = tmp_path("other-video.json");
        save_camera_stub(&path, "key-a", &[[1.0, 2.0]]).unwrap();

        assert_eq!(load_camera_stub(&path, "key-b"), None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_stub_misses_quietly() {
        let path = tmp_path("corrupt.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(load_camera_stub(&path, "key-a").is_none());
        assert!(load_track_stub(&path).is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn absent_stub_misses_quietly() {
        assert!(load_camera_stub(&tmp_path("missing.json"), "key").is_none());
    }

    #[test]
    fn track_stub_roundtrip() {
        use crate::bbox::BBox;
        use crate::track::TrackRecord;

        let path = tmp_path("tracks.json");
        let mut data = TrackData::with_frames(2);
        data.frames[0]
            .players
            .push(TrackRecord::new(7, BBox::ltrb(1.0, 2.0, 3.0, 4.0)));

        save_track_stub(&path, &data).unwrap();
        assert_eq!(load_track_stub(&path), Some(data));

        let _ = fs::remove_file(&path);
    }
}
