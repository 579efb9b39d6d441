use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("OpenCV Error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("degenerate homography, pitch calibration is unusable")]
    DegenerateHomography,

    #[error("pitch calibration needs at least 4 point pairs, got {0}")]
    NotEnoughCorrespondences(usize),

    #[error("team model needs at least 2 clusterable players in the first frame, got {0}")]
    NotEnoughPlayers(usize),

    #[error("bounding box has no pixels inside the frame")]
    EmptyCrop,

    #[error("track data covers {tracks} frames, video has {video}")]
    FrameCountMismatch { tracks: usize, video: usize },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde Error: {0}")]
    Json(#[from] serde_json::Error),
}
