use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaylistError {
    #[error("no active track")]
    NoActiveTrack,

    #[error("track index {index} is out of range for a playlist of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
