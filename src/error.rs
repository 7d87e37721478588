use thiserror::Error;

/// Errors raised while building a [`Song`](crate::audio::song::Song) from raw samples.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SongError {
    #[error("sample rate must be positive")]
    InvalidSampleRate,

    /// Less than one whole second of audio; no frame can be built.
    #[error("need at least one second of audio, got {samples} samples at {sample_rate}Hz")]
    TooShort { samples: usize, sample_rate: u32 },
}
