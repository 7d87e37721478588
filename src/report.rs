use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::audio::detect::{ChorusSpan, DetectionMethod};
use crate::audio::song::Song;

/// What gets printed once a song has been analysed.
#[derive(Debug, Serialize)]
pub struct ChorusReport {
    pub input: String,
    pub duration_secs: usize,
    pub frames: usize,
    pub stats: AmplitudeStats,
    pub chorus: Option<ChorusTiming>,
}

#[derive(Debug, Serialize)]
pub struct AmplitudeStats {
    pub avg: f64,
    pub std: f64,
    pub quiet_threshold: f64,
    pub loud_threshold: f64,
}

#[derive(Debug, Serialize)]
pub struct ChorusTiming {
    pub start_secs: usize,
    pub end_secs: usize,
    pub method: DetectionMethod,
}

impl ChorusReport {
    pub fn new(input: &Path, song: &Song, chorus: Option<&ChorusSpan<'_>>) -> Self {
        Self {
            input: input.display().to_string(),
            duration_secs: song.length_secs(),
            frames: song.len(),
            stats: AmplitudeStats {
                avg: song.avg_amplitude(),
                std: song.std_amplitude(),
                quiet_threshold: song.quiet_threshold(),
                loud_threshold: song.loud_threshold(),
            },
            chorus: chorus.map(|span| ChorusTiming {
                start_secs: span.start_secs(),
                end_secs: span.end_secs(),
                method: span.method,
            }),
        }
    }
}

impl fmt::Display for ChorusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chorus {
            Some(timing) => {
                let method = match timing.method {
                    DetectionMethod::BridgeReference => "bridge reference",
                    DetectionMethod::SustainedAmplitude => "sustained amplitude",
                };
                write!(
                    f,
                    "chorus: {} - {} ({})",
                    format_timestamp(timing.start_secs),
                    format_timestamp(timing.end_secs),
                    method
                )
            }
            None => write!(f, "no chorus found"),
        }
    }
}

pub fn format_timestamp(total_secs: usize) -> String {
    if total_secs >= 3600 {
        format!("{:02}:{:02}:{:02}", total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60)
    } else {
        format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
    }
}
