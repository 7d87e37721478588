use rayon::prelude::*;
use std::fmt;

use super::frame::Frame;
use crate::config::DetectionConfig;
use crate::error::SongError;

/// A whole song cut into one-second frames.
///
/// The frame chain is built once and never changes afterwards. Statistics
/// are recomputed from the frames on every call.
#[derive(Clone, Debug)]
pub struct Song {
    frames: Vec<Frame>,
    pub(crate) config: DetectionConfig,
}

impl Song {
    pub fn new(samples: &[i16], sample_rate: u32) -> Result<Self, SongError> {
        Self::with_config(samples, sample_rate, DetectionConfig::default())
    }

    /// Partition `samples` into whole seconds (a trailing partial second is
    /// dropped), link neighbours, then stamp crescendo flags.
    pub fn with_config(
        samples: &[i16],
        sample_rate: u32,
        config: DetectionConfig,
    ) -> Result<Self, SongError> {
        if sample_rate == 0 {
            return Err(SongError::InvalidSampleRate);
        }
        let rate = sample_rate as usize;
        if samples.len() < rate {
            return Err(SongError::TooShort {
                samples: samples.len(),
                sample_rate,
            });
        }

        let mut frames: Vec<Frame> = samples
            .par_chunks_exact(rate)
            .enumerate()
            .map(|(i, chunk)| Frame::new(chunk.to_vec(), sample_rate, i))
            .collect();

        // Flags read `prev`, so each frame is linked before it is stamped.
        for i in 1..frames.len() {
            frames[i - 1].next = Some(i);
            frames[i].prev = Some(i - 1);
            let prev_value = frames[i - 1].value();
            frames[i].stamp_crescendo(Some(prev_value));
        }

        log::debug!(
            "Built {} frames from {} samples at {}Hz",
            frames.len(),
            samples.len(),
            sample_rate
        );

        Ok(Self { frames, config })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn prev_of(&self, frame: &Frame) -> Option<&Frame> {
        frame.prev().map(|i| &self.frames[i])
    }

    pub fn next_of(&self, frame: &Frame) -> Option<&Frame> {
        frame.next().map(|i| &self.frames[i])
    }

    /// Song length in seconds.
    pub fn length_secs(&self) -> usize {
        self.frames.iter().map(Frame::get_num_seconds).sum()
    }

    pub fn amplitudes(&self) -> Vec<f64> {
        self.frames.iter().map(Frame::value).collect()
    }

    pub fn avg_amplitude(&self) -> f64 {
        if let Some(value) = self.uniform_value() {
            return value;
        }
        self.frames.iter().map(Frame::value).sum::<f64>() / self.frames.len() as f64
    }

    /// Population standard deviation of frame loudness. Exactly zero when
    /// every frame is equally loud.
    pub fn std_amplitude(&self) -> f64 {
        if self.uniform_value().is_some() {
            return 0.0;
        }
        let avg = self.avg_amplitude();
        let variance = self
            .frames
            .iter()
            .map(|f| (f.value() - avg).powi(2))
            .sum::<f64>()
            / self.frames.len() as f64;
        variance.sqrt()
    }

    /// Frames below this are quiet.
    pub fn quiet_threshold(&self) -> f64 {
        self.avg_amplitude() - self.std_amplitude() * self.config.quiet_sd
    }

    /// Frames at or above this are loud.
    pub fn loud_threshold(&self) -> f64 {
        self.avg_amplitude() + self.std_amplitude() * self.config.loud_sd
    }

    /// Lower bound on a single chorus, in frames.
    pub fn min_chorus_length(&self) -> usize {
        let length = self.chorus_length(self.config.min_chorus_fraction);
        log::debug!("Using min chorus length {}", length);
        length
    }

    /// Upper bound on a single chorus, in frames.
    pub fn max_chorus_length(&self) -> usize {
        let length = self.chorus_length(self.config.max_chorus_fraction);
        log::debug!("Using max chorus length {}", length);
        length
    }

    /// The shared loudness when all frames match. Summing a value that has
    /// no exact float form drifts by an ulp, so this case skips the sums.
    fn uniform_value(&self) -> Option<f64> {
        let first = self.frames.first()?.value();
        self.frames
            .iter()
            .all(|f| f.value() == first)
            .then_some(first)
    }

    fn chorus_length(&self, fraction_of_song: f64) -> usize {
        let per_chorus = fraction_of_song / self.config.num_choruses.max(1) as f64;
        (self.frames.len() as f64 * per_chorus) as usize
    }
}

impl<'a> IntoIterator for &'a Song {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self {
            write!(f, "{:.1} -> ", frame.value())?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const RATE: u32 = 8;

    /// One frame per entry, every sample of the frame at +/- that loudness.
    pub(crate) fn samples_from(values: &[i16]) -> Vec<i16> {
        values
            .iter()
            .flat_map(|&v| (0..RATE).map(move |i| if i % 2 == 0 { v } else { -v }))
            .collect()
    }

    pub(crate) fn song_from(values: &[i16]) -> Song {
        Song::new(&samples_from(values), RATE).unwrap()
    }

    #[test]
    fn frame_count_drops_partial_second() {
        let mut samples = samples_from(&[3, 4, 5]);
        samples.extend_from_slice(&[100; 5]);
        let song = Song::new(&samples, RATE).unwrap();
        assert_eq!(song.len(), 3);
        assert_eq!(song.length_secs(), 3);
        assert!(song.iter().all(|f| f.value() >= 0.0));
        assert_eq!(song.amplitudes(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn rejects_short_or_rateless_input() {
        assert_eq!(
            Song::new(&[1, 2, 3], RATE).unwrap_err(),
            SongError::TooShort { samples: 3, sample_rate: RATE }
        );
        assert_eq!(Song::new(&[1, 2, 3], 0).unwrap_err(), SongError::InvalidSampleRate);
    }

    #[test]
    fn chain_is_linked_in_order() {
        let song = song_from(&[1, 2, 3, 4]);
        let first = song.frame(0).unwrap();
        let last = song.frame(3).unwrap();
        assert!(song.prev_of(first).is_none());
        assert!(song.next_of(last).is_none());
        for (i, frame) in song.iter().enumerate() {
            assert_eq!(frame.index, i);
            if let Some(next) = song.next_of(frame) {
                assert_eq!(next.index, i + 1);
                assert_eq!(next.prev(), Some(i));
            }
        }
    }

    #[test]
    fn crescendo_flags_follow_previous_loudness() {
        let song = song_from(&[5, 5, 6, 2, 9, 9]);
        let flags: Vec<bool> = song.iter().map(Frame::is_crescendo).collect();
        assert_eq!(flags, vec![false, false, true, false, true, false]);
        for frame in song.iter().skip(1) {
            let prev = song.prev_of(frame).unwrap();
            assert_eq!(frame.is_crescendo(), prev.value() < frame.value());
        }
    }

    #[test]
    fn crescendo_length_over_rising_song() {
        let song = song_from(&[1, 2, 3, 4, 5]);
        assert_eq!(song.frame(4).unwrap().get_crescendo_length(song.frames()), 4);
    }

    #[test]
    fn thresholds_straddle_average() {
        let song = song_from(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(song.avg_amplitude(), 5.0);
        assert_eq!(song.std_amplitude(), 2.0);
        assert_eq!(song.quiet_threshold(), 4.0);
        assert_eq!(song.loud_threshold(), 6.0);
        assert!(song.quiet_threshold() < song.avg_amplitude());
        assert!(song.avg_amplitude() < song.loud_threshold());
    }

    #[test]
    fn thresholds_collapse_without_variance() {
        let song = song_from(&[3; 12]);
        assert_eq!(song.std_amplitude(), 0.0);
        assert_eq!(song.quiet_threshold(), song.avg_amplitude());
        assert_eq!(song.loud_threshold(), song.avg_amplitude());
    }

    #[test]
    fn inexact_uniform_loudness_has_zero_spread() {
        // Every frame is [1, 0, 0], loudness 1/3, which floats cannot hold exactly.
        let samples: Vec<i16> = (0..20).flat_map(|_| [1, 0, 0]).collect();
        let song = Song::new(&samples, 3).unwrap();
        let value = song.frame(0).unwrap().value();
        assert_eq!(song.std_amplitude(), 0.0);
        assert_eq!(song.avg_amplitude(), value);
        assert_eq!(song.loud_threshold(), value);
        assert_eq!(song.quiet_threshold(), value);
    }

    #[test]
    fn chorus_bounds_scale_with_song_length() {
        let song = song_from(&[1; 300]);
        assert_eq!(song.min_chorus_length(), 10);
        assert_eq!(song.max_chorus_length(), 40);
    }

    #[test]
    fn display_renders_amplitude_chain() {
        assert_eq!(song_from(&[1, 2]).to_string(), "1.0 -> 2.0 -> ");
    }
}
