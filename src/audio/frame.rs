use std::fmt;

use super::spectrum::{power_spectrum, SpectrumBin};

/// One second of mono audio and its loudness.
///
/// Frames live in a [`Song`](super::song::Song)'s frame vector and point at
/// their neighbours by position in that vector, so `prev`/`next` are plain
/// indices rather than references.
#[derive(Clone, Debug)]
pub struct Frame {
    samples: Vec<i16>,
    sample_rate: u32,
    /// Position in the song, which is also the offset in seconds
    pub index: usize,
    value: f64,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
    pub(crate) is_crescendo: bool,
    frequency_score: Option<f32>,
}

impl Frame {
    /// Build an unlinked frame. Loudness is computed here and never changes.
    pub fn new(samples: Vec<i16>, sample_rate: u32, index: usize) -> Self {
        let value = mean_abs(&samples);
        Self {
            samples,
            sample_rate,
            index,
            value,
            prev: None,
            next: None,
            is_crescendo: false,
            frequency_score: None,
        }
    }

    /// Mean absolute sample magnitude.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn prev(&self) -> Option<usize> {
        self.prev
    }

    pub fn next(&self) -> Option<usize> {
        self.next
    }

    /// True when the previous frame is strictly quieter. Stamped by the song
    /// once the chain is linked; the first frame is never a crescendo.
    pub fn is_crescendo(&self) -> bool {
        self.is_crescendo
    }

    /// Spectral density score. Nothing computes it yet, so it is always `None`.
    pub fn frequency_score(&self) -> Option<f32> {
        self.frequency_score
    }

    pub fn get_num_seconds(&self) -> usize {
        self.samples.len() / self.sample_rate as usize
    }

    pub(crate) fn stamp_crescendo(&mut self, prev_value: Option<f64>) {
        self.is_crescendo = matches!(prev_value, Some(prev) if prev < self.value);
    }

    /// Frames from `self` to `other`, both ends included, following `next`.
    ///
    /// `other` is expected to sit at or after `self`. If it cannot be reached
    /// the walk runs off the end of the chain and `other` is appended anyway,
    /// so the result is not contiguous in that case.
    pub fn get_frames_between<'a>(&'a self, other: &'a Frame, chain: &'a [Frame]) -> Vec<&'a Frame> {
        let mut between = vec![self];
        let mut cursor = self.next;
        while let Some(i) = cursor {
            if i == other.index {
                break;
            }
            let frame = &chain[i];
            between.push(frame);
            cursor = frame.next;
        }
        between.push(other);
        between
    }

    /// Number of crescendo steps leading up to and including this frame,
    /// or 0 if this frame is not a crescendo.
    pub fn get_crescendo_length(&self, chain: &[Frame]) -> usize {
        let mut length = 0;
        let mut current = self;
        while current.is_crescendo {
            match current.prev {
                Some(p) => {
                    length += 1;
                    current = &chain[p];
                }
                None => break,
            }
        }
        length
    }

    pub fn power_spectrum(&self) -> Vec<SpectrumBin> {
        power_spectrum(&self.samples, self.sample_rate)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trend = if self.is_crescendo { "inc" } else { "dec" };
        write!(f, "{:.1} {}", self.value, trend)
    }
}

fn mean_abs(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let total: u64 = samples.iter().map(|&s| (s as i32).unsigned_abs() as u64).sum();
    total as f64 / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(values: &[i16]) -> Vec<Frame> {
        let mut frames: Vec<Frame> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Frame::new(vec![v, -v, v, -v], 4, i))
            .collect();
        for i in 1..frames.len() {
            frames[i - 1].next = Some(i);
            frames[i].prev = Some(i - 1);
            let prev_value = frames[i - 1].value();
            frames[i].stamp_crescendo(Some(prev_value));
        }
        frames
    }

    #[test]
    fn value_is_mean_absolute_amplitude() {
        let frame = Frame::new(vec![-4, 2, -2, 0], 4, 0);
        assert_eq!(frame.value(), 2.0);
        assert_eq!(frame.get_num_seconds(), 1);
        assert_eq!(frame.frequency_score(), None);
    }

    #[test]
    fn handles_most_negative_sample() {
        let frame = Frame::new(vec![i16::MIN, i16::MIN], 2, 0);
        assert_eq!(frame.value(), 32768.0);
    }

    #[test]
    fn crescendo_length_counts_rising_steps() {
        let frames = chain(&[1, 2, 3, 4, 5]);
        assert_eq!(frames[0].get_crescendo_length(&frames), 0);
        assert_eq!(frames[1].get_crescendo_length(&frames), 1);
        assert_eq!(frames[4].get_crescendo_length(&frames), 4);
    }

    #[test]
    fn crescendo_length_resets_after_a_drop() {
        let frames = chain(&[5, 1, 2, 3, 2]);
        assert_eq!(frames[3].get_crescendo_length(&frames), 2);
        assert_eq!(frames[4].get_crescendo_length(&frames), 0);
    }

    #[test]
    fn frames_between_is_inclusive() {
        let frames = chain(&[1, 1, 1, 1, 1, 1]);
        let between: Vec<usize> = frames[1]
            .get_frames_between(&frames[4], &frames)
            .iter()
            .map(|f| f.index)
            .collect();
        assert_eq!(between, vec![1, 2, 3, 4]);
    }

    #[test]
    fn unreachable_target_walks_to_end_then_appends() {
        let frames = chain(&[1, 1, 1, 1, 1]);
        let between: Vec<usize> = frames[3]
            .get_frames_between(&frames[1], &frames)
            .iter()
            .map(|f| f.index)
            .collect();
        assert_eq!(between, vec![3, 4, 1]);
    }

    #[test]
    fn display_shows_trend() {
        let frames = chain(&[1, 3]);
        assert_eq!(frames[0].to_string(), "1.0 dec");
        assert_eq!(frames[1].to_string(), "3.0 inc");
    }
}
