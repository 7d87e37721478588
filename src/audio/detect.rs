use serde::Serialize;
use std::collections::HashSet;

use super::frame::Frame;
use super::song::Song;

/// Which strategy located the chorus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Chorus starts where the bridge ends
    BridgeReference,
    /// First block of sustained loudness
    SustainedAmplitude,
}

/// Inclusive chorus boundary, in frames.
#[derive(Clone, Copy, Debug)]
pub struct ChorusSpan<'a> {
    pub start: &'a Frame,
    pub end: &'a Frame,
    pub method: DetectionMethod,
}

impl ChorusSpan<'_> {
    pub fn start_secs(&self) -> usize {
        self.start.index
    }

    pub fn end_secs(&self) -> usize {
        self.end.index
    }
}

/// Positions in `frames` whose successor in the list is not their successor
/// in the song, i.e. the last frame of every contiguous block but the final one.
pub fn temporal_boundaries(frames: &[&Frame]) -> Vec<usize> {
    frames
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].next() != Some(pair[1].index))
        .map(|(i, _)| i)
        .collect()
}

impl Song {
    /// Crescendo frames that jump into the loud band from at or below the
    /// average in a single step.
    pub fn find_sudden_amplitude_increases(&self) -> Vec<&Frame> {
        let loud_threshold = self.loud_threshold();
        let avg = self.avg_amplitude();

        let result: Vec<&Frame> = self
            .iter()
            .filter(|f| f.is_crescendo())
            .filter(|f| {
                f.value() >= loud_threshold
                    && self.prev_of(f).is_some_and(|prev| prev.value() <= avg)
            })
            .inspect(|f| log::trace!("Sudden increase at frame {} ({})", f.index, f))
            .collect();

        log::debug!("Found {} points where amplitude increases suddenly", result.len());
        result
    }

    /// Every loud stretch that holds at least `min_sustained_frames` loud
    /// frames, allowing up to `incongruity_cushion` quiet frames in a row.
    ///
    /// Each loud frame starts its own run, so neighbouring runs overlap.
    pub fn sustained_runs(&self) -> Vec<Vec<&Frame>> {
        let loud_threshold = self.loud_threshold();
        let cushion = self.config.incongruity_cushion;
        let min_length = self.config.min_sustained_frames;
        let chain = self.frames();

        let mut runs = Vec::new();
        for frame in chain {
            if frame.value() < loud_threshold {
                continue;
            }

            let mut loud_frames = 1;
            let mut incongruities = 0;
            let mut cursor = self.next_of(frame);
            while let Some(seq) = cursor {
                if incongruities > cushion {
                    break;
                }
                if seq.value() >= loud_threshold {
                    loud_frames += 1;
                } else {
                    incongruities += 1;
                }
                cursor = self.next_of(seq);
            }

            if loud_frames >= min_length {
                let run = match cursor {
                    Some(stop) => frame.get_frames_between(stop, chain),
                    None => chain[frame.index..].iter().collect(),
                };
                runs.push(run);
            }
        }
        runs
    }

    /// All frames of [`sustained_runs`](Self::sustained_runs), concatenated.
    pub fn find_sustained_amplitude_increases(&self) -> Vec<&Frame> {
        let result: Vec<&Frame> = self.sustained_runs().into_iter().flatten().collect();
        log::debug!(
            "Found {} points where amplitude was increased for sustained period",
            result.len()
        );
        result
    }

    /// Latest frame in the tail of the song where a quiet bridge gives way
    /// to the chorus.
    ///
    /// Only frames at or after `max_bridge_fraction * len + max_chorus_length`
    /// are considered. A frame qualifies if it is a sudden increase out of
    /// the quiet band, or ends a crescendo of at least
    /// `building_bridge_threshold` frames whose previous frame is not yet loud.
    pub fn find_bridge_end(&self) -> Option<&Frame> {
        let sudden: HashSet<usize> = self
            .find_sudden_amplitude_increases()
            .iter()
            .map(|f| f.index)
            .collect();
        let quiet_threshold = self.quiet_threshold();
        let loud_threshold = self.loud_threshold();
        let chain = self.frames();

        let earliest =
            self.config.max_bridge_fraction * self.len() as f64 + self.max_chorus_length() as f64;

        for frame in chain.iter().rev() {
            if (frame.index as f64) < earliest {
                break;
            }
            let Some(prev) = self.prev_of(frame) else {
                break;
            };

            if sudden.contains(&frame.index) && prev.value() <= quiet_threshold {
                log::info!("Bridge ends at {}s (sudden amplitude shift)", frame.index);
                return Some(frame);
            }
            // A loud previous frame means we are inside the chorus already.
            if frame.get_crescendo_length(chain) >= self.config.building_bridge_threshold
                && prev.value() < loud_threshold
            {
                log::info!("Bridge ends at {}s (building bridge)", frame.index);
                return Some(frame);
            }
        }
        None
    }

    /// Best guess at the chorus: start from the bridge when one is found,
    /// otherwise the first block of sustained loudness.
    pub fn find_chorus(&self) -> Option<ChorusSpan<'_>> {
        let avg = self.avg_amplitude();
        let std = self.std_amplitude();
        log::info!(
            "Finding chorus: avg={:.1} std={:.1} quiet={:.1} loud={:.1}",
            avg,
            std,
            self.quiet_threshold(),
            self.loud_threshold()
        );

        if std == 0.0 {
            log::info!("Loudness never changes, chorus unable to be found");
            return None;
        }

        let span = match self.find_bridge_end() {
            Some(start) => {
                let floor = avg - std * self.config.chorus_floor_sd;
                let mut end = start;
                let mut cursor = Some(start);
                while let Some(frame) = cursor {
                    end = frame;
                    if frame.value() <= floor {
                        break;
                    }
                    cursor = self.next_of(frame);
                }
                ChorusSpan {
                    start,
                    end,
                    method: DetectionMethod::BridgeReference,
                }
            }
            None => {
                let increased = self.find_sustained_amplitude_increases();
                let (Some(&start), Some(&last)) = (increased.first(), increased.last()) else {
                    log::info!("Chorus unable to be found");
                    return None;
                };
                let boundaries = temporal_boundaries(&increased);
                log::debug!("Temporal boundaries: {:?}", boundaries);
                let end = boundaries.first().map_or(last, |&b| increased[b]);
                ChorusSpan {
                    start,
                    end,
                    method: DetectionMethod::SustainedAmplitude,
                }
            }
        };

        log::info!(
            "Chorus spans frames {}..={} ({:?})",
            span.start.index,
            span.end.index,
            span.method
        );
        Some(span)
    }
}
