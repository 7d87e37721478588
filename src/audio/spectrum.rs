use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;

/// One bin of a one-sided power spectrum.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SpectrumBin {
    pub frequency_khz: f32,
    pub power_db: f32,
}

/// One-sided power spectrum of `samples`.
///
/// Magnitudes are normalised by the window length and squared. Every bin
/// except DC (and Nyquist, for even lengths) is doubled to fold in the
/// negative frequencies.
pub fn power_spectrum(samples: &[i16], sample_rate: u32) -> Vec<SpectrumBin> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let mut buffer: Vec<Complex<f32>> = samples
        .iter()
        .map(|&s| Complex::new(s as f32, 0.0))
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let unique = (n + 2) / 2; // ceil((n + 1) / 2)
    let last_doubled = if n % 2 == 0 { unique - 1 } else { unique };
    let bin_width_khz = sample_rate as f32 / n as f32 / 1000.0;

    buffer[..unique]
        .iter()
        .enumerate()
        .map(|(k, c)| {
            let mut power = (c.norm() / n as f32).powi(2);
            if k > 0 && k < last_doubled {
                power *= 2.0;
            }
            SpectrumBin {
                frequency_khz: k as f32 * bin_width_khz,
                power_db: 10.0 * power.max(f32::MIN_POSITIVE).log10(),
            }
        })
        .collect()
}

/// The `count` loudest bins, loudest first.
pub fn strongest_bins(spectrum: &[SpectrumBin], count: usize) -> Vec<SpectrumBin> {
    let mut sorted = spectrum.to_vec();
    sorted.sort_by(|a, b| b.power_db.total_cmp(&a.power_db));
    sorted.truncate(count);
    sorted
}
