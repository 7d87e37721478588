use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

/// Cuts `[start_secs, end_secs]` (whole seconds, end inclusive) out of
/// `input` into `output` with an external ffmpeg.
pub struct ExcerptWriter<'a> {
    ffmpeg: &'a str,
}

impl<'a> ExcerptWriter<'a> {
    pub fn new(ffmpeg: &'a str) -> Self {
        Self { ffmpeg }
    }

    pub fn args(input: &Path, output: &Path, start_secs: usize, end_secs: usize) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loglevel".into(), "error".into(),
            "-i".into(), input.to_string_lossy().into_owned(),
            "-ss".into(), start_secs.to_string(),
            "-to".into(), (end_secs + 1).to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }

    pub fn write(&self, input: &Path, output: &Path, start_secs: usize, end_secs: usize) -> Result<()> {
        if end_secs < start_secs {
            anyhow::bail!("Excerpt ends ({}s) before it starts ({}s)", end_secs, start_secs);
        }

        let args = Self::args(input, output, start_secs, end_secs);
        log::info!(
            "Writing chorus {}s-{}s to {}",
            start_secs,
            end_secs + 1,
            output.display()
        );

        let result = Command::new(self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("Failed to spawn {}. Is ffmpeg installed?", self.ffmpeg))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("Chorus excerpt written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_cover_inclusive_end_second() {
        let args = ExcerptWriter::args(Path::new("in.mp3"), Path::new("out.wav"), 65, 80);
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-i") + 1], "in.mp3");
        assert_eq!(args[pos("-ss") + 1], "65");
        assert_eq!(args[pos("-to") + 1], "81");
        assert!(!args.iter().any(|a| a == "-ac"), "excerpt keeps source channels");
        assert_eq!(args.last().unwrap(), "out.wav");
    }

    #[test]
    fn reversed_span_is_rejected() {
        let writer = ExcerptWriter::new("ffmpeg");
        let err = writer
            .write(Path::new("in.mp3"), Path::new("out.wav"), 10, 5)
            .unwrap_err();
        assert!(err.to_string().contains("before it starts"));
    }

    #[test]
    fn missing_binary_is_reported() {
        let writer = ExcerptWriter::new("/nonexistent/ffmpeg");
        let err = writer
            .write(Path::new("in.mp3"), Path::new("out.wav"), 1, 5)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to spawn"));
    }
}
