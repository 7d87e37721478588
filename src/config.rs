use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Tunables for the amplitude heuristics. Defaults reproduce the stock detector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectionConfig {
    /// Standard deviations below the mean that count as quiet
    #[serde(default = "default_half_sd")]
    pub quiet_sd: f64,
    /// Standard deviations above the mean that count as loud
    #[serde(default = "default_half_sd")]
    pub loud_sd: f64,
    /// Consecutive non-loud frames tolerated inside a sustained run
    #[serde(default = "default_incongruity_cushion")]
    pub incongruity_cushion: usize,
    /// Loud frames a run needs before it counts as sustained
    #[serde(default = "default_min_sustained_frames")]
    pub min_sustained_frames: usize,
    /// Share of the song the bridge may occupy
    #[serde(default = "default_max_bridge_fraction")]
    pub max_bridge_fraction: f64,
    /// Crescendo length that marks a build-up into the chorus
    #[serde(default = "default_building_bridge_threshold")]
    pub building_bridge_threshold: usize,
    #[serde(default = "default_num_choruses")]
    pub num_choruses: usize,
    /// Share of the song all choruses together occupy, lower bound
    #[serde(default = "default_min_chorus_fraction")]
    pub min_chorus_fraction: f64,
    /// Share of the song all choruses together occupy, upper bound
    #[serde(default = "default_max_chorus_fraction")]
    pub max_chorus_fraction: f64,
    /// A chorus found from the bridge lasts until loudness drops this many
    /// standard deviations below the mean
    #[serde(default = "default_chorus_floor_sd")]
    pub chorus_floor_sd: f64,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: bool,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            quiet_sd: default_half_sd(),
            loud_sd: default_half_sd(),
            incongruity_cushion: default_incongruity_cushion(),
            min_sustained_frames: default_min_sustained_frames(),
            max_bridge_fraction: default_max_bridge_fraction(),
            building_bridge_threshold: default_building_bridge_threshold(),
            num_choruses: default_num_choruses(),
            min_chorus_fraction: default_min_chorus_fraction(),
            max_chorus_fraction: default_max_chorus_fraction(),
            chorus_floor_sd: default_chorus_floor_sd(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: false,
            ffmpeg: default_ffmpeg(),
        }
    }
}

fn default_half_sd() -> f64 { 0.5 }
fn default_incongruity_cushion() -> usize { 2 }
fn default_min_sustained_frames() -> usize { 10 }
fn default_max_bridge_fraction() -> f64 { 0.2 }
fn default_building_bridge_threshold() -> usize { 3 }
fn default_num_choruses() -> usize { 3 }
fn default_min_chorus_fraction() -> f64 { 0.10 }
fn default_max_chorus_fraction() -> f64 { 0.40 }
fn default_chorus_floor_sd() -> f64 { 1.0 }
fn default_ffmpeg() -> String { "ffmpeg".into() }

/// Reads and parses a config file, logging why when that fails.
pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            log::warn!("Cannot read config {}: {}", path.display(), err);
            return None;
        }
    };
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::warn!("Ignoring malformed config {}: {}", path.display(), err);
            None
        }
    }
}

/// Explicit path first, then `refrain.toml` in the working directory, then
/// the per-user config locations.
pub fn discover_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let local = PathBuf::from("refrain.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("refrain").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("refrain").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.detection, DetectionConfig::default());
        assert!(!cfg.output.json);
        assert_eq!(cfg.output.ffmpeg, "ffmpeg");
    }

    #[test]
    fn partial_detection_section_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [detection]
            loud_sd = 1.0
            incongruity_cushion = 4
            "#,
        )
        .unwrap();
        assert_eq!(cfg.detection.loud_sd, 1.0);
        assert_eq!(cfg.detection.incongruity_cushion, 4);
        assert_eq!(cfg.detection.quiet_sd, 0.5);
        assert_eq!(cfg.detection.min_sustained_frames, 10);
        assert_eq!(cfg.detection.num_choruses, 3);
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = PathBuf::from("/nonexistent/custom.toml");
        assert_eq!(discover_config(Some(path.clone())), Some(path));
    }

    #[test]
    fn malformed_file_loads_nothing() {
        let path = std::env::temp_dir().join(format!("refrain-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[detection\nloud_sd = ").unwrap();
        let loaded = load_config(&path);
        std::fs::remove_file(&path).ok();
        assert!(loaded.is_none());
    }

    #[test]
    fn missing_file_loads_nothing() {
        assert!(load_config(&PathBuf::from("/nonexistent/refrain.toml")).is_none());
    }
}
