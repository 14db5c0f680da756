use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::{ClickButton, ClickConfig, ClickTarget, ClickType, RepeatMode};

/// Upper bound for pattern delays and hold durations, in seconds. Keeps
/// every configured delay safely inside `Duration`'s range.
const MAX_DELAY_SECS: f64 = 3600.0;

/// Everything the settings panel edits, as stored in the JSON file.
/// Enum-ish fields are kept as lowercase strings so the file stays
/// hand-editable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub button: String,
    pub click_type: String,
    /// Comma separated per-click delays in seconds, e.g. "0.2, 0.5, 1".
    pub pattern: String,
    pub cps: f64,
    pub hold_secs: f64,
    pub repeat_mode: String,
    pub repeat_count: u32,
    pub jitter_ms: u64,
    pub target_mode: String,
    pub target_x: i32,
    pub target_y: i32,
    pub hotkey: String,
    pub dark: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            button: "left".into(),
            click_type: "single".into(),
            pattern: "1".into(),
            cps: 10.0,
            hold_secs: 0.5,
            repeat_mode: "until_stopped".into(),
            repeat_count: 100,
            jitter_ms: 0,
            target_mode: "cursor".into(),
            target_x: 0,
            target_y: 0,
            hotkey: "f5".into(),
            dark: false,
        }
    }
}

/// `~/.config/clickmate/settings.json` (platform equivalent), falling back
/// to the working directory when no config dir exists.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("clickmate").join("settings.json"))
        .unwrap_or_else(|| PathBuf::from("settings.json"))
}

impl Settings {
    /// A missing file is not an error: first launch runs on defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("parsing settings from {}", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("writing settings to {}", path.display()))?;
        log::info!("settings saved to {}", path.display());
        Ok(())
    }

    /// Validate and convert into an engine config. CPS is clamped to 0.1
    /// so a zero entry cannot produce an unbounded interval.
    pub fn to_click_config(&self) -> Result<ClickConfig> {
        let click_type = match self.click_type.as_str() {
            "single" => ClickType::Single,
            "double" => ClickType::Double,
            "pattern" => ClickType::Pattern,
            "hold" => ClickType::Hold,
            other => bail!("unknown click type '{other}'"),
        };

        let pattern = if click_type == ClickType::Pattern {
            parse_pattern(&self.pattern)?
        } else {
            Vec::new()
        };

        if !self.hold_secs.is_finite() || self.hold_secs < 0.0 || self.hold_secs > MAX_DELAY_SECS {
            bail!("hold duration must be between 0 and {MAX_DELAY_SECS} seconds");
        }

        let repeat = match self.repeat_mode.as_str() {
            "fixed" => RepeatMode::Fixed(self.repeat_count.max(1)),
            _ => RepeatMode::UntilStopped,
        };

        let target = match self.target_mode.as_str() {
            "fixed" => ClickTarget::Fixed {
                x: self.target_x,
                y: self.target_y,
            },
            _ => ClickTarget::Cursor,
        };

        Ok(ClickConfig {
            button: ClickButton::parse(&self.button),
            click_type,
            interval_secs: 1.0 / self.cps.max(0.1),
            pattern,
            hold_secs: self.hold_secs,
            repeat,
            target,
            jitter_ms: self.jitter_ms,
        })
    }
}

/// Parse a comma separated delay list. Blank entries are skipped so
/// trailing commas are harmless.
pub fn parse_pattern(raw: &str) -> Result<Vec<f64>> {
    let mut delays = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let value: f64 = part
            .parse()
            .with_context(|| format!("invalid pattern entry '{part}'"))?;
        if !value.is_finite() || value < 0.0 || value > MAX_DELAY_SECS {
            bail!("pattern delays must be between 0 and {MAX_DELAY_SECS} seconds, got '{part}'");
        }
        delays.push(value);
    }
    Ok(delays)
}

pub fn format_pattern(delays: &[f64]) -> String {
    delays
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_parsing_accepts_delay_lists() {
        assert_eq!(parse_pattern("1").unwrap(), vec![1.0]);
        assert_eq!(parse_pattern("0.2, 0.5, 1").unwrap(), vec![0.2, 0.5, 1.0]);
        assert_eq!(parse_pattern(" 0.1 ,0.3, ").unwrap(), vec![0.1, 0.3]);
        assert_eq!(parse_pattern("").unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn pattern_parsing_rejects_garbage() {
        assert!(parse_pattern("fast").is_err());
        assert!(parse_pattern("0.2; 0.5").is_err());
        assert!(parse_pattern("-1").is_err());
        assert!(parse_pattern("nan").is_err());
        assert!(parse_pattern("inf").is_err());
    }

    #[test]
    fn pattern_parsing_rejects_out_of_range_delays() {
        assert!(parse_pattern("1e300").is_err());
        assert!(parse_pattern("3601").is_err());
        assert_eq!(parse_pattern("3600").unwrap(), vec![3600.0]);
    }

    #[test]
    fn pattern_formatting_round_trips() {
        let delays = vec![0.2, 0.5, 1.0];
        assert_eq!(parse_pattern(&format_pattern(&delays)).unwrap(), delays);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn save_and_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.button = "middle".into();
        settings.click_type = "pattern".into();
        settings.pattern = "0.2, 0.4".into();
        settings.cps = 4.5;
        settings.hotkey = "f8".into();
        settings.dark = true;

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn conversion_clamps_cps() {
        let mut settings = Settings::default();
        settings.cps = 0.0;
        let config = settings.to_click_config().unwrap();
        assert!((config.interval_secs - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn conversion_rejects_bad_pattern_in_pattern_mode() {
        let mut settings = Settings::default();
        settings.click_type = "pattern".into();
        settings.pattern = "0.1, oops".into();
        assert!(settings.to_click_config().is_err());

        // The same pattern text is ignored outside pattern mode.
        settings.click_type = "single".into();
        assert!(settings.to_click_config().is_ok());
    }

    #[test]
    fn conversion_rejects_absurd_hold_durations() {
        let mut settings = Settings::default();
        settings.click_type = "hold".into();
        settings.hold_secs = 1e300;
        assert!(settings.to_click_config().is_err());

        settings.hold_secs = f64::NAN;
        assert!(settings.to_click_config().is_err());

        settings.hold_secs = 0.5;
        assert!(settings.to_click_config().is_ok());
    }

    #[test]
    fn conversion_maps_modes() {
        let mut settings = Settings::default();
        settings.click_type = "hold".into();
        settings.repeat_mode = "fixed".into();
        settings.repeat_count = 0;
        settings.target_mode = "fixed".into();
        settings.target_x = 640;
        settings.target_y = 360;

        let config = settings.to_click_config().unwrap();
        assert_eq!(config.click_type, ClickType::Hold);
        assert_eq!(config.repeat, RepeatMode::Fixed(1));
        assert_eq!(config.target, ClickTarget::Fixed { x: 640, y: 360 });

        settings.click_type = "triple".into();
        assert!(settings.to_click_config().is_err());
    }
}
