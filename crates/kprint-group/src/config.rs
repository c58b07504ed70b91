use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use kprint_abi::{console, Console, Mask};

/// Default group size: one 32-lane warp, the widest group a mask can address.
pub const DEFAULT_GROUP_SIZE: u32 = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown console `{0}` (expected stdout or stderr)")]
    UnknownConsole(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleKind {
    #[default]
    Stdout,
    Stderr,
}

impl ConsoleKind {
    pub fn console(self) -> Arc<dyn Console> {
        match self {
            ConsoleKind::Stdout => console::stdout(),
            ConsoleKind::Stderr => console::stderr(),
        }
    }
}

impl FromStr for ConsoleKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(ConsoleKind::Stdout),
            "stderr" => Ok(ConsoleKind::Stderr),
            other => Err(ConfigError::UnknownConsole(other.to_string())),
        }
    }
}

/// How a host launches a group. Read once at startup, never during a print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(default = "default_group_size")]
    pub group_size: u32,
    #[serde(default)]
    pub console: ConsoleKind,
    /// Thread-per-unit substrate instead of the emulated one.
    #[serde(default)]
    pub threaded: bool,
    /// Units a host traces with masked prints when it has no mask of its own.
    #[serde(default = "default_trace_mask")]
    pub trace_mask: Mask,
}

fn default_group_size() -> u32 {
    DEFAULT_GROUP_SIZE
}

fn default_trace_mask() -> Mask {
    Mask::ALL
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            console: ConsoleKind::default(),
            threaded: false,
            trace_mask: Mask::ALL,
        }
    }
}

impl GroupConfig {
    /// Defaults overridden by `KPRINT_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Apply `KPRINT_GROUP_SIZE`, `KPRINT_CONSOLE`, `KPRINT_THREADED` and `KPRINT_MASK`
    /// on top of `self`. Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Some(n) = env_group_size() {
            self.group_size = n;
        }
        if let Some(kind) = std::env::var("KPRINT_CONSOLE")
            .ok()
            .and_then(|v| v.parse::<ConsoleKind>().ok())
        {
            self.console = kind;
        }
        if let Ok(v) = std::env::var("KPRINT_THREADED") {
            self.threaded = parse_flag(&v);
        }
        if let Some(mask) = std::env::var("KPRINT_MASK")
            .ok()
            .and_then(|v| v.parse::<Mask>().ok())
        {
            self.trace_mask = mask;
        }
        self
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let mut cfg: GroupConfig = serde_json::from_str(text)?;
        cfg.group_size = cfg.group_size.max(1);
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

pub fn env_group_size() -> Option<u32> {
    std::env::var("KPRINT_GROUP_SIZE")
        .ok()
        .and_then(|s| parse_group_size(&s))
}

fn parse_group_size(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok().filter(|&n| n >= 1)
}

fn parse_flag(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let cfg = GroupConfig::from_json(r#"{ "console": "stderr" }"#).unwrap();
        assert_eq!(
            cfg,
            GroupConfig {
                group_size: DEFAULT_GROUP_SIZE,
                console: ConsoleKind::Stderr,
                threaded: false,
                trace_mask: Mask::ALL,
            }
        );
    }

    #[test]
    fn trace_mask_round_trips_as_an_integer() {
        let cfg = GroupConfig::from_json(r#"{ "trace_mask": 5 }"#).unwrap();
        assert_eq!(cfg.trace_mask, Mask(0b0101));

        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["trace_mask"], serde_json::json!(5));
        assert_eq!(GroupConfig::from_json(&json.to_string()).unwrap(), cfg);
    }

    #[test]
    fn json_group_size_is_at_least_one() {
        let cfg = GroupConfig::from_json(r#"{ "group_size": 0, "threaded": true }"#).unwrap();
        assert_eq!(cfg.group_size, 1);
        assert!(cfg.threaded);
    }

    #[test]
    fn bad_json_is_a_serde_error() {
        let err = GroupConfig::from_json(r#"{ "console": "printer" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Serde(_)));
    }

    #[test]
    fn env_style_values() {
        assert_eq!(parse_group_size(" 64 "), Some(64));
        assert_eq!(parse_group_size("0"), None);
        assert_eq!(parse_group_size("many"), None);
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("yes"));
        assert_eq!("StdErr".parse::<ConsoleKind>().unwrap(), ConsoleKind::Stderr);
        assert!("printer".parse::<ConsoleKind>().is_err());
    }
}
