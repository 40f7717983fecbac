use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use retouch_core::SessionConfig;
use tracing::info;

/// Read a session configuration from a YAML file, or use the defaults.
///
/// Missing keys take their default values; out-of-range values are repaired.
pub fn load_session_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = parse_session_config(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;

    info!(path = %path.display(), "Loaded session config");
    Ok(config)
}

fn parse_session_config(contents: &str) -> Result<SessionConfig> {
    let config: SessionConfig = serde_yaml::from_str(contents)?;
    Ok(config.sanitize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_session_config("preview_pixel_limit: 500\nmax_zoom: 3.0\n").unwrap();
        assert_eq!(config.preview_pixel_limit, 500);
        assert_eq!(config.max_zoom, 3.0);
        assert_eq!(config.min_history, SessionConfig::default().min_history);
    }

    #[test]
    fn test_invalid_values_are_sanitized() {
        let config = parse_session_config("min_zoom: 4.0\nmax_zoom: 2.0\n").unwrap();
        assert_eq!(config.min_zoom, 0.1);
        assert_eq!(config.max_zoom, 5.0);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(parse_session_config("preview_pixel_limit: [1, 2").is_err());
        assert!(parse_session_config("min_history: lots").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_session_config(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_no_path_gives_defaults() {
        assert_eq!(load_session_config(None).unwrap(), SessionConfig::default());
    }
}
