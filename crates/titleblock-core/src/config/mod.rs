pub mod builtin;
pub mod schema;

use crate::error::TitleBlockError;
use schema::Config;
use std::collections::HashMap;
use std::path::Path;

/// Load a config from a JSON file.
pub fn load_config(path: &Path) -> Result<Config, TitleBlockError> {
    let content = std::fs::read_to_string(path).map_err(|e| TitleBlockError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse a config from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<Config, TitleBlockError> {
    let config: Config = serde_json::from_str(json).map_err(|e| TitleBlockError::ConfigLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a config from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<Config, TitleBlockError> {
    let config: Config = serde_json::from_str(json).map_err(TitleBlockError::Json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a config is well-formed.
pub fn validate_config(config: &Config) -> Result<(), TitleBlockError> {
    let region = &config.region;
    for (label, inset) in [
        ("width_inset", region.width_inset),
        ("height_inset", region.height_inset),
    ] {
        if !inset.is_finite() || inset < 0.0 {
            return Err(TitleBlockError::ConfigInvalid(format!(
                "region {} must be a finite, non-negative number (got {})",
                label, inset
            )));
        }
    }

    if !(config.tiff.default_dpi > 0.0) || !config.tiff.default_dpi.is_finite() {
        return Err(TitleBlockError::ConfigInvalid(format!(
            "tiff default_dpi must be positive (got {})",
            config.tiff.default_dpi
        )));
    }

    // Extension -> name of the converter that claimed it.
    let mut claimed: HashMap<String, String> = HashMap::new();
    if config.tiff.enabled {
        for ext in &config.tiff.extensions {
            claimed.insert(normalize_ext(ext), "tiff".into());
        }
    }

    for conv in &config.converters {
        if conv.name.trim().is_empty() {
            return Err(TitleBlockError::ConfigInvalid(
                "converter name must not be empty".into(),
            ));
        }

        if conv.program.trim().is_empty() {
            return Err(TitleBlockError::ConfigInvalid(format!(
                "converter '{}' has no program",
                conv.name
            )));
        }

        if conv.extensions.is_empty() {
            return Err(TitleBlockError::ConfigInvalid(format!(
                "converter '{}' has no extensions",
                conv.name
            )));
        }

        for ext in &conv.extensions {
            let norm = normalize_ext(ext);
            if norm.is_empty() {
                return Err(TitleBlockError::ConfigInvalid(format!(
                    "converter '{}' lists an empty extension",
                    conv.name
                )));
            }
            if let Some(other) = claimed.insert(norm.clone(), conv.name.clone()) {
                return Err(TitleBlockError::ConfigInvalid(format!(
                    "extension '{}' is claimed by both '{}' and '{}'",
                    norm, other, conv.name
                )));
            }
        }

        for hook in [&conv.startup, &conv.shutdown].into_iter().flatten() {
            if hook.program.trim().is_empty() {
                return Err(TitleBlockError::ConfigInvalid(format!(
                    "converter '{}' has a startup/shutdown hook without a program",
                    conv.name
                )));
            }
        }
    }

    Ok(())
}

fn normalize_ext(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Containment, Corner};

    #[test]
    fn test_parse_valid_config() {
        let json = r#"{
            "region": { "corner": "top_left", "width_inset": 200, "height_inset": 100,
                        "containment": "corner_point" },
            "converters": [
                { "name": "solidworks", "extensions": ["slddrw", "dwg"],
                  "program": "sw-export", "args": ["{input}", "{output}"] }
            ]
        }"#;
        let config = parse_config_str(json).unwrap();
        assert_eq!(config.region.corner, Corner::TopLeft);
        assert_eq!(config.region.containment, Containment::CornerPoint);
        assert_eq!(config.converters.len(), 1);
        assert!(config.tiff.enabled);
        assert_eq!(config.tiff.default_dpi, 72.0);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config_str("{}").unwrap();
        assert_eq!(config.region.corner, Corner::BottomRight);
        assert_eq!(config.region.width_inset, 300.0);
        assert!(config.converters.is_empty());
    }

    #[test]
    fn test_negative_inset_rejected() {
        let json = r#"{ "region": { "width_inset": -1, "height_inset": 100 } }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_duplicate_extension_rejected() {
        let json = r#"{
            "converters": [
                { "name": "a", "extensions": ["dwg"], "program": "a" },
                { "name": "b", "extensions": [".DWG"], "program": "b" }
            ]
        }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_converter_clashing_with_tiff_rejected() {
        let json = r#"{
            "converters": [ { "name": "scan", "extensions": ["tif"], "program": "x" } ]
        }"#;
        assert!(parse_config_str(json).is_err());

        let json = r#"{
            "tiff": { "enabled": false },
            "converters": [ { "name": "scan", "extensions": ["tif"], "program": "x" } ]
        }"#;
        assert!(parse_config_str(json).is_ok());
    }

    #[test]
    fn test_missing_program_rejected() {
        let json = r#"{
            "converters": [ { "name": "a", "extensions": ["dwg"], "program": " " } ]
        }"#;
        assert!(parse_config_str(json).is_err());
    }
}
