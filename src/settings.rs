//! Tool settings with persistence
//!
//! Settings are read from `~/.config/meshport/settings.toml` unless a path is
//! given on the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use meshport_mesh::ExportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All tool settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub export: ExportConfig,
    /// External converter run on every exported file, if configured
    pub converter: Option<ConverterSettings>,
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("meshport"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from the default location, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{:#}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load settings from an explicit path
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("Failed to parse settings file {:?}", path))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Parse settings from TOML text
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save settings to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        let path = dir.join("settings.toml");

        // Create config directory if it doesn't exist
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// External conversion program settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterSettings {
    /// Program to run
    pub program: PathBuf,
    /// Arguments; `{input}` and `{output}` are replaced with file paths
    pub args: Vec<String>,
    /// Extension of the converted file
    pub output_extension: String,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("FbxConverter"),
            args: vec!["{input}".to_string(), "{output}".to_string()],
            output_extension: "fbx".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.converter.is_none());
    }

    #[test]
    fn export_table_overrides_defaults() {
        let settings = Settings::parse(
            r#"
            [export]
            scale = 1.0
            duplicate_group_markers = false
            "#,
        )
        .unwrap();
        assert_eq!(settings.export.scale, 1.0);
        assert!(!settings.export.duplicate_group_markers);
        assert!(settings.export.flip_v);
    }

    #[test]
    fn converter_table_is_optional_per_field() {
        let settings = Settings::parse(
            r#"
            [converter]
            program = "/opt/tools/convert"
            "#,
        )
        .unwrap();
        let converter = settings.converter.unwrap();
        assert_eq!(converter.program, PathBuf::from("/opt/tools/convert"));
        assert_eq!(converter.args, vec!["{input}", "{output}"]);
        assert_eq!(converter.output_extension, "fbx");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Settings::parse("[export\nscale = ").is_err());
    }

    #[test]
    fn settings_roundtrip_through_toml() {
        let settings = Settings {
            converter: Some(ConverterSettings::default()),
            ..Default::default()
        };
        let text = toml::to_string_pretty(&settings).unwrap();
        assert_eq!(Settings::parse(&text).unwrap(), settings);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
