//! Game settings and preferences
//!
//! Stored as JSON next to the binary; the library only parses them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Rays per headlight cone
    pub fn headlight_rays(&self) -> usize {
        match self {
            QualityPreset::Low => 30,
            QualityPreset::Medium => 60,
            QualityPreset::High => 120,
        }
    }

    /// Rays for the omnidirectional streetlight fan
    pub fn streetlight_rays(&self) -> usize {
        match self {
            QualityPreset::Low => 60,
            QualityPreset::Medium => 120,
            QualityPreset::High => 240,
        }
    }

    /// Maximum debris particles alive at once
    pub fn max_debris(&self) -> usize {
        match self {
            QualityPreset::Low => 150,
            QualityPreset::Medium => 400,
            QualityPreset::High => 1000,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Debris bursts from strikes and collisions
    pub debris: bool,
    /// Spark bursts from glancing blows and car contact
    pub sparks: bool,
    /// Lane assist for the player car (AI cars always use it)
    pub player_lane_assist: bool,
    /// Start with wide headlight beams (brights) instead of narrow ones
    pub wide_headlights: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            debris: true,
            sparks: true,
            player_lane_assist: true,
            wide_headlights: false,
        }
    }
}

impl Settings {
    /// Effective debris cap
    pub fn max_debris(&self) -> usize {
        if !self.debris {
            0
        } else {
            self.quality.max_debris()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Read settings, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Using default settings: {err}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "quality": "High", "sparks": false }"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::High);
        assert!(!settings.sparks);
        assert!(settings.debris);
        assert!(settings.player_lane_assist);
    }

    #[test]
    fn test_debris_disabled_caps_to_zero() {
        let settings = Settings {
            debris: false,
            ..Settings::default()
        };
        assert_eq!(settings.max_debris(), 0);
        assert_eq!(Settings::default().max_debris(), 400);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load_or_default(Path::new("/definitely/not/here.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert_eq!(QualityPreset::High.as_str(), "High");
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(Settings::from_json("{"), Err(LoadError::Json(_))));
    }
}
