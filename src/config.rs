//! Data-driven game configuration
//!
//! Levels, spawn queues, timers and score tables come from a JSON file so
//! balance changes never require a recompile.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sim::Color;

/// Configuration for a single level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Path to the tile-layout text file, relative to the config file
    pub layout: String,
    /// Time limit in seconds
    pub time: u32,
    /// Seconds between ball spawns
    pub spawn_interval: u32,
    /// Multiplier applied to base score on successful capture
    #[serde(rename = "score_increase_from_hole_capture_modifier")]
    pub score_increase_modifier: f64,
    /// Multiplier applied to base score on wrong-hole capture
    #[serde(rename = "score_decrease_from_wrong_hole_modifier")]
    pub score_decrease_modifier: f64,
    /// Ordered color names of balls waiting to spawn
    pub balls: Vec<String>,
}

/// Top-level game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub levels: Vec<LevelConfig>,
    /// Base score gained per captured ball, keyed by color name
    pub score_increase_from_hole_capture: HashMap<String, i32>,
    /// Base score lost per wrong-hole capture, keyed by color name
    pub score_decrease_from_wrong_hole: HashMap<String, i32>,
    /// Directory the layout paths are resolved against (set on load)
    #[serde(skip)]
    base_dir: PathBuf,
    /// In-memory layouts consulted before the filesystem, for embedders
    /// that ship levels inside the binary
    #[serde(skip)]
    embedded_layouts: HashMap<String, String>,
}

impl GameConfig {
    /// Load and parse a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config = Self::from_json(&text)?;
        config.base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(config)
    }

    /// Parse a config from a JSON string
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing game config")
    }

    /// Number of configured levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Config for a 1-based level index. Out-of-range requests are reported
    /// and yield `None` (treated as "no further level").
    pub fn level(&self, level: u32) -> Option<&LevelConfig> {
        let config = self.levels.get(level.checked_sub(1)? as usize);
        if config.is_none() {
            log::info!("no more levels available (requested {level})");
        }
        config
    }

    /// Register an in-memory layout under the name a level's `layout`
    /// field refers to
    pub fn embed_layout(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.embedded_layouts.insert(name.into(), text.into());
    }

    /// Load the layout text for a 1-based level index, preferring embedded
    /// layouts over the filesystem
    pub fn load_layout(&self, level: u32) -> Result<String> {
        let config = self
            .level(level)
            .with_context(|| format!("level {level} is not configured"))?;
        if let Some(text) = self.embedded_layouts.get(&config.layout) {
            return Ok(text.clone());
        }
        let path = self.base_dir.join(&config.layout);
        fs::read_to_string(&path)
            .with_context(|| format!("reading level layout {}", path.display()))
    }

    /// Base score gained when a ball of this color is captured
    pub fn base_increase(&self, color: Color) -> i32 {
        *self
            .score_increase_from_hole_capture
            .get(color.name())
            .unwrap_or(&0)
    }

    /// Base score lost when a ball of this color falls into the wrong hole
    pub fn base_decrease(&self, color: Color) -> i32 {
        *self
            .score_decrease_from_wrong_hole
            .get(color.name())
            .unwrap_or(&0)
    }

    /// Score delta for a successful capture, after the level modifier
    pub fn score_increase(&self, level: u32, color: Color) -> i32 {
        let modifier = self
            .level(level)
            .map(|l| l.score_increase_modifier)
            .unwrap_or(1.0);
        (self.base_increase(color) as f64 * modifier) as i32
    }

    /// Score delta for a failed capture, after the level modifier
    pub fn score_decrease(&self, level: u32, color: Color) -> i32 {
        let modifier = self
            .level(level)
            .map(|l| l.score_decrease_modifier)
            .unwrap_or(1.0);
        (self.base_decrease(color) as f64 * modifier) as i32
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_CONFIG: &str = r#"{
        "levels": [
            {
                "layout": "level1.txt",
                "time": 120,
                "spawn_interval": 10,
                "score_increase_from_hole_capture_modifier": 1.0,
                "score_decrease_from_wrong_hole_modifier": 1.0,
                "balls": ["orange", "blue", "grey"]
            },
            {
                "layout": "level2.txt",
                "time": 180,
                "spawn_interval": 5,
                "score_increase_from_hole_capture_modifier": 1.5,
                "score_decrease_from_wrong_hole_modifier": 0.5,
                "balls": ["green", "yellow"]
            }
        ],
        "score_increase_from_hole_capture": {
            "grey": 70, "orange": 50, "blue": 50, "green": 50, "yellow": 50
        },
        "score_decrease_from_wrong_hole": {
            "grey": 0, "orange": 25, "blue": 25, "green": 25, "yellow": 25
        }
    }"#;

    #[test]
    fn test_parse_config() {
        let config = GameConfig::from_json(TEST_CONFIG).unwrap();
        assert_eq!(config.level_count(), 2);
        let level1 = config.level(1).unwrap();
        assert_eq!(level1.time, 120);
        assert_eq!(level1.spawn_interval, 10);
        assert_eq!(level1.balls, vec!["orange", "blue", "grey"]);
    }

    #[test]
    fn test_level_out_of_range() {
        let config = GameConfig::from_json(TEST_CONFIG).unwrap();
        assert!(config.level(999).is_none());
        assert!(config.level(0).is_none());
    }

    #[test]
    fn test_score_tables_with_modifiers() {
        let config = GameConfig::from_json(TEST_CONFIG).unwrap();
        assert_eq!(config.score_increase(1, Color::Grey), 70);
        // Level 2 has a 1.5x increase and 0.5x decrease modifier
        assert_eq!(config.score_increase(2, Color::Orange), 75);
        assert_eq!(config.score_decrease(2, Color::Blue), 12);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(GameConfig::from_json("{ not json").is_err());
    }
}
