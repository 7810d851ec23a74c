// src/config.rs - Robot library configuration
//! # Robot library
//!
//! Named robot configurations, persisted as JSON (default) or TOML (when the
//! path ends in `.toml`). Each entry is tagged with the controller variant it
//! builds:
//!
//! ```json
//! {
//!   "cartesian": {
//!     "robot_type": "cartesian",
//!     "robot_data": { "max_acceleration": 20.0, "homing_factor": 2.0, "acceleration_multiplier": 20.0 }
//!   }
//! }
//! ```
//!
//! ```toml
//! [two-link-arm]
//! robot_type = "two-link-arm"
//!
//! [two-link-arm.robot_data]
//! inner_length = 7.0
//! outer_length = 8.0
//! spread = 2.0
//! max_acceleration = 3.14
//! max_speed = 6.28
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::path::Path;
use thiserror::Error;

use crate::instruction::Waypoint;
use crate::motion::{CartesianActuator, MotionController, TrackingGains, TwoLinkArm, TwoLinkGeometry};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Unknown robot '{0}'")]
    UnknownRobot(String),
    #[error("Invalid config for robot '{robot}': {reason}")]
    Invalid { robot: String, reason: String },
}

/// Builds a motion controller whose end effector starts at `start`.
pub trait RobotBuilder {
    fn build_robot(&self, start: Waypoint) -> Box<dyn MotionController>;
}

/// Direct Cartesian actuator parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CartesianConfig {
    pub max_acceleration: f64,
    #[serde(default = "default_homing_factor")]
    pub homing_factor: f64,
    #[serde(default = "default_acceleration_multiplier")]
    pub acceleration_multiplier: f64,
}

/// Two-link arm parameters. Lengths in workspace units, limits in rad/s and rad/s².
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TwoLinkArmConfig {
    pub inner_length: f64,
    pub outer_length: f64,
    pub spread: f64,
    pub max_acceleration: f64,
    pub max_speed: f64,
    #[serde(default = "default_homing_factor")]
    pub homing_factor: f64,
    #[serde(default = "default_acceleration_multiplier")]
    pub acceleration_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "robot_type", content = "robot_data", rename_all = "kebab-case")]
pub enum RobotConfig {
    Cartesian(CartesianConfig),
    TwoLinkArm(TwoLinkArmConfig),
}

impl CartesianConfig {
    fn gains(&self) -> TrackingGains {
        TrackingGains {
            homing_factor: self.homing_factor,
            acceleration_multiplier: self.acceleration_multiplier,
            max_acceleration: self.max_acceleration,
        }
    }
}

impl TwoLinkArmConfig {
    fn gains(&self) -> TrackingGains {
        TrackingGains {
            homing_factor: self.homing_factor,
            acceleration_multiplier: self.acceleration_multiplier,
            max_acceleration: self.max_acceleration,
        }
    }

    pub fn geometry(&self) -> TwoLinkGeometry {
        TwoLinkGeometry {
            inner_length: self.inner_length,
            outer_length: self.outer_length,
            spread: self.spread,
        }
    }
}

impl RobotBuilder for CartesianConfig {
    fn build_robot(&self, start: Waypoint) -> Box<dyn MotionController> {
        Box::new(CartesianActuator::new(start.into(), self.gains()))
    }
}

impl RobotBuilder for TwoLinkArmConfig {
    fn build_robot(&self, start: Waypoint) -> Box<dyn MotionController> {
        Box::new(TwoLinkArm::new(self.geometry(), self.gains(), self.max_speed, start.into()))
    }
}

impl RobotBuilder for RobotConfig {
    fn build_robot(&self, start: Waypoint) -> Box<dyn MotionController> {
        match self {
            RobotConfig::Cartesian(c) => c.build_robot(start),
            RobotConfig::TwoLinkArm(c) => c.build_robot(start),
        }
    }
}

impl RobotConfig {
    /// Validate limits and lengths
    pub fn validate(&self) -> Result<(), String> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(format!("{} must be > 0, got {}", name, v))
            }
        };
        let non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(format!("{} must be >= 0, got {}", name, v))
            }
        };
        match self {
            RobotConfig::Cartesian(c) => {
                positive("max_acceleration", c.max_acceleration)?;
                non_negative("homing_factor", c.homing_factor)?;
                non_negative("acceleration_multiplier", c.acceleration_multiplier)?;
            }
            RobotConfig::TwoLinkArm(c) => {
                positive("inner_length", c.inner_length)?;
                positive("outer_length", c.outer_length)?;
                non_negative("spread", c.spread)?;
                positive("max_acceleration", c.max_acceleration)?;
                positive("max_speed", c.max_speed)?;
                non_negative("homing_factor", c.homing_factor)?;
                non_negative("acceleration_multiplier", c.acceleration_multiplier)?;
            }
        }
        Ok(())
    }
}

/// All known robots, by name
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RobotLibrary {
    pub robots: BTreeMap<String, RobotConfig>,
}

impl Default for RobotLibrary {
    fn default() -> Self {
        let mut robots = BTreeMap::new();
        robots.insert(
            "two-link-arm".to_string(),
            RobotConfig::TwoLinkArm(TwoLinkArmConfig {
                inner_length: 7.0,
                outer_length: 8.0,
                spread: 2.0,
                max_acceleration: PI,
                max_speed: 2.0 * PI,
                homing_factor: default_homing_factor(),
                acceleration_multiplier: default_acceleration_multiplier(),
            }),
        );
        robots.insert(
            "cartesian".to_string(),
            RobotConfig::Cartesian(CartesianConfig {
                max_acceleration: 20.0,
                homing_factor: default_homing_factor(),
                acceleration_multiplier: default_acceleration_multiplier(),
            }),
        );
        Self { robots }
    }
}

impl RobotLibrary {
    pub fn get(&self, name: &str) -> Option<&RobotConfig> {
        self.robots.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.robots.keys().map(String::as_str)
    }

    /// Resolve `name` and build its controller at `start`.
    pub fn build(&self, name: &str, start: Waypoint) -> Result<Box<dyn MotionController>, ConfigError> {
        let config = self
            .get(name)
            .ok_or_else(|| ConfigError::UnknownRobot(name.to_string()))?;
        config.validate().map_err(|reason| ConfigError::Invalid {
            robot: name.to_string(),
            reason,
        })?;
        tracing::info!("Building robot '{}' at ({}, {})", name, start.x, start.y);
        Ok(config.build_robot(start))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, config) in &self.robots {
            config.validate().map_err(|reason| ConfigError::Invalid {
                robot: name.clone(),
                reason,
            })?;
        }
        Ok(())
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load and validate a library file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).inspect_err(|e| {
            tracing::error!("Failed to read robot library '{}': {}", path.display(), e);
        })?;
        let library = if is_toml(path) {
            Self::from_toml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
        .inspect_err(|e| tracing::error!("Failed to parse robot library '{}': {}", path.display(), e))?;
        library.validate()?;
        tracing::info!("Loaded {} robot(s) from {}", library.robots.len(), path.display());
        Ok(library)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = if is_toml(path) {
            toml::to_string_pretty(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load `path`, or write the default library there if it does not exist yet.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        tracing::info!("Robot library {} not found, writing defaults", path.display());
        let library = Self::default();
        library.save(path)?;
        Ok(library)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

// Default value functions
fn default_homing_factor() -> f64 { 2.0 }
fn default_acceleration_multiplier() -> f64 { 20.0 }

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_library() {
        let library = RobotLibrary::default();
        assert_eq!(library.names().collect::<Vec<_>>(), vec!["cartesian", "two-link-arm"]);
        assert!(library.validate().is_ok());
        match library.get("cartesian").unwrap() {
            RobotConfig::Cartesian(c) => {
                assert_eq!(c.max_acceleration, 20.0);
                assert_eq!(c.homing_factor, 2.0);
                assert_eq!(c.acceleration_multiplier, 20.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tagged_json_format() {
        let json = r#"{
            "plotter": {
                "robot_type": "cartesian",
                "robot_data": { "max_acceleration": 5.0 }
            }
        }"#;
        let library = RobotLibrary::from_json_str(json).unwrap();
        let expected = RobotConfig::Cartesian(CartesianConfig {
            max_acceleration: 5.0,
            homing_factor: 2.0,
            acceleration_multiplier: 20.0,
        });
        assert_eq!(library.get("plotter"), Some(&expected));
    }

    #[test]
    fn test_unknown_robot_type_rejected() {
        let json = r#"{ "x": { "robot_type": "delta", "robot_data": {} } }"#;
        assert!(matches!(RobotLibrary::from_json_str(json), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_load_toml_library() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("robots.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "[arm]\nrobot_type = \"two-link-arm\"\n\n[arm.robot_data]\ninner_length = 7.0\nouter_length = 8.0\nspread = 2.0\nmax_acceleration = 3.0\nmax_speed = 6.0"
        )
        .unwrap();
        file.flush().unwrap();
        let library = RobotLibrary::load(&file_path).unwrap();
        match library.get("arm").unwrap() {
            RobotConfig::TwoLinkArm(c) => {
                assert_eq!(c.outer_length, 8.0);
                assert_eq!(c.homing_factor, 2.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = RobotLibrary::load("nonexistent_robots.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_validation_rejects_zero_length() {
        let mut library = RobotLibrary::default();
        if let Some(RobotConfig::TwoLinkArm(c)) = library.robots.get_mut("two-link-arm") {
            c.inner_length = 0.0;
        }
        assert!(matches!(library.validate(), Err(ConfigError::Invalid { .. })));
        assert!(matches!(
            library.build("two-link-arm", Waypoint::new(0.0, 8.0)),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
