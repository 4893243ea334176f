//! YAML configuration file support for recordlink runs.
//!
//! One file describes the fields to match on, where model artifacts live,
//! and the tuning for each workflow. Every section is optional and falls
//! back to the same defaults as the options structs.
//!
//! ## Example YAML configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "customers"
//! artifact_dir: "models"
//!
//! fields:
//!   - name
//!   - [price, Price]
//!   - [phone, String, has missing]
//!
//! canonicalize: [name]
//!
//! dedupe:
//!   recall_weight: 2.0
//!   sample_fraction: 0.3
//!
//! link:
//!   threshold: 0.0
//!
//! gazetteer:
//!   threshold: 0.3
//!   sample_fraction: 1.0
//!
//! engine:
//!   num_cores: 4
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use cluster::Canonicalize;
use fields::RawFieldSpec;
use normalize::NormalizeConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::options::{DedupeOptions, GazetteerOptions, LinkOptions};

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// `canonicalize:` accepts a flag or a list of field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalizeSetting {
    Flag(bool),
    Fields(Vec<String>),
}

impl Default for CanonicalizeSetting {
    fn default() -> Self {
        CanonicalizeSetting::Flag(false)
    }
}

impl From<&CanonicalizeSetting> for Canonicalize {
    fn from(setting: &CanonicalizeSetting) -> Self {
        match setting {
            CanonicalizeSetting::Flag(enabled) => Canonicalize::from(*enabled),
            CanonicalizeSetting::Fields(names) => Canonicalize::Fields(names.clone()),
        }
    }
}

/// Top-level YAML configuration for a recordlink run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecordLinkConfig {
    /// Configuration format version
    pub version: String,

    /// Configuration name; artifact files are named after it
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    #[serde(default)]
    pub fields: Vec<RawFieldSpec>,

    #[serde(default)]
    pub canonicalize: CanonicalizeSetting,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub dedupe: DedupeYamlConfig,

    #[serde(default)]
    pub link: LinkYamlConfig,

    #[serde(default)]
    pub gazetteer: GazetteerYamlConfig,

    #[serde(default)]
    pub engine: EngineYamlConfig,
}

impl RecordLinkConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: RecordLinkConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if self.name.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "name must not be empty".to_string(),
            ));
        }
        self.normalize
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("normalize: {err}")))?;
        self.dedupe.validate()?;
        self.link.validate()?;
        self.gazetteer.validate()?;
        Ok(())
    }

    pub fn canonicalize(&self) -> Canonicalize {
        Canonicalize::from(&self.canonicalize)
    }

    pub fn dedupe_options(&self) -> DedupeOptions {
        DedupeOptions {
            artifact_dir: self.artifact_dir.clone(),
            recall_weight: self.dedupe.recall_weight,
            threshold: self.dedupe.threshold,
            sample_fraction: self.dedupe.sample_fraction,
            num_cores: self.engine.num_cores,
            update: self.dedupe.update,
            normalize: self.normalize.clone(),
        }
    }

    pub fn link_options(&self) -> LinkOptions {
        LinkOptions {
            artifact_dir: self.artifact_dir.clone(),
            threshold: self.link.threshold,
            sample_fraction: self.link.sample_fraction,
            num_cores: self.engine.num_cores,
            update: self.link.update,
            normalize: self.normalize.clone(),
        }
    }

    pub fn gazetteer_options(&self) -> GazetteerOptions {
        GazetteerOptions {
            artifact_dir: self.artifact_dir.clone(),
            threshold: self.gazetteer.threshold,
            sample_fraction: self.gazetteer.sample_fraction,
            num_cores: self.engine.num_cores,
            update: self.gazetteer.update,
            normalize: self.normalize.clone(),
        }
    }
}

impl Default for RecordLinkConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: default_name(),
            artifact_dir: default_artifact_dir(),
            fields: Vec::new(),
            canonicalize: CanonicalizeSetting::default(),
            normalize: NormalizeConfig::default(),
            dedupe: DedupeYamlConfig::default(),
            link: LinkYamlConfig::default(),
            gazetteer: GazetteerYamlConfig::default(),
            engine: EngineYamlConfig::default(),
        }
    }
}

fn check_fraction(section: &str, value: f64) -> Result<(), ConfigLoadError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigLoadError::Validation(format!(
            "{section}.sample_fraction must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

fn check_threshold(section: &str, value: f64) -> Result<(), ConfigLoadError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigLoadError::Validation(format!(
            "{section}.threshold must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Self-deduplication YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupeYamlConfig {
    #[serde(default = "default_recall_weight")]
    pub recall_weight: f64,

    #[serde(default)]
    pub threshold: Option<f64>,

    #[serde(default = "default_sample_fraction")]
    pub sample_fraction: f64,

    #[serde(default)]
    pub update: bool,
}

impl DedupeYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !self.recall_weight.is_finite() || self.recall_weight <= 0.0 {
            return Err(ConfigLoadError::Validation(format!(
                "dedupe.recall_weight must be > 0, got {}",
                self.recall_weight
            )));
        }
        if let Some(t) = self.threshold {
            check_threshold("dedupe", t)?;
        }
        check_fraction("dedupe", self.sample_fraction)
    }
}

impl Default for DedupeYamlConfig {
    fn default() -> Self {
        Self {
            recall_weight: 1.0,
            threshold: None,
            sample_fraction: 0.3,
            update: false,
        }
    }
}

/// Two-table link YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkYamlConfig {
    #[serde(default)]
    pub threshold: f64,

    #[serde(default = "default_sample_fraction")]
    pub sample_fraction: f64,

    #[serde(default)]
    pub update: bool,
}

impl LinkYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        check_threshold("link", self.threshold)?;
        check_fraction("link", self.sample_fraction)
    }
}

impl Default for LinkYamlConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            sample_fraction: 0.3,
            update: false,
        }
    }
}

/// Gazetteer YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteerYamlConfig {
    #[serde(default = "default_gazetteer_threshold")]
    pub threshold: f64,

    #[serde(default = "default_gazetteer_fraction")]
    pub sample_fraction: f64,

    #[serde(default)]
    pub update: bool,
}

impl GazetteerYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        check_threshold("gazetteer", self.threshold)?;
        check_fraction("gazetteer", self.sample_fraction)
    }
}

impl Default for GazetteerYamlConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            sample_fraction: 1.0,
            update: false,
        }
    }
}

/// Matching engine YAML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineYamlConfig {
    /// Worker threads; 0 lets the engine decide.
    #[serde(default)]
    pub num_cores: usize,
}

// Helper functions for serde defaults
fn default_name() -> String {
    "recordlink".to_string()
}
fn default_artifact_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_recall_weight() -> f64 {
    1.0
}
fn default_sample_fraction() -> f64 {
    0.3
}
fn default_gazetteer_threshold() -> f64 {
    0.3
}
fn default_gazetteer_fraction() -> f64 {
    1.0
}
