//! Configuration module for pdfmerge.
//!
//! Holds the knobs a host can tune for a merge session: which inputs the
//! filter accepts, how the output artifact is named, how long delivery keeps
//! the temporary resource alive and how the output is compressed. Every
//! field has a default matching the reference behaviour, so an empty JSON
//! object is a valid configuration.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::MergeError;
use std::{path::Path, str::FromStr, time::Duration};

/// Minimum number of entries a collection needs before merging is enabled.
pub const MIN_MERGE_ENTRIES: usize = 2;

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression - preserves exact quality and structure.
    None,
    /// Compress content streams.
    #[default]
    Standard,
    /// Compress streams and prune unreferenced objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = MergeError;

    /// Parse compression level from "none", "standard" or "maximum".
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(MergeError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Complete configuration for a merge session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Media type the input filter accepts.
    pub expected_media_type: String,

    /// File extension (without the dot) the input filter accepts.
    pub expected_extension: String,

    /// Prefix of the suggested output name, `<prefix>_<millis>.pdf`.
    pub output_prefix: String,

    /// Media type announced to the delivery sink.
    pub output_media_type: String,

    /// How long delivery waits before disposing the temporary resource.
    pub grace_period_ms: u64,

    /// Compression applied when serialising the output.
    pub compression: CompressionLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expected_media_type: "application/pdf".to_string(),
            expected_extension: "pdf".to_string(),
            output_prefix: "merged".to_string(),
            output_media_type: "application/pdf".to_string(),
            grace_period_ms: 10_000,
            compression: CompressionLevel::Standard,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails
    /// [`Config::validate`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Malformed configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration: {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expected media type or extension is empty
    /// - The extension starts with a dot
    /// - The output prefix is empty
    /// - The grace period is zero
    pub fn validate(&self) -> Result<()> {
        if self.expected_media_type.trim().is_empty() {
            bail!("Expected media type cannot be empty");
        }

        if self.expected_extension.trim().is_empty() {
            bail!("Expected extension cannot be empty");
        }

        if self.expected_extension.starts_with('.') {
            bail!(
                "Expected extension must not include the leading dot: {}",
                self.expected_extension
            );
        }

        if self.output_prefix.trim().is_empty() {
            bail!("Output prefix cannot be empty");
        }

        if self.grace_period_ms == 0 {
            bail!("Grace period must be at least 1ms");
        }

        Ok(())
    }

    /// Grace period as a [`Duration`].
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}
