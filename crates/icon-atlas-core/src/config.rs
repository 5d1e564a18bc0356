use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Canvas width used by the editor's shipped atlases.
pub const DEFAULT_MAX_WIDTH: u32 = 4096;
/// Overflow limit for the packed height.
pub const DEFAULT_MAX_HEIGHT: u32 = 4096;

/// Sidecar formats for the placement records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetadataFormat {
    /// `{ records: [...], meta: {...} }`
    Json,
    /// One `<tile .../>` tag per record.
    Xml,
}

impl MetadataFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

impl FromStr for MetadataFormat {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Canvas width in pixels. Every atlas is emitted at exactly this width.
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    /// Largest bottom edge a placement may reach before packing fails.
    #[serde(default = "default_max_height")]
    pub max_height: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if either dimension is zero, or if the width leaves
    /// no room for a padded tile.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasError;

        if self.max_width == 0 || self.max_height == 0 {
            return Err(AtlasError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }
        if self.max_width <= crate::packer::PLACEMENT_PAD {
            return Err(AtlasError::InvalidConfig(format!(
                "max_width ({}) leaves no room for the {}px placement pad",
                self.max_width,
                crate::packer::PLACEMENT_PAD
            )));
        }
        Ok(())
    }
}

fn default_max_width() -> u32 {
    DEFAULT_MAX_WIDTH
}
fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn max_width(mut self, v: u32) -> Self {
        self.cfg.max_width = v;
        self
    }
    pub fn max_height(mut self, v: u32) -> Self {
        self.cfg.max_height = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}

impl AtlasConfig {
    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}
