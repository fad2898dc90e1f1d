use crate::{
    bake_error::BakeError,
    types::{DEFAULT_MAX_BONES, DEFAULT_MAX_INFLUENCES},
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Per-vertex layers that take part in vertex identity and are carried into
/// the baked buffers. A disabled layer is ignored even if the input has it.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct LayerOptions {
    pub colors: bool,
    pub normals: bool,
    pub binormals: bool,
    pub tangents: bool,
    pub uvs: bool,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            colors: true,
            normals: true,
            binormals: true,
            tangents: true,
            uvs: true,
        }
    }
}

/// Options for a conversion pass. Can be written by hand or read from a YAML
/// document such as:
/// ```yaml
/// max_influences_per_vertex: 4
/// max_bones_per_partition: 24
/// layers:
///   binormals: false
/// ```
/// Missing fields take their default values.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(default)]
pub struct BakeOptions {
    pub max_influences_per_vertex: usize,
    pub max_bones_per_partition: usize,
    pub layers: LayerOptions,
    pub animation: bool,
}

impl Default for BakeOptions {
    fn default() -> Self {
        Self {
            max_influences_per_vertex: DEFAULT_MAX_INFLUENCES,
            max_bones_per_partition: DEFAULT_MAX_BONES,
            layers: LayerOptions::default(),
            animation: true,
        }
    }
}

impl BakeOptions {
    /// Checks that the limits make sense together. A vertex can never be
    /// influenced by more bones than a partition may hold.
    ///
    /// # Errors
    /// Returns `BakeError::InvalidOptions` describing the problem
    pub fn validate(&self) -> Result<(), BakeError> {
        if self.max_influences_per_vertex == 0 {
            return Err(BakeError::InvalidOptions(
                "max_influences_per_vertex must be at least 1".to_string(),
            ));
        }
        if self.max_bones_per_partition == 0 {
            return Err(BakeError::InvalidOptions(
                "max_bones_per_partition must be at least 1".to_string(),
            ));
        }
        if self.max_influences_per_vertex > self.max_bones_per_partition {
            return Err(BakeError::InvalidOptions(format!(
                "max_influences_per_vertex {} exceeds \
                 max_bones_per_partition {}",
                self.max_influences_per_vertex, self.max_bones_per_partition
            )));
        }
        Ok(())
    }

    /// Parses and validates options from a YAML string
    ///
    /// # Errors
    /// May return `BakeError`
    pub fn from_yaml_str(s: &str) -> Result<Self, BakeError> {
        let options: Self = serde_yaml::from_str(s)?;
        options.validate()?;
        debug!("options={:?}", options);
        Ok(options)
    }

    /// Reads, parses and validates options from a YAML file
    ///
    /// # Errors
    /// May return `BakeError`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BakeError> {
        let s = fs::read_to_string(path)?;
        Self::from_yaml_str(&s)
    }
}
