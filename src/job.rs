//! Job files
//!
//! A job names one registered command and its inputs:
//!
//! ```yaml
//! command: cifti-dilate
//! inputs:
//!   in_file: sub-01.dtseries.nii
//!   direction: COLUMN
//!   surface_distance: 10
//!   volume_distance: 10
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::WbError;
use crate::invocation::Invocation;
use crate::registry::Registry;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    pub command: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
}

impl Job {
    pub fn from_yaml(yaml: &str) -> Result<Self, WbError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WbError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Resolve the command and assign every input.
    ///
    /// Fails on the first unknown command, unknown field or ill-typed
    /// value; cross-field validation is left to the executor.
    pub fn into_invocation(self, registry: &Registry) -> Result<Invocation, WbError> {
        let spec = registry.get(&self.command)?;
        let mut invocation = Invocation::new(spec);
        for (name, value) in self.inputs {
            invocation.set(&name, value)?;
        }
        Ok(invocation)
    }
}
