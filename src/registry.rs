//! Command registry
//!
//! Maps registry names to their static tables. Every table is checked when
//! the registry is built, so a lookup never hands out a malformed spec.

use std::collections::BTreeMap;

use tracing::debug;

use crate::commands::BUILTIN;
use crate::error::WbError;
use crate::spec::CommandSpec;

#[derive(Debug, Clone)]
pub struct Registry {
    commands: BTreeMap<&'static str, &'static CommandSpec>,
}

impl Registry {
    /// Build a registry from command tables, checking each one.
    pub fn new(specs: &[&'static CommandSpec]) -> Result<Self, WbError> {
        let mut commands = BTreeMap::new();
        for &spec in specs {
            spec.check()?;
            if commands.insert(spec.name, spec).is_some() {
                return Err(WbError::definition(spec.name, "command registered twice"));
            }
        }
        debug!(count = commands.len(), "registry built");
        Ok(Self { commands })
    }

    /// Registry of the built-in commands
    pub fn builtin() -> Result<Self, WbError> {
        Self::new(BUILTIN)
    }

    pub fn get(&self, name: &str) -> Result<&'static CommandSpec, WbError> {
        self.commands
            .get(name)
            .copied()
            .ok_or_else(|| WbError::UnknownCommand {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static CommandSpec> + '_ {
        self.commands.values().copied()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
