//! Invocations
//!
//! An [`Invocation`] pairs a command table with the values a caller has
//! assigned. Values are coerced to the declared kind as they are set, so a
//! wrong type or an unknown structure name fails at assignment. Cross-field
//! rules (mandatory fields, companions, existing paths) are checked by
//! [`Invocation::validate`] before anything renders.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::WbError;
use crate::render::{self, RenderedCommand};
use crate::spec::{CommandSpec, DefaultPolicy, FieldKind, FieldSpec};
use crate::structure::{is_brain_structure, BRAIN_STRUCTURES};
use crate::template::derive_name;
use crate::value::Value;

/// A command table plus concrete input values
#[derive(Debug, Clone)]
pub struct Invocation {
    spec: &'static CommandSpec,
    inputs: BTreeMap<&'static str, Value>,
}

impl Invocation {
    pub fn new(spec: &'static CommandSpec) -> Self {
        Self {
            spec,
            inputs: BTreeMap::new(),
        }
    }

    pub fn spec(&self) -> &'static CommandSpec {
        self.spec
    }

    /// Assign a field, coercing the value to the field's kind.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self, WbError> {
        let field = self.spec.field(name).ok_or_else(|| WbError::UnknownField {
            command: self.spec.name.to_string(),
            field: name.to_string(),
        })?;

        let value = coerce(field, value.into())?;
        debug!(command = self.spec.name, field = field.name, %value, "field set");
        self.inputs.insert(field.name, value);
        Ok(self)
    }

    /// Clear a field, returning its previous value
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.inputs.remove(name)
    }

    /// Explicitly assigned value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// Value the field renders with: the assigned value, else its literal
    /// default, else a name derived from its source field.
    pub fn effective(&self, name: &str) -> Option<Cow<'_, Value>> {
        if let Some(value) = self.inputs.get(name) {
            return Some(Cow::Borrowed(value));
        }

        let field = self.spec.field(name)?;
        match field.default {
            DefaultPolicy::None => None,
            DefaultPolicy::Literal(literal) => Some(Cow::Owned(literal.to_value())),
            DefaultPolicy::Derived(naming) => {
                if naming.source == name {
                    return None;
                }
                let source = self.effective(naming.source)?;
                let source = match source.as_ref() {
                    Value::Text(text) => text.clone(),
                    Value::List(items) => items.first()?.as_text()?.to_string(),
                    _ => return None,
                };
                let derived = derive_name(&source, naming.template, naming.keep_extension);
                debug!(field = name, source = %source, derived = %derived, "derived name");
                Some(Cow::Owned(Value::Text(derived)))
            }
        }
    }

    /// Validate against the current directory
    pub fn validate(&self) -> Result<(), WbError> {
        self.validate_in(Path::new("."))
    }

    /// Validate, resolving relative input paths against `base`.
    ///
    /// Order: mandatory fields, then companions, then path existence. The
    /// first failure is returned.
    pub fn validate_in(&self, base: &Path) -> Result<(), WbError> {
        for field in self.spec.inputs {
            if field.mandatory && self.effective(field.name).is_none() {
                return Err(WbError::MissingField {
                    command: self.spec.name.to_string(),
                    field: field.name.to_string(),
                });
            }
        }

        for field in self.spec.inputs {
            if !self.is_set(field.name) {
                continue;
            }
            for required in field.requires {
                if self.effective(required).is_none() {
                    return Err(WbError::MissingCompanion {
                        field: field.name.to_string(),
                        requires: required.to_string(),
                    });
                }
            }
        }

        for field in self.spec.inputs {
            if !field.checks_existence() {
                continue;
            }
            let Some(value) = self.inputs.get(field.name) else {
                continue;
            };
            for path in input_paths(field, value) {
                let resolved = resolve(base, path);
                if !resolved.exists() {
                    return Err(WbError::NotFound {
                        field: field.name.to_string(),
                        path: resolved,
                    });
                }
            }
        }

        Ok(())
    }

    /// Validate and assemble the command line
    pub fn render(&self) -> Result<RenderedCommand, WbError> {
        self.validate()?;
        render::assemble(self)
    }

    /// Assemble without validation
    pub fn assemble(&self) -> Result<RenderedCommand, WbError> {
        render::assemble(self)
    }
}

pub(crate) fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Paths inside a value that must exist on disk
fn input_paths<'v>(field: &FieldSpec, value: &'v Value) -> Vec<&'v str> {
    match (field.kind, value) {
        (FieldKind::StructureGroups { .. }, Value::List(entries)) => entries
            .iter()
            .filter_map(|entry| entry.as_list()?.get(1)?.as_text())
            .collect(),
        // A text list is a set of names, not paths
        (FieldKind::FileOrTexts { .. }, Value::List(_)) => Vec::new(),
        (_, Value::Text(path)) => vec![path.as_str()],
        (_, Value::List(items)) => items.iter().filter_map(Value::as_text).collect(),
        _ => Vec::new(),
    }
}

fn coerce(field: &FieldSpec, value: Value) -> Result<Value, WbError> {
    let mismatch = |expected: &'static str, found: &Value| WbError::TypeMismatch {
        field: field.name.to_string(),
        expected,
        found: found.type_name(),
    };

    match field.kind {
        FieldKind::File { .. } | FieldKind::Text { .. } => match value {
            Value::Text(_) => Ok(value),
            other => Err(mismatch("text", &other)),
        },

        FieldKind::Files { .. } => match value {
            Value::Text(_) => Ok(Value::List(vec![value])),
            Value::List(items) if !items.is_empty() && items.iter().all(|v| v.as_text().is_some()) => {
                Ok(Value::List(items))
            }
            other => Err(mismatch("path or non-empty path list", &other)),
        },

        FieldKind::FileOrTexts { .. } => match value {
            Value::Text(_) => Ok(value),
            Value::List(items) if !items.is_empty() && items.iter().all(|v| v.as_text().is_some()) => {
                Ok(Value::List(items))
            }
            other => Err(mismatch("path or non-empty text list", &other)),
        },

        FieldKind::Int { .. } => match value {
            Value::Int(_) => Ok(value),
            other => Err(mismatch("integer", &other)),
        },

        FieldKind::Float { .. } => match value.as_float() {
            Some(f) => Ok(Value::Float(f)),
            None => Err(mismatch("number", &value)),
        },

        FieldKind::Flag { .. } | FieldKind::FallbackFlag { .. } => match value {
            Value::Bool(_) => Ok(value),
            other => Err(mismatch("boolean", &other)),
        },

        FieldKind::IntOrText { .. } => match value {
            Value::Int(_) | Value::Text(_) => Ok(value),
            other => Err(mismatch("integer or text", &other)),
        },

        FieldKind::Choice { choices, .. } => match value {
            Value::Text(ref text) if choices.contains(&text.as_str()) => Ok(value),
            Value::Text(text) => Err(WbError::InvalidChoice {
                field: field.name.to_string(),
                value: text,
                allowed: choices.join(", "),
            }),
            other => Err(mismatch("text", &other)),
        },

        FieldKind::StructureGroups { modifier, .. } => {
            let entries = match value {
                // A single [STRUCTURE, path, ...] entry
                Value::List(items) if items.first().is_some_and(|v| v.as_text().is_some()) => {
                    vec![Value::List(items)]
                }
                Value::List(items) if !items.is_empty() => items,
                other => return Err(mismatch("list of [STRUCTURE, path] entries", &other)),
            };

            let (max, expected) = if modifier.is_some() {
                (3, "2 or 3")
            } else {
                (2, "2")
            };

            for (index, entry) in entries.iter().enumerate() {
                let parts = entry
                    .as_list()
                    .ok_or_else(|| mismatch("[STRUCTURE, path] entry", entry))?;
                if parts.len() < 2 || parts.len() > max {
                    return Err(WbError::TupleArity {
                        field: field.name.to_string(),
                        index,
                        found: parts.len(),
                        expected,
                    });
                }

                let structure = parts[0]
                    .as_text()
                    .ok_or_else(|| mismatch("structure name", &parts[0]))?;
                if !is_brain_structure(structure) {
                    return Err(WbError::InvalidChoice {
                        field: field.name.to_string(),
                        value: structure.to_string(),
                        allowed: BRAIN_STRUCTURES.join(", "),
                    });
                }
                if parts[1].as_text().is_none() {
                    return Err(mismatch("path", &parts[1]));
                }
                if let Some(flag) = parts.get(2) {
                    if flag.as_bool().is_none() {
                        return Err(mismatch("boolean", flag));
                    }
                }
            }

            Ok(Value::List(entries))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CIFTI_CREATE_DENSE_FROM_TEMPLATE, CIFTI_DILATE, VOLUME_LABEL_IMPORT};
    use crate::error::ErrorKind;

    #[test]
    fn unknown_field_is_rejected() {
        let mut inv = Invocation::new(&CIFTI_DILATE);
        let err = inv.set("no_such_field", 1).unwrap_err();
        assert!(matches!(err, WbError::UnknownField { .. }));
    }

    #[test]
    fn int_field_rejects_float() {
        let mut inv = Invocation::new(&CIFTI_DILATE);
        let err = inv.set("surface_distance", 2.5).unwrap_err();
        assert!(matches!(err, WbError::TypeMismatch { expected: "integer", .. }));
    }

    #[test]
    fn choice_outside_set_is_rejected() {
        let mut inv = Invocation::new(&CIFTI_DILATE);
        let err = inv.set("direction", "DIAGONAL").unwrap_err();
        assert!(matches!(err, WbError::InvalidChoice { .. }));
        assert!(err.to_string().contains("ROW, COLUMN"));
    }

    #[test]
    fn single_structure_tuple_is_wrapped() {
        let mut inv = Invocation::new(&CIFTI_CREATE_DENSE_FROM_TEMPLATE);
        inv.set("volume", ("OTHER", "functional.nii", true)).unwrap();
        let entries = inv.get("volume").unwrap().as_list().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn unknown_structure_is_a_validation_error() {
        let mut inv = Invocation::new(&CIFTI_CREATE_DENSE_FROM_TEMPLATE);
        let err = inv
            .set("metric", vec![Value::from(("CORTEX_MIDDLE", "lh.func.gii"))])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn modifier_only_allowed_where_declared() {
        let mut inv = Invocation::new(&CIFTI_CREATE_DENSE_FROM_TEMPLATE);
        let err = inv
            .set("metric", ("CORTEX_LEFT", "lh.func.gii", true))
            .unwrap_err();
        assert!(matches!(
            err,
            WbError::TupleArity {
                found: 3,
                expected: "2",
                ..
            }
        ));
        inv.set("volume", ("OTHER", "functional.nii", true)).unwrap();
    }

    #[test]
    fn one_element_tuple_is_malformed() {
        let mut inv = Invocation::new(&CIFTI_CREATE_DENSE_FROM_TEMPLATE);
        let err = inv
            .set("label", vec![Value::from(vec!["CORTEX_LEFT"])])
            .unwrap_err();
        assert!(matches!(err, WbError::TupleArity { found: 1, .. }));
    }

    #[test]
    fn literal_default_is_effective() {
        let inv = Invocation::new(&VOLUME_LABEL_IMPORT);
        assert_eq!(
            inv.effective("unlabeled_values").as_deref(),
            Some(&Value::Int(0))
        );
        assert!(inv.effective("subvolume").is_none());
    }

    #[test]
    fn derived_name_follows_source() {
        let mut inv = Invocation::new(&VOLUME_LABEL_IMPORT);
        assert!(inv.effective("out_file").is_none());
        inv.set("in_file", "/data/atlas.nii").unwrap();
        assert_eq!(
            inv.effective("out_file").as_deref(),
            Some(&Value::from("atlas_labels.nii.gz"))
        );
        inv.set("out_file", "custom.nii.gz").unwrap();
        assert_eq!(
            inv.effective("out_file").as_deref(),
            Some(&Value::from("custom.nii.gz"))
        );
    }

    #[test]
    fn missing_mandatory_field() {
        let mut inv = Invocation::new(&CIFTI_DILATE);
        inv.set("direction", "ROW").unwrap();
        let err = inv.validate().unwrap_err();
        assert!(matches!(err, WbError::MissingField { ref field, .. } if field == "in_file"));
    }

    #[test]
    fn missing_input_file_is_not_found() {
        let mut inv = Invocation::new(&VOLUME_LABEL_IMPORT);
        inv.set("in_file", "/definitely/not/here/atlas.nii").unwrap();
        inv.set("label_list_file", "/definitely/not/here/labels.txt").unwrap();
        let err = inv.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn unset_clears_value() {
        let mut inv = Invocation::new(&CIFTI_DILATE);
        inv.set("nearest", true).unwrap();
        assert_eq!(inv.unset("nearest"), Some(Value::Bool(true)));
        assert!(!inv.is_set("nearest"));
    }
}
