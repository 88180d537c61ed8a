//! Field rendering and command assembly
//!
//! Rendering is pure: the same invocation always yields the same tokens.
//! Fields render in ascending position order after the command prefix;
//! fields with no effective value contribute nothing.

use std::borrow::Cow;
use std::fmt;

use tracing::debug;

use crate::error::WbError;
use crate::invocation::Invocation;
use crate::spec::{FieldKind, FieldSpec};
use crate::template::arg_template;
use crate::value::Value;

/// Final program and argument list for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RenderedCommand {
    /// Program followed by its arguments
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str))
    }
}

impl fmt::Display for RenderedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", shell_quote(token))?;
        }
        Ok(())
    }
}

/// Quote a token for display when it holds shell-significant characters
fn shell_quote(token: &str) -> Cow<'_, str> {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,%@".contains(c));
    if plain {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("'{}'", token.replace('\'', r"'\''")))
    }
}

/// Assemble prefix and rendered fields into one command
pub fn assemble(invocation: &Invocation) -> Result<RenderedCommand, WbError> {
    let spec = invocation.spec();
    let mut args: Vec<String> = spec.prefix_args().map(str::to_string).collect();

    for field in spec.render_order() {
        let Some(value) = invocation.effective(field.name) else {
            continue;
        };
        let tokens = render_field(field, &value, invocation)?;
        debug!(field = field.name, ?tokens, "rendered");
        args.extend(tokens);
    }

    Ok(RenderedCommand {
        program: spec.program().to_string(),
        args,
    })
}

/// Render one field's value into tokens.
///
/// The invocation is consulted only by fallback flags, which read their
/// companion fields.
pub fn render_field(
    field: &FieldSpec,
    value: &Value,
    invocation: &Invocation,
) -> Result<Vec<String>, WbError> {
    match field.kind {
        FieldKind::Flag { flag } => Ok(if value.as_bool() == Some(true) {
            vec![flag.to_string()]
        } else {
            Vec::new()
        }),

        FieldKind::StructureGroups { group, modifier } => {
            let entries = value.as_list().unwrap_or_default();
            let mut tokens = Vec::with_capacity(entries.len() * 3);
            for (index, entry) in entries.iter().enumerate() {
                let parts = entry.as_list().unwrap_or_default();
                let (Some(structure), Some(path)) = (parts.first(), parts.get(1)) else {
                    return Err(WbError::TupleArity {
                        field: field.name.to_string(),
                        index,
                        found: parts.len(),
                        expected: "2 or 3",
                    });
                };
                tokens.push(group.to_string());
                tokens.push(structure.to_string());
                tokens.push(path.to_string());
                // Trailing boolean is a marker, never a positional value
                if let (Some(marker), Some(Value::Bool(true))) = (modifier, parts.get(2)) {
                    tokens.push(marker.to_string());
                }
            }
            Ok(tokens)
        }

        FieldKind::FallbackFlag { argstr, paths } => {
            if value.as_bool() != Some(true) {
                return Ok(Vec::new());
            }
            let resolved = paths
                .iter()
                .map(|fallback| {
                    invocation
                        .effective(fallback.field)
                        .or_else(|| invocation.effective(fallback.otherwise))
                        .ok_or_else(|| WbError::MissingCompanion {
                            field: field.name.to_string(),
                            requires: fallback.otherwise.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let values: Vec<&Value> = resolved.iter().map(|v| v.as_ref()).collect();
            arg_template(field.name, argstr)?.fill(field.name, &values)
        }

        FieldKind::Files { argstr, .. } => {
            let template = arg_template(field.name, argstr)?;
            let items = match value {
                Value::List(items) => items.as_slice(),
                single => std::slice::from_ref(single),
            };
            let mut tokens = Vec::new();
            for item in items {
                tokens.extend(template.fill(field.name, &[item])?);
            }
            Ok(tokens)
        }

        kind => {
            let argstr = kind.argstr().ok_or_else(|| {
                WbError::definition(field.name, "field kind has no argument template")
            })?;
            arg_template(field.name, argstr)?.fill(field.name, &[value])
        }
    }
}
