//! Command specifications
//!
//! A [`CommandSpec`] is a static table describing one wrapped operation:
//! its fixed prefix, the input fields it accepts and how each renders, and
//! the output files it promises. Tables are plain `'static` data, built with
//! `const fn` helpers and checked once when the registry is assembled.

use std::collections::BTreeSet;

use crate::error::WbError;
use crate::template::arg_template;
use crate::value::Value;

/// Paired fallback for one auxiliary path of a [`FieldKind::FallbackFlag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fallback {
    /// Field consulted first
    pub field: &'static str,
    /// Field used when `field` is unset
    pub otherwise: &'static str,
}

/// The kind of value a field holds and how it renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Single file path
    File { argstr: &'static str, exists: bool },

    /// One or more file paths; the whole template is emitted once per file
    /// (`-cifti a -cifti b`).
    Files { argstr: &'static str, exists: bool },

    Int { argstr: &'static str },

    Float { argstr: &'static str },

    /// Free text
    Text { argstr: &'static str },

    /// Boolean rendered as a bare flag when true
    Flag { flag: &'static str },

    /// Enumerated text with a fixed set of values
    Choice {
        argstr: &'static str,
        choices: &'static [&'static str],
    },

    /// Integer index or text name (label maps, subvolumes)
    IntOrText { argstr: &'static str },

    /// An existing file, or a list of text values
    FileOrTexts { argstr: &'static str },

    /// Repeated `<group> STRUCTURE path [modifier]` groups.
    ///
    /// Entries are `[STRUCTURE, path]`, or `[STRUCTURE, path, bool]` when a
    /// modifier is declared; a trailing `true` emits the modifier.
    StructureGroups {
        group: &'static str,
        modifier: Option<&'static str>,
    },

    /// Boolean that, when true, renders its template with two paths, each
    /// taken from a companion field or its fallback input.
    FallbackFlag {
        argstr: &'static str,
        paths: [Fallback; 2],
    },
}

impl FieldKind {
    /// Human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::File { .. } => "file",
            FieldKind::Files { .. } => "file list",
            FieldKind::Int { .. } => "integer",
            FieldKind::Float { .. } => "float",
            FieldKind::Text { .. } => "text",
            FieldKind::Flag { .. } => "flag",
            FieldKind::Choice { .. } => "choice",
            FieldKind::IntOrText { .. } => "integer or text",
            FieldKind::FileOrTexts { .. } => "file or text list",
            FieldKind::StructureGroups { .. } => "structure groups",
            FieldKind::FallbackFlag { .. } => "flag with paths",
        }
    }

    /// The argument template, if the kind renders through one
    pub fn argstr(&self) -> Option<&'static str> {
        match *self {
            FieldKind::File { argstr, .. }
            | FieldKind::Files { argstr, .. }
            | FieldKind::Int { argstr }
            | FieldKind::Float { argstr }
            | FieldKind::Text { argstr }
            | FieldKind::Choice { argstr, .. }
            | FieldKind::IntOrText { argstr }
            | FieldKind::FileOrTexts { argstr }
            | FieldKind::FallbackFlag { argstr, .. } => Some(argstr),
            FieldKind::Flag { .. } | FieldKind::StructureGroups { .. } => None,
        }
    }

    fn expected_slots(&self) -> usize {
        match self {
            FieldKind::FallbackFlag { .. } => 2,
            FieldKind::Flag { .. } | FieldKind::StructureGroups { .. } => 0,
            _ => 1,
        }
    }
}

/// Literal default rendered when the caller leaves a field unset
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Text(&'static str),
}

impl Literal {
    pub fn to_value(self) -> Value {
        match self {
            Literal::Int(i) => Value::Int(i),
            Literal::Float(f) => Value::Float(f),
            Literal::Text(s) => Value::Text(s.to_string()),
        }
    }
}

/// Output name derivation from another field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameTemplate {
    /// Field whose value supplies the base name
    pub source: &'static str,
    /// Template with one `%s`; `None` uses `%s_generated`
    pub template: Option<&'static str>,
    pub keep_extension: bool,
}

/// What an unset field resolves to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultPolicy {
    None,
    Literal(Literal),
    Derived(NameTemplate),
}

/// Specification for a single input field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Rendering order; `None` means the field never renders on its own
    /// and is only read by another field.
    pub position: Option<u16>,
    pub mandatory: bool,
    /// Fields that must also be set when this one is
    pub requires: &'static [&'static str],
    pub default: DefaultPolicy,
    /// Read by command setup rather than rendered
    pub auxiliary: bool,
    pub desc: &'static str,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind, desc: &'static str) -> Self {
        Self {
            name,
            kind,
            position: None,
            mandatory: false,
            requires: &[],
            default: DefaultPolicy::None,
            auxiliary: false,
            desc,
        }
    }

    pub const fn at(mut self, position: u16) -> Self {
        self.position = Some(position);
        self
    }

    pub const fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub const fn requires(mut self, fields: &'static [&'static str]) -> Self {
        self.requires = fields;
        self
    }

    /// Never rendered; consumed by the command's setup step
    pub const fn auxiliary(mut self) -> Self {
        self.auxiliary = true;
        self
    }

    pub const fn default_to(mut self, literal: Literal) -> Self {
        self.default = DefaultPolicy::Literal(literal);
        self
    }

    pub const fn derived_from(
        mut self,
        source: &'static str,
        template: Option<&'static str>,
        keep_extension: bool,
    ) -> Self {
        self.default = DefaultPolicy::Derived(NameTemplate {
            source,
            template,
            keep_extension,
        });
        self
    }

    /// Whether values of this field are paths that must exist
    pub fn checks_existence(&self) -> bool {
        match self.kind {
            FieldKind::File { exists, .. } | FieldKind::Files { exists, .. } => exists,
            FieldKind::FileOrTexts { .. } | FieldKind::StructureGroups { .. } => true,
            _ => false,
        }
    }
}

/// A file the command promises to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    pub name: &'static str,
    /// Input field holding (or deriving) the output path
    pub source: &'static str,
    pub desc: &'static str,
}

/// One wrapped external operation
#[derive(Debug)]
pub struct CommandSpec {
    /// Registry name, e.g. `cifti-dilate`
    pub name: &'static str,
    /// Fixed prefix: program followed by its subcommand tokens
    pub prefix: &'static str,
    pub inputs: &'static [FieldSpec],
    pub outputs: &'static [OutputSpec],
    pub desc: &'static str,
}

impl CommandSpec {
    /// Look up an input field by name
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.inputs.iter().find(|f| f.name == name)
    }

    /// Executable named by the prefix
    pub fn program(&self) -> &'static str {
        self.prefix.split_whitespace().next().unwrap_or(self.prefix)
    }

    /// Prefix tokens after the program
    pub fn prefix_args(&self) -> impl Iterator<Item = &'static str> {
        self.prefix.split_whitespace().skip(1)
    }

    /// Positioned fields in ascending position order
    pub fn render_order(&self) -> Vec<&'static FieldSpec> {
        let mut fields: Vec<&'static FieldSpec> =
            self.inputs.iter().filter(|f| f.position.is_some()).collect();
        fields.sort_by_key(|f| f.position);
        fields
    }

    /// Check the table for authoring errors.
    ///
    /// Positions must be unique, templates must parse with the slot count
    /// their kind needs, and every cross-reference (companions, fallbacks,
    /// naming sources, outputs) must name a declared field. Unpositioned
    /// fields must be read by some fallback flag.
    pub fn check(&self) -> Result<(), WbError> {
        let fail = |details: String| Err(WbError::definition(self.name, details));

        if self.prefix.split_whitespace().next().is_none() {
            return fail("empty command prefix".into());
        }

        let mut names = BTreeSet::new();
        let mut positions = BTreeSet::new();
        for field in self.inputs {
            if !names.insert(field.name) {
                return fail(format!("field '{}' declared twice", field.name));
            }
            if let Some(pos) = field.position {
                if !positions.insert(pos) {
                    return fail(format!("position {} used by more than one field", pos));
                }
            }
        }

        for field in self.inputs {
            if let Some(argstr) = field.kind.argstr() {
                let template = arg_template(self.name, argstr)?;
                if template.slots() != field.kind.expected_slots() {
                    return fail(format!(
                        "template '{}' of '{}' has {} slots, expected {}",
                        argstr,
                        field.name,
                        template.slots(),
                        field.kind.expected_slots()
                    ));
                }
            }

            for required in field.requires {
                if !names.contains(required) {
                    return fail(format!(
                        "'{}' requires undeclared field '{}'",
                        field.name, required
                    ));
                }
            }

            if let FieldKind::Choice { choices, .. } = field.kind {
                if choices.is_empty() {
                    return fail(format!("choice field '{}' has no values", field.name));
                }
                if let DefaultPolicy::Literal(Literal::Text(default)) = field.default {
                    if !choices.contains(&default) {
                        return fail(format!(
                            "default '{}' of '{}' is not an allowed value",
                            default, field.name
                        ));
                    }
                }
            }

            if let FieldKind::FallbackFlag { paths, .. } = field.kind {
                for fallback in paths {
                    for referenced in [fallback.field, fallback.otherwise] {
                        if !names.contains(referenced) {
                            return fail(format!(
                                "'{}' falls back to undeclared field '{}'",
                                field.name, referenced
                            ));
                        }
                    }
                }
            }

            if let DefaultPolicy::Derived(naming) = field.default {
                if !names.contains(naming.source) {
                    return fail(format!(
                        "'{}' derives its name from undeclared field '{}'",
                        field.name, naming.source
                    ));
                }
                if let Some(template) = naming.template {
                    if template.matches("%s").count() != 1 {
                        return fail(format!(
                            "naming template '{}' of '{}' needs exactly one %s",
                            template, field.name
                        ));
                    }
                }
            }

            if field.auxiliary && field.position.is_some() {
                return fail(format!("auxiliary field '{}' cannot have a position", field.name));
            }
            if field.position.is_none()
                && !field.auxiliary
                && !self.is_fallback_source(field.name)
            {
                return fail(format!("'{}' has no position and is never rendered", field.name));
            }
        }

        for output in self.outputs {
            if !names.contains(output.source) {
                return fail(format!(
                    "output '{}' refers to undeclared field '{}'",
                    output.name, output.source
                ));
            }
        }

        Ok(())
    }

    fn is_fallback_source(&self, name: &str) -> bool {
        self.inputs.iter().any(|f| match f.kind {
            FieldKind::FallbackFlag { paths, .. } => paths.iter().any(|p| p.field == name),
            _ => false,
        })
    }
}
