//! wbwrap - declarative wrappers for Connectome Workbench commands
//!
//! Each wrapped operation is a static [`CommandSpec`] table. An
//! [`Invocation`] assigns values to a table's fields, validates them and
//! renders the exact argument list; the [`Executor`] runs it and checks the
//! promised outputs.

pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod invocation;
pub mod job;
pub mod recon_config;
pub mod registry;
pub mod render;
pub mod spec;
pub mod structure;
pub mod template;
pub mod value;

pub use config::ToolConfig;
pub use error::{ErrorKind, FixSuggestion, WbError};
pub use executor::{Executor, Outputs};
pub use invocation::Invocation;
pub use job::Job;
pub use registry::Registry;
pub use render::RenderedCommand;
pub use spec::{CommandSpec, FieldKind, FieldSpec, OutputSpec};
pub use structure::BRAIN_STRUCTURES;
pub use value::Value;
