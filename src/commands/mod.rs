//! Built-in command tables
//!
//! Workbench (`wb_command`) operations live in [`cifti`] and [`volume`];
//! [`mirtk`] wraps MIRTK's neonatal cortex reconstruction.

pub mod cifti;
pub mod mirtk;
pub mod volume;

pub use cifti::{CIFTI_CREATE_DENSE_FROM_TEMPLATE, CIFTI_CREATE_DENSE_TIMESERIES, CIFTI_DILATE};
pub use mirtk::RECON_NEONATAL_CORTEX;
pub use volume::{
    VOLUME_AFFINE_RESAMPLE, VOLUME_ALL_LABELS_TO_ROIS, VOLUME_LABEL_EXPORT_TABLE,
    VOLUME_LABEL_IMPORT,
};

use crate::spec::{CommandSpec, FieldKind, OutputSpec};

/// Every built-in command, in registry order
pub static BUILTIN: &[&CommandSpec] = &[
    &CIFTI_CREATE_DENSE_FROM_TEMPLATE,
    &CIFTI_CREATE_DENSE_TIMESERIES,
    &CIFTI_DILATE,
    &VOLUME_AFFINE_RESAMPLE,
    &VOLUME_ALL_LABELS_TO_ROIS,
    &VOLUME_LABEL_EXPORT_TABLE,
    &VOLUME_LABEL_IMPORT,
    &RECON_NEONATAL_CORTEX,
];

/// Units accepted for series axes
pub(crate) const SERIES_UNITS: &[&str] = &["SECOND", "HERTZ", "METER", "RADIAN"];

/// An input file that must already exist
pub(crate) const fn existing(argstr: &'static str) -> FieldKind {
    FieldKind::File {
        argstr,
        exists: true,
    }
}

/// A file the tool writes
pub(crate) const fn produced(argstr: &'static str) -> FieldKind {
    FieldKind::File {
        argstr,
        exists: false,
    }
}

/// The single `out_file` output most Workbench commands declare
pub(crate) const fn out_file(desc: &'static str) -> OutputSpec {
    OutputSpec {
        name: "out_file",
        source: "out_file",
        desc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_pass_their_checks() {
        for spec in BUILTIN {
            spec.check()
                .unwrap_or_else(|e| panic!("{} failed its check: {}", spec.name, e));
        }
    }

    #[test]
    fn positions_are_strictly_ascending() {
        for spec in BUILTIN {
            let positions: Vec<u16> = spec
                .render_order()
                .iter()
                .filter_map(|f| f.position)
                .collect();
            assert!(
                positions.windows(2).all(|w| w[0] < w[1]),
                "{} positions not strictly ascending: {:?}",
                spec.name,
                positions
            );
        }
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = BUILTIN.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN.len());
    }
}
