//! Volume resampling and label handling

use super::{existing, out_file, produced};
use crate::spec::{CommandSpec, Fallback, FieldKind, FieldSpec, Literal};

/// Resample a volume with an affine transform.
///
/// When the affine came from FLIRT, the tool needs the source and target
/// volumes FLIRT saw; they default to `in_file` and `volume_space`.
pub static VOLUME_AFFINE_RESAMPLE: CommandSpec = CommandSpec {
    name: "volume-affine-resample",
    prefix: "wb_command -volume-resample",
    desc: "Resample a volume file with an affine transformation",
    inputs: &[
        FieldSpec::new("in_file", existing("%s"), "volume to resample")
            .at(0)
            .mandatory(),
        FieldSpec::new(
            "volume_space",
            existing("%s"),
            "a volume in the space wanted for the output",
        )
        .at(1)
        .mandatory(),
        FieldSpec::new(
            "method",
            FieldKind::Choice {
                argstr: "%s",
                choices: &["CUBIC", "ENCLOSING_VOXEL", "TRILINEAR"],
            },
            "resampling method: CUBIC for most data, ENCLOSING_VOXEL for labels",
        )
        .at(2)
        .mandatory(),
        FieldSpec::new("out_file", produced("%s"), "the output volume")
            .at(3)
            .derived_from("in_file", Some("resampled_%s.nii.gz"), true),
        FieldSpec::new("affine", existing("-affine %s"), "the affine file to apply")
            .at(4)
            .mandatory(),
        FieldSpec::new(
            "flirt",
            FieldKind::FallbackFlag {
                argstr: "-flirt %s %s",
                paths: [
                    Fallback {
                        field: "flirt_source_volume",
                        otherwise: "in_file",
                    },
                    Fallback {
                        field: "flirt_target_volume",
                        otherwise: "volume_space",
                    },
                ],
            },
            "the affine is a FLIRT affine",
        )
        .at(5),
        FieldSpec::new(
            "flirt_source_volume",
            existing("%s"),
            "source volume used to generate the affine; defaults to in_file",
        )
        .requires(&["flirt"]),
        FieldSpec::new(
            "flirt_target_volume",
            existing("%s"),
            "target volume used to generate the affine; defaults to volume_space",
        )
        .requires(&["flirt"]),
    ],
    outputs: &[out_file("the output volume")],
};

/// One ROI frame per label of the chosen label map.
pub static VOLUME_ALL_LABELS_TO_ROIS: CommandSpec = CommandSpec {
    name: "volume-all-labels-to-rois",
    prefix: "wb_command -volume-all-labels-to-rois",
    desc: "Make ROIs from all labels in a volume frame",
    inputs: &[
        FieldSpec::new("in_file", existing("%s"), "the input volume label file")
            .at(0)
            .mandatory(),
        FieldSpec::new(
            "label_map",
            FieldKind::IntOrText { argstr: "%s" },
            "number or name of the label map to use",
        )
        .at(1)
        .mandatory(),
        FieldSpec::new("out_file", produced("%s"), "the output volume")
            .at(2)
            .derived_from("in_file", Some("%s_rois.nii.gz"), false),
    ],
    outputs: &[out_file("the output volume")],
};

/// Write a volume's label table in the text format `-volume-label-import`
/// reads.
pub static VOLUME_LABEL_EXPORT_TABLE: CommandSpec = CommandSpec {
    name: "volume-label-export-table",
    prefix: "wb_command -volume-label-export-table",
    desc: "Export label table from volume as text",
    inputs: &[
        FieldSpec::new("in_file", existing("%s"), "the input volume label file")
            .at(0)
            .mandatory(),
        FieldSpec::new(
            "label_map",
            FieldKind::IntOrText { argstr: "%s" },
            "number or name of the label map to use",
        )
        .at(1)
        .mandatory(),
        FieldSpec::new("out_file", produced("%s"), "the output text file")
            .at(2)
            .derived_from("in_file", Some("%s_labels.txt"), false),
    ],
    outputs: &[out_file("the output text file")],
};

/// Turn an integer-valued volume into a Workbench label volume.
///
/// The label list file holds two lines per label: the name, then
/// `<key> <red> <green> <blue> <alpha>`.
pub static VOLUME_LABEL_IMPORT: CommandSpec = CommandSpec {
    name: "volume-label-import",
    prefix: "wb_command -volume-label-import",
    desc: "Import a label volume to workbench format",
    inputs: &[
        FieldSpec::new("in_file", existing("%s"), "the input volume file")
            .at(0)
            .mandatory(),
        FieldSpec::new(
            "label_list_file",
            existing("%s"),
            "text file containing the values and names for labels",
        )
        .at(1)
        .mandatory(),
        FieldSpec::new("out_file", produced("%s"), "the output workbench label volume")
            .at(2)
            .derived_from("in_file", Some("%s_labels.nii.gz"), false),
        FieldSpec::new(
            "discard_others",
            FieldKind::Flag {
                flag: "-discard-others",
            },
            "set voxels with values not in the label list to the unlabeled key",
        )
        .at(3),
        FieldSpec::new(
            "drop_unused_labels",
            FieldKind::Flag {
                flag: "-drop-unused-labels",
            },
            "remove unused label values from the label table",
        )
        .at(4),
        FieldSpec::new(
            "subvolume",
            FieldKind::IntOrText {
                argstr: "-subvolume %s",
            },
            "import a single subvolume (number or name)",
        )
        .at(5),
        FieldSpec::new(
            "unlabeled_values",
            FieldKind::Int {
                argstr: "-unlabeled-value %d",
            },
            "the value interpreted as unlabeled",
        )
        .at(6)
        .default_to(Literal::Int(0)),
    ],
    outputs: &[out_file("the output workbench label volume")],
};
