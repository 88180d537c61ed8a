//! CIFTI construction and dilation

use super::{existing, out_file, produced, SERIES_UNITS};
use crate::spec::{CommandSpec, FieldKind, FieldSpec, Literal};

/// Build a dscalar, dtseries or dlabel file in the brainordinate space of a
/// template CIFTI file. Structures not covered by an input are zero-filled.
pub static CIFTI_CREATE_DENSE_FROM_TEMPLATE: CommandSpec = CommandSpec {
    name: "cifti-create-dense-from-template",
    prefix: "wb_command -cifti-create-dense-from-template",
    desc: "Create a CIFTI file matching the brainordinates of a template",
    inputs: &[
        FieldSpec::new("in_file", existing("%s"), "file to match brainordinates of")
            .at(0)
            .mandatory(),
        FieldSpec::new("out_file", produced("%s"), "the output CIFTI file")
            .at(1)
            .derived_from("in_file", None, false),
        FieldSpec::new(
            "series",
            FieldKind::Flag { flag: "-series" },
            "make a dtseries file instead of a dscalar",
        )
        .at(2),
        FieldSpec::new(
            "series_step",
            FieldKind::Float { argstr: "%.1f" },
            "increment between series points",
        )
        .at(3)
        .requires(&["series"]),
        FieldSpec::new(
            "series_start",
            FieldKind::Float { argstr: "%.1f" },
            "start value of the series",
        )
        .at(4)
        .requires(&["series"]),
        FieldSpec::new(
            "series_unit",
            FieldKind::Choice {
                argstr: "-unit %s",
                choices: SERIES_UNITS,
            },
            "unit for the series (tool default SECOND); wb_command accepts -unit only with -series, so series is required",
        )
        .at(5)
        .requires(&["series"]),
        FieldSpec::new(
            "volume_all",
            existing("-volume-all %s"),
            "volume file for all voxel data",
        )
        .at(6),
        FieldSpec::new(
            "volume_all_from_cropped",
            FieldKind::Flag {
                flag: "-from-cropped",
            },
            "volume_all is cropped to the voxel data of the template",
        )
        .at(7)
        .requires(&["volume_all"]),
        FieldSpec::new(
            "label_collision",
            FieldKind::Choice {
                argstr: "-label-collision %s",
                choices: &["ERROR", "SURFACES_FIRST", "LEGACY"],
            },
            "how to resolve label key conflicts; LEGACY matches v1.4.2 and earlier",
        )
        .at(8),
        FieldSpec::new(
            "cifti",
            FieldKind::Files {
                argstr: "-cifti %s",
                exists: true,
            },
            "CIFTI files to take data from",
        )
        .at(9),
        FieldSpec::new(
            "metric",
            FieldKind::StructureGroups {
                group: "-metric",
                modifier: None,
            },
            "[STRUCTURE, metric file] pairs",
        )
        .at(10),
        FieldSpec::new(
            "label",
            FieldKind::StructureGroups {
                group: "-label",
                modifier: None,
            },
            "[STRUCTURE, surface label file] pairs",
        )
        .at(11),
        FieldSpec::new(
            "volume",
            FieldKind::StructureGroups {
                group: "-volume",
                modifier: Some("-from-cropped"),
            },
            "[STRUCTURE, volume file, from_cropped?] entries, one per volume structure",
        )
        .at(12),
    ],
    outputs: &[out_file("the output CIFTI file")],
};

/// Assemble a dense timeseries from a volume plus optional surface metrics.
pub static CIFTI_CREATE_DENSE_TIMESERIES: CommandSpec = CommandSpec {
    name: "cifti-create-dense-timeseries",
    prefix: "wb_command -cifti-create-dense-timeseries",
    desc: "Create a CIFTI dense timeseries",
    inputs: &[
        FieldSpec::new("out_file", produced("%s"), "the output CIFTI file")
            .at(0)
            .derived_from("in_file", Some("%s.dtseries.nii"), false),
        FieldSpec::new(
            "in_file",
            existing("-volume %s"),
            "volume file containing all voxel data for all volume structures",
        )
        .at(1)
        .mandatory(),
        FieldSpec::new(
            "structure_label_volume",
            existing("%s"),
            "label volume whose label names identify CIFTI structures",
        )
        .at(2)
        .mandatory(),
        FieldSpec::new(
            "left_metric",
            existing("-left-metric %s"),
            "metric file for the left surface",
        )
        .at(3),
        FieldSpec::new(
            "roi_left",
            existing("-roi-left %s"),
            "ROI of left surface vertices to use",
        )
        .at(4)
        .requires(&["left_metric"]),
        FieldSpec::new(
            "right_metric",
            existing("-right-metric %s"),
            "metric file for the right surface",
        )
        .at(5),
        FieldSpec::new(
            "roi_right",
            existing("-roi-right %s"),
            "ROI of right surface vertices to use",
        )
        .at(6)
        .requires(&["right_metric"]),
        FieldSpec::new(
            "cerebellum_metric",
            existing("-cerebellum-metric %s"),
            "metric file for the cerebellum",
        )
        .at(7),
        FieldSpec::new(
            "roi_cerebellum",
            existing("-roi-cerebellum %s"),
            "ROI of cerebellum vertices to use",
        )
        .at(8)
        .requires(&["cerebellum_metric"]),
        FieldSpec::new(
            "timestart",
            FieldKind::Float {
                argstr: "-timestart %g",
            },
            "time of the first frame, in seconds",
        )
        .at(9)
        .default_to(Literal::Float(0.0)),
        FieldSpec::new(
            "timestep",
            FieldKind::Float {
                argstr: "-timestep %g",
            },
            "the timestep, in seconds",
        )
        .at(10)
        .default_to(Literal::Float(1.0)),
        FieldSpec::new(
            "unit",
            FieldKind::Choice {
                argstr: "-unit %s",
                choices: SERIES_UNITS,
            },
            "use a unit other than time",
        )
        .at(11)
        .default_to(Literal::Text("SECOND")),
    ],
    outputs: &[out_file("CIFTI dense timeseries file")],
};

/// Replace bad values with nearby good ones on surfaces and in the volume.
///
/// Bad values are zeros, or positive locations of `bad_brainordinate_roi`
/// when given.
pub static CIFTI_DILATE: CommandSpec = CommandSpec {
    name: "cifti-dilate",
    prefix: "wb_command -cifti-dilate",
    desc: "Dilate a CIFTI file",
    inputs: &[
        FieldSpec::new("in_file", existing("%s"), "the input CIFTI file")
            .at(0)
            .mandatory(),
        FieldSpec::new(
            "direction",
            FieldKind::Choice {
                argstr: "%s",
                choices: &["ROW", "COLUMN"],
            },
            "dimension to dilate along",
        )
        .at(1)
        .mandatory(),
        FieldSpec::new(
            "surface_distance",
            FieldKind::Int { argstr: "%d" },
            "distance to dilate on surfaces, in mm",
        )
        .at(2)
        .mandatory(),
        FieldSpec::new(
            "volume_distance",
            FieldKind::Int { argstr: "%d" },
            "distance to dilate in the volume, in mm",
        )
        .at(3)
        .mandatory(),
        FieldSpec::new("out_file", produced("%s"), "the dilated CIFTI file")
            .at(4)
            .derived_from("in_file", Some("dilated_%s.nii"), true),
        FieldSpec::new(
            "left_surface",
            existing("-left-surface %s"),
            "left surface to use",
        )
        .at(5),
        FieldSpec::new(
            "left_corrected_areas",
            existing("-left-corrected-areas %s"),
            "vertex areas to use instead of computing them from the left surface",
        )
        .at(6)
        .requires(&["left_surface"]),
        FieldSpec::new(
            "right_surface",
            existing("-right-surface %s"),
            "right surface to use",
        )
        .at(7),
        FieldSpec::new(
            "right_corrected_areas",
            existing("-right-corrected-areas %s"),
            "vertex areas to use instead of computing them from the right surface",
        )
        .at(8)
        .requires(&["right_surface"]),
        FieldSpec::new(
            "cerebellum_surface",
            existing("-cerebellum-surface %s"),
            "cerebellum surface to use",
        )
        .at(9),
        FieldSpec::new(
            "cerebellum_corrected_areas",
            existing("-cerebellum-corrected-areas %s"),
            "vertex areas to use instead of computing them from the cerebellum surface",
        )
        .at(10)
        .requires(&["cerebellum_surface"]),
        FieldSpec::new(
            "bad_brainordinate_roi",
            existing("-bad-brainordinate-roi %s"),
            "dscalar or dtseries whose positive values mark brainordinates to replace",
        )
        .at(11),
        FieldSpec::new(
            "nearest",
            FieldKind::Flag { flag: "-nearest" },
            "use the nearest good value instead of a weighted average",
        )
        .at(12),
        FieldSpec::new(
            "merged_volume",
            FieldKind::Flag {
                flag: "-merged-volume",
            },
            "treat volume components as a single component",
        )
        .at(13),
        FieldSpec::new(
            "legacy_mode",
            FieldKind::Flag {
                flag: "-legacy-mode",
            },
            "use the weighted dilation math of v1.3.2 and earlier",
        )
        .at(14),
    ],
    outputs: &[out_file("dilated CIFTI file")],
};
