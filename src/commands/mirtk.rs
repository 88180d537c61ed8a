//! MIRTK neonatal cortical surface reconstruction
//!
//! The tool needs a configuration file. When `config` is left unset,
//! [`crate::recon_config`] writes one from the auxiliary image fields before
//! launch (see [`crate::Executor::prepare`]).

use super::{existing, produced};
use crate::spec::{CommandSpec, FieldKind, FieldSpec, Literal, OutputSpec};

const fn flag(flag: &'static str) -> FieldKind {
    FieldKind::Flag { flag }
}

pub static RECON_NEONATAL_CORTEX: CommandSpec = CommandSpec {
    name: "recon-neonatal-cortex",
    prefix: "mirtk recon-neonatal-cortex",
    desc: "Reconstruct neonatal cortical surfaces (MIRTK)",
    inputs: &[
        FieldSpec::new("t1w_file", existing("%s"), "input T1w image").auxiliary(),
        FieldSpec::new("t2w_file", existing("%s"), "input T2w image").auxiliary(),
        FieldSpec::new("mask_file", existing("%s"), "input brain mask").auxiliary(),
        FieldSpec::new("labels_file", existing("%s"), "input labels image").auxiliary(),
        FieldSpec::new("tissues_file", existing("%s"), "input tissues image").auxiliary(),
        FieldSpec::new(
            "output_dir",
            produced("%s"),
            "output directory written into the generated configuration",
        )
        .auxiliary()
        .default_to(Literal::Text("out")),
        FieldSpec::new("brain", flag("--brain"), "create brain mask").at(0),
        FieldSpec::new("cerebrum", flag("--cerebrum"), "create cerebrum mesh").at(1),
        FieldSpec::new(
            "config",
            existing("--config %s"),
            "configuration file with reconstruction parameters",
        )
        .at(2),
        FieldSpec::new("force", flag("--force"), "overwrite existing output files").at(3),
        FieldSpec::new(
            "hindbrain",
            flag("--brainstem-and-cerebellum"),
            "create brainstem and cerebellum mesh",
        )
        .at(4),
        FieldSpec::new(
            "join_internal_mesh",
            flag("--join-with-internal-mesh"),
            "merge white surface with internal mesh",
        )
        .at(5),
        FieldSpec::new(
            "join_tol",
            FieldKind::Float {
                argstr: "--jointol %g",
            },
            "tolerance used when joining surfaces",
        )
        .at(6),
        FieldSpec::new(
            "join_with_hindbrain",
            flag("--join-with-brainstem-and-cerebellum"),
            "merge cerebrum with brainstem and cerebellum mesh",
        )
        .at(7),
        FieldSpec::new(
            "keep_regions_mask",
            flag("--keep-regions-mask"),
            "keep the regions mask after reconstruction",
        )
        .at(8),
        FieldSpec::new("keep_t1w", flag("--keep-t1w-image"), "keep intermediate T1w image").at(9),
        FieldSpec::new("keep_t2w", flag("--keep-t2w-image"), "keep intermediate T2w image").at(10),
        FieldSpec::new("nocheck", flag("--nocheck"), "skip mesh sanity checks").at(11),
        FieldSpec::new("nocut", flag("--nocut"), "do not cut surfaces at the medial plane").at(12),
        FieldSpec::new(
            "num_threads",
            FieldKind::Int {
                argstr: "--threads %d",
            },
            "number of worker threads",
        )
        .at(13),
        FieldSpec::new("pial", flag("--pial"), "reconstruct pial surface").at(14),
        FieldSpec::new(
            "pial_outside_white",
            flag("--ensure-pial-is-outside-white-surface"),
            "push pial surface outside of the white surface",
        )
        .at(15),
        FieldSpec::new("regions_mask", flag("--regions-mask"), "create regions mask").at(16),
        FieldSpec::new(
            "section",
            FieldKind::Text {
                argstr: "--section %s",
            },
            "configuration section to use",
        )
        .at(17),
        FieldSpec::new(
            "sessions",
            FieldKind::FileOrTexts {
                argstr: "--sessions %s",
            },
            "session list file, or session IDs",
        )
        .at(18)
        .mandatory(),
        FieldSpec::new(
            "use_fast_collision",
            flag("-use-fast-collision"),
            "use the fast self-intersection test",
        )
        .at(19),
        FieldSpec::new("white", flag("--white"), "reconstruct white surface").at(20),
        FieldSpec::new(
            "work_dir",
            existing("--work-dir %s"),
            "working directory of the reconstruction",
        )
        .at(21),
    ],
    outputs: &[
        OutputSpec {
            name: "config_file",
            source: "config",
            desc: "configuration file used",
        },
        OutputSpec {
            name: "output_dir",
            source: "output_dir",
            desc: "output directory",
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::Invocation;
    use crate::WbError;

    #[test]
    fn session_ids_expand_after_one_flag() {
        let mut inv = Invocation::new(&RECON_NEONATAL_CORTEX);
        inv.set("sessions", vec!["sub1-ses1", "sub1-ses2"]).unwrap();
        assert_eq!(
            inv.render().unwrap().to_string(),
            "mirtk recon-neonatal-cortex --sessions sub1-ses1 sub1-ses2"
        );
    }

    #[test]
    fn flags_render_in_name_order() {
        let mut inv = Invocation::new(&RECON_NEONATAL_CORTEX);
        inv.set("white", true).unwrap();
        inv.set("pial", true).unwrap();
        inv.set("num_threads", 8).unwrap();
        inv.set("sessions", vec!["sub1-ses1"]).unwrap();
        assert_eq!(
            inv.assemble().unwrap().args,
            vec![
                "recon-neonatal-cortex",
                "--threads",
                "8",
                "--pial",
                "--sessions",
                "sub1-ses1",
                "--white",
            ]
        );
    }

    #[test]
    fn sessions_are_mandatory() {
        let inv = Invocation::new(&RECON_NEONATAL_CORTEX);
        assert!(matches!(
            inv.validate().unwrap_err(),
            WbError::MissingField { ref field, .. } if field == "sessions"
        ));
    }

    #[test]
    fn image_inputs_never_render() {
        let dir = tempfile::tempdir().unwrap();
        let t1w = dir.path().join("T1w.nii.gz");
        std::fs::write(&t1w, b"").unwrap();
        let mut inv = Invocation::new(&RECON_NEONATAL_CORTEX);
        inv.set("sessions", vec!["sub1-ses1"]).unwrap();
        inv.set("t1w_file", t1w.to_string_lossy().into_owned()).unwrap();
        inv.validate().unwrap();
        assert_eq!(
            inv.assemble().unwrap().to_string(),
            "mirtk recon-neonatal-cortex --sessions sub1-ses1"
        );
    }

    #[test]
    fn session_file_must_exist() {
        let mut inv = Invocation::new(&RECON_NEONATAL_CORTEX);
        inv.set("sessions", "/no/such/sessions.csv").unwrap();
        assert!(matches!(
            inv.validate().unwrap_err(),
            WbError::NotFound { .. }
        ));
    }
}
