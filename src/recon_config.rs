//! Configuration file for `mirtk recon-neonatal-cortex`
//!
//! The reconstruction reads its directory layout, input images and label
//! ranges from an INI file. [`prepare`] writes one into the working
//! directory when the caller did not supply `config`, creating the output and
//! work directories it names. Rendering never touches the filesystem; this
//! is the only step that does, and it runs before launch.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;
use tracing::debug;

use crate::error::WbError;
use crate::invocation::{resolve, Invocation};

/// Name of the generated file, written in the working directory
pub const CONFIG_FILE_NAME: &str = "recon-neonatal-cortex.ini";

pub const SECTION: &str = "recon-neonatal-cortex";
pub const WHITE_MODEL_SECTION: &str = "recon-neonatal-cortex white_model";
pub const PIAL_MODEL_SECTION: &str = "recon-neonatal-cortex pial_model";

/// Auxiliary field to configuration key
const IMAGE_KEYS: &[(&str, &str)] = &[
    ("t1w_file", "input_t1w_image"),
    ("t2w_file", "input_t2w_image"),
    ("mask_file", "input_brain_mask"),
    ("labels_file", "input_labels_image"),
    ("tissues_file", "input_tissues_image"),
];

/// Label ranges and derived paths (`%(name)s` is expanded by MIRTK's reader)
const RECON_OPTIONS: &[(&str, &str)] = &[
    ("fill_wm_holes", "False"),
    ("white_matter_labels", "51..82"),
    ("gray_matter_labels", "5..16,20..39"),
    ("deep_gray_matter_labels", "1..4,40..47,85..87"),
    ("lateral_ventricles_labels", "49,50"),
    ("corpus_callosum_labels", "48"),
    ("inter_hemisphere_labels", "40..47,85..87"),
    ("brainstem_labels", "19"),
    ("cerebellum_labels", "17,18"),
    ("subcortex_closing", "10"),
    ("brainstem_closing", "10"),
    ("cerebellum_closing", "10"),
    ("regions_mask", "%(out_dir)s/recon/regions.nii.gz"),
    ("cortical_hull_dmap", "%(out_dir)s/recon/cortical-hull-dmap.nii.gz"),
    ("t1w_image", "%(temp_dir)s/t1w-image.nii.gz"),
    ("t2w_image", "%(temp_dir)s/t2w-image.nii.gz"),
    ("brain_mask", "%(temp_dir)s/brain-mask.nii.gz"),
    ("white_matter_mask", "%(temp_dir)s/white-matter-mask.nii.gz"),
    ("gray_matter_mask", "%(temp_dir)s/gray-matter-mask.nii.gz"),
    ("deep_gray_matter_mask", "%(temp_dir)s/deep-gray-matter-mask.nii.gz"),
    ("corpus_callosum_mask", "%(temp_dir)s/corpus-callosum-mask.nii.gz"),
    ("ventricles_mask", "%(temp_dir)s/ventricles-mask.nii.gz"),
    ("ventricles_dmap", "%(temp_dir)s/ventricles-dmap.nii.gz"),
    ("brain_mesh", "%(mesh_dir)s/brain.vtp"),
    ("bs_cb_mesh", "%(mesh_dir)s/brainstem+cerebellum.vtp"),
    ("internal_mesh", "%(mesh_dir)s/internal.vtp"),
    ("cerebrum_mesh", "%(temp_dir)s/cerebrum.vtp"),
    ("right_cerebrum_mesh", "%(temp_dir)s/cerebrum-rh.vtp"),
    ("left_cerebrum_mesh", "%(temp_dir)s/cerebrum-lh.vtp"),
    ("white_mesh", "%(mesh_dir)s/white.vtp"),
    ("right_white_mesh", "%(mesh_dir)s/white-rh.vtp"),
    ("left_white_mesh", "%(mesh_dir)s/white-lh.vtp"),
    ("pial_mesh", "%(mesh_dir)s/pial.vtp"),
    ("right_pial_mesh", "%(mesh_dir)s/pial-rh.vtp"),
    ("left_pial_mesh", "%(mesh_dir)s/pial-lh.vtp"),
];

/// Directory layout and input images of one reconstruction
#[derive(Debug, Clone, PartialEq)]
pub struct ReconConfig {
    pub out_dir: PathBuf,
    pub work_dir: PathBuf,
    /// Configuration key (`input_t1w_image`, ...) to absolute image path
    pub images: BTreeMap<&'static str, PathBuf>,
}

impl ReconConfig {
    /// Collect directories and images from an invocation.
    ///
    /// Paths are made absolute against `base`; the work directory defaults
    /// to `<base>/work` when `work_dir` is unset.
    pub fn from_invocation(invocation: &Invocation, base: &Path) -> Result<Self, WbError> {
        let base = base.canonicalize()?;
        let out_dir = resolve(&base, &text(invocation, "output_dir").unwrap_or_else(|| "out".into()));
        let work_dir = match text(invocation, "work_dir") {
            Some(dir) => resolve(&base, &dir),
            None => base.join("work"),
        };
        let images = IMAGE_KEYS
            .iter()
            .filter_map(|&(field, key)| Some((key, resolve(&base, &text(invocation, field)?))))
            .collect();

        Ok(Self {
            out_dir,
            work_dir,
            images,
        })
    }

    pub fn to_ini(&self) -> Ini {
        let mut conf = Ini::new();
        {
            let mut section = conf.with_section(Some(SECTION));
            section
                .set("out_dir", self.out_dir.display().to_string())
                .set("mesh_dir", self.out_dir.join("meshes").display().to_string())
                .set("temp_dir", self.work_dir.join("tmp").display().to_string())
                .set("logs_dir", self.out_dir.join("logs").display().to_string())
                .set("work_dir", self.work_dir.display().to_string())
                .set("tissueseg_dir", "%(work_dir)s/TissueSeg")
                .set("tissuesegmcribs_dir", "%(work_dir)s/TissueSegMCRIBS");
            for (key, path) in &self.images {
                section.set(*key, path.display().to_string());
            }
            for &(key, value) in RECON_OPTIONS {
                section.set(key, value);
            }
        }
        conf.with_section(Some(WHITE_MODEL_SECTION)).set("distance", "1");
        conf.with_section(Some(PIAL_MODEL_SECTION)).set("distance", "1");
        conf
    }

    /// Create the output and work directories and write the file into
    /// `base`, returning its absolute path.
    pub fn write(&self, base: &Path) -> Result<PathBuf, WbError> {
        fs::create_dir_all(&self.out_dir)?;
        fs::create_dir_all(&self.work_dir)?;
        let path = base.canonicalize()?.join(CONFIG_FILE_NAME);
        self.to_ini().write_to_file(&path)?;
        debug!(path = %path.display(), images = self.images.len(), "wrote reconstruction config");
        Ok(path)
    }
}

/// Write a configuration and point `config` at it, unless the caller set one.
pub fn prepare(invocation: &mut Invocation, base: &Path) -> Result<Option<PathBuf>, WbError> {
    if invocation.is_set("config") {
        return Ok(None);
    }
    let path = ReconConfig::from_invocation(invocation, base)?.write(base)?;
    invocation.set("config", path.display().to_string())?;
    Ok(Some(path))
}

fn text(invocation: &Invocation, field: &str) -> Option<String> {
    invocation
        .effective(field)?
        .as_text()
        .map(str::to_string)
}
