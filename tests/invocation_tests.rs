//! End-to-end tests: invocation -> validation -> process -> outputs
//!
//! Tools are stood in for by system binaries and small shell scripts
//! written at test time.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use wbwrap::commands::{CIFTI_CREATE_DENSE_TIMESERIES, CIFTI_DILATE, RECON_NEONATAL_CORTEX};
use wbwrap::{ErrorKind, Executor, Invocation, Job, Registry, Value, WbError};

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"").unwrap();
    path
}

#[cfg(unix)]
fn script(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

fn dilate(dir: &Path) -> Invocation {
    touch(dir, "sub-01.dtseries.nii");
    let mut inv = Invocation::new(&CIFTI_DILATE);
    inv.set("in_file", "sub-01.dtseries.nii").unwrap();
    inv.set("direction", "COLUMN").unwrap();
    inv.set("surface_distance", 10).unwrap();
    inv.set("volume_distance", 10).unwrap();
    inv
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn dilate_renders_in_position_order() {
    let dir = TempDir::new().unwrap();
    let mut inv = dilate(dir.path());
    inv.set("nearest", true).unwrap();
    let cmd = Executor::new()
        .with_working_dir(dir.path())
        .command(&inv)
        .unwrap();
    assert_eq!(
        cmd.to_string(),
        "wb_command -cifti-dilate sub-01.dtseries.nii COLUMN 10 10 \
         dilated_sub-01.dtseries.nii -nearest"
    );
}

#[test]
fn rendering_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let inv = dilate(dir.path());
    let executor = Executor::new().with_working_dir(dir.path());
    let first = executor.command(&inv).unwrap();
    for _ in 0..10 {
        assert_eq!(executor.command(&inv).unwrap(), first);
    }
}

#[test]
fn job_file_matches_programmatic_invocation() {
    let dir = TempDir::new().unwrap();
    let programmatic = dilate(dir.path()).assemble().unwrap();
    let job = Job::from_yaml(
        "command: cifti-dilate\n\
         inputs:\n  \
           in_file: sub-01.dtseries.nii\n  \
           direction: COLUMN\n  \
           surface_distance: 10\n  \
           volume_distance: 10\n",
    )
    .unwrap();
    let registry = Registry::builtin().unwrap();
    let from_job = job.into_invocation(&registry).unwrap().assemble().unwrap();
    assert_eq!(from_job, programmatic);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn companion_failure_is_independent_of_other_fields() {
    let dir = TempDir::new().unwrap();
    let base = |extra: &[(&str, Value)]| {
        touch(dir.path(), "func.nii");
        touch(dir.path(), "atlas.nii");
        touch(dir.path(), "lh.roi.shape.gii");
        let mut inv = Invocation::new(&CIFTI_CREATE_DENSE_TIMESERIES);
        inv.set("in_file", "func.nii").unwrap();
        inv.set("structure_label_volume", "atlas.nii").unwrap();
        inv.set("roi_left", "lh.roi.shape.gii").unwrap();
        for (name, value) in extra {
            inv.set(name, value.clone()).unwrap();
        }
        Executor::new()
            .with_working_dir(dir.path())
            .command(&inv)
            .unwrap_err()
            .to_string()
    };

    let expected = base(&[]);
    assert!(expected.contains("roi_left"));
    assert!(expected.contains("left_metric"));
    assert_eq!(base(&[("timestep", Value::Float(0.72))]), expected);
    assert_eq!(base(&[("unit", Value::from("HERTZ"))]), expected);
    assert_eq!(
        base(&[
            ("timestart", Value::Float(2.0)),
            ("out_file", Value::from("custom.dtseries.nii")),
        ]),
        expected
    );
}

#[test]
fn omitted_mandatory_field_is_named() {
    let dir = TempDir::new().unwrap();
    let mut inv = dilate(dir.path());
    inv.unset("surface_distance");
    let err = Executor::new()
        .with_working_dir(dir.path())
        .run(&inv)
        .unwrap_err();
    assert!(matches!(err, WbError::MissingField { ref field, .. } if field == "surface_distance"));
}

#[test]
fn missing_input_is_not_found() {
    let dir = TempDir::new().unwrap();
    let mut inv = dilate(dir.path());
    inv.set("in_file", "sub-02.dtseries.nii").unwrap();
    let err = Executor::new()
        .with_working_dir(dir.path())
        .run(&inv)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ============================================================================
// Execution (unix only: stand-in tools)
// ============================================================================

#[cfg(unix)]
#[test]
fn invalid_structure_never_reaches_the_tool() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("ran");
    let tool = script(
        dir.path(),
        "wb_command",
        &format!("touch '{}'", marker.display()),
    );
    let job = Job::from_yaml(
        "command: cifti-create-dense-from-template\n\
         inputs:\n  \
           in_file: func.dtseries.nii\n  \
           volume:\n    - [CORTEX_MIDDLE, functional.nii]\n",
    )
    .unwrap();
    let registry = Registry::builtin().unwrap();
    let err = job.into_invocation(&registry).unwrap_err();
    assert!(err.is_validation());

    // A structurally valid but incomplete invocation also stops before launch
    let inv = Invocation::new(registry.get("cifti-create-dense-from-template").unwrap());
    let err = Executor::new()
        .with_working_dir(dir.path())
        .with_program("wb_command", tool)
        .run(&inv)
        .unwrap_err();
    assert!(err.is_validation());
    assert!(!marker.exists());
}

#[cfg(unix)]
#[test]
fn successful_tool_without_output_fails_postcondition() {
    let dir = TempDir::new().unwrap();
    let inv = dilate(dir.path());
    let err = Executor::new()
        .with_working_dir(dir.path())
        .with_program("wb_command", "true")
        .run(&inv)
        .unwrap_err();
    match err {
        WbError::Postcondition { output, path } => {
            assert_eq!(output, "out_file");
            assert!(path.ends_with("dilated_sub-01.dtseries.nii"));
        }
        other => panic!("expected postcondition failure, got {other}"),
    }
}

#[cfg(unix)]
#[test]
fn nonzero_exit_is_execution_error_with_diagnostics() {
    let dir = TempDir::new().unwrap();
    let tool = script(
        dir.path(),
        "wb_command",
        "echo 'ERROR: dilation failed' >&2\nexit 3",
    );
    let inv = dilate(dir.path());
    let err = Executor::new()
        .with_working_dir(dir.path())
        .with_program("wb_command", tool)
        .run(&inv)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
    let message = err.to_string();
    assert!(message.contains("exit code 3"), "{message}");
    assert!(message.contains("dilation failed"), "{message}");
}

#[cfg(unix)]
#[test]
fn tool_that_writes_output_succeeds() {
    let dir = TempDir::new().unwrap();
    // $6 is the output path: -cifti-dilate in dir sd vd out
    let tool = script(dir.path(), "wb_command", "echo dilating\ntouch \"$6\"");
    let inv = dilate(dir.path());
    let outputs = Executor::new()
        .with_working_dir(dir.path())
        .with_program("wb_command", tool)
        .run(&inv)
        .unwrap();
    let out = outputs.get("out_file").unwrap();
    assert!(out.ends_with("dilated_sub-01.dtseries.nii"));
    assert!(out.exists());
    assert_eq!(outputs.stdout.trim(), "dilating");
}

#[cfg(unix)]
#[test]
fn slow_tool_is_killed_after_timeout() {
    let dir = TempDir::new().unwrap();
    let tool = script(dir.path(), "wb_command", "exec sleep 10");
    let inv = dilate(dir.path());
    let err = Executor::new()
        .with_working_dir(dir.path())
        .with_program("wb_command", tool)
        .with_timeout(Some(Duration::from_millis(200)))
        .run(&inv)
        .unwrap_err();
    assert!(matches!(err, WbError::Timeout { .. }));
}

#[cfg(unix)]
#[test]
fn background_process_holding_pipes_does_not_outlive_timeout() {
    let dir = TempDir::new().unwrap();
    // The tool exits at once but leaves a child attached to stdout/stderr
    let tool = script(dir.path(), "wb_command", "sleep 4 &\nexit 0");
    let inv = dilate(dir.path());
    let started = Instant::now();
    let err = Executor::new()
        .with_working_dir(dir.path())
        .with_program("wb_command", tool)
        .with_timeout(Some(Duration::from_millis(300)))
        .run(&inv)
        .unwrap_err();
    let elapsed = started.elapsed();
    assert!(matches!(err, WbError::Timeout { .. }), "unexpected error: {err}");
    assert!(elapsed < Duration::from_secs(2), "run took {elapsed:?}");
    assert!(err.to_string().contains("300ms"));
}

#[cfg(unix)]
#[test]
fn reconstruction_runs_with_generated_config() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "T1w.nii.gz");
    let mut inv = Invocation::new(&RECON_NEONATAL_CORTEX);
    inv.set("sessions", vec!["sub1-ses1"]).unwrap();
    inv.set("t1w_file", "T1w.nii.gz").unwrap();

    let executor = Executor::new()
        .with_working_dir(dir.path())
        .with_program("mirtk", "true");
    executor.prepare(&mut inv).unwrap();
    let outputs = executor.run(&inv).unwrap();

    let config = outputs.get("config_file").unwrap();
    assert!(config.ends_with("recon-neonatal-cortex.ini"));
    assert!(fs::read_to_string(config).unwrap().contains("input_t1w_image"));
    assert!(outputs.get("output_dir").unwrap().is_dir());
}
