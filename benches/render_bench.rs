//! Quick benchmark to verify command rendering performance

use std::time::Instant;

use wbwrap::commands::{CIFTI_CREATE_DENSE_FROM_TEMPLATE, CIFTI_DILATE};
use wbwrap::{Invocation, Value};

fn main() {
    let mut dilate = Invocation::new(&CIFTI_DILATE);
    dilate.set("in_file", "sub-01.dtseries.nii").unwrap();
    dilate.set("direction", "COLUMN").unwrap();
    dilate.set("surface_distance", 10).unwrap();
    dilate.set("volume_distance", 10).unwrap();
    dilate.set("nearest", true).unwrap();

    let mut dense = Invocation::new(&CIFTI_CREATE_DENSE_FROM_TEMPLATE);
    dense.set("in_file", "func.dtseries.nii").unwrap();
    dense.set("series", true).unwrap();
    dense.set("series_step", 0.8).unwrap();
    dense.set("series_start", 0).unwrap();
    dense
        .set(
            "volume",
            vec![
                Value::from(("OTHER", "functional.nii", true)),
                Value::from(("PUTAMEN_LEFT", "functional.nii")),
                Value::from(("THALAMUS_RIGHT", "functional.nii", false)),
            ],
        )
        .unwrap();

    println!("Command Rendering Performance Test");
    println!("==================================\n");

    let iterations = 100_000;
    for (name, inv) in [("cifti-dilate", &dilate), ("cifti-create-dense-from-template", &dense)] {
        // Warm up the template cache
        let rendered = inv.assemble().unwrap();

        let start = Instant::now();
        for _ in 0..iterations {
            let _ = inv.assemble();
        }
        let elapsed = start.elapsed();
        let per_op = elapsed / iterations;

        println!("Command: {}", name);
        println!("  Rendered: {}", rendered);
        println!("  {} iterations in {:?}", iterations, elapsed);
        println!("  Per render: {:?}\n", per_op);
    }
}
