//! Offline alignment example.
//!
//! Feeds synthetic star observations from a mount with a known index
//! offset and cone error into an [`AlignmentModel`] and prints how the
//! model tier and the recovered terms evolve as points accumulate.
//!
//! No hardware is needed.

use aux_mount::alignment::solver::apply_mechanical_model;
use aux_mount::alignment::{vector_from_altaz, vector_to_altaz, AlignmentModel};

fn main() {
    println!("=== Offline Alignment Example ===\n");

    // Mount misaligned by 0.5° in azimuth, 4' index offset, 2' cone error
    let truth = [
        0.0,
        0.0,
        0.5f64.to_radians(),
        (4.0f64 / 60.0).to_radians(),
        (2.0f64 / 60.0).to_radians(),
        0.0,
    ];
    println!("True index offset: 4.0'");
    println!("True cone error:   2.0'\n");

    let stars = [
        ("Vega", 60.0, 70.0),
        ("Arcturus", 250.0, 30.0),
        ("Capella", 320.0, 15.0),
        ("Altair", 130.0, 40.0),
        ("Deneb", 40.0, 55.0),
        ("Antares", 190.0, 12.0),
        ("Polaris", 0.0, 50.0),
        ("Spica", 220.0, 20.0),
    ];

    let mut model = AlignmentModel::default();
    for (name, az, alt) in stars {
        let sky = vector_from_altaz(az, alt);
        let mount = apply_mechanical_model(&sky, &truth);
        let disposition = model.add_point(sky, mount, 1.0);
        let status = model.status();

        println!(
            "{:<9} -> {:?}: {} points, {:?}",
            name, disposition, status.point_count, status.tier
        );
        println!(
            "          rms {:.2}\"  ID {:.2}'  CH {:.2}'  NP {:.2}'",
            status.rms_arcsec, status.index_offset_arcmin, status.cone_arcmin, status.nonperpendicularity_arcmin
        );
    }

    // Check a direction that was never observed
    let check_point = vector_from_altaz(100.0, 60.0);
    let predicted = model.transform_to_mount(&check_point, None, 0.0);
    let expected = apply_mechanical_model(&check_point, &truth);
    let (pred_az, pred_alt) = vector_to_altaz(&predicted);
    let (exp_az, exp_alt) = vector_to_altaz(&expected);

    println!("\nCheck point az=100 alt=60:");
    println!("  predicted mount az={:.4} alt={:.4}", pred_az, pred_alt);
    println!("  true      mount az={:.4} alt={:.4}", exp_az, exp_alt);

    println!("\n=== Example Complete ===");
}
