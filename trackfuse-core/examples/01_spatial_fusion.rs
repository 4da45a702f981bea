//! Spatial Fusion Example
//!
//! Two position sensors with different noise levels observe the same point.
//! Inverse-variance weighting produces a measurement that is more precise
//! than either sensor alone.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_spatial_fusion
//! ```

use trackfuse_core::{fusion::spatial, FusionResult, SpatialCombiner};

fn main() -> FusionResult<()> {
    println!("TrackFuse Spatial Fusion Example");
    println!("================================\n");

    let gps_sigma = 2.0;
    let wifi_sigma = 1.0;
    let combiner = SpatialCombiner::new(gps_sigma, wifi_sigma)?;
    let (w1, w2) = combiner.weights();

    println!("Sensor 1 (GPS):  σ = {gps_sigma} m, variance = {:.2} m²", gps_sigma * gps_sigma);
    println!("Sensor 2 (WiFi): σ = {wifi_sigma} m, variance = {:.2} m²", wifi_sigma * wifi_sigma);
    println!("Weights: w1 = {w1:.2}, w2 = {w2:.2}");
    println!("Fused variance: {:.2} m²\n", combiner.fused_variance());

    let readings = [
        ([10.4, 5.9], [9.8, 5.1]),
        ([12.1, 3.2], [10.3, 4.6]),
        ([8.7, 4.4], [10.1, 5.2]),
    ];
    for (z1, z2) in readings {
        let fused = combiner.combine(z1, z2)?;
        println!(
            "  z1 = ({:5.2}, {:5.2})  z2 = ({:5.2}, {:5.2})  →  fused = ({:5.2}, {:5.2})",
            z1[0], z1[1], z2[0], z2[1], fused.position[0], fused.position[1]
        );
    }

    // Precision gain holds for any pair of sensors
    println!("\nPrecision gain across sensor pairs:");
    for (s1, s2) in [(0.5, 0.5), (1.0, 3.0), (5.0, 0.2)] {
        let fused = spatial::fuse([0.0, 0.0], s1, [0.0, 0.0], s2)?;
        println!(
            "  σ1 = {s1:.1}, σ2 = {s2:.1}: v_f = {:.4} < min({:.2}, {:.2})",
            fused.variance(),
            s1 * s1,
            s2 * s2
        );
    }

    // Zero noise is a configuration error
    match SpatialCombiner::new(0.0, 1.0) {
        Ok(_) => println!("\nUnexpected: zero sigma accepted"),
        Err(e) => println!("\nRejected: {e}"),
    }

    Ok(())
}
