//! Plain-text experiment report

use std::fmt;

use crate::experiment::ExperimentOutcome;

const RULE: &str = "----------------------------------------";

/// Display adapter for an [`ExperimentOutcome`]
pub struct Report<'a>(pub &'a ExperimentOutcome);

/// Render the final performance report
pub fn render(outcome: &ExperimentOutcome) -> String {
    Report(outcome).to_string()
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.0;
        let standard = &outcome.standard;
        let adaptive = &outcome.adaptive;

        writeln!(f, "{RULE}")?;
        writeln!(f, "### FINAL PERFORMANCE REPORT ###")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "1. ACCURACY (Mean Position Error):")?;
        writeln!(f, "   - Sensor 1 (GPS):   {:.4} m", standard.sensor1_error)?;
        writeln!(f, "   - Sensor 2 (WiFi):  {:.4} m", standard.sensor2_error)?;
        writeln!(f, "   - FUSED (standard): {:.4} m", standard.fused_error)?;
        writeln!(f, "   - FUSED (adaptive): {:.4} m", adaptive.fused_error)?;
        writeln!(f, "{RULE}")?;

        writeln!(f, "2. PRECISION (Variance of Estimate):")?;
        writeln!(f, "   - Sensor 1 Var:     {:.4} m^2", standard.sensor1_variance)?;
        writeln!(f, "   - Sensor 2 Var:     {:.4} m^2", standard.sensor2_variance)?;
        writeln!(f, "   - Fused Var (Calc): {:.4} m^2", standard.theoretical_fused_variance)?;
        writeln!(f, "   - Fused Var (Meas): {:.4} m^2", standard.empirical_fused_variance)?;
        let min_var = standard.sensor1_variance.min(standard.sensor2_variance);
        let relation = if standard.precision_improved() { "<" } else { ">=" };
        writeln!(
            f,
            "   * PROOF: {:.4} {relation} {:.4}",
            standard.theoretical_fused_variance, min_var
        )?;
        writeln!(f, "{RULE}")?;

        writeln!(f, "3. MANEUVER (Adaptive vs Standard):")?;
        match &outcome.maneuver {
            Some(m) => {
                writeln!(f, "   - Region:           steps {}..{}", m.window.start, m.window.end)?;
                writeln!(f, "   - Standard error:   {:.4} m", m.standard_error)?;
                writeln!(f, "   - Adaptive error:   {:.4} m", m.adaptive_error)?;
                writeln!(
                    f,
                    "   - Peak NIS:         {:.3} (threshold {:.3})",
                    m.peak_nis, outcome.nis_threshold
                )?;
            }
            None => writeln!(f, "   - No maneuver in this scenario")?,
        }
        writeln!(
            f,
            "   - Inflated steps:   {} of {}",
            outcome.comparison.adaptive.inflation_count(),
            outcome.comparison.adaptive.len()
        )?;
        write!(f, "{RULE}")
    }
}
