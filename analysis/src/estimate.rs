/// Node count recommendation for a linear-parabolic radial grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    // index where the quadratic inner region hands over to the linear outer region
    pub break_point: f64,
    pub nodes: f64,
}

/// Smallest number of nodes that keeps the spacing around `r0` at or below `slope`.
///
/// No plausibility checks are made, inconsistent radii or a non-positive slope simply
/// produce a meaningless estimate.
pub fn estimate(r_min: f64, r_max: f64, r0: f64, slope: f64) -> Estimate {
    let break_point = (2.0 * (r0 - r_min) / slope).floor();
    let nodes = (2.0 * (r_max - r_min) / slope + break_point) / 2.0;

    Estimate { break_point, nodes }
}

/// One line report, reals are printed in shortest round-trip form (`20.0`, `0.1`)
pub fn summary(slope: f64, r0: f64, nodes: f64) -> String {
    format!("To have a slope of <= {slope:?} at R={r0:?} you need >={nodes:?} nodes")
}
