//! Square-root scale mapping station traffic to marker radius.

/// Largest marker radius, in screen units.
pub const MAX_RADIUS: f64 = 25.0;

/// Maps `[0, domain_max]` onto `[0, range_max]` so that marker area, not
/// radius, grows linearly with the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusScale {
    domain_max: f64,
    range_max: f64,
}

impl RadiusScale {
    pub fn sqrt(domain_max: usize, range_max: f64) -> Self {
        Self {
            domain_max: domain_max as f64,
            range_max,
        }
    }

    /// Radius for `value`. Inputs beyond the domain are extrapolated, not
    /// clamped. A zero-width domain maps everything to the range midpoint.
    pub fn radius(&self, value: usize) -> f64 {
        let span = self.domain_max.sqrt();
        if span == 0.0 {
            return self.range_max / 2.0;
        }
        self.range_max * ((value as f64).sqrt() / span)
    }

    pub fn domain_max(&self) -> f64 {
        self.domain_max
    }
}
