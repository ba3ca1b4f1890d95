use std::f32::consts::{PI, TAU};

const ONE_OVER_TAU: f32 = 1.0 / TAU;

/// Wraps an angle (radians) into `[-pi, pi]`.
pub fn wrap_pi(angle: f32) -> f32 {
    let angle = angle + PI;
    let angle = angle - (angle * ONE_OVER_TAU).floor() * TAU;
    angle - PI
}

/// `acos` clamped to a domain that tolerates floating-point drift just
/// outside `[-1, 1]`, instead of returning NaN.
pub fn safe_acos(x: f32) -> f32 {
    if x <= -1.0 {
        PI
    } else if x >= 1.0 {
        0.0
    } else {
        x.acos()
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_pi_stays_in_range() {
        assert!((wrap_pi(4.0 * PI) - 0.0).abs() < 1e-5);
        assert!(wrap_pi(3.0 * PI) >= -PI && wrap_pi(3.0 * PI) <= PI);
    }

    #[test]
    fn safe_acos_clamps_out_of_domain_input() {
        assert_eq!(safe_acos(1.5), 0.0);
        assert_eq!(safe_acos(-1.5), PI);
    }
}
