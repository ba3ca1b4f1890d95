/// sRGB <-> linear EOTF/OETF conversions and the Narkowicz ACES filmic
/// tonemap used by the final output stage (§4.E).

pub fn srgb_to_linear(x: f32) -> f32 {
    if x <= 0.04045 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(x: f32) -> f32 {
    if x <= 0.0031308 {
        x * 12.92
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

/// Narkowicz's fit to the ACES reference tonemap curve.
pub fn aces_tonemap(x: f32) -> f32 {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    ((x * (a * x + b)) / (x * (c * x + d) + e)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_roundtrip_is_close_to_identity() {
        for x in [0.0_f32, 0.02, 0.2, 0.5, 0.9, 1.0] {
            let back = linear_to_srgb(srgb_to_linear(x));
            assert!((back - x).abs() < 1e-4, "x={x} back={back}");
        }
    }

    #[test]
    fn aces_tonemap_clamps_to_unit_range() {
        assert!(aces_tonemap(1000.0) <= 1.0);
        assert_eq!(aces_tonemap(0.0), 0.0);
    }
}
