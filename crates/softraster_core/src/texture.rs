use softraster_math::Vec2;

/// How a texture coordinate outside `[0,1]` is resolved to a texel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    Clamp,
    MirroredRepeat,
}

/// How texel bytes are interpreted before they reach the lighting stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Linear,
    Hdr,
}

/// Raw texel storage: `u8` RGBA for sRGB/Linear, `f32` RGBA for HDR. Mirrors
/// the loader contract's `{data, width, height, colorSpace}` shape (§6).
#[derive(Clone, Debug)]
pub enum TexelData {
    Bytes(Vec<[u8; 4]>),
    Float(Vec<[f32; 4]>),
}

#[derive(Clone, Debug)]
pub struct Texture {
    pub data: Option<TexelData>,
    pub width: u32,
    pub height: u32,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub offset: Vec2,
    pub repeat: Vec2,
    pub rotation: f32,
    pub color_space: ColorSpace,
}

impl Texture {
    pub fn new(width: u32, height: u32, data: TexelData, color_space: ColorSpace) -> Texture {
        Texture {
            data: Some(data),
            width,
            height,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            offset: Vec2::ZERO,
            repeat: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            color_space,
        }
    }

    /// A 1x1 opaque-white texture, used as the fallback for null/invalid
    /// texture input (§7) so the evaluator can proceed without that channel.
    pub fn opaque_white() -> Texture {
        Texture::new(1, 1, TexelData::Bytes(vec![[255, 255, 255, 255]]), ColorSpace::Srgb)
    }

    /// Samples at `(u, v)` and returns a straight RGBA in `[0, 255]` for
    /// bytes storage, or scaled-to-byte-range values for HDR (§4.B).
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        let Some(data) = &self.data else {
            return [255.0, 255.0, 255.0, 255.0];
        };
        if self.width == 0 || self.height == 0 {
            return [255.0, 255.0, 255.0, 255.0];
        }

        let (mut u, mut v) = (u * self.repeat.x + self.offset.x, v * self.repeat.y + self.offset.y);
        if self.rotation != 0.0 {
            let (s, c) = self.rotation.sin_cos();
            let (cu, cv) = (u - 0.5, v - 0.5);
            u = cu * c - cv * s + 0.5;
            v = cu * s + cv * c + 0.5;
        }

        let u = wrap(u, self.wrap_s);
        let v = wrap(v, self.wrap_t);

        let x = ((u * self.width as f32) as i64).clamp(0, self.width as i64 - 1) as u32;
        let y = ((v * self.height as f32) as i64).clamp(0, self.height as i64 - 1) as u32;
        let index = (y * self.width + x) as usize;

        match data {
            TexelData::Bytes(texels) => {
                let t = texels.get(index).copied().unwrap_or([255, 255, 255, 255]);
                [t[0] as f32, t[1] as f32, t[2] as f32, t[3] as f32]
            }
            TexelData::Float(texels) => {
                let t = texels.get(index).copied().unwrap_or([1.0, 1.0, 1.0, 1.0]);
                [t[0] * 255.0, t[1] * 255.0, t[2] * 255.0, t[3] * 255.0]
            }
        }
    }
}

fn wrap(t: f32, mode: WrapMode) -> f32 {
    match mode {
        WrapMode::Clamp => t.clamp(0.0, 1.0),
        WrapMode::Repeat => t - t.floor(),
        WrapMode::MirroredRepeat => {
            let whole = t.floor();
            let frac = t - whole;
            let parity = (whole as i64).rem_euclid(2);
            if parity == 0 { frac } else { 1.0 - frac }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_texture_samples_opaque_white() {
        let tex = Texture { data: None, width: 0, height: 0, wrap_s: WrapMode::Repeat, wrap_t: WrapMode::Repeat, offset: Vec2::ZERO, repeat: Vec2::new(1.0, 1.0), rotation: 0.0, color_space: ColorSpace::Srgb };
        assert_eq!(tex.sample(0.5, 0.5), [255.0, 255.0, 255.0, 255.0]);
    }

    #[test]
    fn mirrored_repeat_flips_every_other_tile() {
        assert!((wrap(1.25, WrapMode::MirroredRepeat) - 0.75).abs() < 1e-6);
        assert!((wrap(0.25, WrapMode::MirroredRepeat) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn single_texel_texture_returns_that_texel_everywhere() {
        let tex = Texture::new(1, 1, TexelData::Bytes(vec![[10, 20, 30, 40]]), ColorSpace::Linear);
        assert_eq!(tex.sample(0.9, 0.1), [10.0, 20.0, 30.0, 40.0]);
    }
}
