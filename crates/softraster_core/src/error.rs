use thiserror::Error;

/// Fatal conditions only — preconditions that would otherwise cause
/// out-of-bounds memory access. Every other recoverable condition (degenerate
/// geometry, bad texture input, non-invertible normal matrix, shader discard,
/// shadow setup failure) is resolved locally and never reaches this type.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("target color buffer has zero area ({width}x{height})")]
    ZeroSizedColorTarget { width: u32, height: u32 },

    #[error("target depth buffer has zero area ({width}x{height})")]
    ZeroSizedDepthTarget { width: u32, height: u32 },

    #[error(
        "color buffer ({color_len} texels) and depth buffer ({depth_len} texels) sizes disagree"
    )]
    MismatchedBufferDimensions { color_len: usize, depth_len: usize },

    #[error("viewport resize to zero size ({width}x{height}) requested")]
    ZeroSizedViewport { width: u32, height: u32 },
}
