//! The Fragment stage (§4.E): Material Evaluator + Lighting Strategy +
//! Shader, composed per material variant by `material_shader`.

pub mod evaluator;
pub mod lighting;
pub mod material_shader;
pub mod shader;

pub use evaluator::{evaluate, Surface, SurfaceCommon};
pub use lighting::{calculate as calculate_lighting, LightingStrategy};
pub use material_shader::MaterialShader;
pub use shader::{make_shader, FragmentInput, FragmentOutput, LightingContext, Shader};
