use serde::{Deserialize, Serialize};
use softraster_math::Mat4;

/// The recognized configuration options a host application can load from
/// TOML/JSON. Post-filter flags are stored and reported but never acted on
/// inside the core — they gate collaborators (FXAA, gamma, volumetric
/// scatter) that live outside this crate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub enable_lighting: bool,
    pub enable_sh: bool,
    pub enable_shadows: bool,
    pub enable_reflection: bool,
    pub enable_fxaa: bool,
    pub enable_gamma: bool,
    pub enable_volumetric: bool,
    #[serde(skip, default = "default_world_matrix")]
    pub world_matrix: Mat4,
}

fn default_world_matrix() -> Mat4 {
    Mat4::IDENTITY
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            enable_lighting: true,
            enable_sh: true,
            enable_shadows: true,
            enable_reflection: true,
            enable_fxaa: false,
            enable_gamma: false,
            enable_volumetric: false,
            world_matrix: Mat4::IDENTITY,
        }
    }
}

impl RenderConfig {
    pub fn from_toml(text: &str) -> Result<RenderConfig, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg = RenderConfig::from_toml("enable_shadows = false\n").unwrap();
        assert!(!cfg.enable_shadows);
        assert!(cfg.enable_lighting);
    }
}
