//! Frame orchestration (§4.H): the state machine that ties geometry
//! projection, shadow mapping, mirror reflection, and rasterization into one
//! `tick()` per frame, plus screen-space picking against the last frame's
//! projected geometry.

use std::collections::HashMap;

use softraster_math::{Aabb, SphericalHarmonics, Vec2, Vec3};

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::fragment::{make_shader, LightingContext};
use crate::light::{Light, LightKind};
use crate::material::AlphaMode;
use crate::mesh::Mesh;
use crate::projector::{project_mesh, ProjectedFace};
use crate::rasterizer::{draw_face, ColorBuffer, DepthBuffer};
use crate::reflection::{self, ReflectionPool};
use crate::shadow::{self, ShadowBias, ShadowMap};

const SHADOW_MAP_RESOLUTION: (u32, u32) = (1024, 1024);
const REFLECTION_RESOLUTION_SCALE: f32 = 0.5;
const BACKGROUND_COLOR: [u8; 4] = [0, 0, 0, 255];
const GAMMA: f32 = 2.2;

/// Everything `tick()` reads but does not own: the meshes and lights that
/// make up one frame's world, plus the scene's ambient SH term (distinct
/// from any per-light `LightProbe`).
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub meshes: Vec<Mesh>,
    pub lights: Vec<Light>,
    pub sh_coefficients: SphericalHarmonics,
}

/// Counters reported by `tick()`, mostly useful for tests and host-side
/// telemetry; never affects rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub opaque_faces: usize,
    pub transparent_faces: usize,
    pub shadow_maps_rendered: usize,
    pub reflection_buffers_rendered: usize,
}

/// Owns the camera, config, and per-frame render targets, and drives the
/// idle -> tick -> ... -> blit -> idle state machine (§4.H). A `tick()` is a
/// no-op beyond the framestart/frameend notification pair unless the scene
/// was `invalidate()`d since the last one.
pub struct Renderer {
    pub camera: Camera,
    pub config: RenderConfig,
    color: ColorBuffer,
    depth: DepthBuffer,
    invalidated: bool,
    frame_index: u64,
    reflection_pool: ReflectionPool,
    shadow_maps: HashMap<usize, ShadowMap>,
    reflections: HashMap<reflection::PlaneKey, reflection::ReflectionBuffer>,
    last_faces: Vec<(usize, ProjectedFace)>,
}

fn edge(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    (p.x - b.x) * (a.y - b.y) - (a.x - b.x) * (p.y - b.y)
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = edge(p, a, b);
    let d2 = edge(p, b, c);
    let d3 = edge(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn point_in_face(point: Vec2, face: &ProjectedFace) -> bool {
    if face.vertices.len() < 3 {
        return false;
    }
    (1..face.vertices.len() - 1).any(|i| point_in_triangle(point, face.vertices[0].screen, face.vertices[i].screen, face.vertices[i + 1].screen))
}

impl Renderer {
    /// Allocates fresh, zero-initialized render targets at `(width, height)`.
    pub fn new(camera: Camera, config: RenderConfig, width: u32, height: u32) -> Result<Renderer, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroSizedViewport { width, height });
        }
        Ok(Renderer {
            camera,
            config,
            color: ColorBuffer::new(width, height),
            depth: DepthBuffer::new(width, height),
            invalidated: true,
            frame_index: 0,
            reflection_pool: ReflectionPool::new(),
            shadow_maps: HashMap::new(),
            reflections: HashMap::new(),
            last_faces: Vec::new(),
        })
    }

    /// Adopts host-owned render targets instead of allocating new ones.
    pub fn with_buffers(camera: Camera, config: RenderConfig, color: ColorBuffer, depth: DepthBuffer) -> Result<Renderer, RenderError> {
        if color.width == 0 || color.height == 0 {
            return Err(RenderError::ZeroSizedColorTarget { width: color.width, height: color.height });
        }
        if depth.width == 0 || depth.height == 0 {
            return Err(RenderError::ZeroSizedDepthTarget { width: depth.width, height: depth.height });
        }
        if color.width != depth.width || color.height != depth.height {
            let color_len = (color.width * color.height) as usize;
            let depth_len = (depth.width * depth.height) as usize;
            return Err(RenderError::MismatchedBufferDimensions { color_len, depth_len });
        }
        Ok(Renderer {
            camera,
            config,
            color,
            depth,
            invalidated: true,
            frame_index: 0,
            reflection_pool: ReflectionPool::new(),
            shadow_maps: HashMap::new(),
            reflections: HashMap::new(),
            last_faces: Vec::new(),
        })
    }

    /// Reallocates the render targets and forces the next `tick()` to
    /// re-render, since every previously projected pixel is now invalid.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroSizedViewport { width, height });
        }
        self.color = ColorBuffer::new(width, height);
        self.depth = DepthBuffer::new(width, height);
        self.camera.aspect = width as f32 / height as f32;
        self.camera.update();
        self.invalidated = true;
        Ok(())
    }

    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub fn color_buffer(&self) -> &ColorBuffer {
        &self.color
    }

    /// Linear view-depth, one float per pixel (§6 Outputs).
    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Runs one frame: idle -> tick -> update-camera -> update-lights ->
    /// shadow -> reflection -> clear -> project-meshes -> partition -> draw
    /// opaque -> sort+draw transparent -> post (out of scope) -> blit ->
    /// idle. Skips everything but the framestart/frameend pair if nothing
    /// was invalidated since the last call.
    pub fn tick(&mut self, scene: &Scene) -> FrameStats {
        self.frame_index += 1;
        log::debug!("framestart frame={}", self.frame_index);

        if !self.invalidated {
            log::debug!("frameend frame={} (skipped, not invalidated)", self.frame_index);
            return FrameStats { frame_index: self.frame_index, ..FrameStats::default() };
        }
        self.invalidated = false;

        self.camera.update();

        let lights: Vec<Light> = scene
            .lights
            .iter()
            .map(|light| {
                let mut light = light.clone();
                light.world_matrix = self.config.world_matrix * light.world_matrix;
                light
            })
            .collect();

        let mut bounds = Aabb::EMPTY;
        for mesh in &scene.meshes {
            bounds.add_aabb(&mesh.world_aabb());
        }
        let scene_center = bounds.center();
        let scene_radius = (bounds.size().length() * 0.5).max(1e-3);

        self.shadow_maps.clear();
        if self.config.enable_shadows {
            for (index, light) in lights.iter().enumerate() {
                if !light.cast_shadow {
                    continue;
                }
                if let Some(map) = shadow::render_shadow_map(light, &scene.meshes, scene_center, scene_radius, SHADOW_MAP_RESOLUTION, ShadowBias::default()) {
                    self.shadow_maps.insert(index, map);
                }
            }
        }
        let shadow_maps_rendered = self.shadow_maps.len();

        let shadow_maps = &self.shadow_maps;
        let shadow_factor = |light_index: usize, world: Vec3, normal: Vec3| -> Vec3 {
            let Some(map) = shadow_maps.get(&light_index) else { return Vec3::ONE * 255.0 };
            let Some(light) = lights.get(light_index) else { return Vec3::ONE * 255.0 };
            let to_light = match &light.kind {
                LightKind::Directional { .. } => light.transformed_direction().map(|d| -d),
                LightKind::Spot { .. } => light.transformed_position().map(|p| (p - world).normalize()),
                _ => None,
            };
            match to_light {
                Some(dir) => shadow::get_shadow_factor(map, world, normal, dir),
                None => Vec3::ONE * 255.0,
            }
        };

        for buffer in self.reflections.drain().map(|(_, v)| v) {
            self.reflection_pool.release(buffer.color);
        }

        let width = self.color.width;
        let height = self.color.height;

        let reflection_base_context = LightingContext {
            camera_position: self.camera.position,
            lights: &lights,
            shadows_enabled: self.config.enable_shadows,
            lighting_enabled: self.config.enable_lighting,
            sh_enabled: self.config.enable_sh,
            sh_coefficients: scene.sh_coefficients,
            gamma: GAMMA,
            world_matrix: self.config.world_matrix,
            shadow_factor: Some(&shadow_factor),
            reflections: None,
        };

        if self.config.enable_reflection {
            self.reflections =
                reflection::render_all_reflections(&scene.meshes, &self.camera, width, height, REFLECTION_RESOLUTION_SCALE, &reflection_base_context, &mut self.reflection_pool);
        }
        let reflection_buffers_rendered = self.reflections.len();

        self.color.clear(BACKGROUND_COLOR);
        self.depth.clear();

        let context = LightingContext {
            camera_position: self.camera.position,
            lights: &lights,
            shadows_enabled: self.config.enable_shadows,
            lighting_enabled: self.config.enable_lighting,
            sh_enabled: self.config.enable_sh,
            sh_coefficients: scene.sh_coefficients,
            gamma: GAMMA,
            world_matrix: self.config.world_matrix,
            shadow_factor: Some(&shadow_factor),
            reflections: if self.config.enable_reflection { Some(&self.reflections) } else { None },
        };

        let mut all_faces: Vec<(usize, ProjectedFace)> = Vec::new();
        for (mesh_index, mesh) in scene.meshes.iter().enumerate() {
            for face in project_mesh(mesh, &self.camera, width as f32, height as f32, false) {
                all_faces.push((mesh_index, face));
            }
        }

        let (opaque, mut transparent): (Vec<(usize, ProjectedFace)>, Vec<(usize, ProjectedFace)>) = all_faces
            .into_iter()
            .partition(|(_, face)| face.material.as_ref().map(|m| m.header().alpha_mode != AlphaMode::Blend).unwrap_or(true));

        for (_, face) in &opaque {
            let mut shader = make_shader(face.material.as_deref(), self.config.enable_lighting);
            draw_face(face, shader.as_mut(), &context, &mut self.color, &mut self.depth, false);
        }

        transparent.sort_by(|(_, a), (_, b)| b.depth.avg.partial_cmp(&a.depth.avg).unwrap_or(std::cmp::Ordering::Equal));
        for (_, face) in &transparent {
            let mut shader = make_shader(face.material.as_deref(), self.config.enable_lighting);
            draw_face(face, shader.as_mut(), &context, &mut self.color, &mut self.depth, true);
        }

        let stats = FrameStats {
            frame_index: self.frame_index,
            opaque_faces: opaque.len(),
            transparent_faces: transparent.len(),
            shadow_maps_rendered,
            reflection_buffers_rendered,
        };

        // post (FXAA/gamma/volumetric) and blit are out of scope: `color`
        // already holds the frame's final pixels for the host to present.
        self.last_faces = opaque.into_iter().chain(transparent).collect();

        log::debug!("frameend frame={}", self.frame_index);
        stats
    }

    /// Nearest mesh under `(screen_x, screen_y)` by the last rendered
    /// frame's average face depth, or `None` if nothing was hit.
    pub fn pick<'a>(&self, screen_x: u32, screen_y: u32, scene: &'a Scene) -> Option<&'a Mesh> {
        let point = Vec2::new(screen_x as f32 + 0.5, screen_y as f32 + 0.5);
        let mut best: Option<(f32, usize)> = None;
        for (mesh_index, face) in &self.last_faces {
            if !point_in_face(point, face) {
                continue;
            }
            if best.map(|(depth, _)| face.depth.avg < depth).unwrap_or(true) {
                best = Some((face.depth.avg, *mesh_index));
            }
        }
        best.and_then(|(_, index)| scene.meshes.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Material, MaterialHeader, PhongParams};
    use crate::mesh::Face;
    use crate::vertex::Vertex;
    use softraster_math::Quaternion;
    use std::sync::Arc;

    fn quad_mesh(z: f32, color: Vec3) -> Mesh {
        let vertices = vec![
            Vertex::new(Vec3::new(-1.0, -1.0, z)),
            Vertex::new(Vec3::new(1.0, -1.0, z)),
            Vertex::new(Vec3::new(1.0, 1.0, z)),
            Vertex::new(Vec3::new(-1.0, 1.0, z)),
        ];
        let mut face = Face::new(vertices);
        face.normal = Some(Vec3::new(0.0, 0.0, 1.0));
        face.material = Some(Arc::new(Material::Phong(MaterialHeader::default(), PhongParams { ambient: color, diffuse: color, specular: Vec3::ZERO, shininess: 1.0 })));
        Mesh::new(vec![face])
    }

    fn default_camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 5.0), Quaternion::IDENTITY, 1.0, crate::camera::Projection::Perspective { fov_deg: 60.0, near: 0.1, far: 100.0 })
    }

    fn lit_scene(quad: Mesh) -> Scene {
        let mut scene = Scene::default();
        scene.meshes.push(quad);
        scene.lights.push(Light::new(LightKind::Ambient, Vec3::splat(255.0), 1.0));
        scene
    }

    #[test]
    fn first_tick_after_construction_renders_and_advances_frame_index() {
        let scene = lit_scene(quad_mesh(0.0, Vec3::new(200.0, 50.0, 50.0)));
        let mut config = RenderConfig::default();
        config.enable_shadows = false;
        config.enable_reflection = false;
        let mut renderer = Renderer::new(default_camera(), config, 64, 64).unwrap();

        let stats = renderer.tick(&scene);
        assert_eq!(stats.frame_index, 1);
        assert_eq!(stats.opaque_faces, 1);
        let center = renderer.color_buffer().get(32, 32);
        assert!(center[3] > 0, "expected the quad to be rasterized into the center pixel");
    }

    #[test]
    fn tick_without_invalidation_skips_rendering_but_still_advances_frame_index() {
        let scene = lit_scene(quad_mesh(0.0, Vec3::new(200.0, 50.0, 50.0)));
        let mut config = RenderConfig::default();
        config.enable_shadows = false;
        config.enable_reflection = false;
        let mut renderer = Renderer::new(default_camera(), config, 64, 64).unwrap();

        let first = renderer.tick(&scene);
        let second = renderer.tick(&scene);
        assert_eq!(second.frame_index, first.frame_index + 1);
        assert_eq!(second.opaque_faces, 0, "nothing should be re-projected without invalidate()");

        renderer.invalidate();
        let third = renderer.tick(&scene);
        assert_eq!(third.opaque_faces, 1);
    }

    #[test]
    fn zero_sized_viewport_is_rejected() {
        let result = Renderer::new(default_camera(), RenderConfig::default(), 0, 10);
        assert!(matches!(result, Err(RenderError::ZeroSizedViewport { width: 0, height: 10 })));
    }

    #[test]
    fn picking_returns_the_mesh_under_the_cursor() {
        let scene = lit_scene(quad_mesh(0.0, Vec3::new(200.0, 50.0, 50.0)));
        let mut config = RenderConfig::default();
        config.enable_shadows = false;
        config.enable_reflection = false;
        let mut renderer = Renderer::new(default_camera(), config, 64, 64).unwrap();
        renderer.tick(&scene);

        assert!(renderer.pick(32, 32, &scene).is_some());
        assert!(renderer.pick(0, 0, &scene).is_none());
    }

    #[test]
    fn resize_reallocates_targets_and_forces_a_redraw() {
        let scene = lit_scene(quad_mesh(0.0, Vec3::new(200.0, 50.0, 50.0)));
        let mut config = RenderConfig::default();
        config.enable_shadows = false;
        config.enable_reflection = false;
        let mut renderer = Renderer::new(default_camera(), config, 64, 64).unwrap();
        renderer.tick(&scene);
        renderer.tick(&scene);

        renderer.resize(32, 32).unwrap();
        assert_eq!(renderer.color_buffer().width, 32);
        let stats = renderer.tick(&scene);
        assert_eq!(stats.opaque_faces, 1, "resize should invalidate and force a redraw");
    }
}
