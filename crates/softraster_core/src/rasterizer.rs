//! Perspective-correct scanline rasterization with a Z-buffer (§4.D).
//!
//! The three public entry points (`draw_triangle`, `draw_depth_triangle`,
//! `draw_transmission_triangle`) all walk the same edge-function fill loop;
//! they differ only in what they do with the interpolated fragment.

use softraster_math::{Vec2, Vec3};

use crate::fragment::{FragmentInput, LightingContext, Shader};
use crate::material::{AlphaMode, Material};
use crate::projector::{ProjectedFace, ProjectedVertex};

/// 8-bit RGBA color target, row-major, origin top-left.
#[derive(Clone, Debug)]
pub struct ColorBuffer {
    pub width: u32,
    pub height: u32,
    pixels: Vec<[u8; 4]>,
}

impl ColorBuffer {
    pub fn new(width: u32, height: u32) -> ColorBuffer {
        ColorBuffer { width, height, pixels: vec![[0, 0, 0, 0]; (width * height) as usize] }
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: [u8; 4]) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    pub fn as_slice(&self) -> &[[u8; 4]] {
        &self.pixels
    }
}

/// Z-buffer; +Infinity means untouched, matching the spec's
/// "Infinity-initialized" contract so every real depth test passes on the
/// first write.
#[derive(Clone, Debug)]
pub struct DepthBuffer {
    pub width: u32,
    pub height: u32,
    values: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: u32, height: u32) -> DepthBuffer {
        DepthBuffer { width, height, values: vec![f32::INFINITY; (width * height) as usize] }
    }

    pub fn clear(&mut self) {
        self.values.fill(f32::INFINITY);
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, z: f32) {
        self.values[(y * self.width + x) as usize] = z;
    }
}

fn edge_function(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Perspective-corrected barycentric weights for one interior sample, plus
/// the screen-linearly interpolated `1/w` (which doubles as linear
/// view-depth once inverted, since `clip.w = -view.z` for this projection
/// convention).
struct FragmentGeometry {
    x: u32,
    y: u32,
    view_depth: f32,
    ndc_z: f32,
    weights: (f32, f32, f32),
}

/// Walks the triangle's pixel bounding box, calling `visit` for every sample
/// point inside the triangle (either winding). Degenerate (zero-area)
/// triangles are skipped silently (§7).
fn walk_triangle(v0: &ProjectedVertex, v1: &ProjectedVertex, v2: &ProjectedVertex, width: u32, height: u32, mut visit: impl FnMut(FragmentGeometry)) {
    let (p0, p1, p2) = (v0.screen, v1.screen, v2.screen);

    let min_x = p0.x.min(p1.x).min(p2.x).floor().max(0.0) as i64;
    let max_x = p0.x.max(p1.x).max(p2.x).ceil().min(width as f32) as i64;
    let min_y = p0.y.min(p1.y).min(p2.y).floor().max(0.0) as i64;
    let max_y = p0.y.max(p1.y).max(p2.y).ceil().min(height as f32) as i64;
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    let area = edge_function(p0, p1, p2);
    if area.abs() < 1e-8 {
        return;
    }
    let inv_area = 1.0 / area;

    for y in min_y..max_y {
        for x in min_x..max_x {
            let sample = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge_function(p1, p2, sample);
            let w1 = edge_function(p2, p0, sample);
            let w2 = edge_function(p0, p1, sample);

            let inside = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
            if !inside {
                continue;
            }

            let b0 = w0 * inv_area;
            let b1 = w1 * inv_area;
            let b2 = w2 * inv_area;

            let inv_w = b0 * v0.inv_w + b1 * v1.inv_w + b2 * v2.inv_w;
            if inv_w.abs() < 1e-12 {
                continue;
            }
            let view_depth = 1.0 / inv_w;

            let pb0 = b0 * v0.inv_w * view_depth;
            let pb1 = b1 * v1.inv_w * view_depth;
            let pb2 = b2 * v2.inv_w * view_depth;

            // NDC z is already affine in screen space for a perspective
            // projection; interpolate it with the plain (non-corrected)
            // barycentrics, the same way hardware z-buffers do.
            let ndc_z = b0 * v0.ndc_z + b1 * v1.ndc_z + b2 * v2.ndc_z;

            visit(FragmentGeometry { x: x as u32, y: y as u32, view_depth, ndc_z, weights: (pb0, pb1, pb2) });
        }
    }
}

fn interpolate_vec3(w: (f32, f32, f32), a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    a * w.0 + b * w.1 + c * w.2
}

fn interpolate_vec2(w: (f32, f32, f32), a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
    a * w.0 + b * w.1 + c * w.2
}

fn interpolate_vec4(w: (f32, f32, f32), a: softraster_math::Vec4, b: softraster_math::Vec4, c: softraster_math::Vec4) -> softraster_math::Vec4 {
    a * w.0 + b * w.1 + c * w.2
}

fn fragment_input(g: &FragmentGeometry, v0: &ProjectedVertex, v1: &ProjectedVertex, v2: &ProjectedVertex, width: u32, height: u32) -> FragmentInput {
    FragmentInput {
        world_position: interpolate_vec3(g.weights, v0.world_position, v1.world_position, v2.world_position),
        normal: interpolate_vec3(g.weights, v0.normal, v1.normal, v2.normal).normalize(),
        uv: interpolate_vec2(g.weights, v0.uv, v1.uv, v2.uv),
        tangent: interpolate_vec4(g.weights, v0.tangent, v1.tangent, v2.tangent),
        ndc_z: g.ndc_z,
        view_depth: g.view_depth,
        screen_uv: Vec2::new((g.x as f32 + 0.5) / width as f32, (g.y as f32 + 0.5) / height as f32),
    }
}

fn pack_color(rgb: Vec3, alpha: f32) -> [u8; 4] {
    [
        rgb.x.clamp(0.0, 255.0) as u8,
        rgb.y.clamp(0.0, 255.0) as u8,
        rgb.z.clamp(0.0, 255.0) as u8,
        (alpha.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

fn blend_source_over(src: Vec3, src_alpha: f32, dst: [u8; 4]) -> [u8; 4] {
    let dst_rgb = Vec3::new(dst[0] as f32, dst[1] as f32, dst[2] as f32);
    let out_rgb = src * src_alpha + dst_rgb * (1.0 - src_alpha);
    let out_alpha = src_alpha + (dst[3] as f32 / 255.0) * (1.0 - src_alpha);
    pack_color(out_rgb, out_alpha)
}

/// Fills one screen triangle for the main pass: opaque fragments Z-test and
/// write depth; BLEND fragments source-over composite without writing depth
/// (§4.D).
pub fn draw_triangle(
    v0: &ProjectedVertex,
    v1: &ProjectedVertex,
    v2: &ProjectedVertex,
    shader: &mut dyn Shader,
    context: &LightingContext,
    color: &mut ColorBuffer,
    depth: &mut DepthBuffer,
    is_transparent: bool,
) {
    let (width, height) = (color.width, color.height);
    walk_triangle(v0, v1, v2, width, height, |g| {
        if !is_transparent && g.view_depth >= depth.get(g.x, g.y) {
            return;
        }
        let input = fragment_input(&g, v0, v1, v2, width, height);
        let Some(output) = shader.shade(&input, context) else {
            return;
        };

        if is_transparent {
            let opacity = shader.get_opacity();
            let blended = blend_source_over(output.color, opacity, color.get(g.x, g.y));
            color.set(g.x, g.y, blended);
        } else {
            color.set(g.x, g.y, pack_color(output.color, 1.0));
            depth.set(g.x, g.y, g.view_depth);
        }
    });
}

/// Draws every face of a triangle-fan-triangulated polygon via `draw_triangle`.
pub fn draw_face(face: &ProjectedFace, shader: &mut dyn Shader, context: &LightingContext, color: &mut ColorBuffer, depth: &mut DepthBuffer, is_transparent: bool) {
    if face.vertices.len() < 3 {
        return;
    }
    shader.initialize(face, context);
    let v0 = &face.vertices[0];
    for i in 1..face.vertices.len() - 1 {
        draw_triangle(v0, &face.vertices[i], &face.vertices[i + 1], shader, context, color, depth, is_transparent);
    }
}

/// Depth-only rasterization for the shadow pass, with MASK alpha-discard
/// (§4.F step 3). Depth-tests against NDC z, not linear view depth, since
/// shadow comparisons happen in the light's own clip space.
pub fn draw_depth_triangle(v0: &ProjectedVertex, v1: &ProjectedVertex, v2: &ProjectedVertex, material: Option<&Material>, depth: &mut DepthBuffer) {
    walk_triangle(v0, v1, v2, depth.width, depth.height, |g| {
        if let Some(material) = material {
            let header = material.header();
            if header.alpha_mode == AlphaMode::Mask {
                let uv = interpolate_vec2(g.weights, v0.uv, v1.uv, v2.uv);
                let sample = header.base_color_map.as_ref().map(|tex| tex.sample(uv.x, uv.y)).unwrap_or([255.0, 255.0, 255.0, 255.0]);
                let alpha = (sample[3] / 255.0) * header.opacity;
                if alpha < header.alpha_cutoff {
                    return;
                }
            }
            if header.alpha_mode == AlphaMode::Blend {
                return;
            }
        }
        if g.ndc_z < depth.get(g.x, g.y) {
            depth.set(g.x, g.y, g.ndc_z);
        }
    });
}

/// Writes colored attenuation for BLEND faces into a transmission buffer
/// used by shadow sampling to tint shadows cast through colored glass
/// (§4.F step 4).
pub fn draw_transmission_triangle(v0: &ProjectedVertex, v1: &ProjectedVertex, v2: &ProjectedVertex, material: &Material, transmission: &mut ColorBuffer) {
    let header = material.header();
    if header.alpha_mode != AlphaMode::Blend {
        return;
    }
    walk_triangle(v0, v1, v2, transmission.width, transmission.height, |g| {
        let uv = interpolate_vec2(g.weights, v0.uv, v1.uv, v2.uv);
        let sample = header.base_color_map.as_ref().map(|tex| tex.sample(uv.x, uv.y)).unwrap_or([255.0, 255.0, 255.0, 255.0]);
        let alpha = (sample[3] / 255.0) * header.opacity;
        let attenuation = Vec3::new(sample[0], sample[1], sample[2]) * alpha + Vec3::splat(255.0) * (1.0 - alpha);
        transmission.set(g.x, g.y, pack_color(attenuation, 1.0));
    });
}

/// Draws edges only, with a small constant depth bias so the wireframe
/// doesn't z-fight against the filled pass (§4.D).
pub const WIREFRAME_DEPTH_BIAS: f32 = 1e-3;

pub fn draw_wireframe_face(face: &ProjectedFace, color: Vec3, target: &mut ColorBuffer, depth: &mut DepthBuffer) {
    if face.vertices.len() < 2 {
        return;
    }
    let n = face.vertices.len();
    for i in 0..n {
        let a = &face.vertices[i];
        let b = &face.vertices[(i + 1) % n];
        draw_line(a, b, color, target, depth);
    }
}

fn draw_line(a: &ProjectedVertex, b: &ProjectedVertex, color: Vec3, target: &mut ColorBuffer, depth: &mut DepthBuffer) {
    let steps = (a.screen - b.screen).length().ceil().max(1.0) as i64;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let p = Vec2::lerp(a.screen, b.screen, t);
        if p.x < 0.0 || p.y < 0.0 || p.x >= target.width as f32 || p.y >= target.height as f32 {
            continue;
        }
        let x = p.x as u32;
        let y = p.y as u32;
        let view_depth = 1.0 / (1.0 / a.inv_w + (1.0 / b.inv_w - 1.0 / a.inv_w) * t).max(1e-12) + WIREFRAME_DEPTH_BIAS;
        if view_depth < depth.get(x, y) {
            target.set(x, y, pack_color(color, 1.0));
            depth.set(x, y, view_depth);
        }
    }
}

/// Parallel tiled dispatch over horizontal bands, opt-in alongside the
/// sequential path (§5 permits tile-range parallelism as long as
/// depth/color writes for a pixel stay atomic with respect to overlapping
/// triangles of the same pass). Each band owns disjoint scanlines (its own
/// private color/depth buffer, merged back afterward), so bands never race;
/// the orchestrator default remains sequential. Builds one shader per
/// (band, face) from the face's own material, since `Shader` isn't `Clone`.
pub fn draw_faces_tiled(faces: &[ProjectedFace], context: &LightingContext, color: &mut ColorBuffer, depth: &mut DepthBuffer, is_transparent: bool, tile_rows: u32) {
    use rayon::prelude::*;

    let width = color.width;
    let height = color.height;
    let tile_rows = tile_rows.max(1);

    let mut bands: Vec<(u32, ColorBuffer, DepthBuffer)> = Vec::new();
    let mut y = 0;
    while y < height {
        let rows = tile_rows.min(height - y);
        let mut tile_color = ColorBuffer::new(width, rows);
        let mut tile_depth = DepthBuffer::new(width, rows);
        for x in 0..width {
            for row in 0..rows {
                tile_color.set(x, row, color.get(x, y + row));
                tile_depth.set(x, row, depth.get(x, y + row));
            }
        }
        bands.push((y, tile_color, tile_depth));
        y += rows;
    }

    bands.par_iter_mut().for_each(|(y0, tile_color, tile_depth)| {
        for face in faces {
            if face.vertices.len() < 3 {
                continue;
            }
            let mut shader = crate::fragment::make_shader(face.material.as_deref(), context.lighting_enabled);
            shader.initialize(face, context);
            let v0 = shifted_vertex(&face.vertices[0], *y0);
            for i in 1..face.vertices.len() - 1 {
                let v1 = shifted_vertex(&face.vertices[i], *y0);
                let v2 = shifted_vertex(&face.vertices[i + 1], *y0);
                draw_triangle(&v0, &v1, &v2, shader.as_mut(), context, tile_color, tile_depth, is_transparent);
            }
        }
    });

    for (y0, tile_color, tile_depth) in bands {
        for x in 0..width {
            for row in 0..tile_color.height {
                color.set(x, y0 + row, tile_color.get(x, row));
                depth.set(x, y0 + row, tile_depth.get(x, row));
            }
        }
    }
}

fn shifted_vertex(v: &ProjectedVertex, y_offset: u32) -> ProjectedVertex {
    let mut out = *v;
    out.screen.y -= y_offset as f32;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, Projection};
    use crate::fragment::make_shader;
    use crate::mesh::Face;
    use crate::projector::project_face;
    use crate::vertex::Vertex;
    use softraster_math::{Mat3, Mat4, Quaternion, SphericalHarmonics};

    fn facing_triangle_face() -> ProjectedFace {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Quaternion::IDENTITY, 1.0, Projection::Perspective { fov_deg: 60.0, near: 0.1, far: 100.0 });
        let face = Face::new(vec![
            Vertex::new(Vec3::new(-1.0, -1.0, 0.0)),
            Vertex::new(Vec3::new(1.0, -1.0, 0.0)),
            Vertex::new(Vec3::new(0.0, 1.0, 0.0)),
        ]);
        project_face(&face, &Mat4::IDENTITY, &Mat3::IDENTITY, &camera, 64.0, 64.0, false).unwrap()
    }

    #[test]
    fn opaque_triangle_writes_color_and_depth() {
        let face = facing_triangle_face();
        let mut color = ColorBuffer::new(64, 64);
        let mut depth = DepthBuffer::new(64, 64);
        let mut shader = make_shader(None, true);
        let context = LightingContext {
            camera_position: Vec3::new(0.0, 0.0, 5.0),
            lights: &[],
            shadows_enabled: false,
            lighting_enabled: true,
            sh_enabled: false,
            sh_coefficients: SphericalHarmonics::ZERO,
            gamma: 2.2,
            world_matrix: Mat4::IDENTITY,
            shadow_factor: None,
            reflections: None,
        };
        draw_face(&face, shader.as_mut(), &context, &mut color, &mut depth, false);

        let center = color.get(32, 34);
        assert!(center[3] > 0, "expected the triangle's interior to be written");
        assert!(depth.get(32, 34).is_finite());
    }

    #[test]
    fn triangle_outside_viewport_bounds_is_skipped_without_panicking() {
        let mut color = ColorBuffer::new(4, 4);
        let mut depth = DepthBuffer::new(4, 4);
        let v0 = ProjectedVertex { screen: Vec2::new(100.0, 100.0), ndc_z: 0.0, inv_w: 1.0, world_position: Vec3::ZERO, normal: Vec3::UP, uv: Vec2::ZERO, tangent: softraster_math::Vec4::new(1.0, 0.0, 0.0, 1.0) };
        let v1 = ProjectedVertex { screen: Vec2::new(120.0, 100.0), ..v0 };
        let v2 = ProjectedVertex { screen: Vec2::new(110.0, 120.0), ..v0 };
        let mut shader = make_shader(None, true);
        let context = LightingContext {
            camera_position: Vec3::ZERO,
            lights: &[],
            shadows_enabled: false,
            lighting_enabled: true,
            sh_enabled: false,
            sh_coefficients: SphericalHarmonics::ZERO,
            gamma: 2.2,
            world_matrix: Mat4::IDENTITY,
            shadow_factor: None,
            reflections: None,
        };
        draw_triangle(&v0, &v1, &v2, shader.as_mut(), &context, &mut color, &mut depth, false);
        assert_eq!(color.get(0, 0), [0, 0, 0, 0]);
    }
}
