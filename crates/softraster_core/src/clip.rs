//! Generic Sutherland-Hodgman polygon clipping against a single plane,
//! reused by the geometry stage's near-plane clip (§4.C) and the shadow
//! subsystem's seven-plane homogeneous clip (§4.F).

/// Clips a convex polygon against one plane, given as a signed distance
/// function (inside is `>= 0`) and a linear interpolator between two
/// vertices at parameter `t`.
pub fn clip_against_plane<V: Copy>(
    verts: &[V],
    distance: impl Fn(&V) -> f32,
    lerp: impl Fn(&V, &V, f32) -> V,
) -> Vec<V> {
    if verts.len() < 2 {
        return Vec::new();
    }
    let n = verts.len();
    let mut output = Vec::with_capacity(n + 1);
    for i in 0..n {
        let current = verts[i];
        let previous = verts[(i + n - 1) % n];
        let current_dist = distance(&current);
        let previous_dist = distance(&previous);

        if current_dist >= 0.0 {
            if previous_dist < 0.0 {
                let t = previous_dist / (previous_dist - current_dist);
                output.push(lerp(&previous, &current, t));
            }
            output.push(current);
        } else if previous_dist >= 0.0 {
            let t = previous_dist / (previous_dist - current_dist);
            output.push(lerp(&previous, &current, t));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_fully_inside_is_unchanged() {
        let verts = [0.0_f32, 1.0, 2.0];
        let out = clip_against_plane(&verts, |&v| v, |a, b, t| a + (b - a) * t);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn triangle_fully_outside_is_empty() {
        let verts = [-1.0_f32, -2.0, -3.0];
        let out = clip_against_plane(&verts, |&v| v, |a, b, t| a + (b - a) * t);
        assert!(out.is_empty());
    }
}
