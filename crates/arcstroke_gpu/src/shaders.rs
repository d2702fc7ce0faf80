//! WGSL shaders
//!
//! - Instanced stroke shader (lines, quadratic curves, elliptical arcs)
//! - Full-screen blit (shared vertex stage, pass-through fragment)
//!
//! Vertex inputs must stay in step with the tables in `attributes.rs`, and the
//! stroke math with `arcstroke_core::geometry`.

/// Instanced stroke shader
///
/// Each instance is one path segment. The vertex stage stretches the unit quad
/// over an oriented box bounding the stroked segment (joins and caps
/// included); the fragment stage measures the distance to the centreline and
/// shades with a one-pixel antialiasing ramp.
///
/// Pixel space has its origin at the top-left with y down.
pub const STROKE_SHADER: &str = r#"
struct Uniforms {
    resolution: vec2<f32>,
    line_width: f32,
    miter_limit: f32,
    line_join: u32,
    line_cap: u32,
    _pad0: u32,
    _pad1: u32,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

const KIND_LINE: u32 = 0u;
const KIND_QUADRATIC: u32 = 1u;
const KIND_ARC: u32 = 2u;

const JOIN_MITER: u32 = 0u;
const JOIN_ROUND: u32 = 1u;
const JOIN_BEVEL: u32 = 2u;

const CAP_NONE: u32 = 0u;
const CAP_BUTT: u32 = 1u;
const CAP_ROUND: u32 = 2u;

const EPSILON: f32 = 0.0001;
const AA_WIDTH: f32 = 1.0;
const TAU: f32 = 6.283185307179586;
const QUADRATIC_FLAT_EPSILON: f32 = 0.001;
const ARC_NEWTON_STEPS: i32 = 4;

struct VertexInput {
    @location(0) corner: vec2<f32>,
    @location(1) start_pos: vec2<f32>,
    @location(2) end_pos: vec2<f32>,
    @location(3) prev_pos: vec2<f32>,
    @location(4) next_pos: vec2<f32>,
    @location(5) kind: u32,
    @location(6) cp: vec4<f32>,
    @location(7) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) pixel: vec2<f32>,
    @location(1) @interpolate(flat) color: vec4<f32>,
    @location(2) @interpolate(flat) start_pos: vec2<f32>,
    @location(3) @interpolate(flat) end_pos: vec2<f32>,
    @location(4) @interpolate(flat) prev_pos: vec2<f32>,
    @location(5) @interpolate(flat) next_pos: vec2<f32>,
    @location(6) @interpolate(flat) cp: vec4<f32>,
    @location(7) @interpolate(flat) kind: u32,
    // (cx, cy, rx, ry) of the resolved ellipse
    @location(8) @interpolate(flat) arc_center: vec4<f32>,
    // (theta1, dtheta, phi, valid)
    @location(9) @interpolate(flat) arc_angles: vec4<f32>,
}

struct Arc {
    center: vec2<f32>,
    radii: vec2<f32>,
    phi: f32,
    theta1: f32,
    dtheta: f32,
    valid: bool,
}

struct Closest {
    t: f32,
    point: vec2<f32>,
    dist: f32,
}

fn perp(v: vec2<f32>) -> vec2<f32> {
    return vec2<f32>(-v.y, v.x);
}

fn rotate(v: vec2<f32>, angle: f32) -> vec2<f32> {
    let s = sin(angle);
    let c = cos(angle);
    return vec2<f32>(c * v.x - s * v.y, s * v.x + c * v.y);
}

fn safe_normalize(v: vec2<f32>, fallback: vec2<f32>) -> vec2<f32> {
    let len = length(v);
    if len > EPSILON {
        return v / len;
    }
    return fallback;
}

// SVG endpoint-to-centre conversion. cp = (rx, ry, phi, flags),
// flags bit 0 = large arc, bit 1 = sweep.
fn resolve_arc(p0: vec2<f32>, p1: vec2<f32>, cp: vec4<f32>) -> Arc {
    var arc: Arc;
    arc.valid = false;
    arc.phi = cp.z;

    var rx = abs(cp.x);
    var ry = abs(cp.y);
    let flags = u32(max(cp.w, 0.0));
    let large_arc = (flags & 1u) != 0u;
    let sweep = (flags & 2u) != 0u;
    if rx < EPSILON || ry < EPSILON || distance(p0, p1) < EPSILON {
        return arc;
    }

    let q = rotate((p0 - p1) * 0.5, -arc.phi);
    let lambda = (q.x * q.x) / (rx * rx) + (q.y * q.y) / (ry * ry);
    if lambda > 1.0 {
        let k = sqrt(lambda);
        rx = rx * k;
        ry = ry * k;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * q.y * q.y - ry2 * q.x * q.x;
    let den = rx2 * q.y * q.y + ry2 * q.x * q.x;
    var coef: f32 = 0.0;
    if den > 0.0 {
        coef = sqrt(max(num / den, 0.0));
    }
    if large_arc == sweep {
        coef = -coef;
    }

    let c_local = vec2<f32>(coef * rx * q.y / ry, -coef * ry * q.x / rx);
    arc.center = rotate(c_local, arc.phi) + (p0 + p1) * 0.5;
    arc.radii = vec2<f32>(rx, ry);

    let u = (q - c_local) / arc.radii;
    let v = (-q - c_local) / arc.radii;
    arc.theta1 = atan2(u.y, u.x);
    var dtheta = atan2(v.y, v.x) - arc.theta1;
    if sweep && dtheta < 0.0 {
        dtheta = dtheta + TAU;
    } else if !sweep && dtheta > 0.0 {
        dtheta = dtheta - TAU;
    }
    arc.dtheta = dtheta;
    arc.valid = true;
    return arc;
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.color = input.color;
    out.start_pos = input.start_pos;
    out.end_pos = input.end_pos;
    out.prev_pos = input.prev_pos;
    out.next_pos = input.next_pos;
    out.cp = input.cp;
    out.kind = input.kind;
    out.arc_center = vec4<f32>(0.0);
    out.arc_angles = vec4<f32>(0.0);

    let hw = max(uniforms.line_width * 0.5, 0.0);
    var pad = hw + AA_WIDTH;
    if uniforms.line_join == JOIN_MITER {
        pad = hw * max(uniforms.miter_limit, 1.0) + AA_WIDTH;
    }

    // Oriented box: origin + axis_u * x + perp(axis_u) * y for (x, y) in [lo, hi]
    var origin = input.start_pos;
    var axis_u = vec2<f32>(1.0, 0.0);
    var lo = vec2<f32>(0.0);
    var hi = vec2<f32>(0.0);
    var degenerate = false;

    let chord = input.end_pos - input.start_pos;
    if input.kind == KIND_ARC {
        let arc = resolve_arc(input.start_pos, input.end_pos, input.cp);
        if arc.valid {
            origin = arc.center;
            axis_u = vec2<f32>(cos(arc.phi), sin(arc.phi));
            lo = -arc.radii;
            hi = arc.radii;
            out.arc_center = vec4<f32>(arc.center, arc.radii);
            out.arc_angles = vec4<f32>(arc.theta1, arc.dtheta, arc.phi, 1.0);
        } else {
            degenerate = true;
        }
    } else if input.kind == KIND_QUADRATIC {
        let control = input.cp.xy;
        if distance(input.start_pos, control) < EPSILON && distance(input.end_pos, control) < EPSILON {
            degenerate = true;
        } else {
            axis_u = safe_normalize(chord, safe_normalize(control - input.start_pos, vec2<f32>(1.0, 0.0)));
            let axis_v = perp(axis_u);
            let c = control - origin;
            let e = input.end_pos - origin;
            let cl = vec2<f32>(dot(c, axis_u), dot(c, axis_v));
            let el = vec2<f32>(dot(e, axis_u), dot(e, axis_v));
            lo = min(vec2<f32>(0.0), min(cl, el));
            hi = max(vec2<f32>(0.0), max(cl, el));
        }
    } else {
        let len = length(chord);
        if len < EPSILON {
            degenerate = true;
        } else {
            axis_u = chord / len;
            hi = vec2<f32>(len, 0.0);
        }
    }

    lo = lo - vec2<f32>(pad);
    hi = hi + vec2<f32>(pad);
    let box_pos = mix(lo, hi, input.corner + vec2<f32>(0.5));
    var pixel = origin + axis_u * box_pos.x + perp(axis_u) * box_pos.y;
    if degenerate {
        // Zero-area primitive: every corner lands on the same point
        pixel = input.start_pos;
    }

    out.pixel = pixel;
    let ndc = vec2<f32>(
        pixel.x / uniforms.resolution.x * 2.0 - 1.0,
        1.0 - pixel.y / uniforms.resolution.y * 2.0,
    );
    out.position = vec4<f32>(ndc, 0.0, 1.0);
    return out;
}

fn closest_on_line(a: vec2<f32>, b: vec2<f32>, p: vec2<f32>) -> Closest {
    let ab = b - a;
    let t = clamp(dot(p - a, ab) / max(dot(ab, ab), EPSILON * EPSILON), 0.0, 1.0);
    let q = a + ab * t;
    return Closest(t, q, distance(p, q));
}

fn quad_point(a: vec2<f32>, control: vec2<f32>, b: vec2<f32>, t: f32) -> vec2<f32> {
    let mt = 1.0 - t;
    return a * (mt * mt) + control * (2.0 * mt * t) + b * (t * t);
}

fn quad_dist2(qd: vec2<f32>, qc: vec2<f32>, qb: vec2<f32>, t: f32) -> f32 {
    let d = qd + (qc + qb * t) * t;
    return dot(d, d);
}

// Closed-form closest point on a quadratic Bezier (roots of a cubic)
fn closest_on_quadratic(a: vec2<f32>, control: vec2<f32>, c: vec2<f32>, p: vec2<f32>) -> Closest {
    let qa = control - a;
    let qb = a - 2.0 * control + c;
    if dot(qb, qb) < QUADRATIC_FLAT_EPSILON {
        return closest_on_line(a, c, p);
    }
    let qc = qa * 2.0;
    let qd = a - p;

    let kk = 1.0 / dot(qb, qb);
    let kx = kk * dot(qa, qb);
    let ky = kk * (2.0 * dot(qa, qa) + dot(qd, qb)) / 3.0;
    let kz = kk * dot(qd, qa);

    let pp = ky - kx * kx;
    let q = kx * (2.0 * kx * kx - 3.0 * ky) + kz;
    let h = q * q + 4.0 * pp * pp * pp;

    var best_t: f32 = 0.0;
    if h >= 0.0 {
        let hs = sqrt(h);
        let x = (vec2<f32>(hs, -hs) - q) * 0.5;
        let uv = sign(x) * pow(abs(x), vec2<f32>(1.0 / 3.0));
        best_t = clamp(uv.x + uv.y - kx, 0.0, 1.0);
    } else {
        let z = sqrt(-pp);
        let v = acos(clamp(q / (pp * z * 2.0), -1.0, 1.0)) / 3.0;
        let m = cos(v);
        let n = sin(v) * 1.732050808;
        let ts = clamp(vec3<f32>(m + m, -n - m, n - m) * z - kx, vec3<f32>(0.0), vec3<f32>(1.0));
        best_t = ts.x;
        var best = quad_dist2(qd, qc, qb, ts.x);
        let dy = quad_dist2(qd, qc, qb, ts.y);
        if dy < best {
            best = dy;
            best_t = ts.y;
        }
        if quad_dist2(qd, qc, qb, ts.z) < best {
            best_t = ts.z;
        }
    }

    let point = quad_point(a, control, c, best_t);
    return Closest(best_t, point, distance(p, point));
}

fn arc_point(center: vec2<f32>, radii: vec2<f32>, phi: f32, theta: f32) -> vec2<f32> {
    return center + rotate(vec2<f32>(radii.x * cos(theta), radii.y * sin(theta)), phi);
}

fn arc_tangent(radii: vec2<f32>, angles: vec4<f32>, theta: f32) -> vec2<f32> {
    let d = rotate(vec2<f32>(-radii.x * sin(theta), radii.y * cos(theta)), angles.z);
    return safe_normalize(d, vec2<f32>(1.0, 0.0)) * sign(angles.y);
}

// Newton iteration on the unrotated ellipse, then clamp to the swept span
fn closest_on_arc(center: vec2<f32>, radii: vec2<f32>, angles: vec4<f32>, p: vec2<f32>) -> Closest {
    let theta1 = angles.x;
    let dtheta = angles.y;
    let phi = angles.z;
    let q = rotate(p - center, -phi);
    let rx = radii.x;
    let ry = radii.y;
    let k = ry * ry - rx * rx;

    var theta = atan2(q.y * rx, q.x * ry);
    for (var i = 0; i < ARC_NEWTON_STEPS; i = i + 1) {
        let s = sin(theta);
        let c = cos(theta);
        let f = k * s * c + q.x * rx * s - q.y * ry * c;
        let fp = k * (c * c - s * s) + q.x * rx * c + q.y * ry * s;
        if fp > EPSILON {
            theta = theta - f / fp;
        }
    }

    let span = abs(dtheta);
    let rel = (theta - theta1) * sign(dtheta);
    let travelled = rel - TAU * floor(rel / TAU);
    var t: f32 = 0.0;
    if span < EPSILON {
        t = 0.0;
    } else if travelled <= span {
        t = travelled / span;
    } else {
        let ps = arc_point(center, radii, phi, theta1);
        let pe = arc_point(center, radii, phi, theta1 + dtheta);
        if distance(p, pe) < distance(p, ps) {
            t = 1.0;
        }
    }

    let point = arc_point(center, radii, phi, theta1 + t * dtheta);
    return Closest(t, point, distance(p, point));
}

// Signed distance beyond one end. out_dir points away from the body,
// next_dir continues into the neighbour (only used when joined).
fn end_distance(rel: vec2<f32>, out_dir: vec2<f32>, next_dir: vec2<f32>, joined: bool, hw: f32) -> f32 {
    let along = dot(rel, out_dir);
    if along <= 0.0 {
        return length(rel) - hw;
    }
    let across = abs(dot(rel, perp(out_dir))) - hw;

    if !joined {
        if uniforms.line_cap == CAP_ROUND {
            return length(rel) - hw;
        }
        // none and butt both stop at the endpoint
        return max(across, along);
    }

    let turn = dot(next_dir, perp(out_dir));
    var side: f32 = 1.0;
    if turn > 0.0 {
        side = -1.0;
    }
    let n_a = perp(out_dir) * side;
    let n_b = perp(next_dir) * side;
    let m = safe_normalize(n_a + n_b, out_dir);

    // Inner side of the turn
    if dot(rel, m) <= 0.0 {
        return across;
    }

    let cos_half = sqrt(max((1.0 + dot(n_a, n_b)) * 0.5, 0.0));
    if uniforms.line_join == JOIN_ROUND {
        return length(rel) - hw;
    }
    if uniforms.line_join == JOIN_MITER && cos_half * uniforms.miter_limit >= 1.0 {
        return across;
    }
    // Bevel, or a miter past its limit
    return max(across, dot(rel, m) - hw * cos_half);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let p = input.pixel;
    let a = input.start_pos;
    let b = input.end_pos;
    let chord_dir = safe_normalize(b - a, vec2<f32>(1.0, 0.0));

    var closest: Closest;
    var t0 = chord_dir;
    var t1 = chord_dir;
    if input.kind == KIND_ARC {
        if input.arc_angles.w < 0.5 {
            discard;
        }
        let radii = input.arc_center.zw;
        closest = closest_on_arc(input.arc_center.xy, radii, input.arc_angles, p);
        t0 = arc_tangent(radii, input.arc_angles, input.arc_angles.x);
        t1 = arc_tangent(radii, input.arc_angles, input.arc_angles.x + input.arc_angles.y);
    } else if input.kind == KIND_QUADRATIC {
        let control = input.cp.xy;
        closest = closest_on_quadratic(a, control, b, p);
        t0 = safe_normalize(control - a, chord_dir);
        t1 = safe_normalize(b - control, chord_dir);
    } else {
        closest = closest_on_line(a, b, p);
    }

    let hw = max(uniforms.line_width * 0.5, 0.0);
    let start_joined = distance(input.prev_pos, a) > EPSILON;
    let end_joined = distance(input.next_pos, b) > EPSILON;
    let d_in = safe_normalize(a - input.prev_pos, t0);
    let d_out = safe_normalize(input.next_pos - b, t1);

    // Each join is split along the bisector so no pixel is blended twice.
    // Only pixels the neighbour reaches are handed over.
    if end_joined && closest.t > 0.5 {
        let h = t1 + d_out;
        let reach = distance(input.next_pos, b);
        let handed_over = closest.t >= 1.0 || dot(p - b, d_out) <= reach;
        if length(h) > EPSILON && dot(p - b, h) > 0.0 && handed_over {
            discard;
        }
    }
    if start_joined && closest.t < 0.5 {
        let h = -t0 - d_in;
        let reach = distance(input.prev_pos, a);
        let handed_over = closest.t <= 0.0 || -dot(p - a, d_in) <= reach;
        if length(h) > EPSILON && dot(p - a, h) >= 0.0 && handed_over {
            discard;
        }
    }

    var d = closest.dist - hw;
    if closest.t <= 0.0 {
        d = end_distance(p - a, -t0, -d_in, start_joined, hw);
    } else if closest.t >= 1.0 {
        d = end_distance(p - b, t1, d_out, end_joined, hw);
    }

    let coverage = clamp(0.5 - d, 0.0, 1.0);
    if coverage <= 0.0 {
        discard;
    }
    return vec4<f32>(input.color.rgb, input.color.a * coverage);
}
"#;

/// Vertex stage and bindings shared by every blit fragment stage
///
/// A custom effect appended to this prelude must define
/// `@fragment fn fs_main(input: BlitVertexOutput) -> @location(0) vec4<f32>`
/// and may sample `source_texture` with `source_sampler`.
pub const BLIT_VERTEX: &str = r#"
struct BlitVertexInput {
    @location(0) position: vec2<f32>,
    @location(1) tex_coord: vec2<f32>,
}

struct BlitVertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
}

@group(0) @binding(0)
var source_texture: texture_2d<f32>;
@group(0) @binding(1)
var source_sampler: sampler;

@vertex
fn vs_main(input: BlitVertexInput) -> BlitVertexOutput {
    var out: BlitVertexOutput;
    out.position = vec4<f32>(input.position, 0.0, 1.0);
    out.tex_coord = input.tex_coord;
    return out;
}
"#;

/// Pass-through blit fragment stage
pub const BLIT_FRAGMENT: &str = r#"
@fragment
fn fs_main(input: BlitVertexOutput) -> @location(0) vec4<f32> {
    return textureSample(source_texture, source_sampler, input.tex_coord);
}
"#;

/// Full blit module source for a fragment stage (`None` = pass-through)
pub fn blit_shader_source(effect: Option<&str>) -> String {
    let mut source = String::from(BLIT_VERTEX);
    source.push_str(effect.unwrap_or(BLIT_FRAGMENT));
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeDescriptor, ScalarKind, BLIT_ATTRIBUTES, STROKE_ATTRIBUTES};

    fn parse(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{}", e.emit_to_string(source)));
        module
    }

    /// (location, components, scalar) for each vertex input of `vs_main`
    fn vertex_inputs(module: &naga::Module) -> Vec<(u32, u32, ScalarKind)> {
        let ep = module
            .entry_points
            .iter()
            .find(|ep| ep.name == "vs_main")
            .expect("vs_main entry point");
        let arg = &ep.function.arguments[0];
        let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner else {
            panic!("vertex input is not a struct");
        };

        let mut inputs = Vec::new();
        for member in members {
            let Some(naga::Binding::Location { location, .. }) = member.binding else {
                continue;
            };
            let (components, scalar) = match module.types[member.ty].inner {
                naga::TypeInner::Scalar(s) => (1, s),
                naga::TypeInner::Vector { size, scalar } => (size as u32, scalar),
                ref other => panic!("unexpected input type {other:?}"),
            };
            let kind = match scalar.kind {
                naga::ScalarKind::Float => ScalarKind::Float32,
                naga::ScalarKind::Uint => ScalarKind::Uint32,
                other => panic!("unexpected scalar kind {other:?}"),
            };
            inputs.push((location, components, kind));
        }
        inputs.sort_by_key(|(location, ..)| *location);
        inputs
    }

    fn table_inputs<R>(table: &[AttributeDescriptor<R>]) -> Vec<(u32, u32, ScalarKind)> {
        table
            .iter()
            .enumerate()
            .map(|(i, a)| (i as u32, a.components, a.scalar))
            .collect()
    }

    #[test]
    fn stroke_shader_validates() {
        let module = parse(STROKE_SHADER);
        let stages: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert!(stages.contains(&"vs_main"));
        assert!(stages.contains(&"fs_main"));
    }

    #[test]
    fn stroke_inputs_match_attribute_table() {
        let module = parse(STROKE_SHADER);
        assert_eq!(vertex_inputs(&module), table_inputs(&STROKE_ATTRIBUTES));
    }

    #[test]
    fn blit_inputs_match_attribute_table() {
        let module = parse(&blit_shader_source(None));
        assert_eq!(vertex_inputs(&module), table_inputs(&BLIT_ATTRIBUTES));
    }

    #[test]
    fn custom_blit_effect_validates() {
        let effect = r#"
@fragment
fn fs_main(input: BlitVertexOutput) -> @location(0) vec4<f32> {
    let c = textureSample(source_texture, source_sampler, input.tex_coord);
    return vec4<f32>(vec3<f32>(1.0) - c.rgb, c.a);
}
"#;
        parse(&blit_shader_source(Some(effect)));
    }

    #[test]
    fn uniform_block_is_32_bytes() {
        let module = parse(STROKE_SHADER);
        let (_, var) = module
            .global_variables
            .iter()
            .find(|(_, v)| v.name.as_deref() == Some("uniforms"))
            .expect("uniforms binding");
        assert_eq!(module.types[var.ty].inner.size(module.to_ctx()), 32);
    }
}
