//! Reference stroke geometry
//!
//! Host-side version of the math in the stroke shader. Nothing here produces
//! triangles; it answers point queries (hit testing) and lets tests check
//! coverage without a GPU. Keep it in step with the WGSL stroke shader;
//! the GPU crate's `coverage_matches_host_geometry` test compares the two.
//!
//! Coordinates are device pixels with the origin at the top-left, y down.

use std::f32::consts::TAU;

use crate::segment::{ArcParams, PathSegment, SegmentKind};
use crate::style::{LineCap, LineJoin, StrokeStyle};
use crate::Vec2;

/// Lengths below this are treated as zero
pub const EPSILON: f32 = 1e-4;

/// Number of Newton steps used for the closest point on an ellipse
const ARC_NEWTON_STEPS: usize = 4;

/// Below this `|A - 2B + C|^2` a quadratic is measured as its chord
const QUADRATIC_FLAT_EPSILON: f32 = 1e-3;

fn add(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] + b[0], a[1] + b[1]]
}

fn sub(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] - b[0], a[1] - b[1]]
}

fn scale(a: Vec2, s: f32) -> Vec2 {
    [a[0] * s, a[1] * s]
}

fn dot(a: Vec2, b: Vec2) -> f32 {
    a[0] * b[0] + a[1] * b[1]
}

fn length(a: Vec2) -> f32 {
    dot(a, a).sqrt()
}

fn distance(a: Vec2, b: Vec2) -> f32 {
    length(sub(a, b))
}

/// Counter-clockwise perpendicular (in a y-up frame)
fn perp(a: Vec2) -> Vec2 {
    [-a[1], a[0]]
}

fn rotate(a: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    [c * a[0] - s * a[1], s * a[0] + c * a[1]]
}

fn safe_normalize(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = length(v);
    if len > EPSILON {
        scale(v, 1.0 / len)
    } else {
        fallback
    }
}

/// An arc in centre parameterization
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedArc {
    pub center: Vec2,
    /// Radii after up-scaling (always large enough to reach both endpoints)
    pub rx: f32,
    pub ry: f32,
    pub phi: f32,
    /// Start angle on the unrotated ellipse
    pub theta1: f32,
    /// Signed sweep; positive when `sweep` was set
    pub dtheta: f32,
}

impl ResolvedArc {
    pub fn point_at(&self, theta: f32) -> Vec2 {
        let (s, c) = theta.sin_cos();
        add(self.center, rotate([self.rx * c, self.ry * s], self.phi))
    }

    /// Unit tangent in the direction of travel
    pub fn tangent_at(&self, theta: f32) -> Vec2 {
        let (s, c) = theta.sin_cos();
        let d = rotate([-self.rx * s, self.ry * c], self.phi);
        let d = safe_normalize(d, [1.0, 0.0]);
        scale(d, self.dtheta.signum())
    }

    /// Angle reached at parameter `t` in [0, 1]
    pub fn angle_at(&self, t: f32) -> f32 {
        self.theta1 + t * self.dtheta
    }
}

/// Endpoint-to-centre conversion for an elliptical arc.
///
/// Returns `None` when the arc cannot be drawn: a zero radius or coincident
/// endpoints. Radii too small to span the chord are scaled up uniformly.
pub fn resolve_arc(start: Vec2, end: Vec2, params: &ArcParams) -> Option<ResolvedArc> {
    let mut rx = params.rx.abs();
    let mut ry = params.ry.abs();
    if rx < EPSILON || ry < EPSILON || distance(start, end) < EPSILON {
        return None;
    }

    let phi = params.phi;
    let half = scale(sub(start, end), 0.5);
    let p1 = rotate(half, -phi);

    let lambda = (p1[0] * p1[0]) / (rx * rx) + (p1[1] * p1[1]) / (ry * ry);
    if lambda > 1.0 {
        let k = lambda.sqrt();
        rx *= k;
        ry *= k;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * p1[1] * p1[1] - ry2 * p1[0] * p1[0];
    let den = rx2 * p1[1] * p1[1] + ry2 * p1[0] * p1[0];
    let mut coef = if den > 0.0 { (num / den).max(0.0).sqrt() } else { 0.0 };
    if params.large_arc == params.sweep {
        coef = -coef;
    }

    let center_local = [coef * rx * p1[1] / ry, -coef * ry * p1[0] / rx];
    let mid = scale(add(start, end), 0.5);
    let center = add(rotate(center_local, phi), mid);

    let u = [(p1[0] - center_local[0]) / rx, (p1[1] - center_local[1]) / ry];
    let v = [(-p1[0] - center_local[0]) / rx, (-p1[1] - center_local[1]) / ry];
    let theta1 = u[1].atan2(u[0]);
    let mut dtheta = v[1].atan2(v[0]) - theta1;
    if params.sweep && dtheta < 0.0 {
        dtheta += TAU;
    } else if !params.sweep && dtheta > 0.0 {
        dtheta -= TAU;
    }

    Some(ResolvedArc {
        center,
        rx,
        ry,
        phi,
        theta1,
        dtheta,
    })
}

/// Point on the centreline at parameter `t` in [0, 1].
///
/// `None` for an arc that cannot be resolved.
pub fn evaluate(segment: &PathSegment, t: f32) -> Option<Vec2> {
    let (a, b) = (segment.start, segment.end);
    match segment.kind {
        SegmentKind::Line => Some(add(a, scale(sub(b, a), t))),
        SegmentKind::Quadratic { control } => {
            let mt = 1.0 - t;
            Some(add(
                add(scale(a, mt * mt), scale(control, 2.0 * mt * t)),
                scale(b, t * t),
            ))
        }
        SegmentKind::Arc(params) => {
            let arc = resolve_arc(a, b, &params)?;
            Some(arc.point_at(arc.angle_at(t)))
        }
    }
}

/// Result of a closest-point query against a centreline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestPoint {
    /// Parameter of the closest point, clamped to [0, 1]
    pub t: f32,
    pub point: Vec2,
    pub distance: f32,
}

fn closest_on_line(a: Vec2, b: Vec2, p: Vec2) -> Option<ClosestPoint> {
    let ab = sub(b, a);
    let len2 = dot(ab, ab);
    if len2 < EPSILON * EPSILON {
        return None;
    }
    let t = (dot(sub(p, a), ab) / len2).clamp(0.0, 1.0);
    let point = add(a, scale(ab, t));
    Some(ClosestPoint {
        t,
        point,
        distance: distance(p, point),
    })
}

/// Closed-form closest point on a quadratic Bezier (cubic root solve)
fn closest_on_quadratic(a: Vec2, control: Vec2, c: Vec2, p: Vec2) -> Option<ClosestPoint> {
    if distance(a, control) < EPSILON && distance(c, control) < EPSILON {
        return None;
    }

    let qa = sub(control, a);
    let qb = add(sub(a, scale(control, 2.0)), c);
    if dot(qb, qb) < QUADRATIC_FLAT_EPSILON {
        return closest_on_line(a, c, p);
    }
    let qc = scale(qa, 2.0);
    let qd = sub(a, p);

    let kk = 1.0 / dot(qb, qb);
    let kx = kk * dot(qa, qb);
    let ky = kk * (2.0 * dot(qa, qa) + dot(qd, qb)) / 3.0;
    let kz = kk * dot(qd, qa);

    let pp = ky - kx * kx;
    let q = kx * (2.0 * kx * kx - 3.0 * ky) + kz;
    let h = q * q + 4.0 * pp * pp * pp;

    let at = |t: f32| add(qd, scale(add(qc, scale(qb, t)), t));
    let mut best_t = 0.0;
    let mut best_d2 = f32::INFINITY;
    let mut consider = |t: f32| {
        let t = t.clamp(0.0, 1.0);
        let d = at(t);
        let d2 = dot(d, d);
        if d2 < best_d2 {
            best_d2 = d2;
            best_t = t;
        }
    };

    if h >= 0.0 {
        let h = h.sqrt();
        let x0 = ((h - q) * 0.5).cbrt();
        let x1 = ((-h - q) * 0.5).cbrt();
        consider(x0 + x1 - kx);
    } else {
        let z = (-pp).sqrt();
        let v = (q / (pp * z * 2.0)).clamp(-1.0, 1.0).acos() / 3.0;
        let m = v.cos();
        let n = v.sin() * 3f32.sqrt();
        consider((m + m) * z - kx);
        consider((-n - m) * z - kx);
        consider((n - m) * z - kx);
    }

    let mt = 1.0 - best_t;
    let point = add(
        add(scale(a, mt * mt), scale(control, 2.0 * mt * best_t)),
        scale(c, best_t * best_t),
    );
    Some(ClosestPoint {
        t: best_t,
        point,
        distance: best_d2.sqrt(),
    })
}

fn closest_on_arc(arc: &ResolvedArc, p: Vec2) -> ClosestPoint {
    let q = rotate(sub(p, arc.center), -arc.phi);
    let (rx, ry) = (arc.rx, arc.ry);
    let k = ry * ry - rx * rx;

    let mut theta = (q[1] * rx).atan2(q[0] * ry);
    for _ in 0..ARC_NEWTON_STEPS {
        let (s, c) = theta.sin_cos();
        let f = k * s * c + q[0] * rx * s - q[1] * ry * c;
        let fp = k * (c * c - s * s) + q[0] * rx * c + q[1] * ry * s;
        if fp > EPSILON {
            theta -= f / fp;
        }
    }

    // Angle travelled from theta1 in the sweep direction, wrapped to [0, TAU)
    let span = arc.dtheta.abs();
    let travelled = ((theta - arc.theta1) * arc.dtheta.signum()).rem_euclid(TAU);
    let t = if span < EPSILON {
        0.0
    } else if travelled <= span {
        travelled / span
    } else {
        let start = arc.point_at(arc.theta1);
        let end = arc.point_at(arc.theta1 + arc.dtheta);
        if distance(p, end) < distance(p, start) {
            1.0
        } else {
            0.0
        }
    };

    let point = arc.point_at(arc.angle_at(t));
    ClosestPoint {
        t,
        point,
        distance: distance(p, point),
    }
}

/// Closest point on the segment's centreline.
///
/// `None` for degenerate segments (zero-length line, collapsed quadratic,
/// unresolvable arc); these draw nothing.
pub fn closest_point(segment: &PathSegment, p: Vec2) -> Option<ClosestPoint> {
    match segment.kind {
        SegmentKind::Line => closest_on_line(segment.start, segment.end, p),
        SegmentKind::Quadratic { control } => {
            closest_on_quadratic(segment.start, control, segment.end, p)
        }
        SegmentKind::Arc(params) => {
            let arc = resolve_arc(segment.start, segment.end, &params)?;
            Some(closest_on_arc(&arc, p))
        }
    }
}

/// Unit travel directions at the start and end of the centreline
pub fn end_tangents(segment: &PathSegment) -> Option<(Vec2, Vec2)> {
    let chord = safe_normalize(sub(segment.end, segment.start), [1.0, 0.0]);
    match segment.kind {
        SegmentKind::Line => {
            if distance(segment.start, segment.end) < EPSILON {
                None
            } else {
                Some((chord, chord))
            }
        }
        SegmentKind::Quadratic { control } => Some((
            safe_normalize(sub(control, segment.start), chord),
            safe_normalize(sub(segment.end, control), chord),
        )),
        SegmentKind::Arc(params) => {
            let arc = resolve_arc(segment.start, segment.end, &params)?;
            Some((
                arc.tangent_at(arc.theta1),
                arc.tangent_at(arc.theta1 + arc.dtheta),
            ))
        }
    }
}

/// Signed distance to the stroke boundary beyond one end of the centreline.
///
/// `out_dir` points away from the segment body, `next_dir` is the travel
/// direction continuing into the neighbour (only meaningful when `joined`).
fn end_distance(
    rel: Vec2,
    out_dir: Vec2,
    next_dir: Vec2,
    joined: bool,
    style: &StrokeStyle,
) -> f32 {
    let hw = style.half_width();
    let along = dot(rel, out_dir);
    if along <= 0.0 {
        return length(rel) - hw;
    }
    let across = dot(rel, perp(out_dir)).abs() - hw;

    if !joined {
        return match style.cap {
            LineCap::Round => length(rel) - hw,
            LineCap::Butt | LineCap::None => across.max(along),
        };
    }

    let turn = dot(next_dir, perp(out_dir));
    let side = if turn > 0.0 { -1.0 } else { 1.0 };
    let n_a = scale(perp(out_dir), side);
    let n_b = scale(perp(next_dir), side);
    let m = safe_normalize(add(n_a, n_b), out_dir);

    // Inner side of the turn: the extended edge meets the neighbour's edge
    if dot(rel, m) <= 0.0 {
        return across;
    }

    let cos_half = ((1.0 + dot(n_a, n_b)) * 0.5).max(0.0).sqrt();
    match style.join {
        LineJoin::Round => length(rel) - hw,
        LineJoin::Miter if cos_half * style.miter_limit >= 1.0 => across,
        LineJoin::Miter | LineJoin::Bevel => across.max(dot(rel, m) - hw * cos_half),
    }
}

/// Signed distance from `p` to the stroked outline of `segment`.
///
/// Negative inside. Returns `None` when the segment is degenerate or when the
/// point lies across a join bisector within the neighbour's reach, so the
/// neighbour draws it instead.
pub fn stroke_distance(segment: &PathSegment, style: &StrokeStyle, p: Vec2) -> Option<f32> {
    let closest = closest_point(segment, p)?;
    let (t0, t1) = end_tangents(segment)?;
    let hw = style.half_width();

    let start_joined = distance(segment.prev, segment.start) > EPSILON;
    let end_joined = distance(segment.next, segment.end) > EPSILON;
    let d_in = safe_normalize(sub(segment.start, segment.prev), t0);
    let d_out = safe_normalize(sub(segment.next, segment.end), t1);

    // Share the join area with the neighbour along the bisector. Past the
    // bisector the neighbour is closer, but it only paints what it reaches:
    // pixels of our own body beyond the neighbour's far end stay ours.
    if end_joined && closest.t > 0.5 {
        let rel = sub(p, segment.end);
        let h = add(t1, d_out);
        let reach = distance(segment.next, segment.end);
        if length(h) > EPSILON
            && dot(rel, h) > 0.0
            && (closest.t >= 1.0 || dot(rel, d_out) <= reach)
        {
            return None;
        }
    }
    if start_joined && closest.t < 0.5 {
        let rel = sub(p, segment.start);
        let h = add(scale(t0, -1.0), scale(d_in, -1.0));
        let reach = distance(segment.prev, segment.start);
        if length(h) > EPSILON
            && dot(rel, h) >= 0.0
            && (closest.t <= 0.0 || -dot(rel, d_in) <= reach)
        {
            return None;
        }
    }

    let d = if closest.t <= 0.0 {
        end_distance(
            sub(p, segment.start),
            scale(t0, -1.0),
            scale(d_in, -1.0),
            start_joined,
            style,
        )
    } else if closest.t >= 1.0 {
        end_distance(sub(p, segment.end), t1, d_out, end_joined, style)
    } else {
        closest.distance - hw
    };
    Some(d)
}

/// Antialiased coverage for a signed distance (one pixel ramp)
pub fn coverage(signed_distance: f32) -> f32 {
    (0.5 - signed_distance).clamp(0.0, 1.0)
}
