//! Fixed-dimension vector kernel and root-finding helpers for contact times.

/// Fixed spatial dimension (3D).
pub const DIM: usize = 3;

/// A 3-vector.
pub type Vec3 = [f64; DIM];

pub const ZERO: Vec3 = [0.0; DIM];

#[inline]
pub fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn norm2(a: &Vec3) -> f64 {
    dot(a, a)
}

#[inline]
pub fn norm(a: &Vec3) -> f64 {
    norm2(a).sqrt()
}

#[inline]
pub fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: &Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// `a + b * s`, the streaming primitive.
#[inline]
pub fn add_scaled(a: &Vec3, b: &Vec3, s: f64) -> Vec3 {
    [a[0] + b[0] * s, a[1] + b[1] * s, a[2] + b[2] * s]
}

#[inline]
pub fn is_finite(a: &Vec3) -> bool {
    a.iter().all(|x| x.is_finite())
}

/// Time until `|r + v t| = rs` crossing inward, for the quadratic
/// `a t^2 + 2 b t + c = 0` with `a = v.v`, `b = r.v`, `c = r.r - rs^2`.
///
/// Requires an approaching pair (`b < 0`); the caller treats `b == 0` at
/// contact as grazing and asks for no event. Uses the product form of the
/// smaller root, which avoids cancellation when the closest approach is
/// near the shell.
#[inline]
pub fn sphere_in_root(a: f64, b: f64, c: f64) -> Option<f64> {
    if b >= 0.0 || c < 0.0 {
        return None;
    }
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let t = c / (-b + disc.sqrt());
    (t >= 0.0 && t.is_finite()).then_some(t)
}

/// Time until `|r + v t| = rs` crossing outward: the `+sqrt` root of the
/// same quadratic. Defined whenever the pair is currently inside the shell
/// (`c < 0`), regardless of the sign of `b`.
#[inline]
pub fn sphere_out_root(a: f64, b: f64, c: f64) -> Option<f64> {
    if a <= 0.0 {
        return None;
    }
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b + disc.sqrt()) / a;
    (t > 0.0 && t.is_finite()).then_some(t)
}
