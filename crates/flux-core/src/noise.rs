//! 3D simplex noise and a divergence-free curl field built from it.
//!
//! The arithmetic mirrors `shaders/noise.wgsl` operation for operation so the
//! CPU and GPU integrators sample the same flow.

use crate::constants::CURL_EPSILON;
use glam::{Vec3, Vec4};

// Offsets decorrelating the three potential components.
const POTENTIAL_Y: Vec3 = Vec3::new(31.416, 47.853, 12.793);
const POTENTIAL_Z: Vec3 = Vec3::new(-17.31, 23.11, 59.07);

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute(x: Vec4) -> Vec4 {
    mod289_4((x * 34.0 + 1.0) * x)
}

fn taylor_inv_sqrt(r: Vec4) -> Vec4 {
    Vec4::splat(1.792_842_9) - r * 0.853_734_7
}

// WGSL/GLSL `step(edge, x)`.
fn step3(edge: Vec3, x: Vec3) -> Vec3 {
    Vec3::select(x.cmpge(edge), Vec3::ONE, Vec3::ZERO)
}

fn step4(edge: Vec4, x: Vec4) -> Vec4 {
    Vec4::select(x.cmpge(edge), Vec4::ONE, Vec4::ZERO)
}

/// Simplex noise in roughly -1..=1.
pub fn simplex3(v: Vec3) -> f32 {
    let (cx, cy) = (1.0 / 6.0, 1.0 / 3.0);

    let i = (v + Vec3::splat(v.dot(Vec3::splat(cy)))).floor();
    let x0 = v - i + Vec3::splat(i.dot(Vec3::splat(cx)));

    let g = step3(Vec3::new(x0.y, x0.z, x0.x), x0);
    let l = Vec3::ONE - g;
    let l_zxy = Vec3::new(l.z, l.x, l.y);
    let i1 = g.min(l_zxy);
    let i2 = g.max(l_zxy);

    let x1 = x0 - i1 + cx;
    let x2 = x0 - i2 + cy;
    let x3 = x0 - 0.5;

    let i = mod289_3(i);
    let p = permute(
        permute(
            permute(Vec4::splat(i.z) + Vec4::new(0.0, i1.z, i2.z, 1.0))
                + i.y
                + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + i.x
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    let n = 0.142_857_15;
    let ns = Vec3::new(n * 2.0, n * 0.5 - 1.0, n);

    let j = p - (p * ns.z * ns.z).floor() * 49.0;
    let x_ = (j * ns.z).floor();
    let y_ = (j - x_ * 7.0).floor();

    let x = x_ * ns.x + ns.y;
    let y = y_ * ns.x + ns.y;
    let h = Vec4::ONE - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);
    let s0 = b0.floor() * 2.0 + 1.0;
    let s1 = b1.floor() * 2.0 + 1.0;
    let sh = -step4(h, Vec4::ZERO);

    let a0 = Vec4::new(b0.x, b0.z, b0.y, b0.w) + Vec4::new(s0.x, s0.z, s0.y, s0.w) * Vec4::new(sh.x, sh.x, sh.y, sh.y);
    let a1 = Vec4::new(b1.x, b1.z, b1.y, b1.w) + Vec4::new(s1.x, s1.z, s1.y, s1.w) * Vec4::new(sh.z, sh.z, sh.w, sh.w);

    let p0 = Vec3::new(a0.x, a0.y, h.x);
    let p1 = Vec3::new(a0.z, a0.w, h.y);
    let p2 = Vec3::new(a1.x, a1.y, h.z);
    let p3 = Vec3::new(a1.z, a1.w, h.w);

    let norm = taylor_inv_sqrt(Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)));
    let (p0, p1, p2, p3) = (p0 * norm.x, p1 * norm.y, p2 * norm.z, p3 * norm.w);

    let m = (Vec4::splat(0.6) - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3)))
        .max(Vec4::ZERO);
    let m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

fn potential(p: Vec3) -> Vec3 {
    Vec3::new(
        simplex3(p),
        simplex3(p + POTENTIAL_Y),
        simplex3(p + POTENTIAL_Z),
    )
}

/// Curl of a simplex vector potential by central differences. The result is
/// scaled by `2 * CURL_EPSILON` (left undivided), which keeps it in the same
/// range as the noise itself.
pub fn curl(p: Vec3) -> Vec3 {
    let e = CURL_EPSILON;
    let dx = potential(p + Vec3::X * e) - potential(p - Vec3::X * e);
    let dy = potential(p + Vec3::Y * e) - potential(p - Vec3::Y * e);
    let dz = potential(p + Vec3::Z * e) - potential(p - Vec3::Z * e);
    Vec3::new(dy.z - dz.y, dz.x - dx.z, dx.y - dy.x)
}
