use glam::{Quat, Vec3, Vec4};
use smallvec::SmallVec;

/// Values a keyframe track can hold.
pub trait Interpolatable: Clone {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self;

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self;
}

/// Hermite basis for glTF cubic splines: `(s0, s1, s2, s3)` weigh
/// `v0`, `m0`, `v1` and `m1`.
#[inline]
fn hermite(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let s2 = -2.0 * t3 + 3.0 * t2;
    let s3 = t3 - t2;
    let s0 = 1.0 - s2;
    let s1 = s3 - t2 + t;
    (s0, s1, s2, s3)
}

/// Morph target weights of one keyframe.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MorphWeightData {
    pub weights: SmallVec<[f32; 8]>,
}

impl MorphWeightData {
    #[must_use]
    pub fn from_slice(weights: &[f32]) -> Self {
        Self {
            weights: SmallVec::from_slice(weights),
        }
    }
}

impl Interpolatable for MorphWeightData {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        let weights = start
            .weights
            .iter()
            .zip(&end.weights)
            .map(|(a, b)| a + (b - a) * t)
            .collect();
        Self { weights }
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite(t);
        let weights = (0..v0.weights.len().min(v1.weights.len()))
            .map(|i| {
                let m0 = out_tangent0.weights.get(i).copied().unwrap_or(0.0) * dt;
                let m1 = in_tangent1.weights.get(i).copied().unwrap_or(0.0) * dt;
                s0 * v0.weights[i] + s1 * m0 + s2 * v1.weights[i] + s3 * m1
            })
            .collect();
        Self { weights }
    }
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite(t);
        s0 * v0 + s1 * out_tangent0 * dt + s2 * v1 + s3 * in_tangent1 * dt
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.lerp(*end, t)
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite(t);
        *v0 * s0 + *out_tangent0 * dt * s1 + *v1 * s2 + *in_tangent1 * dt * s3
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.slerp(*end, t)
    }

    fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Self {
        let (s0, s1, s2, s3) = hermite(t);

        let result = Vec4::from(*v0) * s0
            + Vec4::from(*out_tangent0) * dt * s1
            + Vec4::from(*v1) * s2
            + Vec4::from(*in_tangent1) * dt * s3;

        Quat::from_vec4(result).normalize()
    }
}
