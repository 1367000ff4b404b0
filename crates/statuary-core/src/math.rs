//! Math primitives used across Statuary
//!
//! Vectors, quaternions, and affine transform matrices. All types are plain
//! `f32` value types with the operations the bake pipeline needs; this is
//! not a general-purpose linear algebra library.

use serde::{Deserialize, Serialize};

/// 2D vector (UV coordinates, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Default for Vec2 {
    fn default() -> Self {
        Self::ZERO
    }
}

/// 3D vector (position, normal, scale, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0, z: 1.0 };
    pub const UP: Self = Self { x: 0.0, y: 1.0, z: 0.0 };
    pub const FORWARD: Self = Self { x: 0.0, y: 0.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Normalize to unit length, returning zero for a zero-length vector
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

/// Rotation quaternion (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `degrees` around `axis`
    pub fn from_axis_angle(axis: Vec3, degrees: f32) -> Self {
        let axis = axis.normalize();
        let half = degrees.to_radians() / 2.0;
        let s = half.sin();
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: half.cos(),
        }
    }

    /// Rotation from Euler angles in degrees, applied Z, then X, then Y
    /// (the convention pose documents are authored in)
    pub fn from_euler_deg(x: f32, y: f32, z: f32) -> Self {
        let qx = Self::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), x);
        let qy = Self::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), y);
        let qz = Self::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), z);
        qy.mul(&qx).mul(&qz)
    }

    /// Hamilton product: the combined rotation applies `other` first, then `self`
    pub fn mul(&self, other: &Self) -> Self {
        Self {
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        }
    }

    pub fn normalize(&self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
                w: self.w / len,
            }
        } else {
            Self::IDENTITY
        }
    }

    /// Rotate a vector by this quaternion
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let t = qv.cross(&v) * 2.0;
        v + t * self.w + qv.cross(&t)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 4x4 affine transform matrix
///
/// Row-major storage with column-vector convention: a point transforms as
/// `M * p`, translation lives in the last column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Self = Self { m: [[0.0; 4]; 4] };

    /// Rotation matrix from a quaternion
    pub fn from_quat(q: Quat) -> Self {
        let Quat { x, y, z, w } = q;

        let xx = x * x;
        let xy = x * y;
        let xz = x * z;
        let xw = x * w;
        let yy = y * y;
        let yz = y * z;
        let yw = y * w;
        let zz = z * z;
        let zw = z * w;

        Self {
            m: [
                [1.0 - 2.0 * (yy + zz), 2.0 * (xy - zw), 2.0 * (xz + yw), 0.0],
                [2.0 * (xy + zw), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - xw), 0.0],
                [2.0 * (xz - yw), 2.0 * (yz + xw), 1.0 - 2.0 * (xx + yy), 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Compose translation, rotation, and scale into a single transform
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut result = Self::from_quat(rotation);
        let s = [scale.x, scale.y, scale.z];

        for row in 0..3 {
            for col in 0..3 {
                result.m[row][col] *= s[col];
            }
        }

        result.m[0][3] = translation.x;
        result.m[1][3] = translation.y;
        result.m[2][3] = translation.z;
        result
    }

    pub fn mul(&self, other: &Self) -> Self {
        let mut result = Self::ZERO;

        for i in 0..4 {
            for j in 0..4 {
                result.m[i][j] = self.m[i][0] * other.m[0][j]
                    + self.m[i][1] * other.m[1][j]
                    + self.m[i][2] * other.m[2][j]
                    + self.m[i][3] * other.m[3][j];
            }
        }

        result
    }

    /// Transform a point (translation applies)
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.m[0][0] * p.x + self.m[0][1] * p.y + self.m[0][2] * p.z + self.m[0][3],
            self.m[1][0] * p.x + self.m[1][1] * p.y + self.m[1][2] * p.z + self.m[1][3],
            self.m[2][0] * p.x + self.m[2][1] * p.y + self.m[2][2] * p.z + self.m[2][3],
        )
    }

    /// Transform a direction (translation ignored)
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        Vec3::new(
            self.m[0][0] * d.x + self.m[0][1] * d.y + self.m[0][2] * d.z,
            self.m[1][0] * d.x + self.m[1][1] * d.y + self.m[1][2] * d.z,
            self.m[2][0] * d.x + self.m[2][1] * d.y + self.m[2][2] * d.z,
        )
    }

    /// Invert an affine transform (last row [0, 0, 0, 1])
    ///
    /// Returns `None` when the upper 3x3 is singular (e.g. zero scale).
    pub fn inverse_affine(&self) -> Option<Self> {
        let a = &self.m;

        let c00 = a[1][1] * a[2][2] - a[1][2] * a[2][1];
        let c01 = a[1][2] * a[2][0] - a[1][0] * a[2][2];
        let c02 = a[1][0] * a[2][1] - a[1][1] * a[2][0];

        let det = a[0][0] * c00 + a[0][1] * c01 + a[0][2] * c02;
        if det.abs() < 1e-8 {
            return None;
        }

        let inv_det = 1.0 / det;
        let mut inv = Self::IDENTITY;

        inv.m[0][0] = c00 * inv_det;
        inv.m[1][0] = c01 * inv_det;
        inv.m[2][0] = c02 * inv_det;
        inv.m[0][1] = (a[0][2] * a[2][1] - a[0][1] * a[2][2]) * inv_det;
        inv.m[1][1] = (a[0][0] * a[2][2] - a[0][2] * a[2][0]) * inv_det;
        inv.m[2][1] = (a[0][1] * a[2][0] - a[0][0] * a[2][1]) * inv_det;
        inv.m[0][2] = (a[0][1] * a[1][2] - a[0][2] * a[1][1]) * inv_det;
        inv.m[1][2] = (a[0][2] * a[1][0] - a[0][0] * a[1][2]) * inv_det;
        inv.m[2][2] = (a[0][0] * a[1][1] - a[0][1] * a[1][0]) * inv_det;

        let tx = a[0][3];
        let ty = a[1][3];
        let tz = a[2][3];

        inv.m[0][3] = -(inv.m[0][0] * tx + inv.m[0][1] * ty + inv.m[0][2] * tz);
        inv.m[1][3] = -(inv.m[1][0] * tx + inv.m[1][1] * ty + inv.m[1][2] * tz);
        inv.m[2][3] = -(inv.m[2][0] * tx + inv.m[2][1] * ty + inv.m[2][2] * tz);

        Some(inv)
    }

    /// Accumulate `other * weight` into this matrix (linear blend skinning)
    pub fn add_scaled(&mut self, other: &Self, weight: f32) {
        for i in 0..4 {
            for j in 0..4 {
                self.m[i][j] += other.m[i][j] * weight;
            }
        }
    }

    /// Get translation component
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.m[0][3], self.m[1][3], self.m[2][3])
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert!((a.x - b.x).abs() < EPS, "{:?} != {:?}", a, b);
        assert!((a.y - b.y).abs() < EPS, "{:?} != {:?}", a, b);
        assert!((a.z - b.z).abs() < EPS, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_vec3_operations() {
        let v1 = Vec3::new(1.0, 2.0, 3.0);
        let v2 = Vec3::new(4.0, 5.0, 6.0);

        assert!((v1.dot(&v2) - 32.0).abs() < EPS);

        let cross = v1.cross(&v2);
        assert_vec3_eq(cross, Vec3::new(-3.0, 6.0, -3.0));
    }

    #[test]
    fn test_quat_identity_rotation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_vec3_eq(Quat::IDENTITY.rotate(v), v);
    }

    #[test]
    fn test_quat_axis_angle() {
        // 90 degrees around Y takes +Z to +X
        let q = Quat::from_axis_angle(Vec3::UP, 90.0);
        assert_vec3_eq(q.rotate(Vec3::FORWARD), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_quat_euler_single_axis() {
        let q = Quat::from_euler_deg(0.0, 30.0, 0.0);
        let expected = Quat::from_axis_angle(Vec3::UP, 30.0);

        assert!((q.x - expected.x).abs() < EPS);
        assert!((q.y - expected.y).abs() < EPS);
        assert!((q.z - expected.z).abs() < EPS);
        assert!((q.w - expected.w).abs() < EPS);
    }

    #[test]
    fn test_mat4_trs_transform() {
        let m = Mat4::from_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(Vec3::UP, 90.0),
            Vec3::new(2.0, 2.0, 2.0),
        );

        // +Z scaled to length 2, rotated to +X, then translated
        assert_vec3_eq(m.transform_point(Vec3::FORWARD), Vec3::new(3.0, 2.0, 3.0));
    }

    #[test]
    fn test_mat4_inverse_affine_roundtrip() {
        let m = Mat4::from_trs(
            Vec3::new(-4.0, 1.5, 2.0),
            Quat::from_euler_deg(20.0, -45.0, 10.0),
            Vec3::new(1.0, 2.0, 0.5),
        );
        let inv = m.inverse_affine().unwrap();

        let p = Vec3::new(3.0, -1.0, 7.0);
        assert_vec3_eq(inv.transform_point(m.transform_point(p)), p);
    }

    #[test]
    fn test_mat4_inverse_affine_singular() {
        let m = Mat4::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO);
        assert!(m.inverse_affine().is_none());
    }

    #[test]
    fn test_mat4_quat_agreement() {
        let q = Quat::from_euler_deg(15.0, 75.0, -30.0);
        let m = Mat4::from_quat(q);
        let v = Vec3::new(0.3, -1.2, 4.0);

        assert_vec3_eq(m.transform_direction(v), q.rotate(v));
    }
}
