/// A 2D affine transformation stored as the top two rows of a 3x3 matrix,
/// in row-major order.
///
/// A point is mapped as
/// `x' = m00 * x + m01 * y + m02`, `y' = m10 * x + m11 * y + m12`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    /// Matrix data in row-major order: [m00, m01, m02, m10, m11, m12]
    pub data: [f32; 6],
}

impl AffineTransform {
    /// Identity matrix (no transformation)
    pub const IDENTITY: Self = Self {
        data: [
            1.0, 0.0, 0.0, // row 0
            0.0, 1.0, 0.0, // row 1
        ],
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            data: [
                1.0, 0.0, x, // row 0
                0.0, 1.0, y, // row 1
            ],
        }
    }

    /// Counter-clockwise rotation in a y-up coordinate system.
    pub fn rotate(angle_radians: f32) -> Self {
        let (sin, cos) = angle_radians.sin_cos();
        Self {
            data: [
                cos, -sin, 0.0, // row 0
                sin, cos, 0.0, // row 1
            ],
        }
    }

    /// Rotation from a node rotation angle.
    ///
    /// Node rotations are clockwise-positive degrees, so the angle is negated
    /// before it is converted to radians.
    pub fn rotate_node_degrees(angle_degrees: f32) -> Self {
        Self::rotate(-angle_degrees.to_radians())
    }

    pub fn scale_xy(sx: f32, sy: f32) -> Self {
        Self {
            data: [
                sx, 0.0, 0.0, // row 0
                0.0, sy, 0.0, // row 1
            ],
        }
    }

    /// Compose this transform with another: self * other
    /// Applies `other` first, then `self`.
    pub fn then(&self, other: &AffineTransform) -> AffineTransform {
        let [a00, a01, a02, a10, a11, a12] = self.data;
        let [b00, b01, b02, b10, b11, b12] = other.data;

        AffineTransform {
            data: [
                a00 * b00 + a01 * b10,
                a00 * b01 + a01 * b11,
                a00 * b02 + a01 * b12 + a02,
                a10 * b00 + a11 * b10,
                a10 * b01 + a11 * b11,
                a10 * b02 + a11 * b12 + a12,
            ],
        }
    }

    /// Translate in this transform's local space (the translation is applied
    /// to points before `self`).
    pub fn translated(&self, x: f32, y: f32) -> AffineTransform {
        self.then(&Self::translate(x, y))
    }

    /// Rotate in this transform's local space.
    pub fn rotated(&self, angle_radians: f32) -> AffineTransform {
        self.then(&Self::rotate(angle_radians))
    }

    /// Scale in this transform's local space.
    pub fn scaled(&self, sx: f32, sy: f32) -> AffineTransform {
        self.then(&Self::scale_xy(sx, sy))
    }

    pub fn inverse(&self) -> AffineTransform {
        let [a, b, tx, c, d, ty] = self.data;
        let det = a * d - b * c;

        // Handle degenerate case (zero determinant)
        if det.abs() < 1e-10 {
            return Self::IDENTITY;
        }

        let inv_det = 1.0 / det;

        AffineTransform {
            data: [
                d * inv_det,
                -b * inv_det,
                (b * ty - d * tx) * inv_det,
                -c * inv_det,
                a * inv_det,
                (c * tx - a * ty) * inv_det,
            ],
        }
    }

    /// Transform a 2D point by this matrix
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let [m00, m01, m02, m10, m11, m12] = self.data;
        (m00 * x + m01 * y + m02, m10 * x + m11 * y + m12)
    }

    /// The translation part of the matrix.
    pub fn translation(&self) -> (f32, f32) {
        (self.data[2], self.data[5])
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_identity() {
        let t = AffineTransform::identity();
        assert!(t.is_identity());
        assert_eq!(t.transform_point(3.0, 4.0), (3.0, 4.0));
    }

    #[test]
    fn test_translate() {
        let t = AffineTransform::translate(10.0, 20.0);
        let (x, y) = t.transform_point(5.0, 5.0);
        assert!(approx_eq(x, 15.0));
        assert!(approx_eq(y, 25.0));
    }

    #[test]
    fn test_rotate_counter_clockwise() {
        let t = AffineTransform::rotate(90f32.to_radians());
        let (x, y) = t.transform_point(1.0, 0.0);
        assert!(approx_eq(x, 0.0));
        assert!(approx_eq(y, 1.0));
    }

    #[test]
    fn test_node_rotation_is_clockwise() {
        let t = AffineTransform::rotate_node_degrees(90.0);
        let (x, y) = t.transform_point(1.0, 0.0);
        assert!(approx_eq(x, 0.0));
        assert!(approx_eq(y, -1.0));
    }

    #[test]
    fn test_compose_applies_other_first() {
        // Point (0,0) -> translate -> (10,0) -> scale -> (20,0)
        let composed = AffineTransform::scale_xy(2.0, 2.0).then(&AffineTransform::translate(10.0, 0.0));
        let (x, y) = composed.transform_point(0.0, 0.0);
        assert!(approx_eq(x, 20.0));
        assert!(approx_eq(y, 0.0));
    }

    #[test]
    fn test_translated_is_local() {
        // Scaling by 2 then translating locally by (-1, -1) moves the origin by (-2, -2)
        let t = AffineTransform::scale_xy(2.0, 2.0).translated(-1.0, -1.0);
        let (x, y) = t.transform_point(0.0, 0.0);
        assert!(approx_eq(x, -2.0));
        assert!(approx_eq(y, -2.0));
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = AffineTransform::translate(10.0, -4.0)
            .rotated(0.7)
            .scaled(2.0, 0.5);
        let composed = t.then(&t.inverse());
        let (x, y) = composed.transform_point(3.0, 4.0);
        assert!(approx_eq(x, 3.0));
        assert!(approx_eq(y, 4.0));
    }

    #[test]
    fn test_inverse_of_degenerate_is_identity() {
        let t = AffineTransform::scale_xy(0.0, 1.0);
        assert!(t.inverse().is_identity());
    }
}
