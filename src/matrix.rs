//! 2D affine transforms.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Tolerance used by [`Matrix::is_identity`] and [`Matrix::is_translation`].
pub const EPSILON: f64 = 1e-6;

/// An affine transform with six coefficients.
///
/// A point `(x, y)` is mapped to `(a * x + c * y + e, b * x + d * y + f)`.
///
/// The mutating operations (`compose`, `translate`, `scale`, `rotate`,
/// `invert`) change the matrix in place and hand back `&mut Self` so that
/// calls can be chained. `Matrix` is `Copy`, so take a copy first if the
/// original is still needed.
#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn from_translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn from_scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `angle` radians.
    pub fn from_rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Build the transform that maps the rectangle `src` onto `dst`.
    ///
    /// Rectangles are given as `[x0, y0, x1, y1]`. Only scaling and
    /// translation are involved, so the result never rotates.
    pub fn from_rects(src: [f64; 4], dst: [f64; 4]) -> Self {
        let x_scale = (dst[2] - dst[0]) / (src[2] - src[0]);
        let y_scale = (dst[3] - dst[1]) / (src[3] - src[1]);
        let x_offset = dst[0] - src[0] * x_scale;
        let y_offset = dst[1] - src[1] * y_scale;
        Self::new(x_scale, 0.0, 0.0, y_scale, x_offset, y_offset)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Return the determinant, or an error if the matrix cannot be inverted.
    fn checked_determinant(&self) -> Result<f64, Error> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            Err(Error::SingularMatrix)
        } else {
            Ok(det)
        }
    }

    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Transform a buffer of interleaved `x, y` values in place.
    ///
    /// A trailing odd value is left untouched.
    pub fn transform(&self, points: &mut [f64]) {
        for pair in points.chunks_exact_mut(2) {
            let (x, y) = self.transform_point(pair[0], pair[1]);
            pair[0] = x;
            pair[1] = y;
        }
    }

    /// Transform a direction, ignoring the translation part.
    pub fn transform_vector(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.a + y * self.c, x * self.b + y * self.d)
    }

    /// Like [`Matrix::transform`], but for vectors (no translation).
    pub fn vector_transform(&self, points: &mut [f64]) {
        for pair in points.chunks_exact_mut(2) {
            let (x, y) = self.transform_vector(pair[0], pair[1]);
            pair[0] = x;
            pair[1] = y;
        }
    }

    pub fn inverse_transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), Error> {
        let det = self.checked_determinant()?;
        let (dx, dy) = (x - self.e, y - self.f);
        Ok((
            (dx * self.d - dy * self.c) / det,
            (dy * self.a - dx * self.b) / det,
        ))
    }

    /// Apply the inverse transform to a buffer of interleaved `x, y` values.
    ///
    /// The buffer is left untouched if the matrix is singular.
    pub fn inverse_transform(&self, points: &mut [f64]) -> Result<(), Error> {
        self.checked_determinant()?;
        for pair in points.chunks_exact_mut(2) {
            let (x, y) = self.inverse_transform_point(pair[0], pair[1])?;
            pair[0] = x;
            pair[1] = y;
        }
        Ok(())
    }

    /// Transform the four corners of `[x0, y0, x1, y1]` and return their
    /// axis-aligned bounding box.
    pub fn transform_rectangle(&self, rect: [f64; 4]) -> [f64; 4] {
        let mut corners = [
            rect[0], rect[1], rect[2], rect[1], rect[2], rect[3], rect[0], rect[3],
        ];
        self.transform(&mut corners);
        let mut bounds = [corners[0], corners[1], corners[0], corners[1]];
        for pair in corners.chunks_exact(2).skip(1) {
            bounds[0] = bounds[0].min(pair[0]);
            bounds[1] = bounds[1].min(pair[1]);
            bounds[2] = bounds[2].max(pair[0]);
            bounds[3] = bounds[3].max(pair[1]);
        }
        bounds
    }

    /// Replace `self` by `self ∘ other`: the result applies `other` first.
    pub fn compose(&mut self, other: &Matrix) -> &mut Self {
        let m = *self;
        self.a = other.a * m.a + other.b * m.c;
        self.b = other.a * m.b + other.b * m.d;
        self.c = other.c * m.a + other.d * m.c;
        self.d = other.c * m.b + other.d * m.d;
        self.e = other.e * m.a + other.f * m.c + m.e;
        self.f = other.e * m.b + other.f * m.d + m.f;
        self
    }

    pub fn translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        self.compose(&Self::from_translation(tx, ty))
    }

    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        self.compose(&Self::from_scale(sx, sy))
    }

    pub fn rotate(&mut self, angle: f64) -> &mut Self {
        self.compose(&Self::from_rotation(angle))
    }

    /// Invert the matrix in place.
    ///
    /// On error the matrix is left unchanged.
    pub fn invert(&mut self) -> Result<&mut Self, Error> {
        let det = self.checked_determinant()?;
        let m = *self;
        self.a = m.d / det;
        self.b = -m.b / det;
        self.c = -m.c / det;
        self.d = m.a / det;
        self.e = (m.c * m.f - m.d * m.e) / det;
        self.f = (m.b * m.e - m.a * m.f) / det;
        Ok(self)
    }

    /// Return the inverse as a new matrix.
    pub fn inverse(&self) -> Result<Matrix, Error> {
        let mut m = *self;
        m.invert()?;
        Ok(m)
    }

    /// Approximate uniform scale of the transform.
    ///
    /// Length of the image of the diagonal unit vector. Exact for uniform
    /// scales and rotations only.
    pub fn scale_factor(&self) -> f64 {
        let (x, y) = self.transform_vector(0.707_106_781, 0.707_106_781);
        x.hypot(y)
    }

    /// Lengths of the transformed x and y unit vectors.
    pub fn scaling(&self) -> (f64, f64) {
        (self.a.hypot(self.b), self.c.hypot(self.d))
    }

    pub fn translation(&self) -> (f64, f64) {
        (self.e, self.f)
    }

    pub fn approx_eq(&self, other: &Matrix, epsilon: f64) -> bool {
        let close = |x: f64, y: f64| (x - y).abs() <= epsilon;
        close(self.a, other.a)
            && close(self.b, other.b)
            && close(self.c, other.c)
            && close(self.d, other.d)
            && close(self.e, other.e)
            && close(self.f, other.f)
    }

    pub fn is_identity(&self) -> bool {
        self.approx_eq(&Self::identity(), EPSILON)
    }

    /// Whether the transform is a pure translation.
    pub fn is_translation(&self) -> bool {
        self.approx_eq(&Self::from_translation(self.e, self.f), EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn assert_close(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-9 && (actual.1 - expected.1).abs() < 1e-9,
            "{:?} != {:?}",
            actual,
            expected
        );
    }

    fn sample() -> Matrix {
        Matrix::new(2.0, 0.5, -1.0, 3.0, 10.0, -4.0)
    }

    #[test]
    fn test_identity_composition() {
        let m = sample();

        let mut left = Matrix::identity();
        left.compose(&m);
        assert_eq!(left, m);

        let mut right = m;
        right.compose(&Matrix::identity());
        assert_eq!(right, m);
    }

    #[test]
    fn test_compose_order() {
        // Scale, then translate: the translation is applied first to points.
        let mut m = Matrix::from_scale(2.0, 2.0);
        m.translate(5.0, 1.0);
        assert_close(m.transform_point(0.0, 0.0), (10.0, 2.0));

        let mut m = Matrix::from_translation(5.0, 1.0);
        m.scale(2.0, 2.0);
        assert_close(m.transform_point(0.0, 0.0), (5.0, 1.0));
        assert_close(m.transform_point(1.0, 1.0), (7.0, 3.0));
    }

    #[test]
    fn test_compose_translation_coefficients() {
        let mut m = sample();
        let other = Matrix::new(1.5, 0.0, 0.25, 1.0, 3.0, 7.0);
        m.compose(&other);
        let s = sample();
        assert_eq!(m.e, other.e * s.a + other.f * s.c + s.e);
        assert_eq!(m.f, other.e * s.b + other.f * s.d + s.f);
    }

    #[test]
    fn test_inverse_composition() {
        let m = sample();
        let mut composed = m;
        composed.compose(&m.inverse().unwrap());
        for &(x, y) in &[(0.0, 0.0), (1.0, -2.0), (123.5, 42.25)] {
            assert_close(composed.transform_point(x, y), (x, y));
        }
    }

    #[test]
    fn test_transform_roundtrip() {
        let mut m = Matrix::identity();
        m.translate(3.0, 4.0).rotate(PI / 5.0).scale(2.0, 0.5);
        for &(x, y) in &[(0.0, 0.0), (-7.0, 2.0), (1e3, -1e3)] {
            let (tx, ty) = m.transform_point(x, y);
            assert_close(m.inverse_transform_point(tx, ty).unwrap(), (x, y));
        }
    }

    #[test]
    fn test_batch_transform() {
        let m = sample();
        let mut points = [1.0, 2.0, -3.0, 4.0, 99.0];
        m.transform(&mut points);
        assert_close((points[0], points[1]), m.transform_point(1.0, 2.0));
        assert_close((points[2], points[3]), m.transform_point(-3.0, 4.0));
        assert_eq!(points[4], 99.0);

        m.inverse_transform(&mut points).unwrap();
        assert_close((points[0], points[1]), (1.0, 2.0));
        assert_close((points[2], points[3]), (-3.0, 4.0));
    }

    #[test]
    fn test_vector_transform_ignores_translation() {
        let m = Matrix::from_translation(100.0, 100.0);
        let mut v = [1.0, 2.0];
        m.vector_transform(&mut v);
        assert_eq!(v, [1.0, 2.0]);
    }

    #[test]
    fn test_singular_matrix() {
        let mut m = Matrix::from_scale(0.0, 1.0);
        assert_eq!(m.determinant(), 0.0);
        assert_eq!(m.inverse(), Err(Error::SingularMatrix));
        assert!(m.invert().is_err());
        assert_eq!(m, Matrix::from_scale(0.0, 1.0));
        assert_eq!(
            m.inverse_transform_point(1.0, 1.0),
            Err(Error::SingularMatrix)
        );
        let mut points = [1.0, 1.0];
        assert!(m.inverse_transform(&mut points).is_err());
        assert_eq!(points, [1.0, 1.0]);
    }

    #[test]
    fn test_transform_rectangle_rotated() {
        let m = Matrix::from_rotation(PI / 4.0);
        let r = m.transform_rectangle([0.0, 0.0, 1.0, 1.0]);
        let h = (0.5f64).sqrt();
        assert!((r[0] + h).abs() < 1e-9);
        assert!(r[1].abs() < 1e-9);
        assert!((r[2] - h).abs() < 1e-9);
        assert!((r[3] - 2.0 * h).abs() < 1e-9);
    }

    #[test]
    fn test_from_rects() {
        let m = Matrix::from_rects([0.0, 0.0, 10.0, 20.0], [100.0, 100.0, 120.0, 110.0]);
        assert_close(m.transform_point(0.0, 0.0), (100.0, 100.0));
        assert_close(m.transform_point(10.0, 20.0), (120.0, 110.0));
        assert!(!m.is_translation());
    }

    #[test]
    fn test_scale_factor() {
        assert!((Matrix::from_scale(3.0, 3.0).scale_factor() - 3.0).abs() < 1e-6);
        assert!((Matrix::from_rotation(1.0).scale_factor() - 1.0).abs() < 1e-6);
        assert_eq!(Matrix::from_scale(2.0, 5.0).scaling(), (2.0, 5.0));
    }

    #[test]
    fn test_predicates() {
        assert!(Matrix::default().is_identity());
        assert!(Matrix::from_translation(4.0, 2.0).is_translation());
        assert!(!Matrix::from_translation(4.0, 2.0).is_identity());
        assert_eq!(Matrix::from_translation(4.0, 2.0).translation(), (4.0, 2.0));
    }
}
