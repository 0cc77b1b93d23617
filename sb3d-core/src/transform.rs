/// 2D affine and 3D linear maps applied to vertex coordinates
use nalgebra::{Matrix2, Matrix3, Point2, Rotation3, Vector2, Vector3};

/// Coordinate axis a piecewise map splits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn name(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }
}

/// `p ↦ matrix · p + offset` in the xy plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    pub matrix: Matrix2<f64>,
    pub offset: Vector2<f64>,
}

impl Affine2 {
    pub fn new(matrix: Matrix2<f64>, offset: Vector2<f64>) -> Self {
        Self { matrix, offset }
    }

    pub fn linear(matrix: Matrix2<f64>) -> Self {
        Self::new(matrix, Vector2::zeros())
    }

    pub fn identity() -> Self {
        Self::linear(Matrix2::identity())
    }

    /// Horizontal shear: `x ↦ x + k·y`
    pub fn shear_x(k: f64) -> Self {
        Self::linear(Matrix2::new(1.0, k, 0.0, 1.0))
    }

    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::from(self.matrix * p.coords + self.offset)
    }
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

/// Where a piecewise map switches from its primary to its secondary branch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub axis: Axis,
    pub threshold: f64,
}

/// A 2D affine map with an optional role split.
///
/// Without a split every vertex goes through `primary`. With one, vertices
/// whose `split.axis` coordinate is strictly greater than `split.threshold`
/// use `primary` and the rest use `secondary`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiecewiseAffine2 {
    pub primary: Affine2,
    pub secondary: Affine2,
    pub split: Option<Split>,
}

impl PiecewiseAffine2 {
    pub fn uniform(map: Affine2) -> Self {
        Self {
            primary: map,
            secondary: map,
            split: None,
        }
    }

    pub fn split(axis: Axis, threshold: f64, primary: Affine2, secondary: Affine2) -> Self {
        Self {
            primary,
            secondary,
            split: Some(Split { axis, threshold }),
        }
    }

    /// Map a 3D position; the z coordinate passes through unchanged
    pub fn apply(&self, p: &nalgebra::Point3<f64>) -> nalgebra::Point3<f64> {
        let map = match self.split {
            Some(split) if coordinate(p, split.axis) > split.threshold => &self.primary,
            Some(_) => &self.secondary,
            None => &self.primary,
        };
        let q = map.apply(Point2::new(p.x, p.y));
        nalgebra::Point3::new(q.x, q.y, p.z)
    }
}

fn coordinate(p: &nalgebra::Point3<f64>, axis: Axis) -> f64 {
    match axis {
        Axis::X => p.x,
        Axis::Y => p.y,
        Axis::Z => p.z,
    }
}

/// Builders for the 3×3 linear maps used by `linear3d` stages
pub struct Transform;

impl Transform {
    /// Per-axis stretch or squash
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::new(sx, sy, sz))
    }

    /// Rotation about the vertical axis by `angle` radians
    pub fn rotation_z(angle: f64) -> Matrix3<f64> {
        Rotation3::from_axis_angle(&Vector3::z_axis(), angle).into_inner()
    }

    /// Shear that slides x in proportion to z
    pub fn shear_xz(k: f64) -> Matrix3<f64> {
        Matrix3::new(1.0, 0.0, k, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0)
    }
}
