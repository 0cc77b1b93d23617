/// Named stage parameters and the string-keyed entry point into the pipeline
use std::collections::BTreeMap;
use std::fmt;

use nalgebra::{Matrix2, Matrix3, Point2, Point3, Vector2, Vector3};

use crate::config::DEFAULT_FALL_LOWER;
use crate::deform::{apply_stage, Compression, Gravity, Stage, StageContext};
use crate::error::{MeshError, MeshResult};
use crate::geometry::VertexSet;
use crate::transform::{Affine2, Axis, PiecewiseAffine2, Transform};

/// A parameter value as written in a scene script
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Ident(String),
    Tuple(Vec<Value>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "a number",
            Value::Ident(_) => "a name",
            Value::Tuple(_) => "a tuple",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Ident(s) => write!(f, "{s}"),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Ident(s.to_string())
    }
}

impl<const N: usize> From<[f64; N]> for Value {
    fn from(items: [f64; N]) -> Self {
        Value::Tuple(items.into_iter().map(Value::Number).collect())
    }
}

/// Key/value parameters for one stage or mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Params {
    values: BTreeMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the previous value for `key`, if any
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.to_string(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reject keys outside `allowed`, so misspelled parameters are not ignored
    pub fn expect_only(&self, context: &str, allowed: &[&str]) -> MeshResult<()> {
        match self.keys().find(|key| !allowed.contains(key)) {
            Some(key) => Err(MeshError::invalid(format!(
                "{context} does not take a '{key}' parameter"
            ))),
            None => Ok(()),
        }
    }

    fn require(&self, key: &str) -> MeshResult<&Value> {
        self.get(key)
            .ok_or_else(|| MeshError::invalid(format!("missing parameter '{key}'")))
    }

    pub fn number(&self, key: &str) -> MeshResult<f64> {
        as_number(key, self.require(key)?)
    }

    pub fn number_or(&self, key: &str, default: f64) -> MeshResult<f64> {
        match self.get(key) {
            Some(value) => as_number(key, value),
            None => Ok(default),
        }
    }

    /// A non-negative integer no larger than `u32::MAX`, e.g. a vertex index
    /// or segment count
    pub fn count(&self, key: &str) -> MeshResult<usize> {
        let n = self.number(key)?;
        if !n.is_finite() || n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
            return Err(MeshError::invalid(format!(
                "parameter '{key}' must be a non-negative integer, got {n}"
            )));
        }
        Ok(n as usize)
    }

    pub fn ident(&self, key: &str) -> MeshResult<&str> {
        match self.require(key)? {
            Value::Ident(s) => Ok(s),
            other => Err(wrong_kind(key, "a name", other)),
        }
    }

    pub fn ident_opt(&self, key: &str) -> MeshResult<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(_) => self.ident(key).map(Some),
        }
    }

    /// A flat tuple of exactly `len` numbers
    pub fn numbers(&self, key: &str, len: usize) -> MeshResult<Vec<f64>> {
        numbers_of(key, self.require(key)?, len)
    }

    pub fn vector2(&self, key: &str) -> MeshResult<Vector2<f64>> {
        Ok(Vector2::from_vec(self.numbers(key, 2)?))
    }

    pub fn vector2_or(&self, key: &str, default: Vector2<f64>) -> MeshResult<Vector2<f64>> {
        match self.get(key) {
            Some(_) => self.vector2(key),
            None => Ok(default),
        }
    }

    pub fn vector3(&self, key: &str) -> MeshResult<Vector3<f64>> {
        Ok(Vector3::from_vec(self.numbers(key, 3)?))
    }

    /// Row-major 2×2 matrix written as a 4-tuple
    pub fn matrix2(&self, key: &str) -> MeshResult<Matrix2<f64>> {
        Ok(Matrix2::from_row_slice(&self.numbers(key, 4)?))
    }

    /// Row-major 3×3 matrix written as a 9-tuple
    pub fn matrix3(&self, key: &str) -> MeshResult<Matrix3<f64>> {
        Ok(Matrix3::from_row_slice(&self.numbers(key, 9)?))
    }

    /// A tuple of `(x, y)` pairs
    pub fn points2(&self, key: &str) -> MeshResult<Vec<Point2<f64>>> {
        match self.require(key)? {
            Value::Tuple(items) => items
                .iter()
                .map(|item| numbers_of(key, item, 2).map(|xy| Point2::new(xy[0], xy[1])))
                .collect(),
            other => Err(wrong_kind(key, "a tuple of points", other)),
        }
    }
}

fn as_number(key: &str, value: &Value) -> MeshResult<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(wrong_kind(key, "a number", other)),
    }
}

fn numbers_of(key: &str, value: &Value, len: usize) -> MeshResult<Vec<f64>> {
    let Value::Tuple(items) = value else {
        return Err(wrong_kind(key, "a tuple", value));
    };
    if items.len() != len {
        return Err(MeshError::invalid(format!(
            "parameter '{key}' needs {len} components, got {}",
            items.len()
        )));
    }
    items.iter().map(|item| as_number(key, item)).collect()
}

fn wrong_kind(key: &str, expected: &str, found: &Value) -> MeshError {
    MeshError::invalid(format!(
        "parameter '{key}' must be {expected}, got {} ({found})",
        found.kind()
    ))
}

const AFFINE2D_KEYS: [&str; 6] = [
    "matrix",
    "offset",
    "split_axis",
    "split_at",
    "else_matrix",
    "else_offset",
];

impl Stage {
    /// Resolve a stage name and its parameters through the stage catalogue.
    ///
    /// Besides the canonical stage names this accepts `scale factors=(sx,sy,sz)`
    /// and `rotate_z degrees=θ`, both of which become `linear3d` stages.
    pub fn from_params(name: &str, params: &Params) -> MeshResult<Stage> {
        let stage = match name {
            "gravity" => {
                params.expect_only(name, &["threshold", "fall_upper", "fall_lower"])?;
                Stage::Gravity(Gravity {
                    threshold: params.number("threshold")?,
                    fall_upper: params.number("fall_upper")?,
                    fall_lower: params.number_or("fall_lower", DEFAULT_FALL_LOWER)?,
                })
            }
            "compression" => {
                params.expect_only(name, &["left_threshold", "right_threshold", "squeeze"])?;
                Stage::Compression(Compression {
                    left_threshold: params.number("left_threshold")?,
                    right_threshold: params.number("right_threshold")?,
                    squeeze: params.number("squeeze")?,
                })
            }
            "recover_to_rest" => {
                params.expect_only(name, &[])?;
                Stage::RecoverToRest
            }
            "recover_to_gravity" => {
                params.expect_only(name, &[])?;
                Stage::RecoverToGravity
            }
            "vertex_force" => {
                params.expect_only(name, &["vertex", "offset"])?;
                Stage::VertexForce {
                    vertex: params.count("vertex")?,
                    offset: params.vector3("offset")?,
                }
            }
            "affine2d" => {
                params.expect_only(name, &AFFINE2D_KEYS)?;
                Stage::Affine2d(affine2d_from_params(params)?)
            }
            "linear3d" => {
                params.expect_only(name, &["matrix"])?;
                Stage::Linear3d(params.matrix3("matrix")?)
            }
            "scale" => {
                params.expect_only(name, &["factors"])?;
                let f = params.vector3("factors")?;
                Stage::Linear3d(Transform::scale(f.x, f.y, f.z))
            }
            "rotate_z" => {
                params.expect_only(name, &["degrees"])?;
                Stage::Linear3d(Transform::rotation_z(params.number("degrees")?.to_radians()))
            }
            _ => return Err(MeshError::UnknownStage(name.to_string())),
        };
        stage.validate()?;
        Ok(stage)
    }
}

fn affine2d_from_params(params: &Params) -> MeshResult<PiecewiseAffine2> {
    let primary = Affine2::new(
        params.matrix2("matrix")?,
        params.vector2_or("offset", Vector2::zeros())?,
    );
    let Some(axis_name) = params.ident_opt("split_axis")? else {
        if params.get("else_matrix").is_some() || params.get("else_offset").is_some() {
            return Err(MeshError::invalid(
                "affine2d 'else_*' parameters need a split_axis",
            ));
        }
        return Ok(PiecewiseAffine2::uniform(primary));
    };
    let axis = Axis::from_name(axis_name)
        .ok_or_else(|| MeshError::invalid(format!("unknown axis '{axis_name}'")))?;
    let secondary = Affine2::new(
        match params.get("else_matrix") {
            Some(_) => params.matrix2("else_matrix")?,
            None => Matrix2::identity(),
        },
        params.vector2_or("else_offset", Vector2::zeros())?,
    );
    Ok(PiecewiseAffine2::split(
        axis,
        params.number_or("split_at", 0.0)?,
        primary,
        secondary,
    ))
}

/// Apply a stage looked up by name.
///
/// Fails with `UnknownStage` for names outside the catalogue and with
/// `InvalidParameter` for missing, mistyped or unexpected parameters.
pub fn apply_named_stage(
    context: &StageContext<'_>,
    input: &VertexSet,
    name: &str,
    params: &Params,
) -> MeshResult<VertexSet> {
    let stage = Stage::from_params(name, params)?;
    apply_stage(context, input, &stage)
}

/// Read a point written as `(x, y, z)`
pub(crate) fn point3(params: &Params, key: &str) -> MeshResult<Point3<f64>> {
    params.vector3(key).map(Point3::from)
}
