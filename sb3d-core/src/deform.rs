/// Deformation stages: closed-form vertex offsets applied to whole snapshots
use nalgebra::{Matrix3, Point3, Vector3};

use crate::config::{DEFAULT_FALL_LOWER, EPSILON};
use crate::error::{MeshError, MeshResult};
use crate::geometry::{Topology, VertexSet};
use crate::transform::PiecewiseAffine2;

/// Vertical sag: the upper layer falls by one amount, everything else by another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub threshold: f64,
    pub fall_upper: f64,
    pub fall_lower: f64,
}

impl Gravity {
    /// Sag with the layer at or below `threshold` pinned to the floor
    pub fn pinned(threshold: f64, fall_upper: f64) -> Self {
        Self {
            threshold,
            fall_upper,
            fall_lower: DEFAULT_FALL_LOWER,
        }
    }

    fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        let fall = if p.z > self.threshold {
            self.fall_upper
        } else {
            self.fall_lower
        };
        Point3::new(p.x, p.y, p.z - fall)
    }
}

/// Sideways squeeze toward the middle from both x extremes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compression {
    pub left_threshold: f64,
    pub right_threshold: f64,
    pub squeeze: f64,
}

impl Compression {
    fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        let x = if p.x > self.right_threshold {
            p.x - self.squeeze
        } else if p.x < self.left_threshold {
            p.x + self.squeeze
        } else {
            p.x
        };
        Point3::new(x, p.y, p.z)
    }
}

/// One named step of a scene
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Gravity(Gravity),
    Compression(Compression),
    /// Snap back to the shape captured at build time
    RecoverToRest,
    /// Snap back to the most recent gravity-sagged shape
    RecoverToGravity,
    VertexForce {
        vertex: usize,
        offset: Vector3<f64>,
    },
    Affine2d(PiecewiseAffine2),
    Linear3d(Matrix3<f64>),
}

impl Stage {
    pub const NAMES: [&'static str; 7] = [
        "gravity",
        "compression",
        "recover_to_rest",
        "recover_to_gravity",
        "vertex_force",
        "affine2d",
        "linear3d",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Gravity(_) => "gravity",
            Stage::Compression(_) => "compression",
            Stage::RecoverToRest => "recover_to_rest",
            Stage::RecoverToGravity => "recover_to_gravity",
            Stage::VertexForce { .. } => "vertex_force",
            Stage::Affine2d(_) => "affine2d",
            Stage::Linear3d(_) => "linear3d",
        }
    }

    /// Check parameters that do not depend on the vertex set
    pub fn validate(&self) -> MeshResult<()> {
        match self {
            Stage::Gravity(g) => check_finite(self.name(), &[g.threshold, g.fall_upper, g.fall_lower]),
            Stage::Compression(c) => {
                check_finite(self.name(), &[c.left_threshold, c.right_threshold, c.squeeze])?;
                if c.left_threshold > c.right_threshold {
                    return Err(MeshError::invalid(format!(
                        "compression left threshold {} is right of the right threshold {}",
                        c.left_threshold, c.right_threshold
                    )));
                }
                Ok(())
            }
            Stage::RecoverToRest | Stage::RecoverToGravity => Ok(()),
            Stage::VertexForce { offset, .. } => check_finite(self.name(), offset.as_slice()),
            Stage::Affine2d(map) => {
                let mut values = Vec::with_capacity(12);
                for branch in [&map.primary, &map.secondary] {
                    values.extend_from_slice(branch.matrix.as_slice());
                    values.extend_from_slice(branch.offset.as_slice());
                }
                if let Some(split) = map.split {
                    values.push(split.threshold);
                }
                check_finite(self.name(), &values)
            }
            Stage::Linear3d(matrix) => check_finite(self.name(), matrix.as_slice()),
        }
    }
}

/// The snapshots a stage may read besides its direct input
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    /// Shape captured at build time
    pub rest: &'a VertexSet,
    /// Output of the most recent gravity stage, if one has run
    pub gravity: Option<&'a VertexSet>,
    pub topology: &'a Topology,
}

impl<'a> StageContext<'a> {
    pub fn new(rest: &'a VertexSet, topology: &'a Topology) -> Self {
        Self {
            rest,
            gravity: None,
            topology,
        }
    }

    pub fn with_gravity(mut self, gravity: &'a VertexSet) -> Self {
        self.gravity = Some(gravity);
        self
    }
}

/// Apply one stage to `input`, producing a new snapshot.
///
/// The input is never modified. The output always has the input's length
/// and vertex order.
pub fn apply_stage(context: &StageContext<'_>, input: &VertexSet, stage: &Stage) -> MeshResult<VertexSet> {
    input.expect_len(context.rest.len())?;
    context.topology.validate(input.len())?;
    stage.validate()?;

    let output = match stage {
        Stage::Gravity(gravity) => input.map(|p| gravity.apply(p)),
        Stage::Compression(compression) => input.map(|p| compression.apply(p)),
        Stage::RecoverToRest => context.rest.clone(),
        Stage::RecoverToGravity => {
            let baseline = context
                .gravity
                .ok_or(MeshError::MissingBaseline("recover_to_gravity"))?;
            baseline.expect_len(input.len())?;
            baseline.clone()
        }
        Stage::VertexForce { vertex, offset } => {
            if *vertex >= input.len() {
                return Err(MeshError::invalid(format!(
                    "vertex_force targets vertex {vertex} of a {}-vertex set",
                    input.len()
                )));
            }
            input
                .iter()
                .enumerate()
                .map(|(i, p)| if i == *vertex { p + offset } else { *p })
                .collect()
        }
        Stage::Affine2d(map) => input.map(|p| map.apply(p)),
        Stage::Linear3d(matrix) => input.map(|p| Point3::from(matrix * p.coords)),
    };

    log::trace!("applied {} to {} vertices", stage.name(), input.len());
    if !matches!(stage, Stage::RecoverToRest | Stage::RecoverToGravity)
        && input.max_displacement(&output)? < EPSILON
    {
        log::warn!("stage {} left every vertex in place", stage.name());
    }
    Ok(output)
}

fn check_finite(stage: &str, values: &[f64]) -> MeshResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(MeshError::invalid(format!("{stage} parameters must be finite")))
    }
}
