/// Linear sequence of snapshots produced by applying stages one after another
use crate::deform::{apply_stage, Stage, StageContext};
use crate::error::MeshResult;
use crate::geometry::{Mesh, Topology, VertexSet};

/// Label of the first snapshot of every timeline
pub const REST_LABEL: &str = "rest";

/// One recorded shape, labelled with the stage that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub label: String,
    pub vertices: VertexSet,
}

/// Append-only record of a mesh moving through its stages.
///
/// The first snapshot is the rest shape. Each pushed stage reads the latest
/// snapshot and appends its output; recorded snapshots are never changed.
#[derive(Debug, Clone)]
pub struct Timeline {
    mesh: Mesh,
    snapshots: Vec<Snapshot>,
    gravity: Option<usize>,
}

impl Timeline {
    pub fn new(mesh: Mesh) -> Self {
        let rest = Snapshot {
            label: REST_LABEL.to_string(),
            vertices: mesh.vertices().clone(),
        };
        Self {
            mesh,
            snapshots: vec![rest],
            gravity: None,
        }
    }

    /// Apply `stage` to the current snapshot and record the result
    pub fn push(&mut self, stage: &Stage) -> MeshResult<&Snapshot> {
        let context = StageContext {
            rest: self.mesh.vertices(),
            gravity: self.gravity.map(|i| &self.snapshots[i].vertices),
            topology: self.mesh.topology(),
        };
        let vertices = apply_stage(&context, self.current(), stage)?;

        if matches!(stage, Stage::Gravity(_)) {
            self.gravity = Some(self.snapshots.len());
        }
        log::debug!("timeline step {}: {}", self.snapshots.len(), stage.name());
        self.snapshots.push(Snapshot {
            label: stage.name().to_string(),
            vertices,
        });
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    pub fn current(&self) -> &VertexSet {
        // `new` always records the rest snapshot
        &self.snapshots[self.snapshots.len() - 1].vertices
    }

    pub fn rest(&self) -> &VertexSet {
        self.mesh.vertices()
    }

    /// Output of the most recent gravity stage
    pub fn gravity_baseline(&self) -> Option<&VertexSet> {
        self.gravity.map(|i| &self.snapshots[i].vertices)
    }

    pub fn topology(&self) -> &Topology {
        self.mesh.topology()
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_cube_grid, CubeBracing};
    use crate::deform::{Compression, Gravity};
    use crate::error::MeshError;

    fn cube_timeline() -> Timeline {
        let (vs, edges) = build_cube_grid(1.5, 3.0, CubeBracing::CrossBraced).unwrap();
        Timeline::new(Mesh::new(vs, edges).unwrap())
    }

    fn squeeze() -> Stage {
        Stage::Compression(Compression {
            left_threshold: -0.5,
            right_threshold: 0.5,
            squeeze: 0.6,
        })
    }

    #[test]
    fn test_starts_at_rest() {
        let timeline = cube_timeline();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.snapshots()[0].label, REST_LABEL);
        assert_eq!(timeline.current(), timeline.rest());
        assert!(timeline.gravity_baseline().is_none());
    }

    #[test]
    fn test_recover_to_gravity_discards_compression() {
        let mut timeline = cube_timeline();
        let sagged = timeline
            .push(&Stage::Gravity(Gravity::pinned(1.0, 1.2)))
            .unwrap()
            .vertices
            .clone();
        timeline.push(&squeeze()).unwrap();
        assert_ne!(timeline.current(), &sagged);

        let recovered = timeline.push(&Stage::RecoverToGravity).unwrap();
        assert_eq!(recovered.vertices, sagged);
        assert_eq!(recovered.label, "recover_to_gravity");
    }

    #[test]
    fn test_latest_gravity_is_baseline() {
        let mut timeline = cube_timeline();
        timeline.push(&Stage::Gravity(Gravity::pinned(1.0, 0.5))).unwrap();
        let second = timeline
            .push(&Stage::Gravity(Gravity::pinned(1.0, 0.5)))
            .unwrap()
            .vertices
            .clone();
        timeline.push(&squeeze()).unwrap();
        assert_eq!(timeline.push(&Stage::RecoverToGravity).unwrap().vertices, second);
    }

    #[test]
    fn test_failed_stage_records_nothing() {
        let mut timeline = cube_timeline();
        assert_eq!(
            timeline.push(&Stage::RecoverToGravity).unwrap_err(),
            MeshError::MissingBaseline("recover_to_gravity")
        );
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_snapshots_are_not_rewritten() {
        let mut timeline = cube_timeline();
        timeline.push(&Stage::Gravity(Gravity::pinned(1.0, 1.2))).unwrap();
        let before = timeline.snapshots().to_vec();
        timeline.push(&squeeze()).unwrap();
        timeline.push(&Stage::RecoverToRest).unwrap();
        assert_eq!(&timeline.snapshots()[..2], &before[..]);
        assert_eq!(timeline.current(), timeline.rest());
    }
}
