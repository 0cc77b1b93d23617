/// Frame sequencing over a recorded timeline
use nalgebra::Point3;
use sb3d_core::{MeshResult, Timeline, VertexSet};

/// Playback and camera settings for the terminal player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Target frames per second
    pub fps: u32,
    /// Frames spent easing from one snapshot to the next
    pub frames_per_stage: usize,
    /// Frames each snapshot stays on screen once reached
    pub hold_frames: usize,
    /// Camera orbit speed in radians per second
    pub orbit_speed: f64,
    /// Camera height above the xy-plane, radians
    pub elevation: f64,
    /// Starting camera angle around z, radians
    pub azimuth: f64,
    pub distance: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            frames_per_stage: 30,
            hold_frames: 20,
            orbit_speed: 0.25,
            elevation: 20f64.to_radians(),
            azimuth: 30f64.to_radians(),
            distance: 10.0,
        }
    }
}

/// Ease in and out over `[0, 1]`
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Blend two snapshots with smoothstep easing.
///
/// `t = 0` gives `from` and `t = 1` gives `to` exactly.
pub fn lerp_vertex_sets(from: &VertexSet, to: &VertexSet, t: f64) -> MeshResult<VertexSet> {
    to.expect_len(from.len())?;
    let s = smoothstep(t);
    Ok(from
        .iter()
        .zip(to.iter())
        .map(|(a, b)| Point3::from(a.coords * (1.0 - s) + b.coords * s))
        .collect())
}

/// What to draw on one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub vertices: VertexSet,
    /// Index of the snapshot being shown or approached
    pub stage: usize,
    pub label: String,
}

/// Loops over a timeline: hold the rest shape, then ease into and hold each
/// following snapshot in turn.
pub struct ScenePlayer {
    timeline: Timeline,
    frames_per_stage: usize,
    hold_frames: usize,
}

impl ScenePlayer {
    pub fn new(timeline: Timeline, config: &PlayerConfig) -> Self {
        Self {
            timeline,
            frames_per_stage: config.frames_per_stage.max(1),
            hold_frames: config.hold_frames,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Frames in one pass over the whole timeline
    pub fn period(&self) -> usize {
        let transitions = self.timeline.len().saturating_sub(1);
        (self.hold_frames + transitions * (self.frames_per_stage + self.hold_frames)).max(1)
    }

    /// Snapshot indices and blend factor for `frame`; wraps around at the end
    fn locate(&self, frame: usize) -> (usize, usize, f64) {
        if self.timeline.len() < 2 {
            return (0, 0, 1.0);
        }
        let mut f = frame % self.period();
        if f < self.hold_frames {
            return (0, 0, 1.0);
        }
        f -= self.hold_frames;

        let segment = self.frames_per_stage + self.hold_frames;
        let target = f / segment + 1;
        let within = f % segment;
        if within < self.frames_per_stage {
            let t = (within + 1) as f64 / self.frames_per_stage as f64;
            (target - 1, target, t)
        } else {
            (target, target, 1.0)
        }
    }

    pub fn frame(&self, frame: usize) -> MeshResult<Frame> {
        let (from, to, t) = self.locate(frame);
        let snapshots = self.timeline.snapshots();
        let vertices = if from == to {
            snapshots[to].vertices.clone()
        } else {
            lerp_vertex_sets(&snapshots[from].vertices, &snapshots[to].vertices, t)?
        };
        log::trace!("frame {frame}: {from} -> {to} at t={t:.3}");
        Ok(Frame {
            vertices,
            stage: to,
            label: snapshots[to].label.clone(),
        })
    }
}
