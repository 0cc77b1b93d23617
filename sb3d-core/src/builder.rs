/// Parametric builders for the primitive solids used by the scenes
use std::f64::consts::{PI, TAU};

use nalgebra::{Point2, Point3};

use crate::config::{
    CUBE_GRID_VERTICES, MAX_MESH_VERTICES, MIN_FAN_POINTS, MIN_U_SEGMENTS, MIN_V_SEGMENTS,
};
use crate::error::{MeshError, MeshResult};
use crate::geometry::{EdgeSet, Face, FaceSet, Vertex, VertexSet};

/// Spring layout of a tetrahedron: every vertex pair is connected
const TETRAHEDRON_EDGES: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (2, 3), (1, 3)];

const TETRAHEDRON_FACES: [[usize; 3]; 4] = [[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 2, 3]];

const CUBE_BOX_EDGES: [(usize, usize); 12] = [
    // Bottom square
    (0, 1),
    (1, 3),
    (3, 2),
    (2, 0),
    // Top square
    (4, 5),
    (5, 7),
    (7, 6),
    (6, 4),
    // Uprights
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

const CUBE_TETRA_DIAGONALS: [(usize, usize); 4] = [(0, 3), (0, 7), (1, 6), (2, 5)];

const CUBE_AXIS_DIAGONALS: [(usize, usize); 4] = [(0, 3), (1, 2), (4, 7), (5, 6)];

const CUBE_CROSS_DIAGONALS: [(usize, usize); 4] = [(0, 5), (1, 4), (2, 7), (3, 6)];

/// Vertex order is `+z, -z, +x, -x, +y, -y`
const OCTAHEDRON_FACES: [[usize; 3]; 8] = [
    [0, 2, 4],
    [0, 4, 3],
    [0, 3, 5],
    [0, 5, 2],
    [1, 4, 2],
    [1, 3, 4],
    [1, 5, 3],
    [1, 2, 5],
];

/// Which springs a cube grid carries besides its outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CubeBracing {
    /// The 12 box edges only
    BoxOnly,
    /// Box edges plus the four diagonals used to split the cube into tetrahedra
    TetraDiagonals,
    /// Box edges plus the bottom/top face diagonals and the side cross braces
    #[default]
    CrossBraced,
}

impl CubeBracing {
    pub fn name(&self) -> &'static str {
        match self {
            CubeBracing::BoxOnly => "box_only",
            CubeBracing::TetraDiagonals => "tetra_diagonals",
            CubeBracing::CrossBraced => "cross_braced",
        }
    }

    pub fn from_name(name: &str) -> MeshResult<Self> {
        match name {
            "box_only" => Ok(CubeBracing::BoxOnly),
            "tetra_diagonals" => Ok(CubeBracing::TetraDiagonals),
            "cross_braced" => Ok(CubeBracing::CrossBraced),
            _ => Err(MeshError::invalid(format!("unknown cube bracing '{name}'"))),
        }
    }

    fn pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = CUBE_BOX_EDGES.to_vec();
        match self {
            CubeBracing::BoxOnly => {}
            CubeBracing::TetraDiagonals => pairs.extend(CUBE_TETRA_DIAGONALS),
            CubeBracing::CrossBraced => {
                pairs.extend(CUBE_AXIS_DIAGONALS);
                pairs.extend(CUBE_CROSS_DIAGONALS);
            }
        }
        pairs
    }
}

/// Build a tetrahedron spring network.
///
/// Vertex 0 is the apex. Vertices 1..=3 sit on a circle of `base_radius`
/// centred below the apex at height `base_height`, a third of a turn apart,
/// starting on the +x side.
pub fn build_tetrahedron(
    apex: Vertex,
    base_radius: f64,
    base_height: f64,
) -> MeshResult<(VertexSet, EdgeSet)> {
    check_extent("base radius", base_radius)?;
    check_finite("apex", &[apex.x, apex.y, apex.z])?;
    check_finite("base height", &[base_height])?;
    if base_height >= apex.z {
        return Err(MeshError::invalid(format!(
            "tetrahedron base at z = {base_height} is not below the apex at z = {}",
            apex.z
        )));
    }

    let mut vertices = Vec::with_capacity(4);
    vertices.push(apex);
    for k in 0..3 {
        let angle = k as f64 * TAU / 3.0;
        vertices.push(Point3::new(
            apex.x + base_radius * angle.cos(),
            apex.y + base_radius * angle.sin(),
            base_height,
        ));
    }

    let edges = EdgeSet::from_pairs(&TETRAHEDRON_EDGES)?;
    log::debug!("built tetrahedron with base radius {base_radius}");
    Ok((VertexSet::new(vertices), edges))
}

/// The four triangular faces of a tetrahedron built by [`build_tetrahedron`]
pub fn tetrahedron_faces() -> FaceSet {
    FaceSet::from_triples(&TETRAHEDRON_FACES)
}

/// Build the 2×2×2 vertex grid of a soft-body box.
///
/// Vertex `i` takes `x` from bit 0, `y` from bit 1 and `z` from bit 2:
/// `x, y ∈ {-spacing, +spacing}` and `z ∈ {0, height}`.
pub fn build_cube_grid(
    spacing: f64,
    height: f64,
    bracing: CubeBracing,
) -> MeshResult<(VertexSet, EdgeSet)> {
    check_extent("spacing", spacing)?;
    check_extent("height", height)?;

    let vertices: VertexSet = (0..CUBE_GRID_VERTICES)
        .map(|i| {
            let x = if i & 1 == 0 { -spacing } else { spacing };
            let y = if i & 2 == 0 { -spacing } else { spacing };
            let z = if i & 4 == 0 { 0.0 } else { height };
            Point3::new(x, y, z)
        })
        .collect();

    let edges = EdgeSet::from_pairs(&bracing.pairs())?;
    log::debug!("built cube grid ({}) with {} springs", bracing.name(), edges.len());
    Ok((vertices, edges))
}

/// Build an octahedron with its six vertices on the axes at distance `radius`
pub fn build_octahedron(radius: f64) -> MeshResult<(VertexSet, FaceSet)> {
    check_extent("radius", radius)?;

    let vertices = VertexSet::new(vec![
        Point3::new(0.0, 0.0, radius),
        Point3::new(0.0, 0.0, -radius),
        Point3::new(radius, 0.0, 0.0),
        Point3::new(-radius, 0.0, 0.0),
        Point3::new(0.0, radius, 0.0),
        Point3::new(0.0, -radius, 0.0),
    ]);
    log::debug!("built octahedron with radius {radius}");
    Ok((vertices, FaceSet::from_triples(&OCTAHEDRON_FACES)))
}

/// Number of triangles in a UV sphere with the given segment counts.
///
/// Fails with `InvalidParameter` for segment counts below the minimums or
/// totals that do not fit in `usize`.
pub fn uv_sphere_face_count(u_segments: usize, v_segments: usize) -> MeshResult<usize> {
    check_sphere_segments(u_segments, v_segments)?;
    // 2u caps plus 2u per band between rings
    (v_segments - 2)
        .checked_mul(u_segments)
        .and_then(|n| n.checked_add(u_segments))
        .and_then(|n| n.checked_mul(2))
        .ok_or_else(|| sphere_too_large(u_segments, v_segments))
}

/// Number of vertices in a UV sphere, capped at `MAX_MESH_VERTICES`
fn uv_sphere_vertex_count(u_segments: usize, v_segments: usize) -> MeshResult<usize> {
    check_sphere_segments(u_segments, v_segments)?;
    (v_segments - 1)
        .checked_mul(u_segments)
        .and_then(|n| n.checked_add(2))
        .filter(|&n| n <= MAX_MESH_VERTICES)
        .ok_or_else(|| sphere_too_large(u_segments, v_segments))
}

fn check_sphere_segments(u_segments: usize, v_segments: usize) -> MeshResult<()> {
    if u_segments < MIN_U_SEGMENTS {
        return Err(MeshError::invalid(format!(
            "u_segments must be at least {MIN_U_SEGMENTS}, got {u_segments}"
        )));
    }
    if v_segments < MIN_V_SEGMENTS {
        return Err(MeshError::invalid(format!(
            "v_segments must be at least {MIN_V_SEGMENTS}, got {v_segments}"
        )));
    }
    Ok(())
}

fn sphere_too_large(u_segments: usize, v_segments: usize) -> MeshError {
    MeshError::invalid(format!(
        "uv sphere {u_segments}x{v_segments} exceeds {MAX_MESH_VERTICES} vertices"
    ))
}

/// Build a latitude/longitude sphere.
///
/// Vertex 0 is the north pole and the last vertex the south pole; in between
/// are `v_segments - 1` rings of `u_segments` vertices, north to south.
pub fn build_uv_sphere(
    radius: f64,
    u_segments: usize,
    v_segments: usize,
) -> MeshResult<(VertexSet, FaceSet)> {
    check_extent("radius", radius)?;
    let vertex_count = uv_sphere_vertex_count(u_segments, v_segments)?;
    let face_count = uv_sphere_face_count(u_segments, v_segments)?;

    let rings = v_segments - 1;
    let mut vertices = Vec::with_capacity(vertex_count);
    vertices.push(Point3::new(0.0, 0.0, radius));
    for i in 1..v_segments {
        let v = i as f64 * PI / v_segments as f64;
        for j in 0..u_segments {
            let u = j as f64 * TAU / u_segments as f64;
            vertices.push(Point3::new(
                radius * v.sin() * u.cos(),
                radius * v.sin() * u.sin(),
                radius * v.cos(),
            ));
        }
    }
    vertices.push(Point3::new(0.0, 0.0, -radius));

    let ring_start = |ring: usize| 1 + ring * u_segments;
    let south = vertices.len() - 1;
    let mut faces = Vec::with_capacity(face_count);

    for j in 0..u_segments {
        let next = (j + 1) % u_segments;
        faces.push(Face::new(0, ring_start(0) + j, ring_start(0) + next));
    }

    for ring in 1..rings {
        for j in 0..u_segments {
            let next = (j + 1) % u_segments;
            let top_left = ring_start(ring - 1) + j;
            let top_right = ring_start(ring - 1) + next;
            let bottom_left = ring_start(ring) + j;
            let bottom_right = ring_start(ring) + next;
            faces.push(Face::new(top_left, top_right, bottom_left));
            faces.push(Face::new(top_right, bottom_right, bottom_left));
        }
    }

    let last = ring_start(rings - 1);
    for j in 0..u_segments {
        let next = (j + 1) % u_segments;
        faces.push(Face::new(south, last + next, last + j));
    }

    debug_assert_eq!(faces.len(), face_count);
    log::debug!(
        "built uv sphere {u_segments}x{v_segments}: {} vertices, {} faces",
        vertices.len(),
        faces.len()
    );
    Ok((VertexSet::new(vertices), FaceSet::new(faces)))
}

/// Build a flat triangle fan in the z = 0 plane.
///
/// Vertex 0 is `center` and vertex `k + 1` is `outline[k]`. Face `k` joins the
/// centre to outline points `k` and `k + 1`, wrapping around at the end.
pub fn build_triangle_fan(center: Point2<f64>, outline: &[Point2<f64>]) -> MeshResult<(VertexSet, FaceSet)> {
    if outline.len() < MIN_FAN_POINTS {
        return Err(MeshError::invalid(format!(
            "a triangle fan needs at least {MIN_FAN_POINTS} outline points, got {}",
            outline.len()
        )));
    }
    check_finite("fan center", &[center.x, center.y])?;
    for point in outline {
        check_finite("fan outline point", &[point.x, point.y])?;
    }

    let vertices: VertexSet = std::iter::once(center)
        .chain(outline.iter().copied())
        .map(|p| Point3::new(p.x, p.y, 0.0))
        .collect();

    let n = outline.len();
    let faces: Vec<Face> = (0..n).map(|k| Face::new(0, 1 + k, 1 + (k + 1) % n)).collect();
    log::debug!("built triangle fan with {n} outline points");
    Ok((vertices, FaceSet::new(faces)))
}

fn check_extent(what: &str, value: f64) -> MeshResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(MeshError::invalid(format!(
            "{what} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

fn check_finite(what: &str, values: &[f64]) -> MeshResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(MeshError::invalid(format!("{what} must be finite")))
    }
}
