/// Shared constants for mesh construction and stage evaluation

/// Tolerance used when deciding whether geometry is degenerate or unchanged.
pub const EPSILON: f64 = 1e-9;

/// Fewest longitude segments a UV sphere can have and still close.
pub const MIN_U_SEGMENTS: usize = 3;

/// Fewest latitude segments a UV sphere can have (one ring between the poles).
pub const MIN_V_SEGMENTS: usize = 2;

/// Fewest outline points a triangle fan needs to enclose an area.
pub const MIN_FAN_POINTS: usize = 3;

/// Number of vertices in every cube grid.
pub const CUBE_GRID_VERTICES: usize = 8;

/// Fall distance applied to vertices at or below the gravity threshold when a
/// gravity stage does not name one. Zero pins the floor layer in place.
pub const DEFAULT_FALL_LOWER: f64 = 0.0;

/// Largest vertex count a parametric builder will allocate.
pub const MAX_MESH_VERTICES: usize = 1 << 20;
