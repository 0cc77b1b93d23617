/// SB3D Core Library - Scripted soft-body geometry
///
/// This library provides the stateless core: parametric mesh builders, the
/// deterministic deformation stages that move their vertices, and the scene
/// scripts that chain the two. Rendering, timing and camera work belong to
/// the consumers of this crate.

pub mod builder;
pub mod config;
pub mod deform;
pub mod error;
pub mod geometry;
pub mod params;
pub mod scene;
pub mod script;
pub mod timeline;
pub mod transform;

// Re-export commonly used types
pub use builder::{
    build_cube_grid, build_octahedron, build_tetrahedron, build_triangle_fan, build_uv_sphere,
    tetrahedron_faces, uv_sphere_face_count, CubeBracing,
};
pub use deform::{apply_stage, Compression, Gravity, Stage, StageContext};
pub use error::{MeshError, MeshResult};
pub use geometry::{
    edge_endpoints, face_normal, face_vertices, Edge, EdgeSet, Face, FaceSet, Mesh, Topology,
    Vertex, VertexSet,
};
pub use params::{apply_named_stage, Params, Value};
pub use scene::{MeshSpec, Scene};
pub use script::{parse_scene, parse_statement};
pub use timeline::{Snapshot, Timeline};
pub use transform::{Affine2, Axis, PiecewiseAffine2, Transform};
