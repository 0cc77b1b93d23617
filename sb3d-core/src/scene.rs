/// Scenes: a mesh description plus the ordered stages it moves through
use nalgebra::{Matrix2, Point2, Point3, Vector2, Vector3};

use crate::builder::{
    build_cube_grid, build_octahedron, build_tetrahedron, build_triangle_fan, build_uv_sphere,
    CubeBracing,
};
use crate::deform::{Compression, Gravity, Stage};
use crate::error::{MeshError, MeshResult};
use crate::geometry::Mesh;
use crate::params::{point3, Params, Value};
use crate::timeline::Timeline;
use crate::transform::{Affine2, Axis, PiecewiseAffine2, Transform};

/// Which primitive a scene starts from, with its construction parameters
#[derive(Debug, Clone, PartialEq)]
pub enum MeshSpec {
    Tetrahedron {
        apex: Point3<f64>,
        base_radius: f64,
        base_height: f64,
    },
    CubeGrid {
        spacing: f64,
        height: f64,
        bracing: CubeBracing,
    },
    Octahedron {
        radius: f64,
    },
    UvSphere {
        radius: f64,
        u_segments: usize,
        v_segments: usize,
    },
    Fan {
        center: Point2<f64>,
        outline: Vec<Point2<f64>>,
    },
}

impl MeshSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            MeshSpec::Tetrahedron { .. } => "tetrahedron",
            MeshSpec::CubeGrid { .. } => "cube_grid",
            MeshSpec::Octahedron { .. } => "octahedron",
            MeshSpec::UvSphere { .. } => "uv_sphere",
            MeshSpec::Fan { .. } => "fan",
        }
    }

    /// Run the matching builder
    pub fn build(&self) -> MeshResult<Mesh> {
        match self {
            MeshSpec::Tetrahedron {
                apex,
                base_radius,
                base_height,
            } => {
                let (vertices, edges) = build_tetrahedron(*apex, *base_radius, *base_height)?;
                Mesh::new(vertices, edges)
            }
            MeshSpec::CubeGrid {
                spacing,
                height,
                bracing,
            } => {
                let (vertices, edges) = build_cube_grid(*spacing, *height, *bracing)?;
                Mesh::new(vertices, edges)
            }
            MeshSpec::Octahedron { radius } => {
                let (vertices, faces) = build_octahedron(*radius)?;
                Mesh::new(vertices, faces)
            }
            MeshSpec::UvSphere {
                radius,
                u_segments,
                v_segments,
            } => {
                let (vertices, faces) = build_uv_sphere(*radius, *u_segments, *v_segments)?;
                Mesh::new(vertices, faces)
            }
            MeshSpec::Fan { center, outline } => {
                let (vertices, faces) = build_triangle_fan(*center, outline)?;
                Mesh::new(vertices, faces)
            }
        }
    }

    /// Read a `mesh` statement: one bare word naming the kind, then its parameters
    pub fn from_params(params: &Params) -> MeshResult<Self> {
        let mut params = params.clone();
        let bare: Vec<String> = params
            .keys()
            .filter(|key| params.get(key) == Some(&Value::Ident(String::new())))
            .map(str::to_string)
            .collect();
        let [kind] = bare.as_slice() else {
            return Err(MeshError::invalid("mesh needs exactly one kind, e.g. `mesh octahedron radius=1`"));
        };
        params.remove(kind);

        let spec = match kind.as_str() {
            "tetrahedron" => {
                params.expect_only(kind, &["apex", "base_radius", "base_height"])?;
                MeshSpec::Tetrahedron {
                    apex: point3(&params, "apex")?,
                    base_radius: params.number("base_radius")?,
                    base_height: params.number_or("base_height", 0.0)?,
                }
            }
            "cube_grid" => {
                params.expect_only(kind, &["spacing", "height", "bracing"])?;
                MeshSpec::CubeGrid {
                    spacing: params.number("spacing")?,
                    height: params.number("height")?,
                    bracing: match params.ident_opt("bracing")? {
                        Some(name) => CubeBracing::from_name(name)?,
                        None => CubeBracing::default(),
                    },
                }
            }
            "octahedron" => {
                params.expect_only(kind, &["radius"])?;
                MeshSpec::Octahedron {
                    radius: params.number("radius")?,
                }
            }
            "uv_sphere" => {
                params.expect_only(kind, &["radius", "u_segments", "v_segments"])?;
                MeshSpec::UvSphere {
                    radius: params.number("radius")?,
                    u_segments: params.count("u_segments")?,
                    v_segments: params.count("v_segments")?,
                }
            }
            "fan" => {
                params.expect_only(kind, &["center", "outline"])?;
                MeshSpec::Fan {
                    center: Point2::from(params.vector2_or("center", Vector2::zeros())?),
                    outline: params.points2("outline")?,
                }
            }
            other => return Err(MeshError::invalid(format!("unknown mesh kind '{other}'"))),
        };
        Ok(spec)
    }
}

/// A named mesh and the stages it is taken through, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    name: String,
    mesh: MeshSpec,
    stages: Vec<Stage>,
}

impl Scene {
    pub fn new(name: impl Into<String>, mesh: MeshSpec, stages: Vec<Stage>) -> Self {
        Self {
            name: name.into(),
            mesh,
            stages,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &MeshSpec {
        &self.mesh
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Build the mesh and push every stage, returning the recorded timeline
    pub fn run(&self) -> MeshResult<Timeline> {
        let mut timeline = Timeline::new(self.mesh.build()?);
        for stage in &self.stages {
            timeline.push(stage)?;
        }
        log::debug!("scene {} produced {} snapshots", self.name, timeline.len());
        Ok(timeline)
    }

    /// Names accepted by [`Scene::builtin`]
    pub const BUILTIN_NAMES: [&'static str; 6] = [
        "spring-tetrahedron",
        "soft-cube",
        "soft-cube-elastic",
        "sphere-morph",
        "octahedron",
        "face-warp",
    ];

    /// Scenes reproducing the stock animations
    pub fn builtin(name: &str) -> Option<Scene> {
        let scene = match name {
            "spring-tetrahedron" => Scene::new(
                name,
                MeshSpec::Tetrahedron {
                    apex: Point3::new(0.0, 0.0, 3.5),
                    base_radius: 2.5,
                    base_height: 0.0,
                },
                vec![
                    Stage::VertexForce {
                        vertex: 0,
                        offset: Vector3::new(0.0, 1.2, -0.5),
                    },
                    Stage::RecoverToRest,
                ],
            ),
            "soft-cube" => Scene::new(
                name,
                MeshSpec::CubeGrid {
                    spacing: 1.5,
                    height: 3.0,
                    bracing: CubeBracing::CrossBraced,
                },
                vec![
                    Stage::Gravity(Gravity::pinned(1.0, 1.2)),
                    Stage::Compression(side_squeeze()),
                    Stage::RecoverToGravity,
                ],
            ),
            "soft-cube-elastic" => Scene::new(
                name,
                MeshSpec::CubeGrid {
                    spacing: 1.5,
                    height: 3.0,
                    bracing: CubeBracing::TetraDiagonals,
                },
                vec![
                    Stage::Gravity(Gravity {
                        threshold: 1.5,
                        fall_upper: 0.8,
                        fall_lower: 0.4,
                    }),
                    Stage::Compression(side_squeeze()),
                    Stage::RecoverToRest,
                ],
            ),
            "sphere-morph" => Scene::new(
                name,
                MeshSpec::UvSphere {
                    radius: 1.2,
                    u_segments: 6,
                    v_segments: 4,
                },
                vec![
                    Stage::Linear3d(Transform::scale(1.0, 1.0, 1.5)),
                    Stage::Linear3d(Transform::scale(0.8, 0.8, 0.7)),
                    Stage::Linear3d(Transform::rotation_z(45f64.to_radians())),
                ],
            ),
            "octahedron" => Scene::new(
                name,
                MeshSpec::Octahedron { radius: 1.5 },
                vec![Stage::Linear3d(Transform::rotation_z(45f64.to_radians()))],
            ),
            "face-warp" => Scene::new(
                name,
                MeshSpec::Fan {
                    center: Point2::origin(),
                    outline: face_outline(),
                },
                vec![
                    // Tilt the head back
                    Stage::Affine2d(PiecewiseAffine2::split(
                        Axis::Y,
                        0.0,
                        Affine2::new(Matrix2::new(1.0, -0.2, 0.0, 1.0), Vector2::new(0.0, 0.3)),
                        Affine2::shear_x(-0.1),
                    )),
                    // Twist the upper half sideways
                    Stage::Affine2d(PiecewiseAffine2::split(
                        Axis::Y,
                        0.0,
                        Affine2::shear_x(0.3),
                        Affine2::identity(),
                    )),
                    // Turn to the right: near cheek narrows, far cheek widens
                    Stage::Affine2d(PiecewiseAffine2::split(
                        Axis::X,
                        0.0,
                        Affine2::linear(Matrix2::new(0.8, 0.0, -0.2, 1.0)),
                        Affine2::linear(Matrix2::new(1.1, 0.0, -0.15, 1.0)),
                    )),
                ],
            ),
            _ => return None,
        };
        Some(scene)
    }
}

fn side_squeeze() -> Compression {
    Compression {
        left_threshold: -0.5,
        right_threshold: 0.5,
        squeeze: 0.6,
    }
}

/// Twelve points around a face outline, clockwise from the crown
fn face_outline() -> Vec<Point2<f64>> {
    [
        (0.0, 2.5),
        (1.0, 2.3),
        (1.8, 1.5),
        (2.0, 0.5),
        (1.8, -0.5),
        (1.2, -1.2),
        (0.0, -1.5),
        (-1.2, -1.2),
        (-1.8, -0.5),
        (-2.0, 0.5),
        (-1.8, 1.5),
        (-1.0, 2.3),
    ]
    .into_iter()
    .map(|(x, y)| Point2::new(x, y))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Topology;
    use approx::assert_relative_eq;

    #[test]
    fn test_every_builtin_runs() {
        for name in Scene::BUILTIN_NAMES {
            let scene = Scene::builtin(name).unwrap();
            let timeline = scene.run().unwrap();
            assert_eq!(timeline.len(), scene.stages().len() + 1, "{name}");
        }
        assert!(Scene::builtin("teapot").is_none());
    }

    #[test]
    fn test_spring_tetrahedron_returns_to_rest() {
        let timeline = Scene::builtin("spring-tetrahedron").unwrap().run().unwrap();
        let snapshots = timeline.snapshots();
        assert_eq!(snapshots[1].vertices[0], Point3::new(0.0, 1.2, 3.0));
        assert_eq!(&snapshots[2].vertices, timeline.rest());
    }

    #[test]
    fn test_soft_cube_recovers_to_sag() {
        let timeline = Scene::builtin("soft-cube").unwrap().run().unwrap();
        let snapshots = timeline.snapshots();
        assert_eq!(snapshots[3].vertices, snapshots[1].vertices);
        assert_ne!(&snapshots[3].vertices, timeline.rest());
    }

    #[test]
    fn test_face_warp_lift() {
        let timeline = Scene::builtin("face-warp").unwrap().run().unwrap();
        let lifted = &timeline.snapshots()[1].vertices;
        // Outline point 4 is the upper right cheek at (2.0, 0.5)
        assert_relative_eq!(lifted[4].x, 1.9, epsilon = 1e-12);
        assert_relative_eq!(lifted[4].y, 0.8, epsilon = 1e-12);
        // Outline point 8 is the lower left jaw at (-1.2, -1.2)
        assert_relative_eq!(lifted[8].x, -1.08, epsilon = 1e-12);
        assert_relative_eq!(lifted[8].y, -1.2, epsilon = 1e-12);
        // The fan centre stays put
        assert_eq!(lifted[0], Point3::origin());
    }

    #[test]
    fn test_mesh_spec_from_params() {
        let params = Params::new()
            .with("uv_sphere", "")
            .with("radius", 1.2)
            .with("u_segments", 6usize)
            .with("v_segments", 4usize);
        let spec = MeshSpec::from_params(&params).unwrap();
        assert_eq!(spec.kind(), "uv_sphere");
        let mesh = spec.build().unwrap();
        assert!(matches!(mesh.topology(), Topology::Faces(faces) if faces.len() == 36));
    }

    #[test]
    fn test_mesh_spec_rejects_unknown() {
        let params = Params::new().with("torus", "").with("radius", 1.0);
        assert!(MeshSpec::from_params(&params).is_err());
        let params = Params::new().with("radius", 1.0);
        assert!(MeshSpec::from_params(&params).is_err());
        let params = Params::new().with("octahedron", "").with("size", 1.0);
        assert!(MeshSpec::from_params(&params).is_err());
    }
}
