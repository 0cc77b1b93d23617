use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use sb3d_core::{
    apply_named_stage, apply_stage, build_cube_grid, build_octahedron, build_tetrahedron,
    build_uv_sphere, edge_endpoints, face_vertices, uv_sphere_face_count, Affine2, Axis,
    Compression, CubeBracing, Gravity, Mesh, MeshError, Params, PiecewiseAffine2, Stage,
    StageContext, Timeline, Topology, Transform,
};

fn assert_in_range(topology: &Topology, len: usize) {
    match topology {
        Topology::Edges(edges) => {
            for edge in edges.iter() {
                let (a, b) = edge.indices();
                assert!(a < len && b < len);
            }
        }
        Topology::Faces(faces) => {
            for face in faces.iter() {
                assert!(face.indices().iter().all(|&i| i < len));
            }
        }
    }
}

#[test]
fn builders_report_expected_counts() {
    let (vs, edges) = build_tetrahedron(Point3::new(0.0, 0.0, 3.0), 2.0, 0.0).unwrap();
    assert_eq!(vs.len(), 4);
    assert_in_range(&Topology::Edges(edges), vs.len());

    for bracing in [CubeBracing::BoxOnly, CubeBracing::TetraDiagonals, CubeBracing::CrossBraced] {
        let (vs, edges) = build_cube_grid(1.5, 3.0, bracing).unwrap();
        assert_eq!(vs.len(), 8);
        assert_in_range(&Topology::Edges(edges), vs.len());
    }

    let (vs, faces) = build_octahedron(2.0).unwrap();
    assert_eq!(vs.len(), 6);
    assert_eq!(faces.len(), 8);
    assert_in_range(&Topology::Faces(faces), vs.len());
}

#[test]
fn uv_sphere_face_count_matches_formula() {
    for u in 3..=12 {
        for v in 2..=9 {
            let (vs, faces) = build_uv_sphere(1.0, u, v).unwrap();
            assert_eq!(faces.len(), 2 * u + 2 * (v - 2) * u, "u={u} v={v}");
            assert_eq!(faces.len(), uv_sphere_face_count(u, v).unwrap());
            assert_eq!(vs.len(), 2 + (v - 1) * u);
            assert_in_range(&Topology::Faces(faces), vs.len());
        }
    }
}

#[test]
fn uv_sphere_faces_are_not_degenerate() {
    let (vs, faces) = build_uv_sphere(1.2, 6, 4).unwrap();
    for corners in face_vertices(&vs, &faces).unwrap() {
        assert!(sb3d_core::face_normal(&corners).is_some());
    }
}

#[test]
fn recovery_is_state_independent() {
    let (rest, edges) = build_cube_grid(1.5, 3.0, CubeBracing::CrossBraced).unwrap();
    let mesh = Mesh::new(rest.clone(), edges).unwrap();
    let gravity = Stage::Gravity(Gravity {
        threshold: 1.5,
        fall_upper: 0.8,
        fall_lower: 0.4,
    });
    let compression = Stage::Compression(Compression {
        left_threshold: -0.5,
        right_threshold: 0.5,
        squeeze: 0.6,
    });

    let sequences: [&[&Stage]; 4] = [
        &[],
        &[&gravity],
        &[&gravity, &compression],
        &[&compression, &gravity, &gravity, &compression],
    ];
    for sequence in sequences {
        let mut timeline = Timeline::new(mesh.clone());
        for stage in sequence {
            timeline.push(stage).unwrap();
        }
        let recovered = timeline.push(&Stage::RecoverToRest).unwrap().vertices.clone();
        assert_eq!(recovered, rest);
        // Recovering twice changes nothing
        assert_eq!(timeline.push(&Stage::RecoverToRest).unwrap().vertices, rest);
    }
}

#[test]
fn stages_do_not_touch_input_or_topology() {
    let (rest, faces) = build_uv_sphere(1.2, 6, 4).unwrap();
    let topology = Topology::Faces(faces);
    let rest_copy = rest.clone();
    let topology_copy = topology.clone();

    let gravity = Stage::Gravity(Gravity::pinned(0.0, 0.3));
    let sagged = apply_stage(&StageContext::new(&rest, &topology), &rest, &gravity).unwrap();
    let sagged_copy = sagged.clone();
    let context = StageContext::new(&rest, &topology).with_gravity(&sagged);

    let stages = [
        gravity,
        Stage::Compression(Compression {
            left_threshold: -0.5,
            right_threshold: 0.5,
            squeeze: 0.2,
        }),
        Stage::RecoverToRest,
        Stage::RecoverToGravity,
        Stage::VertexForce {
            vertex: 3,
            offset: Vector3::new(1.0, 1.0, 1.0),
        },
        Stage::Affine2d(PiecewiseAffine2::split(
            Axis::Y,
            0.0,
            Affine2::shear_x(0.3),
            Affine2::identity(),
        )),
        Stage::Linear3d(Transform::rotation_z(0.3)),
    ];
    let names: Vec<_> = stages.iter().map(Stage::name).collect();
    assert_eq!(names, Stage::NAMES);

    for stage in &stages {
        // Feed both the rest shape and a deformed one through every stage
        for input in [&rest, &sagged] {
            let out = apply_stage(&context, input, stage).unwrap();
            assert_eq!(out.len(), input.len(), "{}", stage.name());
        }
        assert_eq!(rest, rest_copy, "{}", stage.name());
        assert_eq!(sagged, sagged_copy, "{}", stage.name());
        assert_eq!(topology, topology_copy, "{}", stage.name());
    }
}

#[test]
fn edge_endpoints_track_snapshots() {
    let (rest, edges) = build_cube_grid(1.5, 3.0, CubeBracing::BoxOnly).unwrap();
    let topology = Topology::Edges(edges.clone());
    let context = StageContext::new(&rest, &topology);
    let sagged = apply_stage(&context, &rest, &Stage::Gravity(Gravity::pinned(1.5, 0.8))).unwrap();

    let before = edge_endpoints(&rest, &edges).unwrap();
    let after = edge_endpoints(&sagged, &edges).unwrap();
    assert_eq!(before.len(), after.len());
    for ((a0, b0), (a1, b1)) in before.iter().zip(&after) {
        assert_eq!((a1.x, a1.y), (a0.x, a0.y));
        assert_eq!((b1.x, b1.y), (b0.x, b0.y));
    }
}

#[test]
fn tetrahedron_force_example() {
    let (rest, edges) = build_tetrahedron(Point3::new(0.0, 0.0, 3.0), 2.0, 0.0).unwrap();
    let topology = Topology::Edges(edges);
    let context = StageContext::new(&rest, &topology);

    let params = Params::new()
        .with("vertex", 0usize)
        .with("offset", [0.0, 1.2, -0.5]);
    let pushed = apply_named_stage(&context, &rest, "vertex_force", &params).unwrap();
    assert_eq!(pushed[0], Point3::new(0.0, 1.2, 2.5));
    for i in 1..4 {
        assert_eq!(pushed[i], rest[i]);
    }

    let restored = apply_named_stage(&context, &pushed, "recover_to_rest", &Params::new()).unwrap();
    assert_eq!(restored[0], Point3::new(0.0, 0.0, 3.0));
    assert_eq!(restored, rest);
}

#[test]
fn cube_gravity_example() {
    let (rest, edges) = build_cube_grid(1.5, 3.0, CubeBracing::CrossBraced).unwrap();
    assert_eq!(rest.len(), 8);
    let topology = Topology::Edges(edges);
    let context = StageContext::new(&rest, &topology);

    let params = Params::new()
        .with("threshold", 1.5)
        .with("fall_upper", 0.8)
        .with("fall_lower", 0.4);
    let sagged = apply_named_stage(&context, &rest, "gravity", &params).unwrap();
    for (before, after) in rest.iter().zip(sagged.iter()) {
        if before.z > 1.5 {
            assert_relative_eq!(after.z, before.z - 0.8);
        } else {
            assert_relative_eq!(after.z, before.z - 0.4);
        }
    }
}

#[test]
fn named_stage_errors() {
    let (rest, faces) = build_octahedron(1.0).unwrap();
    let topology = Topology::Faces(faces);
    let context = StageContext::new(&rest, &topology);

    assert_eq!(
        apply_named_stage(&context, &rest, "explode", &Params::new()),
        Err(MeshError::UnknownStage("explode".to_string()))
    );

    let short = sb3d_core::VertexSet::new(rest.iter().take(5).copied().collect());
    assert_eq!(
        apply_named_stage(&context, &short, "recover_to_rest", &Params::new()),
        Err(MeshError::ShapeMismatch { expected: 6, found: 5 })
    );
}
