//! Worked cavity repair scenarios.
//!
//! Each test builds a small mesh by hand, carves a cavity around a new point
//! and checks what constrained-edge recovery and the star-shape driver
//! restore. Run with `RUST_LOG=debug` to see the repair log.

#![forbid(unsafe_code)]

use std::f64::consts::TAU;

use tetra_cavity::prelude::*;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Asserts that `vertex` sees every non-ghost ball face strictly.
fn assert_star_shaped(cavity: &CavityWorkingSet, mesh: &TetMesh, vertex: VertexIndex) {
    let p = mesh.point(vertex).unwrap();
    for face in cavity.ball().iter().filter(|f| !f.is_ghost()) {
        let [a, b, c] = face.nodes().map(|v| mesh.point(v).unwrap());
        assert!(
            orient3d(p, a, b, c) < 0.0,
            "face {:?} behind {} is blind",
            face.nodes(),
            face.neigh()
        );
    }
}

/// Five tetrahedra around the edge `(0, 1)` from `(0, 0, -1)` to `(0, 0, 1)`,
/// with the rim on the unit circle. Tetrahedron `k` spans rim vertices `k`
/// and `k + 1`.
fn five_around_axis() -> TetMesh {
    let mut points = vec![Point::new([0.0, 0.0, -1.0]), Point::new([0.0, 0.0, 1.0])];
    for k in 0..5_u32 {
        let angle = TAU * f64::from(k) / 5.0;
        points.push(Point::new([angle.cos(), angle.sin(), 0.0]));
    }
    let tets: Vec<[VertexIndex; 4]> = (0..5).map(|k| [0, 1, 2 + k, 2 + (k + 1) % 5]).collect();
    TetMesh::from_tetrahedra(points, &tets).unwrap()
}

/// A point inside tetrahedron 0 of [`five_around_axis`].
fn inside_first_sector(mesh: &TetMesh) -> Point {
    let [p, q, r0, r1] = [0, 1, 2, 3].map(|v| *mesh.point(v).unwrap().coords());
    Point::new(std::array::from_fn(|i| {
        0.25 * p[i] + 0.25 * q[i] + 0.3 * r0[i] + 0.2 * r1[i]
    }))
}

#[test]
fn single_tetrahedron_needs_no_repair() {
    init_tracing();
    let points = vec![
        Point::new([0.0, 0.0, 0.0]),
        Point::new([1.0, 0.0, 0.0]),
        Point::new([0.0, 1.0, 0.0]),
        Point::new([0.0, 0.0, 1.0]),
    ];
    let mut mesh = TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3]]).unwrap();
    let vertex = mesh.add_vertex(Point::new([0.25, 0.25, 0.25])).unwrap();

    let mut cavity = CavityWorkingSet::new();
    let checkpoint = cavity.carve(&mut mesh, &[0]).unwrap();
    let config = ReshapeConfig::strict();
    let recovery =
        respect_edge_constraint_with_config(&mut cavity, &mut mesh, vertex, 3, checkpoint, &config)
            .unwrap();
    assert_eq!(recovery, EdgeRecoveryStatistics::default());

    let stats =
        reshape_cavity_if_needed_with_config(&mut cavity, &mut mesh, vertex, checkpoint, &config)
            .unwrap();
    assert!(stats.was_star_shaped());
    assert_eq!(cavity.deleted(), &[0]);
    assert_eq!(cavity.ball().len(), 4);
    assert_eq!(mesh.color(0), 3);
    assert_star_shaped(&cavity, &mesh, vertex);
}

#[test]
fn cavity_reaching_past_the_hull_skips_ghost_faces() {
    init_tracing();
    let points = vec![
        Point::new([0.0, 0.0, 0.0]),
        Point::new([1.0, 0.0, 0.0]),
        Point::new([0.0, 1.0, 0.0]),
        Point::new([0.0, 0.0, 1.0]),
    ];
    let mut mesh = TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3]]).unwrap();
    // Beyond the hull triangle (1, 2, 3).
    let vertex = mesh.add_vertex(Point::new([0.5, 0.5, 0.5])).unwrap();
    let slot = mesh.nodes(0).iter().position(|&v| v == 0).unwrap();
    let ghost = mesh.neighbor(HalfFace::new(0, slot)).tet();
    assert!(mesh.is_ghost(ghost));

    let mut cavity = CavityWorkingSet::new();
    let checkpoint = cavity.carve(&mut mesh, &[0, ghost]).unwrap();
    let ghost_faces = cavity.ball().iter().filter(|f| f.is_ghost()).count();
    assert_eq!(ghost_faces, 3);
    assert_eq!(cavity.ball().len(), 6);
    cavity.validate_boundary(&mesh, checkpoint).unwrap();

    let stats = reshape_cavity_if_needed_with_config(
        &mut cavity,
        &mut mesh,
        vertex,
        checkpoint,
        &ReshapeConfig::strict(),
    )
    .unwrap();
    assert!(stats.was_star_shaped());
    assert_eq!(cavity.deleted().len(), 2);
    assert_star_shaped(&cavity, &mesh, vertex);
    cavity.validate_boundary(&mesh, checkpoint).unwrap();
}

#[test]
fn blind_neighbor_is_restored() {
    init_tracing();
    let points = vec![
        Point::new([0.0, 0.0, 0.0]),
        Point::new([1.0, 0.0, 0.0]),
        Point::new([0.0, 1.0, 0.0]),
        Point::new([0.0, 0.0, 1.0]),
        Point::new([1.5, 1.5, -1.9]),
    ];
    let mut mesh = TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
    let vertex = mesh.add_vertex(Point::new([0.2, 0.2, 0.2])).unwrap();

    let mut cavity = CavityWorkingSet::new();
    let checkpoint = cavity.carve(&mut mesh, &[0, 1]).unwrap();
    assert_eq!(cavity.ball().len(), 6);

    let stats = reshape_cavity_if_needed_with_config(
        &mut cavity,
        &mut mesh,
        vertex,
        checkpoint,
        &ReshapeConfig::strict(),
    )
    .unwrap();
    assert_eq!(stats.restored, 1);
    assert_eq!(cavity.deleted(), &[0]);
    assert_eq!(cavity.ball().len(), 4);
    assert!(!mesh.is_deleted(1));
    assert_star_shaped(&cavity, &mesh, vertex);
    cavity.validate_boundary(&mesh, checkpoint).unwrap();
}

#[test]
fn swallowed_constrained_edge_is_rescued() {
    init_tracing();
    let mut mesh = five_around_axis();
    assert_eq!(mesh.constrain_edge(0, 1).unwrap(), 5);
    let vertex = mesh.add_vertex(inside_first_sector(&mesh)).unwrap();

    let mut cavity = CavityWorkingSet::new();
    let checkpoint = cavity.carve(&mut mesh, &[0, 1, 2, 3, 4]).unwrap();
    let config = ReshapeConfig::strict();
    let recovery =
        respect_edge_constraint_with_config(&mut cavity, &mut mesh, vertex, 9, checkpoint, &config)
            .unwrap();

    // The rim edge of tetrahedron 2 faces the point across the axis.
    assert_eq!(
        recovery,
        EdgeRecoveryStatistics {
            rings_walked: 1,
            rescued: 1,
        }
    );
    assert!(!mesh.is_deleted(2));
    assert_eq!(mesh.color(2), 9);
    assert!(cavity.deleted().iter().all(|&t| mesh.color(t) == 9));
    cavity.validate_boundary(&mesh, checkpoint).unwrap();

    reshape_cavity_if_needed_with_config(&mut cavity, &mut mesh, vertex, checkpoint, &config)
        .unwrap();
    assert!(cavity.deleted().contains(&0));
    assert_star_shaped(&cavity, &mesh, vertex);
    cavity.validate_boundary(&mesh, checkpoint).unwrap();
}

#[test]
fn partially_deleted_ring_keeps_its_edge() {
    init_tracing();
    let mut mesh = five_around_axis();
    mesh.constrain_edge(0, 1).unwrap();
    let vertex = mesh.add_vertex(inside_first_sector(&mesh)).unwrap();

    let mut cavity = CavityWorkingSet::new();
    let checkpoint = cavity.carve(&mut mesh, &[0, 1, 2, 3]).unwrap();
    let recovery = respect_edge_constraint_with_config(
        &mut cavity,
        &mut mesh,
        vertex,
        2,
        checkpoint,
        &ReshapeConfig::strict(),
    )
    .unwrap();
    assert_eq!(recovery.rings_walked, 1);
    assert_eq!(recovery.rescued, 0);
    assert_eq!(cavity.deleted().len(), 4);
    assert!(!mesh.is_deleted(4));
}

#[test]
fn constrained_facet_splits_the_ball() {
    init_tracing();
    let points = vec![
        Point::new([0.0, 0.0, 0.0]),
        Point::new([1.0, 0.0, 0.0]),
        Point::new([0.0, 1.0, 0.0]),
        Point::new([0.0, 0.0, 1.0]),
        Point::new([1.0, 1.0, 1.0]),
    ];
    let mut mesh = TetMesh::from_tetrahedra(points, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
    mesh.constrain_facet(1, 2, 3).unwrap();

    let mut cavity = CavityWorkingSet::new();
    let checkpoint = cavity.carve(&mut mesh, &[0, 1]).unwrap();
    // Both sides of the constrained triangle stay on the boundary.
    assert_eq!(cavity.ball().len(), 8);
    cavity.validate_boundary(&mesh, checkpoint).unwrap();

    let config = ReshapeConfig::strict();
    restore_tetrahedron(&mut cavity, &mut mesh, 1, &config).unwrap();
    assert_eq!(cavity.ball().len(), 4);
    cavity.validate_boundary(&mesh, checkpoint).unwrap();
}

#[test]
fn working_set_spans_several_insertions() {
    init_tracing();
    let mut mesh = generate_cube_lattice(2, 1.0).unwrap();
    let mut cavity = CavityWorkingSet::new();

    let first = cavity.carve(&mut mesh, &[0]).unwrap();
    assert_eq!(first, 0);
    let second = cavity.carve(&mut mesh, &[47]).unwrap();
    assert_eq!(second, 1);
    assert_eq!(
        cavity.carve(&mut mesh, &[0]),
        Err(CavityError::AlreadyDeleted { tet: 0 })
    );
    cavity.validate_boundary(&mesh, second).unwrap();

    cavity.clear();
    assert!(cavity.deleted().is_empty());
    assert!(cavity.ball().is_empty());
}
