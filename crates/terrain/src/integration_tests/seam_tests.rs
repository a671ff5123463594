//! Cells shared by overlapping windows must come out identical.

use crate::category::MeshCategory;
use crate::config::{StreamingConfig, BRUSH_PER_CELL, ROCKS_PER_CELL, ROCK_GRID};
use crate::mesh::{MeshPayload, STRIDE};
use crate::protocol::{MeshBundle, Position};
use crate::session::Session;
use crate::worker::GenerationCoordinator;

use super::flat_session;

fn coordinator(session: &Session) -> GenerationCoordinator {
    let mut coordinator = GenerationCoordinator::new(session.config().clone());
    coordinator
        .handle(session.init_message())
        .expect("init should succeed");
    coordinator
}

fn window(coordinator: &mut GenerationCoordinator, z: f32) -> MeshBundle {
    coordinator
        .generate(Position::new(0.0, 0.0, z))
        .expect("generation should succeed")
}

/// Vertex floats and rebased indices emitted for `cell`.
fn cell_slice(
    payload: &MeshPayload,
    first_cell: i64,
    cell: i64,
    vertices_per_cell: usize,
    indices_per_cell: usize,
) -> (Vec<f32>, Vec<u32>) {
    let n = (cell - first_cell) as usize;
    let floats = vertices_per_cell * STRIDE;
    let vertices = payload.vertex_data[n * floats..(n + 1) * floats].to_vec();
    let base = (n * vertices_per_cell) as u32;
    let indices = payload.index_data[n * indices_per_cell..(n + 1) * indices_per_cell]
        .iter()
        .map(|i| i - base)
        .collect();
    (vertices, indices)
}

#[test]
fn test_rock_cells_match_across_windows() {
    let session = Session::new(31337, StreamingConfig::default()).unwrap();
    let mut c = coordinator(&session);
    let a = window(&mut c, 0.3);
    let b = window(&mut c, 4.9);
    let rocks_a = a.get(MeshCategory::Rocks).unwrap();
    let rocks_b = b.get(MeshCategory::Rocks).unwrap();

    let per_rock = ROCK_GRID * ROCK_GRID;
    let vertices = ROCKS_PER_CELL as usize * per_rock;
    let indices = ROCKS_PER_CELL as usize * 6 * (ROCK_GRID - 1) * (ROCK_GRID - 1);
    for cell in -4..8 {
        assert_eq!(
            cell_slice(rocks_a, -8, cell, vertices, indices),
            cell_slice(rocks_b, -4, cell, vertices, indices),
            "rock cell {cell} differs between windows"
        );
    }
}

#[test]
fn test_brush_cells_match_across_windows() {
    let session = Session::new(4242, StreamingConfig::default()).unwrap();
    let mut c = coordinator(&session);
    let a = window(&mut c, -2.0);
    let b = window(&mut c, 9.5);
    let brush_a = a.get(MeshCategory::Brush).unwrap();
    let brush_b = b.get(MeshCategory::Brush).unwrap();

    let vertices = BRUSH_PER_CELL as usize * 12;
    for cell in 1..6 {
        assert_eq!(
            cell_slice(brush_a, -10, cell, vertices, vertices),
            cell_slice(brush_b, 1, cell, vertices, vertices),
            "brush cell {cell} differs between windows"
        );
    }
}

#[test]
fn test_generation_order_does_not_matter() {
    let session = flat_session();
    let mut forward = coordinator(&session);
    let mut backward = coordinator(&session);

    let zs = [0.0, 3.0, 17.5, -6.0];
    let ahead: Vec<_> = zs.iter().map(|&z| window(&mut forward, z)).collect();
    let behind: Vec<_> = zs.iter().rev().map(|&z| window(&mut backward, z)).collect();
    for (a, b) in ahead.iter().zip(behind.iter().rev()) {
        assert_eq!(a, b);
    }
}

#[test]
fn test_consumer_fields_match_worker_geometry() {
    let session = Session::new(99, StreamingConfig::default()).unwrap();
    let mut c = coordinator(&session);
    let bundle = window(&mut c, 12.0);
    let road = bundle.get(MeshCategory::Road).unwrap();
    for v in road.vertex_data.chunks_exact(STRIDE) {
        let expected = session.fields().height(v[2] as f64) as f32;
        assert!(
            (v[1] - expected).abs() < 1e-4,
            "worker road y {} vs consumer height {expected}",
            v[1]
        );
    }
}
