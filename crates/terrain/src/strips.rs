//! Road and cliff strip generators.

use crate::category::{GenerationWindow, MeshCategory, MeshGenerator};
use crate::config::{CLIFF_COLS, CLIFF_HEIGHT, CLIFF_ROWS, ROAD_COLS, ROAD_ROWS};
use crate::fields::TerrainFields;
use crate::mesh::{index_grid, MeshBuffer, Winding};

/// The walkable path: a narrow band hugging the cliff line.
pub struct RoadStrip;

impl MeshGenerator for RoadStrip {
    fn category(&self) -> MeshCategory {
        MeshCategory::Road
    }

    fn generate(&mut self, window: &GenerationWindow, fields: &TerrainFields, mesh: &mut MeshBuffer) {
        index_grid(mesh, ROAD_ROWS, ROAD_COLS, Winding::Forward, |r, c| {
            let z = window.strip_z(c);
            let y = fields.height(z);
            let x = fields.surface(y, z) + (r - 0.5);
            ([x as f32, y as f32, z as f32], [r as f32, z as f32])
        });
    }
}

/// Cliff wall above and below the path. Both halves share one mesh; the
/// lower half is wound the other way so it faces the same side.
pub struct CliffFace;

impl CliffFace {
    fn half(
        mesh: &mut MeshBuffer,
        window: &GenerationWindow,
        fields: &TerrainFields,
        direction: f64,
        winding: Winding,
    ) {
        index_grid(mesh, CLIFF_ROWS, CLIFF_COLS, winding, |r, c| {
            let z = window.strip_z(c);
            let y = fields.height(z) + direction * r * CLIFF_HEIGHT;
            let x = fields.surface(y, z) + direction * 0.5;
            ([x as f32, y as f32, z as f32], [y as f32, z as f32])
        });
    }
}

impl MeshGenerator for CliffFace {
    fn category(&self) -> MeshCategory {
        MeshCategory::Cliff
    }

    fn generate(&mut self, window: &GenerationWindow, fields: &TerrainFields, mesh: &mut MeshBuffer) {
        Self::half(mesh, window, fields, 1.0, Winding::Forward);
        Self::half(mesh, window, fields, -1.0, Winding::Reverse);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_map::SampleMap;

    fn fields() -> TerrainFields {
        TerrainFields::from_maps(
            &SampleMap::randomized_line(128, 31),
            &SampleMap::noise_grid(32, 32, 32),
        )
        .unwrap()
    }

    const WINDOW: GenerationWindow = GenerationWindow {
        center: 0,
        cell_radius: 8,
    };

    #[test]
    fn test_road_strip_shape() {
        let f = fields();
        let mut mesh = MeshBuffer::new();
        RoadStrip.generate(&WINDOW, &f, &mut mesh);
        assert_eq!(mesh.vertex_count(), 128);
        assert_eq!(mesh.index_count(), 378);

        let positions = mesh.positions();
        // first and last vertex of the first row span the window
        assert_eq!(positions[0][2], -8.0);
        assert_eq!(positions[63][2], 8.0);
        // the two rows are one unit apart laterally
        let dx = positions[64][0] - positions[0][0];
        assert!((dx - 1.0).abs() < 1e-4, "road width {dx}");
    }

    #[test]
    fn test_road_follows_height() {
        let f = fields();
        let mut mesh = MeshBuffer::new();
        RoadStrip.generate(&WINDOW, &f, &mut mesh);
        for p in mesh.positions() {
            let expected = f.height(p[2] as f64) as f32;
            assert!((p[1] - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_cliff_face_halves() {
        let f = fields();
        let mut mesh = MeshBuffer::new();
        CliffFace.generate(&WINDOW, &f, &mut mesh);
        let per_half = (CLIFF_ROWS * CLIFF_COLS) as u32;
        assert_eq!(mesh.vertex_count(), 2 * per_half);
        assert_eq!(
            mesh.index_count() as usize,
            2 * 6 * (CLIFF_ROWS - 1) * (CLIFF_COLS - 1)
        );
        assert!(mesh.out_of_range_index().is_none());

        let positions = mesh.positions();
        let top = positions[(per_half - 1) as usize];
        let bottom = positions[(2 * per_half - 1) as usize];
        let h = f.height(8.0) as f32;
        assert!((top[1] - (h + 8.0)).abs() < 1e-4);
        assert!((bottom[1] - (h - 8.0)).abs() < 1e-4);
    }

    #[test]
    fn test_cliff_texcoords_are_world_yz() {
        let f = fields();
        let mut mesh = MeshBuffer::new();
        CliffFace.generate(&WINDOW, &f, &mut mesh);
        for (p, uv) in mesh.positions().iter().zip(mesh.uvs()) {
            assert_eq!([p[1], p[2]], uv);
        }
    }
}
