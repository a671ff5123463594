//! Mesh categories and the generator registry.
//!
//! Every category (road, cliff, brush, rocks) is one `MeshGenerator` paired
//! with the `MeshBuffer` it fills. The worker walks the registry uniformly
//! on each generation cycle instead of handling each category by hand.

use std::ops::Range;

use bitcode::{Decode, Encode};

use crate::config::{StreamingConfig, WINDOW_LENGTH};
use crate::error::WorkerError;
use crate::fields::TerrainFields;
use crate::mesh::MeshBuffer;
use crate::protocol::{CategorySeeds, MeshBundle, Position};
use crate::scatter::{CellScatter, PropShape, ScatterParams};
use crate::strips::{CliffFace, RoadStrip};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub enum MeshCategory {
    Road,
    Cliff,
    Brush,
    Rocks,
}

impl MeshCategory {
    pub const ALL: [MeshCategory; 4] = [
        MeshCategory::Road,
        MeshCategory::Cliff,
        MeshCategory::Brush,
        MeshCategory::Rocks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MeshCategory::Road => "road",
            MeshCategory::Cliff => "cliff",
            MeshCategory::Brush => "brush",
            MeshCategory::Rocks => "rocks",
        }
    }
}

impl std::fmt::Display for MeshCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// GenerationWindow
// ---------------------------------------------------------------------------

/// The z-extent regenerated by one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationWindow {
    /// `floor(pos.z)` of the request.
    pub center: i64,
    pub cell_radius: u32,
}

impl GenerationWindow {
    pub fn around(pos: Position, cell_radius: u32) -> Self {
        Self {
            center: (pos.z as f64).floor() as i64,
            cell_radius,
        }
    }

    /// Scatter cells `[center - radius, center + radius)`, clamped to the
    /// `i64` range.
    pub fn cells(&self) -> Range<i64> {
        let r = i64::from(self.cell_radius);
        self.center.saturating_sub(r)..self.center.saturating_add(r)
    }

    /// z along the strip for a fraction in `[0, 1]`.
    pub fn strip_z(&self, frac: f64) -> f64 {
        self.center as f64 + (frac - 0.5) * WINDOW_LENGTH
    }
}

// ---------------------------------------------------------------------------
// MeshGenerator
// ---------------------------------------------------------------------------

/// Fills one category's mesh for a window. The mesh arrives empty.
pub trait MeshGenerator: Send {
    fn category(&self) -> MeshCategory;

    fn generate(&mut self, window: &GenerationWindow, fields: &TerrainFields, mesh: &mut MeshBuffer);
}

impl MeshGenerator for CellScatter {
    fn category(&self) -> MeshCategory {
        match self.params().shape {
            PropShape::Brush => MeshCategory::Brush,
            PropShape::Rock => MeshCategory::Rocks,
        }
    }

    fn generate(&mut self, window: &GenerationWindow, fields: &TerrainFields, mesh: &mut MeshBuffer) {
        CellScatter::generate(self, window.cells(), fields, mesh);
    }
}

struct Entry {
    generator: Box<dyn MeshGenerator>,
    mesh: MeshBuffer,
}

/// Category generators and their meshes, in category order.
#[derive(Default)]
pub struct CategoryRegistry {
    entries: Vec<Entry>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Road, cliff, brush and rocks, seeded and sized from `seeds` and `config`.
    pub fn standard(seeds: CategorySeeds, config: &StreamingConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(RoadStrip));
        registry.register(Box::new(CliffFace));
        registry.register(Box::new(CellScatter::new(
            ScatterParams::BRUSH.with_per_cell(config.brush_per_cell),
            seeds.brush,
        )));
        registry.register(Box::new(CellScatter::new(
            ScatterParams::ROCKS.with_per_cell(config.rocks_per_cell),
            seeds.rocks,
        )));
        registry
    }

    /// Add a generator, replacing any existing one for the same category.
    pub fn register(&mut self, generator: Box<dyn MeshGenerator>) {
        let category = generator.category();
        match self
            .entries
            .binary_search_by_key(&category, |e| e.generator.category())
        {
            Ok(i) => self.entries[i].generator = generator,
            Err(i) => self.entries.insert(
                i,
                Entry {
                    generator,
                    mesh: MeshBuffer::new(),
                },
            ),
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = MeshCategory> + '_ {
        self.entries.iter().map(|e| e.generator.category())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mesh(&self, category: MeshCategory) -> Option<&MeshBuffer> {
        self.entries
            .iter()
            .find(|e| e.generator.category() == category)
            .map(|e| &e.mesh)
    }

    /// Reset and regenerate every mesh for `window`, then bundle them.
    ///
    /// Fails without a bundle if any mesh references a vertex it does not
    /// have; the whole cycle is discarded.
    pub fn generate_all(
        &mut self,
        window: &GenerationWindow,
        fields: &TerrainFields,
    ) -> Result<MeshBundle, WorkerError> {
        for entry in &mut self.entries {
            entry.mesh.reset();
            entry.generator.generate(window, fields, &mut entry.mesh);
            if let Some(bad) = entry.mesh.out_of_range_index() {
                return Err(WorkerError::InvalidMesh(format!(
                    "{} index {bad} >= vertex count {}",
                    entry.generator.category(),
                    entry.mesh.vertex_count()
                )));
            }
        }
        Ok(MeshBundle {
            meshes: self
                .entries
                .iter()
                .map(|e| (e.generator.category(), e.mesh.to_payload()))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_map::SampleMap;

    struct Broken;

    impl MeshGenerator for Broken {
        fn category(&self) -> MeshCategory {
            MeshCategory::Rocks
        }

        fn generate(&mut self, _: &GenerationWindow, _: &TerrainFields, mesh: &mut MeshBuffer) {
            mesh.push_vertex([0.0; 3], [0.0; 2]);
            mesh.push_triangle(0, 1, 2);
        }
    }

    fn fields() -> TerrainFields {
        TerrainFields::from_maps(
            &SampleMap::randomized_line(128, 1),
            &SampleMap::noise_grid(16, 16, 2),
        )
        .unwrap()
    }

    #[test]
    fn test_window_floors_center() {
        let w = GenerationWindow::around(Position::new(0.0, 0.0, -0.5), 8);
        assert_eq!(w.center, -1);
        assert_eq!(w.cells(), -9..7);
        let w = GenerationWindow::around(Position::new(3.0, 1.0, 12.9), 2);
        assert_eq!(w.center, 12);
        assert_eq!(w.cells(), 10..14);
    }

    #[test]
    fn test_window_cells_clamp_at_extreme_z() {
        let far = GenerationWindow::around(Position::new(0.0, 0.0, f32::MAX), 8);
        assert_eq!(far.center, i64::MAX);
        assert_eq!(far.cells(), (i64::MAX - 8)..i64::MAX);
        let near = GenerationWindow::around(Position::new(0.0, 0.0, f32::NEG_INFINITY), 8);
        assert_eq!(near.cells(), i64::MIN..(i64::MIN + 8));
    }

    #[test]
    fn test_strip_spans_window_length() {
        let w = GenerationWindow {
            center: 4,
            cell_radius: 8,
        };
        assert_eq!(w.strip_z(0.0), -4.0);
        assert_eq!(w.strip_z(1.0), 12.0);
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = CategoryRegistry::standard(
            CategorySeeds { rocks: 1, brush: 2 },
            &StreamingConfig::default(),
        );
        let categories: Vec<_> = registry.categories().collect();
        assert_eq!(categories, MeshCategory::ALL.to_vec());
    }

    #[test]
    fn test_register_replaces_same_category() {
        let mut registry = CategoryRegistry::standard(
            CategorySeeds { rocks: 1, brush: 2 },
            &StreamingConfig::default(),
        );
        registry.register(Box::new(Broken));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_invalid_mesh_abandons_cycle() {
        let mut registry = CategoryRegistry::new();
        registry.register(Box::new(RoadStrip));
        registry.register(Box::new(Broken));
        let window = GenerationWindow {
            center: 0,
            cell_radius: 8,
        };
        let err = registry.generate_all(&window, &fields()).unwrap_err();
        assert!(matches!(err, WorkerError::InvalidMesh(_)), "got {err:?}");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_generate_all_resets_meshes() {
        let mut registry = CategoryRegistry::standard(
            CategorySeeds { rocks: 5, brush: 6 },
            &StreamingConfig::default(),
        );
        let f = fields();
        let w = GenerationWindow {
            center: 0,
            cell_radius: 8,
        };
        let first = registry.generate_all(&w, &f).unwrap();
        let second = registry.generate_all(&w, &f).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_category_names() {
        let names: Vec<_> = MeshCategory::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["road", "cliff", "brush", "rocks"]);
    }
}
