//! Cell scatter generator for small props (brush, rocks).
//!
//! The world is cut into unit z-cells. Each cell reseeds its own RNG from
//! `|cell * seed + salt|` and draws a fixed number of items, so a cell's
//! contents depend only on its index, the category seed and the salt. Two
//! overlapping generation windows therefore produce identical geometry for
//! every cell they share.

use std::f64::consts::PI;
use std::ops::Range;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{BRUSH_PER_CELL, ROCKS_PER_CELL, ROCK_GRID};
use crate::fields::TerrainFields;
use crate::mesh::{index_grid, MeshBuffer, Winding};
use crate::seed_chain::uniform;

/// RNG seed for one cell of one category.
pub fn cell_hash(cell: i64, seed: u32, salt: i64) -> u64 {
    cell.wrapping_mul(seed as i64)
        .wrapping_add(salt)
        .unsigned_abs()
}

/// Geometry each scattered item expands into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropShape {
    /// Four rotated triangles around a stem point.
    Brush,
    /// A small indexed dome.
    Rock,
}

/// Per-category scatter constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterParams {
    pub salt: i64,
    pub per_cell: u32,
    /// Range of the inward pull from the cliff line toward the path.
    pub lateral: (f64, f64),
    pub radius: (f64, f64),
    /// How far below the path surface the item is planted.
    pub sink: f64,
    pub shape: PropShape,
}

impl ScatterParams {
    pub const BRUSH: ScatterParams = ScatterParams {
        salt: 1,
        per_cell: BRUSH_PER_CELL,
        lateral: (0.0, 0.15),
        radius: (0.01, 0.1),
        sink: 0.0025,
        shape: PropShape::Brush,
    };

    pub const ROCKS: ScatterParams = ScatterParams {
        salt: 2,
        per_cell: ROCKS_PER_CELL,
        lateral: (0.02, 0.25),
        radius: (0.01, 0.03),
        sink: 0.005,
        shape: PropShape::Rock,
    };

    pub fn with_per_cell(mut self, per_cell: u32) -> Self {
        self.per_cell = per_cell;
        self
    }
}

/// One placed prop. Transient: expanded into mesh vertices right away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterItem {
    pub position: [f64; 3],
    pub radius: f64,
    /// Brush rotation around the stem.
    pub angle: f64,
    /// Rock texture offset.
    pub texture_offset: [f64; 2],
}

/// Scatter generator for one category. Owns its RNG; the seed is fixed at
/// construction.
#[derive(Debug, Clone)]
pub struct CellScatter {
    params: ScatterParams,
    seed: u32,
    rng: ChaCha8Rng,
}

impl CellScatter {
    pub fn new(params: ScatterParams, seed: u32) -> Self {
        Self {
            params,
            seed,
            rng: ChaCha8Rng::seed_from_u64(cell_hash(0, seed, params.salt)),
        }
    }

    pub fn params(&self) -> &ScatterParams {
        &self.params
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Reseed for `cell` and draw its items.
    pub fn scatter_cell(&mut self, cell: i64, fields: &TerrainFields) -> Vec<ScatterItem> {
        let p = self.params;
        self.rng = ChaCha8Rng::seed_from_u64(cell_hash(cell, self.seed, p.salt));
        let rng = &mut self.rng;

        (0..p.per_cell)
            .map(|_| {
                let side = if uniform(rng, 0.0, 1.0) < 0.5 { -1.0 } else { 1.0 };
                let z = cell as f64 + uniform(rng, 0.0, 1.0);
                let y = fields.height(z) - p.sink;
                let x = fields.surface(y, z) + side * (0.5 - uniform(rng, p.lateral.0, p.lateral.1));
                let radius = uniform(rng, p.radius.0, p.radius.1);
                let (angle, texture_offset) = match p.shape {
                    PropShape::Brush => (uniform(rng, 0.0, PI), [0.0, 0.0]),
                    PropShape::Rock => {
                        let tx = uniform(rng, 0.0, 5.0);
                        let ty = uniform(rng, 0.0, 5.0);
                        (0.0, [tx, ty])
                    }
                };
                ScatterItem {
                    position: [x, y, z],
                    radius,
                    angle,
                    texture_offset,
                }
            })
            .collect()
    }

    /// Scatter every cell in `cells` into `mesh`, in cell order.
    pub fn generate(&mut self, cells: Range<i64>, fields: &TerrainFields, mesh: &mut MeshBuffer) {
        for cell in cells {
            for item in self.scatter_cell(cell, fields) {
                match self.params.shape {
                    PropShape::Brush => expand_brush(mesh, &item),
                    PropShape::Rock => expand_rock(mesh, &item),
                }
            }
        }
    }
}

fn push_indexed(mesh: &mut MeshBuffer, position: [f32; 3], uv: [f32; 2]) {
    let index = mesh.vertex_count();
    mesh.push_vertex(position, uv);
    mesh.push_index(index);
}

/// Four triangles fanned a quarter turn apart around the stem, sequentially
/// indexed.
pub fn expand_brush(mesh: &mut MeshBuffer, item: &ScatterItem) {
    let [x, y, z] = item.position;
    let r = item.radius;
    let mut a = item.angle;
    let stem = [x as f32, y as f32, z as f32];
    for _ in 0..4 {
        push_indexed(mesh, stem, [0.0, 0.0]);
        push_indexed(
            mesh,
            [(x + r * a.cos()) as f32, (y + r) as f32, (z + r * a.sin()) as f32],
            [-1.0, 1.0],
        );
        a += PI * 0.5;
        push_indexed(
            mesh,
            [(x + r * a.cos()) as f32, (y + r) as f32, (z + r * a.sin()) as f32],
            [1.0, 1.0],
        );
    }
}

/// An upturned dome of radius `item.radius` on a `ROCK_GRID` square grid.
pub fn expand_rock(mesh: &mut MeshBuffer, item: &ScatterItem) {
    let [x, y, z] = item.position;
    let r = item.radius;
    let [tx, ty] = item.texture_offset;
    index_grid(mesh, ROCK_GRID, ROCK_GRID, Winding::Forward, |u, v| {
        let ox = 2.0 * (u - 0.5);
        let oz = 2.0 * (v - 0.5);
        let oy = (1.0 - ox * ox) * (1.0 - oz * oz);
        let len = (ox * ox + oy * oy + oz * oz).sqrt();
        let s = r / len;
        (
            [(x + ox * s) as f32, (y + oy * s) as f32, (z + oz * s) as f32],
            [(u + tx) as f32, (v + ty) as f32],
        )
    });
}
