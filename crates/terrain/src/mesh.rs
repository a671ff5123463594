//! CPU-side mesh buffers and the grid index builder.
//!
//! A `MeshBuffer` stores interleaved `[x, y, z, u, v]` vertices and `u32`
//! triangle indices. Buffers are reset and rebuilt wholesale on every
//! generation cycle; nothing patches them incrementally.

use bitcode::{Decode, Encode};

use crate::error::ProtocolError;

/// Floats per vertex: position (3) + texcoord (2).
pub const STRIDE: usize = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    vertex_data: Vec<f32>,
    index_data: Vec<u32>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all vertices and indices, keeping the allocations.
    pub fn reset(&mut self) {
        self.vertex_data.clear();
        self.index_data.clear();
    }

    pub fn push_vertex(&mut self, position: [f32; 3], uv: [f32; 2]) {
        self.vertex_data.extend_from_slice(&position);
        self.vertex_data.extend_from_slice(&uv);
    }

    pub fn push_index(&mut self, index: u32) {
        self.index_data.push(index);
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.index_data.extend_from_slice(&[a, b, c]);
    }

    pub fn vertex_count(&self) -> u32 {
        (self.vertex_data.len() / STRIDE) as u32
    }

    pub fn index_count(&self) -> u32 {
        self.index_data.len() as u32
    }

    pub fn vertex_data(&self) -> &[f32] {
        &self.vertex_data
    }

    pub fn index_data(&self) -> &[u32] {
        &self.index_data
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_data.is_empty()
    }

    /// Vertex positions, in vertex order.
    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertex_data
            .chunks_exact(STRIDE)
            .map(|v| [v[0], v[1], v[2]])
            .collect()
    }

    /// Vertex texcoords, in vertex order.
    pub fn uvs(&self) -> Vec<[f32; 2]> {
        self.vertex_data
            .chunks_exact(STRIDE)
            .map(|v| [v[3], v[4]])
            .collect()
    }

    /// Replace the vertex data wholesale.
    pub fn load(&mut self, vertex_data: &[f32]) {
        self.vertex_data.clear();
        self.vertex_data.extend_from_slice(vertex_data);
    }

    /// Replace the index data wholesale.
    pub fn load_index(&mut self, index_data: &[u32]) {
        self.index_data.clear();
        self.index_data.extend_from_slice(index_data);
    }

    /// Copy the buffer into a wire payload.
    pub fn to_payload(&self) -> MeshPayload {
        MeshPayload {
            vertex_data: self.vertex_data.clone(),
            vertex_count: self.vertex_count(),
            index_data: self.index_data.clone(),
            index_count: self.index_count(),
        }
    }

    /// First index that refers past the last vertex, if any.
    pub fn out_of_range_index(&self) -> Option<u32> {
        let count = self.vertex_count();
        self.index_data.iter().copied().find(|&i| i >= count)
    }
}

// ---------------------------------------------------------------------------
// Grid index builder
// ---------------------------------------------------------------------------

/// Triangle orientation for `index_grid`.
///
/// `Reverse` is `Forward` with the second and third entry of every triangle
/// swapped, so the same vertex grid faces the opposite way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Forward,
    Reverse,
}

/// Append a `rows x cols` vertex grid to `mesh`, row-major, plus two
/// triangles for every interior quad.
///
/// `place` receives `(row_frac, col_frac)`, each in `[0, 1]`, and returns the
/// vertex position and texcoord. Indices are offset by the vertex count the
/// mesh had on entry, so several grids can share one mesh.
pub fn index_grid<F>(mesh: &mut MeshBuffer, rows: usize, cols: usize, winding: Winding, mut place: F)
where
    F: FnMut(f64, f64) -> ([f32; 3], [f32; 2]),
{
    if rows == 0 || cols == 0 {
        return;
    }
    let row_span = (rows.max(2) - 1) as f64;
    let col_span = (cols.max(2) - 1) as f64;
    let c = cols as u32;
    let mut k = mesh.vertex_count();

    for i in 0..rows {
        for j in 0..cols {
            let (position, uv) = place(i as f64 / row_span, j as f64 / col_span);
            mesh.push_vertex(position, uv);
            if i + 1 < rows && j + 1 < cols {
                match winding {
                    Winding::Forward => {
                        mesh.push_triangle(k, k + 1, k + c);
                        mesh.push_triangle(k + c, k + 1, k + c + 1);
                    }
                    Winding::Reverse => {
                        mesh.push_triangle(k, k + c, k + 1);
                        mesh.push_triangle(k + c, k + c + 1, k + 1);
                    }
                }
            }
            k += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Wire payload
// ---------------------------------------------------------------------------

/// Serialized contents of one mesh, as carried by a build-meshes reply.
#[derive(Debug, Clone, Default, PartialEq, Encode, Decode)]
pub struct MeshPayload {
    pub vertex_data: Vec<f32>,
    pub vertex_count: u32,
    pub index_data: Vec<u32>,
    pub index_count: u32,
}

impl MeshPayload {
    /// Check counts against the data and every index against the vertex count.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.vertex_data.len() != self.vertex_count as usize * STRIDE {
            return Err(ProtocolError::InvalidPayload(format!(
                "{} floats for {} vertices",
                self.vertex_data.len(),
                self.vertex_count
            )));
        }
        if self.index_data.len() != self.index_count as usize {
            return Err(ProtocolError::InvalidPayload(format!(
                "{} indices, header says {}",
                self.index_data.len(),
                self.index_count
            )));
        }
        if self.index_count % 3 != 0 {
            return Err(ProtocolError::InvalidPayload(format!(
                "index count {} is not a whole number of triangles",
                self.index_count
            )));
        }
        if let Some(bad) = self.index_data.iter().find(|&&i| i >= self.vertex_count) {
            return Err(ProtocolError::InvalidPayload(format!(
                "index {bad} >= vertex count {}",
                self.vertex_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(row: f64, col: f64) -> ([f32; 3], [f32; 2]) {
        ([col as f32, 0.0, row as f32], [col as f32, row as f32])
    }

    #[test]
    fn test_road_grid_counts() {
        let mut mesh = MeshBuffer::new();
        index_grid(&mut mesh, 2, 64, Winding::Forward, flat);
        assert_eq!(mesh.vertex_count(), 128);
        assert_eq!(mesh.index_count(), 378);
        assert!(mesh.out_of_range_index().is_none());
    }

    #[test]
    fn test_index_count_formula() {
        for (rows, cols) in [(2, 2), (3, 5), (6, 6), (32, 64), (1, 8), (8, 1)] {
            let mut mesh = MeshBuffer::new();
            index_grid(&mut mesh, rows, cols, Winding::Reverse, flat);
            assert_eq!(mesh.vertex_count() as usize, rows * cols);
            assert_eq!(
                mesh.index_count() as usize,
                6 * rows.saturating_sub(1) * cols.saturating_sub(1),
                "grid {rows}x{cols}"
            );
            assert!(mesh.out_of_range_index().is_none());
        }
    }

    #[test]
    fn test_fractions_cover_unit_square() {
        let mut seen = Vec::new();
        let mut mesh = MeshBuffer::new();
        index_grid(&mut mesh, 3, 2, Winding::Forward, |r, c| {
            seen.push((r, c));
            flat(r, c)
        });
        assert_eq!(
            seen,
            vec![(0.0, 0.0), (0.0, 1.0), (0.5, 0.0), (0.5, 1.0), (1.0, 0.0), (1.0, 1.0)]
        );
    }

    #[test]
    fn test_winding_swaps_triangle_orientation() {
        let mut fwd = MeshBuffer::new();
        let mut rev = MeshBuffer::new();
        index_grid(&mut fwd, 4, 5, Winding::Forward, flat);
        index_grid(&mut rev, 4, 5, Winding::Reverse, flat);

        assert_eq!(fwd.vertex_data(), rev.vertex_data());
        assert_eq!(fwd.index_count(), rev.index_count());
        for (f, r) in fwd
            .index_data()
            .chunks_exact(3)
            .zip(rev.index_data().chunks_exact(3))
        {
            assert_eq!([f[0], f[2], f[1]], [r[0], r[1], r[2]]);
        }
    }

    #[test]
    fn test_second_grid_offsets_indices() {
        let mut mesh = MeshBuffer::new();
        index_grid(&mut mesh, 2, 2, Winding::Forward, flat);
        index_grid(&mut mesh, 2, 2, Winding::Forward, flat);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(&mesh.index_data()[6..], &[4, 5, 6, 6, 5, 7]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut mesh = MeshBuffer::new();
        index_grid(&mut mesh, 3, 3, Winding::Forward, flat);
        mesh.reset();
        assert!(mesh.is_empty());
        assert_eq!(mesh.index_count(), 0);
    }

    #[test]
    fn test_payload_validate() {
        let mut mesh = MeshBuffer::new();
        index_grid(&mut mesh, 2, 3, Winding::Forward, flat);
        let payload = mesh.to_payload();
        assert!(payload.validate().is_ok());

        let mut bad = payload.clone();
        bad.index_data[0] = 99;
        assert!(matches!(
            bad.validate(),
            Err(ProtocolError::InvalidPayload(_))
        ));

        let mut short = payload;
        short.vertex_data.pop();
        assert!(short.validate().is_err());
    }
}
