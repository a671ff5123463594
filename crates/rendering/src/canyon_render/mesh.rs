use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;

use terrain::mesh::STRIDE;
use terrain::streaming::MeshTarget;

/// An empty triangle list with every attribute a canyon mesh carries.
pub fn empty_canyon_mesh() -> Mesh {
    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, Vec::<[f32; 3]>::new())
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, Vec::<[f32; 3]>::new())
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, Vec::<[f32; 2]>::new())
    .with_inserted_indices(Indices::U32(Vec::new()))
}

/// A borrowed `Mesh` asset receiving a handoff.
///
/// Interleaved `[x, y, z, u, v]` vertex data is split into position and uv
/// attributes; normals are derived in `build`.
pub struct RenderMesh<'a>(pub &'a mut Mesh);

impl MeshTarget for RenderMesh<'_> {
    fn reset(&mut self) {
        self.0
            .insert_attribute(Mesh::ATTRIBUTE_POSITION, Vec::<[f32; 3]>::new());
        self.0
            .insert_attribute(Mesh::ATTRIBUTE_NORMAL, Vec::<[f32; 3]>::new());
        self.0
            .insert_attribute(Mesh::ATTRIBUTE_UV_0, Vec::<[f32; 2]>::new());
        self.0.insert_indices(Indices::U32(Vec::new()));
    }

    fn load(&mut self, vertex_data: &[f32]) {
        let count = vertex_data.len() / STRIDE;
        let mut positions = Vec::with_capacity(count);
        let mut uvs = Vec::with_capacity(count);
        for v in vertex_data.chunks_exact(STRIDE) {
            positions.push([v[0], v[1], v[2]]);
            uvs.push([v[3], v[4]]);
        }
        self.0.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        self.0.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    }

    fn load_index(&mut self, index_data: &[u32]) {
        self.0.insert_indices(Indices::U32(index_data.to_vec()));
    }

    fn build(&mut self) {
        let vertices = self.0.count_vertices();
        let indexed = self.0.indices().is_some_and(|i| !i.is_empty());
        if vertices > 0 && indexed {
            self.0.compute_smooth_normals();
        } else {
            self.0
                .insert_attribute(Mesh::ATTRIBUTE_NORMAL, vec![[0.0f32, 1.0, 0.0]; vertices]);
        }
    }
}

pub(super) fn position_count(mesh: &Mesh) -> usize {
    mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        .map_or(0, |positions| positions.len())
}

pub(super) fn index_count(mesh: &Mesh) -> usize {
    mesh.indices().map_or(0, Indices::len)
}
