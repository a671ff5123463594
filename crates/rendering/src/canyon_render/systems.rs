use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;

use terrain::category::MeshCategory;
use terrain::session::Session;
use terrain::streaming::{hand_off, StreamingChannel};

use super::mesh::{empty_canyon_mesh, index_count, position_count, RenderMesh};
use super::types::{CanyonMesh, CanyonMeshHandles, StreamFocus, TerrainStream};

fn canyon_material(category: MeshCategory) -> StandardMaterial {
    match category {
        MeshCategory::Road => StandardMaterial {
            base_color: Color::srgb(0.62, 0.52, 0.38),
            perceptual_roughness: 0.95,
            ..default()
        },
        MeshCategory::Cliff => StandardMaterial {
            base_color: Color::srgb(0.76, 0.48, 0.30),
            perceptual_roughness: 0.9,
            ..default()
        },
        MeshCategory::Brush => StandardMaterial {
            base_color: Color::srgb(0.36, 0.45, 0.22),
            perceptual_roughness: 0.8,
            cull_mode: None,
            double_sided: true,
            ..default()
        },
        MeshCategory::Rocks => StandardMaterial {
            base_color: Color::srgb(0.5, 0.46, 0.42),
            perceptual_roughness: 0.85,
            ..default()
        },
    }
}

/// Spawn one empty mesh entity per category. Replies fill them in later.
pub fn spawn_canyon_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut handles = CanyonMeshHandles::default();
    for category in MeshCategory::ALL {
        let handle = meshes.add(empty_canyon_mesh());
        commands.spawn((
            Mesh3d(handle.clone()),
            MeshMaterial3d(materials.add(canyon_material(category))),
            Transform::IDENTITY,
            // bounds are computed once and go stale as the window moves
            NoFrustumCulling,
            CanyonMesh { category },
        ));
        handles.0.insert(category, handle);
    }
    commands.insert_resource(handles);
}

/// Start the worker and post the session's init message.
pub fn open_terrain_stream(session: Option<Res<Session>>, mut stream: ResMut<TerrainStream>) {
    let Some(session) = session else {
        warn!("No terrain session; streaming disabled");
        return;
    };
    match StreamingChannel::open(&session) {
        Ok(channel) => {
            info!(
                "Terrain streaming started (detail distance {})",
                session.config().detail_distance
            );
            stream.channel = Some(channel);
        }
        Err(e) => error!("Cannot start terrain worker: {e}"),
    }
}

/// Per frame: request a window when the focus has moved far enough, then
/// hand every reply that has arrived off into the mesh assets.
pub fn stream_canyon_meshes(
    mut stream: ResMut<TerrainStream>,
    handles: Res<CanyonMeshHandles>,
    focus: Query<&Transform, With<StreamFocus>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    if stream.is_halted() {
        return;
    }
    let stream = &mut *stream;
    let Some(channel) = stream.channel.as_mut() else {
        return;
    };

    if let Ok(transform) = focus.get_single() {
        channel.tick(transform.translation);
    }

    loop {
        match channel.next_bundle() {
            Ok(Some(bundle)) => {
                for (category, payload) in &bundle.meshes {
                    let Some(mesh) = handles.get(*category).and_then(|h| meshes.get_mut(h.id()))
                    else {
                        warn!("No live mesh for category {category}; payload dropped");
                        continue;
                    };
                    hand_off(&mut RenderMesh(&mut *mesh), payload);
                    debug!(
                        "Canyon {category} mesh: {} vertices, {} indices",
                        position_count(mesh),
                        index_count(mesh)
                    );
                }
            }
            Ok(None) => break,
            Err(fault) => {
                stream.fault = Some(fault);
                break;
            }
        }
    }
}
