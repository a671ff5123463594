use bevy::input::mouse::MouseMotion;
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

use terrain::session::Session;
use terrain::viewer;

use crate::canyon_render::StreamFocus;

const WALK_SPEED: f32 = 1.0;
const SPRINT_MULTIPLIER: f32 = 5.0;
const LOOK_SENSITIVITY: f32 = 0.004;
/// Pitch limit in radians, about 40 degrees either way.
const MAX_PITCH: f32 = std::f32::consts::FRAC_1_SQRT_2;
const NEAR_PLANE: f32 = 0.01;
const FAR_PLANE: f32 = 200.0;

pub const FOG_COLOR: Color = Color::srgb(0.75, 0.75, 0.75);

/// First-person viewer walking the canyon floor.
#[derive(Component, Debug, Clone, Copy)]
pub struct ViewerCamera {
    /// Horizontal rotation in radians. `PI` looks down the path (+z).
    pub yaw: f32,
    /// Vertical rotation in radians, clamped to +-MAX_PITCH.
    pub pitch: f32,
    /// When set the viewer is not pinned to the road.
    pub free_flight: bool,
}

impl Default for ViewerCamera {
    fn default() -> Self {
        Self {
            yaw: std::f32::consts::PI,
            pitch: 0.0,
            free_flight: false,
        }
    }
}

impl ViewerCamera {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

pub fn setup_camera(mut commands: Commands, session: Option<Res<Session>>) {
    let viewer_camera = ViewerCamera::default();
    let position = session
        .map(|s| viewer::spawn_position(s.fields()))
        .unwrap_or(Vec3::ZERO);

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            near: NEAR_PLANE,
            far: FAR_PLANE,
            ..default()
        }),
        Transform::from_translation(position).with_rotation(viewer_camera.rotation()),
        DistanceFog {
            color: FOG_COLOR,
            falloff: FogFalloff::Exponential { density: 0.15 },
            ..default()
        },
        viewer_camera,
        StreamFocus,
    ));
}

/// Left-mouse drag: turn the viewer (horizontal = yaw, vertical = pitch).
pub fn viewer_look(
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut query: Query<(&mut ViewerCamera, &mut Transform)>,
) {
    let delta: Vec2 = motion.read().map(|m| m.delta).sum();
    if !buttons.pressed(MouseButton::Left) || delta == Vec2::ZERO {
        return;
    }
    let Ok((mut viewer_camera, mut transform)) = query.get_single_mut() else {
        return;
    };
    viewer_camera.yaw -= delta.x * LOOK_SENSITIVITY;
    viewer_camera.pitch =
        (viewer_camera.pitch - delta.y * LOOK_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);
    transform.rotation = viewer_camera.rotation();
}

/// WASD moves along the view direction, Shift sprints, Z toggles free flight.
/// Outside free flight the viewer is pinned to the road and kept between the
/// canyon walls.
pub fn viewer_walk(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    session: Option<Res<Session>>,
    mut query: Query<(&mut ViewerCamera, &mut Transform)>,
) {
    let Ok((mut viewer_camera, mut transform)) = query.get_single_mut() else {
        return;
    };
    if keys.just_pressed(KeyCode::KeyZ) {
        viewer_camera.free_flight = !viewer_camera.free_flight;
        info!("Free flight {}", if viewer_camera.free_flight { "on" } else { "off" });
    }

    let forward = transform.forward().as_vec3();
    let right = transform.right().as_vec3();
    let mut dir = Vec3::ZERO;
    if keys.pressed(KeyCode::KeyW) || keys.pressed(KeyCode::ArrowUp) {
        dir += forward;
    }
    if keys.pressed(KeyCode::KeyS) || keys.pressed(KeyCode::ArrowDown) {
        dir -= forward;
    }
    if keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft) {
        dir -= right;
    }
    if keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight) {
        dir += right;
    }

    let sprint = keys.pressed(KeyCode::ShiftLeft) || keys.pressed(KeyCode::ShiftRight);
    let speed = WALK_SPEED * if sprint { SPRINT_MULTIPLIER } else { 1.0 };
    let mut position = transform.translation + dir.normalize_or_zero() * speed * time.delta_secs();

    if !viewer_camera.free_flight {
        if let Some(session) = session {
            position = viewer::constrain(session.fields(), position);
        }
    }
    transform.translation = position;
}

pub struct ViewerCameraPlugin;

impl Plugin for ViewerCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera)
            .add_systems(Update, (viewer_look, viewer_walk).chain());
    }
}
