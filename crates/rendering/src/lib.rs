use bevy::prelude::*;

pub mod camera;
pub mod canyon_render;

use camera::ViewerCameraPlugin;
use canyon_render::CanyonRenderPlugin;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(camera::FOG_COLOR))
            .add_plugins((CanyonRenderPlugin, ViewerCameraPlugin))
            .add_systems(Startup, setup_lighting);
    }
}

fn setup_lighting(mut commands: Commands) {
    // Ambient light for the shadowed canyon floor
    commands.insert_resource(AmbientLight {
        color: Color::srgb(1.0, 0.95, 0.9),
        brightness: 400.0,
    });

    // Directional light (sun) high over the canyon
    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::XYZ,
            -std::f32::consts::FRAC_PI_3, // 60 degrees down
            std::f32::consts::FRAC_PI_6,  // slight rotation
            0.0,
        )),
    ));
}
