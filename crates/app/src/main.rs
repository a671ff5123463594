use bevy::prelude::*;
use bevy::render::view::screenshot::{save_to_disk, Screenshot};
use bevy::window::PresentMode;

use terrain::config::StreamingConfig;
use terrain::TerrainPlugin;

mod headless;

const DEFAULT_HEADLESS_STEPS: u32 = 40;
/// Frames rendered before the screenshot is taken.
const SCREENSHOT_FRAME: u32 = 240;

fn main() -> AppExit {
    let config = match std::env::var("GOLDEN_THREAD_CONFIG") {
        Ok(path) => match StreamingConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("golden-thread: cannot load config {path}: {e}");
                return AppExit::error();
            }
        },
        Err(_) => StreamingConfig::default(),
    };

    let master_seed = match std::env::var("GOLDEN_THREAD_SEED") {
        Ok(seed) => match seed.parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(e) => {
                eprintln!("golden-thread: GOLDEN_THREAD_SEED={seed} is not a u64: {e}");
                return AppExit::error();
            }
        },
        Err(_) => None,
    };

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("--headless") {
        let steps = match args.next().map(|s| s.parse::<u32>()) {
            Some(Ok(steps)) => steps,
            Some(Err(e)) => {
                eprintln!("golden-thread: --headless expects a step count: {e}");
                return AppExit::error();
            }
            None => DEFAULT_HEADLESS_STEPS,
        };
        return headless::run_headless(master_seed, config, steps);
    }

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Golden Thread".to_string(),
            resolution: (1280.0, 720.0).into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }))
    .add_plugins((
        TerrainPlugin {
            master_seed,
            config,
        },
        rendering::RenderingPlugin,
    ));

    // Screenshot mode: renders a few seconds of the canyon, saves one frame and exits
    if let Ok(path) = std::env::var("GOLDEN_THREAD_SCREENSHOT") {
        app.insert_resource(ScreenshotRequest { frame: 0, path })
            .add_systems(Update, drive_screenshot);
    }

    app.run()
}

#[derive(Resource)]
struct ScreenshotRequest {
    frame: u32,
    path: String,
}

fn drive_screenshot(
    mut commands: Commands,
    mut request: ResMut<ScreenshotRequest>,
    mut exit: EventWriter<AppExit>,
) {
    request.frame += 1;
    if request.frame == SCREENSHOT_FRAME {
        info!("Saving screenshot to {}", request.path);
        commands
            .spawn(Screenshot::primary_window())
            .observe(save_to_disk(request.path.clone()));
    } else if request.frame > SCREENSHOT_FRAME + 20 {
        // a few frames for the save to land
        exit.send(AppExit::Success);
    }
}
