//! IFC Takeoff Bevy Viewer
//!
//! Desktop window around an [`ifc_takeoff_viewer::ViewerSession`]. Bevy
//! systems translate window input into session calls and draw the session's
//! frame snapshot with meshes, gizmos and UI text.
//!
//! Model space is Z-up; Bevy is Y-up. Points cross over through [`to_bevy`]
//! and nowhere else.

pub mod camera;
pub mod loader;
pub mod overlay;
pub mod scene;

use bevy::prelude::*;
use ifc_takeoff_viewer::{ViewerConfig, ViewerSession};
use nalgebra::Point3;

pub use camera::{CameraInputSet, CameraPlugin, ViewerCamera};
pub use loader::{LoadIfcFileEvent, LoaderPlugin, ModelLoadedEvent, OpenFileDialogRequest};
pub use overlay::OverlayPlugin;
pub use scene::{ScenePlugin, TakeoffMesh};

/// Main viewer plugin - combines all subsystems
pub struct TakeoffViewerPlugin {
    pub config: ViewerConfig,
}

impl Default for TakeoffViewerPlugin {
    fn default() -> Self {
        Self {
            config: ViewerConfig::from_env(),
        }
    }
}

impl Plugin for TakeoffViewerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Session(ViewerSession::new(self.config.clone())))
            .add_plugins((CameraPlugin, ScenePlugin, OverlayPlugin, LoaderPlugin))
            .add_systems(Update, keyboard_system.before(CameraInputSet))
            .add_systems(Last, release_session_on_exit);
    }
}

/// The interaction state shared by every system
#[derive(Resource, Deref, DerefMut)]
pub struct Session(pub ViewerSession);

/// Model point (Z-up) to Bevy world space (Y-up)
pub fn to_bevy(p: Point3<f64>) -> Vec3 {
    Vec3::new(p.x as f32, p.z as f32, -p.y as f32)
}

/// Viewer hotkeys other than file opening
///
/// M toggles measuring, D toggles dimensions, C clears measurements,
/// H returns home, `[`/`]` step through storeys and Escape shows all.
fn keyboard_system(keyboard: Res<ButtonInput<KeyCode>>, mut session: ResMut<Session>) {
    if keyboard.just_pressed(KeyCode::KeyM) {
        let on = session.toggle_measuring();
        info!("[Viewer] Measuring {}", if on { "on" } else { "off" });
    }
    if keyboard.just_pressed(KeyCode::KeyD) {
        let on = session.toggle_dimensions();
        info!("[Viewer] Dimensions {}", if on { "shown" } else { "hidden" });
    }
    if keyboard.just_pressed(KeyCode::KeyC) {
        session.clear_measurements();
    }
    if keyboard.just_pressed(KeyCode::KeyH) {
        session.home();
    }
    if keyboard.just_pressed(KeyCode::BracketRight) {
        session.next_storey();
    }
    if keyboard.just_pressed(KeyCode::BracketLeft) {
        session.previous_storey();
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        session.show_all_storeys();
    }
}

/// Drop the session, and with it the displayed model, once the app exits
fn release_session_on_exit(mut exit: MessageReader<AppExit>, mut commands: Commands) {
    if exit.read().next().is_some() {
        commands.remove_resource::<Session>();
    }
}

/// Run the desktop viewer, optionally opening a file at startup
pub fn run_native(initial: Option<std::path::PathBuf>) {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "IFC Takeoff Viewer".to_string(),
            resolution: (1280u32, 720u32).into(),
            ..default()
        }),
        ..default()
    }))
    .insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.15)))
    .add_plugins(TakeoffViewerPlugin::default());

    if let Some(path) = initial {
        app.world_mut().write_message(LoadIfcFileEvent { path });
    }
    app.run();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_bevy_swaps_up_axis() {
        let v = to_bevy(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(v, Vec3::new(1.0, 3.0, -2.0));
    }
}
