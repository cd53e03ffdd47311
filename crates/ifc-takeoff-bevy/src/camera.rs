//! Camera system driving the session's orbit camera
//!
//! Mouse input is forwarded to the [`Session`]; the Bevy camera only mirrors
//! the session camera each frame.

use crate::{to_bevy, Session};
use bevy::ecs::message::MessageReader;
use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorMoved, PrimaryWindow};
use ifc_takeoff_viewer::{PickOutcome, PointerButton};

/// Wheel pixels that count as one line step
const PIXELS_PER_LINE: f32 = 40.0;

/// System set for camera input (for ordering)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CameraInputSet;

/// Camera controller plugin
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera).add_systems(
            Update,
            (viewport_system, camera_input_system, camera_update_system)
                .chain()
                .in_set(CameraInputSet),
        );
    }
}

/// Marker for the viewer camera
#[derive(Component)]
pub struct ViewerCamera;

fn setup_camera(mut commands: Commands, session: Res<Session>) {
    use bevy::render::view::Msaa;

    let config = session.config();
    let eye = to_bevy(session.camera().position());
    let target = to_bevy(session.camera().target);

    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(eye).looking_at(target, Vec3::Y),
        Projection::Perspective(PerspectiveProjection {
            fov: config.fov_radians() as f32,
            near: config.near as f32,
            far: config.far as f32,
            ..default()
        }),
        ViewerCamera,
        Msaa::Sample4,
    ));

    commands.spawn(AmbientLight {
        color: Color::WHITE,
        brightness: 80.0,
        affects_lightmapped_meshes: true,
    });

    // Key light from top-right-front
    commands.spawn((
        DirectionalLight {
            color: Color::srgb(1.0, 0.99, 0.97),
            illuminance: 25000.0,
            shadows_enabled: false,
            affects_lightmapped_mesh_diffuse: true,
            ..default()
        },
        Transform::from_xyz(0.5, 1.0, 0.3).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Fill from the opposite side
    commands.spawn((
        DirectionalLight {
            color: Color::srgb(0.85, 0.9, 1.0),
            illuminance: 8000.0,
            shadows_enabled: false,
            affects_lightmapped_mesh_diffuse: true,
            ..default()
        },
        Transform::from_xyz(-0.5, 0.3, -0.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Keep the session's viewport in logical window pixels
fn viewport_system(windows: Query<&Window, With<PrimaryWindow>>, mut session: ResMut<Session>) {
    let Ok(window) = windows.single() else { return };
    let (width, height) = (window.width() as f64, window.height() as f64);
    session.set_viewport(width, height);
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn camera_input_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut cursor_moved: MessageReader<CursorMoved>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut session: ResMut<Session>,
) {
    let Ok(window) = windows.single() else { return };
    let cursor = window.cursor_position().map(|p| [p.x as f64, p.y as f64]);

    for pressed in mouse_button.get_just_pressed() {
        if let (Some(button), Some(position)) = (pointer_button(*pressed), cursor) {
            session.pointer_down(button, position);
        }
    }

    for moved in cursor_moved.read() {
        session.pointer_move([moved.position.x as f64, moved.position.y as f64]);
    }

    for released in mouse_button.get_just_released() {
        let (Some(button), Some(position)) = (pointer_button(*released), cursor) else {
            continue;
        };
        if let Some(PickOutcome::Completed(annotation)) = session.pointer_up(button, position) {
            info!("[Measure] {}", annotation.label);
        }
    }

    for wheel in mouse_wheel.read() {
        let steps = match wheel.unit {
            MouseScrollUnit::Line => wheel.y,
            MouseScrollUnit::Pixel => wheel.y / PIXELS_PER_LINE,
        };
        session.wheel(steps as f64);
    }
}

/// Mirror the session camera onto the Bevy camera
fn camera_update_system(
    session: Res<Session>,
    mut cameras: Query<&mut Transform, With<ViewerCamera>>,
) {
    let eye = to_bevy(session.camera().position());
    let target = to_bevy(session.camera().target);
    for mut transform in &mut cameras {
        *transform = Transform::from_translation(eye).looking_at(target, Vec3::Y);
    }
}
