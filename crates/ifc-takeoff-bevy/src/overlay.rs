//! Measurement and dimension overlays
//!
//! Lines and markers are immediate-mode gizmos redrawn every frame. Labels
//! are UI text nodes placed at the screen projection of their anchor.

use crate::camera::ViewerCamera;
use crate::loader::LoadState;
use crate::{to_bevy, Session};
use bevy::prelude::*;
use ifc_takeoff_viewer::FrameSnapshot;
use nalgebra::Point3;

const MEASURE_COLOR: Color = Color::srgb(1.0, 0.85, 0.1);
const PENDING_COLOR: Color = Color::srgb(1.0, 0.4, 0.1);
const DIMENSION_COLOR: Color = Color::srgb(0.3, 0.8, 1.0);
const WIREFRAME_COLOR: Color = Color::srgba(0.3, 0.8, 1.0, 0.35);
const LABEL_BACKGROUND: Color = Color::srgba(0.0, 0.0, 0.0, 0.6);

/// Marker half-size as a fraction of the camera distance
const MARKER_SCALE: f32 = 0.01;

/// Overlay plugin
pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_status_text).add_systems(
            PostUpdate,
            (
                draw_overlay_system,
                update_labels_system.after(TransformSystems::Propagate),
                update_status_system,
            ),
        );
    }
}

/// Screen label with its slot in the label pool
#[derive(Component)]
pub struct OverlayLabel(pub usize);

/// Status line in the top-left corner
#[derive(Component)]
pub struct StatusText;

fn setup_status_text(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgb(0.9, 0.9, 0.9)),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            top: Val::Px(10.0),
            ..default()
        },
        StatusText,
    ));
}

/// Three short axis lines through a point
fn draw_marker(gizmos: &mut Gizmos, at: Vec3, size: f32, color: Color) {
    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
        gizmos.line(at - axis * size, at + axis * size, color);
    }
}

fn draw_overlay_system(session: Res<Session>, mut gizmos: Gizmos) {
    let frame = session.frame();
    let marker = session.camera().distance as f32 * MARKER_SCALE;

    for annotation in frame.annotations {
        let (a, b) = (to_bevy(annotation.point_a), to_bevy(annotation.point_b));
        gizmos.line(a, b, MEASURE_COLOR);
        draw_marker(&mut gizmos, a, marker, MEASURE_COLOR);
        draw_marker(&mut gizmos, b, marker, MEASURE_COLOR);
    }
    if let Some(pending) = frame.pending {
        draw_marker(&mut gizmos, to_bevy(pending), marker * 1.5, PENDING_COLOR);
    }

    if let Some(overlay) = frame.dimensions {
        for [start, end] in &overlay.wireframe {
            gizmos.line(to_bevy(*start), to_bevy(*end), WIREFRAME_COLOR);
        }
        for line in &overlay.lines {
            let (start, end) = (to_bevy(line.start), to_bevy(line.end));
            gizmos.line(start, end, DIMENSION_COLOR);
            draw_marker(&mut gizmos, start, marker * 0.5, DIMENSION_COLOR);
            draw_marker(&mut gizmos, end, marker * 0.5, DIMENSION_COLOR);
        }
    }
}

/// World anchors and texts of every label in a frame
fn frame_labels(frame: &FrameSnapshot<'_>) -> Vec<(Point3<f64>, String)> {
    let mut labels: Vec<_> = frame
        .annotations
        .iter()
        .map(|a| (a.midpoint(), a.label.clone()))
        .collect();
    if let Some(overlay) = frame.dimensions {
        labels.extend(
            overlay
                .lines
                .iter()
                .map(|line| (line.label_anchor(), line.label.clone())),
        );
    }
    labels
}

fn update_labels_system(
    mut commands: Commands,
    session: Res<Session>,
    cameras: Query<(&Camera, &GlobalTransform), With<ViewerCamera>>,
    mut existing: Query<(Entity, &OverlayLabel, &mut Text, &mut Node, &mut Visibility)>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let labels = frame_labels(&session.frame());
    let project = |anchor: Point3<f64>| {
        camera
            .world_to_viewport(camera_transform, to_bevy(anchor))
            .ok()
    };

    let mut used = vec![false; labels.len()];
    for (entity, slot, mut text, mut node, mut visibility) in &mut existing {
        let Some((anchor, label)) = labels.get(slot.0) else {
            commands.entity(entity).despawn();
            continue;
        };
        used[slot.0] = true;
        if text.0 != *label {
            text.0 = label.clone();
        }
        match project(*anchor) {
            Some(screen) => {
                node.left = Val::Px(screen.x);
                node.top = Val::Px(screen.y);
                *visibility = Visibility::Inherited;
            }
            // Behind the camera
            None => *visibility = Visibility::Hidden,
        }
    }

    for (slot, (anchor, label)) in labels.iter().enumerate() {
        if used[slot] {
            continue;
        }
        let screen = project(*anchor).unwrap_or(Vec2::NEG_ONE * 1000.0);
        commands.spawn((
            Text::new(label.clone()),
            TextFont {
                font_size: 13.0,
                ..default()
            },
            TextColor(Color::WHITE),
            BackgroundColor(LABEL_BACKGROUND),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(screen.x),
                top: Val::Px(screen.y),
                padding: UiRect::axes(Val::Px(4.0), Val::Px(2.0)),
                ..default()
            },
            OverlayLabel(slot),
        ));
    }
}

fn status_line(frame: &FrameSnapshot<'_>, project: Option<&str>, loading: bool) -> String {
    let model = match project {
        Some(name) => format!("{} | {}", name, frame.storey_label),
        None => "No model (O to open or drop a file)".to_string(),
    };
    let measure = if frame.measuring {
        if frame.pending.is_some() {
            "Measure: pick second point"
        } else {
            "Measure: on"
        }
    } else {
        "Measure: off"
    };
    let loading = if loading { " | Loading..." } else { "" };
    format!(
        "{}{}\n{} | M measure  D dimensions  C clear  H home  [ ] storeys  Esc all",
        model, loading, measure
    )
}

fn update_status_system(
    session: Res<Session>,
    load_state: Res<LoadState>,
    mut status: Query<&mut Text, With<StatusText>>,
) {
    let project = session
        .takeoff()
        .map(|takeoff| takeoff.model.project_name.as_str());
    let line = status_line(&session.frame(), project, load_state.is_loading());
    for mut text in &mut status {
        if text.0 != line {
            text.0 = line.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_takeoff_viewer::{MeasurementAnnotation, ViewerConfig};

    fn snapshot<'a>(
        annotations: &'a [MeasurementAnnotation],
        pending: Option<Point3<f64>>,
    ) -> FrameSnapshot<'a> {
        FrameSnapshot {
            eye: Point3::new(10.0, 10.0, 10.0),
            target: Point3::origin(),
            meshes: Vec::new(),
            annotations,
            pending,
            dimensions: None,
            measuring: true,
            storey_label: "All storeys".to_string(),
        }
    }

    #[test]
    fn test_frame_labels_at_midpoints() {
        let config = ViewerConfig::default();
        let annotations = [MeasurementAnnotation::new(
            Point3::origin(),
            Point3::new(2.0, 0.0, 0.0),
            &config,
        )];
        let labels = frame_labels(&snapshot(&annotations, None));
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].0, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(labels[0].1, "2.00 m");
    }

    #[test]
    fn test_status_line() {
        let frame = snapshot(&[], Some(Point3::origin()));
        let line = status_line(&frame, Some("House"), true);
        assert!(line.starts_with("House | All storeys | Loading..."));
        assert!(line.contains("pick second point"));

        let line = status_line(&snapshot(&[], None), None, false);
        assert!(line.starts_with("No model"));
    }
}
