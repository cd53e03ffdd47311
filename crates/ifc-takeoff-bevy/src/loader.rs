//! IFC file loading - handles file dialog and drag-and-drop
//!
//! Both the dialog and the takeoff run on the `IoTaskPool`; systems poll
//! the tasks each frame and hand finished models to the [`Session`].

use crate::Session;
use anyhow::Context;
use bevy::prelude::*;
use bevy::tasks::{IoTaskPool, Task};
use ifc_takeoff_core::{ModelStore, Takeoff};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Plugin for file loading functionality
pub struct LoaderPlugin;

impl Plugin for LoaderPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<LoadIfcFileEvent>()
            .add_message::<ModelLoadedEvent>()
            .add_message::<OpenFileDialogRequest>()
            .init_resource::<FileDialogState>()
            .init_resource::<LoadState>()
            .init_resource::<Models>()
            .add_systems(
                Update,
                (
                    open_shortcut_system,
                    handle_open_dialog_request,
                    poll_file_dialog,
                    handle_file_drop,
                    handle_load_file_event,
                    poll_load_task,
                )
                    .chain(),
            );
    }
}

/// Message to request opening a file dialog
#[derive(Message)]
pub struct OpenFileDialogRequest;

/// Message to trigger file loading (from the dialog, a drop or the command line)
#[derive(Message)]
pub struct LoadIfcFileEvent {
    pub path: PathBuf,
}

/// Message emitted when a model replaced the current one
#[derive(Message)]
pub struct ModelLoadedEvent {
    pub path: PathBuf,
    pub takeoff: Arc<Takeoff>,
}

/// Last successfully loaded model, shared with loading tasks
#[derive(Resource, Default, Deref)]
pub struct Models(Arc<ModelStore>);

/// State for tracking async file dialog
#[derive(Resource, Default)]
pub struct FileDialogState {
    task: Option<Task<Option<PathBuf>>>,
}

type LoadResult = (PathBuf, anyhow::Result<Arc<Takeoff>>);

/// State for tracking the running takeoff
///
/// At most one load runs. A request arriving meanwhile waits in `pending`,
/// and a newer request replaces it.
#[derive(Resource, Default)]
pub struct LoadState {
    task: Option<Task<LoadResult>>,
    pending: Option<PathBuf>,
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        self.task.is_some()
    }

    /// Path to start now, or `None` if it was queued behind the running load
    fn request(&mut self, path: PathBuf) -> Option<PathBuf> {
        if self.is_loading() {
            if let Some(superseded) = self.pending.replace(path) {
                debug!("[Loader] Superseded queued request {:?}", superseded);
            }
            None
        } else {
            Some(path)
        }
    }

    /// Queued path to start once the running load finished
    fn take_pending(&mut self) -> Option<PathBuf> {
        if self.is_loading() {
            None
        } else {
            self.pending.take()
        }
    }

    fn start(&mut self, store: &Arc<ModelStore>, path: PathBuf) {
        info!("[Loader] Loading file: {:?}", path);
        let store = Arc::clone(store);
        let task = IoTaskPool::get().spawn(async move {
            let result = load_takeoff(&store, &path);
            (path, result)
        });
        self.task = Some(task);
    }
}

fn open_shortcut_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut requests: MessageWriter<OpenFileDialogRequest>,
) {
    if keyboard.just_pressed(KeyCode::KeyO) {
        requests.write(OpenFileDialogRequest);
    }
}

/// Spawn the native dialog unless one is already open
fn handle_open_dialog_request(
    mut requests: MessageReader<OpenFileDialogRequest>,
    mut state: ResMut<FileDialogState>,
) {
    for _ in requests.read() {
        if state.task.is_some() {
            debug!("[Loader] File dialog already open");
            continue;
        }

        info!("[Loader] Opening file dialog...");
        let task = IoTaskPool::get().spawn(async {
            use rfd::AsyncFileDialog;

            let file = AsyncFileDialog::new()
                .add_filter("IFC Files", &["ifc", "IFC"])
                .set_title("Open IFC File")
                .pick_file()
                .await;

            file.map(|f| f.path().to_path_buf())
        });
        state.task = Some(task);
    }
}

fn poll_file_dialog(
    mut state: ResMut<FileDialogState>,
    mut load_events: MessageWriter<LoadIfcFileEvent>,
) {
    let Some(task) = state.task.as_mut() else {
        return;
    };
    let Some(result) = bevy::tasks::block_on(bevy::tasks::poll_once(task)) else {
        return;
    };
    state.task = None;
    match result {
        Some(path) => {
            info!("[Loader] File selected: {:?}", path);
            load_events.write(LoadIfcFileEvent { path });
        }
        None => debug!("[Loader] File dialog cancelled"),
    }
}

fn is_ifc(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ifc"))
}

fn handle_file_drop(
    mut file_drag_drop_events: MessageReader<bevy::window::FileDragAndDrop>,
    mut load_events: MessageWriter<LoadIfcFileEvent>,
) {
    for event in file_drag_drop_events.read() {
        if let bevy::window::FileDragAndDrop::DroppedFile { path_buf, .. } = event {
            if is_ifc(path_buf) {
                info!("[Loader] File dropped: {:?}", path_buf);
                load_events.write(LoadIfcFileEvent {
                    path: path_buf.clone(),
                });
            } else {
                warn!("[Loader] Ignoring non-IFC file {:?}", path_buf);
            }
        }
    }
}

/// Read and process a file off the main thread
///
/// Only the last request of a frame counts. While a load is running it is
/// queued and started as soon as that load finishes.
fn handle_load_file_event(
    mut events: MessageReader<LoadIfcFileEvent>,
    mut state: ResMut<LoadState>,
    models: Res<Models>,
) {
    let Some(event) = events.read().last() else {
        return;
    };
    match state.request(event.path.clone()) {
        Some(path) => state.start(&models.0, path),
        None => info!("[Loader] Queued {:?} until the current load finishes", event.path),
    }
}

fn load_takeoff(store: &ModelStore, path: &Path) -> anyhow::Result<Arc<Takeoff>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let takeoff = store
        .load(&bytes)
        .with_context(|| format!("processing {}", path.display()))?;
    Ok(takeoff)
}

fn poll_load_task(
    mut state: ResMut<LoadState>,
    mut session: ResMut<Session>,
    models: Res<Models>,
    mut loaded: MessageWriter<ModelLoadedEvent>,
) {
    let Some(task) = state.task.as_mut() else {
        return;
    };
    let Some((path, result)) = bevy::tasks::block_on(bevy::tasks::poll_once(task)) else {
        return;
    };
    state.task = None;

    match result {
        Ok(takeoff) => {
            info!(
                "[Loader] Loaded {:?}: {} elements, {} meshes",
                path,
                takeoff.model.elements.len(),
                takeoff.meshes.len()
            );
            session.load(Arc::clone(&takeoff));
            loaded.write(ModelLoadedEvent { path, takeoff });
        }
        // The previous model stays on screen
        Err(err) => error!("[Loader] Error loading file: {:#}", err),
    }

    if let Some(next) = state.take_pending() {
        state.start(&models.0, next);
    }
}
