//! Aim-assist profile hot reload.
//!
//! Watches the profile file with `notify`:
//! - Loads the profile into [`ActiveProfile`] at startup
//! - Reloads and validates on modification
//! - Swaps the shared profile on every [`AimAssist`] component
//! - Keeps the previous profile when the new file is invalid

use bevy::prelude::*;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};

use crate::aim_assist::{ActiveProfile, AimAssist, AimAssistProfile};

pub struct ProfileHotReloadPlugin {
    pub path: PathBuf,
}

impl Plugin for ProfileHotReloadPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ProfileHotReloadState {
            watched_file: Some(self.path.clone()),
            ..default()
        })
        .init_resource::<ActiveProfile>()
        .add_event::<ProfileReloadEvent>()
        .add_systems(Startup, (load_initial_profile, setup_profile_watcher).chain())
        .add_systems(Update, process_profile_changes);
    }
}

/// Hot-reload state tracking
#[derive(Resource, Debug, Default)]
pub struct ProfileHotReloadState {
    pub enabled: bool,
    pub watched_file: Option<PathBuf>,
    pub reload_count: u32,
    pub last_reload_success: bool,
    pub last_reload_time: f64,
    pub last_error: Option<String>,
}

/// Profile reload outcome
#[derive(Event, Debug, Clone)]
pub struct ProfileReloadEvent {
    pub path: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Resource)]
struct WatcherResource {
    _watcher: RecommendedWatcher,
    receiver: Mutex<Receiver<notify::Result<Event>>>,
}

fn load_initial_profile(
    state: Res<ProfileHotReloadState>,
    mut active: ResMut<ActiveProfile>,
) {
    let Some(path) = state.watched_file.as_deref() else {
        return;
    };
    match AimAssistProfile::load(path) {
        Ok(profile) => {
            info!("Loaded aim-assist profile {:?}", path);
            active.0 = Arc::new(profile);
        }
        Err(e) => warn!("Using default aim-assist profile, {:?} failed: {}", path, e),
    }
}

/// Watch the profile's directory; editors often replace files rather than write them.
fn setup_profile_watcher(mut commands: Commands, mut state: ResMut<ProfileHotReloadState>) {
    let Some(path) = state.watched_file.clone() else {
        return;
    };
    let Some(dir) = path.parent().filter(|dir| dir.exists()) else {
        warn!("Profile directory not found for {:?}", path);
        state.enabled = false;
        return;
    };

    let (tx, rx) = channel();
    let mut watcher = match notify::recommended_watcher(tx) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create file watcher: {}", e);
            state.enabled = false;
            return;
        }
    };

    if let Err(e) = watcher.watch(dir, RecursiveMode::NonRecursive) {
        error!("Failed to watch profile directory: {}", e);
        state.enabled = false;
        return;
    }

    state.enabled = true;
    commands.insert_resource(WatcherResource {
        _watcher: watcher,
        receiver: Mutex::new(rx),
    });

    info!("Hot-reload enabled for {:?}", path);
}

fn process_profile_changes(
    watcher: Option<Res<WatcherResource>>,
    mut state: ResMut<ProfileHotReloadState>,
    mut active: ResMut<ActiveProfile>,
    mut agents: Query<&mut AimAssist>,
    mut events: EventWriter<ProfileReloadEvent>,
    time: Res<Time>,
) {
    let Some(watcher) = watcher else {
        return;
    };
    let Some(path) = state.watched_file.clone() else {
        return;
    };

    let mut modified = false;
    if let Ok(receiver) = watcher.receiver.lock() {
        while let Ok(result) = receiver.try_recv() {
            match result {
                Ok(event) => modified |= is_profile_modify_event(&event, &path),
                Err(e) => warn!("File watcher error: {}", e),
            }
        }
    }
    if !modified {
        return;
    }

    info!("Profile modified, reloading...");
    let previous = Arc::clone(&active.0);
    let event = reload_profile(&path, &mut state, &mut active, time.elapsed_secs_f64());
    if event.success {
        for mut assist in &mut agents {
            if follows_shared_profile(&assist, &previous) {
                assist.set_profile(Arc::clone(&active.0));
            }
        }
    }
    events.send(event);
}

/// Whether `assist` runs on the shared profile rather than one of its own.
fn follows_shared_profile(assist: &AimAssist, shared: &Arc<AimAssistProfile>) -> bool {
    assist
        .profile()
        .is_some_and(|profile| Arc::ptr_eq(profile, shared))
}

/// Check if event is a write or create of the watched file
fn is_profile_modify_event(event: &Event, watched: &Path) -> bool {
    let Some(name) = watched.file_name() else {
        return false;
    };
    (event.kind.is_modify() || event.kind.is_create())
        && event.paths.iter().any(|p| p.file_name() == Some(name))
}

/// Load `path` into `active`. On failure `active` is left untouched.
fn reload_profile(
    path: &Path,
    state: &mut ProfileHotReloadState,
    active: &mut ActiveProfile,
    now: f64,
) -> ProfileReloadEvent {
    match AimAssistProfile::load(path) {
        Ok(profile) => {
            active.0 = Arc::new(profile);
            state.reload_count += 1;
            state.last_reload_success = true;
            state.last_reload_time = now;
            state.last_error = None;
            info!("Profile reloaded successfully (count: {})", state.reload_count);
            ProfileReloadEvent {
                path: path.to_path_buf(),
                success: true,
                error: None,
            }
        }
        Err(e) => {
            let message = e.to_string();
            state.last_reload_success = false;
            state.last_error = Some(message.clone());
            error!("Profile reload failed: {}", message);
            ProfileReloadEvent {
                path: path.to_path_buf(),
                success: false,
                error: Some(message),
            }
        }
    }
}
