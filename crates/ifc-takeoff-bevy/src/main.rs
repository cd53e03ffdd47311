//! Desktop viewer binary
//!
//! Usage: `ifc-takeoff-viewer [file.ifc]`

fn main() {
    let initial = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    ifc_takeoff_bevy::run_native(initial);
}
