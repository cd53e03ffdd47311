// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command-line takeoff report
//!
//! Usage: `ifc-takeoff <file.ifc>`. Prints the building snapshot and a mesh
//! summary as JSON on stdout. Log output is controlled by `RUST_LOG`.

use ifc_takeoff_core::{Bounds, BuildingModel, Takeoff};
use serde::Serialize;
use std::process::ExitCode;

#[derive(Serialize)]
struct MeshSummary {
    meshes: usize,
    triangles: usize,
    vertices: usize,
    bounds: Option<Bounds>,
}

#[derive(Serialize)]
struct Report<'a> {
    file: &'a str,
    model: &'a BuildingModel,
    element_counts: Vec<(String, usize)>,
    geometry: MeshSummary,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: ifc-takeoff <file.ifc>");
        return ExitCode::from(2);
    };

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("{}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    let takeoff = match Takeoff::from_bytes(&bytes) {
        Ok(takeoff) => takeoff,
        Err(err) => {
            eprintln!("{}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    let report = Report {
        file: &path,
        model: &takeoff.model,
        element_counts: takeoff
            .model
            .count_by_kind()
            .into_iter()
            .map(|(kind, n)| (kind.label().to_string(), n))
            .collect(),
        geometry: MeshSummary {
            meshes: takeoff.meshes.len(),
            triangles: takeoff.triangle_count(),
            vertices: takeoff.meshes.iter().map(|m| m.vertex_count()).sum(),
            bounds: takeoff.bounds,
        },
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {}", path, err);
            ExitCode::FAILURE
        }
    }
}
