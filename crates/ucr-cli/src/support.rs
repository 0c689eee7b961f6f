use serde::Serialize;
use std::fs;
use std::path::Path;
use ucr_kernel::{ContextRecord, LineageId, ModuleRegistry};
use ucr_store::{JsonlSnapshotStore, Snapshot, SnapshotStore};

pub fn load_record_or_exit(path: &str) -> ContextRecord {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {path}: {e}");
        std::process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("error: failed to parse record {path}: {e}");
        std::process::exit(1);
    })
}

pub fn load_registry_or_exit(config: Option<&str>) -> ModuleRegistry {
    match config {
        None => ModuleRegistry::builtin(),
        Some(path) => ModuleRegistry::from_toml_path(path).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        }),
    }
}

pub fn open_store(path: &str) -> JsonlSnapshotStore {
    JsonlSnapshotStore::open(Path::new(path))
}

pub fn parse_lineage_or_exit(lineage: &str) -> LineageId {
    lineage.parse().unwrap_or_else(|e| {
        eprintln!("error: invalid lineage id `{lineage}`: {e}");
        std::process::exit(1);
    })
}

pub fn snapshot_or_exit(
    store: &JsonlSnapshotStore,
    lineage: &LineageId,
    version: u64,
) -> Snapshot {
    match store.get_snapshot(lineage, version) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            eprintln!("error: snapshot not found: {lineage} v{version}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

pub fn exit_on_error<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!("{}", exit_on_error(serde_json::to_string_pretty(value)));
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
