use crate::support::{exit_on_error, open_store, parse_lineage_or_exit, print_json};
use serde_json::json;
use ucr_store::SnapshotStore;

pub fn run(lineage: String, store_path: String, json_output: bool) {
    let lineage = parse_lineage_or_exit(&lineage);
    let store = open_store(&store_path);
    let versions = exit_on_error(store.versions(&lineage));

    if json_output {
        print_json(&json!({
            "lineage_id": lineage,
            "count": versions.len(),
            "versions": versions,
        }));
        return;
    }

    println!("ucr history {lineage}");
    println!("  Versions: {}", versions.len());
    for v in &versions {
        let restored = v
            .restored_from
            .map(|from| format!(" (restored from v{from})"))
            .unwrap_or_default();
        println!(
            "    v{} {} {} {}{restored}",
            v.version,
            v.hash.short(),
            v.status,
            v.created_at.to_rfc3339()
        );
    }
}
