use crate::support::{exit_on_error, open_store, parse_lineage_or_exit, print_json};
use ucr_store::restore_snapshot;

pub fn run(lineage: String, version: u64, store_path: String, json_output: bool) {
    let lineage = parse_lineage_or_exit(&lineage);
    let store = open_store(&store_path);
    let outcome = exit_on_error(restore_snapshot(&store, &lineage, version));

    if json_output {
        print_json(&outcome);
        return;
    }

    println!("ucr restore {lineage} v{version}");
    println!("  New version: {}", outcome.snapshot.version);
    println!("  Status: {}", outcome.snapshot.status);
    println!("  Hash: {}", outcome.snapshot.hash.short());
    println!("  Fields changed: {}", outcome.diff.changes.len());
    for field in outcome.diff.changed_fields() {
        println!("    {field}");
    }
}
