use crate::support::{
    exit_on_error, open_store, parse_lineage_or_exit, print_json, snapshot_or_exit,
};
use ucr_store::diff_snapshots;

pub fn run(lineage: String, from: u64, to: u64, store_path: String, json_output: bool) {
    let lineage = parse_lineage_or_exit(&lineage);
    let store = open_store(&store_path);
    let a = snapshot_or_exit(&store, &lineage, from);
    let b = snapshot_or_exit(&store, &lineage, to);
    let diff = exit_on_error(diff_snapshots(&a, &b));

    if json_output {
        print_json(&diff);
        return;
    }

    println!("ucr diff {lineage} v{from} -> v{to}");
    println!("  Changes: {}", diff.changes.len());
    for change in &diff.changes {
        println!("    {}: {} -> {}", change.field, change.old_value, change.new_value);
    }
}
