use crate::support::{exit_on_error, load_record_or_exit, open_store, print_json, yes_no};
use serde_json::json;
use ucr_store::save_record;

pub fn run(record_path: String, store_path: String, json_output: bool) {
    let record = load_record_or_exit(&record_path);
    let store = open_store(&store_path);
    let outcome = exit_on_error(save_record(&store, &record));
    let snapshot = outcome.snapshot();

    if json_output {
        print_json(&json!({
            "created": outcome.created(),
            "store_path": store_path,
            "snapshot": snapshot.summary(),
            "lineage_id": snapshot.lineage_id,
        }));
        return;
    }

    println!("ucr save {record_path}");
    println!("  Store: {store_path}");
    println!("  Lineage: {}", snapshot.lineage_id);
    println!("  Version: {}", snapshot.version);
    println!("  Hash: {}", snapshot.hash.short());
    println!("  Created: {}", yes_no(outcome.created()));
}
