use crate::support::{exit_on_error, load_record_or_exit, load_registry_or_exit, print_json, yes_no};
use chrono::Utc;
use serde_json::json;
use ucr_kernel::{AuditRecord, admit};

pub fn run(record_path: String, module: String, config: Option<String>, json_output: bool) {
    let registry = load_registry_or_exit(config.as_deref());
    if registry.get(&module).is_none() {
        eprintln!("error: unknown module `{module}`");
        std::process::exit(1);
    }
    let record = load_record_or_exit(&record_path);
    let record_hash = exit_on_error(record.content_hash());

    let admission = admit(&registry, &module, &record, Utc::now());
    let audit = AuditRecord::new(&admission.report, record_hash, None);

    if json_output {
        print_json(&json!({
            "admitted": admission.admitted,
            "report": admission.report,
            "audit": audit,
        }));
        return;
    }

    let report = &admission.report;
    println!("ucr check {record_path} --module {module}");
    println!("  Admitted: {}", yes_no(admission.admitted));
    println!("  Status: {}", report.status.as_str());
    println!("  Lifecycle: {}", report.lifecycle.message);
    println!("  Summary: {}", report.summary);
    println!("  Record hash: {}", audit.record_hash.short());
    println!("  Trace:");
    for entry in &audit.entries {
        println!("    {}", entry.render());
    }
}
