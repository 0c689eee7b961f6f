use crate::support::{load_record_or_exit, print_json, yes_no};
use ucr_kernel::enforce_for_record;

pub fn run(record_path: String, text: String, json_output: bool) {
    let record = load_record_or_exit(&record_path);
    let decision = enforce_for_record(&text, &record);

    if json_output {
        print_json(&decision);
        return;
    }

    println!("ucr scan {record_path}");
    println!("  Blocked: {}", yes_no(decision.blocked));
    println!("  Violations: {}", decision.violations.len());
    for violation in &decision.violations {
        println!("    {} `{}`", violation.field, violation.matched_term);
    }
    if let Some(text) = &decision.text {
        println!("  Text: {text}");
    }
}
