use crate::support::{load_record_or_exit, print_json};
use ucr_kernel::compute_quality_score;

pub fn run(record_path: String, json_output: bool) {
    let record = load_record_or_exit(&record_path);
    let score = compute_quality_score(&record);

    if json_output {
        print_json(&score);
        return;
    }

    println!("ucr score {record_path}");
    println!("  Overall: {} ({})", score.overall, score.grade.as_str());
    println!("  Completeness: {}", score.completeness);
    println!("  Competitor confidence: {}", score.competitor_confidence);
    println!("  Negative scope strength: {}", score.negative_strength);
    println!("  Evidence coverage: {}", score.evidence_coverage);
}
