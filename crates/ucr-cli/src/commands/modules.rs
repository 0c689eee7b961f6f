use crate::support::{load_registry_or_exit, print_json};

pub fn run(config: Option<String>, json_output: bool) {
    let registry = load_registry_or_exit(config.as_deref());
    let modules: Vec<_> = registry.modules().collect();

    if json_output {
        print_json(&modules);
        return;
    }

    println!("ucr modules ({})", modules.len());
    for module in modules {
        let required: Vec<String> = module
            .required_sections
            .iter()
            .map(|s| s.to_string())
            .collect();
        let optional: Vec<String> = module
            .optional_sections
            .iter()
            .map(|s| s.to_string())
            .collect();
        println!("  {} ({})", module.id, module.name);
        println!("    Required sections: {}", required.join(", "));
        if !optional.is_empty() {
            println!("    Optional sections: {}", optional.join(", "));
        }
        for check in &module.entity_checks {
            println!("    Check {}: {} >= {}", check.id, check.metric.as_str(), check.min);
        }
    }
}
