//! `depo fields` – show the effective field catalog and header mapping.

use depo_core::config::DepoConfig;

pub fn run_fields(cfg: &DepoConfig) {
    println!(
        "{:<16} {:<8} {:<10} {:<6} {}",
        "FIELD", "TYPE", "MANDATORY", "LIST", "OPTIONS"
    );
    for f in &cfg.fields {
        let options = match &f.options {
            Some(o) if !o.is_empty() => o.join(", "),
            _ => "-".to_string(),
        };
        println!(
            "{:<16} {:<8} {:<10} {:<6} {}",
            f.name,
            format!("{:?}", f.field_type).to_lowercase(),
            if f.is_mandatory { "yes" } else { "no" },
            if f.is_list() { "yes" } else { "no" },
            options
        );
    }

    if !cfg.headers.is_empty() {
        println!();
        println!("{:<24} FIELD", "HEADER");
        for (header, field) in &cfg.headers {
            println!("{:<24} {}", header, field);
        }
    }
}
