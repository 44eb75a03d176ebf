//! `deskflow check-config`: load, validate and summarize a config file.

use std::path::Path;

use anyhow::{bail, Result};

use deskflow_config::{load_config, prepare, redact, validate, DeskflowConfig};

use crate::terminal_output::{note_error, note_info, note_success, note_warn, render_table, Column};

pub async fn run(path: &Path, show: bool) -> Result<()> {
    note_info(&format!("Checking {}", path.display()));

    let config = prepare(load_config(path).await?)?;
    let report = validate(&config);

    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }

    println!("\nFlow order: {}\n", config.flow_order().join(" → "));
    print!("{}", plan_table(&config));

    if show {
        let redacted = redact(&serde_json::to_value(&config)?);
        println!("\n{}", serde_yaml::to_string(&redacted)?);
    }

    if !report.is_valid() {
        bail!("{} configuration error(s)", report.errors.len());
    }
    note_success("Configuration is valid");
    Ok(())
}

fn plan_table(config: &DeskflowConfig) -> String {
    let default = config.default_plan().map(|p| p.name.as_str());
    let rows: Vec<Vec<String>> = config
        .plans()
        .iter()
        .map(|plan| {
            vec![
                plan.name.clone(),
                plan.price.to_string(),
                if Some(plan.name.as_str()) == default { "*".into() } else { String::new() },
            ]
        })
        .collect();
    render_table(
        &[Column::left("Plan"), Column::right("Price"), Column::left("Default")],
        &rows,
    )
}
