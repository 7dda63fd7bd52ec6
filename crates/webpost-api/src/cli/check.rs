//! `webpost check`: load a scenario file and list its steps.

use std::collections::HashSet;

use serde_json::json;
use webpost_types::scenario::Scenario;
use webpost_types::step::OnErrorAction;

use crate::state::AppState;

/// Structural problems a loaded scenario can still have: duplicate step
/// ids and `goto` rules that point nowhere.
pub fn scenario_problems(scenario: &Scenario) -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    for step in &scenario.steps {
        if !seen.insert(step.id.as_str()) {
            problems.push(format!("duplicate step id '{}'", step.id));
        }
    }
    for step in &scenario.steps {
        for rule in &step.on_error {
            if rule.action != OnErrorAction::Goto {
                continue;
            }
            match rule.goto_step_id.as_deref() {
                None => problems.push(format!("step '{}': goto without goto_step_id", step.id)),
                Some(target) if !seen.contains(target) => problems.push(format!(
                    "step '{}': goto target '{target}' does not exist",
                    step.id
                )),
                Some(_) => {}
            }
        }
    }
    problems
}

/// Print a scenario summary. Returns whether it has no problems.
pub async fn check_scenario(state: &AppState, scenario_id: &str, json: bool) -> anyhow::Result<bool> {
    let scenario = state.run_service.load_scenario(scenario_id).await?;
    let problems = scenario_problems(&scenario);

    if json {
        let steps: Vec<_> = scenario
            .steps
            .iter()
            .map(|step| {
                json!({
                    "id": step.id,
                    "name": step.name,
                    "type": step.type_name(),
                    "enabled": step.enabled,
                    "retry_max": step.retry.max,
                    "on_error": step.on_error.len(),
                })
            })
            .collect();
        let out = json!({
            "id": scenario_id,
            "name": scenario.meta.name,
            "version": scenario.meta.version,
            "enabled": scenario.meta.enabled,
            "inputs": scenario.inputs,
            "steps": steps,
            "problems": problems,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(problems.is_empty());
    }

    println!();
    println!(
        "  Scenario '{}' {}",
        console::style(scenario_id).cyan(),
        console::style(format!("v{}", scenario.meta.version)).dim()
    );
    if !scenario.meta.name.is_empty() {
        println!("  {}", scenario.meta.name);
    }
    if !scenario.inputs.required.is_empty() {
        println!("  Required inputs: {}", scenario.inputs.required.join(", "));
    }
    println!();
    for (index, step) in scenario.steps.iter().enumerate() {
        let marker = if step.enabled {
            console::style("●").green()
        } else {
            console::style("○").dim()
        };
        let mut extra = Vec::new();
        if step.retry.max > 0 {
            extra.push(format!("retry {}", step.retry.max));
        }
        for rule in &step.on_error {
            match (&rule.action, &rule.goto_step_id) {
                (OnErrorAction::Goto, Some(target)) => extra.push(format!("goto {target}")),
                (action, _) => extra.push(action.to_string()),
            }
        }
        println!(
            "  {marker} {:>2}. {:<20} {:<7} {}",
            index + 1,
            step.id,
            step.type_name(),
            console::style(extra.join(", ")).dim()
        );
    }
    println!();

    if problems.is_empty() {
        println!("  {} {} steps", console::style("✓").green(), scenario.steps.len());
    } else {
        for problem in &problems {
            println!("  {} {problem}", console::style("✗").red());
        }
    }
    println!();
    Ok(problems.is_empty())
}
