//! Text rendering of decorator layouts.

use std::fmt::Write;

use evmd_ante::chain::Step;
use evmd_ante::options::{Module, ModuleSet};
use evmd_ante::pipeline::{evm_steps, standard_steps, EVM_LAYOUT, STANDARD_LAYOUT};

fn module_tag(layout: &[(Step, Option<Module>)], step: Step) -> String {
    layout
        .iter()
        .find(|(s, _)| *s == step)
        .and_then(|(_, m)| *m)
        .map_or_else(|| "core".to_string(), |m| m.to_string())
}

fn join(steps: &[Step]) -> String {
    if steps.is_empty() {
        return "-".to_string();
    }
    steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_chain(out: &mut String, title: &str, layout: &[(Step, Option<Module>)], steps: &[Step]) {
    let _ = writeln!(out, "{title} ({} decorators)", steps.len());
    if steps.is_empty() {
        let _ = writeln!(out, "  (disabled)");
        return;
    }
    for (i, step) in steps.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<24} [{}]{}",
            i + 1,
            step.to_string(),
            module_tag(layout, *step),
            if step.mutates_state() { " writes" } else { "" }
        );
    }
}

/// Both pipeline variants for `modules`.
pub fn render_layout(modules: ModuleSet) -> String {
    let enabled: Vec<String> = modules.enabled().map(|m| m.to_string()).collect();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "modules: {}\n",
        if enabled.is_empty() {
            "none".to_string()
        } else {
            enabled.join(", ")
        }
    );
    render_chain(&mut out, "standard", STANDARD_LAYOUT, &standard_steps(modules));
    out.push('\n');
    render_chain(&mut out, "evm", EVM_LAYOUT, &evm_steps(modules));
    out
}

/// The ordering constraints every layout must satisfy.
pub fn render_dependencies() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<24} {:<6} {:<40} AFTER", "STEP", "FIRST", "REQUIRES");
    for step in Step::ALL {
        let _ = writeln!(
            out,
            "{:<24} {:<6} {:<40} {}",
            step.to_string(),
            if step.leads() { "yes" } else { "" },
            join(step.requires()),
            join(step.after())
        );
    }
    out
}
