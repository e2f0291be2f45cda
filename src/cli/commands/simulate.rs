use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::adapters::scenario::ScenarioWorld;
use crate::cli::commands::open_store;
use crate::cli::output::{output, table, CommandOutput};
use crate::cli::types::StoreArg;
use crate::domain::models::{Config, StoreBackend, TaskCatalog};
use crate::domain::ports::World;
use crate::services::{
    CycleReport, CycleRunner, CycleScheduler, DecisionReport, OutcomeKind, ProductionOutcome,
};

#[derive(Debug, Serialize)]
pub struct SimulationOutput {
    pub scenario: String,
    pub store: StoreBackend,
    pub start_cycle: u64,
    pub end_cycle: u64,
    pub reports: Vec<CycleReport>,
}

fn top_objective(decision: &DecisionReport) -> String {
    decision
        .priorities
        .iter()
        .fold(None, |best: Option<(f64, String)>, record| match best {
            Some((score, _)) if score >= record.score => best,
            _ => Some((record.score, record.task.to_string())),
        })
        .map_or_else(|| "-".to_string(), |(score, task)| format!("{task} ({score:.0})"))
}

fn bindings(decision: &DecisionReport) -> String {
    let mut parts = Vec::new();
    for outcome in &decision.assignment.outcomes {
        let Some(task) = outcome.task else { continue };
        let label = match outcome.kind {
            OutcomeKind::Transporter => "transporter",
            OutcomeKind::Upgrader => "upgrader",
            OutcomeKind::LinkOperator => "link",
            OutcomeKind::Rebound => "rebound",
            OutcomeKind::Kept | OutcomeKind::Unassigned => continue,
        };
        parts.push(format!("{} -> {task} [{label}]", outcome.unit));
    }
    let kept = decision
        .assignment
        .outcomes
        .iter()
        .filter(|o| o.kind == OutcomeKind::Kept)
        .count();
    if kept > 0 {
        parts.push(format!("{kept} kept"));
    }
    if decision.assignment.truncated {
        parts.push("budget exhausted".to_string());
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join("\n")
    }
}

fn production(outcome: &ProductionOutcome) -> String {
    match outcome {
        ProductionOutcome::Skipped { reason } => format!("skipped: {reason:?}"),
        ProductionOutcome::Manufactured {
            unit_id, parts, ..
        } => format!("{unit_id} ({parts} parts)"),
        ProductionOutcome::Failed { task, error } => format!("{task} failed: {error}"),
    }
}

impl CommandOutput for SimulationOutput {
    fn to_human(&self) -> String {
        let mut decisions = table(["Cycle", "Zone", "Mode", "Top objective", "Bindings", "Production"]);
        let mut events = table(["Cycle", "Event"]);
        let mut decision_count = 0;

        for report in &self.reports {
            for decision in &report.decisions {
                decision_count += 1;
                decisions.add_row(vec![
                    report.cycle.to_string(),
                    decision.zone.to_string(),
                    if decision.siege { "siege" } else { "normal" }.to_string(),
                    top_objective(decision),
                    bindings(decision),
                    production(&decision.production),
                ]);
            }
            for record in &report.signals {
                events.add_row(vec![
                    report.cycle.to_string(),
                    format!("{}: {:?} -> {:?}", record.zone, record.signal, record.effect),
                ]);
            }
            for (unit, task) in &report.reassigned {
                events.add_row(vec![report.cycle.to_string(), format!("{unit} reassigned to {task}")]);
            }
            if report.defenders > 0 {
                events.add_row(vec![
                    report.cycle.to_string(),
                    format!("{} bruisers sent to defense", report.defenders),
                ]);
            }
            for event in &report.maintenance {
                events.add_row(vec![report.cycle.to_string(), format!("{event:?}")]);
            }
            if report.compute_transgression {
                events.add_row(vec![report.cycle.to_string(), "compute limit transgression".to_string()]);
            }
        }

        let mut out = format!(
            "Scenario {} (cycles {}..{}, {:?} store)\n",
            self.scenario, self.start_cycle, self.end_cycle, self.store
        );
        if decision_count == 0 {
            out.push_str("\nNo decision passes ran.\n");
        } else {
            out.push_str(&format!("\n{decisions}\n"));
        }
        if events.row_iter().next().is_some() {
            out.push_str(&format!("\n{events}\n"));
        }
        out
    }
}

pub async fn execute(
    scenario: &Path,
    cycles: u64,
    store: Option<StoreArg>,
    decisions_only: bool,
    config: &Config,
    json: bool,
) -> Result<()> {
    let mut world = ScenarioWorld::load(scenario)
        .with_context(|| format!("Failed to load scenario {}", scenario.display()))?;
    let catalog = TaskCatalog::standard().context("Task catalog is invalid")?;

    let mut store_config = config.store.clone();
    if let Some(backend) = store {
        store_config.backend = backend.into();
    }
    let zone_store = open_store(&store_config, catalog.clone()).await?;

    let scheduler = CycleScheduler::with_catalog(config, catalog);
    let mut runner = CycleRunner::new(scheduler, zone_store);
    let start_cycle = world.cycle();
    let mut reports = runner.run(&mut world, cycles).await;
    if decisions_only {
        reports.retain(|r| !r.decisions.is_empty());
    }

    let result = SimulationOutput {
        scenario: scenario.display().to_string(),
        store: store_config.backend,
        start_cycle,
        end_cycle: world.cycle(),
        reports,
    };
    output(&result, json);
    Ok(())
}
