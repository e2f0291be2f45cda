//! `inspect` and `reset` for stored zone state.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::cli::commands::open_store;
use crate::cli::output::{output, table, CommandOutput};
use crate::domain::models::{Config, TaskCatalog, TaskKind, ZoneId, ZoneState};
use crate::services::BlockageLedger;

#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub state: ZoneState,
}

impl CommandOutput for InspectOutput {
    fn to_human(&self) -> String {
        let state = &self.state;
        let mut out = format!(
            "Zone {} (schema v{}, updated {})\n",
            state.zone,
            state.version,
            state.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        out.push_str(&format!(
            "Last scout request: {}\n",
            state
                .last_scout_request
                .map_or_else(|| "never".to_string(), |c| c.to_string())
        ));
        out.push_str(&format!(
            "Pinned: transporter={} upgrader={} link_operator={}\n",
            state.pinned_roles.transporter_bound,
            state.pinned_roles.upgrader_bound,
            state.pinned_roles.link_operator_bound
        ));
        out.push_str(&format!("Banned anchors: {}\n", state.banned_anchors.len()));

        if state.priority_history.is_empty() {
            out.push_str("\nNo priority history recorded.\n");
        } else {
            let depth = state.priority_history.len();
            let mut header = vec!["Objective".to_string()];
            header.extend((0..depth).rev().map(|age| {
                if age == 0 {
                    "latest".to_string()
                } else {
                    format!("t-{age}")
                }
            }));
            let mut history = table(header);
            let tasks: BTreeSet<TaskKind> = state.priority_history.iter().flat_map(|set| set.tasks()).collect();
            for task in tasks {
                let mut row = vec![task.to_string()];
                row.extend(
                    state
                        .priority_history
                        .iter()
                        .map(|set| set.score(task).map_or_else(|| "-".to_string(), |s| format!("{s:.1}"))),
                );
                history.add_row(row);
            }
            out.push_str(&format!("\n{history}\n"));
        }

        if !state.blockage_ledger.is_empty() || !state.unsafe_reports.is_empty() {
            let mut blocks = table(["Objective", "Blocked at", "Permanent", "Unsafe reports"]);
            let tasks: BTreeSet<TaskKind> = state
                .blockage_ledger
                .keys()
                .chain(state.unsafe_reports.keys())
                .copied()
                .collect();
            for task in tasks {
                let entry = state.blockage_ledger.get(&task);
                blocks.add_row(vec![
                    task.to_string(),
                    entry.map_or_else(|| "-".to_string(), |e| e.cycle.to_string()),
                    entry.map_or("-", |e| if e.permanent { "yes" } else { "no" }).to_string(),
                    state.unsafe_reports.get(&task).copied().unwrap_or(0).to_string(),
                ]);
            }
            out.push_str(&format!("\n{blocks}\n"));
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub struct ResetOutput {
    pub zone: ZoneId,
    pub cleared: usize,
}

impl CommandOutput for ResetOutput {
    fn to_human(&self) -> String {
        format!("Cleared {} blockage(s) in zone {}", self.cleared, self.zone)
    }
}

pub async fn inspect(zone: &str, config: &Config, json: bool) -> Result<()> {
    let catalog = TaskCatalog::standard().context("Task catalog is invalid")?;
    let store = open_store(&config.store, catalog).await?;
    let zone = ZoneId::new(zone);
    let state = store
        .load(&zone)
        .await
        .with_context(|| format!("Failed to load state of zone {zone}"))?
        .ok_or_else(|| anyhow::anyhow!("No stored state for zone {zone}"))?;

    output(&InspectOutput { state }, json);
    Ok(())
}

pub async fn reset(zone: &str, config: &Config, json: bool) -> Result<()> {
    let catalog = TaskCatalog::standard().context("Task catalog is invalid")?;
    let store = open_store(&config.store, catalog).await?;
    let zone = ZoneId::new(zone);
    let mut state = store
        .load(&zone)
        .await
        .with_context(|| format!("Failed to load state of zone {zone}"))?
        .ok_or_else(|| anyhow::anyhow!("No stored state for zone {zone}"))?;

    let cleared = BlockageLedger::from_config(&config.engine).reset(&mut state);
    state.touch();
    store
        .save(&state)
        .await
        .with_context(|| format!("Failed to save state of zone {zone}"))?;

    output(&ResetOutput { zone, cleared }, json);
    Ok(())
}
