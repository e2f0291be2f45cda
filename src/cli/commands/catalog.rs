use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::{output, table, CommandOutput};
use crate::domain::models::{TaskCatalog, TaskCategory, TaskDefinition};

#[derive(Debug, Serialize)]
pub struct CatalogOutput {
    pub entries: Vec<TaskDefinition>,
}

impl CommandOutput for CatalogOutput {
    fn to_human(&self) -> String {
        let mut t = table(["Id", "Objective", "Category", "Role"]);
        for entry in &self.entries {
            let (category, role) = match entry.category {
                TaskCategory::Production => ("production", "-"),
                TaskCategory::UnitAssignable(role) => ("assignable", role.as_str()),
                TaskCategory::Unmanaged => ("unmanaged", "-"),
            };
            t.add_row(vec![
                entry.id.to_string(),
                entry.kind.to_string(),
                category.to_string(),
                role.to_string(),
            ]);
        }
        t.to_string()
    }
}

pub fn execute(json: bool) -> Result<()> {
    let catalog = TaskCatalog::standard().context("Task catalog is invalid")?;
    output(
        &CatalogOutput {
            entries: catalog.entries().to_vec(),
        },
        json,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_every_objective() {
        let catalog = TaskCatalog::standard().unwrap();
        let out = CatalogOutput {
            entries: catalog.entries().to_vec(),
        };
        let human = out.to_human();
        assert!(human.contains("receiver_operation"));
        assert!(human.contains("unmanaged"));
        assert_eq!(out.to_json()["entries"].as_array().unwrap().len(), 24);
    }
}
