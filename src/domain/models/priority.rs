//! Priority records produced by the scorers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::models::task::TaskKind;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Clamp a raw scorer output into `[0, 100]`. NaN maps to 0.
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return MIN_SCORE;
    }
    raw.clamp(MIN_SCORE, MAX_SCORE)
}

/// Kind of expansion the expansion objective is pursuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionKind {
    Settling,
    Harassment,
    Obliteration,
}

impl ExpansionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settling => "settling",
            Self::Harassment => "harassment",
            Self::Obliteration => "obliteration",
        }
    }

    /// Aggressive kinds require an assembled squad.
    pub fn is_aggressive(&self) -> bool {
        !matches!(self, Self::Settling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityRecord {
    pub task: TaskKind,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion_kind: Option<ExpansionKind>,
}

impl PriorityRecord {
    pub fn new(task: TaskKind, score: f64) -> Self {
        Self {
            task,
            score: clamp_score(score),
            expansion_kind: None,
        }
    }

    pub fn expansion(kind: ExpansionKind, score: f64) -> Self {
        Self {
            task: TaskKind::InfluenceExpansion,
            score: clamp_score(score),
            expansion_kind: Some(kind),
        }
    }
}

/// One cycle's unit-assignable scores, keyed and ordered by catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrioritySet {
    records: BTreeMap<TaskKind, PriorityRecord>,
}

impl PrioritySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: PriorityRecord) {
        self.records.insert(record.task, record);
    }

    pub fn get(&self, task: TaskKind) -> Option<&PriorityRecord> {
        self.records.get(&task)
    }

    pub fn score(&self, task: TaskKind) -> Option<f64> {
        self.records.get(&task).map(|r| r.score)
    }

    pub fn contains(&self, task: TaskKind) -> bool {
        self.records.contains_key(&task)
    }

    pub fn set_score(&mut self, task: TaskKind, score: f64) {
        if let Some(record) = self.records.get_mut(&task) {
            record.score = clamp_score(score);
        }
    }

    /// Reduce a score by `amount`, floored at 0.
    pub fn decrement(&mut self, task: TaskKind, amount: f64) {
        if let Some(record) = self.records.get_mut(&task) {
            record.score = (record.score - amount).max(MIN_SCORE);
        }
    }

    pub fn zero(&mut self, task: TaskKind) {
        self.set_score(task, MIN_SCORE);
    }

    pub fn expansion_kind(&self) -> Option<ExpansionKind> {
        self.records
            .get(&TaskKind::InfluenceExpansion)
            .and_then(|r| r.expansion_kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriorityRecord> {
        self.records.values()
    }

    pub fn tasks(&self) -> impl Iterator<Item = TaskKind> + '_ {
        self.records.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<PriorityRecord> for PrioritySet {
    fn from_iter<I: IntoIterator<Item = PriorityRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// Production objective scores, keyed and ordered by catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductionPriorities {
    scores: BTreeMap<TaskKind, f64>,
}

impl ProductionPriorities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, task: TaskKind, score: f64) {
        self.scores.insert(task, clamp_score(score));
    }

    /// Keep the larger of the existing and the offered score.
    pub fn raise(&mut self, task: TaskKind, score: f64) {
        let score = clamp_score(score);
        let entry = self.scores.entry(task).or_insert(score);
        if *entry < score {
            *entry = score;
        }
    }

    pub fn get(&self, task: TaskKind) -> Option<f64> {
        self.scores.get(&task).copied()
    }

    /// Highest score; ties go to the earliest catalog entry.
    pub fn best(&self) -> Option<(TaskKind, f64)> {
        let mut best: Option<(TaskKind, f64)> = None;
        for (&task, &score) in &self.scores {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((task, score)),
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskKind, f64)> + '_ {
        self.scores.iter().map(|(task, score)| (*task, *score))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
