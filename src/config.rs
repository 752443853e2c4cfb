//! Generation-plan parser and driver.
//!
//! A plan is a TOML file declaring groups of subjects (and derivative
//! groups) to synthesize:
//!
//! ```toml
//! [[subjects]]
//! indices = [7, 8, 9]
//! sessions = [4, 6, 5]
//! contrasts = ["T1w", "T2w"]
//!
//! [[derivatives]]
//! indices = [7, 8]
//! sessions = [5]
//! labels = ["lesion-manual-rater1", "lesion-manual-rater2"]
//! [[derivatives.blocks]]
//! modality = ["MTS"]
//! keywords = [ { name = "flip", values = [1, 2] },
//!              { name = "mt",   values = ["on", "off"] } ]
//! ```
//!
//! `contrasts` is shorthand for a block containing only the modality
//! keyword. Every subject in a group is an independent unit of work;
//! `run_plan` dispatches them on the rayon pool.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::Deserialize;

use crate::builder::{DatasetBuilder, DerivativeBuilder, SubjectBuilder};
use crate::error::{Error, Result};
use crate::keywords::{KeywordSpec, KeywordValue, MODALITY_KEY};
use crate::layout::{Session, Subject};

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    #[serde(default)]
    pub subjects: Vec<SubjectGroup>,
    #[serde(default)]
    pub derivatives: Vec<DerivativeGroup>,
}

impl Plan {
    /// The default mock study shipped with the generator: five subjects with
    /// three sessions of four anatomical contrasts, plus a derivatives tree
    /// of two-rater lesion labels for a subset of subjects.
    pub fn example() -> Self {
        Plan {
            subjects: vec![SubjectGroup {
                indices: vec![1, 2, 3, 4, 5],
                sessions: vec![1, 2, 3],
                contrasts: ["T1w", "T2w", "FLAIR", "PD"].map(KeywordValue::from).to_vec(),
                blocks: vec![],
            }],
            derivatives: vec![DerivativeGroup {
                indices: vec![1, 3, 4, 6],
                sessions: vec![2, 4, 6],
                contrasts: vec![KeywordValue::from("T2w")],
                blocks: vec![],
                labels: vec![
                    "lesion-manual-rater1".to_string(),
                    "lesion-manual-rater2".to_string(),
                ],
            }],
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct SubjectGroup {
    pub indices: Vec<u32>,

    /// Empty means the dataset does not use sessions.
    #[serde(default)]
    pub sessions: Vec<u32>,

    /// Shorthand: a plain contrast list becomes a modality-only block.
    #[serde(default)]
    pub contrasts: Vec<KeywordValue>,

    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct DerivativeGroup {
    pub indices: Vec<u32>,

    #[serde(default)]
    pub sessions: Vec<u32>,

    #[serde(default)]
    pub contrasts: Vec<KeywordValue>,

    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub modality: Vec<KeywordValue>,

    #[serde(default)]
    pub keywords: Vec<KeywordEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct KeywordEntry {
    pub name: String,
    pub values: Vec<KeywordValue>,
}

impl Block {
    fn to_spec(&self) -> KeywordSpec {
        let mut entries: Vec<(String, Vec<KeywordValue>)> = self
            .keywords
            .iter()
            .map(|kw| (kw.name.clone(), kw.values.clone()))
            .collect();
        entries.push((MODALITY_KEY.to_string(), self.modality.clone()));
        KeywordSpec::from_entries(entries)
    }
}

fn blocks_of(contrasts: &[KeywordValue], blocks: &[Block], what: &str) -> Result<Vec<KeywordSpec>> {
    let mut specs = Vec::with_capacity(blocks.len() + 1);
    if !contrasts.is_empty() {
        specs.push(KeywordSpec::from_entries(vec![(
            MODALITY_KEY.to_string(),
            contrasts.to_vec(),
        )]));
    }
    specs.extend(blocks.iter().map(Block::to_spec));
    if specs.is_empty() {
        return Err(Error::Configuration(format!(
            "{what} group declares neither `contrasts` nor `blocks`"
        )));
    }
    Ok(specs)
}

fn sessions_of(sessions: &[u32]) -> Vec<Session> {
    sessions.iter().copied().map(Session).collect()
}

/// One independent per-subject unit: a builder plus its keyword blocks.
pub struct WorkUnit {
    subject: Subject,
    builder: Box<dyn DatasetBuilder + Send + Sync>,
    blocks: Vec<KeywordSpec>,
}

// The builder is a trait object, so no derive; show what identifies the unit.
impl std::fmt::Debug for WorkUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkUnit")
            .field("subject", &self.subject)
            .field("derivative", &self.builder.target().is_derivative())
            .field("blocks", &self.blocks)
            .finish()
    }
}

impl WorkUnit {
    pub fn subject(&self) -> Subject { self.subject }

    pub fn run(&self) -> Result<()> {
        self.builder.build(&self.blocks)
    }
}

/// Flatten a plan into its per-subject work units, rooted at `root`.
pub fn work_units(plan: &Plan, root: &Path) -> Result<Vec<WorkUnit>> {
    let mut units = Vec::new();
    for group in &plan.subjects {
        let blocks = blocks_of(&group.contrasts, &group.blocks, "subject")?;
        for &index in &group.indices {
            let subject = Subject(index);
            units.push(WorkUnit {
                subject,
                builder: Box::new(SubjectBuilder::new(root, subject, sessions_of(&group.sessions))),
                blocks: blocks.clone(),
            });
        }
    }
    for group in &plan.derivatives {
        let blocks = blocks_of(&group.contrasts, &group.blocks, "derivative")?;
        for &index in &group.indices {
            let subject = Subject(index);
            units.push(WorkUnit {
                subject,
                builder: Box::new(DerivativeBuilder::new(
                    root,
                    subject,
                    sessions_of(&group.sessions),
                    group.labels.clone(),
                )),
                blocks: blocks.clone(),
            });
        }
    }
    Ok(units)
}

/// Build every unit of the plan, one rayon task per subject. Subjects share
/// no mutable state; sequential and parallel runs produce the same tree.
pub fn run_plan(plan: &Plan, root: &Path) -> Result<()> {
    work_units(plan, root)?
        .par_iter()
        .try_for_each(WorkUnit::run)
}

pub fn read_plan_file(path: &Path) -> Result<Plan> {
    let text = fs::read_to_string(path).map_err(Error::io(path))?;
    toml::from_str(&text)
        .map_err(|e| Error::Configuration(format!("could not parse plan `{}`: {e}", path.display())))
}
