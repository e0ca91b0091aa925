//! 各模式的出题集合构建。所有构建器只读账本，不做任何修改。

pub mod category;
pub mod daily;
pub mod exam;
pub mod layer;
pub mod repair;
pub mod trial;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::quiz::catalog::ItemCatalog;
use crate::quiz::config::SchedulerConfig;
use crate::quiz::ledger::Ledger;
use crate::quiz::priority::PriorityModel;
use crate::quiz::sampler::QuizRng;
use crate::quiz::types::{Item, QuizMode, Tag};

/// Builds the ordered item list for one session of `mode`.
pub fn build_set(
    mode: QuizMode,
    catalog: &ItemCatalog,
    ledger: &Ledger,
    today: NaiveDate,
    config: &SchedulerConfig,
    rng: &mut QuizRng,
) -> Vec<Item> {
    let model = PriorityModel::new(ledger, today, config);

    let picked: Vec<&Item> = match mode {
        QuizMode::Daily => daily::build_daily(catalog, &model, rng),
        QuizMode::Trial => trial::build_trial(catalog, &config.drill, rng),
        QuizMode::Repair => repair::build_repair(catalog, ledger, &config.drill, rng),
        QuizMode::Layer { depth } => layer::build_layer(catalog, depth, &config.drill, rng),
        QuizMode::Category { tag } => category::build_category(catalog, tag, &model, rng),
        QuizMode::ExamShort => exam::build_exam(catalog, &exam::SHORT_EXAM, rng),
        QuizMode::ExamFull => exam::build_exam(catalog, &exam::FULL_EXAM, rng),
    };

    tracing::debug!(
        mode = mode.name(),
        catalog_size = catalog.len(),
        picked = picked.len(),
        "Quiz set built"
    );

    picked.into_iter().cloned().collect()
}

/// Tracks used ids and per-tag counts while a set is assembled.
#[derive(Debug, Default)]
pub(crate) struct Selection<'a> {
    picked: Vec<&'a Item>,
    used: HashSet<&'a str>,
    per_tag: HashMap<Tag, usize>,
}

impl<'a> Selection<'a> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, item: &'a Item) -> bool {
        if !self.used.insert(item.id.as_str()) {
            return false;
        }
        *self.per_tag.entry(item.tag).or_default() += 1;
        self.picked.push(item);
        true
    }

    pub(crate) fn contains(&self, item: &Item) -> bool {
        self.used.contains(item.id.as_str())
    }

    pub(crate) fn tag_count(&self, tag: Tag) -> usize {
        self.per_tag.get(&tag).copied().unwrap_or(0)
    }

    pub(crate) fn len(&self) -> usize {
        self.picked.len()
    }

    /// Items from `pool` not yet picked and whose tag is under `cap`.
    pub(crate) fn available(&self, pool: &[&'a Item], cap: Option<usize>) -> Vec<&'a Item> {
        pool.iter()
            .copied()
            .filter(|item| !self.contains(item))
            .filter(|item| cap.map_or(true, |c| self.tag_count(item.tag) < c))
            .collect()
    }

    pub(crate) fn into_items(self) -> Vec<&'a Item> {
        self.picked
    }
}

pub(crate) fn group_by_tag(catalog: &ItemCatalog) -> HashMap<Tag, Vec<&Item>> {
    let mut by_tag: HashMap<Tag, Vec<&Item>> = HashMap::new();
    for item in catalog.items() {
        by_tag.entry(item.tag).or_default().push(item);
    }
    by_tag
}
