//! 每日任务：按槽位（常规 / 薄弱 / 到期 / 惊喜）加权抽 7 题，同一分类最多 3 题

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::Selection;
use crate::quiz::catalog::ItemCatalog;
use crate::quiz::config::DailyConfig;
use crate::quiz::priority::PriorityModel;
use crate::quiz::sampler::{sample, QuizRng};
use crate::quiz::types::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailySlot {
    General,
    Weak,
    Overdue,
    /// Flattened weighting so low-priority items still show up.
    Surprise,
}

impl DailySlot {
    pub fn exponent(self, cfg: &DailyConfig) -> f64 {
        match self {
            DailySlot::General => cfg.general_exponent,
            DailySlot::Weak => cfg.weak_exponent,
            DailySlot::Overdue => cfg.overdue_exponent,
            DailySlot::Surprise => cfg.surprise_exponent,
        }
    }
}

/// Slot plan in random order, padded with general slots up to `question_count`.
pub fn plan_slots(cfg: &DailyConfig, rng: &mut QuizRng) -> Vec<DailySlot> {
    let mut plan = Vec::with_capacity(cfg.question_count);
    for (slot, count) in [
        (DailySlot::General, cfg.general_slots),
        (DailySlot::Weak, cfg.weak_slots),
        (DailySlot::Overdue, cfg.overdue_slots),
        (DailySlot::Surprise, cfg.surprise_slots),
    ] {
        plan.extend(std::iter::repeat(slot).take(count));
    }
    if plan.len() < cfg.question_count {
        plan.resize(cfg.question_count, DailySlot::General);
    }
    plan.truncate(cfg.question_count);
    plan.shuffle(&mut rng.selection);
    plan
}

fn weighted_pick<'a>(
    model: &PriorityModel<'_>,
    candidates: &[&'a Item],
    exponent: f64,
    min_weight: f64,
    rng: &mut StdRng,
) -> Option<&'a Item> {
    sample(rng, candidates, |item| {
        model.priority(item).powf(exponent).max(min_weight)
    })
    .copied()
}

pub fn build_daily<'a>(
    catalog: &'a ItemCatalog,
    model: &PriorityModel<'_>,
    rng: &mut QuizRng,
) -> Vec<&'a Item> {
    let cfg = &model.config().daily;
    let cap = Some(cfg.max_per_tag);

    let all: Vec<&Item> = catalog.items().iter().collect();
    let weak: Vec<&Item> = all.iter().copied().filter(|i| model.is_weak(i)).collect();
    let overdue: Vec<&Item> = all.iter().copied().filter(|i| model.is_overdue(i)).collect();
    let unseen: Vec<&Item> = all.iter().copied().filter(|i| model.is_unseen(i)).collect();

    let mut selection = Selection::new();

    for slot in plan_slots(cfg, rng) {
        let designated: &[&Item] = match slot {
            DailySlot::Weak => &weak,
            DailySlot::Overdue => &overdue,
            DailySlot::General | DailySlot::Surprise => &all,
        };
        // 指定池 → 未做过的题 → 全题库
        let cascade = [
            (designated, slot.exponent(cfg)),
            (unseen.as_slice(), cfg.general_exponent),
            (all.as_slice(), cfg.general_exponent),
        ];
        let picked = cascade.iter().find_map(|(pool, exponent)| {
            let candidates = selection.available(pool, cap);
            weighted_pick(model, &candidates, *exponent, cfg.min_weight, &mut rng.selection)
        });
        if let Some(item) = picked {
            selection.push(item);
        }
    }

    while selection.len() < cfg.question_count {
        let candidates = selection.available(&all, cap);
        match weighted_pick(
            model,
            &candidates,
            cfg.general_exponent,
            cfg.min_weight,
            &mut rng.selection,
        ) {
            Some(item) => {
                selection.push(item);
            }
            None => break,
        }
    }

    let mut items = selection.into_items();
    items.truncate(cfg.question_count);
    rng.shuffle_for_display(&mut items);
    items
}
