//! 模拟考试：按固定配额从各分类无放回随机抽题

use super::{group_by_tag, Selection};
use crate::quiz::catalog::ItemCatalog;
use crate::quiz::sampler::{draw_uniform, QuizRng};
use crate::quiz::types::{Item, Tag};

#[derive(Debug, Clone, Copy)]
pub struct ExamBlueprint {
    pub quotas: &'static [(Tag, usize)],
    /// Truncation bound; the quotas alone decide how many items are drawn.
    pub total: usize,
}

impl ExamBlueprint {
    pub fn quota(&self, tag: Tag) -> usize {
        self.quotas
            .iter()
            .filter(|(t, _)| *t == tag)
            .map(|(_, n)| n)
            .sum()
    }
}

pub const SHORT_EXAM: ExamBlueprint = ExamBlueprint {
    quotas: &[
        (Tag::Writing, 4),
        (Tag::Reading, 2),
        (Tag::CompoundStructure, 2),
        (Tag::ThreeCharCompound, 2),
        (Tag::AntonymSynonym, 2),
        (Tag::OnKun, 2),
        (Tag::Homophone, 1),
        (Tag::JukugoMaking, 1),
        (Tag::Okurigana, 1),
        (Tag::StrokeCount, 1),
        (Tag::Radical, 1),
    ],
    total: 20,
};

pub const FULL_EXAM: ExamBlueprint = ExamBlueprint {
    quotas: &[
        (Tag::Writing, 10),
        (Tag::Reading, 10),
        (Tag::OnKun, 5),
        (Tag::Homophone, 5),
        (Tag::AntonymSynonym, 5),
        (Tag::CompoundStructure, 5),
        (Tag::ThreeCharCompound, 5),
        (Tag::JukugoMaking, 3),
        (Tag::Radical, 1),
        (Tag::StrokeCount, 1),
    ],
    total: 50,
};

pub fn build_exam<'a>(
    catalog: &'a ItemCatalog,
    blueprint: &ExamBlueprint,
    rng: &mut QuizRng,
) -> Vec<&'a Item> {
    let by_tag = group_by_tag(catalog);
    let mut selection = Selection::new();

    for &(tag, quota) in blueprint.quotas {
        let Some(pool) = by_tag.get(&tag) else {
            tracing::debug!(%tag, quota, "No items for exam quota");
            continue;
        };
        for item in draw_uniform(&mut rng.selection, pool, quota) {
            selection.push(item);
        }
    }

    let mut items = selection.into_items();
    rng.shuffle_for_display(&mut items);
    items.truncate(blueprint.total);
    items
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::quiz::testing::{catalog_of, item, sample_catalog};

    fn counts(items: &[&Item]) -> HashMap<Tag, usize> {
        let mut counts = HashMap::new();
        for item in items {
            *counts.entry(item.tag).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn short_exam_fills_every_quota() {
        let catalog = sample_catalog(6);
        for seed in [1, 21, 77] {
            let set = build_exam(&catalog, &SHORT_EXAM, &mut QuizRng::from_seed(seed));
            assert_eq!(set.len(), 19);

            let counts = counts(&set);
            for tag in Tag::ALL {
                assert_eq!(counts.get(&tag).copied().unwrap_or(0), SHORT_EXAM.quota(tag), "{tag}");
            }
            assert_eq!(counts[&Tag::Writing], 4);
        }
    }

    #[test]
    fn full_exam_has_fifty_items() {
        let catalog = sample_catalog(10);
        let set = build_exam(&catalog, &FULL_EXAM, &mut QuizRng::from_seed(5));
        assert_eq!(set.len(), 50);
        let counts = counts(&set);
        assert_eq!(counts[&Tag::Writing], 10);
        assert_eq!(counts[&Tag::JukugoMaking], 3);
        assert!(!counts.contains_key(&Tag::Okurigana));
    }

    #[test]
    fn blueprint_totals() {
        let full: usize = FULL_EXAM.quotas.iter().map(|(_, n)| n).sum();
        assert_eq!(full, FULL_EXAM.total);
        let short: usize = SHORT_EXAM.quotas.iter().map(|(_, n)| n).sum();
        assert_eq!(short, 19);
        assert!(short <= SHORT_EXAM.total);
        assert_eq!(SHORT_EXAM.quota(Tag::Writing), 4);
        assert_eq!(FULL_EXAM.quota(Tag::Okurigana), 0);
    }

    #[test]
    fn thin_catalog_gives_short_exam() {
        let catalog = catalog_of(vec![
            item("w1", Tag::Writing),
            item("w2", Tag::Writing),
            item("r1", Tag::Reading),
        ]);
        let set = build_exam(&catalog, &SHORT_EXAM, &mut QuizRng::from_seed(1));
        assert_eq!(set.len(), 3);
    }
}
