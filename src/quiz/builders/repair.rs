//! 错题修复：所有答错过的题按错误率降序，取前 10 道后打乱

use crate::quiz::catalog::ItemCatalog;
use crate::quiz::config::DrillConfig;
use crate::quiz::ledger::Ledger;
use crate::quiz::sampler::QuizRng;
use crate::quiz::types::Item;

/// Items with at least one miss, highest miss rate first. Ties keep catalog order.
pub fn rank_candidates<'a>(catalog: &'a ItemCatalog, ledger: &Ledger) -> Vec<(&'a Item, f64)> {
    let mut ranked: Vec<(&Item, f64)> = catalog
        .items()
        .iter()
        .filter_map(|item| {
            let record = ledger.record(&item.id)?;
            (record.miss > 0).then(|| (item, record.miss_rate()))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

pub fn build_repair<'a>(
    catalog: &'a ItemCatalog,
    ledger: &Ledger,
    cfg: &DrillConfig,
    rng: &mut QuizRng,
) -> Vec<&'a Item> {
    let mut items: Vec<&Item> = rank_candidates(catalog, ledger)
        .into_iter()
        .take(cfg.repair_count)
        .map(|(item, _)| item)
        .collect();
    rng.shuffle_for_display(&mut items);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::ledger::MasteryRecord;
    use crate::quiz::testing::{catalog_of, item};
    use crate::quiz::types::Tag;

    fn tally(correct: u32, miss: u32) -> MasteryRecord {
        MasteryRecord {
            correct,
            miss,
            ..MasteryRecord::default()
        }
    }

    #[test]
    fn higher_miss_rate_ranks_first() {
        let catalog = catalog_of(vec![item("B", Tag::Reading), item("A", Tag::Writing)]);
        let mut ledger = Ledger::default();
        ledger.history.insert("A".into(), tally(1, 3));
        ledger.history.insert("B".into(), tally(3, 1));

        let ranked = rank_candidates(&catalog, &ledger);
        let ids: Vec<&str> = ranked.iter().map(|(i, _)| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert!((ranked[0].1 - 0.75).abs() < 1e-9);
        assert!((ranked[1].1 - 0.25).abs() < 1e-9);
    }

    #[test]
    fn no_misses_means_empty_set() {
        let catalog = catalog_of(vec![item("A", Tag::Reading), item("B", Tag::Radical)]);
        let mut ledger = Ledger::default();
        ledger.history.insert("A".into(), tally(4, 0));
        let set = build_repair(&catalog, &ledger, &DrillConfig::default(), &mut QuizRng::from_seed(1));
        assert!(set.is_empty());
    }

    #[test]
    fn keeps_only_top_ten() {
        let items: Vec<Item> = (0..15).map(|n| item(&format!("i{n:02}"), Tag::OnKun)).collect();
        let catalog = catalog_of(items);
        let mut ledger = Ledger::default();
        for n in 0..15u32 {
            // i14 has the highest miss rate
            ledger.history.insert(format!("i{n:02}"), tally(15 - n, n + 1));
        }
        let set = build_repair(&catalog, &ledger, &DrillConfig::default(), &mut QuizRng::from_seed(4));
        assert_eq!(set.len(), 10);
        assert!(set.iter().any(|i| i.id == "i14"));
        assert!(!set.iter().any(|i| i.id == "i00"));
    }
}
