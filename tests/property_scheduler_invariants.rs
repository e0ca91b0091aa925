mod common;

use std::collections::{HashMap, HashSet};

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use common::fixtures::{fixture_catalog, fixture_items};
use kanji_quarry::quiz::builders::build_set;
use kanji_quarry::quiz::builders::exam::{FULL_EXAM, SHORT_EXAM};
use kanji_quarry::quiz::priority::{target_interval, PriorityModel};
use kanji_quarry::quiz::{
    AnswerRecord, ItemCatalog, Ledger, QuizMode, QuizRng, SchedulerConfig, SessionDriver, SessionState, Tag,
};

fn base_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
}

/// (item index, correct, day offset) triples replayed in order.
fn answer_log() -> impl Strategy<Value = Vec<(usize, bool, u64)>> {
    prop::collection::vec((0usize..66, any::<bool>(), 0u64..60), 0..120)
}

fn replay(catalog: &ItemCatalog, log: &[(usize, bool, u64)]) -> (Ledger, NaiveDate) {
    let mut ledger = Ledger::default();
    let mut sorted = log.to_vec();
    sorted.sort_by_key(|&(_, _, offset)| offset);
    let mut last = base_day();
    for (idx, correct, offset) in sorted {
        let item = &catalog.items()[idx % catalog.len()];
        let today = base_day() + Days::new(offset);
        ledger.record_answer(&AnswerRecord::new(&item.id, item.tag, correct), today);
        last = today;
    }
    (ledger, last)
}

fn any_mode() -> impl Strategy<Value = QuizMode> {
    prop_oneof![
        Just(QuizMode::Daily),
        Just(QuizMode::Trial),
        Just(QuizMode::Repair),
        (0u8..13).prop_map(|depth| QuizMode::Layer { depth }),
        (0usize..11).prop_map(|i| QuizMode::Category { tag: Tag::ALL[i] }),
        Just(QuizMode::ExamShort),
        Just(QuizMode::ExamFull),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn priority_never_below_floor(log in answer_log(), later in 0u64..30) {
        let catalog = fixture_catalog(6);
        let (ledger, last) = replay(&catalog, &log);
        let config = SchedulerConfig::default();
        let model = PriorityModel::new(&ledger, last + Days::new(later), &config);
        for item in catalog.items() {
            let p = model.priority(item);
            prop_assert!(p.is_finite());
            prop_assert!(p >= config.priority.floor);
        }
    }

    #[test]
    fn miss_resets_item_streak(log in answer_log(), idx in 0usize..66) {
        let catalog = fixture_catalog(6);
        let (mut ledger, last) = replay(&catalog, &log);
        let item = &catalog.items()[idx];
        let delta = ledger.record_answer(&AnswerRecord::new(&item.id, item.tag, false), last);
        prop_assert_eq!(delta.after.consecutive_correct, 0);
        prop_assert_eq!(delta.after.miss, delta.before.map_or(0, |b| b.miss) + 1);

        let stats_total: u32 = ledger.tag_stats.values().map(|s| s.correct + s.miss).sum();
        let history_total: u32 = ledger.history.values().map(|r| r.correct + r.miss).sum();
        prop_assert_eq!(stats_total, history_total);
    }

    #[test]
    fn built_sets_never_repeat_items(log in answer_log(), mode in any_mode(), seed in any::<u64>()) {
        let catalog = fixture_catalog(6);
        let (ledger, last) = replay(&catalog, &log);
        let config = SchedulerConfig::default();
        let set = build_set(mode, &catalog, &ledger, last, &config, &mut QuizRng::from_seed(seed));
        let ids: HashSet<&str> = set.iter().map(|i| i.id.as_str()).collect();
        prop_assert_eq!(ids.len(), set.len());
    }

    #[test]
    fn daily_respects_size_and_tag_cap(log in answer_log(), seed in any::<u64>()) {
        let catalog = fixture_catalog(6);
        let (ledger, last) = replay(&catalog, &log);
        let config = SchedulerConfig::default();
        let set = build_set(QuizMode::Daily, &catalog, &ledger, last, &config, &mut QuizRng::from_seed(seed));
        prop_assert_eq!(set.len(), config.daily.question_count);

        let mut per_tag: HashMap<Tag, usize> = HashMap::new();
        for item in &set {
            *per_tag.entry(item.tag).or_default() += 1;
        }
        prop_assert!(per_tag.values().all(|&n| n <= config.daily.max_per_tag));
    }

    #[test]
    fn exam_sets_follow_blueprint(seed in any::<u64>(), per_tag in 1usize..12) {
        let catalog = fixture_catalog(per_tag);
        let config = SchedulerConfig::default();
        let ledger = Ledger::default();
        for (mode, blueprint) in [(QuizMode::ExamShort, &SHORT_EXAM), (QuizMode::ExamFull, &FULL_EXAM)] {
            let set = build_set(mode, &catalog, &ledger, base_day(), &config, &mut QuizRng::from_seed(seed));
            prop_assert!(set.len() <= blueprint.total);
            for tag in Tag::ALL {
                let n = set.iter().filter(|i| i.tag == tag).count();
                prop_assert!(n <= blueprint.quota(tag));
                prop_assert_eq!(n, blueprint.quota(tag).min(per_tag));
            }
        }
    }

    #[test]
    fn seeded_builds_are_reproducible(log in answer_log(), mode in any_mode(), seed in any::<u64>()) {
        let catalog = fixture_catalog(4);
        let (ledger, last) = replay(&catalog, &log);
        let config = SchedulerConfig::default();
        let first = build_set(mode, &catalog, &ledger, last, &config, &mut QuizRng::from_seed(seed));
        let second = build_set(mode, &catalog, &ledger, last, &config, &mut QuizRng::from_seed(seed));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn review_interval_grows_with_streak(streak in 0u32..40) {
        let now = target_interval(streak);
        let next = target_interval(streak + 1);
        prop_assert!(now >= 1);
        prop_assert!(next >= now);
        prop_assert!(next <= 14);
    }

    #[test]
    fn session_completes_after_every_item(mode in any_mode(), seed in any::<u64>(), outcomes in prop::collection::vec(any::<bool>(), 60)) {
        let catalog = ItemCatalog::from_items(fixture_items(5)).expect("catalog");
        let config = SchedulerConfig::default();
        let ledger = Ledger::default();
        let mut driver = SessionDriver::new();
        let state = driver.start(mode, &catalog, &ledger, base_day(), &config, &mut QuizRng::from_seed(seed));
        let total = driver.items().len();
        prop_assert_eq!(state == SessionState::Complete, total == 0);

        for correct in outcomes.iter().take(total) {
            let item = driver.current_item().cloned().expect("active session has an item");
            driver.submit(AnswerRecord::new(&item.id, item.tag, *correct)).expect("matching answer");
        }
        prop_assert!(driver.is_complete());
        prop_assert_eq!(driver.answers().len(), total);
        prop_assert!(driver.current_item().is_none());
    }
}
