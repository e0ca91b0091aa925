//! 学习优先级模型：错误率、近期失误、到期程度、连对衰减、分类差距等加性组合

use chrono::NaiveDate;
use serde::Serialize;

use crate::quiz::catalog::target_rate;
use crate::quiz::config::SchedulerConfig;
use crate::quiz::ledger::{Ledger, MasteryRecord};
use crate::quiz::types::{Item, LastResult, Tag};

/// Days-since value for an item that was never answered.
pub const NEVER_ANSWERED_DAYS: i64 = 9999;

/// Target review interval in days for a given consecutive-correct streak.
pub fn target_interval(streak: u32) -> i64 {
    match streak {
        0 => 1,
        1 => 2,
        2 => 4,
        s => (7 + (s as i64 - 3) * 2).min(14),
    }
}

/// Whole calendar days between `last` and `today`, never negative.
pub fn days_since(last: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match last {
        Some(date) => (today - date).num_days().max(0),
        None => NEVER_ANSWERED_DAYS,
    }
}

/// Free-response items get a flat boost while the category is still shaky.
pub fn needs_free_response_boost(ledger: &Ledger, config: &SchedulerConfig) -> bool {
    let stats = ledger.category(Tag::FREE_RESPONSE);
    let cfg = &config.free_response;
    if stats.attempts() < cfg.min_attempts {
        return true;
    }
    stats.miss_rate() >= cfg.miss_rate_at_least || stats.correct_rate() < cfg.correct_rate_below
}

/// Per-term contributions, already multiplied by their weights.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBreakdown {
    pub base: f64,
    pub miss_rate: f64,
    pub recent_mistake: f64,
    pub overdue: f64,
    pub category_miss_rate: f64,
    pub category_gap: f64,
    pub free_response: f64,
    pub new_item: f64,
    pub streak_penalty: f64,
    pub same_day_penalty: f64,
    pub total: f64,
}

/// 一次选题过程中复用的优先级上下文
pub struct PriorityModel<'a> {
    ledger: &'a Ledger,
    today: NaiveDate,
    config: &'a SchedulerConfig,
    free_response_boost: bool,
}

impl<'a> PriorityModel<'a> {
    pub fn new(ledger: &'a Ledger, today: NaiveDate, config: &'a SchedulerConfig) -> Self {
        Self {
            ledger,
            today,
            config,
            free_response_boost: needs_free_response_boost(ledger, config),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        self.ledger
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn config(&self) -> &SchedulerConfig {
        self.config
    }

    pub fn free_response_boost(&self) -> bool {
        self.free_response_boost
    }

    pub fn priority(&self, item: &Item) -> f64 {
        self.breakdown(item).total
    }

    pub fn breakdown(&self, item: &Item) -> PriorityBreakdown {
        let w = &self.config.priority;
        let record = self.ledger.record(&item.id);

        let (correct, miss, streak) = record
            .map(|r| (r.correct, r.miss, r.consecutive_correct))
            .unwrap_or((0, 0, 0));
        let total = (correct + miss) as f64;
        let days = days_since(record.and_then(|r| r.last_answered), self.today);
        let interval = target_interval(streak).max(1) as f64;

        let miss_rate = miss as f64 / (total + 2.0);
        let recent_mistake = match record {
            Some(r) if r.last_result == LastResult::Miss && days <= w.recent_mistake_days => 1.0,
            _ => 0.0,
        };
        let overdue = ((days as f64 - interval) / interval).clamp(0.0, w.overdue_cap);

        let stats = self.ledger.category(item.tag);
        let category_miss_rate = stats.miss_rate();
        let category_gap = if stats.attempts() > 0 {
            let target = target_rate(item.tag);
            ((target - stats.correct_rate()) / target).max(0.0)
        } else {
            0.0
        };

        let free_response = if self.free_response_boost && item.tag.is_free_response() {
            w.free_response_boost
        } else {
            0.0
        };
        let new_item = if record.is_none() { w.new_item } else { 0.0 };
        let streak_ratio = (streak as f64 / w.streak_saturation).min(1.0);
        let same_day = record
            .and_then(|r| r.last_answered)
            .is_some_and(|d| d == self.today);

        let mut b = PriorityBreakdown {
            base: w.base,
            miss_rate: w.miss_rate * miss_rate,
            recent_mistake: w.recent_mistake * recent_mistake,
            overdue: w.overdue * overdue,
            category_miss_rate: w.category_miss_rate * category_miss_rate,
            category_gap: w.category_gap * category_gap,
            free_response,
            new_item,
            streak_penalty: -w.streak_penalty * streak_ratio,
            same_day_penalty: if same_day { -w.same_day_penalty } else { 0.0 },
            total: 0.0,
        };
        let sum = b.base
            + b.miss_rate
            + b.recent_mistake
            + b.overdue
            + b.category_miss_rate
            + b.category_gap
            + b.free_response
            + b.new_item
            + b.streak_penalty
            + b.same_day_penalty;
        b.total = sum.max(w.floor);
        b
    }

    pub fn is_unseen(&self, item: &Item) -> bool {
        self.ledger.record(&item.id).is_none()
    }

    pub fn is_weak(&self, item: &Item) -> bool {
        self.ledger
            .record(&item.id)
            .is_some_and(|r| is_weak_record(r, self.config))
    }

    pub fn is_overdue(&self, item: &Item) -> bool {
        self.ledger
            .record(&item.id)
            .is_some_and(|r| is_overdue_record(r, self.today))
    }
}

pub fn is_weak_record(record: &MasteryRecord, config: &SchedulerConfig) -> bool {
    let cfg = &config.weak;
    record.last_result == LastResult::Miss
        || record.miss_rate() >= cfg.miss_rate_at_least
        || (record.miss >= cfg.repeated_miss_count
            && record.consecutive_correct < cfg.recovered_streak)
}

pub fn is_overdue_record(record: &MasteryRecord, today: NaiveDate) -> bool {
    match record.last_answered {
        Some(date) => days_since(Some(date), today) > target_interval(record.consecutive_correct),
        None => false,
    }
}
