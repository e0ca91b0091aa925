//! 掌握度账本：每题历史 + 每分类统计，只由作答与收藏两个入口修改

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::quiz::types::{AnswerRecord, ErrorType, LastResult, Tag};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub correct: u32,
    pub miss: u32,
    #[serde(default, with = "lenient_date")]
    pub last_answered: Option<NaiveDate>,
    pub last_result: LastResult,
    pub consecutive_correct: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_type: Option<ErrorType>,
    #[serde(default)]
    pub bookmarked: bool,
}

impl Default for MasteryRecord {
    fn default() -> Self {
        Self {
            correct: 0,
            miss: 0,
            last_answered: None,
            last_result: LastResult::Miss,
            consecutive_correct: 0,
            last_error_type: None,
            bookmarked: false,
        }
    }
}

impl MasteryRecord {
    pub fn attempts(&self) -> u32 {
        self.correct + self.miss
    }

    /// miss / attempts, with attempts floored at 1.
    pub fn miss_rate(&self) -> f64 {
        self.miss as f64 / self.attempts().max(1) as f64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub correct: u32,
    pub miss: u32,
}

impl CategoryStats {
    pub fn attempts(&self) -> u32 {
        self.correct + self.miss
    }

    pub fn correct_rate(&self) -> f64 {
        match self.attempts() {
            0 => 0.0,
            n => self.correct as f64 / n as f64,
        }
    }

    pub fn miss_rate(&self) -> f64 {
        match self.attempts() {
            0 => 0.0,
            n => self.miss as f64 / n as f64,
        }
    }
}

/// What one `record_answer` call changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDelta {
    pub item_id: String,
    pub tag: Tag,
    pub created: bool,
    pub before: Option<MasteryRecord>,
    pub after: MasteryRecord,
    pub category_after: CategoryStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    #[serde(default)]
    pub history: HashMap<String, MasteryRecord>,
    #[serde(default = "zeroed_tag_stats")]
    pub tag_stats: BTreeMap<Tag, CategoryStats>,
}

fn zeroed_tag_stats() -> BTreeMap<Tag, CategoryStats> {
    Tag::ALL
        .iter()
        .map(|&tag| (tag, CategoryStats::default()))
        .collect()
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            history: HashMap::new(),
            tag_stats: zeroed_tag_stats(),
        }
    }
}

impl Ledger {
    pub fn record(&self, item_id: &str) -> Option<&MasteryRecord> {
        self.history.get(item_id)
    }

    pub fn category(&self, tag: Tag) -> CategoryStats {
        self.tag_stats.get(&tag).copied().unwrap_or_default()
    }

    /// Restores the 11-entry invariant on stats loaded from older blobs.
    pub fn normalize(&mut self) {
        for tag in Tag::ALL {
            self.tag_stats.entry(tag).or_default();
        }
    }

    /// 记录一次作答。先在副本上计算新值，再一次性写回，调用方看不到中间状态。
    /// 未知题目 id 直接懒创建零记录，不视为错误。
    pub fn record_answer(&mut self, record: &AnswerRecord, today: NaiveDate) -> LedgerDelta {
        let before = self.history.get(&record.item_id).cloned();
        let mut next = before.clone().unwrap_or_default();

        if record.correct {
            next.correct += 1;
            next.consecutive_correct += 1;
            next.last_result = LastResult::Correct;
        } else {
            next.miss += 1;
            next.consecutive_correct = 0;
            next.last_result = LastResult::Miss;
            if let Some(error_type) = record.error_type {
                next.last_error_type = Some(error_type);
            }
        }
        next.last_answered = Some(today);

        let mut stats = self.category(record.tag);
        if record.correct {
            stats.correct += 1;
        } else {
            stats.miss += 1;
        }

        self.history.insert(record.item_id.clone(), next.clone());
        self.tag_stats.insert(record.tag, stats);

        tracing::debug!(
            item_id = %record.item_id,
            tag = %record.tag,
            correct = record.correct,
            streak = next.consecutive_correct,
            "Answer recorded"
        );

        LedgerDelta {
            item_id: record.item_id.clone(),
            tag: record.tag,
            created: before.is_none(),
            before,
            after: next,
            category_after: stats,
        }
    }

    /// Returns the new flag, or `None` when the item has never been answered.
    pub fn toggle_bookmark(&mut self, item_id: &str) -> Option<bool> {
        let record = self.history.get_mut(item_id)?;
        record.bookmarked = !record.bookmarked;
        Some(record.bookmarked)
    }

    pub fn tag_rate(&self, tag: Tag) -> f64 {
        self.category(tag).correct_rate()
    }

    pub fn tag_rates(&self) -> BTreeMap<Tag, f64> {
        Tag::ALL.iter().map(|&t| (t, self.tag_rate(t))).collect()
    }

    pub fn bookmarked_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .history
            .iter()
            .filter(|(_, r)| r.bookmarked)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn total_correct(&self) -> u32 {
        self.history.values().map(|r| r.correct).sum()
    }

    pub fn max_streak(&self) -> u32 {
        self.history
            .values()
            .map(|r| r.consecutive_correct)
            .max()
            .unwrap_or(0)
    }
}

/// Stored blobs may carry `""` for a never-answered date.
pub(crate) mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw
            .filter(|s| !s.is_empty())
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()))
    }
}
