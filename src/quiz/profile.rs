//! 持久化的学习档案快照：账本 + 考试记录 + 奖励 + 个人信息

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quiz::ledger::{lenient_date, Ledger, LedgerDelta};
use crate::quiz::rewards::{self, ExamResult, Mineral, Title};
use crate::quiz::types::AnswerRecord;

pub const CURRENT_SCHEMA_VERSION: u32 = 3;

pub const MAX_NAME_CHARS: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileInfo {
    pub name: String,
    #[serde(with = "lenient_date")]
    pub created_at: Option<NaiveDate>,
    /// Consecutive study days.
    pub streak: u32,
    #[serde(with = "lenient_date")]
    pub last_study_date: Option<NaiveDate>,
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSnapshot {
    pub version: u32,
    pub profile: ProfileInfo,
    #[serde(flatten)]
    pub ledger: Ledger,
    pub exam_results: Vec<ExamResult>,
    pub minerals: BTreeMap<String, u32>,
    pub badges: Vec<String>,
}

impl Default for ProfileSnapshot {
    fn default() -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            profile: ProfileInfo::default(),
            ledger: Ledger::default(),
            exam_results: Vec::new(),
            minerals: Mineral::ALL
                .iter()
                .map(|m| (m.as_str().to_string(), 0))
                .collect(),
            badges: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("profile blob is not valid JSON for the snapshot schema: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("profile schema version {found} is newer than supported version {supported}")]
    NewerVersion { found: u64, supported: u32 },
}

/// 一次作答带来的全部变化
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub delta: LedgerDelta,
    pub minerals: Vec<Mineral>,
    pub new_badges: Vec<String>,
    pub title: Title,
    pub study_streak: u32,
}

impl ProfileSnapshot {
    pub fn fresh(today: NaiveDate) -> Self {
        let mut snapshot = Self::default();
        snapshot.profile.created_at = Some(today);
        snapshot
    }

    /// Parses a stored blob. Newer schema versions are refused rather than
    /// partially read.
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        if let Some(found) = value.get("version").and_then(|v| v.as_u64()) {
            if found > CURRENT_SCHEMA_VERSION as u64 {
                return Err(SnapshotError::NewerVersion {
                    found,
                    supported: CURRENT_SCHEMA_VERSION,
                });
            }
        }
        let mut snapshot: Self = serde_json::from_value(value)?;
        snapshot.normalize();
        Ok(snapshot)
    }

    pub fn normalize(&mut self) {
        self.version = CURRENT_SCHEMA_VERSION;
        self.ledger.normalize();
        for mineral in Mineral::ALL {
            self.minerals.entry(mineral.as_str().to_string()).or_insert(0);
        }
        let mut seen = std::collections::HashSet::new();
        self.badges.retain(|b| seen.insert(b.clone()));
        self.profile.name = clamp_name(&self.profile.name);
    }

    /// 作答的完整副作用：账本、矿石、学习连续天数、徽章、称号
    pub fn apply_answer(&mut self, record: AnswerRecord, today: NaiveDate) -> AnswerOutcome {
        let record = record.normalized();
        let delta = self.ledger.record_answer(&record, today);

        let minerals = rewards::minerals_for_answer(&record, &delta);
        for mineral in &minerals {
            *self.minerals.entry(mineral.as_str().to_string()).or_insert(0) += 1;
        }

        self.touch_study_day(today);
        let new_badges = rewards::award_badges(
            &mut self.badges,
            &self.ledger,
            &self.exam_results,
            self.profile.streak,
        );
        self.profile.title = rewards::compute_title(&self.ledger, &self.exam_results);

        AnswerOutcome {
            delta,
            minerals,
            new_badges,
            title: self.profile.title,
            study_streak: self.profile.streak,
        }
    }

    /// Appends a finished exam; returns badges it unlocked.
    pub fn record_exam(&mut self, result: ExamResult) -> Vec<String> {
        self.exam_results.push(result);
        let granted = rewards::award_badges(
            &mut self.badges,
            &self.ledger,
            &self.exam_results,
            self.profile.streak,
        );
        self.profile.title = rewards::compute_title(&self.ledger, &self.exam_results);
        granted
    }

    pub fn toggle_bookmark(&mut self, item_id: &str) -> Option<bool> {
        self.ledger.toggle_bookmark(item_id)
    }

    pub fn rename(&mut self, name: &str) {
        self.profile.name = clamp_name(name);
    }

    pub fn best_exam_score(&self) -> Option<u32> {
        self.exam_results.iter().map(|e| e.score).max()
    }

    fn touch_study_day(&mut self, today: NaiveDate) {
        let info = &mut self.profile;
        if info.last_study_date == Some(today) {
            return;
        }
        let yesterday = today.checked_sub_days(Days::new(1));
        info.streak = if info.last_study_date.is_some() && info.last_study_date == yesterday {
            info.streak + 1
        } else {
            1
        };
        info.last_study_date = Some(today);
    }
}

fn clamp_name(name: &str) -> String {
    name.trim().chars().take(MAX_NAME_CHARS).collect()
}
