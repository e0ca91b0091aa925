//! 称号 / 徽章 / 矿石奖励 / 模拟考试计分。全部是账本与考试记录的纯函数。

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::quiz::catalog::TOTAL_POINTS;
use crate::quiz::ledger::{Ledger, LedgerDelta};
use crate::quiz::types::{AnswerRecord, Item, SelfScore, Tag};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Title {
    #[default]
    Trainee,
    Surveyor,
    Assistant,
    Researcher,
    Doctor,
    Professor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mineral {
    /// First correct answer on an item.
    Quartz,
    /// Item streak reaches 3.
    Pyrite,
    /// Item streak reaches 3 after at least one miss.
    Fossil,
    Mica,
    Garnet,
    Jade,
    Obsidian,
}

impl Mineral {
    pub const ALL: [Mineral; 7] = [
        Mineral::Quartz,
        Mineral::Pyrite,
        Mineral::Fossil,
        Mineral::Mica,
        Mineral::Garnet,
        Mineral::Jade,
        Mineral::Obsidian,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mineral::Quartz => "quartz",
            Mineral::Pyrite => "pyrite",
            Mineral::Fossil => "fossil",
            Mineral::Mica => "mica",
            Mineral::Garnet => "garnet",
            Mineral::Jade => "jade",
            Mineral::Obsidian => "obsidian",
        }
    }
}

/// 分类累计正确数每到 `every` 的倍数时发放一枚矿石
#[derive(Debug, Clone, Copy)]
pub struct Milestone {
    pub mineral: Mineral,
    pub tag: Tag,
    pub every: u32,
    /// 只有自评「完美」的书写答案才计入
    pub perfect_writing: bool,
}

pub const MILESTONES: [Milestone; 4] = [
    Milestone { mineral: Mineral::Mica, tag: Tag::Radical, every: 10, perfect_writing: false },
    Milestone { mineral: Mineral::Garnet, tag: Tag::Reading, every: 10, perfect_writing: false },
    Milestone { mineral: Mineral::Jade, tag: Tag::Writing, every: 10, perfect_writing: false },
    Milestone { mineral: Mineral::Obsidian, tag: Tag::Writing, every: 5, perfect_writing: true },
];

#[derive(Debug, Clone, Serialize)]
pub struct BadgeDef {
    pub id: &'static str,
    pub name: &'static str,
    pub condition: &'static str,
}

pub const FIRST_CORRECT: &str = "first_correct";
pub const STREAK_3: &str = "streak_3";
pub const STREAK_10: &str = "streak_10";
pub const WRITING_MASTER: &str = "writing_master";
pub const ALL_TAGS: &str = "all_tags";
pub const EXAM_PASS: &str = "exam_pass";
pub const DAILY_7: &str = "daily_7";

pub const BADGES: [BadgeDef; 7] = [
    BadgeDef { id: FIRST_CORRECT, name: "初めての正解", condition: "1問正解する" },
    BadgeDef { id: STREAK_3, name: "3連続正解", condition: "3問連続で正解する" },
    BadgeDef { id: STREAK_10, name: "10連続正解", condition: "10問連続で正解する" },
    BadgeDef { id: WRITING_MASTER, name: "書道家", condition: "書き取りを30問正解する" },
    BadgeDef { id: ALL_TAGS, name: "全地層踏破", condition: "全11タグで1問以上正解する" },
    BadgeDef { id: EXAM_PASS, name: "耐震認定", condition: "模試で70%以上とる" },
    BadgeDef { id: DAILY_7, name: "1週間継続", condition: "7日連続でフィールドワークする" },
];

const WRITING_MASTER_CORRECT: u32 = 30;
const EXAM_PASS_RATIO: f64 = 0.7;
/// Results stored before `total` existed only carry a raw score.
const LEGACY_EXAM_PASS_SCORE: u32 = 70;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub date: NaiveDate,
    pub score: u32,
    #[serde(default)]
    pub total: u32,
    /// Correct answers per tag.
    #[serde(default)]
    pub breakdown: BTreeMap<Tag, u32>,
    /// Seconds.
    #[serde(default)]
    pub duration: u32,
}

impl ExamResult {
    pub fn passed(&self) -> bool {
        if self.total > 0 {
            self.score as f64 / self.total as f64 >= EXAM_PASS_RATIO
        } else {
            self.score >= LEGACY_EXAM_PASS_SCORE
        }
    }
}

/// Scores a finished exam session on the 200-point scale.
pub fn score_exam(items: &[Item], answers: &[AnswerRecord], date: NaiveDate) -> ExamResult {
    let points: BTreeMap<&str, u32> = items.iter().map(|i| (i.id.as_str(), i.points)).collect();
    let possible: u32 = items.iter().map(|i| i.points).sum();

    let mut earned = 0u32;
    let mut breakdown: BTreeMap<Tag, u32> = Tag::ALL.iter().map(|&t| (t, 0)).collect();
    for answer in answers.iter().filter(|a| a.correct) {
        earned += points.get(answer.item_id.as_str()).copied().unwrap_or(0);
        *breakdown.entry(answer.tag).or_default() += 1;
    }

    let score = if possible == 0 {
        0
    } else {
        (earned as f64 / possible as f64 * TOTAL_POINTS as f64).round() as u32
    };

    ExamResult {
        date,
        score,
        total: TOTAL_POINTS,
        breakdown,
        duration: answers.iter().map(|a| a.time_spent).sum(),
    }
}

pub fn compute_title(ledger: &Ledger, exams: &[ExamResult]) -> Title {
    let best = exams.iter().map(|e| e.score).max().unwrap_or(0);
    if best >= 170 {
        return Title::Professor;
    }
    if best >= 140 {
        return Title::Doctor;
    }
    if best >= 120 {
        return Title::Researcher;
    }

    let stats: Vec<_> = ledger.tag_stats.values().collect();
    let attempted_all_half = stats
        .iter()
        .all(|s| s.attempts() == 0 || s.correct_rate() >= 0.5);
    if attempted_all_half && stats.iter().any(|s| s.attempts() > 0) {
        return Title::Assistant;
    }

    let total_correct: u32 = stats.iter().map(|s| s.correct).sum();
    if total_correct >= 100 {
        return Title::Surveyor;
    }
    Title::Trainee
}

/// Every badge the current state qualifies for, in [`BADGES`] order.
pub fn qualifying_badges(ledger: &Ledger, exams: &[ExamResult], study_streak: u32) -> Vec<&'static str> {
    let max_streak = ledger.max_streak();
    let checks = [
        (FIRST_CORRECT, ledger.total_correct() >= 1),
        (STREAK_3, max_streak >= 3),
        (STREAK_10, max_streak >= 10),
        (
            WRITING_MASTER,
            ledger.category(Tag::FREE_RESPONSE).correct >= WRITING_MASTER_CORRECT,
        ),
        (ALL_TAGS, Tag::ALL.iter().all(|&t| ledger.category(t).correct > 0)),
        (EXAM_PASS, exams.iter().any(ExamResult::passed)),
        (DAILY_7, study_streak >= 7),
    ];
    checks
        .into_iter()
        .filter_map(|(id, ok)| ok.then_some(id))
        .collect()
}

/// Appends newly earned badges to `owned` and returns them. Never revokes.
pub fn award_badges(
    owned: &mut Vec<String>,
    ledger: &Ledger,
    exams: &[ExamResult],
    study_streak: u32,
) -> Vec<String> {
    let mut granted = Vec::new();
    for id in qualifying_badges(ledger, exams, study_streak) {
        if !owned.iter().any(|b| b == id) {
            owned.push(id.to_string());
            granted.push(id.to_string());
        }
    }
    granted
}

/// Item minerals first, then tag milestones in [`MILESTONES`] order.
pub fn minerals_for_answer(record: &AnswerRecord, delta: &LedgerDelta) -> Vec<Mineral> {
    let after = &delta.after;
    let correct_now = delta.before.as_ref().map_or(0, |b| b.correct) < after.correct;
    if !correct_now {
        return Vec::new();
    }

    let mut minerals = Vec::new();
    if after.correct == 1 {
        minerals.push(Mineral::Quartz);
    }
    if after.consecutive_correct == 3 {
        minerals.push(Mineral::Pyrite);
        if after.miss > 0 {
            minerals.push(Mineral::Fossil);
        }
    }

    let tag_correct = delta.category_after.correct;
    for milestone in MILESTONES.iter().filter(|m| m.tag == delta.tag) {
        if milestone.perfect_writing && record.self_score != Some(SelfScore::Perfect) {
            continue;
        }
        if tag_correct > 0 && tag_correct % milestone.every == 0 {
            minerals.push(milestone.mineral);
        }
    }
    minerals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::ledger::CategoryStats;
    use crate::quiz::testing::{day, item};

    fn exam(score: u32, total: u32) -> ExamResult {
        ExamResult {
            date: day("2024-05-01"),
            score,
            total,
            breakdown: BTreeMap::new(),
            duration: 0,
        }
    }

    #[test]
    fn title_ladder() {
        let ledger = Ledger::default();
        assert_eq!(compute_title(&ledger, &[]), Title::Trainee);
        assert_eq!(compute_title(&ledger, &[exam(119, 200), exam(120, 200)]), Title::Researcher);
        assert_eq!(compute_title(&ledger, &[exam(150, 200)]), Title::Doctor);
        assert_eq!(compute_title(&ledger, &[exam(185, 200)]), Title::Professor);

        let mut ledger = Ledger::default();
        ledger.tag_stats.insert(Tag::Reading, CategoryStats { correct: 3, miss: 3 });
        assert_eq!(compute_title(&ledger, &[]), Title::Assistant);

        ledger.tag_stats.insert(Tag::Writing, CategoryStats { correct: 98, miss: 200 });
        assert_eq!(compute_title(&ledger, &[]), Title::Surveyor);
    }

    #[test]
    fn exam_pass_threshold() {
        assert!(exam(140, 200).passed());
        assert!(!exam(139, 200).passed());
        assert!(exam(70, 0).passed());
        assert!(!exam(69, 0).passed());
    }

    #[test]
    fn badges_are_awarded_once() {
        let mut ledger = Ledger::default();
        ledger.record_answer(&AnswerRecord::new("a", Tag::Reading, true), day("2024-05-01"));
        let mut owned = Vec::new();

        let granted = award_badges(&mut owned, &ledger, &[], 7);
        assert_eq!(granted, vec![FIRST_CORRECT.to_string(), DAILY_7.to_string()]);
        assert!(award_badges(&mut owned, &ledger, &[], 7).is_empty());

        // streak dropped back, badge stays
        award_badges(&mut owned, &ledger, &[], 1);
        assert!(owned.iter().any(|b| b == DAILY_7));
    }

    #[test]
    fn fossil_needs_prior_miss() {
        let mut ledger = Ledger::default();
        let today = day("2024-05-01");
        let answer = |ok| AnswerRecord::new("k", Tag::Radical, ok);

        let first = ledger.record_answer(&answer(true), today);
        assert_eq!(minerals_for_answer(&answer(true), &first), vec![Mineral::Quartz]);
        ledger.record_answer(&answer(true), today);
        let third = ledger.record_answer(&answer(true), today);
        assert_eq!(minerals_for_answer(&answer(true), &third), vec![Mineral::Pyrite]);

        let miss = ledger.record_answer(&answer(false), today);
        assert!(minerals_for_answer(&answer(false), &miss).is_empty());
        ledger.record_answer(&answer(true), today);
        ledger.record_answer(&answer(true), today);
        let recovered = ledger.record_answer(&answer(true), today);
        assert_eq!(
            minerals_for_answer(&answer(true), &recovered),
            vec![Mineral::Pyrite, Mineral::Fossil]
        );
    }

    #[test]
    fn tag_milestones_follow_category_totals() {
        let mut ledger = Ledger::default();
        let today = day("2024-05-01");
        let mut granted = Vec::new();
        for n in 0..20 {
            let record = AnswerRecord::new(&format!("r{n}"), Tag::Reading, true);
            let delta = ledger.record_answer(&record, today);
            granted.extend(minerals_for_answer(&record, &delta));
        }
        assert_eq!(granted.iter().filter(|m| **m == Mineral::Garnet).count(), 2);
        assert_eq!(granted.iter().filter(|m| **m == Mineral::Quartz).count(), 20);

        // misses never grant a milestone, even when the total sits on a multiple
        let record = AnswerRecord::new("r0", Tag::Reading, false);
        let delta = ledger.record_answer(&record, today);
        assert!(minerals_for_answer(&record, &delta).is_empty());
    }

    #[test]
    fn obsidian_needs_perfect_writing() {
        let mut ledger = Ledger::default();
        let today = day("2024-05-01");
        let writing = |id: &str, score: SelfScore| {
            let mut record = AnswerRecord::new(id, Tag::Writing, true);
            record.self_score = Some(score);
            record
        };
        for n in 0..4 {
            ledger.record_answer(&writing(&format!("w{n}"), SelfScore::Perfect), today);
        }

        let close = writing("w4", SelfScore::Close);
        let delta = ledger.record_answer(&close, today);
        assert_eq!(delta.category_after.correct, 5);
        assert_eq!(minerals_for_answer(&close, &delta), vec![Mineral::Quartz]);

        for n in 5..9 {
            ledger.record_answer(&writing(&format!("w{n}"), SelfScore::Perfect), today);
        }
        let perfect = writing("w9", SelfScore::Perfect);
        let delta = ledger.record_answer(&perfect, today);
        assert_eq!(
            minerals_for_answer(&perfect, &delta),
            vec![Mineral::Quartz, Mineral::Jade, Mineral::Obsidian]
        );
    }

    #[test]
    fn exam_score_scales_to_total_points() {
        let mut a = item("a", Tag::Writing);
        a.points = 2;
        let b = item("b", Tag::Reading);
        let c = item("c", Tag::Reading);
        let items = vec![a, b, c];

        let mut first = AnswerRecord::new("a", Tag::Writing, true);
        first.time_spent = 30;
        let answers = vec![
            first,
            AnswerRecord::new("b", Tag::Reading, true),
            AnswerRecord::new("c", Tag::Reading, false),
        ];
        let result = score_exam(&items, &answers, day("2024-05-02"));
        assert_eq!(result.score, 150);
        assert_eq!(result.total, 200);
        assert_eq!(result.breakdown[&Tag::Writing], 1);
        assert_eq!(result.breakdown[&Tag::Reading], 1);
        assert_eq!(result.duration, 30);
        assert!(result.passed());
    }
}
