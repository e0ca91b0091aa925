use serde::{Deserialize, Serialize};

/// 题目分类标签，固定 11 种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Radical,
    StrokeCount,
    Okurigana,
    JukugoMaking,
    Homophone,
    Reading,
    OnKun,
    AntonymSynonym,
    CompoundStructure,
    ThreeCharCompound,
    Writing,
}

impl Tag {
    pub const ALL: [Tag; 11] = [
        Tag::Radical,
        Tag::StrokeCount,
        Tag::Okurigana,
        Tag::JukugoMaking,
        Tag::Homophone,
        Tag::Reading,
        Tag::OnKun,
        Tag::AntonymSynonym,
        Tag::CompoundStructure,
        Tag::ThreeCharCompound,
        Tag::Writing,
    ];

    /// The free-response category, graded by self assessment.
    pub const FREE_RESPONSE: Tag = Tag::Writing;

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Radical => "radical",
            Tag::StrokeCount => "stroke_count",
            Tag::Okurigana => "okurigana",
            Tag::JukugoMaking => "jukugo_making",
            Tag::Homophone => "homophone",
            Tag::Reading => "reading",
            Tag::OnKun => "on_kun",
            Tag::AntonymSynonym => "antonym_synonym",
            Tag::CompoundStructure => "compound_structure",
            Tag::ThreeCharCompound => "three_char_compound",
            Tag::Writing => "writing",
        }
    }

    pub fn is_free_response(self) -> bool {
        self == Self::FREE_RESPONSE
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

/// 题库中的一道题，加载后不可变
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub tag: Tag,
    /// Provenance of the item; scheduling ignores it.
    #[serde(default)]
    pub source: String,
    pub points: u32,
    pub difficulty: u8,
    pub question: String,
    #[serde(default)]
    pub context: String,
    pub target: String,
    pub answer: String,
    /// `None` marks a handwriting item.
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Confused with a similar-looking character.
    Mimicry,
    /// Missing or extra strokes/dots.
    CrystalDefect,
    /// Hook, sweep or stop mistakes.
    Weathering,
    /// Wrong radical.
    Misidentify,
    /// Okurigana boundary in the wrong place.
    LayerShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfScore {
    Perfect,
    Close,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastResult {
    Correct,
    Miss,
}

/// 一次作答记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    #[serde(alias = "questionId")]
    pub item_id: String,
    pub tag: Tag,
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_score: Option<SelfScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    /// Seconds spent on the item.
    #[serde(default)]
    pub time_spent: u32,
}

impl AnswerRecord {
    pub fn new(item_id: &str, tag: Tag, correct: bool) -> Self {
        Self {
            item_id: item_id.to_string(),
            tag,
            correct,
            self_score: None,
            error_type: None,
            time_spent: 0,
        }
    }

    /// Error classification only survives alongside a self-scored miss.
    pub fn normalized(mut self) -> Self {
        if self.self_score.is_some() && self.self_score != Some(SelfScore::Miss) {
            self.error_type = None;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum QuizMode {
    /// 7 道混合题：常规 / 薄弱 / 到期 / 惊喜
    Daily,
    /// 3 道入门题
    Trial,
    /// 最多 10 道错题修复
    Repair,
    /// 10 道指定地层题
    Layer { depth: u8 },
    /// 10 道单一分类题
    Category { tag: Tag },
    ExamShort,
    ExamFull,
}

impl QuizMode {
    pub fn is_exam(&self) -> bool {
        matches!(self, QuizMode::ExamShort | QuizMode::ExamFull)
    }

    pub fn name(&self) -> &'static str {
        match self {
            QuizMode::Daily => "daily",
            QuizMode::Trial => "trial",
            QuizMode::Repair => "repair",
            QuizMode::Layer { .. } => "layer",
            QuizMode::Category { .. } => "category",
            QuizMode::ExamShort => "exam_short",
            QuizMode::ExamFull => "exam_full",
        }
    }
}
