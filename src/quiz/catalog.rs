//! 分类目录（地层 → 标签）与题库加载

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::quiz::types::{Item, Tag};

/// 模拟考试满分
pub const TOTAL_POINTS: u32 = 200;

/// 模拟考试合格线
pub const PASSING_SCORE: u32 = 140;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub depth: u8,
    pub name: &'static str,
    pub tags: &'static [Tag],
    pub points: u32,
    pub percent: u32,
    pub target_rate: f64,
}

pub const LAYERS: [Layer; 7] = [
    Layer {
        depth: 1,
        name: "表土・腐植層",
        tags: &[Tag::Radical, Tag::StrokeCount],
        points: 20,
        percent: 10,
        target_rate: 0.94,
    },
    Layer {
        depth: 2,
        name: "未固結堆積層",
        tags: &[Tag::Okurigana, Tag::JukugoMaking],
        points: 22,
        percent: 11,
        target_rate: 0.90,
    },
    Layer {
        depth: 3,
        name: "固結堆積岩層",
        tags: &[Tag::Homophone],
        points: 18,
        percent: 9,
        target_rate: 0.90,
    },
    Layer {
        depth: 4,
        name: "炭酸塩・水成層",
        tags: &[Tag::Reading, Tag::OnKun],
        points: 40,
        percent: 20,
        target_rate: 0.83,
    },
    Layer {
        depth: 5,
        name: "熱水鉱床帯",
        tags: &[Tag::AntonymSynonym],
        points: 20,
        percent: 10,
        target_rate: 0.85,
    },
    Layer {
        depth: 6,
        name: "変成・火成岩帯",
        tags: &[Tag::CompoundStructure, Tag::ThreeCharCompound],
        points: 40,
        percent: 20,
        target_rate: 0.89,
    },
    Layer {
        depth: 7,
        name: "深成岩・マグマ帯",
        tags: &[Tag::Writing],
        points: 40,
        percent: 20,
        target_rate: 0.85,
    },
];

/// Older profiles used an 11-layer model; depths 8..=11 only exist there.
fn canonical_depth(depth: u8) -> Option<u8> {
    match depth {
        1 | 2 => Some(1),
        3 | 4 => Some(2),
        5 => Some(3),
        6 => Some(5),
        7 => Some(4),
        8 | 9 => Some(6),
        10 | 11 => Some(7),
        _ => None,
    }
}

/// Canonical depths win over the legacy mapping for 1..=7.
pub fn layer_by_depth(depth: u8) -> Option<&'static Layer> {
    if let Some(layer) = LAYERS.iter().find(|l| l.depth == depth) {
        return Some(layer);
    }
    let canonical = canonical_depth(depth)?;
    LAYERS.iter().find(|l| l.depth == canonical)
}

pub fn layer_for_tag(tag: Tag) -> &'static Layer {
    let depth = match tag {
        Tag::Radical | Tag::StrokeCount => 1,
        Tag::Okurigana | Tag::JukugoMaking => 2,
        Tag::Homophone => 3,
        Tag::Reading | Tag::OnKun => 4,
        Tag::AntonymSynonym => 5,
        Tag::CompoundStructure | Tag::ThreeCharCompound => 6,
        Tag::Writing => 7,
    };
    &LAYERS[depth - 1]
}

pub fn target_rate(tag: Tag) -> f64 {
    layer_for_tag(tag).target_rate
}

pub fn tag_label(tag: Tag) -> &'static str {
    match tag {
        Tag::Radical => "部首",
        Tag::StrokeCount => "画数",
        Tag::Okurigana => "送りがな",
        Tag::JukugoMaking => "熟語作り",
        Tag::Homophone => "同音異義語",
        Tag::Reading => "読み",
        Tag::OnKun => "音訓",
        Tag::AntonymSynonym => "対義語・類義語",
        Tag::CompoundStructure => "熟語の構成",
        Tag::ThreeCharCompound => "三字熟語",
        Tag::Writing => "書き取り",
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate item id: {0}")]
    DuplicateId(String),
    #[error("item {id} has difficulty {difficulty}, expected 1..=3")]
    InvalidDifficulty { id: String, difficulty: u8 },
}

/// 题库：进程生命周期内只加载一次，之后只读
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: Vec<Item>,
    index_by_id: HashMap<String, usize>,
}

impl ItemCatalog {
    pub fn from_items(items: Vec<Item>) -> Result<Self, CatalogError> {
        let mut index_by_id = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if !(1..=3).contains(&item.difficulty) {
                return Err(CatalogError::InvalidDifficulty {
                    id: item.id.clone(),
                    difficulty: item.difficulty,
                });
            }
            if index_by_id.insert(item.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId(item.id.clone()));
            }
        }
        Ok(Self { items, index_by_id })
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, CatalogError> {
        let items: Vec<Item> = serde_json::from_slice(bytes)?;
        Self::from_items(items)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json_slice(&bytes)?;
        tracing::info!(path = %path.display(), items = catalog.len(), "Item catalog loaded");
        Ok(catalog)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.index_by_id.get(id).map(|&idx| &self.items[idx])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count_by_tag(&self) -> BTreeMap<Tag, usize> {
        let mut counts: BTreeMap<Tag, usize> = Tag::ALL.iter().map(|&t| (t, 0)).collect();
        for item in &self.items {
            *counts.entry(item.tag).or_default() += 1;
        }
        counts
    }
}
