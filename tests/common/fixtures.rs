use chrono::NaiveDate;

use kanji_quarry::quiz::types::Choice;
use kanji_quarry::quiz::{Item, ItemCatalog, Tag};

pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

pub fn item(id: &str, tag: Tag) -> Item {
    let choices = if tag.is_free_response() {
        None
    } else {
        Some(vec![
            Choice { label: "ア".to_string(), desc: None },
            Choice { label: "イ".to_string(), desc: None },
        ])
    };
    Item {
        id: id.to_string(),
        tag,
        source: "fixture".to_string(),
        points: if tag.is_free_response() { 2 } else { 1 },
        difficulty: 2,
        question: format!("問題 {id}"),
        context: String::new(),
        target: "漢".to_string(),
        answer: "ア".to_string(),
        choices,
        hint: None,
        explanation: None,
    }
}

/// `per_tag` items in every tag, ids like `reading-03`.
pub fn fixture_items(per_tag: usize) -> Vec<Item> {
    Tag::ALL
        .iter()
        .flat_map(|&tag| (0..per_tag).map(move |n| item(&format!("{tag}-{n:02}"), tag)))
        .collect()
}

pub fn fixture_catalog(per_tag: usize) -> ItemCatalog {
    ItemCatalog::from_items(fixture_items(per_tag)).expect("fixture catalog")
}
