use chrono::NaiveDate;

use crate::quiz::catalog::ItemCatalog;
use crate::quiz::types::{Item, Tag};

pub(crate) fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub(crate) fn item(id: &str, tag: Tag) -> Item {
    Item {
        id: id.to_string(),
        tag,
        source: String::new(),
        points: 1,
        difficulty: 1,
        question: format!("question {id}"),
        context: String::new(),
        target: "字".to_string(),
        answer: "字".to_string(),
        choices: None,
        hint: None,
        explanation: None,
    }
}

/// `per_tag` items for every one of the 11 tags, ids like `reading-03`.
pub(crate) fn sample_catalog(per_tag: usize) -> ItemCatalog {
    let items = Tag::ALL
        .iter()
        .flat_map(|&tag| (0..per_tag).map(move |n| item(&format!("{tag}-{n:02}"), tag)))
        .collect();
    ItemCatalog::from_items(items).unwrap()
}

pub(crate) fn catalog_of(items: Vec<Item>) -> ItemCatalog {
    ItemCatalog::from_items(items).unwrap()
}
