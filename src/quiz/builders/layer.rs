//! 地层集中训练：先保证层内每个分类至少一题，再随机补足

use rand::seq::SliceRandom;

use super::{group_by_tag, Selection};
use crate::quiz::catalog::{layer_by_depth, ItemCatalog};
use crate::quiz::config::DrillConfig;
use crate::quiz::sampler::{draw_uniform, QuizRng};
use crate::quiz::types::Item;

pub fn build_layer<'a>(
    catalog: &'a ItemCatalog,
    depth: u8,
    cfg: &DrillConfig,
    rng: &mut QuizRng,
) -> Vec<&'a Item> {
    let count = cfg.layer_count;
    let Some(layer) = layer_by_depth(depth) else {
        tracing::debug!(depth, "Unknown layer depth, drawing from whole catalog");
        return random_fallback(catalog, count, rng);
    };

    let by_tag = group_by_tag(catalog);
    let pool: Vec<&Item> = layer
        .tags
        .iter()
        .filter_map(|tag| by_tag.get(tag))
        .flatten()
        .copied()
        .collect();
    if pool.is_empty() {
        tracing::debug!(depth, "Layer has no items, drawing from whole catalog");
        return random_fallback(catalog, count, rng);
    }

    let mut selection = Selection::new();
    for tag in layer.tags {
        if selection.len() >= count {
            break;
        }
        if let Some(item) = by_tag
            .get(tag)
            .and_then(|items| items.choose(&mut rng.selection))
            .copied()
        {
            selection.push(item);
        }
    }

    let rest = selection.available(&pool, None);
    let needed = count.saturating_sub(selection.len());
    for item in draw_uniform(&mut rng.selection, &rest, needed) {
        selection.push(item);
    }

    let mut items = selection.into_items();
    rng.shuffle_for_display(&mut items);
    items
}

fn random_fallback<'a>(catalog: &'a ItemCatalog, count: usize, rng: &mut QuizRng) -> Vec<&'a Item> {
    let all: Vec<&Item> = catalog.items().iter().collect();
    draw_uniform(&mut rng.selection, &all, count)
}
