use super::Selection;
use crate::quiz::catalog::ItemCatalog;
use crate::quiz::priority::PriorityModel;
use crate::quiz::sampler::{draw_uniform, sample_index, QuizRng};
use crate::quiz::types::{Item, Tag};

/// 单分类集中训练。按优先级加权无放回抽取；该分类没有题时退回全题库随机。
pub fn build_category<'a>(
    catalog: &'a ItemCatalog,
    tag: Tag,
    model: &PriorityModel<'_>,
    rng: &mut QuizRng,
) -> Vec<&'a Item> {
    let cfg = model.config();
    let count = cfg.drill.category_count;
    let exponent = cfg.daily.general_exponent;

    let mut pool: Vec<&Item> = catalog.items().iter().filter(|i| i.tag == tag).collect();
    if pool.is_empty() {
        tracing::debug!(%tag, "Category has no items, drawing from whole catalog");
        let all: Vec<&Item> = catalog.items().iter().collect();
        return draw_uniform(&mut rng.selection, &all, count);
    }

    let mut selection = Selection::new();
    while selection.len() < count {
        let Some(idx) = sample_index(&mut rng.selection, &pool, |item| {
            model.priority(item).powf(exponent)
        }) else {
            break;
        };
        selection.push(pool.swap_remove(idx));
    }

    let mut items = selection.into_items();
    rng.shuffle_for_display(&mut items);
    items
}
