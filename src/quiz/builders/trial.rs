use super::group_by_tag;
use crate::quiz::catalog::ItemCatalog;
use crate::quiz::config::DrillConfig;
use crate::quiz::sampler::{draw_uniform, QuizRng};
use crate::quiz::types::{Item, Tag};

/// 体验模式只从三类入门题中抽取
pub const TRIAL_TAGS: [Tag; 3] = [Tag::Radical, Tag::StrokeCount, Tag::Reading];

/// Uniform draw, no priority weighting.
pub fn build_trial<'a>(
    catalog: &'a ItemCatalog,
    cfg: &DrillConfig,
    rng: &mut QuizRng,
) -> Vec<&'a Item> {
    let by_tag = group_by_tag(catalog);
    let pool: Vec<&Item> = TRIAL_TAGS
        .iter()
        .filter_map(|tag| by_tag.get(tag))
        .flatten()
        .copied()
        .collect();
    draw_uniform(&mut rng.selection, &pool, cfg.trial_count)
}
