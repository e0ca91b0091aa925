//! 加权随机抽样与可注入种子的随机源

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Weights below this are lifted so every candidate stays reachable.
pub const MIN_SAMPLE_WEIGHT: f64 = 0.05;

/// Two independent streams: one drives *which* items get picked,
/// the other only reorders the final list for presentation.
#[derive(Debug, Clone)]
pub struct QuizRng {
    pub selection: StdRng,
    pub presentation: StdRng,
}

impl QuizRng {
    pub fn from_entropy() -> Self {
        Self {
            selection: StdRng::from_entropy(),
            presentation: StdRng::from_entropy(),
        }
    }

    pub fn seeded(selection_seed: u64, presentation_seed: u64) -> Self {
        Self {
            selection: StdRng::seed_from_u64(selection_seed),
            presentation: StdRng::seed_from_u64(presentation_seed),
        }
    }

    /// Derives both streams from one seed.
    pub fn from_seed(seed: u64) -> Self {
        Self::seeded(seed, seed.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15)
    }

    pub fn shuffle_for_display<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.presentation);
    }
}

/// Draws one candidate with probability proportional to `weight_fn`,
/// each weight floored at [`MIN_SAMPLE_WEIGHT`]. Returns the index into
/// `candidates` so callers can remove it before the next draw.
pub fn sample_index<T, R, F>(rng: &mut R, candidates: &[T], weight_fn: F) -> Option<usize>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> f64,
{
    if candidates.is_empty() {
        return None;
    }

    let weights: Vec<f64> = candidates
        .iter()
        .map(|c| {
            let w = weight_fn(c);
            if w.is_nan() {
                MIN_SAMPLE_WEIGHT
            } else {
                w.max(MIN_SAMPLE_WEIGHT)
            }
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return Some(rng.gen_range(0..candidates.len()));
    }

    let mut remaining = rng.gen::<f64>() * sum;
    for (idx, w) in weights.iter().enumerate() {
        remaining -= w;
        if remaining <= 0.0 {
            return Some(idx);
        }
    }
    Some(candidates.len() - 1)
}

pub fn sample<'a, T, R, F>(rng: &mut R, candidates: &'a [T], weight_fn: F) -> Option<&'a T>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> f64,
{
    sample_index(rng, candidates, weight_fn).map(|idx| &candidates[idx])
}

/// Uniform draw of up to `count` distinct elements, in draw order.
pub fn draw_uniform<T: Clone, R: Rng + ?Sized>(rng: &mut R, pool: &[T], count: usize) -> Vec<T> {
    pool.choose_multiple(rng, count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_yields_none() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty: [u32; 0] = [];
        assert!(sample(&mut rng, &empty, |_| 1.0).is_none());
    }

    #[test]
    fn same_seed_same_choice() {
        let pool: Vec<u32> = (0..50).collect();
        let weight = |v: &u32| (*v as f64 + 1.0).sqrt();
        let a: Vec<usize> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..20).filter_map(|_| sample_index(&mut rng, &pool, weight)).collect()
        };
        let b: Vec<usize> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..20).filter_map(|_| sample_index(&mut rng, &pool, weight)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn zero_weights_still_reachable() {
        let pool = vec!["heavy", "zero"];
        let mut rng = StdRng::seed_from_u64(7);
        let mut zero_hits = 0;
        for _ in 0..5000 {
            let pick = sample(&mut rng, &pool, |s| if *s == "heavy" { 1.0 } else { 0.0 });
            if pick == Some(&"zero") {
                zero_hits += 1;
            }
        }
        // 0.05 / 1.05 ≈ 4.8%
        assert!(zero_hits > 100 && zero_hits < 450, "zero_hits={zero_hits}");
    }

    #[test]
    fn heavier_weight_wins_more_often() {
        let pool = vec![1.0_f64, 9.0];
        let mut rng = StdRng::seed_from_u64(3);
        let heavy = (0..2000)
            .filter(|_| sample(&mut rng, &pool, |w| *w) == Some(&9.0))
            .count();
        assert!(heavy > 1600, "heavy={heavy}");
    }

    #[test]
    fn non_finite_sum_falls_back_to_uniform() {
        let pool = vec![1, 2, 3];
        let mut rng = StdRng::seed_from_u64(9);
        let pick = sample(&mut rng, &pool, |_| f64::INFINITY);
        assert!(pick.is_some());
    }

    #[test]
    fn uniform_draw_is_distinct_and_bounded() {
        let pool: Vec<u32> = (0..5).collect();
        let mut rng = StdRng::seed_from_u64(11);
        let mut picked = draw_uniform(&mut rng, &pool, 10);
        assert_eq!(picked.len(), 5);
        picked.sort();
        picked.dedup();
        assert_eq!(picked.len(), 5);
    }
}
