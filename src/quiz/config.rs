use serde::{Deserialize, Serialize};

/// 优先级模型各项权重。数值为经验常数，可调，不是不变量。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityWeights {
    pub base: f64,
    pub miss_rate: f64,
    pub recent_mistake: f64,
    /// Days within which a miss still counts as recent.
    pub recent_mistake_days: i64,
    pub overdue: f64,
    pub overdue_cap: f64,
    pub category_miss_rate: f64,
    pub category_gap: f64,
    pub free_response_boost: f64,
    pub new_item: f64,
    pub streak_penalty: f64,
    /// Streak at which the streak penalty saturates.
    pub streak_saturation: f64,
    pub same_day_penalty: f64,
    pub floor: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            base: 1.0,
            miss_rate: 1.8,
            recent_mistake: 1.2,
            recent_mistake_days: 2,
            overdue: 0.8,
            overdue_cap: 1.5,
            category_miss_rate: 0.5,
            category_gap: 0.4,
            free_response_boost: 0.45,
            new_item: 0.35,
            streak_penalty: 0.7,
            streak_saturation: 5.0,
            same_day_penalty: 0.5,
            floor: 0.1,
        }
    }
}

/// Aggregate thresholds for the free-response boost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeResponseBoostConfig {
    pub min_attempts: u32,
    pub miss_rate_at_least: f64,
    pub correct_rate_below: f64,
}

impl Default for FreeResponseBoostConfig {
    fn default() -> Self {
        Self {
            min_attempts: 12,
            miss_rate_at_least: 0.35,
            correct_rate_below: 0.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakItemConfig {
    pub miss_rate_at_least: f64,
    pub repeated_miss_count: u32,
    pub recovered_streak: u32,
}

impl Default for WeakItemConfig {
    fn default() -> Self {
        Self {
            miss_rate_at_least: 0.34,
            repeated_miss_count: 2,
            recovered_streak: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyConfig {
    pub question_count: usize,
    pub general_slots: usize,
    pub weak_slots: usize,
    pub overdue_slots: usize,
    pub surprise_slots: usize,
    pub general_exponent: f64,
    pub weak_exponent: f64,
    pub overdue_exponent: f64,
    /// Below 1.0 flattens the distribution toward low-priority items.
    pub surprise_exponent: f64,
    pub max_per_tag: usize,
    pub min_weight: f64,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            question_count: 7,
            general_slots: 3,
            weak_slots: 2,
            overdue_slots: 1,
            surprise_slots: 1,
            general_exponent: 0.75,
            weak_exponent: 1.1,
            overdue_exponent: 1.2,
            surprise_exponent: 0.55,
            max_per_tag: 3,
            min_weight: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillConfig {
    pub trial_count: usize,
    pub repair_count: usize,
    pub layer_count: usize,
    pub category_count: usize,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            trial_count: 3,
            repair_count: 10,
            layer_count: 10,
            category_count: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    #[serde(default)]
    pub priority: PriorityWeights,
    #[serde(default)]
    pub free_response: FreeResponseBoostConfig,
    #[serde(default)]
    pub weak: WeakItemConfig,
    #[serde(default)]
    pub daily: DailyConfig,
    #[serde(default)]
    pub drill: DrillConfig,
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.priority.floor <= 0.0 {
            return Err("priority.floor must be > 0".to_string());
        }
        if self.priority.streak_saturation <= 0.0 {
            return Err("priority.streakSaturation must be > 0".to_string());
        }
        if self.priority.overdue_cap < 0.0 {
            return Err("priority.overdueCap must be >= 0".to_string());
        }
        if self.daily.min_weight <= 0.0 {
            return Err("daily.minWeight must be > 0".to_string());
        }
        if self.daily.max_per_tag == 0 {
            return Err("daily.maxPerTag must be >= 1".to_string());
        }
        let slots = self.daily.general_slots
            + self.daily.weak_slots
            + self.daily.overdue_slots
            + self.daily.surprise_slots;
        if slots == 0 || self.daily.question_count == 0 {
            return Err("daily plan must contain at least one slot".to_string());
        }
        for (name, exp) in [
            ("general", self.daily.general_exponent),
            ("weak", self.daily.weak_exponent),
            ("overdue", self.daily.overdue_exponent),
            ("surprise", self.daily.surprise_exponent),
        ] {
            if !(exp > 0.0 && exp.is_finite()) {
                return Err(format!("daily.{name}Exponent must be a positive number"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SchedulerConfig::default().validate().is_ok());
    }

    #[test]
    fn default_daily_slots_fill_the_set() {
        let d = DailyConfig::default();
        assert_eq!(
            d.general_slots + d.weak_slots + d.overdue_slots + d.surprise_slots,
            d.question_count
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = SchedulerConfig::default();
        cfg.priority.floor = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SchedulerConfig::default();
        cfg.daily.surprise_exponent = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: SchedulerConfig =
            serde_json::from_str(r#"{"daily":{"questionCount":5,"generalSlots":1,"weakSlots":2,
            "overdueSlots":1,"surpriseSlots":1,"generalExponent":0.75,"weakExponent":1.1,
            "overdueExponent":1.2,"surpriseExponent":0.55,"maxPerTag":2,"minWeight":0.05}}"#)
                .unwrap();
        assert_eq!(cfg.daily.question_count, 5);
        assert_eq!(cfg.priority.miss_rate, 1.8);
    }
}
