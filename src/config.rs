use std::env;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoreOrder {
    #[default]
    Descending,
    Ascending,
}

/// Matching policy for [`Analyzer`](crate::recognizer::Analyzer).
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzerConfig {
    pub order: ScoreOrder,
    /// Stop at the first gesture (in priority order) that matches.
    pub first_match_wins: bool,
    /// Matches must score strictly above this.
    pub min_score: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            order: ScoreOrder::Descending,
            first_match_wins: false,
            min_score: 0.0,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_order(mut self, order: ScoreOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_first_match_wins(mut self, enabled: bool) -> Self {
        self.first_match_wins = enabled;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Reads `GESTURE_ORDER`, `GESTURE_FIRST_MATCH` and `GESTURE_MIN_SCORE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("GESTURE_ORDER") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "asc" | "ascending" => config.order = ScoreOrder::Ascending,
                "desc" | "descending" => config.order = ScoreOrder::Descending,
                other => log::warn!("ignoring GESTURE_ORDER={other:?}"),
            }
        }

        if let Some(raw) = lookup("GESTURE_FIRST_MATCH") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.first_match_wins = true,
                "0" | "false" | "no" => config.first_match_wins = false,
                other => log::warn!("ignoring GESTURE_FIRST_MATCH={other:?}"),
            }
        }

        if let Some(raw) = lookup("GESTURE_MIN_SCORE") {
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => config.min_score = value,
                _ => log::warn!("ignoring GESTURE_MIN_SCORE={raw:?}"),
            }
        }

        config
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Quiet time after the last touch lifts before the session counts as finished.
    pub end_gesture_delay_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            end_gesture_delay_ms: 120,
        }
    }
}
