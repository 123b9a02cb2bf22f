use serde::{Deserialize, Serialize};

/// One best-seller listing as produced by a listing source, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    pub name: String,
    pub category: String,
    /// Product page URL. Treated as an opaque string.
    pub url: String,
    /// Listed price in the region's currency, when one could be read.
    #[serde(default)]
    pub price: Option<f64>,
    /// Position in the best-seller list; 1 is the most prominent.
    #[serde(default)]
    pub rank: Option<u32>,
}

/// Summary of a search-interest time series for one cleaned keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestSummary {
    pub keyword: String,
    /// Latest point on the 0-100 interest scale.
    pub current_volume: i32,
    pub average_volume: i32,
    pub max_volume: i32,
    /// Percentage change of the recent window against the prior one.
    pub velocity: f64,
    /// `false` when the summary is a synthesized placeholder rather than
    /// the result of a lookup.
    pub has_data: bool,
}

impl InterestSummary {
    /// Returns `self` only when it carries real lookup data.
    #[must_use]
    pub fn with_data(interest: Option<&Self>) -> Option<&Self> {
        interest.filter(|i| i.has_data)
    }
}

/// A listing after scoring and enrichment. Lives only for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub name: String,
    pub category: String,
    pub url: String,
    pub price: Option<f64>,
    pub rank: Option<u32>,
    /// Always within `[0, 100]`.
    pub trend_score: f64,
    /// Current interest volume, `0` when no lookup produced data.
    pub search_volume: i32,
    pub ai_note: Option<String>,
    pub notes: Option<String>,
}

impl ScoredItem {
    #[must_use]
    pub fn is_hot(&self, threshold: f64) -> bool {
        self.trend_score >= threshold
    }
}
