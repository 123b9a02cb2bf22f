//! Trend scoring and ranking for trendscout.
//!
//! Scores best-seller listings from rank, price and search-interest signals,
//! ranks them, persists the top set against stored products (insert or
//! update by product name, with history), archives stale low scorers, and
//! posts a run summary.

pub mod enrich;
pub mod error;
pub mod interest;
pub mod keyword;
pub mod notify;
pub mod pipeline;
pub mod reconcile;
pub mod scheduler;
pub mod scorer;
pub mod service;
pub mod store;
pub mod tracked;

pub use enrich::{GeminiClient, NoopEnricher, TextEnricher};
pub use error::{PipelineError, StoreError, TrackedRunError, TrendError};
pub use interest::{summarize_series, HttpInterestClient, InterestSource, NoInterestSource};
pub use keyword::clean_keyword;
pub use notify::{DiscordNotifier, LogNotifier, Notifier, RunSummary};
pub use pipeline::{select_ranked, PipelineOutput, TrendPipeline};
pub use reconcile::{ReconciliationStore, ReconciliationSummary};
pub use scheduler::EnrichmentScheduler;
pub use scorer::{score, score_breakdown, ScoreBreakdown};
pub use service::{RunResult, TrendService};
pub use store::{MemoryStore, PgProductStore, ProductStore};
pub use tracked::{acquire_scan_lock, execute_tracked_run, run_tracked};
