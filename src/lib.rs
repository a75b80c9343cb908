//! # Quarterly Financials
//!
//! A library for turning uploaded quarterly financial rows (one per
//! quarter/region/product) into an enriched analytical dataset.
//!
//! ## Core Concepts
//!
//! - **Raw Records**: Text-valued rows exactly as uploaded; any numeric column may be missing
//! - **Normalization**: Quarter labels become [`PeriodKey`]s, text becomes numbers with
//!   documented defaults, and single-row metrics (margins, EBITDA, plan variance) are derived
//! - **Temporal Enrichment**: Rows are ordered chronologically, then quarter-over-quarter
//!   and year-over-year growth are filled in from neighbouring periods
//! - **Fail Fast**: A malformed quarter label rejects the whole batch; every other
//!   anomaly falls back to a default value
//!
//! ## Example
//!
//! ```rust
//! use quarterly_financials::*;
//!
//! let rows = vec![
//!     RawRecord {
//!         quarter: "Q1-2023".to_string(),
//!         revenue: Some("100".to_string()),
//!         cogs: Some("40".to_string()),
//!         opex: Some("20".to_string()),
//!         ..Default::default()
//!     },
//!     RawRecord {
//!         quarter: "Q2-2023".to_string(),
//!         revenue: Some("110".to_string()),
//!         ..Default::default()
//!     },
//! ];
//!
//! let enriched = process_financial_records(&rows).unwrap();
//! assert_eq!(enriched[0].net_income, 40.0);
//! assert_eq!(enriched[1].revenue_qoq_growth_pct.map(f64::round), Some(10.0));
//! ```

pub mod aggregation;
pub mod enricher;
pub mod error;
pub mod ingestion;
pub mod normalizer;
pub mod period;
pub mod schema;
pub mod utils;

pub use aggregation::{
    period_totals, segments, summarize, MetricsSummary, PeriodTotals, PlanTotal, RecordFilter,
    SegmentCatalog,
};
pub use enricher::{sort_chronologically, TemporalEnricher};
pub use error::{QuarterlyDataError, Result};
pub use ingestion::*;
pub use normalizer::RowNormalizer;
pub use period::{parse_quarter_label, PeriodKey};
pub use schema::*;
pub use utils::*;

use log::{debug, info};

pub struct QuarterlyProcessor {
    options: PipelineOptions,
}

impl QuarterlyProcessor {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Runs normalization, chronological ordering and growth enrichment over
    /// the whole batch. The input is left untouched.
    pub fn process(&self, rows: &[RawRecord]) -> Result<Vec<EnrichedRecord>> {
        info!("Processing {} quarterly financial rows", rows.len());

        let mut records = RowNormalizer::new(&self.options).normalize_all(rows)?;

        sort_chronologically(&mut records);
        debug!(
            "Sorted {} rows chronologically ({} to {})",
            records.len(),
            records.first().map(|r| r.quarter.as_str()).unwrap_or("-"),
            records.last().map(|r| r.quarter.as_str()).unwrap_or("-")
        );

        TemporalEnricher::new(self.options.qoq_comparison).enrich(&mut records);

        info!("Enriched {} rows", records.len());
        Ok(records)
    }
}

impl Default for QuarterlyProcessor {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}

/// Processes rows with the default options.
pub fn process_financial_records(rows: &[RawRecord]) -> Result<Vec<EnrichedRecord>> {
    QuarterlyProcessor::default().process(rows)
}

pub fn process_with_options(
    rows: &[RawRecord],
    options: &PipelineOptions,
) -> Result<Vec<EnrichedRecord>> {
    QuarterlyProcessor::new(options.clone()).process(rows)
}
