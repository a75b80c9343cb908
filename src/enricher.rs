use crate::period::PeriodKey;
use crate::schema::{EnrichedRecord, QoqComparison};
use crate::utils::growth_pct;
use log::{debug, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// (year, quarter, region, product)
type SegmentPeriod<'r> = (i32, u8, &'r str, &'r str);

/// Lookup from segment/period to the position of the first row carrying it.
struct SegmentIndex<'r> {
    positions: HashMap<SegmentPeriod<'r>, usize>,
}

impl<'r> SegmentIndex<'r> {
    fn build(records: &'r [EnrichedRecord]) -> Self {
        let mut positions = HashMap::with_capacity(records.len());
        let mut duplicates = 0usize;

        for (position, record) in records.iter().enumerate() {
            match positions.entry(segment_period(&record.period, record)) {
                Entry::Occupied(_) => duplicates += 1,
                Entry::Vacant(slot) => {
                    slot.insert(position);
                }
            }
        }

        if duplicates > 0 {
            warn!(
                "{} rows share a quarter, region and product with an earlier row; comparisons use the first",
                duplicates
            );
        }

        Self { positions }
    }

    fn find(&self, period: Option<PeriodKey>, record: &'r EnrichedRecord) -> Option<usize> {
        let period = period?;
        self.positions
            .get(&segment_period(&period, record))
            .copied()
    }
}

fn segment_period<'r>(period: &PeriodKey, record: &'r EnrichedRecord) -> SegmentPeriod<'r> {
    (
        period.year,
        period.quarter_index,
        record.region.as_str(),
        record.product.as_str(),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct GrowthFigures {
    revenue_qoq: Option<f64>,
    net_income_qoq: Option<f64>,
    revenue_yoy: Option<f64>,
    net_income_yoy: Option<f64>,
}

/// Fills quarter-over-quarter and year-over-year growth on a chronologically sorted sequence.
pub struct TemporalEnricher {
    qoq_comparison: QoqComparison,
}

impl TemporalEnricher {
    pub fn new(qoq_comparison: QoqComparison) -> Self {
        Self { qoq_comparison }
    }

    /// Expects `records` sorted ascending by sort key. Only the four growth
    /// fields are written; a missing comparison period leaves them `None`.
    pub fn enrich(&self, records: &mut [EnrichedRecord]) {
        let growth = self.compute_growth(records);

        for (record, figures) in records.iter_mut().zip(growth) {
            record.revenue_qoq_growth_pct = figures.revenue_qoq;
            record.net_income_qoq_growth_pct = figures.net_income_qoq;
            record.revenue_yoy_growth_pct = figures.revenue_yoy;
            record.net_income_yoy_growth_pct = figures.net_income_yoy;
        }
    }

    fn compute_growth(&self, records: &[EnrichedRecord]) -> Vec<GrowthFigures> {
        let index = SegmentIndex::build(records);
        debug!(
            "Indexed {} distinct segment periods across {} rows",
            index.positions.len(),
            records.len()
        );

        #[cfg(feature = "parallel")]
        let positions = (0..records.len()).into_par_iter();
        #[cfg(not(feature = "parallel"))]
        let positions = 0..records.len();

        positions
            .map(|position| self.growth_at(records, &index, position))
            .collect()
    }

    fn growth_at<'r>(
        &self,
        records: &'r [EnrichedRecord],
        index: &SegmentIndex<'r>,
        position: usize,
    ) -> GrowthFigures {
        let current = &records[position];

        let previous = match self.qoq_comparison {
            QoqComparison::AdjacentRow => position.checked_sub(1),
            QoqComparison::SameSegment => index.find(current.period.previous_quarter(), current),
        }
        .map(|p| &records[p]);

        let prior_year = index
            .find(current.period.same_quarter_prior_year(), current)
            .map(|p| &records[p]);

        GrowthFigures {
            revenue_qoq: growth_pct(current.revenue, previous.map(|r| r.revenue)),
            net_income_qoq: growth_pct(current.net_income, previous.map(|r| r.net_income)),
            revenue_yoy: growth_pct(current.revenue, prior_year.map(|r| r.revenue)),
            net_income_yoy: growth_pct(current.net_income, prior_year.map(|r| r.net_income)),
        }
    }
}

/// Stable ascending sort by period; rows sharing a period keep their input order.
pub fn sort_chronologically(records: &mut [EnrichedRecord]) {
    records.sort_by(|a, b| a.period.cmp_chronological(&b.period));
}
