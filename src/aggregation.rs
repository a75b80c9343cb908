//! Roll-ups over enriched records for summary cards, detail filters and period charts.

use crate::period::PeriodKey;
use crate::schema::EnrichedRecord;
use crate::utils::{finite_or, margin_pct, variance};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Selects records by segment and inclusive period range. A `None` field
/// matches every value; a segment value is compared literally, so the
/// default segment label selects the rows uploaded without one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecordFilter {
    pub region: Option<String>,
    pub product: Option<String>,
    pub from: Option<PeriodKey>,
    pub to: Option<PeriodKey>,
}

impl RecordFilter {
    pub fn matches(&self, record: &EnrichedRecord) -> bool {
        segment_matches(self.region.as_deref(), &record.region)
            && segment_matches(self.product.as_deref(), &record.product)
            && self
                .from
                .map_or(true, |from| record.period.sort_key >= from.sort_key)
            && self
                .to
                .map_or(true, |to| record.period.sort_key <= to.sort_key)
    }

    pub fn apply<'r>(&self, records: &'r [EnrichedRecord]) -> Vec<&'r EnrichedRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

fn segment_matches(wanted: Option<&str>, actual: &str) -> bool {
    wanted.map_or(true, |w| w == actual)
}

/// A plan total alongside how many rows contributed to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanTotal {
    pub total: Option<f64>,
    pub rows_with_plan: usize,
}

impl PlanTotal {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.total = Some(self.total.unwrap_or(0.0) + v);
            self.rows_with_plan += 1;
        }
    }

    /// The plan total, but only if every row in the subset supplied one.
    fn complete(&self, record_count: usize) -> Option<f64> {
        if record_count > 0 && self.rows_with_plan == record_count {
            self.total
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub record_count: usize,

    pub revenue: f64,
    pub cogs: f64,
    pub opex: f64,
    pub non_cash_adjustments: f64,
    pub net_income: f64,
    pub gross_profit: f64,
    pub ebitda: f64,

    pub gross_margin_pct: f64,
    pub ebitda_margin_pct: f64,
    pub opex_margin_pct: f64,
    pub net_margin_pct: f64,

    pub plan_revenue: PlanTotal,
    pub plan_cogs: PlanTotal,
    pub plan_opex: PlanTotal,
    pub plan_ebitda: PlanTotal,
    pub plan_net_income: PlanTotal,

    pub revenue_variance: Option<f64>,
    pub revenue_variance_pct: Option<f64>,
    pub ebitda_variance: Option<f64>,
    pub ebitda_variance_pct: Option<f64>,
    pub net_income_variance: Option<f64>,
    pub net_income_variance_pct: Option<f64>,
}

/// Sums actuals and plan figures over `records` and recomputes margins from the sums.
///
/// Subset variance is reported only when every record carries the plan value;
/// a partially planned subset would otherwise compare unlike totals.
pub fn summarize<'r, I>(records: I) -> MetricsSummary
where
    I: IntoIterator<Item = &'r EnrichedRecord>,
{
    let mut summary = MetricsSummary::default();

    for record in records {
        summary.record_count += 1;
        summary.revenue += record.revenue;
        summary.cogs += record.cogs;
        summary.opex += record.opex;
        summary.non_cash_adjustments += record.non_cash_adjustments;
        summary.net_income += record.net_income;
        summary.gross_profit += record.gross_profit;
        summary.ebitda += record.ebitda;

        summary.plan_revenue.add(record.plan_revenue);
        summary.plan_cogs.add(record.plan_cogs);
        summary.plan_opex.add(record.plan_opex);
        summary.plan_ebitda.add(record.plan_ebitda);
        summary.plan_net_income.add(record.plan_net_income);
    }

    for total in [
        &mut summary.revenue,
        &mut summary.cogs,
        &mut summary.opex,
        &mut summary.non_cash_adjustments,
        &mut summary.net_income,
        &mut summary.gross_profit,
        &mut summary.ebitda,
    ] {
        *total = finite_or(*total, 0.0);
    }
    for plan in [
        &mut summary.plan_revenue,
        &mut summary.plan_cogs,
        &mut summary.plan_opex,
        &mut summary.plan_ebitda,
        &mut summary.plan_net_income,
    ] {
        plan.total = plan.total.filter(|t| t.is_finite());
    }

    summary.gross_margin_pct = margin_pct(summary.gross_profit, summary.revenue);
    summary.ebitda_margin_pct = margin_pct(summary.ebitda, summary.revenue);
    summary.opex_margin_pct = margin_pct(summary.opex, summary.revenue);
    summary.net_margin_pct = margin_pct(summary.net_income, summary.revenue);

    let count = summary.record_count;
    (summary.revenue_variance, summary.revenue_variance_pct) =
        variance(summary.revenue, summary.plan_revenue.complete(count));
    (summary.ebitda_variance, summary.ebitda_variance_pct) =
        variance(summary.ebitda, summary.plan_ebitda.complete(count));
    (summary.net_income_variance, summary.net_income_variance_pct) =
        variance(summary.net_income, summary.plan_net_income.complete(count));

    summary
}

/// Per-period totals for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub quarter: String,
    #[serde(flatten)]
    pub period: PeriodKey,
    pub summary: MetricsSummary,
}

/// Groups records by period and summarizes each group, ordered by sort key.
pub fn period_totals(records: &[EnrichedRecord]) -> Vec<PeriodTotals> {
    let mut periods: Vec<PeriodKey> = Vec::new();
    for record in records {
        if !periods.iter().any(|p| p == &record.period) {
            periods.push(record.period);
        }
    }
    periods.sort_by(|a, b| a.cmp_chronological(b));

    periods
        .into_iter()
        .map(|period| PeriodTotals {
            quarter: period.to_string(),
            period,
            summary: summarize(records.iter().filter(|r| r.period == period)),
        })
        .collect()
}

/// Distinct segment values present in a dataset, for filter pick-lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentCatalog {
    pub regions: BTreeSet<String>,
    pub products: BTreeSet<String>,
}

pub fn segments(records: &[EnrichedRecord]) -> SegmentCatalog {
    let mut catalog = SegmentCatalog::default();
    for record in records {
        catalog.regions.insert(record.region.clone());
        catalog.products.insert(record.product.clone());
    }
    catalog
}
