use crate::error::{QuarterlyDataError, Result};
use crate::period::parse_quarter_label;
use crate::schema::{EnrichedRecord, PipelineOptions, RawRecord};
use crate::utils::{all_present, finite_or, margin_pct, safe_parse_float, variance};
use log::warn;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Turns one raw row into a normalized record with every single-row metric filled in.
/// Growth fields are left `None` for the temporal pass.
pub struct RowNormalizer<'a> {
    options: &'a PipelineOptions,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(options: &'a PipelineOptions) -> Self {
        Self { options }
    }

    pub fn normalize(&self, raw: &RawRecord, row: usize) -> Result<EnrichedRecord> {
        let period = parse_quarter_label(&raw.quarter).ok_or_else(|| {
            QuarterlyDataError::InvalidQuarterLabel {
                row,
                label: raw.quarter.clone(),
            }
        })?;

        if let Some(year) = safe_parse_float(raw.year.as_deref(), None) {
            if year != period.year as f64 {
                warn!(
                    "Row {}: Year column '{}' disagrees with quarter label '{}'; using the label",
                    row,
                    year,
                    raw.quarter.trim()
                );
            }
        }

        let region = self.segment(raw.region.as_deref());
        let product = self.segment(raw.product.as_deref());

        let revenue = number(raw.revenue.as_deref());
        let cogs = number(raw.cogs.as_deref());
        let opex = number(raw.opex.as_deref());
        let non_cash_adjustments = number(raw.non_cash_adjustments.as_deref());
        // Sums that overflow f64 fall back to 0 like any other unusable amount.
        let net_income = safe_parse_float(raw.net_income.as_deref(), None)
            .unwrap_or_else(|| finite_or(revenue - cogs - opex, 0.0));

        let gross_profit = finite_or(revenue - cogs, 0.0);
        let ebitda = finite_or(revenue - cogs - opex + non_cash_adjustments, 0.0);

        let plan_revenue = safe_parse_float(raw.plan_revenue.as_deref(), None);
        let plan_cogs = safe_parse_float(raw.plan_cogs.as_deref(), None);
        let plan_opex = safe_parse_float(raw.plan_opex.as_deref(), None);
        let plan_non_cash_default = self
            .options
            .plan_non_cash_mirrors_actual
            .then_some(non_cash_adjustments);
        let plan_non_cash_adjustments = safe_parse_float(
            raw.plan_non_cash_adjustments.as_deref(),
            plan_non_cash_default,
        );

        let plan_components = all_present(plan_revenue, plan_cogs, plan_opex);
        let plan_ebitda = safe_parse_float(raw.plan_ebitda.as_deref(), None).or_else(|| {
            plan_components
                .map(|(r, c, o)| r - c - o + plan_non_cash_adjustments.unwrap_or(0.0))
                .filter(|v| v.is_finite())
        });
        let plan_net_income = safe_parse_float(raw.plan_net_income.as_deref(), None)
            .or_else(|| {
                plan_components
                    .map(|(r, c, o)| r - c - o)
                    .filter(|v| v.is_finite())
            });

        let (revenue_variance, revenue_variance_pct) = variance(revenue, plan_revenue);
        let (cogs_variance, cogs_variance_pct) = variance(cogs, plan_cogs);
        let (opex_variance, opex_variance_pct) = variance(opex, plan_opex);
        let (ebitda_variance, ebitda_variance_pct) = variance(ebitda, plan_ebitda);
        let (net_income_variance, net_income_variance_pct) =
            variance(net_income, plan_net_income);

        let quarter = period.to_string();

        Ok(EnrichedRecord {
            id: format!("{}-{}-{}-{}", quarter, region, product, row),
            source_row: row,
            quarter,
            period,
            period_end: period.end_date(),
            region,
            product,
            revenue,
            cogs,
            opex,
            non_cash_adjustments,
            net_income,
            gross_profit,
            gross_margin_pct: margin_pct(gross_profit, revenue),
            ebitda,
            ebitda_margin_pct: margin_pct(ebitda, revenue),
            opex_margin_pct: margin_pct(opex, revenue),
            net_margin_pct: margin_pct(net_income, revenue),
            plan_revenue,
            plan_cogs,
            plan_opex,
            plan_non_cash_adjustments,
            plan_ebitda,
            plan_net_income,
            revenue_variance,
            revenue_variance_pct,
            cogs_variance,
            cogs_variance_pct,
            opex_variance,
            opex_variance_pct,
            ebitda_variance,
            ebitda_variance_pct,
            net_income_variance,
            net_income_variance_pct,
            revenue_qoq_growth_pct: None,
            net_income_qoq_growth_pct: None,
            revenue_yoy_growth_pct: None,
            net_income_yoy_growth_pct: None,
        })
    }

    /// Normalizes every row in input order. The first malformed quarter label,
    /// by input position, fails the whole batch.
    pub fn normalize_all(&self, rows: &[RawRecord]) -> Result<Vec<EnrichedRecord>> {
        #[cfg(feature = "parallel")]
        let indexed_rows = rows.par_iter().enumerate();
        #[cfg(not(feature = "parallel"))]
        let indexed_rows = rows.iter().enumerate();

        let results: Vec<Result<EnrichedRecord>> = indexed_rows
            .map(|(row, raw)| self.normalize(raw, row))
            .collect();

        results.into_iter().collect()
    }

    fn segment(&self, raw: Option<&str>) -> String {
        match raw.map(str::trim) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => self.options.default_segment_label.clone(),
        }
    }
}

fn number(raw: Option<&str>) -> f64 {
    safe_parse_float(raw, Some(0.0)).unwrap_or(0.0)
}
