use crate::error::Result;
use crate::period::PeriodKey;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEGMENT_LABEL: &str = "All";

/// One uploaded row: a quarter/region/product combination with every value still in text form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawRecord {
    #[serde(rename = "Quarter")]
    #[schemars(description = "Quarter label in Q<1-4>-YYYY form, e.g. Q1-2023")]
    pub quarter: String,

    #[serde(rename = "Year", default)]
    #[schemars(description = "Fiscal year column as supplied. The quarter label is authoritative.")]
    pub year: Option<String>,

    #[serde(rename = "Region", default)]
    pub region: Option<String>,

    #[serde(rename = "Product", default)]
    pub product: Option<String>,

    #[serde(rename = "Revenue", default)]
    pub revenue: Option<String>,

    #[serde(rename = "COGS", default)]
    #[schemars(description = "Cost of goods sold")]
    pub cogs: Option<String>,

    #[serde(rename = "OpEx", default)]
    #[schemars(description = "Operating expenses")]
    pub opex: Option<String>,

    #[serde(rename = "NonCashAdjustments", default)]
    #[schemars(description = "Depreciation, amortisation and other add-backs used for EBITDA")]
    pub non_cash_adjustments: Option<String>,

    #[serde(rename = "NetIncome", default)]
    #[schemars(description = "Reported net income. Derived as Revenue - COGS - OpEx when absent.")]
    pub net_income: Option<String>,

    #[serde(rename = "PlanRevenue", default)]
    pub plan_revenue: Option<String>,

    #[serde(rename = "PlanCOGS", default)]
    pub plan_cogs: Option<String>,

    #[serde(rename = "PlanOpEx", default)]
    pub plan_opex: Option<String>,

    #[serde(rename = "PlanNonCashAdjustments", default)]
    pub plan_non_cash_adjustments: Option<String>,

    #[serde(rename = "PlanEBITDA", default)]
    pub plan_ebitda: Option<String>,

    #[serde(rename = "PlanNetIncome", default)]
    pub plan_net_income: Option<String>,
}

/// A normalized row with its derived profitability, variance and growth figures.
///
/// Percentages are already multiplied by 100. Optional fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    #[schemars(description = "Stable identity: quarter, region, product and original row position")]
    pub id: String,

    #[schemars(description = "Zero-based position of the row in the uploaded input")]
    pub source_row: usize,

    pub quarter: String,

    #[serde(flatten)]
    pub period: PeriodKey,

    #[schemars(description = "Last calendar day of the quarter")]
    pub period_end: NaiveDate,

    pub region: String,
    pub product: String,

    pub revenue: f64,
    pub cogs: f64,
    pub opex: f64,
    pub non_cash_adjustments: f64,
    pub net_income: f64,

    pub gross_profit: f64,
    pub gross_margin_pct: f64,
    pub ebitda: f64,
    pub ebitda_margin_pct: f64,
    pub opex_margin_pct: f64,
    pub net_margin_pct: f64,

    pub plan_revenue: Option<f64>,
    pub plan_cogs: Option<f64>,
    pub plan_opex: Option<f64>,
    pub plan_non_cash_adjustments: Option<f64>,
    pub plan_ebitda: Option<f64>,
    pub plan_net_income: Option<f64>,

    pub revenue_variance: Option<f64>,
    pub revenue_variance_pct: Option<f64>,
    pub cogs_variance: Option<f64>,
    pub cogs_variance_pct: Option<f64>,
    pub opex_variance: Option<f64>,
    pub opex_variance_pct: Option<f64>,
    pub ebitda_variance: Option<f64>,
    pub ebitda_variance_pct: Option<f64>,
    pub net_income_variance: Option<f64>,
    pub net_income_variance_pct: Option<f64>,

    pub revenue_qoq_growth_pct: Option<f64>,
    pub net_income_qoq_growth_pct: Option<f64>,
    pub revenue_yoy_growth_pct: Option<f64>,
    pub net_income_yoy_growth_pct: Option<f64>,
}

impl EnrichedRecord {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EnrichedRecord)
    }

    pub fn schema_as_json() -> Result<String> {
        let schema = Self::generate_json_schema();
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

/// How the quarter-over-quarter predecessor of a row is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum QoqComparison {
    #[schemars(
        description = "Compare against whichever row sorts immediately before, regardless of region or product. Only meaningful for single-segment datasets."
    )]
    #[default]
    AdjacentRow,

    #[schemars(
        description = "Compare against the previous calendar quarter of the same region and product."
    )]
    SameSegment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineOptions {
    #[schemars(description = "Label used when a row has no region or product")]
    pub default_segment_label: String,

    pub qoq_comparison: QoqComparison,

    #[schemars(
        description = "When true, a missing plan non-cash adjustment assumes the actual add-backs"
    )]
    pub plan_non_cash_mirrors_actual: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            default_segment_label: DEFAULT_SEGMENT_LABEL.to_string(),
            qoq_comparison: QoqComparison::AdjacentRow,
            plan_non_cash_mirrors_actual: true,
        }
    }
}

impl PipelineOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
