use crate::schema::RawRecord;
use log::debug;

/// Column names understood by [`RawRecord::from_columns`], in upload order.
pub const RECOGNIZED_COLUMNS: [&str; 15] = [
    "Quarter",
    "Year",
    "Region",
    "Product",
    "Revenue",
    "COGS",
    "OpEx",
    "NonCashAdjustments",
    "NetIncome",
    "PlanRevenue",
    "PlanCOGS",
    "PlanOpEx",
    "PlanNonCashAdjustments",
    "PlanEBITDA",
    "PlanNetIncome",
];

fn canonical_column(name: &str) -> Option<&'static str> {
    let name = name.trim();
    RECOGNIZED_COLUMNS
        .iter()
        .find(|c| **c == name)
        .or_else(|| RECOGNIZED_COLUMNS.iter().find(|c| c.eq_ignore_ascii_case(name)))
        .copied()
}

impl RawRecord {
    /// Builds a record from `(column, value)` pairs such as a parsed CSV row.
    ///
    /// Columns that are not recognized are skipped. A column that is missing
    /// stays `None`, which is distinct from a present column holding "0".
    pub fn from_columns<I, K, V>(columns: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = RawRecord::default();

        for (name, value) in columns {
            let Some(column) = canonical_column(name.as_ref()) else {
                debug!("Ignoring unrecognized column '{}'", name.as_ref());
                continue;
            };

            let value = value.into();
            match column {
                "Quarter" => record.quarter = value,
                "Year" => record.year = Some(value),
                "Region" => record.region = Some(value),
                "Product" => record.product = Some(value),
                "Revenue" => record.revenue = Some(value),
                "COGS" => record.cogs = Some(value),
                "OpEx" => record.opex = Some(value),
                "NonCashAdjustments" => record.non_cash_adjustments = Some(value),
                "NetIncome" => record.net_income = Some(value),
                "PlanRevenue" => record.plan_revenue = Some(value),
                "PlanCOGS" => record.plan_cogs = Some(value),
                "PlanOpEx" => record.plan_opex = Some(value),
                "PlanNonCashAdjustments" => record.plan_non_cash_adjustments = Some(value),
                "PlanEBITDA" => record.plan_ebitda = Some(value),
                "PlanNetIncome" => record.plan_net_income = Some(value),
                _ => {}
            }
        }

        record
    }
}

/// Converts header-keyed rows into raw records, preserving row order.
pub fn records_from_rows<R, I, K, V>(rows: R) -> Vec<RawRecord>
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    rows.into_iter().map(RawRecord::from_columns).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_from_columns_maps_known_columns() {
        let mut row = BTreeMap::new();
        row.insert("Quarter", "Q3-2023");
        row.insert("Revenue", "500");
        row.insert("cogs", "200");
        row.insert("PlanNetIncome", "90");
        row.insert("Notes", "ignored");

        let record = RawRecord::from_columns(row);
        assert_eq!(record.quarter, "Q3-2023");
        assert_eq!(record.revenue.as_deref(), Some("500"));
        assert_eq!(record.cogs.as_deref(), Some("200"));
        assert_eq!(record.plan_net_income.as_deref(), Some("90"));
        assert!(record.opex.is_none());
        assert!(record.region.is_none());
    }

    #[test]
    fn test_missing_quarter_column_leaves_label_empty() {
        let record = RawRecord::from_columns(vec![("Revenue", "10")]);
        assert!(record.quarter.is_empty());
    }

    #[test]
    fn test_records_from_rows_keeps_order() {
        let rows = vec![
            vec![("Quarter", "Q2-2023")],
            vec![("Quarter", "Q1-2023")],
        ];
        let records = records_from_rows(rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].quarter, "Q2-2023");
        assert_eq!(records[1].quarter, "Q1-2023");
    }
}
