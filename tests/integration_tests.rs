use quarterly_financials::*;

const SINGLE_SEGMENT_CSV: &str = "\
Quarter,Year,Revenue,COGS,OpEx,NonCashAdjustments,NetIncome,PlanRevenue,PlanCOGS,PlanOpEx
Q3-2023,2023,90,40,20,5,,100,40,20
Q1-2023,2023,100,40,20,5,,95,38,20
Q2-2023,2023,110,44,22,5,30,0,,
Q1-2024,2024,120,48,24,6,,,,
";

const EXTREME_VALUES_CSV: &str = "\
Quarter,Revenue,COGS,OpEx,NonCashAdjustments,PlanRevenue,PlanCOGS,PlanOpEx
Q1-2023,1e308,-1e308,-1e308,1e308,1e308,-1e308,-1e308
Q2-2023,1.7e308,-1.7e308,0,0,,,
";

const MULTI_SEGMENT_CSV: &str = "\
Quarter,Region,Product,Revenue,COGS,OpEx
Q1-2024,East,Soap,120,50,20
Q1-2023,East,Soap,100,45,20
Q1-2024,West,Soap,80,30,10
Q2-2023,West,Shampoo,60,20,10
Q1-2023,,,500,200,100
Q1-2024,,,550,220,100
";

fn read_csv(data: &str) -> anyhow::Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn read_csv_by_columns(data: &str) -> anyhow::Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(RawRecord::from_columns(
            headers
                .iter()
                .zip(record.iter())
                .filter(|(_, value)| !value.is_empty()),
        ));
    }
    Ok(rows)
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("expected a value, got null");
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}

fn numeric_fields(record: &EnrichedRecord) -> Vec<Option<f64>> {
    vec![
        Some(record.revenue),
        Some(record.cogs),
        Some(record.opex),
        Some(record.non_cash_adjustments),
        Some(record.net_income),
        Some(record.gross_profit),
        Some(record.gross_margin_pct),
        Some(record.ebitda),
        Some(record.ebitda_margin_pct),
        Some(record.opex_margin_pct),
        Some(record.net_margin_pct),
        record.plan_revenue,
        record.plan_cogs,
        record.plan_opex,
        record.plan_non_cash_adjustments,
        record.plan_ebitda,
        record.plan_net_income,
        record.revenue_variance,
        record.revenue_variance_pct,
        record.cogs_variance,
        record.cogs_variance_pct,
        record.opex_variance,
        record.opex_variance_pct,
        record.ebitda_variance,
        record.ebitda_variance_pct,
        record.net_income_variance,
        record.net_income_variance_pct,
        record.revenue_qoq_growth_pct,
        record.net_income_qoq_growth_pct,
        record.revenue_yoy_growth_pct,
        record.net_income_yoy_growth_pct,
    ]
}

#[test]
fn test_single_segment_pipeline() -> anyhow::Result<()> {
    let rows = read_csv(SINGLE_SEGMENT_CSV)?;
    let enriched = process_financial_records(&rows)?;

    let quarters: Vec<&str> = enriched.iter().map(|r| r.quarter.as_str()).collect();
    assert_eq!(quarters, vec!["Q1-2023", "Q2-2023", "Q3-2023", "Q1-2024"]);

    let q1 = &enriched[0];
    assert_eq!(q1.source_row, 1);
    assert_eq!(q1.net_income, 40.0);
    assert_eq!(q1.ebitda, 45.0);
    assert_eq!(q1.plan_ebitda, Some(42.0));
    assert_eq!(q1.plan_net_income, Some(37.0));
    assert_eq!(q1.revenue_variance, Some(5.0));
    assert_eq!(q1.revenue_qoq_growth_pct, None);
    assert_eq!(q1.revenue_yoy_growth_pct, None);

    let q2 = &enriched[1];
    assert_eq!(q2.net_income, 30.0);
    assert_eq!(q2.plan_revenue, Some(0.0));
    assert_eq!(q2.revenue_variance, Some(110.0));
    assert_eq!(q2.revenue_variance_pct, None);
    assert_eq!(q2.plan_cogs, None);
    assert_eq!(q2.cogs_variance, None);
    assert_eq!(q2.plan_net_income, None);
    assert_close(q2.revenue_qoq_growth_pct, 10.0);
    assert_close(q2.net_income_qoq_growth_pct, -25.0);

    let q3 = &enriched[2];
    assert_close(q3.revenue_qoq_growth_pct, -18.181818);
    assert_close(q3.revenue_variance_pct, -10.0);

    let q1_2024 = &enriched[3];
    assert_close(q1_2024.revenue_yoy_growth_pct, 20.0);
    assert_close(q1_2024.net_income_yoy_growth_pct, 20.0);
    assert_eq!(q1_2024.plan_revenue, None);
    assert_eq!(q1_2024.plan_non_cash_adjustments, Some(6.0));

    Ok(())
}

#[test]
fn test_multi_segment_yoy_and_defaults() -> anyhow::Result<()> {
    let rows = read_csv(MULTI_SEGMENT_CSV)?;
    let enriched = process_financial_records(&rows)?;

    let find = |quarter: &str, region: &str, product: &str| {
        enriched
            .iter()
            .find(|r| r.quarter == quarter && r.region == region && r.product == product)
            .expect("row should exist")
    };

    assert_close(find("Q1-2024", "East", "Soap").revenue_yoy_growth_pct, 20.0);
    assert_eq!(find("Q1-2024", "West", "Soap").revenue_yoy_growth_pct, None);
    assert_close(find("Q1-2024", "All", "All").revenue_yoy_growth_pct, 10.0);
    assert_eq!(find("Q2-2023", "West", "Shampoo").revenue_yoy_growth_pct, None);

    assert_eq!(find("Q1-2023", "All", "All").id, "Q1-2023-All-All-4");

    Ok(())
}

#[test]
fn test_column_map_ingestion_matches_serde() -> anyhow::Result<()> {
    let by_serde = process_financial_records(&read_csv(MULTI_SEGMENT_CSV)?)?;
    let by_columns = process_financial_records(&read_csv_by_columns(MULTI_SEGMENT_CSV)?)?;
    assert_eq!(by_serde, by_columns);
    Ok(())
}

#[test]
fn test_output_invariants() -> anyhow::Result<()> {
    for data in [SINGLE_SEGMENT_CSV, MULTI_SEGMENT_CSV, EXTREME_VALUES_CSV] {
        let rows = read_csv(data)?;
        let enriched = process_financial_records(&rows)?;

        assert_eq!(enriched.len(), rows.len());

        for pair in enriched.windows(2) {
            assert!(pair[0].period.sort_key <= pair[1].period.sort_key);
        }

        for record in &enriched {
            for value in numeric_fields(record).into_iter().flatten() {
                assert!(value.is_finite(), "non-finite value in {}", record.id);
            }
        }
    }
    Ok(())
}

#[test]
fn test_extreme_values_serialize_and_read_back() -> anyhow::Result<()> {
    let enriched = process_financial_records(&read_csv(EXTREME_VALUES_CSV)?)?;

    assert_eq!(enriched[0].gross_profit, 0.0);
    assert_eq!(enriched[0].ebitda, 0.0);
    assert_eq!(enriched[0].net_income, 0.0);
    assert_eq!(enriched[0].plan_ebitda, None);
    assert_eq!(enriched[0].plan_net_income, None);

    let json = serde_json::to_string(&enriched)?;
    let read_back: Vec<EnrichedRecord> = serde_json::from_str(&json)?;
    assert_eq!(read_back.len(), enriched.len());
    assert_eq!(read_back[1].gross_profit, 0.0);
    Ok(())
}

#[test]
fn test_processing_is_pure_and_repeatable() -> anyhow::Result<()> {
    let rows = read_csv(MULTI_SEGMENT_CSV)?;
    let snapshot = rows.clone();

    let first = serde_json::to_string(&process_financial_records(&rows)?)?;
    let second = serde_json::to_string(&process_financial_records(&rows)?)?;

    assert_eq!(first, second);
    assert_eq!(rows, snapshot);
    Ok(())
}

#[test]
fn test_zero_revenue_rows_are_margin_safe() -> anyhow::Result<()> {
    let rows = read_csv(
        "Quarter,Revenue,COGS,OpEx,NetIncome\nQ1-2023,0,10,5,\nQ2-2023,,,,-3\n",
    )?;
    let enriched = process_financial_records(&rows)?;

    for record in &enriched {
        assert_eq!(record.revenue, 0.0);
        assert_eq!(record.gross_margin_pct, 0.0);
        assert_eq!(record.opex_margin_pct, 0.0);
        assert_eq!(record.ebitda_margin_pct, 0.0);
        assert_eq!(record.net_margin_pct, 0.0);
        // Previous revenue is zero, so growth has no base.
        assert_eq!(record.revenue_qoq_growth_pct, None);
    }
    assert_eq!(enriched[0].net_income, -15.0);
    assert_close(enriched[1].net_income_qoq_growth_pct, -80.0);
    Ok(())
}

#[test]
fn test_variance_null_propagation() -> anyhow::Result<()> {
    let rows = read_csv(SINGLE_SEGMENT_CSV)?;
    let enriched = process_financial_records(&rows)?;

    for record in &enriched {
        let pairs = [
            (record.plan_revenue, record.revenue_variance, record.revenue_variance_pct),
            (record.plan_cogs, record.cogs_variance, record.cogs_variance_pct),
            (record.plan_opex, record.opex_variance, record.opex_variance_pct),
            (record.plan_ebitda, record.ebitda_variance, record.ebitda_variance_pct),
            (
                record.plan_net_income,
                record.net_income_variance,
                record.net_income_variance_pct,
            ),
        ];

        for (plan, absolute, pct) in pairs {
            match plan {
                None => {
                    assert!(absolute.is_none());
                    assert!(pct.is_none());
                }
                Some(p) if p == 0.0 => {
                    assert!(absolute.is_some());
                    assert!(pct.is_none());
                }
                Some(_) => {
                    assert!(absolute.is_some());
                    assert!(pct.is_some());
                }
            }
        }
    }
    Ok(())
}

#[test]
fn test_malformed_quarter_rejects_whole_batch() -> anyhow::Result<()> {
    let rows = read_csv("Quarter,Revenue\nQ1-2023,100\n2023-Q1,120\nQ5-2023,90\n")?;

    match process_financial_records(&rows) {
        Err(QuarterlyDataError::InvalidQuarterLabel { row, label }) => {
            assert_eq!(row, 1);
            assert_eq!(label, "2023-Q1");
        }
        other => panic!("expected a quarter label error, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_summary_over_filtered_subset() -> anyhow::Result<()> {
    let enriched = process_financial_records(&read_csv(MULTI_SEGMENT_CSV)?)?;

    let filter = RecordFilter {
        product: Some("Soap".to_string()),
        from: PeriodKey::new(2024, 1),
        ..Default::default()
    };
    let subset = filter.apply(&enriched);
    assert_eq!(subset.len(), 2);

    let summary = summarize(subset.iter().copied());
    assert_eq!(summary.revenue, 200.0);
    assert_eq!(summary.gross_profit, 120.0);
    assert_close(Some(summary.gross_margin_pct), 60.0);
    assert_eq!(summary.revenue_variance, None);

    let totals = period_totals(&enriched);
    let labels: Vec<&str> = totals.iter().map(|t| t.quarter.as_str()).collect();
    assert_eq!(labels, vec!["Q1-2023", "Q2-2023", "Q1-2024"]);
    assert_eq!(totals[2].summary.revenue, 750.0);

    let catalog = segments(&enriched);
    assert!(catalog.regions.contains("All"));
    assert!(catalog.products.contains("Shampoo"));
    Ok(())
}

#[test]
fn test_serialized_output_keeps_nulls() -> anyhow::Result<()> {
    let enriched = process_financial_records(&read_csv(MULTI_SEGMENT_CSV)?)?;
    let value = serde_json::to_value(&enriched[0])?;

    assert_eq!(value["quarter"], "Q1-2023");
    assert_eq!(value["sortKey"], 2023.25);
    assert_eq!(value["quarterIndex"], 1);
    assert_eq!(value["periodEnd"], "2023-03-31");
    assert!(value["planRevenue"].is_null());
    assert!(value["revenueQoqGrowthPct"].is_null());

    let round_trip: EnrichedRecord = serde_json::from_value(value)?;
    assert_eq!(round_trip.id, enriched[0].id);
    assert_eq!(round_trip.period, enriched[0].period);
    Ok(())
}
