// ==========================================
// 区间平均 KPI 集成测试
// ==========================================
// 测试范围:
// 1. 跳过无结果月份后取平均
// 2. 无有效月份的事业部省略
// 3. 区间非法
// ==========================================


use std::sync::Arc;
use terminal_storage_kpi::engine::{DivisionAggregator, EngineError, KpiScorer, PeriodAverager};
use terminal_storage_kpi::repository::InMemoryDataSource;
use test_helpers::{approx, month_batch, ym};

fn fixture() -> (Arc<KpiScorer>, PeriodAverager) {
    // table1: 1/2/4 月有数据（3 月空缺）；table2: 仅 2 月；table3: 无数据
    let source = InMemoryDataSource::new()
        .with_division(
            "table1",
            [
                month_batch("A", ym(2024, 1), 60, 8),
                month_batch("A", ym(2024, 2), 80, 10),
                month_batch("A", ym(2024, 4), 120, 9),
            ]
            .concat(),
        )
        .with_division("table2", month_batch("B", ym(2024, 2), 200, 12))
        .with_division("table3", Vec::new());
    let aggregator = Arc::new(DivisionAggregator::new(Arc::new(source)));
    let scorer = Arc::new(KpiScorer::new(
        aggregator,
        vec!["table1".to_string(), "table2".to_string(), "table3".to_string()],
    ));
    (scorer.clone(), PeriodAverager::new(scorer))
}

#[test]
fn test_average_skips_months_without_kpi() {
    let (scorer, averager) = fixture();
    let avg = averager
        .average_kpi("table1", ym(2024, 1), ym(2024, 4))
        .unwrap()
        .unwrap();
    assert_eq!(avg.months_scored, 3);
    assert_eq!(avg.start_month, ym(2024, 1));
    assert_eq!(avg.end_month, ym(2024, 4));

    let totals: Vec<f64> = [ym(2024, 1), ym(2024, 2), ym(2024, 4)]
        .iter()
        .map(|m| {
            scorer
                .calculate_division_kpi("table1", *m)
                .unwrap()
                .unwrap()
                .total_score
        })
        .collect();
    let expected = totals.iter().sum::<f64>() / 3.0;
    assert!(approx(avg.total_score, expected));

    let bonus = (2.0 + 2.0 + 5.0) / 3.0;
    assert!(approx(avg.container_bonus, bonus));
}

#[test]
fn test_average_none_when_no_month_scored() {
    let (_, averager) = fixture();
    assert!(averager
        .average_kpi("table1", ym(2023, 1), ym(2023, 12))
        .unwrap()
        .is_none());
    assert!(averager
        .average_kpi("table3", ym(2024, 1), ym(2024, 4))
        .unwrap()
        .is_none());
}

#[test]
fn test_average_all_omits_divisions_without_data() {
    let (_, averager) = fixture();
    let all = averager.average_all(ym(2024, 1), ym(2024, 4)).unwrap();
    let divisions: Vec<&str> = all.iter().map(|a| a.division.as_str()).collect();
    assert_eq!(divisions, vec!["table1", "table2"]);
    assert_eq!(all[1].months_scored, 1);
}

#[test]
fn test_single_month_range_equals_monthly_kpi() {
    let (scorer, averager) = fixture();
    let avg = averager
        .average_kpi("table2", ym(2024, 2), ym(2024, 2))
        .unwrap()
        .unwrap();
    let kpi = scorer
        .calculate_division_kpi("table2", ym(2024, 2))
        .unwrap()
        .unwrap();
    assert!(approx(avg.total_score, kpi.total_score));
    assert!(approx(avg.mom_score, kpi.mom_score));
}

#[test]
fn test_inverted_range_is_rejected() {
    let (_, averager) = fixture();
    let err = averager
        .average_kpi("table1", ym(2024, 5), ym(2024, 1))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidMonthRange { .. }));
    assert!(averager.average_all(ym(2024, 5), ym(2024, 1)).is_err());
}
