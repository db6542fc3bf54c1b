// ==========================================
// KPI 评分引擎集成测试
// ==========================================
// 测试范围:
// 1. 三事业部排名池中位数场景
// 2. 单事业部池满分、缺月返回空
// 3. 并列同分、重复计算结果一致
// 4. 基于记录的端到端评分
// ==========================================


use std::sync::Arc;
use terminal_storage_kpi::domain::{Grade, MonthlyAggregate, YearMonth};
use terminal_storage_kpi::engine::{DivisionAggregator, DivisionSeries, KpiScorer, KpiSnapshot};
use terminal_storage_kpi::repository::InMemoryDataSource;
use test_helpers::{approx, month_batch, ym};

fn series(points: &[(YearMonth, f64, u64)]) -> DivisionSeries {
    DivisionSeries::from_aggregates(
        points
            .iter()
            .map(|(month, cost, count)| MonthlyAggregate {
                month: *month,
                total_storage_cost: *cost,
                container_count: *count,
            })
            .collect(),
    )
}

fn scorer(divisions: &[&str]) -> KpiScorer {
    let aggregator = Arc::new(DivisionAggregator::new(Arc::new(InMemoryDataSource::new())));
    KpiScorer::new(aggregator, divisions.iter().map(|d| d.to_string()).collect())
}

/// X 环比 +10%（中位），Y -10%，Z +50%
fn three_division_snapshot() -> KpiSnapshot {
    let mut snapshot = KpiSnapshot::default();
    snapshot.insert(
        "X",
        series(&[(ym(2024, 1), 100_000.0, 120), (ym(2024, 2), 110_000.0, 130)]),
    );
    snapshot.insert(
        "Y",
        series(&[(ym(2024, 1), 100.0, 1), (ym(2024, 2), 90.0, 1)]),
    );
    snapshot.insert(
        "Z",
        series(&[(ym(2024, 1), 100.0, 1), (ym(2024, 2), 150.0, 1)]),
    );
    snapshot
}

// ==========================================
// 排名池场景
// ==========================================

#[test]
fn test_median_division_scores_between_best_and_worst() {
    let scorer = scorer(&["X", "Y", "Z"]);
    let snapshot = three_division_snapshot();
    let kpi = scorer.score_division(&snapshot, "X", ym(2024, 2)).unwrap();

    assert!(approx(kpi.mom_change, 10.0));
    assert!(kpi.mom_score > 17.5 && kpi.mom_score < 35.0);
    assert!(approx(kpi.mom_score, 26.25));

    // 去年同月无数据 → 变化率 100，全部并列第一
    assert!(approx(kpi.yoy_change, 100.0));
    assert!(approx(kpi.yoy_score, 25.0));

    // 单箱费用 846.15 在三者中最高
    assert_eq!(kpi.cost_per_container_rank, 3);
    assert!(approx(kpi.cost_per_container_score, 20.0));
    assert!(approx(kpi.cost_per_container, 110_000.0 / 130.0));

    assert!(approx(kpi.trend_score, 15.0));
    assert!(approx(kpi.container_bonus, 5.0));
    assert_eq!(kpi.container_count, 130);
    assert!(approx(kpi.current_cost, 110_000.0));
    assert!(approx(kpi.total_score, 91.25));
    assert_eq!(kpi.grade, Grade::A);
}

#[test]
fn test_best_and_worst_mom_scores() {
    let scorer = scorer(&["X", "Y", "Z"]);
    let snapshot = three_division_snapshot();
    let best = scorer.score_division(&snapshot, "Y", ym(2024, 2)).unwrap();
    let worst = scorer.score_division(&snapshot, "Z", ym(2024, 2)).unwrap();
    assert!(approx(best.mom_score, 35.0));
    assert!(approx(worst.mom_score, 17.5));
    assert_eq!(best.cost_per_container_rank, 1);
}

#[test]
fn test_recalculation_is_deterministic() {
    let scorer = scorer(&["X", "Y", "Z"]);
    let first = scorer.score_division(&three_division_snapshot(), "X", ym(2024, 2));
    let second = scorer.score_division(&three_division_snapshot(), "X", ym(2024, 2));
    assert_eq!(first, second);
}

#[test]
fn test_single_division_pool_gets_full_change_scores() {
    let scorer = scorer(&["X"]);
    let mut snapshot = KpiSnapshot::default();
    snapshot.insert(
        "X",
        series(&[
            (ym(2023, 2), 50_000.0, 60),
            (ym(2024, 1), 100_000.0, 120),
            (ym(2024, 2), 80_000.0, 100),
        ]),
    );
    let kpi = scorer.score_division(&snapshot, "X", ym(2024, 2)).unwrap();
    assert!(approx(kpi.mom_change, -20.0));
    assert!(approx(kpi.yoy_change, 60.0));
    assert!(approx(kpi.mom_score, 35.0));
    assert!(approx(kpi.yoy_score, 25.0));
    assert_eq!(kpi.cost_per_container_rank, 1);
    assert!(approx(kpi.cost_per_container_score, 25.0));
}

#[test]
fn test_missing_target_month_yields_none() {
    let scorer = scorer(&["X", "Y", "Z"]);
    let snapshot = three_division_snapshot();
    assert!(scorer.score_division(&snapshot, "X", ym(2024, 3)).is_none());
    assert!(scorer.score_division(&snapshot, "UNKNOWN", ym(2024, 2)).is_none());
}

#[test]
fn test_tied_divisions_score_equally() {
    let scorer = scorer(&["A", "B"]);
    let mut snapshot = KpiSnapshot::default();
    let points = [(ym(2024, 1), 1_000.0, 10), (ym(2024, 2), 1_200.0, 10)];
    snapshot.insert("A", series(&points));
    snapshot.insert("B", series(&points));

    let a = scorer.score_division(&snapshot, "A", ym(2024, 2)).unwrap();
    let b = scorer.score_division(&snapshot, "B", ym(2024, 2)).unwrap();
    assert_eq!(a.total_score, b.total_score);
    assert_eq!(a.cost_per_container_rank, 1);
    assert_eq!(b.cost_per_container_rank, 1);
    assert!(approx(a.mom_score, 35.0));
}

#[test]
fn test_zero_prior_and_zero_current_is_no_change() {
    let scorer = scorer(&["X"]);
    let mut snapshot = KpiSnapshot::default();
    snapshot.insert(
        "X",
        series(&[(ym(2024, 1), 0.0, 5), (ym(2024, 2), 0.0, 5)]),
    );
    let kpi = scorer.score_division(&snapshot, "X", ym(2024, 2)).unwrap();
    assert_eq!(kpi.mom_change, 0.0);
    assert_eq!(kpi.cost_per_container, 0.0);
}

// ==========================================
// 端到端（记录 → 评分）
// ==========================================

#[test]
fn test_calculate_from_records() {
    let source = InMemoryDataSource::new()
        .with_division(
            "table1",
            [
                month_batch("A", ym(2024, 1), 10, 8),
                month_batch("A", ym(2024, 2), 10, 9),
            ]
            .concat(),
        )
        .with_division("table2", month_batch("B", ym(2024, 2), 60, 3));
    let aggregator = Arc::new(DivisionAggregator::new(Arc::new(source)));
    let scorer = KpiScorer::new(
        aggregator,
        vec!["table1".to_string(), "table2".to_string()],
    );

    let all = scorer.calculate_all(ym(2024, 2)).unwrap();
    assert_eq!(all.len(), 2);

    let table1 = all["table1"].as_ref().unwrap();
    assert!(approx(table1.current_cost, 10.0 * 6550.85));
    assert!(approx(table1.mom_change, (6550.85 - 4356.42) / 4356.42 * 100.0));
    assert_eq!(table1.cost_per_container_rank, 2);

    let table2 = all["table2"].as_ref().unwrap();
    assert_eq!(table2.current_cost, 0.0);
    assert_eq!(table2.cost_per_container_rank, 1);
    assert!(approx(table2.container_bonus, 2.0));

    // 不在排名池中的事业部单独评分时并入快照
    let single = scorer
        .calculate_division_kpi("table1", ym(2024, 1))
        .unwrap()
        .unwrap();
    assert_eq!(single.container_count, 10);
    assert!(scorer.calculate_division_kpi("table9", ym(2024, 2)).unwrap().is_none());
}
