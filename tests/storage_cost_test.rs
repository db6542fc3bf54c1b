// ==========================================
// 堆存费用计算集成测试
// ==========================================
// 测试范围:
// 1. 标准港口 / Lazaro Cardenas 计费边界
// 2. 日期格式兼容（ISO / DD/MM/YYYY）
// 3. 月度汇总的剔除规则
// ==========================================


use terminal_storage_kpi::domain::ContainerRecord;
use terminal_storage_kpi::engine::StorageCostCalculator;
use test_helpers::{approx, container, ym};

fn cost_for(stay_days: i64, port: &str) -> f64 {
    let calc = StorageCostCalculator::new();
    calc.cost_line(&container("C1", ym(2024, 3), stay_days, port))
        .storage_cost
}

// ==========================================
// 计费边界
// ==========================================

#[test]
fn test_standard_port_free_period_is_zero() {
    for stay in 1..=7 {
        assert_eq!(cost_for(stay, "MANZANILLO"), 0.0, "stay={stay}");
    }
}

#[test]
fn test_standard_port_first_and_second_charged_day() {
    assert!(approx(cost_for(8, "MANZANILLO"), 4356.42));
    assert!(approx(cost_for(9, "MANZANILLO"), 6550.85));
    assert!(approx(cost_for(12, "MANZANILLO"), 4356.42 + 4.0 * 2194.43));
}

#[test]
fn test_lazaro_cardenas_policy() {
    assert_eq!(cost_for(10, "LZO"), 0.0);
    assert!(approx(cost_for(11, "LZO"), 2027.0));
    assert!(approx(cost_for(11, " lazaro  cardenas "), 2027.0));
    assert!(approx(cost_for(13, "LÁZARO CÁRDENAS"), 3.0 * 2027.0));
}

#[test]
fn test_cost_is_monotonic_in_stay() {
    let mut previous = 0.0;
    for stay in 1..=30 {
        let cost = cost_for(stay, "MANZANILLO");
        assert!(cost >= previous, "stay={stay}");
        previous = cost;
    }
}

// ==========================================
// 日期格式
// ==========================================

#[test]
fn test_slash_unloading_date_with_time_suffix() {
    let record = ContainerRecord {
        container: Some("C2".to_string()),
        destination_port: Some("MANZANILLO".to_string()),
        unloading_terminal: Some("08/01/2024 13:45".to_string()),
        terminal_appointment: Some("2024-01-15 09:00:00".to_string()),
        ..Default::default()
    };
    let line = StorageCostCalculator::new().cost_line(&record);
    assert_eq!(line.total_stay_days, Some(8.0));
    assert!(approx(line.storage_cost, 4356.42));
    assert_eq!(line.month, Some(ym(2024, 1)));
}

#[test]
fn test_unparsable_unloading_counts_with_zero_cost() {
    let record = ContainerRecord {
        container: Some("C3".to_string()),
        unloading_terminal: Some("pending".to_string()),
        terminal_appointment: Some("2024-02-10".to_string()),
        ..Default::default()
    };
    let calc = StorageCostCalculator::new();
    let lines = calc.cost_lines(&[record]);
    assert_eq!(lines[0].total_stay_days, None);
    assert_eq!(lines[0].storage_cost, 0.0);

    let monthly = calc.monthly_aggregates(&lines);
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].container_count, 1);
    assert_eq!(monthly[0].total_storage_cost, 0.0);
}

// ==========================================
// 月度汇总
// ==========================================

#[test]
fn test_monthly_aggregates_drop_rows_without_container_or_appointment() {
    let mut records = vec![
        container("A", ym(2024, 1), 8, "MANZANILLO"),
        container("B", ym(2024, 1), 9, "MANZANILLO"),
        container("C", ym(2024, 2), 3, "MANZANILLO"),
    ];
    records.push(ContainerRecord {
        container: None,
        unloading_terminal: Some("2024-01-01".to_string()),
        terminal_appointment: Some("2024-01-20".to_string()),
        ..Default::default()
    });
    records.push(ContainerRecord {
        container: Some("D".to_string()),
        unloading_terminal: Some("2024-01-01".to_string()),
        terminal_appointment: None,
        ..Default::default()
    });

    let calc = StorageCostCalculator::new();
    let lines = calc.cost_lines(&records);
    assert_eq!(lines.len(), 4);

    let monthly = calc.monthly_aggregates(&lines);
    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0].month, ym(2024, 1));
    assert_eq!(monthly[0].container_count, 2);
    assert!(approx(monthly[0].total_storage_cost, 4356.42 + 6550.85));
    assert_eq!(monthly[1].month, ym(2024, 2));
    assert_eq!(monthly[1].container_count, 1);
    assert_eq!(monthly[1].total_storage_cost, 0.0);
}

#[test]
fn test_combine_monthly_sums_per_month() {
    let calc = StorageCostCalculator::new();
    let a = calc.monthly_aggregates(&calc.cost_lines(&[container("A", ym(2024, 1), 8, "X")]));
    let b = calc.monthly_aggregates(&calc.cost_lines(&[
        container("B", ym(2024, 1), 8, "X"),
        container("C", ym(2024, 2), 8, "X"),
    ]));

    let combined = StorageCostCalculator::combine_monthly(&[a, b]);
    assert_eq!(combined.len(), 2);
    assert_eq!(combined[0].container_count, 2);
    assert!(approx(combined[0].total_storage_cost, 2.0 * 4356.42));
    assert_eq!(combined[1].container_count, 1);
}
