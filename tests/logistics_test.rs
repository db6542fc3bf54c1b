// ==========================================
// 船期延误与运输方式集成测试（SQLite 数据源 + DashboardApi）
// ==========================================
// 测试范围:
// 1. 延误概况: 计数与平均天数
// 2. 延误原因透视: 1/3/4/7/8 天分档边界、Others 归类、合计
// 3. 运输方式出运状态: 入港前/当日出运/剩余
// 4. 输入校验
// ==========================================


use chrono::NaiveDate;
use rusqlite::Connection;
use terminal_storage_kpi::api::{ApiError, DashboardApi};
use terminal_storage_kpi::domain::{ContainerRecord, DelayBucket};
use test_helpers::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// initialeta 为 2024-05-01，etaport 晚 delay_days 天
fn delayed(id: &str, delay_days: i64, reason: Option<&str>) -> ContainerRecord {
    let initial = date(2024, 5, 1);
    let port = initial + chrono::Duration::days(delay_days);
    ContainerRecord {
        container: Some(id.to_string()),
        initial_eta: Some(initial.format("%Y-%m-%d").to_string()),
        eta_port: Some(port.format("%Y-%m-%d 00:00:00").to_string()),
        vessel_delay_reason: reason.map(str::to_string),
        ..Default::default()
    }
}

fn shipment(id: &str, modality: &str, eta_port: &str, appointment: &str) -> ContainerRecord {
    ContainerRecord {
        container: Some(id.to_string()),
        modality: Some(modality.to_string()),
        destination_port: Some("MANZANILLO".to_string()),
        eta_port: Some(eta_port.to_string()),
        terminal_appointment: Some(appointment.to_string()),
        ..Default::default()
    }
}

fn seeded_api() -> (tempfile::NamedTempFile, DashboardApi) {
    let (tmp, db_path) = create_test_db().unwrap();
    {
        let conn = Connection::open(&db_path).unwrap();
        insert_records(
            &conn,
            "table1",
            &[
                delayed("D1", 1, Some("Weather")),
                delayed("D3", 3, Some("Weather")),
                delayed("D4", 4, Some("")),
                delayed("D7", 7, Some("Berth")),
                delayed("D8", 8, None),
                delayed("D0", 0, Some("Weather")),
            ],
        )
        .unwrap();
        insert_records(
            &conn,
            "table2",
            &[
                shipment("T1", "TRUCK", "2024-06-20", ""),
                shipment("T2", "TRUCK", "2024-06-01", "2024-06-10"),
                shipment("T3", "TRUCK", "2024-06-01", "2024-06-11"),
                shipment("T4", "TRUCK", "2024-06-01", "2024-06-09"),
                shipment("R1", "RAIL", "2024-06-01", "2024-06-10"),
            ],
        )
        .unwrap();
    }
    let api = DashboardApi::open(&db_path).unwrap();
    (tmp, api)
}

#[test]
fn test_vessel_delay_summary() {
    let (_tmp, api) = seeded_api();

    let summary = api.vessel_delay_summary("WM").unwrap();
    assert_eq!(summary.delayed_count, 5);
    assert!(approx(summary.average_delay_days, (1 + 3 + 4 + 7 + 8) as f64 / 5.0));

    let none = api.vessel_delay_summary("AC").unwrap();
    assert_eq!(none.delayed_count, 0);
    assert_eq!(none.average_delay_days, 0.0);
}

#[test]
fn test_delay_pivot_bucket_boundaries() {
    let (_tmp, api) = seeded_api();

    assert_eq!(api.delay_months("table1").unwrap(), vec![ym(2024, 5)]);

    let pivot = api.delay_reason_pivot("WM", ym(2024, 5)).unwrap().unwrap();
    assert_eq!(pivot.reasons, vec!["Berth", "Others", "Weather"]);

    // 1 天、3 天
    let short = pivot.row(DelayBucket::UpToThree).unwrap();
    assert_eq!(short.counts["Weather"], 2);
    assert_eq!(short.total, 2);
    // 4 天（空白原因）、7 天
    let mid = pivot.row(DelayBucket::FourToSeven).unwrap();
    assert_eq!(mid.counts["Others"], 1);
    assert_eq!(mid.counts["Berth"], 1);
    assert_eq!(mid.counts["Weather"], 0);
    assert_eq!(mid.total, 2);
    // 8 天（无原因）
    let long = pivot.row(DelayBucket::MoreThanSeven).unwrap();
    assert_eq!(long.counts["Others"], 1);
    assert_eq!(long.total, 1);

    assert_eq!(pivot.reason_totals["Others"], 2);
    assert_eq!(pivot.total, 5);

    assert!(api.delay_reason_pivot("WM", ym(2024, 6)).unwrap().is_none());
}

#[test]
fn test_modality_port_status() {
    let (_tmp, api) = seeded_api();
    let today = date(2024, 6, 10);

    let truck = api
        .modality_port_status("AC", "TRUCK", "MANZANILLO", today)
        .unwrap()
        .unwrap();
    assert_eq!(truck.total, 4);
    assert_eq!(truck.pre_arrival, 1);
    assert_eq!(truck.today_export, 1);
    assert_eq!(truck.remaining, 1);

    assert!(api
        .modality_port_status("AC", "TRUCK", "LZO", today)
        .unwrap()
        .is_none());

    let overview = api.modality_overview("AC", today).unwrap();
    assert_eq!(overview.len(), 2);
    assert_eq!(overview[0].modality, "TRUCK");
    assert_eq!(overview[1].modality, "RAIL");
    assert_eq!(overview[1].today_export, 1);

    assert_eq!(api.destination_ports("AC").unwrap(), vec!["MANZANILLO"]);

    assert!(matches!(
        api.modality_port_status("AC", " ", "MANZANILLO", today),
        Err(ApiError::InvalidInput(_))
    ));
}
