// ==========================================
// 码头堆存费用 KPI 系统 - 命令行入口
// ==========================================
// 用法:
//   terminal-storage-kpi [db_path] [YYYY-MM]
// 输出: 指定月份（默认上一个自然月）的 KPI 看板 JSON
// ==========================================

use anyhow::{anyhow, Context};
use chrono::Local;
use terminal_storage_kpi::config::get_default_db_path;
use terminal_storage_kpi::{logging, DashboardApi, YearMonth};

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    let month = match args.next() {
        Some(raw) => raw
            .parse::<YearMonth>()
            .map_err(|e| anyhow!("月份参数非法: {}", e))?,
        None => YearMonth::from_date(Local::now().date_naive()).prev_month(),
    };

    tracing::info!("==================================================");
    tracing::info!("{} v{}", terminal_storage_kpi::APP_NAME, terminal_storage_kpi::VERSION);
    tracing::info!(db_path = %db_path, %month, "生成 KPI 看板");
    tracing::info!("==================================================");

    let api = DashboardApi::open(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;
    let table = api.kpi_table(month)?;

    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}
