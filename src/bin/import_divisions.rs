// 批量重载事业部数据（Excel 多工作表或单事业部 CSV）
//
// Usage:
//   import_divisions <db_path> <file> [division]
//
// 人工固定行（Fixed = 'F'）在重载中保留。

use anyhow::{bail, Context};
use terminal_storage_kpi::api::import_into;
use terminal_storage_kpi::config::ConfigManager;
use terminal_storage_kpi::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let (Some(db_path), Some(file)) = (args.next(), args.next()) else {
        bail!("用法: import_divisions <db_path> <file> [division]");
    };
    let division = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let registry = ConfigManager::new(&db_path)
        .and_then(|manager| manager.division_registry())
        .with_context(|| format!("无法读取事业部注册表: {}", db_path))?;

    let report = import_into(&db_path, &registry, &file, division.as_deref())?;

    for stats in &report.divisions {
        println!(
            "{} ({}): deleted={} preserved={} inserted={}",
            stats.display_name, stats.division, stats.deleted, stats.preserved, stats.inserted
        );
    }
    if !report.skipped_sheets.is_empty() {
        println!("skipped sheets: {}", report.skipped_sheets.join(", "));
    }
    println!("batch_id={} total_inserted={}", report.batch_id, report.total_inserted());
    Ok(())
}
