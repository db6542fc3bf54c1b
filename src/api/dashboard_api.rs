// ==========================================
// 码头堆存费用 KPI 系统 - 看板 API
// ==========================================
// 职责: 为界面层封装仓储、引擎、导入
// - 输入校验（事业部非空、月份区间合法）
// - 错误统一转换为 ApiError
// - 每个请求记录 info 日志
// 架构: API 层 → Engine 层 → ContainerDataSource
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::{ConfigManager, DashboardConfig};
use crate::config::division_registry::{DivisionEntry, DivisionRegistry};
use crate::db::{open_read_only_with_retry, open_sqlite_connection, RetryPolicy};
use crate::domain::container::ContainerCostLine;
use crate::domain::kpi::{AverageKpiResult, KpiResult, KpiTableRow};
use crate::domain::lead_time::{LeadTimeAnalysis, LeadTimeFilter};
use crate::domain::logistics::{DelayReasonPivot, ModalityPortStatus, VesselDelaySummary};
use crate::domain::storage::{
    ContainerCountRow, CostStatistics, DdRatioRow, MonthComparison, MonthlyAggregate,
    MonthlyStorageSummary,
};
use crate::domain::types::YearMonth;
use crate::engine::{
    DivisionAggregator, KpiScorer, LeadTimeAnalyzer, LogisticsAnalyzer, PeriodAverager,
};
use crate::importer::division_importer::{DivisionImporter, ImportReport};
use crate::repository::container_repo::SqliteContainerRepository;
use crate::repository::data_source::ContainerDataSource;
use crate::repository::update_log_repo::DivisionUpdateLogRepository;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

// ==========================================
// DashboardApi - 看板 API
// ==========================================
pub struct DashboardApi {
    config: DashboardConfig,
    source: Arc<dyn ContainerDataSource>,
    aggregator: Arc<DivisionAggregator>,
    scorer: Arc<KpiScorer>,
    averager: PeriodAverager,
    lead_time: LeadTimeAnalyzer,
    logistics: LogisticsAnalyzer,
    update_log: Option<DivisionUpdateLogRepository>,
    db_path: Option<String>, // 批量重载时以读写方式打开
}

impl DashboardApi {
    /// 打开 SQLite 数据库
    ///
    /// 配置以单次只读探测读取（失败则用默认值），数据连接按配置的重试策略打开
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let config = Self::load_config(db_path);
        let conn = open_read_only_with_retry(db_path, config.retry_policy)?;
        let conn = Arc::new(Mutex::new(conn));

        let source: Arc<dyn ContainerDataSource> =
            Arc::new(SqliteContainerRepository::from_connection(conn.clone()));
        let mut api = Self::from_source(source, config);
        api.update_log = Some(DivisionUpdateLogRepository::from_connection(conn));
        api.db_path = Some(db_path.to_string());

        info!(db_path, divisions = api.config.registry.entries().len(), "看板 API 初始化完成");
        Ok(api)
    }

    fn load_config(db_path: &str) -> DashboardConfig {
        let single_attempt = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        let loaded = open_read_only_with_retry(db_path, single_attempt)
            .and_then(|conn| ConfigManager::from_connection(Arc::new(Mutex::new(conn))))
            .and_then(|manager| manager.load_dashboard_config());
        match loaded {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(db_path, error = %e, "配置读取失败，使用默认配置");
                DashboardConfig::default()
            }
        }
    }

    /// 基于任意数据源构建（界面层已持有记录集或测试）
    pub fn from_source(source: Arc<dyn ContainerDataSource>, config: DashboardConfig) -> Self {
        let aggregator = Arc::new(DivisionAggregator::new(source.clone()));
        let scorer = Arc::new(KpiScorer::new(aggregator.clone(), config.registry.tables()));
        Self {
            averager: PeriodAverager::new(scorer.clone()),
            lead_time: LeadTimeAnalyzer::new(source.clone()),
            logistics: LogisticsAnalyzer::new(source.clone()),
            config,
            source,
            aggregator,
            scorer,
            update_log: None,
            db_path: None,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn registry(&self) -> &DivisionRegistry {
        &self.config.registry
    }

    // ==========================================
    // 输入校验
    // ==========================================

    /// 事业部参数 → 表名（显示名或表名均可）
    fn resolve_division(&self, division: &str) -> ApiResult<String> {
        let trimmed = division.trim();
        if trimmed.is_empty() {
            return Err(ApiError::InvalidInput("事业部不能为空".to_string()));
        }
        Ok(self
            .config
            .registry
            .table_for(trimmed)
            .map(str::to_string)
            .unwrap_or_else(|| trimmed.to_string()))
    }

    fn check_range(start: YearMonth, end: YearMonth) -> ApiResult<()> {
        if start > end {
            return Err(ApiError::InvalidInput(format!(
                "起始月份 {} 晚于结束月份 {}",
                start, end
            )));
        }
        Ok(())
    }

    // ==========================================
    // 事业部
    // ==========================================

    /// 已登记的事业部
    pub fn list_divisions(&self) -> Vec<DivisionEntry> {
        self.config.registry.entries().to_vec()
    }

    /// 数据库中实际存在的事业部表
    pub fn discovered_divisions(&self) -> ApiResult<Vec<String>> {
        Ok(self.source.list_divisions()?)
    }

    // ==========================================
    // 堆存费用汇总
    // ==========================================

    pub fn monthly_storage_data(&self, division: &str) -> ApiResult<Vec<MonthlyAggregate>> {
        let table = self.resolve_division(division)?;
        info!(division = %table, "查询月度堆存费用");
        Ok(self.aggregator.monthly_storage_data(&table)?)
    }

    pub fn container_count(&self, division: &str) -> ApiResult<Vec<ContainerCountRow>> {
        let table = self.resolve_division(division)?;
        info!(division = %table, "查询月度箱量");
        Ok(self.aggregator.container_count(&table)?)
    }

    pub fn individual_storage_data(&self, division: &str) -> ApiResult<Vec<ContainerCostLine>> {
        let table = self.resolve_division(division)?;
        info!(division = %table, "查询单箱费用明细");
        Ok(self.aggregator.individual_storage_data(&table)?)
    }

    pub fn dd_ratio(&self, division: &str) -> ApiResult<Vec<DdRatioRow>> {
        let table = self.resolve_division(division)?;
        info!(division = %table, "查询 DD 比例");
        Ok(self.aggregator.dd_ratio(&table)?)
    }

    pub fn monthly_summary(&self, division: &str) -> ApiResult<Vec<MonthlyStorageSummary>> {
        let table = self.resolve_division(division)?;
        info!(division = %table, "查询月度明细");
        Ok(self.aggregator.monthly_summary(&table)?)
    }

    /// 全部已登记事业部合并
    pub fn combined_monthly_storage_data(&self) -> ApiResult<Vec<MonthlyAggregate>> {
        info!("查询合并月度堆存费用");
        Ok(self
            .aggregator
            .combined_monthly_storage_data(&self.config.registry.tables())?)
    }

    pub fn combined_monthly_summary(&self) -> ApiResult<Vec<MonthlyStorageSummary>> {
        info!("查询合并月度明细");
        Ok(self
            .aggregator
            .combined_monthly_summary(&self.config.registry.tables())?)
    }

    pub fn compare_months(
        &self,
        division: &str,
        first: YearMonth,
        second: YearMonth,
    ) -> ApiResult<Option<MonthComparison>> {
        let table = self.resolve_division(division)?;
        if first == second {
            return Err(ApiError::InvalidInput("请选择两个不同的月份".to_string()));
        }
        info!(division = %table, %first, %second, "两月对比");
        Ok(self.aggregator.compare_months(&table, first, second)?)
    }

    pub fn cost_statistics(
        &self,
        division: &str,
        from: YearMonth,
        to: YearMonth,
    ) -> ApiResult<Option<CostStatistics>> {
        let table = self.resolve_division(division)?;
        Self::check_range(from, to)?;
        info!(division = %table, %from, %to, "单箱费用统计");
        Ok(self.aggregator.cost_statistics(&table, from, to)?)
    }

    /// 预估堆存费用明细（起始年份取配置）
    pub fn estimated_storage(
        &self,
        division: &str,
    ) -> ApiResult<BTreeMap<YearMonth, Vec<ContainerCostLine>>> {
        let table = self.resolve_division(division)?;
        let since_year = self.config.estimate_since_year;
        info!(division = %table, since_year, "查询预估堆存费用");
        Ok(self.aggregator.estimated_storage(&table, since_year)?)
    }

    // ==========================================
    // KPI
    // ==========================================

    pub fn division_kpi(&self, division: &str, month: YearMonth) -> ApiResult<Option<KpiResult>> {
        let table = self.resolve_division(division)?;
        info!(division = %table, %month, "计算事业部 KPI");
        Ok(self.scorer.calculate_division_kpi(&table, month)?)
    }

    /// KPI 看板: 每个已登记事业部一行，无数据的事业部 kpi 为空
    pub fn kpi_table(&self, month: YearMonth) -> ApiResult<Vec<KpiTableRow>> {
        info!(%month, "计算 KPI 看板");
        let mut results = self.scorer.calculate_all(month)?;
        Ok(self
            .config
            .registry
            .entries()
            .iter()
            .map(|entry| KpiTableRow {
                division: entry.table.clone(),
                display_name: entry.display_name.clone(),
                kpi: results.remove(&entry.table).flatten(),
            })
            .collect())
    }

    pub fn average_kpi(
        &self,
        division: &str,
        start: YearMonth,
        end: YearMonth,
    ) -> ApiResult<Option<AverageKpiResult>> {
        let table = self.resolve_division(division)?;
        Self::check_range(start, end)?;
        info!(division = %table, %start, %end, "计算区间平均 KPI");
        Ok(self.averager.average_kpi(&table, start, end)?)
    }

    /// 全部事业部区间平均（无有效月份的事业部省略）
    pub fn average_kpi_all(&self, start: YearMonth, end: YearMonth) -> ApiResult<Vec<AverageKpiResult>> {
        Self::check_range(start, end)?;
        info!(%start, %end, "计算全部事业部区间平均 KPI");
        Ok(self.averager.average_all(start, end)?)
    }

    // ==========================================
    // 起运港前置时间
    // ==========================================

    pub fn unique_origins(&self) -> ApiResult<Vec<String>> {
        info!("查询起运港列表");
        Ok(self.lead_time.unique_origins(&self.config.registry.tables())?)
    }

    pub fn shipping_lines_for_origin(&self, origin: &str) -> ApiResult<Vec<String>> {
        if origin.trim().is_empty() {
            return Err(ApiError::InvalidInput("起运港不能为空".to_string()));
        }
        info!(origin, "查询起运港船公司");
        Ok(self
            .lead_time
            .shipping_lines_for_origin(&self.config.registry.tables(), origin)?)
    }

    pub fn lead_time_analysis(&self, filter: &LeadTimeFilter) -> ApiResult<Option<LeadTimeAnalysis>> {
        if filter.origin.trim().is_empty() {
            return Err(ApiError::InvalidInput("起运港不能为空".to_string()));
        }
        if filter.eta_port_from > filter.eta_port_to {
            return Err(ApiError::InvalidInput(format!(
                "起始日期 {} 晚于结束日期 {}",
                filter.eta_port_from, filter.eta_port_to
            )));
        }
        info!(origin = %filter.origin, "前置时间分析");
        Ok(self
            .lead_time
            .analyze(&self.config.registry.tables(), filter)?)
    }

    // ==========================================
    // 船期延误与运输方式
    // ==========================================

    pub fn vessel_delay_summary(&self, division: &str) -> ApiResult<VesselDelaySummary> {
        let table = self.resolve_division(division)?;
        info!(division = %table, "查询船期延误概况");
        Ok(self.logistics.vessel_delay_summary(&table)?)
    }

    /// 可选的延误月份（按 ETA 港口月份）
    pub fn delay_months(&self, division: &str) -> ApiResult<Vec<YearMonth>> {
        let table = self.resolve_division(division)?;
        Ok(self.logistics.delay_months(&table)?)
    }

    pub fn delay_reason_pivot(
        &self,
        division: &str,
        month: YearMonth,
    ) -> ApiResult<Option<DelayReasonPivot>> {
        let table = self.resolve_division(division)?;
        info!(division = %table, %month, "查询延误原因透视");
        Ok(self.logistics.delay_reason_pivot(&table, month)?)
    }

    pub fn destination_ports(&self, division: &str) -> ApiResult<Vec<String>> {
        let table = self.resolve_division(division)?;
        Ok(self.logistics.destination_ports(&table)?)
    }

    /// 运输方式 + 目的港出运状态（today 由调用方给出）
    pub fn modality_port_status(
        &self,
        division: &str,
        modality: &str,
        destination_port: &str,
        today: NaiveDate,
    ) -> ApiResult<Option<ModalityPortStatus>> {
        let table = self.resolve_division(division)?;
        if modality.trim().is_empty() || destination_port.trim().is_empty() {
            return Err(ApiError::InvalidInput("运输方式和目的港不能为空".to_string()));
        }
        info!(division = %table, modality, destination_port, %today, "查询运输方式出运状态");
        Ok(self
            .logistics
            .modality_port_status(&table, modality, destination_port, today)?)
    }

    pub fn modality_overview(
        &self,
        division: &str,
        today: NaiveDate,
    ) -> ApiResult<Vec<ModalityPortStatus>> {
        let table = self.resolve_division(division)?;
        info!(division = %table, %today, "查询运输方式出运概览");
        Ok(self.logistics.modality_overview(&table, today)?)
    }

    // ==========================================
    // 批量重载
    // ==========================================

    /// 最近一次重载时间（内存数据源始终为 None）
    pub fn last_update_time(&self, division: &str) -> ApiResult<Option<NaiveDateTime>> {
        let table = self.resolve_division(division)?;
        match &self.update_log {
            Some(repo) => Ok(repo.last_update_time(&table)?),
            None => Ok(None),
        }
    }

    /// 从 Excel/CSV 批量重载事业部数据
    pub fn import_file<P: AsRef<Path>>(
        &self,
        file_path: P,
        division: Option<&str>,
    ) -> ApiResult<ImportReport> {
        let Some(db_path) = &self.db_path else {
            return Err(ApiError::InvalidInput("当前数据源不支持导入".to_string()));
        };
        if let Some(d) = division {
            if d.trim().is_empty() {
                return Err(ApiError::InvalidInput("事业部不能为空".to_string()));
            }
        }
        info!(file = %file_path.as_ref().display(), "开始导入");
        Ok(import_into(db_path, &self.config.registry, file_path, division)?)
    }
}

/// 以读写连接执行一次批量重载
pub fn import_into<P: AsRef<Path>>(
    db_path: &str,
    registry: &DivisionRegistry,
    file_path: P,
    division: Option<&str>,
) -> crate::importer::error::ImportResult<ImportReport> {
    let conn = open_sqlite_connection(db_path)?;
    let importer = DivisionImporter::new(Arc::new(Mutex::new(conn)), registry.clone());
    importer.import_file(file_path, division)
}
