// ==========================================
// 码头堆存费用 KPI 系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有值使用参数化绑定，表名先校验再加引号
// ==========================================

pub mod container_repo;
pub mod data_source;
pub mod error;
pub mod update_log_repo;

// 重导出核心仓储
pub use container_repo::{SqliteContainerRepository, DIVISION_COLUMNS};
pub use data_source::{ContainerDataSource, ContainerQuery, InMemoryDataSource};
pub use error::{RepositoryError, RepositoryResult};
pub use update_log_repo::DivisionUpdateLogRepository;
