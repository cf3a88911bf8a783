//! # 数据库模块
//!
//! 数据库连接和迁移管理

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::{lerror, linfo, logging::{LogComponent, LogStage}};

/// 按配置初始化数据库连接
///
/// SQLite 内存库的每个连接都是独立的数据库，因此强制使用单连接
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let url = config.get_connection_url()?;
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "connect_database",
        &format!("正在连接数据库: {}", redact_url(&url))
    );

    let max_connections = if config.is_memory_database() {
        1
    } else {
        config.max_connections
    };

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "database_connected",
        "数据库连接成功"
    );
    Ok(db)
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> std::result::Result<(), DbErr> {
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "run_migrations",
        "开始运行数据库迁移..."
    );

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Database,
                "migrations_done",
                "数据库迁移完成"
            );
            Ok(())
        }
        Err(e) => {
            lerror!(
                "system",
                LogStage::Startup,
                LogComponent::Database,
                "migrations_failed",
                &format!("数据库迁移失败: {e}")
            );
            Err(e)
        }
    }
}

/// 日志中隐藏连接串里的密码
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:***@{host}")
        }
        None => url.to_string(),
    }
}
