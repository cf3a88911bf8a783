//! # 数据库配置

use crate::error::{PortalError, Result};
use crate::{linfo, logging::{LogComponent, LogStage}};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库URL
    pub url: String,
    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/portal.db".to_string(),
            max_connections: default_max_connections(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// 确保数据库路径存在（仅对SQLite文件数据库）
    pub fn ensure_database_path(&self) -> Result<()> {
        if !self.is_sqlite() || self.is_memory_database() {
            return Ok(());
        }

        let path_str = self.url.strip_prefix("sqlite://").unwrap_or(&self.url);
        let path_str = path_str.split('?').next().unwrap_or(path_str);
        let db_path = Path::new(path_str);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PortalError::config_with_source(
                        format!("无法创建数据库目录: {}", parent.display()),
                        e,
                    )
                })?;

                linfo!(
                    "system",
                    LogStage::Startup,
                    LogComponent::Database,
                    "create_db_dir",
                    &format!("创建数据库目录: {}", parent.display())
                );
            }
        }

        Ok(())
    }

    /// 获取准备好的数据库连接字符串
    ///
    /// SQLite 文件库追加 `mode=rwc`，首次连接时自动创建文件
    pub fn get_connection_url(&self) -> Result<String> {
        self.ensure_database_path()?;
        if self.is_sqlite() && !self.is_memory_database() && !self.url.contains('?') {
            return Ok(format!("{}?mode=rwc", self.url));
        }
        Ok(self.url.clone())
    }

    /// 检查是否为内存数据库
    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// 检查是否为SQLite数据库
    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }
}
