//! # 配置管理模块
//!
//! 处理应用配置加载与验证

mod app_config;
mod database;

pub use app_config::{AppConfig, AuthConfig, CacheConfig, CacheType, RedisConfig};
pub use database::DatabaseConfig;

use std::env;
use std::path::Path;

use crate::ensure_config;
use crate::error::{PortalError, Result};
use crate::{linfo, logging::{LogComponent, LogStage}};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "PORTAL_CONFIG";

/// bcrypt 允许的计算成本范围
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// 按环境加载配置文件
///
/// 优先读取 `PORTAL_CONFIG`，否则读取 `config/config.{RUST_ENV}.toml`（默认 `dev`）
pub fn load_config_from_env() -> Result<AppConfig> {
    let config_file = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        format!("config/config.{env}.toml")
    });
    load_config(config_file)
}

/// 从指定路径加载并验证配置
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PortalError::config(format!(
            "配置文件不存在: {}",
            path.display()
        )));
    }

    let config_content = std::fs::read_to_string(path).map_err(|e| {
        PortalError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
    })?;

    let config: AppConfig = toml::from_str(&config_content)?;

    // 验证配置的有效性
    validate_config(&config)?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Config,
        "config_loaded",
        &format!("配置加载完成: {}", path.display())
    );

    Ok(config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<()> {
    ensure_config!(!config.database.url.is_empty(), "数据库URL不能为空");
    ensure_config!(
        config.database.max_connections > 0,
        "数据库最大连接数必须大于0"
    );

    match config.cache.cache_type {
        CacheType::Memory => {
            ensure_config!(
                config.cache.redis.is_none(),
                "cache.redis 配置仅在 cache_type = \"redis\" 时可用"
            );
            ensure_config!(
                config.cache.memory_max_entries > 0,
                "内存缓存最大条目数必须大于0"
            );
        }
        CacheType::Redis => {
            let redis = config
                .cache
                .redis
                .as_ref()
                .ok_or_else(|| PortalError::config("cache_type = \"redis\" 时必须提供 cache.redis 配置"))?;
            ensure_config!(!redis.host.is_empty(), "Redis 地址不能为空");
        }
    }

    let auth = &config.auth;
    ensure_config!(
        BCRYPT_COST_RANGE.contains(&auth.bcrypt_cost),
        "bcrypt_cost 必须在 {} 到 {} 之间: {}",
        BCRYPT_COST_RANGE.start(),
        BCRYPT_COST_RANGE.end(),
        auth.bcrypt_cost
    );
    ensure_config!(auth.hash_workers > 0, "hash_workers 必须大于0");
    ensure_config!(!auth.session_user_key.is_empty(), "session_user_key 不能为空");
    ensure_config!(!auth.captcha_key.is_empty(), "captcha_key 不能为空");
    ensure_config!(
        !auth.settings_cache_key.is_empty(),
        "settings_cache_key 不能为空"
    );

    auth.defaults
        .validate()
        .map_err(|e| PortalError::config_with_source("auth.defaults 不合法", e))?;

    Ok(())
}
