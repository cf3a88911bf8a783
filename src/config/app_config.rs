//! # 应用配置结构定义

use serde::{Deserialize, Serialize};

use crate::settings::SettingsSnapshot;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 数据库配置
    pub database: super::DatabaseConfig,
    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
    /// 认证配置
    #[serde(default)]
    pub auth: AuthConfig,
}

/// 缓存类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// 内存缓存
    #[default]
    Memory,
    /// Redis缓存
    Redis,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 缓存类型
    #[serde(default)]
    pub cache_type: CacheType,
    /// 内存缓存最大条目数
    #[serde(default = "default_memory_max_entries")]
    pub memory_max_entries: usize,
    /// Redis 缓存配置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis: Option<RedisConfig>,
}

const fn default_memory_max_entries() -> usize {
    10000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::Memory,
            memory_max_entries: default_memory_max_entries(),
            redis: None,
        }
    }
}

/// Redis配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// 服务器地址
    pub host: String,
    /// 服务器端口
    pub port: u16,
    /// 数据库编号
    pub database: u8,
    /// 连接密码（可选）
    pub password: Option<String>,
    /// 连接超时时间（秒）
    pub connection_timeout: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 0,
            password: None,
            connection_timeout: 10,
        }
    }
}

impl RedisConfig {
    /// 构建 Redis 连接 URL
    #[must_use]
    pub fn build_url(&self) -> String {
        if let Some(password) = &self.password {
            format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.database
            )
        } else {
            format!("redis://{}:{}/{}", self.host, self.port, self.database)
        }
    }
}

/// 认证相关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 会话中保存登录用户 ID 的键
    pub session_user_key: String,
    /// 会话中保存验证码答案的键
    pub captcha_key: String,
    /// 系统设置在缓存中的键
    pub settings_cache_key: String,
    /// bcrypt 计算成本
    pub bcrypt_cost: u32,
    /// 同时进行的密码哈希计算数量上限
    pub hash_workers: usize,
    /// 首次读取系统设置时写入的默认值
    pub defaults: SettingsSnapshot,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_user_key: "current_user".to_string(),
            captcha_key: "captcha_str".to_string(),
            settings_cache_key: "custom_app_settings".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            hash_workers: 4,
            defaults: SettingsSnapshot::default(),
        }
    }
}
