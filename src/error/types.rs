//! # 错误类型定义

use thiserror::Error;

use super::{AuthError, ErrorCategory, PasswordPolicyError, SettingsError};

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum PortalError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 缓存相关错误
    #[error("缓存错误: {message}")]
    Cache {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 认证与授权的预期结果
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// 系统设置校验失败
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// 密码不满足当前策略
    #[error(transparent)]
    Password(#[from] PasswordPolicyError),

    /// 附带上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<PortalError>,
    },
}

impl PortalError {
    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建缓存错误
    pub fn cache<T: Into<String>>(message: T) -> Self {
        Self::Cache {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的缓存错误
    pub fn cache_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Cache {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 错误归类
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(_) | Self::Settings(_) | Self::Password(_) => ErrorCategory::Client,
            Self::Context { source, .. } => source.category(),
            _ => ErrorCategory::Server,
        }
    }

    /// 是否为预期的策略结果（而非基础设施故障）
    #[must_use]
    pub fn is_policy(&self) -> bool {
        self.category() == ErrorCategory::Client
    }

    /// 剥离上下文后返回认证类错误
    #[must_use]
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Self::Auth(err) => Some(err),
            Self::Context { source, .. } => source.as_auth(),
            _ => None,
        }
    }

    /// 剥离上下文后返回设置校验错误
    #[must_use]
    pub fn as_settings(&self) -> Option<&SettingsError> {
        match self {
            Self::Settings(err) => Some(err),
            Self::Context { source, .. } => source.as_settings(),
            _ => None,
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for PortalError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<sea_orm::error::DbErr> for PortalError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::database_with_source("数据库操作失败", err)
    }
}

// Redis错误转换
impl From<redis::RedisError> for PortalError {
    fn from(err: redis::RedisError) -> Self {
        Self::cache_with_source("Redis操作失败", err)
    }
}

// Bcrypt错误转换
impl From<bcrypt::BcryptError> for PortalError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::internal_with_source("密码处理失败", err)
    }
}

impl From<tokio::task::JoinError> for PortalError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal_with_source("后台任务执行失败", err)
    }
}
