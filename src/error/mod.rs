//! # 统一错误处理
//!
//! 基础设施故障（缓存、数据库、配置）与预期的策略结果（未登录、锁定、参数越界）分开建模

use std::fmt::Display;

pub use auth::{AuthError, PermissionDecision};
pub use settings::{PasswordPolicyError, SettingsError};
pub use types::PortalError;

/// 全局统一的 `Result` 类型
pub type Result<T> = std::result::Result<T, PortalError>;

pub mod auth;
pub mod macros;
pub mod settings;
pub mod types;

/// 为错误附加上下文信息
pub trait Context<T, E> {
    /// 使用固定的上下文信息包装错误
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display;

    /// 惰性构造上下文信息，仅在出错时求值
    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<PortalError>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display,
    {
        self.with_context(|| context)
    }

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(PortalError::Context {
                context: context().to_string(),
                source: Box::new(error.into()),
            }),
        }
    }
}

/// 错误归类，供调用方决定如何呈现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 由调用方输入或当前会话状态引起，可在边界层转换为提示或重定向
    Client,
    /// 由服务端或其依赖（缓存、数据库）引起
    Server,
}

#[cfg(test)]
mod tests;
