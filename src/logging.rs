//! # 日志配置模块
//!
//! 统一的结构化日志宏与订阅器初始化。每条日志携带 `request_id`、`stage`、`component`、`operation` 字段

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStage {
    Startup,
    Cache,
    Database,
    Authentication,
    Authorization,
    Session,
    Settings,
    Shutdown,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Cache => "cache",
            Self::Database => "database",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::Session => "session",
            Self::Settings => "settings",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogComponent {
    Main,
    Cache,
    Database,
    Settings,
    LoginLock,
    Session,
    Permission,
    Password,
    Config,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Cache => "cache",
            Self::Database => "database",
            Self::Settings => "settings",
            Self::LoginLock => "login_lock",
            Self::Session => "session",
            Self::Permission => "permission",
            Self::Password => "password",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __portal_log {
    ($level:ident, $request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::$level!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = ?$value,)*
            "{}",
            $message
        )
    };
}

/// 结构化 info 日志
#[macro_export]
macro_rules! linfo {
    ($($tt:tt)*) => { $crate::__portal_log!(info, $($tt)*) };
}

/// 结构化 debug 日志
#[macro_export]
macro_rules! ldebug {
    ($($tt:tt)*) => { $crate::__portal_log!(debug, $($tt)*) };
}

/// 结构化 warn 日志
#[macro_export]
macro_rules! lwarn {
    ($($tt:tt)*) => { $crate::__portal_log!(warn, $($tt)*) };
}

/// 结构化 error 日志
#[macro_export]
macro_rules! lerror {
    ($($tt:tt)*) => { $crate::__portal_log!(error, $($tt)*) };
}

/// 初始化日志系统
///
/// `RUST_LOG` 优先；未设置时使用传入级别，并关闭 SQLx 的逐条查询日志
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let default_filter = format!("{level},portal_auth=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // 重复初始化（例如多个测试）时保持静默
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if env::var("RUST_LOG").is_ok_and(|v| v.contains("sqlx::query=info") || v.contains("sqlx::query=debug")) {
        tracing::info!("SQLx 查询日志已开启");
    }
}
