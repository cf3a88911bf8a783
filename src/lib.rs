//! # Portal Auth
//!
//! 后台管理门户的认证与访问控制核心：登录失败锁定、会话守卫、
//! 基于角色的权限解析以及系统设置

pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod repository;
pub mod settings;
pub mod testing;

// Re-export commonly used types
pub use app::AuthCore;
pub use config::AppConfig;
pub use error::{AuthError, PortalError, Result};
