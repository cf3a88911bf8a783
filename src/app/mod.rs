//! # 应用装配
//!
//! 通过显式依赖注入组装认证子系统，组件之间不通过全局状态互相查找

pub mod context;

pub use context::AuthCore;
