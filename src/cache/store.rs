//! # 缓存抽象层
//!
//! 所有后端只处理字节，序列化由 [`super::CacheManager`] 负责，以便 trait 可以作为 `dyn` 使用

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// 缓存后端抽象
///
/// 不提供跨键原子性，也不提供比较并交换；并发填充同一个键时后写入者生效
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 获取缓存值，不存在或已过期时返回 `None`
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// 设置缓存值；`ttl` 为 `None` 表示永不过期
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// 删除缓存值，键不存在时不报错
    async fn delete(&self, key: &str) -> Result<()>;

    /// 重新设置过期时间，返回键是否存在
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// 剩余存活时间；键不存在或未设置过期时返回 `None`
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// 后端名称，用于日志
    fn backend(&self) -> &'static str;
}
