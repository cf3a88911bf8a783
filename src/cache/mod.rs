//! # 缓存模块
//!
//! 键值缓存抽象、内存/Redis 两种后端以及基于 JSON 的读取或填充操作

pub mod keys;
pub mod manager;
pub mod memory;
pub mod redis_cache;
pub mod store;

pub use keys::{CacheKey, CacheKeyBuilder};
pub use manager::{CacheManager, CacheSlot, Populate};
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use store::CacheStore;

use std::sync::Arc;

use crate::config::{CacheConfig, CacheType};
use crate::error::{PortalError, Result};
use crate::{linfo, logging::{LogComponent, LogStage}};

/// 根据配置创建缓存后端
pub async fn build_cache_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>> {
    match config.cache_type {
        CacheType::Memory => {
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Cache,
                "use_memory_cache",
                &format!("使用内存缓存，最大条目数: {}", config.memory_max_entries)
            );
            Ok(Arc::new(MemoryCache::new(config.memory_max_entries)))
        }
        CacheType::Redis => {
            let redis_config = config
                .redis
                .as_ref()
                .ok_or_else(|| PortalError::cache("Redis 缓存配置缺失"))?;
            let cache = RedisCache::connect(redis_config).await?;
            cache.ping().await?;
            Ok(Arc::new(cache))
        }
    }
}
