//! # Redis 缓存客户端
//!
//! 基于 `ConnectionManager` 的 Redis 后端，连接断开后自动重连

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;

use super::store::CacheStore;
use crate::config::RedisConfig;
use crate::error::{PortalError, Result};
use crate::{ldebug, linfo, logging::{LogComponent, LogStage}};

/// Redis 缓存实现
#[derive(Clone)]
pub struct RedisCache {
    connection_manager: ConnectionManager,
}

impl RedisCache {
    /// 连接 Redis 服务器
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Cache,
            "connect_to_redis",
            &format!("正在连接 Redis 服务器: {}:{}", config.host, config.port)
        );

        let client = Client::open(config.build_url())
            .map_err(|e| PortalError::cache_with_source("创建 Redis 客户端失败", e))?;

        let timeout = Duration::from_secs(config.connection_timeout.max(1));
        let connection_manager = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                PortalError::cache(format!(
                    "连接 Redis 超时（{}秒）",
                    config.connection_timeout
                ))
            })?
            .map_err(|e| PortalError::cache_with_source("建立 Redis 连接失败", e))?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Cache,
            "redis_connected",
            "Redis 连接建立成功"
        );

        Ok(Self { connection_manager })
    }

    /// 检查连接可用性，启动时在创建缓存后端后调用一次
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| PortalError::cache_with_source("Redis PING失败", e))?;
        Ok(())
    }
}

/// Redis 过期时间以秒为单位，不足一秒按一秒计
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection_manager.clone();
        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| PortalError::cache_with_source(format!("获取缓存失败: {key}"), e))?;

        ldebug!(
            "system",
            LogStage::Cache,
            LogComponent::Cache,
            "get_cache",
            &format!("获取缓存: key={key}, hit={}", value.is_some())
        );
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl_seconds(ttl)).await,
            None => conn.set::<_, _, ()>(key, value).await,
        }
        .map_err(|e| PortalError::cache_with_source(format!("设置缓存失败: {key}"), e))?;

        ldebug!(
            "system",
            LogStage::Cache,
            LogComponent::Cache,
            "set_cache",
            &format!("设置缓存: key={key}, ttl={ttl:?}")
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| PortalError::cache_with_source(format!("删除缓存失败: {key}"), e))?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection_manager.clone();
        let secs = i64::try_from(ttl_seconds(ttl)).unwrap_or(i64::MAX);
        let updated: bool = conn
            .expire(key, secs)
            .await
            .map_err(|e| PortalError::cache_with_source(format!("设置过期时间失败: {key}"), e))?;
        Ok(updated)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.connection_manager.clone();
        let secs: i64 = conn
            .ttl(key)
            .await
            .map_err(|e| PortalError::cache_with_source(format!("获取过期时间失败: {key}"), e))?;
        // -2 表示键不存在，-1 表示未设置过期
        Ok(u64::try_from(secs).ok().map(Duration::from_secs))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
