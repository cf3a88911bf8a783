//! # 缓存管理器
//!
//! 在字节后端之上提供 JSON 读写，以及“先告知未命中、再由调用方填充”的读取或填充操作。
//!
//! 经过读取或填充的键会登记失效代数，之后每次删除或覆盖都推进代数。未命中时记录当时的
//! 代数，填充前代数已变化说明期间有写入提交，读到的数据可能已过时，此时只返回值而不写缓存。
//! 只按键直接读写的数据（会话、登录失败计数）不登记代数

use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use super::keys::CacheKey;
use super::store::CacheStore;
use crate::error::{PortalError, Result};
use crate::{ldebug, lwarn, logging::{LogComponent, LogStage}};

/// 缓存管理器
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    epochs: Arc<DashMap<String, u64>>,
}

/// 读取或填充的结果
///
/// 未命中时调用方拿到 [`Populate`]，只有在此之后才去读取数据源
pub enum CacheSlot<'a, T> {
    /// 缓存命中
    Hit(T),
    /// 缓存未命中，可以填充
    Miss(Populate<'a, T>),
}

/// 未命中键的填充句柄
#[must_use = "未命中的缓存需要调用 fill 填充，或显式丢弃"]
pub struct Populate<'a, T> {
    manager: &'a CacheManager,
    key: String,
    epoch: u64,
    _marker: PhantomData<fn(T)>,
}

impl<T: Serialize> Populate<'_, T> {
    /// 缓存键
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 写入缓存并原样返回值；未命中之后该键已被失效时不写缓存
    pub async fn fill(self, value: T, ttl: Option<Duration>) -> Result<T> {
        if self.manager.epoch(&self.key) != self.epoch {
            ldebug!(
                "system",
                LogStage::Cache,
                LogComponent::Cache,
                "populate_skipped",
                &format!("读取期间缓存已失效，跳过填充: {}", self.key)
            );
            return Ok(value);
        }
        self.manager.set_json(&self.key, &value, ttl).await?;
        Ok(value)
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("backend", &self.store.backend())
            .finish()
    }
}

impl CacheManager {
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            epochs: Arc::new(DashMap::new()),
        }
    }

    fn epoch(&self, key: &str) -> u64 {
        self.epochs.get(key).map_or(0, |epoch| *epoch)
    }

    fn register_epoch(&self, key: &str) -> u64 {
        *self.epochs.entry(key.to_string()).or_insert(0)
    }

    fn advance_epoch(&self, key: &str) {
        if let Some(mut epoch) = self.epochs.get_mut(key) {
            *epoch += 1;
        }
    }

    /// 底层缓存后端
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// 读取 JSON 值；无法反序列化的旧数据视为未命中
    pub async fn get_json<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(bytes) = self.store.get(key).await? else {
            ldebug!(
                "system",
                LogStage::Cache,
                LogComponent::Cache,
                "cache_miss",
                &format!("缓存未命中: {key}")
            );
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                lwarn!(
                    "system",
                    LogStage::Cache,
                    LogComponent::Cache,
                    "cache_decode_failed",
                    &format!("缓存值无法解析，按未命中处理: {key}"),
                    error = e.to_string()
                );
                Ok(None)
            }
        }
    }

    /// 写入 JSON 值
    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| PortalError::cache_with_source("序列化缓存值失败", e))?;
        self.store.set(key, bytes, ttl).await
    }

    /// 用提交后的新值覆盖缓存，进行中的填充不会再写回旧值
    pub async fn replace_json<T>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let key = key.build();
        self.advance_epoch(&key);
        self.set_json(&key, value, ttl).await
    }

    /// 删除缓存，进行中的填充不会再写回
    pub async fn delete(&self, key: &CacheKey) -> Result<()> {
        let key_str = key.build();
        self.advance_epoch(&key_str);
        self.store.delete(&key_str).await?;
        ldebug!(
            "system",
            LogStage::Cache,
            LogComponent::Cache,
            "cache_invalidated",
            &format!("缓存已删除: {key}")
        );
        Ok(())
    }

    /// 读取或填充
    pub async fn fetch<T>(&self, key: &CacheKey) -> Result<CacheSlot<'_, T>>
    where
        T: DeserializeOwned,
    {
        let key = key.build();
        let epoch = self.register_epoch(&key);
        Ok(match self.get_json(&key).await? {
            Some(value) => CacheSlot::Hit(value),
            None => CacheSlot::Miss(Populate {
                manager: self,
                key,
                epoch,
                _marker: PhantomData,
            }),
        })
    }

    /// 读取或填充的便捷形式：未命中时执行 `load` 并写回缓存
    pub async fn get_or_populate<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Option<Duration>,
        load: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.fetch(key).await? {
            CacheSlot::Hit(value) => Ok(value),
            CacheSlot::Miss(slot) => {
                let value = load().await?;
                slot.fill(value, ttl).await
            }
        }
    }
}
