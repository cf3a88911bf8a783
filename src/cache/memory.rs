//! # 内存缓存
//!
//! 进程内缓存，带条目上限与逐条过期时间。过期时间基于 `tokio::time::Instant`，测试中可以暂停时钟

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::store::CacheStore;
use crate::error::Result;

/// 缓存项
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|t| Instant::now() + t),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }
}

/// 内存缓存实现
pub struct MemoryCache {
    data: DashMap<String, CacheEntry>,
    max_entries: usize,
}

impl MemoryCache {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            data: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// 当前条目数（包含尚未清理的过期项）
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn cleanup_expired(&self) {
        self.data.retain(|_, entry| !entry.is_expired());
    }

    /// 写入新键前确保容量：先清理过期项，仍然已满时淘汰任意一项
    fn ensure_capacity(&self, key: &str) {
        if self.data.contains_key(key) || self.data.len() < self.max_entries {
            return;
        }

        self.cleanup_expired();
        if self.data.len() < self.max_entries {
            return;
        }

        let victim = self.data.iter().next().map(|entry| entry.key().clone());
        if let Some(victim) = victim {
            self.data.remove(&victim);
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let expired = match self.data.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.data.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.ensure_capacity(key);
        self.data.insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        match self.data.get_mut(key) {
            Some(mut entry) if !entry.is_expired() => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        Ok(self.data.get(key).and_then(|entry| {
            if entry.is_expired() {
                return None;
            }
            entry
                .expires_at
                .map(|expires_at| expires_at.saturating_duration_since(Instant::now()))
        }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryCache::new(16);
        cache.set("k", b"v".to_vec(), None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(cache.ttl("k").await.unwrap(), None);

        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        // 删除不存在的键不报错
        cache.delete("k").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new(16);
        cache
            .set("k", b"v".to_vec(), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_rearms_ttl() {
        let cache = MemoryCache::new(16);
        cache
            .set("k", b"v".to_vec(), Some(Duration::from_secs(10)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(cache.expire("k", Duration::from_secs(10)).await.unwrap());

        tokio::time::advance(Duration::from_secs(8)).await;
        assert!(cache.get("k").await.unwrap().is_some());
        assert_eq!(
            cache.ttl("k").await.unwrap(),
            Some(Duration::from_secs(2))
        );

        assert!(!cache.expire("missing", Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_capacity_evicts_when_full() {
        let cache = MemoryCache::new(2);
        cache.set("a", vec![1], None).await.unwrap();
        cache.set("b", vec![2], None).await.unwrap();
        cache.set("c", vec![3], None).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("c").await.unwrap(), Some(vec![3]));

        // 覆盖已有键不触发淘汰
        cache.set("c", vec![4], None).await.unwrap();
        assert_eq!(cache.len(), 2);
    }
}
