//! # 密码哈希
//!
//! bcrypt 计算在阻塞线程池中执行，并通过信号量限制同时进行的计算数量。
//! bcrypt 会静默截断 72 字节之后的输入，超长明文在哈希时被拒绝，校验时视为不匹配

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{PasswordPolicyError, PortalError, Result};

/// bcrypt 实际参与计算的最大字节数
pub const MAX_PASSWORD_BYTES: usize = 72;
use crate::{lwarn, logging::{LogComponent, LogStage}};

/// 密码哈希器
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    permits: Arc<Semaphore>,
}

impl PasswordHasher {
    /// `workers` 为同时进行的哈希计算上限
    #[must_use]
    pub fn new(cost: u32, workers: usize) -> Self {
        Self {
            cost,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    async fn run_blocking<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| PortalError::internal_with_source("密码哈希工作池已关闭", e))?;
        Ok(tokio::task::spawn_blocking(task).await?)
    }

    /// 计算密码哈希
    pub async fn hash(&self, plaintext: &str) -> Result<String> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordPolicyError::TooManyBytes {
                max: MAX_PASSWORD_BYTES,
            }
            .into());
        }
        let plaintext = plaintext.to_owned();
        let cost = self.cost;
        let digest = self
            .run_blocking(move || bcrypt::hash(plaintext, cost))
            .await??;
        Ok(digest)
    }

    /// 校验密码；哈希格式非法或明文超过 72 字节时视为不匹配
    pub async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        let verified = self
            .run_blocking(move || bcrypt::verify(plaintext, &digest))
            .await?;

        match verified {
            Ok(matched) => Ok(matched),
            Err(e) => {
                lwarn!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Password,
                    "invalid_digest",
                    "存储的密码哈希无法解析，按校验失败处理",
                    error = e.to_string()
                );
                Ok(false)
            }
        }
    }

    /// 哈希的计算成本与当前配置不同（或无法解析）时需要重新哈希
    #[must_use]
    pub fn needs_rehash(&self, digest: &str) -> bool {
        !digest
            .parse::<bcrypt::HashParts>()
            .is_ok_and(|parts| parts.get_cost() == self.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4, 2)
    }

    #[tokio::test]
    async fn test_hash_and_verify_roundtrip() {
        let hasher = hasher();
        let digest = hasher.hash("Passw0rd!").await.unwrap();

        assert_ne!(digest, "Passw0rd!");
        assert!(hasher.verify("Passw0rd!", &digest).await.unwrap());
        assert!(!hasher.verify("passw0rd!", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let hasher = hasher();
        let first = hasher.hash("same").await.unwrap();
        let second = hasher.hash("same").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_input_beyond_bcrypt_limit() {
        let hasher = hasher();
        let prefix = "a".repeat(MAX_PASSWORD_BYTES);
        let longer = format!("{prefix}b");
        let digest = hasher.hash(&prefix).await.unwrap();

        assert!(hasher.verify(&prefix, &digest).await.unwrap());
        assert!(!hasher.verify(&longer, &digest).await.unwrap());

        let err = hasher.hash(&longer).await.unwrap_err();
        assert!(matches!(
            err,
            PortalError::Password(PasswordPolicyError::TooManyBytes { max: 72 })
        ));
        assert!(err.is_policy());
    }

    #[tokio::test]
    async fn test_limit_counts_bytes_not_chars() {
        // 每个汉字占 3 字节，25 个即 75 字节
        let err = hasher().hash(&"密".repeat(25)).await.unwrap_err();
        assert!(matches!(
            err,
            PortalError::Password(PasswordPolicyError::TooManyBytes { .. })
        ));
        assert!(hasher().hash(&"密".repeat(24)).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_digest_does_not_match() {
        assert!(!hasher().verify("anything", "not-a-bcrypt-hash").await.unwrap());
    }

    #[tokio::test]
    async fn test_needs_rehash_on_cost_change() {
        let digest = hasher().hash("secret").await.unwrap();
        assert!(!hasher().needs_rehash(&digest));
        assert!(PasswordHasher::new(5, 1).needs_rehash(&digest));
        assert!(hasher().needs_rehash("garbage"));
    }

    #[tokio::test]
    async fn test_concurrent_hashing_is_bounded() {
        let hasher = PasswordHasher::new(4, 1);
        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let hasher = hasher.clone();
                tokio::spawn(async move { hasher.hash(&format!("pw-{i}")).await })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(hasher.permits.available_permits(), 1);
    }
}
