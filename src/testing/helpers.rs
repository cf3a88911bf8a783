//! # 测试辅助函数
//!
//! 内存 SQLite + 内存缓存组装的认证核心，以及只提供系统设置的离线版本

use sea_orm::DatabaseConnection;
use std::sync::{Arc, Mutex, Once};
use tracing::Level;

use crate::app::AuthCore;
use crate::cache::MemoryCache;
use crate::config::{AuthConfig, DatabaseConfig};
use crate::database::{init_database, run_migrations};
use crate::error::Result;
use crate::repository::{MockAuthRepository, SeaOrmRepository};
use crate::settings::SettingsSnapshot;

static INIT: Once = Once::new();

/// 测试使用的 bcrypt 成本，取允许的最小值
pub const TEST_BCRYPT_COST: u32 = 4;

/// 初始化测试日志
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 创建已完成迁移的内存数据库
pub async fn create_test_db() -> Result<DatabaseConnection> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    let db = init_database(&config).await?;
    run_migrations(&db).await?;
    Ok(db)
}

/// 测试用认证配置
#[must_use]
pub fn test_auth_config(defaults: SettingsSnapshot) -> AuthConfig {
    AuthConfig {
        bcrypt_cost: TEST_BCRYPT_COST,
        hash_workers: 2,
        defaults,
        ..AuthConfig::default()
    }
}

/// 测试上下文
pub struct TestContext {
    pub core: AuthCore,
    pub cache: Arc<MemoryCache>,
    pub db: Option<DatabaseConnection>,
}

impl TestContext {
    /// 使用默认系统设置
    pub async fn new() -> Self {
        Self::with_defaults(SettingsSnapshot::default()).await
    }

    /// 使用指定的系统设置默认值，数据库为内存 SQLite
    pub async fn with_defaults(defaults: SettingsSnapshot) -> Self {
        init_test_env();
        let db = create_test_db().await.expect("创建测试数据库失败");
        let cache = Arc::new(MemoryCache::new(1024));
        let core = AuthCore::new(
            cache.clone(),
            Arc::new(SeaOrmRepository::new(db.clone())),
            test_auth_config(defaults),
        );
        Self {
            core,
            cache,
            db: Some(db),
        }
    }

    /// 不连接数据库，存储后端只响应系统设置的读写
    ///
    /// 用于暂停时钟的测试：SQLite 驱动运行在独立线程上，时钟自动推进会干扰连接池
    #[must_use]
    pub fn offline(defaults: SettingsSnapshot) -> Self {
        init_test_env();
        let stored = Arc::new(Mutex::new(defaults));
        let mut repository = MockAuthRepository::new();
        let current = stored.clone();
        repository
            .expect_load_or_init_settings()
            .returning(move |_| Ok(current.lock().expect("设置锁中毒").clone()));
        repository
            .expect_apply_settings_patch()
            .returning(move |patch, _| {
                let mut current = stored.lock().expect("设置锁中毒");
                let merged = patch.apply_to(&current);
                merged.validate()?;
                *current = merged.clone();
                Ok(merged)
            });

        let cache = Arc::new(MemoryCache::new(1024));
        let core = AuthCore::new(
            cache.clone(),
            Arc::new(repository),
            test_auth_config(SettingsSnapshot::default()),
        );
        Self {
            core,
            cache,
            db: None,
        }
    }
}

/// 断言认证错误类型
#[macro_export]
macro_rules! assert_auth_error {
    ($result:expr, $expected:pat) => {
        match $result {
            Err(err) => match err.as_auth() {
                Some($expected) => (),
                other => panic!("认证错误类型不符: {:?}", other),
            },
            Ok(_) => panic!("期望认证错误，实际成功"),
        }
    };
}
