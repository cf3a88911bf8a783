//! 集成测试共用的环境搭建

use portal_auth::AuthCore;
use portal_auth::cache::MemoryCache;
use portal_auth::config::{AuthConfig, DatabaseConfig};
use portal_auth::database::{init_database, run_migrations};
use portal_auth::repository::SeaOrmRepository;
use portal_auth::settings::SettingsSnapshot;
use std::sync::Arc;

pub struct Suite {
    pub core: AuthCore,
    pub cache: Arc<MemoryCache>,
}

impl Suite {
    pub async fn setup() -> Self {
        Self::with_defaults(SettingsSnapshot::default()).await
    }

    pub async fn with_defaults(defaults: SettingsSnapshot) -> Self {
        let db = init_database(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        })
        .await
        .expect("连接测试数据库失败");
        run_migrations(&db).await.expect("数据库迁移失败");

        let cache = Arc::new(MemoryCache::new(1024));
        let core = AuthCore::new(
            cache.clone(),
            Arc::new(SeaOrmRepository::new(db)),
            AuthConfig {
                bcrypt_cost: 4,
                defaults,
                ..AuthConfig::default()
            },
        );
        Self { core, cache }
    }
}
