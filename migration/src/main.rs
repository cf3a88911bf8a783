use sea_orm_migration::prelude::*;
use std::env;

fn main() {
    // 如果没有设置 DATABASE_URL 环境变量，则默认设置为 data/dev.db
    if env::var("DATABASE_URL").is_err() {
        let in_migration_dir = env::current_dir()
            .map(|dir| dir.ends_with("migration"))
            .unwrap_or(false);
        let db_path = if in_migration_dir {
            "../data/dev.db"
        } else {
            "data/dev.db"
        };
        // SAFETY: 此时异步运行时尚未创建，进程中只有主线程，没有并发读取环境变量
        unsafe {
            env::set_var("DATABASE_URL", format!("sqlite://{db_path}"));
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("创建异步运行时失败: {e}");
            std::process::exit(1);
        }
    };
    runtime.block_on(cli::run_cli(migration::Migrator));
}
