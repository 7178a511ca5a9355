use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    // 未设置 DATABASE_URL 时由 CLI 自身报错提示
    cli::run_cli(migration::Migrator).await;
}
