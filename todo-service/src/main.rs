use anyhow::Context;
use todo_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config)?;

    tracing::info!(
        service = %config.service.name,
        environment = %config.service.environment,
        "Starting service"
    );

    #[cfg(feature = "database")]
    if let Some(db_config) = config.database.clone() {
        let pool = todo_service::database::create_pool(&db_config).await?;
        todo_service::database::run_migrations(&pool).await?;
        return run(config, PgStorage::new(pool)).await;
    }

    #[cfg(not(feature = "database"))]
    if config.database.is_some() {
        tracing::warn!(
            "Database configured but the `database` feature is disabled; using in-memory storage"
        );
    }

    tracing::info!("Using in-memory storage");
    run(config, MemoryStorage::new()).await
}

async fn run<S: Storage>(config: Config, storage: S) -> anyhow::Result<()> {
    let state = AppState::new(config.clone(), storage)?;
    let app = router(state).context("failed to build router")?;

    Server::new(config).serve(app).await?;

    Ok(())
}
