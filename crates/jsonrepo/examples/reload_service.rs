//! Example: polling several documents from one tokio service.
//!
//! Run with:
//!   `RUST_LOG=jsonrepo=debug cargo run --example reload_service --features async`

use std::sync::Arc;
use std::time::Duration;

use jsonrepo::provider::JsonRepositoryProvider;
use jsonrepo::repository::InMemoryRepository;
use jsonrepo::source::RepositorySource;
use jsonrepo::watch::ReloadService;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

fn source(repo: &Arc<InMemoryRepository>, key: &str) -> Arc<JsonRepositoryProvider> {
    Arc::new(JsonRepositoryProvider::new(
        RepositorySource::new(key)
            .repository(Arc::clone(repo) as _)
            .reload_on_change(true)
            .change_check_interval(Duration::from_millis(200)),
    ))
}

#[tokio::main]
async fn main() -> jsonrepo::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let repo = Arc::new(
        InMemoryRepository::new()
            .with("payments", r#"{"Fee": "1.5"}"#)
            .with("features", r#"{"Beta": false}"#),
    );

    let payments = source(&repo, "payments");
    let features = source(&repo, "features");
    payments.load()?;
    features.load()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let service = ReloadService::new()
        .with_provider(Arc::clone(&payments))
        .with_provider(Arc::clone(&features));
    let task = tokio::spawn(service.run(shutdown_rx));

    // Simulate another process editing the documents.
    for round in 2..5 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        repo.set("payments", format!(r#"{{"Fee": "{round}.5"}}"#));
        repo.set("features", format!(r#"{{"Beta": {}}}"#, round % 2 == 0));

        tokio::time::sleep(Duration::from_millis(500)).await;
        println!(
            "round {round}: fee={:?} beta={:?}",
            payments.snapshot().value("fee"),
            features.snapshot().value("beta"),
        );
    }

    let _ = shutdown_tx.send(true);
    task.await
        .map_err(|e| miette::miette!("reload service panicked: {e}"))?;

    Ok(())
}
