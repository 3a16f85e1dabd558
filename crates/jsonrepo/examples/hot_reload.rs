//! Hot reload example: a settings file polled for changes.
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=jsonrepo=debug cargo run --example hot_reload
//!
//! # In another terminal, edit the printed file, e.g.
//! echo '{"Server": {"Port": 9090}}' > /tmp/jsonrepo_example/app.json
//! ```

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use jsonrepo::provider::JsonRepositoryProvider;
use jsonrepo::repository::FileRepository;
use jsonrepo::source::RepositorySource;
use tracing_subscriber::EnvFilter;

fn main() -> jsonrepo::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let dir = std::env::temp_dir().join("jsonrepo_example");
    fs::create_dir_all(&dir).map_err(|e| miette::miette!("cannot create {}: {e}", dir.display()))?;

    let path = dir.join("app.json");
    fs::write(
        &path,
        r#"{
    // edit me while the example runs
    "Server": { "Host": "localhost", "Port": 8080 },
    "Features": ["search", "export"],
}"#,
    )
    .map_err(|e| miette::miette!("cannot write {}: {e}", path.display()))?;

    println!("Settings file: {}", path.display());
    println!("Modify this file to see hot reload in action!\n");

    let provider = Arc::new(JsonRepositoryProvider::new(
        RepositorySource::new("app")
            .repository(Arc::new(FileRepository::new(&dir)))
            .reload_on_change(true)
            .change_check_interval(Duration::from_secs(1))
            .on_load_error(|ctx| {
                if ctx.is_reload() {
                    println!("  ignoring broken edit: {}", ctx.error());
                    ctx.ignore();
                }
            }),
    ));

    let handle = provider
        .watch()
        .on_change(|event| {
            println!(
                "Reloaded '{}' ({}): {} entries, epoch {}",
                event.key, event.trigger, event.entries, event.epoch
            );
        })
        .on_error(|err| eprintln!("Reload failed: {err}"))
        .start()?;

    for entry in handle.get().iter() {
        println!("  {entry}");
    }

    // Watch for 30 seconds, printing whenever a new mapping is published.
    let mut seen = handle.epoch();
    for _ in 0..30 {
        thread::sleep(Duration::from_secs(1));

        if handle.has_changed_since(seen) {
            seen = handle.epoch();
            for entry in handle.get().iter() {
                println!("  {entry}");
            }
        }
    }

    handle.stop();
    println!("\nWatch stopped.");

    Ok(())
}
