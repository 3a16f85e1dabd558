//! Example: a custom repository layered under command-line overrides.
//!
//! The repository simulates a settings table keyed by document name. A
//! custom provider with higher priority overrides individual keys.
//!
//! Run with:
//!   `cargo run --example custom_repository`

use std::collections::HashMap;
use std::sync::Arc;

use jsonrepo::ConfigLoader;
use jsonrepo::provider::{Provider, ProviderResult, ProviderSource, ProviderValue, priority};
use jsonrepo::repository::{JsonRepository, RepositoryError, RepositoryResult};
use jsonrepo::source::RepositorySource;

/// A mock settings table, as a database-backed repository would expose it.
struct SettingsTable {
    rows: HashMap<&'static str, &'static str>,
}

impl SettingsTable {
    fn new() -> Self {
        let mut rows = HashMap::new();
        rows.insert(
            "payments",
            r#"{
                "Gateway": { "Url": "https://pay.example", "TimeoutSecs": 30 },
                "Currencies": ["EUR", "USD"]
            }"#,
        );
        Self { rows }
    }
}

impl JsonRepository for SettingsTable {
    fn get_by_key(&self, key: &str) -> RepositoryResult {
        self.rows
            .get(key)
            .map(|body| (*body).to_owned())
            .ok_or_else(|| RepositoryError::not_found(key))
    }
}

/// `--set Key=Value` style overrides.
struct Overrides(HashMap<String, String>);

impl Provider for Overrides {
    fn name(&self) -> &'static str {
        "overrides"
    }

    fn get(&self, key: &str) -> ProviderResult<ProviderValue> {
        Ok(self
            .0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(k, v)| ProviderValue::new(v.clone(), ProviderSource::custom("overrides", Some(k.clone())))))
    }

    fn priority(&self) -> u32 {
        priority::OVERRIDE
    }
}

fn main() -> jsonrepo::Result<()> {
    let overrides = Overrides(HashMap::from([(
        "Gateway:TimeoutSecs".to_owned(),
        "5".to_owned(),
    )]));

    let mut config = ConfigLoader::new()
        .with_provider(Box::new(overrides))
        .with_json_repository(
            RepositorySource::new("payments").repository(Arc::new(SettingsTable::new())),
        )?;

    for key in ["Gateway:Url", "Gateway:TimeoutSecs", "Currencies:0", "Currencies:1", "Missing"] {
        match config.get(key) {
            Some(value) => println!("{key:<20} = {:<22} (from {})", value.value, value.source),
            None => println!("{key:<20} is not set"),
        }
    }

    let timeout: Option<u64> = config.get_parsed("gateway:timeoutsecs")?;
    println!("\nEffective timeout: {timeout:?}");

    // A required document that does not exist fails with a diagnostic.
    let missing = ConfigLoader::new().with_json_repository(
        RepositorySource::new("billing").repository(Arc::new(SettingsTable::new())),
    );
    if let Err(e) = missing {
        println!("\n{:?}", miette::Report::new(e));
    }

    Ok(())
}
