use std::{fs, path::Path, time::Duration};

use anyhow::Context;

pub const DEFAULT_SETTINGS_FILE: &str = "table.toml";

/// Effect durations the reducer stamps onto the commands it emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub chip_animation: Duration,
    pub street_animation: Duration,
    pub pot_animation: Duration,
    pub winner_banner: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            chip_animation: Duration::from_millis(400),
            street_animation: Duration::from_millis(600),
            pot_animation: Duration::from_millis(700),
            winner_banner: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub queue_capacity: usize,
    pub failure_capacity: usize,
    pub timings: Timings,
    pub log_filter: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            failure_capacity: 64,
            timings: Timings::default(),
            log_filter: "info".into(),
        }
    }
}

/// Defaults, then `table.toml` in the working directory, then environment.
pub fn load_settings() -> RuntimeSettings {
    let mut settings = RuntimeSettings::default();

    match read_settings_file(Path::new(DEFAULT_SETTINGS_FILE)) {
        Ok(Some(file_cfg)) => apply_file(&mut settings, &file_cfg),
        Ok(None) => {}
        Err(err) => tracing::warn!("ignoring {DEFAULT_SETTINGS_FILE}: {err:#}"),
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

/// Like [`load_settings`] but with an explicit file that must exist.
pub fn load_settings_from(path: &Path) -> anyhow::Result<RuntimeSettings> {
    let mut settings = RuntimeSettings::default();
    let file_cfg = read_settings_file(path)?
        .with_context(|| format!("settings file '{}' not found", path.display()))?;
    apply_file(&mut settings, &file_cfg);
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Option<toml::Table>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let table = raw
        .parse::<toml::Table>()
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
    Ok(Some(table))
}

fn file_value(table: &toml::Table, key: &str) -> Option<String> {
    match table.get(key)? {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Integer(v) => Some(v.to_string()),
        _ => None,
    }
}

pub(crate) fn apply_file(settings: &mut RuntimeSettings, table: &toml::Table) {
    apply_overrides(settings, |key| file_value(table, key));
}

/// `TABLE_*` first, then `APP__*`, so the namespaced form wins.
pub(crate) fn apply_env(settings: &mut RuntimeSettings, lookup: impl Fn(&str) -> Option<String>) {
    apply_overrides(settings, |key| {
        let upper = key.to_ascii_uppercase();
        lookup(&format!("APP__{upper}")).or_else(|| lookup(&format!("TABLE_{upper}")))
    });
}

fn apply_overrides(settings: &mut RuntimeSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = parse_usize(&lookup, "queue_capacity") {
        settings.queue_capacity = v.max(1);
    }
    if let Some(v) = parse_usize(&lookup, "failure_capacity") {
        settings.failure_capacity = v.max(1);
    }
    if let Some(v) = parse_millis(&lookup, "chip_animation_ms") {
        settings.timings.chip_animation = v;
    }
    if let Some(v) = parse_millis(&lookup, "street_animation_ms") {
        settings.timings.street_animation = v;
    }
    if let Some(v) = parse_millis(&lookup, "pot_animation_ms") {
        settings.timings.pot_animation = v;
    }
    if let Some(v) = parse_millis(&lookup, "winner_banner_ms") {
        settings.timings.winner_banner = v;
    }
    if let Some(v) = lookup("log_filter") {
        settings.log_filter = v;
    }
}

fn parse_usize(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse::<usize>() {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting: {err}");
            None
        }
    }
}

fn parse_millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    parse_usize(lookup, key).map(|ms| Duration::from_millis(ms as u64))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
