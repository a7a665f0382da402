use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn file_values_accept_strings_and_integers() {
    let table: toml::Table = r#"
        queue_capacity = 32
        winner_banner_ms = "1500"
        log_filter = "table_core=debug"
    "#
    .parse()
    .expect("toml");

    let mut settings = RuntimeSettings::default();
    apply_file(&mut settings, &table);

    assert_eq!(settings.queue_capacity, 32);
    assert_eq!(settings.timings.winner_banner, Duration::from_millis(1500));
    assert_eq!(settings.log_filter, "table_core=debug");
    assert_eq!(settings.failure_capacity, 64);
}

#[test]
fn app_prefixed_env_wins_over_table_prefix() {
    let vars = env_map(&[
        ("TABLE_CHIP_ANIMATION_MS", "100"),
        ("APP__CHIP_ANIMATION_MS", "250"),
        ("TABLE_STREET_ANIMATION_MS", "90"),
    ]);

    let mut settings = RuntimeSettings::default();
    apply_env(&mut settings, |key| vars.get(key).cloned());

    assert_eq!(settings.timings.chip_animation, Duration::from_millis(250));
    assert_eq!(settings.timings.street_animation, Duration::from_millis(90));
}

#[test]
fn unparsable_values_keep_defaults() {
    let vars = env_map(&[("TABLE_QUEUE_CAPACITY", "lots"), ("APP__FAILURE_CAPACITY", "0")]);

    let mut settings = RuntimeSettings::default();
    apply_env(&mut settings, |key| vars.get(key).cloned());

    assert_eq!(settings.queue_capacity, 256);
    assert_eq!(settings.failure_capacity, 1);
}

#[test]
fn explicit_settings_file_must_exist() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let missing = env::temp_dir().join(format!("table_core_missing_{suffix}.toml"));

    assert!(load_settings_from(&missing).is_err());
}

#[test]
fn explicit_settings_file_is_applied() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("table_core_settings_{suffix}.toml"));
    fs::write(&path, "pot_animation_ms = 50\n").expect("write settings");

    let settings = load_settings_from(&path).expect("load settings");
    assert_eq!(settings.timings.pot_animation, Duration::from_millis(50));

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn unparsable_settings_file_is_an_error() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("table_core_broken_{suffix}.toml"));
    fs::write(&path, "queue_capacity = [\n").expect("write settings");

    let err = read_settings_file(&path).expect_err("broken toml");
    assert!(format!("{err:#}").contains("failed to parse settings file"));
    assert!(load_settings_from(&path).is_err());

    fs::remove_file(path).expect("cleanup");
}
