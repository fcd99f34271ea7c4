//! Integration tests for TOML and environment configuration loading.
//!
//! Uses figment::Jail for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use aula_config::{AulaConfig, ConfigError};

#[test]
fn loads_database_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = "/var/lib/aula/registry.db"
busy_retry_attempts = 6
busy_retry_base_ms = 20
busy_retry_max_ms = 400
"#,
        )?;

        let config: AulaConfig = Figment::from(Serialized::defaults(AulaConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.database.path, "/var/lib/aula/registry.db");
        assert_eq!(config.database.busy_retry_attempts, 6);
        assert_eq!(config.database.busy_retry_base_ms, 20);
        assert_eq!(config.database.busy_retry_max_ms, 400);
        assert!(config.database.validate().is_ok());
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".aula")?;
        jail.create_file(
            ".aula/config.toml",
            r#"
[notifications]
enabled = false

[logging]
level = "aula_rules=debug,info"
"#,
        )?;

        let config = AulaConfig::load().expect("config loads");
        assert!(!config.notifications.enabled);
        assert_eq!(config.logging.level, "aula_rules=debug,info");
        Ok(())
    });
}

#[test]
fn env_beats_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = "from-toml.db"
"#,
        )?;
        jail.set_env("AULA_DATABASE__PATH", ":memory:");

        let config: AulaConfig = Figment::from(Serialized::defaults(AulaConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("AULA_").split("__"))
            .extract()?;

        assert_eq!(config.database.path, ":memory:");
        assert!(config.database.is_in_memory());
        Ok(())
    });
}

#[test]
fn env_overrides_nested_general_limit() {
    Jail::expect_with(|jail| {
        jail.set_env("AULA_GENERAL__DEFAULT_LIMIT", "10");
        let config = AulaConfig::load().expect("config loads");
        assert_eq!(config.general.default_limit, 10);
        Ok(())
    });
}

#[test]
fn invalid_retry_window_rejected_on_load() {
    Jail::expect_with(|jail| {
        jail.set_env("AULA_DATABASE__BUSY_RETRY_BASE_MS", "9000");
        let result = AulaConfig::load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        Ok(())
    });
}

#[test]
fn malformed_value_is_figment_error() {
    Jail::expect_with(|jail| {
        jail.set_env("AULA_GENERAL__DEFAULT_LIMIT", "lots");
        let result = AulaConfig::load();
        assert!(matches!(result, Err(ConfigError::Figment(_))));
        Ok(())
    });
}
