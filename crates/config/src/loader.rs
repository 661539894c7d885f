use std::path::{Path, PathBuf};

use {secrecy::Secret, tracing::debug};

use crate::{env_subst::substitute_env, schema::RelayConfig};

/// Config file name, checked project-local then user-global.
const CONFIG_FILENAME: &str = "mediarelay.toml";

/// Load config from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<RelayConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    Ok(toml::from_str(&raw)?)
}

/// Discover and load config from standard locations, then apply environment
/// fallbacks for the credential fields.
///
/// Search order:
/// 1. `./mediarelay.toml` (project-local)
/// 2. `~/.config/mediarelay/mediarelay.toml` (user-global)
///
/// Starts from `RelayConfig::default()` when no config file is found; a fully
/// env-driven deployment needs no file at all.
pub fn discover_and_load() -> anyhow::Result<RelayConfig> {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)?
        },
        None => {
            debug!("no config file found, using defaults");
            RelayConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "mediarelay") {
        let global = dirs.config_dir().join(CONFIG_FILENAME);
        if global.exists() {
            return Some(global);
        }
    }

    None
}

/// Environment fallbacks for credentials and the operator list. A set and
/// non-empty variable wins over the file value.
pub fn apply_env_overrides(config: &mut RelayConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut RelayConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(token) = var("BOT_TOKEN") {
        config.telegram.token = Secret::new(token);
    }
    if let Some(channel) = var("CHANNEL_ID") {
        config.telegram.channel_id = channel;
    }
    if let Some(operators) = var("OPERATOR_IDS") {
        config.telegram.operators = operators
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(token) = var("CF_API_TOKEN") {
        config.store.api_token = Secret::new(token);
    }
    if let Some(account) = var("CF_ACCOUNT_ID") {
        config.store.account_id = account;
    }
    if let Some(database) = var("D1_DATABASE_ID") {
        config.store.database_id = database;
    }
}

/// Reject configurations the bot cannot start with.
///
/// The store credentials are deliberately not required: without them the bot
/// still publishes, and persistence silently degrades to skipped writes.
pub fn validate(config: &RelayConfig) -> anyhow::Result<()> {
    use secrecy::ExposeSecret;

    if config.telegram.token.expose_secret().is_empty() {
        anyhow::bail!("missing telegram.token (or BOT_TOKEN)");
    }
    if config.telegram.channel_id.is_empty() {
        anyhow::bail!("missing telegram.channel_id (or CHANNEL_ID)");
    }
    if config.telegram.operators.is_empty() {
        anyhow::bail!("missing telegram.operators (or OPERATOR_IDS): an empty list denies everyone");
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {secrecy::ExposeSecret, std::io::Write};

    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn load_config_parses_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            r#"
            [telegram]
            token = "123:ABC"
            channel_id = "-100999"
            operators = ["42"]
            "#
        )
        .expect("write");

        let cfg = load_config(file.path()).expect("load");
        assert_eq!(cfg.telegram.channel_id, "-100999");
        assert_eq!(cfg.telegram.operators, vec!["42"]);
    }

    #[test]
    fn load_config_missing_file_errors() {
        let err = load_config(Path::new("/nonexistent/mediarelay.toml")).expect_err("should fail");
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut cfg = RelayConfig::default();
        cfg.telegram.channel_id = "from-file".into();

        apply_env_overrides_with(
            &mut cfg,
            lookup(&[
                ("BOT_TOKEN", "456:DEF"),
                ("CHANNEL_ID", "@override"),
                ("OPERATOR_IDS", "8040798522, 6874581126"),
                ("CF_API_TOKEN", "cf-tok"),
                ("CF_ACCOUNT_ID", "cf-acct"),
                ("D1_DATABASE_ID", "d1-db"),
            ]),
        );

        assert_eq!(cfg.telegram.token.expose_secret(), "456:DEF");
        assert_eq!(cfg.telegram.channel_id, "@override");
        assert_eq!(cfg.telegram.operators, vec!["8040798522", "6874581126"]);
        assert_eq!(cfg.store.api_token.expose_secret(), "cf-tok");
        assert_eq!(cfg.store.account_id, "cf-acct");
        assert_eq!(cfg.store.database_id, "d1-db");
    }

    #[test]
    fn empty_env_values_do_not_override() {
        let mut cfg = RelayConfig::default();
        cfg.telegram.channel_id = "from-file".into();

        apply_env_overrides_with(&mut cfg, lookup(&[("CHANNEL_ID", "")]));
        assert_eq!(cfg.telegram.channel_id, "from-file");
    }

    #[test]
    fn validate_requires_token_channel_and_operators() {
        let mut cfg = RelayConfig::default();
        assert!(validate(&cfg).is_err());

        cfg.telegram.token = Secret::new("123:ABC".into());
        assert!(validate(&cfg).is_err());

        cfg.telegram.channel_id = "@ch".into();
        assert!(validate(&cfg).is_err());

        cfg.telegram.operators = vec!["42".into()];
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn validate_tolerates_missing_store_credentials() {
        let mut cfg = RelayConfig::default();
        cfg.telegram.token = Secret::new("123:ABC".into());
        cfg.telegram.channel_id = "@ch".into();
        cfg.telegram.operators = vec!["42".into()];
        // store left entirely unconfigured
        assert!(validate(&cfg).is_ok());
    }
}
