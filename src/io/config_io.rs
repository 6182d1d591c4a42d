use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Error type for config file access
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("unknown config key: {0} (expected section.name, e.g. ui.hide_completed)")]
    UnknownKey(String),
}

/// Environment variable overriding the store directory
pub const STORE_DIR_ENV: &str = "DAYLIST_DIR";

/// Work out where the store lives: explicit flag, then `DAYLIST_DIR`, then
/// `$XDG_DATA_HOME/daylist`, then `~/.local/share/daylist`.
pub fn resolve_store_dir(flag: Option<&str>) -> PathBuf {
    resolve_store_dir_with(flag, |name| std::env::var(name).ok())
}

/// [`resolve_store_dir`] with an injectable environment lookup.
pub fn resolve_store_dir_with(flag: Option<&str>, env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = flag {
        return PathBuf::from(dir);
    }
    if let Some(dir) = env(STORE_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    let data_dir = env("XDG_DATA_HOME")
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            env("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/"))
                .join(".local")
                .join("share")
        });
    data_dir.join("daylist")
}

pub fn config_path(store_dir: &Path) -> PathBuf {
    store_dir.join("config.toml")
}

/// Read config.toml from the store directory. A missing file yields the
/// defaults; a malformed one is an error.
pub fn read_config(store_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_path(store_dir);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(toml::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(ConfigError::ReadError { path, source: e }),
    }
}

/// Read the raw config document for format-preserving edits.
fn read_config_doc(store_dir: &Path) -> Result<toml_edit::DocumentMut, ConfigError> {
    let path = config_path(store_dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    Ok(text.parse()?)
}

/// Look up a `section.name` key in the effective config (defaults included).
pub fn get_config_value(config: &Config, key: &str) -> Result<toml::Value, ConfigError> {
    let (section, name) = split_key(key)?;
    let table = toml::Value::try_from(config).map_err(|_| ConfigError::UnknownKey(key.into()))?;
    table
        .get(section)
        .and_then(|s| s.get(name))
        .cloned()
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

/// Set `section.name = value` in config.toml, keeping comments and layout.
/// `value` is stored as a bool or integer when it parses as one, otherwise as
/// a string. The edited document must still parse as a valid config.
pub fn set_config_value(store_dir: &Path, key: &str, value: &str) -> Result<Config, ConfigError> {
    let (section, name) = split_key(key)?;
    get_config_value(&Config::default(), key)?;

    let mut doc = read_config_doc(store_dir)?;
    // A section that is missing or not a table (e.g. `ui = 3`) is replaced
    if !doc.get(section).is_some_and(|item| item.is_table_like()) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[section][name] = if let Ok(b) = value.parse::<bool>() {
        toml_edit::value(b)
    } else if let Ok(n) = value.parse::<i64>() {
        toml_edit::value(n)
    } else {
        toml_edit::value(value)
    };

    let text = doc.to_string();
    let config: Config = toml::from_str(&text)?;

    let path = config_path(store_dir);
    fs::create_dir_all(store_dir).map_err(|e| ConfigError::WriteError {
        path: store_dir.to_path_buf(),
        source: e,
    })?;
    fs::write(&path, text).map_err(|e| ConfigError::WriteError { path, source: e })?;
    Ok(config)
}

fn split_key(key: &str) -> Result<(&str, &str), ConfigError> {
    key.split_once('.')
        .filter(|(s, n)| !s.is_empty() && !n.is_empty())
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn store_dir_precedence() {
        let env = |name: &str| match name {
            "DAYLIST_DIR" => Some("/env/dir".to_string()),
            "XDG_DATA_HOME" => Some("/xdg".to_string()),
            "HOME" => Some("/home/me".to_string()),
            _ => None,
        };
        assert_eq!(
            resolve_store_dir_with(Some("/flag"), env),
            PathBuf::from("/flag")
        );
        assert_eq!(resolve_store_dir_with(None, env), PathBuf::from("/env/dir"));

        let no_override = |name: &str| match name {
            "XDG_DATA_HOME" => Some("/xdg".to_string()),
            "HOME" => Some("/home/me".to_string()),
            _ => None,
        };
        assert_eq!(
            resolve_store_dir_with(None, no_override),
            PathBuf::from("/xdg/daylist")
        );

        let home_only = |name: &str| (name == "HOME").then(|| "/home/me".to_string());
        assert_eq!(
            resolve_store_dir_with(None, home_only),
            PathBuf::from("/home/me/.local/share/daylist")
        );
    }

    #[test]
    fn missing_config_is_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_config(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn malformed_config_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(config_path(dir.path()), "[ui\nbroken").unwrap();
        assert!(matches!(
            read_config(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn set_preserves_comments() {
        let dir = TempDir::new().unwrap();
        fs::write(
            config_path(dir.path()),
            "# my settings\n[ui]\ndue_format = \"%d.%m\" # european\n",
        )
        .unwrap();

        let config = set_config_value(dir.path(), "ui.hide_completed", "true").unwrap();
        assert!(config.ui.hide_completed);
        assert_eq!(config.ui.due_format, "%d.%m");

        let text = fs::read_to_string(config_path(dir.path())).unwrap();
        assert!(text.contains("# my settings"));
        assert!(text.contains("# european"));
        assert!(text.contains("hide_completed = true"));
    }

    #[test]
    fn set_creates_section() {
        let dir = TempDir::new().unwrap();
        let config = set_config_value(dir.path(), "projects.default_color", "blue").unwrap();
        assert_eq!(config.projects.default_color, "blue");
        assert_eq!(read_config(dir.path()).unwrap().projects.default_color, "blue");
    }

    #[test]
    fn set_rejects_unknown_and_mistyped() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            set_config_value(dir.path(), "ui.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            set_config_value(dir.path(), "hide_completed", "true"),
            Err(ConfigError::UnknownKey(_))
        ));
        // title_width must be an integer
        assert!(matches!(
            set_config_value(dir.path(), "ui.title_width", "wide"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(!config_path(dir.path()).exists());
    }

    #[test]
    fn set_repairs_non_table_section() {
        let dir = TempDir::new().unwrap();
        fs::write(config_path(dir.path()), "ui = 3\n").unwrap();
        assert!(read_config(dir.path()).is_err());

        let config = set_config_value(dir.path(), "ui.hide_completed", "true").unwrap();
        assert!(config.ui.hide_completed);
        assert_eq!(read_config(dir.path()).unwrap(), config);
    }

    #[test]
    fn get_reads_defaults() {
        let value = get_config_value(&Config::default(), "ui.today_accent").unwrap();
        assert_eq!(value.as_str(), Some("#ffffff"));
    }
}
