use failure::Fail;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Fail, PartialEq)]
#[fail(display = "Invalid {} '{}': {}", var, value, reason)]
pub struct ConfigError {
    var: &'static str,
    value: String,
    reason: &'static str,
}

/// Runtime settings, read once at startup and shared with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub database_path: PathBuf,
    pub table: String,
    /// Echo submitted fields back when `plate_number` is missing.
    /// Leaks whatever the caller sent, so keep it off in production.
    pub debug_echo: bool,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str, default: &str| {
            (name, lookup(name).unwrap_or_else(|| default.to_string()))
        };

        let (name, value) = var("LISTEN_ADDR", "0.0.0.0:8402");
        let listen_addr = value
            .parse()
            .map_err(|_| invalid(name, &value, "expected a socket address"))?;

        let (name, value) = var("DATABASE_PATH", "/data/plates.db");
        if value.is_empty() {
            return Err(invalid(name, &value, "path cannot be empty"));
        }
        let database_path = PathBuf::from(value);

        let (name, table) = var("PLATE_TABLE", "license_plates");
        if !is_identifier(&table) {
            return Err(invalid(
                name,
                &table,
                "expected letters, digits and underscores, not starting with a digit",
            ));
        }

        let (name, value) = var("DEBUG_ECHO", "false");
        let debug_echo = parse_flag(&value).ok_or_else(|| {
            invalid(name, &value, "expected one of 1/0, true/false, yes/no, on/off")
        })?;

        Ok(Config {
            listen_addr,
            database_path,
            table,
            debug_echo,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError {
        var,
        value: value.to_string(),
        reason,
    }
}

/// Table names are spliced into SQL, so only plain identifiers pass.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        assert_eq!(
            load(&[]).unwrap(),
            Config {
                listen_addr: ([0, 0, 0, 0], 8402).into(),
                database_path: PathBuf::from("/data/plates.db"),
                table: "license_plates".to_string(),
                debug_echo: false,
            }
        );
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/plates.sqlite"),
            ("PLATE_TABLE", "plates_2024"),
            ("DEBUG_ECHO", "Yes"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.database_path, PathBuf::from("/tmp/plates.sqlite"));
        assert_eq!(config.table, "plates_2024");
        assert!(config.debug_echo);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("LISTEN_ADDR", "localhost")]).is_err());
        assert!(load(&[("DATABASE_PATH", "")]).is_err());
        assert!(load(&[("DEBUG_ECHO", "maybe")]).is_err());
        for table in &["", "1plates", "plates; DROP TABLE x", "plates.v2", "ป้าย"] {
            assert!(load(&[("PLATE_TABLE", *table)]).is_err(), "{}", table);
        }
    }

    #[test]
    fn error_names_the_variable() {
        let err = load(&[("PLATE_TABLE", "a-b")]).unwrap_err();
        assert!(err.to_string().starts_with("Invalid PLATE_TABLE 'a-b'"));
    }
}
