use chrono::Duration;
use regex::Regex;
use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};
use std::error::Error;
use std::fmt;

fn default_addr() -> String {
    ":4000".into()
}

fn default_db_path() -> String {
    "sqlite://snippetbox.db".into()
}

fn default_static_dir() -> String {
    "./ui/static".into()
}

fn default_session_lifetime_secs() -> i64 {
    12 * 60 * 60
}

fn expand_placeholders(text: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let env_re = Regex::new(r"\$ENV\{([^}]+)\}")?;
    let file_re = Regex::new(r"\$FILE\{([^}]+)\}")?;
    let mut out = String::new();
    let mut last = 0;
    for caps in env_re.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        out.push_str(&text[last..m.start()]);
        let var = std::env::var(&caps[1])
            .map_err(|e| format!("environment variable {}: {e}", &caps[1]))?;
        out.push_str(&var);
        last = m.end();
    }
    out.push_str(&text[last..]);
    let text = out;
    let mut out = String::new();
    let mut last = 0;
    for caps in file_re.captures_iter(&text) {
        let Some(m) = caps.get(0) else { continue };
        out.push_str(&text[last..m.start()]);
        let contents = std::fs::read_to_string(&caps[1])?;
        out.push_str(contents.trim_end());
        last = m.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn parse_size(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (digits, factor) = match trimmed.chars().last()? {
        'K' | 'k' => (&trimmed[..trimmed.len() - 1], 1024u64),
        'M' | 'm' => (&trimmed[..trimmed.len() - 1], 1024u64 * 1024),
        'G' | 'g' => (&trimmed[..trimmed.len() - 1], 1024u64 * 1024 * 1024),
        '0'..='9' => (trimmed, 1u64),
        _ => return None,
    };
    digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(factor))
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SizeVisitor;

    impl Visitor<'_> for SizeVisitor {
        type Value = Option<u64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or string with optional K, M, G suffix")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                Err(de::Error::custom("size must be positive"))
            } else {
                Ok(Some(u64::try_from(v).map_err(de::Error::custom)?))
            }
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse_size(v)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid size: {v}")))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(SizeVisitor)
}

/// Log output style.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_session_lifetime_secs")]
    pub session_lifetime_secs: i64,
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub max_form_bytes: Option<u64>,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            db_path: default_db_path(),
            static_dir: default_static_dir(),
            session_lifetime_secs: default_session_lifetime_secs(),
            secure_cookies: false,
            max_form_bytes: None,
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// `$ENV{NAME}` and `$FILE{path}` placeholders are expanded before
    /// parsing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a
    /// placeholder cannot be resolved.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse configuration from TOML text, expanding placeholders.
    pub fn from_toml(text: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let text = expand_placeholders(text)?;
        let cfg: Config = toml::from_str(&text)?;
        if cfg.session_lifetime_secs <= 0 {
            return Err("session_lifetime_secs must be positive".into());
        }
        Ok(cfg)
    }

    #[must_use]
    pub fn session_lifetime(&self) -> Duration {
        Duration::seconds(self.session_lifetime_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_with_suffixes() {
        assert_eq!(parse_size("512"), Some(512));
        assert_eq!(parse_size("64K"), Some(64 * 1024));
        assert_eq!(parse_size(" 2m "), Some(2 * 1024 * 1024));
        assert_eq!(parse_size("1G"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("12X"), None);
        assert_eq!(parse_size("K"), None);
    }

    #[test]
    fn env_placeholders_expand() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("SNIPPETBOX_TEST_DSN", "sqlite::memory:") };
        let out = expand_placeholders(r#"db_path = "$ENV{SNIPPETBOX_TEST_DSN}""#).unwrap();
        assert_eq!(out, r#"db_path = "sqlite::memory:""#);
    }

    #[test]
    fn missing_env_placeholder_fails() {
        assert!(expand_placeholders("$ENV{SNIPPETBOX_SURELY_UNSET_VAR}").is_err());
    }
}
