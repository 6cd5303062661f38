use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

use crate::{Error, Result};

/// Options applied when a pattern is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default)]
    pub case_insensitive: bool,

    /// `^` and `$` also match at line boundaries.
    #[serde(default)]
    pub multi_line: bool,

    #[serde(default)]
    pub dot_matches_new_line: bool,

    /// Unicode-aware classes (`\w`, `\d`, ...). Turning this off also lets
    /// the pattern match bytes that are not valid UTF-8 on their own.
    #[serde(default = "default_true")]
    pub unicode: bool,

    /// Minimize the compiled DFA. Slower to build, smaller to keep.
    #[serde(default = "default_true")]
    pub minimize: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            multi_line: false,
            dot_matches_new_line: false,
            unicode: default_true(),
            minimize: default_true(),
        }
    }
}

impl PatternConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        from_file(path)
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T> {
    serde_json::from_str(s).map_err(Error::from)
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: PatternConfig = from_str(r#"{ "case_insensitive": true }"#).unwrap();
        assert_eq!(
            config,
            PatternConfig {
                case_insensitive: true,
                ..PatternConfig::default()
            }
        );
        assert!(config.unicode);
        assert!(config.minimize);
    }

    #[test]
    fn test_round_trip_through_file() {
        let config = PatternConfig {
            multi_line: true,
            minimize: false,
            ..PatternConfig::default()
        };
        let path = std::env::temp_dir().join(format!(
            "lazyparse-config-{}.json",
            std::process::id()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(serde_json::to_string(&config).unwrap().as_bytes())
            .unwrap();
        drop(file);

        let loaded = PatternConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_malformed_config() {
        let result: Result<PatternConfig> = from_str("{ not json");
        assert!(matches!(result, Err(Error::Config(_))));

        let missing = PatternConfig::from_file("/nonexistent/lazyparse.json");
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
