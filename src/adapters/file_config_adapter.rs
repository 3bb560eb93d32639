//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive; `[strategy.<id>]` sections
//! are looked up by their lowercased id. Values are trimmed, and a key
//! with an empty value reads as unset.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut ini = Ini::new();
        ini.load(path).map_err(std::io::Error::other)?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut ini = Ini::new();
        ini.read(content.to_string())?;
        Ok(Self { ini })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get(section, key)
            .map(|raw| raw.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_backtest_strategy_and_data_sections() {
        let content = r#"
[backtest]
symbols = NIFTY, BANKNIFTY
initial_capital = 100000.0

[strategy.fast]
kind = ema_crossover
ema_short = 5

[data]
source = csv
path = ./data
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("strategy.fast", "kind"),
            Some("ema_crossover".to_string())
        );
        assert_eq!(adapter.get_int("strategy.fast", "ema_short", 0), 5);
        assert_eq!(adapter.get_string("data", "path"), Some("./data".to_string()));
    }

    #[test]
    fn names_are_case_insensitive() {
        let adapter =
            FileConfigAdapter::from_string("[Strategy.Fast]\nKind = breakout\n").unwrap();
        assert_eq!(
            adapter.get_string("strategy.fast", "kind"),
            Some("breakout".to_string())
        );
    }

    #[test]
    fn blank_value_reads_as_unset() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nquantity =\ncommission =   \n").unwrap();
        assert_eq!(adapter.get_string("backtest", "quantity"), None);
        assert_eq!(adapter.get_string("backtest", "commission"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn inline_comments_are_stripped() {
        let adapter =
            FileConfigAdapter::from_string("[data]\nsource = sqlite ; local cache\n").unwrap();
        assert_eq!(adapter.get_string("data", "source"), Some("sqlite".to_string()));
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nsymbols = NIFTY , ,BANKNIFTY,\n").unwrap();
        assert_eq!(adapter.get_list("backtest", "symbols"), vec!["NIFTY", "BANKNIFTY"]);
        assert!(adapter.get_list("backtest", "missing").is_empty());
    }

    #[test]
    fn get_int_falls_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[data]\npool_size = many\nretries = 3\n").unwrap();
        assert_eq!(adapter.get_int("data", "pool_size", 4), 4);
        assert_eq!(adapter.get_int("data", "missing", 42), 42);
        assert_eq!(adapter.get_int("data", "retries", 0), 3);
    }

    #[test]
    fn from_file_reads_output_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[output]\npath = out/results.json\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("output", "path"),
            Some("out/results.json".to_string())
        );
    }

    #[test]
    fn from_file_fails_for_missing_file() {
        assert!(FileConfigAdapter::from_file("/nonexistent/path/config.ini").is_err());
    }
}
