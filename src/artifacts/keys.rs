use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File name prefixes a config key may start with. Readers treat them as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConfigPrefix {
    #[default]
    WebScraper,
    SmartWebCrawler,
}

impl ConfigPrefix {
    pub const ALL: [ConfigPrefix; 2] = [ConfigPrefix::WebScraper, ConfigPrefix::SmartWebCrawler];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigPrefix::WebScraper => "web_scraper_config",
            ConfigPrefix::SmartWebCrawler => "smart_web_crawler_config",
        }
    }
}

impl fmt::Display for ConfigPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown config prefix {0:?}")]
pub struct UnknownPrefix(pub String);

impl FromStr for ConfigPrefix {
    type Err = UnknownPrefix;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigPrefix::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPrefix(s.to_string()))
    }
}

/// How a creation instant is turned into a config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyScheme {
    /// `<prefix>_<YYYYMMDD>_<HHMMSS>.json`. Two configs created in the same
    /// second share a key and the later write replaces the earlier one.
    #[default]
    Seconds,
    /// `<prefix>_<YYYYMMDD>_<HHMMSS>_<uuid v7>.json`, unique and still time ordered.
    Unique,
}

/// A parsed config key. Orders by embedded timestamp, then suffix, then raw name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigKey {
    raw: String,
    prefix: ConfigPrefix,
    stamp: NaiveDateTime,
    suffix: Option<String>,
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let prefixes = ConfigPrefix::ALL
            .iter()
            .map(|p| regex::escape(p.as_str()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"^({prefixes})_(\d{{8}}_\d{{6}})(?:_([0-9a-f]{{32}}))?\.json$");
        Regex::new(&pattern).expect("config key pattern is valid")
    })
}

impl ConfigKey {
    pub fn generate(prefix: ConfigPrefix, scheme: KeyScheme, at: DateTime<Utc>) -> Self {
        let stamp = at.naive_utc();
        // Keys only carry whole seconds.
        let stamp = stamp.with_nanosecond(0).unwrap_or(stamp);
        let formatted = stamp.format(STAMP_FORMAT);
        let suffix = match scheme {
            KeyScheme::Seconds => None,
            KeyScheme::Unique => Some(Uuid::now_v7().simple().to_string()),
        };
        let raw = match &suffix {
            Some(suffix) => format!("{prefix}_{formatted}_{suffix}.json"),
            None => format!("{prefix}_{formatted}.json"),
        };
        Self {
            raw,
            prefix,
            stamp,
            suffix,
        }
    }

    /// Parses a file name, returning `None` if it does not follow the config naming convention.
    pub fn parse(name: &str) -> Option<Self> {
        let caps = key_pattern().captures(name)?;
        let prefix = caps.get(1)?.as_str().parse().ok()?;
        let stamp = NaiveDateTime::parse_from_str(caps.get(2)?.as_str(), STAMP_FORMAT).ok()?;
        Some(Self {
            raw: name.to_string(),
            prefix,
            stamp,
            suffix: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn into_string(self) -> String {
        self.raw
    }

    pub fn prefix(&self) -> ConfigPrefix {
        self.prefix
    }

    pub fn stamp(&self) -> NaiveDateTime {
        self.stamp
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for ConfigKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.stamp
            .cmp(&other.stamp)
            .then_with(|| self.suffix.cmp(&other.suffix))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for ConfigKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    #[test]
    fn seconds_scheme_formats_timestamp() {
        let key = ConfigKey::generate(ConfigPrefix::WebScraper, KeyScheme::Seconds, at(9, 5, 7));
        assert_eq!(key.as_str(), "web_scraper_config_20240501_090507.json");
        assert_eq!(ConfigKey::parse(key.as_str()), Some(key));
    }

    #[test]
    fn stamps_are_utc_whatever_the_source_offset() {
        let local = chrono::FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 11, 5, 7)
            .unwrap();
        let key = ConfigKey::generate(
            ConfigPrefix::WebScraper,
            KeyScheme::Seconds,
            local.with_timezone(&Utc),
        );
        assert_eq!(key.as_str(), "web_scraper_config_20240501_090507.json");
    }

    #[test]
    fn unique_scheme_appends_suffix_and_still_parses() {
        let a = ConfigKey::generate(ConfigPrefix::SmartWebCrawler, KeyScheme::Unique, at(9, 5, 7));
        let b = ConfigKey::generate(ConfigPrefix::SmartWebCrawler, KeyScheme::Unique, at(9, 5, 7));

        assert_ne!(a.as_str(), b.as_str());
        assert!(a.as_str().starts_with("smart_web_crawler_config_20240501_090507_"));
        assert_eq!(ConfigKey::parse(a.as_str()), Some(a.clone()));
        assert!(b > a, "later key sorts after earlier key");
    }

    #[test]
    fn parse_rejects_other_names() {
        for name in [
            "notes.json",
            "web_scraper_config_20240501_090507.csv",
            "web_scraper_config_2024051_090507.json",
            "web_scraper_config_20241399_090507.json",
            "other_config_20240501_090507.json",
            ".web_scraper_config_20240501_090507.json.tmp",
        ] {
            assert_eq!(ConfigKey::parse(name), None, "{name}");
        }
    }

    #[test]
    fn prefixes_are_ordered_by_timestamp_not_name() {
        let older = ConfigKey::parse("web_scraper_config_20240501_090000.json").unwrap();
        let newer = ConfigKey::parse("smart_web_crawler_config_20240501_100000.json").unwrap();
        assert!(newer > older);
        assert_eq!(newer.prefix(), ConfigPrefix::SmartWebCrawler);
    }

    #[test]
    fn prefix_from_str_round_trips() {
        assert_eq!(
            "smart_web_crawler_config".parse::<ConfigPrefix>(),
            Ok(ConfigPrefix::SmartWebCrawler)
        );
        assert_eq!(
            "crawler".parse::<ConfigPrefix>(),
            Err(UnknownPrefix("crawler".to_string()))
        );
    }
}
