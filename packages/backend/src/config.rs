use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use spellbrew_algo::{DisplayTimePolicy, IntroductionOrder, PriorityConfig, StrategyKind};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// `None` keeps everything in memory
    pub database_url: Option<String>,
    /// JSON vocabulary file loaded into an empty corpus at startup
    pub vocab_path: Option<PathBuf>,
    pub scheduling: SchedulingSettings,
}

/// Deployment-wide scheduling choices.
#[derive(Debug, Clone, Default)]
pub struct SchedulingSettings {
    pub strategy: StrategyKind,
    pub display: DisplayTimePolicy,
    pub priority: PriorityConfig,
    pub introduction_order: IntroductionOrder,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let database_url = non_empty_var("DATABASE_URL");
        let vocab_path = non_empty_var("VOCAB_PATH").map(PathBuf::from);

        Self {
            host,
            port,
            log_level,
            database_url,
            vocab_path,
            scheduling: SchedulingSettings::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SchedulingSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let strategy = parse_var("SELECTION_STRATEGY").unwrap_or(defaults.strategy);
        let display = parse_var("DISPLAY_TIME_POLICY").unwrap_or(defaults.display);
        let introduction_order =
            parse_var("INTRODUCTION_ORDER").unwrap_or(defaults.introduction_order);

        let mut priority = defaults.priority;
        if let Some(ratio) = parse_var::<f64>("NEW_WORD_RATIO").filter(|r| (0.0..=1.0).contains(r)) {
            priority.new_word_ratio = ratio;
        }

        Self {
            strategy,
            display,
            priority,
            introduction_order,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    non_empty_var(key).and_then(|value| value.parse::<T>().ok())
}
