use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

/// Command-line / environment configuration for the observatory.
#[derive(Debug, Clone, Parser)]
#[command(name = "typing-latency-observatory", version, about = "Keyed typing-latency aggregation service")]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "OBSERVATORY_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Milliseconds between snapshots on the SSE stream
    #[arg(
        long,
        env = "OBSERVATORY_STREAM_INTERVAL_MS",
        default_value_t = 500,
        value_parser = clap::value_parser!(u64).range(10..)
    )]
    pub stream_interval_ms: u64,

    /// Primary key to pin at startup; every sample is filed under it
    #[arg(
        long,
        env = "OBSERVATORY_PIN",
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    pub pin: Option<String>,
}

impl Config {
    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            stream_interval_ms: 500,
            pin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let parsed = Config::try_parse_from(["typing-latency-observatory"]).unwrap();
        let default = Config::default();

        assert_eq!(parsed.bind, default.bind);
        assert_eq!(parsed.stream_interval_ms, default.stream_interval_ms);
        assert_eq!(parsed.pin, None);
    }

    #[test]
    fn flags_override_defaults() {
        let parsed = Config::try_parse_from([
            "typing-latency-observatory",
            "--bind",
            "127.0.0.1:9000",
            "--stream-interval-ms",
            "250",
            "--pin",
            "kt",
        ])
        .unwrap();

        assert_eq!(parsed.bind.port(), 9000);
        assert_eq!(parsed.stream_interval(), Duration::from_millis(250));
        assert_eq!(parsed.pin.as_deref(), Some("kt"));
    }

    #[test]
    fn empty_pin_is_rejected() {
        let res = Config::try_parse_from(["typing-latency-observatory", "--pin", ""]);
        assert!(res.is_err());
    }

    #[test]
    fn tiny_stream_interval_is_rejected() {
        let res = Config::try_parse_from([
            "typing-latency-observatory",
            "--stream-interval-ms",
            "1",
        ]);
        assert!(res.is_err());
    }
}
