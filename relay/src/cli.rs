use clap::Parser;
use std::net::SocketAddr;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use relay_api::Settings;
use relay_cloud::CloudConfig;
use relay_util::http::Uri;
use relay_webhook::DEFAULT_MEASUREMENT;

fn parse_duration(s: &str) -> Result<Duration, ParseIntError> {
    let millis: u64 = s.parse()?;
    Ok(Duration::from_millis(millis))
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)] // read from Cargo.toml
pub struct Cli {
    /// Webhook listen address
    #[arg(
        env = "RELAY_LISTEN_ADDRESS",
        long = "listen-address",
        value_name = "addr",
        default_value = "0.0.0.0:8080"
    )]
    pub listen_address: SocketAddr,

    /// Cloud API endpoint URI
    #[arg(env = "RELAY_API_ENDPOINT", long = "api-endpoint", value_name = "uri")]
    pub api_endpoint: Option<Uri>,

    /// Audience requested when exchanging client credentials
    #[arg(env = "RELAY_API_AUDIENCE", long = "api-audience", value_name = "uri")]
    pub api_audience: Option<String>,

    /// Cloud request timeout in milliseconds
    #[arg(
        env = "RELAY_REQUEST_TIMEOUT_MS",
        long = "request-timeout-ms",
        value_name = "ms",
        value_parser = parse_duration
    )]
    pub request_timeout: Option<Duration>,

    /// Name of the SenML record to relay
    #[arg(
        env = "RELAY_MEASUREMENT",
        long = "measurement",
        value_name = "name",
        default_value = DEFAULT_MEASUREMENT
    )]
    pub measurement: String,

    /// Handle a single trigger event read from this file ("-" for stdin)
    /// and exit instead of serving HTTP
    #[arg(env = "RELAY_EVENT", long = "event", value_name = "path")]
    pub event: Option<PathBuf>,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        let defaults = CloudConfig::default();
        Settings {
            measurement: self.measurement.clone(),
            cloud: CloudConfig {
                api_endpoint: self.api_endpoint.clone().unwrap_or(defaults.api_endpoint),
                audience: self.api_audience.clone().unwrap_or(defaults.audience),
                timeout: self.request_timeout.unwrap_or(defaults.timeout),
            },
        }
    }
}

pub fn parse() -> Cli {
    Parser::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_uses_cloud_defaults() {
        let cli = Cli::try_parse_from(["things-relay"]).unwrap();
        let settings = cli.settings();
        let endpoint = settings.cloud.api_endpoint.to_string();

        assert_eq!(cli.listen_address, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cli.event, None);
        assert_eq!(settings.measurement, "temperature");
        assert_eq!(endpoint.trim_end_matches('/'), "https://api2.arduino.cc");
        assert_eq!(settings.cloud.audience, "https://api2.arduino.cc/iot");
        assert_eq!(settings.cloud.timeout, Duration::from_secs(30));
    }

    #[test]
    fn it_overrides_settings_from_arguments() {
        let cli = Cli::try_parse_from([
            "things-relay",
            "--api-endpoint",
            "http://127.0.0.1:4000",
            "--request-timeout-ms",
            "1500",
            "--measurement",
            "humidity",
            "--event",
            "-",
        ])
        .unwrap();
        let settings = cli.settings();
        let endpoint = settings.cloud.api_endpoint.to_string();

        assert_eq!(cli.event, Some(PathBuf::from("-")));
        assert_eq!(settings.measurement, "humidity");
        assert_eq!(endpoint.trim_end_matches('/'), "http://127.0.0.1:4000");
        assert_eq!(settings.cloud.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn it_rejects_bad_timeouts() {
        assert!(Cli::try_parse_from(["things-relay", "--request-timeout-ms", "soon"]).is_err());
    }
}
