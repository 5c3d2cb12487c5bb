//! Command line and environment configuration.

use clap::Parser;
use std::collections::HashMap;
use tb_01_token_connector::ConnectorConfig;

/// Bridge Runtime: runs one fftokens connector instance
#[derive(Parser, Debug, Clone)]
#[command(name = "bridge-runtime")]
#[command(author, version, about = "Runs one fftokens token connector and logs its confirmations", long_about = None)]
pub struct Args {
    /// Base HTTP(S) URL of the token connector service
    #[arg(long, env = "TB_CONNECTOR_URL")]
    pub url: String,

    /// Configured name of this connector instance
    #[arg(long, env = "TB_CONNECTOR_NAME", default_value = "fftokens0")]
    pub name: String,

    /// WebSocket event path (default /api/ws)
    #[arg(long, env = "TB_CONNECTOR_WS_PATH")]
    pub ws_path: Option<String>,

    /// Timeout for each command request, in milliseconds
    #[arg(long, env = "TB_REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Timeout for opening connections, in milliseconds
    #[arg(long, env = "TB_CONNECT_TIMEOUT_MS", default_value = "10000")]
    pub connect_timeout_ms: u64,

    /// Basic auth user name
    #[arg(long, env = "TB_AUTH_USERNAME")]
    pub auth_username: Option<String>,

    /// Basic auth password
    #[arg(long, env = "TB_AUTH_PASSWORD", hide_env_values = true)]
    pub auth_password: Option<String>,

    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

impl Args {
    /// Connector configuration described by these arguments.
    pub fn connector_config(&self) -> ConnectorConfig {
        ConnectorConfig {
            url: self.url.clone(),
            ws_path: self.ws_path.clone(),
            request_timeout_ms: self.request_timeout_ms,
            connect_timeout_ms: self.connect_timeout_ms,
            headers: self.headers.iter().cloned().collect::<HashMap<_, _>>(),
            auth_username: self.auth_username.clone(),
            auth_password: self.auth_password.clone(),
            ..Default::default()
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_config() {
        let args = Args::try_parse_from([
            "bridge-runtime",
            "--url",
            "http://tokens:3000",
            "--name",
            "erc1155",
            "--ws-path",
            "/events",
            "--request-timeout-ms",
            "5000",
            "--header",
            "X-Api-Key: secret",
        ])
        .unwrap();

        let config = args.connector_config();
        assert_eq!(args.name, "erc1155");
        assert_eq!(config.url, "http://tokens:3000");
        assert_eq!(config.ws_path.as_deref(), Some("/events"));
        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(config.connect_timeout_ms, 10_000);
        assert_eq!(config.headers.get("X-Api-Key").map(String::as_str), Some("secret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_header_requires_separator() {
        assert!(parse_header("no-separator").is_err());
        assert!(parse_header(": value").is_err());
        assert_eq!(
            parse_header("Authorization: Bearer a:b").unwrap(),
            ("Authorization".to_string(), "Bearer a:b".to_string())
        );
    }
}
