//! Command-line argument parsing.
//!
//! Produces the command-line configuration layer and remembers which flags
//! were actually passed, since `--headauth ""` must behave differently from
//! leaving the flag out.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches, Parser};
use thiserror::Error;

use crate::config::schema::PartialConfig;

/// Argument id of the header authentication flag.
pub const HEADER_AUTH: &str = "header_auth";

/// Argument id of the listen port flag.
pub const PORT: &str = "port";

/// Argument ids that map onto configuration fields.
const CONFIG_FLAGS: &[&str] = &[
    "nats_url",
    PORT,
    "ws_path",
    "api_path",
    "request_timeout",
    HEADER_AUTH,
    "tls",
    "tls_cert",
    "tls_key",
    "config",
];

/// Command-line options for the gateway.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "resgate")]
#[command(about = "Realtime API gateway", long_about = None)]
pub struct CliArgs {
    /// NATS Server URL (default: nats://127.0.0.1:4222)
    #[arg(short = 'n', long = "nats", value_name = "url", help_heading = "Server Options")]
    pub nats_url: Option<String>,

    /// HTTP port for client connections (default: 8080)
    #[arg(short = 'p', long = "port", value_name = "port", help_heading = "Server Options")]
    pub port: Option<u64>,

    /// WebSocket path for clients (default: /)
    #[arg(short = 'w', long = "wspath", value_name = "path", help_heading = "Server Options")]
    pub ws_path: Option<String>,

    /// Web resource path for clients (default: /api/)
    #[arg(short = 'a', long = "apipath", value_name = "path", help_heading = "Server Options")]
    pub api_path: Option<String>,

    /// Timeout duration for NATS requests (default: 5)
    #[arg(
        short = 'r',
        long = "reqtimeout",
        value_name = "seconds",
        help_heading = "Server Options"
    )]
    pub request_timeout: Option<u64>,

    /// Resource method for header authentication
    #[arg(short = 'u', long = "headauth", value_name = "method", help_heading = "Server Options")]
    pub header_auth: Option<String>,

    /// Enable TLS for HTTP (default: false)
    #[arg(
        long = "tls",
        value_name = "bool",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help_heading = "Server Options"
    )]
    pub tls: Option<bool>,

    /// HTTP server certificate file
    #[arg(long = "tlscert", value_name = "file", help_heading = "Server Options")]
    pub tls_cert: Option<String>,

    /// Private key for HTTP server certificate
    #[arg(long = "tlskey", value_name = "file", help_heading = "Server Options")]
    pub tls_key: Option<String>,

    /// Configuration file
    #[arg(short = 'c', long = "config", value_name = "file", help_heading = "Server Options")]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// The command-line layer. Zero and empty values count as not supplied.
    pub fn layer(&self) -> PartialConfig {
        PartialConfig {
            nats_url: self.nats_url.clone(),
            request_timeout: self.request_timeout,
            debug: None,
            port: self.port,
            ws_path: self.ws_path.clone(),
            api_path: self.api_path.clone(),
            header_auth: self.header_auth.clone(),
            tls: self.tls,
            tls_cert: self.tls_cert.clone(),
            tls_key: self.tls_key.clone(),
        }
        .normalized()
    }
}

/// Errors produced while parsing arguments.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// Help was requested; carries the rendered usage text.
    #[error("{0}")]
    Help(String),

    /// Malformed arguments.
    #[error("error parsing arguments: {0}")]
    Usage(#[source] clap::Error),
}

/// Parsed command line.
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    /// Override candidates as parsed.
    pub args: CliArgs,

    /// Ids of the flags passed at least once, empty values included.
    pub explicit: BTreeSet<&'static str>,
}

impl ParsedArgs {
    /// Whether the flag with argument id `id` appeared on the command line.
    pub fn was_supplied(&self, id: &str) -> bool {
        self.explicit.contains(id)
    }

    /// Ids of flags passed with an empty or zero value.
    ///
    /// Such a flag still overrides the file: the field falls back to its
    /// built-in default. `port` and `headauth` are left out, the loader
    /// handles them separately.
    pub fn blanked(&self) -> Vec<&'static str> {
        let a = &self.args;
        let blank = |s: &Option<String>| s.as_deref() == Some("");
        let candidates = [
            ("nats_url", blank(&a.nats_url)),
            ("request_timeout", a.request_timeout == Some(0)),
            ("ws_path", blank(&a.ws_path)),
            ("api_path", blank(&a.api_path)),
            ("tls_cert", blank(&a.tls_cert)),
            ("tls_key", blank(&a.tls_key)),
        ];

        candidates
            .into_iter()
            .filter(|(id, is_blank)| *is_blank && self.was_supplied(id))
            .map(|(id, _)| id)
            .collect()
    }

    /// Configuration file path, if one was given.
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.args.config.as_ref().filter(|p| !p.as_os_str().is_empty())
    }
}

/// Parse process arguments. The first item is the program name.
pub fn parse<I, T>(args: I) -> Result<ParsedArgs, ArgsError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match CliArgs::command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) => {
            return Err(match e.kind() {
                clap::error::ErrorKind::DisplayHelp
                | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    ArgsError::Help(e.render().to_string())
                }
                _ => ArgsError::Usage(e),
            })
        }
    };

    let args = CliArgs::from_arg_matches(&matches).map_err(ArgsError::Usage)?;

    let explicit = CONFIG_FLAGS
        .iter()
        .copied()
        .filter(|id| matches.value_source(id) == Some(ValueSource::CommandLine))
        .collect();

    Ok(ParsedArgs { args, explicit })
}

/// Full usage text, as printed for help and usage errors.
pub fn usage() -> String {
    CliArgs::command().render_help().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_forms_share_a_field() {
        let short = parse(["resgate", "-n", "nats://10.0.0.1:4222", "-p", "9090"]).unwrap();
        let long = parse(["resgate", "--nats", "nats://10.0.0.1:4222", "--port", "9090"]).unwrap();

        assert_eq!(short.args.nats_url, long.args.nats_url);
        assert_eq!(short.args.port, Some(9090));
        assert_eq!(long.args.port, Some(9090));
        assert_eq!(short.explicit, long.explicit);
    }

    #[test]
    fn test_tracks_explicit_empty_value() {
        let parsed = parse(["resgate", "--headauth", ""]).unwrap();
        assert!(parsed.was_supplied(HEADER_AUTH));
        assert_eq!(parsed.args.header_auth.as_deref(), Some(""));
        // The layer itself carries no value; the loader decides what empty means.
        assert!(parsed.args.layer().header_auth.is_none());
    }

    #[test]
    fn test_omitted_flags_are_not_explicit() {
        let parsed = parse(["resgate", "-u", "auth.test.login"]).unwrap();
        assert!(parsed.was_supplied(HEADER_AUTH));
        assert!(!parsed.was_supplied("port"));
        assert!(!parsed.was_supplied("tls"));
    }

    #[test]
    fn test_port_zero_is_not_supplied() {
        let parsed = parse(["resgate", "--port", "0"]).unwrap();
        assert!(parsed.args.layer().port.is_none());
    }

    #[test]
    fn test_wide_port_survives_parsing() {
        let parsed = parse(["resgate", "--port", "70000"]).unwrap();
        assert_eq!(parsed.args.layer().port, Some(70000));
    }

    #[test]
    fn test_tls_flag() {
        let parsed =
            parse(["resgate", "--tls", "--tlscert", "a.pem", "--tlskey", "b.pem"]).unwrap();
        let layer = parsed.args.layer();
        assert_eq!(layer.tls, Some(true));
        assert_eq!(layer.tls_cert.as_deref(), Some("a.pem"));

        let parsed = parse(["resgate"]).unwrap();
        assert!(parsed.args.layer().tls.is_none());
    }

    #[test]
    fn test_tls_flag_takes_explicit_value() {
        let parsed = parse(["resgate", "--tls=false"]).unwrap();
        assert_eq!(parsed.args.layer().tls, Some(false));
        assert!(parsed.was_supplied("tls"));

        let parsed = parse(["resgate", "--tls=true"]).unwrap();
        assert_eq!(parsed.args.layer().tls, Some(true));

        let err = parse(["resgate", "--tls=maybe"]).unwrap_err();
        assert!(matches!(err, ArgsError::Usage(_)));
    }

    #[test]
    fn test_blanked_flags() {
        let parsed = parse(["resgate", "-n", "", "-r", "0", "-p", "0", "-u", "", "-w", "/ws"])
            .unwrap();
        assert_eq!(parsed.blanked(), vec!["nats_url", "request_timeout"]);
        assert!(parse(["resgate"]).unwrap().blanked().is_empty());
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        let err = parse(["resgate", "--bogus"]).unwrap_err();
        assert!(matches!(err, ArgsError::Usage(_)));
    }

    #[test]
    fn test_non_numeric_port_is_usage_error() {
        let err = parse(["resgate", "--port", "http"]).unwrap_err();
        assert!(matches!(err, ArgsError::Usage(_)));

        let err = parse(["resgate", "-r", "-3"]).unwrap_err();
        assert!(matches!(err, ArgsError::Usage(_)));
    }

    #[test]
    fn test_help_is_distinguished() {
        for flag in ["-h", "--help"] {
            match parse(["resgate", flag]) {
                Err(ArgsError::Help(text)) => assert!(text.contains("--headauth")),
                other => panic!("expected help, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_config_path() {
        let parsed = parse(["resgate", "-c", "resgate.json"]).unwrap();
        assert_eq!(parsed.config_path(), Some(&PathBuf::from("resgate.json")));
        assert!(parse(["resgate"]).unwrap().config_path().is_none());
    }
}
