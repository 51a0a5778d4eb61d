//! Configuration resolution.
//!
//! Merges three layers, lowest precedence first: built-in defaults, the
//! JSON config file, and the command line. A missing config file is a first
//! run and gets written out with the effective settings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::args::{ParsedArgs, HEADER_AUTH};
use crate::config::schema::{PartialConfig, ResolvedConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error loading config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("error parsing config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of writing the config file on first run.
#[derive(Debug)]
pub struct Bootstrap {
    pub path: PathBuf,
    pub result: io::Result<()>,
}

impl Bootstrap {
    /// Report the write on the current logging sink.
    pub fn log(&self) {
        match &self.result {
            Ok(()) => tracing::info!(path = %self.path.display(), "Created config file"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to write config file"
            ),
        }
    }
}

/// A resolved configuration and, on first run, how writing it out went.
///
/// Resolution happens before the logging sink exists, so the bootstrap
/// outcome is carried back for the caller to log.
#[derive(Debug)]
pub struct Resolution {
    pub config: ResolvedConfig,
    pub bootstrap: Option<Bootstrap>,
}

/// Resolve the final configuration from parsed arguments.
pub fn resolve(parsed: &ParsedArgs) -> Result<Resolution, ConfigError> {
    let cli = parsed.args.layer();

    let mut bootstrap_path = None;
    let mut file = match parsed.config_path() {
        None => PartialConfig::default(),
        Some(path) => match load_layer(path)? {
            Some(layer) => layer.normalized(),
            None => {
                bootstrap_path = Some(path.as_path());
                PartialConfig::default()
            }
        },
    };

    // An explicit empty or zero flag still overrides the file.
    for id in parsed.blanked() {
        file.clear(id);
    }
    if parsed.was_supplied(HEADER_AUTH) && cli.header_auth.is_none() {
        file.clear(HEADER_AUTH);
    }

    let merged = cli.or(file).or(PartialConfig::defaults());
    let config = finish(merged).map_err(ConfigError::Validation)?;

    let bootstrap = bootstrap_path.map(|path| Bootstrap {
        path: path.to_path_buf(),
        result: write_bootstrap(path, &config),
    });

    Ok(Resolution { config, bootstrap })
}

/// Read one config file layer. `Ok(None)` means the file does not exist.
pub fn load_layer(path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Validate merged layers and fix every field to its final value.
fn finish(merged: PartialConfig) -> Result<ResolvedConfig, Vec<ValidationError>> {
    validate_config(&merged)?;

    let defaults = ResolvedConfig::default();
    let port = merged
        .port
        .and_then(|p| u16::try_from(p).ok())
        .ok_or_else(|| vec![ValidationError::PortOutOfRange(merged.port.unwrap_or(0))])?;

    Ok(ResolvedConfig {
        nats_url: merged.nats_url.unwrap_or(defaults.nats_url),
        request_timeout: merged.request_timeout.unwrap_or(defaults.request_timeout),
        debug: merged.debug.unwrap_or(defaults.debug),
        port,
        ws_path: merged.ws_path.unwrap_or(defaults.ws_path),
        api_path: merged.api_path.unwrap_or(defaults.api_path),
        header_auth: merged.header_auth,
        tls: merged.tls.unwrap_or(defaults.tls),
        tls_cert: merged.tls_cert,
        tls_key: merged.tls_key,
    })
}

/// Serialize a config the way it is persisted: tab-indented JSON.
pub fn to_json(config: &ResolvedConfig) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    config.serialize(&mut ser)?;
    Ok(out)
}

fn write_bootstrap(path: &Path, config: &ResolvedConfig) -> io::Result<()> {
    let bytes = to_json(config).map_err(io::Error::from)?;
    fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::args::parse;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_layer(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ \"port\": ").unwrap();

        let err = load_layer(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("error parsing config file"));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed.json");
        fs::write(&path, r#"{"port": "eighty"}"#).unwrap();
        assert!(matches!(load_layer(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_directory_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_layer(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_json_uses_tab_indent() {
        let json = String::from_utf8(to_json(&ResolvedConfig::default()).unwrap()).unwrap();
        assert!(json.contains("\n\t\"natsUrl\": \"nats://127.0.0.1:4222\""));
    }

    #[test]
    fn test_bootstrap_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("resgate.json");
        let parsed = parse(["resgate", "-c", path.to_str().unwrap()]).unwrap();

        let resolution = resolve(&parsed).unwrap();
        assert_eq!(resolution.config, ResolvedConfig::default());
        assert!(!path.exists());

        let bootstrap = resolution.bootstrap.unwrap();
        assert_eq!(bootstrap.path, path);
        assert!(bootstrap.result.is_err());
    }

    #[test]
    fn test_bootstrap_only_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resgate.json");
        let parsed = parse(["resgate", "-c", path.to_str().unwrap()]).unwrap();

        let first = resolve(&parsed).unwrap();
        assert!(first.bootstrap.unwrap().result.is_ok());
        assert!(resolve(&parsed).unwrap().bootstrap.is_none());
        assert!(resolve(&parse(["resgate"]).unwrap()).unwrap().bootstrap.is_none());
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bootstrap_failure_is_logged() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let bootstrap = Bootstrap {
            path: PathBuf::from("/missing/resgate.json"),
            result: Err(io::Error::from(io::ErrorKind::NotFound)),
        };
        tracing::subscriber::with_default(subscriber, || bootstrap.log());

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("Failed to write config file"));
        assert!(output.contains("/missing/resgate.json"));
    }

    #[test]
    fn test_validation_error_message() {
        let parsed = parse(["resgate", "-p", "70000"]).unwrap();
        let err = resolve(&parsed).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: invalid port \"70000\": must be between 1 and 65535"
        );
    }
}
