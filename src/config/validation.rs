//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check proxy prefixes and targets
//! - Check the chunk map for duplicate and self-referential entries
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that the bind host and metrics address resolve
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DevConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::{Component, Path};

use thiserror::Error;

use crate::config::schema::{DevConfig, HostOption};
use crate::routing::Origin;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.port must be between 1 and 65535")]
    InvalidPort,

    #[error("server.host {0:?} is not an IP address or \"localhost\"")]
    InvalidHost(String),

    #[error("server.proxy contains an empty prefix")]
    EmptyPrefix,

    #[error("proxy prefix {0:?} must start with '/'")]
    PrefixNotAbsolute(String),

    #[error("proxy target {target:?} for {prefix:?} is not a valid origin: {reason}")]
    InvalidTarget {
        prefix: String,
        target: String,
        reason: String,
    },

    #[error("proxy target {target:?} for {prefix:?} points back at the dev server itself")]
    SelfProxy { prefix: String, target: String },

    #[error("manualChunks contains a chunk with an empty name")]
    EmptyChunkName,

    #[error("chunk {0:?} lists an empty module identifier")]
    EmptyModuleId(String),

    #[error("chunk {chunk:?} lists module {module:?} more than once")]
    DuplicateChunkMember { chunk: String, module: String },

    #[error("module {module:?} is listed in chunks {first:?} and {second:?}")]
    ModuleInMultipleChunks {
        module: String,
        first: String,
        second: String,
    },

    #[error("chunk name {chunk:?} is also listed as a module in chunk {listed_in:?}")]
    ChunkNameCollision { chunk: String, listed_in: String },

    #[error("build.outDir must not be empty")]
    EmptyOutDir,

    #[error("build.assetsDir {0:?} must be a relative path inside outDir")]
    InvalidAssetsDir(String),

    #[error("timeouts.{0} must be greater than zero")]
    InvalidTimeout(&'static str),

    #[error("observability.metricsAddress {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration, collecting every violation.
pub fn validate_config(config: &DevConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_server(config, &mut errors);
    validate_chunks(&config.build.rollup_options.output.manual_chunks, &mut errors);
    validate_build_paths(config, &mut errors);

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::InvalidTimeout("connectSecs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::InvalidTimeout("requestSecs"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_server(config: &DevConfig, errors: &mut Vec<ValidationError>) {
    let server = &config.server;
    if server.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if let (HostOption::Address(host), Err(_)) = (&server.host, server.host.bind_ip()) {
        errors.push(ValidationError::InvalidHost(host.clone()));
    }

    for (prefix, rule) in &server.proxy {
        if prefix.is_empty() {
            errors.push(ValidationError::EmptyPrefix);
        } else if !prefix.starts_with('/') {
            errors.push(ValidationError::PrefixNotAbsolute(prefix.clone()));
        }

        match Origin::parse(rule.target()) {
            Ok(origin) if origin.scheme() != "http" => {
                errors.push(ValidationError::InvalidTarget {
                    prefix: prefix.clone(),
                    target: rule.target().to_string(),
                    reason: "the development proxy only speaks plain http upstream".to_string(),
                });
            }
            Ok(origin) => {
                if origin.port() == server.port && origin.is_local() {
                    errors.push(ValidationError::SelfProxy {
                        prefix: prefix.clone(),
                        target: rule.target().to_string(),
                    });
                }
            }
            Err(reason) => errors.push(ValidationError::InvalidTarget {
                prefix: prefix.clone(),
                target: rule.target().to_string(),
                reason,
            }),
        }
    }
}

fn validate_chunks(chunks: &BTreeMap<String, Vec<String>>, errors: &mut Vec<ValidationError>) {
    // module id -> first chunk that claimed it
    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();

    for (name, members) in chunks {
        if name.is_empty() {
            errors.push(ValidationError::EmptyChunkName);
        }

        let mut seen = HashSet::new();
        for module in members {
            if module.is_empty() {
                errors.push(ValidationError::EmptyModuleId(name.clone()));
                continue;
            }
            if !seen.insert(module.as_str()) {
                errors.push(ValidationError::DuplicateChunkMember {
                    chunk: name.clone(),
                    module: module.clone(),
                });
                continue;
            }
            match owners.get(module.as_str()) {
                Some(first) => errors.push(ValidationError::ModuleInMultipleChunks {
                    module: module.clone(),
                    first: first.to_string(),
                    second: name.clone(),
                }),
                None => {
                    owners.insert(module.as_str(), name.as_str());
                }
            }
        }
    }

    for name in chunks.keys() {
        if let Some(&listed_in) = owners.get(name.as_str()).filter(|&&owner| owner != name.as_str()) {
            errors.push(ValidationError::ChunkNameCollision {
                chunk: name.clone(),
                listed_in: listed_in.to_string(),
            });
        }
    }
}

fn validate_build_paths(config: &DevConfig, errors: &mut Vec<ValidationError>) {
    if config.build.out_dir.trim().is_empty() {
        errors.push(ValidationError::EmptyOutDir);
    }

    let assets = Path::new(&config.build.assets_dir);
    let escapes = assets
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        errors.push(ValidationError::InvalidAssetsDir(config.build.assets_dir.clone()));
    }
}
