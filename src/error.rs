use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::contributors::{ContributorsError, GatewayError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Report(serde_json::Error),
    Gateway(GatewayError),
    Workflow(ContributorsError),
    Interrupted,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Report(err) => write!(f, "invalid report payload: {}", err),
            AppError::Gateway(err) => write!(f, "crowdin client error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
            AppError::Interrupted => write!(f, "interrupted before completion"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Report(err) => Some(err),
            AppError::Gateway(err) => Some(err),
            AppError::Workflow(err) => Some(err),
            AppError::Interrupted => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Report(value)
    }
}

impl From<GatewayError> for AppError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway(value)
    }
}

impl From<ContributorsError> for AppError {
    fn from(value: ContributorsError) -> Self {
        Self::Workflow(value)
    }
}
