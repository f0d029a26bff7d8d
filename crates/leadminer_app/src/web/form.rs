//! Search form fields as submitted, and their conversion into a run request.

use leadminer_core::{FilterMode, ParseFilterModeError};
use leadminer_engine::{ProviderKind, RunId, RunRequest, ValidationError};
use serde::Deserialize;

use crate::config::FormDefaults;

/// Raw form fields. Everything is optional text so a bad value can be echoed
/// back to the user instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchForm {
    pub keyword: Option<String>,
    pub limit: Option<String>,
    pub line_interval: Option<String>,
    pub segment: Option<String>,
    pub filter_mode: Option<String>,
    pub delay: Option<String>,
    pub provider: Option<String>,
    pub require_url: Option<String>,
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },
    #[error(transparent)]
    FilterMode(#[from] ParseFilterModeError),
    #[error("{0}")]
    Provider(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub run_id: RunId,
    pub provider: ProviderKind,
    pub request: RunRequest,
}

/// Current field values used to (re)render the form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    pub keyword: String,
    pub limit: String,
    pub line_interval: String,
    pub segment: bool,
    pub filter_mode: String,
    pub delay: String,
    pub provider: String,
    pub require_url: bool,
}

impl FormValues {
    pub fn from_defaults(defaults: &FormDefaults) -> Self {
        Self {
            keyword: String::new(),
            limit: defaults.limit.to_string(),
            line_interval: defaults.line_interval.to_string(),
            segment: false,
            filter_mode: defaults.filter_mode.clone(),
            delay: defaults.delay.to_string(),
            provider: defaults.provider.clone(),
            require_url: false,
        }
    }
}

fn checked(field: &Option<String>) -> bool {
    field
        .as_deref()
        .is_some_and(|value| matches!(value.trim(), "on" | "true" | "1" | "yes"))
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn number<T: std::str::FromStr>(
    field: &'static str,
    raw: Option<&str>,
    default: T,
) -> Result<T, FormError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| FormError::NotANumber {
            field,
            value: value.to_owned(),
        }),
    }
}

impl SearchForm {
    /// Values to show when the form is rendered again, blanks filled from `defaults`.
    pub fn values(&self, defaults: &FormDefaults) -> FormValues {
        let base = FormValues::from_defaults(defaults);
        let or = |field: &Option<String>, fallback: String| {
            present(field).map(str::to_owned).unwrap_or(fallback)
        };
        FormValues {
            keyword: self.keyword.clone().unwrap_or_default(),
            limit: or(&self.limit, base.limit),
            line_interval: or(&self.line_interval, base.line_interval),
            segment: checked(&self.segment),
            filter_mode: or(&self.filter_mode, base.filter_mode),
            delay: or(&self.delay, base.delay),
            provider: or(&self.provider, base.provider),
            require_url: checked(&self.require_url),
        }
    }

    /// The run id the page was rendered with, or a fresh one if it is missing or garbled.
    pub fn run_id(&self) -> RunId {
        present(&self.run_id)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn parse(&self, defaults: &FormDefaults) -> Result<Submission, FormError> {
        let limit = number("limit", present(&self.limit), defaults.limit)?;
        let delay = number("delay", present(&self.delay), defaults.delay)?;
        let line_interval = if checked(&self.segment) {
            Some(number(
                "line_interval",
                present(&self.line_interval),
                defaults.line_interval,
            )?)
        } else {
            None
        };
        let mode: FilterMode = present(&self.filter_mode)
            .unwrap_or(defaults.filter_mode.as_str())
            .parse()?;
        let provider: ProviderKind = present(&self.provider)
            .unwrap_or(defaults.provider.as_str())
            .parse()
            .map_err(FormError::Provider)?;

        let request = RunRequest {
            limit,
            mode,
            line_interval,
            delay_seconds: delay,
            require_url: checked(&self.require_url),
            ..RunRequest::new(self.keyword.as_deref().unwrap_or_default().trim())
        };
        request.validate()?;

        Ok(Submission {
            run_id: self.run_id(),
            provider,
            request,
        })
    }
}
