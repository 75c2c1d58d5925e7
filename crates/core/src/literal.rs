//! Validation and quoting of configuration values embedded in SQL text.
//!
//! COPY statements cannot take bind parameters, so role ARNs, S3 URIs and
//! regions are interpolated. Every such value is validated when the
//! configuration is loaded and quoted again when the statement is rendered.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

use crate::error::{Error, Result};

/// IAM role ARN: `arn:<partition>:iam::<account>:role/<path/name>`.
pub const ROLE_ARN_PATTERN: &str = r"^arn:aws(-[a-z]+)*:iam::\d{12}:role/[A-Za-z0-9+=,.@_/-]{1,512}$";

/// AWS region, e.g. `us-west-2` or `us-gov-west-1`.
pub const REGION_PATTERN: &str = r"^[a-z]{2}(-gov)?-[a-z]+-\d$";

static ROLE_ARN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ROLE_ARN_PATTERN).expect("invalid role ARN pattern"));

static REGION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(REGION_PATTERN).expect("invalid region pattern"));

/// Rejects characters that could terminate or escape a quoted literal.
pub fn ensure_literal_safe(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_value(key, "value is empty"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| matches!(c, '\'' | '\\' | ';') || c.is_control())
    {
        return Err(Error::invalid_value(
            key,
            format!("character {:?} is not allowed", c),
        ));
    }
    Ok(())
}

/// Renders `value` as a single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn validate_role_arn(key: &str, value: &str) -> Result<()> {
    ensure_literal_safe(key, value)?;
    if !ROLE_ARN_REGEX.is_match(value) {
        return Err(Error::invalid_value(
            key,
            "expected arn:aws:iam::<account-id>:role/<name>",
        ));
    }
    Ok(())
}

pub fn validate_region(key: &str, value: &str) -> Result<()> {
    ensure_literal_safe(key, value)?;
    if !REGION_REGEX.is_match(value) {
        return Err(Error::invalid_value(key, format!("'{}' is not a region", value)));
    }
    Ok(())
}

/// Validates an `s3://bucket/prefix` URI.
pub fn validate_s3_uri(key: &str, value: &str) -> Result<()> {
    ensure_literal_safe(key, value)?;
    let url = Url::parse(value).map_err(|e| Error::invalid_value(key, e))?;
    if url.scheme() != "s3" {
        return Err(Error::invalid_value(
            key,
            format!("scheme must be s3, got '{}'", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::invalid_value(key, "bucket name is missing"));
    }
    Ok(())
}

/// How COPY maps JSON documents onto staging columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// Match top-level keys to column names.
    Auto,
    /// Same as `Auto`, ignoring key case.
    AutoIgnoreCase,
    /// JSONPaths file at the given S3 URI.
    Paths(String),
}

impl JsonFormat {
    /// Parses a configured value: `auto`, `auto ignorecase` or an S3 URI.
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "auto ignorecase" => Ok(Self::AutoIgnoreCase),
            _ => {
                validate_s3_uri(key, trimmed)?;
                Ok(Self::Paths(trimmed.to_string()))
            }
        }
    }

    /// Argument of the `JSON` clause, without quotes.
    pub fn as_arg(&self) -> &str {
        match self {
            Self::Auto => "auto",
            Self::AutoIgnoreCase => "auto ignorecase",
            Self::Paths(uri) => uri,
        }
    }
}

impl fmt::Display for JsonFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}
