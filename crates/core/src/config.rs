//! Pipeline configuration.
//!
//! Configuration comes from an INI file (`dwh.cfg`) with `[CLUSTER]`,
//! `[IAM_ROLE]`, `[S3]` and `[PIPELINE]` sections, overridden by
//! `DWH_<SECTION>__<KEY>` environment variables. Values are handed to the
//! statement builders explicitly; nothing is kept in process-wide state.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::literal::{self, JsonFormat};

/// Region the dataset buckets live in.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "DWH";

fn default_db_name() -> String {
    "dwh".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    30
}

/// How the runner groups statements into transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Every statement commits on its own.
    #[default]
    Autocommit,
    /// The whole run is one transaction, rolled back on the first failure.
    Transaction,
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "autocommit" => Ok(Self::Autocommit),
            "transaction" => Ok(Self::Transaction),
            other => Err(format!("unknown execution mode '{}'", other)),
        }
    }
}

/// How the `users` dimension handles a user seen with several levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserLevelPolicy {
    /// One row per user, taken from the user's most recent event.
    #[default]
    Latest,
    /// `SELECT DISTINCT` over the full row. A level change yields two rows
    /// for the same `user_id`.
    Distinct,
}

impl FromStr for UserLevelPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "distinct" => Ok(Self::Distinct),
            other => Err(format!("unknown user level policy '{}'", other)),
        }
    }
}

/// Warehouse endpoint and credentials (`[CLUSTER]`).
#[derive(Clone, Validate)]
pub struct ClusterConfig {
    #[validate(length(min = 1, message = "HOST is required"))]
    pub host: String,
    #[validate(length(min = 1, message = "DB_NAME is required"))]
    pub db_name: String,
    #[validate(length(min = 1, message = "DB_USER is required"))]
    pub db_user: String,
    pub db_password: String,
    #[validate(range(min = 1, message = "DB_PORT must be positive"))]
    pub db_port: u16,
    /// Refuse a session the server will not encrypt
    pub require_tls: bool,
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"***")
            .field("db_port", &self.db_port)
            .field("require_tls", &self.require_tls)
            .finish()
    }
}

/// Role the warehouse assumes to read the dataset buckets (`[IAM_ROLE]`).
#[derive(Debug, Clone, Validate)]
pub struct IamRoleConfig {
    #[validate(custom(function = "role_arn"))]
    pub arn: String,
}

/// Dataset locations (`[S3]`).
#[derive(Debug, Clone, Validate)]
pub struct S3Config {
    #[validate(custom(function = "s3_uri"))]
    pub log_data: String,
    #[validate(custom(function = "json_format"))]
    pub log_jsonpath: String,
    #[validate(custom(function = "s3_uri"))]
    pub song_data: String,
    #[validate(custom(function = "region"))]
    pub region: String,
}

/// Runner behaviour (`[PIPELINE]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub dialect: Dialect,
    pub execution_mode: ExecutionMode,
    pub user_level_policy: UserLevelPolicy,
    pub connect_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            execution_mode: ExecutionMode::default(),
            user_level_policy: UserLevelPolicy::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Validated inputs of the COPY generator.
#[derive(Debug, Clone)]
pub struct CopyOptions {
    pub role_arn: String,
    pub region: String,
    pub log_data: String,
    pub log_format: JsonFormat,
    pub song_data: String,
}

/// Complete pipeline configuration.
///
/// Sections are validated when first needed, so rendering DDL does not
/// require credentials and a Postgres run does not require S3 paths.
#[derive(Debug, Clone)]
pub struct DwhConfig {
    pub cluster: ClusterConfig,
    pub iam_role: IamRoleConfig,
    pub s3: S3Config,
    pub pipeline: PipelineConfig,
}

impl DwhConfig {
    /// Load from an INI file plus environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::missing(format!(
                "configuration file {} not found",
                path.display()
            )));
        }
        let builder = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Ini))
            .add_source(env_source());
        Self::from_builder(builder)
    }

    /// Load from INI text plus environment overrides.
    pub fn from_ini_str(text: &str) -> Result<Self> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::from_str(text, ::config::FileFormat::Ini))
            .add_source(env_source());
        Self::from_builder(builder)
    }

    /// Load from environment variables only.
    pub fn from_env() -> Result<Self> {
        Self::from_builder(::config::Config::builder().add_source(env_source()))
    }

    fn from_builder(
        builder: ::config::ConfigBuilder<::config::builder::DefaultState>,
    ) -> Result<Self> {
        let source = builder
            .build()
            .map_err(|e| Error::missing(format!("failed to read configuration: {}", e)))?;
        Self::from_source(&Source(source))
    }

    fn from_source(source: &Source) -> Result<Self> {
        let dialect = source
            .parse::<Dialect>("PIPELINE", "DIALECT")?
            .unwrap_or_default();

        let pipeline = PipelineConfig {
            dialect,
            execution_mode: source
                .parse("PIPELINE", "EXECUTION_MODE")?
                .unwrap_or_default(),
            user_level_policy: source
                .parse("PIPELINE", "USER_LEVEL_POLICY")?
                .unwrap_or_default(),
            connect_timeout_secs: source
                .parse("PIPELINE", "CONNECT_TIMEOUT_SECS")?
                .unwrap_or_else(default_connect_timeout_secs),
        };

        let cluster = ClusterConfig {
            host: source.get("CLUSTER", "HOST").unwrap_or_default(),
            db_name: source
                .get("CLUSTER", "DB_NAME")
                .unwrap_or_else(default_db_name),
            db_user: source.get("CLUSTER", "DB_USER").unwrap_or_default(),
            db_password: source.get("CLUSTER", "DB_PASSWORD").unwrap_or_default(),
            db_port: source
                .parse("CLUSTER", "DB_PORT")?
                .unwrap_or_else(|| dialect.default_port()),
            require_tls: source.parse("CLUSTER", "REQUIRE_TLS")?.unwrap_or(false),
        };

        let iam_role = IamRoleConfig {
            arn: source.get("IAM_ROLE", "ARN").unwrap_or_default(),
        };

        let s3 = S3Config {
            log_data: source.get("S3", "LOG_DATA").unwrap_or_default(),
            log_jsonpath: source.get("S3", "LOG_JSONPATH").unwrap_or_default(),
            song_data: source.get("S3", "SONG_DATA").unwrap_or_default(),
            region: source
                .get("S3", "REGION")
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        };

        Ok(Self {
            cluster,
            iam_role,
            s3,
            pipeline,
        })
    }

    /// Validated `[CLUSTER]` section.
    pub fn cluster(&self) -> Result<&ClusterConfig> {
        self.cluster
            .validate()
            .map_err(|e| Error::invalid_value("CLUSTER", flatten(&e)))?;
        Ok(&self.cluster)
    }

    /// Validated `[IAM_ROLE]` and `[S3]` values for COPY.
    pub fn copy_options(&self) -> Result<CopyOptions> {
        if self.iam_role.arn.is_empty() {
            return Err(Error::missing("IAM_ROLE.ARN is required for COPY"));
        }
        for (key, value) in [
            ("S3.LOG_DATA", &self.s3.log_data),
            ("S3.LOG_JSONPATH", &self.s3.log_jsonpath),
            ("S3.SONG_DATA", &self.s3.song_data),
        ] {
            if value.is_empty() {
                return Err(Error::missing(format!("{} is required for COPY", key)));
            }
        }
        self.iam_role
            .validate()
            .map_err(|e| Error::invalid_value("IAM_ROLE", flatten(&e)))?;
        self.s3
            .validate()
            .map_err(|e| Error::invalid_value("S3", flatten(&e)))?;

        Ok(CopyOptions {
            role_arn: self.iam_role.arn.clone(),
            region: self.s3.region.clone(),
            log_data: self.s3.log_data.clone(),
            log_format: JsonFormat::parse("S3.LOG_JSONPATH", &self.s3.log_jsonpath)?,
            song_data: self.s3.song_data.clone(),
        })
    }
}

fn env_source() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(false)
}

/// Case-insensitive view over the merged sources.
///
/// INI sections and keys are conventionally upper case while environment
/// keys arrive lower case; the lower-case spelling wins so environment
/// overrides always take precedence.
struct Source(::config::Config);

impl Source {
    fn get(&self, section: &str, key: &str) -> Option<String> {
        let lower = format!("{}.{}", section.to_ascii_lowercase(), key.to_ascii_lowercase());
        let exact = format!("{}.{}", section, key);
        self.0
            .get_string(&lower)
            .or_else(|_| self.0.get_string(&exact))
            .ok()
            .map(|v| unquote(v.trim()).to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, section: &str, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(section, key) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| Error::invalid_value(&format!("{}.{}", section, key), e)),
            None => Ok(None),
        }
    }
}

/// Strips one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn flatten(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

fn to_validation_error(code: &'static str, err: Error) -> ValidationError {
    let mut out = ValidationError::new(code);
    out.message = Some(Cow::from(err.to_string()));
    out
}

fn role_arn(value: &str) -> std::result::Result<(), ValidationError> {
    literal::validate_role_arn("ARN", value).map_err(|e| to_validation_error("role_arn", e))
}

fn s3_uri(value: &str) -> std::result::Result<(), ValidationError> {
    literal::validate_s3_uri("uri", value).map_err(|e| to_validation_error("s3_uri", e))
}

fn json_format(value: &str) -> std::result::Result<(), ValidationError> {
    JsonFormat::parse("LOG_JSONPATH", value)
        .map(|_| ())
        .map_err(|e| to_validation_error("json_format", e))
}

fn region(value: &str) -> std::result::Result<(), ValidationError> {
    literal::validate_region("REGION", value).map_err(|e| to_validation_error("region", e))
}
