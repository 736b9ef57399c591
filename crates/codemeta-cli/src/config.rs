use crate::errors::CliError;
use codemeta_generator::CodemetaVersion;
use codemeta_generator::repository::DEFAULT_THRESHOLD;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::{
    env, fmt,
    fs::File,
    io::{self, BufRead},
    path::{Path, PathBuf},
};
use tracing::{Level, event, level_filters::LevelFilter};
use tracing_subscriber::{Registry, reload::Handle};

pub const DEFAULT_CONFIG_FILE: &str = "conf/codemeta-conf.toml";
pub const DEFAULT_METADATA_SERVICE: &str = "http://127.0.0.1:7979";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ContextsConfig {
    #[serde(default)]
    pub v2_path: String,
    #[serde(default)]
    pub v3_path: String,
    #[serde(default)]
    pub remote: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RepositoryConfig {
    #[serde(default)]
    pub service_url: String,
    #[serde(default)]
    pub default_repository: String,
    #[serde(default)]
    pub threshold: String,
    #[serde(default)]
    pub ignore_classifiers: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            service_url: DEFAULT_METADATA_SERVICE.into(),
            default_repository: String::new(),
            threshold: DEFAULT_THRESHOLD.to_string(),
            ignore_classifiers: "false".into(),
        }
    }
}

/// ConfigRaw Struct is used to deserialize the configuration file
/// We then convert this to the Config Struct
#[derive(Debug, Serialize, Deserialize)]
struct ConfigRaw {
    #[serde(default)]
    pub log_level: String,
    #[serde(default)]
    pub default_version: String,
    #[serde(default)]
    pub state_file: String,
    #[serde(default)]
    pub contexts: ContextsConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
}

/// Where the vocabulary contexts come from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextSource {
    /// Local copies of the 2.0 and 3.0 contexts; the bundled ones when `None`.
    pub paths: Option<(PathBuf, PathBuf)>,
    /// Fetch contexts other than the CodeMeta ones over HTTP.
    pub remote: bool,
}

pub struct Config {
    pub log_level: LevelFilter,
    pub default_version: CodemetaVersion,
    pub contexts: ContextSource,
    pub state_file: Option<PathBuf>,
    pub metadata_service_url: String,
    pub default_repository: Option<String>,
    pub threshold: f64,
    pub ignore_classifiers: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("default_version", &self.default_version.to_string())
            .field("contexts", &self.contexts)
            .field("state_file", &self.state_file)
            .field("metadata_service_url", &self.metadata_service_url)
            .field("default_repository", &self.default_repository)
            .field("threshold", &self.threshold)
            .field("ignore_classifiers", &self.ignore_classifiers)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LevelFilter::INFO,
            default_version: CodemetaVersion::default(),
            contexts: ContextSource::default(),
            state_file: None,
            metadata_service_url: DEFAULT_METADATA_SERVICE.into(),
            default_repository: None,
            threshold: DEFAULT_THRESHOLD,
            ignore_classifiers: false,
        }
    }
}

impl TryFrom<ConfigRaw> for Config {
    type Error = CliError;

    fn try_from(raw: ConfigRaw) -> Result<Self, Self::Error> {
        let default_version = match raw.default_version.trim() {
            "" => CodemetaVersion::default(),
            version => version.parse().map_err(|err| {
                CliError::Config(format!("default_version ({version}) is invalid: {err}"))
            })?,
        };

        let contexts = match (non_empty(raw.contexts.v2_path), non_empty(raw.contexts.v3_path)) {
            (Some(v2), Some(v3)) => Some((PathBuf::from(v2), PathBuf::from(v3))),
            (None, None) => None,
            _ => {
                return Err(CliError::Config(
                    "contexts.v2_path and contexts.v3_path must be set together".into(),
                ));
            }
        };

        let threshold = match raw.repository.threshold.trim() {
            "" => DEFAULT_THRESHOLD,
            threshold => threshold.parse().map_err(|err| {
                CliError::Config(format!("repository.threshold ({threshold}) is invalid: {err}"))
            })?,
        };

        Ok(Config {
            log_level: parse_log_level(&raw.log_level),
            default_version,
            contexts: ContextSource {
                paths: contexts,
                remote: raw.contexts.remote.parse().unwrap_or(false),
            },
            state_file: non_empty(raw.state_file).map(PathBuf::from),
            metadata_service_url: non_empty(raw.repository.service_url)
                .unwrap_or_else(|| DEFAULT_METADATA_SERVICE.into()),
            default_repository: non_empty(raw.repository.default_repository),
            threshold,
            ignore_classifiers: raw.repository.ignore_classifiers.parse().unwrap_or(false),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "" => LevelFilter::INFO,
        other => {
            event!(
                Level::WARN,
                "log_level({}) is unknown in config file. Defaults to INFO",
                other
            );
            LevelFilter::INFO
        }
    }
}

/// Reads and parses the configuration file, expanding environment variables.
fn read_config_file(file_name: &Path) -> Result<ConfigRaw, CliError> {
    event!(Level::INFO, "Config file({})", file_name.display());
    let raw_config = read_file_lines(file_name)?;

    event!(Level::DEBUG, "raw_config = {:?}", raw_config);
    let config_with_vars = expand_env_vars(&raw_config)?;
    toml::from_str(&config_with_vars.join("\n")).map_err(|err| {
        event!(
            Level::ERROR,
            "Could not parse configuration settings. {:?}",
            err
        );
        CliError::Config(format!(
            "Could not parse configuration settings. Reason: {err}"
        ))
    })
}

/// Reads a file and returns one string per line, dropping lines starting
/// with a # (comments).
pub(crate) fn read_file_lines<P>(file_name: P) -> Result<Vec<String>, CliError>
where
    P: AsRef<Path>,
{
    let file = File::open(file_name.as_ref()).map_err(|err| {
        event!(
            Level::ERROR,
            "Could not open file({}). {}",
            file_name.as_ref().display(),
            err
        );
        CliError::io(file_name.as_ref().display(), err)
    })?;

    Ok(io::BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter(|line| !line.starts_with('#'))
        .collect())
}

/// Replaces all strings ${VAR_NAME:default_value}
/// with the corresponding environment variables (e.g. value of ${VAR_NAME})
/// or with `default_value` if the variable is not defined.
fn expand_env_vars(raw_config: &[String]) -> Result<Vec<String>, CliError> {
    let re = Regex::new(r"\$\{(?P<env_var>[A-Z_]{1,}[0-9A-Z_]*):(?P<default_value>.*?)\}")
        .map_err(|err| CliError::Config(format!("Invalid variable pattern: {err}")))?;
    Ok(raw_config
        .iter()
        .map(|line| {
            re.replace_all(line, |caps: &Captures| match env::var(&caps["env_var"]) {
                Ok(val) => val,
                Err(_) => caps["default_value"].into(),
            })
            .into_owned()
        })
        .collect())
}

/// Loads the configuration and applies its log level.
///
/// Without an explicit file, a missing `conf/codemeta-conf.toml` means defaults.
pub fn init(
    file_name: Option<&Path>,
    reload_handle: Option<Handle<LevelFilter, Registry>>,
) -> Result<Config, CliError> {
    let config = match file_name {
        Some(file_name) => Config::try_from(read_config_file(file_name)?)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Config::try_from(read_config_file(Path::new(DEFAULT_CONFIG_FILE))?)?
        }
        None => {
            event!(Level::DEBUG, "no configuration file, using defaults");
            Config::default()
        }
    };

    if let Some(reload_handle) = reload_handle {
        reload_handle
            .modify(|filter| *filter = config.log_level)
            .map_err(|e| CliError::Config(e.to_string()))?;
        event!(Level::DEBUG, "Log level set to ({})", config.log_level);
    }

    event!(
        Level::DEBUG,
        "Configuration settings parsed successfully.\n{:#?}",
        config
    );
    Ok(config)
}
