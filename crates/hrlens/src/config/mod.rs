use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

pub const DATABASE_PATH_ENV: &str = "HR_DATABASE_PATH";
pub const API_KEY_ENV: &str = "API_KEY";
pub const ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";
pub const DEPLOYMENT_ENV: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const API_VERSION_ENV: &str = "AZURE_OPENAI_API_VERSION";
pub const TIMEOUT_ENV: &str = "HRLENS_LLM_TIMEOUT_SECS";
pub const REPORTING_YEAR_ENV: &str = "HRLENS_REPORTING_YEAR";

pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o";
pub const DEFAULT_API_VERSION: &str = "2024-02-01";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REPORTING_YEAR: i32 = 2024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub home_dir: PathBuf,
    pub cwd: PathBuf,
    pub database_path: PathBuf,
    pub generative: Option<GenerativeSettings>,
    pub reporting_year: i32,
}

#[derive(Clone, PartialEq, Eq)]
pub struct GenerativeSettings {
    pub api_key: String,
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for GenerativeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerativeSettings")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Resolves every runtime value once. `env` is the variable lookup, usually
/// `std::env::var(..).ok()`.
pub fn resolve_runtime_settings(
    home_dir: &Path,
    cwd: &Path,
    database_override: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<RuntimeSettings> {
    if !home_dir.is_absolute() {
        bail!("home_dir must be absolute: {}", home_dir.display());
    }
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }

    let home_dir = normalize_lexical(home_dir);
    let cwd = normalize_lexical(cwd);
    let env_database = non_blank(&env, DATABASE_PATH_ENV).map(PathBuf::from);
    let database_path = match database_override.map(Path::to_path_buf).or(env_database) {
        Some(path) => resolve_user_path(&path, &home_dir, &cwd)?,
        None => home_dir.join(".hrlens").join("hr_data.sqlite"),
    };

    let generative = resolve_generative_settings(&env)?;
    let reporting_year = match non_blank(&env, REPORTING_YEAR_ENV) {
        Some(raw) => raw
            .trim()
            .parse::<i32>()
            .with_context(|| format!("{REPORTING_YEAR_ENV} must be a year, got `{raw}`"))?,
        None => DEFAULT_REPORTING_YEAR,
    };

    Ok(RuntimeSettings {
        home_dir,
        cwd,
        database_path: normalize_lexical(&database_path),
        generative,
        reporting_year,
    })
}

fn resolve_generative_settings(
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Option<GenerativeSettings>> {
    let api_key = non_blank(env, API_KEY_ENV);
    let endpoint = non_blank(env, ENDPOINT_ENV);
    let (Some(api_key), Some(endpoint)) = (api_key, endpoint) else {
        return Ok(None);
    };

    let timeout_secs = match non_blank(env, TIMEOUT_ENV) {
        Some(raw) => {
            let secs = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{TIMEOUT_ENV} must be a positive integer, got `{raw}`"))?;
            if secs == 0 {
                bail!("{TIMEOUT_ENV} must be a positive integer, got `{raw}`");
            }
            secs
        }
        None => DEFAULT_TIMEOUT_SECS,
    };

    Ok(Some(GenerativeSettings {
        api_key,
        endpoint: endpoint.trim().to_string(),
        deployment: non_blank(env, DEPLOYMENT_ENV)
            .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
        api_version: non_blank(env, API_VERSION_ENV)
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        timeout_secs,
    }))
}

fn non_blank(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).filter(|value| !value.trim().is_empty())
}

fn resolve_user_path(path: &Path, home_dir: &Path, cwd: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path, home_dir)?;
    let resolved = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    Ok(normalize_lexical(&resolved))
}

fn expand_tilde(path: &Path, home_dir: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let mut expanded = home_dir.to_path_buf();
            for component in components {
                expanded.push(component.as_os_str());
            }
            Ok(expanded)
        }
        Some(Component::Normal(first))
            if first
                .to_str()
                .is_some_and(|segment| segment.starts_with('~')) =>
        {
            bail!(
                "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
                path.display()
            )
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }

    normalized
}
