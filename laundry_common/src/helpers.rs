use std::{env, fmt::Display, str::FromStr};

/// Why an environment variable could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValueError {
    Missing,
    Invalid(String),
}

/// Reads and parses the environment variable `key`. Callers decide how to report a missing or malformed value.
pub fn env_value<T>(key: &str) -> Result<T, EnvValueError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).map_err(|_| EnvValueError::Missing)?;
    raw.trim().parse::<T>().map_err(|e| EnvValueError::Invalid(format!("'{raw}' is not valid for {key}. {e}")))
}
