//! Access to the host process environment used by label handlers.

use std::path::PathBuf;

use crate::error::{AutoRunError, Result};

/// Host lookups performed while applying labels.
///
/// `env` reads process environment variables and `mount-local-dir-to`
/// reads the working directory; both go through this trait.
pub trait HostEnv {
    /// Look up an environment variable. `Ok(None)` when it is not set.
    fn var(&self, name: &str) -> Result<Option<String>>;

    /// Current working directory.
    fn current_dir(&self) -> Result<PathBuf>;
}

/// [`HostEnv`] backed by the real process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl HostEnv for ProcessEnv {
    fn var(&self, name: &str) -> Result<Option<String>> {
        match std::env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(AutoRunError::EnvironmentUnavailable(
                format!("environment variable {name} is not valid unicode"),
            )),
        }
    }

    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().map_err(|e| {
            AutoRunError::EnvironmentUnavailable(format!("cannot determine working directory: {e}"))
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_env_missing_var() {
        let host = ProcessEnv;
        let value = host.var("AUTORUN_TEST_SURELY_UNSET_VARIABLE").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_process_env_current_dir() {
        let host = ProcessEnv;
        assert_eq!(host.current_dir().unwrap(), std::env::current_dir().unwrap());
    }
}
