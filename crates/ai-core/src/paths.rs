//! Home directory resolution and path computation.
//!
//! Path methods are pure computations with no I/O; they only construct
//! `PathBuf` values below the home directory.

use dirs_next::home_dir;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "AI_HOME";

/// Directory name used below the user's home when no override is given.
pub const DEFAULT_DIR_NAME: &str = ".ai";

/// Trait providing path computation for the files the session engine reads and writes.
pub trait StatePaths {
    /// Root directory holding every resource.
    fn home(&self) -> &Path;

    /// Path to the key=value settings file
    fn settings_file(&self) -> PathBuf {
        self.home().join("ai.conf")
    }

    /// Path to the rolling context (a single JSON array)
    fn context_file(&self) -> PathBuf {
        self.home().join("context.json")
    }

    /// Path to the persistent notes merged into every prompt
    fn notes_file(&self) -> PathBuf {
        self.home().join("notes.md")
    }

    /// Path to the stored system prompt
    fn system_prompt_file(&self) -> PathBuf {
        self.home().join("system_prompt.md")
    }
}

/// Resolved home directory for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    home: PathBuf,
}

impl AppPaths {
    pub fn new(home: PathBuf) -> Self {
        Self { home }
    }

    /// Resolve the home directory.
    ///
    /// Precedence:
    /// 1. `home_override` (the `--home` flag)
    /// 2. `AI_HOME` environment variable
    /// 3. `~/.ai`
    pub fn resolve(home_override: Option<PathBuf>) -> io::Result<Self> {
        let home = if let Some(path) = home_override {
            path
        } else if let Ok(ai_home) = std::env::var(HOME_ENV)
            && !ai_home.is_empty()
        {
            PathBuf::from(ai_home)
        } else {
            home_dir()
                .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Home directory not found"))?
                .join(DEFAULT_DIR_NAME)
        };
        Ok(Self::new(home))
    }
}

impl StatePaths for AppPaths {
    fn home(&self) -> &Path {
        &self.home
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_files_live_under_home() {
        let paths = AppPaths::new(PathBuf::from("/srv/ai"));
        assert_eq!(paths.settings_file(), PathBuf::from("/srv/ai/ai.conf"));
        assert_eq!(paths.context_file(), PathBuf::from("/srv/ai/context.json"));
        assert_eq!(paths.notes_file(), PathBuf::from("/srv/ai/notes.md"));
        assert_eq!(
            paths.system_prompt_file(),
            PathBuf::from("/srv/ai/system_prompt.md")
        );
    }

    #[test]
    #[serial]
    fn test_override_beats_env() {
        // SAFETY: serialized with every other test touching AI_HOME
        unsafe { std::env::set_var(HOME_ENV, "/from/env") };
        let paths = AppPaths::resolve(Some(PathBuf::from("/from/flag"))).unwrap();
        unsafe { std::env::remove_var(HOME_ENV) };
        assert_eq!(paths.home(), Path::new("/from/flag"));
    }

    #[test]
    #[serial]
    fn test_env_used_without_override() {
        unsafe { std::env::set_var(HOME_ENV, "/from/env") };
        let paths = AppPaths::resolve(None).unwrap();
        unsafe { std::env::remove_var(HOME_ENV) };
        assert_eq!(paths.home(), Path::new("/from/env"));
    }

    #[test]
    #[serial]
    fn test_default_is_dot_dir_in_home() {
        unsafe { std::env::remove_var(HOME_ENV) };
        if let Ok(paths) = AppPaths::resolve(None) {
            assert!(paths.home().ends_with(DEFAULT_DIR_NAME));
        }
    }
}
