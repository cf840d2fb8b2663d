use std::path::PathBuf;

/// Errors that can occur across doi.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary converts to `miette::Report` at the boundary, where
/// the diagnostic code and help text are rendered.
///
/// # Examples
///
/// ```
/// use doi_core::DoiError;
///
/// let err = DoiError::Git("not a repository".into());
/// assert!(err.to_string().contains("not a repository"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DoiError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(doi::config), help("check .doi.toml or run `doi init` for a template"))]
    Config(String),

    /// Git invocation failure or rejected git argument.
    #[error("git error: {0}")]
    #[diagnostic(code(doi::git), help("run inside a git repository and pass an existing --base branch"))]
    Git(String),

    /// Git output that could not be parsed.
    #[error("parse error: {0}")]
    #[diagnostic(code(doi::parse))]
    Parse(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DoiError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn parse_error_displays_message() {
        let err = DoiError::Parse("bad numstat line".into());
        assert_eq!(err.to_string(), "parse error: bad numstat line");
    }

    #[test]
    fn json_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: DoiError = json_err.into();
        assert!(err.to_string().starts_with("serialization error"));
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = DoiError::FileNotFound(PathBuf::from(".doi/vibe-debt/x.json"));
        assert!(err.to_string().contains(".doi/vibe-debt/x.json"));
    }

    #[test]
    fn git_error_has_diagnostic_code() {
        use miette::Diagnostic;

        let err = DoiError::Git("unknown revision".into());
        assert_eq!(err.code().unwrap().to_string(), "doi::git");
        assert!(err.help().is_some());
    }
}
