use std::path::PathBuf;

/// Failure to load events from an `.ics` file.
#[derive(Debug, thiserror::Error)]
pub enum IcsError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}
