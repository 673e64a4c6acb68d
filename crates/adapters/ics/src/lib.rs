//! # calswitch-adapter-ics
//!
//! [`CalendarSource`] backed by `.ics` files on disk.
//!
//! A calendar id names either a file or a directory under the configured
//! calendar directory:
//!
//! | Layout | Calendar id `home` reads |
//! |--------|--------------------------|
//! | single file | `<dir>/home.ics` |
//! | one file per event | every `*.ics` file in `<dir>/home/` |
//!
//! The file takes precedence when both exist. Files are re-read on every
//! fetch, so edits show up on the next refresh pass.
//!
//! ## Dependency rule
//!
//! Depends on `calswitch-app` (port traits) and `calswitch-domain` only.

mod error;
mod parse;

pub use error::IcsError;

use std::path::{Path, PathBuf};

use calswitch_app::ports::{CalendarError, CalendarSource};
use calswitch_domain::calendar::{CalendarEvent, CalendarId};
use calswitch_domain::time::TimeWindow;

/// Calendar source reading `.ics` files from one directory.
#[derive(Debug, Clone)]
pub struct IcsCalendarSource {
    directory: PathBuf,
}

enum Location {
    File(PathBuf),
    Directory(PathBuf),
}

impl IcsCalendarSource {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    async fn locate(&self, calendar: &CalendarId) -> Option<Location> {
        let id = calendar.as_str();
        if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) {
            return None;
        }

        let file = self.directory.join(format!("{id}.ics"));
        if tokio::fs::metadata(&file).await.is_ok_and(|m| m.is_file()) {
            return Some(Location::File(file));
        }
        let dir = self.directory.join(id);
        if tokio::fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()) {
            return Some(Location::Directory(dir));
        }
        None
    }
}

async fn read_file(path: &Path) -> Result<Vec<CalendarEvent>, IcsError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IcsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse::parse_events(&content).map_err(|message| IcsError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Read every `*.ics` file of `dir`, in file name order. A file that fails
/// to parse is skipped; failing to list the directory fails the read.
async fn read_directory(dir: &Path) -> Result<Vec<CalendarEvent>, IcsError> {
    let io_error = |source| IcsError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let path = entry.path();
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ics"))
        {
            files.push(path);
        }
    }
    files.sort();

    let mut events = Vec::new();
    for file in files {
        match read_file(&file).await {
            Ok(parsed) => events.extend(parsed),
            Err(err) => tracing::warn!(%err, "skipping unreadable calendar file"),
        }
    }
    Ok(events)
}

impl CalendarSource for IcsCalendarSource {
    async fn fetch_events(
        &self,
        calendar: &CalendarId,
        window: TimeWindow,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let location = self
            .locate(calendar)
            .await
            .ok_or_else(|| CalendarError::NotFound(calendar.clone()))?;

        let result = match &location {
            Location::File(path) => read_file(path).await,
            Location::Directory(dir) => read_directory(dir).await,
        };
        let mut events = result.map_err(|err| CalendarError::Unavailable {
            calendar: calendar.clone(),
            source: Box::new(err),
        })?;

        events.retain(|event| window.overlaps(event.start, event.end));
        tracing::trace!(%calendar, count = events.len(), "read calendar events");
        Ok(events)
    }
}
