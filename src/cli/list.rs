//! Shared plumbing for list commands
//!
//! Every list goes through a [`RemoteListFetcher`]: subscribe, wait for the
//! state to settle, then render loading, error or rows.

use std::time::Duration;

use anyhow::{bail, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::output::Output;
use crate::backend::Client;
use crate::fetch::{FetchState, RemoteListFetcher};
use crate::storage::{Project, ProjectConfig};

/// An open project with a client over its database
pub struct Session {
    pub project: Project,
    pub client: Client,
}

impl Session {
    pub fn open() -> Result<Self> {
        let project = Project::open_current()?;
        let client = project.client()?;
        Ok(Self { project, client })
    }

    pub fn settings(&self) -> &ProjectConfig {
        &self.project.config().project
    }
}

/// Subscribes with `filter` and blocks until the fetch settles or times out
pub fn fetch<T, F>(
    fetcher: &RemoteListFetcher<T, F>,
    filter: Option<F>,
    timeout: Duration,
) -> FetchState<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
    F: Into<Value>,
{
    fetcher.subscribe(filter);
    if fetcher.is_loading() {
        tracing::info!(table = fetcher.spec().table, "loading...");
    }
    fetcher.wait_settled(timeout)
}

/// Unwraps a settled state into its rows
pub fn rows<T>(table: &str, state: FetchState<T>, timeout: Duration) -> Result<Vec<T>> {
    match state {
        FetchState::Loaded(rows) => Ok(rows),
        FetchState::Failed(error) => {
            tracing::warn!(table, kind = %error.kind, "list failed");
            bail!("Failed to load {}: {}", table, error)
        }
        FetchState::Loading => bail!(
            "Timed out after {}s waiting for {}",
            timeout.as_secs(),
            table
        ),
    }
}

/// Renders a list state
///
/// JSON output is the `{data, loading, error}` view whatever the outcome;
/// text output goes through `text`. A failed or unsettled fetch is returned
/// as an error after rendering.
pub fn render<T: Serialize>(
    output: &Output,
    table: &str,
    state: FetchState<T>,
    timeout: Duration,
    text: impl FnOnce(&[T]),
) -> Result<()> {
    if output.is_json() {
        let failed = !matches!(state, FetchState::Loaded(_));
        let view = state.into_view();
        output.data(&view);
        if failed {
            match view.error {
                Some(error) => bail!("Failed to load {}: {}", table, error),
                None => bail!(
                    "Timed out after {}s waiting for {}",
                    timeout.as_secs(),
                    table
                ),
            }
        }
        return Ok(());
    }

    let rows = rows(table, state, timeout)?;
    text(&rows);
    Ok(())
}

/// Shortens free text for table columns
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
        short.push_str("...");
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ErrorKind;
    use crate::fetch::ErrorInfo;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[test]
    fn rows_from_states() {
        let loaded: FetchState<u32> = FetchState::Loaded(vec![1, 2]);
        assert_eq!(rows("t", loaded, TIMEOUT).unwrap(), vec![1, 2]);

        let failed: FetchState<u32> =
            FetchState::Failed(ErrorInfo::new(ErrorKind::Permission, "read-only"));
        let err = rows("t", failed, TIMEOUT).unwrap_err();
        assert!(err.to_string().contains("permission error: read-only"));

        let loading: FetchState<u32> = FetchState::Loading;
        let err = rows("t", loading, TIMEOUT).unwrap_err();
        assert!(err.to_string().contains("Timed out after 1s"));
    }

    #[test]
    fn truncate_long_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long description", 10), "a very ...");
    }
}
