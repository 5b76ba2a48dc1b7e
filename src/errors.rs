//! Top-level shell errors.

use tabshell_core_types::TabId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("config i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid home url: {0}")]
    InvalidHomeUrl(url::ParseError),
    #[error("no such tab: {0}")]
    TabNotFound(TabId),
}
