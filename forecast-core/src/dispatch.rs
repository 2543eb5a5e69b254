//! Getting a generated forecast out of the tool: the system clipboard and
//! the external pages the user is sent to.

use thiserror::Error;

pub mod clipboard;
pub mod links;

pub use clipboard::{ArboardClipboard, Clipboard};
pub use links::{
    FallbackLink, LinkPurpose, LinkRegistry, LinkTarget, OpenOutcome, SystemBrowser, TabHandle,
    TabOpener,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    /// The user asked not to touch the clipboard.
    #[error("clipboard disabled")]
    ClipboardDisabled,

    #[error("could not open {url}: {reason}")]
    Open { url: String, reason: String },

    #[error("no link registered for {0}")]
    UnknownLink(LinkPurpose),
}
