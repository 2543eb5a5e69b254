use std::{fmt, fmt::Debug, time::Duration};

use super::DispatchError;

pub trait Clipboard: Debug {
    fn set_text(&mut self, text: &str) -> Result<(), DispatchError>;

    /// Block until the last copied text no longer depends on this process,
    /// or `limit` passes. Only X11/Wayland need this; elsewhere it returns
    /// immediately.
    fn hold(&mut self, _limit: Duration) -> Result<(), DispatchError> {
        Ok(())
    }
}

/// The system clipboard via `arboard`.
///
/// One handle is opened on first use and kept for the life of the value. On
/// X11 and Wayland the copied text is served by this process, so dropping
/// the handle would empty the clipboard.
#[derive(Default)]
pub struct ArboardClipboard {
    ctx: Option<arboard::Clipboard>,
    last: Option<String>,
}

impl ArboardClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn ctx(&mut self) -> Result<&mut arboard::Clipboard, DispatchError> {
        if self.ctx.is_none() {
            let ctx = arboard::Clipboard::new()
                .map_err(|e| DispatchError::Clipboard(format!("clipboard init: {e}")))?;
            self.ctx = Some(ctx);
        }
        self.ctx
            .as_mut()
            .ok_or_else(|| DispatchError::Clipboard("clipboard init: no handle".to_string()))
    }
}

impl fmt::Debug for ArboardClipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArboardClipboard")
            .field("open", &self.ctx.is_some())
            .field("last_len", &self.last.as_ref().map(String::len))
            .finish()
    }
}

impl Clipboard for ArboardClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), DispatchError> {
        self.ctx()?
            .set_text(text.to_owned())
            .map_err(|e| DispatchError::Clipboard(format!("clipboard set: {e}")))?;
        self.last = Some(text.to_owned());
        Ok(())
    }

    #[cfg(target_os = "linux")]
    fn hold(&mut self, limit: Duration) -> Result<(), DispatchError> {
        use arboard::SetExtLinux;

        let Some(text) = self.last.clone() else {
            return Ok(());
        };
        let deadline = std::time::Instant::now() + limit;
        self.ctx()?
            .set()
            .wait_until(deadline)
            .text(text)
            .map_err(|e| DispatchError::Clipboard(format!("clipboard hold: {e}")))
    }
}
