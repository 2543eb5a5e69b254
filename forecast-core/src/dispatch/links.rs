use std::{collections::HashMap, fmt, fmt::Debug};

use super::DispatchError;

/// What an external page is for; each purpose gets at most one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkPurpose {
    Chat,
    Share,
}

impl LinkPurpose {
    pub fn label(&self) -> &'static str {
        match self {
            LinkPurpose::Chat => "Open ChatGPT",
            LinkPurpose::Share => "Open Weather-Dart",
        }
    }
}

impl fmt::Display for LinkPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkPurpose::Chat => f.write_str("chat"),
            LinkPurpose::Share => f.write_str("share"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub url: String,
    pub tab_name: String,
}

impl LinkTarget {
    pub fn new(url: impl Into<String>, tab_name: impl Into<String>) -> Self {
        Self { url: url.into(), tab_name: tab_name.into() }
    }
}

/// Link for the user to follow by hand when a tab could not be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackLink {
    pub label: String,
    pub url: String,
}

impl fmt::Display for FallbackLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    Focused,
    Fallback(FallbackLink),
}

/// A tab that was opened earlier and can be brought forward again.
pub trait TabHandle: Send + Debug {
    fn focus(&mut self) -> Result<(), DispatchError>;
}

pub trait TabOpener: Send + Debug {
    fn open(&mut self, target: &LinkTarget) -> Result<Box<dyn TabHandle>, DispatchError>;
}

/// Opens pages in the default browser with the `open` crate.
///
/// A desktop browser cannot be raised from outside, so focusing an already
/// opened tab only records that it is being reused.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

#[derive(Debug)]
struct SystemTab {
    target: LinkTarget,
}

impl TabHandle for SystemTab {
    fn focus(&mut self) -> Result<(), DispatchError> {
        tracing::info!(tab = %self.target.tab_name, "Reusing open tab for {}", self.target.url);
        Ok(())
    }
}

impl TabOpener for SystemBrowser {
    fn open(&mut self, target: &LinkTarget) -> Result<Box<dyn TabHandle>, DispatchError> {
        open::that(&target.url).map_err(|e| DispatchError::Open {
            url: target.url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(SystemTab { target: target.clone() }))
    }
}

/// External pages keyed by purpose, plus the tabs opened for them so far.
#[derive(Debug)]
pub struct LinkRegistry {
    targets: HashMap<LinkPurpose, LinkTarget>,
    tabs: HashMap<LinkPurpose, Box<dyn TabHandle>>,
    opener: Box<dyn TabOpener>,
}

impl LinkRegistry {
    pub fn new(opener: Box<dyn TabOpener>) -> Self {
        Self { targets: HashMap::new(), tabs: HashMap::new(), opener }
    }

    pub fn register(mut self, purpose: LinkPurpose, target: LinkTarget) -> Self {
        self.targets.insert(purpose, target);
        self
    }

    /// Focus the tab for `purpose` if one is open, otherwise open it.
    ///
    /// A tab that can no longer be focused is forgotten and opened again.
    /// When opening fails the caller gets a link to show instead.
    pub fn open_or_focus(&mut self, purpose: LinkPurpose) -> Result<OpenOutcome, DispatchError> {
        let target = self.targets.get(&purpose).ok_or(DispatchError::UnknownLink(purpose))?;

        if let Some(tab) = self.tabs.get_mut(&purpose) {
            match tab.focus() {
                Ok(()) => return Ok(OpenOutcome::Focused),
                Err(err) => {
                    tracing::debug!("Tab for {purpose} is gone ({err}); reopening");
                    self.tabs.remove(&purpose);
                }
            }
        }

        match self.opener.open(target) {
            Ok(tab) => {
                self.tabs.insert(purpose, tab);
                Ok(OpenOutcome::Opened)
            }
            Err(err) => {
                tracing::warn!("{err}");
                Ok(OpenOutcome::Fallback(FallbackLink {
                    label: purpose.label().to_string(),
                    url: target.url.clone(),
                }))
            }
        }
    }
}
