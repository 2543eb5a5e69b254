//! Event handling for one run of the tool.
//!
//! Front-ends translate user actions into [`Event`]s, feed them to
//! [`Session::handle`] together with the current [`AppState`], and render the
//! returned [`Notice`]s. The session itself owns only the services (geocoder,
//! clipboard, open tabs); location, date and gate state live in `AppState`.

use chrono::NaiveDate;
use std::time::Duration;

use crate::{
    dispatch::{Clipboard, DispatchError, FallbackLink, LinkPurpose, LinkRegistry, OpenOutcome},
    gate::{GATE_BLOCKED, TIP_MESSAGE},
    geocode::{ForwardOutcome, Geocoder, resolve_forward},
    locate::{LocateError, Locator, apply_location},
    model::{AppState, Coordinates, LocationSource},
    prompt::{self, SessionMarker},
};

pub const STATUS_COPIED_FOR_CHAT: &str = "Prompt copied - paste into ChatGPT and press Enter.";
pub const STATUS_AUTO_COPY_FAILED: &str = "Automatic copy failed - use the Copy Forecast action.";
pub const STATUS_COPIED: &str = "Copied!";
pub const STATUS_COPY_FAILED: &str = "Copy failed - select and copy the text manually.";

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Located(Result<Coordinates, LocateError>),
    AddressEntered(String),
    DateChanged(NaiveDate),
    SourceChosen(LocationSource),
    TipPressed,
    NotNowToggled(bool),
    Generate,
    CopyForecast,
    OpenSharePage,
}

/// Something the front-end should show.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Short-lived status line.
    Status(String),
    /// Blocking message the user must see.
    Alert(String),
    GeoNote(String),
    TipMessage(String),
    Forecast(String),
    FallbackLink(FallbackLink),
}

#[derive(Debug)]
pub struct Session {
    geocoder: Box<dyn Geocoder>,
    clipboard: Box<dyn Clipboard>,
    links: LinkRegistry,
    marker: SessionMarker,
}

impl Session {
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        clipboard: Box<dyn Clipboard>,
        links: LinkRegistry,
        marker: SessionMarker,
    ) -> Self {
        Self { geocoder, clipboard, links, marker }
    }

    /// The one automatic location attempt made when a run starts.
    pub async fn start(
        &mut self,
        state: AppState,
        locator: &dyn Locator,
    ) -> (AppState, Vec<Notice>) {
        let located = locator.locate().await;
        self.handle(state, Event::Located(located)).await
    }

    pub async fn handle(&mut self, state: AppState, event: Event) -> (AppState, Vec<Notice>) {
        match event {
            Event::Located(located) => {
                let next = apply_location(state, self.geocoder.as_ref(), located).await;
                let notices = next
                    .status
                    .geo_note()
                    .map(|n| Notice::GeoNote(n.to_string()))
                    .into_iter()
                    .collect();
                (next, notices)
            }
            Event::AddressEntered(query) => {
                match resolve_forward(&state, self.geocoder.as_ref(), &query).await {
                    Ok(ForwardOutcome::Updated(next)) => (next, Vec::new()),
                    Ok(ForwardOutcome::Skipped) => (state, Vec::new()),
                    Err(err) => (state, vec![Notice::Alert(err.user_message().to_string())]),
                }
            }
            Event::DateChanged(date) => (state.with_date(date), Vec::new()),
            Event::SourceChosen(source) => (state.with_source(source), Vec::new()),
            Event::TipPressed => {
                let gate = state.gate.acknowledge();
                (state.with_gate(gate), vec![Notice::TipMessage(TIP_MESSAGE.to_string())])
            }
            Event::NotNowToggled(checked) => (state.with_not_now(checked), Vec::new()),
            Event::Generate => self.generate(state),
            Event::CopyForecast => {
                let text = state.forecast.clone().unwrap_or_default();
                let notices = self.copy(&text, STATUS_COPIED, STATUS_COPY_FAILED);
                (state, notices)
            }
            Event::OpenSharePage => {
                let notices = self.open_link(LinkPurpose::Share);
                (state, notices)
            }
        }
    }

    /// Keep the last copied text available after the caller is done with
    /// the session. Returns early once another program takes the clipboard.
    pub fn hold_clipboard(&mut self, limit: Duration) -> Result<(), DispatchError> {
        self.clipboard.hold(limit)
    }

    /// Open or focus the page for `purpose`. Only a failure produces notices.
    pub fn open_link(&mut self, purpose: LinkPurpose) -> Vec<Notice> {
        match self.links.open_or_focus(purpose) {
            Ok(OpenOutcome::Opened) | Ok(OpenOutcome::Focused) => Vec::new(),
            Ok(OpenOutcome::Fallback(link)) => vec![Notice::FallbackLink(link)],
            Err(err) => vec![Notice::Alert(err.to_string())],
        }
    }

    fn copy(&mut self, text: &str, copied: &str, failed: &str) -> Vec<Notice> {
        match self.clipboard.set_text(text) {
            Ok(()) => vec![Notice::Status(copied.to_string())],
            Err(DispatchError::ClipboardDisabled) => {
                tracing::debug!("Clipboard disabled; not copying");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!("{err}");
                vec![Notice::Status(failed.to_string())]
            }
        }
    }

    /// Build the prompt, copy it, then open or focus the chat tab. Copy goes
    /// first so the text is on the clipboard by the time the page shows up.
    fn generate(&mut self, state: AppState) -> (AppState, Vec<Notice>) {
        if !state.gate.permits(state.not_now) {
            return (state, vec![Notice::Alert(GATE_BLOCKED.to_string())]);
        }

        if state.location_text().is_empty() {
            tracing::warn!("Generating forecast without a {} location", state.source);
        }

        let text = prompt::build(&state, &self.marker);
        let mut notices = vec![Notice::Forecast(text.clone())];

        notices.extend(self.copy(&text, STATUS_COPIED_FOR_CHAT, STATUS_AUTO_COPY_FAILED));
        notices.extend(self.open_link(LinkPurpose::Chat));

        (state.with_forecast(text), notices)
    }
}
