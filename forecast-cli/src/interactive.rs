use anyhow::{Context, Result};
use chrono::NaiveDate;
use inquire::{Confirm, CustomType, Select, Text, validator::Validation};
use std::fmt;

use forecast_core::{
    AppState, Config, Event, LocationSource,
    dispatch::{ArboardClipboard, SystemBrowser},
    prompt::SessionMarker,
    qr,
};

use crate::{cli, output};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    EnterAddress,
    ChooseSource,
    ChangeDate,
    Tip,
    NotNow,
    Generate,
    CopyForecast,
    ShowQr,
    OpenSharePage,
    Quit,
}

impl Action {
    const ALL: [Action; 10] = [
        Action::EnterAddress,
        Action::ChooseSource,
        Action::ChangeDate,
        Action::Tip,
        Action::NotNow,
        Action::Generate,
        Action::CopyForecast,
        Action::ShowQr,
        Action::OpenSharePage,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::EnterAddress => "Enter address",
            Action::ChooseSource => "Choose location source",
            Action::ChangeDate => "Change date",
            Action::Tip => "Tip",
            Action::NotNow => "Not now, thank you",
            Action::Generate => "Get forecast",
            Action::CopyForecast => "Copy forecast",
            Action::ShowQr => "Show QR code link",
            Action::OpenSharePage => "Open Weather-Dart page",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Interactive session. Locates once on start, then loops over user actions.
pub async fn run(config: &Config) -> Result<()> {
    let mut session =
        cli::build_session(config, Box::new(ArboardClipboard::new()), Box::new(SystemBrowser))?;
    let locator = cli::auto_locator(config)?;

    let qr_url = qr::qr_image_url(&config.links.share_url, config.qr.size)?;
    eprintln!("Share this tool: {qr_url}");

    let state = AppState::default().with_source(config.default_source);
    let (mut state, notices) = session.start(state, locator.as_ref()).await;
    output::render(&notices);

    loop {
        output::print_location(&state);

        let action = Select::new("What next?", Action::ALL.to_vec())
            .prompt()
            .context("Failed to read action")?;
        tracing::debug!(%action, "Menu action chosen");

        let event = match action {
            Action::EnterAddress => {
                let address = Text::new("Address:").prompt().context("Failed to read address")?;
                Event::AddressEntered(address)
            }
            Action::ChooseSource => {
                let sources = LocationSource::all().to_vec();
                let source = Select::new("Location for the prompt:", sources)
                    .prompt()
                    .context("Failed to read location source")?;
                Event::SourceChosen(source)
            }
            Action::ChangeDate => {
                let date = CustomType::<NaiveDate>::new("Date (YYYY-MM-DD):")
                    .with_default(state.date)
                    .with_error_message("Please type a date like 2024-01-01")
                    .prompt()
                    .context("Failed to read date")?;
                Event::DateChanged(date)
            }
            Action::Tip => Event::TipPressed,
            Action::NotNow => {
                let checked = Confirm::new("Not now, thank you?")
                    .with_default(!state.not_now)
                    .prompt()
                    .context("Failed to read choice")?;
                Event::NotNowToggled(checked)
            }
            Action::Generate => Event::Generate,
            Action::CopyForecast => Event::CopyForecast,
            Action::ShowQr => {
                println!("{qr_url}");
                continue;
            }
            Action::OpenSharePage => Event::OpenSharePage,
            Action::Quit => break,
        };

        let (next, notices) = session.handle(state, event).await;
        state = next;
        output::render(&notices);
    }

    Ok(())
}

/// Interactively edit and save the configuration.
pub fn configure() -> Result<()> {
    let mut config = Config::load()?;

    config.geocoder.base_url = Text::new("Geocoding service URL:")
        .with_default(&config.geocoder.base_url)
        .prompt()
        .context("Failed to read geocoder URL")?;

    config.geocoder.user_agent = Text::new("User-Agent (include contact info):")
        .with_default(&config.geocoder.user_agent)
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("Nominatim requires a User-Agent".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()
        .context("Failed to read user agent")?;

    config.locate.enabled = Confirm::new("Look up your approximate location on start?")
        .with_default(config.locate.enabled)
        .prompt()
        .context("Failed to read choice")?;

    let sources = LocationSource::all().to_vec();
    let current = sources.iter().position(|s| *s == config.default_source).unwrap_or(0);
    config.default_source = Select::new("Default location for the prompt:", sources)
        .with_starting_cursor(current)
        .prompt()
        .context("Failed to read location source")?;

    config.links.chat_url = Text::new("Chat page URL:")
        .with_default(&config.links.chat_url)
        .prompt()
        .context("Failed to read chat URL")?;

    config.session_marker = Text::new("Session marker:")
        .with_default(&config.session_marker)
        .with_validator(|input: &str| match SessionMarker::new(input) {
            Ok(_) => Ok(Validation::Valid),
            Err(err) => Ok(Validation::Invalid(err.to_string().into())),
        })
        .prompt()
        .context("Failed to read session marker")?;

    config.qr.size = CustomType::<u32>::new("QR code size (pixels):")
        .with_default(config.qr.size)
        .with_error_message("Please type a whole number")
        .prompt()
        .context("Failed to read QR size")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_lists_every_action_once() {
        let labels: Vec<String> = Action::ALL.iter().map(ToString::to_string).collect();
        let mut unique = labels.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), labels.len());
        assert!(labels.contains(&"Open Weather-Dart page".to_string()));
        assert_eq!(Action::ALL.last(), Some(&Action::Quit));
    }
}
