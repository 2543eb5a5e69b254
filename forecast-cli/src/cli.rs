use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::{path::PathBuf, time::Duration};

use forecast_core::{
    AppState, Config, Coordinates, Event, LocationSource, NominatimGeocoder, Session,
    dispatch::{
        ArboardClipboard, Clipboard, DispatchError, LinkPurpose, LinkTarget, OpenOutcome,
        SystemBrowser, TabHandle, TabOpener,
    },
    http::build_client,
    locate::{DisabledLocator, FixedLocator, IpApiLocator, Locator},
    qr,
};

use crate::{interactive, output};

/// How long `luma prompt` keeps serving the copied prompt on X11/Wayland.
const CLIPBOARD_HOLD: Duration = Duration::from_secs(60);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "luma", version, about = "Build and share the Luma forecast prompt")]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the forecast prompt, copy it and open the chat page.
    Prompt(PromptArgs),

    /// Interactive session: locate, refine the address, generate repeatedly.
    Session,

    /// Print (or download) the QR code image for the share page.
    Qr {
        /// Save the PNG here instead of only printing its URL.
        #[arg(long)]
        save: Option<PathBuf>,

        /// Page to encode; defaults to the configured share URL.
        #[arg(long)]
        target: Option<String>,

        /// Image size in pixels; defaults to the configured size.
        #[arg(long)]
        size: Option<u32>,

        /// Also open the share page in the browser.
        #[arg(long)]
        open: bool,
    },

    /// Edit the configuration interactively.
    Configure,

    /// Print the path of the configuration file.
    ConfigPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Latlon,
    Address,
}

impl From<SourceArg> for LocationSource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Latlon => LocationSource::Coordinates,
            SourceArg::Address => LocationSource::Address,
        }
    }
}

#[derive(Debug, Args)]
pub struct PromptArgs {
    /// Latitude in decimal degrees (requires --lon).
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees (requires --lat).
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Address to geocode instead of locating automatically.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub address: Option<String>,

    /// Forecast date (YYYY-MM-DD); today if absent.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Which location goes into the prompt; defaults to the configured source.
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    /// Acknowledge the tip.
    #[arg(long)]
    pub tip: bool,

    /// "Not now, thank you".
    #[arg(long)]
    pub not_now: bool,

    /// Do not touch the clipboard.
    #[arg(long)]
    pub no_copy: bool,

    /// Do not open the chat page; print its link instead.
    #[arg(long)]
    pub no_open: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        tracing::debug!(command = ?self.command, "Dispatching command");

        match self.command {
            Command::Prompt(args) => run_prompt(args).await,
            Command::Session => {
                let config = Config::load()?;
                interactive::run(&config).await
            }
            Command::Qr { save, target, size, open } => run_qr(save, target, size, open).await,
            Command::Configure => interactive::configure(),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

/// Clipboard stand-in for `--no-copy`.
#[derive(Debug)]
struct NoClipboard;

impl Clipboard for NoClipboard {
    fn set_text(&mut self, _text: &str) -> Result<(), DispatchError> {
        Err(DispatchError::ClipboardDisabled)
    }
}

/// Opener for `--no-open`: every page becomes a printed link.
#[derive(Debug)]
struct PrintLinks;

impl TabOpener for PrintLinks {
    fn open(&mut self, target: &LinkTarget) -> Result<Box<dyn TabHandle>, DispatchError> {
        Err(DispatchError::Open {
            url: target.url.clone(),
            reason: "disabled by --no-open".to_string(),
        })
    }
}

pub fn build_session(
    config: &Config,
    clipboard: Box<dyn Clipboard>,
    opener: Box<dyn TabOpener>,
) -> Result<Session> {
    let geocoder = NominatimGeocoder::from_config(&config.geocoder)?;
    Ok(Session::new(
        Box::new(geocoder),
        clipboard,
        config.link_registry(opener),
        config.session_marker()?,
    ))
}

pub fn auto_locator(config: &Config) -> Result<Box<dyn Locator>> {
    if !config.locate.enabled {
        return Ok(Box::new(DisabledLocator));
    }
    let http = build_client(&config.geocoder.user_agent, config.geocoder.timeout_secs)?;
    Ok(Box::new(IpApiLocator::new(http)))
}

async fn run_prompt(args: PromptArgs) -> Result<()> {
    let config = Config::load()?;

    let clipboard: Box<dyn Clipboard> =
        if args.no_copy { Box::new(NoClipboard) } else { Box::new(ArboardClipboard::new()) };
    let opener: Box<dyn TabOpener> =
        if args.no_open { Box::new(PrintLinks) } else { Box::new(SystemBrowser) };
    let mut session = build_session(&config, clipboard, opener)?;

    let mut state = AppState::default().with_source(config.default_source);
    if let Some(date) = args.date {
        state = state.with_date(date);
    }

    let mut events = Vec::new();
    match (args.lat.zip(args.lon), args.address) {
        (Some((lat, lon)), _) => {
            let coordinates = Coordinates::new(lat, lon)?;
            let (next, notices) = session.start(state, &FixedLocator(coordinates)).await;
            output::render(&notices);
            state = next;
        }
        (None, Some(address)) => events.push(Event::AddressEntered(address)),
        (None, None) => {
            let locator = auto_locator(&config)?;
            let (next, notices) = session.start(state, locator.as_ref()).await;
            output::render(&notices);
            state = next;
        }
    }

    if let Some(source) = args.source {
        events.push(Event::SourceChosen(source.into()));
    }
    if args.tip {
        events.push(Event::TipPressed);
    }
    events.push(Event::NotNowToggled(args.not_now));
    events.push(Event::Generate);

    for event in events {
        if matches!(event, Event::Generate) {
            output::print_location(&state);
        }

        let (next, notices) = session.handle(state, event).await;
        state = next;

        if let Some(alert) = output::render(&notices) {
            return Err(anyhow!(alert));
        }
    }

    if !args.no_copy && state.forecast.is_some() && cfg!(target_os = "linux") {
        eprintln!(
            "Keeping the prompt on the clipboard for up to {}s (Ctrl-C once it is pasted).",
            CLIPBOARD_HOLD.as_secs()
        );
    }
    if let Err(err) = session.hold_clipboard(CLIPBOARD_HOLD) {
        tracing::warn!("{err}");
    }

    Ok(())
}

async fn run_qr(
    save: Option<PathBuf>,
    target: Option<String>,
    size: Option<u32>,
    open: bool,
) -> Result<()> {
    let config = Config::load()?;
    let target = target.unwrap_or_else(|| config.links.share_url.clone());
    let image_url = qr::qr_image_url(&target, size.unwrap_or(config.qr.size))?;

    println!("{image_url}");

    if let Some(path) = save {
        let http = build_client(&config.geocoder.user_agent, config.geocoder.timeout_secs)?;
        let written = qr::download_qr(&http, &image_url, &path)
            .await
            .context("Could not download the QR code; open the URL above instead")?;
        tracing::debug!(bytes = written, "QR image written to {}", path.display());
        eprintln!("Saved QR code for {target} to {}", path.display());
    }

    if open {
        let mut links = config.link_registry(Box::new(SystemBrowser));
        if let OpenOutcome::Fallback(link) = links.open_or_focus(LinkPurpose::Share)? {
            eprintln!("{link}");
        }
    }

    Ok(())
}
