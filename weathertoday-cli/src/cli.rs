use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{InquireError, Text};
use std::sync::Arc;
use tracing::debug;
use weathertoday_core::{
    Config, Coordinates, FileStore, FixedLocation, ForecastScreen, HomeScreen, LocalAuth,
    LocationResolver, NoLocation, SessionContext, Settings, Theme, Unit, User, WeatherCache,
    chat::{ChatResponder, GREETING, ScriptedResponder},
    provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weathertoday", version, about = "Current weather, forecasts and a weather assistant")]
pub struct Cli {
    /// Log progress to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the WeatherAPI.com key and the fallback city.
    Configure,

    /// Show current weather for this device, a fixed position or a city.
    Now(NowArgs),

    /// Show the 7-day forecast for the last location shown by `now`.
    Forecast,

    /// Look up cities matching at least three characters.
    Search {
        text: String,

        /// Show weather for the N-th suggestion (1-based).
        #[arg(long)]
        pick: Option<usize>,
    },

    /// Show or change preferences.
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Manage the signed-in account.
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Talk to the weather assistant; starts a conversation when no message is given.
    Chat { message: Option<String> },
}

#[derive(Debug, Args)]
pub struct NowArgs {
    /// Latitude to use instead of the device location.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to use instead of the device location.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Fetch a city by name instead.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub city: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    Show,
    /// metric or imperial
    Unit { unit: Unit },
    /// light or dark
    Theme { theme: Theme },
    /// on or off
    Notifications { state: Toggle },
    /// Drop cached weather; preferences are kept.
    ClearCache,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Debug, Subcommand)]
pub enum AccountAction {
    Signin { email: String },
    Signout,
    Whoami,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Now(args) => App::open()?.now(args).await,
            Command::Forecast => App::open()?.forecast().await,
            Command::Search { text, pick } => App::open()?.search(&text, pick).await,
            Command::Settings { action } => {
                App::open()?.settings(action.unwrap_or(SettingsAction::Show)).await
            }
            Command::Account { action } => App::open()?.account(action).await,
            Command::Chat { message } => App::open()?.chat(message).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let mut key_prompt = Text::new("WeatherAPI.com API key:");
    if let Some(current) = config.api_key.as_deref() {
        key_prompt = key_prompt.with_default(current);
    }
    let api_key = key_prompt.prompt().context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let default_city = Text::new("City to show when location is unavailable:")
        .with_default(&config.default_city)
        .prompt()
        .context("Failed to read default city")?;

    config.api_key = Some(api_key.trim().to_string());
    config.default_city = default_city.trim().to_string();
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Everything a command needs beyond its own arguments.
struct App {
    config: Config,
    cache: WeatherCache,
    session: SessionContext,
}

impl App {
    fn open() -> Result<Self> {
        let config = Config::load()?;
        let data_dir = config.data_dir()?;
        debug!(dir = %data_dir.display(), "Opening local store");

        let cache = WeatherCache::new(Arc::new(FileStore::in_dir(&data_dir)));
        let session = SessionContext::new(Arc::new(LocalAuth::new(cache.clone())));
        Ok(Self { config, cache, session })
    }

    async fn require_user(&self) -> Result<User> {
        self.session.initialize().await;
        self.session.current().user.context(
            "Not signed in.\nHint: run `weathertoday account signin <EMAIL>` first.",
        )
    }

    fn location_for(&self, args: &NowArgs) -> Arc<dyn LocationResolver> {
        let fixed = match (args.lat, args.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => self.config.home_coordinates(),
        };
        match fixed {
            Some(coords) => Arc::new(FixedLocation::new(coords)),
            None => Arc::new(NoLocation),
        }
    }

    fn home_screen(&self, location: Arc<dyn LocationResolver>) -> Result<HomeScreen> {
        let provider = provider_from_config(&self.config)?;
        Ok(HomeScreen::new(provider, location, self.cache.clone())
            .with_default_city(self.config.default_city.clone()))
    }

    async fn now(&self, args: NowArgs) -> Result<()> {
        self.require_user().await?;
        let home = self.home_screen(self.location_for(&args))?;

        if let Some(city) = args.city.as_deref() {
            home.show_city(city).await;
        } else {
            home.load().await;
        }

        print!("{}", render::home(&home.state()));
        Ok(())
    }

    async fn forecast(&self) -> Result<()> {
        self.require_user().await?;
        let provider = provider_from_config(&self.config)?;
        let screen = ForecastScreen::new(provider, self.cache.clone());

        screen.load().await;
        print!("{}", render::forecast(&screen.state(), chrono::Local::now().date_naive()));
        Ok(())
    }

    async fn search(&self, text: &str, pick: Option<usize>) -> Result<()> {
        self.require_user().await?;
        let home = self.home_screen(Arc::new(NoLocation))?;

        let found = home.search(text).await;
        let Some(n) = pick else {
            print!("{}", render::suggestions(text, &found));
            return Ok(());
        };

        let chosen = n
            .checked_sub(1)
            .and_then(|i| found.get(i))
            .with_context(|| format!("No suggestion #{n}; {} match(es) for '{text}'", found.len()))?;
        home.select_suggestion(chosen).await;
        print!("{}", render::home(&home.state()));
        Ok(())
    }

    async fn settings(&self, action: SettingsAction) -> Result<()> {
        let mut settings = Settings::load(&self.cache).await;
        match action {
            SettingsAction::Show => {}
            SettingsAction::Unit { unit } => settings.set_unit(&self.cache, unit).await,
            SettingsAction::Theme { theme } => settings.set_theme(&self.cache, theme).await,
            SettingsAction::Notifications { state } => {
                settings.set_notifications(&self.cache, matches!(state, Toggle::On)).await
            }
            SettingsAction::ClearCache => {
                Settings::clear_cache(&self.cache).await;
                println!("Cached weather cleared.");
            }
        }

        self.session.initialize().await;
        print!("{}", render::settings(&settings, self.session.email().as_deref()));
        Ok(())
    }

    async fn account(&self, action: AccountAction) -> Result<()> {
        self.session.initialize().await;
        match action {
            AccountAction::Signin { email } => {
                let user = self
                    .session
                    .sign_in(&email)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message()))?;
                println!("Signed in as {}", user.email);
            }
            AccountAction::Signout => {
                self.session.sign_out().await;
                println!("Signed out.");
            }
            AccountAction::Whoami => match self.session.email() {
                Some(email) => println!("{email}"),
                None => println!("Not signed in."),
            },
        }
        Ok(())
    }

    async fn chat(&self, message: Option<String>) -> Result<()> {
        self.require_user().await?;
        let responder = ScriptedResponder;

        if let Some(message) = message {
            if let Some(reply) = responder.reply(&message) {
                println!("{reply}");
            }
            return Ok(());
        }

        println!("{GREETING}\n(type `exit` to leave)\n");
        loop {
            let input = match Text::new("You:").prompt() {
                Ok(input) => input,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
                Err(e) => return Err(e).context("Failed to read message"),
            };
            if matches!(input.trim(), "exit" | "quit") {
                break;
            }
            if let Some(reply) = responder.reply(&input) {
                println!("Assistant: {reply}\n");
            }
        }
        Ok(())
    }
}
