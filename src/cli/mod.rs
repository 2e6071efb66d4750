//! Command-line host for the cycle timer.

pub mod display;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use chrono::{Duration as ChronoDuration, Local, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

use crate::{
    audio::{chime_from_settings, Chime, SilentChime},
    cycle::{CycleController, CycleEvent, PhaseConfigUpdate},
    db::Database,
    settings::{ChimeSettings, ChimeTone, SettingsStore},
    store::{CyclePersistence, JsonFileStore, KeyValueStore},
};

use display::CycleDisplay;

/// Focus/break cycle timer
///
/// Counts down focus and break phases, earns a long break every few focus
/// cycles, and remembers configuration and progress between runs.
#[derive(Parser, Debug)]
#[command(name = "focuscycle", version, about)]
pub struct Cli {
    /// Directory for the database and settings (defaults to the user data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Where cycle configuration and counter are stored
    #[arg(long, global = true, value_enum, default_value_t = StoreKind::Sqlite)]
    store: StoreKind,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Sqlite,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the timer in this terminal
    Run {
        /// Do not play the phase-end chime
        #[arg(long)]
        mute: bool,
    },
    /// Show configuration, cycle progress and today's focus time
    Status,
    /// Show or change phase durations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Clear the completed-cycle counter
    Reset,
    /// List recently finished phases
    History {
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// Show or change the phase-end chime
    Chime(ChimeArgs),
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Show,
    /// Update any subset of the durations; all values must be positive
    #[command(allow_negative_numbers = true)]
    Set {
        /// Focus length in seconds
        #[arg(long)]
        focus: Option<i64>,
        /// Short break length in seconds
        #[arg(long)]
        short_break: Option<i64>,
        /// Long break length in seconds
        #[arg(long)]
        long_break: Option<i64>,
        /// Focus cycles before a long break
        #[arg(long)]
        cycles: Option<i64>,
    },
}

#[derive(Args, Debug)]
struct ChimeArgs {
    #[arg(long, conflicts_with = "disable")]
    enable: bool,
    #[arg(long)]
    disable: bool,
    /// 0.0 to 1.0
    #[arg(long)]
    volume: Option<f32>,
    #[arg(long, value_enum)]
    tone: Option<ToneArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ToneArg {
    Bell,
    Soft,
}

impl From<ToneArg> for ChimeTone {
    fn from(tone: ToneArg) -> Self {
        match tone {
            ToneArg::Bell => ChimeTone::Bell,
            ToneArg::Soft => ChimeTone::Soft,
        }
    }
}

/// Storage handles shared by every subcommand.
pub struct App {
    db: Database,
    settings: SettingsStore,
    store: Arc<dyn KeyValueStore>,
}

impl App {
    pub fn open(data_dir: &Path, kind: StoreKind) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db = Database::new(data_dir.join("focuscycle.sqlite3"))?;
        let store: Arc<dyn KeyValueStore> = match kind {
            StoreKind::Sqlite => Arc::new(db.clone()),
            StoreKind::Json => Arc::new(JsonFileStore::new(data_dir.join("cycle.json"))?),
        };
        let settings = SettingsStore::new(data_dir.join("settings.json"))?;

        Ok(Self {
            db,
            settings,
            store,
        })
    }

    pub fn persistence(&self) -> CyclePersistence {
        CyclePersistence::new(self.store.clone())
    }

    async fn controller(&self, chime: Arc<dyn Chime>) -> CycleController {
        CycleController::load(self.persistence(), chime)
            .await
            .with_history(self.db.clone())
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir).join("focuscycle");
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local/share/focuscycle");
    }
    PathBuf::from(".focuscycle")
}

pub async fn run() -> Result<()> {
    // Reads RUST_LOG, defaults to info.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let app = App::open(&data_dir, cli.store)?;
    info!(
        "Using data directory {} (history in {})",
        data_dir.display(),
        app.db.path().display()
    );

    match cli.command {
        Command::Run { mute } => run_timer(&app, mute).await,
        Command::Status => show_status(&app).await,
        Command::Config { action } => match action {
            ConfigAction::Show => {
                display::print_config(&app.persistence().load_config().await);
                Ok(())
            }
            ConfigAction::Set {
                focus,
                short_break,
                long_break,
                cycles,
            } => {
                let update = PhaseConfigUpdate {
                    focus_duration_seconds: focus,
                    short_break_duration_seconds: short_break,
                    long_break_duration_seconds: long_break,
                    cycles_before_long_break: cycles,
                };
                set_config(&app, update).await
            }
        },
        Command::Reset => {
            let snapshot = app.controller(Arc::new(SilentChime)).await.reset().await;
            println!("completed cycles reset to {}", snapshot.completed_cycles);
            Ok(())
        }
        Command::History { limit } => {
            let records = app.db.list_phase_history(limit).await?;
            display::print_history(&records);
            Ok(())
        }
        Command::Chime(args) => update_chime(&app, args),
    }
}

async fn set_config(app: &App, update: PhaseConfigUpdate) -> Result<()> {
    if update.is_empty() {
        bail!("nothing to change; pass at least one of --focus, --short-break, --long-break, --cycles");
    }
    let controller = app.controller(Arc::new(SilentChime)).await;
    let snapshot = controller
        .configure(update)
        .await
        .context("configuration rejected")?;
    display::print_config(&snapshot.config);
    Ok(())
}

async fn show_status(app: &App) -> Result<()> {
    let persistence = app.persistence();
    let config = persistence.load_config().await;
    let completed_cycles = persistence.load_completed_cycles().await;

    let since = Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).single())
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or_else(|| Utc::now() - ChronoDuration::hours(24));
    let today = app.db.focus_summary_since(since).await?;

    display::print_status(&config, completed_cycles, &today);
    Ok(())
}

fn update_chime(app: &App, args: ChimeArgs) -> Result<()> {
    let current = app.settings.chime();
    let changed = args.enable || args.disable || args.volume.is_some() || args.tone.is_some();
    let settings = if changed {
        app.settings.update_chime(ChimeSettings {
            enabled: if args.enable {
                true
            } else if args.disable {
                false
            } else {
                current.enabled
            },
            volume: args.volume.unwrap_or(current.volume),
            tone: args.tone.map(ChimeTone::from).unwrap_or(current.tone),
        })?
    } else {
        current
    };
    display::print_chime(&settings);
    Ok(())
}

async fn run_timer(app: &App, mute: bool) -> Result<()> {
    let chime: Arc<dyn Chime> = if mute {
        Arc::new(SilentChime)
    } else {
        chime_from_settings(&app.settings.chime())
    };
    let controller = app.controller(chime).await;
    let display = CycleDisplay::new();
    let mut events = controller.subscribe();

    let started = controller.start().await;
    display.print_header(&started);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(CycleEvent::StateChanged(snapshot)) => display.render_tick(&snapshot),
                Ok(CycleEvent::PhaseCompleted(completion)) => display.render_completion(&completion),
                Err(RecvError::Lagged(skipped)) => warn!("Display fell behind by {skipped} events"),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(input)) => match input.trim() {
                    "s" => {
                        controller.start().await;
                    }
                    "p" => {
                        controller.pause().await;
                    }
                    "r" => {
                        controller.reset().await;
                    }
                    "q" => break,
                    "" => {}
                    other => eprintln!("\nunknown key '{other}'"),
                },
                Ok(None) => stdin_open = false,
                Err(err) => {
                    warn!("Stopped reading keys: {err}");
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c => break,
        }
    }

    let snapshot = controller.pause().await;
    controller.shutdown().await;
    display.render_stopped(&snapshot);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_set_accepts_negative_values_for_validation() {
        let cli = Cli::try_parse_from(["focuscycle", "config", "set", "--focus", "-5"]).unwrap();
        match cli.command {
            Command::Config {
                action: ConfigAction::Set { focus, .. },
            } => assert_eq!(focus, Some(-5)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_chime_enable_and_disable_conflict() {
        assert!(Cli::try_parse_from(["focuscycle", "chime", "--enable", "--disable"]).is_err());
    }

    #[tokio::test]
    async fn test_set_config_persists_through_json_store() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::open(dir.path(), StoreKind::Json).unwrap();

        set_config(
            &app,
            PhaseConfigUpdate {
                cycles_before_long_break: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let reopened = App::open(dir.path(), StoreKind::Json).unwrap();
        assert_eq!(
            reopened.persistence().load_config().await.cycles_before_long_break,
            2
        );
    }

    #[tokio::test]
    async fn test_set_config_rejects_empty_and_invalid_updates() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::open(dir.path(), StoreKind::Sqlite).unwrap();

        assert!(set_config(&app, PhaseConfigUpdate::default()).await.is_err());

        let invalid = PhaseConfigUpdate {
            focus_duration_seconds: Some(600),
            long_break_duration_seconds: Some(0),
            ..Default::default()
        };
        assert!(set_config(&app, invalid).await.is_err());

        let stored = app.persistence().load_config().await;
        assert_eq!(stored, crate::cycle::PhaseConfig::default());
    }
}
