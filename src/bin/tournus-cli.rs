#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tournus::{
    builder::{build_schedule, BuildRequest},
    clock::{IntervalTicker, SystemClock},
    events::{ChannelObserver, ExecutionEvent, ExecutionObserver, TracingObserver},
    execution::{EngineOptions, ExecutionCoordinator, ExecutionStatus, ScheduleRunner},
    model::{PlayerId, ScheduleId, Station, StationId, Strategy},
    rotation::render_plan,
    storage::{save_archive, JsonStorage, Storage},
    validation::validate,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI du moteur de rotation par ateliers
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du planning
    #[arg(long, global = true, default_value = "schedule.json")]
    schedule: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Sequential,
    Staggered,
    Custom,
}

impl From<StrategyArg> for Strategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Sequential => Strategy::Sequential,
            StrategyArg::Staggered => Strategy::Staggered,
            StrategyArg::Custom => Strategy::Custom,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Valider un planning (code 2 si invalide)
    Validate,

    /// Afficher le plan de rotation complet
    Plan,

    /// Construire un planning et l'écrire dans `--schedule`
    Build {
        #[arg(long)]
        name: String,
        /// liste "a,b,c" (id = nom)
        #[arg(long)]
        stations: String,
        #[arg(long, default_value_t = 8)]
        capacity: u32,
        /// liste "p1,p2,..."
        #[arg(long, default_value = "")]
        players: String,
        #[arg(long, default_value_t = 1)]
        groups: usize,
        #[arg(long, value_enum, default_value_t = StrategyArg::Sequential)]
        strategy: StrategyArg,
        /// ateliers de départ "a,b" (stratégie custom)
        #[arg(long, default_value = "")]
        starts: String,
        #[arg(long, default_value_t = 900)]
        rotation_duration: i64,
        #[arg(long, default_value_t = 120)]
        transition_time: i64,
    },

    /// Exécuter le planning en temps réel
    Run {
        /// Durée d'un tick en millisecondes
        #[arg(long, default_value_t = 1000)]
        tick_ms: u64,
        #[arg(long, default_value_t = 30)]
        warning_threshold: i64,
        /// Archive JSON de l'état final (optionnel)
        #[arg(long)]
        archive: Option<String>,
    },
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn describe(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::SessionsCreated(sessions) => {
            format!("{} session(s) created", sessions.len())
        }
        ExecutionEvent::RotationStarted(state) => format!(
            "rotation {}/{} started ({}s)",
            state.current_rotation_index + 1,
            state.total_rotations,
            state.time_remaining
        ),
        ExecutionEvent::RotationTransition(state) => {
            let moves: Vec<String> = state
                .group_positions
                .iter()
                .map(|(g, s)| format!("{g} -> {s}"))
                .collect();
            format!(
                "transition to rotation {} ({}s): {}",
                state.current_rotation_index + 1,
                state.time_remaining,
                moves.join(", ")
            )
        }
        ExecutionEvent::RotationComplete(state) => format!(
            "completed after {} rotation(s)",
            state.session_history.len()
        ),
        ExecutionEvent::Alert(alert) => {
            format!("[{:?}] {}", alert.priority, alert.message)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.schedule)?;

    let code = match cli.cmd {
        Commands::Validate => {
            let schedule = storage.load()?;
            let report = validate(&schedule);
            for w in &report.warnings {
                println!("warning: {w}");
            }
            if report.is_valid {
                println!("OK: schedule is valid");
                0
            } else {
                for e in &report.errors {
                    eprintln!("error: {e}");
                }
                eprintln!("Found {} error(s)", report.errors.len());
                2
            }
        }
        Commands::Plan => {
            let schedule = storage.load()?;
            println!("{}", render_plan(&schedule)?);
            0
        }
        Commands::Build {
            name,
            stations,
            capacity,
            players,
            groups,
            strategy,
            starts,
            rotation_duration,
            transition_time,
        } => {
            let stations: Vec<Station> = split_list(&stations)
                .into_iter()
                .map(|id| Station::new(&id, id.clone(), i64::from(capacity)))
                .collect();
            let req = BuildRequest {
                id: Some(ScheduleId::random()),
                name,
                stations,
                group_count: groups,
                players: split_list(&players).into_iter().map(PlayerId::new).collect(),
                strategy: strategy.into(),
                custom_starts: split_list(&starts).into_iter().map(StationId::new).collect(),
                rotation_duration,
                transition_time,
                start_time: None,
            };
            let schedule = build_schedule(req)?;
            storage.save(&schedule)?;
            println!("Schedule {} written to {}", schedule.id, cli.schedule);
            0
        }
        Commands::Run {
            tick_ms,
            warning_threshold,
            archive,
        } => {
            if tick_ms == 0 {
                bail!("--tick-ms must be > 0");
            }
            let schedule = storage.load()?;
            let (tx, rx) = mpsc::channel();
            let observers: Vec<Box<dyn ExecutionObserver>> =
                vec![Box::new(ChannelObserver::new(tx)), Box::new(TracingObserver)];
            let options = EngineOptions {
                warning_threshold_secs: warning_threshold,
            };
            let mut coordinator = ExecutionCoordinator::initialize_with(
                schedule,
                options,
                Arc::new(SystemClock),
                observers,
            )?;
            coordinator.start()?;
            let ticker = IntervalTicker::new(Duration::from_millis(tick_ms));
            let runner = ScheduleRunner::spawn(coordinator, ticker);

            loop {
                match rx.recv_timeout(Duration::from_millis(200)) {
                    Ok(event) => println!("{}", describe(&event)),
                    Err(RecvTimeoutError::Timeout) if runner.is_finished() => break,
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            for event in rx.try_iter() {
                println!("{}", describe(&event));
            }

            let state = runner.join();
            if let Some(path) = archive {
                save_archive(&path, &state).with_context(|| format!("writing archive {path}"))?;
            }
            match state.status {
                ExecutionStatus::Completed => 0,
                _ => 2,
            }
        }
    };

    std::process::exit(code);
}
