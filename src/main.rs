use anyhow::Context;
use audio_switcher_rs::{create_host, DeviceDirectory, Direction, Snapshot};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "audio-switcher-rs")]
#[command(about = "Switch macOS default audio devices and output volume")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List input and output devices with their active flags
    List,

    /// Make a device the system default
    SetDefault {
        /// Device id (from 'list')
        id: u32,

        /// Which default to change
        #[arg(short, long, value_enum, default_value_t = DirectionArg::Output)]
        direction: DirectionArg,
    },

    /// Show the output volume, or set it when a value is given
    Volume {
        /// New volume in [0.0, 1.0]; out-of-range values are clamped
        value: Option<f32>,
    },

    /// Follow device and volume changes until interrupted
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Input,
    Output,
}

impl std::fmt::Display for DirectionArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectionArg::Input => write!(f, "input"),
            DirectionArg::Output => write!(f, "output"),
        }
    }
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Input => Direction::Input,
            DirectionArg::Output => Direction::Output,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG controls diagnostics; command output goes to stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let host = create_host().context("audio hardware service unavailable")?;
    let mut directory = DeviceDirectory::new(host);

    match cli.command {
        Commands::List => {
            directory.refresh();
            print_snapshot(directory.snapshot());
        }
        Commands::SetDefault { id, direction } => {
            directory.refresh();
            directory
                .switch_default(id, direction.into())
                .context("switch failed")?;
            print_snapshot(directory.snapshot());
        }
        Commands::Volume { value } => {
            directory.refresh();
            if let Some(value) = value {
                directory.set_volume(value).context("volume write failed")?;
            }
            println!("volume: {:.2}", directory.snapshot().volume);
        }
        Commands::Watch => watch(&mut directory)?,
    }

    Ok(())
}

fn watch(directory: &mut DeviceDirectory) -> anyhow::Result<()> {
    let events = directory
        .subscribe_changes()
        .context("could not register change listeners")?;

    directory.observe(print_snapshot);
    directory.refresh();

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = stop.clone();
    ctrlc::set_handler(move || stop_handler.store(true, Ordering::Relaxed))
        .context("could not install interrupt handler")?;

    // Dropping the directory afterwards deregisters the listeners.
    directory.run(&events, &stop);
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("output devices:");
    for entry in &snapshot.output_devices {
        let marker = if entry.is_active { "*" } else { " " };
        println!("  {} [{}] {}", marker, entry.id, entry.name);
    }
    println!("input devices:");
    for entry in &snapshot.input_devices {
        let marker = if entry.is_active { "*" } else { " " };
        println!("  {} [{}] {}", marker, entry.id, entry.name);
    }
    println!("volume: {:.2}", snapshot.volume);
}
