mod viewer;

use clap::{Parser, Subcommand, ValueEnum};
use ftlog::LevelFilter;
use springsim_core::{
    build_simulation_from_source, DiagnosticSeverity, Diagnostics, SimulationConfig,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "springsim")]
#[command(about = "SpringSim - Hermite curves and mass-spring particles", long_about = None)]
struct Cli {
    /// Level of the diagnostics logged to stderr
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a command script and simulate it without a window
    Run {
        /// Path to the command script
        file: PathBuf,
        /// Seconds of simulated time
        #[arg(long, default_value_t = 5.0)]
        duration: f32,
        /// Display frames per second driving the frame clock
        #[arg(long, default_value_t = 60.0)]
        frame_rate: f32,
        /// Sub-step size, overridden by an `integration` command
        #[arg(long)]
        dt: Option<f32>,
    },
    /// Apply a command script and print the resulting spline
    Export {
        /// Path to the command script
        file: PathBuf,
    },
    /// Open an interactive window that reloads the script when it changes
    View {
        /// Path to the command script
        file: PathBuf,
        /// Sub-step size, overridden by an `integration` command
        #[arg(long)]
        dt: Option<f32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Root appender defaults to stderr
    let _guard = match ftlog::Builder::new()
        .max_log_level(cli.log_level.into())
        .try_init()
    {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logger unavailable: {}", e);
            None
        }
    };

    let result = match cli.command {
        Commands::Run {
            file,
            duration,
            frame_rate,
            dt,
        } => config_with(dt).and_then(|config| run_file(&file, duration, frame_rate, config)),
        Commands::Export { file } => export_file(&file),
        Commands::View { file, dt } => config_with(dt).and_then(|config| viewer::launch(file, config)),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn config_with(dt: Option<f32>) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    let mut config = SimulationConfig::default();
    if let Some(dt) = dt {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(format!("--dt must be positive, got {}", dt).into());
        }
        config.dt = dt;
    }
    Ok(config)
}

fn print_report(report: &Diagnostics) {
    for diagnostic in report.iter() {
        match diagnostic.severity {
            DiagnosticSeverity::Info => println!("{}", diagnostic),
            _ => eprintln!("{}", diagnostic),
        }
    }
}

fn run_file(
    file: &PathBuf,
    duration: f32,
    frame_rate: f32,
    config: SimulationConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let frames = frame_count(duration, frame_rate)?;
    let source = fs::read_to_string(file)?;
    let (mut state, report) = build_simulation_from_source(&source, config);
    print_report(&report);

    let frame_dt = 1.0 / frame_rate;
    let mut steps = 0;
    for _ in 0..frames {
        steps += state.advance_frame(frame_dt);
    }
    if !state.system.is_finite() {
        ftlog::error!("simulation diverged; try a smaller timestep");
    }

    println!("Simulated {:.3}s in {} steps ({})", state.time(), steps, state.system.method());
    for particle in state.snapshot().particles {
        println!(
            "particle {} = {} {} {}",
            particle.index, particle.position.x, particle.position.y, particle.position.z
        );
    }
    println!("Control points: {}", state.spline.len());
    println!("Arc length: {}", state.spline.arc_length());

    Ok(())
}

/// Number of display frames covering `duration` seconds at `frame_rate` Hz
fn frame_count(duration: f32, frame_rate: f32) -> Result<usize, String> {
    if !(frame_rate > 0.0 && frame_rate.is_finite()) {
        return Err(format!("frame rate must be positive and finite, got {}", frame_rate));
    }
    if !(duration >= 0.0 && duration.is_finite()) {
        return Err(format!("duration must be non-negative and finite, got {}", duration));
    }
    let frames = (duration * frame_rate).round();
    if !frames.is_finite() || frames > u32::MAX as f32 {
        return Err(format!("{}s at {} Hz is too many frames", duration, frame_rate));
    }
    Ok(frames as usize)
}

fn export_file(file: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(file)?;
    let (state, report) = build_simulation_from_source(&source, SimulationConfig::default());
    for diagnostic in report.iter() {
        if diagnostic.severity != DiagnosticSeverity::Info {
            eprintln!("{}", diagnostic);
        }
    }
    println!("{}", state.spline.export());
    Ok(())
}
