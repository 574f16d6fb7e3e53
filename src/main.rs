//! eyecalc CLI
//!
//! Usage:
//!   eyecalc --text "/execute in minecraft:overworld run tp @s ..."   # Single line
//!   eyecalc --interactive                                           # Read lines from stdin
//!   eyecalc --config prefs.json --json                              # JSON output

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use eyecalc::core::{LineOutcome, RayCalculator, Session};
use eyecalc::logging::init_logging;
use eyecalc::types::{Preferences, ResultSnapshot};
use eyecalc::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "eyecalc",
    version = VERSION,
    about = "Calibrate eye of ender throws and track stronghold estimates",
    long_about = "eyecalc reads F3+C lines (eye throws, player position) and F3+I\n\
                  lines (fossils), calibrates each bearing and keeps the full,\n\
                  blind and divine estimates up to date.\n\n\
                  Interactive commands:\n  \
                  +  / -   nudge the last throw's bearing\n  \
                  alt      toggle the last throw's std profile\n  \
                  undo     remove the last throw\n  \
                  reset    forget throws, position and fossil\n  \
                  quit     exit"
)]
struct Args {
    /// Single input line to evaluate
    #[arg(short, long)]
    text: Option<String>,

    /// Read lines from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Preferences JSON file
    #[arg(short, long)]
    config: Option<String>,

    /// Crosshair correction in degrees (overrides the config file)
    #[arg(long, allow_hyphen_values = true)]
    crosshair: Option<f64>,

    /// Tall resolution height in pixels; enables pixel-sized corrections
    #[arg(long)]
    tall_res: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging on stderr
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    if args.no_color {
        colored::control::set_override(false);
    }

    let preferences = match load_preferences(&args) {
        Ok(preferences) => preferences,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let session = Session::new(preferences, Arc::new(RayCalculator::new()));
    if let Some(ref text) = args.text {
        run_single(&session, text, &args);
    } else {
        run_interactive(&session, &args);
    }
    ExitCode::SUCCESS
}

/// Config file (if any), then command line overrides
fn load_preferences(args: &Args) -> Result<Preferences, eyecalc::types::ConfigError> {
    let mut preferences = match &args.config {
        Some(path) => Preferences::load(path)?,
        None => Preferences::default(),
    };
    if let Some(crosshair) = args.crosshair {
        preferences.crosshair_correction = crosshair;
    }
    if let Some(height) = args.tall_res {
        preferences.use_tall_res = true;
        preferences.resolution_height = height;
    }
    preferences.validate()?;
    Ok(preferences)
}

/// Evaluate one line and print the results
fn run_single(session: &Session, text: &str, args: &Args) {
    let outcome = session.handle_line(text.trim());
    print_snapshot(&session.snapshot(), outcome, args);
}

/// Read lines until EOF or `quit`
fn run_interactive(session: &Session, args: &Args) {
    if !args.json {
        print_header(args.no_color);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if !args.json {
            print!("{}", format_prompt(session, args.no_color));
            if stdout.flush().is_err() {
                break;
            }
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            if !args.json {
                println!("\nSession ended. Throws: {}", session.throw_set().len());
            }
            break;
        }
        if line.is_empty() {
            continue;
        }

        let outcome = session.handle_line(line);
        if outcome == LineOutcome::Ignored {
            continue;
        }
        print_snapshot(&session.snapshot(), outcome, args);
    }
}

fn print_snapshot(snapshot: &ResultSnapshot, outcome: LineOutcome, args: &Args) {
    if args.json {
        match serde_json::to_string(snapshot) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("cannot serialize results: {}", e),
        }
        return;
    }
    if let Some(message) = outcome_message(outcome) {
        println!("{}", message.dimmed());
    }
    if args.no_color {
        println!("{}", snapshot.to_parseable_string());
    } else {
        println!("{}", snapshot.to_terminal_string());
    }
}

fn outcome_message(outcome: LineOutcome) -> Option<String> {
    match outcome {
        LineOutcome::ThrowAdded => Some("throw added".to_string()),
        LineOutcome::PositionUpdated => Some("player position updated".to_string()),
        LineOutcome::FossilSet => Some("fossil set".to_string()),
        LineOutcome::Corrected(total) => Some(format!("correction {:+.3}°", total)),
        LineOutcome::ProfileChanged(profile) => Some(format!("std profile {}", profile)),
        LineOutcome::Undone => Some("last throw removed".to_string()),
        LineOutcome::Reset => Some("session reset".to_string()),
        LineOutcome::Ignored => None,
    }
}

fn print_header(no_color: bool) {
    let title = format!("eyecalc v{}", VERSION);
    if no_color {
        println!("========================================");
        println!("  {}", title);
        println!("========================================");
    } else {
        println!("{}", title.bold());
    }
    println!("Paste F3+C / F3+I lines. Type 'quit' to exit.");
    println!();
}

fn format_prompt(session: &Session, no_color: bool) -> String {
    let prompt = format!("[{} throws] > ", session.throw_set().len());
    if no_color {
        prompt
    } else {
        prompt.cyan().to_string()
    }
}
