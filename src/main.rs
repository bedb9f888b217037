//! Hitech ritual CLI
//!
//! Usage:
//!   hitech-ritual --trace trace.json             # Replay a recorded trace
//!   hitech-ritual --fixture a.json --fixture b.json  # Verify replay fixtures
//!   hitech-ritual --interactive                  # Feed events from stdin
//!   hitech-ritual --serve                        # HTTP API server
//!   hitech-ritual --trace trace.json --json      # JSON output

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use hitech_ritual::core::{
    load_config, load_fixture, replay_trace, run_server, save_snapshot, serialize_snapshot,
    verify_fixture, AppConfig, BootCommand, EvidenceRegistry, RitualSession,
};
use hitech_ritual::types::{
    RawInteractionEvent, ReplayOptions, ReplayResult, RitualContext, RitualSnapshot,
};
use hitech_ritual::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "hitech-ritual",
    version = VERSION,
    about = "Hitech boot ritual - gesture state machine, evidence ledger and replay",
    long_about = "Drives the drag → hold → release boot ritual of the Hitech deck.\n\n\
                  Modes:\n  \
                  --trace        Replay a recorded JSON trace\n  \
                  --fixture      Verify replay fixtures (repeatable)\n  \
                  --interactive  Feed events and boot commands from stdin\n  \
                  --serve        HTTP API server mode\n\n\
                  Stages:\n  \
                  idle          - Waiting for pointer down\n  \
                  dragging      - Travelling toward the drag threshold\n  \
                  drag-complete - Graph link engaged, hold to continue\n  \
                  holding       - Accumulating hold time\n  \
                  hold-complete - Release on the anchor to seal\n  \
                  sealed        - Ritual complete, primary evidence satisfied"
)]
struct Args {
    /// JSON trace (array of raw events) to replay
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Replay fixture to verify; may be given several times
    #[arg(short, long)]
    fixture: Vec<PathBuf>,

    /// Interactive mode - read events and commands from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (overrides the config file)
    #[arg(long)]
    addr: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ritual name (overrides the config file)
    #[arg(long)]
    ritual: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show emitted domain events and evidence
    #[arg(long)]
    verbose: bool,

    /// Directory to write the final evidence snapshot to
    #[arg(long)]
    evidence_out: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    if args.no_color {
        colored::control::set_override(false);
    }

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(ritual) = &args.ritual {
        config.ritual = ritual.clone();
    }

    if args.serve {
        let addr = args.addr.clone().unwrap_or_else(|| config.server.addr.clone());
        return match run_server(&addr, config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{} {}", "server error:".red().bold(), e);
                ExitCode::FAILURE
            }
        };
    }

    if !args.fixture.is_empty() {
        return run_fixtures(&args);
    }

    if let Some(path) = &args.trace {
        return run_trace(path, &config, &args);
    }

    if !args.interactive {
        tracing::debug!("no mode flag given, defaulting to interactive");
    }
    run_interactive(&config, &args)
}

/// Replay a trace file
fn run_trace(path: &Path, config: &AppConfig, args: &Args) -> ExitCode {
    let trace: Vec<RawInteractionEvent> = match std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| serde_json::from_str(&json).map_err(|e| e.to_string()))
    {
        Ok(trace) => trace,
        Err(e) => {
            eprintln!("{} cannot load trace {}: {}", "error:".red().bold(), path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let options = ReplayOptions {
        ritual: config.ritual.clone(),
        thresholds: config.thresholds,
        ..ReplayOptions::default()
    };
    let result = replay_trace(&trace, &options);

    if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
        }
    } else {
        print_replay(&result, args.verbose);
    }

    if let Some(dir) = &args.evidence_out {
        match save_snapshot(&result.evidence_snapshot, dir) {
            Ok(path) => eprintln!("{} {}", "evidence saved:".cyan(), path.display()),
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

/// Verify every fixture, failing if any mismatches
fn run_fixtures(args: &Args) -> ExitCode {
    let mut failed = 0usize;

    for path in &args.fixture {
        let fixture = match load_fixture(path) {
            Ok(fixture) => fixture,
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                failed += 1;
                continue;
            }
        };
        let report = verify_fixture(&fixture);

        if args.json {
            println!("{}", serde_json::to_string(&report).unwrap_or_default());
        } else if report.passed() {
            println!("{} {} {}", "PASS".green().bold(), report.name, report.digest[..12].dimmed());
        } else {
            println!("{} {}", "FAIL".red().bold(), report.name);
            for mismatch in &report.mismatches {
                println!("  └─ {}", mismatch);
            }
        }
        if !report.passed() {
            failed += 1;
        }
    }

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        eprintln!("{} of {} fixtures failed", failed, args.fixture.len());
        ExitCode::FAILURE
    }
}

/// One parsed stdin line
enum Input {
    Event(RawInteractionEvent),
    Boot(BootCommand, u64),
    Status,
    Export,
}

/// Run interactive mode
fn run_interactive(config: &AppConfig, args: &Args) -> ExitCode {
    let mut session = RitualSession::new(
        RitualContext::new(config.ritual.clone()),
        config.resolved_thresholds(),
        config.features,
    );

    print_header(&config.ritual);
    println!("Events:   down|move|up|cancel <pointer> <x> <y> <ts>   tick <delta> <ts>   reset <ts>");
    println!("Boot:     arm|confirm|override-enable|override-disable|boot-reset <ts>");
    println!("Other:    status | export | quit   (a JSON raw event is accepted too)");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", format_prompt(&session));
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            println!("\nSession ended. Evidence events: {}", session.evidence().event_count);
            break;
        }
        if line.is_empty() {
            continue;
        }

        let Some(input) = parse_input(line) else {
            println!("{}", format!("⚠ Unrecognized input: {}", line).yellow());
            continue;
        };

        match input {
            Input::Event(raw) => {
                let step = session.feed(&raw);
                if args.json {
                    println!("{}", serde_json::to_string(&step).unwrap_or_default());
                } else {
                    println!("{}", render_snapshot(&session.status().snapshot, args.no_color));
                    for event in &step.events {
                        println!("  {} {}", "→".cyan(), event.name);
                    }
                }
            }
            Input::Boot(command, ts) => {
                let boot = session.dispatch_boot(command, ts).clone();
                if args.json {
                    println!("{}", serde_json::to_string(&boot).unwrap_or_default());
                } else {
                    let marker = boot.last_action.unwrap_or_default();
                    println!("  boot={} ({})", boot.status.to_string().bold(), marker);
                }
            }
            Input::Status => print_status(&session, args),
            Input::Export => export_evidence(&session, config, args),
        }
    }

    if let Some(dir) = &args.evidence_out {
        let snapshot = serialize_snapshot(session.evidence(), now_ms());
        if let Err(e) = save_snapshot(&snapshot, dir) {
            eprintln!("{} {}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

/// Parse one interactive line
fn parse_input(line: &str) -> Option<Input> {
    if line.starts_with('{') {
        return serde_json::from_str(line).ok().map(Input::Event);
    }

    let mut parts = line.split_whitespace();
    let verb = parts.next()?.to_ascii_lowercase();
    let nums: Vec<f64> = parts.map(|p| p.parse::<f64>().ok()).collect::<Option<_>>()?;
    let ts = |i: usize| nums.get(i).copied().unwrap_or(0.0);

    let input = match (verb.as_str(), nums.len()) {
        ("down", 4) => Input::Event(RawInteractionEvent::pointer_down(ts(0), ts(1), ts(2), ts(3))),
        ("move", 4) => Input::Event(RawInteractionEvent::pointer_move(ts(0), ts(1), ts(2), ts(3))),
        ("up", 4) => Input::Event(RawInteractionEvent::pointer_up(ts(0), ts(1), ts(2), ts(3))),
        ("cancel", 4) => Input::Event(RawInteractionEvent::pointer_cancel(ts(0), ts(1), ts(2), ts(3))),
        ("tick", 2) => Input::Event(RawInteractionEvent::hold_tick(ts(0), ts(1))),
        ("reset", 0 | 1) => Input::Event(RawInteractionEvent::reset(ts(0))),
        ("status", 0) => Input::Status,
        ("export", 0) => Input::Export,
        ("boot-reset", 0 | 1) => Input::Boot(BootCommand::Reset, ts(0).max(0.0) as u64),
        (name, 0 | 1) => Input::Boot(BootCommand::parse(name)?, ts(0).max(0.0) as u64),
        _ => return None,
    };
    Some(input)
}

/// Print header
fn print_header(ritual: &str) {
    println!("{}", "════════════════════════════════════════".bold());
    println!("{}", format!("  Hitech ritual v{} - {}", VERSION, ritual).bold());
    println!("{}", "════════════════════════════════════════".bold());
    println!();
}

/// Format prompt from the current stage
fn format_prompt(session: &RitualSession) -> String {
    let stage = session.machine().stage();
    let label = format!("{} [{} | {}]", stage.emoji(), stage, session.boot().status);
    format!("{} > ", stage.paint(&label))
}

fn render_snapshot(snapshot: &RitualSnapshot, no_color: bool) -> String {
    if no_color {
        snapshot.to_parseable_string()
    } else {
        snapshot.to_terminal_string()
    }
}

/// Print replay summary
fn print_replay(result: &ReplayResult, verbose: bool) {
    println!("{}", result.snapshot.to_terminal_string());
    println!("  events replayed: {}", result.normalized_trace.len());
    println!("  digest:          {}", result.digest.dimmed());

    if verbose {
        let registry = EvidenceRegistry::standard();
        let recorded: Vec<&str> = registry.known_actions().collect();

        println!("  emitted:");
        for event in &result.emitted_events {
            let tag = if recorded.contains(&event.name.as_str()) { "evidence" } else { "" };
            println!("    {:>6}ms  {} {}", event.timestamp_ms, event.name, tag.dimmed());
        }
        println!("  evidence:");
        for entry in result.evidence.entries.values() {
            let mark = if entry.satisfied { "✓".green() } else { "·".dimmed() };
            let title = registry.definition(&entry.key).map_or("", |d| d.title.as_str());
            println!("    {} {} {}", mark, entry.key, title.dimmed());
        }
    }
}

/// Print the full session status
fn print_status(session: &RitualSession, args: &Args) {
    let status = session.status();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&status).unwrap_or_default());
        return;
    }

    println!("{}", render_snapshot(&status.snapshot, args.no_color));
    println!("  boot:    {}", status.boot.status.to_string().bold());
    println!("  ready:   {}", if status.ready { "yes".green() } else { "no".red() });
    if !status.missing_blockers.is_empty() {
        println!("  missing: {}", status.missing_blockers.join(", "));
    }
    for (name, gate) in status.gates.entries() {
        let state = if gate.locked { "locked".red() } else { "open".green() };
        let reason = gate.reason.map(|r| r.code()).unwrap_or("");
        println!("  gate {:<15} {} {}", name, state, reason.dimmed());
    }
}

/// Save the current evidence snapshot to the configured directory
fn export_evidence(session: &RitualSession, config: &AppConfig, args: &Args) {
    let dir = args
        .evidence_out
        .clone()
        .unwrap_or_else(|| config.server.evidence_dir.clone());
    let snapshot = session.export_evidence(now_ms());
    match save_snapshot(&snapshot, &dir) {
        Ok(path) => println!("  {} {}", "evidence saved:".cyan(), path.display()),
        Err(e) => println!("  {} {}", "export failed:".red(), e),
    }
}

/// Wall clock in epoch milliseconds
fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
