use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use darshan_protocol::{serialize_json, CommandAction, CommandRequest};
use serde_json::json;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod command;
mod doctor;
mod http;

use command::CommandContext;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "darshan")]
#[command(about = "Deterministic oracle: sacred texts, states, and remedies", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a Truth Package
    Draw(DrawArgs),

    /// Parse free text into intent signals and a state key
    Intent(IntentArgs),

    /// Show a verse with its sequence neighbors
    Context(ContextArgs),

    /// Compose a package and expand it into a narrative
    Expand(DrawArgs),

    /// List the remedy-state library
    States(StatesArgs),

    /// Validate content packs and print their fingerprints
    Doctor(DoctorArgs),

    /// Execute a JSON Command API request
    Command(CommandArgs),

    /// Serve the Command API over HTTP (POST /command)
    ServeHttp(ServeArgs),
}

#[derive(Args)]
struct DrawArgs {
    /// Free-text question guiding the reading
    question: Option<String>,

    /// Full name for personal mode
    #[arg(long)]
    name: Option<String>,

    /// Birth date (YYYY-MM-DD) for personal mode
    #[arg(long)]
    birth_date: Option<String>,

    /// Deterministic seed
    #[arg(long, conflicts_with = "daily")]
    seed: Option<u64>,

    /// Derive the seed from today's UTC date (stable for the whole day)
    #[arg(long)]
    daily: bool,

    /// Composite sacred keys to avoid (comma-separated)
    #[arg(long, value_delimiter = ',')]
    avoid: Vec<String>,

    /// State keys to avoid (comma-separated)
    #[arg(long, value_delimiter = ',')]
    avoid_states: Vec<String>,

    /// History key: consult and update the in-process usage store
    #[arg(long)]
    user: Option<String>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct IntentArgs {
    /// Text to parse
    text: String,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ContextArgs {
    /// Verse id (e.g. YS.1.1)
    id: String,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StatesArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DoctorArgs {
    /// Override corpus pack to validate instead of the builtin
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Override states pack to validate instead of the builtin
    #[arg(long)]
    states: Option<PathBuf>,

    /// Override lexicon pack to validate instead of the builtin
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CommandArgs {
    /// Inline JSON payload (mutually exclusive with --file)
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to file containing JSON payload
    #[arg(long)]
    file: Option<PathBuf>,

    /// Pretty-print JSON response
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address, e.g. 127.0.0.1:7700
    #[arg(long, default_value = "127.0.0.1:7700")]
    bind: String,

    /// Allow binding to non-loopback addresses (requires an auth token)
    #[arg(long)]
    public: bool,

    /// Require Authorization: Bearer <token> on all requests (env: DARSHAN_AUTH_TOKEN)
    #[arg(long)]
    auth_token: Option<String>,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON parsing.
    let json_output = match &cli.command {
        Commands::Draw(args) | Commands::Expand(args) => args.json,
        Commands::Intent(args) => args.json,
        Commands::Context(args) => args.json,
        Commands::States(args) => args.json,
        Commands::Doctor(args) => args.json,
        Commands::Command(_) => true,
        Commands::ServeHttp(_) => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Draw(args) => run_draw(args, false).await,
        Commands::Expand(args) => run_draw(args, true).await,
        Commands::Intent(args) => run_intent(args).await,
        Commands::Context(args) => run_context(args).await,
        Commands::States(args) => run_states(args).await,
        Commands::Doctor(args) => run_doctor(args),
        Commands::Command(args) => run_command(args).await,
        Commands::ServeHttp(args) => http::serve(&args.bind, args.public, args.auth_token).await,
    }
}

fn resolve_seed(seed: Option<u64>, daily: bool) -> Option<u64> {
    seed.or_else(|| daily.then(daily_seed))
}

/// Today's UTC date as YYYYMMDD — the caller-side convention for "same
/// reading all day".
fn daily_seed() -> u64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    year as u64 * 10_000 + u64::from(month) * 100 + u64::from(day)
}

/// Days-since-epoch to (year, month, day), proleptic Gregorian.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

fn profile_json(args: &DrawArgs) -> Option<serde_json::Value> {
    (args.name.is_some() || args.birth_date.is_some()).then(|| {
        json!({
            "full_name": args.name,
            "birth_date": args.birth_date,
        })
    })
}

async fn run_draw(args: DrawArgs, expand: bool) -> Result<()> {
    let ctx = CommandContext::from_env()?;
    let mut payload = json!({
        "question": args.question,
        "recent_sacred_ids": args.avoid,
        "recent_state_keys": args.avoid_states,
        "user": args.user,
    });
    if let Some(seed) = resolve_seed(args.seed, args.daily) {
        payload["seed"] = json!(seed);
    }
    if let Some(profile) = profile_json(&args) {
        payload["profile"] = profile;
    }

    let action = if expand {
        CommandAction::Expand
    } else {
        CommandAction::Draw
    };
    let response = command::execute(&ctx, CommandRequest { action, payload }).await;

    if args.json {
        return print_stdout(&serde_json::to_string_pretty(&response)?);
    }
    if response.is_error() {
        eprintln!(
            "Error: {}",
            response.message.as_deref().unwrap_or("Unknown error")
        );
        std::process::exit(1);
    }

    let package = if expand {
        &response.data["package"]
    } else {
        &response.data
    };
    print_package(package)?;
    if expand {
        print_stdout("")?;
        print_stdout("Narrative")?;
        print_stdout(
            response.data["narrative"]["narrative_expansion"]
                .as_str()
                .unwrap_or(""),
        )?;
    }
    Ok(())
}

fn print_package(package: &serde_json::Value) -> Result<()> {
    print_stdout(&format!(
        "State: {} (klesha: {}, guna: {})",
        package["state_key"].as_str().unwrap_or("?"),
        package["diagnosis"]["klesha"].as_str().unwrap_or("?"),
        package["diagnosis"]["samkhya_guna"].as_str().unwrap_or("?")
    ))?;
    print_stdout(&format!(
        "Verse {}:",
        package["sacred_id"].as_str().unwrap_or("?")
    ))?;
    print_stdout(&format!(
        "  {}",
        package["sacred_text"].as_str().unwrap_or("")
    ))?;

    if let Some(title) = package["practice"]["title"].as_str() {
        let duration = package["practice"]["duration"]
            .as_str()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        print_stdout(&format!("Practice: {title}{duration}"))?;
        if let Some(steps) = package["practice"]["steps"].as_array() {
            for step in steps {
                print_stdout(&format!("  - {}", step.as_str().unwrap_or("")))?;
            }
        }
    }
    print_stdout(&format!(
        "To sit with: {}",
        package["contemplative_question"]["text"].as_str().unwrap_or("")
    ))?;
    if let Some(insight) = package["insight"].as_str() {
        print_stdout(&format!("Insight: {insight}"))?;
    }
    Ok(())
}

async fn run_intent(args: IntentArgs) -> Result<()> {
    let ctx = CommandContext::from_env()?;
    let response = command::execute(
        &ctx,
        CommandRequest {
            action: CommandAction::ParseIntent,
            payload: json!({ "text": args.text }),
        },
    )
    .await;

    if args.json {
        return print_stdout(&serde_json::to_string_pretty(&response)?);
    }
    if response.is_error() {
        eprintln!(
            "Error: {}",
            response.message.as_deref().unwrap_or("Unknown error")
        );
        std::process::exit(1);
    }

    let intent = &response.data["intent"];
    if intent.is_null() {
        print_stdout("No signals found (empty input)")?;
        return Ok(());
    }
    print_stdout(&format!(
        "verb_class: {}",
        intent["verb_class"].as_str().unwrap_or("-")
    ))?;
    print_stdout(&format!(
        "subject:    {}",
        intent["subject"].as_str().unwrap_or("-")
    ))?;
    print_stdout(&format!(
        "theme:      {}",
        intent["theme"].as_str().unwrap_or("-")
    ))?;
    if let Some(emotions) = intent["emotion_labels"].as_array() {
        let labels: Vec<&str> = emotions.iter().filter_map(|e| e.as_str()).collect();
        print_stdout(&format!("emotions:   {}", labels.join(", ")))?;
    }
    if let Some(candidates) = intent["state_candidates"].as_array() {
        for candidate in candidates {
            print_stdout(&format!(
                "  {} ({:.1})",
                candidate["state_key"].as_str().unwrap_or("?"),
                candidate["score"].as_f64().unwrap_or(0.0)
            ))?;
        }
    }
    print_stdout(&format!(
        "state:      {}",
        response.data["state_key"].as_str().unwrap_or("-")
    ))?;
    Ok(())
}

async fn run_context(args: ContextArgs) -> Result<()> {
    let ctx = CommandContext::from_env()?;
    let response = command::execute(
        &ctx,
        CommandRequest {
            action: CommandAction::SutraContext,
            payload: json!({ "id": args.id }),
        },
    )
    .await;

    if args.json {
        return print_stdout(&serde_json::to_string_pretty(&response)?);
    }
    if response.data.is_null() {
        eprintln!("Unknown verse id: {}", args.id);
        std::process::exit(1);
    }
    for (label, verse) in [
        ("prev", &response.data["prev"]),
        ("", &response.data["primary"]),
        ("next", &response.data["next"]),
    ] {
        if verse.is_null() {
            continue;
        }
        let id = verse["id"].as_str().unwrap_or("?");
        let text = verse["text"].as_str().unwrap_or("");
        if label.is_empty() {
            print_stdout(&format!("{id}: {text}"))?;
        } else {
            print_stdout(&format!("  [{label}] {id}: {text}"))?;
        }
    }
    Ok(())
}

async fn run_states(args: StatesArgs) -> Result<()> {
    let ctx = CommandContext::from_env()?;
    let response = command::execute(
        &ctx,
        CommandRequest {
            action: CommandAction::States,
            payload: json!({}),
        },
    )
    .await;

    if args.json {
        return print_stdout(&serde_json::to_string_pretty(&response)?);
    }
    if let Some(states) = response.data.as_array() {
        for state in states {
            print_stdout(&format!(
                "{:<24} klesha={:<12} guna={}",
                state["key"].as_str().unwrap_or("?"),
                state["klesha"].as_str().unwrap_or("?"),
                state["guna"].as_str().unwrap_or("?")
            ))?;
        }
    }
    Ok(())
}

fn run_doctor(args: DoctorArgs) -> Result<()> {
    let report = doctor::run(
        args.corpus.as_ref(),
        args.states.as_ref(),
        args.lexicon.as_ref(),
    )?;

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&report)?)?;
    } else {
        for pack in &report.packs {
            if pack.ok {
                print_stdout(&format!(
                    "{:<8} ok  ({} entries, sha256 {}..., {})",
                    pack.name,
                    pack.entries.unwrap_or(0),
                    &pack.sha256[..12],
                    pack.source
                ))?;
            } else {
                print_stdout(&format!(
                    "{:<8} ERROR: {} ({})",
                    pack.name,
                    pack.error.as_deref().unwrap_or("unknown"),
                    pack.source
                ))?;
            }
        }
        for orphan in &report.orphan_qualities {
            print_stdout(&format!("warning: quality '{orphan}' matches no corpus tag"))?;
        }
    }

    if !report.is_healthy() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_command(args: CommandArgs) -> Result<()> {
    let raw = read_payload(&args)?;
    let request: CommandRequest =
        serde_json::from_str(&raw).context("Invalid JSON passed to --json/--file")?;

    let ctx = CommandContext::from_env()?;
    let response = command::execute(&ctx, request).await;

    let output = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serialize_json(&response)?
    };
    print_stdout(&output)?;

    if response.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn read_payload(args: &CommandArgs) -> Result<String> {
    if let Some(raw) = &args.json {
        return Ok(raw.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON from {}", path.display()));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read JSON from stdin")?;

    if buffer.trim().is_empty() {
        anyhow::bail!("Command request is empty. Provide --json, --file, or pipe JSON via stdin.");
    }

    Ok(buffer)
}
