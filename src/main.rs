use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use draftpilot::assist::{AssistSession, Credential, DocumentMeta, TriggerOutcome, now_ms};
use draftpilot::config::{self, ConfigResult};
use draftpilot::error::DraftError;

/// How often the session is ticked while waiting for a suggestion
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Extra wait on top of the debounce and request timeout
const GRACE_MS: u64 = 1000;

/// AI writing suggestions for a document
#[derive(Parser, Debug)]
#[command(
    version,
    about = "AI writing suggestions: continues a document at the cursor"
)]
struct Args {
    /// Document to continue
    input: PathBuf,

    /// Cursor offset in characters (defaults to the end of the document)
    #[arg(long)]
    cursor: Option<usize>,

    /// Document title, used in the prompt and the cache key
    #[arg(long)]
    title: Option<String>,

    /// Document category, used in the prompt and the cache key
    #[arg(long)]
    category: Option<String>,

    /// Config file (defaults to ~/.config/draftpilot/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print session stats as JSON after the run
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    // Writes to /tmp/draftpilot-debug.log at DEBUG level
    #[cfg(debug_assertions)]
    init_debug_log();

    color_eyre::install()?;

    let args = Args::parse();

    let config_result = load_config(args.config.as_deref())?;
    if let Some(warning) = config_result.warning {
        eprintln!("Warning: {}", warning);
    }
    let assist = config_result.config.assist;

    let content = std::fs::read_to_string(&args.input).map_err(DraftError::from)?;
    let len = content.chars().count();
    let cursor = args.cursor.unwrap_or(len);
    if cursor > len {
        return Err(DraftError::InvalidCursor {
            offset: cursor,
            len,
        }
        .into());
    }

    if !assist.enabled {
        eprintln!(
            "Assistant is disabled. Set 'enabled = true' in the [assist] section of your config."
        );
        return Ok(());
    }

    let mut session = AssistSession::spawn(&assist, Credential::from_config(&assist));
    session.set_document_meta(DocumentMeta::new(args.title, args.category));

    match session.on_content_change(&content, cursor, false) {
        Some(TriggerOutcome::Armed) => {
            let budget = assist.debounce_ms + assist.request_timeout_ms + GRACE_MS;
            wait_for_suggestion(&mut session, Duration::from_millis(budget));
            match session.accept() {
                Some(text) => println!("{}", text),
                None => eprintln!("No suggestion available."),
            }
        }
        Some(TriggerOutcome::TooShort) => {
            eprintln!(
                "Document is shorter than {} characters; nothing to suggest.",
                assist.min_length
            );
        }
        outcome => log::debug!("Trigger did not arm: {:?}", outcome),
    }

    if args.stats {
        println!("{}", serde_json::to_string_pretty(&session.stats())?);
    }

    session.shutdown();

    #[cfg(debug_assertions)]
    log::debug!("=== DRAFTPILOT DEBUG SESSION ENDED ===");

    Ok(())
}

#[cfg(debug_assertions)]
fn init_debug_log() {
    use std::io::Write;

    let Ok(log_file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("/tmp/draftpilot-debug.log")
    else {
        return;
    };

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .format(|buf, record| {
            use std::time::SystemTime;
            let datetime: chrono::DateTime<chrono::Local> = SystemTime::now().into();
            writeln!(
                buf,
                "[{}] [{}] {}",
                datetime.format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();

    log::debug!("=== DRAFTPILOT DEBUG SESSION STARTED ===");
}

/// An explicit `--config` path must exist; the default location may be absent
fn load_config(path: Option<&std::path::Path>) -> Result<ConfigResult, DraftError> {
    match path {
        Some(path) if !path.exists() => Err(DraftError::Config(format!(
            "Config file not found: {}",
            path.display()
        ))),
        Some(path) => Ok(config::load_config_from(path)),
        None => Ok(config::load_config()),
    }
}

/// Tick until a suggestion is visible, nothing is left to wait for, or `budget` runs out
fn wait_for_suggestion(session: &mut AssistSession, budget: Duration) {
    let deadline = Instant::now() + budget;

    loop {
        session.tick();
        if session.is_visible() {
            return;
        }

        let idle =
            session.pending_trigger_ms_at(now_ms()).is_none() && session.in_flight_count() == 0;
        if idle || Instant::now() >= deadline {
            return;
        }

        thread::sleep(POLL_INTERVAL);
    }
}
