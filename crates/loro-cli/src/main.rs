//! loro: Loro self-help toolkit CLI
//!
//! Commands:
//!   config show                      - display current configuration
//!   kv get|set|rm|list               - inspect raw namespaced storage
//!   vault status|show|edit-field|save|wipe
//!                                    - encrypted safety plan
//!   mood record|recent               - daily mood check-ins
//!   journal add|list|clear           - journal history
//!   effect log|list|stats            - before/after distress ratings
//!   reflect <text>                   - ask the reflection proxy about an entry

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use loro_core::config::default_config_path;
use loro_core::types::{MoodEntry, SafetyPlan, SessionOrigin};
use loro_core::{LoroConfig, LoroError, LoroResult};
use loro_crypto::EncryptedBlob;
use loro_storage::{open_backend, KeyValueStore, StorageBackend};
use loro_tools::effect::kpis;
use loro_tools::mood::parse_date;
use loro_tools::{EffectFilter, EffectivenessLog, JournalHistory, MoodTracker};
use loro_vault::{EncryptedVault, SafetyPlanVault};

type Store = KeyValueStore<Box<dyn StorageBackend + Send>>;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "loro",
    version,
    about = "Loro self-help toolkit",
    long_about = "loro: mood and effectiveness tracking, journaling, and an encrypted safety plan, stored locally"
)]
struct Cli {
    /// Path to config.toml
    #[arg(long, short = 'c', env = "LORO_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LORO_LOG", default_value = "warn")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "LORO_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Raw key-value access (keys are given without the namespace)
    Kv {
        #[command(subcommand)]
        action: KvAction,
    },

    /// Encrypted safety plan
    ///
    /// The passphrase is read from LORO_PASSPHRASE or prompted for.
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },

    /// Daily mood check-ins
    Mood {
        #[command(subcommand)]
        action: MoodAction,
    },

    /// Journal history
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },

    /// Tool effectiveness log (SUDS before/after)
    Effect {
        #[command(subcommand)]
        action: EffectAction,
    },

    /// Send a journal entry to the reflection proxy
    Reflect {
        /// Entry text
        text: String,
        /// Also append the entry to journal history
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Subcommand, Debug)]
enum KvAction {
    /// Print the stored JSON for a key
    Get { key: String },
    /// Store a JSON value under a key
    Set { key: String, json: String },
    /// Delete a key
    Rm { key: String },
    /// List keys in the namespace
    List,
}

#[derive(Subcommand, Debug)]
enum VaultAction {
    /// Show whether an encrypted plan exists
    Status,
    /// Decrypt and print the safety plan
    Show,
    /// Set one field of the plan and re-encrypt
    ///
    /// FIELD uses the stored camelCase name (e.g. triggers, warningSigns).
    /// For list fields, a plain string is appended; a JSON array replaces.
    EditField { field: String, value: String },
    /// Replace the plan with the contents of a JSON file and encrypt it
    Save { file: PathBuf },
    /// Permanently delete the encrypted plan
    Wipe {
        /// Confirm deletion; there is no recovery
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum MoodAction {
    /// Record a check-in for a date (YYYY-MM-DD or "today")
    Record {
        date: String,
        /// Mood 1–5
        #[arg(long, default_value_t = 3)]
        mood: u8,
        /// Arousal 1–5
        #[arg(long, default_value_t = 3)]
        arousal: u8,
        /// Hours slept 0–12
        #[arg(long, default_value_t = 7.0)]
        sleep: f32,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show recent check-ins and a 7-day sparkline
    Recent {
        #[arg(short = 'n', default_value_t = 10)]
        n: usize,
    },
}

#[derive(Subcommand, Debug)]
enum JournalAction {
    /// Append an entry
    Add { text: String },
    /// Print all entries
    List,
    /// Delete all entries
    Clear,
}

#[derive(Subcommand, Debug)]
enum EffectAction {
    /// Log a session
    Log {
        tool: String,
        before: f64,
        after: f64,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List sessions, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Averages over matching sessions
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Only this tool
    #[arg(long)]
    tool: Option<String>,
    /// Lookback window in days (1–365)
    #[arg(long, default_value_t = 30)]
    days: u32,
    /// Substring of notes (case-insensitive)
    #[arg(long)]
    notes: Option<String>,
}

impl From<FilterArgs> for EffectFilter {
    fn from(a: FilterArgs) -> Self {
        EffectFilter {
            tool: a.tool,
            days: a.days,
            notes: a.notes,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log, &cli.log_format);

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = LoroConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    debug!(
        config = %config_path.display(),
        backend = %config.storage.backend,
        namespace = %config.storage.namespace,
        "configuration loaded"
    );

    match cli.command {
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
        Commands::Kv { action } => Ok(cmd_kv(&config, action)?),
        Commands::Vault { action } => Ok(cmd_vault(&config, action)?),
        Commands::Mood { action } => Ok(cmd_mood(&config, action)?),
        Commands::Journal { action } => Ok(cmd_journal(&config, action)?),
        Commands::Effect { action } => Ok(cmd_effect(&config, action)?),
        Commands::Reflect { text, save } => cmd_reflect(&config, &text, save).await,
    }
}

/// Logs go to stderr so command output stays pipeable.
fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn open_store(config: &LoroConfig) -> LoroResult<Store> {
    let backend = open_backend(&config.storage)?;
    Ok(KeyValueStore::with_namespace(
        backend,
        config.storage.namespace.clone(),
    ))
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ── `loro config show` ────────────────────────────────────────────────────────

fn cmd_config_show(config: &LoroConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── `loro kv` ─────────────────────────────────────────────────────────────────

fn cmd_kv(config: &LoroConfig, action: KvAction) -> LoroResult<()> {
    let mut store = open_store(config)?;

    match action {
        KvAction::Get { key } => {
            let raw = store
                .load_raw(&key)
                .with_context(|| format!("no value stored under '{key}'"))?;
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                Err(_) => println!("{raw}"),
            }
        }
        KvAction::Set { key, json } => {
            let value: serde_json::Value =
                serde_json::from_str(&json).context("value must be valid JSON")?;
            if !store.save(&key, &value) {
                return Err(LoroError::Storage(format!(
                    "could not save '{key}' (storage unavailable or full)"
                )));
            }
        }
        KvAction::Rm { key } => {
            if !store.remove(&key) {
                return Err(LoroError::Storage(format!("could not remove '{key}'")));
            }
        }
        KvAction::List => {
            for key in store.keys() {
                let size = store.load_raw(&key).map_or(0, |raw| raw.len());
                println!("{key:<24} {}", fmt_bytes(size as u64));
            }
        }
    }
    Ok(())
}

// ── `loro vault` ──────────────────────────────────────────────────────────────

fn cmd_vault(config: &LoroConfig, action: VaultAction) -> LoroResult<()> {
    let store = open_store(config)?;
    let mut vault: SafetyPlanVault<_> = EncryptedVault::with_config(store, &config.vault);

    match action {
        VaultAction::Status => {
            let stored = vault.store().load_raw(&config.vault.key);
            let Some(raw) = stored.filter(|raw| !raw.is_empty()) else {
                println!("vault: empty (no safety plan saved)");
                return Ok(());
            };
            println!("vault: locked");
            match EncryptedBlob::from_json(&raw) {
                Ok(blob) => {
                    println!("  format:     v{} {}", blob.v, blob.kdf);
                    println!("  iterations: {}", blob.iter);
                    println!("  size:       {}", fmt_bytes(raw.len() as u64));
                }
                Err(_) => println!("  blob is unreadable; `loro vault wipe --yes` starts over"),
            }
        }
        VaultAction::Show => {
            if !vault.has_blob() {
                println!("No safety plan saved yet. Use `loro vault edit-field` or `loro vault save`.");
                return Ok(());
            }
            let passphrase = read_passphrase("Vault passphrase: ")?;
            let plan = unlock_with_spinner(&mut vault, passphrase)?;
            println!("{}", serde_json::to_string_pretty(plan)?);
        }
        VaultAction::EditField { field, value } => {
            let passphrase = open_for_edit(&mut vault)?;
            let mut plan = vault.document().cloned().unwrap_or_default();
            set_plan_field(&mut plan, &field, &value)?;
            save_plan(&mut vault, plan, passphrase)?;
            println!("Saved {field}.");
        }
        VaultAction::Save { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let plan: SafetyPlan = serde_json::from_str(&content)
                .with_context(|| format!("parsing safety plan JSON {}", file.display()))?;
            let passphrase = open_for_edit(&mut vault)?;
            save_plan(&mut vault, plan, passphrase)?;
            println!("Safety plan encrypted and saved.");
        }
        VaultAction::Wipe { yes } => {
            if !yes {
                return Err(anyhow!(
                    "wiping deletes the encrypted safety plan permanently; re-run with --yes to confirm"
                )
                .into());
            }
            vault.wipe()?;
            println!("Vault wiped.");
        }
    }
    Ok(())
}

/// Unlock an existing plan, or prompt for a new passphrase when none exists.
/// Returns the passphrase to save under.
fn open_for_edit(
    vault: &mut SafetyPlanVault<Box<dyn StorageBackend + Send>>,
) -> LoroResult<SecretString> {
    if vault.has_blob() {
        let passphrase = read_passphrase("Vault passphrase: ")?;
        let copy = SecretString::from(passphrase.expose_secret().to_owned());
        unlock_with_spinner(vault, passphrase)?;
        return Ok(copy);
    }

    let passphrase = read_passphrase("New vault passphrase: ")?;
    if std::env::var("LORO_PASSPHRASE").is_err() {
        let confirm = read_passphrase("Confirm passphrase: ")?;
        if confirm.expose_secret() != passphrase.expose_secret() {
            return Err(anyhow!("passphrases do not match").into());
        }
    }
    vault.unlock(SecretString::from(passphrase.expose_secret().to_owned()))?;
    Ok(passphrase)
}

fn unlock_with_spinner<'v>(
    vault: &'v mut SafetyPlanVault<Box<dyn StorageBackend + Send>>,
    passphrase: SecretString,
) -> LoroResult<&'v SafetyPlan> {
    let pb = make_spinner("vault");
    pb.set_message("deriving key…");
    let result = vault.unlock(passphrase);
    pb.finish_and_clear();
    Ok(result.context("unable to unlock (wrong passphrase or damaged data)")?)
}

fn save_plan(
    vault: &mut SafetyPlanVault<Box<dyn StorageBackend + Send>>,
    mut plan: SafetyPlan,
    passphrase: SecretString,
) -> LoroResult<()> {
    plan.last_saved_at = Some(Utc::now().to_rfc3339());
    let pb = make_spinner("vault");
    pb.set_message("encrypting…");
    let result = vault.save_encrypted(plan, passphrase);
    pb.finish_and_clear();
    Ok(result.context("saving safety plan")?)
}

fn read_passphrase(prompt: &str) -> LoroResult<SecretString> {
    if let Ok(p) = std::env::var("LORO_PASSPHRASE") {
        return Ok(SecretString::from(p));
    }
    let p = rpassword::prompt_password(prompt).context("reading passphrase")?;
    Ok(SecretString::from(p))
}

/// Set `field` on `plan` from a command-line string.
fn set_plan_field(plan: &mut SafetyPlan, field: &str, value: &str) -> LoroResult<()> {
    let mut json = serde_json::to_value(&*plan)?;
    let obj = json
        .as_object_mut()
        .context("safety plan did not serialize to an object")?;

    let known: Vec<String> = obj.keys().cloned().collect();
    let current = obj.get(field).with_context(|| {
        format!("unknown field '{field}' (fields: {})", known.join(", "))
    })?;

    let next = match current {
        serde_json::Value::String(_) | serde_json::Value::Null => {
            serde_json::Value::String(value.to_string())
        }
        serde_json::Value::Array(items) => match serde_json::from_str(value) {
            Ok(serde_json::Value::Array(replacement)) => serde_json::Value::Array(replacement),
            _ => {
                let mut items = items.clone();
                items.push(serde_json::Value::String(value.to_string()));
                serde_json::Value::Array(items)
            }
        },
        _ => serde_json::from_str(value).context("value must be valid JSON for this field")?,
    };
    obj.insert(field.to_string(), next);

    *plan = serde_json::from_value(json)
        .with_context(|| format!("value does not fit field '{field}'"))?;
    Ok(())
}

// ── `loro mood` ───────────────────────────────────────────────────────────────

fn cmd_mood(config: &LoroConfig, action: MoodAction) -> LoroResult<()> {
    let mut store = open_store(config)?;
    let mut tracker = MoodTracker::new(&mut store);

    match action {
        MoodAction::Record {
            date,
            mood,
            arousal,
            sleep,
            notes,
        } => {
            let date = resolve_date(&date)?;
            let entry = MoodEntry {
                mood,
                arousal,
                sleep_hours: sleep,
                notes: notes.unwrap_or_default(),
                ts: now_ms(),
            };
            tracker.record(date, entry)?;
            println!("Recorded mood for {date}.");
        }
        MoodAction::Recent { n } => {
            let today = Utc::now().date_naive();
            let line: Vec<String> = tracker
                .sparkline(today, 7)
                .iter()
                .map(u8::to_string)
                .collect();
            println!("last 7 days: {}", line.join(" "));
            for (date, e) in tracker.recent(n) {
                println!(
                    "{date}  mood {}  arousal {}  sleep {:.1}h  {}",
                    e.mood, e.arousal, e.sleep_hours, e.notes
                );
            }
        }
    }
    Ok(())
}

fn resolve_date(s: &str) -> LoroResult<NaiveDate> {
    if s.eq_ignore_ascii_case("today") {
        return Ok(Utc::now().date_naive());
    }
    Ok(parse_date(s).map_err(anyhow::Error::from)?)
}

// ── `loro journal` ────────────────────────────────────────────────────────────

fn cmd_journal(config: &LoroConfig, action: JournalAction) -> LoroResult<()> {
    let mut store = open_store(config)?;
    let mut journal = JournalHistory::new(&mut store);

    match action {
        JournalAction::Add { text } => match journal.append(&text, now_ms())? {
            Some(entry) => println!("Saved entry {}.", entry.id),
            None => println!("Nothing to save (entry is empty)."),
        },
        JournalAction::List => {
            for entry in journal.list() {
                let when = chrono::DateTime::from_timestamp_millis(entry.created_at)
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("[{when}] {}", entry.content);
            }
        }
        JournalAction::Clear => {
            journal.clear()?;
            println!("Journal history cleared.");
        }
    }
    Ok(())
}

// ── `loro effect` ─────────────────────────────────────────────────────────────

fn cmd_effect(config: &LoroConfig, action: EffectAction) -> LoroResult<()> {
    let mut store = open_store(config)?;
    let mut log = EffectivenessLog::new(&mut store);

    match action {
        EffectAction::Log {
            tool,
            before,
            after,
            notes,
        } => {
            let s = log.log(&tool, before, after, notes, SessionOrigin::Manual, now_ms())?;
            println!("Logged {}: {} → {} (Δ {:+.1})", s.tool, s.before, s.after, s.delta);
        }
        EffectAction::List { filter } => {
            for r in log.query(&filter.into(), now_ms()) {
                println!(
                    "{}  {:<16} {:>5} → {:<5} Δ {:+.1}  {}",
                    r.date_iso,
                    r.tool,
                    r.before,
                    r.after,
                    r.delta,
                    r.notes.unwrap_or_default()
                );
            }
        }
        EffectAction::Stats { filter } => {
            let rows = log.query(&filter.into(), now_ms());
            let k = kpis(&rows);
            println!("sessions:   {}", k.n);
            println!("avg before: {}", fmt_avg(k.avg_before));
            println!("avg after:  {}", fmt_avg(k.avg_after));
            println!("avg delta:  {}", fmt_avg(k.avg_delta));
        }
    }
    Ok(())
}

fn fmt_avg(v: Option<f64>) -> String {
    v.map_or_else(|| "–".to_string(), |v| format!("{v:.1}"))
}

// ── `loro reflect` ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ReflectReply {
    reflection: Option<String>,
    crisis: Option<String>,
    error: Option<String>,
}

async fn cmd_reflect(config: &LoroConfig, text: &str, save: bool) -> Result<()> {
    if save {
        let mut store = open_store(config)?;
        JournalHistory::new(&mut store).append(text, now_ms())?;
    }

    let url = format!("{}/reflect", config.client.reflect_url.trim_end_matches('/'));
    let pb = make_spinner("reflect");
    pb.set_message("waiting for reflection…");

    let response = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "entry": text }))
        .send()
        .await;
    pb.finish_and_clear();

    let response = response.with_context(|| format!("connecting to {url}; is lorod running?"))?;
    let status = response.status();
    let reply: ReflectReply = response
        .json()
        .await
        .context("reading reflection response")?;

    if !status.is_success() {
        anyhow::bail!(
            "reflection failed ({status}): {}",
            reply.error.unwrap_or_else(|| "unknown error".into())
        );
    }

    println!("{}", reply.reflection.unwrap_or_default());
    if let Some(crisis) = reply.crisis {
        println!();
        println!("{crisis}");
    }
    Ok(())
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
