//! mobywrapper - CLI
//!
//! Verify someone's mObywatel identity from the terminal.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use mobywrapper::logging::init_logging;
use mobywrapper::{
    AppPrompt, HttpTransport, PersonRecord, VerificationSession, VerifierConfig, WaitOutcome,
};

#[derive(Parser)]
#[command(name = "mobywrapper")]
#[command(version = mobywrapper::VERSION)]
#[command(about = "mObywatel remote identity verification client")]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a verification and wait for the person to confirm it
    Verify {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seconds between data-pull attempts
        #[arg(long)]
        interval: Option<u64>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the verified person as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print or write the default configuration
    Config {
        /// Output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level, cli.log_json) {
        eprintln!("Warning: logging not initialised: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Verify {
            config,
            interval,
            timeout,
            json,
        } => {
            let mut config = match config {
                Some(path) => VerifierConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => VerifierConfig::default(),
            };
            if let Some(interval) = interval {
                config.polling.interval_secs = interval;
            }
            if let Some(timeout) = timeout {
                config.polling.max_wait_secs = timeout;
            }
            config.validate()?;

            verify(config, json).await?;
        }

        Commands::Config { output } => {
            let config = VerifierConfig::default();
            match output {
                Some(path) => {
                    config.save(&path)?;
                    println!("✅ Default configuration written to: {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&config)?),
            }
        }
    }

    Ok(())
}

async fn verify(config: VerifierConfig, json: bool) -> anyhow::Result<()> {
    let transport = HttpTransport::new(config.transport.clone())?;
    let mut session = VerificationSession::new(transport);

    let prompt = session.begin().await.context("starting verification")?;
    call_to_action(&prompt);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match session.wait_for_person(&config.polling, &cancel).await? {
        WaitOutcome::Verified(person) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&person)?);
            } else {
                print_person(&person);
            }
        }
        WaitOutcome::Expired => println!("❌ Code expired."),
        WaitOutcome::Cancelled => println!("⏹️ Verification cancelled."),
    }

    Ok(())
}

fn call_to_action(prompt: &AppPrompt) {
    println!("⚡ Show the code to the person whose documents you are verifying.");
    println!("📲 Once they enter it in the mObywatel app, their details appear here.");
    println!("🔢 Code: {}", prompt.code);
    println!("🔳 QR:   {}", prompt.qr_code);
    println!();
}

fn print_person(person: &PersonRecord) {
    println!("✅ mDowód verified");
    println!("{:-<60}", "");
    println!("Surname:            {}", person.surname);
    println!("Given names:        {}", person.given_names);
    println!("PESEL:              {}", person.national_id);
    println!("Date of birth:      {}", person.birth_date);
    println!("Citizenship:        {}", person.citizenship);
    println!("Father's name:      {}", person.father_name);
    println!("Mother's name:      {}", person.mother_name);
    println!("Document number:    {}", person.document_number);
    println!("Issued:             {}", person.document_issue_date);
    println!("Valid until:        {}", person.document_expiry_date);
    match person.verified_at() {
        Some(at) => println!("Verified at:        {}", at.to_rfc2822()),
        None => println!("Verified at:        {}", person.verification_timestamp),
    }
}
