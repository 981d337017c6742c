use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use hardball_core::config::{self, HardballConfig};
use hardball_core::error::HardballError;
use hardball_core::llm::LlmService;
use hardball_core::model::{Language, NegotiationStyle};
use hardball_core::personality::{all_pairings, build_system_instruction, CounterPersonality};
use hardball_core::session::{format_countdown, Session};
use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(
    name = "hardball",
    about = "Hardball: timed negotiation drills against an LLM counterpart",
    version
)]
enum Cli {
    /// Run a negotiation in the terminal
    Play {
        /// Operator name shown in the transcript
        #[arg(short, long)]
        name: String,
        /// Your negotiation style (competitive, collaborative, yielding, analytical)
        #[arg(short, long, default_value = "competitive")]
        style: String,
        /// API credential for the LLM provider (falls back to config, then the provider's env var)
        #[arg(long, env = "HARDBALL_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Language of the counterpart (en, es); defaults to simulation.language
        #[arg(long)]
        language: Option<Language>,
    },
    /// List which counterpart each negotiation style is paired with
    Styles {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
        #[arg(long)]
        language: Option<Language>,
    },
    /// Print the hidden instruction the counterpart receives for a style
    Prompt {
        #[arg(short, long)]
        style: String,
        #[arg(long)]
        language: Option<Language>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .compact()
        .init();

    let cli = Cli::parse();
    let config = match HardballConfig::load(Some(&std::env::current_dir()?)) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("failed to load config, using defaults: {e}");
            HardballConfig::default_config()
        }
    };

    match cli {
        Cli::Play {
            name,
            style,
            api_key,
            language,
        } => cmd_play(config, &name, &style, api_key.as_deref(), language).await,
        Cli::Styles { json, language } => {
            cmd_styles(language.unwrap_or(config.simulation.language), json)
        }
        Cli::Prompt { style, language } => {
            cmd_prompt(&style, language.unwrap_or(config.simulation.language));
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct StyleRow {
    style: NegotiationStyle,
    label: &'static str,
    counterpart_role: &'static str,
    directive: &'static str,
}

fn cmd_styles(language: Language, json: bool) -> Result<()> {
    let rows: Vec<StyleRow> = all_pairings(language)
        .into_iter()
        .map(|p| StyleRow {
            style: p.style,
            label: p.style.label(),
            counterpart_role: p.role,
            directive: p.directive,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<24} {}",
        "Your style".dimmed(),
        "Counterpart".dimmed()
    );
    for row in &rows {
        println!("{:<24} {}", row.label, row.counterpart_role.cyan());
        println!("  {}", row.directive.dimmed());
    }
    Ok(())
}

fn cmd_prompt(style: &str, language: Language) {
    let style = NegotiationStyle::from_label_or_default(style);
    let personality = CounterPersonality::for_style(style, language);
    println!("{}", build_system_instruction(&personality));
}

async fn cmd_play(
    mut config: HardballConfig,
    name: &str,
    style: &str,
    api_key: Option<&str>,
    language: Option<Language>,
) -> Result<()> {
    if let Some(language) = language {
        config.simulation.language = language;
    }
    let style = NegotiationStyle::from_label_or_default(style);
    let credential = config::resolve_credential(api_key, &config.llm);
    let llm = LlmService::from_config(&config.llm).context("failed to create LLM service")?;
    tracing::debug!(provider = llm.provider_name(), model = llm.model(), "terminal session");

    let mut session = Session::new(&config.simulation);
    session.start(style, credential.as_deref(), Some(name))?;

    let role = session.personality().map(|p| p.role).unwrap_or_default();
    println!(
        "{} {} vs {} ({} on the clock)",
        "Hardball".bold(),
        name.green(),
        role.cyan(),
        format_countdown(session.remaining())
    );
    println!("{}", "Type /quit to leave.".dimmed());
    if let Some(opening) = session.transcript().first() {
        println!("\n{} {}\n", "Counterpart:".bold(), opening.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if session.tick() {
            break;
        }
        print!("[{}] {} ", format_countdown(session.remaining()).yellow(), "you>".green());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let line = line.trim();
        if line == "/quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }

        match session.submit_user_turn(line, &llm).await {
            Ok(reply) => println!("\n{} {}\n", "Counterpart:".bold(), reply.text),
            Err(HardballError::SessionExpired) => break,
            Err(e) if e.is_transient() => eprintln!(
                "{} {e} (this looks temporary; send your message again)",
                "Error:".red()
            ),
            Err(e) => eprintln!("{} {e}", "Error:".red()),
        }
    }

    if !session.is_active() {
        let phrases = session.phrases();
        println!("\n{}", phrases.expired_notice.red().bold());
        println!("{}", phrases.restart_hint.dimmed());
    }
    Ok(())
}
