mod render;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use workpass_ai::conversation::Conversation;
use workpass_ai::engine::Engine;
use workpass_ai::pipeline::{build_from_pages, build_from_processed, BuildContext};
use workpass_ai::providers::{embedder_from_config, llm_from_config};
use workpass_ai::retry::ThreadSleeper;
use workpass_core::config::AppConfig;
use workpass_core::domain::UserContext;

#[derive(Parser)]
#[command(name = "workpass", about = "Singapore work pass assistant", version)]
struct Cli {
    /// Config file (default: $WORKPASS_CONFIG, then ./workpass.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Build the vector store from scraped pages or a processed artifact
    Build {
        /// Scraped pages JSON (default from config)
        #[arg(long, conflicts_with = "from_file")]
        pages: Option<PathBuf>,
        /// Skip processing and index an existing processed artifact
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Ask one question
    Ask {
        question: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Similarity search without generation
    Search {
        query: String,
        /// Number of results (clamped to the configured range)
        #[arg(long)]
        top_k: Option<u32>,
    },

    /// Interactive question loop
    Chat {
        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Pass types present in the knowledge base
    PassTypes,

    /// Categories present in the knowledge base
    Categories,

    /// Show knowledge base status
    Status,
}

/// Optional facts about the asker, appended to the question.
#[derive(clap::Args, Debug, Default)]
struct ProfileArgs {
    #[arg(long)]
    nationality: Option<String>,
    /// Pass currently held, e.g. "S Pass"
    #[arg(long)]
    current_pass: Option<String>,
    /// Monthly salary range, e.g. "5,000 - 10,000"
    #[arg(long)]
    salary_range: Option<String>,
}

impl ProfileArgs {
    fn to_context(&self) -> Option<UserContext> {
        let ctx = UserContext::profile(
            self.nationality.clone(),
            self.current_pass.clone(),
            self.salary_range.clone(),
        );
        (!ctx.is_empty()).then_some(ctx)
    }
}

fn now_rfc3339() -> anyhow::Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("formatting current time")
}

fn open_engine(config: AppConfig) -> anyhow::Result<Engine> {
    let embedder = embedder_from_config(&config.provider)?;
    let llm = llm_from_config(&config.provider)?;
    let now = now_rfc3339()?;
    let engine = Engine::initialize(config, embedder, llm, &ThreadSleeper, &now);
    engine.ensure_ready()?;
    Ok(engine)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Build { pages, from_file } => {
            let embedder = embedder_from_config(&config.provider)?;
            let now = now_rfc3339()?;
            let ctx = BuildContext {
                config: &config,
                embedder: embedder.as_ref(),
                sleeper: &ThreadSleeper,
                now: &now,
            };
            let report = match from_file {
                Some(path) => build_from_processed(&ctx, &path)?,
                None => {
                    let pages = pages.unwrap_or_else(|| config.store.pages_path.clone());
                    build_from_pages(&ctx, &pages, &config.store.processed_path)?
                }
            };
            render::build_report(&report, &cli.format)?;
        }
        Command::Ask { question, profile } => {
            let engine = open_engine(config)?;
            let answer = engine.query(&question, profile.to_context().as_ref());
            render::answer(&answer, &cli.format)?;
        }
        Command::Search { query, top_k } => {
            let engine = open_engine(config)?;
            let hits = engine.search(&query, top_k)?;
            render::search_hits(&hits, &cli.format)?;
        }
        Command::Chat { profile } => {
            let engine = open_engine(config)?;
            chat(&engine, profile.to_context().as_ref(), &cli.format)?;
        }
        Command::PassTypes => {
            let engine = open_engine(config)?;
            render::list(&engine.pass_types()?, &cli.format)?;
        }
        Command::Categories => {
            let engine = open_engine(config)?;
            render::list(&engine.categories()?, &cli.format)?;
        }
        Command::Status => {
            render::status(&Engine::inspect(&config)?, &cli.format)?;
        }
    }

    Ok(())
}

fn chat(engine: &Engine, ctx: Option<&UserContext>, format: &OutputFormat) -> anyhow::Result<()> {
    let mut conversation = Conversation::new();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    println!("Ask about Singapore work passes. Empty line or /quit exits, /clear resets.");
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        match question {
            "" | "/quit" | "/exit" => break,
            "/clear" => {
                conversation.clear();
                println!("(conversation cleared)");
                continue;
            }
            _ => {}
        }
        conversation.push_user(question);
        let answer = engine.query(question, ctx);
        render::answer(&answer, format)?;
        conversation.push_assistant(&answer);
    }
    log::debug!("Chat ended after {} turns", conversation.turns().len());
    Ok(())
}
