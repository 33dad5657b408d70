use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod agent;
mod config;
mod memory;
mod prompts;
mod tools;
mod web;

use agent::{AgentConfig, ResearchAgent};
use config::Config;
use memory::ConversationMemory;
use prospect_core::LlmBackend;
use prospect_local::browserless::BrowserlessClient;
use prospect_local::openai::OpenAiClient;
use prospect_local::pdf::{PdfLoader, PdfScraper};
use prospect_local::scrape::WebScraper;
use prospect_local::serper::SerperClient;
use prospect_local::summarize::Summarizer;
use tools::ToolRegistry;

#[derive(Parser, Debug)]
#[command(name = "prospect")]
#[command(about = "Bounded web-research agent (Serper + Browserless + PDF + OpenAI)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the research form over HTTP.
    Serve(ServeCmd),
    /// Run one research objective and print the final answer.
    Research(ResearchCmd),
    /// Diagnose configuration (json; no secrets).
    Doctor,
    /// Print version info.
    Version,
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    #[arg(long, env = "PROSPECT_HOST", default_value = "127.0.0.1")]
    host: String,
    #[arg(long, env = "PROSPECT_PORT", default_value_t = 8080)]
    port: u16,
}

#[derive(clap::Args, Debug)]
struct ResearchCmd {
    /// Research goal, e.g. "find the CTO of Acme Corp and their background".
    objective: String,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "prospect=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn build_agent(config: &Config) -> Result<ResearchAgent> {
    let client = prospect_local::default_client()?;
    let llm: Arc<dyn LlmBackend> = Arc::new(OpenAiClient::new(
        client.clone(),
        config.openai_api_key.clone(),
    ));
    let summarizer = Summarizer::new(llm.clone());

    let tools = ToolRegistry::new(
        SerperClient::new(client.clone(), config.serper_api_key.clone()),
        WebScraper::new(
            BrowserlessClient::new(client.clone(), config.browserless_api_key.clone()),
            summarizer.clone(),
        ),
        PdfScraper::new(PdfLoader::new(client), summarizer),
    );
    let memory = ConversationMemory::new(llm.clone());

    Ok(ResearchAgent::new(
        llm,
        tools,
        memory,
        AgentConfig::default(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Serve(cmd) => {
            let config = Config::from_env()?;
            let agent = Arc::new(build_agent(&config)?);
            web::serve(agent, &cmd.host, cmd.port).await?;
        }
        Commands::Research(cmd) => {
            let config = Config::from_env()?;
            let agent = build_agent(&config)?;
            let answer = agent.run(&cmd.objective).await?;
            println!("{answer}");
        }
        Commands::Doctor => {
            let report = config::doctor_report();
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report["ok"] != serde_json::Value::Bool(true) {
                std::process::exit(2);
            }
        }
        Commands::Version => {
            println!(
                "{}",
                serde_json::json!({
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                })
            );
        }
    }

    Ok(())
}
