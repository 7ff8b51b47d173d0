//! finsight: interactive stock dashboard for the terminal
//!
//! # Usage
//!
//! ```bash
//! # Credentials (or put them in a .env file)
//! export GROQ_API_KEY="gsk_..."
//! export GOOGLE_SEARCH_API_KEY="..."
//! export GOOGLE_SEARCH_ENGINE_ID="..."
//!
//! cargo run --bin finsight
//! ```

mod commands;

use commands::Command;
use finsight_core::{Dashboard, FinsightConfig, render};
use finsight_utils::{LogFormat, init_tracing, load_dotenv};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

fn print_banner() {
    println!(
        r"
╔══════════════════════════════════════════════════════════════╗
║                finsight - AI Stock Insights                  ║
║                                                              ║
║  Type a ticker (AAPL) or a few words to search the news.     ║
║  /help for commands, /exit to quit.                          ║
║                                                              ║
║  Informational only. Not investment advice.                  ║
╚══════════════════════════════════════════════════════════════╝
"
    );
}

fn print_config(config: &FinsightConfig) {
    let set = |value: &Option<String>| if value.is_some() { "set" } else { "not set" };
    let credentials = &config.credentials;

    println!("Configuration:");
    println!("  Search provider: {}", config.search.provider);
    println!("  Results per search: {}", config.search.max_results);
    println!("  History range: {}", config.market.history_range);
    println!("  Model: {}", config.narrative.model);
    if let Some(base) = &config.narrative.api_base {
        println!("  API Base: {base}");
    }
    println!("  Timeout: {}s", config.request_timeout.as_secs());
    println!("  Completion key: {}", set(&credentials.completion_api_key));
    println!(
        "  Google key / engine id: {} / {}",
        set(&credentials.google_api_key),
        set(&credentials.google_engine_id)
    );
    println!("  Serper key: {}", set(&credentials.serper_api_key));
    println!("  Finnhub key: {}", set(&credentials.finnhub_api_key));
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env may set RUST_LOG, so it is read before tracing exists
    let dotenv = load_dotenv();
    init_tracing(LogFormat::from_env());
    match dotenv {
        Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Ignoring {e}"),
    }

    print_banner();

    let config = FinsightConfig::from_env()?;
    print_config(&config);

    // Replaced wholesale by /key and /provider
    let mut dashboard = Dashboard::from_config(config)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("finsight> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        if input.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&input) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("❌ {e}\n");
                continue;
            }
        };

        match command {
            Command::Analyze { ticker } => {
                println!("Analyzing {ticker}...\n");
                let report = dashboard.analyze_ticker(&ticker).await;
                println!("{}\n", render::dashboard(&report));
            }
            Command::News { query } => {
                println!("Searching news for '{query}'...\n");
                let report = dashboard.search_news(&query).await;
                println!("{}\n", render::news(&report));
            }
            Command::Key { update } => {
                let name = update.env_name();
                match dashboard.reconfigure(update) {
                    Ok(next) => {
                        dashboard = next;
                        println!("✅ {name} updated for this session\n");
                    }
                    Err(e) => eprintln!("❌ {e}\n"),
                }
            }
            Command::Provider { kind } => match dashboard.with_search_provider(kind) {
                Ok(next) => {
                    dashboard = next;
                    println!("✅ Searching with {kind}\n");
                }
                Err(e) => eprintln!("❌ {e}\n"),
            },
            Command::Config => print_config(dashboard.config()),
            Command::Help => println!("{}", Command::help_text()),
            Command::Exit => {
                println!("Goodbye!");
                break;
            }
        }
    }

    Ok(())
}
