//! Toolgate CLI - Main entry point

mod commands;

use clap::{Parser, Subcommand};
use toolgate_foundation::ToolgateConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Toolgate - route natural-language tasks to gateway tools
#[derive(Parser, Debug)]
#[command(name = "toolgate")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Gateway base URL (overrides config and TOOLGATE_GATEWAY_URL)
    #[arg(long, global = true)]
    gateway_url: Option<String>,

    /// Bearer token for the gateway
    #[arg(long, global = true)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick the best tool for a task and invoke it
    Route {
        /// Task in natural language
        task: String,

        /// Extra context used for ranking
        #[arg(short, long, default_value = "")]
        context: String,

        /// Number of candidates to show
        #[arg(long)]
        top_n: Option<usize>,

        /// Rank and build arguments without invoking
        #[arg(long)]
        dry_run: bool,

        /// Keyword ranking only
        #[arg(long)]
        no_ai: bool,

        /// AI model for this request only
        #[arg(long)]
        ai_model: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// List tools exposed by the gateway
    Tools,
    /// Show the effective configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = ToolgateConfig::load()?;
    // CLI flags win over files and environment
    if let Some(url) = args.gateway_url {
        config.gateway.url = Some(url);
    }
    if let Some(token) = args.token {
        config.gateway.token = Some(token);
    }

    match args.command {
        Command::Route {
            task,
            context,
            top_n,
            dry_run,
            no_ai,
            ai_model,
            json,
        } => {
            if let Some(n) = top_n {
                config.selection.top_n = Some(n);
            }
            config.validate()?;
            let options = commands::RouteOptions {
                dry_run,
                use_ai: !no_ai,
                ai_model,
                json,
            };
            commands::route(&config, &task, &context, options).await
        }
        Command::Tools => commands::list_tools(&config).await,
        Command::Config => commands::show_config(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_route_flags() {
        let args = Args::parse_from([
            "toolgate",
            "--gateway-url",
            "https://gw.example.com",
            "route",
            "weather in Seoul",
            "--top-n",
            "3",
            "--no-ai",
            "--dry-run",
        ]);

        assert_eq!(args.gateway_url.as_deref(), Some("https://gw.example.com"));
        match args.command {
            Command::Route {
                task,
                top_n,
                no_ai,
                dry_run,
                json,
                ..
            } => {
                assert_eq!(task, "weather in Seoul");
                assert_eq!(top_n, Some(3));
                assert!(no_ai && dry_run && !json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let args = Args::parse_from(["toolgate", "tools", "--debug"]);
        assert!(args.debug);
        assert!(matches!(args.command, Command::Tools));
    }
}
