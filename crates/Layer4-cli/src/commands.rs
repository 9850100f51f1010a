//! Subcommand handlers

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use toolgate_foundation::{InMemoryMetrics, ToolgateConfig};
use toolgate_gateway::GatewayClient;
use toolgate_router::{
    AiProviderConfig, FeedbackStore, HttpAiRecommender, RoutePlan, SelectionCandidate, ToolRouter,
    ToolSelector,
};
use tracing::debug;

pub struct RouteOptions {
    pub dry_run: bool,
    pub use_ai: bool,
    pub ai_model: Option<String>,
    pub json: bool,
}

fn gateway(config: &ToolgateConfig) -> Result<GatewayClient> {
    let connection = config
        .connection()
        .context("Gateway is not configured (set TOOLGATE_GATEWAY_URL or --gateway-url)")?;
    debug!("Using {:?}", connection);
    Ok(GatewayClient::new(connection)?)
}

pub async fn route(config: &ToolgateConfig, task: &str, context: &str, options: RouteOptions) -> Result<()> {
    let client = gateway(config)?;

    let ai_config = if options.use_ai {
        AiProviderConfig::from_settings(&config.ai).map(|base| match &options.ai_model {
            Some(model) => base.with_model(model.as_str()),
            None => base,
        })
    } else {
        None
    };

    let mut selector = ToolSelector::from_settings(&config.selection);
    if ai_config.is_some() {
        selector = selector.with_recommender(Arc::new(HttpAiRecommender::new()?));
    }

    let metrics = Arc::new(InMemoryMetrics::new());
    let router = ToolRouter::new(client, selector, Arc::new(FeedbackStore::new()))
        .with_metrics(metrics.clone());

    if options.dry_run {
        let plan = router.plan(task, context, ai_config.as_ref()).await?;
        if options.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print_plan(&plan);
        }
        if plan.is_no_match() {
            bail!("No tool matched the task");
        }
        return Ok(());
    }

    let outcome = router.route(task, context, ai_config.as_ref()).await?;
    debug!("Metrics: {:?}", metrics.snapshot());

    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_candidates(&outcome.candidates);
        if let Some(args) = &outcome.arguments {
            println!("Arguments: {}", serde_json::Value::Object(args.clone()));
        }
        if let Some(result) = &outcome.result {
            println!();
            println!("{}", result);
        }
    }

    match (&outcome.selected, outcome.success) {
        (None, _) => bail!("No tool matched the task"),
        (Some(tool), false) => bail!("Tool '{}' did not succeed", tool),
        _ => Ok(()),
    }
}

pub async fn list_tools(config: &ToolgateConfig) -> Result<()> {
    let tools = gateway(config)?.list_tools().await?;

    if tools.is_empty() {
        println!("Gateway exposes no tools.");
        return Ok(());
    }
    for tool in &tools {
        println!("  {}", tool);
    }
    println!("\n{} tool(s)", tools.len());
    Ok(())
}

pub fn show_config(config: &ToolgateConfig) -> Result<()> {
    let mut shown = config.clone();
    if shown.gateway.token.is_some() {
        shown.gateway.token = Some("***".to_string());
    }
    if shown.ai.api_key.is_some() {
        shown.ai.api_key = Some("***".to_string());
    }
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

fn print_plan(plan: &RoutePlan) {
    print_candidates(&plan.candidates);
    if let Some(args) = &plan.arguments {
        println!("Arguments: {}", serde_json::Value::Object(args.clone()));
    }
}

fn print_candidates(candidates: &[SelectionCandidate]) {
    for (idx, c) in candidates.iter().enumerate() {
        let marker = if idx == 0 { "→" } else { " " };
        println!("{} {:<24} {:.3} ({})", marker, c.tool.name, c.score, c.provenance);
    }
}
