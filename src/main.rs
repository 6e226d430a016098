use std::sync::Arc;

use anyhow::Context;
use commerce_orchestrator::agent::{AgentRole, Orchestrator, SubAgent, MAIN_AGENT_NAME};
use commerce_orchestrator::cli::{Console, Repl, ReplExit};
use commerce_orchestrator::config::AppConfig;
use commerce_orchestrator::core::TokenStore;
use commerce_orchestrator::llm::{AnthropicProvider, AuthConfig, LlmProvider};
use commerce_orchestrator::logging;
use commerce_orchestrator::mcp::{GatewayConfig, ToolGateway};
use commerce_orchestrator::session::{SessionManager, SlidingWindow};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    // Keep the guard alive until exit so the file writer flushes
    let _log_guard = logging::init_logging(&config.log)?;

    tracing::info!("=== Commerce Orchestrator Starting ===");
    config.log_banner();

    let tokens = TokenStore::new();
    if let Some(token) = &config.auth_token {
        tokens.set_token(token.clone());
    }

    let auth = match &config.llm_base_url {
        Some(url) => AuthConfig::with_base_url(config.llm_api_key.clone(), url.clone()),
        None => AuthConfig::new(config.llm_api_key.clone()),
    };
    let llm: Arc<dyn LlmProvider> = Arc::new(
        AnthropicProvider::new(auth, config.model_id.clone(), config.llm_timeout)?
            .with_region(config.region.clone()),
    );

    let order = sub_agent(
        &config,
        AgentRole::order(),
        GatewayConfig::new("order", config.order_mcp_url.clone()),
        llm.clone(),
    );
    let inventory = sub_agent(
        &config,
        AgentRole::inventory(),
        GatewayConfig::new("inventory", config.inventory_mcp_url.clone()),
        llm.clone(),
    );

    let sessions =
        SessionManager::new(config.session_dir.clone(), MAIN_AGENT_NAME).with_model(config.model_id.clone());
    let session = sessions.create_or_load(&config.session_id)?;
    tracing::info!(
        "Session {} ready with {} messages",
        session.session_id(),
        session.history().len()
    );

    let cancel = CancellationToken::new();
    let orchestrator = Orchestrator::new(
        llm,
        order,
        inventory,
        session,
        SlidingWindow::new(config.window_size),
    )
    .with_limits(config.orchestrator_limits())
    .with_cancel(cancel.clone());

    tracing::info!("Registered tools: {:?}", orchestrator.tool_names());

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received");
            interrupt.cancel();
        }
    });

    let mut repl = Repl::new(
        Console::new(),
        orchestrator,
        sessions,
        config.session_id.clone(),
        tokens,
        cancel,
    );
    let exit = repl.run().await?;

    tracing::info!("=== Commerce Orchestrator Stopped ({:?}) ===", exit);

    // A blocked stdin read would otherwise hold runtime shutdown
    if exit == ReplExit::Interrupted {
        drop(_log_guard);
        std::process::exit(0);
    }

    Ok(())
}

fn sub_agent(
    config: &AppConfig,
    role: AgentRole,
    gateway: GatewayConfig,
    llm: Arc<dyn LlmProvider>,
) -> SubAgent {
    let gateway = ToolGateway::rmcp(gateway.with_timeout(config.tool_timeout));
    SubAgent::new(role.with_max_tool_calls(config.max_tool_calls), llm, gateway)
        .with_limits(config.sub_agent_limits())
        .with_invocation_timeout(config.subagent_timeout)
}
