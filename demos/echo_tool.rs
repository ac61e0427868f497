//! Example: running tools through the orchestrator
//!
//! Registers two tools with the `#[tool]` macro, then executes them through an
//! `Orchestrator` configured from the environment. A flaky tool shows the
//! retry budget at work.
//!
//! # Configuration
//!
//! Optionally create a `.env` file in the project root with:
//! ```
//! TOOL_ORCHESTRATOR_TIMEOUT_MS=5000
//! TOOL_ORCHESTRATOR_RETRY=0
//! RUST_LOG=debug
//! ```
//!
//! # Running
//!
//! ```bash
//! cargo run --example echo_tool
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tool_orchestrator::{
    register_tools, tool, ExecutionOptions, FunctionRegistry, Orchestrator, OrchestratorConfig,
};
use tracing_subscriber::EnvFilter;

static FLAKY_CALLS: AtomicUsize = AtomicUsize::new(0);

#[derive(Deserialize, JsonSchema)]
pub struct EchoArgs {
    /// Text to send back
    message: String,
}

#[derive(Serialize)]
pub struct EchoResult {
    echoed: String,
}

#[tool(description = "Echo a message back")]
fn echo(args: EchoArgs) -> Result<EchoResult, String> {
    Ok(EchoResult {
        echoed: args.message,
    })
}

#[tool(description = "Fails on its first two calls")]
async fn flaky(args: EchoArgs) -> Result<EchoResult, String> {
    let call = FLAKY_CALLS.fetch_add(1, Ordering::SeqCst) + 1;
    if call <= 2 {
        return Err(format!("transient failure on call {}", call));
    }
    Ok(EchoResult {
        echoed: args.message,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = OrchestratorConfig::from_env()?;
    println!("Configuration: {:?}\n", config);

    let mut registry = FunctionRegistry::new();
    register_tools!(registry, echo_tool, flaky_tool);

    let orchestrator = Orchestrator::new(Box::new(registry)).with_config(config);

    // 1. A plain call
    let result = orchestrator
        .execute(&echo_tool::spec()?, &json!({"message": "hi"}), None)
        .await?;
    println!("echo -> {}", result);

    // 2. Bad input is rejected before anything runs
    match orchestrator
        .execute(&echo_tool::spec()?, &json!("not-a-map"), None)
        .await
    {
        Ok(value) => println!("unexpected success: {}", value),
        Err(err) => println!("echo (bad input) -> [{}] {}", err.kind(), err),
    }

    // 3. Retries absorb transient failures
    let options = ExecutionOptions::new()
        .with_retry(2)
        .with_context_entry("request_id", "demo-1");
    let result = orchestrator
        .execute(&flaky_tool::spec()?, &json!({"message": "eventually"}), Some(options))
        .await?;
    println!("flaky (retry=2) -> {}", result);

    // 4. Without retries the failure is classified
    FLAKY_CALLS.store(0, Ordering::SeqCst);
    match orchestrator
        .execute(&flaky_tool::spec()?, &json!({"message": "never"}), None)
        .await
    {
        Ok(value) => println!("unexpected success: {}", value),
        Err(err) => println!(
            "flaky (retry=0) -> [{}] {}",
            err.kind(),
            serde_json::to_string(&err)?
        ),
    }

    Ok(())
}
