// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Construction of the `Store`/`Broker`/`DomainSource`/`Workflow` stack
//! from `Config`, shared by both binaries so the API process and the
//! worker process never drift on how they wire up their dependencies.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use ticketflow_broker::AmqpBroker;
use ticketflow_core::{Broker, Config, DomainSource, Store};
use ticketflow_store::{PgDomainSource, PgStore};
use ticketflow_workflow::{
    AgentGraph, LegacyPipeline, NullBugTracker, NullLlmClient, ToolRegistry, Workflow,
};

/// Everything a binary needs to run: the shared dependency stack plus the
/// `Config` it was built from.
pub struct Runtime {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub broker: Arc<dyn Broker>,
    pub domain: Arc<dyn DomainSource>,
    pub tools: Arc<ToolRegistry>,
    pub workflow: Arc<dyn Workflow>,
}

/// Install the global `tracing` subscriber. Honors `RUST_LOG`, defaults to
/// `info`.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}

/// Load `Config` and connect every real backend it names. The LLM and bug
/// tracker integrations are out of scope (see the module docs on
/// `ticketflow_workflow::llm` and `ticketflow_workflow::tools`), so
/// `NullLlmClient`/`NullBugTracker` stand in for them here.
pub async fn build() -> Result<Runtime> {
    let config = Config::from_env();

    let store = PgStore::connect(&config.database_url)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("running database migrations")?;
    let domain = PgDomainSource::new(store.pool());
    let store: Arc<dyn Store> = Arc::new(store);
    let domain: Arc<dyn DomainSource> = Arc::new(domain);

    let broker = AmqpBroker::connect(
        &config.amqp_url,
        &config.queue_name,
        &config.dlx_name,
        config.prefetch_count,
    )
    .await
    .context("connecting to amqp broker")?;
    let broker: Arc<dyn Broker> = Arc::new(broker);

    let tools = Arc::new(ToolRegistry::canonical(Arc::new(NullBugTracker)));
    let llm = Arc::new(NullLlmClient);

    let workflow: Arc<dyn Workflow> = if config.use_agent_workflow {
        Arc::new(AgentGraph::new(
            llm,
            tools.clone(),
            domain.clone(),
            config.llm_timeout,
            config.llm_max_retries,
        ))
    } else {
        Arc::new(LegacyPipeline::new(llm, config.llm_timeout, config.llm_max_retries))
    };

    Ok(Runtime {
        config,
        store,
        broker,
        domain,
        tools,
        workflow,
    })
}
