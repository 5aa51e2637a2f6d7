//! OVN Central Operator Entry Point
//!
//! Loads the object templates, then starts the Kubernetes controller.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ovn_central_operator::config::Config;
use ovn_central_operator::{controller, ObjectFactory, Scheme, TemplateStore};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }

    info!(
        "Starting OVN Central Operator v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Templates and owner resolution must be sound before anything is built
    let templates = TemplateStore::load(&config.templates_dir).with_context(|| {
        format!(
            "failed to load templates from {}",
            config.templates_dir.display()
        )
    })?;
    let factory = ObjectFactory::new(Arc::new(templates), Scheme::with_ovn_central())
        .context("failed to initialize object factory")?;
    info!("Object templates loaded");

    let client = kube::Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    info!("Connected to Kubernetes cluster");

    let state = Arc::new(controller::ControllerState {
        client,
        factory,
        requeue: config.requeue_interval(),
    });

    controller::run_controller(state, config.namespace.as_deref()).await?;

    Ok(())
}
