//! Azure network provisioning workflows.
//!
//! Builds Resource Manager request bodies for a handful of network scenarios,
//! submits them through a pluggable transport and prints what came back.

pub mod args;
pub mod azure;
pub mod config;
pub mod error;
pub mod models;
pub mod operations;
pub mod output;
pub mod workflows;

use azure::ArmTransport;
use config::Settings;
use error::WorkflowError;
use models::{Resource, ScenarioData};
use operations::NetworkOperations;
use workflows::{RunMode, WorkflowKind};

/// What to do with the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub workflow: WorkflowKind,
    pub mode: RunMode,
    pub teardown: bool,
}

/// Subscription to work in: the environment wins over the scenario file.
pub fn subscription_for<'a>(settings: &'a Settings, data: &'a ScenarioData) -> &'a str {
    settings
        .subscription_id
        .as_deref()
        .unwrap_or(&data.subscription_id)
}

/// Read and check the scenario data file.
pub fn load_scenario(path: &std::path::Path) -> Result<ScenarioData, Box<dyn std::error::Error>> {
    let data = ScenarioData::load(path)?;
    if data.resource_group.trim().is_empty() {
        return Err(format!("{}: resource_group is empty", path.display()).into());
    }
    log::info!(
        "#Loaded scenario {} group={} location={}",
        path.display(),
        data.resource_group,
        data.location
    );
    Ok(data)
}

/// Run or tear down one workflow. Returns the resources fetched by a run,
/// empty for a teardown.
pub async fn execute<T: ArmTransport>(
    transport: T,
    settings: &Settings,
    data: &ScenarioData,
    options: RunOptions,
) -> Result<Vec<Resource>, WorkflowError> {
    let started = chrono::Utc::now();
    let ops = NetworkOperations::new(subscription_for(settings, data), transport, settings);
    log::info!(
        "#Start {} at {} subscription={}",
        options.workflow.name(),
        started.to_rfc3339(),
        ops.subscription_id()
    );

    let resources = if options.teardown {
        workflows::teardown_workflow(options.workflow, &ops, data, options.mode).await?;
        vec![]
    } else {
        workflows::run_workflow(
            options.workflow,
            &ops,
            data,
            options.mode,
            settings.vpn_shared_key.as_deref(),
        )
        .await?
    };

    let elapsed = chrono::Utc::now() - started;
    log::info!(
        "#End {} after {}s",
        options.workflow.name(),
        elapsed.num_seconds()
    );
    Ok(resources)
}
