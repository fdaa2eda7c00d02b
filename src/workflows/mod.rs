//! Provisioning workflows.
//!
//! This module contains the scenario scripts and the machinery they share:
//! - [`WorkflowKind`] - which scenario to run
//! - [`WorkflowRunner`] - step banners, dry-run handling, result collection
//! - [`parameters`] - request bodies used by more than one workflow
//! - `express_route`, `gateway`, `load_balancer` - the scenarios themselves

pub mod express_route;
pub mod gateway;
pub mod load_balancer;
pub mod parameters;
mod runner;

pub use runner::{RunMode, WorkflowRunner};

use crate::azure::ArmTransport;
use crate::error::WorkflowError;
use crate::models::{Resource, ResourceId, ScenarioData};
use crate::operations::NetworkOperations;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum WorkflowKind {
    ExpressRoute,
    Gateway,
    LoadBalancer,
}

impl WorkflowKind {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowKind::ExpressRoute => express_route::NAME,
            WorkflowKind::Gateway => gateway::NAME,
            WorkflowKind::LoadBalancer => load_balancer::NAME,
        }
    }

    /// Title used in the summary header.
    pub fn title(&self) -> &'static str {
        match self {
            WorkflowKind::ExpressRoute => "Express Route",
            WorkflowKind::Gateway => "VPN Gateway",
            WorkflowKind::LoadBalancer => "Load Balancer",
        }
    }

    /// IDs deleted by a teardown, dependents first.
    pub fn teardown_ids(
        &self,
        subscription_id: &str,
        data: &ScenarioData,
    ) -> Result<Vec<ResourceId>, WorkflowError> {
        let ids = match self {
            WorkflowKind::ExpressRoute => express_route::teardown_ids(subscription_id, data)?,
            WorkflowKind::Gateway => gateway::teardown_ids(subscription_id, data)?,
            WorkflowKind::LoadBalancer => load_balancer::teardown_ids(subscription_id, data)?,
        };
        Ok(ids)
    }
}

/// Run one scenario and return the resources fetched along the way, in step
/// order. `shared_key` overrides the VPN key from the scenario data.
pub async fn run_workflow<T: ArmTransport>(
    kind: WorkflowKind,
    ops: &NetworkOperations<T>,
    data: &ScenarioData,
    mode: RunMode,
    shared_key: Option<&str>,
) -> Result<Vec<Resource>, WorkflowError> {
    log::info!(
        "workflow {} mode={mode:?} group={} location={}",
        kind.name(),
        data.resource_group,
        data.location
    );
    let mut runner = WorkflowRunner::new(ops, mode);
    match kind {
        WorkflowKind::ExpressRoute => express_route::run(&mut runner, data).await?,
        WorkflowKind::Gateway => gateway::run(&mut runner, data, shared_key).await?,
        WorkflowKind::LoadBalancer => load_balancer::run(&mut runner, data).await?,
    }
    log::info!(
        "workflow {} finished, {} resources",
        kind.name(),
        runner.resources().len()
    );
    Ok(runner.into_resources())
}

/// Delete what `kind` creates, leaving the resource group in place.
pub async fn teardown_workflow<T: ArmTransport>(
    kind: WorkflowKind,
    ops: &NetworkOperations<T>,
    data: &ScenarioData,
    mode: RunMode,
) -> Result<(), WorkflowError> {
    let ids = kind.teardown_ids(ops.subscription_id(), data)?;
    log::info!("teardown {} mode={mode:?} resources={}", kind.name(), ids.len());
    WorkflowRunner::new(ops, mode).teardown(&ids).await
}
