//! Step execution shared by all workflows.

use super::parameters::redact;
use crate::azure::ArmTransport;
use crate::error::{ArmError, WorkflowError};
use crate::models::{Resource, ResourceId};
use crate::operations::NetworkOperations;
use colored::Colorize;
use serde::Serialize;

/// Whether mutating calls are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Build and log parameters, only issue GETs.
    DryRun,
    /// Submit create/update and delete calls.
    Apply,
}

/// Runs workflow steps in order and collects what each step fetched.
pub struct WorkflowRunner<'a, T> {
    ops: &'a NetworkOperations<T>,
    mode: RunMode,
    resources: Vec<Resource>,
}

fn step_error(step: &str) -> impl FnOnce(ArmError) -> WorkflowError + '_ {
    move |source| WorkflowError::Step {
        step: step.to_string(),
        source,
    }
}

impl<'a, T: ArmTransport> WorkflowRunner<'a, T> {
    pub fn new(ops: &'a NetworkOperations<T>, mode: RunMode) -> Self {
        WorkflowRunner {
            ops,
            mode,
            resources: vec![],
        }
    }

    pub fn ops(&self) -> &'a NetworkOperations<T> {
        self.ops
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Create or update (when applying), then fetch and keep the result.
    /// In dry-run a resource that does not exist yet is reported and skipped.
    pub async fn provision<P: Serialize>(
        &mut self,
        step: &str,
        id: &ResourceId,
        parameters: &P,
    ) -> Result<Option<Resource>, WorkflowError> {
        banner(step);
        let body = serde_json::to_value(parameters).map_err(|e| WorkflowError::Parameters {
            step: step.to_string(),
            message: e.to_string(),
        })?;

        match self.mode {
            RunMode::DryRun => {
                log::info!("dry-run, not submitted: PUT {id} {}", redact(&body));
            }
            RunMode::Apply => {
                self.ops
                    .create_or_update(id, &body)
                    .await
                    .map_err(step_error(step))?;
            }
        }

        let resource = match self.ops.get(id).await {
            Ok(resource) => resource,
            Err(e) if e.is_not_found() && self.mode == RunMode::DryRun => {
                log::warn!("{} does not exist yet", id.name().yellow());
                return Ok(None);
            }
            Err(e) => return Err(step_error(step)(e)),
        };
        log::debug!(
            "step done: {} state={:?}",
            resource.name().unwrap_or(id.name()),
            resource.provisioning_state()
        );
        self.resources.push(resource.clone());
        Ok(Some(resource))
    }

    /// Make sure the subscription can host `namespace` resources. Only sent
    /// when applying.
    pub async fn register_provider(&self, namespace: &str) -> Result<(), WorkflowError> {
        let step = format!("Registering provider {namespace}...");
        banner(&step);
        match self.mode {
            RunMode::DryRun => {
                log::info!("dry-run, not submitted: POST providers/{namespace}/register");
            }
            RunMode::Apply => {
                self.ops
                    .register_provider(namespace)
                    .await
                    .map_err(step_error(&step))?;
            }
        }
        Ok(())
    }

    /// ID of a fetched dependency. In dry-run a missing dependency falls back
    /// to the ID it would be created with.
    pub async fn lookup_id(&self, step: &str, id: &ResourceId) -> Result<String, WorkflowError> {
        let resource = match self.ops.get(id).await {
            Ok(resource) => resource,
            Err(e) if e.is_not_found() && self.mode == RunMode::DryRun => {
                log::warn!("dependency {} does not exist yet, using {id}", id.name());
                return Ok(id.to_string());
            }
            Err(e) => return Err(step_error(step)(e)),
        };
        let found = resource.require_id().map_err(step_error(step))?;
        Ok(found.to_string())
    }

    /// Delete `ids` in the given order (dependents first).
    pub async fn teardown(&self, ids: &[ResourceId]) -> Result<(), WorkflowError> {
        for id in ids {
            let label = id.kind().map(|k| k.label()).unwrap_or("resource");
            let step = format!("Deleting {label} {}...", id.name());
            banner(&step);
            match self.mode {
                RunMode::DryRun => log::info!("dry-run, not submitted: DELETE {id}"),
                RunMode::Apply => self.ops.delete(id).await.map_err(step_error(&step))?,
            }
        }
        Ok(())
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn into_resources(self) -> Vec<Resource> {
        self.resources
    }
}

fn banner(step: &str) {
    log::info!("{step}");
    println!("{}", step.bold());
}
