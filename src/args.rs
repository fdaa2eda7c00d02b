//! Command line arguments.

use crate::azure::Cloud;
use crate::config;
use crate::output::SummaryStyle;
use crate::workflows::{RunMode, WorkflowKind};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Provision Azure network scenarios: ExpressRoute, VPN gateway, load balancer.
#[derive(Parser, Debug)]
#[command(name = "azure-network-workflows")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Scenario to run.
    #[arg(value_enum)]
    pub workflow: WorkflowKind,

    /// Scenario data file (JSON).
    #[arg(short, long, default_value = config::DEFAULT_SCENARIO_FILE)]
    pub data: PathBuf,

    /// Submit create/update and delete calls; without it only GETs are sent.
    #[arg(long)]
    pub apply: bool,

    /// Delete the scenario's resources instead of creating them.
    #[arg(long)]
    pub teardown: bool,

    /// How requests reach Resource Manager.
    #[arg(long, value_enum, default_value_t = TransportKind::AzCli)]
    pub transport: TransportKind,

    /// Cloud to target; overrides AZURE_CLOUD.
    #[arg(long, value_enum)]
    pub cloud: Option<Cloud>,

    /// Include nested sub-resources in the summary.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// `az rest` with the current `az login` session.
    AzCli,
    /// HTTPS with a service principal from the environment.
    Rest,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.apply {
            RunMode::Apply
        } else {
            RunMode::DryRun
        }
    }

    pub fn style(&self) -> SummaryStyle {
        if self.verbose {
            SummaryStyle::Verbose
        } else {
            SummaryStyle::Standard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["azure-network-workflows", "gateway"]).unwrap();
        assert_eq!(cli.workflow, WorkflowKind::Gateway);
        assert_eq!(cli.data, PathBuf::from(config::DEFAULT_SCENARIO_FILE));
        assert_eq!(cli.mode(), RunMode::DryRun);
        assert_eq!(cli.transport, TransportKind::AzCli);
        assert_eq!(cli.cloud, None);
        assert_eq!(cli.style(), SummaryStyle::Standard);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "azure-network-workflows",
            "express-route",
            "--data",
            "scenarios/chq_data.json",
            "--apply",
            "--teardown",
            "--transport",
            "rest",
            "--cloud",
            "usgov",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.workflow, WorkflowKind::ExpressRoute);
        assert_eq!(cli.mode(), RunMode::Apply);
        assert!(cli.teardown);
        assert_eq!(cli.transport, TransportKind::Rest);
        assert_eq!(cli.cloud, Some(Cloud::UsGovernment));
        assert_eq!(cli.style(), SummaryStyle::Verbose);
    }

    #[test]
    fn test_unknown_workflow_rejected() {
        assert!(Cli::try_parse_from(["azure-network-workflows", "firewall"]).is_err());
    }
}
