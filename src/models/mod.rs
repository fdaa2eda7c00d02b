//! Domain models for the network workflows.
//!
//! This module contains the data structures used throughout the application:
//! - [`ResourceId`] and [`ResourceKind`] - naming and addressing of resources
//! - [`ArmResource`] - the Resource Manager JSON envelope
//! - [`network`] - `properties` payloads per resource kind
//! - [`Resource`] - a decoded resource, one variant per kind
//! - [`ScenarioData`] - the names and prefixes a workflow provisions with

mod arm;
pub mod network;
mod resource;
mod resource_id;
mod scenario;

// Re-export public types
pub use arm::{AddressSpace, ArmResource, BgpSettings, DhcpOptions, Sku, SubResource};
pub use resource::{ProvisioningPhase, Resource};
pub use resource_id::{
    construct_bap_id, construct_fip_id, construct_probe_id, ApiFamily, ResourceId, ResourceKind,
    NETWORK_NAMESPACE, RESOURCES_NAMESPACE,
};
pub use scenario::{
    CircuitSkuData, ExpressRouteData, LoadBalancerData, LocalGatewayData, NatRuleData,
    PeeringData, ScenarioData, SubnetData, VirtualNetworkData, VpnData,
};
