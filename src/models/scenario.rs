//! Scenario data: names, prefixes and numbers a workflow provisions with.
//!
//! One JSON file per environment. Sections that a workflow does not use may
//! be left out; asking for a missing section is a [`ConfigError`].

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioData {
    pub subscription_id: String,
    pub location: String,
    pub resource_group: String,
    pub virtual_network: Option<VirtualNetworkData>,
    pub gateway_subnet: Option<SubnetData>,
    pub frontend_subnet: Option<SubnetData>,
    /// Extra workload subnets created after the gateway subnet.
    #[serde(default)]
    pub subnets: Vec<SubnetData>,
    pub gateway_public_ip: Option<String>,
    pub vpn: Option<VpnData>,
    pub express_route: Option<ExpressRouteData>,
    pub load_balancer: Option<LoadBalancerData>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VirtualNetworkData {
    pub name: String,
    pub address_prefixes: Vec<String>,
    #[serde(default)]
    pub dns_servers: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubnetData {
    pub name: String,
    pub address_prefix: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LocalGatewayData {
    pub name: String,
    pub gateway_ip: String,
    pub address_prefixes: Vec<String>,
    pub asn: u64,
    pub bgp_peering_address: String,
}

/// Site-to-site VPN: local gateway, route-based VPN gateway, IPsec connection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VpnData {
    pub local_gateway: LocalGatewayData,
    pub gateway_name: String,
    pub gateway_asn: u64,
    #[serde(default = "default_vpn_sku")]
    pub gateway_sku: String,
    pub connection_name: String,
    /// Usually supplied through `AZURE_VPN_SHARED_KEY` instead.
    #[serde(default, skip_serializing)]
    pub shared_key: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CircuitSkuData {
    pub name: String,
    pub tier: String,
    pub family: String,
}

impl Default for CircuitSkuData {
    fn default() -> Self {
        CircuitSkuData {
            name: "Premium_MeteredData".to_string(),
            tier: "Premium".to_string(),
            family: "MeteredData".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PeeringData {
    #[serde(default = "default_peering_name")]
    pub name: String,
    pub peer_asn: u64,
    pub vlan_id: u32,
    pub primary_peer_prefix: String,
    pub secondary_peer_prefix: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExpressRouteData {
    pub circuit_name: String,
    pub service_provider: String,
    pub peering_location: String,
    pub bandwidth_mbps: u32,
    #[serde(default)]
    pub sku: CircuitSkuData,
    pub peering: PeeringData,
    pub authorization_name: String,
    pub gateway_name: String,
    #[serde(default = "default_er_gateway_sku")]
    pub gateway_sku: String,
    pub connection_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NatRuleData {
    pub name: String,
    pub frontend_port: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoadBalancerData {
    pub name: String,
    pub public_ip_name: String,
    pub frontend_ip_name: String,
    pub backend_pool_name: String,
    pub probe_name: String,
    #[serde(default = "default_http_port")]
    pub probe_port: u16,
    #[serde(default = "default_probe_path")]
    pub probe_path: String,
    pub rule_name: String,
    #[serde(default = "default_http_port")]
    pub rule_frontend_port: u16,
    #[serde(default = "default_http_port")]
    pub rule_backend_port: u16,
    #[serde(default)]
    pub nat_rules: Vec<NatRuleData>,
    pub nat_backend_port: u16,
}

fn default_vpn_sku() -> String {
    "HighPerformance".to_string()
}

fn default_er_gateway_sku() -> String {
    "Standard".to_string()
}

fn default_peering_name() -> String {
    "AzurePrivatePeering".to_string()
}

fn default_http_port() -> u16 {
    80
}

fn default_probe_path() -> String {
    "healthprobe.aspx".to_string()
}

impl ScenarioData {
    /// Read a scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<ScenarioData, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::ScenarioFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::info!("Reading scenario data from {}", path.display());
        ScenarioData::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<ScenarioData, ConfigError> {
        let mut de = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(&mut de).map_err(|e| ConfigError::ScenarioParse {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        })
    }

    pub fn require_virtual_network(
        &self,
        workflow: &'static str,
    ) -> Result<&VirtualNetworkData, ConfigError> {
        self.virtual_network
            .as_ref()
            .ok_or(ConfigError::MissingSection {
                section: "virtual_network",
                workflow,
            })
    }

    pub fn require_gateway_subnet(
        &self,
        workflow: &'static str,
    ) -> Result<&SubnetData, ConfigError> {
        self.gateway_subnet
            .as_ref()
            .ok_or(ConfigError::MissingSection {
                section: "gateway_subnet",
                workflow,
            })
    }

    pub fn require_frontend_subnet(
        &self,
        workflow: &'static str,
    ) -> Result<&SubnetData, ConfigError> {
        self.frontend_subnet
            .as_ref()
            .ok_or(ConfigError::MissingSection {
                section: "frontend_subnet",
                workflow,
            })
    }

    pub fn require_gateway_public_ip(&self, workflow: &'static str) -> Result<&str, ConfigError> {
        self.gateway_public_ip
            .as_deref()
            .ok_or(ConfigError::MissingSection {
                section: "gateway_public_ip",
                workflow,
            })
    }

    pub fn require_vpn(&self, workflow: &'static str) -> Result<&VpnData, ConfigError> {
        self.vpn.as_ref().ok_or(ConfigError::MissingSection {
            section: "vpn",
            workflow,
        })
    }

    pub fn require_express_route(
        &self,
        workflow: &'static str,
    ) -> Result<&ExpressRouteData, ConfigError> {
        self.express_route
            .as_ref()
            .ok_or(ConfigError::MissingSection {
                section: "express_route",
                workflow,
            })
    }

    pub fn require_load_balancer(
        &self,
        workflow: &'static str,
    ) -> Result<&LoadBalancerData, ConfigError> {
        self.load_balancer
            .as_ref()
            .ok_or(ConfigError::MissingSection {
                section: "load_balancer",
                workflow,
            })
    }
}
