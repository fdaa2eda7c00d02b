//! Route-based VPN gateway with BGP and a site-to-site IPsec connection to a
//! local network gateway.

use super::parameters;
use super::runner::{RunMode, WorkflowRunner};
use crate::azure::ArmTransport;
use crate::error::{ConfigError, WorkflowError};
use crate::models::network::{ConnectionProperties, LocalNetworkGatewayProperties};
use crate::models::{
    AddressSpace, ArmResource, BgpSettings, LocalGatewayData, ResourceId, ResourceKind,
    ScenarioData, SubResource, VpnData, NETWORK_NAMESPACE,
};

pub const NAME: &str = "gateway";

const GATEWAY_IP_CONFIG: &str = "Default";

/// Sent in dry-run when no key is configured; never reaches Azure.
const PLACEHOLDER_SHARED_KEY: &str = "<shared-key>";

pub fn local_gateway_parameters(
    location: &str,
    local: &LocalGatewayData,
) -> ArmResource<LocalNetworkGatewayProperties> {
    ArmResource::located(
        location,
        LocalNetworkGatewayProperties {
            gateway_ip_address: Some(local.gateway_ip.clone()),
            local_network_address_space: Some(AddressSpace::new(&local.address_prefixes)),
            bgp_settings: Some(BgpSettings {
                asn: Some(local.asn),
                bgp_peering_address: Some(local.bgp_peering_address.clone()),
                peer_weight: None,
            }),
            ..Default::default()
        },
    )
}

pub fn ipsec_connection_parameters(
    location: &str,
    gateway_id: &str,
    local_gateway_id: &str,
    shared_key: &str,
) -> ArmResource<ConnectionProperties> {
    let mut body = parameters::connection(location, "IPsec", gateway_id);
    body.properties.local_network_gateway2 = Some(SubResource::new(local_gateway_id));
    body.properties.shared_key = Some(shared_key.to_string());
    body.properties.enable_bgp = Some(true);
    body
}

/// Shared key to use: the override first, then the scenario file. Applying
/// without either is an error.
pub fn resolve_shared_key<'k>(
    vpn: &'k VpnData,
    override_key: Option<&'k str>,
    mode: RunMode,
) -> Result<&'k str, ConfigError> {
    match override_key.or(vpn.shared_key.as_deref()) {
        Some(key) => Ok(key),
        None if mode == RunMode::DryRun => Ok(PLACEHOLDER_SHARED_KEY),
        None => Err(ConfigError::MissingEnvVar {
            name: crate::config::ENV_VPN_SHARED_KEY.to_string(),
        }),
    }
}

pub async fn run<T: ArmTransport>(
    runner: &mut WorkflowRunner<'_, T>,
    data: &ScenarioData,
    shared_key: Option<&str>,
) -> Result<(), WorkflowError> {
    let vpn = data.require_vpn(NAME)?;
    let vnet = data.require_virtual_network(NAME)?;
    let gw_subnet = data.require_gateway_subnet(NAME)?;
    let gw_ip = data.require_gateway_public_ip(NAME)?;
    let shared_key = resolve_shared_key(vpn, shared_key, runner.mode())?;
    let ops = runner.ops();
    let group = data.resource_group.as_str();
    let location = data.location.as_str();

    runner.register_provider(NETWORK_NAMESPACE).await?;

    runner
        .provision(
            "Creating resource group...",
            &ops.resource_id(ResourceKind::ResourceGroup, group, &[]),
            &parameters::resource_group(location),
        )
        .await?;

    runner
        .provision(
            "Creating virtual network...",
            &ops.resource_id(ResourceKind::VirtualNetwork, group, &[&vnet.name]),
            &parameters::virtual_network(location, vnet, true),
        )
        .await?;

    let gw_subnet_id = ops.resource_id(ResourceKind::Subnet, group, &[&vnet.name, &gw_subnet.name]);
    runner
        .provision(
            "Creating gateway subnet...",
            &gw_subnet_id,
            &parameters::subnet(&gw_subnet.address_prefix),
        )
        .await?;

    for subnet in &data.subnets {
        runner
            .provision(
                &format!("Creating subnet {}...", subnet.name),
                &ops.resource_id(ResourceKind::Subnet, group, &[&vnet.name, &subnet.name]),
                &parameters::subnet(&subnet.address_prefix),
            )
            .await?;
    }

    let pip_id = ops.resource_id(ResourceKind::PublicIpAddress, group, &[gw_ip]);
    runner
        .provision(
            "Creating Public IP Address...",
            &pip_id,
            &parameters::public_ip(location, "Dynamic"),
        )
        .await?;

    let local_id = ops.resource_id(
        ResourceKind::LocalNetworkGateway,
        group,
        &[&vpn.local_gateway.name],
    );
    runner
        .provision(
            "Creating local network gateway...",
            &local_id,
            &local_gateway_parameters(location, &vpn.local_gateway),
        )
        .await?;

    let step = "Creating virtual network gateway...";
    let subnet_ref = runner.lookup_id(step, &gw_subnet_id).await?;
    let pip_ref = runner.lookup_id(step, &pip_id).await?;
    let gateway_id =
        ops.resource_id(ResourceKind::VirtualNetworkGateway, group, &[&vpn.gateway_name]);
    let mut gateway = parameters::virtual_network_gateway(
        location,
        "Vpn",
        &vpn.gateway_sku,
        parameters::gateway_ip_configuration(GATEWAY_IP_CONFIG, &subnet_ref, &pip_ref),
    );
    gateway.properties.vpn_type = Some("RouteBased".to_string());
    gateway.properties.enable_bgp = Some(true);
    gateway.properties.bgp_settings = Some(BgpSettings {
        asn: Some(vpn.gateway_asn),
        ..Default::default()
    });
    runner.provision(step, &gateway_id, &gateway).await?;

    let step = "Creating virtual network gateway connection...";
    let gateway_ref = runner.lookup_id(step, &gateway_id).await?;
    let local_ref = runner.lookup_id(step, &local_id).await?;
    runner
        .provision(
            step,
            &ops.resource_id(
                ResourceKind::VirtualNetworkGatewayConnection,
                group,
                &[&vpn.connection_name],
            ),
            &ipsec_connection_parameters(location, &gateway_ref, &local_ref, shared_key),
        )
        .await?;

    Ok(())
}

/// Resources of this workflow, dependents first. The resource group is kept.
pub fn teardown_ids(
    subscription_id: &str,
    data: &ScenarioData,
) -> Result<Vec<ResourceId>, ConfigError> {
    let vpn = data.require_vpn(NAME)?;
    let vnet = data.require_virtual_network(NAME)?;
    let gw_subnet = data.require_gateway_subnet(NAME)?;
    let gw_ip = data.require_gateway_public_ip(NAME)?;
    let id = |kind, names: &[&str]| {
        ResourceId::for_kind(kind, subscription_id, &data.resource_group, names)
    };

    let mut ids = vec![
        id(ResourceKind::VirtualNetworkGatewayConnection, &[&vpn.connection_name]),
        id(ResourceKind::VirtualNetworkGateway, &[&vpn.gateway_name]),
        id(ResourceKind::LocalNetworkGateway, &[&vpn.local_gateway.name]),
        id(ResourceKind::PublicIpAddress, &[gw_ip]),
    ];
    ids.extend(
        data.subnets
            .iter()
            .rev()
            .map(|s| id(ResourceKind::Subnet, &[&vnet.name, &s.name])),
    );
    ids.push(id(ResourceKind::Subnet, &[&vnet.name, &gw_subnet.name]));
    ids.push(id(ResourceKind::VirtualNetwork, &[&vnet.name]));
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> ScenarioData {
        ScenarioData::load("src/tests/test_data/scenario_test_data_01.json").unwrap()
    }

    #[test]
    fn test_local_gateway_parameters() {
        let data = data();
        let vpn = data.vpn.as_ref().unwrap();
        let body = local_gateway_parameters(&data.location, &vpn.local_gateway);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "location": "usgovvirginia",
                "properties": {
                    "gatewayIpAddress": "203.0.113.10",
                    "localNetworkAddressSpace": {"addressPrefixes": ["192.168.0.0/16"]},
                    "bgpSettings": {"asn": 65050, "bgpPeeringAddress": "192.168.255.1"}
                }
            })
        );
    }

    #[test]
    fn test_ipsec_connection_parameters() {
        let body =
            serde_json::to_value(ipsec_connection_parameters("loc", "/gw", "/lgw", "k")).unwrap();
        assert_eq!(body["properties"]["connectionType"], "IPsec");
        assert_eq!(body["properties"]["localNetworkGateway2"]["id"], "/lgw");
        assert_eq!(body["properties"]["sharedKey"], "k");
        assert_eq!(body["properties"]["enableBgp"], true);
    }

    #[test]
    fn test_resolve_shared_key() {
        let data = data();
        let vpn = data.vpn.as_ref().unwrap();
        assert_eq!(resolve_shared_key(vpn, None, RunMode::Apply).unwrap(), "test-shared-key");
        assert_eq!(resolve_shared_key(vpn, Some("env"), RunMode::Apply).unwrap(), "env");

        let mut keyless = vpn.clone();
        keyless.shared_key = None;
        assert_eq!(
            resolve_shared_key(&keyless, None, RunMode::DryRun).unwrap(),
            PLACEHOLDER_SHARED_KEY
        );
        let err = resolve_shared_key(&keyless, None, RunMode::Apply).unwrap_err();
        assert!(err.to_string().contains("AZURE_VPN_SHARED_KEY"));
    }

    #[test]
    fn test_teardown_ids_cover_extra_subnets() {
        let ids = teardown_ids("sub", &data()).unwrap();
        let subnets = ids
            .iter()
            .filter(|i| i.kind() == Some(ResourceKind::Subnet))
            .count();
        assert_eq!(subnets, 4);
        assert_eq!(ids.last().unwrap().kind(), Some(ResourceKind::VirtualNetwork));
    }
}
