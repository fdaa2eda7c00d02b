//! ExpressRoute circuit with private peering, connected to a virtual network
//! through an ExpressRoute gateway.

use super::parameters;
use super::runner::WorkflowRunner;
use crate::azure::ArmTransport;
use crate::error::{ConfigError, WorkflowError};
use crate::models::network::{
    ConnectionProperties, ExpressRouteCircuitAuthorizationProperties,
    ExpressRouteCircuitPeeringProperties, ExpressRouteCircuitProperties,
    ServiceProviderProperties,
};
use crate::models::{
    ArmResource, ExpressRouteData, ResourceId, ResourceKind, ScenarioData, Sku, SubResource,
    NETWORK_NAMESPACE,
};

pub const NAME: &str = "express-route";

/// Gateway IP configuration name.
const GATEWAY_IP_CONFIG: &str = "gwipconf";

pub fn circuit_parameters(
    location: &str,
    er: &ExpressRouteData,
) -> ArmResource<ExpressRouteCircuitProperties> {
    ArmResource::located(
        location,
        ExpressRouteCircuitProperties {
            service_provider_properties: Some(ServiceProviderProperties {
                service_provider_name: Some(er.service_provider.clone()),
                peering_location: Some(er.peering_location.clone()),
                bandwidth_in_mbps: Some(er.bandwidth_mbps),
            }),
            ..Default::default()
        },
    )
    .with_sku(Sku::new(&er.sku.name, &er.sku.tier).with_family(&er.sku.family))
}

pub fn peering_parameters(
    er: &ExpressRouteData,
) -> ArmResource<ExpressRouteCircuitPeeringProperties> {
    ArmResource::bare(ExpressRouteCircuitPeeringProperties {
        peering_type: Some("AzurePrivatePeering".to_string()),
        peer_asn: Some(er.peering.peer_asn),
        primary_peer_address_prefix: Some(er.peering.primary_peer_prefix.clone()),
        secondary_peer_address_prefix: Some(er.peering.secondary_peer_prefix.clone()),
        vlan_id: Some(er.peering.vlan_id),
        ..Default::default()
    })
}

pub fn authorization_parameters() -> ArmResource<ExpressRouteCircuitAuthorizationProperties> {
    ArmResource::bare(ExpressRouteCircuitAuthorizationProperties::default())
}

pub fn connection_parameters(
    location: &str,
    gateway_id: &str,
    circuit_id: &str,
) -> ArmResource<ConnectionProperties> {
    let mut body = parameters::connection(location, "ExpressRoute", gateway_id);
    body.properties.peer = Some(SubResource::new(circuit_id));
    body
}

pub async fn run<T: ArmTransport>(
    runner: &mut WorkflowRunner<'_, T>,
    data: &ScenarioData,
) -> Result<(), WorkflowError> {
    let er = data.require_express_route(NAME)?;
    let vnet = data.require_virtual_network(NAME)?;
    let gw_subnet = data.require_gateway_subnet(NAME)?;
    let fe_subnet = data.require_frontend_subnet(NAME)?;
    let gw_ip = data.require_gateway_public_ip(NAME)?;
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

    let circuit_id = ops.resource_id(ResourceKind::ExpressRouteCircuit, group, &[&er.circuit_name]);
    runner
        .provision(
            "Creating express route circuit...",
            &circuit_id,
            &circuit_parameters(location, er),
        )
        .await?;

    runner
        .provision(
            "Creating express route circuit azure private peering...",
            &ops.resource_id(
                ResourceKind::ExpressRouteCircuitPeering,
                group,
                &[&er.circuit_name, &er.peering.name],
            ),
            &peering_parameters(er),
        )
        .await?;

    runner
        .provision(
            "Creating express route circuit authorization...",
            &ops.resource_id(
                ResourceKind::ExpressRouteCircuitAuthorization,
                group,
                &[&er.circuit_name, &er.authorization_name],
            ),
            &authorization_parameters(),
        )
        .await?;

    runner
        .provision(
            "Creating virtual network...",
            &ops.resource_id(ResourceKind::VirtualNetwork, group, &[&vnet.name]),
            &parameters::virtual_network(location, vnet, false),
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

    runner
        .provision(
            "Creating front end subnet...",
            &ops.resource_id(ResourceKind::Subnet, group, &[&vnet.name, &fe_subnet.name]),
            &parameters::subnet(&fe_subnet.address_prefix),
        )
        .await?;

    let pip_id = ops.resource_id(ResourceKind::PublicIpAddress, group, &[gw_ip]);
    runner
        .provision(
            "Creating Public IP Address...",
            &pip_id,
            &parameters::public_ip(location, "Dynamic"),
        )
        .await?;

    let step = "Creating virtual network gateway...";
    let subnet_ref = runner.lookup_id(step, &gw_subnet_id).await?;
    let pip_ref = runner.lookup_id(step, &pip_id).await?;
    let gateway_id =
        ops.resource_id(ResourceKind::VirtualNetworkGateway, group, &[&er.gateway_name]);
    runner
        .provision(
            step,
            &gateway_id,
            &parameters::virtual_network_gateway(
                location,
                "ExpressRoute",
                &er.gateway_sku,
                parameters::gateway_ip_configuration(GATEWAY_IP_CONFIG, &subnet_ref, &pip_ref),
            ),
        )
        .await?;

    let step = "Creating virtual network gateway connection...";
    let gateway_ref = runner.lookup_id(step, &gateway_id).await?;
    let circuit_ref = runner.lookup_id(step, &circuit_id).await?;
    runner
        .provision(
            step,
            &ops.resource_id(
                ResourceKind::VirtualNetworkGatewayConnection,
                group,
                &[&er.connection_name],
            ),
            &connection_parameters(location, &gateway_ref, &circuit_ref),
        )
        .await?;

    Ok(())
}

/// Resources of this workflow, dependents first. The resource group is kept.
pub fn teardown_ids(
    subscription_id: &str,
    data: &ScenarioData,
) -> Result<Vec<ResourceId>, ConfigError> {
    let er = data.require_express_route(NAME)?;
    let vnet = data.require_virtual_network(NAME)?;
    let gw_subnet = data.require_gateway_subnet(NAME)?;
    let fe_subnet = data.require_frontend_subnet(NAME)?;
    let gw_ip = data.require_gateway_public_ip(NAME)?;
    let id = |kind, names: &[&str]| {
        ResourceId::for_kind(kind, subscription_id, &data.resource_group, names)
    };

    Ok(vec![
        id(ResourceKind::VirtualNetworkGatewayConnection, &[&er.connection_name]),
        id(ResourceKind::VirtualNetworkGateway, &[&er.gateway_name]),
        id(ResourceKind::PublicIpAddress, &[gw_ip]),
        id(ResourceKind::Subnet, &[&vnet.name, &fe_subnet.name]),
        id(ResourceKind::Subnet, &[&vnet.name, &gw_subnet.name]),
        id(ResourceKind::VirtualNetwork, &[&vnet.name]),
        id(
            ResourceKind::ExpressRouteCircuitAuthorization,
            &[&er.circuit_name, &er.authorization_name],
        ),
        id(
            ResourceKind::ExpressRouteCircuitPeering,
            &[&er.circuit_name, &er.peering.name],
        ),
        id(ResourceKind::ExpressRouteCircuit, &[&er.circuit_name]),
    ])
}
