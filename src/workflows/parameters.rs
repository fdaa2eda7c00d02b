//! Request bodies shared by several workflows.

use crate::models::network::{
    ConnectionProperties, GatewayIpConfigurationProperties, PublicIpAddressProperties,
    ResourceGroupProperties, SubnetProperties, VirtualNetworkGatewayProperties,
    VirtualNetworkProperties,
};
use crate::models::{AddressSpace, ArmResource, DhcpOptions, Sku, SubResource, VirtualNetworkData};

pub fn resource_group(location: &str) -> ArmResource<ResourceGroupProperties> {
    ArmResource::located(location, ResourceGroupProperties::default())
}

/// Virtual network body; DNS servers are only sent when `with_dns` is set
/// and the scenario lists some.
pub fn virtual_network(
    location: &str,
    vnet: &VirtualNetworkData,
    with_dns: bool,
) -> ArmResource<VirtualNetworkProperties> {
    let dhcp_options = (with_dns && !vnet.dns_servers.is_empty()).then(|| DhcpOptions {
        dns_servers: vnet.dns_servers.clone(),
    });
    ArmResource::located(
        location,
        VirtualNetworkProperties {
            address_space: Some(AddressSpace::new(&vnet.address_prefixes)),
            dhcp_options,
            ..Default::default()
        },
    )
}

pub fn subnet(address_prefix: &str) -> ArmResource<SubnetProperties> {
    ArmResource::bare(SubnetProperties {
        address_prefix: Some(address_prefix.to_string()),
        ..Default::default()
    })
}

/// `allocation` is `Dynamic` or `Static`.
pub fn public_ip(location: &str, allocation: &str) -> ArmResource<PublicIpAddressProperties> {
    ArmResource::located(
        location,
        PublicIpAddressProperties {
            public_ip_allocation_method: Some(allocation.to_string()),
            ..Default::default()
        },
    )
}

/// Single IP configuration binding a gateway to its subnet and public IP.
pub fn gateway_ip_configuration(
    name: &str,
    subnet_id: &str,
    public_ip_id: &str,
) -> ArmResource<GatewayIpConfigurationProperties> {
    ArmResource::named(
        name,
        GatewayIpConfigurationProperties {
            private_ip_allocation_method: Some("Dynamic".to_string()),
            subnet: Some(SubResource::new(subnet_id)),
            public_ip_address: Some(SubResource::new(public_ip_id)),
            ..Default::default()
        },
    )
}

/// Gateway body without type-specific settings; callers fill those in.
pub fn virtual_network_gateway(
    location: &str,
    gateway_type: &str,
    sku: &str,
    ip_configuration: ArmResource<GatewayIpConfigurationProperties>,
) -> ArmResource<VirtualNetworkGatewayProperties> {
    ArmResource::located(
        location,
        VirtualNetworkGatewayProperties {
            ip_configurations: vec![ip_configuration],
            gateway_type: Some(gateway_type.to_string()),
            sku: Some(Sku::new(sku, sku)),
            ..Default::default()
        },
    )
}

pub fn connection(
    location: &str,
    connection_type: &str,
    gateway_id: &str,
) -> ArmResource<ConnectionProperties> {
    ArmResource::located(
        location,
        ConnectionProperties {
            virtual_network_gateway1: Some(SubResource::new(gateway_id)),
            connection_type: Some(connection_type.to_string()),
            ..Default::default()
        },
    )
}

/// Copy of `value` with every `sharedKey` replaced, for logging.
pub fn redact(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| {
                    if k == "sharedKey" {
                        (k.clone(), serde_json::Value::String("***".to_string()))
                    } else {
                        (k.clone(), redact(v))
                    }
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact).collect())
        }
        other => other.clone(),
    }
}
