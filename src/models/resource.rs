//! Decoded resources, one variant per kind.

use super::arm::ArmResource;
use super::network::*;
use super::resource_id::ResourceKind;
use crate::error::{ArmError, ArmResult};
use serde::de::DeserializeOwned;

/// A resource returned by Resource Manager.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    ResourceGroup(ArmResource<ResourceGroupProperties>),
    VirtualNetwork(ArmResource<VirtualNetworkProperties>),
    Subnet(ArmResource<SubnetProperties>),
    PublicIpAddress(ArmResource<PublicIpAddressProperties>),
    LocalNetworkGateway(ArmResource<LocalNetworkGatewayProperties>),
    VirtualNetworkGateway(ArmResource<VirtualNetworkGatewayProperties>),
    Connection(ArmResource<ConnectionProperties>),
    ExpressRouteCircuit(ArmResource<ExpressRouteCircuitProperties>),
    ExpressRouteCircuitPeering(ArmResource<ExpressRouteCircuitPeeringProperties>),
    ExpressRouteCircuitAuthorization(ArmResource<ExpressRouteCircuitAuthorizationProperties>),
    LoadBalancer(ArmResource<LoadBalancerProperties>),
    /// Any other kind; `kind` is `None` when the type is not one we manage.
    Other {
        kind: Option<ResourceKind>,
        resource: ArmResource<GenericProperties>,
    },
}

fn decode<P: DeserializeOwned + Default>(value: serde_json::Value) -> ArmResult<ArmResource<P>> {
    serde_path_to_error::deserialize(value).map_err(|e| ArmError::Decode {
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}

impl Resource {
    /// Decode a response body. `expected` is used when the body carries no
    /// `type` (some child resources are returned without one).
    pub fn from_value(
        value: serde_json::Value,
        expected: Option<ResourceKind>,
    ) -> ArmResult<Resource> {
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .and_then(ResourceKind::from_arm_type)
            .or(expected);

        use ResourceKind as K;
        let resource = match kind {
            Some(K::ResourceGroup) => Resource::ResourceGroup(decode(value)?),
            Some(K::VirtualNetwork) => Resource::VirtualNetwork(decode(value)?),
            Some(K::Subnet) => Resource::Subnet(decode(value)?),
            Some(K::PublicIpAddress) => Resource::PublicIpAddress(decode(value)?),
            Some(K::LocalNetworkGateway) => Resource::LocalNetworkGateway(decode(value)?),
            Some(K::VirtualNetworkGateway) => Resource::VirtualNetworkGateway(decode(value)?),
            Some(K::VirtualNetworkGatewayConnection) => Resource::Connection(decode(value)?),
            Some(K::ExpressRouteCircuit) => Resource::ExpressRouteCircuit(decode(value)?),
            Some(K::ExpressRouteCircuitPeering) => {
                Resource::ExpressRouteCircuitPeering(decode(value)?)
            }
            Some(K::ExpressRouteCircuitAuthorization) => {
                Resource::ExpressRouteCircuitAuthorization(decode(value)?)
            }
            Some(K::LoadBalancer) => Resource::LoadBalancer(decode(value)?),
            other => Resource::Other {
                kind: other,
                resource: decode(value)?,
            },
        };
        Ok(resource)
    }

    pub fn kind(&self) -> Option<ResourceKind> {
        use ResourceKind as K;
        match self {
            Resource::ResourceGroup(_) => Some(K::ResourceGroup),
            Resource::VirtualNetwork(_) => Some(K::VirtualNetwork),
            Resource::Subnet(_) => Some(K::Subnet),
            Resource::PublicIpAddress(_) => Some(K::PublicIpAddress),
            Resource::LocalNetworkGateway(_) => Some(K::LocalNetworkGateway),
            Resource::VirtualNetworkGateway(_) => Some(K::VirtualNetworkGateway),
            Resource::Connection(_) => Some(K::VirtualNetworkGatewayConnection),
            Resource::ExpressRouteCircuit(_) => Some(K::ExpressRouteCircuit),
            Resource::ExpressRouteCircuitPeering(_) => Some(K::ExpressRouteCircuitPeering),
            Resource::ExpressRouteCircuitAuthorization(_) => {
                Some(K::ExpressRouteCircuitAuthorization)
            }
            Resource::LoadBalancer(_) => Some(K::LoadBalancer),
            Resource::Other { kind, .. } => *kind,
        }
    }

    fn header(&self) -> (&Option<String>, &Option<String>, &Option<String>) {
        macro_rules! h {
            ($r:expr) => {
                (&$r.name, &$r.id, &$r.location)
            };
        }
        match self {
            Resource::ResourceGroup(r) => h!(r),
            Resource::VirtualNetwork(r) => h!(r),
            Resource::Subnet(r) => h!(r),
            Resource::PublicIpAddress(r) => h!(r),
            Resource::LocalNetworkGateway(r) => h!(r),
            Resource::VirtualNetworkGateway(r) => h!(r),
            Resource::Connection(r) => h!(r),
            Resource::ExpressRouteCircuit(r) => h!(r),
            Resource::ExpressRouteCircuitPeering(r) => h!(r),
            Resource::ExpressRouteCircuitAuthorization(r) => h!(r),
            Resource::LoadBalancer(r) => h!(r),
            Resource::Other { resource, .. } => h!(resource),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.header().0.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.header().1.as_deref()
    }

    /// Location; child resources (subnets, peerings) have none.
    pub fn location(&self) -> Option<&str> {
        self.header().2.as_deref()
    }

    /// The ID, or an error when ARM returned none (needed for references).
    pub fn require_id(&self) -> ArmResult<&str> {
        self.id().ok_or_else(|| ArmError::Decode {
            path: "id".to_string(),
            message: format!("{} has no id", self.name().unwrap_or("resource")),
        })
    }

    pub fn provisioning_state(&self) -> Option<&str> {
        let state = match self {
            Resource::ResourceGroup(r) => &r.properties.provisioning_state,
            Resource::VirtualNetwork(r) => &r.properties.provisioning_state,
            Resource::Subnet(r) => &r.properties.provisioning_state,
            Resource::PublicIpAddress(r) => &r.properties.provisioning_state,
            Resource::LocalNetworkGateway(r) => &r.properties.provisioning_state,
            Resource::VirtualNetworkGateway(r) => &r.properties.provisioning_state,
            Resource::Connection(r) => &r.properties.provisioning_state,
            Resource::ExpressRouteCircuit(r) => &r.properties.provisioning_state,
            Resource::ExpressRouteCircuitPeering(r) => &r.properties.provisioning_state,
            Resource::ExpressRouteCircuitAuthorization(r) => &r.properties.provisioning_state,
            Resource::LoadBalancer(r) => &r.properties.provisioning_state,
            Resource::Other { resource, .. } => &resource.properties.provisioning_state,
        };
        state.as_deref()
    }
}

/// Where a long-running operation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningPhase {
    Succeeded,
    Failed,
    InProgress,
}

impl ProvisioningPhase {
    /// Classify a provisioning state string. A missing state counts as done,
    /// since some kinds never report one.
    pub fn of(state: Option<&str>) -> ProvisioningPhase {
        match state {
            None => ProvisioningPhase::Succeeded,
            Some(s) if s.eq_ignore_ascii_case("Succeeded") => ProvisioningPhase::Succeeded,
            Some(s) if s.eq_ignore_ascii_case("Failed") || s.eq_ignore_ascii_case("Canceled") => {
                ProvisioningPhase::Failed
            }
            Some(_) => ProvisioningPhase::InProgress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_virtual_network() {
        let raw = json!({
            "name": "pgm-vnet",
            "id": concat!(
                "/subscriptions/s/resourceGroups/rg",
                "/providers/Microsoft.Network/virtualNetworks/pgm-vnet"
            ),
            "type": "Microsoft.Network/virtualNetworks",
            "location": "usgovvirginia",
            "properties": {
                "provisioningState": "Succeeded",
                "addressSpace": {"addressPrefixes": ["10.70.0.0/16"]},
                "dhcpOptions": {"dnsServers": ["10.1.1.4"]},
                "subnets": [
                    {"name": "GatewaySubnet", "properties": {"addressPrefix": "10.70.255.0/27"}}
                ]
            }
        });
        let res = Resource::from_value(raw, None).unwrap();
        assert_eq!(res.kind(), Some(ResourceKind::VirtualNetwork));
        assert_eq!(res.name(), Some("pgm-vnet"));
        assert_eq!(res.provisioning_state(), Some("Succeeded"));
        match res {
            Resource::VirtualNetwork(v) => {
                assert_eq!(v.properties.subnets.len(), 1);
                assert_eq!(
                    v.properties.address_space.unwrap().address_prefixes,
                    vec!["10.70.0.0/16"]
                );
            }
            other => panic!("wrong variant {other:?}"),
        }
    }

    #[test]
    fn test_expected_kind_used_without_type() {
        let raw = json!({"name": "auth1", "properties": {"authorizationUseStatus": "Available"}});
        let kind = ResourceKind::ExpressRouteCircuitAuthorization;
        let res = Resource::from_value(raw, Some(kind)).unwrap();
        assert!(matches!(res, Resource::ExpressRouteCircuitAuthorization(_)));
        assert_eq!(res.location(), None);
        assert!(res.require_id().is_err());
    }

    #[test]
    fn test_unknown_type_is_other() {
        let raw = json!({
            "name": "vm1",
            "type": "Microsoft.Compute/virtualMachines",
            "properties": {"provisioningState": "Succeeded", "hardwareProfile": {}}
        });
        let res = Resource::from_value(raw, None).unwrap();
        assert_eq!(res.kind(), None);
        assert_eq!(res.provisioning_state(), Some("Succeeded"));
    }

    #[test]
    fn test_decode_error_reports_path() {
        let raw = json!({
            "type": "Microsoft.Network/expressRouteCircuits/peerings",
            "properties": {"vlanId": "not-a-number"}
        });
        match Resource::from_value(raw, None).unwrap_err() {
            ArmError::Decode { path, .. } => assert_eq!(path, "properties.vlanId"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_provisioning_phase() {
        assert_eq!(ProvisioningPhase::of(Some("Succeeded")), ProvisioningPhase::Succeeded);
        assert_eq!(ProvisioningPhase::of(Some("Updating")), ProvisioningPhase::InProgress);
        assert_eq!(ProvisioningPhase::of(Some("Canceled")), ProvisioningPhase::Failed);
        assert_eq!(ProvisioningPhase::of(None), ProvisioningPhase::Succeeded);
    }
}
