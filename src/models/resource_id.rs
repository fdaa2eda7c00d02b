//! Resource kinds and fully-qualified resource IDs.
//!
//! A resource ID looks like
//! `/subscriptions/{sub}/resourceGroups/{group}/providers/{namespace}/{type}/{name}`,
//! optionally followed by `/{child type}/{child name}` pairs.
//! A resource group ID stops after the group name.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

pub const NETWORK_NAMESPACE: &str = "Microsoft.Network";
pub const RESOURCES_NAMESPACE: &str = "Microsoft.Resources";

/// Which API version family a kind is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFamily {
    Network,
    Resources,
}

/// Every resource kind the operations layer can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ResourceGroup,
    VirtualNetwork,
    Subnet,
    VirtualNetworkPeering,
    RouteTable,
    Route,
    RouteFilter,
    RouteFilterRule,
    PublicIpAddress,
    NetworkInterface,
    NetworkSecurityGroup,
    SecurityRule,
    LocalNetworkGateway,
    VirtualNetworkGateway,
    VirtualNetworkGatewayConnection,
    ExpressRouteCircuit,
    ExpressRouteCircuitAuthorization,
    ExpressRouteCircuitPeering,
    LoadBalancer,
    ApplicationGateway,
    NetworkWatcher,
    PacketCapture,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 22] = [
        ResourceKind::ResourceGroup,
        ResourceKind::VirtualNetwork,
        ResourceKind::Subnet,
        ResourceKind::VirtualNetworkPeering,
        ResourceKind::RouteTable,
        ResourceKind::Route,
        ResourceKind::RouteFilter,
        ResourceKind::RouteFilterRule,
        ResourceKind::PublicIpAddress,
        ResourceKind::NetworkInterface,
        ResourceKind::NetworkSecurityGroup,
        ResourceKind::SecurityRule,
        ResourceKind::LocalNetworkGateway,
        ResourceKind::VirtualNetworkGateway,
        ResourceKind::VirtualNetworkGatewayConnection,
        ResourceKind::ExpressRouteCircuit,
        ResourceKind::ExpressRouteCircuitAuthorization,
        ResourceKind::ExpressRouteCircuitPeering,
        ResourceKind::LoadBalancer,
        ResourceKind::ApplicationGateway,
        ResourceKind::NetworkWatcher,
        ResourceKind::PacketCapture,
    ];

    /// Type segments below the provider, outermost first.
    pub fn segments(&self) -> &'static [&'static str] {
        use ResourceKind::*;
        match self {
            ResourceGroup => &[],
            VirtualNetwork => &["virtualNetworks"],
            Subnet => &["virtualNetworks", "subnets"],
            VirtualNetworkPeering => &["virtualNetworks", "virtualNetworkPeerings"],
            RouteTable => &["routeTables"],
            Route => &["routeTables", "routes"],
            RouteFilter => &["routeFilters"],
            RouteFilterRule => &["routeFilters", "routeFilterRules"],
            PublicIpAddress => &["publicIPAddresses"],
            NetworkInterface => &["networkInterfaces"],
            NetworkSecurityGroup => &["networkSecurityGroups"],
            SecurityRule => &["networkSecurityGroups", "securityRules"],
            LocalNetworkGateway => &["localNetworkGateways"],
            VirtualNetworkGateway => &["virtualNetworkGateways"],
            VirtualNetworkGatewayConnection => &["connections"],
            ExpressRouteCircuit => &["expressRouteCircuits"],
            ExpressRouteCircuitAuthorization => &["expressRouteCircuits", "authorizations"],
            ExpressRouteCircuitPeering => &["expressRouteCircuits", "peerings"],
            LoadBalancer => &["loadBalancers"],
            ApplicationGateway => &["applicationGateways"],
            NetworkWatcher => &["networkWatchers"],
            PacketCapture => &["networkWatchers", "packetCaptures"],
        }
    }

    pub fn api_family(&self) -> ApiFamily {
        match self {
            ResourceKind::ResourceGroup => ApiFamily::Resources,
            _ => ApiFamily::Network,
        }
    }

    /// ARM `type` string, e.g. `Microsoft.Network/virtualNetworks/subnets`.
    pub fn arm_type(&self) -> String {
        match self {
            ResourceKind::ResourceGroup => format!("{RESOURCES_NAMESPACE}/resourceGroups"),
            _ => format!("{NETWORK_NAMESPACE}/{}", self.segments().join("/")),
        }
    }

    /// Find a kind from an ARM `type` string (case-insensitive).
    pub fn from_arm_type(arm_type: &str) -> Option<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.arm_type().eq_ignore_ascii_case(arm_type))
    }

    /// Lower-case label used in step banners and logs.
    pub fn label(&self) -> &'static str {
        use ResourceKind::*;
        match self {
            ResourceGroup => "resource group",
            VirtualNetwork => "virtual network",
            Subnet => "subnet",
            VirtualNetworkPeering => "virtual network peering",
            RouteTable => "route table",
            Route => "route",
            RouteFilter => "route filter",
            RouteFilterRule => "route filter rule",
            PublicIpAddress => "public IP address",
            NetworkInterface => "network interface",
            NetworkSecurityGroup => "network security group",
            SecurityRule => "security rule",
            LocalNetworkGateway => "local network gateway",
            VirtualNetworkGateway => "virtual network gateway",
            VirtualNetworkGatewayConnection => "virtual network gateway connection",
            ExpressRouteCircuit => "express route circuit",
            ExpressRouteCircuitAuthorization => "express route circuit authorization",
            ExpressRouteCircuitPeering => "express route circuit peering",
            LoadBalancer => "load balancer",
            ApplicationGateway => "application gateway",
            NetworkWatcher => "network watcher",
            PacketCapture => "packet capture",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fully-qualified resource ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    /// Provider namespace; `None` for the resource group itself.
    pub provider: Option<String>,
    /// `(type segment, name)` pairs below the provider.
    pub segments: Vec<(String, String)>,
}

impl ResourceId {
    /// ID of a resource group.
    pub fn resource_group(subscription_id: &str, group: &str) -> ResourceId {
        ResourceId {
            subscription_id: subscription_id.to_string(),
            resource_group: group.to_string(),
            provider: None,
            segments: vec![],
        }
    }

    /// ID of a `kind` resource; `names` follow [`ResourceKind::segments`],
    /// e.g. `[vnet, subnet]` for a subnet.
    pub fn for_kind(
        kind: ResourceKind,
        subscription_id: &str,
        group: &str,
        names: &[&str],
    ) -> ResourceId {
        debug_assert_eq!(
            kind.segments().len(),
            names.len(),
            "wrong name count for {kind}"
        );
        if kind == ResourceKind::ResourceGroup {
            return ResourceId::resource_group(subscription_id, group);
        }
        ResourceId {
            subscription_id: subscription_id.to_string(),
            resource_group: group.to_string(),
            provider: Some(NETWORK_NAMESPACE.to_string()),
            segments: kind
                .segments()
                .iter()
                .zip(names)
                .map(|(t, n)| (t.to_string(), n.to_string()))
                .collect(),
        }
    }

    /// ID of a sub-resource below this one (e.g. a load balancer probe).
    pub fn child(&self, type_segment: &str, name: &str) -> ResourceId {
        let mut id = self.clone();
        if id.provider.is_none() {
            id.provider = Some(NETWORK_NAMESPACE.to_string());
        }
        id.segments.push((type_segment.to_string(), name.to_string()));
        id
    }

    /// Name of the innermost resource.
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map(|(_, n)| n.as_str())
            .unwrap_or(self.resource_group.as_str())
    }

    /// Kind of the resource, if it is one the operations layer knows.
    pub fn kind(&self) -> Option<ResourceKind> {
        match &self.provider {
            None => Some(ResourceKind::ResourceGroup),
            Some(ns) => {
                let types: Vec<&str> = self.segments.iter().map(|(t, _)| t.as_str()).collect();
                ResourceKind::from_arm_type(&format!("{ns}/{}", types.join("/")))
            }
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )?;
        if let Some(provider) = &self.provider {
            write!(f, "/providers/{provider}")?;
            for (t, n) in &self.segments {
                write!(f, "/{t}/{n}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for ResourceId {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().trim_matches('/').split('/').collect();
        if parts.len() < 4
            || !parts[0].eq_ignore_ascii_case("subscriptions")
            || !parts[2].eq_ignore_ascii_case("resourceGroups")
        {
            return Err(format!("Not a resource group scoped id: {s}").into());
        }
        let mut id = ResourceId::resource_group(parts[1], parts[3]);
        let rest = &parts[4..];
        if rest.is_empty() {
            return Ok(id);
        }
        if rest.len() < 4 || !rest[0].eq_ignore_ascii_case("providers") || rest.len() % 2 != 0 {
            return Err(format!("Malformed provider section in id: {s}").into());
        }
        id.provider = Some(rest[1].to_string());
        id.segments = rest[2..]
            .chunks(2)
            .map(|c| (c[0].to_string(), c[1].to_string()))
            .collect();
        Ok(id)
    }
}

/// Load balancer frontend IP configuration ID, needed in rules before the
/// load balancer exists.
pub fn construct_fip_id(
    subscription_id: &str,
    group: &str,
    lb: &str,
    frontend: &str,
) -> ResourceId {
    ResourceId::for_kind(ResourceKind::LoadBalancer, subscription_id, group, &[lb])
        .child("frontendIPConfigurations", frontend)
}

/// Load balancer backend address pool ID.
pub fn construct_bap_id(subscription_id: &str, group: &str, lb: &str, pool: &str) -> ResourceId {
    ResourceId::for_kind(ResourceKind::LoadBalancer, subscription_id, group, &[lb])
        .child("backendAddressPools", pool)
}

/// Load balancer probe ID.
pub fn construct_probe_id(subscription_id: &str, group: &str, lb: &str, probe: &str) -> ResourceId {
    ResourceId::for_kind(ResourceKind::LoadBalancer, subscription_id, group, &[lb])
        .child("probes", probe)
}
