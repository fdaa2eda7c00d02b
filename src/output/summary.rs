//! Summary of the resources a workflow created or fetched.

use super::terminal::{format_field, highlight, or_none};
use crate::models::{ArmResource, Resource, Sku};
use itertools::Itertools;

/// How much of each resource to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryStyle {
    #[default]
    Standard,
    /// Also list nested sub-resources (IP configurations, probes, rules ...).
    Verbose,
}

/// Render one block per resource, separated by blank lines.
pub fn render_summary(resources: &[Resource], style: SummaryStyle) -> String {
    resources
        .iter()
        .map(|r| render_resource(r, style))
        .join("\n")
}

/// Print the summary to stdout.
pub fn print_summary(title: &str, resources: &[Resource], style: SummaryStyle) {
    log::info!("summary of {} resources for {title}", resources.len());
    println!("\nSummary of resources created in the {title} workflow...\n");
    println!("{}", highlight(&render_summary(resources, style)));
}

fn joined(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_string()
    } else {
        values.iter().join(", ")
    }
}

fn sku_text(sku: &Option<Sku>) -> String {
    or_none(sku.as_ref())
}

fn names<P: Default>(items: &[ArmResource<P>]) -> String {
    items.iter().map(|i| i.name_or_blank()).join(", ")
}

pub fn render_resource(resource: &Resource, style: SummaryStyle) -> String {
    let verbose = style == SummaryStyle::Verbose;
    let mut out = String::new();
    out += &format_field("Name", or_none(resource.name()), 0);
    out += &format_field("Id", or_none(resource.id()), 1);
    out += &format_field("Location", or_none(resource.location()), 1);
    out += "\tProperties:\n";
    out += &format_field("Provisioning State", or_none(resource.provisioning_state()), 2);

    match resource {
        Resource::ResourceGroup(_) => {}
        Resource::VirtualNetwork(r) => {
            let p = &r.properties;
            let prefixes = p
                .address_space
                .as_ref()
                .map(|a| joined(&a.address_prefixes));
            out += &format_field("Address Space", or_none(prefixes), 2);
            if let Some(dhcp) = &p.dhcp_options {
                out += &format_field("DNS Servers", joined(&dhcp.dns_servers), 2);
            }
            if verbose {
                out += "\t\tSubnets:\n";
                for s in &p.subnets {
                    out += &format!(
                        "\t\t\t{} {}\n",
                        s.name_or_blank(),
                        or_none(s.properties.address_prefix.as_deref())
                    );
                }
            }
        }
        Resource::Subnet(r) => {
            let prefix = r.properties.address_prefix.as_deref();
            out += &format_field("Address Prefix", or_none(prefix), 2);
            if verbose {
                out += &format_field("IP Configurations", r.properties.ip_configurations.len(), 2);
            }
        }
        Resource::PublicIpAddress(r) => {
            let p = &r.properties;
            out += &format_field(
                "Allocation Method",
                or_none(p.public_ip_allocation_method.as_deref()),
                2,
            );
            out += &format_field("IP Address", or_none(p.ip_address.as_deref()), 2);
        }
        Resource::LocalNetworkGateway(r) => {
            let p = &r.properties;
            out += &format_field("Gateway IP Address", or_none(p.gateway_ip_address.as_deref()), 2);
            let prefixes = p
                .local_network_address_space
                .as_ref()
                .map(|a| joined(&a.address_prefixes));
            out += &format_field("Address Space", or_none(prefixes), 2);
            if let Some(bgp) = &p.bgp_settings {
                out += &format_field("BGP ASN", or_none(bgp.asn), 2);
                out += &format_field(
                    "BGP Peering Address",
                    or_none(bgp.bgp_peering_address.as_deref()),
                    2,
                );
            }
        }
        Resource::VirtualNetworkGateway(r) => {
            let p = &r.properties;
            out += &format_field("Gateway Type", or_none(p.gateway_type.as_deref()), 2);
            if p.vpn_type.is_some() {
                out += &format_field("VPN Type", or_none(p.vpn_type.as_deref()), 2);
            }
            out += &format_field("SKU", sku_text(&p.sku), 2);
            out += &format_field("BGP Enabled", or_none(p.enable_bgp), 2);
            if verbose {
                out += "\t\tIP Configurations:\n";
                for c in &p.ip_configurations {
                    out += &format!(
                        "\t\t\t{} subnet={} publicIP={}\n",
                        c.name_or_blank(),
                        or_none(c.properties.subnet.as_ref().map(|s| &s.id)),
                        or_none(c.properties.public_ip_address.as_ref().map(|s| &s.id))
                    );
                }
            }
        }
        Resource::Connection(r) => {
            let p = &r.properties;
            out += &format_field("Connection Type", or_none(p.connection_type.as_deref()), 2);
            out += &format_field("Connection Status", or_none(p.connection_status.as_deref()), 2);
            if verbose {
                let peer = p
                    .peer
                    .as_ref()
                    .or(p.local_network_gateway2.as_ref())
                    .map(|s| &s.id);
                out += &format_field("Peer", or_none(peer), 2);
                out += &format_field("Ingress Bytes", or_none(p.ingress_bytes_transferred), 2);
                out += &format_field("Egress Bytes", or_none(p.egress_bytes_transferred), 2);
            }
        }
        Resource::ExpressRouteCircuit(r) => {
            let p = &r.properties;
            if let Some(sp) = &p.service_provider_properties {
                let provider = sp.service_provider_name.as_deref();
                out += &format_field("Service Provider", or_none(provider), 2);
                let peering_location = sp.peering_location.as_deref();
                out += &format_field("Peering Location", or_none(peering_location), 2);
                out += &format_field("Bandwidth In Mbps", or_none(sp.bandwidth_in_mbps), 2);
            }
            out += &format_field("SKU", sku_text(&r.sku), 2);
            out += &format_field(
                "Service Provider Provisioning State",
                or_none(p.service_provider_provisioning_state.as_deref()),
                2,
            );
            if verbose {
                out += &format_field("Peerings", names(&p.peerings), 2);
                out += &format_field("Authorizations", names(&p.authorizations), 2);
            }
        }
        Resource::ExpressRouteCircuitPeering(r) => {
            let p = &r.properties;
            out += &format_field("Peering Type", or_none(p.peering_type.as_deref()), 2);
            out += &format_field("State", or_none(p.state.as_deref()), 2);
            out += &format_field("Peer ASN", or_none(p.peer_asn), 2);
            out += &format_field("VLAN Id", or_none(p.vlan_id), 2);
            if verbose {
                out += &format_field(
                    "Primary Peer Address Prefix",
                    or_none(p.primary_peer_address_prefix.as_deref()),
                    2,
                );
                out += &format_field(
                    "Secondary Peer Address Prefix",
                    or_none(p.secondary_peer_address_prefix.as_deref()),
                    2,
                );
            }
        }
        Resource::ExpressRouteCircuitAuthorization(r) => {
            out += &format_field(
                "Authorization Use Status",
                or_none(r.properties.authorization_use_status.as_deref()),
                2,
            );
        }
        Resource::LoadBalancer(r) => {
            let p = &r.properties;
            out += "\t\tFrontend IP Configurations:\n";
            for config in &p.frontend_ip_configurations {
                out += &format!(
                    "\t\t\t{}\n",
                    or_none(config.properties.private_ip_allocation_method.as_deref())
                );
            }
            if verbose {
                out += &format_field("Backend Address Pools", names(&p.backend_address_pools), 2);
                out += "\t\tProbes:\n";
                for probe in &p.probes {
                    out += &format!(
                        "\t\t\t{} {}:{} {}\n",
                        probe.name_or_blank(),
                        or_none(probe.properties.protocol.as_deref()),
                        or_none(probe.properties.port),
                        or_none(probe.properties.request_path.as_deref())
                    );
                }
                out += "\t\tLoad Balancing Rules:\n";
                for rule in &p.load_balancing_rules {
                    out += &format!(
                        "\t\t\t{} {} {}->{}\n",
                        rule.name_or_blank(),
                        or_none(rule.properties.protocol.as_deref()),
                        or_none(rule.properties.frontend_port),
                        or_none(rule.properties.backend_port)
                    );
                }
                out += "\t\tInbound NAT Rules:\n";
                for nat in &p.inbound_nat_rules {
                    out += &format!(
                        "\t\t\t{} {} {}->{}\n",
                        nat.name_or_blank(),
                        or_none(nat.properties.protocol.as_deref()),
                        or_none(nat.properties.frontend_port),
                        or_none(nat.properties.backend_port)
                    );
                }
            }
        }
        Resource::Other { resource, .. } => {
            if verbose {
                for (key, value) in &resource.properties.extra {
                    out += &format_field(key, value, 2);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LB_ID: &str =
        "/subscriptions/s/resourceGroups/g/providers/Microsoft.Network/loadBalancers/lb1";

    fn load_balancer() -> Resource {
        Resource::from_value(
            json!({
                "id": LB_ID,
                "name": "lb1",
                "type": "Microsoft.Network/loadBalancers",
                "location": "usgovvirginia",
                "properties": {
                    "provisioningState": "Succeeded",
                    "frontendIPConfigurations": [
                        {"name": "fe", "properties": {"privateIPAllocationMethod": "Dynamic"}}
                    ],
                    "probes": [
                        {
                            "name": "probe1",
                            "properties": {
                                "protocol": "Http",
                                "port": 80,
                                "requestPath": "healthprobe.aspx"
                            }
                        }
                    ],
                    "inboundNatRules": [
                        {
                            "name": "nat1",
                            "properties": {"protocol": "Tcp", "frontendPort": 21, "backendPort": 22}
                        }
                    ]
                }
            }),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_render_load_balancer_standard() {
        let text = render_resource(&load_balancer(), SummaryStyle::Standard);
        assert_eq!(
            text,
            format!(
                "Name: lb1\n\
                 \tId: {LB_ID}\n\
                 \tLocation: usgovvirginia\n\
                 \tProperties:\n\
                 \t\tProvisioning State: Succeeded\n\
                 \t\tFrontend IP Configurations:\n\
                 \t\t\tDynamic\n"
            )
        );
    }

    #[test]
    fn test_render_load_balancer_verbose() {
        let text = render_resource(&load_balancer(), SummaryStyle::Verbose);
        assert!(text.contains("\t\t\tprobe1 Http:80 healthprobe.aspx\n"));
        assert!(text.contains("\t\t\tnat1 Tcp 21->22\n"));
    }

    #[test]
    fn test_render_subnet_without_location() {
        let subnet = Resource::from_value(
            json!({
                "name": "GatewaySubnet",
                "properties": {"provisioningState": "Updating", "addressPrefix": "10.70.255.0/27"}
            }),
            Some(crate::models::ResourceKind::Subnet),
        )
        .unwrap();
        let text = render_resource(&subnet, SummaryStyle::Standard);
        assert!(text.contains("\tId: None\n"));
        assert!(text.contains("\tLocation: None\n"));
        assert!(text.contains("\t\tProvisioning State: Updating\n"));
        assert!(text.contains("\t\tAddress Prefix: 10.70.255.0/27\n"));
    }

    #[test]
    fn test_connection_never_shows_shared_key() {
        let conn = Resource::from_value(
            json!({
                "name": "c1",
                "type": "Microsoft.Network/connections",
                "properties": {"connectionType": "IPsec", "sharedKey": "s3cret"}
            }),
            None,
        )
        .unwrap();
        let text = render_summary(&[conn], SummaryStyle::Verbose);
        assert!(text.contains("Connection Type: IPsec"));
        assert!(!text.contains("s3cret"));
    }

    #[test]
    fn test_summary_blocks_are_separated() {
        let text = render_summary(&[load_balancer(), load_balancer()], SummaryStyle::Standard);
        assert_eq!(text.matches("Name: lb1").count(), 2);
        assert!(text.contains("Dynamic\n\nName: lb1"));
    }
}
