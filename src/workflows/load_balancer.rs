//! Public load balancer with an HTTP probe, one load balancing rule and
//! inbound NAT rules.

use super::parameters;
use super::runner::WorkflowRunner;
use crate::azure::ArmTransport;
use crate::error::{ConfigError, WorkflowError};
use crate::models::network::{
    BackendAddressPoolProperties, FrontendIpConfigurationProperties, InboundNatRuleProperties,
    LoadBalancerProperties, LoadBalancingRuleProperties, ProbeProperties,
};
use crate::models::{
    construct_bap_id, construct_fip_id, construct_probe_id, ArmResource, LoadBalancerData,
    ResourceId, ResourceKind, ScenarioData, SubResource, NETWORK_NAMESPACE,
};

pub const NAME: &str = "load-balancer";

const IDLE_TIMEOUT_MINUTES: u32 = 4;
const PROBE_INTERVAL_SECONDS: u32 = 15;
const PROBE_COUNT: u32 = 4;

/// Full load balancer body. Rules reference the frontend, pool and probe by
/// the IDs they will have once the load balancer exists.
pub fn load_balancer_parameters(
    subscription_id: &str,
    data: &ScenarioData,
    lb: &LoadBalancerData,
    public_ip_id: &str,
) -> ArmResource<LoadBalancerProperties> {
    let group = data.resource_group.as_str();
    let fip_id = construct_fip_id(subscription_id, group, &lb.name, &lb.frontend_ip_name);
    let bap_id = construct_bap_id(subscription_id, group, &lb.name, &lb.backend_pool_name);
    let probe_id = construct_probe_id(subscription_id, group, &lb.name, &lb.probe_name);

    let frontend = ArmResource::named(
        &lb.frontend_ip_name,
        FrontendIpConfigurationProperties {
            private_ip_allocation_method: Some("Dynamic".to_string()),
            public_ip_address: Some(SubResource::new(public_ip_id)),
            ..Default::default()
        },
    );
    let pool = ArmResource::named(&lb.backend_pool_name, BackendAddressPoolProperties::default());
    let probe = ArmResource::named(
        &lb.probe_name,
        ProbeProperties {
            protocol: Some("Http".to_string()),
            port: Some(lb.probe_port),
            interval_in_seconds: Some(PROBE_INTERVAL_SECONDS),
            number_of_probes: Some(PROBE_COUNT),
            request_path: Some(lb.probe_path.clone()),
            ..Default::default()
        },
    );
    let rule = ArmResource::named(
        &lb.rule_name,
        LoadBalancingRuleProperties {
            protocol: Some("Tcp".to_string()),
            frontend_port: Some(lb.rule_frontend_port),
            backend_port: Some(lb.rule_backend_port),
            idle_timeout_in_minutes: Some(IDLE_TIMEOUT_MINUTES),
            enable_floating_ip: Some(false),
            load_distribution: Some("Default".to_string()),
            frontend_ip_configuration: Some(SubResource::new(&fip_id)),
            backend_address_pool: Some(SubResource::new(&bap_id)),
            probe: Some(SubResource::new(&probe_id)),
            ..Default::default()
        },
    );
    let nat_rules = lb
        .nat_rules
        .iter()
        .map(|nat| {
            ArmResource::named(
                &nat.name,
                InboundNatRuleProperties {
                    protocol: Some("Tcp".to_string()),
                    frontend_port: Some(nat.frontend_port),
                    backend_port: Some(lb.nat_backend_port),
                    idle_timeout_in_minutes: Some(IDLE_TIMEOUT_MINUTES),
                    enable_floating_ip: Some(false),
                    frontend_ip_configuration: Some(SubResource::new(&fip_id)),
                    ..Default::default()
                },
            )
        })
        .collect();

    ArmResource::located(
        &data.location,
        LoadBalancerProperties {
            frontend_ip_configurations: vec![frontend],
            backend_address_pools: vec![pool],
            probes: vec![probe],
            load_balancing_rules: vec![rule],
            inbound_nat_rules: nat_rules,
            ..Default::default()
        },
    )
}

pub async fn run<T: ArmTransport>(
    runner: &mut WorkflowRunner<'_, T>,
    data: &ScenarioData,
) -> Result<(), WorkflowError> {
    let lb = data.require_load_balancer(NAME)?;
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

    let pip_id = ops.resource_id(ResourceKind::PublicIpAddress, group, &[&lb.public_ip_name]);
    runner
        .provision(
            "Creating Public IP Address...",
            &pip_id,
            &parameters::public_ip(location, "Static"),
        )
        .await?;

    let step = "Creating load balancer...";
    let pip_ref = runner.lookup_id(step, &pip_id).await?;
    runner
        .provision(
            step,
            &ops.resource_id(ResourceKind::LoadBalancer, group, &[&lb.name]),
            &load_balancer_parameters(ops.subscription_id(), data, lb, &pip_ref),
        )
        .await?;

    Ok(())
}

/// Resources of this workflow, dependents first. The resource group is kept.
pub fn teardown_ids(
    subscription_id: &str,
    data: &ScenarioData,
) -> Result<Vec<ResourceId>, ConfigError> {
    let lb = data.require_load_balancer(NAME)?;
    let group = data.resource_group.as_str();
    Ok(vec![
        ResourceId::for_kind(ResourceKind::LoadBalancer, subscription_id, group, &[&lb.name]),
        ResourceId::for_kind(
            ResourceKind::PublicIpAddress,
            subscription_id,
            group,
            &[&lb.public_ip_name],
        ),
    ])
}
