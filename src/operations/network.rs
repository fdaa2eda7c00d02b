//! Create-or-update / get / delete for every managed resource kind.

use crate::azure::{ArmRequest, ArmTransport};
use crate::config::{self, Settings};
use crate::error::{ArmError, ArmResult};
use crate::models::{ApiFamily, ProvisioningPhase, Resource, ResourceId, ResourceKind};
use colored::Colorize;
use serde::Serialize;
use std::time::Duration;

/// How long-running operations are awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            interval: Duration::from_millis(config::SLEEP_MSEC),
            max_attempts: config::POLL_MAX_ATTEMPTS,
        }
    }
}

/// Client context for one subscription. Every call goes through `transport`.
#[derive(Debug)]
pub struct NetworkOperations<T> {
    subscription_id: String,
    transport: T,
    network_api_version: String,
    resources_api_version: String,
    poll: PollSettings,
}

/// Generates `get_*`, `create_or_update_*` and `delete_*` for a kind whose
/// ID needs the listed names after the resource group.
macro_rules! resource_operations {
    ($kind:ident, $get:ident, $put:ident, $delete:ident, [$($name:ident),+]) => {
        pub async fn $get(&self, group: &str, $($name: &str),+) -> ArmResult<Resource> {
            self.get(&self.resource_id(ResourceKind::$kind, group, &[$($name),+]))
                .await
        }

        pub async fn $put<P: Serialize>(
            &self,
            group: &str,
            $($name: &str,)+
            parameters: &P,
        ) -> ArmResult<Resource> {
            let id = self.resource_id(ResourceKind::$kind, group, &[$($name),+]);
            self.create_or_update(&id, parameters).await
        }

        pub async fn $delete(&self, group: &str, $($name: &str),+) -> ArmResult<()> {
            self.delete(&self.resource_id(ResourceKind::$kind, group, &[$($name),+]))
                .await
        }
    };
}

impl<T: ArmTransport> NetworkOperations<T> {
    pub fn new(subscription_id: &str, transport: T, settings: &Settings) -> Self {
        NetworkOperations {
            subscription_id: subscription_id.to_string(),
            transport,
            network_api_version: settings.network_api_version.clone(),
            resources_api_version: settings.resources_api_version.clone(),
            poll: PollSettings::default(),
        }
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// ID of a resource in this subscription.
    pub fn resource_id(&self, kind: ResourceKind, group: &str, names: &[&str]) -> ResourceId {
        ResourceId::for_kind(kind, &self.subscription_id, group, names)
    }

    fn api_version(&self, id: &ResourceId) -> &str {
        match id.kind().map(|k| k.api_family()) {
            Some(ApiFamily::Resources) => &self.resources_api_version,
            _ => &self.network_api_version,
        }
    }

    /// Fetch the current state of a resource.
    pub async fn get(&self, id: &ResourceId) -> ArmResult<Resource> {
        let path = id.to_string();
        let response = self
            .transport
            .send(ArmRequest::get(&path, self.api_version(id)))
            .await?
            .error_for_status(&path)?;
        let body = response.body.ok_or_else(|| ArmError::Decode {
            path: String::new(),
            message: format!("Empty body for GET {path}"),
        })?;
        Resource::from_value(body, id.kind())
    }

    /// Submit `parameters` and wait until ARM reports a terminal provisioning state.
    pub async fn create_or_update<P: Serialize>(
        &self,
        id: &ResourceId,
        parameters: &P,
    ) -> ArmResult<Resource> {
        let path = id.to_string();
        let body = serde_json::to_value(parameters).map_err(|e| ArmError::Encode {
            id: path.clone(),
            message: e.to_string(),
        })?;
        log::debug!("PUT {path}");

        let response = self
            .transport
            .send(ArmRequest::put(&path, self.api_version(id), body))
            .await?
            .error_for_status(&path)?;
        let current = match response.body {
            Some(body) => Some(Resource::from_value(body, id.kind())?),
            None => None,
        };
        self.wait_for_provisioning(id, current).await
    }

    /// Delete a resource and wait until it is gone. A resource that is
    /// already absent counts as deleted.
    pub async fn delete(&self, id: &ResourceId) -> ArmResult<()> {
        let path = id.to_string();
        let response = self
            .transport
            .send(ArmRequest::delete(&path, self.api_version(id)))
            .await?;
        match response.error_for_status(&path) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                log::warn!("{} {} already absent", kind_label(id), id.name());
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        self.wait_for_deletion(id).await
    }

    async fn wait_for_provisioning(
        &self,
        id: &ResourceId,
        current: Option<Resource>,
    ) -> ArmResult<Resource> {
        let mut resource = match current {
            Some(r) => r,
            None => self.get(id).await?,
        };
        let mut attempt = 0;
        loop {
            let state = resource.provisioning_state().unwrap_or("Succeeded").to_string();
            match ProvisioningPhase::of(resource.provisioning_state()) {
                ProvisioningPhase::Succeeded => {
                    log::info!(
                        "{} {} provisioning state: {}",
                        kind_label(id),
                        id.name(),
                        state.green()
                    );
                    return Ok(resource);
                }
                ProvisioningPhase::Failed => {
                    log::error!(
                        "{} {} provisioning state: {}",
                        kind_label(id),
                        id.name(),
                        state.red()
                    );
                    return Err(ArmError::Provisioning {
                        id: id.to_string(),
                        state,
                    });
                }
                ProvisioningPhase::InProgress => {
                    if attempt >= self.poll.max_attempts {
                        return Err(ArmError::PollTimeout {
                            id: id.to_string(),
                            state,
                        });
                    }
                    attempt += 1;
                    log::debug!(
                        "poll#{attempt:3} {} {} state={state}",
                        kind_label(id),
                        id.name()
                    );
                    tokio::time::sleep(self.poll.interval).await;
                    resource = self.get(id).await?;
                }
            }
        }
    }

    async fn wait_for_deletion(&self, id: &ResourceId) -> ArmResult<()> {
        for attempt in 0..=self.poll.max_attempts {
            match self.get(id).await {
                Err(e) if e.is_not_found() => {
                    log::info!("{} {} deleted", kind_label(id), id.name());
                    return Ok(());
                }
                Err(e) => return Err(e),
                Ok(resource) => {
                    log::debug!(
                        "poll#{attempt:3} {} {} still present state={:?}",
                        kind_label(id),
                        id.name(),
                        resource.provisioning_state()
                    );
                    if attempt < self.poll.max_attempts {
                        tokio::time::sleep(self.poll.interval).await;
                    }
                }
            }
        }
        Err(ArmError::PollTimeout {
            id: id.to_string(),
            state: "Deleting".to_string(),
        })
    }

    /// Register a resource provider with the subscription and return the
    /// reported registration state.
    pub async fn register_provider(&self, namespace: &str) -> ArmResult<Option<String>> {
        let path = format!(
            "/subscriptions/{}/providers/{namespace}/register",
            self.subscription_id
        );
        let response = self
            .transport
            .send(ArmRequest::post(&path, &self.resources_api_version))
            .await?
            .error_for_status(&path)?;
        let state = response
            .body
            .as_ref()
            .and_then(|b| b["registrationState"].as_str())
            .map(str::to_string);
        log::info!(
            "provider {namespace} registration state: {}",
            state.as_deref().unwrap_or("unknown").green()
        );
        Ok(state)
    }

    // Resource groups live in Microsoft.Resources and take no extra names.

    pub async fn get_resource_group(&self, group: &str) -> ArmResult<Resource> {
        self.get(&self.resource_id(ResourceKind::ResourceGroup, group, &[]))
            .await
    }

    pub async fn create_or_update_resource_group<P: Serialize>(
        &self,
        group: &str,
        parameters: &P,
    ) -> ArmResult<Resource> {
        let id = self.resource_id(ResourceKind::ResourceGroup, group, &[]);
        self.create_or_update(&id, parameters).await
    }

    pub async fn delete_resource_group(&self, group: &str) -> ArmResult<()> {
        self.delete(&self.resource_id(ResourceKind::ResourceGroup, group, &[]))
            .await
    }

    resource_operations!(
        VirtualNetwork,
        get_virtual_network,
        create_or_update_virtual_network,
        delete_virtual_network,
        [vnet]
    );
    resource_operations!(
        Subnet,
        get_subnet,
        create_or_update_subnet,
        delete_subnet,
        [vnet, subnet]
    );
    resource_operations!(
        VirtualNetworkPeering,
        get_virtual_network_peering,
        create_or_update_virtual_network_peering,
        delete_virtual_network_peering,
        [vnet, peering]
    );
    resource_operations!(
        RouteTable,
        get_route_table,
        create_or_update_route_table,
        delete_route_table,
        [route_table]
    );
    resource_operations!(
        Route,
        get_route,
        create_or_update_route,
        delete_route,
        [route_table, route]
    );
    resource_operations!(
        RouteFilter,
        get_route_filter,
        create_or_update_route_filter,
        delete_route_filter,
        [route_filter]
    );
    resource_operations!(
        RouteFilterRule,
        get_route_filter_rule,
        create_or_update_route_filter_rule,
        delete_route_filter_rule,
        [route_filter, rule]
    );
    resource_operations!(
        PublicIpAddress,
        get_public_ip_address,
        create_or_update_public_ip_address,
        delete_public_ip_address,
        [public_ip]
    );
    resource_operations!(
        NetworkInterface,
        get_network_interface,
        create_or_update_network_interface,
        delete_network_interface,
        [nic]
    );
    resource_operations!(
        NetworkSecurityGroup,
        get_network_security_group,
        create_or_update_network_security_group,
        delete_network_security_group,
        [nsg]
    );
    resource_operations!(
        SecurityRule,
        get_security_rule,
        create_or_update_security_rule,
        delete_security_rule,
        [nsg, rule]
    );
    resource_operations!(
        LocalNetworkGateway,
        get_local_network_gateway,
        create_or_update_local_network_gateway,
        delete_local_network_gateway,
        [gateway]
    );
    resource_operations!(
        VirtualNetworkGateway,
        get_virtual_network_gateway,
        create_or_update_virtual_network_gateway,
        delete_virtual_network_gateway,
        [gateway]
    );
    resource_operations!(
        VirtualNetworkGatewayConnection,
        get_virtual_network_gateway_connection,
        create_or_update_virtual_network_gateway_connection,
        delete_virtual_network_gateway_connection,
        [connection]
    );
    resource_operations!(
        ExpressRouteCircuit,
        get_express_route_circuit,
        create_or_update_express_route_circuit,
        delete_express_route_circuit,
        [circuit]
    );
    resource_operations!(
        ExpressRouteCircuitAuthorization,
        get_express_route_circuit_authorization,
        create_or_update_express_route_circuit_authorization,
        delete_express_route_circuit_authorization,
        [circuit, authorization]
    );
    resource_operations!(
        ExpressRouteCircuitPeering,
        get_express_route_circuit_peering,
        create_or_update_express_route_circuit_peering,
        delete_express_route_circuit_peering,
        [circuit, peering]
    );
    resource_operations!(
        LoadBalancer,
        get_load_balancer,
        create_or_update_load_balancer,
        delete_load_balancer,
        [load_balancer]
    );
    resource_operations!(
        ApplicationGateway,
        get_application_gateway,
        create_or_update_application_gateway,
        delete_application_gateway,
        [application_gateway]
    );
    resource_operations!(
        NetworkWatcher,
        get_network_watcher,
        create_or_update_network_watcher,
        delete_network_watcher,
        [watcher]
    );
    resource_operations!(
        PacketCapture,
        get_packet_capture,
        create_or_update_packet_capture,
        delete_packet_capture,
        [watcher, capture]
    );
}

fn kind_label(id: &ResourceId) -> &'static str {
    id.kind().map(|k| k.label()).unwrap_or("resource")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::{ArmResponse, Method};
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Answers requests from a queue and records what was sent.
    #[derive(Default)]
    struct ScriptedTransport {
        answers: RefCell<VecDeque<ArmResponse>>,
        sent: RefCell<Vec<ArmRequest>>,
    }

    impl ScriptedTransport {
        fn answering(answers: Vec<ArmResponse>) -> Self {
            ScriptedTransport {
                answers: RefCell::new(answers.into()),
                sent: RefCell::new(vec![]),
            }
        }
    }

    impl ArmTransport for ScriptedTransport {
        async fn send(&self, request: ArmRequest) -> ArmResult<ArmResponse> {
            self.sent.borrow_mut().push(request);
            self.answers
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| ArmError::Transport("no scripted answer".to_string()))
        }
    }

    fn ops(transport: ScriptedTransport) -> NetworkOperations<ScriptedTransport> {
        NetworkOperations::new("sub-1", transport, &Settings::default()).with_poll(PollSettings {
            interval: Duration::from_millis(1),
            max_attempts: 3,
        })
    }

    const VNET_ID: &str =
        "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet1";

    fn vnet_body(state: &str) -> serde_json::Value {
        json!({
            "name": "vnet1",
            "id": VNET_ID,
            "type": "Microsoft.Network/virtualNetworks",
            "location": "usgovvirginia",
            "properties": {"provisioningState": state}
        })
    }

    #[tokio::test]
    async fn test_get_uses_network_api_version() {
        let ops = ops(ScriptedTransport::answering(vec![ArmResponse::ok(vnet_body(
            "Succeeded",
        ))]));
        let vnet = ops.get_virtual_network("rg", "vnet1").await.unwrap();
        assert_eq!(vnet.name(), Some("vnet1"));
        let sent = ops.transport().sent.borrow();
        assert_eq!(sent[0].method, Method::Get);
        assert_eq!(sent[0].path, VNET_ID);
        assert_eq!(sent[0].api_version, config::DEFAULT_NETWORK_API_VERSION);
    }

    #[tokio::test]
    async fn test_resource_group_uses_resources_api_version() {
        let ops = ops(ScriptedTransport::answering(vec![ArmResponse::ok(json!({
            "name": "rg",
            "type": "Microsoft.Resources/resourceGroups",
            "location": "usgovvirginia",
            "properties": {"provisioningState": "Succeeded"}
        }))]));
        let rg = ops
            .create_or_update_resource_group("rg", &json!({"location": "usgovvirginia"}))
            .await
            .unwrap();
        assert!(matches!(rg, Resource::ResourceGroup(_)));
        let sent = ops.transport().sent.borrow();
        assert_eq!(sent[0].method, Method::Put);
        assert_eq!(sent[0].api_version, config::DEFAULT_RESOURCES_API_VERSION);
        assert_eq!(sent[0].body, Some(json!({"location": "usgovvirginia"})));
    }

    #[tokio::test]
    async fn test_create_polls_until_succeeded() {
        let ops = ops(ScriptedTransport::answering(vec![
            ArmResponse {
                status: 201,
                body: Some(vnet_body("Updating")),
            },
            ArmResponse::ok(vnet_body("Updating")),
            ArmResponse::ok(vnet_body("Succeeded")),
        ]));
        let vnet = ops
            .create_or_update_virtual_network("rg", "vnet1", &json!({"location": "x"}))
            .await
            .unwrap();
        assert_eq!(vnet.provisioning_state(), Some("Succeeded"));
        assert_eq!(ops.transport().sent.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_create_failed_state_is_error() {
        let ops = ops(ScriptedTransport::answering(vec![ArmResponse::ok(vnet_body(
            "Failed",
        ))]));
        let err = ops
            .create_or_update_virtual_network("rg", "vnet1", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ArmError::Provisioning { ref state, .. } if state == "Failed"));
    }

    #[tokio::test]
    async fn test_create_times_out() {
        let ops = ops(ScriptedTransport::answering(vec![
            ArmResponse::ok(vnet_body("Updating")),
            ArmResponse::ok(vnet_body("Updating")),
            ArmResponse::ok(vnet_body("Updating")),
            ArmResponse::ok(vnet_body("Updating")),
        ]));
        let err = ops
            .create_or_update_virtual_network("rg", "vnet1", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ArmError::PollTimeout { .. }));
    }

    #[tokio::test]
    async fn test_api_error_is_returned_not_swallowed() {
        let ops = ops(ScriptedTransport::answering(vec![ArmResponse {
            status: 409,
            body: Some(json!({
                "error": {"code": "InUseSubnetCannotBeDeleted", "message": "in use"}
            })),
        }]));
        let err = ops.delete_subnet("rg", "vnet1", "GatewaySubnet").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "ARM returned 409 (InUseSubnetCannotBeDeleted): in use"
        );
    }

    #[tokio::test]
    async fn test_delete_waits_until_gone() {
        let ops = ops(ScriptedTransport::answering(vec![
            ArmResponse {
                status: 202,
                body: None,
            },
            ArmResponse::ok(vnet_body("Deleting")),
            ArmResponse {
                status: 404,
                body: None,
            },
        ]));
        ops.delete_virtual_network("rg", "vnet1").await.unwrap();
        let sent = ops.transport().sent.borrow();
        let methods: Vec<Method> = sent.iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![Method::Delete, Method::Get, Method::Get]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let ops = ops(ScriptedTransport::answering(vec![ArmResponse {
            status: 404,
            body: None,
        }]));
        ops.delete_local_network_gateway("rg", "lgw1").await.unwrap();
        assert_eq!(ops.transport().sent.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_register_provider_posts_to_subscription() {
        let ops = ops(ScriptedTransport::answering(vec![ArmResponse::ok(json!({
            "namespace": "Microsoft.Network",
            "registrationState": "Registering"
        }))]));
        let state = ops.register_provider("Microsoft.Network").await.unwrap();
        assert_eq!(state.as_deref(), Some("Registering"));
        let sent = ops.transport().sent.borrow();
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(
            sent[0].path,
            "/subscriptions/sub-1/providers/Microsoft.Network/register"
        );
        assert_eq!(sent[0].api_version, config::DEFAULT_RESOURCES_API_VERSION);
        assert_eq!(sent[0].body, None);
    }

    #[tokio::test]
    async fn test_register_provider_forbidden() {
        let ops = ops(ScriptedTransport::answering(vec![ArmResponse {
            status: 403,
            body: Some(json!({"error": {"code": "AuthorizationFailed", "message": "no"}})),
        }]));
        let err = ops.register_provider("Microsoft.Network").await.unwrap_err();
        assert!(matches!(err, ArmError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_child_resource_paths() {
        let ops = ops(ScriptedTransport::answering(vec![ArmResponse::ok(json!({
            "name": "AzurePrivatePeering",
            "properties": {"provisioningState": "Succeeded", "peerASN": 65010}
        }))]));
        let peering = ops
            .get_express_route_circuit_peering("rg", "erc1", "AzurePrivatePeering")
            .await
            .unwrap();
        assert!(matches!(peering, Resource::ExpressRouteCircuitPeering(_)));
        assert!(ops.transport().sent.borrow()[0]
            .path
            .ends_with("/expressRouteCircuits/erc1/peerings/AzurePrivatePeering"));
    }
}
