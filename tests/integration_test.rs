//! Integration tests for azure-network-workflows
//!
//! These tests drive whole workflows against an in-memory Resource Manager
//! and check which requests were sent, in which order, with which bodies.

use azure_network_workflows::azure::{ArmRequest, ArmResponse, ArmTransport, Method};
use azure_network_workflows::config::Settings;
use azure_network_workflows::error::{ArmError, ArmResult, ConfigError, WorkflowError};
use azure_network_workflows::models::{ResourceId, ResourceKind, ScenarioData};
use azure_network_workflows::workflows::{RunMode, WorkflowKind};
use azure_network_workflows::{execute, RunOptions};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Stores PUT bodies by path and serves them back; records every request.
#[derive(Default)]
struct FakeArm {
    store: RefCell<BTreeMap<String, Value>>,
    sent: RefCell<Vec<ArmRequest>>,
    /// PUTs to a path containing this text end in `Failed`.
    fail_on: Option<&'static str>,
}

impl FakeArm {
    fn failing_on(fragment: &'static str) -> Self {
        FakeArm {
            fail_on: Some(fragment),
            ..Default::default()
        }
    }

    fn paths(&self, method: Method) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .filter(|r| r.method == method)
            .map(|r| r.path.clone())
            .collect()
    }

    fn put_body(&self, path_suffix: &str) -> Value {
        self.sent
            .borrow()
            .iter()
            .find(|r| r.method == Method::Put && r.path.ends_with(path_suffix))
            .and_then(|r| r.body.clone())
            .unwrap_or_else(|| panic!("no PUT to *{path_suffix}"))
    }

    fn not_found(path: &str) -> ArmResponse {
        let message = format!("{path} not found");
        ArmResponse {
            status: 404,
            body: Some(json!({"error": {"code": "ResourceNotFound", "message": message}})),
        }
    }
}

impl ArmTransport for FakeArm {
    async fn send(&self, request: ArmRequest) -> ArmResult<ArmResponse> {
        self.sent.borrow_mut().push(request.clone());
        let path = request.path.clone();
        match request.method {
            Method::Get => match self.store.borrow().get(&path) {
                Some(body) => Ok(ArmResponse::ok(body.clone())),
                None => Ok(FakeArm::not_found(&path)),
            },
            Method::Put => {
                let id = ResourceId::from_str(&path)
                    .map_err(|e| ArmError::Transport(e.to_string()))?;
                let state = match self.fail_on {
                    Some(fragment) if path.contains(fragment) => "Failed",
                    _ => "Succeeded",
                };
                let mut body = request.body.unwrap_or_else(|| json!({}));
                body["id"] = json!(path);
                body["name"] = json!(id.name());
                body["type"] = json!(id.kind().map(|k| k.arm_type()));
                if body.get("properties").is_none() {
                    body["properties"] = json!({});
                }
                body["properties"]["provisioningState"] = json!(state);
                self.store.borrow_mut().insert(path, body.clone());
                Ok(ArmResponse::ok(body))
            }
            Method::Post => Ok(ArmResponse::ok(json!({
                "namespace": "Microsoft.Network",
                "registrationState": "Registered"
            }))),
            Method::Delete => match self.store.borrow_mut().remove(&path) {
                Some(_) => Ok(ArmResponse { status: 202, body: None }),
                None => Ok(ArmResponse { status: 204, body: None }),
            },
        }
    }
}

fn scenario(file: &str) -> ScenarioData {
    ScenarioData::load(format!("src/tests/test_data/{file}")).expect("Failed to load scenario")
}

fn options(workflow: WorkflowKind, mode: RunMode) -> RunOptions {
    RunOptions {
        workflow,
        mode,
        teardown: false,
    }
}

/// `type/name` pairs after the provider, e.g. `virtualNetworks/v/subnets/s`.
fn tail(path: &str) -> String {
    if let Some((_, rest)) = path.split_once("/providers/Microsoft.Network/") {
        return rest.to_string();
    }
    let (_, group) = path.rsplit_once("/resourceGroups/").unwrap_or(("", path));
    format!("resourceGroups/{group}")
}

#[tokio::test]
async fn test_express_route_apply_request_order() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_01.json");

    let resources = execute(
        &arm,
        &Settings::default(),
        &data,
        options(WorkflowKind::ExpressRoute, RunMode::Apply),
    )
    .await
    .expect("express route workflow failed");

    let puts: Vec<String> = arm.paths(Method::Put).iter().map(|p| tail(p)).collect();
    assert_eq!(
        puts,
        vec![
            "resourceGroups/pgm-test-rg",
            "expressRouteCircuits/pgm-test-erc",
            "expressRouteCircuits/pgm-test-erc/peerings/AzurePrivatePeering",
            "expressRouteCircuits/pgm-test-erc/authorizations/pgm-test-erc-auth",
            "virtualNetworks/pgm-test-vnet",
            "virtualNetworks/pgm-test-vnet/subnets/GatewaySubnet",
            "virtualNetworks/pgm-test-vnet/subnets/pgm-test-fe-subnet",
            "publicIPAddresses/pgm-test-gw-pip",
            "virtualNetworkGateways/pgm-test-er-gw",
            "connections/pgm-test-er-connection",
        ]
    );
    assert_eq!(resources.len(), 10);
    assert_eq!(resources[0].kind(), Some(ResourceKind::ResourceGroup));
    assert_eq!(resources[9].provisioning_state(), Some("Succeeded"));

    let gateway = arm.put_body("virtualNetworkGateways/pgm-test-er-gw");
    assert_eq!(gateway["properties"]["gatewayType"], "ExpressRoute");
    let ipconf = &gateway["properties"]["ipConfigurations"][0];
    assert_eq!(ipconf["name"], "gwipconf");
    assert!(ipconf["properties"]["subnet"]["id"]
        .as_str()
        .unwrap()
        .ends_with("/subnets/GatewaySubnet"));

    let connection = arm.put_body("connections/pgm-test-er-connection");
    assert!(connection["properties"]["peer"]["id"]
        .as_str()
        .unwrap()
        .ends_with("/expressRouteCircuits/pgm-test-erc"));

    let rg_put = arm
        .sent
        .borrow()
        .iter()
        .find(|r| r.method == Method::Put)
        .cloned()
        .unwrap();
    assert_eq!(rg_put.api_version, "2017-05-10");
}

#[tokio::test]
async fn test_gateway_apply_sends_shared_key_and_bgp() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_01.json");

    let resources = execute(
        &arm,
        &Settings::default(),
        &data,
        options(WorkflowKind::Gateway, RunMode::Apply),
    )
    .await
    .expect("gateway workflow failed");

    assert_eq!(arm.paths(Method::Put).len(), 10);
    assert_eq!(resources.len(), 10);

    let gateway = arm.put_body("virtualNetworkGateways/pgm-test-vpn-gw");
    assert_eq!(gateway["properties"]["vpnType"], "RouteBased");
    assert_eq!(gateway["properties"]["enableBgp"], true);
    assert_eq!(gateway["properties"]["bgpSettings"]["asn"], 65515);
    assert_eq!(gateway["properties"]["sku"]["name"], "HighPerformance");

    let connection = arm.put_body("connections/pgm-test-s2s-connection");
    assert_eq!(connection["properties"]["connectionType"], "IPsec");
    assert_eq!(connection["properties"]["sharedKey"], "test-shared-key");
    let local_gateway = connection["properties"]["localNetworkGateway2"]["id"]
        .as_str()
        .unwrap();
    assert!(local_gateway.contains("/resourceGroups/pgm-test-rg/providers/"));
    assert!(local_gateway.ends_with("/localNetworkGateways/pgm-test-lgw"));
}

#[tokio::test]
async fn test_gateway_shared_key_from_environment_wins() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_01.json");
    let settings = Settings {
        vpn_shared_key: Some("from-env".to_string()),
        ..Settings::default()
    };

    execute(&arm, &settings, &data, options(WorkflowKind::Gateway, RunMode::Apply))
        .await
        .expect("gateway workflow failed");

    let connection = arm.put_body("connections/pgm-test-s2s-connection");
    assert_eq!(connection["properties"]["sharedKey"], "from-env");
}

#[tokio::test]
async fn test_gateway_apply_without_shared_key_sends_nothing() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_02.json");

    let err = execute(
        &arm,
        &Settings::default(),
        &data,
        options(WorkflowKind::Gateway, RunMode::Apply),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Config(ConfigError::MissingEnvVar { .. })
    ));
    assert!(arm.sent.borrow().is_empty());
}

#[tokio::test]
async fn test_load_balancer_apply_references_public_ip() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_01.json");

    let resources = execute(
        &arm,
        &Settings::default(),
        &data,
        options(WorkflowKind::LoadBalancer, RunMode::Apply),
    )
    .await
    .expect("load balancer workflow failed");

    let puts: Vec<String> = arm.paths(Method::Put).iter().map(|p| tail(p)).collect();
    assert_eq!(
        puts,
        vec![
            "resourceGroups/pgm-test-rg",
            "publicIPAddresses/pgm-test-lb-pip",
            "loadBalancers/pgm-test-lb",
        ]
    );
    assert_eq!(resources.len(), 3);

    let pip = arm.put_body("publicIPAddresses/pgm-test-lb-pip");
    assert_eq!(pip["properties"]["publicIPAllocationMethod"], "Static");

    let lb = arm.put_body("loadBalancers/pgm-test-lb");
    let frontend = &lb["properties"]["frontendIPConfigurations"][0];
    assert!(frontend["properties"]["publicIPAddress"]["id"]
        .as_str()
        .unwrap()
        .ends_with("/publicIPAddresses/pgm-test-lb-pip"));
    assert_eq!(lb["properties"]["inboundNatRules"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_apply_registers_network_provider_first() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_01.json");

    execute(
        &arm,
        &Settings::default(),
        &data,
        options(WorkflowKind::LoadBalancer, RunMode::Apply),
    )
    .await
    .expect("load balancer workflow failed");

    let first = arm.sent.borrow()[0].clone();
    assert_eq!(first.method, Method::Post);
    assert_eq!(
        first.path,
        "/subscriptions/00000000-1111-2222-3333-444444444444/providers/Microsoft.Network/register"
    );
    assert_eq!(first.api_version, "2017-05-10");
    assert_eq!(arm.paths(Method::Post).len(), 1);
}

#[tokio::test]
async fn test_dry_run_sends_no_put() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_01.json");

    let resources = execute(
        &arm,
        &Settings::default(),
        &data,
        options(WorkflowKind::Gateway, RunMode::DryRun),
    )
    .await
    .expect("dry-run must not fail on missing resources");

    assert!(resources.is_empty());
    assert!(!arm.sent.borrow().is_empty());
    assert!(arm.sent.borrow().iter().all(|r| r.method == Method::Get));
}

#[tokio::test]
async fn test_dry_run_reports_existing_resources() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_01.json");
    let settings = Settings::default();

    execute(&arm, &settings, &data, options(WorkflowKind::LoadBalancer, RunMode::Apply))
        .await
        .expect("apply failed");
    let puts_before = arm.paths(Method::Put).len();

    let dry_run = options(WorkflowKind::LoadBalancer, RunMode::DryRun);
    let resources = execute(&arm, &settings, &data, dry_run)
        .await
        .expect("dry-run failed");

    assert_eq!(resources.len(), 3);
    assert_eq!(arm.paths(Method::Put).len(), puts_before);
    assert_eq!(resources[2].name(), Some("pgm-test-lb"));
}

#[tokio::test]
async fn test_missing_section_is_reported_before_any_request() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_02.json");

    let err = execute(
        &arm,
        &Settings::default(),
        &data,
        options(WorkflowKind::ExpressRoute, RunMode::Apply),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Scenario data has no `express_route` section, required by the express-route workflow"
    );
    assert!(arm.sent.borrow().is_empty());
}

#[tokio::test]
async fn test_failed_provisioning_names_the_step() {
    let arm = FakeArm::failing_on("publicIPAddresses");
    let data = scenario("scenario_test_data_01.json");

    let err = execute(
        &arm,
        &Settings::default(),
        &data,
        options(WorkflowKind::LoadBalancer, RunMode::Apply),
    )
    .await
    .unwrap_err();

    match err {
        WorkflowError::Step { step, source } => {
            assert_eq!(step, "Creating Public IP Address...");
            assert!(matches!(
                source,
                ArmError::Provisioning { ref state, .. } if state == "Failed"
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(arm.paths(Method::Put).iter().all(|p| !p.contains("loadBalancers")));
}

#[tokio::test]
async fn test_teardown_deletes_dependents_first_and_keeps_group() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_01.json");
    let settings = Settings::default();

    execute(&arm, &settings, &data, options(WorkflowKind::Gateway, RunMode::Apply))
        .await
        .expect("apply failed");

    let teardown = RunOptions {
        teardown: true,
        ..options(WorkflowKind::Gateway, RunMode::Apply)
    };
    let resources = execute(&arm, &settings, &data, teardown)
        .await
        .expect("teardown failed");
    assert!(resources.is_empty());

    let deletes: Vec<String> = arm.paths(Method::Delete).iter().map(|p| tail(p)).collect();
    assert_eq!(deletes.first().unwrap(), "connections/pgm-test-s2s-connection");
    assert_eq!(deletes.last().unwrap(), "virtualNetworks/pgm-test-vnet");
    assert!(deletes.iter().all(|p| !p.starts_with("resourceGroups")));

    let remaining: Vec<String> = arm.store.borrow().keys().map(|p| tail(p)).collect();
    assert_eq!(remaining, vec!["resourceGroups/pgm-test-rg"]);
    // Only the apply run registered the provider.
    assert_eq!(arm.paths(Method::Post).len(), 1);
}

#[tokio::test]
async fn test_teardown_dry_run_deletes_nothing() {
    let arm = FakeArm::default();
    let data = scenario("scenario_test_data_01.json");
    let teardown = RunOptions {
        teardown: true,
        ..options(WorkflowKind::ExpressRoute, RunMode::DryRun)
    };

    execute(&arm, &Settings::default(), &data, teardown)
        .await
        .expect("dry-run teardown failed");

    assert!(arm.sent.borrow().is_empty());
}
