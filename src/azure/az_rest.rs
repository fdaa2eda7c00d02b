//! Transport that goes through `az rest`.
//!
//! Authentication and cloud selection belong to the Azure CLI session
//! (`az login`, `az cloud set`), so nothing secret passes through here.

use super::cli;
use super::cloud::Cloud;
use super::transport::{decode_body, ArmRequest, ArmResponse, ArmTransport, Method};
use crate::error::{ArmError, ArmResult};
use regex::Regex;
use std::sync::OnceLock;

/// `az rest` failure text: `Not Found({"error": ...})`.
static AZ_REST_ERROR_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_error_regex() -> &'static Regex {
    AZ_REST_ERROR_REGEX.get_or_init(|| {
        Regex::new(r#"(?s)([A-Z][A-Za-z ]+?)\((\{.*\})\)"#).expect("Invalid Regex")
    })
}

/// Sends ARM requests with the Azure CLI.
#[derive(Debug, Clone, Default)]
pub struct AzCliTransport {
    /// Program to run, normally `az`.
    program: String,
}

impl AzCliTransport {
    pub fn new() -> Self {
        AzCliTransport {
            program: "az".to_string(),
        }
    }

    /// Build the argument vector for one request.
    pub fn command_args(&self, request: &ArmRequest) -> Vec<String> {
        let mut args = vec![
            self.program.clone(),
            "rest".to_string(),
            "--method".to_string(),
            request.method.as_str().to_lowercase(),
            "--url".to_string(),
            request.path_and_query(),
            "--output".to_string(),
            "json".to_string(),
        ];
        if let Some(body) = &request.body {
            args.push("--body".to_string());
            args.push(body.to_string());
        }
        args
    }

    /// Cloud the CLI session is logged in to, as `az cloud show` names it.
    pub fn current_cloud(&self) -> Result<String, Box<dyn std::error::Error>> {
        let out = cli::run(&format!("{} cloud show --query name --output tsv", self.program))?;
        Ok(out.trim().to_string())
    }

    /// Warn when the CLI session points at another cloud than `expected`.
    pub fn check_cloud(&self, expected: Cloud) -> bool {
        match self.current_cloud() {
            Ok(name) if cloud_matches(&name, expected) => true,
            Ok(name) => {
                log::warn!(
                    "az cli is set to cloud {name}, expected {expected}; \
                     run `az cloud set --name {expected}`"
                );
                false
            }
            Err(e) => {
                log::warn!("could not read az cli cloud: {e}");
                false
            }
        }
    }
}

impl ArmTransport for AzCliTransport {
    async fn send(&self, request: ArmRequest) -> ArmResult<ArmResponse> {
        let args = self.command_args(&request);
        log::debug!("az rest {} {}", request.method, request.path);

        let result = tokio::task::spawn_blocking(move || {
            cli::run_args(&args).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| ArmError::Transport(format!("az rest task failed: {e}")))?;

        match result {
            Ok(stdout) => {
                let body = decode_body(&stdout)?;
                let status = match (request.method, &body) {
                    (Method::Delete, None) => 204,
                    _ => 200,
                };
                Ok(ArmResponse { status, body })
            }
            Err(stderr) => error_response(&stderr),
        }
    }
}

/// True when `active`, as printed by `az cloud show`, names `expected`.
fn cloud_matches(active: &str, expected: Cloud) -> bool {
    active.parse::<Cloud>().is_ok_and(|cloud| cloud == expected)
}

/// Rebuild an ARM response from the CLI's error text so the operations layer
/// sees the same shape as from the REST transport.
fn error_response(stderr: &str) -> ArmResult<ArmResponse> {
    let Some(caps) = get_error_regex().captures(stderr) else {
        return Err(ArmError::Transport(stderr.trim().to_string()));
    };
    let reason = caps[1].trim();
    let status = status_from_reason(reason);
    let body = serde_json::from_str(&caps[2]).ok();
    log::debug!("az rest answered {status} {reason}");
    Ok(ArmResponse { status, body })
}

fn status_from_reason(reason: &str) -> u16 {
    match reason {
        "Bad Request" => 400,
        "Unauthorized" => 401,
        "Forbidden" => 403,
        "Not Found" => 404,
        "Conflict" => 409,
        "Precondition Failed" => 412,
        "Too Many Requests" => 429,
        "Service Unavailable" => 503,
        _ => 500,
    }
}
