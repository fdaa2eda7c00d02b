//! Resource Manager JSON envelope and shared building blocks.
//!
//! The same types serve as request bodies and decoded responses: read-only
//! fields are `Option` and left out of the JSON when unset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// `{ id, name, type, location, sku, tags, properties }` envelope.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(bound(
    serialize = "P: Serialize + Default + PartialEq",
    deserialize = "P: Deserialize<'de> + Default"
))]
pub struct ArmResource<P> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub properties: P,
}

impl<P: Default> ArmResource<P> {
    /// Request body for a top-level resource.
    pub fn located(location: &str, properties: P) -> Self {
        ArmResource {
            location: Some(location.to_string()),
            properties,
            ..Default::default()
        }
    }

    /// Request body for a named sub-resource (IP configuration, probe, rule ...).
    pub fn named(name: &str, properties: P) -> Self {
        ArmResource {
            name: Some(name.to_string()),
            properties,
            ..Default::default()
        }
    }

    /// Request body for a child resource created on its own URL (subnet, peering ...).
    pub fn bare(properties: P) -> Self {
        ArmResource {
            properties,
            ..Default::default()
        }
    }

    pub fn with_sku(mut self, sku: Sku) -> Self {
        self.sku = Some(sku);
        self
    }

    pub fn name_or_blank(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Reference to another resource by ID.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SubResource {
    pub id: String,
}

impl SubResource {
    pub fn new(id: impl ToString) -> Self {
        SubResource { id: id.to_string() }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Sku {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl Sku {
    pub fn new(name: &str, tier: &str) -> Self {
        Sku {
            name: Some(name.to_string()),
            tier: Some(tier.to_string()),
            ..Default::default()
        }
    }

    pub fn with_family(mut self, family: &str) -> Self {
        self.family = Some(family.to_string());
        self
    }
}

impl std::fmt::Display for Sku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<&str> = [&self.name, &self.tier, &self.family]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        f.write_str(&parts.join("/"))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

impl AddressSpace {
    pub fn new(prefixes: &[String]) -> Self {
        AddressSpace {
            address_prefixes: prefixes.to_vec(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DhcpOptions {
    #[serde(default)]
    pub dns_servers: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BgpSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgp_peering_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_weight: Option<u32>,
}
