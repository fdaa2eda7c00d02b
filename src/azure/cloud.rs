//! Azure cloud environments and their endpoints.

use std::fmt;
use std::str::FromStr;

/// A sovereign Azure cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Cloud {
    /// Azure public cloud.
    Public,
    /// Azure US Government.
    #[value(name = "usgov")]
    UsGovernment,
    /// Azure China (21Vianet).
    China,
    /// Azure Germany.
    Germany,
}

impl Cloud {
    /// Resource Manager endpoint, without trailing slash.
    pub fn resource_manager(&self) -> &'static str {
        match self {
            Cloud::Public => "https://management.azure.com",
            Cloud::UsGovernment => "https://management.usgovcloudapi.net",
            Cloud::China => "https://management.chinacloudapi.cn",
            Cloud::Germany => "https://management.microsoftazure.de",
        }
    }

    /// Active Directory authority host used to mint tokens.
    pub fn authority_host(&self) -> &'static str {
        match self {
            Cloud::Public => "https://login.microsoftonline.com",
            Cloud::UsGovernment => "https://login.microsoftonline.us",
            Cloud::China => "https://login.chinacloudapi.cn",
            Cloud::Germany => "https://login.microsoftonline.de",
        }
    }

    /// OAuth scope for Resource Manager tokens.
    pub fn scope(&self) -> String {
        format!("{}/.default", self.resource_manager())
    }

    /// Name used by `az cloud set --name`.
    pub fn az_cli_name(&self) -> &'static str {
        match self {
            Cloud::Public => "AzureCloud",
            Cloud::UsGovernment => "AzureUSGovernment",
            Cloud::China => "AzureChinaCloud",
            Cloud::Germany => "AzureGermanCloud",
        }
    }
}

impl FromStr for Cloud {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" | "azurecloud" => Ok(Cloud::Public),
            "usgov" | "usgovernment" | "azureusgovernment" => Ok(Cloud::UsGovernment),
            "china" | "azurechinacloud" => Ok(Cloud::China),
            "germany" | "azuregermancloud" => Ok(Cloud::Germany),
            other => Err(format!("Unknown cloud: {other}")),
        }
    }
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.az_cli_name())
    }
}
