//! Fixed per-domain taxonomy
//!
//! Valid platform names, tactic short-name ↔ display-name pairs and the
//! technique identifier shape. Consulted by layer validation and by column
//! tactic matching in the matrix.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every technique identifier
pub const TECHNIQUE_PREFIX: &str = "T";

static TECHNIQUE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^T\d{4}(\.\d{3})?$").expect("static technique id pattern"));

/// Framework domain a layer is written against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    /// Enterprise matrix
    #[serde(rename = "enterprise-attack")]
    Enterprise,
    /// Mobile matrix
    #[serde(rename = "mobile-attack")]
    Mobile,
}

/// Tactic short name with its display name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TacticName {
    /// Kill-chain phase name (`credential-access`)
    pub short: &'static str,
    /// Display name (`Credential Access`)
    pub display: &'static str,
}

const fn tactic(short: &'static str, display: &'static str) -> TacticName {
    TacticName { short, display }
}

const ENTERPRISE_TACTICS: &[TacticName] = &[
    tactic("reconnaissance", "Reconnaissance"),
    tactic("resource-development", "Resource Development"),
    tactic("initial-access", "Initial Access"),
    tactic("execution", "Execution"),
    tactic("persistence", "Persistence"),
    tactic("privilege-escalation", "Privilege Escalation"),
    tactic("defense-evasion", "Defense Evasion"),
    tactic("credential-access", "Credential Access"),
    tactic("discovery", "Discovery"),
    tactic("lateral-movement", "Lateral Movement"),
    tactic("collection", "Collection"),
    tactic("command-and-control", "Command and Control"),
    tactic("exfiltration", "Exfiltration"),
    tactic("impact", "Impact"),
];

const MOBILE_TACTICS: &[TacticName] = &[
    tactic("initial-access", "Initial Access"),
    tactic("execution", "Execution"),
    tactic("persistence", "Persistence"),
    tactic("privilege-escalation", "Privilege Escalation"),
    tactic("defense-evasion", "Defense Evasion"),
    tactic("credential-access", "Credential Access"),
    tactic("discovery", "Discovery"),
    tactic("lateral-movement", "Lateral Movement"),
    tactic("collection", "Collection"),
    tactic("command-and-control", "Command and Control"),
    tactic("exfiltration", "Exfiltration"),
    tactic("impact", "Impact"),
    tactic("network-effects", "Network Effects"),
    tactic("remote-service-effects", "Remote Service Effects"),
];

const ENTERPRISE_PLATFORMS: &[&str] = &[
    "Windows",
    "Linux",
    "macOS",
    "AWS",
    "GCP",
    "Azure",
    "Azure AD",
    "Office 365",
    "SaaS",
    "IaaS",
    "Google Workspace",
    "Network",
    "Containers",
    "PRE",
];

const MOBILE_PLATFORMS: &[&str] = &["Android", "iOS"];

impl Domain {
    /// All supported domains
    pub const ALL: [Domain; 2] = [Domain::Enterprise, Domain::Mobile];

    /// Canonical name used in layer files
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enterprise => "enterprise-attack",
            Self::Mobile => "mobile-attack",
        }
    }

    /// Kill chain whose phases define this domain's tactics
    #[inline]
    #[must_use]
    pub fn kill_chain_name(self) -> &'static str {
        match self {
            Self::Enterprise => "mitre-attack",
            Self::Mobile => "mitre-mobile-attack",
        }
    }

    /// Valid platform filter values
    #[inline]
    #[must_use]
    pub fn platforms(self) -> &'static [&'static str] {
        match self {
            Self::Enterprise => ENTERPRISE_PLATFORMS,
            Self::Mobile => MOBILE_PLATFORMS,
        }
    }

    /// Tactics in framework order
    #[inline]
    #[must_use]
    pub fn tactics(self) -> &'static [TacticName] {
        match self {
            Self::Enterprise => ENTERPRISE_TACTICS,
            Self::Mobile => MOBILE_TACTICS,
        }
    }

    /// Display name for a tactic short name
    #[must_use]
    pub fn tactic_display_name(self, short: &str) -> Option<&'static str> {
        self.tactics()
            .iter()
            .find(|t| t.short == short)
            .map(|t| t.display)
    }

    /// Short name for a tactic display name
    #[must_use]
    pub fn tactic_short_name(self, display: &str) -> Option<&'static str> {
        self.tactics()
            .iter()
            .find(|t| t.display == display)
            .map(|t| t.short)
    }

    /// Map a pre-v4 domain name (`mitre-enterprise`) to its domain
    #[must_use]
    pub fn from_legacy(name: &str) -> Option<Self> {
        match name {
            "mitre-enterprise" => Some(Self::Enterprise),
            "mitre-mobile" => Some(Self::Mobile),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enterprise-attack" => Ok(Self::Enterprise),
            "mobile-attack" => Ok(Self::Mobile),
            other => Err(format!(
                "'{other}' is not one of enterprise-attack, mobile-attack"
            )),
        }
    }
}

/// Check the technique identifier shape (`T1234` or `T1234.001`)
#[inline]
#[must_use]
pub fn is_technique_id(id: &str) -> bool {
    TECHNIQUE_ID.is_match(id)
}

/// Parent of a sub-technique id (`T1110.001` → `T1110`)
#[inline]
#[must_use]
pub fn parent_id(id: &str) -> Option<&str> {
    id.split_once('.').map(|(parent, _)| parent)
}
