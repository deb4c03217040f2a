//! Testing utilities for the navlayer workspace
//!
//! Shared fixtures: a small enterprise framework bundle and sample layers.

#![allow(missing_docs)]

use navlayer_model::{Annotation, Domain, LayerDocument};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

pub const BUNDLE_ID: &str = "bundle--navlayer-fixture";

/// Fixture tactics in declared order: `(id, short name, display name)`
pub const TACTICS: &[(&str, &str, &str)] = &[
    ("TA0001", "initial-access", "Initial Access"),
    ("TA0003", "persistence", "Persistence"),
    ("TA0006", "credential-access", "Credential Access"),
    ("TA0040", "impact", "Impact"),
];

/// Fixture techniques: `(id, name, tactics)`
///
/// Sub-techniques inherit their parent's tactics.
pub const TECHNIQUES: &[(&str, &str, &[&str])] = &[
    ("T1078", "Valid Accounts", &["initial-access", "persistence"]),
    ("T1078.001", "Default Accounts", &["initial-access", "persistence"]),
    ("T1078.003", "Local Accounts", &["initial-access", "persistence"]),
    ("T1566", "Phishing", &["initial-access"]),
    ("T1566.001", "Spearphishing Attachment", &["initial-access"]),
    ("T1566.002", "Spearphishing Link", &["initial-access"]),
    ("T1190", "Exploit Public-Facing Application", &["initial-access"]),
    ("T1098", "Account Manipulation", &["persistence"]),
    ("T1136", "Create Account", &["persistence"]),
    ("T1136.001", "Local Account", &["persistence"]),
    ("T1110", "Brute Force", &["credential-access"]),
    ("T1110.001", "Password Guessing", &["credential-access"]),
    ("T1110.002", "Password Cracking", &["credential-access"]),
    ("T1110.003", "Password Spraying", &["credential-access"]),
    ("T1110.004", "Credential Stuffing", &["credential-access"]),
    ("T1003", "OS Credential Dumping", &["credential-access"]),
    ("T1003.001", "LSASS Memory", &["credential-access"]),
    ("T1555", "Credentials from Password Stores", &["credential-access"]),
];

fn external_ref(id: &str) -> Value {
    json!([{
        "source_name": "mitre-attack",
        "external_id": id,
        "url": format!("https://attack.mitre.org/{}", id.replace('.', "/"))
    }])
}

pub fn tactic_object(id: &str, short: &str, name: &str) -> Value {
    json!({
        "type": "x-mitre-tactic",
        "id": format!("x-mitre-tactic--{}", id.to_lowercase()),
        "name": name,
        "x_mitre_shortname": short,
        "external_references": external_ref(id)
    })
}

pub fn attack_pattern(id: &str, name: &str, kill_chain: &str, tactics: &[&str]) -> Value {
    let phases: Vec<Value> = tactics
        .iter()
        .map(|t| json!({"kill_chain_name": kill_chain, "phase_name": t}))
        .collect();
    json!({
        "type": "attack-pattern",
        "id": format!("attack-pattern--{}", id.to_lowercase().replace('.', "-")),
        "name": name,
        "kill_chain_phases": phases,
        "external_references": external_ref(id),
        "x_mitre_is_subtechnique": id.contains('.')
    })
}

/// Enterprise bundle with four tactics (the last one empty), plus a revoked,
/// a deprecated and a mobile-only technique that must never appear
pub fn enterprise_bundle() -> Value {
    let mut objects: Vec<Value> = Vec::new();
    objects.push(json!({
        "type": "x-mitre-matrix",
        "id": "x-mitre-matrix--enterprise",
        "name": "Enterprise ATT&CK",
        "tactic_refs": TACTICS
            .iter()
            .map(|(id, _, _)| format!("x-mitre-tactic--{}", id.to_lowercase()))
            .collect::<Vec<_>>(),
        "external_references": [{"source_name": "mitre-attack", "external_id": "enterprise-attack"}]
    }));
    // declared out of order on purpose; matrix order comes from tactic_refs
    for (id, short, name) in TACTICS.iter().rev() {
        objects.push(tactic_object(id, short, name));
    }
    for (id, name, tactics) in TECHNIQUES {
        objects.push(attack_pattern(id, name, "mitre-attack", tactics));
    }

    let mut revoked = attack_pattern("T1208", "Kerberoasting", "mitre-attack", &["credential-access"]);
    revoked["revoked"] = json!(true);
    objects.push(revoked);

    let mut deprecated = attack_pattern("T1054", "Indicator Blocking", "mitre-attack", &["persistence"]);
    deprecated["x_mitre_deprecated"] = json!(true);
    objects.push(deprecated);

    objects.push(attack_pattern(
        "T1411",
        "Input Prompt",
        "mitre-mobile-attack",
        &["credential-access"],
    ));

    json!({
        "type": "bundle",
        "id": BUNDLE_ID,
        "spec_version": "2.0",
        "objects": objects
    })
}

pub fn enterprise_bundle_json() -> String {
    enterprise_bundle().to_string()
}

/// Display name of a fixture technique
pub fn technique_name(id: &str) -> &'static str {
    TECHNIQUES
        .iter()
        .find(|(tid, _, _)| *tid == id)
        .map(|(_, name, _)| *name)
        .unwrap_or_else(|| panic!("no fixture technique {id}"))
}

/// Pre-4.0 layer using the single version string and legacy domain name
pub fn legacy_layer_v3() -> Value {
    json!({
        "name": "legacy triage",
        "version": "3.0",
        "domain": "mitre-enterprise",
        "description": "written by an old navigator",
        "filters": {"stages": ["act"], "platforms": ["Windows", "Linux"]},
        "sorting": 0,
        "hideDisabled": false,
        "techniques": [
            {"techniqueID": "T1110", "tactic": "credential-access", "score": 3, "comment": "seen twice"},
            {"techniqueID": "T1078", "color": "#e60d0d", "enabled": true}
        ],
        "gradient": {"colors": ["#ff6666", "#ffe766", "#8ec843"], "minValue": 0, "maxValue": 100},
        "legendItems": [{"label": "high", "color": "#ff6666"}],
        "showTacticRowBackground": false,
        "tacticRowBackground": "#dddddd",
        "selectTechniquesAcrossTactics": true
    })
}

/// Current-format layer exercising every top-level field
pub fn full_layer() -> Value {
    json!({
        "name": "full",
        "versions": {"layer": "4.1", "attack": "8", "navigator": "4.1"},
        "domain": "enterprise-attack",
        "description": "every field",
        "filters": {"platforms": ["Windows", "macOS"]},
        "sorting": 3,
        "layout": {"layout": "side", "showName": true, "showID": false},
        "hideDisabled": true,
        "techniques": [
            {
                "techniqueID": "T1110",
                "tactic": "credential-access",
                "score": 10,
                "color": "#aabbcc",
                "comment": "spraying observed",
                "enabled": true,
                "showSubtechniques": true,
                "metadata": [{"name": "source", "value": "ir-42"}, {"divider": true}]
            },
            {"techniqueID": "T1003.001", "score": 2.5}
        ],
        "gradient": {"colors": ["#ff0000", "#00ff00"], "minValue": 0, "maxValue": 10},
        "legendItems": [{"label": "seen", "color": "#ff0000"}],
        "showTacticRowBackground": true,
        "tacticRowBackground": "#205b8f",
        "selectTechniquesAcrossTactics": false,
        "selectSubtechniquesWithParent": true,
        "metadata": [{"name": "owner", "value": "detection team"}]
    })
}

/// Layer scoring `T1078` differently per tactic
pub fn per_tactic_layer() -> LayerDocument {
    LayerDocument::new("per tactic", Domain::Enterprise)
        .with_gradient(
            navlayer_model::Gradient::new(&["#ff0000", "#00ff00"], 0, 10).unwrap_or_else(|e| panic!("{e}")),
        )
        .with_annotation(Annotation::new("T1078").with_tactic("initial-access").with_score(0.0))
        .with_annotation(Annotation::new("T1078").with_tactic("persistence").with_score(10.0))
}

/// Layer expanding `T1110` in credential access
pub fn brute_force_layer() -> LayerDocument {
    LayerDocument::new("brute force", Domain::Enterprise).with_annotation(
        Annotation::new("T1110")
            .with_tactic("credential-access")
            .with_subtechniques_shown(true),
    )
}

/// Temporary directory holding named fixture files
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}")),
        }
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap_or_else(|e| panic!("write {name}: {e}"));
        path
    }

    pub fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        self.write(name, &value.to_string())
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for FixtureDir {
    fn default() -> Self {
        Self::new()
    }
}
