//! Scope definitions and claim projection.
//!
//! Each configured scope maps to an ordered list of claim rules. A rule
//! takes one LDAP attribute and shapes it into one OIDC claim of a declared
//! JSON type. Projection is deterministic for a given configuration and
//! attribute map.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON shape of a projected claim value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimKind {
    /// First attribute value as a JSON string.
    #[serde(rename = "string")]
    String,

    /// All attribute values as a JSON array of strings.
    #[serde(rename = "[]string")]
    StringList,

    /// First attribute value parsed as a JSON number.
    #[serde(rename = "number")]
    Number,

    /// First attribute value parsed as a JSON boolean.
    #[serde(rename = "bool")]
    Bool,
}

impl ClaimKind {
    /// Shapes raw attribute values into a claim value.
    ///
    /// Returns `None` when the claim must be omitted: no values, an empty
    /// list, or a failed number/boolean parse. A parse failure never fails
    /// the whole projection.
    #[must_use]
    pub fn project(self, values: &[String]) -> Option<Value> {
        let first = values.first()?;
        match self {
            Self::String => Some(Value::String(first.clone())),
            Self::StringList => Some(Value::Array(
                values.iter().cloned().map(Value::String).collect(),
            )),
            Self::Number => {
                if let Ok(n) = first.parse::<i64>() {
                    Some(Value::Number(n.into()))
                } else {
                    first
                        .parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                }
            }
            Self::Bool => first.parse::<bool>().ok().map(Value::Bool),
        }
    }
}

/// One claim projection rule: LDAP attribute in, OIDC claim out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRule {
    /// Claim name in the token or userinfo response.
    pub claim: String,

    /// LDAP attribute the value is read from.
    pub attribute: String,

    /// JSON shape of the claim value.
    #[serde(rename = "type")]
    pub kind: ClaimKind,
}

/// Scope definitions: scope name to ordered claim rules.
///
/// The `openid` scope is implicit. It is always supported and always
/// resolves to the `sub` claim, independent of this table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeConfig(pub BTreeMap<String, Vec<ClaimRule>>);

impl Default for ScopeConfig {
    fn default() -> Self {
        fn rule(claim: &str, attribute: &str, kind: ClaimKind) -> ClaimRule {
            ClaimRule {
                claim: claim.to_string(),
                attribute: attribute.to_string(),
                kind,
            }
        }

        let mut scopes = BTreeMap::new();
        scopes.insert(
            "profile".to_string(),
            vec![
                rule("name", "displayName", ClaimKind::String),
                rule("given_name", "givenName", ClaimKind::String),
                rule("family_name", "sn", ClaimKind::String),
            ],
        );
        scopes.insert(
            "email".to_string(),
            vec![rule("email", "mail", ClaimKind::String)],
        );
        scopes.insert(
            "phone".to_string(),
            vec![rule("phone_number", "telephoneNumber", ClaimKind::String)],
        );
        scopes.insert(
            "groups".to_string(),
            vec![rule("groups", "memberOf", ClaimKind::StringList)],
        );
        Self(scopes)
    }
}

impl ScopeConfig {
    /// Whether a requested scope is known. `openid` always is.
    #[must_use]
    pub fn is_known(&self, scope: &str) -> bool {
        scope == "openid" || self.0.contains_key(scope)
    }

    /// All configured scope names, without the implicit `openid`.
    #[must_use]
    pub fn scope_names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// All claim names across every configured scope, deduplicated.
    #[must_use]
    pub fn all_claims(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut claims = Vec::new();
        for rules in self.0.values() {
            for rule in rules {
                if seen.insert(rule.claim.as_str()) {
                    claims.push(rule.claim.clone());
                }
            }
        }
        claims
    }

    /// LDAP attributes needed to serve the given scopes, deduplicated.
    #[must_use]
    pub fn attributes_for(&self, scopes: &BTreeSet<String>) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut attributes = Vec::new();
        for (scope, rules) in &self.0 {
            if !scopes.contains(scope) {
                continue;
            }
            for rule in rules {
                if seen.insert(rule.attribute.as_str()) {
                    attributes.push(rule.attribute.clone());
                }
            }
        }
        attributes
    }

    /// Projects raw attributes into a claim map for the given scopes.
    ///
    /// Rules apply in declaration order within each scope; only scopes in
    /// the intersection of `scopes` and the configuration contribute. The
    /// `sub` claim is injected last and overwrites any mapped `sub`.
    #[must_use]
    pub fn claims_for(
        &self,
        scopes: &BTreeSet<String>,
        attributes: &HashMap<String, Vec<String>>,
        subject: &str,
    ) -> Map<String, Value> {
        let mut claims = Map::new();
        for (scope, rules) in &self.0 {
            if !scopes.contains(scope) {
                continue;
            }
            for rule in rules {
                let values = attributes.get(&rule.attribute).map_or(&[][..], Vec::as_slice);
                if let Some(value) = rule.kind.project(values) {
                    claims.insert(rule.claim.clone(), value);
                }
            }
        }
        claims.insert("sub".to_string(), Value::String(subject.to_string()));
        claims
    }
}
