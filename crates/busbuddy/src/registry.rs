//! Schools registry.
//!
//! Maps normalized access codes to school records. The registry itself is
//! pure data; the controller persists a snapshot after every accepted
//! mutation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// A school and the bus routes it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    /// Stable school identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short logo glyph.
    pub logo: String,
    /// Route names in display order. Duplicates are allowed.
    pub routes: Vec<String>,
    /// Name of the school's driver.
    pub driver_name: String,
    /// Access code, set once the school has been verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl School {
    /// Number of routes equal to `name`.
    #[must_use]
    pub fn route_count(&self, name: &str) -> usize {
        self.routes.iter().filter(|r| r.as_str() == name).count()
    }

    /// Whether the school runs a route called `name`.
    #[must_use]
    pub fn has_route(&self, name: &str) -> bool {
        self.routes.iter().any(|r| r == name)
    }
}

/// Trim and upper-case an access code the way lookups expect it.
#[must_use]
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Access code to school mapping.
///
/// Keys are always normalized codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolsRegistry {
    schools: BTreeMap<String, School>,
}

impl SchoolsRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The demo schools the app ships with.
    #[must_use]
    pub fn seed() -> Self {
        let mut registry = Self::new();
        registry.insert(
            "SEL999",
            School {
                id: "S4".to_string(),
                name: "Seoul Global School".to_string(),
                logo: "🌏".to_string(),
                routes: vec![
                    "Gangnam Line".to_string(),
                    "Hannam Shuttle".to_string(),
                    "Mapo Express".to_string(),
                ],
                driver_name: "Kim Bus".to_string(),
                code: None,
            },
        );
        registry.insert(
            "PAE101",
            School {
                id: "S1".to_string(),
                name: "Palo Alto Elementary".to_string(),
                logo: "🏫".to_string(),
                routes: vec!["Route Gold".to_string(), "Route Silver".to_string()],
                driver_name: "John Doe".to_string(),
                code: None,
            },
        );
        registry
    }

    /// Parse a JSON snapshot.
    ///
    /// Keys are normalized on the way in, so snapshots written with
    /// lower-case or padded codes still resolve.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is not a valid registry document.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, School> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (code, school) in raw {
            registry.insert(&code, school);
        }
        Ok(registry)
    }

    /// Serialize the registry to a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Insert or replace a school under `code`.
    pub fn insert(&mut self, code: &str, school: School) {
        self.schools.insert(normalize_code(code), school);
    }

    /// Look up a school by a raw (unnormalized) code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&School> {
        self.schools.get(&normalize_code(code))
    }

    /// Resolve a user-entered code to a verified copy of the school.
    ///
    /// The returned school carries its normalized code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAccessCode`] if no school matches.
    pub fn verify(&self, input: &str) -> Result<School> {
        let code = normalize_code(input);
        match self.schools.get(&code) {
            Some(school) => {
                let mut verified = school.clone();
                verified.code = Some(code);
                Ok(verified)
            }
            None => Err(Error::invalid_access_code(code)),
        }
    }

    /// Append a route to a school.
    ///
    /// Returns `false` without changing anything when the name is blank or
    /// the code is unknown.
    pub fn add_route(&mut self, code: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let Some(school) = self.schools.get_mut(&normalize_code(code)) else {
            return false;
        };
        school.routes.push(name.to_string());
        debug!(school = %school.name, route = name, "route added");
        true
    }

    /// Remove every route equal to `name` from a school.
    ///
    /// Returns `false` when the code is unknown.
    pub fn remove_route(&mut self, code: &str, name: &str) -> bool {
        let name = name.trim();
        let Some(school) = self.schools.get_mut(&normalize_code(code)) else {
            return false;
        };
        let before = school.routes.len();
        school.routes.retain(|r| r != name);
        debug!(
            school = %school.name,
            route = name,
            removed = before - school.routes.len(),
            "route removed"
        );
        true
    }

    /// Iterate over `(code, school)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &School)> {
        self.schools.iter().map(|(code, school)| (code.as_str(), school))
    }

    /// Number of schools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schools.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  sel999 "), "SEL999");
        assert_eq!(normalize_code("Pae101"), "PAE101");
        assert_eq!(normalize_code(""), "");
    }

    #[test]
    fn test_seed_contents() {
        let registry = SchoolsRegistry::seed();
        assert_eq!(registry.len(), 2);

        let seoul = registry.get("SEL999").unwrap();
        assert_eq!(seoul.name, "Seoul Global School");
        assert_eq!(seoul.routes.len(), 3);

        let palo_alto = registry.get("pae101").unwrap();
        assert_eq!(palo_alto.name, "Palo Alto Elementary");
        assert_eq!(palo_alto.routes, vec!["Route Gold", "Route Silver"]);
    }

    #[test]
    fn test_verify_normalizes_and_attaches_code() {
        let registry = SchoolsRegistry::seed();
        let school = registry.verify("sel999 ").unwrap();

        assert_eq!(school.name, "Seoul Global School");
        assert_eq!(school.code.as_deref(), Some("SEL999"));
        // The stored record is untouched
        assert!(registry.get("SEL999").unwrap().code.is_none());
    }

    #[test]
    fn test_verify_unknown_code() {
        let registry = SchoolsRegistry::seed();
        for input in ["", "   ", "SEL998", "pae 101", "XYZ"] {
            let err = registry.verify(input).unwrap_err();
            assert!(err.is_invalid_access_code(), "{input:?}");
        }
    }

    #[test]
    fn test_add_then_remove_restores_routes() {
        let mut registry = SchoolsRegistry::seed();
        let before = registry.get("PAE101").unwrap().routes.clone();

        assert!(registry.add_route("PAE101", "Route Bronze"));
        assert_eq!(registry.get("PAE101").unwrap().routes.len(), before.len() + 1);

        assert!(registry.remove_route("PAE101", "Route Bronze"));
        assert_eq!(registry.get("PAE101").unwrap().routes, before);
    }

    #[test]
    fn test_remove_route_removes_all_duplicates() {
        let mut registry = SchoolsRegistry::seed();
        registry.add_route("SEL999", "X");
        registry.add_route("SEL999", "X");
        assert_eq!(registry.get("SEL999").unwrap().route_count("X"), 2);

        registry.remove_route("SEL999", "X");
        assert_eq!(registry.get("SEL999").unwrap().route_count("X"), 0);
    }

    #[test]
    fn test_add_route_ignores_blank_name() {
        let mut registry = SchoolsRegistry::seed();
        assert!(!registry.add_route("SEL999", ""));
        assert!(!registry.add_route("SEL999", "   "));
        assert_eq!(registry.get("SEL999").unwrap().routes.len(), 3);
    }

    #[test]
    fn test_mutations_ignore_unknown_code() {
        let mut registry = SchoolsRegistry::seed();
        let before = registry.clone();

        assert!(!registry.add_route("NOPE", "Route"));
        assert!(!registry.remove_route("NOPE", "Route Gold"));
        assert_eq!(registry, before);
    }

    #[test]
    fn test_json_uses_prototype_field_names() {
        let json = SchoolsRegistry::seed().to_json().unwrap();
        assert!(json.contains("\"driverName\":\"Kim Bus\""));
        assert!(json.contains("\"SEL999\""));
        assert!(!json.contains("\"code\""));
    }

    #[test]
    fn test_from_json_normalizes_keys() {
        let json = r#"{" abc1 ": {"id": "S9", "name": "Test", "logo": "x", "routes": [], "driverName": "D"}}"#;
        let registry = SchoolsRegistry::from_json(json).unwrap();
        assert!(registry.get("ABC1").is_some());
        assert!(registry.verify("abc1").is_ok());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(SchoolsRegistry::from_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_iter_in_code_order() {
        let registry = SchoolsRegistry::seed();
        let codes: Vec<&str> = registry.iter().map(|(code, _)| code).collect();
        assert_eq!(codes, vec!["PAE101", "SEL999"]);
    }

    #[test]
    fn test_route_names_are_trimmed() {
        let mut registry = SchoolsRegistry::seed();
        assert!(registry.add_route("SEL999", "  Night Owl "));
        assert_eq!(registry.get("SEL999").unwrap().routes.last().unwrap(), "Night Owl");

        assert!(registry.remove_route("SEL999", "Night Owl  "));
        assert!(!registry.get("SEL999").unwrap().has_route("Night Owl"));
    }
}
