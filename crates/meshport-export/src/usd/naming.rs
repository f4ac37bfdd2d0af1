//! USD prim naming
//!
//! Prim names must match `[A-Za-z_][A-Za-z0-9_]*` and be unique among
//! siblings. Source assets routinely break both rules.

use std::collections::HashSet;

/// Map an arbitrary name onto a valid USD identifier
pub fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    match out.chars().next() {
        None => out.push('_'),
        Some(c) if c.is_ascii_digit() => out.insert(0, '_'),
        _ => {}
    }

    out
}

/// Hands out unique identifiers within one parent prim
#[derive(Debug, Default)]
pub struct NameScope {
    used: HashSet<String>,
}

impl NameScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope with names that are already taken
    pub fn with_reserved(names: &[&str]) -> Self {
        Self {
            used: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Sanitize `name` and suffix it until it is unused
    pub fn claim(&mut self, name: &str) -> String {
        let base = sanitize_identifier(name);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_identifier("Hull Paint"), "Hull_Paint");
        assert_eq!(sanitize_identifier("3d-model.001"), "_3d_model_001");
        assert_eq!(sanitize_identifier(""), "_");
        assert_eq!(sanitize_identifier("Ünïcode"), "_n_code");
        assert_eq!(sanitize_identifier("already_ok"), "already_ok");
    }

    #[test]
    fn test_claim_deduplicates() {
        let mut scope = NameScope::new();
        assert_eq!(scope.claim("Mesh"), "Mesh");
        assert_eq!(scope.claim("Mesh"), "Mesh_1");
        assert_eq!(scope.claim("Mesh"), "Mesh_2");
        assert_eq!(scope.claim("Mesh 1"), "Mesh_1_1");
    }

    #[test]
    fn test_reserved_names() {
        let mut scope = NameScope::with_reserved(&["Materials"]);
        assert_eq!(scope.claim("Materials"), "Materials_1");
    }

    proptest! {
        #[test]
        fn test_sanitized_is_identifier(name in ".*") {
            let id = sanitize_identifier(&name);
            let mut chars = id.chars();
            let first = chars.next().unwrap();
            prop_assert!(first.is_ascii_alphabetic() || first == '_');
            prop_assert!(chars.all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }

        #[test]
        fn test_claims_are_unique(names in prop::collection::vec("[a-z ]{0,4}", 1..32)) {
            let mut scope = NameScope::new();
            let claimed: Vec<_> = names.iter().map(|n| scope.claim(n)).collect();
            let unique: HashSet<_> = claimed.iter().collect();
            prop_assert_eq!(unique.len(), claimed.len());
        }
    }
}
