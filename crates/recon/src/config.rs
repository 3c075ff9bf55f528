use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Column names, match semantics and collision suffixes for one resolve run.
///
/// Every field has a default, so an empty TOML document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveOptions {
    /// Registration column holding the plate (dedup key).
    pub plate_column: String,
    /// Registration column holding the free-text address.
    pub address_column: String,
    /// Locality column holding the locality name.
    pub locality_column: String,
    pub match_mode: MatchMode,
    pub suffixes: Suffixes,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            plate_column: "no_polisi".into(),
            address_column: "full_address".into(),
            locality_column: "kelurahan".into(),
            match_mode: MatchMode::default(),
            suffixes: Suffixes::default(),
        }
    }
}

/// How a locality name is tested against a registration address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The locality name appears anywhere in the address (case-sensitive).
    #[default]
    Contains,
    /// The address equals the locality name.
    Exact,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contains => write!(f, "contains"),
            Self::Exact => write!(f, "exact"),
        }
    }
}

/// Appended to a column name present in both inputs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Suffixes {
    pub registration: String,
    pub locality: String,
}

impl Default for Suffixes {
    fn default() -> Self {
        Self {
            registration: "_dr".into(),
            locality: "_mk".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ResolveOptions {
    pub fn from_toml(input: &str) -> Result<Self, ResolveError> {
        let options: ResolveOptions =
            toml::from_str(input).map_err(|e| ResolveError::ConfigParse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        for (field, value) in [
            ("plate_column", &self.plate_column),
            ("address_column", &self.address_column),
            ("locality_column", &self.locality_column),
        ] {
            if value.trim().is_empty() {
                return Err(ResolveError::ConfigValidation(format!("{field} must not be empty")));
            }
        }

        if self.suffixes.registration.is_empty() || self.suffixes.locality.is_empty() {
            return Err(ResolveError::ConfigValidation(
                "collision suffixes must not be empty".into(),
            ));
        }
        if self.suffixes.registration == self.suffixes.locality {
            return Err(ResolveError::ConfigValidation(format!(
                "registration and locality suffixes are both '{}'",
                self.suffixes.registration
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let options = ResolveOptions::from_toml("").unwrap();
        assert_eq!(options, ResolveOptions::default());
        assert_eq!(options.plate_column, "no_polisi");
        assert_eq!(options.address_column, "full_address");
        assert_eq!(options.locality_column, "kelurahan");
        assert_eq!(options.match_mode, MatchMode::Contains);
        assert_eq!(options.suffixes.registration, "_dr");
        assert_eq!(options.suffixes.locality, "_mk");
    }

    #[test]
    fn parse_full_document() {
        let input = r#"
plate_column = "plate"
address_column = "address"
locality_column = "locality"
match_mode = "exact"

[suffixes]
registration = "_reg"
locality = "_loc"
"#;
        let options = ResolveOptions::from_toml(input).unwrap();
        assert_eq!(options.plate_column, "plate");
        assert_eq!(options.match_mode, MatchMode::Exact);
        assert_eq!(options.suffixes.registration, "_reg");
        assert_eq!(options.suffixes.locality, "_loc");
    }

    #[test]
    fn partial_suffixes_keep_other_default() {
        let options = ResolveOptions::from_toml("[suffixes]\nlocality = \"_x\"\n").unwrap();
        assert_eq!(options.suffixes.registration, "_dr");
        assert_eq!(options.suffixes.locality, "_x");
    }

    #[test]
    fn rejects_unknown_match_mode() {
        let err = ResolveOptions::from_toml("match_mode = \"like\"").unwrap_err();
        assert!(matches!(err, ResolveError::ConfigParse(_)));
    }

    #[test]
    fn rejects_unknown_field() {
        let err = ResolveOptions::from_toml("plate = \"x\"").unwrap_err();
        assert!(matches!(err, ResolveError::ConfigParse(_)));
    }

    #[test]
    fn rejects_blank_column() {
        let err = ResolveOptions::from_toml("address_column = \"  \"").unwrap_err();
        match err {
            ResolveError::ConfigValidation(msg) => assert!(msg.contains("address_column")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_identical_suffixes() {
        let input = "[suffixes]\nregistration = \"_x\"\nlocality = \"_x\"\n";
        let err = ResolveOptions::from_toml(input).unwrap_err();
        assert!(matches!(err, ResolveError::ConfigValidation(_)));
    }
}
