//! Host-asserted capability declarations for the admin gate.
//!
//! The fronting host authenticates the operator and forwards the user id and
//! capability names. This module only parses and checks them.

use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Capability required by every admin route unless configured otherwise.
pub const DEFAULT_REQUIRED_CAPABILITY: &str = "manage_options";
/// User id assumed when the host forwards none.
pub const ANONYMOUS_USER: &str = "anonymous";

const MAX_CAPABILITY_LEN: usize = 64;
const MAX_USER_LEN: usize = 128;

/// One capability name such as `manage_options`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capability(String);

impl Capability {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses one capability name.
///
/// Names are lowercase `[a-z0-9_]`, at most 64 bytes. Surrounding whitespace
/// is ignored; case is not folded.
pub fn parse_capability(value: &str) -> Result<Capability, CapabilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(CapabilityError::EmptyCapability);
    }
    let well_formed = normalized.len() <= MAX_CAPABILITY_LEN
        && normalized
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if !well_formed {
        return Err(CapabilityError::InvalidCapability(normalized.to_string()));
    }
    Ok(Capability(normalized.to_string()))
}

/// Parses a comma-separated capability header value.
///
/// Returns the valid capabilities and the rejected entries separately so the
/// caller can log the latter.
pub fn parse_capability_list(value: &str) -> (Vec<Capability>, Vec<CapabilityError>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for entry in value.split(',') {
        if entry.trim().is_empty() {
            continue;
        }
        match parse_capability(entry) {
            Ok(capability) => {
                if !accepted.contains(&capability) {
                    accepted.push(capability);
                }
            }
            Err(err) => rejected.push(err),
        }
    }
    (accepted, rejected)
}

/// Capability parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    EmptyCapability,
    InvalidCapability(String),
}

impl Display for CapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCapability => write!(f, "capability value must not be empty"),
            Self::InvalidCapability(value) => write!(f, "capability is malformed: {value}"),
        }
    }
}

impl Error for CapabilityError {}

/// The operator behind one request, as asserted by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    user: String,
    capabilities: Vec<Capability>,
}

impl AdminPrincipal {
    /// Builds a principal from raw header values.
    ///
    /// Missing or blank user ids become [`ANONYMOUS_USER`]; overlong ids are
    /// truncated. Malformed capability entries are dropped.
    pub fn from_host_values(user: Option<&str>, capabilities: Option<&str>) -> Self {
        let user = user
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(
                || ANONYMOUS_USER.to_string(),
                |value| value.chars().take(MAX_USER_LEN).collect(),
            );
        let (capabilities, rejected) = capabilities
            .map(parse_capability_list)
            .unwrap_or_default();
        if !rejected.is_empty() {
            warn!(
                "event=capability_parse module=security status=rejected count={}",
                rejected.len()
            );
        }
        Self { user, capabilities }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn has_capability(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_capability, parse_capability_list, AdminPrincipal, CapabilityError,
        ANONYMOUS_USER, DEFAULT_REQUIRED_CAPABILITY,
    };

    #[test]
    fn parses_well_formed_capabilities() {
        let capability = parse_capability(" manage_options ").expect("capability parse");
        assert_eq!(capability.as_str(), DEFAULT_REQUIRED_CAPABILITY);
        assert_eq!(parse_capability("edit_posts2").expect("parse").as_str(), "edit_posts2");
    }

    #[test]
    fn rejects_empty_capability() {
        let err = parse_capability("   ").expect_err("empty capability must fail");
        assert_eq!(err, CapabilityError::EmptyCapability);
    }

    #[test]
    fn rejects_non_lowercase_or_punctuated_capabilities() {
        for value in ["Manage_Options", "manage-options", "manage options"] {
            let err = parse_capability(value).expect_err("malformed capability must fail");
            assert_eq!(err, CapabilityError::InvalidCapability(value.to_string()));
        }
    }

    #[test]
    fn capability_list_skips_blanks_dedups_and_reports_rejects() {
        let (accepted, rejected) =
            parse_capability_list("read, manage_options,,read , BAD-ONE");
        let names: Vec<&str> = accepted.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["read", "manage_options"]);
        assert_eq!(
            rejected,
            vec![CapabilityError::InvalidCapability("BAD-ONE".to_string())]
        );
    }

    #[test]
    fn principal_defaults_to_anonymous_without_capabilities() {
        let principal = AdminPrincipal::from_host_values(None, None);
        assert_eq!(principal.user(), ANONYMOUS_USER);
        assert!(principal.capabilities().is_empty());

        let blank = AdminPrincipal::from_host_values(Some("  "), Some(""));
        assert_eq!(blank.user(), ANONYMOUS_USER);
    }

    #[test]
    fn principal_checks_required_capability() {
        let required = parse_capability(DEFAULT_REQUIRED_CAPABILITY).expect("parse");
        let admin = AdminPrincipal::from_host_values(Some("alice"), Some("read,manage_options"));
        let reader = AdminPrincipal::from_host_values(Some("bob"), Some("read"));
        assert!(admin.has_capability(&required));
        assert!(!reader.has_capability(&required));
        assert_eq!(admin.user(), "alice");
    }
}
