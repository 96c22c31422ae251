//! Caller identity and the authorization gate consulted before every mutation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};

/// Opaque identity of a caller as resolved by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(TallyError::InvalidPrincipal(id));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Principal {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self> {
        Principal::new(s)
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Decides whether `caller` may mutate a record owned by `owner`.
pub trait AuthorizationPolicy {
    fn authorize(&self, owner: &Principal, caller: &Principal) -> bool;
}

/// Single immutable owner per record: only the creator may mutate it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreatorOnly;

impl AuthorizationPolicy for CreatorOnly {
    fn authorize(&self, owner: &Principal, caller: &Principal) -> bool {
        owner == caller
    }
}

impl<P: AuthorizationPolicy + ?Sized> AuthorizationPolicy for &P {
    fn authorize(&self, owner: &Principal, caller: &Principal) -> bool {
        (**self).authorize(owner, caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATOR: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
    const OTHER: &str = "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG";

    #[test]
    fn test_principal_trims_and_rejects_empty() {
        assert_eq!(Principal::new("  alice ").unwrap().as_str(), "alice");
        assert!(matches!(
            Principal::new("   "),
            Err(TallyError::InvalidPrincipal(_))
        ));
        assert!("".parse::<Principal>().is_err());
    }

    #[test]
    fn test_creator_only() {
        let creator = Principal::new(CREATOR).unwrap();
        let other = Principal::new(OTHER).unwrap();

        assert!(CreatorOnly.authorize(&creator, &creator));
        assert!(!CreatorOnly.authorize(&creator, &other));
    }

    #[test]
    fn test_principal_serializes_as_plain_string() {
        let p = Principal::new(CREATOR).unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), format!("\"{}\"", CREATOR));
    }
}
