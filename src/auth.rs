/// Credential handling for the upstream model API
use std::fmt;

/// The bearer token presented to the upstream API.
///
/// Read once at startup and never rotated. The `Debug` impl is redacted so the
/// token can't leak through the startup config log.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Builds a token from a raw configuration value. Blank values are treated as
    /// absent, the same as an unset environment variable; anything else is kept
    /// exactly as given.
    pub fn from_config_value(value: Option<String>) -> Option<Self> {
        value.filter(|v| !v.trim().is_empty()).map(Self)
    }

    /// The value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl From<String> for BearerToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}
