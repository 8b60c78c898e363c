//! OpenAPI security scheme definitions.
//!
//! Schemes are documented only. Nothing here enforces authentication; routes
//! that need it add their own middleware.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name of the scheme used when none are configured.
pub const DEFAULT_SCHEME_NAME: &str = "bearerAuth";

/// A security scheme as it appears under `components.securitySchemes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "http", rename_all = "camelCase")]
    Http {
        scheme: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
        #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
        location: Option<ApiKeyLocation>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "oauth2")]
    OAuth2 {
        flows: OAuthFlows,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "openIdConnect", rename_all = "camelCase")]
    OpenIdConnect {
        open_id_connect_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Query,
    Header,
    Cookie,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,
}

/// Security schemes keyed by scheme name, kept in declaration order.
///
/// The order is the one operations list their requirements in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecuritySchemes {
    entries: Vec<(String, SecurityScheme)>,
}

impl SecuritySchemes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scheme at the end, or replace an existing one in place.
    pub fn insert(&mut self, name: String, scheme: SecurityScheme) -> Option<SecurityScheme> {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, scheme)),
            None => {
                self.entries.push((name, scheme));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&SecurityScheme> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(n, _)| n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SecurityScheme)> {
        self.entries.iter().map(|(n, s)| (n, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Index<&str> for SecuritySchemes {
    type Output = SecurityScheme;

    fn index(&self, name: &str) -> &SecurityScheme {
        match self.get(name) {
            Some(scheme) => scheme,
            None => panic!("no security scheme named '{name}'"),
        }
    }
}

impl<N: Into<String>> FromIterator<(N, SecurityScheme)> for SecuritySchemes {
    fn from_iter<I: IntoIterator<Item = (N, SecurityScheme)>>(iter: I) -> Self {
        let mut schemes = Self::new();
        for (name, scheme) in iter {
            schemes.insert(name.into(), scheme);
        }
        schemes
    }
}

impl Serialize for SecuritySchemes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, scheme) in &self.entries {
            map.serialize_entry(name, scheme)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SecuritySchemes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemesVisitor;

        impl<'de> Visitor<'de> for SchemesVisitor {
            type Value = SecuritySchemes;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of security schemes")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut schemes = SecuritySchemes::new();
                while let Some((name, scheme)) = access.next_entry::<String, SecurityScheme>()? {
                    schemes.insert(name, scheme);
                }
                Ok(schemes)
            }
        }

        deserializer.deserialize_map(SchemesVisitor)
    }
}

impl SecurityScheme {
    /// `{ type: http, scheme: bearer, bearerFormat: JWT, in: header }`
    pub fn bearer_auth() -> Self {
        SecurityScheme::Http {
            scheme: "bearer".to_string(),
            bearer_format: Some("JWT".to_string()),
            location: Some(ApiKeyLocation::Header),
            description: None,
        }
    }

    pub fn api_key(name: impl Into<String>, location: ApiKeyLocation) -> Self {
        SecurityScheme::ApiKey {
            name: name.into(),
            location,
            description: None,
        }
    }
}

pub fn default_security_schemes() -> SecuritySchemes {
    let mut schemes = SecuritySchemes::new();
    schemes.insert(DEFAULT_SCHEME_NAME.to_string(), SecurityScheme::bearer_auth());
    schemes
}

/// The configured schemes, or the `bearerAuth` default when none (or an empty
/// map) are configured.
pub fn resolve_security_schemes(configured: Option<&SecuritySchemes>) -> SecuritySchemes {
    match configured {
        Some(schemes) if !schemes.is_empty() => schemes.clone(),
        _ => default_security_schemes(),
    }
}
