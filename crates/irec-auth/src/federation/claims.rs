//! ID token claims and their mapping to a [`Profile`].
//!
//! The ID token arrives over the back channel directly from the token
//! endpoint, so its signature is not checked. Issuer, audience and expiry
//! are validated by `jsonwebtoken`; the nonce is checked against the login.

use std::collections::BTreeMap;
use std::time::Duration;

use jsonwebtoken::{DecodingKey, Validation, decode_header};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::IdpError;
use crate::session::Profile;

/// Claim names accepted for the professional headline.
const HEADLINE_CLAIMS: &[&str] = &["headline", "Headline"];

/// Claim names accepted for the public profile URL.
const PROFILE_URL_CLAIMS: &[&str] = &["publicProfileUrl", "profile_url", "profileURL", "ProfileURL", "profile"];

/// OIDC ID token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer identifier.
    pub iss: String,

    /// Subject identifier.
    pub sub: String,

    /// Audience (string or array).
    #[serde(deserialize_with = "deserialize_audience")]
    pub aud: Vec<String>,

    /// Expiration time (Unix timestamp).
    #[serde(default)]
    pub exp: Option<i64>,

    /// Issued at time (Unix timestamp).
    #[serde(default)]
    pub iat: Option<i64>,

    /// Nonce value.
    #[serde(default)]
    pub nonce: Option<String>,

    /// User's full name.
    #[serde(default)]
    pub name: Option<String>,

    /// User's email address.
    #[serde(default)]
    pub email: Option<String>,

    /// URL of user's profile picture.
    #[serde(default)]
    pub picture: Option<String>,

    /// Extra claims not defined in the struct.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl IdTokenClaims {
    /// Decodes an ID token and validates issuer, audience and expiry.
    ///
    /// Issuers are compared without a trailing slash. `leeway` is the clock
    /// skew allowed on `exp`.
    ///
    /// # Errors
    ///
    /// Returns `IdpError::JwtError` if the token is malformed, expired, or
    /// was issued by or for someone else.
    pub fn decode(
        id_token: &str,
        issuer: &str,
        client_id: &str,
        leeway: Duration,
    ) -> Result<Self, IdpError> {
        let header = decode_header(id_token)?;
        let issuer = issuer.trim_end_matches('/');

        let mut validation = Validation::new(header.alg);
        validation.insecure_disable_signature_validation();
        validation.set_audience(&[client_id]);
        validation.set_issuer(&[issuer.to_string(), format!("{issuer}/")]);
        validation.leeway = leeway.as_secs();

        // The key is never consulted with signature validation disabled.
        let token_data =
            jsonwebtoken::decode::<Self>(id_token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(token_data.claims)
    }

    /// Checks the nonce against the one sent with the login.
    ///
    /// # Errors
    ///
    /// Returns `IdpError::NonceMismatch` if the nonce is missing or differs.
    pub fn verify_nonce(&self, nonce: &str) -> Result<(), IdpError> {
        match self.nonce.as_deref() {
            Some(token_nonce) if crate::oauth::constant_time_eq(token_nonce, nonce) => Ok(()),
            _ => Err(IdpError::NonceMismatch),
        }
    }

    /// Expiry as a timestamp, if the token carries a valid `exp`.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.exp
            .and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
    }

    /// Merges userinfo claims. Claims already present in the ID token win.
    pub fn merge_userinfo(&mut self, userinfo: serde_json::Value) {
        let serde_json::Value::Object(map) = userinfo else {
            return;
        };
        for (key, value) in map {
            match key.as_str() {
                "sub" | "iss" | "aud" | "exp" | "iat" | "nonce" => {}
                "name" => fill(&mut self.name, value),
                "email" => fill(&mut self.email, value),
                "picture" => fill(&mut self.picture, value),
                _ => {
                    self.extra.entry(key).or_insert(value);
                }
            }
        }
    }

    /// Builds the typed profile.
    #[must_use]
    pub fn into_profile(self) -> Profile {
        let mut extra = self.extra;
        let headline = take_first_string(&mut extra, HEADLINE_CLAIMS);
        let profile_url = take_first_string(&mut extra, PROFILE_URL_CLAIMS);

        Profile {
            user_id: self.sub,
            name: self.name,
            email: self.email,
            picture: self.picture,
            headline,
            profile_url,
            extra,
        }
    }
}

fn fill(slot: &mut Option<String>, value: serde_json::Value) {
    if slot.is_none() {
        if let serde_json::Value::String(s) = value {
            *slot = Some(s);
        }
    }
}

fn take_first_string(
    claims: &mut BTreeMap<String, serde_json::Value>,
    names: &[&str],
) -> Option<String> {
    let mut found = None;
    for name in names {
        if let Some(value) = claims.remove(*name) {
            if found.is_none() {
                if let serde_json::Value::String(s) = value {
                    found = Some(s);
                }
            }
        }
    }
    found
}

/// Custom deserializer for audience which can be a string or array.
fn deserialize_audience<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => Ok(vec![s]),
        OneOrMany::Many(v) => Ok(v),
    }
}
