//! Typed user profile.
//!
//! Built once from the provider's claims during the identity exchange, so
//! handlers never look claims up by name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Profile claims of the authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Provider subject identifier (`sub`).
    pub user_id: String,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,

    /// Avatar URL.
    #[serde(default)]
    pub picture: Option<String>,

    /// Professional headline.
    #[serde(default)]
    pub headline: Option<String>,

    /// Public profile URL.
    #[serde(default)]
    pub profile_url: Option<String>,

    /// Every other claim the provider returned.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Profile {
    /// Create a profile with only the subject identifier.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the avatar URL.
    #[must_use]
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    /// A profile is empty when it carries no subject.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_id.trim().is_empty()
    }

    /// Display name, falling back to the email and then the subject.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.user_id)
    }
}
