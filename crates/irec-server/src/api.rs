//! Backend REST API models and request forms.
//!
//! Field names follow the backend's JSON (lower-case, `profileURL`). Every
//! field defaults, so partial documents decode.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use irec_auth::Profile;

/// Backend user type of a referrer.
pub const USER_TYPE_REFERRER: u8 = 1;

/// An open position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub idpositions: Uuid,
    pub iduser: String,
    pub title: String,
    pub subtitle: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub enddate: Option<OffsetDateTime>,
    pub reward: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub lastupdated: Option<OffsetDateTime>,
    pub href: String,
    pub meta: String,
}

/// A registered user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub iduser: String,
    pub usertype: i32,
    pub name: String,
    pub telephone: String,
    pub mail: String,
    pub picture: String,
    pub headline: String,
    #[serde(rename = "profileURL")]
    pub profile_url: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub lastupdated: Option<OffsetDateTime>,
    pub href: String,
    pub meta: String,
}

impl User {
    /// The backend answers an unknown user with an empty record.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        !self.iduser.is_empty()
    }
}

/// A person recommended for a position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Referral {
    #[serde(rename = "idreferral")]
    pub idreferrals: Uuid,
    pub referraluserid: String,
    pub name: String,
    pub telephone: String,
    pub mail: String,
    pub picture: String,
    pub headline: String,
    #[serde(rename = "profileURL")]
    pub profile_url: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub lastupdated: Option<OffsetDateTime>,
    pub href: String,
    pub meta: String,
}

/// A recommendation of a referral for a position, made by a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    pub idrecommendations: Uuid,
    pub user: Option<User>,
    pub referral: Option<Referral>,
    pub position: Option<Position>,
    pub text: String,
    pub confirmed: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub lastupdated: Option<OffsetDateTime>,
    pub href: String,
    pub meta: String,
}

/// Registration form posted by the browser; accepts both spellings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationInput {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Telephone")]
    pub telephone: String,
    #[serde(alias = "Mail")]
    pub mail: String,
    #[serde(alias = "Headline")]
    pub headline: String,
    #[serde(alias = "ProfileURL", alias = "profileURL")]
    pub profile_url: String,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserForm {
    #[serde(rename = "IdUser")]
    pub id_user: String,
    #[serde(rename = "UserType")]
    pub user_type: u8,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Telephone")]
    pub telephone: String,
    #[serde(rename = "Mail")]
    pub mail: String,
    #[serde(rename = "Headline")]
    pub headline: String,
    #[serde(rename = "ProfileURL")]
    pub profile_url: String,
    #[serde(rename = "Picture")]
    pub picture: String,
}

impl UserForm {
    /// Registers the profile's user with the submitted details. Blank
    /// headline and profile URL fall back to the provider profile.
    #[must_use]
    pub fn new(input: RegistrationInput, profile: &Profile) -> Self {
        let or_profile = |value: String, fallback: &Option<String>| {
            if value.trim().is_empty() {
                fallback.clone().unwrap_or_default()
            } else {
                value
            }
        };

        Self {
            id_user: profile.user_id.clone(),
            user_type: USER_TYPE_REFERRER,
            name: input.name,
            telephone: input.telephone,
            mail: input.mail,
            headline: or_profile(input.headline, &profile.headline),
            profile_url: or_profile(input.profile_url, &profile.profile_url),
            picture: profile.picture.clone().unwrap_or_default(),
        }
    }
}

/// Recommendation form: the posted contact details of the referral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationForm {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Telephone", alias = "telephone")]
    pub telephone: String,
    #[serde(rename = "Mail", alias = "mail")]
    pub mail: String,
}
