use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of `POST /api/groups`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateGroupCommand {
    pub name: String,
    pub budget: f64,
    /// ISO 8601 datetime.
    pub end_date: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub budget: f64,
    pub end_date: String,
    pub creator_id: String,
    #[serde(default)]
    pub is_drawn: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Response of `POST /api/groups/:id/draw/validate`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawValidation {
    pub valid: bool,
    pub participants_count: u32,
    pub exclusions_count: u32,
    pub message: String,
    /// Only present when validation fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Response of `POST /api/groups/:id/draw`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResult {
    pub success: bool,
    pub message: String,
    pub group_id: i64,
    pub drawn_at: String,
    pub participants_notified: u32,
}

/// Body of `POST /api/auth/register`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCommand")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub user: Option<AuthUser>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Register body as sent on the wire, with the email trimmed.
#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordResetRequest<'a> {
    pub email: &'a str,
}

/// Plain `{ "message": ... }` success body.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response of `POST /api/participants/:id/reveal`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RevealTracking {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `GET /api/participants/:id/elf-result`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElfResult {
    pub assignment: ElfAssignment,
    pub group: ElfGroup,
    pub helped_participant: HelpedParticipant,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElfAssignment {
    pub receiver_name: String,
    #[serde(default)]
    pub receiver_wishlist: Option<String>,
    #[serde(default)]
    pub receiver_wishlist_html: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElfGroup {
    pub id: i64,
    pub name: String,
    pub budget: f64,
    pub end_date: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HelpedParticipant {
    pub id: i64,
    pub name: String,
}
