//! Signed-in identity models.

use serde::{Deserialize, Serialize};

/// The identity reported by the session gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl Identity {
    /// First word of the display name, shown in the user badge.
    pub fn first_name(&self) -> &str {
        self.display_name
            .split_whitespace()
            .next()
            .unwrap_or_default()
    }
}

/// Request body for signing in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Response returned after a successful sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub token: String,
    pub identity: Identity,
    pub first_name: String,
}

impl SessionInfo {
    pub fn new(token: String, identity: Identity) -> Self {
        let first_name = identity.first_name().to_string();
        Self {
            token,
            identity,
            first_name,
        }
    }
}
