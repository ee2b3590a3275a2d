use serde::{Deserialize, Serialize};

use crate::auth::SessionToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "user_id")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Session token returned by the federated login endpoint.
    /// Moved into the session store right after login; never sent back out.
    #[serde(default, skip_serializing)]
    pub access_token: Option<SessionToken>,
}

impl User {
    /// Move the login token out of the user, leaving the field empty.
    pub fn take_access_token(&mut self) -> Option<SessionToken> {
        self.access_token.take()
    }

    /// Name for greetings, falling back to the id when the server sent none
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("user #{}", self.id)
        } else {
            self.name.clone()
        }
    }
}
