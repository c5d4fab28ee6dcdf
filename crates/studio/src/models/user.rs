use serde::{Deserialize, Serialize};

use fitting_room_core::UserId;

/// The caller, as resolved from their access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    /// Used to prefill checkout.
    pub email: Option<String>,
}
