use serde::{Deserialize, Serialize};

/// A user's membership in a project or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    /// GitLab reports the member's user id as `id`.
    #[serde(rename = "id")]
    pub user_id: u64,
    pub access_level: u8,
}

impl MembershipRecord {
    pub fn meets(&self, threshold: u8) -> bool {
        self.access_level >= threshold
    }
}
