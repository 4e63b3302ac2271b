use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenStatus {
    Active,
    Disabled,
    Maintenance,
}

impl Default for ScreenStatus {
    fn default() -> Self {
        ScreenStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: String,
    pub node_id: String,
    pub name: String,
    #[serde(default)]
    pub status: ScreenStatus,
}

impl Screen {
    pub fn is_active(&self) -> bool {
        matches!(self.status, ScreenStatus::Active)
    }
}
