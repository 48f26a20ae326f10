use serde::{Deserialize, Serialize};

/// One record from the project document feed.
///
/// The feed carries many more fields per project; only the two text fields
/// the models train on are kept, and either may be absent. Values arrive
/// HTML-encoded and are decoded by the corpus layer before feeding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub elevator_pitch: Option<String>,
}
