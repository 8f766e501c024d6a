use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Decompose,
    Options,
    Summary,
    /// Backend root liveness route.
    Health,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Decompose => "decompose",
            Endpoint::Options => "options",
            Endpoint::Summary => "summary",
            Endpoint::Health => "health",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Request body shared by all three endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreRequest {
    pub text: String,
    pub user_context: String,
    /// Accepted by the backend but always sent empty by the client.
    pub selected_options: Vec<String>,
}

impl ExploreRequest {
    pub fn new(text: impl Into<String>, user_context: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_context: user_context.into(),
            selected_options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecomposeResponse {
    pub sub_problems: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsResponse {
    #[serde(default)]
    pub recommended: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
