/// Authenticated client identity, carried by a session for logging
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Auth {
    /// The authenticated client identifier (API secret id or JWT subject)
    #[serde(default)]
    pub id: Option<String>,
}

impl Auth {
    /// Create a new Auth with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
        }
    }

    /// Create an empty Auth (no id)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Name used in greetings and logs
    pub fn display_name(&self) -> &str {
        self.id.as_deref().unwrap_or("anonymous")
    }
}
