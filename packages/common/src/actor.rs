use serde::{Deserialize, Serialize};

/// The authenticated user performing a create or activate operation.
///
/// Identity is established upstream; the registry records it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Actor {
    #[schema(example = "u1")]
    pub id: String,
    #[schema(example = "alice")]
    pub username: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }

    /// Actor used for records written by the service itself (startup seeding).
    pub fn system() -> Self {
        Self::new("system", "system")
    }
}
