use sea_orm::entity::prelude::*;

#[derive(Clone, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// One of `admin`, `data_scientist`, `user`; see [`crate::models::user::Role`]
    pub role: String,

    /// Argon2id PHC string; never the plaintext key
    pub credential_hash: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("credential_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_credential_hash() {
        let model = Model {
            id: 7,
            username: "alice".to_string(),
            role: "user".to_string(),
            credential_hash: "$argon2id$v=19$m=64,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        };

        let rendered = format!("{model:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("argon2id"));
    }
}
