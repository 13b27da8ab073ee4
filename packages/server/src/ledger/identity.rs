use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::LedgerError;
use crate::entity::user;

/// Local accounts, one per external identity.
#[derive(Clone)]
pub struct IdentityStore {
    db: DatabaseConnection,
}

impl IdentityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_external_id(
        &self,
        github_id: &str,
    ) -> Result<Option<user::Model>, LedgerError> {
        Ok(user::Entity::find()
            .filter(user::Column::GithubId.eq(github_id))
            .one(&self.db)
            .await?)
    }

    /// Create the account on first login, otherwise refresh the display name
    /// and last-login time.
    ///
    /// A single `INSERT ... ON CONFLICT (github_id) DO UPDATE`, so two
    /// concurrent first logins for the same identity converge on one row.
    pub async fn upsert(&self, github_id: &str, username: &str) -> Result<user::Model, LedgerError> {
        let now = Utc::now();
        let model = user::ActiveModel {
            github_id: Set(github_id.to_string()),
            username: Set(username.to_string()),
            last_login: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let user = user::Entity::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::GithubId)
                    .update_columns([
                        user::Column::Username,
                        user::Column::LastLogin,
                        user::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await?;

        Ok(user)
    }
}
