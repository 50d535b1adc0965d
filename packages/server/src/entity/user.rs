use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status line assigned to freshly signed-up accounts.
pub const DEFAULT_STATUS: &str = "I am new!";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub password: String,

    /// Free-text presence line shown next to the user's feed.
    pub status: String,

    #[sea_orm(has_many)]
    pub posts: HasMany<super::post::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
