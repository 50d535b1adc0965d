use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::post;

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Composite index for owner listings:
    // SELECT ... FROM post WHERE user_id = ? ORDER BY created_at DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_post_user_created")
        .table(post::Entity)
        .col(post::Column::UserId)
        .col(post::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    let result = db.execute_unprepared(&stmt).await;

    match result {
        Ok(_) => {
            info!("Ensured index idx_post_user_created exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_post_user_created: {}", e);
        }
    }

    Ok(())
}
