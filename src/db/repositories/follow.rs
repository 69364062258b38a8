use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::collections::{HashMap, HashSet};

use crate::entities::{follows, prelude::*, users};

pub struct FollowRepository {
    conn: DatabaseConnection,
}

impl FollowRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let count = Follows::find()
            .filter(follows::Column::UserId.eq(user_id))
            .filter(follows::Column::AuthorId.eq(author_id))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, user_id: i32, author_id: i32) -> Result<()> {
        Follows::insert(follows::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            ..Default::default()
        })
        .exec(&self.conn)
        .await?;
        Ok(())
    }

    /// Returns false when the edge did not exist.
    pub async fn delete(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let result = Follows::delete_many()
            .filter(follows::Column::UserId.eq(user_id))
            .filter(follows::Column::AuthorId.eq(author_id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// The subset of `author_ids` that `user_id` follows.
    pub async fn followed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = Follows::find()
            .select_only()
            .column(follows::Column::AuthorId)
            .filter(follows::Column::UserId.eq(user_id))
            .filter(follows::Column::AuthorId.is_in(author_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(ids.into_iter().collect())
    }

    /// Authors followed by `user_id`, most recent follow first, plus the total.
    pub async fn authors_page(
        &self,
        user_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<users::Model>, u64)> {
        let paginator = Follows::find()
            .filter(follows::Column::UserId.eq(user_id))
            .order_by_desc(follows::Column::Id)
            .paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let edges = paginator.fetch_page(page.saturating_sub(1)).await?;

        let author_ids: Vec<i32> = edges.iter().map(|f| f.author_id).collect();
        let mut authors: HashMap<i32, users::Model> = Users::find()
            .filter(users::Column::Id.is_in(author_ids.iter().copied()))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let ordered = author_ids
            .into_iter()
            .filter_map(|id| authors.remove(&id))
            .collect();

        Ok((ordered, total))
    }
}
