use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
    sea_query::{Expr, Query, SelectStatement},
};
use std::collections::HashSet;

use crate::entities::{favorites, shopping_cart};

/// The two per-user recipe lists backed by a (user, recipe) join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    /// `SELECT recipe_id FROM <list> WHERE user_id = ?`
    #[must_use]
    pub fn members_query(self, user_id: i32) -> SelectStatement {
        match self {
            Self::Favorites => Query::select()
                .column((favorites::Entity, favorites::Column::RecipeId))
                .from(favorites::Entity)
                .and_where(Expr::col((favorites::Entity, favorites::Column::UserId)).eq(user_id))
                .to_owned(),
            Self::ShoppingCart => Query::select()
                .column((shopping_cart::Entity, shopping_cart::Column::RecipeId))
                .from(shopping_cart::Entity)
                .and_where(
                    Expr::col((shopping_cart::Entity, shopping_cart::Column::UserId)).eq(user_id),
                )
                .to_owned(),
        }
    }
}

pub struct MembershipRepository {
    conn: DatabaseConnection,
}

impl MembershipRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn contains(&self, list: RecipeList, user_id: i32, recipe_id: i32) -> Result<bool> {
        let count = match list {
            RecipeList::Favorites => {
                favorites::Entity::find()
                    .filter(favorites::Column::UserId.eq(user_id))
                    .filter(favorites::Column::RecipeId.eq(recipe_id))
                    .count(&self.conn)
                    .await?
            }
            RecipeList::ShoppingCart => {
                shopping_cart::Entity::find()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .count(&self.conn)
                    .await?
            }
        };

        Ok(count > 0)
    }

    pub async fn add(&self, list: RecipeList, user_id: i32, recipe_id: i32) -> Result<()> {
        match list {
            RecipeList::Favorites => {
                favorites::Entity::insert(favorites::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    ..Default::default()
                })
                .exec(&self.conn)
                .await?;
            }
            RecipeList::ShoppingCart => {
                shopping_cart::Entity::insert(shopping_cart::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                    ..Default::default()
                })
                .exec(&self.conn)
                .await?;
            }
        }

        Ok(())
    }

    /// Returns false when there was nothing to remove.
    pub async fn remove(&self, list: RecipeList, user_id: i32, recipe_id: i32) -> Result<bool> {
        let result = match list {
            RecipeList::Favorites => {
                favorites::Entity::delete_many()
                    .filter(favorites::Column::UserId.eq(user_id))
                    .filter(favorites::Column::RecipeId.eq(recipe_id))
                    .exec(&self.conn)
                    .await?
            }
            RecipeList::ShoppingCart => {
                shopping_cart::Entity::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(&self.conn)
                    .await?
            }
        };

        Ok(result.rows_affected > 0)
    }

    /// The subset of `recipe_ids` that is on the user's list.
    pub async fn recipe_ids_among(
        &self,
        list: RecipeList,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = match list {
            RecipeList::Favorites => {
                favorites::Entity::find()
                    .select_only()
                    .column(favorites::Column::RecipeId)
                    .filter(favorites::Column::UserId.eq(user_id))
                    .filter(favorites::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                    .into_tuple()
                    .all(&self.conn)
                    .await?
            }
            RecipeList::ShoppingCart => {
                shopping_cart::Entity::find()
                    .select_only()
                    .column(shopping_cart::Column::RecipeId)
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                    .into_tuple()
                    .all(&self.conn)
                    .await?
            }
        };

        Ok(ids.into_iter().collect())
    }
}
