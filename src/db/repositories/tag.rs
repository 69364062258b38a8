use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
};
use std::collections::HashMap;

use crate::entities::{prelude::*, recipe_tags, tags};
use crate::models::tag::TagSeed;

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<tags::Model>> {
        Ok(Tags::find()
            .order_by_asc(tags::Column::Id)
            .all(&self.conn)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<Option<tags::Model>> {
        Ok(Tags::find_by_id(id).one(&self.conn).await?)
    }

    /// Ids from `ids` that have no tag row.
    pub async fn missing_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        let found: Vec<i32> = Tags::find()
            .select_only()
            .column(tags::Column::Id)
            .filter(tags::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }

    /// Tags of each recipe in `recipe_ids`, ordered by tag id.
    pub async fn for_recipes(&self, recipe_ids: &[i32]) -> Result<HashMap<i32, Vec<tags::Model>>> {
        let rows: Vec<(i32, i32, String, String, String)> = RecipeTags::find()
            .select_only()
            .column(recipe_tags::Column::RecipeId)
            .column(tags::Column::Id)
            .column(tags::Column::Name)
            .column(tags::Column::Color)
            .column(tags::Column::Slug)
            .join(JoinType::InnerJoin, recipe_tags::Relation::Tag.def())
            .filter(recipe_tags::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(tags::Column::Id)
            .into_tuple()
            .all(&self.conn)
            .await?;

        let mut by_recipe: HashMap<i32, Vec<tags::Model>> = HashMap::new();
        for (recipe_id, id, name, color, slug) in rows {
            by_recipe.entry(recipe_id).or_default().push(tags::Model {
                id,
                name,
                color,
                slug,
            });
        }

        Ok(by_recipe)
    }

    /// Inserts seeds whose slug is not taken yet. Returns how many were added.
    pub async fn insert_missing(&self, seeds: Vec<TagSeed>) -> Result<usize> {
        let mut added = 0;

        for seed in seeds {
            let exists = Tags::find()
                .filter(tags::Column::Slug.eq(&seed.slug))
                .one(&self.conn)
                .await?
                .is_some();
            if exists {
                continue;
            }

            Tags::insert(tags::ActiveModel {
                name: Set(seed.name),
                color: Set(seed.color),
                slug: Set(seed.slug),
                ..Default::default()
            })
            .exec(&self.conn)
            .await?;
            added += 1;
        }

        Ok(added)
    }
}
