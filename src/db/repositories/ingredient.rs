use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
    sea_query::{LikeExpr, OnConflict},
};
use std::collections::HashMap;

use crate::entities::{ingredients, prelude::*, recipe_ingredients};
use crate::models::tag::IngredientSeed;

/// An ingredient as it appears inside one recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

pub struct IngredientRepository {
    conn: DatabaseConnection,
}

impl IngredientRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// All ingredients ordered by name. When `name_prefix` is given only
    /// names starting with it (case-insensitively) are kept.
    ///
    /// SQLite's `LIKE` only folds ASCII, so an ASCII prefix is narrowed in
    /// SQL while any other prefix scans the table and is matched here.
    pub async fn list(&self, name_prefix: Option<&str>) -> Result<Vec<ingredients::Model>> {
        let prefix = name_prefix
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_lowercase);

        let mut query = Ingredients::find()
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(ingredients::Column::Id);

        if let Some(prefix) = prefix.as_deref().filter(|p| p.is_ascii()) {
            query = query.filter(
                ingredients::Column::Name.like(LikeExpr::new(like_prefix(prefix)).escape('\\')),
            );
        }

        let all = query.all(&self.conn).await?;

        Ok(match prefix {
            Some(prefix) => all
                .into_iter()
                .filter(|i| name_starts_with(&i.name, &prefix))
                .collect(),
            None => all,
        })
    }

    pub async fn get(&self, id: i32) -> Result<Option<ingredients::Model>> {
        Ok(Ingredients::find_by_id(id).one(&self.conn).await?)
    }

    /// Ids from `ids` that have no ingredient row.
    pub async fn missing_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        let found: Vec<i32> = Ingredients::find()
            .select_only()
            .column(ingredients::Column::Id)
            .filter(ingredients::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }

    /// Ingredient lines of each recipe in `recipe_ids`, in insertion order.
    pub async fn for_recipes(
        &self,
        recipe_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<IngredientLine>>> {
        let rows: Vec<(i32, i32, String, String, i32)> = RecipeIngredients::find()
            .select_only()
            .column(recipe_ingredients::Column::RecipeId)
            .column(ingredients::Column::Id)
            .column(ingredients::Column::Name)
            .column(ingredients::Column::MeasurementUnit)
            .column(recipe_ingredients::Column::Amount)
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredient.def(),
            )
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(recipe_ingredients::Column::Id)
            .into_tuple()
            .all(&self.conn)
            .await?;

        let mut by_recipe: HashMap<i32, Vec<IngredientLine>> = HashMap::new();
        for (recipe_id, id, name, measurement_unit, amount) in rows {
            by_recipe.entry(recipe_id).or_default().push(IngredientLine {
                id,
                name,
                measurement_unit,
                amount,
            });
        }

        Ok(by_recipe)
    }

    /// Inserts seeds, skipping (name, unit) pairs that already exist.
    pub async fn import(&self, seeds: Vec<IngredientSeed>) -> Result<usize> {
        let before = self.count().await?;

        for chunk in seeds.chunks(500) {
            let models = chunk.iter().map(|seed| ingredients::ActiveModel {
                name: Set(seed.name.trim().to_string()),
                measurement_unit: Set(seed.measurement_unit.trim().to_string()),
                ..Default::default()
            });

            Ingredients::insert_many(models)
                .on_conflict(
                    OnConflict::columns([
                        ingredients::Column::Name,
                        ingredients::Column::MeasurementUnit,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .do_nothing()
                .exec(&self.conn)
                .await?;
        }

        let after = self.count().await?;
        Ok(usize::try_from(after.saturating_sub(before)).unwrap_or(usize::MAX))
    }

    async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        Ok(Ingredients::find().count(&self.conn).await?)
    }
}

fn name_starts_with(name: &str, lowercase_prefix: &str) -> bool {
    name.to_lowercase().starts_with(lowercase_prefix)
}

/// `prefix%` with the LIKE wildcards in `prefix` escaped by a backslash.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
