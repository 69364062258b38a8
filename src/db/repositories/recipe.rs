use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Set, TransactionTrait,
    sea_query::{Expr, Query},
};
use std::collections::HashMap;

use super::membership::RecipeList;
use crate::entities::{ingredients, prelude::*, recipe_ingredients, recipe_tags, recipes, tags};
use crate::models::recipe::{IngredientAmount, RecipeFilter, RecipeWrite};

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Newest recipes first, narrowed by `filter` as seen by `viewer`.
    /// Returns the page and the total number of matching recipes.
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        viewer: Option<i32>,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<recipes::Model>, u64)> {
        let Some(condition) = filter_condition(filter, viewer) else {
            return Ok((Vec::new(), 0));
        };

        let paginator = Recipes::find()
            .filter(condition)
            .order_by_desc(recipes::Column::Id)
            .paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    pub async fn get(&self, id: i32) -> Result<Option<recipes::Model>> {
        Ok(Recipes::find_by_id(id).one(&self.conn).await?)
    }

    /// Whether `author_id` already has a recipe called `name` (other than `exclude`).
    pub async fn name_taken(&self, author_id: i32, name: &str, exclude: Option<i32>) -> Result<bool> {
        let mut query = Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .filter(recipes::Column::Name.eq(name));

        if let Some(id) = exclude {
            query = query.filter(recipes::Column::Id.ne(id));
        }

        Ok(query.count(&self.conn).await? > 0)
    }

    /// Inserts the recipe and its tag/ingredient rows in one transaction.
    /// Database errors are returned unwrapped so callers can inspect them.
    pub async fn create(&self, author_id: i32, payload: &RecipeWrite) -> Result<recipes::Model> {
        let txn = self.conn.begin().await?;

        let recipe = recipes::ActiveModel {
            author_id: Set(author_id),
            name: Set(payload.name.trim().to_string()),
            text: Set(payload.text.clone()),
            cooking_time: Set(payload.cooking_time),
            image: Set(payload.image.clone().unwrap_or_default()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        replace_associations(&txn, recipe.id, &payload.tags, &payload.ingredients).await?;

        txn.commit().await?;
        Ok(recipe)
    }

    /// Overwrites the recipe fields and replaces its associations wholesale.
    pub async fn update(&self, existing: recipes::Model, payload: &RecipeWrite) -> Result<recipes::Model> {
        let txn = self.conn.begin().await?;

        let recipe_id = existing.id;
        let mut active: recipes::ActiveModel = existing.into();
        active.name = Set(payload.name.trim().to_string());
        active.text = Set(payload.text.clone());
        active.cooking_time = Set(payload.cooking_time);
        if let Some(image) = payload.image.as_ref().filter(|i| !i.trim().is_empty()) {
            active.image = Set(image.clone());
        }
        let recipe = active.update(&txn).await?;

        replace_associations(&txn, recipe_id, &payload.tags, &payload.ingredients).await?;

        txn.commit().await?;
        Ok(recipe)
    }

    /// Associations, favorites and cart rows go with it through ON DELETE CASCADE.
    pub async fn delete(&self, id: i32) -> Result<()> {
        Recipes::delete_by_id(id).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn count_by_authors(&self, author_ids: &[i32]) -> Result<HashMap<i32, u64>> {
        if author_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = Recipes::find()
            .select_only()
            .column(recipes::Column::AuthorId)
            .column_as(Expr::col(recipes::Column::Id).count(), "recipes_count")
            .filter(recipes::Column::AuthorId.is_in(author_ids.iter().copied()))
            .group_by(recipes::Column::AuthorId)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(author_id, count)| (author_id, u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    /// The author's recipes, newest first, at most `limit` of them.
    pub async fn by_author(&self, author_id: i32, limit: Option<u64>) -> Result<Vec<recipes::Model>> {
        let mut query = Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .order_by_desc(recipes::Column::Id);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        Ok(query.all(&self.conn).await?)
    }

    /// One `(name, unit, amount)` row per ingredient line of every recipe in
    /// the user's shopping cart. Not yet summed.
    pub async fn shopping_cart_lines(&self, user_id: i32) -> Result<Vec<(String, String, i32)>> {
        let rows = RecipeIngredients::find()
            .select_only()
            .column(ingredients::Column::Name)
            .column(ingredients::Column::MeasurementUnit)
            .column(recipe_ingredients::Column::Amount)
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredient.def(),
            )
            .filter(
                recipe_ingredients::Column::RecipeId
                    .in_subquery(RecipeList::ShoppingCart.members_query(user_id)),
            )
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(rows)
    }
}

async fn replace_associations<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    tag_ids: &[i32],
    ingredients: &[IngredientAmount],
) -> Result<(), DbErr> {
    RecipeTags::delete_many()
        .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    RecipeIngredients::delete_many()
        .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    if !tag_ids.is_empty() {
        let rows = tag_ids.iter().map(|tag_id| recipe_tags::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
            ..Default::default()
        });
        RecipeTags::insert_many(rows).exec(db).await?;
    }

    if !ingredients.is_empty() {
        let rows = ingredients.iter().map(|line| recipe_ingredients::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(line.id),
            amount: Set(line.amount),
            ..Default::default()
        });
        RecipeIngredients::insert_many(rows).exec(db).await?;
    }

    Ok(())
}

/// Translates a listing filter into a WHERE condition. `None` means nothing
/// can match (an anonymous viewer asking for their own favorites or cart).
#[must_use]
pub fn filter_condition(filter: &RecipeFilter, viewer: Option<i32>) -> Option<Condition> {
    let mut condition = Condition::all();

    if !filter.tags.is_empty() {
        let tagged = Query::select()
            .column((RecipeTags, recipe_tags::Column::RecipeId))
            .from(RecipeTags)
            .inner_join(
                Tags,
                Expr::col((Tags, tags::Column::Id))
                    .equals((RecipeTags, recipe_tags::Column::TagId)),
            )
            .and_where(Expr::col((Tags, tags::Column::Slug)).is_in(filter.tags.iter().cloned()))
            .to_owned();
        condition = condition.add(recipes::Column::Id.in_subquery(tagged));
    }

    if let Some(author_id) = filter.author {
        condition = condition.add(recipes::Column::AuthorId.eq(author_id));
    }

    for (wanted, list) in [
        (filter.is_favorited, RecipeList::Favorites),
        (filter.is_in_shopping_cart, RecipeList::ShoppingCart),
    ] {
        let Some(wanted) = wanted else {
            continue;
        };

        match viewer {
            Some(user_id) => {
                let members = list.members_query(user_id);
                condition = condition.add(if wanted {
                    recipes::Column::Id.in_subquery(members)
                } else {
                    recipes::Column::Id.not_in_subquery(members)
                });
            }
            None if wanted => return None,
            None => {}
        }
    }

    Some(condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql(condition: Condition) -> String {
        Recipes::find()
            .filter(condition)
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn test_empty_filter_has_no_where_clause() {
        let condition = filter_condition(&RecipeFilter::default(), None).unwrap();
        assert!(!sql(condition).contains("WHERE"));
    }

    #[test]
    fn test_tags_and_author() {
        let filter = RecipeFilter {
            tags: vec!["breakfast".to_string(), "lunch".to_string()],
            author: Some(7),
            ..Default::default()
        };
        let query = sql(filter_condition(&filter, None).unwrap());

        assert!(query.contains("\"slug\""));
        assert!(query.contains("'breakfast'"));
        assert!(query.contains("'lunch'"));
        assert!(query.contains("\"author_id\" = 7"));
    }

    #[test]
    fn test_membership_for_viewer() {
        let filter = RecipeFilter {
            is_favorited: Some(true),
            is_in_shopping_cart: Some(false),
            ..Default::default()
        };
        let query = sql(filter_condition(&filter, Some(3)).unwrap());

        assert!(query.contains("\"favorites\""));
        assert!(query.contains("NOT IN (SELECT"));
        assert!(query.contains("\"shopping_cart\""));
    }

    #[test]
    fn test_membership_for_anonymous() {
        let wants_favorites = RecipeFilter {
            is_favorited: Some(true),
            ..Default::default()
        };
        assert!(filter_condition(&wants_favorites, None).is_none());

        let excludes_cart = RecipeFilter {
            is_in_shopping_cart: Some(false),
            ..Default::default()
        };
        let query = sql(filter_condition(&excludes_cart, None).unwrap());
        assert!(!query.contains("shopping_cart"));
    }
}
