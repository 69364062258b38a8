use crate::entities::prelude::*;
use crate::entities::{
    favorites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_cart,
};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create_from_entity<E: EntityTrait>(
    manager: &SchemaManager<'_>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .create_table(
            schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

async fn create_unique_index<T, C>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    columns: [C; 2],
) -> Result<(), DbErr>
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    let [first, second] = columns;
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(name)
                .table(table)
                .col(first)
                .col(second)
                .unique()
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        create_from_entity(manager, &schema, Users).await?;
        create_from_entity(manager, &schema, AuthTokens).await?;
        create_from_entity(manager, &schema, Tags).await?;
        create_from_entity(manager, &schema, Ingredients).await?;
        create_from_entity(manager, &schema, Recipes).await?;
        create_from_entity(manager, &schema, RecipeTags).await?;
        create_from_entity(manager, &schema, RecipeIngredients).await?;
        create_from_entity(manager, &schema, Favorites).await?;
        create_from_entity(manager, &schema, ShoppingCart).await?;

        create_unique_index(
            manager,
            "ux_ingredients_name_unit",
            Ingredients,
            [
                ingredients::Column::Name,
                ingredients::Column::MeasurementUnit,
            ],
        )
        .await?;

        create_unique_index(
            manager,
            "ux_recipes_name_author",
            Recipes,
            [recipes::Column::Name, recipes::Column::AuthorId],
        )
        .await?;

        create_unique_index(
            manager,
            "ux_recipe_tags_recipe_tag",
            RecipeTags,
            [recipe_tags::Column::RecipeId, recipe_tags::Column::TagId],
        )
        .await?;

        create_unique_index(
            manager,
            "ux_recipe_ingredients_ingredient_recipe",
            RecipeIngredients,
            [
                recipe_ingredients::Column::IngredientId,
                recipe_ingredients::Column::RecipeId,
            ],
        )
        .await?;

        create_unique_index(
            manager,
            "ux_favorites_user_recipe",
            Favorites,
            [favorites::Column::UserId, favorites::Column::RecipeId],
        )
        .await?;

        create_unique_index(
            manager,
            "ux_shopping_cart_user_recipe",
            ShoppingCart,
            [shopping_cart::Column::UserId, shopping_cart::Column::RecipeId],
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShoppingCart).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Favorites).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeIngredients).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeTags).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ingredients).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthTokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
