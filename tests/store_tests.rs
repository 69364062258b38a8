//! Repository-level tests that need a real database but no HTTP layer.

use foodgram::config::SecurityConfig;
use foodgram::db::{Store, UserInsert};
use foodgram::models::recipe::{IngredientAmount, RecipeWrite};
use foodgram::models::tag::{IngredientSeed, default_tags};
use std::collections::HashMap;

mod common;

use common::TempDb;

struct Fixture {
    store: Store,
    author_id: i32,
    tags: HashMap<String, i32>,
    ingredients: HashMap<String, i32>,
    _db: TempDb,
}

async fn setup() -> Fixture {
    let db = TempDb::new("store-test");
    let store = Store::new(&db.url()).await.expect("Failed to open store");

    store.load_tags(default_tags()).await.unwrap();
    store
        .load_ingredients(
            [("flour", "g"), ("sugar", "g"), ("milk", "ml")]
                .into_iter()
                .map(|(name, unit)| IngredientSeed {
                    name: name.to_string(),
                    measurement_unit: unit.to_string(),
                })
                .collect(),
        )
        .await
        .unwrap();

    let security = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        ..SecurityConfig::default()
    };
    let author = store
        .create_user(
            UserInsert {
                email: "baker@example.com".to_string(),
                username: "baker".to_string(),
                first_name: "Bea".to_string(),
                last_name: "Baker".to_string(),
                password: "s3cret-pass".to_string(),
            },
            &security,
        )
        .await
        .unwrap();

    let tags = store
        .list_tags()
        .await
        .unwrap()
        .into_iter()
        .map(|t| (t.slug, t.id))
        .collect();
    let ingredients = store
        .list_ingredients(None)
        .await
        .unwrap()
        .into_iter()
        .map(|i| (i.name, i.id))
        .collect();

    Fixture {
        store,
        author_id: author.id,
        tags,
        ingredients,
        _db: db,
    }
}

#[tokio::test]
async fn test_failed_update_keeps_previous_recipe() {
    let fx = setup().await;
    let repo = fx.store.recipe_repo();

    let original = RecipeWrite {
        name: "Pancakes".to_string(),
        text: "Mix and fry.".to_string(),
        cooking_time: 20,
        image: Some("data:image/png;base64,AAAA".to_string()),
        tags: vec![fx.tags["breakfast"]],
        ingredients: vec![
            IngredientAmount { id: fx.ingredients["flour"], amount: 200 },
            IngredientAmount { id: fx.ingredients["milk"], amount: 300 },
        ],
    };
    let recipe = repo.create(fx.author_id, &original).await.unwrap();

    // The unknown ingredient id fails its foreign key after the old rows
    // were already deleted inside the transaction.
    let broken = RecipeWrite {
        name: "Waffles".to_string(),
        text: "Pour into the iron.".to_string(),
        cooking_time: 15,
        image: None,
        tags: vec![fx.tags["lunch"]],
        ingredients: vec![IngredientAmount { id: 9999, amount: 1 }],
    };
    assert!(repo.update(recipe.clone(), &broken).await.is_err());

    let stored = repo.get(recipe.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Pancakes");
    assert_eq!(stored.cooking_time, 20);

    let tags = fx.store.tag_repo().for_recipes(&[recipe.id]).await.unwrap();
    let tag_ids: Vec<i32> = tags[&recipe.id].iter().map(|t| t.id).collect();
    assert_eq!(tag_ids, vec![fx.tags["breakfast"]]);

    let lines = fx
        .store
        .ingredient_repo()
        .for_recipes(&[recipe.id])
        .await
        .unwrap();
    let amounts: Vec<(String, i32)> = lines[&recipe.id]
        .iter()
        .map(|line| (line.name.clone(), line.amount))
        .collect();
    assert_eq!(
        amounts,
        vec![("flour".to_string(), 200), ("milk".to_string(), 300)]
    );
}

#[tokio::test]
async fn test_failed_create_leaves_no_recipe() {
    let fx = setup().await;
    let repo = fx.store.recipe_repo();

    let broken = RecipeWrite {
        name: "Ghost soup".to_string(),
        text: "Nothing here.".to_string(),
        cooking_time: 5,
        image: None,
        tags: vec![fx.tags["dinner"]],
        ingredients: vec![IngredientAmount { id: 9999, amount: 1 }],
    };
    assert!(repo.create(fx.author_id, &broken).await.is_err());
    assert!(!repo.name_taken(fx.author_id, "Ghost soup", None).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_first_logins_share_one_token() {
    let fx = setup().await;
    let first = fx.store.token_repo();
    let second = fx.store.token_repo();

    let (a, b) = tokio::join!(
        first.get_or_create(fx.author_id),
        second.get_or_create(fx.author_id)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a, b);

    let again = fx.store.token_repo().get_or_create(fx.author_id).await.unwrap();
    assert_eq!(again, a);
}

#[tokio::test]
async fn test_ingredient_prefix_search() {
    let fx = setup().await;
    fx.store
        .load_ingredients(vec![
            IngredientSeed {
                name: "Мука".to_string(),
                measurement_unit: "г".to_string(),
            },
            IngredientSeed {
                name: "50%_cream".to_string(),
                measurement_unit: "ml".to_string(),
            },
        ])
        .await
        .unwrap();

    let names = |list: Vec<foodgram::entities::ingredients::Model>| -> Vec<String> {
        list.into_iter().map(|i| i.name).collect()
    };

    let found = fx.store.list_ingredients(Some("FL")).await.unwrap();
    assert_eq!(names(found), vec!["flour"]);

    let found = fx.store.list_ingredients(Some("му")).await.unwrap();
    assert_eq!(names(found), vec!["Мука"]);

    // LIKE wildcards in the prefix match literally.
    let found = fx.store.list_ingredients(Some("50%_")).await.unwrap();
    assert_eq!(names(found), vec!["50%_cream"]);
    let found = fx.store.list_ingredients(Some("%")).await.unwrap();
    assert!(found.is_empty());
}
