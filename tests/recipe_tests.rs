//! Integration tests for recipes, favorites, the shopping cart and the
//! shopping list download.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use foodgram::config::Config;
use foodgram::models::tag::{IngredientSeed, default_tags};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::collections::HashMap;
use tower::ServiceExt;

mod common;

use common::TempDb;

const IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==";

struct TestApp {
    router: Router,
    _db: TempDb,
    tags: HashMap<String, i64>,
    ingredients: HashMap<String, i64>,
}

async fn spawn_app() -> TestApp {
    let db = TempDb::new("recipe-test");

    let mut config = Config::default();
    config.general.database_path = db.url();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = foodgram::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    state.store().load_tags(default_tags()).await.unwrap();
    state
        .store()
        .load_ingredients(
            [("flour", "g"), ("sugar", "g"), ("milk", "ml"), ("eggs", "pcs")]
                .into_iter()
                .map(|(name, unit)| IngredientSeed {
                    name: name.to_string(),
                    measurement_unit: unit.to_string(),
                })
                .collect(),
        )
        .await
        .unwrap();

    let tags = state
        .store()
        .list_tags()
        .await
        .unwrap()
        .into_iter()
        .map(|t| (t.slug, i64::from(t.id)))
        .collect();
    let ingredients = state
        .store()
        .list_ingredients(None)
        .await
        .unwrap()
        .into_iter()
        .map(|i| (i.name, i64::from(i.id)))
        .collect();

    TestApp {
        router: foodgram::api::router(state),
        _db: db,
        tags,
        ingredients,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.raw(method, uri, token, body).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn login(&self, name: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/users",
                None,
                Some(json!({
                    "email": format!("{name}@example.com"),
                    "username": name,
                    "first_name": "Test",
                    "last_name": "Cook",
                    "password": "s3cret-pass",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let (status, body) = self
            .call(
                "POST",
                "/api/auth/token/login",
                None,
                Some(json!({ "email": format!("{name}@example.com"), "password": "s3cret-pass" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["auth_token"].as_str().unwrap().to_string()
    }

    fn recipe(&self, name: &str, tags: &[&str], ingredients: &[(&str, i64)]) -> Value {
        json!({
            "name": name,
            "text": "Mix everything and bake.",
            "cooking_time": 30,
            "image": IMAGE,
            "tags": tags.iter().map(|slug| self.tags[*slug]).collect::<Vec<_>>(),
            "ingredients": ingredients
                .iter()
                .map(|(name, amount)| json!({ "id": self.ingredients[*name], "amount": amount }))
                .collect::<Vec<_>>(),
        })
    }

    async fn create(&self, token: &str, payload: Value) -> i64 {
        let (status, body) = self.call("POST", "/api/recipes", Some(token), Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_create_and_read_recipe() {
    let app = spawn_app().await;
    let token = app.login("chef").await;

    let payload = app.recipe("Pancakes", &["breakfast"], &[("flour", 200), ("milk", 300)]);
    let (status, body) = app.call("POST", "/api/recipes", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let recipe = &body["data"];
    assert_eq!(recipe["name"], "Pancakes");
    assert_eq!(recipe["author"]["username"], "chef");
    assert_eq!(recipe["tags"][0]["slug"], "breakfast");
    assert_eq!(recipe["ingredients"].as_array().unwrap().len(), 2);
    assert_eq!(recipe["is_favorited"], false);

    let id = recipe["id"].as_i64().unwrap();
    let (status, body) = app.call("GET", &format!("/api/recipes/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cooking_time"], 30);
    assert_eq!(body["data"]["image"], IMAGE);

    let flour = body["data"]["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["name"] == "flour")
        .unwrap();
    assert_eq!(flour["amount"], 200);
    assert_eq!(flour["measurement_unit"], "g");

    let (status, _) = app.call("GET", "/api/recipes/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_write_is_unauthorized() {
    let app = spawn_app().await;
    let payload = app.recipe("Toast", &["breakfast"], &[("flour", 50)]);

    let (status, _) = app.call("POST", "/api/recipes", None, Some(payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("POST", "/api/recipes/1/favorite", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call("GET", "/api/recipes/download_shopping_cart", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_recipe_validation() {
    let app = spawn_app().await;
    let token = app.login("strict").await;

    let cases = [
        (
            app.recipe("Repeat", &["lunch"], &[("flour", 1), ("flour", 2)]),
            "ingredients",
            "Ingredients must not repeat",
        ),
        (
            app.recipe("Zero", &["lunch"], &[("flour", 0)]),
            "ingredients",
            "Ingredient amount must be at least 1",
        ),
        (
            app.recipe("Tags", &["lunch", "lunch"], &[("flour", 1)]),
            "tags",
            "Tags must not repeat",
        ),
        (
            app.recipe("Bare", &[], &[("flour", 1)]),
            "tags",
            "At least one tag is required",
        ),
        (
            app.recipe("Empty", &["lunch"], &[]),
            "ingredients",
            "At least one ingredient is required",
        ),
    ];

    for (payload, field, message) in cases {
        let (status, body) = app.call("POST", "/api/recipes", Some(&token), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["field"], field);
        assert_eq!(body["error"], message);
    }

    let mut unknown_tag = app.recipe("Ghost", &["lunch"], &[("flour", 1)]);
    unknown_tag["tags"] = json!([9999]);
    let (status, body) = app
        .call("POST", "/api/recipes", Some(&token), Some(unknown_tag))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Tag 9999 does not exist");

    let mut no_image = app.recipe("Plain", &["lunch"], &[("flour", 1)]);
    no_image["image"] = Value::Null;
    let (status, body) = app.call("POST", "/api/recipes", Some(&token), Some(no_image)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "image");

    let mut quick = app.recipe("Quick", &["lunch"], &[("flour", 1)]);
    quick["cooking_time"] = json!(0);
    let (status, body) = app.call("POST", "/api/recipes", Some(&token), Some(quick)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "cooking_time");
}

#[tokio::test]
async fn test_mistyped_body_uses_error_envelope() {
    let app = spawn_app().await;
    let token = app.login("typo").await;

    let mut string_amount = app.recipe("Typo", &["lunch"], &[("flour", 1)]);
    string_amount["ingredients"][0]["amount"] = json!("abc");

    let mut fractional_amount = app.recipe("Typo", &["lunch"], &[("flour", 1)]);
    fractional_amount["ingredients"][0]["amount"] = json!(1.5);

    let mut huge_time = app.recipe("Typo", &["lunch"], &[("flour", 1)]);
    huge_time["cooking_time"] = json!(3_000_000_000_i64);

    let mut slug_tags = app.recipe("Typo", &["lunch"], &[("flour", 1)]);
    slug_tags["tags"] = json!(["breakfast"]);

    let cases = [
        (string_amount, "ingredients"),
        (fractional_amount, "ingredients"),
        (huge_time, "cooking_time"),
        (slug_tags, "tags"),
    ];

    for (payload, field) in cases {
        let (status, body) = app.call("POST", "/api/recipes", Some(&token), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["success"], false);
        assert_eq!(body["field"], field);
        assert!(body["error"].is_string());
    }

    let (status, body) = app.call("GET", "/api/recipes", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_duplicate_name_per_author() {
    let app = spawn_app().await;
    let first = app.login("first").await;
    let second = app.login("second").await;

    let payload = app.recipe("Soup", &["dinner"], &[("milk", 500)]);
    app.create(&first, payload.clone()).await;

    let (status, body) = app
        .call("POST", "/api/recipes", Some(&first), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "name");
    assert_eq!(body["error"], "You already have a recipe with this name");

    // Another author may reuse the name
    app.create(&second, payload).await;
}

#[tokio::test]
async fn test_update_and_delete_are_author_only() {
    let app = spawn_app().await;
    let owner = app.login("owner").await;
    let other = app.login("other").await;

    let id = app
        .create(&owner, app.recipe("Cake", &["dessert"], &[("flour", 300), ("sugar", 100)]))
        .await;
    let uri = format!("/api/recipes/{id}");

    let mut update = app.recipe("Better cake", &["dessert", "drinks"], &[("eggs", 3)]);
    update.as_object_mut().unwrap().remove("image");

    let (status, _) = app.call("PATCH", &uri, Some(&other), Some(update.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call("DELETE", &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call("PATCH", &uri, None, Some(update.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.call("PATCH", &uri, Some(&owner), Some(update)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["name"], "Better cake");
    assert_eq!(body["data"]["image"], IMAGE);
    assert_eq!(body["data"]["tags"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["ingredients"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["ingredients"][0]["name"], "eggs");

    let (status, _) = app.call("DELETE", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorite_and_cart_toggles() {
    let app = spawn_app().await;
    let token = app.login("fan").await;
    let id = app
        .create(&token, app.recipe("Lemonade", &["drinks"], &[("sugar", 40)]))
        .await;

    for (path, duplicate) in [
        ("favorite", "Recipe is already in favorites"),
        ("shopping_cart", "Recipe is already in the shopping cart"),
    ] {
        let uri = format!("/api/recipes/{id}/{path}");

        let (status, body) = app.call("POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["id"], id);
        assert_eq!(body["data"]["name"], "Lemonade");
        assert!(body["data"].get("text").is_none());

        let (status, body) = app.call("POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], duplicate);

        let (status, _) = app.call("DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.call("DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .call("POST", &format!("/api/recipes/9999/{path}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_flags_and_filters() {
    let app = spawn_app().await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;

    let porridge = app
        .create(&alice, app.recipe("Porridge", &["breakfast"], &[("milk", 200)]))
        .await;
    app.create(&alice, app.recipe("Stew", &["dinner"], &[("flour", 20)]))
        .await;
    app.create(&bob, app.recipe("Tea", &["drinks"], &[("sugar", 5)]))
        .await;

    let (status, _) = app
        .call("POST", &format!("/api/recipes/{porridge}/favorite"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app
        .call("GET", &format!("/api/recipes/{porridge}"), Some(&bob), None)
        .await;
    assert_eq!(body["data"]["is_favorited"], true);
    assert_eq!(body["data"]["is_in_shopping_cart"], false);

    let (_, body) = app
        .call("GET", &format!("/api/recipes/{porridge}"), None, None)
        .await;
    assert_eq!(body["data"]["is_favorited"], false);

    let (_, body) = app
        .call("GET", "/api/recipes?is_favorited=1", Some(&bob), None)
        .await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["results"][0]["name"], "Porridge");

    let (_, body) = app
        .call("GET", "/api/recipes?is_favorited=0", Some(&bob), None)
        .await;
    assert_eq!(body["data"]["count"], 2);

    let (_, body) = app.call("GET", "/api/recipes?is_favorited=1", None, None).await;
    assert_eq!(body["data"]["count"], 0);

    let (_, body) = app.call("GET", "/api/recipes?is_favorited=0", None, None).await;
    assert_eq!(body["data"]["count"], 3);

    let (_, body) = app
        .call("GET", "/api/recipes?tags=breakfast&tags=drinks", None, None)
        .await;
    assert_eq!(body["data"]["count"], 2);

    let (_, me) = app.call("GET", "/api/users/me", Some(&alice), None).await;
    let alice_id = me["data"]["id"].as_i64().unwrap();
    let (_, body) = app
        .call("GET", &format!("/api/recipes?author={alice_id}"), None, None)
        .await;
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["results"][0]["name"], "Stew");

    let (_, body) = app.call("GET", "/api/recipes?limit=1&page=2", None, None).await;
    assert_eq!(body["data"]["total_pages"], 3);
    assert_eq!(body["data"]["results"][0]["name"], "Stew");

    let (status, body) = app.call("GET", "/api/recipes?is_favorited=yes", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "is_favorited");
}

#[tokio::test]
async fn test_shopping_list_download() {
    let app = spawn_app().await;
    let token = app.login("shopper").await;

    let bread = app
        .create(&token, app.recipe("Bread", &["lunch"], &[("flour", 200), ("eggs", 1)]))
        .await;
    let pie = app
        .create(&token, app.recipe("Pie", &["dessert"], &[("flour", 200), ("sugar", 80)]))
        .await;

    let response = app
        .raw("GET", "/api/recipes/download_shopping_cart", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());

    for id in [bread, pie] {
        let (status, _) = app
            .call("POST", &format!("/api/recipes/{id}/shopping_cart"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let response = app
        .raw("GET", "/api/recipes/download_shopping_cart", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"shopping_list.txt\""
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(
        String::from_utf8(bytes.to_vec()).unwrap(),
        "eggs 1 pcs\nflour 400 g\nsugar 80 g\n"
    );
}

#[tokio::test]
async fn test_subscription_embeds_recipes() {
    let app = spawn_app().await;
    let author = app.login("baker").await;
    let reader = app.login("reader").await;

    for name in ["Bun", "Roll", "Loaf"] {
        app.create(&author, app.recipe(name, &["breakfast"], &[("flour", 100)]))
            .await;
    }

    let (_, me) = app.call("GET", "/api/users/me", Some(&author), None).await;
    let author_id = me["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/users/{author_id}/subscribe?recipes_limit=2"),
            Some(&reader),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["recipes_count"], 3);
    assert_eq!(body["data"]["recipes"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["recipes"][0]["name"], "Loaf");

    let (_, body) = app
        .call("GET", "/api/recipes", Some(&reader), None)
        .await;
    assert_eq!(body["data"]["results"][0]["author"]["is_subscribed"], true);

    let (_, body) = app
        .call("GET", "/api/users/subscriptions?recipes_limit=1", Some(&reader), None)
        .await;
    assert_eq!(body["data"]["results"][0]["recipes"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["results"][0]["recipes_count"], 3);
}
