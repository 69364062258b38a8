use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::db::Store;
use crate::models::tag::{IngredientSeed, TagSeed, default_tags};

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub async fn cmd_load_tags(store: &Store, file: Option<&Path>) -> anyhow::Result<()> {
    let seeds: Vec<TagSeed> = match file {
        Some(path) => read_json(path)?,
        None => default_tags(),
    };

    let total = seeds.len();
    let inserted = store.load_tags(seeds).await?;

    println!("Tags: {inserted} added, {} already present", total - inserted);
    Ok(())
}

pub async fn cmd_load_ingredients(store: &Store, file: &Path) -> anyhow::Result<()> {
    let seeds: Vec<IngredientSeed> = read_json(file)?;

    let total = seeds.len();
    let inserted = store.load_ingredients(seeds).await?;

    println!(
        "Ingredients: {inserted} added, {} skipped",
        total.saturating_sub(inserted)
    );
    Ok(())
}
