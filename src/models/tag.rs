use serde::Deserialize;

/// Seed entry accepted by `foodgram load-tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagSeed {
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Seed entry accepted by `foodgram load-ingredients`.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientSeed {
    pub name: String,
    pub measurement_unit: String,
}

#[must_use]
pub fn default_tags() -> Vec<TagSeed> {
    [
        ("Breakfast", "#1745b4", "breakfast"),
        ("Lunch", "#1c9b5d", "lunch"),
        ("Dinner", "#8f6c1e", "dinner"),
        ("Drinks", "#2a8fbd", "drinks"),
        ("Dessert", "#7222bc", "dessert"),
    ]
    .into_iter()
    .map(|(name, color, slug)| TagSeed {
        name: name.to_string(),
        color: color.to_string(),
        slug: slug.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_tags_are_unique() {
        let tags = default_tags();
        let names: HashSet<_> = tags.iter().map(|t| t.name.as_str()).collect();
        let colors: HashSet<_> = tags.iter().map(|t| t.color.as_str()).collect();
        let slugs: HashSet<_> = tags.iter().map(|t| t.slug.as_str()).collect();

        assert_eq!(names.len(), tags.len());
        assert_eq!(colors.len(), tags.len());
        assert_eq!(slugs.len(), tags.len());
    }
}
