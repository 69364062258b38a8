//! Query-string parsing for listings.
//!
//! `tags` may repeat, so the raw query is decoded into pairs with
//! `form_urlencoded` instead of a `Query<T>` struct.

use crate::config::PaginationConfig;
use crate::models::recipe::RecipeFilter;
use crate::services::PageRequest;

use super::ApiError;
use super::validation::{validate_limit, validate_page, validate_recipes_limit};

#[derive(Debug, Default, Clone)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        Self(
            raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default(),
        )
    }

    /// Last non-empty value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.as_str())
    }

    /// Every non-empty value of `name`, in order.
    #[must_use]
    pub fn all(&self, name: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.clone())
            .collect()
    }

    fn number<T: std::str::FromStr>(&self, name: &'static str) -> Result<Option<T>, ApiError> {
        self.get(name)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| ApiError::field(name, format!("Invalid {name}: {value}")))
            })
            .transpose()
    }

    fn flag(&self, name: &'static str) -> Result<Option<bool>, ApiError> {
        self.get(name).map(|value| parse_flag(name, value)).transpose()
    }

    pub fn page(&self, config: &PaginationConfig) -> Result<PageRequest, ApiError> {
        let page = validate_page(self.number("page")?.unwrap_or(1))?;
        let page_size = validate_limit(
            self.number("limit")?.unwrap_or(config.page_size),
            config.max_page_size,
        )?;

        Ok(PageRequest { page, page_size })
    }

    pub fn recipe_filter(&self) -> Result<RecipeFilter, ApiError> {
        Ok(RecipeFilter {
            tags: self.all("tags"),
            author: self.number("author")?,
            is_favorited: self.flag("is_favorited")?,
            is_in_shopping_cart: self.flag("is_in_shopping_cart")?,
        })
    }

    pub fn recipes_limit(&self) -> Result<Option<u64>, ApiError> {
        self.number("recipes_limit")?
            .map(validate_recipes_limit)
            .transpose()
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ApiError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ApiError::field(
            name,
            format!("Invalid {name}: {value}. Expected 1, 0, true or false"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_tags() {
        let params = QueryParams::parse(Some("tags=breakfast&tags=dinner&author=3"));
        let filter = params.recipe_filter().unwrap();

        assert_eq!(filter.tags, vec!["breakfast", "dinner"]);
        assert_eq!(filter.author, Some(3));
        assert_eq!(filter.is_favorited, None);
    }

    #[test]
    fn test_flags() {
        let params = QueryParams::parse(Some("is_favorited=1&is_in_shopping_cart=False"));
        let filter = params.recipe_filter().unwrap();

        assert_eq!(filter.is_favorited, Some(true));
        assert_eq!(filter.is_in_shopping_cart, Some(false));

        let bad = QueryParams::parse(Some("is_favorited=maybe"));
        assert!(bad.recipe_filter().is_err());
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let params = QueryParams::parse(Some("author=&tags=&page="));
        assert_eq!(params.recipe_filter().unwrap(), RecipeFilter::default());
        assert_eq!(params.page(&PaginationConfig::default()).unwrap().page, 1);
    }

    #[test]
    fn test_page_defaults_and_bounds() {
        let config = PaginationConfig::default();

        let page = QueryParams::parse(None).page(&config).unwrap();
        assert_eq!(page, PageRequest { page: 1, page_size: 6 });

        let page = QueryParams::parse(Some("page=2&limit=10")).page(&config).unwrap();
        assert_eq!(page, PageRequest { page: 2, page_size: 10 });

        assert!(QueryParams::parse(Some("page=0")).page(&config).is_err());
        assert!(QueryParams::parse(Some("limit=500")).page(&config).is_err());
        assert!(QueryParams::parse(Some("page=abc")).page(&config).is_err());
    }

    #[test]
    fn test_recipes_limit() {
        assert_eq!(QueryParams::parse(None).recipes_limit().unwrap(), None);
        assert_eq!(
            QueryParams::parse(Some("recipes_limit=2")).recipes_limit().unwrap(),
            Some(2)
        );
        assert!(QueryParams::parse(Some("recipes_limit=0")).recipes_limit().is_err());
    }

    #[test]
    fn test_percent_decoding() {
        let params = QueryParams::parse(Some("name=%D0%BC%D1%83%D0%BA%D0%B0"));
        assert_eq!(params.get("name"), Some("мука"));
    }
}
