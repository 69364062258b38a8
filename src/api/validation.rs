use super::ApiError;

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page == 0 {
        return Err(ApiError::field(
            "page",
            "Invalid page: 0. Page must be a positive integer",
        ));
    }
    Ok(page)
}

pub fn validate_limit(limit: u64, max: u64) -> Result<u64, ApiError> {
    const MIN_LIMIT: u64 = 1;

    if !(MIN_LIMIT..=max).contains(&limit) {
        return Err(ApiError::field(
            "limit",
            format!(
                "Invalid limit: {}. Limit must be between {} and {}",
                limit, MIN_LIMIT, max
            ),
        ));
    }
    Ok(limit)
}

pub fn validate_recipes_limit(limit: u64) -> Result<u64, ApiError> {
    if limit == 0 {
        return Err(ApiError::field(
            "recipes_limit",
            "Invalid recipes_limit: 0. It must be a positive integer",
        ));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_page() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(42).is_ok());
        assert!(validate_page(0).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1, 100).is_ok());
        assert!(validate_limit(100, 100).is_ok());
        assert!(validate_limit(0, 100).is_err());
        assert!(validate_limit(101, 100).is_err());
    }

    #[test]
    fn test_validate_recipes_limit() {
        assert_eq!(validate_recipes_limit(3).unwrap(), 3);
        assert!(validate_recipes_limit(0).is_err());
    }
}
