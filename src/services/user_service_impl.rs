//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::api::types::{Page, RegisteredUserDto, SubscriptionDto, UserDto};
use crate::config::SecurityConfig;
use crate::db::{Store, UserInsert, is_unique_violation};
use crate::entities::users;
use crate::models::ValidationError;
use crate::models::user::{NewUser, SetPassword, validate_password};
use crate::services::recipe_service::PageRequest;
use crate::services::user_service::{UserError, UserService};

const ALREADY_SUBSCRIBED: &str = "You are already subscribed to this author";

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn find(&self, id: i32) -> Result<users::Model, UserError> {
        self.store
            .user_repo()
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserError::user_not_found(id))
    }

    async fn subscription_dtos(
        &self,
        authors: Vec<users::Model>,
        recipes_limit: Option<u64>,
    ) -> Result<Vec<SubscriptionDto>, UserError> {
        let author_ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
        let recipe_repo = self.store.recipe_repo();
        let counts = recipe_repo.count_by_authors(&author_ids).await?;

        let mut dtos = Vec::with_capacity(authors.len());
        for author in authors {
            let recipes = recipe_repo.by_author(author.id, recipes_limit).await?;
            let recipes_count = counts.get(&author.id).copied().unwrap_or(0);

            dtos.push(SubscriptionDto {
                author: UserDto::new(author, true),
                recipes: recipes.into_iter().map(Into::into).collect(),
                recipes_count,
            });
        }

        Ok(dtos)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, user: NewUser) -> Result<RegisteredUserDto, UserError> {
        user.validate(self.security.min_password_length)?;

        let email = user.email.trim().to_string();
        let username = user.username.trim().to_string();

        let repo = self.store.user_repo();
        if repo.email_exists(&email).await? {
            return Err(
                ValidationError::new("email", "A user with this email already exists").into(),
            );
        }
        if repo.username_exists(&username).await? {
            return Err(ValidationError::new(
                "username",
                "A user with this username already exists",
            )
            .into());
        }

        let insert = UserInsert {
            email,
            username,
            first_name: user.first_name.trim().to_string(),
            last_name: user.last_name.trim().to_string(),
            password: user.password,
        };

        let created = repo.create(insert, &self.security).await.map_err(|err| {
            if is_unique_violation(&err) {
                ValidationError::new("email", "A user with this email or username already exists")
                    .into()
            } else {
                UserError::from(err)
            }
        })?;

        info!(user_id = created.id, "User registered");
        Ok(created.into())
    }

    async fn list(
        &self,
        viewer: Option<i32>,
        page: PageRequest,
    ) -> Result<Page<UserDto>, UserError> {
        let (users, total) = self
            .store
            .user_repo()
            .list(page.page, page.page_size)
            .await?;

        let followed = match viewer {
            Some(viewer) => {
                let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
                self.store.follow_repo().followed_among(viewer, &ids).await?
            }
            None => Default::default(),
        };

        let results = users
            .into_iter()
            .map(|user| {
                let is_subscribed = followed.contains(&user.id);
                UserDto::new(user, is_subscribed)
            })
            .collect();

        Ok(Page::new(results, total, page.page, page.page_size))
    }

    async fn get(&self, id: i32, viewer: Option<i32>) -> Result<UserDto, UserError> {
        let user = self.find(id).await?;

        let is_subscribed = match viewer {
            Some(viewer) => self.store.follow_repo().exists(viewer, id).await?,
            None => false,
        };

        Ok(UserDto::new(user, is_subscribed))
    }

    async fn set_password(&self, user_id: i32, payload: SetPassword) -> Result<(), UserError> {
        validate_password(
            "new_password",
            &payload.new_password,
            self.security.min_password_length,
        )?;

        let repo = self.store.user_repo();
        if !repo
            .check_password_for(user_id, &payload.current_password)
            .await?
        {
            return Err(
                ValidationError::new("current_password", "Current password is incorrect").into(),
            );
        }

        repo.update_password(user_id, &payload.new_password, &self.security)
            .await?;

        info!(user_id, "Password changed");
        Ok(())
    }

    async fn subscribe(
        &self,
        user_id: i32,
        author_id: i32,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, UserError> {
        let author = self.find(author_id).await?;

        if author_id == user_id {
            return Err(ValidationError::new("author", "You cannot subscribe to yourself").into());
        }

        let follows = self.store.follow_repo();
        if follows.exists(user_id, author_id).await? {
            return Err(ValidationError::new("author", ALREADY_SUBSCRIBED).into());
        }

        follows.create(user_id, author_id).await.map_err(|err| {
            if is_unique_violation(&err) {
                ValidationError::new("author", ALREADY_SUBSCRIBED).into()
            } else {
                UserError::from(err)
            }
        })?;

        info!(user_id, author_id, "Subscribed to author");
        self.subscription_dtos(vec![author], recipes_limit)
            .await?
            .pop()
            .ok_or_else(|| UserError::user_not_found(author_id))
    }

    async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<(), UserError> {
        self.find(author_id).await?;

        if !self.store.follow_repo().delete(user_id, author_id).await? {
            return Err(UserError::NotFound(
                "You are not subscribed to this author".to_string(),
            ));
        }

        info!(user_id, author_id, "Unsubscribed from author");
        Ok(())
    }

    async fn subscriptions(
        &self,
        user_id: i32,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> Result<Page<SubscriptionDto>, UserError> {
        let (authors, total) = self
            .store
            .follow_repo()
            .authors_page(user_id, page.page, page.page_size)
            .await?;

        let results = self.subscription_dtos(authors, recipes_limit).await?;
        Ok(Page::new(results, total, page.page, page.page_size))
    }
}
