use crate::config::Config;
use crate::db::{Store, UserInsert};
use crate::models::user::NewUser;

pub async fn cmd_create_user(config: &Config, store: &Store, user: NewUser) -> anyhow::Result<()> {
    user.validate(config.security.min_password_length)?;

    let repo = store.user_repo();
    if repo.email_exists(user.email.trim()).await? {
        anyhow::bail!("A user with email '{}' already exists", user.email.trim());
    }
    if repo.username_exists(user.username.trim()).await? {
        anyhow::bail!("A user with username '{}' already exists", user.username.trim());
    }

    let created = store
        .create_user(
            UserInsert {
                email: user.email.trim().to_string(),
                username: user.username.trim().to_string(),
                first_name: user.first_name,
                last_name: user.last_name,
                password: user.password,
            },
            &config.security,
        )
        .await?;

    println!("Created user #{} ({})", created.id, created.username);
    Ok(())
}
