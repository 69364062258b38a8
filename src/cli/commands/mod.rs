mod seed;
mod user;

pub use seed::{cmd_load_ingredients, cmd_load_tags};
pub use user::cmd_create_user;
