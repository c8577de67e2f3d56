pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::login;

use axum::response::Redirect;

// axum handler for /
pub async fn index() -> Redirect {
    Redirect::to("/login")
}
