pub mod auth;
pub mod rest;

pub use auth::{AuthConfig, AuthError, Claims, JwtMiddleware, ACCESS_TOKEN_EXPIRE_MINUTES};
pub use rest::{configure, RestApi};
