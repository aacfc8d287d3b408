pub mod authorizor;

mod platform;
mod token;
mod user;

pub use platform::Platform;
pub use token::{issue_token, Claims, TokenVerifier};
pub use user::User;
