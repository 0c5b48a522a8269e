pub mod error;
pub mod middleware;
pub mod protocol;
pub mod route;
pub mod template;
pub mod types;
pub mod worker;
