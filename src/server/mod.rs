pub mod builder;
pub mod handler;
pub mod listener;
pub mod routes;

pub use builder::ServerBuilder;
pub use handler::RequestHandler;
pub use routes::{QueryOptions, Route};
