pub mod http;
pub mod mock;

pub use http::{HttpCheckService, HttpOptions};
pub use mock::{Call, MockCheckService};
