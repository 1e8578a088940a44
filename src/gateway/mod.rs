// Route resolution and upstream forwarding

pub mod dispatcher;
pub mod headers;
pub mod route_table;

pub use dispatcher::{Dispatcher, HttpUpstream, UpstreamClient, UpstreamError};
pub use route_table::{normalize_path, RouteError, RoutePattern, RouteRule, RouteTable};
