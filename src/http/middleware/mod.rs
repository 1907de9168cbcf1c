pub mod access_log;

pub use access_log::{access_log, MatchedRoute, HEALTH_ROUTE, NO_ROUTE, STATIC_ROUTE};
