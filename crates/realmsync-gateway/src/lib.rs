//! Remote Resource Gateway: the typed contract the reconciliation engine
//! consumes, plus the reqwest adapter over the identity server's
//! administrative HTTP API.

pub mod error;
pub mod http;
pub mod traits;

pub use error::{GatewayError, GatewayResult};
pub use http::AdminApiClient;
pub use traits::{AdminGateway, RoleScope, ScopeHolder};
