//! # API Route Modules
//!
//! - `game_roles`: question listing and creation. Requests pass through
//!   [`crate::extractors::ValidatedRequest`] and responses through
//!   [`crate::filter::respond`].
//!
//! Only the endpoints in [`ROUTED`] have handlers. A registry may declare
//! more; those entries are loaded but never reached over HTTP.

pub mod game_roles;

use panel_schema::{EndpointKey, Registry};

/// `(endpoint, METHOD)` pairs with a mounted handler.
pub const ROUTED: &[(&str, &str)] = &[("game_roles", "GET"), ("game_roles", "POST")];

/// Registry endpoints with no mounted handler, in registry order.
pub fn unrouted_endpoints(registry: &Registry) -> Vec<&EndpointKey> {
    registry
        .endpoints()
        .into_iter()
        .filter(|key| {
            !ROUTED
                .iter()
                .any(|(endpoint, method)| key.endpoint == *endpoint && key.method == *method)
        })
        .collect()
}
