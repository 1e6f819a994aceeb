//! Middleware layers for HMPPS digital services
//!
//! Provides middleware for:
//! - Shared frontend components (header/footer fetching with fallbacks
//!   and CSP patching)
//! - Case-load caching (session-backed, prison API fallback)
//! - Allocation job responsibilities caching (session-backed,
//!   allocations API fallback)
//!
//! All three are plugged into an axum router through
//! [`axum::middleware::from_fn`]. Within one chain the components
//! middleware must be the outermost of the three so its shared data is
//! available to the cache middleware on the same request.

pub mod allocation;
pub mod case_load;
pub mod components;

// Re-exports are intentionally public even if not used within the crate itself
#[allow(unused_imports)]
pub use allocation::{AllocationMiddleware, AllocationMiddlewareError};
#[allow(unused_imports)]
pub use case_load::{CaseLoadMiddleware, CaseLoadMiddlewareError};
#[allow(unused_imports)]
pub use components::FrontendComponentsMiddleware;
