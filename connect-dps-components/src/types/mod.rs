//! Domain types shared across the middleware
//!
//! Wire-facing records use camelCase field names to match the upstream
//! HMPPS APIs. Request-scoped records (`HmppsUser`, `FrontendComponents`)
//! live in axum request extensions and never outlive the request.

use serde::{Deserialize, Serialize};

/// Origin of the user's authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthSource {
    /// Prison staff authenticated against NOMIS
    Nomis,
    /// Probation staff authenticated against Delius
    Delius,
    /// External users
    External,
    /// Azure AD (HMPPS internal) users
    Azuread,
}

/// Authenticated principal attached to the request by the host's
/// authentication middleware
///
/// The case-load and allocation middleware replace this extension with an
/// enriched copy; handlers running after them see the populated optional
/// fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HmppsUser {
    /// The user's own access token, forwarded to user-scoped APIs
    pub token: String,
    /// Where the user authenticated
    pub auth_source: AuthSource,
    /// Unique username, used for log correlation
    pub username: String,
    /// Staff identifier used by the allocations API
    pub user_id: String,
    /// Full display name, e.g. "Edwin Shannon"
    pub display_name: String,
    /// Case loads the user is associated with, once cached
    #[serde(default)]
    pub case_loads: Option<Vec<CaseLoad>>,
    /// The currently active case load, if any
    #[serde(default)]
    pub active_case_load: Option<CaseLoad>,
    /// Shorthand for the active case load's identifier
    #[serde(default)]
    pub active_case_load_id: Option<String>,
    /// Allocation job responsibilities, once cached
    #[serde(default)]
    pub allocation_job_responsibilities: Option<Vec<AllocationJobResponsibility>>,
}

impl HmppsUser {
    /// Whether this user is a prison (NOMIS) user
    #[must_use]
    pub fn is_prison_user(&self) -> bool {
        self.auth_source == AuthSource::Nomis
    }
}

/// A prison establishment a staff user is associated with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseLoad {
    /// Establishment identifier, e.g. "KMI"
    pub case_load_id: String,
    /// Human-readable name, e.g. "Kirkham (HMP)"
    pub description: String,
    /// Establishment type; "APP" entries are administrative and filtered
    /// out before caching
    #[serde(rename = "type")]
    pub case_load_type: String,
    /// Role the user holds at this establishment
    pub caseload_function: String,
    /// At most one case load per user is currently active
    pub currently_active: bool,
}

/// A job responsibility tag, e.g. "KEY_WORKER"
///
/// Kept as an open string rather than a closed enum: the allocations API
/// introduces new tags without coordinated releases and this crate only
/// passes them through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationJobResponsibility(pub String);

impl AllocationJobResponsibility {
    /// Wrap a job responsibility tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl std::fmt::Display for AllocationJobResponsibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A service tile in the shared header navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service identifier
    pub id: String,
    /// Tile heading
    pub heading: String,
    /// Tile description
    pub description: String,
    /// Link target
    pub href: String,
    /// Whether the service appears in the navigation
    pub nav_enabled: bool,
}

/// One rendered component returned by the components API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Component markup
    pub html: String,
    /// Stylesheet URLs the component requires
    pub css: Vec<String>,
    /// Script URLs the component requires
    pub javascript: Vec<String>,
}

/// Metadata embedded in a components API response, reusable by later
/// middleware to avoid a second upstream call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedData {
    /// The user's case loads
    #[serde(default)]
    pub case_loads: Vec<CaseLoad>,
    /// The currently active case load, if any
    #[serde(default)]
    pub active_case_load: Option<CaseLoad>,
    /// Services available to the user
    #[serde(default)]
    pub services: Vec<Service>,
    /// Allocation job responsibilities, when the API includes them
    #[serde(default)]
    pub allocation_job_responsibilities: Option<Vec<AllocationJobResponsibility>>,
}

/// Response body of `GET /components`
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentsResponse {
    /// The shared header component
    pub header: Component,
    /// The shared footer component
    pub footer: Component,
    /// Shared metadata, when the API includes it
    #[serde(default)]
    pub meta: Option<SharedData>,
}

/// Response body of the staff job-classifications endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct StaffAllocationPolicies {
    /// The user's job responsibilities
    pub policies: Vec<AllocationJobResponsibility>,
}

/// Header and footer content exposed to downstream handlers
///
/// Inserted into request extensions by the frontend components
/// middleware, on both the upstream and fallback paths.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendComponents {
    /// Header markup
    pub header: String,
    /// Footer markup
    pub footer: String,
    /// Stylesheet URLs, header's then footer's
    pub css_includes: Vec<String>,
    /// Script URLs, header's then footer's
    pub js_includes: Vec<String>,
    /// Shared metadata, present only when configured and the upstream
    /// call succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_data: Option<SharedData>,
}
