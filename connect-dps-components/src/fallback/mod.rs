//! Statically rendered fallback header and footer
//!
//! Used when the remote component service is unavailable or disabled.
//! Prison users (and anonymous viewers) get a Digital Prison Services
//! header; external users get an HMPPS-branded one with auth-service
//! links. Rendering is infallible from the caller's point of view: a
//! template failure is logged and degrades to empty markup, since the
//! whole fallback path is cosmetic by design.

use askama::Template;
use tracing::error;

use crate::config::FrontendComponentsConfig;
use crate::types::HmppsUser;

#[derive(Template)]
#[template(path = "header-bar.html")]
struct HeaderBarTemplate {
    is_prison_user: bool,
    name: Option<String>,
    dps_url: String,
    auth_url: Option<String>,
    environment_name: Option<String>,
}

#[derive(Template)]
#[template(path = "footer.html")]
struct FooterTemplate {
    is_prison_user: bool,
    auth_url: Option<String>,
    support_url: Option<String>,
}

fn is_prison_user(user: Option<&HmppsUser>) -> bool {
    user.is_none_or(HmppsUser::is_prison_user)
}

/// Render the fallback header bar for the given viewer
pub(crate) fn fallback_header(
    user: Option<&HmppsUser>,
    config: &FrontendComponentsConfig,
) -> String {
    let template = HeaderBarTemplate {
        is_prison_user: is_prison_user(user),
        name: user.and_then(|user| initialise_name(&user.display_name)),
        dps_url: config.dps_url.clone(),
        auth_url: config.auth_url.clone(),
        environment_name: config.environment_name.map(|name| name.to_string()),
    };

    template.render().unwrap_or_else(|err| {
        error!(error = %err, "failed to render fallback header");
        String::new()
    })
}

/// Render the fallback footer for the given viewer
pub(crate) fn fallback_footer(
    user: Option<&HmppsUser>,
    config: &FrontendComponentsConfig,
) -> String {
    let template = FooterTemplate {
        is_prison_user: is_prison_user(user),
        auth_url: config.auth_url.clone(),
        support_url: config.support_url.clone(),
    };

    template.render().unwrap_or_else(|err| {
        error!(error = %err, "failed to render fallback footer");
        String::new()
    })
}

/// Abbreviate a display name to an initial and surname
///
/// "Edwin Shannon" becomes "E. Shannon"; middle names are dropped.
/// Returns `None` for an empty name.
pub(crate) fn initialise_name(full_name: &str) -> Option<String> {
    let mut words = full_name.split_whitespace();
    let first = words.next()?;
    let last = words.next_back().unwrap_or(first);
    let initial = first.chars().next()?;
    Some(format!("{initial}. {last}"))
}
