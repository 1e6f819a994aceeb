//! Content-Security-Policy merging
//!
//! The shared header and footer reference assets served from the
//! components API host, so responses that carry a CSP header must
//! authorize that host in the `script-src`, `style-src`, `img-src` and
//! `font-src` directives. The merge is pure string-in, string-out:
//! the header is parsed into an ordered list of directives, edited, and
//! serialized back, which keeps directive matching exact (`script-src`
//! never matches `script-src-elem`) instead of relying on substring
//! checks against the raw header text.

use http::header::CONTENT_SECURITY_POLICY;
use http::{HeaderMap, HeaderValue};

/// Directives that must authorize the components host
const MANAGED_DIRECTIVES: [&str; 4] = ["script-src", "style-src", "img-src", "font-src"];

/// Telemetry collection domains added to `connect-src` when the
/// Application Insights option is enabled
pub const APPLICATION_INSIGHTS_DOMAINS: [&str; 2] = [
    "https://northeurope-0.in.applicationinsights.azure.com",
    "*.monitor.azure.com",
];

/// One parsed CSP directive: keyword plus source tokens, in order
#[derive(Debug, PartialEq, Eq)]
struct Directive {
    name: String,
    sources: Vec<String>,
}

impl Directive {
    fn ensure_source(&mut self, source: &str) {
        if !self.sources.iter().any(|existing| existing == source) {
            self.sources.push(source.to_string());
        }
    }

    fn serialize(&self) -> String {
        if self.sources.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.sources.join(" "))
        }
    }
}

fn parse(header: &str) -> Vec<Directive> {
    header
        .split(';')
        .filter_map(|directive| {
            let mut tokens = directive.split_whitespace();
            let name = tokens.next()?;
            Some(Directive {
                name: name.to_string(),
                sources: tokens.map(str::to_string).collect(),
            })
        })
        .collect()
}

fn ensure_directive<'a>(
    directives: &'a mut Vec<Directive>,
    name: &str,
) -> &'a mut Directive {
    if let Some(position) = directives.iter().position(|d| d.name == name) {
        &mut directives[position]
    } else {
        directives.push(Directive {
            name: name.to_string(),
            sources: vec!["'self'".to_string()],
        });
        let last = directives.len() - 1;
        &mut directives[last]
    }
}

/// Merge the components host (and optionally the telemetry domains) into
/// a CSP header value
///
/// Existing directives keep their original position and unrelated
/// directives pass through untouched; newly required directives are
/// appended at the end as `<name> 'self' <url>`. The merge is
/// idempotent: applying it twice yields the same header.
///
/// A missing header is treated as an empty directive list, so the result
/// is always a policy that authorizes the components host.
///
/// # Examples
///
/// ```rust
/// use connect_dps_components::csp::merge_components_csp;
///
/// let merged = merge_components_csp("default-src 'self'", "http://fe-components", false);
/// assert!(merged.starts_with("default-src 'self';script-src 'self' http://fe-components"));
/// ```
#[must_use]
pub fn merge_components_csp(header: &str, components_url: &str, telemetry: bool) -> String {
    let mut directives = parse(header);

    for name in MANAGED_DIRECTIVES {
        ensure_directive(&mut directives, name).ensure_source(components_url);
    }

    if telemetry {
        let connect_src = ensure_directive(&mut directives, "connect-src");
        for domain in APPLICATION_INSIGHTS_DOMAINS {
            connect_src.ensure_source(domain);
        }
    }

    directives
        .iter()
        .map(Directive::serialize)
        .collect::<Vec<_>>()
        .join(";")
}

/// Apply [`merge_components_csp`] to a response header map in place
///
/// Headers that are not valid UTF-8 are left untouched, as is the map
/// when the merged value would not form a valid header value.
pub fn apply_components_csp(headers: &mut HeaderMap, components_url: &str, telemetry: bool) {
    let current = match headers.get(CONTENT_SECURITY_POLICY) {
        None => String::new(),
        Some(value) => match value.to_str() {
            Ok(value) => value.to_string(),
            Err(_) => return,
        },
    };

    let merged = merge_components_csp(&current, components_url, telemetry);
    if let Ok(value) = HeaderValue::from_str(&merged) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPONENTS_URL: &str = "http://fe-components";

    #[test]
    fn adds_components_url_to_existing_directives() {
        let merged = merge_components_csp(
            "default-src 'self';script-src 'self';style-src 'self';img-src 'self';font-src 'self'",
            COMPONENTS_URL,
            false,
        );

        assert_eq!(
            merged,
            "default-src 'self';script-src 'self' http://fe-components;style-src 'self' http://fe-components;img-src 'self' http://fe-components;font-src 'self' http://fe-components",
        );
    }

    #[test]
    fn appends_required_directives_that_are_not_present() {
        let merged = merge_components_csp("default-src 'self'", COMPONENTS_URL, false);

        assert_eq!(
            merged,
            "default-src 'self';script-src 'self' http://fe-components;style-src 'self' http://fe-components;img-src 'self' http://fe-components;font-src 'self' http://fe-components",
        );
    }

    #[test]
    fn does_not_duplicate_an_existing_components_source() {
        let input = "default-src 'self';script-src 'self' http://fe-components;style-src 'self' http://fe-components;img-src 'self' http://fe-components;font-src 'self'";

        let merged = merge_components_csp(input, COMPONENTS_URL, false);

        assert_eq!(
            merged,
            "default-src 'self';script-src 'self' http://fe-components;style-src 'self' http://fe-components;img-src 'self' http://fe-components;font-src 'self' http://fe-components",
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let once = merge_components_csp("default-src 'self'", COMPONENTS_URL, true);
        let twice = merge_components_csp(&once, COMPONENTS_URL, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_header_produces_all_managed_directives() {
        let merged = merge_components_csp("", COMPONENTS_URL, false);

        assert_eq!(
            merged,
            "script-src 'self' http://fe-components;style-src 'self' http://fe-components;img-src 'self' http://fe-components;font-src 'self' http://fe-components",
        );
    }

    #[test]
    fn never_matches_longer_directive_names() {
        let merged = merge_components_csp("script-src-elem 'self'", COMPONENTS_URL, false);

        assert!(merged.starts_with("script-src-elem 'self';"));
        assert!(merged.contains("script-src 'self' http://fe-components"));
    }

    #[test]
    fn telemetry_flag_appends_connect_src() {
        let merged = merge_components_csp(
            "default-src 'self';script-src 'self';style-src 'self';img-src 'self';font-src 'self'",
            COMPONENTS_URL,
            true,
        );

        assert_eq!(
            merged,
            "default-src 'self';script-src 'self' http://fe-components;style-src 'self' http://fe-components;img-src 'self' http://fe-components;font-src 'self' http://fe-components;connect-src 'self' https://northeurope-0.in.applicationinsights.azure.com *.monitor.azure.com",
        );
    }

    #[test]
    fn telemetry_flag_keeps_an_existing_connect_src_intact() {
        let input = "default-src 'self';script-src 'self' http://fe-components;style-src 'self' http://fe-components;img-src 'self' http://fe-components;font-src 'self' http://fe-components;connect-src 'self' *.something.com https://northeurope-0.in.applicationinsights.azure.com *.monitor.azure.com";

        let merged = merge_components_csp(input, COMPONENTS_URL, true);

        assert_eq!(merged, input);
    }

    #[test]
    fn telemetry_flag_adds_only_the_missing_domain() {
        let merged = merge_components_csp(
            "connect-src 'self' *.monitor.azure.com",
            COMPONENTS_URL,
            true,
        );

        assert!(merged.starts_with(
            "connect-src 'self' *.monitor.azure.com https://northeurope-0.in.applicationinsights.azure.com"
        ));
    }

    #[test]
    fn apply_sets_the_header_on_a_map_without_one() {
        let mut headers = HeaderMap::new();
        apply_components_csp(&mut headers, COMPONENTS_URL, false);

        let value = headers.get(CONTENT_SECURITY_POLICY).unwrap();
        assert!(value.to_str().unwrap().contains("script-src 'self' http://fe-components"));
    }

    #[test]
    fn apply_merges_into_an_existing_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'"),
        );

        apply_components_csp(&mut headers, COMPONENTS_URL, false);

        let value = headers.get(CONTENT_SECURITY_POLICY).unwrap().to_str().unwrap();
        assert!(value.starts_with("default-src 'self';"));
        assert!(value.contains("font-src 'self' http://fe-components"));
    }
}
