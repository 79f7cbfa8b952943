// Deep-link parameter extraction.
//
// OS and browser shells mangle custom-scheme URIs in different ways, so
// extraction runs an ordered list of strategies and takes the first hit.
// Each strategy is a plain function, independently testable.
use once_cell::sync::Lazy;
use regex::Regex;

/// Parameters recovered from an inbound redirect URI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub token: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.error.is_none()
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

/// One extraction strategy: a URI in, parameters out if this strategy
/// could read them
pub type Extractor = fn(&str) -> Option<CallbackParams>;

/// Strategies in the order they are tried
pub const EXTRACTORS: &[Extractor] = &[
    extract_via_url_parse,
    extract_via_scheme_rewrite,
    extract_via_regex,
];

/// Run the strategy list and return the first non-empty result
#[must_use]
pub fn extract_params(uri: &str) -> Option<CallbackParams> {
    for extractor in EXTRACTORS {
        if let Some(params) = extractor(uri) {
            if !params.is_empty() {
                return Some(params);
            }
        }
    }
    None
}

/// Tier 1: structured parse of the URI's query parameters
#[must_use]
pub fn extract_via_url_parse(uri: &str) -> Option<CallbackParams> {
    let parsed = url::Url::parse(uri).ok()?;
    Some(params_from_pairs(parsed.query_pairs()))
}

/// Tier 2: substitute the custom scheme with `https` and re-parse.
/// Catches URIs whose scheme the structured parser rejects outright
/// (some shells hand over schemes with characters `Url::parse` refuses).
#[must_use]
pub fn extract_via_scheme_rewrite(uri: &str) -> Option<CallbackParams> {
    let rest = uri
        .split_once("://")
        .map_or_else(|| uri.split_once(':').map(|(_, r)| r), |(_, r)| Some(r))?;
    let parsed = url::Url::parse(&format!("https://{rest}")).ok()?;
    Some(params_from_pairs(parsed.query_pairs()))
}

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"token=([^&]+)").expect("token pattern is valid")
});
static ERROR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"error=([^&]+)").expect("error pattern is valid")
});

/// Tier 3: last-resort regex scrape of the raw string
#[must_use]
pub fn extract_via_regex(uri: &str) -> Option<CallbackParams> {
    let token = TOKEN_RE
        .captures(uri)
        .map(|c| c[1].to_string());
    let error = ERROR_RE.captures(uri).map(|c| {
        urlencoding::decode(&c[1]).map_or_else(|_| c[1].to_string(), |d| d.into_owned())
    });

    let params = CallbackParams { token, error };
    if params.is_empty() {
        None
    } else {
        Some(params)
    }
}

fn params_from_pairs<'a, I>(pairs: I) -> CallbackParams
where
    I: Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
{
    let mut params = CallbackParams::default();
    for (key, value) in pairs {
        match key.as_ref() {
            "token" if params.token.is_none() => params.token = Some(value.into_owned()),
            "error" if params.error.is_none() => params.error = Some(value.into_owned()),
            _ => {}
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier1_reads_custom_scheme_uri() {
        let params = extract_via_url_parse("networth://auth?token=abc.def.ghi").unwrap();
        assert_eq!(params.token.as_deref(), Some("abc.def.ghi"));
        assert_eq!(params.error, None);
    }

    #[test]
    fn tier1_reads_expo_development_uri() {
        let params =
            extract_via_url_parse("exp://192.168.1.5:8081/--/auth?token=abc.def.ghi").unwrap();
        assert_eq!(params.token.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn tier1_decodes_percent_encoded_error() {
        let params = extract_via_url_parse("networth://auth?error=access%20denied").unwrap();
        assert_eq!(params.error.as_deref(), Some("access denied"));
    }

    #[test]
    fn tier2_handles_schemes_the_structured_parser_rejects() {
        // Underscore is not a valid scheme character, so tier 1 fails here
        assert!(extract_via_url_parse("net_worth://auth?token=abc").is_none());
        let params = extract_via_scheme_rewrite("net_worth://auth?token=abc").unwrap();
        assert_eq!(params.token.as_deref(), Some("abc"));
    }

    #[test]
    fn tier2_handles_schemes_without_authority() {
        let params = extract_via_scheme_rewrite("networth:auth?token=abc").unwrap();
        assert_eq!(params.token.as_deref(), Some("abc"));
    }

    #[test]
    fn tier3_scrapes_raw_strings() {
        let params = extract_via_regex("some garbage token=abc.def.ghi&rest").unwrap();
        assert_eq!(params.token.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn tier3_urldecodes_errors() {
        let params = extract_via_regex("x error=access%5Fdenied").unwrap();
        assert_eq!(params.error.as_deref(), Some("access_denied"));
    }

    #[test]
    fn extract_params_walks_the_tiers_in_order() {
        // Well-formed: tier 1 answers
        assert_eq!(
            extract_params("networth://auth?token=t1").unwrap().token.as_deref(),
            Some("t1")
        );
        // Scheme tier 1 rejects: tier 2 answers
        assert_eq!(
            extract_params("net_worth://auth?token=t2").unwrap().token.as_deref(),
            Some("t2")
        );
        // Not a URI at all: tier 3 answers
        assert_eq!(
            extract_params("}{ token=t3").unwrap().token.as_deref(),
            Some("t3")
        );
    }

    #[test]
    fn extract_params_returns_none_when_nothing_matches() {
        assert_eq!(extract_params("networth://auth"), None);
        assert_eq!(extract_params("complete garbage"), None);
    }

    #[test]
    fn token_takes_nothing_away_from_error() {
        let params = extract_params("networth://auth?token=t&error=e").unwrap();
        assert_eq!(params.token.as_deref(), Some("t"));
        assert_eq!(params.error.as_deref(), Some("e"));
    }
}
