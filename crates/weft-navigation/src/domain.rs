//! Registry-controlled domain matching
//!
//! Suffixes come from the full Public Suffix List compiled into `psl`,
//! private registrations included. Hosts under no listed suffix fall back to
//! the implicit `*` rule (the last label is the suffix).

use std::net::IpAddr;

use url::Url;

/// True if `host` is itself a public suffix, e.g. `co.uk` or `github.io`.
pub fn is_public_suffix(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    !host.is_empty() && psl::suffix_str(&host) == Some(host.as_str())
}

/// Returns the registrable domain ("eTLD+1") of `host`, or `None` for IP
/// addresses and hosts that are themselves a public suffix.
pub fn registrable_domain(host: &str) -> Option<String> {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() || host.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>().is_ok() {
        return None;
    }
    if is_public_suffix(&host) {
        return None;
    }

    psl::domain_str(&host).map(str::to_string)
}

/// True if both URLs share a registrable domain, or failing that, a host.
pub fn same_domain_or_host(a: &Url, b: &Url) -> bool {
    let host_a = a.host_str().unwrap_or_default();
    let host_b = b.host_str().unwrap_or_default();

    if let (Some(domain_a), Some(domain_b)) =
        (registrable_domain(host_a), registrable_domain(host_b))
    {
        if domain_a == domain_b {
            return true;
        }
    }

    host_a.eq_ignore_ascii_case(host_b)
}

/// The site a URL belongs to: scheme plus registrable domain (or host).
/// URLs without a host map to their scheme alone, e.g. `about:`.
pub fn site_for_url(url: &Url) -> String {
    match url.host_str() {
        Some(host) if !host.is_empty() => {
            let domain = registrable_domain(host).unwrap_or_else(|| host.to_ascii_lowercase());
            format!("{}://{}", url.scheme(), domain)
        }
        _ => format!("{}:", url.scheme()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("www.google.com").as_deref(), Some("google.com"));
        assert_eq!(registrable_domain("news.bbc.co.uk").as_deref(), Some("bbc.co.uk"));
        assert_eq!(registrable_domain("a.example").as_deref(), Some("a.example"));
        assert_eq!(registrable_domain("co.uk"), None);
        assert_eq!(registrable_domain("127.0.0.1"), None);
        assert_eq!(registrable_domain("localhost"), None);
    }

    #[test]
    fn test_wildcard_and_exception() {
        assert_eq!(registrable_domain("shop.foo.ck").as_deref(), Some("shop.foo.ck"));
        assert_eq!(registrable_domain("www.ck").as_deref(), Some("www.ck"));
    }

    #[test]
    fn test_multi_label_country_suffixes() {
        assert_eq!(registrable_domain("mybank.co.in").as_deref(), Some("mybank.co.in"));
        assert_eq!(registrable_domain("www.shop.com.mx").as_deref(), Some("shop.com.mx"));
        assert_eq!(registrable_domain("news.stuff.co.nz").as_deref(), Some("stuff.co.nz"));
        assert_eq!(registrable_domain("co.in"), None);
        assert_eq!(registrable_domain("com.mx."), None);
        assert!(!same_domain_or_host(
            &url("https://mybank.co.in/"),
            &url("https://attacker.co.in/")
        ));
        assert_ne!(
            site_for_url(&url("https://mybank.co.in/")),
            site_for_url(&url("https://attacker.co.in/"))
        );
    }

    #[test]
    fn test_private_registrations_are_suffixes() {
        assert!(is_public_suffix("github.io"));
        assert!(is_public_suffix("CO.UK"));
        assert!(!is_public_suffix("bbc.co.uk"));
        assert_eq!(registrable_domain("alice.github.io").as_deref(), Some("alice.github.io"));
        assert!(!same_domain_or_host(
            &url("https://alice.github.io/"),
            &url("https://mallory.github.io/")
        ));
    }

    #[test]
    fn test_unknown_tld_uses_last_label() {
        assert_eq!(registrable_domain("mail.corp.zz").as_deref(), Some("corp.zz"));
    }

    #[test]
    fn test_same_domain_or_host() {
        assert!(same_domain_or_host(
            &url("https://mail.google.com/x"),
            &url("http://www.google.com/")
        ));
        assert!(!same_domain_or_host(
            &url("https://a.example/"),
            &url("https://b.example/")
        ));
        assert!(same_domain_or_host(&url("https://a/x"), &url("https://a/y")));
        assert!(!same_domain_or_host(
            &url("http://127.0.0.1/"),
            &url("http://127.0.0.2/")
        ));
    }

    #[test]
    fn test_site_for_url() {
        assert_eq!(site_for_url(&url("https://www.a.example/page")), "https://a.example");
        assert_eq!(site_for_url(&url("about:blank")), "about:");
        assert_eq!(site_for_url(&url("http://localhost:8080/")), "http://localhost");
    }
}
