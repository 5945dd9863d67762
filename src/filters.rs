//! Candidate filtering stages: deduplication, whitelisting and root-domain validation

use crate::lookups::RootDomainSet;
use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// Collapse exact duplicates (case-sensitive)
///
/// The output is in sorted order, not order of appearance.
pub fn dedup_sorted(mut candidates: Vec<String>) -> Vec<String> {
    candidates.sort_unstable();
    candidates.dedup();
    candidates
}

/// True if the address falls inside any whitelisted range
pub fn is_whitelisted_ip(ip: IpAddr, networks: &[IpNetwork]) -> bool {
    networks.iter().any(|network| network.contains(ip))
}

/// True if any whitelist entry occurs anywhere in the candidate
///
/// Plain substring test: "apple.com" also matches "notapple.com.evil.tld".
pub fn is_whitelisted_domain(candidate: &str, domains: &[String]) -> bool {
    domains.iter().any(|domain| candidate.contains(domain.as_str()))
}

/// Drop candidates containing a whitelisted domain substring
pub fn filter_domains(candidates: Vec<String>, domains: &[String]) -> Vec<String> {
    candidates
        .into_iter()
        .filter(|candidate| !is_whitelisted_domain(candidate, domains))
        .collect()
}

/// Keep hostnames whose last dot-delimited label is a known root domain
pub fn validate_root_domains(candidates: Vec<String>, roots: &RootDomainSet) -> Vec<String> {
    candidates
        .into_iter()
        .filter(|hostname| {
            hostname
                .rsplit('.')
                .next()
                .is_some_and(|label| roots.contains(label))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::parse_network;
    use std::net::Ipv4Addr;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dedup_keeps_first_sorted_element() {
        // A wrap-around comparison against the last element would drop "a" here
        let deduped = dedup_sorted(strings(&["b", "a", "b", "a"]));
        assert_eq!(deduped, strings(&["a", "b"]));

        let deduped = dedup_sorted(strings(&["x"]));
        assert_eq!(deduped, strings(&["x"]));

        assert!(dedup_sorted(Vec::new()).is_empty());
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let deduped = dedup_sorted(strings(&["Host.com", "host.com", "host.com"]));
        assert_eq!(deduped, strings(&["Host.com", "host.com"]));
    }

    #[test]
    fn test_whitelisted_ip() {
        let networks = vec![
            parse_network("127.0.0.1").unwrap(),
            parse_network("10.0.0.0/8").unwrap(),
        ];
        assert!(is_whitelisted_ip(IpAddr::V4(Ipv4Addr::new(10, 20, 30, 40)), &networks));
        assert!(is_whitelisted_ip(IpAddr::V4(Ipv4Addr::LOCALHOST), &networks));
        assert!(!is_whitelisted_ip(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)), &networks));
        assert!(!is_whitelisted_ip(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), &[]));
    }

    #[test]
    fn test_domain_whitelist_is_substring_match() {
        let domains = strings(&["apple.com"]);
        assert!(is_whitelisted_domain("notapple.com.evil.tld", &domains));
        assert!(is_whitelisted_domain("https://apple.com/login", &domains));
        assert!(!is_whitelisted_domain("apple.co", &domains));

        let kept = filter_domains(strings(&["a@apple.com", "b@pear.com"]), &domains);
        assert_eq!(kept, strings(&["b@pear.com"]));
    }

    #[test]
    fn test_root_domain_validation() {
        let roots = RootDomainSet::from_iter(["com", "net", "COM"]);
        let kept = validate_root_domains(
            strings(&["jantje.com", "mail.example.NET", "ab.xyznotatld", "site.com/path"]),
            &roots,
        );
        assert_eq!(kept, strings(&["jantje.com", "mail.example.NET"]));
    }

    #[test]
    fn test_suffixed_hostnames_fail_root_check() {
        let roots = RootDomainSet::from_iter(["com", "net"]);
        let kept = validate_root_domains(
            strings(&[
                "host.example.com/a/b/page.php",
                "cdn.example.net/x/?id=1&y=2",
                "host.example.com?q=v",
            ]),
            &roots,
        );
        // last labels are "php", "net/x/?id=1&y=2" and "com?q=v"
        assert!(kept.is_empty());
    }
}
