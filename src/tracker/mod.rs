//! Tracker URL classification
//!
//! Turns announce URLs into the hostnames a routing rule can match on.

use std::net::IpAddr;
use url::{Host, Url};

/// Extract the canonical hostname from a tracker announce URL.
///
/// Returns `None` when the URL does not parse, its scheme does not start with
/// `http`, the host is empty, or the host is an IP literal. The hostname is
/// returned as written in the announce URL: the URL parser only validates, its
/// lowercased or punycode form of the host is not used.
pub fn classify(tracker_url: &str) -> Option<String> {
    let url = Url::parse(tracker_url).ok()?;
    if !url.scheme().starts_with("http") {
        return None;
    }

    match url.host()? {
        Host::Domain(host) if !host.is_empty() && !is_ip_literal(host) => {}
        _ => return None,
    }

    let host = raw_host(tracker_url)?;
    if host.is_empty() || is_ip_literal(host) {
        return None;
    }
    Some(host.to_string())
}

/// Classify every URL, keeping only the accepted hostnames in input order.
pub fn classify_all<'a, I>(tracker_urls: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    tracker_urls.into_iter().filter_map(classify).collect()
}

// Host part of the authority as it appears in the input: userinfo and port
// removed, nothing else touched.
fn raw_host(tracker_url: &str) -> Option<&str> {
    let (_, rest) = tracker_url.trim().split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    let host = if host_port.starts_with('[') {
        match host_port.find(']') {
            Some(end) => &host_port[..=end],
            None => host_port,
        }
    } else {
        host_port.split_once(':').map_or(host_port, |(host, _)| host)
    };
    Some(host)
}

// Non-special schemes such as `httpx` keep an opaque host, so an address can
// still arrive here as a plain string.
fn is_ip_literal(host: &str) -> bool {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    bare.parse::<IpAddr>().is_ok()
}
