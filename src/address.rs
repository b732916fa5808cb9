//! Where a request comes from: remote IP and the MAC address resolved for it.

use std::{fmt::Debug, net::SocketAddr};

use axum::extract::ConnectInfo;
use http::{HeaderMap, Request};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Network identity of the current request, compared against the one recorded in a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip: String,
    pub mac: String,
}

impl RequestContext {
    pub fn new(ip: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            mac: normalize_mac(&mac.into()),
        }
    }

    /// Resolve the remote IP of `req` and look up its MAC with `resolver`.
    pub fn from_request<B, M: MacResolver + ?Sized>(req: &Request<B>, resolver: &M) -> Self {
        let ip = remote_ip(req);
        let mac = normalize_mac(&resolver.resolve(&ip));
        Self { ip, mac }
    }
}

/// Best-effort MAC lookup for an IP address.
///
/// Most deployments cannot see the client's hardware address; [`UnresolvedMac`] is the
/// default and always yields an empty string.
pub trait MacResolver: Debug + Send + Sync + 'static {
    fn resolve(&self, ip: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnresolvedMac;

impl MacResolver for UnresolvedMac {
    fn resolve(&self, _ip: &str) -> String {
        String::new()
    }
}

/// A [`MacResolver`] backed by a function.
#[derive(Clone)]
pub struct MacResolverFn<F>(pub F);

impl<F> Debug for MacResolverFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MacResolverFn")
    }
}

impl<F> MacResolver for MacResolverFn<F>
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    fn resolve(&self, ip: &str) -> String {
        (self.0)(ip)
    }
}

/// Strip the hyphens from a MAC address (`AA-BB-CC-DD-EE-FF` -> `AABBCCDDEEFF`).
pub fn normalize_mac(mac: &str) -> String {
    mac.replace('-', "")
}

/// The client address of `req`.
///
/// Proxy headers win over the socket peer: the first usable `X-Forwarded-For` entry, then
/// `X-Real-IP`, then axum's [`ConnectInfo`]. Empty when none is available.
pub fn remote_ip<B>(req: &Request<B>) -> String {
    forwarded_ip(req.headers())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_default()
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .find(|ip| is_usable(ip));

    forwarded
        .or_else(|| {
            headers
                .get(X_REAL_IP)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|ip| is_usable(ip))
        })
        .map(str::to_owned)
}

fn is_usable(ip: &str) -> bool {
    !ip.is_empty() && !ip.eq_ignore_ascii_case("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).expect("request builds successfully")
    }

    #[test]
    fn forwarded_for_takes_first_usable_entry() {
        let req = request(&[("x-forwarded-for", "unknown, 10.0.0.1, 192.168.1.1")]);
        assert_eq!(remote_ip(&req), "10.0.0.1");
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let req = request(&[("x-forwarded-for", "unknown"), ("x-real-ip", "10.0.0.2")]);
        assert_eq!(remote_ip(&req), "10.0.0.2");
    }

    #[test]
    fn connect_info_is_used_without_proxy_headers() {
        let mut req = request(&[]);
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(remote_ip(&req), "127.0.0.1");
    }

    #[test]
    fn no_address_is_empty() {
        assert_eq!(remote_ip(&request(&[])), "");
    }

    #[test]
    fn context_normalizes_resolved_mac() {
        let req = request(&[("x-real-ip", "10.0.0.1")]);
        let resolver = MacResolverFn(|ip: &str| {
            assert_eq!(ip, "10.0.0.1");
            "AA-BB-CC-DD-EE-FF".to_owned()
        });

        let ctx = RequestContext::from_request(&req, &resolver);
        assert_eq!(ctx, RequestContext::new("10.0.0.1", "AABBCCDDEEFF"));

        let ctx = RequestContext::from_request(&req, &UnresolvedMac);
        assert_eq!(ctx.mac, "");
    }
}
