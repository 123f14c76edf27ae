use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

/// Header carrying the client-supplied browser fingerprint, if any.
pub const FINGERPRINT_HEADER: &str = "x-client-fingerprint";

/// The resolved caller of a request.
///
/// An `Identity` is computed fresh for every request and never stored; only
/// the derived counting key (user id or [`AnonymousKey`]) ends up in a
/// counter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// A caller with a verified identity claim from the auth layer.
    Authenticated { user_id: String },
    /// Everyone else, tracked by originating IP plus an optional fingerprint.
    Anonymous {
        ip: String,
        fingerprint: Option<String>,
    },
}

impl Identity {
    /// Stable string key used for the sensitive-action window limiter.
    pub fn window_key(&self) -> String {
        match self {
            Identity::Authenticated { user_id } => format!("user:{user_id}"),
            Identity::Anonymous { ip, fingerprint } => {
                AnonymousKey::derive(ip, fingerprint.as_deref()).to_string()
            }
        }
    }
}

/// Derived counting key for anonymous callers.
///
/// `sha256(ip)` when no fingerprint was supplied, `sha256(ip + ":fp:" + fp)`
/// otherwise. The separator guarantees the hybrid form can never collide with
/// the IP-only form for the same address, so fingerprinted and plain traffic
/// from one IP are tracked separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnonymousKey(String);

impl AnonymousKey {
    pub fn derive(ip: &str, fingerprint: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(ip.as_bytes());
        if let Some(fp) = fingerprint {
            hasher.update(b":fp:");
            hasher.update(fp.as_bytes());
        }
        AnonymousKey(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnonymousKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolve the caller identity from request signals.
///
/// Precedence for the originating IP: first entry of `x-forwarded-for`,
/// then `x-real-ip`, then the transport peer address, then the literal
/// `"unknown"`. This function never fails; a request with no usable
/// signals at all still resolves to an anonymous identity.
pub fn resolve_identity(
    verified_subject: Option<&str>,
    headers: &HeaderMap,
    peer_addr: Option<&str>,
) -> Identity {
    if let Some(subject) = verified_subject {
        return Identity::Authenticated {
            user_id: subject.to_string(),
        };
    }

    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        })
        .or(peer_addr)
        .unwrap_or("unknown")
        .to_string();

    let fingerprint = headers
        .get(FINGERPRINT_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string());

    Identity::Anonymous { ip, fingerprint }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn verified_claim_wins_over_all_headers() {
        let headers = headers(&[("x-forwarded-for", "1.2.3.4"), ("x-real-ip", "5.6.7.8")]);
        let identity = resolve_identity(Some("user-42"), &headers, Some("9.9.9.9"));
        assert_eq!(
            identity,
            Identity::Authenticated {
                user_id: "user-42".to_string()
            }
        );
    }

    #[test]
    fn forwarded_for_takes_first_entry() {
        let headers = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1, 10.0.0.2")]);
        let identity = resolve_identity(None, &headers, Some("10.0.0.3"));
        assert_eq!(
            identity,
            Identity::Anonymous {
                ip: "203.0.113.7".to_string(),
                fingerprint: None
            }
        );
    }

    #[test]
    fn real_ip_used_when_no_forwarded_for() {
        let headers = headers(&[("x-real-ip", "198.51.100.4")]);
        let identity = resolve_identity(None, &headers, Some("10.0.0.3"));
        assert_eq!(
            identity,
            Identity::Anonymous {
                ip: "198.51.100.4".to_string(),
                fingerprint: None
            }
        );
    }

    #[test]
    fn falls_back_to_peer_addr_then_unknown() {
        let empty = HeaderMap::new();
        assert_eq!(
            resolve_identity(None, &empty, Some("10.1.1.1")),
            Identity::Anonymous {
                ip: "10.1.1.1".to_string(),
                fingerprint: None
            }
        );
        assert_eq!(
            resolve_identity(None, &empty, None),
            Identity::Anonymous {
                ip: "unknown".to_string(),
                fingerprint: None
            }
        );
    }

    #[test]
    fn fingerprint_header_is_picked_up() {
        let headers = headers(&[
            ("x-real-ip", "198.51.100.4"),
            (FINGERPRINT_HEADER, "fp-abc"),
        ]);
        let identity = resolve_identity(None, &headers, None);
        assert_eq!(
            identity,
            Identity::Anonymous {
                ip: "198.51.100.4".to_string(),
                fingerprint: Some("fp-abc".to_string())
            }
        );
    }

    #[test]
    fn anonymous_key_separates_fingerprinted_traffic() {
        let plain = AnonymousKey::derive("192.168.1.1", None);
        let hybrid = AnonymousKey::derive("192.168.1.1", Some("fp-abc"));
        let other_fp = AnonymousKey::derive("192.168.1.1", Some("fp-def"));

        assert_ne!(plain, hybrid);
        assert_ne!(hybrid, other_fp);
        // stable across calls
        assert_eq!(plain, AnonymousKey::derive("192.168.1.1", None));
    }

    #[test]
    fn anonymous_key_ignores_concat_ambiguity() {
        // "1.2.3.4" + "x" must not equal "1.2.3.4x" + ""
        let a = AnonymousKey::derive("1.2.3.4", Some("x"));
        let b = AnonymousKey::derive("1.2.3.4x", None);
        assert_ne!(a, b);
    }
}
