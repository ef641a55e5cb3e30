use std::net::IpAddr;

use ipnet::IpNet;
use opsgate_core::ApiCredential;
use opsgate_domain::ExecutionMode;

/// Network and credential facts about one inbound request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessRequest<'a> {
    /// Address of the immediate TCP peer.
    pub peer: Option<IpAddr>,
    /// Raw `X-Forwarded-For` header value.
    pub forwarded_for: Option<&'a str>,
    /// Raw `Authorization` header value.
    pub authorization: Option<&'a str>,
}

/// Derives the execution mode of a request from its origin and credential.
///
/// Pure: the outcome depends only on the request facts and the configuration
/// captured at construction.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    credential: Option<ApiCredential>,
    trusted_network: IpNet,
    trusted_proxy: Option<IpAddr>,
}

impl AccessPolicy {
    /// Creates an access policy.
    #[must_use]
    pub fn new(
        credential: Option<ApiCredential>,
        trusted_network: IpNet,
        trusted_proxy: Option<IpAddr>,
    ) -> Self {
        Self {
            credential,
            trusted_network,
            trusted_proxy,
        }
    }

    /// Resolves the effective client address.
    ///
    /// `X-Forwarded-For` is honoured only when the peer is the trusted proxy.
    #[must_use]
    pub fn client_address(&self, request: &AccessRequest<'_>) -> Option<IpAddr> {
        let peer = request.peer.map(|peer| peer.to_canonical());

        if self.trusted_proxy.is_some() && peer == self.trusted_proxy {
            let forwarded = request
                .forwarded_for
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty());
            if let Some(forwarded) = forwarded {
                return forwarded
                    .parse::<IpAddr>()
                    .ok()
                    .map(|address| address.to_canonical());
            }
        }

        peer
    }

    /// Returns whether the `Authorization` header carries the configured secret.
    ///
    /// Always false when no secret is configured.
    #[must_use]
    pub fn has_valid_credential(&self, authorization: Option<&str>) -> bool {
        self.credential
            .as_ref()
            .is_some_and(|credential| credential.matches_bearer(authorization))
    }

    /// Returns whether the address lies inside the trusted network.
    #[must_use]
    pub fn is_trusted_address(&self, address: Option<IpAddr>) -> bool {
        address.is_some_and(|address| self.trusted_network.contains(&address))
    }

    /// Returns `live` iff the credential matches and the client is trusted.
    #[must_use]
    pub fn resolve_mode(&self, request: &AccessRequest<'_>) -> ExecutionMode {
        if self.has_valid_credential(request.authorization)
            && self.is_trusted_address(self.client_address(request))
        {
            ExecutionMode::Live
        } else {
            ExecutionMode::Mock
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;

    use ipnet::IpNet;
    use opsgate_core::ApiCredential;
    use opsgate_domain::ExecutionMode;

    use super::{AccessPolicy, AccessRequest};

    fn ip(value: &str) -> IpAddr {
        value.parse().unwrap_or_else(|_| unreachable!())
    }

    fn policy(proxy: Option<&str>) -> AccessPolicy {
        let network: IpNet = "198.51.100.0/24".parse().unwrap_or_else(|_| unreachable!());
        AccessPolicy::new(ApiCredential::new("secret"), network, proxy.map(ip))
    }

    #[test]
    fn token_and_trusted_subnet_resolve_live() {
        let request = AccessRequest {
            peer: Some(ip("198.51.100.10")),
            authorization: Some("Bearer secret"),
            ..AccessRequest::default()
        };
        assert_eq!(policy(None).resolve_mode(&request), ExecutionMode::Live);
    }

    #[test]
    fn missing_token_or_untrusted_address_resolve_mock() {
        let no_token = AccessRequest {
            peer: Some(ip("198.51.100.10")),
            ..AccessRequest::default()
        };
        let untrusted = AccessRequest {
            peer: Some(ip("10.0.0.1")),
            authorization: Some("Bearer secret"),
            ..AccessRequest::default()
        };
        let wrong_token = AccessRequest {
            peer: Some(ip("198.51.100.10")),
            authorization: Some("Bearer wrong"),
            ..AccessRequest::default()
        };

        for request in [no_token, untrusted, wrong_token] {
            assert_eq!(policy(None).resolve_mode(&request), ExecutionMode::Mock);
        }
    }

    #[test]
    fn unconfigured_secret_never_matches() {
        let network: IpNet = "0.0.0.0/0".parse().unwrap_or_else(|_| unreachable!());
        let policy = AccessPolicy::new(ApiCredential::new(""), network, None);
        let request = AccessRequest {
            peer: Some(ip("198.51.100.10")),
            authorization: Some("Bearer "),
            ..AccessRequest::default()
        };
        assert_eq!(policy.resolve_mode(&request), ExecutionMode::Mock);
    }

    #[test]
    fn forwarded_for_is_used_only_from_trusted_proxy() {
        let policy = policy(Some("198.51.100.212"));

        let via_proxy = AccessRequest {
            peer: Some(ip("198.51.100.212")),
            forwarded_for: Some("192.168.1.100, 198.51.100.212"),
            ..AccessRequest::default()
        };
        assert_eq!(policy.client_address(&via_proxy), Some(ip("192.168.1.100")));

        let spoofed = AccessRequest {
            peer: Some(ip("10.0.0.99")),
            forwarded_for: Some("198.51.100.10"),
            ..AccessRequest::default()
        };
        assert_eq!(policy.client_address(&spoofed), Some(ip("10.0.0.99")));
    }

    #[test]
    fn unparsable_forwarded_address_is_untrusted() {
        let policy = policy(Some("198.51.100.212"));
        let request = AccessRequest {
            peer: Some(ip("198.51.100.212")),
            forwarded_for: Some("not-an-ip"),
            authorization: Some("Bearer secret"),
        };
        assert_eq!(policy.client_address(&request), None);
        assert_eq!(policy.resolve_mode(&request), ExecutionMode::Mock);
    }

    #[test]
    fn ipv4_mapped_peer_matches_ipv4_subnet() {
        let request = AccessRequest {
            peer: Some(ip("::ffff:198.51.100.10")),
            authorization: Some("Bearer secret"),
            ..AccessRequest::default()
        };
        assert_eq!(policy(None).resolve_mode(&request), ExecutionMode::Live);
    }
}
