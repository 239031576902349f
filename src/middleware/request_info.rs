use actix_web::{FromRequest, HttpRequest, dev::Payload};
use std::future::{Ready, ready};

use super::request_id::RequestIdExt;

/// Client details recorded alongside audit entries.
#[derive(Clone, Debug)]
pub struct RequestInfo {
    pub user_agent: String,
    pub ip_address: String,
    pub method: String,
    pub path: String,
    pub correlation_id: Option<String>,
}

impl RequestInfo {
    pub fn from_http_request(req: &HttpRequest) -> Self {
        RequestInfo {
            user_agent: req
                .headers()
                .get("user-agent")
                .and_then(|h| h.to_str().ok())
                .unwrap_or("unknown")
                .to_string(),
            ip_address: req
                .connection_info()
                .realip_remote_addr()
                .map(strip_port)
                .unwrap_or("unknown")
                .to_string(),
            method: req.method().to_string(),
            path: req.path().to_string(),
            correlation_id: req.correlation_id(),
        }
    }
}

// "203.0.113.7:51234" -> "203.0.113.7"; bracketed IPv6 keeps its address only.
fn strip_port(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(addr);
    }
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            host
        }
        _ => addr,
    }
}

impl FromRequest for RequestInfo {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(RequestInfo::from_http_request(req)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_port_handles_ipv4_ipv6_and_bare_hosts() {
        assert_eq!(strip_port("203.0.113.7:51234"), "203.0.113.7");
        assert_eq!(strip_port("203.0.113.7"), "203.0.113.7");
        assert_eq!(strip_port("[2001:db8::1]:8080"), "2001:db8::1");
        assert_eq!(strip_port("2001:db8::1"), "2001:db8::1");
    }
}
