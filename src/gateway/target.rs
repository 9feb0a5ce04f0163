//! Backend URL construction.
//!
//! Every target has the shape
//! `<api_url>/api/<backend path>[/<path param>][?<query>]`.

use std::collections::BTreeMap;

use url::Url;

use crate::gateway::GatewayError;
use crate::routing::ResolvedPath;

/// Query forwarded to the backend.
#[derive(Debug, Clone, Copy)]
pub enum TargetQuery<'a> {
    /// Decoded pairs, re-encoded as a form query.
    Pairs(&'a BTreeMap<String, String>),
    /// Raw query string copied verbatim.
    Raw(Option<&'a str>),
}

/// Build the outbound URL for a resolved path.
pub fn build_target(
    base: &Url,
    path: &ResolvedPath,
    query: TargetQuery<'_>,
) -> Result<Url, GatewayError> {
    let mut url = match path {
        ResolvedPath::Listed {
            backend_path,
            path_param,
            ..
        } => {
            if let Some(param @ ("." | "..")) = path_param.as_deref() {
                return Err(GatewayError::InvalidPath(format!(
                    "'{}' is not a valid path parameter",
                    param
                )));
            }
            let mut url = base.clone();
            url.set_query(None);
            url.set_fragment(None);
            {
                let mut segments = url.path_segments_mut().map_err(|_| {
                    GatewayError::InvalidTarget(format!("'{}' cannot be a base URL", base))
                })?;
                segments
                    .pop_if_empty()
                    .push("api")
                    .extend(backend_path.split('/'));
                if let Some(param) = path_param {
                    segments.push(param);
                }
            }
            url
        }
        ResolvedPath::Raw { path, .. } => {
            let joined = format!("{}/api/{}", base.as_str().trim_end_matches('/'), path);
            Url::parse(&joined).map_err(|e| GatewayError::InvalidTarget(e.to_string()))?
        }
    };

    match query {
        TargetQuery::Pairs(pairs) if !pairs.is_empty() => {
            url.query_pairs_mut().extend_pairs(pairs.iter());
        }
        TargetQuery::Raw(Some(raw)) if !raw.is_empty() => {
            url.set_query(Some(raw));
        }
        _ => {}
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointsConfig;
    use crate::gateway::ProxyRequest;
    use crate::routing::EndpointTable;

    fn base() -> Url {
        Url::parse("http://api:8000").unwrap()
    }

    fn target_for(query: &str) -> Url {
        let req = ProxyRequest::from_query_string(Some(query));
        let table = EndpointTable::from_config(&EndpointsConfig::default());
        let resolved = table.resolve(&req.endpoint, req.path_param.as_deref()).unwrap();
        build_target(&base(), &resolved, TargetQuery::Pairs(&req.query)).unwrap()
    }

    #[test]
    fn test_dns_example() {
        let url = target_for("endpoint=dns&pathParam=example.com");
        assert_eq!(url.as_str(), "http://api:8000/api/dns/example.com");
    }

    #[test]
    fn test_single_api_prefix() {
        for endpoint in ["healthcheck", "/api/healthcheck"] {
            let url = target_for(&format!("endpoint={}", endpoint));
            assert_eq!(url.path(), "/api/healthcheck");
            assert_eq!(url.query(), None);
        }
    }

    #[test]
    fn test_path_param_is_encoded_and_not_forwarded() {
        let url = target_for("endpoint=dns&pathParam=a%20b%2Fc%3Fd&x=1");
        assert_eq!(url.path(), "/api/dns/a%20b%2Fc%3Fd");
        let pairs: Vec<_> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("x".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_remaining_params_forwarded_unmodified() {
        let url = target_for("endpoint=curl&url=https%3A%2F%2Fexample.com%2F%3Fq%3D1%26r%3D2&mode=a+b");
        let forwarded: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(forwarded.len(), 2);
        assert_eq!(forwarded["url"], "https://example.com/?q=1&r=2");
        assert_eq!(forwarded["mode"], "a b");
        assert!(!forwarded.contains_key("endpoint"));
    }

    #[test]
    fn test_every_path_param_keeps_its_segment() {
        for (param, path) in [
            ("...", "/api/dns/..."),
            ("a..b", "/api/dns/a..b"),
            (".hidden", "/api/dns/.hidden"),
            ("%2E%2E", "/api/dns/%252E%252E"),
        ] {
            let resolved = ResolvedPath::Listed {
                endpoint: "dns".into(),
                backend_path: "dns".into(),
                path_param: Some(param.into()),
            };
            let url = build_target(&base(), &resolved, TargetQuery::Raw(None)).unwrap();
            assert_eq!(url.path(), path, "param {:?}", param);
        }

        for param in [".", ".."] {
            let resolved = ResolvedPath::Listed {
                endpoint: "dns".into(),
                backend_path: "dns".into(),
                path_param: Some(param.into()),
            };
            assert!(matches!(
                build_target(&base(), &resolved, TargetQuery::Raw(None)),
                Err(GatewayError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_base_with_path_prefix() {
        let base = Url::parse("http://gw.internal/diag/").unwrap();
        let resolved = ResolvedPath::Listed {
            endpoint: "ip".into(),
            backend_path: "ip".into(),
            path_param: None,
        };
        let url = build_target(&base, &resolved, TargetQuery::Raw(None)).unwrap();
        assert_eq!(url.as_str(), "http://gw.internal/diag/api/ip");
    }

    #[test]
    fn test_raw_path_and_query_copied() {
        let resolved = ResolvedPath::Raw {
            endpoint: "dns".into(),
            path: "dns/a%2Fb".into(),
        };
        let url = build_target(&base(), &resolved, TargetQuery::Raw(Some("x=1&y=%20"))).unwrap();
        assert_eq!(url.as_str(), "http://api:8000/api/dns/a%2Fb?x=1&y=%20");
    }
}
