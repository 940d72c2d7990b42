//! HTTP client construction for platform requests.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, REFERER, USER_AGENT};
use reqwest::{redirect, Client, Proxy};

use crate::config::Config;
use crate::constants::WEB_APP_ID;
use crate::harness::ProxyProvider;

/// Build the client used for all requests against the platform.
///
/// Redirects are disabled so login redirects surface as observable 302
/// responses instead of being followed into the wall. The session
/// credential is attached as a cookie on every request.
///
/// # Errors
///
/// Returns an error if the configured user agent, session id, or proxy URL
/// cannot be used.
pub fn build_client(config: &Config, proxies: Option<&dyn ProxyProvider>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
    );
    headers.insert("X-IG-App-ID", HeaderValue::from_static(WEB_APP_ID));
    headers.insert(
        REFERER,
        HeaderValue::from_static("https://www.instagram.com/"),
    );

    let mut cookie = HeaderValue::from_str(&format!("sessionid={}", config.session_id))
        .context("Invalid session id")?;
    cookie.set_sensitive(true);
    headers.insert(COOKIE, cookie);

    let mut builder = Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout)
        .redirect(redirect::Policy::none())
        .gzip(true);

    // A harness-supplied proxy takes precedence over the static one.
    let proxy_url = proxies
        .and_then(|p| p.next_proxy())
        .map(|u| u.to_string())
        .or_else(|| config.proxy_url.clone());
    if let Some(url) = proxy_url {
        builder = builder.proxy(Proxy::all(&url).context("Invalid proxy URL")?);
    }

    builder.build().context("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_with_defaults() {
        let config = Config::for_testing();
        assert!(build_client(&config, None).is_ok());
    }

    #[test]
    fn test_build_client_rejects_bad_proxy() {
        let config = Config {
            proxy_url: Some("not a url".to_string()),
            ..Config::for_testing()
        };
        assert!(build_client(&config, None).is_err());
    }
}
