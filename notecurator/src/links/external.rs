//! Reachability check for a single external URL.

use notecurator_types::{ExternalCheck, LinkStatus};
use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;
use url::Url;

fn outcome(status: LinkStatus, code: Option<u16>) -> ExternalCheck {
    ExternalCheck {
        status,
        code,
        redirect_target: None,
        error: None,
    }
}

fn failure(status: LinkStatus, error: impl Into<String>) -> ExternalCheck {
    ExternalCheck {
        status,
        code: None,
        redirect_target: None,
        error: Some(error.into()),
    }
}

/// Parse and validate an http(s) URL.
pub fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| format!("invalid URL: {}", e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

/// HEAD the URL (GET when the server refuses HEAD) without following redirects.
///
/// `client` must be built with redirects disabled.
pub async fn check_url(client: &Client, raw: &str, timeout: Duration) -> ExternalCheck {
    let url = match parse_http_url(raw) {
        Ok(u) => u,
        Err(e) => return failure(LinkStatus::Error, e),
    };

    let response = match send(client, Method::HEAD, &url, timeout).await {
        Ok(r) => r,
        Err(check) => return check,
    };

    let response = match response.status() {
        StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
            log::debug!("[LINKS] HEAD refused by {}, retrying with GET", url);
            match send(client, Method::GET, &url, timeout).await {
                Ok(r) => r,
                Err(check) => return check,
            }
        }
        _ => response,
    };

    classify_response(&url, &response)
}

async fn send(
    client: &Client,
    method: Method,
    url: &Url,
    timeout: Duration,
) -> Result<Response, ExternalCheck> {
    match tokio::time::timeout(timeout, client.request(method, url.clone()).send()).await {
        Err(_) => Err(failure(
            LinkStatus::Timeout,
            format!("no response within {:?}", timeout),
        )),
        Ok(Err(e)) if e.is_timeout() => Err(failure(LinkStatus::Timeout, e.to_string())),
        Ok(Err(e)) if e.is_connect() => Err(failure(LinkStatus::Broken, e.to_string())),
        Ok(Err(e)) => Err(failure(LinkStatus::Error, e.to_string())),
        Ok(Ok(response)) => Ok(response),
    }
}

fn classify_response(url: &Url, response: &Response) -> ExternalCheck {
    let status = response.status();
    let code = Some(status.as_u16());

    if status.is_success() {
        outcome(LinkStatus::Valid, code)
    } else if status.is_redirection() {
        let target = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|loc| url.join(loc).ok())
            .map(|u| u.to_string());
        ExternalCheck {
            status: LinkStatus::Redirect,
            code,
            redirect_target: target,
            error: None,
        }
    } else if status.is_client_error() || status.is_server_error() {
        outcome(LinkStatus::Broken, code)
    } else {
        ExternalCheck {
            status: LinkStatus::Error,
            code,
            redirect_target: None,
            error: Some(format!("unexpected status {}", status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/moved"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new-home"))
            .mount(&server)
            .await;

        let c = client();
        let t = Duration::from_secs(5);

        let ok = check_url(&c, &format!("{}/ok", server.uri()), t).await;
        assert_eq!(ok.status, LinkStatus::Valid);
        assert_eq!(ok.code, Some(200));

        let gone = check_url(&c, &format!("{}/gone", server.uri()), t).await;
        assert_eq!(gone.status, LinkStatus::Broken);
        assert_eq!(gone.code, Some(404));

        let moved = check_url(&c, &format!("{}/moved", server.uri()), t).await;
        assert_eq!(moved.status, LinkStatus::Redirect);
        assert_eq!(moved.redirect_target, Some(format!("{}/new-home", server.uri())));
    }

    #[tokio::test]
    async fn test_head_refused_falls_back_to_get() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let check = check_url(&client(), &format!("{}/page", server.uri()), Duration::from_secs(5)).await;
        assert_eq!(check.status, LinkStatus::Valid);
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let check = check_url(&client(), &server.uri(), Duration::from_millis(200)).await;
        assert_eq!(check.status, LinkStatus::Timeout);
    }

    #[tokio::test]
    async fn test_invalid_urls_are_errors() {
        let c = client();
        let t = Duration::from_secs(1);
        assert_eq!(check_url(&c, "not a url", t).await.status, LinkStatus::Error);
        assert_eq!(check_url(&c, "ftp://example.com/x", t).await.status, LinkStatus::Error);
    }
}
