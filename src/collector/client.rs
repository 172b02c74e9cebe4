//! Beat HTTP 클라이언트
//!
//! 타임아웃과 TLS 설정은 클라이언트 생성 시 고정되고,
//! 메서드, 헤더, 인증 정보는 요청마다 설정에서 읽습니다.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, HOST};
use reqwest::{Certificate, Client, ClientBuilder, Identity, Method};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, instrument, trace};

use super::parser::{parse_json, CollectResult};
use crate::config::BeatConfig;
use crate::error::CollectorError;

/// 설정으로부터 HTTP 클라이언트 생성
///
/// # Errors
/// TLS 파일을 읽거나 해석할 수 없으면 `CollectorError::Tls`,
/// 클라이언트 초기화가 실패하면 `CollectorError::HttpClientInit`
pub fn build_http_client(config: &BeatConfig) -> CollectResult<Client> {
    let mut builder = ClientBuilder::new()
        .timeout(config.timeout)
        .danger_accept_invalid_certs(config.insecure_skip_verify);

    if let Some(ca) = &config.tls_ca {
        let pem = read_pem(ca)?;
        let cert = Certificate::from_pem(&pem)
            .map_err(|e| CollectorError::Tls(format!("invalid CA '{}': {}", ca.display(), e)))?;
        builder = builder.add_root_certificate(cert);
    }

    match (&config.tls_cert, &config.tls_key) {
        (Some(cert), Some(key)) => {
            let mut pem = read_pem(cert)?;
            pem.push(b'\n');
            pem.extend(read_pem(key)?);
            let identity = Identity::from_pem(&pem).map_err(|e| {
                CollectorError::Tls(format!(
                    "invalid client certificate '{}': {}",
                    cert.display(),
                    e
                ))
            })?;
            builder = builder.identity(identity);
        }
        (None, None) => {}
        _ => {
            return Err(CollectorError::Config(
                "tls_cert and tls_key must be set together".to_string(),
            ))
        }
    }

    builder.build().map_err(CollectorError::HttpClientInit)
}

fn read_pem(path: &Path) -> CollectResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| CollectorError::Tls(format!("cannot read '{}': {}", path.display(), e)))
}

/// 설정된 요청 옵션으로 JSON 문서를 가져오는 fetcher
pub struct Fetcher<'a> {
    client: &'a Client,
    config: &'a BeatConfig,
}

impl<'a> Fetcher<'a> {
    /// 공유 클라이언트와 현재 설정으로 fetcher 생성
    pub fn new(client: &'a Client, config: &'a BeatConfig) -> Self {
        Self { client, config }
    }

    /// 요청 메서드 (비어 있으면 GET)
    fn method(&self) -> CollectResult<Method> {
        if self.config.method.is_empty() {
            return Ok(Method::GET);
        }

        Method::from_bytes(self.config.method.as_bytes()).map_err(|_| {
            CollectorError::Config(format!("invalid HTTP method '{}'", self.config.method))
        })
    }

    /// 사용자 정의 헤더와 Host 재정의를 합친 헤더 맵
    ///
    /// `host_header` 가 설정되면 `headers` 에 있던 Host 값은 대체됩니다.
    pub(crate) fn request_headers(&self) -> CollectResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                CollectorError::Config(format!("invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                CollectorError::Config(format!("invalid value for header '{}': {}", name, e))
            })?;
            headers.append(name, value);
        }

        if !self.config.host_header.is_empty() {
            let host = HeaderValue::from_str(&self.config.host_header).map_err(|e| {
                CollectorError::Config(format!(
                    "invalid host header '{}': {}",
                    self.config.host_header, e
                ))
            })?;
            headers.insert(HOST, host);
        }

        Ok(headers)
    }

    /// `url` 을 요청하고 본문을 `T` 로 디코딩
    #[instrument(skip(self), fields(method = %self.config.method))]
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> CollectResult<T> {
        let mut req = self.client.request(self.method()?, url);

        if !self.config.username.is_empty() || !self.config.password.is_empty() {
            req = req.basic_auth(&self.config.username, Some(&self.config.password));
        }

        req = req.headers(self.request_headers()?);

        debug!("Sending Beat request");

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                CollectorError::timeout_with_duration(self.config.timeout.as_millis() as u64)
            } else {
                CollectorError::from(e)
            }
        })?;

        debug!(status = response.status().as_u16(), "Received Beat response");

        let body = response
            .bytes()
            .await
            .map_err(CollectorError::HttpResponse)?;

        trace!(bytes = body.len(), "Decoding Beat response body");

        parse_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_build_default_client() {
        assert!(build_http_client(&BeatConfig::default()).is_ok());
    }

    #[test]
    fn test_build_insecure_client() {
        let config = BeatConfig {
            insecure_skip_verify: true,
            ..BeatConfig::default()
        };
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_missing_ca_file() {
        let config = BeatConfig {
            tls_ca: Some(PathBuf::from("/nonexistent/ca.pem")),
            ..BeatConfig::default()
        };
        let err = build_http_client(&config).unwrap_err();
        assert!(matches!(err, CollectorError::Tls(_)));
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_invalid_client_identity() {
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        writeln!(cert, "not a certificate").unwrap();
        let mut key = tempfile::NamedTempFile::new().unwrap();
        writeln!(key, "not a key").unwrap();

        let config = BeatConfig {
            tls_cert: Some(cert.path().to_path_buf()),
            tls_key: Some(key.path().to_path_buf()),
            ..BeatConfig::default()
        };
        assert!(matches!(
            build_http_client(&config),
            Err(CollectorError::Tls(_))
        ));
    }

    #[test]
    fn test_unpaired_client_cert() {
        let config = BeatConfig {
            tls_cert: Some(PathBuf::from("/etc/beat/cert.pem")),
            ..BeatConfig::default()
        };
        let err = build_http_client(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_method_resolution() {
        let client = Client::new();

        let mut config = BeatConfig::default();
        config.method = String::new();
        assert_eq!(Fetcher::new(&client, &config).method().unwrap(), Method::GET);

        config.method = "POST".to_string();
        assert_eq!(Fetcher::new(&client, &config).method().unwrap(), Method::POST);

        config.method = "BAD METHOD".to_string();
        let err = Fetcher::new(&client, &config).method().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_host_header_replaces_custom_host() {
        let client = Client::new();
        let mut config = BeatConfig::default();
        config
            .headers
            .insert("Host".to_string(), "from-headers".to_string());
        config
            .headers
            .insert("X-Test".to_string(), "test-value".to_string());
        config.host_header = "beat.test.local".to_string();

        let headers = Fetcher::new(&client, &config).request_headers().unwrap();
        let hosts: Vec<_> = headers.get_all(HOST).iter().collect();
        assert_eq!(hosts, vec!["beat.test.local"]);
        assert_eq!(headers.get("x-test").unwrap(), "test-value");
    }

    #[test]
    fn test_custom_host_kept_without_override() {
        let client = Client::new();
        let mut config = BeatConfig::default();
        config
            .headers
            .insert("Host".to_string(), "from-headers".to_string());

        let headers = Fetcher::new(&client, &config).request_headers().unwrap();
        assert_eq!(headers.get(HOST).unwrap(), "from-headers");
    }

    #[test]
    fn test_invalid_header_name() {
        let client = Client::new();
        let mut config = BeatConfig::default();
        config
            .headers
            .insert("Bad Header".to_string(), "x".to_string());

        let err = Fetcher::new(&client, &config).request_headers().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
