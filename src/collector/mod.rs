//! Beat 통계 수집 모듈
//!
//! Beat HTTP 엔드포인트에서 식별 정보와 통계 문서를 가져와
//! 섹션별로 평탄화한 뒤 [`Accumulator`] 로 보고합니다.
//!
//! # Example
//!
//! ```ignore
//! use beat_exporter::accumulator::MemoryAccumulator;
//! use beat_exporter::collector::Beat;
//!
//! let beat = Beat::default();
//! let mut acc = MemoryAccumulator::new();
//! beat.gather(&mut acc).await?;
//! ```

mod client;
mod flatten;
mod parser;

pub use client::{build_http_client, Fetcher};
pub use flatten::{flatten, FieldValue, Fields, Flattener};
pub use parser::{
    parse_info, parse_json, parse_stats, BeatInfo, BeatStats, CollectResult, Section, Tags,
};

use once_cell::sync::OnceCell;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::accumulator::Accumulator;
use crate::config::BeatConfig;
use crate::error::CollectorError;

/// 식별 정보 경로
pub const SUFFIX_INFO: &str = "/";
/// 통계 경로
pub const SUFFIX_STATS: &str = "/stats";

const DESCRIPTION: &str = "Read metrics exposed by Beat";

const SAMPLE_CONFIG: &str = r#"beat:
  ## An URL from which to read Beat-formatted JSON
  ## Default is "http://127.0.0.1:5066".
  url: "http://127.0.0.1:5066"

  ## Enable collection of the Beat stats
  collect_beat_stats: true

  ## Enable the collection of Libbeat stats
  collect_libbeat_stats: true

  ## Enable the collection of OS level stats
  collect_system_stats: true

  ## Enable the collection of Filebeat stats
  collect_filebeat_stats: true

  ## HTTP method
  # method: GET

  ## Optional HTTP headers
  # headers:
  #   X-Special-Header: Special-Value

  ## Override HTTP "Host" header
  # host_header: logstash.example.com

  ## Timeout for HTTP requests
  timeout: 5s

  ## Optional HTTP Basic Auth credentials
  # username: username
  # password: pa$$word

  ## Optional TLS Config
  # tls_ca: /etc/beat-exporter/ca.pem
  # tls_cert: /etc/beat-exporter/cert.pem
  # tls_key: /etc/beat-exporter/key.pem
  ## Use TLS but skip chain & host verification
  # insecure_skip_verify: false

  ## Separator joining nested object keys in field names
  # field_separator: "_"

agent:
  ## Time between two collection cycles
  interval: 10s
"#;

/// Beat 수집기
///
/// HTTP 클라이언트는 첫 `gather` 호출 시 한 번만 만들어지고 이후 재사용됩니다.
/// 설정이 바뀌어도 다시 만들지 않으므로 타임아웃과 TLS 변경은 반영되지 않습니다.
#[derive(Debug, Default)]
pub struct Beat {
    config: BeatConfig,
    client: OnceCell<Client>,
}

impl Beat {
    /// 새 Beat 수집기 생성
    pub fn new(config: BeatConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// 수집기 설명
    pub fn description() -> &'static str {
        DESCRIPTION
    }

    /// 예시 설정 (YAML)
    pub fn sample_config() -> &'static str {
        SAMPLE_CONFIG
    }

    /// 현재 설정
    pub fn config(&self) -> &BeatConfig {
        &self.config
    }

    /// 설정 변경용 참조
    pub fn config_mut(&mut self) -> &mut BeatConfig {
        &mut self.config
    }

    /// 클라이언트가 이미 만들어졌는지 여부
    pub fn has_client(&self) -> bool {
        self.client.get().is_some()
    }

    /// 캐시된 클라이언트 반환, 없으면 생성
    pub fn client(&self) -> CollectResult<&Client> {
        self.client.get_or_try_init(|| build_http_client(&self.config))
    }

    /// 식별 정보 URL
    pub fn info_url(&self) -> CollectResult<url::Url> {
        self.endpoint(SUFFIX_INFO)
    }

    /// 통계 URL
    pub fn stats_url(&self) -> CollectResult<url::Url> {
        self.endpoint(SUFFIX_STATS)
    }

    fn endpoint(&self, suffix: &str) -> CollectResult<url::Url> {
        let raw = format!("{}{}", self.config.url, suffix);
        url::Url::parse(&raw).map_err(|source| CollectorError::InvalidUrl { url: raw, source })
    }

    /// 수집 사이클 1회 실행
    ///
    /// 실패하면 첫 번째 에러를 그대로 반환하며 재시도하지 않습니다.
    pub async fn gather(&self, accumulator: &mut dyn Accumulator) -> CollectResult<()> {
        let client = self.client()?;
        self.gather_stats(client, accumulator).await
    }

    /// 식별 정보를 가져와 공통 태그 생성
    pub async fn resolve_tags(&self, client: &Client) -> CollectResult<Tags> {
        let url = self.info_url()?;
        let info: BeatInfo = Fetcher::new(client, &self.config)
            .fetch_json(url.as_str())
            .await?;

        debug!(beat = %info.beat, name = %info.name, "Resolved Beat identity");

        Ok(info.tags())
    }

    /// 통계 문서를 가져와 활성화된 섹션을 보고
    #[instrument(skip(self, client, accumulator), fields(url = %self.config.url))]
    pub async fn gather_stats(
        &self,
        client: &Client,
        accumulator: &mut dyn Accumulator,
    ) -> CollectResult<()> {
        let info_url = self.info_url()?;
        let stats_url = self.stats_url()?;
        debug!(info = %info_url, stats = %stats_url, "Gathering Beat stats");

        let tags = self.resolve_tags(client).await?;

        let stats: BeatStats = Fetcher::new(client, &self.config)
            .fetch_json(stats_url.as_str())
            .await?;

        let flattener = Flattener::with_separator(self.config.field_separator.as_str());

        for section in Section::ALL {
            if !self.is_enabled(section) {
                continue;
            }

            let fields = flattener.flatten("", stats.section(section))?;
            debug!(
                measurement = section.measurement(),
                fields = fields.len(),
                "Reporting Beat section"
            );
            accumulator.add_fields(section.measurement(), fields, &tags);
        }

        Ok(())
    }

    /// 섹션 수집 여부
    pub fn is_enabled(&self, section: Section) -> bool {
        match section {
            Section::Beat => self.config.collect_beat_stats,
            Section::Filebeat => self.config.collect_filebeat_stats,
            Section::Libbeat => self.config.collect_libbeat_stats,
            Section::System => self.config.collect_system_stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ErrorKind;

    #[test]
    fn test_beat_default() {
        let beat = Beat::default();
        assert_eq!(beat.config().url, "http://127.0.0.1:5066");
        assert!(!beat.has_client());
        assert_eq!(Beat::description(), "Read metrics exposed by Beat");
    }

    #[test]
    fn test_sample_config_parses_to_defaults() {
        let config = Config::from_yaml(Beat::sample_config()).unwrap();
        assert_eq!(config.beat, BeatConfig::default());
    }

    #[test]
    fn test_urls() {
        let beat = Beat::default();
        assert_eq!(beat.info_url().unwrap().as_str(), "http://127.0.0.1:5066/");
        assert_eq!(
            beat.stats_url().unwrap().as_str(),
            "http://127.0.0.1:5066/stats"
        );
    }

    #[test]
    fn test_invalid_url() {
        let beat = Beat::new(BeatConfig {
            url: "127.0.0.1:5066".to_string(),
            ..BeatConfig::default()
        });
        let err = beat.stats_url().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_client_is_cached() {
        let beat = Beat::default();
        let first = beat.client().unwrap() as *const Client;
        let second = beat.client().unwrap() as *const Client;
        assert_eq!(first, second);
        assert!(beat.has_client());
    }

    #[test]
    fn test_section_toggles() {
        let mut beat = Beat::default();
        assert!(Section::ALL.iter().all(|s| beat.is_enabled(*s)));

        beat.config_mut().collect_system_stats = false;
        assert!(!beat.is_enabled(Section::System));
        assert!(beat.is_enabled(Section::Libbeat));
    }
}
