//! Beat JSON 응답 파서
//!
//! Beat HTTP 엔드포인트의 `/` 과 `/stats` 응답을 내부 데이터 구조로 변환합니다.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::CollectorError;

/// Collector 작업 결과 타입
pub type CollectResult<T> = Result<T, CollectorError>;

/// 측정값 태그 맵
pub type Tags = BTreeMap<String, String>;

/// Beat 식별 정보 (`GET /`)
///
/// 누락된 필드는 빈 문자열로 채워집니다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BeatInfo {
    /// Beat 종류 (예: "filebeat")
    pub beat: String,
    /// 호스트명
    pub hostname: String,
    /// 인스턴스 이름
    pub name: String,
    /// 인스턴스 UUID
    pub uuid: String,
    /// Beat 버전
    pub version: String,
}

impl BeatInfo {
    /// 모든 측정값에 공통으로 붙는 태그 생성
    pub fn tags(&self) -> Tags {
        Tags::from([
            ("beat_id".to_string(), self.uuid.clone()),
            ("beat_name".to_string(), self.name.clone()),
            ("beat_host".to_string(), self.hostname.clone()),
            ("beat_version".to_string(), self.version.clone()),
        ])
    }
}

/// Beat 통계 문서 (`GET /stats`)
///
/// 각 섹션은 임의의 JSON 값이며, 없으면 `Value::Null` 입니다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BeatStats {
    /// 프로세스 수준 통계
    pub beat: Value,
    /// Filebeat 전용 통계
    pub filebeat: Value,
    /// libbeat 파이프라인/출력 통계
    pub libbeat: Value,
    /// OS 수준 통계
    pub system: Value,
}

/// 통계 섹션
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Beat,
    Filebeat,
    Libbeat,
    System,
}

impl Section {
    /// 보고 순서
    pub const ALL: [Section; 4] = [
        Section::Beat,
        Section::Filebeat,
        Section::Libbeat,
        Section::System,
    ];

    /// 측정값 이름
    pub fn measurement(&self) -> &'static str {
        match self {
            Section::Beat => "beat",
            Section::Filebeat => "beat_filebeat",
            Section::Libbeat => "beat_libbeat",
            Section::System => "beat_system",
        }
    }
}

impl BeatStats {
    /// 섹션 값 참조
    pub fn section(&self, section: Section) -> &Value {
        match section {
            Section::Beat => &self.beat,
            Section::Filebeat => &self.filebeat,
            Section::Libbeat => &self.libbeat,
            Section::System => &self.system,
        }
    }
}

/// JSON 본문을 지정한 타입으로 파싱
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> CollectResult<T> {
    Ok(serde_json::from_slice(body)?)
}

/// 식별 정보 응답 파싱
pub fn parse_info(body: &[u8]) -> CollectResult<BeatInfo> {
    parse_json(body)
}

/// 통계 응답 파싱
pub fn parse_stats(body: &[u8]) -> CollectResult<BeatStats> {
    parse_json(body)
}
