//! JSON 평탄화
//!
//! 임의 깊이의 JSON 값을 단일 레벨의 필드 맵으로 변환합니다.
//!
//! - 객체 키는 구분자(기본 `.`)로 연결
//! - 배열 인덱스는 항상 `_<index>` 로 연결
//! - 숫자는 모두 `f64` 로 정규화
//! - `null` 은 아무 필드도 만들지 않음

use serde_json::Value;
use std::collections::BTreeMap;

use super::parser::CollectResult;
use crate::error::CollectorError;

/// 평탄화된 필드 맵
pub type Fields = BTreeMap<String, FieldValue>;

/// 평탄화 결과의 리프 값
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 모든 JSON 숫자
    Float(f64),
    /// 불리언
    Bool(bool),
    /// 문자열
    String(String),
}

impl FieldValue {
    /// 숫자 값 추출
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

/// JSON 평탄화기
#[derive(Debug, Clone)]
pub struct Flattener {
    separator: String,
}

impl Default for Flattener {
    fn default() -> Self {
        Self {
            separator: ".".to_string(),
        }
    }
}

impl Flattener {
    /// 기본 구분자(`.`)를 사용하는 평탄화기 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 객체 키 구분자 지정
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// 객체 키 구분자
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// `value` 를 `prefix` 아래로 평탄화
    ///
    /// 최상위 값이 스칼라이면 키가 `prefix` 그대로(보통 빈 문자열)인 필드 하나가 생깁니다.
    pub fn flatten(&self, prefix: &str, value: &Value) -> CollectResult<Fields> {
        let mut fields = Fields::new();
        self.flatten_into(prefix, value, &mut fields)?;
        Ok(fields)
    }

    fn flatten_into(&self, prefix: &str, value: &Value, fields: &mut Fields) -> CollectResult<()> {
        match value {
            Value::Null => {}
            Value::Bool(b) => {
                fields.insert(prefix.to_string(), FieldValue::Bool(*b));
            }
            Value::Number(n) => {
                let f = n.as_f64().ok_or_else(|| {
                    CollectorError::JsonParse(format!("Number {} cannot be represented as f64", n))
                })?;
                fields.insert(prefix.to_string(), FieldValue::Float(f));
            }
            Value::String(s) => {
                fields.insert(prefix.to_string(), FieldValue::String(s.clone()));
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let key = format!("{}_{}", prefix, index);
                    self.flatten_into(&key, item, fields)?;
                }
            }
            Value::Object(map) => {
                for (name, item) in map {
                    let key = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{}{}{}", prefix, self.separator, name)
                    };
                    self.flatten_into(&key, item, fields)?;
                }
            }
        }

        Ok(())
    }
}

/// 기본 구분자(`.`)로 평탄화
pub fn flatten(prefix: &str, value: &Value) -> CollectResult<Fields> {
    Flattener::new().flatten(prefix, value)
}
