//! 설정 관리: rollup-testkit.toml 파싱 및 런타임 설정
//!
//! [`TestkitConfig`]는 테스트 유틸리티 전체 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`ROLLUP_TESTKIT_MOCK_UNEXPECTED_CALL=record` 형식)
//! 2. 설정 파일 (`rollup-testkit.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), rollup_core::error::TestkitError> {
//! use rollup_core::config::TestkitConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = TestkitConfig::load("rollup-testkit.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = TestkitConfig::parse("[mock]\nverify_on_drop = true")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TestkitError};

/// 테스트 유틸리티 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestkitConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// mock 에미터 설정
    #[serde(default)]
    pub mock: MockConfig,
}

impl TestkitConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TestkitError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TestkitError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TestkitError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TestkitError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TestkitError> {
        toml::from_str(toml_str).map_err(|e| {
            TestkitError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 기본값에 환경변수 오버라이드만 적용한 설정을 만듭니다.
    ///
    /// 설정 파일 없이 테스트마다 mock을 생성할 때 사용합니다.
    pub fn from_env() -> Result<Self, TestkitError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `ROLLUP_TESTKIT_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(
            &mut self.general.log_level,
            "ROLLUP_TESTKIT_GENERAL_LOG_LEVEL",
        );
        override_string(
            &mut self.general.log_format,
            "ROLLUP_TESTKIT_GENERAL_LOG_FORMAT",
        );

        // Mock
        override_policy(
            &mut self.mock.unexpected_call,
            "ROLLUP_TESTKIT_MOCK_UNEXPECTED_CALL",
        );
        override_bool(
            &mut self.mock.verify_on_drop,
            "ROLLUP_TESTKIT_MOCK_VERIFY_ON_DROP",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TestkitError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (pretty, compact, json)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_owned(),
            log_format: "compact".to_owned(),
        }
    }
}

/// mock 에미터 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// 기대하지 않은 emit 호출 처리 방식
    pub unexpected_call: UnexpectedCallPolicy,
    /// drop 시점에 충족되지 않은 기대 호출이 남아 있으면 panic
    pub verify_on_drop: bool,
}

/// 기대하지 않은 emit 호출 처리 방식
///
/// 초과 호출은 기본적으로 즉시 실패하고, 부족한 호출은 검증 시점에 보고됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnexpectedCallPolicy {
    /// emit 호출 시점에 즉시 panic
    #[default]
    Panic,
    /// 기록해 두었다가 검증 시점에 보고
    Record,
}

impl UnexpectedCallPolicy {
    /// 문자열에서 정책을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "panic" | "fail" | "fail-fast" => Some(Self::Panic),
            "record" | "defer" | "deferred" => Some(Self::Record),
            _ => None,
        }
    }
}

impl fmt::Display for UnexpectedCallPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panic => write!(f, "panic"),
            Self::Record => write!(f, "record"),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_policy(target: &mut UnexpectedCallPolicy, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match UnexpectedCallPolicy::from_str_loose(&val) {
            Some(parsed) => *target = parsed,
            None => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse unexpected-call policy from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = TestkitConfig::default();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.log_format, "compact");
        assert_eq!(config.mock.unexpected_call, UnexpectedCallPolicy::Panic);
        assert!(!config.mock.verify_on_drop);
    }

    #[test]
    fn default_config_passes_validation() {
        TestkitConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = TestkitConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.mock.unexpected_call, UnexpectedCallPolicy::Panic);
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[mock]
unexpected_call = "record"
"#;
        let config = TestkitConfig::parse(toml).unwrap();
        assert_eq!(config.mock.unexpected_call, UnexpectedCallPolicy::Record);
        // verify_on_drop은 기본값 유지
        assert!(!config.mock.verify_on_drop);
        assert_eq!(config.general.log_format, "compact");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[general]
log_level = "debug"
log_format = "json"

[mock]
unexpected_call = "panic"
verify_on_drop = true
"#;
        let config = TestkitConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.mock.unexpected_call, UnexpectedCallPolicy::Panic);
        assert!(config.mock.verify_on_drop);
    }

    #[test]
    fn parse_unknown_policy_returns_error() {
        let result = TestkitConfig::parse("[mock]\nunexpected_call = \"ignore\"");
        assert!(matches!(
            result.unwrap_err(),
            TestkitError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let result = TestkitConfig::parse("invalid = [[[toml");
        assert!(matches!(
            result.unwrap_err(),
            TestkitError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = TestkitConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = TestkitConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn policy_from_str_loose_is_case_insensitive() {
        assert_eq!(
            UnexpectedCallPolicy::from_str_loose("RECORD"),
            Some(UnexpectedCallPolicy::Record)
        );
        assert_eq!(
            UnexpectedCallPolicy::from_str_loose("Fail-Fast"),
            Some(UnexpectedCallPolicy::Panic)
        );
        assert_eq!(UnexpectedCallPolicy::from_str_loose("maybe"), None);
    }

    #[test]
    fn policy_display_matches_serde_name() {
        assert_eq!(UnexpectedCallPolicy::Panic.to_string(), "panic");
        assert_eq!(UnexpectedCallPolicy::Record.to_string(), "record");
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트끼리 동시에 실행되지 않습니다.
        unsafe { std::env::set_var("TEST_ROLLUP_TESTKIT_STR", "overridden") };
        override_string(&mut val, "TEST_ROLLUP_TESTKIT_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_ROLLUP_TESTKIT_STR") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트끼리 동시에 실행되지 않습니다.
        unsafe { std::env::set_var("TEST_ROLLUP_TESTKIT_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_ROLLUP_TESTKIT_BOOL_BAD");
        assert!(!val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_ROLLUP_TESTKIT_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_policy() {
        let mut val = UnexpectedCallPolicy::Panic;
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트끼리 동시에 실행되지 않습니다.
        unsafe { std::env::set_var("TEST_ROLLUP_TESTKIT_POLICY", "record") };
        override_policy(&mut val, "TEST_ROLLUP_TESTKIT_POLICY");
        assert_eq!(val, UnexpectedCallPolicy::Record);
        unsafe { std::env::remove_var("TEST_ROLLUP_TESTKIT_POLICY") };
    }

    #[test]
    #[serial]
    fn env_override_invalid_policy_keeps_original() {
        let mut val = UnexpectedCallPolicy::Panic;
        // SAFETY: #[serial]로 환경변수를 조작하는 테스트끼리 동시에 실행되지 않습니다.
        unsafe { std::env::set_var("TEST_ROLLUP_TESTKIT_POLICY_BAD", "sometimes") };
        override_policy(&mut val, "TEST_ROLLUP_TESTKIT_POLICY_BAD");
        assert_eq!(val, UnexpectedCallPolicy::Panic);
        unsafe { std::env::remove_var("TEST_ROLLUP_TESTKIT_POLICY_BAD") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_ROLLUP_TESTKIT_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let mut config = TestkitConfig::default();
        config.mock.unexpected_call = UnexpectedCallPolicy::Record;
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = TestkitConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed.mock.unexpected_call, UnexpectedCallPolicy::Record);
        assert_eq!(parsed.general.log_level, config.general.log_level);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = TestkitConfig::from_file("/nonexistent/path/rollup-testkit.toml").await;
        assert!(matches!(
            result.unwrap_err(),
            TestkitError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
