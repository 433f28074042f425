//! 에러 타입: 도메인별 에러 정의

/// 테스트 유틸리티 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TestkitError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 기대 호출 검증 에러
    #[error("expectation error: {0}")]
    Expectation(#[from] ExpectationError),

    /// 로깅 초기화 에러
    #[error("logging error: {0}")]
    Logging(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 기대 호출 검증 에러
///
/// 이벤트 값은 `Debug` 표현으로 보관하여 에러 타입이 이벤트 타입에
/// 대해 제네릭하지 않도록 합니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpectationError {
    /// 대응하는 기대 호출이 없는 emit
    #[error("unexpected call: emit({event}) matches no pending expectation")]
    UnexpectedCall { event: String },

    /// 검증 시점까지 충족되지 않은 기대 호출
    #[error("unsatisfied expectation: emit({event}) expected {expected} time(s), got {actual}")]
    Unsatisfied {
        event: String,
        expected: usize,
        actual: usize,
    },

    /// 전체 호출 횟수 불일치
    #[error("expected {expected} emit call(s), got {actual}")]
    CallCountMismatch { expected: usize, actual: usize },

    /// 한 번도 emit되지 않은 이벤트
    #[error("expected emit({event}) to have been called")]
    NotEmitted { event: String },

    /// emit되지 않아야 할 이벤트가 emit됨
    #[error("expected emit({event}) not to be called, but it was called {times} time(s)")]
    UnwantedEmission { event: String, times: usize },

    /// 0회 기대 호출 선언
    #[error("expectation for emit({event}) must require at least one call")]
    ZeroTimes { event: String },
}
