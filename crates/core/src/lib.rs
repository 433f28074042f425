#![doc = include_str!("../README.md")]

pub mod config;
pub mod emitter;
pub mod error;
pub mod event;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, ExpectationError, TestkitError};

// 설정
pub use config::{GeneralConfig, MockConfig, TestkitConfig, UnexpectedCallPolicy};

// 이벤트
pub use event::Event;

// 에미터 capability
pub use emitter::{EmitterFn, EventEmitter, NoopEmitter};
