//! 이벤트: 노드 내부 컴포넌트 간 통신의 기본 단위
//!
//! 롤업 노드의 각 컴포넌트는 상태 변화를 이벤트로 알립니다.
//! [`Event`] trait은 모든 이벤트 타입이 구현해야 하는 최소 인터페이스입니다.
//! 이벤트의 내부 구조는 이벤트를 전달하는 쪽에서는 알 필요가 없습니다.

use std::fmt;

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// 서로 다른 종류의 이벤트를 함께 다뤄야 한다면 하나의 enum으로 묶어
/// 구현합니다. `Send + Sync + 'static` 바운드로 컴포넌트 사이에서
/// 안전하게 공유할 수 있습니다.
pub trait Event: fmt::Debug + Send + Sync + 'static {
    /// 이벤트 타입명 (로깅 및 실패 메시지에 사용)
    fn event_type(&self) -> &str;
}
