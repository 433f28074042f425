//! 에미터 capability: 이벤트 발행 확장 포인트 정의
//!
//! 이벤트를 발행하는 컴포넌트는 구체 타입 대신 [`EventEmitter`]를 보관합니다.
//! 실제 노드에서는 이벤트 시스템이, 테스트에서는 mock이 이 자리를 채웁니다.

use std::fmt;
use std::sync::Arc;

use crate::event::Event;

/// 이벤트 하나를 받아 발행하는 capability
///
/// 반환값이 없으며, 발행 결과에 대한 처리는 구현체의 책임입니다.
/// 여러 컴포넌트가 같은 에미터를 공유하므로 `&self`로 호출합니다.
pub trait EventEmitter<E: Event>: Send + Sync {
    /// 이벤트를 발행합니다.
    fn emit(&self, event: E);
}

impl<E: Event, T: EventEmitter<E> + ?Sized> EventEmitter<E> for &T {
    fn emit(&self, event: E) {
        (**self).emit(event);
    }
}

impl<E: Event, T: EventEmitter<E> + ?Sized> EventEmitter<E> for Box<T> {
    fn emit(&self, event: E) {
        (**self).emit(event);
    }
}

impl<E: Event, T: EventEmitter<E> + ?Sized> EventEmitter<E> for Arc<T> {
    fn emit(&self, event: E) {
        (**self).emit(event);
    }
}

/// 클로저를 에미터로 사용하기 위한 어댑터
pub struct EmitterFn<F>(F);

impl<F> EmitterFn<F> {
    /// 클로저를 감싸 에미터를 만듭니다.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<E, F> EventEmitter<E> for EmitterFn<F>
where
    E: Event,
    F: Fn(E) + Send + Sync,
{
    fn emit(&self, event: E) {
        (self.0)(event);
    }
}

impl<F> fmt::Debug for EmitterFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterFn").finish_non_exhaustive()
    }
}

/// 모든 이벤트를 버리는 에미터
///
/// 이벤트 발행 여부를 검증하지 않는 테스트에서 사용합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl<E: Event> EventEmitter<E> for NoopEmitter {
    fn emit(&self, _event: E) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct BlockProcessed(u64);

    impl Event for BlockProcessed {
        fn event_type(&self) -> &str {
            "block-processed"
        }
    }

    /// 에미터를 보관하는 최소한의 컴포넌트
    struct Processor<EM> {
        emitter: EM,
    }

    impl<EM: EventEmitter<BlockProcessed>> Processor<EM> {
        fn process(&self, number: u64) {
            self.emitter.emit(BlockProcessed(number));
        }
    }

    fn collecting() -> (Arc<Mutex<Vec<u64>>>, EmitterFn<impl Fn(BlockProcessed) + Send + Sync>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let emitter = EmitterFn::new(move |ev: BlockProcessed| {
            sink.lock().unwrap().push(ev.0);
        });
        (seen, emitter)
    }

    #[test]
    fn emitter_fn_forwards_events() {
        let (seen, emitter) = collecting();
        emitter.emit(BlockProcessed(1));
        emitter.emit(BlockProcessed(2));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn component_can_hold_emitter_by_reference() {
        let (seen, emitter) = collecting();
        let processor = Processor { emitter: &emitter };
        processor.process(42);
        assert_eq!(*seen.lock().unwrap(), vec![42]);
    }

    #[test]
    fn component_can_hold_shared_emitter() {
        let (seen, emitter) = collecting();
        let shared = Arc::new(emitter);
        let a = Processor {
            emitter: Arc::clone(&shared),
        };
        let b = Processor { emitter: shared };
        a.process(1);
        b.process(2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn boxed_trait_object_is_an_emitter() {
        let (seen, emitter) = collecting();
        let boxed: Box<dyn EventEmitter<BlockProcessed>> = Box::new(emitter);
        let processor = Processor { emitter: boxed };
        processor.process(9);
        assert_eq!(*seen.lock().unwrap(), vec![9]);
    }

    #[test]
    fn noop_emitter_discards_events() {
        let processor = Processor {
            emitter: NoopEmitter,
        };
        processor.process(5);
    }
}
