use callguard_core::{CallFailure, DependencyKey, FailureKind};
use callguard_fallback::{
    FallbackDispatcher, FallbackHandlerError, FallbackPath, FallbackRegistry,
};
use std::sync::{Arc, Mutex};

fn key() -> DependencyKey {
    DependencyKey::new("callee")
}

#[test]
fn erroring_handler_degrades_to_process_wide_default() {
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let r = Arc::clone(&reasons);
    let dispatcher = FallbackDispatcher::builder()
        .register(
            key(),
            FallbackRegistry::builder()
                .try_on(FailureKind::Timeout, |_| {
                    Err(FallbackHandlerError::new("cache miss"))
                })
                .default_handler(|_| "default".to_string())
                .build()
                .unwrap(),
        )
        .global_default(|_| "global".to_string())
        .on_handler_failed(move |key, reason| {
            r.lock().unwrap().push(format!("{key}: {reason}"))
        })
        .build();

    let degraded = dispatcher.resolve(
        &key(),
        CallFailure::timeout(std::time::Duration::from_secs(1)),
    );
    assert_eq!(degraded.path(), FallbackPath::Global);
    assert_eq!(degraded.kind(), FailureKind::Timeout);
    assert_eq!(degraded.value().map(String::as_str), Some("global"));
    assert_eq!(*reasons.lock().unwrap(), vec!["callee: cache miss".to_string()]);
}

#[test]
fn panicking_handler_is_contained() {
    let dispatcher: FallbackDispatcher<String> = FallbackDispatcher::builder()
        .register(
            key(),
            FallbackRegistry::<String>::builder()
                .default_handler(|_| -> String { panic!("handler bug") })
                .build()
                .unwrap(),
        )
        .build();

    let degraded = dispatcher.resolve(&key(), CallFailure::server_error("boom"));
    assert_eq!(degraded.path(), FallbackPath::Global);
    assert_eq!(degraded.kind(), FailureKind::ServerError);
    assert!(degraded.value().is_none());
}

#[test]
fn panicking_process_wide_default_still_answers() {
    let dispatcher: FallbackDispatcher<String> = FallbackDispatcher::builder()
        .global_default(|_| -> String { panic!("global bug") })
        .build();

    let degraded = dispatcher.resolve(&key(), CallFailure::client_error("bad"));
    assert_eq!(degraded.path(), FallbackPath::Global);
    assert_eq!(degraded.kind(), FailureKind::ClientError);
    assert!(degraded.value().is_none());
}

#[test]
fn registry_without_default_is_rejected() {
    assert!(
        FallbackRegistry::<String>::builder()
            .on_server_error(|_| "x".to_string())
            .build()
            .is_err()
    );
}
