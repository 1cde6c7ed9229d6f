//! Fallback metrics regression tests

use super::helpers::*;
use callguard_core::{CallFailure, DependencyKey};
use callguard_fallback::{FallbackDispatcher, FallbackRegistry};
use serial_test::serial;

#[test]
#[serial]
fn fallback_metrics_exist() {
    init_recorder();

    let dispatcher = FallbackDispatcher::builder()
        .register(
            "metrics_fallback",
            FallbackRegistry::builder()
                .on_circuit_open(|_| "open".to_string())
                .default_handler(|_| "default".to_string())
                .build()
                .unwrap(),
        )
        .build();

    let key = DependencyKey::new("metrics_fallback");
    dispatcher.resolve(&key, CallFailure::circuit_open(&key));
    dispatcher.resolve(&key, CallFailure::server_error("boom"));
    dispatcher.resolve(
        &DependencyKey::new("metrics_unregistered"),
        CallFailure::server_error("boom"),
    );

    assert_counter_exists("fallback_calls_total");
    assert_metric_has_label("fallback_calls_total", "fallback", "metrics_fallback");
    assert_metric_has_label("fallback_calls_total", "kind", "circuit_open");
    assert_metric_has_label("fallback_calls_total", "path", "kind");
    assert_metric_has_label("fallback_calls_total", "path", "key_default");
    assert_metric_has_label("fallback_calls_total", "path", "global");
}
