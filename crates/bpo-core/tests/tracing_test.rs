//! Tests for tracing initialization.

use std::sync::Mutex;

use bpo_core::tracing::setup::{init_tracing, DEFAULT_FILTER};
use tracing_subscriber::EnvFilter;

/// Serializes tests that set `BPO_LOG`.
static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn init_installs_global_subscriber() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("BPO_LOG", "bpo_storage=debug,bpo_core=warn");
    init_tracing();
    std::env::remove_var("BPO_LOG");

    assert!(tracing::dispatcher::has_been_set());
}

#[test]
fn init_is_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
    init_tracing();
    assert!(tracing::dispatcher::has_been_set());
}

#[test]
fn garbage_filter_is_rejected_so_default_applies() {
    assert!(EnvFilter::try_new("bpo_storage=not_a_level").is_err());
    assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
}

#[test]
fn default_filter_covers_both_crates() {
    assert!(DEFAULT_FILTER.contains("bpo_core=info"));
    assert!(DEFAULT_FILTER.contains("bpo_storage=info"));
}
