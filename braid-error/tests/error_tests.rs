// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use braid_error::{BraidError, IntoBraidError, Result, ResultExt};
use std::io;

#[test]
fn test_error_display() {
    let err = BraidError::invalid_configuration("batch_size", 0);
    assert_eq!(
        err.to_string(),
        "Invalid configuration: batch_size must be at least 1 (got 0)"
    );

    let err = BraidError::invalid_demand(0);
    assert_eq!(
        err.to_string(),
        "Invalid demand: request must be positive (got 0)"
    );

    let err = BraidError::stream_error("processing failed");
    assert_eq!(
        err.to_string(),
        "Stream processing error: processing failed"
    );
}

#[test]
fn test_upstream_keeps_cause() {
    let err = BraidError::upstream(io::Error::other("disk on fire"));
    assert!(err.to_string().contains("disk on fire"));

    let source = std::error::Error::source(&err).expect("upstream error has a source");
    assert_eq!(source.to_string(), "disk on fire");
}

#[test]
fn test_clone_shares_cause() {
    let err = BraidError::upstream(io::Error::other("boom"));
    let cloned = err.clone();
    assert_eq!(err.to_string(), cloned.to_string());
}

#[test]
fn test_composite_sizes() {
    assert!(BraidError::composite(Vec::new()).is_none());

    let single = BraidError::composite(vec![BraidError::stream_error("only")]).unwrap();
    assert_eq!(single.to_string(), "Stream processing error: only");

    let many = BraidError::composite(vec![
        BraidError::stream_error("a"),
        BraidError::stream_error("b"),
        BraidError::stream_error("c"),
    ])
    .unwrap();
    match many {
        BraidError::MultipleErrors { count, errors } => {
            assert_eq!(count, 3);
            assert_eq!(errors[0].to_string(), "Stream processing error: a");
            assert_eq!(errors[2].to_string(), "Stream processing error: c");
        }
        other => panic!("expected MultipleErrors, got {other:?}"),
    }
}

#[test]
fn test_classification() {
    assert!(BraidError::upstream(io::Error::other("x")).is_upstream());
    assert!(BraidError::stream_error("x").is_upstream());
    assert!(!BraidError::invalid_demand(0).is_upstream());

    assert!(BraidError::invalid_demand(0).is_protocol_violation());
    assert!(BraidError::missing_backpressure("inner", 2).is_protocol_violation());
    assert!(!BraidError::Cancelled.is_protocol_violation());
}

#[test]
fn test_into_braid_error() {
    let err = io::Error::other("bad input").into_braid();
    assert!(matches!(err, BraidError::Upstream(_)));

    let err = io::Error::other("bad input").into_braid_error("parsing");
    assert_eq!(err.to_string(), "Stream processing error: parsing: bad input");
}

#[test]
fn test_result_context() {
    let result: Result<()> = Err(BraidError::upstream(io::Error::other("test error")));

    let err = result.context("operation failed").unwrap_err();
    assert!(matches!(err, BraidError::StreamProcessingError { .. }));
    assert!(err.to_string().contains("operation failed"));
    assert!(err.to_string().contains("test error"));
}

#[test]
fn test_result_context_preserves_other_errors() {
    let result: Result<()> = Err(BraidError::invalid_demand(0));

    let err = result.with_context(|| "requesting".to_string()).unwrap_err();
    assert!(matches!(err, BraidError::InvalidDemand { requested: 0 }));
}

#[test]
fn test_result_context_ok() -> anyhow::Result<()> {
    let result: Result<i32> = Ok(42);
    let value = result.context("operation failed")?;
    assert_eq!(value, 42);
    Ok(())
}
