//! End-to-end coverage of the `cache` subcommand's exit-status contract
//! (spec §7): a cache connection failure is `FatalError`, which the CLI
//! surfaces as `CliError::Fatal` and an exit code of 1. No real Redis is
//! needed: port 1 on loopback refuses the connection immediately.

use gsd_cli::exit::{CliError, ExitStatus};

const UNREACHABLE_REDIS: &str = "redis://127.0.0.1:1/0";

#[tokio::test]
async fn cache_get_against_an_unreachable_redis_is_a_fatal_error() {
    let args = [
        "gsd",
        "cache",
        "--redis-url",
        UNREACHABLE_REDIS,
        "get",
        "192.0.2.1:27015",
    ];
    let result = gsd_cli::cli::run(args).await;
    let error = result.expect_err("an unreachable redis must not report success");
    assert!(matches!(error, CliError::Fatal(_)));
    assert_eq!(error.exit_status(), ExitStatus::FatalError);
}

#[tokio::test]
async fn cache_ensure_against_an_unreachable_redis_is_a_fatal_error() {
    let args = [
        "gsd",
        "cache",
        "--redis-url",
        UNREACHABLE_REDIS,
        "ensure",
        "192.0.2.1:27015",
    ];
    let error = gsd_cli::cli::run(args)
        .await
        .expect_err("an unreachable redis must not report success");
    assert_eq!(error.exit_status(), ExitStatus::FatalError);
}

#[tokio::test]
async fn cache_search_against_an_unreachable_redis_is_a_fatal_error() {
    let args = [
        "gsd",
        "cache",
        "--redis-url",
        UNREACHABLE_REDIS,
        "search",
        "--include",
        "tf2",
    ];
    let error = gsd_cli::cli::run(args)
        .await
        .expect_err("an unreachable redis must not report success");
    assert_eq!(error.exit_status(), ExitStatus::FatalError);
}
