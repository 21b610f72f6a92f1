//! Test utilities to be used with the attestation crates.

pub mod host;
pub mod id;
pub mod receiver;

/// Enable tracing with the RUST_LOG environment variable.
///
/// This is intended to be used in tests, so it defaults to DEBUG level.
pub fn enable_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Repeatedly run a code block until it breaks or returns, sleeping
/// between iterations. Panics if the timeout elapses first.
///
/// - `iter_check!(timeout_ms, sleep_ms, { ... })`
/// - `iter_check!(timeout_ms, { ... })` sleeps 1 ms between iterations.
/// - `iter_check!({ ... })` uses a timeout of 1000 ms.
///
/// A `return value` inside the block makes the macro evaluate to `value`.
#[macro_export]
macro_rules! iter_check {
    ($timeout_ms:expr, $sleep_ms:expr, $code:block) => {
        tokio::time::timeout(
            std::time::Duration::from_millis($timeout_ms),
            async {
                loop {
                    $code
                    tokio::time::sleep(std::time::Duration::from_millis(
                        $sleep_ms,
                    ))
                    .await;
                }
            },
        )
        .await
        .expect("iter_check timed out")
    };
    ($timeout_ms:expr, $code:block) => {
        $crate::iter_check!($timeout_ms, 1, $code)
    };
    ($code:block) => {
        $crate::iter_check!(1000, $code)
    };
}

#[cfg(test)]
mod test {
    #[tokio::test]
    async fn iter_check_returns_value() {
        let mut count = 0;
        let out = iter_check!({
            count += 1;
            if count == 3 {
                return count * 2;
            }
        });
        assert_eq!(6, out);
    }

    #[tokio::test]
    async fn iter_check_break() {
        let mut count = 0;
        iter_check!(100, 2, {
            count += 1;
            if count > 1 {
                break;
            }
        });
        assert_eq!(2, count);
    }
}
