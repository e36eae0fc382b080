// ── Settle-all fan-out ──
//
// Run one future per key concurrently, wait for all of them, keep the
// successes in input order. Failures are logged and handed back separately;
// they never abort the batch.

use std::fmt::Display;
use std::future::Future;

use futures_util::future::join_all;
use tracing::warn;

/// Outcome of a settled batch.
#[derive(Debug)]
pub struct Settled<K, T, E> {
    /// Successful results, in input order.
    pub ok: Vec<(K, T)>,
    /// Failed keys with their errors, in input order.
    pub failed: Vec<(K, E)>,
}

impl<K, T, E> Settled<K, T, E> {
    /// Every constituent failed (and there was at least one).
    pub fn all_failed(&self) -> bool {
        self.ok.is_empty() && !self.failed.is_empty()
    }

    /// Drop keys, keep successful values.
    pub fn into_values(self) -> Vec<T> {
        self.ok.into_iter().map(|(_, value)| value).collect()
    }
}

/// Await every `(key, future)` pair concurrently.
///
/// `operation` names the batch in failure logs.
pub async fn settle_all<K, T, E, F, I>(operation: &str, tasks: I) -> Settled<K, T, E>
where
    K: Display,
    E: Display,
    F: Future<Output = Result<T, E>>,
    I: IntoIterator<Item = (K, F)>,
{
    let (keys, futures): (Vec<K>, Vec<F>) = tasks.into_iter().unzip();
    let results = join_all(futures).await;

    let mut settled = Settled {
        ok: Vec::with_capacity(results.len()),
        failed: Vec::new(),
    };
    for (key, result) in keys.into_iter().zip(results) {
        match result {
            Ok(value) => settled.ok.push((key, value)),
            Err(e) => {
                warn!(operation, layer = %key, error = %e, "layer request failed, skipping");
                settled.failed.push((key, e));
            }
        }
    }
    settled
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn keeps_input_order_and_separates_failures() {
        let tasks = [(1u32, 30u64, true), (2, 0, false), (3, 10, true)]
            .into_iter()
            .map(|(key, delay, ok)| {
                (key, async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    if ok { Ok(key * 10) } else { Err("boom") }
                })
            });

        let settled = settle_all("test", tasks).await;
        assert_eq!(settled.ok, vec![(1, 10), (3, 30)]);
        assert_eq!(settled.failed, vec![(2, "boom")]);
        assert!(!settled.all_failed());
        assert_eq!(settled.into_values(), vec![10, 30]);
    }

    #[tokio::test]
    async fn all_failed_requires_at_least_one_task() {
        let empty: Vec<(u32, std::future::Ready<Result<u32, &str>>)> = Vec::new();
        assert!(!settle_all("empty", empty).await.all_failed());

        let failing = vec![(1u32, std::future::ready(Err::<u32, _>("down")))];
        assert!(settle_all("failing", failing).await.all_failed());
    }
}
