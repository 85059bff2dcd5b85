//! Receipt polling with bounded attempts and jittered, table-driven backoff.

use std::time::Duration;

use alloy_primitives::TxHash;
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::{
    constants::BACKOFF_TABLE_MS,
    rpc::{NetworkClient, ReceiptStatus},
};

/// Final classification of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// A receipt with a success status was observed.
    Success,
    /// A receipt was observed but the transaction reverted.
    OnChainFailure,
    /// No receipt was observed within the attempt budget.
    Inconclusive,
}

impl ConfirmOutcome {
    /// Returns true only for [`ConfirmOutcome::Success`].
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Result of confirming one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Hash of the confirmed transaction.
    pub tx_hash: TxHash,
    /// Classification of the transaction.
    pub outcome: ConfirmOutcome,
    /// Number of receipt polls issued.
    pub attempts: u32,
    /// Every backoff slept between polls, in order.
    pub backoffs: Vec<Duration>,
}

/// Returns the base delay used after the `attempt`-th unsuccessful poll.
pub fn backoff_base(attempt: usize) -> Duration {
    let index = attempt.min(BACKOFF_TABLE_MS.len() - 1);
    Duration::from_millis(BACKOFF_TABLE_MS[index])
}

/// Randomizes `base` into `[base / 2, base * 3 / 2)`.
pub fn jitter<R: Rng>(base: Duration, rng: &mut R) -> Duration {
    let base_ms = base.as_millis() as u64;
    if base_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(base_ms / 2 + rng.random_range(0..base_ms))
}

/// Polls a [`NetworkClient`] for the receipt of a transaction.
#[derive(Debug, Clone, Copy)]
pub struct Confirmer {
    max_attempts: u32,
    expected_latency: Duration,
}

impl Confirmer {
    /// Creates a confirmer issuing at most `max_attempts` polls, each bounded
    /// by `expected_latency`.
    pub const fn new(max_attempts: u32, expected_latency: Duration) -> Self {
        Self { max_attempts, expected_latency }
    }

    /// Polls for the receipt of `tx_hash` until it is found or the attempt
    /// budget runs out.
    ///
    /// A definitive receipt ends polling immediately. Missing receipts,
    /// retryable RPC errors and timed out polls are retried after sleeping
    /// `jitter(backoff_base(attempt))`. Any other RPC error ends polling as
    /// [`ConfirmOutcome::Inconclusive`].
    pub async fn confirm<C>(&self, client: &C, tx_hash: TxHash) -> Confirmation
    where
        C: NetworkClient + ?Sized,
    {
        let mut backoffs = Vec::new();

        for attempt in 0..self.max_attempts {
            let polled = tokio::time::timeout(self.expected_latency, client.receipt_status(tx_hash))
                .await;

            let outcome = match polled {
                Ok(Ok(Some(ReceiptStatus::Success))) => Some(ConfirmOutcome::Success),
                Ok(Ok(Some(ReceiptStatus::Failed))) => Some(ConfirmOutcome::OnChainFailure),
                Ok(Ok(None)) => {
                    trace!(%tx_hash, attempt, "Receipt not yet available");
                    None
                }
                Ok(Err(err)) if err.is_retryable() => {
                    debug!(%tx_hash, attempt, error = %err, "Receipt poll failed");
                    None
                }
                Ok(Err(err)) => {
                    warn!(%tx_hash, attempt, error = %err, "Receipt poll rejected, giving up");
                    Some(ConfirmOutcome::Inconclusive)
                }
                Err(_) => {
                    debug!(
                        %tx_hash,
                        attempt,
                        latency = ?self.expected_latency,
                        "Receipt poll timed out"
                    );
                    None
                }
            };

            if let Some(outcome) = outcome {
                return Confirmation { tx_hash, outcome, attempts: attempt + 1, backoffs };
            }

            if attempt + 1 < self.max_attempts {
                let delay = jitter(backoff_base(attempt as usize), &mut rand::rng());
                backoffs.push(delay);
                tokio::time::sleep(delay).await;
            }
        }

        debug!(%tx_hash, attempts = self.max_attempts, "Receipt not found, giving up");
        Confirmation {
            tx_hash,
            outcome: ConfirmOutcome::Inconclusive,
            attempts: self.max_attempts,
            backoffs,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use rstest::rstest;

    use super::*;
    use crate::{rpc::RpcError, test_utils::MockNetworkClient};

    const HASH: TxHash = TxHash::repeat_byte(0xab);

    fn in_range(delay: Duration, base: Duration) -> bool {
        delay >= base / 2 && delay < base + base / 2 || (base.is_zero() && delay.is_zero())
    }

    #[test]
    fn test_backoff_table_non_decreasing_and_clamped() {
        for i in 1..BACKOFF_TABLE_MS.len() + 5 {
            assert!(backoff_base(i) >= backoff_base(i - 1));
        }
        assert_eq!(backoff_base(100), Duration::from_secs(10));
        assert_eq!(backoff_base(0), Duration::ZERO);
    }

    #[rstest]
    #[case::zero(0)]
    #[case::half_second(500)]
    #[case::three_seconds(3_000)]
    #[case::ten_seconds(10_000)]
    fn test_jitter_bounds(#[case] base_ms: u64) {
        let base = Duration::from_millis(base_ms);
        let mut rng = StdRng::seed_from_u64(base_ms);
        for _ in 0..1_000 {
            assert!(in_range(jitter(base, &mut rng), base));
        }
    }

    #[test]
    fn test_jitter_mean_grows_with_table() {
        let mut rng = StdRng::seed_from_u64(7);
        let mean = |i: usize, rng: &mut StdRng| {
            (0..500).map(|_| jitter(backoff_base(i), rng).as_millis()).sum::<u128>() / 500
        };
        let means: Vec<_> = (0..BACKOFF_TABLE_MS.len()).map(|i| mean(i, &mut rng)).collect();
        // Neighbouring equal entries may swap by noise, so compare distinct steps.
        assert!(means[0] < means[1]);
        assert!(means[2] < means[3]);
        assert!(means[4] < means[5]);
        assert!(means[6] < means[7]);
        assert!(means[8] < means[9]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_two_empty_polls() {
        let client = MockNetworkClient::default();
        client.push_receipts(HASH, [Ok(None), Ok(None), Ok(Some(ReceiptStatus::Success))]);
        let start = tokio::time::Instant::now();

        let confirmation = Confirmer::new(15, Duration::from_secs(3)).confirm(&client, HASH).await;

        assert_eq!(confirmation.outcome, ConfirmOutcome::Success);
        assert_eq!(confirmation.attempts, 3);
        assert_eq!(confirmation.backoffs.len(), 2);
        assert!(in_range(confirmation.backoffs[0], backoff_base(0)));
        assert!(in_range(confirmation.backoffs[1], backoff_base(1)));
        assert_eq!(client.receipt_polls(HASH), 3);
        assert!(start.elapsed() >= confirmation.backoffs.iter().sum::<Duration>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_resolves_is_inconclusive_after_max_attempts() {
        let client = MockNetworkClient::default();

        let confirmation = Confirmer::new(6, Duration::from_secs(3)).confirm(&client, HASH).await;

        assert_eq!(confirmation.outcome, ConfirmOutcome::Inconclusive);
        assert_eq!(confirmation.attempts, 6);
        assert_eq!(client.receipt_polls(HASH), 6);
        assert_eq!(confirmation.backoffs.len(), 5);
        for (i, delay) in confirmation.backoffs.iter().enumerate() {
            assert!(in_range(*delay, backoff_base(i)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_receipt_stops_immediately() {
        let client = MockNetworkClient::default();
        client.push_receipts(HASH, [Ok(None), Ok(Some(ReceiptStatus::Failed))]);

        let confirmation = Confirmer::new(15, Duration::from_secs(3)).confirm(&client, HASH).await;

        assert_eq!(confirmation.outcome, ConfirmOutcome::OnChainFailure);
        assert_eq!(confirmation.attempts, 2);
        assert_eq!(client.receipt_polls(HASH), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_are_retried() {
        let client = MockNetworkClient::default();
        client.push_receipts(
            HASH,
            [
                Err(RpcError::Transport("connection reset".into())),
                Ok(Some(ReceiptStatus::Success)),
            ],
        );

        let confirmation = Confirmer::new(3, Duration::from_secs(3)).confirm(&client, HASH).await;

        assert_eq!(confirmation.outcome, ConfirmOutcome::Success);
        assert_eq!(confirmation.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_poll_is_inconclusive_without_retry() {
        let client = MockNetworkClient::default();
        client.push_receipts(
            HASH,
            [Err(RpcError::Rejected("unknown method".into())), Ok(Some(ReceiptStatus::Success))],
        );

        let confirmation = Confirmer::new(5, Duration::from_secs(3)).confirm(&client, HASH).await;

        assert_eq!(confirmation.outcome, ConfirmOutcome::Inconclusive);
        assert_eq!(confirmation.attempts, 1);
        assert!(confirmation.backoffs.is_empty());
        assert_eq!(client.receipt_polls(HASH), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_poll_times_out_and_retries() {
        let client = MockNetworkClient::default();
        client.set_receipt_delay(Duration::from_secs(10));
        client.push_receipts(HASH, [Ok(Some(ReceiptStatus::Success))]);

        let confirmation = Confirmer::new(2, Duration::from_secs(3)).confirm(&client, HASH).await;

        assert_eq!(confirmation.outcome, ConfirmOutcome::Inconclusive);
        assert_eq!(confirmation.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_is_inconclusive() {
        let client = MockNetworkClient::default();
        let confirmation = Confirmer::new(0, Duration::from_secs(3)).confirm(&client, HASH).await;
        assert_eq!(confirmation.outcome, ConfirmOutcome::Inconclusive);
        assert_eq!(client.receipt_polls(HASH), 0);
    }
}
