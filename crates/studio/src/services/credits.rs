//! Local credit balance kept in step with the server.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{instrument, warn};

use fitting_room_core::{CreditBalance, Tentative, UserId};

use super::store::{CreditsStore, StoreError};

/// A user's credit balance plus the store that owns the real value.
///
/// The local balance is what precondition checks read. It only changes when
/// a generation succeeds ([`use_credit`](Self::use_credit)) or the server is
/// re-read ([`refresh`](Self::refresh)).
pub struct CreditLedger {
    user_id: UserId,
    store: Arc<dyn CreditsStore>,
    balance: Mutex<LocalBalance>,
}

struct LocalBalance {
    credits: CreditBalance,
    /// Bumped by every server read.
    refreshes: u64,
}

impl CreditLedger {
    #[must_use]
    pub fn new(user_id: UserId, store: Arc<dyn CreditsStore>) -> Self {
        Self {
            user_id,
            store,
            balance: Mutex::new(LocalBalance {
                credits: CreditBalance::ZERO,
                refreshes: 0,
            }),
        }
    }

    /// The local balance.
    pub async fn balance(&self) -> CreditBalance {
        self.balance.lock().await.credits
    }

    /// Whether one more generation can be paid for.
    pub async fn has_credits(&self) -> bool {
        self.balance().await.has_credits()
    }

    /// Replace the local balance with the server's.
    ///
    /// # Errors
    ///
    /// Returns the store error; the local balance is left untouched.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn refresh(&self) -> Result<CreditBalance, StoreError> {
        let confirmed = self.store.get_credits(self.user_id).await?;
        let mut balance = self.balance.lock().await;
        balance.credits = confirmed;
        balance.refreshes += 1;
        Ok(confirmed)
    }

    /// Charge one credit for a generation that already succeeded.
    ///
    /// The local balance drops immediately. The server is then asked for an
    /// atomic decrement, falling back to writing the new value if the store
    /// has no atomic path. On success the local balance takes the server's
    /// value. On failure it is restored exactly, unless a
    /// [`refresh`](Self::refresh) landed meanwhile, in which case the
    /// refreshed value stands.
    ///
    /// # Errors
    ///
    /// Returns the store error after rolling the local balance back.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn use_credit(&self) -> Result<CreditBalance, StoreError> {
        let (change, expected, refreshes) = {
            let mut balance = self.balance.lock().await;
            let expected = balance.credits.spend_one();
            (
                Tentative::apply(&mut balance.credits, expected),
                expected,
                balance.refreshes,
            )
        };

        let result = match self.store.decrement_credits(self.user_id).await {
            Err(StoreError::Unsupported) => self.store.set_credits(self.user_id, expected).await,
            other => other,
        };

        let mut balance = self.balance.lock().await;
        match result {
            Ok(confirmed) => {
                change.commit();
                balance.credits = confirmed;
                Ok(confirmed)
            }
            Err(e) if balance.refreshes == refreshes => {
                warn!(error = %e, previous = %change.previous(), "Credit update failed, rolling back");
                change.rollback(&mut balance.credits);
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, current = %balance.credits, "Credit update failed, keeping refreshed balance");
                change.commit();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::MemoryCredits;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    async fn ledger(store: &Arc<MemoryCredits>, user: UserId) -> CreditLedger {
        let ledger = CreditLedger::new(user, Arc::clone(store) as Arc<dyn CreditsStore>);
        ledger.refresh().await.expect("refresh");
        ledger
    }

    #[tokio::test]
    async fn test_use_credit_decrements_and_reconciles() {
        let store = Arc::new(MemoryCredits::new(3));
        let user = UserId::generate();
        let ledger = ledger(&store, user).await;

        let confirmed = ledger.use_credit().await.expect("charge");
        assert_eq!(confirmed, CreditBalance::new(2));
        assert_eq!(ledger.balance().await, CreditBalance::new(2));
        assert_eq!(store.balance(user).await, CreditBalance::new(2));
    }

    #[tokio::test]
    async fn test_use_credit_falls_back_to_set_when_atomic_unsupported() {
        let store = Arc::new(MemoryCredits::new(3).without_atomic_decrement());
        let user = UserId::generate();
        let ledger = ledger(&store, user).await;

        ledger.use_credit().await.expect("charge");
        assert_eq!(store.balance(user).await, CreditBalance::new(2));
        assert_eq!(store.set_calls(), 1);
    }

    #[tokio::test]
    async fn test_use_credit_rolls_back_on_store_failure() {
        let store = Arc::new(MemoryCredits::new(1));
        let user = UserId::generate();
        let ledger = ledger(&store, user).await;
        store.fail_writes(true);

        let result = ledger.use_credit().await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(ledger.balance().await, CreditBalance::new(1));
    }

    #[tokio::test]
    async fn test_reconciles_to_server_value_after_concurrent_top_up() {
        let store = Arc::new(MemoryCredits::new(1));
        let user = UserId::generate();
        let ledger = ledger(&store, user).await;

        // a webhook lands between the local read and the charge
        store.add_credits(user, 10).await.expect("top up");

        let confirmed = ledger.use_credit().await.expect("charge");
        assert_eq!(confirmed, CreditBalance::new(10));
        assert_eq!(ledger.balance().await, CreditBalance::new(10));
    }

    /// Atomic decrement that waits to be released, then fails.
    struct StalledCredits {
        inner: MemoryCredits,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl CreditsStore for StalledCredits {
        async fn get_credits(&self, user: UserId) -> Result<CreditBalance, StoreError> {
            self.inner.get_credits(user).await
        }

        async fn set_credits(
            &self,
            user: UserId,
            credits: CreditBalance,
        ) -> Result<CreditBalance, StoreError> {
            self.inner.set_credits(user, credits).await
        }

        async fn decrement_credits(&self, _user: UserId) -> Result<CreditBalance, StoreError> {
            self.entered.notify_one();
            self.release.notified().await;
            Err(StoreError::Backend("timed out".to_string()))
        }

        async fn add_credits(&self, user: UserId, credits: u32) -> Result<CreditBalance, StoreError> {
            self.inner.add_credits(user, credits).await
        }
    }

    #[tokio::test]
    async fn test_failed_charge_keeps_balance_refreshed_meanwhile() {
        let store = Arc::new(StalledCredits {
            inner: MemoryCredits::new(1),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let user = UserId::generate();
        let ledger = Arc::new(CreditLedger::new(
            user,
            Arc::clone(&store) as Arc<dyn CreditsStore>,
        ));
        ledger.refresh().await.expect("refresh");

        let charging = Arc::clone(&ledger);
        let charge = tokio::spawn(async move { charging.use_credit().await });
        store.entered.notified().await;

        // a top-up is applied and read while the charge is in flight
        store.inner.add_credits(user, 10).await.expect("top up");
        assert_eq!(ledger.refresh().await.expect("refresh"), CreditBalance::new(11));

        store.release.notify_one();
        let result = charge.await.expect("join");
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(ledger.balance().await, CreditBalance::new(11));
    }
}
