//! Transaction runner shared by the lifecycle engine and the inventory service
//!
//! ```text
//! run_in_txn(op)
//!     ├─ begin write txn, check context
//!     ├─ op(txn)
//!     ├─ check context, commit
//!     └─ Conflict? → drop txn, replay (at most max_retries times)
//! ```

use super::context::{Interrupted, OpContext};
use super::store::{OrderBackend, StoreError, StoreTxn};

/// Error type a transactional operation can fail with
pub trait TxnError: From<StoreError> + From<Interrupted> {
    /// Whether the attempt may be replayed in a fresh transaction
    fn is_retryable(&self) -> bool;
}

/// Run `op` in a fresh write transaction, retrying transient conflicts.
///
/// The context is checked after the transaction begins and again right
/// before commit. Every failed attempt is rolled back before the next one.
pub fn run_in_txn<B, T, E>(
    backend: &B,
    ctx: &OpContext,
    max_retries: u32,
    mut op: impl FnMut(&mut B::Txn) -> Result<T, E>,
) -> Result<T, E>
where
    B: OrderBackend,
    E: TxnError,
{
    let mut retries = 0;
    loop {
        match attempt(backend, ctx, &mut op) {
            Err(e) if e.is_retryable() && retries < max_retries => {
                retries += 1;
                tracing::debug!(retries, "Transaction conflict, retrying");
            }
            result => return result,
        }
    }
}

fn attempt<B, T, E>(
    backend: &B,
    ctx: &OpContext,
    op: &mut impl FnMut(&mut B::Txn) -> Result<T, E>,
) -> Result<T, E>
where
    B: OrderBackend,
    E: TxnError,
{
    let mut txn = backend.begin()?;
    ctx.check()?;
    let value = op(&mut txn)?;
    ctx.check()?;
    txn.commit()?;
    Ok(value)
}

/// Run a read-only `op` on a snapshot
///
/// Snapshots never wait for writers, so the context is only checked up front.
pub fn read<B, T, E>(
    backend: &B,
    ctx: &OpContext,
    op: impl FnOnce(&B::ReadTxn) -> Result<T, E>,
) -> Result<T, E>
where
    B: OrderBackend,
    E: From<StoreError> + From<Interrupted>,
{
    ctx.check()?;
    let txn = backend.begin_read()?;
    op(&txn)
}
