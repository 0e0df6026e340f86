//! Live sequences: multi-emission value sources backed by watch channels.
//!
//! A live sequence is a value source that may emit more than once over its
//! lifetime as underlying data changes; consumers observe the latest emission.
//! Both collaborator surfaces (the airport catalog and the favorite store)
//! expose their query results this way, so a view subscribed to a query
//! refreshes automatically when the data behind it moves.
//!
//! The representation is a plain [`tokio::sync::watch::Receiver`]: the current
//! value is always available via `borrow`, and `changed().await` wakes on the
//! next emission. Consumers typically loop `borrow_and_update` → process →
//! `changed()`, racing the wait against their cancellation token.

use tokio::sync::watch;

/// A live, re-emitting view of a value.
pub type Live<T> = watch::Receiver<T>;

/// Derives a live sequence by mapping every emission of `source`.
///
/// The initial value is computed eagerly from the source's current value; a
/// background task then re-applies `map` on every subsequent source emission.
/// The task exits when either side is dropped: when the source sender goes
/// away (`changed` fails) or when every derived receiver is gone (`send`
/// fails), so derived queries never leak their forwarding task.
///
/// This is how catalog queries stay live: the full airport table sits behind
/// one watch sender and each `search`/`destinations_from` call derives a
/// filtered view of it.
pub fn derive<T, U, F>(mut source: Live<T>, map: F) -> Live<U>
where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static,
    F: Fn(&T) -> U + Send + 'static,
{
    let initial = map(&source.borrow());
    let (tx, rx) = watch::channel(initial);

    tokio::spawn(async move {
        while source.changed().await.is_ok() {
            let next = map(&source.borrow());
            if tx.send(next).is_err() {
                break;
            }
        }
    });

    rx
}
