//! Concurrency primitives
//!
//! Stages exchange values over bounded channels. Every blocking operation polls a
//! shared [`CancellationToken`], so once any task fails, the others stop at their
//! next push or pop instead of waiting forever. Trees are processed with the
//! rayon-backed [`fork_join`] helpers.

use parking_lot::Mutex;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::Error;

/// Capacity of the channels between tasks
pub const CHANNEL_SIZE: usize = 256;

const PUSH_BACKOFF_MIN: Duration = Duration::from_micros(1);
const PUSH_BACKOFF_MAX: Duration = Duration::from_micros(200);
const POP_TIMEOUT: Duration = Duration::from_millis(10);

/// A flag shared by all tasks of a run
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!("run cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sends `value`, waiting while the channel is full
    ///
    /// A full channel is retried right away after yielding, then with a growing
    /// pause capped at `PUSH_BACKOFF_MAX`. Fails with [`Error::Cancelled`] if the
    /// token is cancelled or the receiver is gone.
    pub fn push<T>(&self, tx: &SyncSender<T>, value: T) -> Result<(), Error> {
        let mut value = value;
        let mut backoff = Duration::ZERO;
        loop {
            if self.is_cancelled() {
                return Err(Error::Cancelled);
            }
            match tx.try_send(value) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(v)) => {
                    value = v;
                    if backoff.is_zero() {
                        thread::yield_now();
                        backoff = PUSH_BACKOFF_MIN;
                    } else {
                        thread::sleep(backoff);
                        backoff = (backoff * 2).min(PUSH_BACKOFF_MAX);
                    }
                }
                Err(TrySendError::Disconnected(_)) => return Err(Error::Cancelled),
            }
        }
    }

    /// Receives the next value, waiting while the channel is empty
    ///
    /// Blocks on the channel itself; the timeout only bounds how long a
    /// cancellation goes unnoticed. Returns `Ok(None)` once every sender is gone
    /// and the channel is drained.
    pub fn pop<T>(&self, rx: &Receiver<T>) -> Result<Option<T>, Error> {
        loop {
            if self.is_cancelled() {
                return Err(Error::Cancelled);
            }
            match rx.recv_timeout(POP_TIMEOUT) {
                Ok(value) => return Ok(Some(value)),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }
    }
}

/// The shared state of a group of tasks: the token and the first error
#[derive(Debug, Default)]
pub struct Context {
    token: CancellationToken,
    error: Mutex<Option<Error>>,
}

impl Context {
    pub fn new(token: CancellationToken) -> Context {
        Context {
            token,
            error: Mutex::new(None),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Records `error` unless an earlier one is already known, and cancels the
    /// other tasks
    pub fn fail(&self, error: Error) {
        {
            let mut slot = self.error.lock();
            if slot.is_none() {
                tracing::debug!("task failed: {}", error);
                *slot = Some(error);
            }
        }
        self.token.cancel();
    }

    pub fn into_result(self) -> Result<(), Error> {
        match self.error.into_inner() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Applies `f` to every child concurrently and collects the results in order
pub fn fork_join<I, R, F>(children: I, f: F) -> Vec<R>
where
    I: IntoParallelIterator,
    R: Send,
    F: Fn(I::Item) -> R + Sync + Send,
{
    children.into_par_iter().map(f).collect()
}

/// Applies `f` to every child concurrently, for children borrowed mutably
///
/// Each child is visited by exactly one task, so `f` may mutate it without locks.
pub fn fork_join_mut<I, F>(children: I, f: F)
where
    I: IntoParallelIterator,
    F: Fn(I::Item) + Sync + Send,
{
    children.into_par_iter().for_each(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::sync_channel;

    #[test]
    fn push_and_pop() {
        let token = CancellationToken::new();
        let (tx, rx) = sync_channel(1);
        let producer = {
            let token = token.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    token.push(&tx, i).unwrap();
                }
            })
        };
        let mut received = Vec::new();
        while let Some(i) = token.pop(&rx).unwrap() {
            received.push(i);
        }
        producer.join().unwrap();
        assert_eq!(received, (0..10).collect::<Vec<i32>>());
    }

    #[test]
    fn slow_consumer_gets_everything() {
        let token = CancellationToken::new();
        let (tx, rx) = sync_channel(2);
        let producer = {
            let token = token.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    token.push(&tx, i).unwrap();
                }
            })
        };
        let mut received = Vec::new();
        while let Some(i) = token.pop(&rx).unwrap() {
            if i % 50 == 0 {
                thread::sleep(Duration::from_millis(2));
            }
            received.push(i);
        }
        producer.join().unwrap();
        assert_eq!(received, (0..200).collect::<Vec<i32>>());
    }

    #[test]
    fn cancellation_unblocks_push() {
        let token = CancellationToken::new();
        let (tx, _rx) = sync_channel(1);
        token.push(&tx, 1).unwrap();
        let producer = {
            let token = token.clone();
            thread::spawn(move || token.push(&tx, 2))
        };
        token.cancel();
        assert!(matches!(producer.join().unwrap(), Err(Error::Cancelled)));
        let (_tx, rx) = sync_channel::<i32>(1);
        assert!(matches!(token.pop(&rx), Err(Error::Cancelled)));
    }

    #[test]
    fn context_keeps_the_first_error() {
        let context = Context::new(CancellationToken::new());
        context.fail(Error::Config {
            line: 1,
            message: "first".to_string(),
        });
        context.fail(Error::Cancelled);
        assert!(context.token().is_cancelled());
        assert!(matches!(context.into_result(), Err(Error::Config { line: 1, .. })));
    }

    #[test]
    fn fork_join_visits_every_child() {
        let squares = fork_join(vec![1, 2, 3], |i| i * i);
        assert_eq!(squares, vec![1, 4, 9]);
        let mut children = vec![1, 2, 3];
        fork_join_mut(&mut children, |c| *c += 1);
        assert_eq!(children, vec![2, 3, 4]);
    }
}
