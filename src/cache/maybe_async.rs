use std::future::{self, Future, IntoFuture};

use futures_util::future::{BoxFuture, Either};

use crate::cache::{CacheType, Error};

/// The outcome of a cache operation.
///
/// Operations served by the in-process map or by a blocking remote client
/// complete before returning and are [`MaybeAsync::Ready`]. Operations served
/// by a non-blocking remote client are [`MaybeAsync::Pending`] and do nothing
/// until awaited. Awaiting works for both, so callers that do not care about
/// the mode can always `.await`.
pub enum MaybeAsync<T> {
    Ready(Result<T, Error>),
    Pending(BoxFuture<'static, Result<T, Error>>),
}

impl<T> MaybeAsync<T> {
    pub fn ok(value: T) -> Self {
        MaybeAsync::Ready(Ok(value))
    }

    pub fn err(error: Error) -> Self {
        MaybeAsync::Ready(Err(error))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, Error>> + Send + 'static,
    {
        MaybeAsync::Pending(Box::pin(future))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, MaybeAsync::Pending(_))
    }

    /// Returns the result of an operation that already completed.
    ///
    /// # Errors
    ///
    /// * `Error::RequiresAwait` if the operation is still pending
    pub fn into_ready(self) -> Result<T, Error> {
        match self {
            MaybeAsync::Ready(result) => result,
            MaybeAsync::Pending(_) => Err(Error::RequiresAwait(CacheType::AsyncRemote)),
        }
    }

    pub fn map<U, F>(self, f: F) -> MaybeAsync<U>
    where
        T: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            MaybeAsync::Ready(result) => MaybeAsync::Ready(result.map(f)),
            MaybeAsync::Pending(future) => MaybeAsync::pending(async move { future.await.map(f) }),
        }
    }
}

impl<T> From<Result<T, Error>> for MaybeAsync<T> {
    fn from(result: Result<T, Error>) -> Self {
        MaybeAsync::Ready(result)
    }
}

impl<T> IntoFuture for MaybeAsync<T> {
    type Output = Result<T, Error>;
    type IntoFuture =
        Either<future::Ready<Result<T, Error>>, BoxFuture<'static, Result<T, Error>>>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            MaybeAsync::Ready(result) => Either::Left(future::ready(result)),
            MaybeAsync::Pending(future) => Either::Right(future),
        }
    }
}

impl<T> std::fmt::Debug for MaybeAsync<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaybeAsync::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            MaybeAsync::Pending(_) => f.write_str("Pending"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_ready_can_be_awaited() {
        let outcome = MaybeAsync::ok(7);
        assert!(!outcome.is_pending());
        assert_eq!(outcome.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_pending_is_lazy() {
        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        let outcome = MaybeAsync::pending(async move {
            flag.store(true, Ordering::SeqCst);
            Ok::<_, Error>("done")
        });

        assert!(outcome.is_pending());
        assert!(!polled.load(Ordering::SeqCst));
        assert_eq!(outcome.await.unwrap(), "done");
        assert!(polled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_into_ready_rejects_pending() {
        let outcome: MaybeAsync<()> = MaybeAsync::pending(async { Ok::<_, Error>(()) });
        assert!(matches!(
            outcome.into_ready(),
            Err(Error::RequiresAwait(CacheType::AsyncRemote))
        ));
    }

    #[tokio::test]
    async fn test_map() {
        let ready = MaybeAsync::ok(2).map(|n| n * 10);
        assert_eq!(ready.into_ready().unwrap(), 20);

        let pending = MaybeAsync::pending(async { Ok::<_, Error>(3) }).map(|n| n + 1);
        assert!(pending.is_pending());
        assert_eq!(pending.await.unwrap(), 4);
    }
}
