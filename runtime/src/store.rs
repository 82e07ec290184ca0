//! The Store: state ownership, reducer execution, and effect execution.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use relink_core::effect::Effect;
use relink_core::reducer::Reducer;
use tokio::sync::{RwLock, broadcast};

/// Errors produced by the store runtime.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store is shutting down and rejected the action.
    #[error("store is shutting down")]
    ShutdownInProgress,

    /// Shutdown timed out with effects still running.
    #[error("shutdown timeout: {0} effects still running")]
    ShutdownTimeout(usize),

    /// Timed out waiting for a matching action.
    #[error("timed out waiting for action")]
    Timeout,

    /// The action broadcast channel closed.
    #[error("action channel closed")]
    ChannelClosed,
}

/// Decrements the pending-effect counter when dropped, so the counter stays
/// accurate even if an effect task panics.
struct CounterGuard(Arc<AtomicUsize>);

impl Drop for CounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The runtime store: owns state, runs the reducer, executes effects.
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
///
/// # Example
///
/// ```ignore
/// let store = Store::new(LinkState::new(account), LinkingReducer::new(), env);
///
/// let result = store.send_and_wait_for(
///     LinkAction::SelectProvider { correlation_id, row },
///     |a| matches!(a, LinkAction::LinkSucceeded { .. } | LinkAction::LinkFailed { .. }),
///     Duration::from_secs(5),
/// ).await?;
/// ```
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: R,
    environment: E,
    shutdown: Arc<AtomicBool>,
    pending_effects: Arc<AtomicUsize>,
    /// Action broadcast channel for observing actions produced by effects.
    ///
    /// This is the event interface to the presentation layer: every action
    /// an effect produces is broadcast before it is fed back to the reducer.
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: self.reducer.clone(),
            environment: self.environment.clone(),
            shutdown: Arc::clone(&self.shutdown),
            pending_effects: Arc::clone(&self.pending_effects),
            action_broadcast: self.action_broadcast.clone(),
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
    A: Clone + Send + 'static,
    S: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment.
    ///
    /// The action broadcast channel buffers 16 actions; use
    /// [`Store::with_broadcast_capacity`] if observers are slow.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
    }

    /// Create a new store with a custom action broadcast capacity.
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity);

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer,
            environment,
            shutdown: Arc::new(AtomicBool::new(false)),
            pending_effects: Arc::new(AtomicUsize::new(0)),
            action_broadcast,
        }
    }

    /// Send an action to the store.
    ///
    /// 1. Acquires the write lock on state
    /// 2. Calls the reducer with `(state, action, environment)`
    /// 3. Starts executing the returned effects asynchronously
    ///
    /// `send()` returns after *starting* effect execution, not completion.
    /// Effects may produce more actions, which are broadcast to observers
    /// and fed back into the reducer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting
    /// down.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<(), StoreError> {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!("rejected action: store is shutting down");
            return Err(StoreError::ShutdownInProgress);
        }

        metrics::counter!("store.actions.total").increment(1);

        let effects = {
            let mut state = self.state.write().await;

            let span = tracing::debug_span!("reducer_execution");
            let _enter = span.enter();

            let start = std::time::Instant::now();
            let effects = self.reducer.reduce(&mut state, action, &self.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            effects
        };

        tracing::trace!("reducer returned {} effects", effects.len());
        for effect in effects {
            self.execute_effect(effect);
        }

        Ok(())
    }

    /// Send an action and wait for a matching result action.
    ///
    /// Designed for request-response interactions: subscribe to the action
    /// broadcast *before* sending (avoids a race), send the action, then
    /// return the first effect-produced action matching the predicate.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if no matching action arrives in time
    /// - [`StoreError::ChannelClosed`] if the broadcast channel closes
    /// - [`StoreError::ShutdownInProgress`] if the store is shutting down
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut rx = self.action_broadcast.subscribe();

        self.send(action).await?;

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Keep waiting; the timeout catches a dropped match.
                        tracing::warn!(skipped, "action observer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    }
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Subscribe to all actions produced by effects.
    ///
    /// The initial actions passed to [`Store::send`] are not broadcast, only
    /// the actions that effects feed back.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Read current state via a closure, releasing the lock promptly.
    ///
    /// ```ignore
    /// let linked = store.state(|s| s.account.provider_data.len()).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Number of effect tasks currently running.
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.pending_effects.load(Ordering::Acquire)
    }

    /// Wait until no effect tasks are running.
    ///
    /// Unlike [`Store::shutdown`] this does not reject new actions; it is
    /// meant for tests and request handlers that need the feedback loop to
    /// quiesce before reading state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when
    /// the timeout expires.
    pub async fn settle(&self, timeout: Duration) -> Result<(), StoreError> {
        let start = std::time::Instant::now();
        let poll_interval = Duration::from_millis(5);

        loop {
            if self.pending_effects.load(Ordering::Acquire) == 0 {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(StoreError::Timeout);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Initiate graceful shutdown: reject new actions, then wait for
    /// pending effects to finish.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
    /// when the timeout expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("initiating graceful shutdown");
        self.shutdown.store(true, Ordering::Release);

        let start = std::time::Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            let pending = self.pending_effects.load(Ordering::Acquire);

            if pending == 0 {
                tracing::info!("all effects completed, shutdown successful");
                return Ok(());
            }

            if start.elapsed() >= timeout {
                tracing::error!(pending, "shutdown timeout with effects still running");
                return Err(StoreError::ShutdownTimeout(pending));
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Start executing a single effect.
    ///
    /// `None` is a no-op and `Parallel` fans out immediately; everything
    /// else runs on its own spawned task, tracked by the pending-effect
    /// counter.
    fn execute_effect(&self, effect: Effect<A>) {
        match effect {
            Effect::None => {
                tracing::trace!("executing Effect::None (no-op)");
            }
            Effect::Parallel(effects) => {
                metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                for effect in effects {
                    self.execute_effect(effect);
                }
            }
            effect => {
                metrics::counter!("store.effects.executed", "type" => effect_kind(&effect))
                    .increment(1);
                self.pending_effects.fetch_add(1, Ordering::SeqCst);
                let guard = CounterGuard(Arc::clone(&self.pending_effects));

                let store = self.clone();
                tokio::spawn(async move {
                    let _guard = guard;
                    run_effect(store, effect).await;
                });
            }
        }
    }
}

/// Metrics label for an effect variant.
const fn effect_kind<A>(effect: &Effect<A>) -> &'static str {
    match effect {
        Effect::None => "none",
        Effect::Parallel(_) => "parallel",
        Effect::Sequential(_) => "sequential",
        Effect::Delay { .. } => "delay",
        Effect::Future(_) => "future",
    }
}

/// Run one effect to completion on the current task.
///
/// Boxed so `Sequential` can await its children recursively. Actions
/// produced by `Future` and `Delay` effects are broadcast to observers and
/// then fed back into the store.
fn run_effect<S, A, E, R>(
    store: Store<S, A, E, R>,
    effect: Effect<A>,
) -> Pin<Box<dyn Future<Output = ()> + Send>>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
    A: Clone + Send + 'static,
    S: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    Box::pin(async move {
        match effect {
            Effect::None => {}
            Effect::Future(fut) => {
                if let Some(action) = fut.await {
                    tracing::trace!("Effect::Future produced an action");
                    let _ = store.action_broadcast.send(action.clone());
                    let _ = store.send(action).await;
                } else {
                    tracing::trace!("Effect::Future completed with no action");
                }
            }
            Effect::Delay { duration, action } => {
                tokio::time::sleep(duration).await;
                let _ = store.action_broadcast.send((*action).clone());
                let _ = store.send(*action).await;
            }
            Effect::Sequential(effects) => {
                for effect in effects {
                    run_effect(store.clone(), effect).await;
                }
            }
            Effect::Parallel(effects) => {
                for effect in effects {
                    store.execute_effect(effect);
                }
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use relink_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default, PartialEq)]
    struct PingState {
        pings: u32,
        pongs: u32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum PingAction {
        Ping,
        Pong,
        SlowPong,
    }

    #[derive(Clone)]
    struct PingReducer;

    impl Reducer for PingReducer {
        type State = PingState;
        type Action = PingAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                PingAction::Ping => {
                    state.pings += 1;
                    smallvec![Effect::future(async { Some(PingAction::Pong) })]
                }
                PingAction::Pong => {
                    state.pongs += 1;
                    smallvec![Effect::None]
                }
                PingAction::SlowPong => {
                    state.pings += 1;
                    smallvec![Effect::Delay {
                        duration: Duration::from_millis(20),
                        action: Box::new(PingAction::Pong),
                    }]
                }
            }
        }
    }

    fn test_store() -> Store<PingState, PingAction, (), PingReducer> {
        Store::new(PingState::default(), PingReducer, ())
    }

    #[tokio::test]
    async fn send_runs_reducer_synchronously() {
        let store = test_store();

        store.send(PingAction::Pong).await.unwrap();

        assert_eq!(store.state(|s| s.pongs).await, 1);
    }

    #[tokio::test]
    async fn effects_feed_actions_back_into_the_reducer() {
        let store = test_store();

        let result = store
            .send_and_wait_for(
                PingAction::Ping,
                |a| matches!(a, PingAction::Pong),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        store.settle(Duration::from_secs(1)).await.unwrap();

        assert_eq!(result, PingAction::Pong);
        assert_eq!(store.state(|s| (s.pings, s.pongs)).await, (1, 1));
    }

    #[tokio::test]
    async fn observers_see_effect_produced_actions() {
        let store = test_store();
        let mut rx = store.subscribe_actions();

        store.send(PingAction::Ping).await.unwrap();

        let observed = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(observed, PingAction::Pong);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = test_store();

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(
            store.send(PingAction::Ping).await,
            Err(StoreError::ShutdownInProgress)
        );
    }

    #[tokio::test]
    async fn settle_waits_for_delayed_effects() {
        let store = test_store();

        store.send(PingAction::SlowPong).await.unwrap();
        store.settle(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.pending_effects(), 0);
        assert_eq!(store.state(|s| s.pongs).await, 1);
    }

    #[tokio::test]
    async fn shutdown_drains_pending_effects() {
        let store = test_store();

        store.send(PingAction::SlowPong).await.unwrap();
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn sequential_effects_run_in_order() {
        #[derive(Clone)]
        struct SeqReducer;

        impl Reducer for SeqReducer {
            type State = Vec<u32>;
            type Action = SeqAction;
            type Environment = ();

            fn reduce(
                &self,
                state: &mut Self::State,
                action: Self::Action,
                _env: &Self::Environment,
            ) -> SmallVec<[Effect<Self::Action>; 4]> {
                match action {
                    SeqAction::Start => smallvec![Effect::chain(vec![
                        Effect::future(async { Some(SeqAction::Mark(1)) }),
                        Effect::future(async { Some(SeqAction::Mark(2)) }),
                        Effect::future(async { Some(SeqAction::Mark(3)) }),
                    ])],
                    SeqAction::Mark(n) => {
                        state.push(n);
                        smallvec![Effect::None]
                    }
                }
            }
        }

        #[derive(Clone, Debug, PartialEq)]
        enum SeqAction {
            Start,
            Mark(u32),
        }

        let store = Store::new(Vec::new(), SeqReducer, ());

        store
            .send_and_wait_for(
                SeqAction::Start,
                |a| matches!(a, SeqAction::Mark(3)),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        store.settle(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.state(Clone::clone).await, vec![1, 2, 3]);
    }
}
