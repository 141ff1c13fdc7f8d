use super::{Mode, SessionController, SessionView, SubmitOutcome};
use crate::engine::{PieceKind, RulesEngine, Square};
use crate::selector::MoveSelector;
use crate::session::BotTicket;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

struct Inner<R: RulesEngine, S> {
    controller: SessionController<R, S>,
    // cancelled and replaced on every reset
    cancel: CancellationToken,
}

/// Shared async front door to a [`SessionController`].
///
/// Every operation takes the session lock, runs to completion, then
/// publishes a fresh [`SessionView`]. Bot tickets are turned into timer
/// tasks that fire after `bot_delay`.
pub struct SessionHandle<R: RulesEngine, S> {
    inner: Arc<Mutex<Inner<R, S>>>,
    views: Arc<watch::Sender<SessionView<R::Position>>>,
    bot_delay: Duration,
}

impl<R: RulesEngine, S> Clone for SessionHandle<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            views: Arc::clone(&self.views),
            bot_delay: self.bot_delay,
        }
    }
}

impl<R, S> SessionHandle<R, S>
where
    R: RulesEngine + Send + 'static,
    R::Position: Send + Sync + 'static,
    S: MoveSelector + Send + 'static,
{
    /// Wrap `controller`. Must be called from within a tokio runtime, since
    /// a bot move due at start is scheduled immediately.
    pub fn spawn(mut controller: SessionController<R, S>, bot_delay: Duration) -> Self {
        let first_ticket = controller.take_bot_ticket();
        let (views, _) = watch::channel(controller.view());
        let cancel = CancellationToken::new();
        let handle = Self {
            inner: Arc::new(Mutex::new(Inner {
                controller,
                cancel: cancel.clone(),
            })),
            views: Arc::new(views),
            bot_delay,
        };
        if let Some(ticket) = first_ticket {
            handle.start_timer(ticket, cancel);
        }
        handle
    }

    pub fn bot_delay(&self) -> Duration {
        self.bot_delay
    }

    /// Receiver that sees a new view after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionView<R::Position>> {
        self.views.subscribe()
    }

    /// Latest published view.
    pub fn view(&self) -> SessionView<R::Position> {
        self.views.borrow().clone()
    }

    pub async fn submit_move(&self, from: Square, to: Square) -> SubmitOutcome {
        let mut inner = self.inner.lock().await;
        let outcome = inner.controller.submit_move(from, to);
        self.publish(&mut inner);
        outcome
    }

    pub async fn submit_move_with_promotion(
        &self,
        from: Square,
        to: Square,
        promotion: PieceKind,
    ) -> SubmitOutcome {
        let mut inner = self.inner.lock().await;
        let outcome = inner
            .controller
            .submit_move_with_promotion(from, to, promotion);
        self.publish(&mut inner);
        outcome
    }

    pub async fn execute_pre_move(&self) -> Option<SubmitOutcome> {
        let mut inner = self.inner.lock().await;
        let outcome = inner.controller.execute_pre_move();
        self.publish(&mut inner);
        outcome
    }

    pub async fn highlight_moves(&self, square: Square) -> BTreeSet<Square> {
        let mut inner = self.inner.lock().await;
        let highlighted = inner.controller.highlight_moves(square).clone();
        self.publish(&mut inner);
        highlighted
    }

    pub async fn clear_highlights(&self) {
        let mut inner = self.inner.lock().await;
        inner.controller.clear_highlights();
        self.publish(&mut inner);
    }

    pub async fn set_mode(&self, mode: Mode) {
        let mut inner = self.inner.lock().await;
        inner.controller.set_mode(mode);
        self.publish(&mut inner);
    }

    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.cancel.cancel();
        inner.cancel = CancellationToken::new();
        inner.controller.reset();
        self.publish(&mut inner);
    }

    /// Run `f` against the controller under the session lock.
    pub async fn with_controller<T>(&self, f: impl FnOnce(&SessionController<R, S>) -> T) -> T {
        let inner = self.inner.lock().await;
        f(&inner.controller)
    }

    fn publish(&self, inner: &mut MutexGuard<'_, Inner<R, S>>) {
        if let Some(ticket) = inner.controller.take_bot_ticket() {
            self.start_timer(ticket, inner.cancel.clone());
        }
        self.views.send_replace(inner.controller.view());
    }

    fn start_timer(&self, ticket: BotTicket, cancel: CancellationToken) {
        debug!(?ticket, delay_ms = self.bot_delay.as_millis() as u64, "bot timer started");
        tokio::spawn(self.clone().run_bot_timer(ticket, cancel));
    }

    // Follow-up tickets produced by the bot's own move are handled in this
    // loop instead of a new task.
    async fn run_bot_timer(self, mut ticket: BotTicket, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(?ticket, "bot timer cancelled");
                    return;
                }
                _ = tokio::time::sleep(self.bot_delay) => {}
            }

            let mut inner = self.inner.lock().await;
            if cancel.is_cancelled() {
                debug!(?ticket, "bot timer cancelled");
                return;
            }
            if let Some(san) = inner.controller.fire_bot_move(ticket) {
                info!(san = %san, "scheduled bot move played");
            }
            let next = inner.controller.take_bot_ticket();
            self.views.send_replace(inner.controller.view());
            drop(inner);

            match next {
                Some(t) => ticket = t,
                None => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Color, StandardRules};
    use crate::selector::RandomSelector;

    fn s(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn bot_handle() -> SessionHandle<StandardRules, RandomSelector> {
        let controller = SessionController::new(StandardRules::new(), RandomSelector::seeded(5))
            .with_mode(Mode::Bot);
        SessionHandle::spawn(controller, Duration::from_millis(500))
    }

    #[tokio::test(start_paused = true)]
    async fn test_bot_replies_after_delay() {
        let handle = bot_handle();
        assert!(handle.submit_move(s("e2"), s("e4")).await.accepted);
        assert!(handle.view().bot_thinking);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(handle.view().history.len(), 1, "bot still thinking");

        tokio::time::sleep(Duration::from_millis(200)).await;
        let view = handle.view();
        assert_eq!(view.history.len(), 2);
        assert_eq!(view.turn, Color::White);
        assert!(!view.bot_thinking);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_bot_move() {
        let handle = bot_handle();
        handle.submit_move(s("e2"), s("e4")).await;
        handle.reset().await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        let view = handle.view();
        assert!(view.history.is_empty());
        assert_eq!(view.generation, 1);
        assert_eq!(view.mode, Mode::Bot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_sees_changes() {
        let handle = bot_handle();
        let mut rx = handle.subscribe();
        handle.highlight_moves(s("b1")).await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().highlighted.len(), 2);
    }
}
