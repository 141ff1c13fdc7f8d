use super::{GameOutcome, GameSession, Mode, PreMove, Rejection, SessionView, SubmitOutcome};
use crate::engine::{AppliedMove, Color, PieceKind, RulesEngine, Square};
use crate::error::IllegalMoveReason;
use crate::selector::MoveSelector;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Identifies one scheduled bot move: the session generation, the ply it
/// was scheduled for and a schedule sequence number. Only the ticket that
/// is currently pending may fire; any other is stale, even for the same ply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BotTicket {
    pub generation: u64,
    pub ply: usize,
    pub seq: u64,
}

#[derive(Clone, Copy, Debug)]
struct PendingBot {
    ticket: BotTicket,
    dispatched: bool,
}

/// Owns the [`GameSession`] and runs every state transition on it.
///
/// The controller is synchronous. Delayed bot moves are published as
/// [`BotTicket`]s; whoever drives the clock takes them with
/// [`take_bot_ticket`](Self::take_bot_ticket) and hands them back to
/// [`fire_bot_move`](Self::fire_bot_move) once the delay has passed.
pub struct SessionController<R: RulesEngine, S> {
    rules: R,
    selector: S,
    bot_color: Color,
    session: GameSession<R::Position>,
    generation: u64,
    schedule_seq: u64,
    pending_bot: Option<PendingBot>,
}

impl<R: RulesEngine, S: MoveSelector> SessionController<R, S> {
    pub fn new(rules: R, selector: S) -> Self {
        let session = Self::fresh_session(&rules, Mode::default());
        let mut controller = Self {
            rules,
            selector,
            bot_color: Color::Black,
            session,
            generation: 0,
            schedule_seq: 0,
            pending_bot: None,
        };
        controller.evaluate_termination();
        controller
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.set_mode(mode);
        self
    }

    pub fn with_bot_color(mut self, color: Color) -> Self {
        self.bot_color = color;
        self.pending_bot = None;
        self.discard_bot_side_pre_move();
        self.schedule_bot_if_due();
        self
    }

    fn fresh_session(rules: &R, mode: Mode) -> GameSession<R::Position> {
        let position = rules.initial_position();
        let turn = rules.side_to_move(&position);
        let fullmove = rules.fullmove_number(&position);
        GameSession::new(position, turn, fullmove, mode)
    }

    // =====================
    // Accessors
    // =====================

    pub fn session(&self) -> &GameSession<R::Position> {
        &self.session
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn bot_color(&self) -> Color {
        self.bot_color
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while a bot move is scheduled for the current turn.
    pub fn bot_pending(&self) -> bool {
        self.pending_bot.is_some()
    }

    pub fn view(&self) -> SessionView<R::Position> {
        SessionView {
            position: self.session.position.clone(),
            turn: self.session.turn,
            mode: self.session.mode,
            bot_color: self.bot_color,
            history: self.session.history.clone(),
            outcome: self.session.outcome,
            pre_move: self.session.pre_move,
            highlighted: self.session.highlighted.clone(),
            generation: self.generation,
            bot_thinking: self.pending_bot.is_some(),
        }
    }

    fn is_bot_turn(&self) -> bool {
        self.session.mode == Mode::Bot
            && self.session.turn == self.bot_color
            && !self.session.is_game_over()
    }

    // =====================
    // Move Submission
    // =====================

    /// Submit `from -> to` for whichever side owns the origin piece.
    /// Promotions default to a queen.
    pub fn submit_move(&mut self, from: Square, to: Square) -> SubmitOutcome {
        self.attempt(from, to, None, true)
    }

    pub fn submit_move_with_promotion(
        &mut self,
        from: Square,
        to: Square,
        promotion: PieceKind,
    ) -> SubmitOutcome {
        self.attempt(from, to, Some(promotion), true)
    }

    fn attempt(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
        allow_pre_move: bool,
    ) -> SubmitOutcome {
        if self.session.is_game_over() {
            debug!(%from, %to, "move ignored, game is over");
            return SubmitOutcome::rejected(Rejection::GameOver);
        }

        match self
            .rules
            .apply_move(&self.session.position, from, to, promotion)
        {
            Ok(applied) => {
                if self.session.mode == Mode::Bot && applied.moved_color == self.bot_color {
                    debug!(%from, %to, "move rejected, bot-controlled side");
                    return SubmitOutcome::rejected(Rejection::BotControlled);
                }
                self.commit(applied);
                SubmitOutcome::applied()
            }
            Err(IllegalMoveReason::WrongTurn) if allow_pre_move => {
                let color = self.session.turn.opponent();
                if self.session.mode == Mode::Bot && color == self.bot_color {
                    debug!(%from, %to, "pre-move rejected, bot-controlled side");
                    return SubmitOutcome::rejected(Rejection::BotControlled);
                }
                let pre_move = PreMove {
                    from,
                    to,
                    promotion,
                    color,
                };
                if let Some(previous) = self.session.pre_move.replace(pre_move) {
                    debug!(%previous, "pre-move overwritten");
                }
                info!(%pre_move, %color, "pre-move queued");
                SubmitOutcome::queued()
            }
            Err(reason) => {
                debug!(%from, %to, %reason, "move rejected");
                SubmitOutcome::rejected(Rejection::Illegal(reason))
            }
        }
    }

    fn commit(&mut self, applied: AppliedMove<R::Position>) {
        let AppliedMove {
            position,
            notation,
            moved_color,
            ..
        } = applied;

        self.session.turn = self.rules.side_to_move(&position);
        self.session.position = position;
        self.session.highlighted.clear();
        self.session.history.push(notation.as_str());
        self.pending_bot = None;
        info!(
            ply = self.session.history.len(),
            color = %moved_color,
            san = %notation,
            "move committed"
        );

        if self.evaluate_termination() {
            return;
        }

        // A queued pre-move only ever gets one attempt, right after the
        // opponent's move lands.
        if let Some(pre_move) = self.session.pre_move {
            if pre_move.color == self.session.turn {
                self.session.pre_move = None;
                self.play_pre_move(pre_move);
            }
        }

        self.schedule_bot_if_due();
    }

    /// Sets the outcome if the current position is terminal. Returns true if
    /// the game is over.
    fn evaluate_termination(&mut self) -> bool {
        if self.session.is_game_over() {
            return true;
        }
        let status = self.rules.terminal_status(&self.session.position);
        let Some(outcome) = GameOutcome::classify(status, self.session.turn) else {
            return false;
        };
        info!(winner = %outcome.winner, %status, "game over");
        self.session.outcome = Some(outcome);
        if let Some(discarded) = self.session.pre_move.take() {
            debug!(pre_move = %discarded, "pre-move discarded at game end");
        }
        self.session.highlighted.clear();
        self.pending_bot = None;
        true
    }

    fn play_pre_move(&mut self, pre_move: PreMove) -> SubmitOutcome {
        let outcome = self.attempt(pre_move.from, pre_move.to, pre_move.promotion, false);
        if outcome.accepted {
            info!(%pre_move, "pre-move executed");
        } else {
            info!(%pre_move, reason = ?outcome.rejection, "pre-move dropped");
        }
        outcome
    }

    /// Attempt the queued pre-move now. The slot is emptied whatever the
    /// result; `None` when nothing was queued or the game is over.
    pub fn execute_pre_move(&mut self) -> Option<SubmitOutcome> {
        if self.session.is_game_over() {
            return None;
        }
        let pre_move = self.session.pre_move.take()?;
        Some(self.play_pre_move(pre_move))
    }

    // =====================
    // Bot
    // =====================

    /// Let the selector play for the bot side right away. Returns the
    /// notation of the move played, `None` when it is not the bot's turn or
    /// there is nothing to play.
    pub fn request_bot_move(&mut self) -> Option<String> {
        if !self.is_bot_turn() {
            return None;
        }
        let legal = self.rules.legal_moves(&self.session.position, None);
        let Some(choice) = self.selector.select(&legal) else {
            warn!("bot has no legal move to play");
            return None;
        };
        if !legal.contains(&choice) {
            warn!(mv = %choice, "selector returned a move outside the legal set");
            return None;
        }
        match self.rules.apply_move(
            &self.session.position,
            choice.from,
            choice.to,
            choice.promotion,
        ) {
            Ok(applied) => {
                let san = applied.notation.clone();
                info!(san = %san, "bot moved");
                self.commit(applied);
                Some(san)
            }
            Err(reason) => {
                warn!(mv = %choice, %reason, "rules engine refused a listed legal move");
                None
            }
        }
    }

    fn schedule_bot_if_due(&mut self) {
        if !self.is_bot_turn() {
            return;
        }
        let (generation, ply) = (self.generation, self.session.history.len());
        if self
            .pending_bot
            .is_some_and(|p| p.ticket.generation == generation && p.ticket.ply == ply)
        {
            return;
        }
        self.schedule_seq += 1;
        let ticket = BotTicket {
            generation,
            ply,
            seq: self.schedule_seq,
        };
        debug!(?ticket, "bot move scheduled");
        self.pending_bot = Some(PendingBot {
            ticket,
            dispatched: false,
        });
    }

    /// Hand out the pending bot ticket, once.
    pub fn take_bot_ticket(&mut self) -> Option<BotTicket> {
        let pending = self.pending_bot.as_mut()?;
        if pending.dispatched {
            return None;
        }
        pending.dispatched = true;
        Some(pending.ticket)
    }

    /// Play the bot move for `ticket` if it is still the pending one.
    pub fn fire_bot_move(&mut self, ticket: BotTicket) -> Option<String> {
        match self.pending_bot {
            Some(pending) if pending.ticket == ticket => {
                self.pending_bot = None;
                self.request_bot_move()
            }
            _ => {
                debug!(?ticket, generation = self.generation, "stale bot ticket ignored");
                None
            }
        }
    }

    // =====================
    // Selection & Lifecycle
    // =====================

    /// Highlight the legal destinations from `square`.
    pub fn highlight_moves(&mut self, square: Square) -> &BTreeSet<Square> {
        if !self.session.is_game_over() {
            self.session.highlighted = self
                .rules
                .legal_moves(&self.session.position, Some(square))
                .into_iter()
                .map(|m| m.to)
                .collect();
        }
        &self.session.highlighted
    }

    pub fn clear_highlights(&mut self) {
        self.session.highlighted.clear();
    }

    /// Start a new game from the initial position, keeping the mode.
    /// Any bot move scheduled for the old game becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.pending_bot = None;
        self.session = Self::fresh_session(&self.rules, self.session.mode);
        info!(generation = self.generation, mode = %self.session.mode, "session reset");
        if !self.evaluate_termination() {
            self.schedule_bot_if_due();
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.session.mode != mode {
            info!(%mode, "mode changed");
        }
        self.session.mode = mode;
        match mode {
            Mode::Human => {
                if self.pending_bot.take().is_some() {
                    debug!("pending bot move cancelled");
                }
            }
            Mode::Bot => {
                self.discard_bot_side_pre_move();
                self.schedule_bot_if_due();
            }
        }
    }

    fn discard_bot_side_pre_move(&mut self) {
        if self.session.mode == Mode::Bot
            && self.session.pre_move.is_some_and(|p| p.color == self.bot_color)
        {
            self.session.pre_move = None;
            debug!("pre-move for the bot side discarded");
        }
    }
}
