use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use common::games::tictactoe::{BotInput, GameMode, Mark, TicTacToeGameState, calculate_minimax_move};
use common::stats::{GameOutcome, StatsStore};
use common::{SessionId, UserId, log};

use crate::api_types::GameView;
use crate::error::ServerError;
use crate::id_generator::generate_session_id;

struct GameSession {
    owner: UserId,
    state: TicTacToeGameState,
    last_activity: Instant,
    /// Token of the task currently allowed to play the bot's move.
    pending_bot_turn: Option<u64>,
    last_bot_turn: u64,
}

impl GameSession {
    fn new(owner: UserId, state: TicTacToeGameState) -> Self {
        Self {
            owner,
            state,
            last_activity: Instant::now(),
            pending_bot_turn: None,
            last_bot_turn: 0,
        }
    }

    /// Hands the bot's move to a new task token, unless the bot is not due or a task
    /// already owns the turn.
    fn claim_bot_turn(&mut self) -> Option<u64> {
        if !self.state.is_bot_turn() || self.pending_bot_turn.is_some() {
            return None;
        }
        self.last_bot_turn += 1;
        self.pending_bot_turn = Some(self.last_bot_turn);
        Some(self.last_bot_turn)
    }
}

/// Single-player games kept in memory, keyed by session id and owned by one user.
///
/// Bot moves run in their own spawned tasks, so a dropped request never leaves a game
/// waiting on a bot turn that nobody plays.
#[derive(Clone)]
pub struct GameSessionManager {
    sessions: Arc<Mutex<HashMap<SessionId, GameSession>>>,
    stats_store: Arc<dyn StatsStore>,
    bot_move_delay: Duration,
}

impl GameSessionManager {
    pub fn new(stats_store: Arc<dyn StatsStore>, bot_move_delay: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            stats_store,
            bot_move_delay,
        }
    }

    pub async fn create_session(
        &self,
        owner: UserId,
        mode: GameMode,
        first_mark: Mark,
    ) -> Result<GameView, ServerError> {
        let state = TicTacToeGameState::new(mode, first_mark)?;
        let session_id = generate_session_id();

        let bot_task = {
            let mut sessions = self.sessions.lock().await;
            let mut session = GameSession::new(owner.clone(), state);
            let bot_task = session
                .claim_bot_turn()
                .map(|turn| self.spawn_bot_turn(&owner, &session_id, turn));
            sessions.insert(session_id.clone(), session);
            bot_task
        };
        log!("Game {} created for user {} ({:?}, {} starts)", session_id, owner, mode, first_mark);

        wait_for_bot(&session_id, bot_task).await;
        self.get_view(&owner, &session_id).await
    }

    /// Also restarts a bot turn whose task ended without playing, e.g. after a worker failure.
    pub async fn get_view(
        &self,
        owner: &UserId,
        session_id: &SessionId,
    ) -> Result<GameView, ServerError> {
        let mut sessions = self.sessions.lock().await;
        let session = find_owned_mut(&mut sessions, owner, session_id)?;
        if let Some(turn) = session.claim_bot_turn() {
            self.spawn_bot_turn(owner, session_id, turn);
        }
        Ok(GameView::new(session_id, &session.state))
    }

    /// Applies the human move and, when the bot is due next, waits for its answer.
    pub async fn make_move(
        &self,
        owner: &UserId,
        session_id: &SessionId,
        index: usize,
    ) -> Result<GameView, ServerError> {
        let (outcome, bot_task) = {
            let mut sessions = self.sessions.lock().await;
            let session = find_owned_mut(&mut sessions, owner, session_id)?;
            if let Some(turn) = session.claim_bot_turn() {
                self.spawn_bot_turn(owner, session_id, turn);
            }
            session.state.place_mark(index)?;
            session.last_activity = Instant::now();

            let outcome = session.state.take_outcome();
            let bot_task = session
                .claim_bot_turn()
                .map(|turn| self.spawn_bot_turn(owner, session_id, turn));
            (outcome, bot_task)
        };

        if let Some(outcome) = outcome {
            self.record_outcome(owner, session_id, outcome).await;
        }
        wait_for_bot(session_id, bot_task).await;
        self.get_view(owner, session_id).await
    }

    pub async fn reset_session(
        &self,
        owner: &UserId,
        session_id: &SessionId,
        first_mark: Mark,
    ) -> Result<GameView, ServerError> {
        let bot_task = {
            let mut sessions = self.sessions.lock().await;
            let session = find_owned_mut(&mut sessions, owner, session_id)?;
            session.state.reset(first_mark)?;
            session.last_activity = Instant::now();
            // an in-flight bot task loses its turn and will discard its result
            session.pending_bot_turn = None;
            session
                .claim_bot_turn()
                .map(|turn| self.spawn_bot_turn(owner, session_id, turn))
        };
        log!("Game {} reset, {} starts", session_id, first_mark);

        wait_for_bot(session_id, bot_task).await;
        self.get_view(owner, session_id).await
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn remove_inactive(&self, timeout: Duration) -> Vec<SessionId> {
        let mut sessions = self.sessions.lock().await;
        let expired: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, session)| session.last_activity.elapsed() >= timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for session_id in &expired {
            sessions.remove(session_id);
        }
        expired
    }

    fn spawn_bot_turn(&self, owner: &UserId, session_id: &SessionId, turn: u64) -> JoinHandle<()> {
        let manager = self.clone();
        let owner = owner.clone();
        let session_id = session_id.clone();
        tokio::spawn(async move {
            manager.run_bot_turn(&owner, &session_id, turn).await;
        })
    }

    // The search runs without holding the sessions lock. Its result is applied only if
    // `turn` still owns the bot's move; a reset in between revokes it.
    async fn run_bot_turn(&self, owner: &UserId, session_id: &SessionId, turn: u64) {
        if !self.bot_move_delay.is_zero() {
            tokio::time::sleep(self.bot_move_delay).await;
        }

        let input = {
            let sessions = self.sessions.lock().await;
            let Ok(session) = find_owned(&sessions, owner, session_id) else {
                return;
            };
            if session.pending_bot_turn != Some(turn) {
                return;
            }
            BotInput::from_game_state(&session.state)
        };

        let searched = tokio::task::spawn_blocking(move || calculate_minimax_move(&input)).await;

        let outcome = {
            let mut sessions = self.sessions.lock().await;
            let Ok(session) = find_owned_mut(&mut sessions, owner, session_id) else {
                return;
            };
            if session.pending_bot_turn != Some(turn) {
                log!("[game:{}] Bot turn {} superseded, discarding its move", session_id, turn);
                return;
            }
            session.pending_bot_turn = None;

            let index = match searched {
                Ok(Ok(Some(index))) => index,
                Ok(Ok(None)) => return,
                Ok(Err(e)) => {
                    log!("[game:{}] Bot could not move: {}", session_id, e);
                    return;
                }
                Err(e) => {
                    log!("[game:{}] Bot worker failed: {}", session_id, e);
                    return;
                }
            };
            if let Err(e) = session.state.apply_bot_move(index) {
                log!("[game:{}] Bot failed to place mark at {}: {}", session_id, index, e);
                return;
            }
            log!("[game:{}] Bot played {} at {}", session_id, session.state.board.get(index).unwrap_or_default(), index);
            session.state.take_outcome()
        };

        if let Some(outcome) = outcome {
            self.record_outcome(owner, session_id, outcome).await;
        }
    }

    // File-backed stores do blocking I/O, so the write goes to the blocking pool and
    // runs to completion even if the caller is dropped.
    async fn record_outcome(&self, owner: &UserId, session_id: &SessionId, outcome: GameOutcome) {
        let store = self.stats_store.clone();
        let user = owner.clone();
        let game = session_id.clone();
        let recorded = tokio::task::spawn_blocking(move || match store.increment(&user, outcome) {
            Ok(counters) => log!(
                "[game:{}] Finished with {}, user {} now at X:{} O:{} draws:{} ({} games)",
                game, outcome, user, counters.wins_x, counters.wins_o, counters.draws, counters.total_games()
            ),
            Err(e) => log!("[game:{}] Failed to record outcome {}: {}", game, outcome, e),
        })
        .await;

        if let Err(e) = recorded {
            log!("[game:{}] Stats worker failed: {}", session_id, e);
        }
    }
}

async fn wait_for_bot(session_id: &SessionId, bot_task: Option<JoinHandle<()>>) {
    let Some(bot_task) = bot_task else {
        return;
    };
    if let Err(e) = bot_task.await {
        log!("[game:{}] Bot task failed: {}", session_id, e);
    }
}

fn find_owned<'a>(
    sessions: &'a HashMap<SessionId, GameSession>,
    owner: &UserId,
    session_id: &SessionId,
) -> Result<&'a GameSession, ServerError> {
    sessions
        .get(session_id)
        .filter(|session| &session.owner == owner)
        .ok_or_else(|| ServerError::SessionNotFound(session_id.clone()))
}

fn find_owned_mut<'a>(
    sessions: &'a mut HashMap<SessionId, GameSession>,
    owner: &UserId,
    session_id: &SessionId,
) -> Result<&'a mut GameSession, ServerError> {
    sessions
        .get_mut(session_id)
        .filter(|session| &session.owner == owner)
        .ok_or_else(|| ServerError::SessionNotFound(session_id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::games::tictactoe::GameError;
    use common::stats::{InMemoryStatsStore, StatsCounters};

    use crate::test_support::SlowStatsStore;

    fn manager() -> (GameSessionManager, Arc<InMemoryStatsStore>) {
        let store = Arc::new(InMemoryStatsStore::new());
        (GameSessionManager::new(store.clone(), Duration::ZERO), store)
    }

    fn session_id(view: &GameView) -> SessionId {
        SessionId::new(view.id.clone())
    }

    #[tokio::test]
    async fn test_bot_answers_human_move() {
        let (manager, _) = manager();
        let user = UserId::from("u1");

        let view = manager
            .create_session(user.clone(), GameMode::HumanVsBot { bot_mark: Mark::O }, Mark::X)
            .await
            .unwrap();
        assert!(view.board.iter().all(Option::is_none));

        let view = manager.make_move(&user, &session_id(&view), 0).await.unwrap();

        assert_eq!(view.board[0].as_deref(), Some("X"));
        assert_eq!(view.board[4].as_deref(), Some("O"));
        assert_eq!(view.current_mark, "X");
        assert_eq!(view.last_move, Some(4));
    }

    #[tokio::test]
    async fn test_bot_opens_when_it_starts() {
        let (manager, _) = manager();
        let user = UserId::from("u1");

        let view = manager
            .create_session(user, GameMode::HumanVsBot { bot_mark: Mark::X }, Mark::X)
            .await
            .unwrap();

        assert_eq!(view.board[0].as_deref(), Some("X"));
        assert_eq!(view.current_mark, "O");
    }

    #[tokio::test]
    async fn test_other_users_cannot_see_session() {
        let (manager, _) = manager();
        let view = manager
            .create_session(UserId::from("owner"), GameMode::HumanVsHuman, Mark::X)
            .await
            .unwrap();

        let result = manager.get_view(&UserId::from("intruder"), &session_id(&view)).await;

        assert!(matches!(result, Err(ServerError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_finished_game_is_recorded_once() {
        let (manager, store) = manager();
        let user = UserId::from("u2");
        let view = manager
            .create_session(user.clone(), GameMode::HumanVsHuman, Mark::X)
            .await
            .unwrap();
        let id = session_id(&view);

        for index in [0, 3, 1, 4, 2] {
            manager.make_move(&user, &id, index).await.unwrap();
        }
        let result = manager.make_move(&user, &id, 5).await;

        assert!(matches!(result, Err(ServerError::Game(GameError::GameOver))));
        assert_eq!(
            store.get_stats(&user).unwrap(),
            StatsCounters { wins_x: 1, wins_o: 0, draws: 0 }
        );
    }

    #[tokio::test]
    async fn test_bot_game_never_records_human_win() {
        let (manager, store) = manager();
        let user = UserId::from("u3");
        let view = manager
            .create_session(user.clone(), GameMode::HumanVsBot { bot_mark: Mark::O }, Mark::X)
            .await
            .unwrap();
        let id = session_id(&view);

        let mut view = view;
        while view.status == "in_progress" {
            let index = view.board.iter().position(Option::is_none).unwrap();
            view = manager.make_move(&user, &id, index).await.unwrap();
        }

        let stats = store.get_stats(&user).unwrap();
        assert_eq!(stats.wins_x, 0);
        assert_eq!(stats.total_games(), 1);
    }

    #[tokio::test]
    async fn test_reset_starts_new_game() {
        let (manager, _) = manager();
        let user = UserId::from("u4");
        let view = manager
            .create_session(user.clone(), GameMode::HumanVsBot { bot_mark: Mark::X }, Mark::O)
            .await
            .unwrap();
        let id = session_id(&view);
        manager.make_move(&user, &id, 4).await.unwrap();

        let view = manager.reset_session(&user, &id, Mark::X).await.unwrap();

        // bot plays X and starts after the reset
        assert_eq!(view.board.iter().filter(|c| c.is_some()).count(), 1);
        assert_eq!(view.current_mark, "O");
    }

    #[tokio::test]
    async fn test_remove_inactive_sessions() {
        let (manager, _) = manager();
        manager
            .create_session(UserId::from("u5"), GameMode::HumanVsHuman, Mark::X)
            .await
            .unwrap();

        assert!(manager.remove_inactive(Duration::from_secs(3600)).await.is_empty());
        assert_eq!(manager.remove_inactive(Duration::ZERO).await.len(), 1);
        assert_eq!(manager.session_count().await, 0);
    }

    fn delayed_manager(delay: Duration) -> GameSessionManager {
        GameSessionManager::new(Arc::new(InMemoryStatsStore::new()), delay)
    }

    #[tokio::test]
    async fn test_bot_still_answers_when_request_is_dropped() {
        let manager = delayed_manager(Duration::from_millis(300));
        let user = UserId::from("u6");
        let view = manager
            .create_session(user.clone(), GameMode::HumanVsBot { bot_mark: Mark::O }, Mark::X)
            .await
            .unwrap();
        let id = session_id(&view);

        let request = tokio::spawn({
            let manager = manager.clone();
            let user = user.clone();
            let id = id.clone();
            async move { manager.make_move(&user, &id, 0).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        request.abort();
        tokio::time::sleep(Duration::from_millis(600)).await;

        let view = manager.get_view(&user, &id).await.unwrap();
        assert_eq!(view.board[0].as_deref(), Some("X"));
        assert_eq!(view.board[4].as_deref(), Some("O"));
        assert_eq!(view.current_mark, "X");

        let view = manager.make_move(&user, &id, 1).await.unwrap();
        assert_eq!(view.board[2].as_deref(), Some("O"));
    }

    #[tokio::test]
    async fn test_unowned_bot_turn_is_resumed_on_view() {
        let (manager, _) = manager();
        let user = UserId::from("u7");
        let view = manager
            .create_session(user.clone(), GameMode::HumanVsBot { bot_mark: Mark::O }, Mark::X)
            .await
            .unwrap();
        let id = session_id(&view);

        // the human move lands but no task owns the bot's answer
        {
            let mut sessions = manager.sessions.lock().await;
            let session = sessions.get_mut(&id).unwrap();
            session.state.place_mark(0).unwrap();
            assert!(session.state.is_bot_turn());
            assert_eq!(session.pending_bot_turn, None);
        }

        let view = manager.get_view(&user, &id).await.unwrap();
        assert_eq!(view.current_mark, "O");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let view = manager.get_view(&user, &id).await.unwrap();
        assert_eq!(view.board[4].as_deref(), Some("O"));
        assert_eq!(view.current_mark, "X");
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_bot_move() {
        let manager = delayed_manager(Duration::from_millis(300));
        let user = UserId::from("u8");
        let view = manager
            .create_session(user.clone(), GameMode::HumanVsBot { bot_mark: Mark::O }, Mark::X)
            .await
            .unwrap();
        let id = session_id(&view);

        let request = tokio::spawn({
            let manager = manager.clone();
            let user = user.clone();
            let id = id.clone();
            async move { manager.make_move(&user, &id, 0).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let view = manager.reset_session(&user, &id, Mark::X).await.unwrap();
        assert!(view.board.iter().all(Option::is_none));

        let _ = request.await;
        let view = manager.get_view(&user, &id).await.unwrap();
        assert!(view.board.iter().all(Option::is_none));
        assert_eq!(view.current_mark, "X");
    }

    #[tokio::test]
    async fn test_slow_stats_write_does_not_block_other_games() {
        let store = Arc::new(SlowStatsStore::new(Duration::from_millis(300)));
        let manager = GameSessionManager::new(store.clone(), Duration::ZERO);
        let user = UserId::from("u9");
        let finishing = session_id(
            &manager
                .create_session(user.clone(), GameMode::HumanVsHuman, Mark::X)
                .await
                .unwrap(),
        );
        let other = session_id(
            &manager
                .create_session(user.clone(), GameMode::HumanVsHuman, Mark::X)
                .await
                .unwrap(),
        );
        for index in [0, 3, 1, 4] {
            manager.make_move(&user, &finishing, index).await.unwrap();
        }

        let started = Instant::now();
        let winning_move = tokio::spawn({
            let manager = manager.clone();
            let user = user.clone();
            let finishing = finishing.clone();
            async move { manager.make_move(&user, &finishing, 2).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.get_view(&user, &other).await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(250));

        let view = winning_move.await.unwrap().unwrap();
        assert_eq!(view.status, "x_won");
        assert_eq!(store.get_stats(&user).unwrap().wins_x, 1);
    }
}
