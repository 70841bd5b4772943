use std::time::Duration;

use common::log;

use crate::game_session_manager::GameSessionManager;

pub struct CleanupTask {
    session_manager: GameSessionManager,
    check_interval: Duration,
    inactivity_timeout: Duration,
}

impl CleanupTask {
    pub fn new(
        session_manager: GameSessionManager,
        check_interval: Duration,
        inactivity_timeout: Duration,
    ) -> Self {
        Self {
            session_manager,
            check_interval,
            inactivity_timeout,
        }
    }

    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.check_interval);

        loop {
            interval.tick().await;
            self.cleanup_inactive().await;
        }
    }

    async fn cleanup_inactive(&self) {
        let removed = self
            .session_manager
            .remove_inactive(self.inactivity_timeout)
            .await;

        if removed.is_empty() {
            return;
        }
        for session_id in &removed {
            log!("Cleaned up inactive game: {}", session_id);
        }
        log!(
            "Removed {} inactive games, {} remain",
            removed.len(),
            self.session_manager.session_count().await
        );
    }
}
