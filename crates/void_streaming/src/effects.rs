//! Transition visual effects and timers

use std::time::Duration;

use async_trait::async_trait;

/// Visual effect run around a level swap (curtain, fade, iris)
#[async_trait(?Send)]
pub trait TransitionEffect {
    /// Hide the screen before the old level is left
    async fn close(&self);

    /// Reveal the screen once the new level is prepared
    async fn open(&self);
}

/// Awaitable delay, used to wait for camera blends
#[async_trait(?Send)]
pub trait Timer {
    async fn wait(&self, duration: Duration);
}

/// `Timer` backed by the tokio timer wheel
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait(?Send)]
impl Timer for TokioTimer {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
