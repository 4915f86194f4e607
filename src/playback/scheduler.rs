use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::sleep;

use crate::foundation::error::{PapercutError, PapercutResult};
use crate::render::backend::FrameRGBA;
use crate::render::cpu::Compositor;
use crate::scene::project::Project;

/// Cloneable stop signal shared between a playback loop and whoever wants to stop it.
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`CancelToken::cancel`] has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Receives every frame shown during playback.
pub trait FramePresenter {
    fn present(&mut self, index: usize, frame: &FrameRGBA) -> PapercutResult<()>;
}

impl<F> FramePresenter for F
where
    F: FnMut(usize, &FrameRGBA) -> PapercutResult<()>,
{
    fn present(&mut self, index: usize, frame: &FrameRGBA) -> PapercutResult<()> {
        self(index, frame)
    }
}

/// Two-state playback controller.
///
/// While playing, each step renders the active frame, hands it to the presenter, advances the
/// active index (wrapping) and then waits `1000/fps` ms. Steps never overlap: the next wait is
/// only scheduled after the previous render and present complete. Cancelling the token ends the
/// pending wait immediately.
#[derive(Debug, Default)]
pub struct Scheduler {
    state: PlaybackState,
    token: Option<CancelToken>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Cancel the running loop, if any. Returns whether playback was active.
    pub fn stop(&mut self) -> bool {
        let was_playing = self.is_playing();
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.state = PlaybackState::Stopped;
        if was_playing {
            tracing::info!("playback stopped");
        }
        was_playing
    }

    /// Play `project` until `token` is cancelled or presenting fails.
    ///
    /// A no-op returning `Ok(0)` when already playing or when there are no frames. Otherwise
    /// returns the number of frames presented.
    pub async fn play(
        &mut self,
        project: &mut Project,
        compositor: &mut Compositor,
        presenter: &mut dyn FramePresenter,
        token: CancelToken,
    ) -> PapercutResult<usize> {
        if self.is_playing() || project.scene().is_empty() || token.is_cancelled() {
            return Ok(0);
        }
        let guard = PlayingGuard::engage(&mut self.state, &mut self.token, &token);
        tracing::info!(
            fps = project.fps(),
            frames = project.scene().len(),
            from = project.scene().active_index(),
            "playback started"
        );

        let result = run_loop(project, compositor, presenter, &token).await;

        drop(guard);
        match &result {
            Ok(presented) => tracing::info!(presented, "playback finished"),
            Err(e) => tracing::warn!(error = %e, "playback aborted"),
        }
        result
    }

    /// Drive [`Scheduler::play`] on a fresh single-threaded runtime.
    ///
    /// Fails with [`PapercutError::UnsupportedEnvironment`] when called from inside a tokio
    /// runtime; async callers use [`Scheduler::play`].
    pub fn play_blocking(
        &mut self,
        project: &mut Project,
        compositor: &mut Compositor,
        presenter: &mut dyn FramePresenter,
        token: CancelToken,
    ) -> PapercutResult<usize> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(PapercutError::unsupported(
                "play_blocking called inside an async runtime; use play()",
            ));
        }
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| PapercutError::unsupported(format!("timer runtime unavailable: {e}")))?;
        rt.block_on(self.play(project, compositor, presenter, token))
    }
}

/// Holds the scheduler in `Playing` and resets it when dropped, including when the play future
/// itself is dropped mid-wait.
struct PlayingGuard<'a> {
    state: &'a mut PlaybackState,
    token: &'a mut Option<CancelToken>,
}

impl<'a> PlayingGuard<'a> {
    fn engage(
        state: &'a mut PlaybackState,
        slot: &'a mut Option<CancelToken>,
        token: &CancelToken,
    ) -> Self {
        *state = PlaybackState::Playing;
        *slot = Some(token.clone());
        Self { state, token: slot }
    }
}

impl Drop for PlayingGuard<'_> {
    fn drop(&mut self) {
        *self.state = PlaybackState::Stopped;
        *self.token = None;
    }
}

async fn run_loop(
    project: &mut Project,
    compositor: &mut Compositor,
    presenter: &mut dyn FramePresenter,
    token: &CancelToken,
) -> PapercutResult<usize> {
    let mut presented = 0usize;
    while !token.is_cancelled() && !project.scene().is_empty() {
        let index = project.scene().active_index();
        let frame = compositor.render(project, index, None)?;
        presenter.present(index, &frame)?;
        presented += 1;
        project.scene_mut().advance_active();

        tokio::select! {
            _ = sleep(project.frame_interval()) => {}
            _ = token.cancelled() => break,
        }
    }
    Ok(presented)
}

#[cfg(test)]
#[path = "../../tests/unit/playback/scheduler.rs"]
mod tests;
