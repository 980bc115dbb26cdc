//! Single consumer that plays announcements one at a time.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::Announcer;

struct SpeechJob {
    text: String,
    done: oneshot::Sender<Result<()>>,
}

/// Cheap to clone; every clone feeds the same worker.
#[derive(Clone)]
pub struct SpeechHandle {
    tx: mpsc::UnboundedSender<SpeechJob>,
}

impl SpeechHandle {
    /// Queue `text`; the receiver resolves once playback finished or failed.
    pub fn enqueue(&self, text: impl Into<String>) -> Result<oneshot::Receiver<Result<()>>> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(SpeechJob {
                text: text.into(),
                done,
            })
            .map_err(|_| anyhow!("speech worker stopped"))?;
        Ok(rx)
    }

    /// Queue and wait for completion.
    pub async fn speak(&self, text: impl Into<String>) -> Result<()> {
        let rx = self.enqueue(text)?;
        rx.await.map_err(|_| anyhow!("speech worker dropped the job"))?
    }
}

pub fn spawn_speech_worker(announcer: Arc<dyn Announcer>) -> (SpeechHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<SpeechJob>();
    let task = tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let res = announcer.speak(&job.text).await;
            if let Err(e) = &res {
                tracing::warn!(error = ?e, engine = announcer.name(), "announcement failed");
            }
            // Nobody waiting is fine.
            let _ = job.done.send(res);
        }
        tracing::debug!("speech worker finished");
    });
    (SpeechHandle { tx }, task)
}
