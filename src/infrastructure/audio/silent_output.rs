//! Silent Audio Output
//!
//! 没有声卡的环境（服务器、CI）使用：不输出声音，
//! 按缓冲区时长等待后触发结束回调

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{AudioContextPort, AudioOutputPort, OnEnded, PlaybackError};
use crate::domain::audio::DecodedAudioBuffer;

/// 静默输出
#[derive(Debug, Default)]
pub struct SilentAudioOutput;

impl SilentAudioOutput {
    pub fn new() -> Self {
        Self
    }
}

impl AudioOutputPort for SilentAudioOutput {
    fn open_context(&self) -> Result<Arc<dyn AudioContextPort>, PlaybackError> {
        Ok(Arc::new(SilentAudioContext::default()))
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

#[derive(Default)]
struct SilentAudioContext {
    generation: Arc<AtomicU64>,
    closed: AtomicBool,
}

impl AudioContextPort for SilentAudioContext {
    fn start(&self, buffer: Arc<DecodedAudioBuffer>, on_ended: OnEnded) -> Result<(), PlaybackError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PlaybackError::ContextClosed);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = self.generation.clone();
        let duration = Duration::from_millis(buffer.duration_ms());

        std::thread::Builder::new()
            .name("ghostwriter-silent".to_string())
            .spawn(move || {
                std::thread::sleep(duration);
                // 期间被 close 或重新 start 则不再回调
                if current.load(Ordering::SeqCst) == generation {
                    on_ended();
                }
            })
            .map_err(|e| PlaybackError::Stream(e.to_string()))?;

        tracing::debug!(duration_ms = buffer.duration_ms(), "Silent playback started");
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn buffer(frames: usize) -> Arc<DecodedAudioBuffer> {
        Arc::new(DecodedAudioBuffer::from_channels(24000, vec![vec![0.0; frames]]).unwrap())
    }

    #[test]
    fn test_ends_after_duration() {
        let context = SilentAudioOutput::new().open_context().unwrap();
        let (tx, rx) = mpsc::channel();

        context
            .start(buffer(240), Box::new(move || tx.send(()).unwrap()))
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_close_suppresses_callback() {
        let context = SilentAudioOutput::new().open_context().unwrap();
        let (tx, rx) = mpsc::channel::<()>();

        context
            .start(buffer(2400), Box::new(move || {
                let _ = tx.send(());
            }))
            .unwrap();
        context.close();

        assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());
        assert!(matches!(
            context.start(buffer(10), Box::new(|| {})),
            Err(PlaybackError::ContextClosed)
        ));
    }
}
