//! Playback Controller - 朗读播放控制
//!
//! 每个故事展示独占一个控制器：
//! - 同一时间最多一个播放会话，播放中再次请求直接忽略（不排队）
//! - 输出上下文首次播放时打开，控制器释放时关闭
//! - 缓存首次成功解码的朗读音频，避免重复合成

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::application::ports::{AudioContextPort, AudioOutputPort, OnEnded, PlaybackError};
use crate::domain::audio::DecodedAudioBuffer;
use crate::domain::story::StoryId;

/// 生成朗读缓存 key
///
/// 使用 md5(paragraph) + voice 作为缓存 key
pub fn narration_cache_key(paragraph: &str, voice_name: &str) -> String {
    let digest = md5::compute(paragraph.as_bytes());
    format!("{:x}:{}", digest, voice_name)
}

/// play 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// 已有播放进行中，本次请求被忽略
    AlreadyPlaying,
}

/// 播放占用凭据
///
/// 持有期间 `is_playing` 为 true；未交给 `play_claimed` 就被丢弃时自动释放
pub struct PlaybackClaim {
    flag: Arc<AtomicBool>,
    armed: bool,
}

impl PlaybackClaim {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PlaybackClaim {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(false, Ordering::SeqCst);
        }
    }
}

#[derive(Debug, Clone)]
struct CachedNarration {
    key: String,
    buffer: Arc<DecodedAudioBuffer>,
}

/// 播放控制器
pub struct PlaybackController {
    story_id: StoryId,
    output: Arc<dyn AudioOutputPort>,
    context: Mutex<Option<Arc<dyn AudioContextPort>>>,
    is_playing: Arc<AtomicBool>,
    cache: Mutex<Option<CachedNarration>>,
}

impl PlaybackController {
    pub fn new(story_id: StoryId, output: Arc<dyn AudioOutputPort>) -> Self {
        Self {
            story_id,
            output,
            context: Mutex::new(None),
            is_playing: Arc::new(AtomicBool::new(false)),
            cache: Mutex::new(None),
        }
    }

    pub fn story_id(&self) -> StoryId {
        self.story_id
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::SeqCst)
    }

    /// 尝试占用播放状态；已在播放时返回 None
    pub fn try_claim(&self) -> Option<PlaybackClaim> {
        self.is_playing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PlaybackClaim {
                flag: self.is_playing.clone(),
                armed: true,
            })
    }

    /// 播放缓冲区
    ///
    /// 已在播放时为 no-op，返回 `AlreadyPlaying` 且不影响当前播放状态
    pub fn play<F>(
        &self,
        buffer: Arc<DecodedAudioBuffer>,
        on_complete: F,
    ) -> Result<PlayOutcome, PlaybackError>
    where
        F: FnOnce() + Send + 'static,
    {
        match self.try_claim() {
            Some(claim) => self
                .play_claimed(claim, buffer, on_complete)
                .map(|_| PlayOutcome::Started),
            None => {
                tracing::debug!(story_id = %self.story_id, "Playback already active, ignoring play request");
                Ok(PlayOutcome::AlreadyPlaying)
            }
        }
    }

    /// 使用已占用的播放状态开始播放
    ///
    /// 自然结束时先复位 `is_playing` 再调用 `on_complete`；
    /// 上下文创建或启动失败时复位 `is_playing`，记录并返回错误，不调用 `on_complete`
    pub fn play_claimed<F>(
        &self,
        mut claim: PlaybackClaim,
        buffer: Arc<DecodedAudioBuffer>,
        on_complete: F,
    ) -> Result<(), PlaybackError>
    where
        F: FnOnce() + Send + 'static,
    {
        let context = self.context().map_err(|e| {
            tracing::error!(story_id = %self.story_id, error = %e, "Failed to open audio context");
            e
        })?;

        let flag = claim.flag.clone();
        let on_ended: OnEnded = Box::new(move || {
            flag.store(false, Ordering::SeqCst);
            on_complete();
        });

        let frame_count = buffer.frame_count();
        let sample_rate = buffer.sample_rate();
        match context.start(buffer, on_ended) {
            Ok(()) => {
                claim.disarm();
                tracing::info!(
                    story_id = %self.story_id,
                    frame_count = frame_count,
                    sample_rate = sample_rate,
                    "Playback started"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(story_id = %self.story_id, error = %e, "Audio playback error");
                if matches!(e, PlaybackError::ContextClosed) {
                    // 输出流已失效，下次播放重新打开
                    self.context.lock().take();
                }
                Err(e)
            }
        }
    }

    /// 查找缓存的朗读音频
    pub fn cached_narration(&self, key: &str) -> Option<Arc<DecodedAudioBuffer>> {
        self.cache
            .lock()
            .as_ref()
            .filter(|c| c.key == key)
            .map(|c| c.buffer.clone())
    }

    /// 缓存朗读音频，只保留首次成功解码的结果
    pub fn cache_narration(&self, key: String, buffer: Arc<DecodedAudioBuffer>) {
        let mut cache = self.cache.lock();
        if cache.is_none() {
            *cache = Some(CachedNarration { key, buffer });
        }
    }

    /// 已缓存的朗读音频（不区分 key）
    pub fn narration(&self) -> Option<Arc<DecodedAudioBuffer>> {
        self.cache.lock().as_ref().map(|c| c.buffer.clone())
    }

    /// 关闭输出上下文并丢弃缓存
    pub fn release(&self) {
        if let Some(context) = self.context.lock().take() {
            context.close();
            tracing::debug!(story_id = %self.story_id, "Audio context released");
        }
        self.cache.lock().take();
        self.is_playing.store(false, Ordering::SeqCst);
    }

    fn context(&self) -> Result<Arc<dyn AudioContextPort>, PlaybackError> {
        let mut slot = self.context.lock();
        if let Some(context) = slot.as_ref() {
            return Ok(context.clone());
        }

        let context = self.output.open_context()?;
        tracing::debug!(
            story_id = %self.story_id,
            backend = self.output.name(),
            "Audio context opened"
        );
        *slot = Some(context.clone());
        Ok(context)
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(context) = self.context.get_mut().take() {
            context.close();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// 手动触发结束的测试上下文
    #[derive(Default)]
    pub(crate) struct ManualContext {
        pending: Mutex<Vec<OnEnded>>,
        pub started: AtomicUsize,
        pub closed: AtomicBool,
        pub fail_start: AtomicBool,
        /// 模拟设备断开后失效的上下文，重新打开时恢复
        pub dead: AtomicBool,
    }

    impl ManualContext {
        /// 模拟当前播放自然结束
        pub fn finish(&self) {
            let callbacks: Vec<OnEnded> = self.pending.lock().drain(..).collect();
            for cb in callbacks {
                cb();
            }
        }
    }

    impl AudioContextPort for ManualContext {
        fn start(
            &self,
            _buffer: Arc<DecodedAudioBuffer>,
            on_ended: OnEnded,
        ) -> Result<(), PlaybackError> {
            if self.fail_start.load(Ordering::SeqCst) {
                return Err(PlaybackError::Stream("device busy".to_string()));
            }
            if self.dead.load(Ordering::SeqCst) {
                return Err(PlaybackError::ContextClosed);
            }
            self.started.fetch_add(1, Ordering::SeqCst);
            self.pending.lock().push(on_ended);
            Ok(())
        }

        fn close(&self) {
            self.pending.lock().clear();
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    pub(crate) struct ManualOutput {
        pub context: Arc<ManualContext>,
        pub opened: AtomicUsize,
        pub fail_open: AtomicBool,
    }

    impl ManualOutput {
        pub fn new() -> Self {
            Self {
                context: Arc::new(ManualContext::default()),
                opened: AtomicUsize::new(0),
                fail_open: AtomicBool::new(false),
            }
        }
    }

    impl AudioOutputPort for ManualOutput {
        fn open_context(&self) -> Result<Arc<dyn AudioContextPort>, PlaybackError> {
            if self.fail_open.load(Ordering::SeqCst) {
                return Err(PlaybackError::NoOutputDevice);
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            self.context.dead.store(false, Ordering::SeqCst);
            Ok(self.context.clone())
        }

        fn name(&self) -> &'static str {
            "manual"
        }
    }

    fn buffer() -> Arc<DecodedAudioBuffer> {
        Arc::new(DecodedAudioBuffer::from_channels(24000, vec![vec![0.0; 240]]).unwrap())
    }

    fn controller(output: Arc<ManualOutput>) -> PlaybackController {
        PlaybackController::new(StoryId::new(), output)
    }

    #[test]
    fn test_play_and_complete() {
        let output = Arc::new(ManualOutput::new());
        let controller = controller(output.clone());
        let completed = Arc::new(AtomicUsize::new(0));

        let c = completed.clone();
        let outcome = controller
            .play(buffer(), move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Started);
        assert!(controller.is_playing());

        output.context.finish();
        assert!(!controller.is_playing());
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_play_while_playing_is_noop() {
        let output = Arc::new(ManualOutput::new());
        let controller = controller(output.clone());

        controller.play(buffer(), || {}).unwrap();
        let second = controller.play(buffer(), || panic!("must not run")).unwrap();

        assert_eq!(second, PlayOutcome::AlreadyPlaying);
        assert!(controller.is_playing());
        assert_eq!(output.context.started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_context_is_reused_across_plays() {
        let output = Arc::new(ManualOutput::new());
        let controller = controller(output.clone());

        controller.play(buffer(), || {}).unwrap();
        output.context.finish();
        controller.play(buffer(), || {}).unwrap();

        assert_eq!(output.opened.load(Ordering::SeqCst), 1);
        assert_eq!(output.context.started.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_open_failure_resets_state() {
        let output = Arc::new(ManualOutput::new());
        output.fail_open.store(true, Ordering::SeqCst);
        let controller = controller(output.clone());

        let result = controller.play(buffer(), || panic!("must not run"));
        assert!(matches!(result, Err(PlaybackError::NoOutputDevice)));
        assert!(!controller.is_playing());
    }

    #[test]
    fn test_start_failure_resets_state_without_callback() {
        let output = Arc::new(ManualOutput::new());
        output.context.fail_start.store(true, Ordering::SeqCst);
        let controller = controller(output.clone());

        let result = controller.play(buffer(), || panic!("must not run"));
        assert!(matches!(result, Err(PlaybackError::Stream(_))));
        assert!(!controller.is_playing());

        output.context.fail_start.store(false, Ordering::SeqCst);
        assert_eq!(controller.play(buffer(), || {}).unwrap(), PlayOutcome::Started);
    }

    #[test]
    fn test_dead_context_is_reopened_on_next_play() {
        let output = Arc::new(ManualOutput::new());
        let controller = controller(output.clone());
        controller.play(buffer(), || {}).unwrap();
        output.context.finish();
        assert_eq!(output.opened.load(Ordering::SeqCst), 1);

        output.context.dead.store(true, Ordering::SeqCst);
        let result = controller.play(buffer(), || panic!("must not run"));
        assert!(matches!(result, Err(PlaybackError::ContextClosed)));
        assert!(!controller.is_playing());

        assert_eq!(controller.play(buffer(), || {}).unwrap(), PlayOutcome::Started);
        assert_eq!(output.opened.load(Ordering::SeqCst), 2);
        assert!(controller.is_playing());
    }

    #[test]
    fn test_dropped_claim_releases_flag() {
        let output = Arc::new(ManualOutput::new());
        let controller = controller(output);

        let claim = controller.try_claim().unwrap();
        assert!(controller.is_playing());
        assert!(controller.try_claim().is_none());
        drop(claim);
        assert!(!controller.is_playing());
    }

    #[test]
    fn test_cache_keeps_first_decode() {
        let output = Arc::new(ManualOutput::new());
        let controller = controller(output);
        let key = narration_cache_key("Once upon a time.", "Kore");

        let first = buffer();
        controller.cache_narration(key.clone(), first.clone());
        controller.cache_narration(key.clone(), buffer());

        assert!(Arc::ptr_eq(&controller.cached_narration(&key).unwrap(), &first));
        assert!(controller.cached_narration("other").is_none());
    }

    #[test]
    fn test_release_closes_context_and_clears_cache() {
        let output = Arc::new(ManualOutput::new());
        let controller = controller(output.clone());
        controller.cache_narration("k".to_string(), buffer());
        controller.play(buffer(), || {}).unwrap();

        controller.release();
        assert!(output.context.closed.load(Ordering::SeqCst));
        assert!(controller.narration().is_none());
        assert!(!controller.is_playing());
    }

    #[test]
    fn test_cache_key_depends_on_text_and_voice() {
        let a = narration_cache_key("text", "Kore");
        assert_eq!(a, narration_cache_key("text", "Kore"));
        assert_ne!(a, narration_cache_key("text", "Puck"));
        assert_ne!(a, narration_cache_key("other", "Kore"));
        assert!(a.ends_with(":Kore"));
    }
}
