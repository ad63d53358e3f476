//! cpal Audio Output
//!
//! cpal 的 Stream 不是 Send，每个上下文独占一个播放线程，
//! 线程持有设备和输出流，通过命令通道接收播放请求

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::Arc;

use crate::application::ports::{AudioContextPort, AudioOutputPort, OnEnded, PlaybackError};
use crate::domain::audio::DecodedAudioBuffer;

enum Command {
    Play {
        samples: Vec<f32>,
        on_ended: OnEnded,
        reply: mpsc::SyncSender<Result<(), PlaybackError>>,
    },
    /// 数据回调读到末尾
    Finished(u64),
    /// 输出流报错（设备断开等），上下文随之失效
    StreamFailed(String),
    Close,
}

/// 数据回调读取的播放位置
#[derive(Default)]
struct Cursor {
    samples: Vec<f32>,
    position: usize,
    generation: u64,
    active: bool,
}

/// 默认声卡输出
#[derive(Debug, Default)]
pub struct CpalAudioOutput;

impl CpalAudioOutput {
    pub fn new() -> Self {
        Self
    }
}

impl AudioOutputPort for CpalAudioOutput {
    fn open_context(&self) -> Result<Arc<dyn AudioContextPort>, PlaybackError> {
        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(u32, u16), PlaybackError>>(1);

        let stream_tx = command_tx.clone();
        std::thread::Builder::new()
            .name("ghostwriter-audio".to_string())
            .spawn(move || run_playback_thread(command_rx, stream_tx, ready_tx))
            .map_err(|e| PlaybackError::Stream(format!("Failed to spawn audio thread: {}", e)))?;

        let (sample_rate, channels) = ready_rx
            .recv()
            .map_err(|_| PlaybackError::Stream("Audio thread exited during setup".to_string()))??;

        tracing::info!(sample_rate = sample_rate, channels = channels, "Output device opened");

        Ok(Arc::new(CpalAudioContext {
            commands: Mutex::new(Some(command_tx)),
            sample_rate,
            channels,
        }))
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

/// 声卡输出上下文
pub struct CpalAudioContext {
    commands: Mutex<Option<mpsc::Sender<Command>>>,
    sample_rate: u32,
    channels: u16,
}

impl AudioContextPort for CpalAudioContext {
    fn start(&self, buffer: Arc<DecodedAudioBuffer>, on_ended: OnEnded) -> Result<(), PlaybackError> {
        let commands = self.commands.lock();
        let sender = commands.as_ref().ok_or(PlaybackError::ContextClosed)?;

        let samples = buffer.render_interleaved(self.sample_rate, self.channels);
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        sender
            .send(Command::Play {
                samples,
                on_ended,
                reply: reply_tx,
            })
            .map_err(|_| PlaybackError::ContextClosed)?;

        reply_rx.recv().map_err(|_| PlaybackError::ContextClosed)?
    }

    fn close(&self) {
        if let Some(sender) = self.commands.lock().take() {
            let _ = sender.send(Command::Close);
        }
    }
}

impl Drop for CpalAudioContext {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_playback_thread(
    commands: mpsc::Receiver<Command>,
    stream_tx: mpsc::Sender<Command>,
    ready: mpsc::SyncSender<Result<(u32, u16), PlaybackError>>,
) {
    let cursor = Arc::new(Mutex::new(Cursor::default()));

    let (stream, sample_rate, channels) = match open_stream(cursor.clone(), stream_tx) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let _ = ready.send(Ok((sample_rate, channels)));

    drive_commands(&commands, &cursor);

    drop(stream);
    tracing::debug!("Output stream closed");
}

/// 处理播放命令直到上下文关闭或输出流失效
///
/// 流失效时当前播放视为结束，`on_ended` 照常调用以释放播放状态；
/// 之后线程退出，再次 `start` 返回 `ContextClosed`
fn drive_commands(commands: &mpsc::Receiver<Command>, cursor: &Mutex<Cursor>) {
    let mut pending: Option<(u64, OnEnded)> = None;
    while let Ok(command) = commands.recv() {
        match command {
            Command::Play {
                samples,
                on_ended,
                reply,
            } => {
                let generation = {
                    let mut cursor = cursor.lock();
                    cursor.samples = samples;
                    cursor.position = 0;
                    cursor.generation += 1;
                    cursor.active = true;
                    cursor.generation
                };
                pending = Some((generation, on_ended));
                let _ = reply.send(Ok(()));
            }
            Command::Finished(generation) => {
                if pending.as_ref().is_some_and(|(expected, _)| *expected == generation) {
                    if let Some((_, on_ended)) = pending.take() {
                        on_ended();
                    }
                }
            }
            Command::StreamFailed(error) => {
                tracing::error!(error = %error, "Output stream failed, closing audio context");
                cursor.lock().active = false;
                if let Some((_, on_ended)) = pending.take() {
                    on_ended();
                }
                break;
            }
            Command::Close => break,
        }
    }
}

fn open_stream(
    cursor: Arc<Mutex<Cursor>>,
    events: mpsc::Sender<Command>,
) -> Result<(Stream, u32, u16), PlaybackError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(PlaybackError::NoOutputDevice)?;
    let config = device
        .default_output_config()
        .map_err(|e| PlaybackError::UnsupportedFormat(e.to_string()))?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels();

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), cursor, events)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), cursor, events)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), cursor, events)?,
        format => {
            return Err(PlaybackError::UnsupportedFormat(format!(
                "sample format {:?}",
                format
            )))
        }
    };

    stream
        .play()
        .map_err(|e| PlaybackError::Stream(format!("Failed to start stream: {}", e)))?;

    Ok((stream, sample_rate, channels))
}

fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &cpal::Device,
    config: &StreamConfig,
    cursor: Arc<Mutex<Cursor>>,
    events: mpsc::Sender<Command>,
) -> Result<Stream, PlaybackError> {
    let errors = events.clone();
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut cursor = cursor.lock();
                for sample in data.iter_mut() {
                    let value = if cursor.active && cursor.position < cursor.samples.len() {
                        let value = cursor.samples[cursor.position];
                        cursor.position += 1;
                        value
                    } else {
                        0.0
                    };
                    *sample = T::from_sample(value);
                }

                if cursor.active && cursor.position >= cursor.samples.len() {
                    cursor.active = false;
                    let _ = events.send(Command::Finished(cursor.generation));
                }
            },
            move |err| {
                let _ = errors.send(Command::StreamFailed(err.to_string()));
            },
            None,
        )
        .map_err(|e| PlaybackError::Stream(format!("Failed to build output stream: {}", e)))
}
