//! Voice playback over the system audio output.
//!
//! One controller owns the output device for the life of the app. All rodio
//! state lives on a dedicated thread because the output stream is not `Send`;
//! the controller talks to it over a channel and publishes the now-playing
//! message id for the UI to mirror onto message flags.

use crate::settings::VoiceSettings;
use bytes::Bytes;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use std::io::Cursor;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const IDLE_POLL: Duration = Duration::from_millis(150);

enum PlaybackCommand {
    Play {
        message_id: String,
        data: Bytes,
        volume: f32,
        speed: f32,
    },
    Stop,
}

/// A playback attempt that could not start or finish.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackFailure {
    pub message_id: String,
    pub reason: String,
}

#[derive(Default)]
struct PlaybackShared {
    now_playing: Option<String>,
    last_failure: Option<PlaybackFailure>,
}

/// Handle to the playback thread. Clones share the same single sink, so at
/// most one message is audible no matter who calls `play`.
#[derive(Clone)]
pub struct PlaybackController {
    tx: Sender<PlaybackCommand>,
    shared: Arc<Mutex<PlaybackShared>>,
}

impl PlaybackController {
    pub fn start() -> Self {
        let (tx, rx) = channel();
        let shared = Arc::new(Mutex::new(PlaybackShared::default()));
        let thread_shared = Arc::clone(&shared);
        std::thread::Builder::new()
            .name("echo-playback".to_string())
            .spawn(move || run_playback_thread(rx, thread_shared))
            .expect("failed to spawn playback thread");
        Self { tx, shared }
    }

    /// Begin playing one message's audio, replacing whatever was playing.
    pub fn play(&self, message_id: &str, data: Bytes, settings: &VoiceSettings) {
        let settings = settings.clone().validated();
        let command = PlaybackCommand::Play {
            message_id: message_id.to_string(),
            data,
            volume: settings.volume,
            speed: settings.playback_rate,
        };
        if self.tx.send(command).is_err() {
            self.record_failure(message_id, "audio output is unavailable");
        }
    }

    /// Stop and rewind; position is discarded.
    pub fn stop(&self) {
        let _ = self.tx.send(PlaybackCommand::Stop);
        self.lock().now_playing = None;
    }

    /// Id of the message currently audible, if any.
    pub fn now_playing(&self) -> Option<String> {
        self.lock().now_playing.clone()
    }

    /// Consume the most recent failure, if one occurred since the last call.
    pub fn take_failure(&self) -> Option<PlaybackFailure> {
        self.lock().last_failure.take()
    }

    fn record_failure(&self, message_id: &str, reason: &str) {
        let mut shared = self.lock();
        shared.now_playing = None;
        shared.last_failure = Some(PlaybackFailure {
            message_id: message_id.to_string(),
            reason: reason.to_string(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlaybackShared> {
        self.shared.lock().expect("playback state poisoned")
    }
}

fn run_playback_thread(rx: Receiver<PlaybackCommand>, shared: Arc<Mutex<PlaybackShared>>) {
    let mut output: Option<OutputStream> = None;
    let mut active: Option<Sink> = None;

    let set_state = |now_playing: Option<String>, failure: Option<PlaybackFailure>| {
        let mut state = shared.lock().expect("playback state poisoned");
        state.now_playing = now_playing;
        if failure.is_some() {
            state.last_failure = failure;
        }
    };

    loop {
        match rx.recv_timeout(IDLE_POLL) {
            Ok(PlaybackCommand::Play {
                message_id,
                data,
                volume,
                speed,
            }) => {
                // Tear the previous sink down completely before building the
                // next one; overlapping voices must be impossible.
                if let Some(previous) = active.take() {
                    previous.stop();
                }
                set_state(None, None);

                if output.is_none() {
                    match OutputStreamBuilder::open_default_stream() {
                        Ok(stream) => output = Some(stream),
                        Err(err) => {
                            tracing::error!("failed to open audio output: {err}");
                            set_state(
                                None,
                                Some(PlaybackFailure {
                                    message_id,
                                    reason: "audio output could not be opened".to_string(),
                                }),
                            );
                            continue;
                        }
                    }
                }
                let Some(stream) = output.as_ref() else {
                    continue;
                };

                match Decoder::new(Cursor::new(data)) {
                    Ok(source) => {
                        let sink = Sink::connect_new(stream.mixer());
                        sink.set_volume(volume);
                        sink.set_speed(speed);
                        sink.append(source);
                        set_state(Some(message_id), None);
                        active = Some(sink);
                    }
                    Err(err) => {
                        tracing::warn!("undecodable audio for {message_id}: {err}");
                        set_state(
                            None,
                            Some(PlaybackFailure {
                                message_id,
                                reason: "the audio could not be decoded".to_string(),
                            }),
                        );
                    }
                }
            }
            Ok(PlaybackCommand::Stop) => {
                if let Some(previous) = active.take() {
                    previous.stop();
                }
                set_state(None, None);
            }
            Err(RecvTimeoutError::Timeout) => {
                // Natural end of playback: sink drained, back to idle.
                if active.as_ref().is_some_and(|sink| sink.empty()) {
                    active = None;
                    set_state(None, None);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The device-backed path needs real audio hardware; these cover the
    // bookkeeping the UI depends on.

    #[test]
    fn failures_are_consumed_once() {
        let (tx, _rx) = channel();
        let controller = PlaybackController {
            tx,
            shared: Arc::new(Mutex::new(PlaybackShared::default())),
        };
        controller.record_failure("ai_1", "audio output is unavailable");
        let failure = controller.take_failure().unwrap();
        assert_eq!(failure.message_id, "ai_1");
        assert!(controller.take_failure().is_none());
        assert!(controller.now_playing().is_none());
    }

    #[test]
    fn play_into_a_dead_thread_reports_failure() {
        let (tx, rx) = channel();
        drop(rx);
        let controller = PlaybackController {
            tx,
            shared: Arc::new(Mutex::new(PlaybackShared::default())),
        };
        controller.play("ai_2", Bytes::from_static(b"xx"), &VoiceSettings::default());
        assert_eq!(controller.take_failure().unwrap().message_id, "ai_2");
    }
}
