use crate::api::{
    EchoBackend, FinalTurn, StreamSnapshot, TurnRequest, fetch_audio, stream_turn_discard,
    stream_turn_poll, stream_turn_start, synthesize, voice_unavailable_copy,
};
use crate::audio::PlaybackController;
use crate::settings::{EchoProfile, VoiceSettings};
use crate::store::{MessageStore, STREAMING_ID};
use crate::types::{ChatMessage, Role};
use crate::views::shared::{format_message_time, markdown_to_html};
use dioxus::events::Key;
use dioxus::prelude::*;
use std::time::Duration;

const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(80);
const PLAYBACK_SYNC_INTERVAL: Duration = Duration::from_millis(250);

const PLAYBACK_TROUBLE_COPY: &str =
    "The audio is resting right now. You can try it again in a moment.";

fn is_pending_assistant(msg: &ChatMessage) -> bool {
    matches!(msg.role, Role::Assistant) && msg.id == STREAMING_ID && msg.content.is_empty()
}

fn role_class(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn avatar_letter(persona: Option<&str>) -> String {
    persona
        .and_then(|name| name.chars().next())
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "E".to_string())
}

/// Mirror the playback thread's state onto the message flags, and surface
/// any playback failure on the message it belongs to.
fn use_playback_sync(store: Signal<MessageStore>, playback: PlaybackController) {
    use_effect(move || {
        let mut store = store;
        let playback = playback.clone();
        spawn(async move {
            loop {
                tokio::time::sleep(PLAYBACK_SYNC_INTERVAL).await;
                if let Some(failure) = playback.take_failure() {
                    store.with_mut(|s| s.note_playback_error(&failure.message_id, failure.reason));
                }
                let device_playing = playback.now_playing();
                let shown_playing = store.with(|s| s.playing_id().map(str::to_string));
                if device_playing != shown_playing {
                    store.with_mut(|s| match &device_playing {
                        Some(id) => {
                            s.mark_playing(id);
                        }
                        None => s.clear_playing(),
                    });
                }
            }
        });
    });
}

async fn play_message(
    backend: EchoBackend,
    playback: PlaybackController,
    mut store: Signal<MessageStore>,
    settings: VoiceSettings,
    message_id: String,
    audio_url: String,
) {
    match fetch_audio(&backend, &audio_url).await {
        Ok(data) => {
            playback.play(&message_id, data, &settings);
            store.with_mut(|s| {
                s.mark_playing(&message_id);
            });
        }
        Err(err) => {
            tracing::warn!("audio fetch failed: {err}");
            store.with_mut(|s| s.note_playback_error(&message_id, PLAYBACK_TROUBLE_COPY.into()));
        }
    }
}

async fn synthesize_for_message(
    backend: EchoBackend,
    playback: PlaybackController,
    profile: EchoProfile,
    mut store: Signal<MessageStore>,
    settings: VoiceSettings,
    message_id: String,
    text: String,
) {
    store.with_mut(|s| s.set_audio_loading(&message_id, true));
    match synthesize(&backend, &profile, &settings, &text).await {
        Ok(synthesis) => {
            store.with_mut(|s| {
                s.attach_audio(
                    &message_id,
                    synthesis.audio_url.clone(),
                    synthesis.quality.clone(),
                    synthesis.generation_time,
                )
            });
            if settings.auto_play {
                play_message(
                    backend,
                    playback,
                    store,
                    settings,
                    message_id,
                    synthesis.audio_url,
                )
                .await;
            }
        }
        Err(err) => {
            tracing::warn!("voice synthesis failed: {err}");
            let copy = voice_unavailable_copy(profile.persona_name.as_deref(), &text);
            store.with_mut(|s| s.attach_voice_error(&message_id, copy));
        }
    }
}

/// Drive one streaming turn to completion, then hand off to voice synthesis.
async fn run_turn(
    backend: EchoBackend,
    playback: PlaybackController,
    profile: EchoProfile,
    mut store: Signal<MessageStore>,
    settings: VoiceSettings,
    request: TurnRequest,
) {
    let stream_id = stream_turn_start(backend.clone(), request);

    let outcome = loop {
        match stream_turn_poll(stream_id) {
            Ok(snapshot) => {
                if snapshot.cancelled {
                    // A newer send owns the placeholder now; leave quietly.
                    break None;
                }
                if let Some(session_id) = &snapshot.session_id {
                    store.with_mut(|s| {
                        if s.session_id().is_none() {
                            s.set_session_id(session_id.clone());
                        }
                    });
                }
                if snapshot.done {
                    break Some(snapshot);
                }
                store.with_mut(|s| s.set_streaming_text(&snapshot.text));
            }
            Err(err) => {
                tracing::warn!("stream poll error: {err}");
                break Some(StreamSnapshot {
                    failed: true,
                    done: true,
                    ..StreamSnapshot::default()
                });
            }
        }
        tokio::time::sleep(STREAM_POLL_INTERVAL).await;
    };
    stream_turn_discard(stream_id);

    let Some(snapshot) = outcome else {
        return;
    };

    let final_turn = match snapshot.final_turn {
        Some(final_turn) if !snapshot.failed => final_turn,
        _ => {
            store.with_mut(|s| {
                s.fail_streaming();
            });
            return;
        }
    };

    let FinalTurn { response, metadata } = final_turn;
    let message_id = store.with_mut(|s| s.finalize_streaming(response.clone(), metadata));

    if settings.voice_enabled
        && let Some(message_id) = message_id
    {
        synthesize_for_message(
            backend, playback, profile, store, settings, message_id, response,
        )
        .await;
    }
}

#[component]
pub fn ChatView(
    store: Signal<MessageStore>,
    voice_settings: Signal<VoiceSettings>,
    base_font_px: Signal<i32>,
) -> Element {
    let backend = use_context::<EchoBackend>();
    let playback = use_context::<PlaybackController>();
    let profile = use_context::<EchoProfile>();
    let mut input = use_signal(String::new);

    use_playback_sync(store, playback.clone());

    let send_message = {
        let mut store = store;
        let mut input_signal = input;
        let backend = backend.clone();
        let playback = playback.clone();
        let profile = profile.clone();
        use_callback(move |text: String| {
            let trimmed = text.trim().to_string();
            if trimmed.is_empty() {
                return;
            }

            // Starting a new send cancels any turn still in flight; only one
            // assistant turn is ever live per session.
            store.with_mut(|s| {
                s.push_user(&trimmed);
                s.begin_streaming();
            });
            input_signal.set(String::new());

            let request = TurnRequest {
                message: trimmed,
                session_id: store.with(|s| s.session_id().map(str::to_string)),
                settings: voice_settings().validated(),
            };
            let settings = voice_settings().validated();
            let backend = backend.clone();
            let playback = playback.clone();
            let profile = profile.clone();
            spawn(run_turn(backend, playback, profile, store, settings, request));
        })
    };

    let on_play = {
        let backend = backend.clone();
        let playback = playback.clone();
        use_callback(move |(message_id, audio_url): (String, String)| {
            let backend = backend.clone();
            let playback = playback.clone();
            let settings = voice_settings().validated();
            spawn(play_message(
                backend, playback, store, settings, message_id, audio_url,
            ));
        })
    };

    let on_stop = {
        let playback = playback.clone();
        let mut store = store;
        use_callback(move |_: ()| {
            playback.stop();
            store.with_mut(|s| s.clear_playing());
        })
    };

    let on_retry_voice = {
        let backend = backend.clone();
        let playback = playback.clone();
        let profile = profile.clone();
        use_callback(move |message_id: String| {
            let text = store.with(|s| s.get(&message_id).map(|msg| msg.content.clone()));
            let Some(text) = text else { return };
            let backend = backend.clone();
            let playback = playback.clone();
            let profile = profile.clone();
            let settings = voice_settings().validated();
            spawn(synthesize_for_message(
                backend, playback, profile, store, settings, message_id, text,
            ));
        })
    };

    let on_favorite = {
        let mut store = store;
        use_callback(move |message_id: String| {
            store.with_mut(|s| s.toggle_favorite(&message_id));
        })
    };

    let new_conversation = {
        let mut store = store;
        let backend = backend.clone();
        let playback = playback.clone();
        let persona = profile.persona_name.clone();
        use_callback(move |_: ()| {
            crate::api::cancel_inflight_streams();
            playback.stop();
            store.set(MessageStore::with_welcome(persona.as_deref()));
            // Ask for the session id up front; if this fails the backend
            // still names one on the first send.
            let backend = backend.clone();
            spawn(async move {
                match backend.create_session(None).await {
                    Ok(session) => store.with_mut(|s| {
                        if s.session_id().is_none() {
                            s.set_session_id(session.id);
                        }
                    }),
                    Err(err) => tracing::debug!("eager session create failed: {err}"),
                }
            });
        })
    };

    let persona_label = profile
        .persona_name
        .clone()
        .unwrap_or_else(|| "Your echo".to_string());
    let avatar = avatar_letter(profile.persona_name.as_deref());
    let messages_snapshot = store.with(|s| s.messages().to_vec());
    let streaming = store.with(|s| s.is_streaming());
    let composer_hint = if streaming {
        "They're still answering\u{2026}"
    } else {
        "Say what's on your mind"
    };

    rsx! {
        div { class: "main-container",
            div { class: "chat-toolbar",
                span { class: "chat-persona", "{persona_label}" }
                button {
                    class: "btn btn-ghost",
                    r#type: "button",
                    onclick: move |_| new_conversation.call(()),
                    "New conversation"
                }
            }
            div { class: "chat-wrap",
                div { id: "chat-list", class: "chat-list",
                    for msg in messages_snapshot.iter() {
                        div {
                            key: "{msg.id}",
                            class: format_args!("message-row {}", role_class(msg.role)),
                            if matches!(msg.role, Role::Assistant) {
                                div { class: "avatar assistant", "{avatar}" }
                            }
                            div { class: "message-stack",
                                if is_pending_assistant(msg) {
                                    div { class: "shimmer-line",
                                        span { class: "shimmer-text", "Thinking of you\u{2026}" }
                                    }
                                } else {
                                    div { class: format_args!(
                                            "bubble {} {}",
                                            role_class(msg.role),
                                            if matches!(msg.role, Role::Assistant) { msg.emotion.css_class() } else { "" },
                                        ),
                                        if matches!(msg.role, Role::Assistant) {
                                            EchoBubble {
                                                message: msg.clone(),
                                                is_streaming: msg.id == STREAMING_ID,
                                                on_play,
                                                on_stop,
                                                on_retry_voice,
                                                on_favorite,
                                            }
                                        } else { "{msg.content}" }
                                    }
                                }
                                if let Some(ts) = format_message_time(msg.timestamp) {
                                    div { class: format_args!(
                                            "message-meta {}",
                                            match msg.role { Role::User => "align-end", Role::Assistant => "align-start" }
                                        ),
                                        span { class: "message-timestamp", "{ts}" }
                                        if msg.source.as_deref() == Some("error") {
                                            span { class: "message-source-error", "delivery issue" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            form { class: "composer no-divider",
                div { class: "composer-inner",
                    div { class: "hstack", style: "gap: 0.5rem; width: 100%; align-items: flex-end;",
                        textarea {
                            class: "", rows: "1", placeholder: "{composer_hint}",
                            value: "{input}", oninput: move |ev| input.set(ev.value()),
                            onkeydown: move |ev| {
                                if ev.modifiers().meta() || ev.modifiers().ctrl() {
                                    if ev.key() == Key::Character("+".into()) || ev.key() == Key::Character("=".into()) {
                                        ev.prevent_default();
                                        base_font_px.set((base_font_px() + 1).clamp(12, 22));
                                        return;
                                    }
                                    if ev.key() == Key::Character("-".into()) {
                                        ev.prevent_default();
                                        base_font_px.set((base_font_px() - 1).clamp(12, 22));
                                        return;
                                    }
                                }
                                if ev.key() == Key::Enter && !ev.modifiers().shift() {
                                    ev.prevent_default();
                                    let text = input();
                                    send_message.call(text);
                                }
                            },
                            autofocus: true,
                        }
                        button {
                            class: "btn btn-primary", r#type: "button",
                            disabled: input().trim().is_empty(),
                            onclick: move |_| {
                                let text = input();
                                send_message.call(text);
                            },
                            "Send"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn EchoBubble(
    message: ChatMessage,
    is_streaming: bool,
    on_play: Callback<(String, String)>,
    on_stop: Callback<()>,
    on_retry_voice: Callback<String>,
    on_favorite: Callback<String>,
) -> Element {
    let content_html = markdown_to_html(&message.content);
    let copy_payload = message.content.clone();
    let on_copy = move |_| {
        let raw = copy_payload.clone();
        spawn(async move {
            #[cfg(any(feature = "desktop", feature = "mobile"))]
            {
                if let Ok(mut cb) = arboard::Clipboard::new() {
                    let _ = cb.set_text(raw);
                }
            }
            #[cfg(not(any(feature = "desktop", feature = "mobile")))]
            let _ = raw;
        });
    };

    let play_id = message.id.clone();
    let retry_id = message.id.clone();
    let favorite_id = message.id.clone();
    let audio_url = message.audio_url.clone();
    let voice_error = message.voice_error.clone();
    let voice_quality = message.voice_quality.clone();

    rsx! {
        if !is_streaming {
            div { class: "bubble-controls",
                span { class: "emotion-icon", "{message.emotion.icon()}" }
                div { class: "actions",
                    button { class: "action-btn", title: "Copy text", onclick: on_copy, "Copy" }
                    button {
                        class: format_args!(
                            "action-btn {}",
                            if message.is_favorite { "active" } else { "" }
                        ),
                        title: "Keep this close",
                        onclick: move |_| on_favorite.call(favorite_id.clone()),
                        if message.is_favorite { "\u{2605}" } else { "\u{2606}" }
                    }
                }
            }
        }
        if is_streaming && message.content.is_empty() {
            div { class: "md", div { class: "shimmer-text", "Thinking of you\u{2026}" } }
        } else {
            div { class: "md", dangerous_inner_html: "{content_html}" }
        }
        if !is_streaming {
            div { class: "voice-row",
                if message.audio_loading {
                    span { class: "voice-status", "Preparing the voice\u{2026}" }
                } else if let Some(url) = audio_url {
                    if message.is_playing {
                        button {
                            class: "action-btn voice-btn", r#type: "button",
                            onclick: move |_| on_stop.call(()),
                            "\u{25A0} Stop"
                        }
                    } else {
                        button {
                            class: "action-btn voice-btn", r#type: "button",
                            onclick: move |_| on_play.call((play_id.clone(), url.clone())),
                            "\u{25B6} Listen"
                        }
                    }
                }
                if let Some(error) = voice_error {
                    span { class: "voice-status voice-error", "{error}" }
                    button {
                        class: "action-btn voice-btn", r#type: "button",
                        onclick: move |_| on_retry_voice.call(retry_id.clone()),
                        "Try voice again"
                    }
                }
                if let Some(quality) = voice_quality {
                    span { class: "voice-quality", "{quality}" }
                }
            }
        }
    }
}
