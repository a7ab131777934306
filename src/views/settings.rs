use crate::api::{EchoBackend, upload_recording};
use crate::settings::{
    EchoProfile, MAX_PLAYBACK_RATE, MAX_VOLUME, MIN_PLAYBACK_RATE, MIN_VOLUME, VoiceSettings,
};
use crate::types::{Emotion, ThemeMode};
use dioxus::events::FormEvent;
use dioxus::prelude::*;
use std::path::PathBuf;

const TONES: &[(Emotion, &str)] = &[
    (Emotion::Warm, "Warm"),
    (Emotion::Loving, "Loving"),
    (Emotion::Reflective, "Reflective"),
    (Emotion::Wise, "Wise"),
    (Emotion::Comforting, "Comforting"),
];

fn tone_value(tone: Emotion) -> &'static str {
    match tone {
        Emotion::Loving => "loving",
        Emotion::Reflective => "reflective",
        Emotion::Wise => "wise",
        Emotion::Comforting => "comforting",
        Emotion::Warm => "warm",
    }
}

fn tone_from_value(value: &str) -> Emotion {
    match value {
        "loving" => Emotion::Loving,
        "reflective" => Emotion::Reflective,
        "wise" => Emotion::Wise,
        "comforting" => Emotion::Comforting,
        _ => Emotion::Warm,
    }
}

#[component]
pub fn SettingsView(theme: Signal<ThemeMode>, voice_settings: Signal<VoiceSettings>) -> Element {
    let backend = use_context::<EchoBackend>();
    let profile = use_context::<EchoProfile>();
    let mut recording_path = use_signal(String::new);
    let mut upload_status = use_signal(|| Option::<String>::None);
    let mut uploading = use_signal(|| false);

    let settings = voice_settings();
    let volume_percent = (settings.volume * 100.0).round() as i32;
    let rate_percent = (settings.playback_rate * 100.0).round() as i32;
    let volume_min = (MIN_VOLUME * 100.0) as i32;
    let volume_max = (MAX_VOLUME * 100.0) as i32;
    let rate_min = (MIN_PLAYBACK_RATE * 100.0) as i32;
    let rate_max = (MAX_PLAYBACK_RATE * 100.0) as i32;
    let rate_display = format!("{:.2}x", settings.playback_rate);

    let upload = {
        let backend = backend.clone();
        use_callback(move |_: ()| {
            let path = recording_path().trim().to_string();
            if path.is_empty() || uploading() {
                return;
            }
            let backend = backend.clone();
            let mut upload_status = upload_status;
            let mut uploading_signal = uploading;
            uploading_signal.set(true);
            upload_status.set(None);
            spawn(async move {
                match upload_recording(&backend, &PathBuf::from(&path), None).await {
                    Ok(()) => upload_status.set(Some(
                        "Recording received. It will join the next training pass.".to_string(),
                    )),
                    Err(err) => {
                        tracing::warn!("recording upload failed: {err}");
                        upload_status.set(Some(
                            "The recording couldn't be uploaded. Check the file and try again."
                                .to_string(),
                        ));
                    }
                }
                uploading_signal.set(false);
            });
        })
    };

    let voice_section_title = match &profile.persona_name {
        Some(name) => format!("{name}'s voice"),
        None => "Voice".to_string(),
    };

    rsx! {
        div { class: "main-container",
            div { class: "settings-section",
                h3 { class: "section-title", "Display" }
                div { class: "theme-toggle",
                    button {
                        class: format_args!(
                            "theme-option {}",
                            if matches!(theme(), ThemeMode::Dusk) { "active" } else { "" }
                        ),
                        r#type: "button",
                        onclick: move |_| theme.set(ThemeMode::Dusk),
                        "Dusk"
                    }
                    button {
                        class: format_args!(
                            "theme-option {}",
                            if matches!(theme(), ThemeMode::Light) { "active" } else { "" }
                        ),
                        r#type: "button",
                        onclick: move |_| theme.set(ThemeMode::Light),
                        "Light"
                    }
                    button {
                        class: format_args!(
                            "theme-option {}",
                            if matches!(theme(), ThemeMode::Ember) { "active" } else { "" }
                        ),
                        r#type: "button",
                        onclick: move |_| theme.set(ThemeMode::Ember),
                        "Ember"
                    }
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title", "{voice_section_title}" }
                label { class: "setting-row",
                    input {
                        r#type: "checkbox",
                        checked: settings.voice_enabled,
                        onchange: move |evt: FormEvent| {
                            voice_settings.with_mut(|s| s.voice_enabled = evt.checked());
                        },
                    }
                    span { "Speak replies aloud" }
                }
                label { class: "setting-row",
                    input {
                        r#type: "checkbox",
                        checked: settings.auto_play,
                        disabled: !settings.voice_enabled,
                        onchange: move |evt: FormEvent| {
                            voice_settings.with_mut(|s| s.auto_play = evt.checked());
                        },
                    }
                    span { "Play each reply as it arrives" }
                }
                div { class: "setting-row",
                    label { for: "voice-volume", class: "control-label", "Volume" }
                    input {
                        id: "voice-volume",
                        r#type: "range",
                        min: "{volume_min}",
                        max: "{volume_max}",
                        value: "{volume_percent}",
                        oninput: move |evt: FormEvent| {
                            if let Ok(value) = evt.value().parse::<f32>() {
                                voice_settings.with_mut(|s| s.volume = value / 100.0);
                            }
                        },
                    }
                    span { class: "text-muted", "{volume_percent}%" }
                }
                div { class: "setting-row",
                    label { for: "voice-rate", class: "control-label", "Pace" }
                    input {
                        id: "voice-rate",
                        r#type: "range",
                        min: "{rate_min}",
                        max: "{rate_max}",
                        value: "{rate_percent}",
                        oninput: move |evt: FormEvent| {
                            if let Ok(value) = evt.value().parse::<f32>() {
                                voice_settings.with_mut(|s| s.playback_rate = value / 100.0);
                            }
                        },
                    }
                    span { class: "text-muted", "{rate_display}" }
                }
                div { class: "setting-row",
                    label { for: "voice-tone", class: "control-label", "Tone" }
                    select {
                        id: "voice-tone",
                        value: tone_value(settings.emotional_tone),
                        onchange: move |evt: FormEvent| {
                            let tone = tone_from_value(&evt.value());
                            voice_settings.with_mut(|s| s.emotional_tone = tone);
                        },
                        for (tone, label) in TONES.iter() {
                            option { value: tone_value(*tone), "{label}" }
                        }
                    }
                }
            }
            div { class: "settings-section",
                h3 { class: "section-title", "Voice training" }
                p { class: "text-muted",
                    "Add a recorded passage to keep improving the voice. WAV files work best."
                }
                div { class: "setting-row",
                    input {
                        r#type: "text",
                        placeholder: "/path/to/recording.wav",
                        value: "{recording_path}",
                        oninput: move |evt: FormEvent| recording_path.set(evt.value()),
                    }
                    button {
                        class: "btn btn-primary", r#type: "button",
                        disabled: uploading() || recording_path().trim().is_empty(),
                        onclick: move |_| upload.call(()),
                        if uploading() { "Uploading\u{2026}" } else { "Upload" }
                    }
                }
                if let Some(status) = upload_status() {
                    p { class: "text-muted", "{status}" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_values_round_trip() {
        for (tone, _) in TONES {
            assert_eq!(tone_from_value(tone_value(*tone)), *tone);
        }
        assert_eq!(tone_from_value("unknown"), Emotion::Warm);
    }
}
