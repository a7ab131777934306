use crate::api::EchoBackend;
use crate::audio::PlaybackController;
use crate::settings::{EchoProfile, VoiceSettings};
use crate::store::MessageStore;
use crate::theme::theme_definition;
use crate::types::{ChatSession, ThemeMode};
use crate::views::{ChatView, SessionsView, SettingsView, TrainingView};
use dioxus::prelude::*;

const ECHO_CSS: Asset = asset!("/assets/echo.css");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AppTab {
    Chat,
    Sessions,
    Training,
    Settings,
}

#[component]
pub fn App() -> Element {
    let profile = use_context_provider(EchoProfile::from_env);
    use_context_provider(|| match EchoBackend::from_env() {
        Ok(backend) => backend,
        Err(err) => {
            tracing::error!("backend configuration rejected: {err}");
            EchoBackend::default()
        }
    });
    use_context_provider(PlaybackController::start);

    let persona = profile.persona_name.clone();
    let store = use_signal(move || MessageStore::with_welcome(persona.as_deref()));
    let sessions = use_signal(Vec::<ChatSession>::new);
    let voice_settings = use_signal(VoiceSettings::default);
    let active_tab = use_signal(|| AppTab::Chat);
    let base_font_px = use_signal(|| 14i32);
    let theme = use_signal(|| ThemeMode::Dusk);

    rsx! {
        ThemeStyles { base_font_px, theme }
        AppHeader { active_tab, theme: theme() }
        TabPanels {
            active_tab,
            store,
            sessions,
            voice_settings,
            base_font_px,
            theme,
        }
    }
}

#[component]
fn ThemeStyles(base_font_px: Signal<i32>, theme: Signal<ThemeMode>) -> Element {
    let root_style = format!(":root {{ font-size: {}px; }}", base_font_px());
    let definition = theme_definition(theme());
    rsx! {
        document::Link { rel: "stylesheet", href: ECHO_CSS }
        style { dangerous_inner_html: "{root_style}" }
        style { dangerous_inner_html: "{definition.css}" }
    }
}

#[component]
fn AppHeader(active_tab: Signal<AppTab>, theme: ThemeMode) -> Element {
    let theme = theme_definition(theme);
    rsx! {
        div { class: "header no-divider",
            div { class: "header-content",
                span { class: "{theme.wordmark_class}", "AI Echo" }
                TabNavigation { active_tab }
            }
        }
    }
}

#[component]
fn TabPanels(
    active_tab: Signal<AppTab>,
    store: Signal<MessageStore>,
    sessions: Signal<Vec<ChatSession>>,
    voice_settings: Signal<VoiceSettings>,
    base_font_px: Signal<i32>,
    theme: Signal<ThemeMode>,
) -> Element {
    let mut tab_signal = active_tab;
    rsx! {
        div { class: "tab-panels",
            TabPanel {
                active_tab,
                tab: AppTab::Chat,
                children: rsx!( ChatView { store, voice_settings, base_font_px } ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Sessions,
                children: rsx!( SessionsView {
                    store,
                    sessions,
                    on_opened: move |_| tab_signal.set(AppTab::Chat),
                } ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Training,
                children: rsx!( TrainingView {} ),
            }
            TabPanel {
                active_tab,
                tab: AppTab::Settings,
                children: rsx!( SettingsView { theme, voice_settings } ),
            }
        }
    }
}

#[component]
fn TabPanel(active_tab: Signal<AppTab>, tab: AppTab, children: Element) -> Element {
    let is_active = active_tab() == tab;
    let class_suffix = if is_active { "active" } else { "" };
    rsx! {
        div {
            class: format_args!("tab-panel {}", class_suffix),
            aria_hidden: (!is_active).to_string(),
            {children}
        }
    }
}

#[component]
fn TabNavigation(active_tab: Signal<AppTab>) -> Element {
    rsx! {
        div { class: "tabs",
            TabButton { active_tab, tab: AppTab::Chat, label: "Chat" }
            TabButton { active_tab, tab: AppTab::Sessions, label: "Conversations" }
            TabButton { active_tab, tab: AppTab::Training, label: "Training" }
            TabButton { active_tab, tab: AppTab::Settings, label: "Settings" }
        }
    }
}

#[component]
fn TabButton(active_tab: Signal<AppTab>, tab: AppTab, label: &'static str) -> Element {
    let mut active_tab = active_tab;
    let class = if active_tab() == tab {
        "tab active"
    } else {
        "tab"
    };
    rsx! {
        h1 {
            class: class,
            onclick: move |_| active_tab.set(tab),
            "{label}"
        }
    }
}
