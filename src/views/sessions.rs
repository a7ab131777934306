use crate::api::EchoBackend;
use crate::store::MessageStore;
use crate::types::ChatSession;
use crate::views::shared::{format_session_date, truncate_preview};
use dioxus::events::FormEvent;
use dioxus::prelude::*;

const PREVIEW_CHARS: usize = 80;

#[derive(Clone, Copy, PartialEq, Eq)]
enum SessionSort {
    Newest,
    Oldest,
    Title,
}

fn sorted_sessions(mut sessions: Vec<ChatSession>, mode: SessionSort) -> Vec<ChatSession> {
    match mode {
        SessionSort::Newest => sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        SessionSort::Oldest => sessions.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
        SessionSort::Title => {
            sessions.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        }
    }
    sessions
}

#[component]
pub fn SessionsView(
    store: Signal<MessageStore>,
    sessions: Signal<Vec<ChatSession>>,
    on_opened: EventHandler<()>,
) -> Element {
    let backend = use_context::<EchoBackend>();
    let mut sort_mode = use_signal(|| SessionSort::Newest);
    let mut loading_id = use_signal(|| Option::<String>::None);
    let mut notice = use_signal(|| Option::<String>::None);

    let refresh = {
        let backend = backend.clone();
        use_callback(move |_: ()| {
            let backend = backend.clone();
            let mut sessions = sessions;
            let mut notice = notice;
            spawn(async move {
                match backend.list_sessions().await {
                    Ok(list) => {
                        sessions.set(list);
                        notice.set(None);
                    }
                    Err(err) => {
                        tracing::warn!("session list failed: {err}");
                        notice.set(Some(
                            "Past conversations aren't reachable right now.".to_string(),
                        ));
                    }
                }
            });
        })
    };

    {
        let refresh = refresh;
        use_effect(move || {
            refresh.call(());
        });
    }

    let open_session = {
        let backend = backend.clone();
        use_callback(move |session_id: String| {
            let backend = backend.clone();
            let mut store = store;
            let mut loading_id = loading_id;
            let mut notice = notice;
            let on_opened = on_opened;
            loading_id.set(Some(session_id.clone()));
            spawn(async move {
                match backend.load_session(&session_id).await {
                    Ok(detail) => {
                        // Server order is authoritative; the store keeps it.
                        store.with_mut(|s| s.load_session(&detail.session, detail.messages));
                        notice.set(None);
                        on_opened.call(());
                    }
                    Err(err) => {
                        tracing::warn!("session load failed: {err}");
                        notice.set(Some(
                            "That conversation couldn't be opened just now.".to_string(),
                        ));
                    }
                }
                loading_id.set(None);
            });
        })
    };

    let all_sessions = sessions();
    let display_sessions = sorted_sessions(all_sessions.clone(), sort_mode());
    let active_session = store.with(|s| s.session_id().map(str::to_string));

    rsx! {
        div { class: "main-container",
            if let Some(text) = notice() {
                p { class: "text-muted notice", "{text}" }
            }
            if all_sessions.is_empty() {
                p { class: "text-muted", "No conversations yet. Everything you talk about is kept here." }
            } else {
                div { class: "doc-controls",
                    div { class: "doc-control-group",
                        label { for: "session-sort", class: "control-label", "Sort" }
                        select {
                            id: "session-sort",
                            value: match sort_mode() { SessionSort::Newest => "newest", SessionSort::Oldest => "oldest", SessionSort::Title => "title" },
                            onchange: move |evt: FormEvent| {
                                let mode = match evt.value().as_str() {
                                    "oldest" => SessionSort::Oldest,
                                    "title" => SessionSort::Title,
                                    _ => SessionSort::Newest,
                                };
                                sort_mode.set(mode);
                            },
                            option { value: "newest", "Newest" }
                            option { value: "oldest", "Oldest" }
                            option { value: "title", "Title" }
                        }
                    }
                    button {
                        class: "btn btn-ghost", r#type: "button",
                        onclick: move |_| refresh.call(()),
                        "Refresh"
                    }
                }
                div { class: "doc-table",
                    div { class: "doc-table-header",
                        span { class: "doc-col-title", "Conversation" }
                        span { class: "doc-col-tags", "Messages" }
                        span { class: "doc-col-date", "Last talked" }
                    }
                    div { class: "doc-table-body",
                        for session in display_sessions.iter().cloned() {
                            div {
                                key: "{session.id}",
                                class: format_args!(
                                    "doc-row {}",
                                    if active_session.as_deref() == Some(session.id.as_str()) { "active" } else { "" }
                                ),
                                role: "button",
                                tabindex: "0",
                                onclick: {
                                    let session_id = session.id.clone();
                                    move |_| open_session.call(session_id.clone())
                                },
                                div { class: "doc-row-main",
                                    span { class: "doc-row-title",
                                        if session.title.is_empty() { "Untitled conversation" } else { "{session.title}" }
                                    }
                                    if !session.preview.is_empty() {
                                        span { class: "doc-row-preview text-muted",
                                            "{truncate_preview(&session.preview, PREVIEW_CHARS)}"
                                        }
                                    }
                                }
                                span { class: "doc-row-tags",
                                    if loading_id().as_deref() == Some(session.id.as_str()) {
                                        "opening\u{2026}"
                                    } else {
                                        "{session.message_count}"
                                    }
                                }
                                span { class: "doc-row-date", "{format_session_date(session.updated_at)}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
