use crate::api::{EchoBackend, TrainingJob, TrainingKind, training_status};
use crate::views::shared::format_session_date;
use dioxus::prelude::*;

fn kind_label(kind: TrainingKind) -> &'static str {
    match kind {
        TrainingKind::Persona => "Persona",
        TrainingKind::Voice => "Voice",
    }
}

#[component]
pub fn TrainingView() -> Element {
    let backend = use_context::<EchoBackend>();
    let mut jobs = use_signal(Vec::<TrainingJob>::new);
    let mut notice = use_signal(|| Option::<String>::None);

    let refresh = {
        let backend = backend.clone();
        use_callback(move |_: ()| {
            let backend = backend.clone();
            let mut jobs = jobs;
            let mut notice = notice;
            spawn(async move {
                match training_status(&backend).await {
                    Ok(list) => {
                        jobs.set(list);
                        notice.set(None);
                    }
                    Err(err) => {
                        tracing::warn!("training status failed: {err}");
                        notice.set(Some(
                            "Training progress isn't reachable right now.".to_string(),
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

    let current_jobs = jobs();

    rsx! {
        div { class: "main-container",
            div { class: "doc-controls",
                h3 { class: "section-title", "Training progress" }
                button {
                    class: "btn btn-ghost", r#type: "button",
                    onclick: move |_| refresh.call(()),
                    "Refresh"
                }
            }
            if let Some(text) = notice() {
                p { class: "text-muted notice", "{text}" }
            }
            if current_jobs.is_empty() {
                p { class: "text-muted",
                    "Nothing is training right now. Add more recordings or memories to begin a new pass."
                }
            } else {
                div { class: "doc-table",
                    div { class: "doc-table-header",
                        span { class: "doc-col-title", "Model" }
                        span { class: "doc-col-tags", "Progress" }
                        span { class: "doc-col-date", "Updated" }
                    }
                    div { class: "doc-table-body",
                        for job in current_jobs.iter() {
                            div { key: "{job.id}", class: "doc-row",
                                div { class: "doc-row-main",
                                    span { class: "doc-row-title",
                                        if job.label.is_empty() { "{kind_label(job.kind)} model" } else { "{job.label}" }
                                    }
                                    span { class: "doc-row-preview text-muted", "{job.status}" }
                                }
                                span { class: "doc-col-tags",
                                    div { class: "progress-track",
                                        div {
                                            class: "progress-fill",
                                            style: "width: {job.percent()}%;",
                                        }
                                    }
                                    span { class: "text-muted", "{job.percent()}%" }
                                }
                                span { class: "doc-row-date", "{format_session_date(job.updated_at)}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
