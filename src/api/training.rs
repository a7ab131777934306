use super::client::{EchoBackend, EchoError, EchoResult};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingKind {
    #[default]
    Persona,
    Voice,
}

/// One training job as reported by the backend. Display-only; the client
/// never drives training.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingJob {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: TrainingKind,
    /// 0.0 to 1.0.
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub updated_at: i64,
}

impl TrainingJob {
    pub fn percent(&self) -> u32 {
        (self.progress.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

pub async fn training_status(backend: &EchoBackend) -> EchoResult<Vec<TrainingJob>> {
    let response = backend.get("/api/training/status").send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(EchoError::Backend { status, body });
    }
    parse_training_body(&body)
}

fn parse_training_body(body: &str) -> EchoResult<Vec<TrainingJob>> {
    #[derive(Deserialize)]
    struct JobsWrapper {
        jobs: Vec<TrainingJob>,
    }

    if let Ok(jobs) = serde_json::from_str::<Vec<TrainingJob>>(body) {
        return Ok(jobs);
    }
    let wrapped: JobsWrapper = serde_json::from_str(body)?;
    Ok(wrapped.jobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_wrapped_job_lists() {
        let bare = r#"[{"id":"job_1","kind":"voice","progress":0.4,"status":"training"}]"#;
        let wrapped = r#"{"jobs":[{"id":"job_1","progress":1.0,"status":"complete"}]}"#;
        let jobs = parse_training_body(bare).unwrap();
        assert_eq!(jobs[0].kind, TrainingKind::Voice);
        assert_eq!(jobs[0].percent(), 40);
        let jobs = parse_training_body(wrapped).unwrap();
        assert_eq!(jobs[0].kind, TrainingKind::Persona);
        assert_eq!(jobs[0].percent(), 100);
    }

    #[test]
    fn percent_clamps_out_of_range_progress() {
        let job = TrainingJob {
            id: "job_2".into(),
            label: String::new(),
            kind: TrainingKind::Voice,
            progress: 1.7,
            status: "training".into(),
            updated_at: 0,
        };
        assert_eq!(job.percent(), 100);
    }
}
