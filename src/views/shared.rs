use comrak::plugins::syntect::SyntectAdapter;
use comrak::{ComrakOptions, ComrakPlugins, markdown_to_html_with_plugins};
use once_cell::sync::Lazy;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.render.unsafe_ = true;
    options
});

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

const SESSION_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:short] [day padding:zero], [year]");

pub fn markdown_to_html(md: &str) -> String {
    let adapter = SyntectAdapter::new(Some("base16-ocean.dark"));
    let mut plugins = ComrakPlugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&adapter);
    markdown_to_html_with_plugins(md, &MARKDOWN_OPTIONS, &plugins)
}

fn to_local(ms: i64) -> Option<OffsetDateTime> {
    let mut datetime = OffsetDateTime::from_unix_timestamp(ms.div_euclid(1000)).ok()?;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    Some(datetime)
}

/// `03:24 PM`, or nothing for zero/invalid timestamps.
pub fn format_message_time(ms: i64) -> Option<String> {
    if ms == 0 {
        return None;
    }
    to_local(ms)?.format(MESSAGE_TIME_FORMAT).ok()
}

/// `Mar 04, 2026` for session rows.
pub fn format_session_date(ms: i64) -> String {
    if ms == 0 {
        return "Unknown date".to_string();
    }
    to_local(ms)
        .and_then(|datetime| datetime.format(SESSION_DATE_FORMAT).ok())
        .unwrap_or_else(|| "Unknown date".to_string())
}

/// One-line preview for session rows.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (count, ch) in text.chars().enumerate() {
        if count >= max_chars {
            out.push('\u{2026}');
            break;
        }
        out.push(if ch == '\n' { ' ' } else { ch });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timestamps_have_no_time() {
        assert_eq!(format_message_time(0), None);
        assert_eq!(format_session_date(0), "Unknown date");
    }

    #[test]
    fn preview_truncation_marks_overflow() {
        assert_eq!(truncate_preview("short", 10), "short");
        assert_eq!(truncate_preview("one\ntwo", 10), "one two");
        let truncated = truncate_preview(&"x".repeat(40), 8);
        assert!(truncated.ends_with('\u{2026}'));
        assert_eq!(truncated.chars().count(), 9);
    }
}
