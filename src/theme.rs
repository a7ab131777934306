use crate::types::ThemeMode;

pub struct ThemeDefinition {
    pub css: &'static str,
    pub wordmark_class: &'static str,
}

pub fn theme_definition(mode: ThemeMode) -> ThemeDefinition {
    match mode {
        ThemeMode::Dusk => ThemeDefinition {
            css: DUSK_THEME,
            wordmark_class: "header-wordmark",
        },
        ThemeMode::Light => ThemeDefinition {
            css: LIGHT_THEME,
            wordmark_class: "header-wordmark",
        },
        ThemeMode::Ember => ThemeDefinition {
            css: EMBER_THEME,
            wordmark_class: "header-wordmark header-wordmark-ember",
        },
    }
}

const DUSK_THEME: &str = r#"
:root {
    --color-bg-primary: #14121a;
    --color-bg-secondary: #1a1722;
    --color-bg-overlay: rgba(20, 18, 26, 0.92);
    --color-text-primary: #f2eee8;
    --color-text-secondary: #d9d2c7;
    --color-text-muted: #9a9288;
    --color-border: #3a3344;
    --color-surface-muted: #221e2c;
    --color-input-border: #3a3344;
    --color-input-bg: #14121a;
    --color-chat-user-bg: #e8ddcd;
    --color-chat-user-text: #221e2c;
    --color-chat-assistant-bg: #1d1926;
    --color-chat-assistant-text: #f2eee8;
    --color-timestamp: #837b70;
    --color-shimmer-base: rgba(222, 184, 135, 0.25);
    --color-shimmer-highlight: #deb887;
    --color-emotion-loving: #d98c8c;
    --color-emotion-reflective: #8ca3d9;
    --color-emotion-wise: #b59cd9;
    --color-emotion-comforting: #8cd9b5;
    --color-emotion-warm: #deb887;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.header { background: var(--color-bg-primary); }
.btn:hover,
.btn-ghost:hover { background: var(--color-surface-muted); }
.composer textarea { background: var(--color-input-bg); color: var(--color-text-primary); border-color: var(--color-input-border); }
.composer textarea:focus { border-color: var(--color-shimmer-highlight); }
"#;

const LIGHT_THEME: &str = r#"
:root {
    --color-bg-primary: #faf6f0;
    --color-bg-secondary: #f2ece2;
    --color-bg-overlay: rgba(250, 246, 240, 0.94);
    --color-text-primary: #2c2823;
    --color-text-secondary: #4a443c;
    --color-text-muted: #7d7468;
    --color-border: #d8cfc2;
    --color-surface-muted: #ece4d8;
    --color-input-border: #d8cfc2;
    --color-input-bg: #ffffff;
    --color-chat-user-bg: #3d3731;
    --color-chat-user-text: #faf6f0;
    --color-chat-assistant-bg: #ffffff;
    --color-chat-assistant-text: #2c2823;
    --color-timestamp: #998f82;
    --color-shimmer-base: rgba(176, 126, 62, 0.25);
    --color-shimmer-highlight: #b07e3e;
    --color-emotion-loving: #b5564f;
    --color-emotion-reflective: #4f6cb5;
    --color-emotion-wise: #7d5ab0;
    --color-emotion-comforting: #3e8f6a;
    --color-emotion-warm: #b07e3e;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.header { background: var(--color-bg-primary); }
.btn:hover,
.btn-ghost:hover { background: var(--color-surface-muted); }
.composer textarea { background: var(--color-input-bg); color: var(--color-text-primary); border-color: var(--color-input-border); }
.composer textarea:focus { border-color: var(--color-shimmer-highlight); }
"#;

const EMBER_THEME: &str = r#"
:root {
    --color-bg-primary: #1b1210;
    --color-bg-secondary: #221613;
    --color-bg-overlay: rgba(27, 18, 16, 0.92);
    --color-text-primary: #f5e9e2;
    --color-text-secondary: #e0cfc4;
    --color-text-muted: #a08d80;
    --color-border: #4a332b;
    --color-surface-muted: #2a1d18;
    --color-input-border: #4a332b;
    --color-input-bg: #1b1210;
    --color-chat-user-bg: #e8b98c;
    --color-chat-user-text: #2a1d18;
    --color-chat-assistant-bg: #241713;
    --color-chat-assistant-text: #f5e9e2;
    --color-timestamp: #8a776a;
    --color-shimmer-base: rgba(255, 140, 80, 0.25);
    --color-shimmer-highlight: #ff8c50;
    --color-emotion-loving: #e07b6d;
    --color-emotion-reflective: #9aa8d8;
    --color-emotion-wise: #c19ad8;
    --color-emotion-comforting: #93d8ae;
    --color-emotion-warm: #e8b98c;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.header { background: var(--color-bg-primary); }
.btn:hover,
.btn-ghost:hover { background: var(--color-surface-muted); }
.composer textarea { background: var(--color-input-bg); color: var(--color-text-primary); border-color: var(--color-input-border); }
.composer textarea:focus { border-color: var(--color-shimmer-highlight); }
"#;
