//! Chat portals a prompt can be pasted into.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Portal {
    pub name: &'static str,
    pub url: &'static str,
    pub icon: &'static str,
}

pub const PORTALS: &[Portal] = &[
    Portal {
        name: "Google AI Studio",
        url: "https://aistudio.google.com/",
        icon: "✨",
    },
    Portal {
        name: "Gemini",
        url: "https://gemini.google.com/",
        icon: "♊",
    },
    Portal {
        name: "Google Cloud AI",
        url: "https://console.cloud.google.com/vertex-ai",
        icon: "☁️",
    },
    Portal {
        name: "Claude",
        url: "https://claude.ai/",
        icon: "🎙️",
    },
    Portal {
        name: "DeepSeek",
        url: "https://chat.deepseek.com/",
        icon: "🐳",
    },
    Portal {
        name: "ChatGPT",
        url: "https://chat.openai.com/",
        icon: "🤖",
    },
];

/// Snippet used by `promptmaster sample` and as first-run content.
pub const SAMPLE_HTML: &str = r#"<div class="p-8 bg-indigo-600 rounded-3xl text-white shadow-2xl flex flex-col items-center gap-4">
  <h2 class="text-3xl font-bold">Hello World!</h2>
  <p class="text-indigo-100 text-center">This is a sample component for testing the Elementor prompt builder.</p>
  <button class="px-6 py-2 bg-white text-indigo-600 rounded-full font-bold hover:bg-indigo-50 transition-colors">
    Get Started
  </button>
</div>"#;
