//! Prompt builders for the chat-completion calls.

use crate::lang::{Language, Style};
use crate::llm::{ChatMessage, ChatRequest};
use crate::text::PREVIEW_CHAR_LIMIT;

const TRANSLATOR_ROLE: &str =
    "You are a professional translator specializing in social media content for Farcaster.";

const PLAIN_TEXT_RULES: &str = "Hard rules:
- Do NOT include any labels or headings like \"CAST\", \"CAST (Farcaster):\" or similar.
- Do NOT use markdown formatting (no **bold**, lists, or numbered sections).
- Do NOT use emojis.";

pub fn generate_original(topic: &str, style: Style) -> ChatRequest {
    let prompt = format!(
        "You are a professional social media content creator for Farcaster.

Generate a single, well-structured cast as plain text only, in a {tone} tone.

{PLAIN_TEXT_RULES}
- Output only the cast body text, nothing else.
- If not mentioned, write in the language of the topic.

The first {PREVIEW_CHAR_LIMIT} characters will appear in the feed preview, so make the opening sentence strong and self-contained.

Topic: {topic}",
        tone = style.tone(),
    );
    ChatRequest {
        messages: vec![ChatMessage::system(prompt)],
        max_tokens: 200,
        temperature: 0.6,
    }
}

fn style_block(style: Style) -> String {
    format!(
        "Tone & style:
- Use a {tone} tone.
- Make the FIRST sentence impactful and attention-grabbing, as the first {PREVIEW_CHAR_LIMIT} characters are shown in the feed preview.
- Maintain the core message but adapt to the natural style and cultural context of the language.
- Use natural expressions that resonate with native speakers.",
        tone = style.tone(),
    )
}

/// All languages in one completion, answered as a JSON object keyed by code.
pub fn translate_batch(text: &str, targets: &[Language], style: Style) -> ChatRequest {
    let list = targets
        .iter()
        .map(|l| format!("- {}: {}", l.code(), l.name()))
        .collect::<Vec<_>>()
        .join("\n");
    let codes = targets.iter().map(|l| l.code()).collect::<Vec<_>>().join(", ");
    let example = targets
        .iter()
        .map(|l| format!("  \"{}\": \"{} translation here\"", l.code(), l.name()))
        .collect::<Vec<_>>()
        .join(",\n");

    let prompt = format!(
        "You will be given a cast body text and a list of target languages.
Translate the text into EACH target language. The translations are intended for the Farcaster feed.

Target languages (code: name):
{list}

{style}

{PLAIN_TEXT_RULES}
- Output ONLY JSON.

Output format:
Return ONLY a single JSON object, nothing else. No explanation, no markdown fences.

{{
{example}
}}

- The keys MUST be exactly the language codes from the target list: {codes}.
- Every value MUST be a string.
- Do not include any extra keys or comments.

Input text:
\"\"\"{text}\"\"\"",
        style = style_block(style),
    );

    ChatRequest {
        messages: vec![ChatMessage::system(TRANSLATOR_ROLE), ChatMessage::user(prompt)],
        max_tokens: 200 * targets.len() as u32,
        temperature: 0.7,
    }
}

/// One language per completion; the answer is the bare translated text.
pub fn translate_single(text: &str, target: Language, style: Style) -> ChatRequest {
    let prompt = format!(
        "Translate the following cast into {name} ({code}).

{style}

{PLAIN_TEXT_RULES}
- Output only the translated text, nothing else.

Input text:
\"\"\"{text}\"\"\"",
        name = target.name(),
        code = target.code(),
        style = style_block(style),
    );
    ChatRequest {
        messages: vec![ChatMessage::system(TRANSLATOR_ROLE), ChatMessage::user(prompt)],
        max_tokens: 400,
        temperature: 0.7,
    }
}
