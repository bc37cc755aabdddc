//! Closed vocabularies shared by the endpoints: target languages, tones and the
//! Unicode-script based language guess used when a session omits its language.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ja,
    Ko,
    Zh,
    Es,
    Fr,
    Pt,
    De,
    It,
    Ru,
    Ar,
    Hi,
    Vi,
    Th,
    Id,
    Tr,
    Pl,
    Nl,
}

impl Language {
    pub const ALL: [Language; 18] = [
        Language::En, Language::Ja, Language::Ko, Language::Zh, Language::Es, Language::Fr,
        Language::Pt, Language::De, Language::It, Language::Ru, Language::Ar, Language::Hi,
        Language::Vi, Language::Th, Language::Id, Language::Tr, Language::Pl, Language::Nl,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Zh => "zh",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::Pt => "pt",
            Language::De => "de",
            Language::It => "it",
            Language::Ru => "ru",
            Language::Ar => "ar",
            Language::Hi => "hi",
            Language::Vi => "vi",
            Language::Th => "th",
            Language::Id => "id",
            Language::Tr => "tr",
            Language::Pl => "pl",
            Language::Nl => "nl",
        }
    }

    /// English display name, used inside prompts.
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ja => "Japanese",
            Language::Ko => "Korean",
            Language::Zh => "Chinese",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::Pt => "Portuguese",
            Language::De => "German",
            Language::It => "Italian",
            Language::Ru => "Russian",
            Language::Ar => "Arabic",
            Language::Hi => "Hindi",
            Language::Vi => "Vietnamese",
            Language::Th => "Thai",
            Language::Id => "Indonesian",
            Language::Tr => "Turkish",
            Language::Pl => "Polish",
            Language::Nl => "Dutch",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code '{0}'")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|l| l.code() == code)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Tone requested for generated or translated casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    Professional,
    #[default]
    Casual,
    CryptoNative,
}

impl Style {
    pub fn tone(self) -> &'static str {
        match self {
            Style::Professional => "professional and informative",
            Style::Casual => "casual and engaging",
            Style::CryptoNative => "crypto-native and punchy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("style must be one of professional, casual, crypto-native (got '{0}')")]
pub struct UnknownStyle(pub String);

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(Style::Professional),
            "casual" => Ok(Style::Casual),
            "crypto-native" | "crypto_native" => Ok(Style::CryptoNative),
            _ => Err(UnknownStyle(s.to_string())),
        }
    }
}

#[derive(Default)]
struct ScriptCounts {
    hangul: usize,
    kana: usize,
    han: usize,
    thai: usize,
    arabic: usize,
    devanagari: usize,
    cyrillic: usize,
    latin: usize,
    vietnamese_marks: usize,
}

impl ScriptCounts {
    fn add(&mut self, c: char) {
        match c as u32 {
            0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF => self.hangul += 1,
            0x3040..=0x309F | 0x30A0..=0x30FF | 0x31F0..=0x31FF => self.kana += 1,
            0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF => self.han += 1,
            0x0E00..=0x0E7F => self.thai += 1,
            0x0600..=0x06FF | 0x0750..=0x077F | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF => self.arabic += 1,
            0x0900..=0x097F => self.devanagari += 1,
            0x0400..=0x04FF | 0x0500..=0x052F => self.cyrillic += 1,
            0x1EA0..=0x1EF9 => {
                self.latin += 1;
                self.vietnamese_marks += 1;
            }
            _ if c.is_ascii_alphabetic() => self.latin += 1,
            _ if c.is_alphabetic() && (c as u32) < 0x0250 => {
                if matches!(c, 'ă' | 'Ă' | 'đ' | 'Đ' | 'ơ' | 'Ơ' | 'ư' | 'Ư') {
                    self.vietnamese_marks += 1;
                }
                self.latin += 1;
            }
            _ => {}
        }
    }
}

/// Best-effort guess of the language a cast is written in, from the Unicode
/// scripts it uses. Latin text is reported as English unless it carries
/// Vietnamese-only letters. Returns `None` when the text has no letters.
pub fn detect_language(text: &str) -> Option<Language> {
    let mut counts = ScriptCounts::default();
    text.chars().for_each(|c| counts.add(c));

    // kana anywhere means the Han characters belong to Japanese
    let cjk = if counts.kana > 0 {
        (Language::Ja, counts.kana + counts.han)
    } else {
        (Language::Zh, counts.han)
    };
    let latin = if counts.vietnamese_marks > 0 { Language::Vi } else { Language::En };

    [
        (latin, counts.latin),
        (Language::Ru, counts.cyrillic),
        (Language::Hi, counts.devanagari),
        (Language::Ar, counts.arabic),
        (Language::Th, counts.thai),
        cjk,
        (Language::Ko, counts.hangul),
    ]
    .into_iter()
    .filter(|(_, n)| *n > 0)
    .max_by_key(|(_, n)| *n)
    .map(|(lang, _)| lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("KO".parse::<Language>().unwrap(), Language::Ko);
        assert_eq!(" id ".parse::<Language>().unwrap(), Language::Id);
        assert!("xx".parse::<Language>().is_err());
    }

    #[test]
    fn serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Language::Zh).unwrap(), "\"zh\"");
        assert_eq!(serde_json::to_string(&Style::CryptoNative).unwrap(), "\"crypto-native\"");
    }

    #[test]
    fn detects_scripts() {
        assert_eq!(detect_language("안녕하세요 여러분"), Some(Language::Ko));
        assert_eq!(detect_language("今日はいい天気ですね"), Some(Language::Ja));
        assert_eq!(detect_language("今天天气很好"), Some(Language::Zh));
        assert_eq!(detect_language("Привет, мир"), Some(Language::Ru));
        assert_eq!(detect_language("مرحبا بالعالم"), Some(Language::Ar));
        assert_eq!(detect_language("नमस्ते दुनिया"), Some(Language::Hi));
        assert_eq!(detect_language("สวัสดีครับ"), Some(Language::Th));
        assert_eq!(detect_language("Xin chào thế giới"), Some(Language::Vi));
        assert_eq!(detect_language("gm farcaster"), Some(Language::En));
    }

    #[test]
    fn mixed_text_follows_dominant_script() {
        assert_eq!(detect_language("Base 위에서 새로운 미니앱을 만들었습니다"), Some(Language::Ko));
    }

    #[test]
    fn no_letters_is_none() {
        assert_eq!(detect_language("1234 !!! 🚀"), None);
        assert_eq!(detect_language(""), None);
    }
}
