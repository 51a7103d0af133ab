use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language utilities for ISO language code handling
///
/// Target languages are a closed set; source languages are any ISO 639-1
/// code or the auto-detect sentinel.

/// Sentinel accepted in place of a source language code
pub const AUTO_DETECT: &str = "auto";

/// Target languages offered for translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetLanguage {
    Bengali,
    Hindi,
    Odia,
    Punjabi,
    Tamil,
    Telugu,
    Gujarati,
    Malayalam,
}

impl TargetLanguage {
    /// Every supported target, in menu order
    pub const ALL: [TargetLanguage; 8] = [
        Self::Bengali,
        Self::Hindi,
        Self::Odia,
        Self::Punjabi,
        Self::Tamil,
        Self::Telugu,
        Self::Gujarati,
        Self::Malayalam,
    ];

    /// ISO 639-1 code sent to translation services
    pub fn code(&self) -> &'static str {
        match self {
            Self::Bengali => "bn",
            Self::Hindi => "hi",
            Self::Odia => "or",
            Self::Punjabi => "pa",
            Self::Tamil => "ta",
            Self::Telugu => "te",
            Self::Gujarati => "gu",
            Self::Malayalam => "ml",
        }
    }

    /// English name shown in menus
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bengali => "Bengali",
            Self::Hindi => "Hindi",
            Self::Odia => "Odia",
            Self::Punjabi => "Punjabi",
            Self::Tamil => "Tamil",
            Self::Telugu => "Telugu",
            Self::Gujarati => "Gujarati",
            Self::Malayalam => "Malayalam",
        }
    }

    /// Name of the language in its own script, when known
    pub fn native_name(&self) -> Option<&'static str> {
        Language::from_639_1(self.code()).and_then(|lang| lang.to_autonym())
    }

    /// Look up a target by code ("hi", "hin") or English name ("Hindi")
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if let Some(target) = Self::ALL
            .iter()
            .find(|t| t.display_name().eq_ignore_ascii_case(trimmed))
        {
            return Ok(*target);
        }

        let code = normalize_to_part1(trimmed)
            .map_err(|_| anyhow!("Unsupported target language: {}", value))?;
        Self::ALL
            .iter()
            .find(|t| t.code() == code)
            .copied()
            .ok_or_else(|| {
                anyhow!(
                    "Unsupported target language: {} (supported: {})",
                    value,
                    supported_target_codes().join(", ")
                )
            })
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for TargetLanguage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TargetLanguage {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TargetLanguage> for String {
    fn from(value: TargetLanguage) -> Self {
        value.code().to_string()
    }
}

/// Source language: fixed code or auto-detect
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    Auto,
    Fixed(String),
}

impl SourceLanguage {
    /// Code sent to translation services
    pub fn code(&self) -> &str {
        match self {
            Self::Auto => AUTO_DETECT,
            Self::Fixed(code) => code,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    /// Parse a configured source language
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(AUTO_DETECT) {
            return Ok(Self::Auto);
        }
        Ok(Self::Fixed(normalize_to_part1(trimmed)?))
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Codes of every supported target language
pub fn supported_target_codes() -> Vec<&'static str> {
    TargetLanguage::ALL.iter().map(|t| t.code()).collect()
}

/// Normalize a 2- or 3-letter language code to ISO 639-1
pub fn normalize_to_part1(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if Language::from_639_1(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
    } else if normalized_code.len() == 3 {
        if let Some(part1) = Language::from_639_3(&normalized_code).and_then(|lang| lang.to_639_1()) {
            return Ok(part1.to_string());
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part1(code1), normalize_to_part1(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    if code.trim().eq_ignore_ascii_case(AUTO_DETECT) {
        return Ok("Auto-detect".to_string());
    }
    let part1 = normalize_to_part1(code)?;
    let lang = Language::from_639_1(&part1)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", part1))?;

    Ok(lang.to_name().to_string())
}
