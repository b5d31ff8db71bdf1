//! Helpers for the retired v1.5 `tr.json` API shape still used by some
//! browser extensions.

use serde::{Deserialize, Serialize};

use crate::models::translate::TranslateResponse;

/// Query of `GET /api/v1.5/tr.json/translate`.
#[derive(Debug, Default, Deserialize)]
pub struct V15Query {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V15TranslateResponse {
    pub text: Vec<String>,
}

impl From<TranslateResponse> for V15TranslateResponse {
    fn from(response: TranslateResponse) -> Self {
        Self {
            text: response.translations.into_iter().map(|t| t.text).collect(),
        }
    }
}

/// `en-US` -> `en`; codes without a region pass through.
pub fn extract_language(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

/// Split `SRC-DST` into its two non-empty halves.
pub fn split_src_dest_languages(lang: &str) -> Result<(&str, &str), String> {
    if lang.is_empty() {
        return Err("empty source-destination languages format (expected SRC-DST)".to_string());
    }
    if !lang.contains('-') {
        return Err(format!(
            "bad source-destination languages format {} (expected SRC-DST)",
            lang
        ));
    }
    let parts: Vec<&str> = lang.split('-').collect();
    let [src, dst] = parts.as_slice() else {
        return Err(format!(
            "unexpected source-destination languages format {} (expected SRC-DST)",
            lang
        ));
    };
    if src.is_empty() {
        return Err(format!("bad source language: {}", lang));
    }
    if dst.is_empty() {
        return Err(format!("bad destination language: {}", lang));
    }
    Ok((src, dst))
}
