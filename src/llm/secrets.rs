use std::env;
use std::fmt;

use anyhow::{Result, bail};
use dialoguer::{Password, theme::ColorfulTheme};

use crate::palette::Palette;
use crate::utils::{strip_controls_and_escapes, trim_line};

pub const API_KEY_ENV: &str = "GUSHI_OPENROUTER_API_KEY";

/// OpenRouter credential. Held in memory for the session; never written to
/// disk.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Environment,
    Prompt,
}

impl ApiKeySource {
    pub fn description(&self) -> &'static str {
        match self {
            ApiKeySource::Environment => "environment variable",
            ApiKeySource::Prompt => "interactive prompt",
        }
    }
}

pub fn get_api_key_from_env() -> Option<ApiKey> {
    if let Ok(value) = env::var(API_KEY_ENV)
        && let Some(trimmed) = trim_line(&value)
    {
        return Some(ApiKey::new(trimmed));
    }
    None
}

pub fn prompt_for_api_key() -> Result<Option<ApiKey>> {
    println!(
        "{} (https://openrouter.ai/keys) to generate stories.",
        Palette::paint(Palette::SUCCESS, "Enter your OpenRouter API key")
    );
    println!(
        "{}",
        Palette::dim("The key is kept in memory for this session only. Leave the field blank to abort.")
    );
    let raw_password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API Key")
        .allow_empty_password(true)
        .interact()?;

    let password = strip_controls_and_escapes(&raw_password);
    Ok(trim_line(&password).map(ApiKey::new))
}

pub fn ensure_api_key() -> Result<(ApiKey, ApiKeySource)> {
    if let Some(api_key) = get_api_key_from_env() {
        return Ok((api_key, ApiKeySource::Environment));
    }

    let Some(api_key) = prompt_for_api_key()? else {
        bail!(
            "No API key provided. Set {} or enter one at the prompt.",
            API_KEY_ENV
        );
    };
    Ok((api_key, ApiKeySource::Prompt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_reveals_the_key() {
        let key = ApiKey::new("sk-or-v1-super-secret");
        let printed = format!("{:?}", key);
        assert!(!printed.contains("super-secret"));
        assert_eq!(printed, "ApiKey(***)");
    }

    #[test]
    fn env_lookup_trims_and_skips_blank_values() {
        unsafe {
            env::set_var(API_KEY_ENV, "  sk-test  ");
        }
        let key = get_api_key_from_env().expect("expected a key");
        assert_eq!(key.reveal(), "sk-test");

        unsafe {
            env::set_var(API_KEY_ENV, "   ");
        }
        assert!(get_api_key_from_env().is_none());

        unsafe {
            env::remove_var(API_KEY_ENV);
        }
        assert!(get_api_key_from_env().is_none());
    }
}
