use anyhow::{Error, Result};
use log::{info, warn};

use crate::llm::client::CompletionClient;
use crate::llm::error::CompletionError;
use crate::llm::questions::request_questions;
use crate::llm::secrets::ensure_api_key;
use crate::llm::story::{StoryParams, request_story};
use crate::palette::Palette;
use crate::parser::parse_questions;
use crate::render::{format_question, format_story};
use crate::sanitize::clean_story;

pub async fn run(params: StoryParams, story_only: bool) -> Result<()> {
    let (api_key, source) = ensure_api_key()?;
    info!("using API key from {}", source.description());
    let client = CompletionClient::new(api_key)?;

    println!("{}", Palette::dim("正在創作故事..."));
    let story = match request_story(&client, &params).await {
        Ok(raw_story) => clean_story(&raw_story),
        Err(err) => {
            let message = story_failure_message(&err);
            return Err(Error::new(err).context(message));
        }
    };

    println!();
    println!("{}", format_story(&story));

    if story_only {
        return Ok(());
    }

    println!();
    println!("{}", Palette::dim("正在生成理解問題..."));
    // The story already rendered; a question failure must not discard it.
    match request_questions(&client, &story, params.age).await {
        Ok(raw_questions) => {
            let questions = parse_questions(&raw_questions);
            if questions.is_empty() {
                println!(
                    "{}",
                    Palette::paint(Palette::WARNING, "未能從回應中解析出任何問題。")
                );
                return Ok(());
            }
            for question in &questions {
                println!();
                println!("{}", format_question(question));
            }
        }
        Err(err) => {
            warn!("question generation failed: {err}");
            println!(
                "{}",
                Palette::paint(Palette::DANGER, question_failure_message(&err))
            );
        }
    }

    Ok(())
}

fn story_failure_message(err: &CompletionError) -> &'static str {
    match err {
        CompletionError::RateLimitExceeded => "API請求過於頻繁，請稍等幾秒後再試。",
        CompletionError::InvalidCredentials => "API密鑰無效，請檢查您的密鑰是否正確。",
        _ => "故事生成失敗，請檢查您的網絡連接和API密鑰。",
    }
}

fn question_failure_message(err: &CompletionError) -> &'static str {
    match err {
        CompletionError::RateLimitExceeded => {
            "問題生成失敗（API請求過於頻繁），但故事已成功生成。"
        }
        CompletionError::InvalidCredentials => {
            "問題生成失敗（API密鑰無效），但故事已成功生成。"
        }
        _ => "問題生成失敗，但故事已成功生成。",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages_map_by_category() {
        assert_eq!(
            story_failure_message(&CompletionError::RateLimitExceeded),
            "API請求過於頻繁，請稍等幾秒後再試。"
        );
        assert_eq!(
            story_failure_message(&CompletionError::InvalidCredentials),
            "API密鑰無效，請檢查您的密鑰是否正確。"
        );
        assert_eq!(
            story_failure_message(&CompletionError::UpstreamError(500)),
            "故事生成失敗，請檢查您的網絡連接和API密鑰。"
        );
        assert_eq!(
            story_failure_message(&CompletionError::MalformedResponse),
            "故事生成失敗，請檢查您的網絡連接和API密鑰。"
        );
    }

    #[test]
    fn question_failures_keep_the_story() {
        for err in [
            CompletionError::RateLimitExceeded,
            CompletionError::InvalidCredentials,
            CompletionError::UpstreamError(503),
            CompletionError::MalformedResponse,
        ] {
            assert!(question_failure_message(&err).contains("故事已成功生成"));
        }
    }
}
