use super::client::CompletionClient;
use super::error::CompletionError;

pub const QUESTION_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";

const SYSTEM_PROMPT: &str = r#"你是一個專門設計故事理解問題的助手。請使用中文繁體書面語設計問題，確保問題的用詞優美得體，並能引導學生深入思考故事內容。每個問題必須包含4個選項（A、B、C、D）和正確答案。請嚴格按照指定格式輸出問題。

注意事項：
1. 每個選項必須以大寫字母（A、B、C、D）開頭，後面加上句點
2. 填空題必須使用【】標記填空處
3. 答案必須以「答案：」開頭
4. 詞語解釋必須包含詞義說明和例句"#;

pub fn build_question_prompt(story: &str, age: u8) -> String {
    format!(
        "請根據以下故事設計10條問題，嚴格按照以下格式輸出：

每個問題的格式示例：
問題1：[問題內容]
A. [選項A內容]
B. [選項B內容]
C. [選項C內容]
D. [選項D內容]
答案：[A/B/C/D]

填充題1：這個【】真是令人驚嘆。
答案：奇景（造句：山頂的日出是一個令人難忘的奇景。）

詞語解釋：[需要解釋的詞語]
答案：[詞語的意思]（造句：[使用該詞語的例句]）

請設計：
1. 7條理解問題（圍繞故事情節、人物性格、主題寓意等）
2. 2條填充題（從故事中選擇較複雜的詞語或片語，用【】標記填空處）
3. 1條詞語解釋題（解釋故事中的一個成語或較複雜詞語）

要求：
1. 所有問題必須使用書面語表達
2. 選項內容要合理，避免明顯的錯誤選項
3. 填空題必須來自原文，並提供造句示例
4. 詞語解釋必須包含完整的解釋和恰當的例句
5. 問題的難度要適合{age}歲的學生

故事內容：{story}"
    )
}

pub async fn request_questions(
    client: &CompletionClient,
    story: &str,
    age: u8,
) -> Result<String, CompletionError> {
    let user_prompt = build_question_prompt(story, age);
    client.complete(QUESTION_MODEL, SYSTEM_PROMPT, &user_prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_prompt_embeds_the_story_and_age() {
        let story = "小明在森林裡迷路了，最後靠北極星找到回家的路。";
        let prompt = build_question_prompt(story, 9);

        assert!(prompt.contains(story));
        assert!(prompt.contains("適合9歲的學生"));
    }

    #[test]
    fn question_prompt_pins_the_output_format() {
        let prompt = build_question_prompt("一個故事。", 7);

        assert!(prompt.contains("問題1："));
        assert!(prompt.contains("填充題1："));
        assert!(prompt.contains("詞語解釋："));
        assert!(prompt.contains("答案："));
        assert!(prompt.contains("【】"));
    }
}
