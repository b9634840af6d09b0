use super::client::CompletionClient;
use super::error::CompletionError;

pub const STORY_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";

const SYSTEM_PROMPT: &str = r#"你是一個專門為香港小學生創作故事的AI助手。請用中文繁體書面語創作故事，加入適當的成語和優美的詞藻。故事應該富有想像力、正面積極，並包含豐富的情節發展。每個年齡組別的故事長度、情節和詞彙要求如下：
- 7歲以下：最少300字，3個情節發展，使用簡單詞彙，短句，避免複雜成語
- 8-12歲：最少500字，4個情節發展，使用中等難度詞彙，可加入基本成語
- 12歲以上：最少600字，5個情節發展，可使用較複雜詞彙和成語

請注意：
1. 不要使用標題或小標題
2. 不要將故事分成章節
3. 詞彙難度必須嚴格符合目標年齡組別
4. 直接以故事內容開始，不要加入「從前有個...」等固定開場白
5. 故事應該是連貫的段落，不要使用編號或標題來分隔
6. 故事中加入反轉情節，增加故事的趣味性"#;

/// Reader age band. Drives the story length, vocabulary, and episode count
/// requested from the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeGroup {
    Toddler,
    Child,
    Teen,
}

impl AgeGroup {
    pub fn from_age(age: u8) -> Self {
        match age {
            0..=7 => AgeGroup::Toddler,
            8..=12 => AgeGroup::Child,
            _ => AgeGroup::Teen,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Toddler => "幼童",
            AgeGroup::Child => "兒童",
            AgeGroup::Teen => "青少年",
        }
    }

    pub fn episode_count(self) -> &'static str {
        match self {
            AgeGroup::Toddler => "兩個",
            AgeGroup::Child => "三個",
            AgeGroup::Teen => "四個",
        }
    }
}

#[derive(Clone, Debug)]
pub struct StoryParams {
    pub character: String,
    pub location: String,
    pub time: String,
    pub event: String,
    pub age: u8,
}

pub fn build_story_prompt(params: &StoryParams) -> String {
    let group = AgeGroup::from_age(params.age);
    format!(
        "請為{group}創作一個有趣的故事，包含{episodes}情節發展。故事主角是{character}，故事發生在{location}，時間是{time}，主要情節是{event}。請用書面語表達，適當加入成語和優美詞藻。確保故事有完整的開始、發展和結局，並帶出正面的價值觀。

重要要求：
1. 不要加入任何標題或小標題
2. 不要將故事分成章節
3. 請確保使用的詞彙適合{group}的理解能力
4. 直接以故事內容開始，不要加入「從前有個...」等開場白
5. 故事應該是連貫的段落，不要使用編號或標題來分隔",
        group = group.label(),
        episodes = group.episode_count(),
        character = params.character,
        location = params.location,
        time = params.time,
        event = params.event,
    )
}

pub async fn request_story(
    client: &CompletionClient,
    params: &StoryParams,
) -> Result<String, CompletionError> {
    let user_prompt = build_story_prompt(params);
    client.complete(STORY_MODEL, SYSTEM_PROMPT, &user_prompt).await
}
