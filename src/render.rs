use crate::palette::Palette;
use crate::parser::Question;

/// Join the story's non-empty lines into terminal paragraphs.
pub fn format_story(story: &str) -> String {
    story
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_question(question: &Question) -> String {
    match question {
        Question::MultipleChoice {
            prompt,
            options,
            answer,
        } => {
            let mut out = String::new();
            out.push_str(&Palette::paint(Palette::ACCENT, prompt));
            for option in options {
                out.push('\n');
                out.push_str(option);
            }
            out.push('\n');
            out.push_str(&Palette::dim(format!("正確答案：{answer}")));
            out
        }
        Question::FillBlank { sentence, answer } => format!(
            "{}\n{}\n{}",
            Palette::paint(Palette::ACCENT, "填充題"),
            sentence,
            Palette::dim(format!("答案：{answer}"))
        ),
        Question::Vocabulary { prompt, answer } => format!(
            "{}\n{}",
            Palette::paint(Palette::ACCENT, prompt),
            Palette::dim(format!("答案：{answer}"))
        ),
    }
}
