use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// One line-removal rule applied while cleaning a generated story.
struct CleanRule {
    name: &'static str,
    pattern: Regex,
}

impl CleanRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, "").into_owned()
    }
}

// Applied in order; each removes one kind of heading or markup artifact the
// model keeps producing despite being told not to.
static CLEAN_RULES: Lazy<Vec<CleanRule>> = Lazy::new(|| {
    vec![
        CleanRule::new("colon heading", r"(?m)^(.{0,30})[：:]\s*$"),
        CleanRule::new("chapter marker", r"(?m)^第[一二三四五六七八九十\d]+[章節].*$"),
        CleanRule::new("bracketed title", r"(?m)^[《【「『].*[》】」』]$"),
        CleanRule::new("bold-only line", r"(?m)^\*\*.*\*\*$"),
        CleanRule::new("markdown heading", r"(?m)^#+\s+.*$"),
    ]
});

static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Strip headings, chapter markers, and markdown artifacts from a generated
/// story, then collapse the blank lines the removals leave behind.
pub fn clean_story(story: &str) -> String {
    let mut cleaned = story.to_string();
    for rule in CLEAN_RULES.iter() {
        let next = rule.apply(&cleaned);
        if next.len() != cleaned.len() {
            debug!("story clean rule removed text: {}", rule.name);
        }
        cleaned = next;
    }
    BLANK_RUN.replace_all(&cleaned, "\n").trim().to_string()
}
