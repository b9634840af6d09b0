use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder the question format uses to mark a fill-in blank.
pub const BLANK_MARKER: &str = "【】";

const ANSWER_MARKER: &str = "答案：";

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(問題\d+：|填充題\d*：|詞語解釋：)").unwrap());
static OPTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-D]\.").unwrap());
static COMPOUND_ANSWER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.+?)（造句：(.+?)）").unwrap());

/// One comprehension question recovered from the model's reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Question {
    MultipleChoice {
        prompt: String,
        options: Vec<String>,
        answer: String,
    },
    FillBlank {
        sentence: String,
        answer: String,
    },
    Vocabulary {
        prompt: String,
        answer: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QuestionKind {
    MultipleChoice,
    FillBlank,
    Vocabulary,
}

fn header_kind(line: &str) -> Option<QuestionKind> {
    let marker = HEADER_RE.find(line)?.as_str();
    if marker.starts_with("問題") {
        Some(QuestionKind::MultipleChoice)
    } else if marker.starts_with("填充題") {
        Some(QuestionKind::FillBlank)
    } else {
        Some(QuestionKind::Vocabulary)
    }
}

/// Buffered cursor over the non-blank lines of the reply. The flush test
/// needs one line of lookahead, so this exposes `peek` next to `advance`.
struct LineCursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(raw: &'a str) -> Self {
        let lines = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        Self { lines, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }
}

#[derive(Debug)]
struct Pending {
    kind: QuestionKind,
    header: String,
    options: Vec<String>,
    answer: Option<String>,
}

impl Pending {
    fn new(kind: QuestionKind, header: String) -> Self {
        Self {
            kind,
            header,
            options: Vec::new(),
            answer: None,
        }
    }

    /// A record without an answer is never emitted.
    fn emit(self) -> Option<Question> {
        let answer = self.answer?;
        let question = match self.kind {
            QuestionKind::MultipleChoice => Question::MultipleChoice {
                prompt: self.header,
                options: self.options,
                answer,
            },
            QuestionKind::FillBlank => fill_blank_from_answer(self.header, answer),
            QuestionKind::Vocabulary => Question::Vocabulary {
                prompt: self.header,
                answer,
            },
        };
        Some(question)
    }
}

/// A fill-blank answer of the form `word（造句：sentence）` carries its own
/// example sentence; the word is excised from it and replaced by the blank
/// marker. Anything else falls back to the header's bracketed blank with the
/// raw answer text.
fn fill_blank_from_answer(header: String, answer: String) -> Question {
    if let Some(caps) = COMPOUND_ANSWER_RE.captures(&answer) {
        let word = caps[1].to_string();
        let sentence = caps[2].replacen(&word, BLANK_MARKER, 1);
        Question::FillBlank {
            sentence,
            answer: word,
        }
    } else {
        Question::FillBlank {
            sentence: header,
            answer,
        }
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Accumulating(Pending),
}

impl State {
    fn flush_into(&mut self, questions: &mut Vec<Question>) {
        if let State::Accumulating(pending) = std::mem::replace(self, State::Idle)
            && let Some(question) = pending.emit()
        {
            questions.push(question);
        }
    }
}

/// Parse the model's question reply into ordered records.
///
/// Best effort: lines that match no marker are dropped, and this never
/// fails. A record is emitted when its answer line is followed by a new
/// header or the end of input; a pending record that still holds an answer
/// when a later header (or the end of input) arrives is emitted with that
/// answer, while a pending record with no answer is dropped.
pub fn parse_questions(raw: &str) -> Vec<Question> {
    let mut cursor = LineCursor::new(raw);
    let mut questions = Vec::new();
    let mut state = State::Idle;

    while let Some(line) = cursor.advance() {
        if let Some(kind) = header_kind(line) {
            state.flush_into(&mut questions);
            state = State::Accumulating(Pending::new(kind, line.to_string()));
            continue;
        }

        let State::Accumulating(pending) = &mut state else {
            continue;
        };

        if OPTION_RE.is_match(line) {
            if pending.kind == QuestionKind::MultipleChoice {
                pending.options.push(line.to_string());
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix(ANSWER_MARKER) {
            pending.answer = Some(rest.trim().to_string());
            let complete = match cursor.peek() {
                None => true,
                Some(next) => header_kind(next).is_some(),
            };
            if complete {
                state.flush_into(&mut questions);
            }
        }
        // Anything else is a stray continuation; the record absorbs nothing.
    }

    state.flush_into(&mut questions);
    questions
}
