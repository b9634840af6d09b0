pub mod questions;

pub use questions::{BLANK_MARKER, Question, parse_questions};
