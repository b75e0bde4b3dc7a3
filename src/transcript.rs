/// A single recognized word with its start and end time in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedWord {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl TimedWord {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// A contiguous span of recognized speech. May contain no words at all.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimedSegment {
    pub words: Vec<TimedWord>,
}

impl TimedSegment {
    pub fn new(words: Vec<TimedWord>) -> Self {
        Self { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Forward-only sequence of segments as produced by a recognizer.
///
/// Consumed exactly once; there is no way to rewind it.
pub type Segments = Box<dyn Iterator<Item = TimedSegment>>;

pub fn no_segments() -> Segments {
    Box::new(std::iter::empty())
}
