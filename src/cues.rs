use crate::srt::{seconds, Cue};
use crate::transcript::{TimedSegment, TimedWord};

/// Maximum number of words shown in a single cue.
pub const WORDS_PER_CUE: usize = 5;

/// Groups the words of each segment into numbered cues.
///
/// Segments are pulled from `segments` one at a time, so only the cues of the
/// current segment are held in memory.
pub struct CueBuilder<I> {
    segments: I,
    ready: std::vec::IntoIter<Line>,
    next_index: usize,
}

impl<I> CueBuilder<I>
where
    I: Iterator<Item = TimedSegment>,
{
    pub fn new<S>(segments: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Self {
            segments: segments.into_iter(),
            ready: Vec::new().into_iter(),
            next_index: 1,
        }
    }
}

impl<I> Iterator for CueBuilder<I>
where
    I: Iterator<Item = TimedSegment>,
{
    type Item = Cue;

    fn next(&mut self) -> Option<Cue> {
        loop {
            if let Some(line) = self.ready.next() {
                let index = self.next_index;
                self.next_index += 1;
                return Some(line.into_cue(index));
            }
            let segment = self.segments.next()?;
            if segment.is_empty() {
                continue;
            }
            self.ready = group_words(&segment.words).into_iter();
        }
    }
}

#[derive(Debug)]
struct Line {
    words: Vec<String>,
    start: f64,
    end: f64,
}

impl Line {
    fn into_cue(self, index: usize) -> Cue {
        let start = seconds(self.start);
        let end = seconds(self.end).max(start);
        Cue {
            index,
            start,
            end,
            text: self.words.join(" "),
        }
    }
}

fn group_words(words: &[TimedWord]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut pending: Option<Line> = None;
    let last = words.len().saturating_sub(1);

    for (i, word) in words.iter().enumerate() {
        let text = word.text.trim();
        if text.is_empty() {
            continue;
        }

        let line = pending.get_or_insert_with(|| Line {
            words: Vec::with_capacity(WORDS_PER_CUE),
            start: word.start,
            end: word.end,
        });
        line.words.push(text.to_string());
        line.end = word.end;

        if line.words.len() >= WORDS_PER_CUE || i == last {
            lines.extend(pending.take());
        }
    }

    // Words left pending behind a trailing blank word are dropped.
    lines
}
