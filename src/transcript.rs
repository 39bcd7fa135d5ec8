use indicatif::{ProgressBar, ProgressStyle};
use std::cmp::Ordering;

/// Tolerance used when comparing segment timestamps after a round-trip
pub const TIME_EPSILON: f64 = 1e-6;

/// A single subtitle unit: a timestamped span of spoken text
#[derive(Debug, Clone)]
pub struct Segment {
    /// Start of the spoken interval in seconds
    pub start: f64,
    /// End of the spoken interval in seconds, never before `start`
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new<S: Into<String>>(start: f64, end: f64, text: S) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Same timing within `TIME_EPSILON` and identical text
    pub fn approx_eq(&self, other: &Segment) -> bool {
        (self.start - other.start).abs() < TIME_EPSILON
            && (self.end - other.end).abs() < TIME_EPSILON
            && self.text == other.text
    }

    /// Copy of this segment with the text replaced, timing untouched
    pub fn with_text<S: Into<String>>(&self, text: S) -> Self {
        Self {
            start: self.start,
            end: self.end,
            text: text.into(),
        }
    }
}

// Segments compare by start time only.
impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.start.partial_cmp(&other.start)
    }
}

/// Ordered segment sequence plus the language tag of the spoken text
#[derive(Debug, Clone)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    pub language: String,
}

impl Transcript {
    pub fn new<S: Into<String>>(segments: Vec<Segment>, language: S) -> Self {
        Self {
            segments,
            language: language.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// End time of the last segment, if any
    pub fn duration(&self) -> Option<f64> {
        self.segments.last().map(|seg| seg.end)
    }

    /// Whether segments are ordered by start time ascending
    pub fn is_ordered(&self) -> bool {
        self.segments.windows(2).all(|pair| pair[0].start <= pair[1].start)
    }

    pub fn approx_eq(&self, other: &Transcript) -> bool {
        self.language == other.language
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a.approx_eq(b))
    }
}

/// Progress bar for a per-segment loop
pub(crate) fn segment_progress(len: usize, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message);
    pb
}
