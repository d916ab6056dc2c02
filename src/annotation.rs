//! Time-stamped Annotations List (TAL) decoding.
//!
//! An EDF+ annotation channel stores text instead of samples. Its 16-bit
//! values, read back as little-endian bytes, hold records of the form
//!
//! ```text
//! +<onset>[\x15<duration>]\x14[<text>\x14]...\x14\x00
//! ```
//!
//! followed by zero padding up to the end of each data record.

use log::trace;

use crate::error::{EdfError, Result};
use crate::types::{Annotation, EdfHeader};
use crate::ANNOTATION_LABEL;

/// ASCII 21, separates onset and duration.
const DURATION_SEPARATOR: u8 = 0x15;
/// ASCII 20, opens the text block and separates texts.
const ANNOTATION_SEPARATOR: u8 = 0x14;

/// Byte offsets of one complete TAL record.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TalRecord {
    onset: usize,
    duration: Option<usize>,
    text: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
    /// Inside the onset field.
    AwaitingDuration { onset: usize },
    /// A duration separator was seen, the text block has not started.
    AwaitingAnnotationText { onset: usize, duration: usize },
    /// Inside the text block, waiting for `\x14\x00`.
    AwaitingEnd { onset: usize, duration: Option<usize>, text: usize },
    /// The record is closed; the next non-zero byte starts a new onset.
    AwaitingOnset { record: TalRecord },
}

/// Lazy scanner over the bytes of an annotation channel.
///
/// Yields annotations in stream order. After the first error or the end of
/// input the scanner is exhausted and cannot be restarted.
///
/// # Examples
///
/// ```rust
/// use edfcodec::TalScanner;
///
/// let bytes = b"+180\x1530\x14Seizure\x14\x14\x00";
/// let annotations: Vec<_> = TalScanner::new(bytes).collect::<Result<_, _>>()?;
///
/// assert_eq!(annotations.len(), 1);
/// assert_eq!(annotations[0].onset, 180.0);
/// assert_eq!(annotations[0].duration, 30.0);
/// assert_eq!(annotations[0].texts, vec!["Seizure".to_string()]);
/// # Ok::<(), edfcodec::EdfError>(())
/// ```
pub struct TalScanner<'a> {
    bytes: &'a [u8],
    position: usize,
    state: ScanState,
    finished: bool,
}

impl<'a> TalScanner<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        TalScanner {
            bytes,
            position: 0,
            state: ScanState::AwaitingDuration { onset: 0 },
            finished: false,
        }
    }

    fn emit(&mut self, record: TalRecord) -> Option<Result<Annotation>> {
        let result = decode_record(self.bytes, record);
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

impl Iterator for TalScanner<'_> {
    type Item = Result<Annotation>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        // 终止符检查需要向后看一个字节，所以只扫描到 len - 1
        while self.position + 1 < self.bytes.len() {
            let i = self.position;
            let byte = self.bytes[i];
            self.position += 1;

            self.state = match self.state {
                ScanState::AwaitingDuration { onset } => match byte {
                    DURATION_SEPARATOR => ScanState::AwaitingAnnotationText { onset, duration: i },
                    ANNOTATION_SEPARATOR => ScanState::AwaitingEnd { onset, duration: None, text: i },
                    _ => continue,
                },
                ScanState::AwaitingAnnotationText { onset, duration } => match byte {
                    DURATION_SEPARATOR => ScanState::AwaitingAnnotationText { onset, duration: i },
                    ANNOTATION_SEPARATOR => ScanState::AwaitingEnd {
                        onset,
                        duration: Some(duration),
                        text: i,
                    },
                    _ => continue,
                },
                ScanState::AwaitingEnd { onset, duration, text } => {
                    if byte == ANNOTATION_SEPARATOR && self.bytes[i + 1] == 0 {
                        ScanState::AwaitingOnset {
                            record: TalRecord { onset, duration, text, end: i },
                        }
                    } else {
                        continue;
                    }
                }
                ScanState::AwaitingOnset { record } => {
                    if byte == 0 {
                        continue;
                    }
                    // 新记录从这个字节开始；若它本身是分隔符，在新状态下重新处理
                    self.state = ScanState::AwaitingDuration { onset: i };
                    if byte == DURATION_SEPARATOR || byte == ANNOTATION_SEPARATOR {
                        self.position = i;
                    }
                    return self.emit(record);
                }
            };
        }

        self.finished = true;
        match self.state {
            ScanState::AwaitingOnset { record } => self.emit(record),
            _ => None,
        }
    }
}

fn decode_record(bytes: &[u8], record: TalRecord) -> Result<Annotation> {
    let onset_end = record.duration.unwrap_or(record.text);
    let onset_text = String::from_utf8_lossy(&bytes[record.onset..onset_end]);
    let onset = parse_seconds(&onset_text).ok_or_else(|| {
        EdfError::MalformedAnnotation(format!("invalid onset {:?} at byte {}", onset_text, record.onset))
    })?;

    let duration = match record.duration {
        Some(d) => {
            let duration_text = String::from_utf8_lossy(&bytes[d + 1..record.text]);
            if is_blank(&duration_text) {
                0.0
            } else {
                match parse_seconds(&duration_text) {
                    Some(value) if value >= 0.0 => value,
                    _ => {
                        return Err(EdfError::MalformedAnnotation(format!(
                            "invalid duration {:?} at byte {}",
                            duration_text, d
                        )))
                    }
                }
            }
        }
        None => 0.0,
    };

    let texts: Vec<String> = bytes[record.text + 1..record.end]
        .split(|&b| b == ANNOTATION_SEPARATOR)
        .map(|piece| String::from_utf8_lossy(piece).into_owned())
        .filter(|piece| !is_blank(piece))
        .collect();

    trace!("TAL record at byte {}: onset {} duration {} texts {:?}", record.onset, onset, duration, texts);

    Ok(Annotation { onset, duration, texts })
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace() || c.is_control())
}

fn parse_seconds(s: &str) -> Option<f64> {
    let value: f64 = s
        .trim_matches(|c: char| c.is_whitespace() || c.is_control())
        .parse()
        .ok()?;
    value.is_finite().then_some(value)
}

/// Parses every TAL record in `bytes`, stopping at the first malformed one.
pub fn parse_annotations(bytes: &[u8]) -> Result<Vec<Annotation>> {
    TalScanner::new(bytes).collect()
}

/// Index of the channel holding the annotation list.
///
/// Only EDF+ files carry one: the format version must start with `EDF+` and
/// the first channel whose trimmed label is `EDF Annotations` is returned.
pub fn find_annotation_channel(header: &EdfHeader) -> Option<usize> {
    if !header.is_edf_plus() {
        return None;
    }
    header
        .channel_labels
        .iter()
        .position(|label| label.trim() == ANNOTATION_LABEL)
}

/// Reinterprets digital samples as the little-endian byte stream they were read from.
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
