//! # EDF/EDF+ codec for Rust
//!
//! A pure Rust codec for EDF (European Data Format) and EDF+ files: the
//! fixed-width ASCII header, the interleaved little-endian 16-bit data records
//! and the Time-stamped Annotations List (TAL) that EDF+ stores in its
//! `EDF Annotations` channel.
//!
//! All operations work on in-memory byte buffers and are pure functions of
//! their input:
//!
//! | Operation | Result |
//! |---|---|
//! | [`decode_header`] | header and bytes consumed |
//! | [`decode_signal`] | de-interleaved digital and physical samples |
//! | [`decode_document`] | header, samples and annotations of a whole file |
//! | [`encode_header`] | fixed-width header bytes |
//! | [`encode_signal`] | interleaved data records |
//!
//! ## Quick Start
//!
//! ### Reading a recording
//!
//! ```rust
//! use edfcodec::{EdfDocument, Result};
//!
//! fn main() -> Result<()> {
//!     # std::fs::write("recording.edf", edfcodec::doctest_utils::sample_document_bytes()?)?;
//!     let document = EdfDocument::open("recording.edf")?;
//!     let header = document.header();
//!
//!     println!("Channels: {}", header.number_of_channels);
//!     println!("Records: {} x {}s", header.number_of_records, header.duration_of_records);
//!
//!     for channel in 0..header.number_of_channels {
//!         let samples = document.physical_samples(channel).unwrap_or_default();
//!         println!("{}: {} samples", header.label(channel).unwrap_or(""), samples.len());
//!     }
//!
//!     for annotation in document.annotations() {
//!         println!("{}s: {:?}", annotation.onset, annotation.texts);
//!     }
//!     # edfcodec::doctest_utils::cleanup_doctest_files();
//!     Ok(())
//! }
//! ```
//!
//! ### Writing a recording
//!
//! ```rust
//! use chrono::NaiveDate;
//! use edfcodec::{ChannelHeader, EdfDocument, EdfSignal, HeaderBuilder, Result};
//!
//! fn main() -> Result<()> {
//!     let start = NaiveDate::from_ymd_opt(2024, 5, 17)
//!         .and_then(|d| d.and_hms_opt(9, 0, 0))
//!         .unwrap();
//!
//!     let header = HeaderBuilder::new()
//!         .start_of_recording(start)
//!         .duration_of_record(1.0)
//!         .number_of_records(10)
//!         .patient_code("P001")
//!         .channel(ChannelHeader::new("EEG Fp1", -200.0, 200.0, 256).with_dimension("uV"))
//!         .build()?;
//!
//!     // 10 records x 256 samples of a digital ramp
//!     let samples: Vec<i16> = (0..2560).map(|i| (i % 512 - 256) as i16).collect();
//!     let signal = EdfSignal::from_digital(&header, vec![samples])?;
//!
//!     let document = EdfDocument::new(header, signal)?;
//!     let bytes = document.encode()?;
//!     assert_eq!(bytes.len(), 512 + 10 * 256 * 2);
//!     Ok(())
//! }
//! ```
//!
//! ## Physical vs Digital Values
//!
//! Samples are stored as 16-bit integers. Each channel converts them with
//! `physical = digital * (physical_max - physical_min) / (digital_max - digital_min)`;
//! a channel whose digital range is empty is rejected on decode.
//!
//! ## Annotations
//!
//! The annotation channel is decoded, removed from the header and the signal,
//! and written back verbatim on encode. Annotation values themselves are
//! never serialized into TAL bytes.

pub mod error;
pub mod types;
pub mod utils;
pub mod reader;
pub mod writer;
pub mod annotation;
pub mod document;
pub mod builder;

#[doc(hidden)]
pub mod doctest_utils; // For internal doctest support

// Re-export main types for convenience
pub use error::{EdfError, Result};
pub use types::{Annotation, ChannelHeader, EdfHeader, EdfSignal, PatientInfo, RecordingInfo};
pub use reader::{decode_header, decode_signal};
pub use writer::{encode_header, encode_signal};
pub use annotation::{find_annotation_channel, parse_annotations, TalScanner};
pub use document::{decode_document, EdfDocument};
pub use builder::HeaderBuilder;

// Recording-level field widths
pub const IDENTIFICATION_CODE_SIZE: usize = 8;
pub const LOCAL_SUBJECT_IDENTIFICATION_SIZE: usize = 80;
pub const LOCAL_RECORDING_IDENTIFICATION_SIZE: usize = 80;
pub const START_DATE_SIZE: usize = 8;
pub const START_TIME_SIZE: usize = 8;
pub const HEADER_SIZE: usize = 8;
pub const DATA_FORMAT_VERSION_SIZE: usize = 44;
pub const NUMBER_OF_DATA_RECORDS_SIZE: usize = 8;
pub const DURATION_DATA_RECORDS_SIZE: usize = 8;
pub const NUMBER_OF_CHANNELS_SIZE: usize = 4;

// Per-channel field widths
pub const LABEL_OF_CHANNEL_SIZE: usize = 16;
pub const TRANSDUCER_TYPE_SIZE: usize = 80;
pub const PHYSICAL_DIMENSION_OF_CHANNEL_SIZE: usize = 8;
pub const PHYSICAL_MIN_IN_UNITS_SIZE: usize = 8;
pub const PHYSICAL_MAX_IN_UNITS_SIZE: usize = 8;
pub const DIGITAL_MIN_SIZE: usize = 8;
pub const DIGITAL_MAX_SIZE: usize = 8;
pub const PREFILTERING_SIZE: usize = 80;
pub const NUMBER_OF_SAMPLES_SIZE: usize = 8;
pub const RESERVED_SIZE: usize = 32;

/// Size of the recording-level part of the header.
pub const HEADER_SIZE_RECORDING_INFO: usize = IDENTIFICATION_CODE_SIZE
    + LOCAL_SUBJECT_IDENTIFICATION_SIZE
    + LOCAL_RECORDING_IDENTIFICATION_SIZE
    + START_DATE_SIZE
    + START_TIME_SIZE
    + HEADER_SIZE
    + DATA_FORMAT_VERSION_SIZE
    + NUMBER_OF_DATA_RECORDS_SIZE
    + DURATION_DATA_RECORDS_SIZE
    + NUMBER_OF_CHANNELS_SIZE;

/// Header bytes added by each channel.
pub const HEADER_SIZE_PER_CHANNEL: usize = LABEL_OF_CHANNEL_SIZE
    + TRANSDUCER_TYPE_SIZE
    + PHYSICAL_DIMENSION_OF_CHANNEL_SIZE
    + PHYSICAL_MIN_IN_UNITS_SIZE
    + PHYSICAL_MAX_IN_UNITS_SIZE
    + DIGITAL_MIN_SIZE
    + DIGITAL_MAX_SIZE
    + PREFILTERING_SIZE
    + NUMBER_OF_SAMPLES_SIZE
    + RESERVED_SIZE;

/// Label of the EDF+ annotation channel.
pub const ANNOTATION_LABEL: &str = "EDF Annotations";

/// Format version prefix marking EDF+ files.
pub const EDF_PLUS_PREFIX: &str = "EDF+";

/// Library version
///
/// Returns the current version of the edfcodec library.
///
/// # Examples
///
/// ```rust
/// let version = edfcodec::version();
/// assert!(!version.is_empty());
/// assert!(version.contains('.'));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
