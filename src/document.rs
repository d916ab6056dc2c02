use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;

use crate::annotation::{find_annotation_channel, parse_annotations, samples_to_bytes};
use crate::error::{EdfError, Result};
use crate::reader::{decode_header, decode_signal};
use crate::types::{Annotation, ChannelHeader, EdfHeader, EdfSignal};
use crate::writer::{encode_header, encode_signal};

/// The annotation channel as it was stored, kept so it can be written back verbatim.
#[derive(Debug, Clone, PartialEq)]
struct AnnotationChannel {
    index: usize,
    header: ChannelHeader,
    units_in_digit: f64,
    digital_values: Vec<i16>,
}

/// A complete EDF/EDF+ recording: header, samples and annotations.
///
/// For EDF+ files the `EDF Annotations` channel is parsed into
/// [`Annotation`]s and removed from [`header`](Self::header) and
/// [`signal`](Self::signal). Its raw samples are kept internally and written
/// back unchanged by [`encode`](Self::encode); annotations are never
/// re-encoded from the parsed values.
///
/// # Examples
///
/// ```rust
/// use edfcodec::{decode_document, EdfDocument};
///
/// # let bytes = edfcodec::doctest_utils::sample_document_bytes()?;
/// let document = decode_document(&bytes)?;
///
/// // The annotation channel is not part of the signal
/// assert_eq!(document.header().number_of_channels, 2);
/// for annotation in document.annotations() {
///     println!("{:+}s ({}s): {:?}", annotation.onset, annotation.duration, annotation.texts);
/// }
///
/// // Writing back reproduces the original bytes
/// assert_eq!(document.encode()?, bytes);
/// # Ok::<(), edfcodec::EdfError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EdfDocument {
    header: EdfHeader,
    signal: EdfSignal,
    annotations: Vec<Annotation>,
    annotation_channel: Option<AnnotationChannel>,
}

/// Decodes a whole file image: header, data records and annotations.
///
/// # Errors
///
/// Everything [`decode_header`] and [`decode_signal`] report, plus
/// * [`EdfError::TrailingData`] - bytes remain after `number_of_records` records
/// * [`EdfError::MalformedAnnotation`] - the annotation channel holds an invalid TAL
pub fn decode_document(bytes: &[u8]) -> Result<EdfDocument> {
    let (header, consumed) = decode_header(bytes)?;
    let body = &bytes[consumed..];
    let signal = decode_signal(body, &header)?;

    let expected = header.data_size()?;
    if body.len() > expected {
        return Err(EdfError::TrailingData(body.len() - expected));
    }

    EdfDocument::from_parts(header, signal)
}

impl EdfDocument {
    /// Builds a document from a header and matching samples.
    ///
    /// The header arrays, the signal rows and the per-channel sample counts
    /// must agree. An EDF+ annotation channel is extracted exactly as on decode.
    ///
    /// ```rust
    /// use edfcodec::{EdfDocument, EdfSignal};
    ///
    /// let header = edfcodec::doctest_utils::sample_header();
    /// let signal = EdfSignal::from_digital(&header, vec![vec![0; 8], vec![0; 4]])?;
    /// let document = EdfDocument::new(header, signal)?;
    /// assert!(document.annotations().is_empty());
    /// # Ok::<(), edfcodec::EdfError>(())
    /// ```
    pub fn new(header: EdfHeader, signal: EdfSignal) -> Result<Self> {
        header.check_channel_arrays()?;
        let n = header.number_of_channels;
        let counts = [
            ("digital values", signal.digital_values.len()),
            ("values in units", signal.values_in_units.len()),
            ("units in digit", signal.units_in_digit.len()),
        ];
        for (field, actual) in counts {
            if actual != n {
                return Err(EdfError::ArrayLengthMismatch { field, expected: n, actual });
            }
        }
        for c in 0..n {
            let expected = header.channel_samples(c)?;
            for (field, actual) in [
                ("digital values", signal.digital_values[c].len()),
                ("values in units", signal.values_in_units[c].len()),
            ] {
                if actual != expected {
                    return Err(EdfError::ArrayLengthMismatch { field, expected, actual });
                }
            }
        }

        Self::from_parts(header, signal)
    }

    fn from_parts(header: EdfHeader, signal: EdfSignal) -> Result<Self> {
        let Some(index) = find_annotation_channel(&header) else {
            return Ok(EdfDocument {
                header,
                signal,
                annotations: Vec::new(),
                annotation_channel: None,
            });
        };

        let annotations = parse_annotations(&samples_to_bytes(&signal.digital_values[index]))?;
        debug!("extracted {} annotations from channel {}", annotations.len(), index);

        let annotation_channel = header.channel(index).map(|channel_header| AnnotationChannel {
            index,
            header: channel_header,
            units_in_digit: signal.units_in_digit[index],
            digital_values: signal.digital_values[index].clone(),
        });

        Ok(EdfDocument {
            header: header.without_channel(index),
            signal: signal.without_channel(index),
            annotations,
            annotation_channel,
        })
    }

    /// Header without the annotation channel.
    pub fn header(&self) -> &EdfHeader {
        &self.header
    }

    /// Samples without the annotation channel.
    pub fn signal(&self) -> &EdfSignal {
        &self.signal
    }

    /// Annotations in the order they appear in the file.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Physical samples of one channel.
    pub fn physical_samples(&self, channel: usize) -> Option<&[f64]> {
        self.signal.values_in_units.get(channel).map(Vec::as_slice)
    }

    /// Digital samples of one channel.
    pub fn digital_samples(&self, channel: usize) -> Option<&[i16]> {
        self.signal.digital_values.get(channel).map(Vec::as_slice)
    }

    /// Header and signal as they are written, annotation channel included.
    pub fn to_file_parts(&self) -> (EdfHeader, EdfSignal) {
        match &self.annotation_channel {
            Some(channel) => (
                self.header.with_channel(channel.index, channel.header.clone()),
                self.signal
                    .with_channel(channel.index, channel.units_in_digit, channel.digital_values.clone()),
            ),
            None => (self.header.clone(), self.signal.clone()),
        }
    }

    /// Encodes the document into a complete file image.
    ///
    /// `bytes_in_header` is recomputed from the channel count before the
    /// header is written.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let (mut header, signal) = self.to_file_parts();
        header.bytes_in_header = EdfHeader::expected_header_size(header.number_of_channels);

        let mut bytes = encode_header(&header)?;
        bytes.extend_from_slice(&encode_signal(&signal, &header)?);
        Ok(bytes)
    }

    /// Reads the whole stream into memory and decodes it.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        decode_document(&bytes)
    }

    /// Writes the encoded document and flushes the writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.encode()?)?;
        writer.flush()?;
        Ok(())
    }

    /// Opens and decodes an EDF/EDF+ file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .map_err(|e| EdfError::FileNotFound(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::read_from(BufReader::new(file))
    }

    /// Encodes the document into a new file at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(&path)?;
        self.write_to(BufWriter::new(file))
    }
}
