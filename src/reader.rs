use log::{debug, warn};

use crate::error::{EdfError, Result};
use crate::types::{units_in_digit, EdfHeader, EdfSignal};
use crate::utils::{parse_float_field, parse_int_field};
use crate::{
    DATA_FORMAT_VERSION_SIZE, DIGITAL_MAX_SIZE, DIGITAL_MIN_SIZE, DURATION_DATA_RECORDS_SIZE,
    HEADER_SIZE, HEADER_SIZE_RECORDING_INFO, IDENTIFICATION_CODE_SIZE, LABEL_OF_CHANNEL_SIZE,
    LOCAL_RECORDING_IDENTIFICATION_SIZE, LOCAL_SUBJECT_IDENTIFICATION_SIZE, NUMBER_OF_CHANNELS_SIZE,
    NUMBER_OF_DATA_RECORDS_SIZE, NUMBER_OF_SAMPLES_SIZE, PHYSICAL_DIMENSION_OF_CHANNEL_SIZE,
    PHYSICAL_MAX_IN_UNITS_SIZE, PHYSICAL_MIN_IN_UNITS_SIZE, PREFILTERING_SIZE, RESERVED_SIZE,
    START_DATE_SIZE, START_TIME_SIZE, TRANSDUCER_TYPE_SIZE,
};

/// Sequential reader over fixed-width ASCII header fields.
///
/// Every read either yields the full field width or fails with
/// [`EdfError::TruncatedInput`]; short reads are never tolerated.
struct FieldReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> FieldReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        FieldReader { bytes, position: 0 }
    }

    fn take(&mut self, field: &'static str, width: usize) -> Result<&'a [u8]> {
        let available = self.bytes.len() - self.position;
        if available < width {
            return Err(EdfError::TruncatedInput { field, needed: width, available });
        }
        let slice = &self.bytes[self.position..self.position + width];
        self.position += width;
        Ok(slice)
    }

    fn ascii(&mut self, field: &'static str, width: usize) -> Result<String> {
        let raw = self.take(field, width)?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    fn int<T: std::str::FromStr>(&mut self, field: &'static str, width: usize) -> Result<T> {
        let raw = self.ascii(field, width)?;
        parse_int_field(field, &raw)
    }

    fn float(&mut self, field: &'static str, width: usize) -> Result<f64> {
        let raw = self.ascii(field, width)?;
        parse_float_field(field, &raw)
    }

    // 每个字段先读完所有通道，再读下一个字段
    fn bulk_ascii(&mut self, field: &'static str, width: usize, count: usize) -> Result<Vec<String>> {
        (0..count).map(|_| self.ascii(field, width)).collect()
    }

    fn bulk_int<T: std::str::FromStr>(&mut self, field: &'static str, width: usize, count: usize) -> Result<Vec<T>> {
        (0..count).map(|_| self.int(field, width)).collect()
    }

    fn bulk_float(&mut self, field: &'static str, width: usize, count: usize) -> Result<Vec<f64>> {
        (0..count).map(|_| self.float(field, width)).collect()
    }

    fn bulk_raw(&mut self, field: &'static str, width: usize, count: usize) -> Result<Vec<Vec<u8>>> {
        (0..count).map(|_| self.take(field, width).map(<[u8]>::to_vec)).collect()
    }
}

/// Decodes the recording-level and per-channel header fields.
///
/// Returns the header and the number of bytes consumed, which is
/// `HEADER_SIZE_RECORDING_INFO + number_of_channels * HEADER_SIZE_PER_CHANNEL`.
///
/// # Errors
///
/// * [`EdfError::TruncatedInput`] - `bytes` ends inside a field
/// * [`EdfError::InvalidIdentification`] - the identification code is not `0`
/// * [`EdfError::NumericParseFailure`] - a numeric field does not parse
///
/// # Examples
///
/// ```rust
/// use edfcodec::{decode_header, encode_header};
///
/// let header = edfcodec::doctest_utils::sample_header();
/// let bytes = encode_header(&header)?;
///
/// let (decoded, consumed) = decode_header(&bytes)?;
/// assert_eq!(consumed, bytes.len());
/// assert_eq!(decoded, header);
/// # Ok::<(), edfcodec::EdfError>(())
/// ```
pub fn decode_header(bytes: &[u8]) -> Result<(EdfHeader, usize)> {
    if bytes.len() < HEADER_SIZE_RECORDING_INFO {
        return Err(EdfError::TruncatedInput {
            field: "header",
            needed: HEADER_SIZE_RECORDING_INFO,
            available: bytes.len(),
        });
    }

    let mut reader = FieldReader::new(bytes);

    let id_code = reader.ascii("identification code", IDENTIFICATION_CODE_SIZE)?;
    if id_code.trim() != "0" {
        return Err(EdfError::InvalidIdentification(id_code));
    }

    let subject_id = reader.ascii("subject identification", LOCAL_SUBJECT_IDENTIFICATION_SIZE)?;
    let recording_id = reader.ascii("recording identification", LOCAL_RECORDING_IDENTIFICATION_SIZE)?;
    let start_date = reader.ascii("start date", START_DATE_SIZE)?;
    let start_time = reader.ascii("start time", START_TIME_SIZE)?;
    let bytes_in_header = reader.int("bytes in header", HEADER_SIZE)?;
    let format_version = reader.ascii("format version", DATA_FORMAT_VERSION_SIZE)?;
    let number_of_records = reader.int("number of data records", NUMBER_OF_DATA_RECORDS_SIZE)?;
    let duration_of_records = reader.float("duration of data records", DURATION_DATA_RECORDS_SIZE)?;
    let number_of_channels: usize = reader.int("number of channels", NUMBER_OF_CHANNELS_SIZE)?;

    let nc = number_of_channels;
    let channel_labels = reader.bulk_ascii("channel label", LABEL_OF_CHANNEL_SIZE, nc)?;
    let transducer_types = reader.bulk_ascii("transducer type", TRANSDUCER_TYPE_SIZE, nc)?;
    let dimensions = reader.bulk_ascii("physical dimension", PHYSICAL_DIMENSION_OF_CHANNEL_SIZE, nc)?;
    let physical_min = reader.bulk_float("physical minimum", PHYSICAL_MIN_IN_UNITS_SIZE, nc)?;
    let physical_max = reader.bulk_float("physical maximum", PHYSICAL_MAX_IN_UNITS_SIZE, nc)?;
    let digital_min = reader.bulk_int("digital minimum", DIGITAL_MIN_SIZE, nc)?;
    let digital_max = reader.bulk_int("digital maximum", DIGITAL_MAX_SIZE, nc)?;
    let prefilterings = reader.bulk_ascii("prefiltering", PREFILTERING_SIZE, nc)?;
    let number_of_samples = reader.bulk_int("number of samples", NUMBER_OF_SAMPLES_SIZE, nc)?;
    let reserveds = reader.bulk_raw("reserved", RESERVED_SIZE, nc)?;

    let consumed = reader.position;
    if bytes_in_header != consumed {
        warn!(
            "header declares {} bytes but {} channels occupy {} bytes",
            bytes_in_header, nc, consumed
        );
    }
    debug!(
        "decoded header: {} channels, {} records of {}s, format {:?}",
        nc,
        number_of_records,
        duration_of_records,
        format_version.trim()
    );

    let header = EdfHeader {
        id_code,
        subject_id,
        recording_id,
        start_date,
        start_time,
        bytes_in_header,
        format_version,
        number_of_records,
        duration_of_records,
        number_of_channels,
        channel_labels,
        transducer_types,
        dimensions,
        physical_min,
        physical_max,
        digital_min,
        digital_max,
        prefilterings,
        number_of_samples,
        reserveds,
    };

    Ok((header, consumed))
}

/// Decodes `number_of_records` interleaved data records.
///
/// `bytes` starts at the first data record. Channel `c` of record `r` is
/// stored at offset `number_of_samples[c] * r` of its output row. Bytes past
/// the last record are ignored here; see [`crate::decode_document`].
///
/// # Errors
///
/// * [`EdfError::TruncatedInput`] - fewer bytes than the records need
/// * [`EdfError::DigitalMinEqualsMax`] - a channel has a zero digital range
/// * [`EdfError::ArrayLengthMismatch`] - the header arrays are inconsistent
/// * [`EdfError::NumericParseFailure`] - the declared counts overflow the data size
pub fn decode_signal(bytes: &[u8], header: &EdfHeader) -> Result<EdfSignal> {
    header.check_channel_arrays()?;

    let units: Vec<f64> = (0..header.number_of_channels)
        .map(|c| units_in_digit(header, c))
        .collect::<Result<_>>()?;

    let needed = header.data_size()?;
    let record_size = header.samples_per_record()?.saturating_mul(2);
    if bytes.len() < needed {
        return Err(EdfError::TruncatedInput {
            field: "data records",
            needed,
            available: bytes.len(),
        });
    }

    let mut digital_values: Vec<Vec<i16>> = (0..header.number_of_channels)
        .map(|c| header.channel_samples(c).map(Vec::with_capacity))
        .collect::<Result<_>>()?;

    for record in bytes[..needed].chunks_exact(record_size.max(1)).take(header.number_of_records) {
        let mut samples = record
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]));
        for (c, &ns) in header.number_of_samples.iter().enumerate() {
            digital_values[c].extend(samples.by_ref().take(ns));
        }
    }

    let values_in_units = digital_values
        .iter()
        .zip(&units)
        .map(|(row, &scale)| row.iter().map(|&d| d as f64 * scale).collect())
        .collect();

    debug!(
        "decoded {} records, {} bytes per record",
        header.number_of_records, record_size
    );

    Ok(EdfSignal {
        units_in_digit: units,
        digital_values,
        values_in_units,
    })
}
