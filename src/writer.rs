use log::debug;

use crate::error::{EdfError, Result};
use crate::types::{EdfHeader, EdfSignal};
use crate::utils::{format_float_field, to_ascii};
use crate::{
    DATA_FORMAT_VERSION_SIZE, DIGITAL_MAX_SIZE, DIGITAL_MIN_SIZE, DURATION_DATA_RECORDS_SIZE,
    HEADER_SIZE, IDENTIFICATION_CODE_SIZE, LABEL_OF_CHANNEL_SIZE,
    LOCAL_RECORDING_IDENTIFICATION_SIZE, LOCAL_SUBJECT_IDENTIFICATION_SIZE, NUMBER_OF_CHANNELS_SIZE,
    NUMBER_OF_DATA_RECORDS_SIZE, NUMBER_OF_SAMPLES_SIZE, PHYSICAL_DIMENSION_OF_CHANNEL_SIZE,
    PHYSICAL_MAX_IN_UNITS_SIZE, PHYSICAL_MIN_IN_UNITS_SIZE, PREFILTERING_SIZE, RESERVED_SIZE,
    START_DATE_SIZE, START_TIME_SIZE, TRANSDUCER_TYPE_SIZE,
};

/// Buffer that appends left-justified, space padded header fields.
struct FieldWriter {
    buffer: Vec<u8>,
}

impl FieldWriter {
    fn with_capacity(capacity: usize) -> Self {
        FieldWriter { buffer: Vec::with_capacity(capacity) }
    }

    fn raw(&mut self, field: &'static str, width: usize, bytes: &[u8]) -> Result<()> {
        if bytes.len() > width {
            return Err(EdfError::FieldOverflow {
                field,
                width,
                value: String::from_utf8_lossy(bytes).into_owned(),
            });
        }
        self.buffer.extend_from_slice(bytes);
        self.buffer.resize(self.buffer.len() + width - bytes.len(), b' ');
        Ok(())
    }

    // 尾部的填充空格不算字段内容
    fn ascii(&mut self, field: &'static str, width: usize, value: &str) -> Result<()> {
        let text = to_ascii(value.trim_end());
        self.raw(field, width, text.as_bytes())
    }

    fn int<T: ToString>(&mut self, field: &'static str, width: usize, value: T) -> Result<()> {
        self.ascii(field, width, &value.to_string())
    }

    fn float(&mut self, field: &'static str, width: usize, value: f64) -> Result<()> {
        let text = format_float_field(field, value, width)?;
        self.ascii(field, width, &text)
    }

    fn bulk_ascii(&mut self, field: &'static str, width: usize, values: &[String]) -> Result<()> {
        values.iter().try_for_each(|v| self.ascii(field, width, v))
    }

    fn bulk_int<T: ToString + Copy>(&mut self, field: &'static str, width: usize, values: &[T]) -> Result<()> {
        values.iter().try_for_each(|&v| self.int(field, width, v))
    }

    fn bulk_float(&mut self, field: &'static str, width: usize, values: &[f64]) -> Result<()> {
        values.iter().try_for_each(|&v| self.float(field, width, v))
    }

    fn bulk_raw(&mut self, field: &'static str, width: usize, values: &[Vec<u8>]) -> Result<()> {
        values.iter().try_for_each(|v| self.raw(field, width, v))
    }
}

/// Serializes a header into exactly `bytes_in_header` bytes.
///
/// `bytes_in_header` is taken as given: it must be at least
/// `HEADER_SIZE_RECORDING_INFO + number_of_channels * HEADER_SIZE_PER_CHANNEL`,
/// a larger value pads the output with spaces.
///
/// # Errors
///
/// * [`EdfError::ArrayLengthMismatch`] - a per-channel array has the wrong length
/// * [`EdfError::HeaderCapacity`] - `bytes_in_header` is too small for the fields
/// * [`EdfError::FieldOverflow`] - a value does not fit its fixed width
///
/// # Examples
///
/// ```rust
/// use edfcodec::{encode_header, EdfError};
///
/// let mut header = edfcodec::doctest_utils::sample_header();
/// assert_eq!(encode_header(&header)?.len(), header.bytes_in_header);
///
/// header.id_code = "0123456789".to_string();
/// assert!(matches!(encode_header(&header), Err(EdfError::FieldOverflow { .. })));
/// # Ok::<(), edfcodec::EdfError>(())
/// ```
pub fn encode_header(header: &EdfHeader) -> Result<Vec<u8>> {
    header.check_channel_arrays()?;

    let required = EdfHeader::expected_header_size(header.number_of_channels);
    if header.bytes_in_header < required {
        return Err(EdfError::HeaderCapacity {
            declared: header.bytes_in_header,
            required,
        });
    }

    let mut w = FieldWriter::with_capacity(header.bytes_in_header);

    w.ascii("identification code", IDENTIFICATION_CODE_SIZE, &header.id_code)?;
    w.ascii("subject identification", LOCAL_SUBJECT_IDENTIFICATION_SIZE, &header.subject_id)?;
    w.ascii("recording identification", LOCAL_RECORDING_IDENTIFICATION_SIZE, &header.recording_id)?;
    w.ascii("start date", START_DATE_SIZE, &header.start_date)?;
    w.ascii("start time", START_TIME_SIZE, &header.start_time)?;
    w.int("bytes in header", HEADER_SIZE, header.bytes_in_header)?;
    w.ascii("format version", DATA_FORMAT_VERSION_SIZE, &header.format_version)?;
    w.int("number of data records", NUMBER_OF_DATA_RECORDS_SIZE, header.number_of_records)?;
    w.float("duration of data records", DURATION_DATA_RECORDS_SIZE, header.duration_of_records)?;
    w.int("number of channels", NUMBER_OF_CHANNELS_SIZE, header.number_of_channels)?;

    w.bulk_ascii("channel label", LABEL_OF_CHANNEL_SIZE, &header.channel_labels)?;
    w.bulk_ascii("transducer type", TRANSDUCER_TYPE_SIZE, &header.transducer_types)?;
    w.bulk_ascii("physical dimension", PHYSICAL_DIMENSION_OF_CHANNEL_SIZE, &header.dimensions)?;
    w.bulk_float("physical minimum", PHYSICAL_MIN_IN_UNITS_SIZE, &header.physical_min)?;
    w.bulk_float("physical maximum", PHYSICAL_MAX_IN_UNITS_SIZE, &header.physical_max)?;
    w.bulk_int("digital minimum", DIGITAL_MIN_SIZE, &header.digital_min)?;
    w.bulk_int("digital maximum", DIGITAL_MAX_SIZE, &header.digital_max)?;
    w.bulk_ascii("prefiltering", PREFILTERING_SIZE, &header.prefilterings)?;
    w.bulk_int("number of samples", NUMBER_OF_SAMPLES_SIZE, &header.number_of_samples)?;
    w.bulk_raw("reserved", RESERVED_SIZE, &header.reserveds)?;

    let mut bytes = w.buffer;
    bytes.resize(header.bytes_in_header, b' ');
    Ok(bytes)
}

/// Re-interleaves per-channel digital samples into data records.
///
/// Iterates records, then channels, then the samples of a channel within the
/// record: the exact inverse of [`crate::decode_signal`]. The result is
/// `number_of_records * sum(number_of_samples) * 2` bytes long.
///
/// # Errors
///
/// * [`EdfError::ArrayLengthMismatch`] - the signal has a different channel
///   count than the header, or a row is not `number_of_records * number_of_samples[c]` long
pub fn encode_signal(signal: &EdfSignal, header: &EdfHeader) -> Result<Vec<u8>> {
    header.check_channel_arrays()?;

    if signal.digital_values.len() != header.number_of_channels {
        return Err(EdfError::ArrayLengthMismatch {
            field: "digital values",
            expected: header.number_of_channels,
            actual: signal.digital_values.len(),
        });
    }
    for (c, row) in signal.digital_values.iter().enumerate() {
        let expected = header.channel_samples(c)?;
        if row.len() != expected {
            return Err(EdfError::ArrayLengthMismatch {
                field: "digital values",
                expected,
                actual: row.len(),
            });
        }
    }

    let mut bytes = Vec::with_capacity(header.data_size()?);
    for record in 0..header.number_of_records {
        for (row, &ns) in signal.digital_values.iter().zip(&header.number_of_samples) {
            for &value in &row[ns * record..ns * (record + 1)] {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
    }

    debug!("encoded {} records into {} bytes", header.number_of_records, bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctest_utils::{sample_header, sample_signal};
    use crate::reader::{decode_header, decode_signal};

    #[test]
    fn test_header_round_trip() {
        let header = sample_header();
        let bytes = encode_header(&header).unwrap();
        assert_eq!(bytes.len(), 256 * 3);

        let (decoded, consumed) = decode_header(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, header);
        // 解码后的字符串保留填充
        assert_eq!(decoded.channel_labels[0].len(), 16);
        assert_eq!(decoded.subject_id.len(), 80);
    }

    #[test]
    fn test_fixed_layout() {
        let bytes = encode_header(&sample_header()).unwrap();
        assert_eq!(&bytes[0..8], b"0       ");
        assert_eq!(&bytes[184..192], b"768     ");
        assert_eq!(&bytes[192..197], b"EDF+C");
        assert_eq!(&bytes[236..244], b"2       ");
        assert_eq!(&bytes[244..252], b"0.5     ");
        assert_eq!(&bytes[252..256], b"2   ");
    }

    #[test]
    fn test_id_code_overflow() {
        let mut header = sample_header();
        header.id_code = "0        X".to_string();
        assert!(matches!(
            encode_header(&header),
            Err(EdfError::FieldOverflow { field: "identification code", width: 8, .. })
        ));

        // 尾部空格不计入长度
        header.id_code = "0              ".to_string();
        assert!(encode_header(&header).is_ok());
    }

    #[test]
    fn test_numeric_overflow() {
        let mut header = sample_header();
        header.physical_max[0] = 123456789.0;
        assert!(matches!(
            encode_header(&header),
            Err(EdfError::FieldOverflow { field: "physical maximum", .. })
        ));
    }

    #[test]
    fn test_array_length_mismatch() {
        let mut header = sample_header();
        header.channel_labels.push("extra".to_string());
        assert!(matches!(
            encode_header(&header),
            Err(EdfError::ArrayLengthMismatch { field: "channel labels", expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_bytes_in_header_capacity() {
        let mut header = sample_header();
        header.bytes_in_header -= 1;
        assert!(matches!(
            encode_header(&header),
            Err(EdfError::HeaderCapacity { declared: 767, required: 768 })
        ));

        header.bytes_in_header = 1024;
        let bytes = encode_header(&header).unwrap();
        assert_eq!(bytes.len(), 1024);
        assert!(bytes[768..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn test_fractional_duration_survives() {
        let mut header = sample_header();
        header.duration_of_records = 0.00006;
        let (decoded, _) = decode_header(&encode_header(&header).unwrap()).unwrap();
        assert_eq!(decoded.duration_of_records, 0.00006);
    }

    #[test]
    fn test_signal_round_trip() {
        let header = sample_header();
        let signal = sample_signal().unwrap();
        let bytes = encode_signal(&signal, &header).unwrap();
        assert_eq!(bytes.len(), header.data_size().unwrap());
        assert_eq!(decode_signal(&bytes, &header).unwrap(), signal);
    }

    #[test]
    fn test_signal_row_mismatch() {
        let header = sample_header();
        let mut signal = sample_signal().unwrap();
        signal.digital_values[1].pop();
        assert!(matches!(
            encode_signal(&signal, &header),
            Err(EdfError::ArrayLengthMismatch { field: "digital values", expected: 4, actual: 3 })
        ));
    }
}
