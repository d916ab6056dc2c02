use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{EdfError, Result};
use crate::utils::{parse_int_field, trim_padding, with_inserted, without_index};
use crate::{EDF_PLUS_PREFIX, HEADER_SIZE_PER_CHANNEL, HEADER_SIZE_RECORDING_INFO};

/// Complete header of an EDF/EDF+ file.
///
/// String fields keep the padding they were decoded with. Two headers compare
/// equal when their string fields match after trimming, their numeric fields
/// match exactly and their reserved bytes match with trailing padding ignored.
#[derive(Debug, Clone, Default)]
pub struct EdfHeader {
    pub id_code: String,
    pub subject_id: String,
    pub recording_id: String,
    pub start_date: String,
    pub start_time: String,
    pub bytes_in_header: usize,
    pub format_version: String,
    pub number_of_records: usize,
    pub duration_of_records: f64,
    pub number_of_channels: usize,

    // 每个通道的字段，长度都必须等于 number_of_channels
    pub channel_labels: Vec<String>,
    pub transducer_types: Vec<String>,
    pub dimensions: Vec<String>,
    pub physical_min: Vec<f64>,
    pub physical_max: Vec<f64>,
    pub digital_min: Vec<i32>,
    pub digital_max: Vec<i32>,
    pub prefilterings: Vec<String>,
    pub number_of_samples: Vec<usize>,
    pub reserveds: Vec<Vec<u8>>,
}

/// One row of the per-channel header arrays.
///
/// Compares like [`EdfHeader`]: text fields trimmed, reserved bytes without
/// trailing padding.
#[derive(Debug, Clone)]
pub struct ChannelHeader {
    pub label: String,
    pub transducer_type: String,
    pub dimension: String,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: i32,
    pub digital_max: i32,
    pub prefiltering: String,
    pub number_of_samples: usize,
    pub reserved: Vec<u8>,
}

impl ChannelHeader {
    /// A 16-bit channel with the given label, calibration and rate.
    pub fn new(label: &str, physical_min: f64, physical_max: f64, number_of_samples: usize) -> Self {
        ChannelHeader {
            label: label.to_string(),
            transducer_type: String::new(),
            dimension: String::new(),
            physical_min,
            physical_max,
            digital_min: i16::MIN as i32,
            digital_max: i16::MAX as i32,
            prefiltering: String::new(),
            number_of_samples,
            reserved: Vec::new(),
        }
    }

    /// The `EDF Annotations` pseudo-channel carrying `number_of_samples` 2-byte slots.
    pub fn annotations(number_of_samples: usize) -> Self {
        ChannelHeader::new(crate::ANNOTATION_LABEL, -1.0, 1.0, number_of_samples)
    }

    pub fn with_transducer(mut self, transducer: &str) -> Self {
        self.transducer_type = transducer.to_string();
        self
    }

    pub fn with_dimension(mut self, dimension: &str) -> Self {
        self.dimension = dimension.to_string();
        self
    }

    pub fn with_prefiltering(mut self, prefiltering: &str) -> Self {
        self.prefiltering = prefiltering.to_string();
        self
    }

    pub fn with_digital_range(mut self, min: i32, max: i32) -> Self {
        self.digital_min = min;
        self.digital_max = max;
        self
    }
}

impl EdfHeader {
    /// Header size implied by a channel count.
    pub fn expected_header_size(number_of_channels: usize) -> usize {
        HEADER_SIZE_RECORDING_INFO + number_of_channels * HEADER_SIZE_PER_CHANNEL
    }

    /// Number of 16-bit values in one data record, all channels together.
    ///
    /// Fails with [`EdfError::NumericParseFailure`] when the declared counts
    /// do not fit in `usize`.
    pub fn samples_per_record(&self) -> Result<usize> {
        self.number_of_samples
            .iter()
            .try_fold(0usize, |total, &ns| total.checked_add(ns))
            .ok_or_else(|| self.size_overflow("number of samples"))
    }

    /// Samples of one channel over all records.
    pub fn channel_samples(&self, channel: usize) -> Result<usize> {
        let ns = self.number_of_samples.get(channel).copied().unwrap_or(0);
        self.number_of_records
            .checked_mul(ns)
            .ok_or_else(|| self.size_overflow("number of samples"))
    }

    /// Size of the data section implied by the header.
    pub fn data_size(&self) -> Result<usize> {
        self.samples_per_record()?
            .checked_mul(self.number_of_records)
            .and_then(|n| n.checked_mul(2))
            .ok_or_else(|| self.size_overflow("number of data records"))
    }

    // 头部中的计数来自不可信输入，乘积可能溢出
    fn size_overflow(&self, field: &'static str) -> EdfError {
        EdfError::NumericParseFailure {
            field,
            value: format!(
                "{} records x {} channels overflow the data size",
                self.number_of_records, self.number_of_channels
            ),
        }
    }

    /// True when the format version marks the file as EDF+.
    pub fn is_edf_plus(&self) -> bool {
        self.format_version.trim_start().starts_with(EDF_PLUS_PREFIX)
    }

    /// Trimmed label of a channel.
    pub fn label(&self, channel: usize) -> Option<&str> {
        self.channel_labels.get(channel).map(|l| l.trim())
    }

    /// Copies one row out of the per-channel arrays.
    pub fn channel(&self, channel: usize) -> Option<ChannelHeader> {
        if channel >= self.number_of_channels {
            return None;
        }
        Some(ChannelHeader {
            label: self.channel_labels.get(channel)?.clone(),
            transducer_type: self.transducer_types.get(channel)?.clone(),
            dimension: self.dimensions.get(channel)?.clone(),
            physical_min: *self.physical_min.get(channel)?,
            physical_max: *self.physical_max.get(channel)?,
            digital_min: *self.digital_min.get(channel)?,
            digital_max: *self.digital_max.get(channel)?,
            prefiltering: self.prefilterings.get(channel)?.clone(),
            number_of_samples: *self.number_of_samples.get(channel)?,
            reserved: self.reserveds.get(channel)?.clone(),
        })
    }

    /// Appends a channel and keeps `bytes_in_header` consistent.
    pub fn push_channel(&mut self, channel: ChannelHeader) {
        *self = self.with_channel(self.number_of_channels, channel);
    }

    /// Rebuilds the header without channel `index`.
    ///
    /// Every per-channel array loses the element at `index`, the remaining
    /// channels keep their relative order and `number_of_channels` and
    /// `bytes_in_header` shrink accordingly.
    pub fn without_channel(&self, index: usize) -> EdfHeader {
        if index >= self.number_of_channels {
            return self.clone();
        }
        EdfHeader {
            number_of_channels: self.number_of_channels - 1,
            bytes_in_header: self.bytes_in_header.saturating_sub(HEADER_SIZE_PER_CHANNEL),
            channel_labels: without_index(&self.channel_labels, index),
            transducer_types: without_index(&self.transducer_types, index),
            dimensions: without_index(&self.dimensions, index),
            physical_min: without_index(&self.physical_min, index),
            physical_max: without_index(&self.physical_max, index),
            digital_min: without_index(&self.digital_min, index),
            digital_max: without_index(&self.digital_max, index),
            prefilterings: without_index(&self.prefilterings, index),
            number_of_samples: without_index(&self.number_of_samples, index),
            reserveds: without_index(&self.reserveds, index),
            ..self.clone()
        }
    }

    /// Rebuilds the header with `channel` inserted at `index`.
    pub fn with_channel(&self, index: usize, channel: ChannelHeader) -> EdfHeader {
        EdfHeader {
            number_of_channels: self.number_of_channels + 1,
            bytes_in_header: Self::expected_header_size(self.number_of_channels + 1),
            channel_labels: with_inserted(&self.channel_labels, index, channel.label),
            transducer_types: with_inserted(&self.transducer_types, index, channel.transducer_type),
            dimensions: with_inserted(&self.dimensions, index, channel.dimension),
            physical_min: with_inserted(&self.physical_min, index, channel.physical_min),
            physical_max: with_inserted(&self.physical_max, index, channel.physical_max),
            digital_min: with_inserted(&self.digital_min, index, channel.digital_min),
            digital_max: with_inserted(&self.digital_max, index, channel.digital_max),
            prefilterings: with_inserted(&self.prefilterings, index, channel.prefiltering),
            number_of_samples: with_inserted(&self.number_of_samples, index, channel.number_of_samples),
            reserveds: with_inserted(&self.reserveds, index, channel.reserved),
            ..self.clone()
        }
    }

    /// Checks that every per-channel array has `number_of_channels` elements.
    pub fn check_channel_arrays(&self) -> Result<()> {
        let n = self.number_of_channels;
        let lengths = [
            ("channel labels", self.channel_labels.len()),
            ("transducer types", self.transducer_types.len()),
            ("physical dimensions", self.dimensions.len()),
            ("physical minimum", self.physical_min.len()),
            ("physical maximum", self.physical_max.len()),
            ("digital minimum", self.digital_min.len()),
            ("digital maximum", self.digital_max.len()),
            ("prefilterings", self.prefilterings.len()),
            ("number of samples", self.number_of_samples.len()),
            ("reserved", self.reserveds.len()),
        ];
        for (field, actual) in lengths {
            if actual != n {
                return Err(EdfError::ArrayLengthMismatch { field, expected: n, actual });
            }
        }
        Ok(())
    }

    /// Parses `start_date` ("dd.mm.yy") and `start_time` ("hh.mm.ss").
    ///
    /// Two-digit years follow the EDF clipping date: 85-99 are 19xx, 00-84 are 20xx.
    pub fn start_datetime(&self) -> Result<NaiveDateTime> {
        let date_parts: Vec<&str> = self.start_date.trim().split('.').collect();
        if date_parts.len() != 3 {
            return Err(EdfError::InvalidFormat(format!("Invalid start date {:?}", self.start_date)));
        }

        let day: u32 = parse_int_field("start date", date_parts[0])?;
        let month: u32 = parse_int_field("start date", date_parts[1])?;
        let year = {
            let yy: i32 = parse_int_field("start date", date_parts[2])?;
            if yy > 84 { 1900 + yy } else { 2000 + yy }
        };

        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| EdfError::InvalidFormat(format!("Invalid start date {:?}", self.start_date)))?;

        let time_parts: Vec<&str> = self.start_time.trim().split('.').collect();
        if time_parts.len() != 3 {
            return Err(EdfError::InvalidFormat(format!("Invalid start time {:?}", self.start_time)));
        }

        let hour: u32 = parse_int_field("start time", time_parts[0])?;
        let minute: u32 = parse_int_field("start time", time_parts[1])?;
        let second: u32 = parse_int_field("start time", time_parts[2])?;

        let time = NaiveTime::from_hms_opt(hour, minute, second)
            .ok_or_else(|| EdfError::InvalidFormat(format!("Invalid start time {:?}", self.start_time)))?;

        Ok(NaiveDateTime::new(date, time))
    }

    /// EDF+ 患者字段格式: "patientcode sex birthdate patientname additional_info"
    pub fn patient_info(&self) -> PatientInfo {
        let parts: Vec<&str> = self.subject_id.split_whitespace().collect();
        let part = |i: usize| parts.get(i).map(|s| s.to_string()).unwrap_or_default();

        PatientInfo {
            code: part(0),
            sex: part(1),
            birthdate: part(2),
            name: part(3),
            additional: parts.get(4..).map(|s| s.join(" ")).unwrap_or_default(),
        }
    }

    /// EDF+ 记录字段格式: "Startdate dd-MMM-yyyy admincode technician equipment additional_info"
    pub fn recording_info(&self) -> RecordingInfo {
        let parts: Vec<&str> = self.recording_id.split_whitespace().collect();
        let part = |i: usize| parts.get(i).map(|s| s.to_string()).unwrap_or_default();

        RecordingInfo {
            start_date: part(1),
            admin_code: part(2),
            technician: part(3),
            equipment: part(4),
            additional: parts.get(5..).map(|s| s.join(" ")).unwrap_or_default(),
        }
    }
}

fn same_text(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.trim() == y.trim())
}

impl PartialEq for ChannelHeader {
    fn eq(&self, other: &Self) -> bool {
        self.label.trim() == other.label.trim()
            && self.transducer_type.trim() == other.transducer_type.trim()
            && self.dimension.trim() == other.dimension.trim()
            && self.physical_min == other.physical_min
            && self.physical_max == other.physical_max
            && self.digital_min == other.digital_min
            && self.digital_max == other.digital_max
            && self.prefiltering.trim() == other.prefiltering.trim()
            && self.number_of_samples == other.number_of_samples
            && trim_padding(&self.reserved) == trim_padding(&other.reserved)
    }
}

impl PartialEq for EdfHeader {
    fn eq(&self, other: &Self) -> bool {
        self.id_code.trim() == other.id_code.trim()
            && self.subject_id.trim() == other.subject_id.trim()
            && self.recording_id.trim() == other.recording_id.trim()
            && self.start_date.trim() == other.start_date.trim()
            && self.start_time.trim() == other.start_time.trim()
            && self.bytes_in_header == other.bytes_in_header
            && self.format_version.trim() == other.format_version.trim()
            && self.number_of_records == other.number_of_records
            && self.duration_of_records == other.duration_of_records
            && self.number_of_channels == other.number_of_channels
            && same_text(&self.channel_labels, &other.channel_labels)
            && same_text(&self.transducer_types, &other.transducer_types)
            && same_text(&self.dimensions, &other.dimensions)
            && self.physical_min == other.physical_min
            && self.physical_max == other.physical_max
            && self.digital_min == other.digital_min
            && self.digital_max == other.digital_max
            && same_text(&self.prefilterings, &other.prefilterings)
            && self.number_of_samples == other.number_of_samples
            && self.reserveds.len() == other.reserveds.len()
            && self
                .reserveds
                .iter()
                .zip(&other.reserveds)
                .all(|(x, y)| trim_padding(x) == trim_padding(y))
    }
}

/// EDF+ 患者字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientInfo {
    pub code: String,
    pub sex: String,
    pub birthdate: String,
    pub name: String,
    pub additional: String,
}

/// EDF+ 记录字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingInfo {
    pub start_date: String,
    pub admin_code: String,
    pub technician: String,
    pub equipment: String,
    pub additional: String,
}

/// Decoded sample data, one row per channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdfSignal {
    /// Physical units per digital step, `(phys_max - phys_min) / (dig_max - dig_min)`.
    pub units_in_digit: Vec<f64>,
    /// Raw samples, `number_of_records * number_of_samples[c]` per channel.
    pub digital_values: Vec<Vec<i16>>,
    /// `digital_values[c][s] * units_in_digit[c]`.
    pub values_in_units: Vec<Vec<f64>>,
}

/// 计算物理值转换参数
pub(crate) fn units_in_digit(header: &EdfHeader, channel: usize) -> Result<f64> {
    let digital_range = header.digital_max[channel] - header.digital_min[channel];
    if digital_range == 0 {
        return Err(EdfError::DigitalMinEqualsMax { channel });
    }
    Ok((header.physical_max[channel] - header.physical_min[channel]) / digital_range as f64)
}

impl EdfSignal {
    /// Builds a signal from digital samples, deriving scale and physical values.
    ///
    /// Each row must hold exactly `number_of_records * number_of_samples[c]` values.
    pub fn from_digital(header: &EdfHeader, digital_values: Vec<Vec<i16>>) -> Result<Self> {
        header.check_channel_arrays()?;
        if digital_values.len() != header.number_of_channels {
            return Err(EdfError::ArrayLengthMismatch {
                field: "digital values",
                expected: header.number_of_channels,
                actual: digital_values.len(),
            });
        }

        let mut units = Vec::with_capacity(header.number_of_channels);
        let mut physical = Vec::with_capacity(header.number_of_channels);
        for (c, row) in digital_values.iter().enumerate() {
            let expected = header.channel_samples(c)?;
            if row.len() != expected {
                return Err(EdfError::ArrayLengthMismatch {
                    field: "digital values",
                    expected,
                    actual: row.len(),
                });
            }
            let scale = units_in_digit(header, c)?;
            units.push(scale);
            physical.push(row.iter().map(|&d| d as f64 * scale).collect());
        }

        Ok(EdfSignal {
            units_in_digit: units,
            digital_values,
            values_in_units: physical,
        })
    }

    pub fn number_of_channels(&self) -> usize {
        self.digital_values.len()
    }

    /// Rebuilds the signal without channel `index`.
    pub fn without_channel(&self, index: usize) -> EdfSignal {
        EdfSignal {
            units_in_digit: without_index(&self.units_in_digit, index),
            digital_values: without_index(&self.digital_values, index),
            values_in_units: without_index(&self.values_in_units, index),
        }
    }

    /// Rebuilds the signal with a channel inserted at `index`.
    pub(crate) fn with_channel(&self, index: usize, units_in_digit: f64, digital: Vec<i16>) -> EdfSignal {
        let physical = digital.iter().map(|&d| d as f64 * units_in_digit).collect();
        EdfSignal {
            units_in_digit: with_inserted(&self.units_in_digit, index, units_in_digit),
            digital_values: with_inserted(&self.digital_values, index, digital),
            values_in_units: with_inserted(&self.values_in_units, index, physical),
        }
    }
}

/// One TAL entry: onset and duration in seconds plus its texts.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Seconds relative to the start of the recording.
    pub onset: f64,
    /// Seconds, `0.0` when the record carries no duration.
    pub duration: f64,
    /// Non-blank texts in record order.
    pub texts: Vec<String>,
}
