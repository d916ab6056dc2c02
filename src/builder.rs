use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{EdfError, Result};
use crate::types::{ChannelHeader, EdfHeader};

/// Fluent construction of a consistent [`EdfHeader`].
///
/// Patient and recording sub-fields follow the EDF+ conventions: spaces
/// inside a sub-field become `_` and unknown sub-fields are written as `X`.
/// `bytes_in_header` and `number_of_channels` are derived from the channels.
///
/// # Examples
///
/// ```rust
/// use chrono::NaiveDate;
/// use edfcodec::{ChannelHeader, HeaderBuilder};
///
/// let start = NaiveDate::from_ymd_opt(2002, 3, 2)
///     .and_then(|d| d.and_hms_opt(14, 30, 0))
///     .unwrap();
///
/// let header = HeaderBuilder::new()
///     .start_of_recording(start)
///     .duration_of_record(1.0)
///     .number_of_records(60)
///     .patient_code("MCH-0234567")
///     .patient_name("Haagse Harry")
///     .channel(ChannelHeader::new("EEG Fp1", -200.0, 200.0, 256).with_dimension("uV"))
///     .annotation_channel(60)
///     .build()?;
///
/// assert_eq!(header.start_date, "02.03.02");
/// assert_eq!(header.start_time, "14.30.00");
/// assert_eq!(header.subject_id, "MCH-0234567 X X Haagse_Harry");
/// assert_eq!(header.recording_id, "Startdate 02-MAR-2002 X X X");
/// assert_eq!(header.bytes_in_header, 256 * 3);
/// # Ok::<(), edfcodec::EdfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HeaderBuilder {
    start: Option<NaiveDateTime>,
    duration_of_record: Option<f64>,
    number_of_records: usize,
    format_version: String,

    // EDF+ 字段
    patient_code: String,
    patient_sex: String,
    patient_birthdate: String,
    patient_name: String,
    recording_hospital: String,
    recording_technician: String,
    recording_equipment: String,

    channels: Vec<ChannelHeader>,
}

impl Default for HeaderBuilder {
    fn default() -> Self {
        HeaderBuilder {
            start: None,
            duration_of_record: None,
            number_of_records: 1,
            format_version: "EDF+C".to_string(),
            patient_code: "X".to_string(),
            patient_sex: "X".to_string(),
            patient_birthdate: "X".to_string(),
            patient_name: "X".to_string(),
            recording_hospital: "X".to_string(),
            recording_technician: "X".to_string(),
            recording_equipment: "X".to_string(),
            channels: Vec::new(),
        }
    }
}

fn non_space(value: &str) -> String {
    value.trim().replace(' ', "_")
}

fn edf_plus_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string().to_uppercase()
}

impl HeaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_of_recording(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Duration of one data record in seconds.
    pub fn duration_of_record(mut self, seconds: f64) -> Self {
        self.duration_of_record = Some(seconds);
        self
    }

    pub fn number_of_records(mut self, records: usize) -> Self {
        self.number_of_records = records;
        self
    }

    /// Overrides the default `EDF+C` version field, e.g. `EDF+D` or empty for plain EDF.
    pub fn format_version(mut self, version: &str) -> Self {
        self.format_version = version.to_string();
        self
    }

    pub fn patient_code(mut self, code: &str) -> Self {
        self.patient_code = non_space(code);
        self
    }

    pub fn patient_is_male(mut self, male: bool) -> Self {
        self.patient_sex = if male { "M" } else { "F" }.to_string();
        self
    }

    pub fn patient_birthdate(mut self, birthdate: NaiveDate) -> Self {
        self.patient_birthdate = edf_plus_date(birthdate);
        self
    }

    pub fn patient_name(mut self, name: &str) -> Self {
        self.patient_name = non_space(name);
        self
    }

    pub fn recording_hospital(mut self, hospital: &str) -> Self {
        self.recording_hospital = non_space(hospital);
        self
    }

    pub fn recording_technician(mut self, technician: &str) -> Self {
        self.recording_technician = non_space(technician);
        self
    }

    pub fn recording_equipment(mut self, equipment: &str) -> Self {
        self.recording_equipment = non_space(equipment);
        self
    }

    pub fn channel(mut self, channel: ChannelHeader) -> Self {
        self.channels.push(channel);
        self
    }

    /// Appends an `EDF Annotations` channel with `samples` 2-byte slots per record.
    pub fn annotation_channel(self, samples: usize) -> Self {
        self.channel(ChannelHeader::annotations(samples))
    }

    /// Validates the collected values and assembles the header.
    ///
    /// # Errors
    ///
    /// * [`EdfError::InvalidFormat`] - no start, a non-positive record
    ///   duration, no channels or a channel without samples
    /// * [`EdfError::DigitalMinEqualsMax`] - a channel has a zero digital range
    pub fn build(self) -> Result<EdfHeader> {
        let start = self
            .start
            .ok_or_else(|| EdfError::InvalidFormat("Start of recording is not set".to_string()))?;

        let duration = match self.duration_of_record {
            Some(d) if d > 0.0 && d.is_finite() => d,
            Some(d) => {
                return Err(EdfError::InvalidFormat(format!(
                    "Duration of a data record must be positive, got {}",
                    d
                )))
            }
            None => return Err(EdfError::InvalidFormat("Duration of a data record is not set".to_string())),
        };

        if self.channels.is_empty() {
            return Err(EdfError::InvalidFormat("At least one channel is required".to_string()));
        }
        for (channel, c) in self.channels.iter().enumerate() {
            if c.number_of_samples == 0 {
                return Err(EdfError::InvalidFormat(format!(
                    "Channel {} ({}) has no samples per record",
                    channel,
                    c.label.trim()
                )));
            }
            if c.digital_min == c.digital_max {
                return Err(EdfError::DigitalMinEqualsMax { channel });
            }
        }

        let subject_id = format!(
            "{} {} {} {}",
            self.patient_code, self.patient_sex, self.patient_birthdate, self.patient_name
        );
        let recording_id = format!(
            "Startdate {} {} {} {}",
            edf_plus_date(start.date()),
            self.recording_hospital,
            self.recording_technician,
            self.recording_equipment
        );

        let mut header = EdfHeader {
            id_code: "0".to_string(),
            subject_id,
            recording_id,
            start_date: start.format("%d.%m.%y").to_string(),
            start_time: start.format("%H.%M.%S").to_string(),
            bytes_in_header: EdfHeader::expected_header_size(0),
            format_version: self.format_version,
            number_of_records: self.number_of_records,
            duration_of_records: duration,
            ..Default::default()
        };
        for channel in self.channels {
            header.push_channel(channel);
        }

        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::decode_header;
    use crate::writer::encode_header;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 11, 7)
            .and_then(|d| d.and_hms_opt(8, 5, 9))
            .unwrap()
    }

    #[test]
    fn test_build_annotation_file_header() {
        let header = HeaderBuilder::new()
            .start_of_recording(start())
            .duration_of_record(1000.0)
            .annotation_channel(100)
            .patient_code("1234")
            .patient_is_male(true)
            .patient_birthdate(NaiveDate::from_ymd_opt(1951, 5, 2).unwrap())
            .patient_name("The patient")
            .recording_hospital("Hosp.")
            .recording_technician("Techn.")
            .recording_equipment("Equ.")
            .build()
            .unwrap();

        assert_eq!(header.id_code, "0");
        assert_eq!(header.subject_id, "1234 M 02-MAY-1951 The_patient");
        assert_eq!(header.recording_id, "Startdate 07-NOV-2023 Hosp. Techn. Equ.");
        assert_eq!(header.start_date, "07.11.23");
        assert_eq!(header.start_time, "08.05.09");
        assert_eq!(header.format_version, "EDF+C");
        assert_eq!(header.number_of_records, 1);
        assert_eq!(header.number_of_channels, 1);
        assert_eq!(header.bytes_in_header, 512);
        assert_eq!(header.label(0), Some("EDF Annotations"));
        assert_eq!(header.start_datetime().unwrap(), start());
    }

    #[test]
    fn test_built_header_round_trips() {
        let header = HeaderBuilder::new()
            .start_of_recording(start())
            .duration_of_record(0.1)
            .number_of_records(30)
            .channel(
                ChannelHeader::new("ECG Lead II", -5.0, 5.0, 25)
                    .with_dimension("mV")
                    .with_transducer("Chest electrodes")
                    .with_prefiltering("HP:0.1Hz LP:100Hz"),
            )
            .annotation_channel(30)
            .build()
            .unwrap();

        let (decoded, consumed) = decode_header(&encode_header(&header).unwrap()).unwrap();
        assert_eq!(consumed, header.bytes_in_header);
        assert_eq!(decoded, header);
        assert_eq!(decoded.patient_info().code, "X");
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            HeaderBuilder::new().duration_of_record(1.0).annotation_channel(10).build(),
            Err(EdfError::InvalidFormat(_))
        ));
        assert!(matches!(
            HeaderBuilder::new().start_of_recording(start()).annotation_channel(10).build(),
            Err(EdfError::InvalidFormat(_))
        ));
        assert!(matches!(
            HeaderBuilder::new().start_of_recording(start()).duration_of_record(0.0).build(),
            Err(EdfError::InvalidFormat(_))
        ));
        assert!(matches!(
            HeaderBuilder::new().start_of_recording(start()).duration_of_record(1.0).build(),
            Err(EdfError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_invalid_channels() {
        let base = HeaderBuilder::new().start_of_recording(start()).duration_of_record(1.0);
        assert!(matches!(
            base.clone().channel(ChannelHeader::new("EEG", -1.0, 1.0, 0)).build(),
            Err(EdfError::InvalidFormat(_))
        ));
        assert!(matches!(
            base.channel(ChannelHeader::new("EEG", -1.0, 1.0, 8).with_digital_range(5, 5)).build(),
            Err(EdfError::DigitalMinEqualsMax { channel: 0 })
        ));
    }
}
