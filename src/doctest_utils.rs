// Internal utilities for documentation tests
// This file contains fixtures shared by doctests and unit tests

use crate::{ChannelHeader, EdfDocument, EdfHeader, EdfSignal, Result};

/// A two-channel EDF+ header: "EEG Fp1" with 4 samples and "Resp" with 2
/// samples per record, 2 records of 0.5 seconds.
pub fn sample_header() -> EdfHeader {
    let mut header = EdfHeader {
        id_code: "0".to_string(),
        subject_id: "DOC001 M 01-JAN-1990 Test_Patient".to_string(),
        recording_id: "Startdate 02-MAR-2002 X X X".to_string(),
        start_date: "02.03.02".to_string(),
        start_time: "14.30.00".to_string(),
        bytes_in_header: EdfHeader::expected_header_size(0),
        format_version: "EDF+C".to_string(),
        number_of_records: 2,
        duration_of_records: 0.5,
        ..Default::default()
    };
    header.push_channel(
        ChannelHeader::new("EEG Fp1", -200.0, 200.0, 4)
            .with_transducer("AgAgCl cup electrodes")
            .with_dimension("uV")
            .with_prefiltering("HP:0.1Hz LP:70Hz"),
    );
    header.push_channel(
        ChannelHeader::new("Resp", -10.0, 10.0, 2)
            .with_transducer("Strain gauge")
            .with_digital_range(-2048, 2047),
    );
    header
}

/// Samples matching [`sample_header`].
pub fn sample_signal() -> Result<EdfSignal> {
    EdfSignal::from_digital(
        &sample_header(),
        vec![
            vec![0, 1024, -1024, 32767, -32768, 16, -16, 7],
            vec![2047, -2048, 100, -100],
        ],
    )
}

/// Packs TAL bytes into `slots` 16-bit samples, zero padded.
pub fn tal_samples(tal: &[u8], slots: usize) -> Vec<i16> {
    let mut bytes = tal.to_vec();
    bytes.resize(slots * 2, 0);
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// A complete EDF+ file image with an annotation channel between the two
/// channels of [`sample_header`]. It carries three annotations: the
/// time-keeping entries of both records and a 30 second "Seizure" at 0.25s.
pub fn sample_document_bytes() -> Result<Vec<u8>> {
    const SLOTS: usize = 16;

    let header = sample_header().with_channel(1, ChannelHeader::annotations(SLOTS));

    let mut annotation_samples = tal_samples(b"+0\x14\x14\x00+0.25\x1530\x14Seizure\x14\x00", SLOTS);
    annotation_samples.extend(tal_samples(b"+0.5\x14\x14\x00", SLOTS));

    let plain = sample_signal()?;
    let digital = vec![
        plain.digital_values[0].clone(),
        annotation_samples,
        plain.digital_values[1].clone(),
    ];

    let signal = EdfSignal::from_digital(&header, digital)?;
    EdfDocument::new(header, signal)?.encode()
}

/// Cleanup function to remove test files after doctests
pub fn cleanup_doctest_files() {
    let test_files = ["recording.edf", "copy.edf", "output.edf"];

    for file in &test_files {
        let _ = std::fs::remove_file(file);
    }
}
