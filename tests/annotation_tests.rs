use edfcodec::doctest_utils::{sample_document_bytes, sample_header, sample_signal, tal_samples};
use edfcodec::{
    decode_document, decode_header, parse_annotations, ChannelHeader, EdfDocument, EdfError,
    EdfSignal, TalScanner,
};

#[test]
fn test_single_timekeeping_tal() {
    let annotations = parse_annotations(b"+1800\x14\x14\x00").unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].onset, 1800.0);
    assert_eq!(annotations[0].duration, 0.0);
    assert!(annotations[0].texts.is_empty());
}

#[test]
fn test_tal_with_duration_and_text() {
    let annotations = parse_annotations(b"+180\x1530\x14Seizure\x14\x14\x00").unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].onset, 180.0);
    assert_eq!(annotations[0].duration, 30.0);
    assert_eq!(annotations[0].texts, vec!["Seizure".to_string()]);
}

#[test]
fn test_utf8_text() {
    let annotations = parse_annotations("+2.5\u{14}Schlafstadium Wach\u{14}Ärger\u{14}\u{0}".as_bytes()).unwrap();
    assert_eq!(
        annotations[0].texts,
        vec!["Schlafstadium Wach".to_string(), "Ärger".to_string()]
    );
}

#[test]
fn test_annotation_channel_removed_in_order() {
    let bytes = sample_document_bytes().unwrap();
    let (original, _) = decode_header(&bytes).unwrap();
    let document = decode_document(&bytes).unwrap();
    let header = document.header();

    assert_eq!(header.number_of_channels, original.number_of_channels - 1);
    assert!(header.check_channel_arrays().is_ok());
    assert_eq!(header.channel_labels.len(), 2);
    assert_eq!(header.reserveds.len(), 2);
    assert_eq!(header.label(0), original.label(0));
    assert_eq!(header.label(1), original.label(2));
    assert_eq!(header.number_of_samples, vec![original.number_of_samples[0], original.number_of_samples[2]]);

    let signal = document.signal();
    assert_eq!(signal.units_in_digit.len(), 2);
    assert_eq!(signal.values_in_units.len(), 2);
    assert_eq!(signal.digital_values, sample_signal().unwrap().digital_values);
}

#[test]
fn test_document_annotations() {
    let document = decode_document(&sample_document_bytes().unwrap()).unwrap();
    let onsets: Vec<f64> = document.annotations().iter().map(|a| a.onset).collect();
    assert_eq!(onsets, vec![0.0, 0.25, 0.5]);

    let seizure = &document.annotations()[1];
    assert_eq!(seizure.duration, 30.0);
    assert_eq!(seizure.texts, vec!["Seizure".to_string()]);
}

#[test]
fn test_annotation_channel_written_back_verbatim() {
    let bytes = sample_document_bytes().unwrap();
    let document = decode_document(&bytes).unwrap();
    let encoded = document.encode().unwrap();
    assert_eq!(encoded, bytes);

    let again = decode_document(&encoded).unwrap();
    assert_eq!(again.annotations(), document.annotations());
}

#[test]
fn test_first_annotation_channel_only() {
    let mut header = sample_header();
    header.push_channel(ChannelHeader::annotations(8));
    header.push_channel(ChannelHeader::annotations(8));

    let mut digital = sample_signal().unwrap().digital_values;
    let mut first = tal_samples(b"+0\x14First\x14\x00", 8);
    first.extend(tal_samples(b"+0.5\x14\x14\x00", 8));
    let mut second = tal_samples(b"+0.1\x14Second\x14\x00", 8);
    second.extend(tal_samples(b"", 8));
    digital.push(first);
    digital.push(second);

    let signal = EdfSignal::from_digital(&header, digital).unwrap();
    let document = EdfDocument::new(header, signal).unwrap();

    assert_eq!(document.header().number_of_channels, 3);
    assert_eq!(document.header().label(2), Some("EDF Annotations"));
    assert_eq!(document.annotations().len(), 2);
    assert_eq!(document.annotations()[0].texts, vec!["First".to_string()]);
}

#[test]
fn test_malformed_annotation_channel() {
    let header = sample_header().with_channel(0, ChannelHeader::annotations(4));
    let mut digital = vec![tal_samples(b"+x\x14\x14\x00", 4)];
    digital[0].extend(tal_samples(b"+1\x14\x14\x00", 4));
    digital.extend(sample_signal().unwrap().digital_values);

    let signal = EdfSignal::from_digital(&header, digital).unwrap();
    assert!(matches!(
        EdfDocument::new(header, signal),
        Err(EdfError::MalformedAnnotation(_))
    ));
}

#[test]
fn test_scanner_yields_in_stream_order() {
    let bytes = b"+5\x14Late\x14\x00\x00\x00+1\x14Early\x14\x00";
    let texts: Vec<String> = TalScanner::new(bytes)
        .map(|a| a.unwrap().texts.join(","))
        .collect();
    assert_eq!(texts, vec!["Late".to_string(), "Early".to_string()]);
}
