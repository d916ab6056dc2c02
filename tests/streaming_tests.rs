use edfcodec::doctest_utils::sample_document_bytes;
use edfcodec::{ChannelHeader, EdfDocument, EdfError, EdfSignal, HeaderBuilder};
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

// 清理测试文件的辅助函数
fn cleanup_test_file(filename: &str) {
    if Path::new(filename).exists() {
        fs::remove_file(filename).ok();
    }
}

// 创建带注释通道的长记录
fn create_long_document(records: usize) -> EdfDocument {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();

    let header = HeaderBuilder::new()
        .start_of_recording(start)
        .duration_of_record(1.0)
        .number_of_records(records)
        .channel(
            ChannelHeader::new("Stream Signal", -100.0, 100.0, 256)
                .with_dimension("uV")
                .with_prefiltering("HP:0.1Hz LP:40Hz"),
        )
        .annotation_channel(8)
        .build()
        .unwrap();

    let signal_samples: Vec<i16> = (0..records * 256)
        .map(|i| ((i as f64 * 0.05).sin() * 30000.0) as i16)
        .collect();

    // 每个记录的时间保持注释
    let annotation_samples: Vec<i16> = (0..records)
        .flat_map(|r| {
            let mut tal = format!("+{}\x14\x14\x00", r).into_bytes();
            tal.resize(16, 0);
            tal.chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                .collect::<Vec<_>>()
        })
        .collect();

    let signal = EdfSignal::from_digital(&header, vec![signal_samples, annotation_samples]).unwrap();
    EdfDocument::new(header, signal).unwrap()
}

#[test]
fn test_write_and_read_through_file() {
    let filename = "test_streaming_long.edf";
    let document = create_long_document(60);
    assert_eq!(document.annotations().len(), 60);
    assert_eq!(document.header().number_of_channels, 1);

    document.save(filename).unwrap();
    assert_eq!(fs::metadata(filename).unwrap().len() as usize, 768 + 60 * (256 + 8) * 2);

    let reread = EdfDocument::read_from(BufReader::new(File::open(filename).unwrap())).unwrap();
    assert_eq!(reread, document);

    let onsets: Vec<f64> = reread.annotations().iter().map(|a| a.onset).collect();
    let expected: Vec<f64> = (0..60).map(|r| r as f64).collect();
    assert_eq!(onsets, expected);

    cleanup_test_file(filename);
}

#[test]
fn test_read_from_chained_stream() {
    // 头部与数据分别来自不同的源
    let bytes = sample_document_bytes().unwrap();
    let (head, body) = bytes.split_at(300);
    let reader = Cursor::new(head.to_vec()).chain(Cursor::new(body.to_vec()));

    let document = EdfDocument::read_from(reader).unwrap();
    assert_eq!(document.annotations().len(), 3);
}

#[test]
fn test_write_to_cursor() {
    let document = create_long_document(3);
    let mut cursor = Cursor::new(Vec::new());
    document.write_to(&mut cursor).unwrap();

    let bytes = cursor.into_inner();
    assert_eq!(bytes, document.encode().unwrap());
    assert_eq!(&bytes[192..197], b"EDF+C");
}

#[test]
fn test_truncated_stream() {
    let bytes = sample_document_bytes().unwrap();
    let reader = Cursor::new(&bytes[..bytes.len() / 2]);
    assert!(matches!(
        EdfDocument::read_from(reader),
        Err(EdfError::TruncatedInput { .. })
    ));
}
