use tls_dissect::{
    extract_records, is_tls_payload, split_records, ContentType, TlsError, TlsRecord, TLS12,
};

fn record(content_type: ContentType, payload: Vec<u8>) -> TlsRecord {
    TlsRecord::new(content_type, TLS12, payload)
}

#[test]
fn split_returns_complete_records_and_consumed_length() {
    // Two complete records (payloads of 5 and 10 bytes) followed by a
    // 3-byte prefix of a third.
    let first = record(ContentType::Handshake, vec![0x01; 5]);
    let second = record(ContentType::ApplicationData, vec![0x02; 10]);

    let mut stream = first.to_bytes();
    stream.extend_from_slice(&second.to_bytes());
    stream.extend_from_slice(&[0x17, 0x03, 0x03]);
    assert_eq!(stream.len(), 28);

    let (records, consumed) = split_records(&stream).unwrap();
    assert_eq!(records, vec![first, second]);
    assert_eq!(consumed, 25);
}

#[test]
fn split_round_trips_any_wellformed_sequence() {
    let records = vec![
        record(ContentType::ChangeCipherSpec, vec![0x01]),
        record(ContentType::Handshake, vec![0xaa; 100]),
        record(ContentType::ApplicationData, vec![0xbb; 1000]),
        record(ContentType::Alert, vec![0x02, 0x28]),
        record(ContentType::ApplicationData, Vec::new()),
    ];

    let stream: Vec<u8> = records.iter().flat_map(TlsRecord::to_bytes).collect();
    let (parsed, consumed) = split_records(&stream).unwrap();

    assert_eq!(parsed, records);
    assert_eq!(consumed, stream.len());
}

#[test]
fn split_on_prefix_stops_at_first_incomplete_record() {
    let records = vec![
        record(ContentType::Handshake, vec![0x01; 40]),
        record(ContentType::ApplicationData, vec![0x02; 60]),
    ];
    let stream: Vec<u8> = records.iter().flat_map(TlsRecord::to_bytes).collect();

    // Any prefix yields exactly the fully contained records, with the
    // consumed length pointing at the start of the first incomplete one.
    for cut in 0..stream.len() {
        let (parsed, consumed) = split_records(&stream[..cut]).unwrap();
        let expected = match cut {
            cut if cut >= stream.len() => 2,
            cut if cut >= 45 => 1,
            _ => 0,
        };
        assert_eq!(parsed.len(), expected, "prefix length {cut}");
        assert_eq!(consumed, [0, 45][expected], "prefix length {cut}");
    }
}

#[test]
fn split_rejects_oversized_length_without_reading_payload() {
    // Header alone: declared length 0x5000 > 2^14 + 2048.
    let header = [0x17, 0x03, 0x03, 0x50, 0x00];
    assert!(matches!(
        split_records(&header),
        Err(TlsError::BadLength(0x5000))
    ));
}

#[test]
fn split_rejects_unknown_content_type() {
    let stream = [0x18, 0x03, 0x03, 0x00, 0x01, 0x00];
    assert!(matches!(
        split_records(&stream),
        Err(TlsError::BadContentType(0x18))
    ));
}

#[test]
fn extract_reports_remainder_across_segments() {
    let full = record(ContentType::Handshake, vec![0x03; 50]);
    let bytes = full.to_bytes();
    let (head, tail) = bytes.split_at(20);

    // Record completed across two segments: no remainder.
    let extraction = extract_records(&[head.to_vec(), tail.to_vec()]).unwrap();
    assert_eq!(extraction.records, vec![full.clone()]);
    assert!(!extraction.has_remainder);

    // Tail missing: the partial record is left for the next call.
    let extraction = extract_records(&[head.to_vec()]).unwrap();
    assert!(extraction.records.is_empty());
    assert!(extraction.has_remainder);

    // A complete record followed by a dangling header.
    let mut payloads = vec![full.to_bytes()];
    payloads.push(vec![0x17, 0x03, 0x03]);
    let extraction = extract_records(&payloads).unwrap();
    assert_eq!(extraction.records.len(), 1);
    assert!(extraction.has_remainder);
}

#[test]
fn tls_payload_heuristic() {
    let hello = record(ContentType::Handshake, vec![0x01; 64]);
    assert!(is_tls_payload(&hello.to_bytes()));

    assert!(!is_tls_payload(b"220 smtp.example.com ESMTP\r\n"));
    assert!(!is_tls_payload(&[0x16, 0x03])); // too short
    assert!(!is_tls_payload(&[0x16, 0x05, 0x05, 0x00, 0x10])); // absurd version
    assert!(!is_tls_payload(&[0x16, 0x03, 0x03, 0x50, 0x00])); // absurd length
}
