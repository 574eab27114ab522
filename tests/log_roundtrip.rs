//! Write/read round-trip tests.
//!
//! Everything written through `LogWriter` and closed must come back from
//! `LogReader::records()` unchanged and in order, whatever the container
//! boundaries, compression or file growth.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rekorder::{
    log_path, CompressionLevel, DaqRecord, FileHeader, LogReader, LogWriter, WriterOptions,
};
use std::path::Path;
use tempfile::TempDir;

fn options(threshold: usize) -> WriterOptions {
    WriterOptions::builder()
        .chunk_threshold(threshold)
        .build()
        .unwrap()
}

fn write_all(path: &Path, opts: WriterOptions, records: &[DaqRecord]) -> FileHeader {
    let mut writer = LogWriter::create(path, opts).unwrap();
    for record in records {
        writer.append(record).unwrap();
    }
    writer.close().unwrap();
    *writer.header()
}

fn read_all(path: &Path) -> Vec<DaqRecord> {
    LogReader::open(path)
        .unwrap()
        .records()
        .collect::<rekorder::Result<_>>()
        .unwrap()
}

fn sample_records(n: u16, payload_len: usize) -> Vec<DaqRecord> {
    (0..n)
        .map(|i| {
            DaqRecord::new(
                (i % 3) as u8 + 1,
                i,
                i as f64 * 0.001,
                vec![(i % 251) as u8; payload_len],
            )
        })
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn test_three_records_one_container() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("three.xmraw");
        let records = vec![
            DaqRecord::new(1, 100, 0.0, b"AB".to_vec()),
            DaqRecord::new(1, 101, 0.01, Vec::new()),
            DaqRecord::new(2, 102, 0.02, b"XYZ".to_vec()),
        ];

        write_all(&path, WriterOptions::default(), &records);

        let reader = LogReader::open(&path).unwrap();
        assert_eq!(reader.header().num_containers, 1);
        assert_eq!(reader.header().record_count, 3);
        assert_eq!(reader.header().size_uncompressed, 3 * 15 + 5);

        let decoded: Vec<_> = reader.records().collect::<rekorder::Result<_>>().unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_empty_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.xmraw");
        write_all(&path, WriterOptions::default(), &[]);

        let reader = LogReader::open(&path).unwrap();
        assert_eq!(reader.file_len(), 48);
        assert_eq!(reader.header().num_containers, 0);
        assert_eq!(reader.compression_ratio(), None);
        assert_eq!(reader.records().count(), 0);
        assert_eq!(reader.containers().count(), 0);
    }

    #[test]
    fn test_log_path_extension() {
        let dir = TempDir::new().unwrap();
        let path = log_path(dir.path().join("session"));
        assert_eq!(path.extension().unwrap(), "xmraw");

        write_all(&path, WriterOptions::default(), &sample_records(5, 4));
        assert_eq!(read_all(&path).len(), 5);
    }

    #[test]
    fn test_many_containers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("many.xmraw");
        let records = sample_records(1_000, 40);

        let header = write_all(&path, options(1_000), &records);

        assert!(header.num_containers > 40);
        assert_eq!(header.record_count, 1_000);
        assert_eq!(read_all(&path), records);
    }
}

// ============================================================================
// Header integrity
// ============================================================================

mod header_integrity {
    use super::*;

    #[test]
    fn test_totals_match_containers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("totals.xmraw");
        write_all(&path, options(2_000), &sample_records(500, 30));

        let reader = LogReader::open(&path).unwrap();
        let containers: Vec<_> = reader
            .containers()
            .collect::<rekorder::Result<_>>()
            .unwrap();
        let header = reader.header();

        assert_eq!(containers.len() as u32, header.num_containers);
        assert_eq!(
            containers.iter().map(|c| c.record_count).sum::<u32>(),
            header.record_count
        );
        assert_eq!(
            containers.iter().map(|c| c.size_compressed).sum::<u32>(),
            header.size_compressed
        );
        assert_eq!(
            containers.iter().map(|c| c.size_uncompressed).sum::<u32>(),
            header.size_uncompressed
        );
        assert!(header.size_compressed <= header.size_uncompressed);

        // The last container ends exactly at end of file.
        let last = containers.last().unwrap();
        assert_eq!(
            last.payload_offset() + last.size_compressed as u64,
            reader.file_len()
        );
    }

    #[test]
    fn test_written_header_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bytes.xmraw");
        write_all(&path, WriterOptions::default(), &sample_records(3, 2));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..16], b"ASAMINT::XCP_RAW");
        assert_eq!(&bytes[16..18], &[48, 0]);
        assert_eq!(&bytes[18..20], &[0x00, 0x01]);
        assert_eq!(&bytes[20..22], &[0, 0]);
        assert_eq!(&bytes[22..26], &[1, 0, 0, 0]);
        assert_eq!(&bytes[26..30], &[3, 0, 0, 0]);
        assert!(bytes[38..48].iter().all(|&b| b == 0xCC));
    }

    #[test]
    fn test_compression_ratio_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ratio.xmraw");
        write_all(&path, WriterOptions::default(), &sample_records(200, 64));

        let reader = LogReader::open(&path).unwrap();
        let header = reader.header();
        let expected = header.size_uncompressed as f64 / header.size_compressed as f64;
        assert_eq!(reader.compression_ratio(), Some(expected));
        assert!(expected > 1.0);
    }

    #[test]
    fn test_writer_ratio_tracks_containers() {
        let dir = TempDir::new().unwrap();
        let mut writer = LogWriter::create(dir.path().join("w.xmraw"), options(500)).unwrap();
        assert_eq!(writer.compression_ratio(), None);

        for record in sample_records(50, 20) {
            writer.append(&record).unwrap();
        }
        assert!(writer.compression_ratio().is_some());
        writer.close().unwrap();
    }
}

// ============================================================================
// Storage growth
// ============================================================================

mod growth {
    use super::*;

    #[test]
    fn test_growth_past_preallocation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grow.xmraw");
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);

        // Random payloads do not compress, so the file must grow well past
        // the initial 4 KiB.
        let records: Vec<_> = (0..2_000u16)
            .map(|i| {
                let payload: Vec<u8> = (0..rng.gen_range(0..300)).map(|_| rng.gen()).collect();
                DaqRecord::daq(i, i as f64, payload)
            })
            .collect();

        let opts = WriterOptions::builder()
            .preallocation_size(4096)
            .chunk_threshold(16 * 1024)
            .build()
            .unwrap();
        write_all(&path, opts, &records);

        let reader = LogReader::open(&path).unwrap();
        assert!(reader.file_len() > 4096 * 8);
        reader.verify().unwrap();
        assert_eq!(read_all(&path), records);
    }

    #[test]
    fn test_preallocation_smaller_than_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.xmraw");
        let opts = WriterOptions::builder()
            .preallocation_size(1)
            .build()
            .unwrap();

        let records = sample_records(10, 10);
        write_all(&path, opts, &records);
        assert_eq!(read_all(&path), records);
    }

    #[test]
    fn test_single_record_larger_than_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.xmraw");
        let records = vec![
            DaqRecord::daq(1, 0.0, vec![1u8; 10]),
            DaqRecord::daq(2, 1.0, vec![2u8; 100_000]),
            DaqRecord::daq(3, 2.0, vec![3u8; 10]),
        ];

        let header = write_all(&path, options(1_000), &records);
        assert_eq!(header.num_containers, 2);
        assert_eq!(read_all(&path), records);
    }
}

// ============================================================================
// Compression settings
// ============================================================================

mod compression {
    use super::*;

    #[test]
    fn test_zstd_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zstd.xmraw");
        let records = sample_records(300, 50);

        let opts = WriterOptions::builder()
            .zstd()
            .chunk_threshold(4_000)
            .build()
            .unwrap();
        write_all(&path, opts, &records);

        let reader = LogReader::open(&path).unwrap();
        assert!(reader.header().is_zstd());
        assert_eq!(reader.header().options, 0x0001);
        assert_eq!(read_all(&path), records);
    }

    #[test]
    fn test_every_level_round_trips() {
        let dir = TempDir::new().unwrap();
        let records = sample_records(100, 30);

        for level in CompressionLevel::MIN..=CompressionLevel::MAX {
            let path = dir.path().join(format!("level{}.xmraw", level));
            let opts = WriterOptions::builder()
                .compression_level(level)
                .build()
                .unwrap();
            write_all(&path, opts, &records);
            assert_eq!(read_all(&path), records, "level {}", level);
        }
    }

    #[test]
    fn test_flush_on_close_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("onclose.xmraw");
        let records = sample_records(100, 30);

        let opts = WriterOptions::builder()
            .chunk_threshold(500)
            .flush_on_close()
            .build()
            .unwrap();
        write_all(&path, opts, &records);
        assert_eq!(read_all(&path), records);
    }
}

// ============================================================================
// Chunking independence
// ============================================================================

fn arb_record() -> impl Strategy<Value = DaqRecord> {
    (
        any::<u8>(),
        any::<u16>(),
        any::<f64>().prop_filter("NaN never compares equal", |t| !t.is_nan()),
        proptest::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(category, counter, timestamp, payload)| {
            DaqRecord::new(category, counter, timestamp, payload)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_records_independent_of_chunking(
        records in proptest::collection::vec(arb_record(), 0..200),
        threshold in 1usize..2_048,
    ) {
        let dir = TempDir::new().unwrap();
        let chunked = dir.path().join("chunked.xmraw");
        let single = dir.path().join("single.xmraw");

        let chunked_header = write_all(&chunked, options(threshold), &records);
        let single_header = write_all(&single, WriterOptions::default(), &records);

        prop_assert_eq!(chunked_header.record_count, records.len() as u32);
        prop_assert_eq!(single_header.record_count, records.len() as u32);
        prop_assert!(single_header.num_containers <= 1);
        prop_assert!(chunked_header.num_containers >= single_header.num_containers);
        prop_assert_eq!(chunked_header.size_uncompressed, single_header.size_uncompressed);

        prop_assert_eq!(read_all(&chunked), records.clone());
        prop_assert_eq!(read_all(&single), records);
    }
}
