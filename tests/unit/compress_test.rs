//! Block-compressed index output

use super::helpers::*;
use cdxj_indexer::output::{CompressingWriter, SortingWriter};
use cdxj_indexer::{Indexer, IndexerOptions, Input};
use flate2::read::GzDecoder;
use serde_json::Value;
use std::io::{Cursor, Read};

fn many_resources(count: usize) -> Warc {
    (0..count).fold(Warc::gzipped(), |warc, i| {
        warc.push(Record::new("resource", &format!("http://example.com/page/{:02}", i)).block("x"))
    })
}

/// Run the indexer into a sorted, compressing sink; returns (index, data).
fn compress(warc: &Warc, block_lines: usize) -> (String, Vec<u8>) {
    let options = IndexerOptions {
        lines: block_lines,
        ..IndexerOptions::default()
    };
    let mut indexer = Indexer::new(options).unwrap();
    let writer = CompressingWriter::new(Vec::new(), Vec::new(), "out.cdxj.gz", block_lines);
    let mut sink = SortingWriter::new(writer);
    let input = Input::reader("a.warc.gz", Cursor::new(warc.bytes().to_vec()));
    indexer.run(vec![input], &mut sink).unwrap();

    let (index, data) = sink.into_inner().into_parts();
    (String::from_utf8(index).unwrap(), data)
}

#[test]
fn sidecar_starts_with_meta_header() {
    let (index, _) = compress(&many_resources(3), 2);
    assert_eq!(
        index.lines().next().unwrap(),
        "!meta 0 {\"format\": \"cdxj-gzip-1.0\", \"filename\": \"out.cdxj.gz\"}"
    );
}

#[test]
fn every_block_decompresses_on_its_own() {
    let warc = many_resources(7);
    let (plain, _) = index_warc(IndexerOptions::default(), &warc, "a.warc.gz");
    let expected: Vec<&str> = plain.lines().collect();

    let (index, data) = compress(&warc, 3);
    let blocks: Vec<&str> = index.lines().skip(1).collect();
    assert_eq!(blocks.len(), 3);

    let mut recovered = Vec::new();
    for (i, line) in blocks.iter().enumerate() {
        let (prefix, json) = line.split_at(line.find('{').unwrap());
        let location: Value = serde_json::from_str(json).unwrap();
        let offset = location["offset"].as_u64().unwrap() as usize;
        let length = location["length"].as_u64().unwrap() as usize;

        let mut text = String::new();
        GzDecoder::new(&data[offset..offset + length])
            .read_to_string(&mut text)
            .unwrap();
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        assert_eq!(lines.len(), if i < 2 { 3 } else { 1 });

        let first = &lines[0];
        assert_eq!(prefix.trim(), first[..first.find('{').unwrap()].trim());
        recovered.extend(lines);
    }
    assert_eq!(recovered, expected);
}

#[test]
fn empty_run_writes_nothing() {
    let (index, data) = compress(&Warc::plain(), 300);
    assert!(index.is_empty());
    assert!(data.is_empty());
}
