//! End-to-end indexing through the library API

use super::helpers::*;
use cdxj_indexer::output::{OutputFormat, PlainWriter, SortingWriter};
use cdxj_indexer::{DigestService, Indexer, IndexerOptions, Input};
use serde_json::Value;
use std::cell::Cell;
use std::io::{self, Cursor, Read};
use std::rc::Rc;

fn json_part(line: &str) -> Value {
    let start = line.find('{').expect("line has a JSON block");
    serde_json::from_str(&line[start..]).expect("valid JSON")
}

fn urlkey(line: &str) -> &str {
    line.split(' ').next().unwrap()
}

#[test]
fn response_and_revisit_index_with_defaults() {
    let warc = response_and_revisit();
    let (out, summary) = index_warc(IndexerOptions::default(), &warc, "example.warc.gz");

    let (off0, len0) = warc.position(0);
    let (off1, len1) = warc.position(1);
    let expected = format!(
        "com,example)/ 20170306040206 {{\"url\": \"http://example.com/\", \"mime\": \"text/html\", \"status\": \"200\", \"digest\": \"B2LTWWPUOYAH7UIPQ7ZUPQ4VMBSVC36A\", \"length\": \"{}\", \"offset\": \"{}\", \"filename\": \"example.warc.gz\"}}\n\
         com,example)/ 20170306040348 {{\"url\": \"http://example.com/\", \"mime\": \"warc/revisit\", \"status\": \"200\", \"digest\": \"B2LTWWPUOYAH7UIPQ7ZUPQ4VMBSVC36A\", \"length\": \"{}\", \"offset\": \"{}\", \"filename\": \"example.warc.gz\"}}\n",
        len0, off0, len1, off1
    );
    assert_eq!(out, expected);
    assert_eq!(summary.records_read, 2);
    assert_eq!(summary.lines_written, 2);
}

#[test]
fn missing_digest_is_computed_from_payload() {
    let warc = Warc::plain().push(
        Record::new("response", "http://example.com/page")
            .block(http_response("200 OK", "text/html", "<html>hi</html>")),
    );
    let (out, _) = index_warc(IndexerOptions::default(), &warc, "a.warc");
    assert_eq!(
        json_part(&out)["digest"],
        "JEXJR23VJNMISKZO2PJJFAYRPVKZAOS5"
    );
}

#[test]
fn warcinfo_and_requests_are_left_out_by_default() {
    let warc = Warc::plain()
        .push(Record::new("warcinfo", "").block("software: test\r\n"))
        .push(
            Record::new("metadata", "http://example.com/")
                .header("Content-Type", "application/warc-fields")
                .block("outlink: http://example.com/a\r\n"),
        )
        .push(
            Record::new("request", "http://example.com/")
                .block(http_request("GET", "/", None, "")),
        )
        .push(
            Record::new("resource", "http://example.com/file.txt")
                .header("Content-Type", "text/plain")
                .block("abc"),
        );
    let (out, summary) = index_warc(IndexerOptions::default(), &warc, "a.warc");

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("com,example)/file.txt 20170306040206 "));
    assert_eq!(json_part(lines[0])["mime"], "text/plain");
    assert_eq!(summary.filtered, 3);
}

#[test]
fn record_without_url_is_skipped() {
    let warc = Warc::plain()
        .push(Record::new("resource", "").block("orphan"))
        .push(Record::new("resource", "http://example.com/x").block("ok"));
    let (out, summary) = index_warc(IndexerOptions::default(), &warc, "a.warc");
    assert_eq!(out.lines().count(), 1);
    assert_eq!(summary.without_url, 1);
}

#[test]
fn post_body_is_appended_to_both_keys() {
    let warc = post_pair("application/x-www-form-urlencoded", "a=1&b=2");
    let options = IndexerOptions {
        post_append: true,
        records: Some("all".into()),
        ..IndexerOptions::default()
    };
    let (out, _) = index_warc(options, &warc, "a.warc");

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(urlkey(lines[0]), "com,example)/api?__wb_method=post&a=1&b=2");
    assert_eq!(urlkey(lines[0]), urlkey(lines[1]));

    let response = json_part(lines[1]);
    assert_eq!(response["requestBody"], "a=1&b=2");
    assert_eq!(response["method"], "POST");
    assert!(json_part(lines[0]).get("requestBody").is_none());
}

#[test]
fn post_pair_in_response_first_order_gets_same_key() {
    let warc = Warc::plain()
        .push(
            Record::new("response", "http://example.com/api")
                .id("resp1")
                .concurrent_to("req1")
                .block(http_response("200 OK", "application/json", "{}")),
        )
        .push(
            Record::new("request", "http://example.com/api")
                .id("req1")
                .concurrent_to("resp1")
                .block(http_request(
                    "POST",
                    "/api",
                    Some("application/json"),
                    r#"{"q": "x", "page": {"q": 2}}"#,
                )),
        );
    let options = IndexerOptions {
        post_append: true,
        ..IndexerOptions::default()
    };
    let (out, _) = index_warc(options, &warc, "a.warc");

    assert_eq!(out.lines().count(), 1);
    assert_eq!(urlkey(&out), "com,example)/api?__wb_method=post&q.2_=2&q=x");
    assert_eq!(json_part(&out)["requestBody"], "q=x&q.2_=2");
}

#[test]
fn without_post_append_keys_are_plain() {
    let warc = post_pair("application/x-www-form-urlencoded", "a=1");
    let (out, _) = index_warc(IndexerOptions::default(), &warc, "a.warc");
    assert_eq!(urlkey(&out), "com,example)/api");
    assert!(json_part(&out).get("method").is_none());
}

#[test]
fn binary_post_body_is_base64_wrapped() {
    let warc = post_pair("application/octet-stream", "\u{1}\u{2}\u{3}");
    let options = IndexerOptions {
        post_append: true,
        ..IndexerOptions::default()
    };
    let (out, _) = index_warc(options, &warc, "a.warc");
    assert_eq!(json_part(&out)["requestBody"], "__wb_post_data=AQID");
}

#[test]
fn request_fields_read_the_paired_request() {
    let warc = post_pair("application/x-www-form-urlencoded", "a=1");
    let options = IndexerOptions {
        fields: Some("referrer".into()),
        ..IndexerOptions::default()
    };
    let (out, _) = index_warc(options, &warc, "a.warc");
    assert_eq!(json_part(&out)["referrer"], "http://example.com/start");
}

#[test]
fn request_records_index_their_own_method() {
    let warc = Warc::plain()
        .push(Record::new("request", "http://example.com/").block(http_request("GET", "/", None, "")))
        .push(
            Record::new("response", "http://example.com/")
                .block(http_response("200 OK", "text/html", "x")),
        );
    let options = IndexerOptions {
        records: Some("request".into()),
        fields: Some("method".into()),
        ..IndexerOptions::default()
    };
    let (out, _) = index_warc(options, &warc, "a.warc");

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 1);
    let entry = json_part(lines[0]);
    assert_eq!(entry["method"], "GET");
    assert!(entry.get("status").is_none());
}

#[test]
fn replace_fields_sets_exact_field_list() {
    let warc = response_and_revisit();
    let options = IndexerOptions {
        replace_fields: Some("url,mime".into()),
        ..IndexerOptions::default()
    };
    let (out, _) = index_warc(options, &warc, "a.warc");
    assert_eq!(
        out.lines().next().unwrap(),
        "com,example)/ 20170306040206 {\"url\": \"http://example.com/\", \"mime\": \"text/html\"}"
    );
}

#[test]
fn legacy_formats_fill_missing_columns() {
    let warc = Warc::plain().push(
        Record::new("resource", "http://example.com/file.txt")
            .header("Content-Type", "text/plain")
            .header("WARC-Payload-Digest", "sha1:AAAA")
            .block("abc"),
    );
    let (offset, length) = warc.position(0);

    let (out, _) = index_warc(
        IndexerOptions {
            format: OutputFormat::Cdx11,
            ..IndexerOptions::default()
        },
        &warc,
        "a.warc",
    );
    assert_eq!(
        out,
        format!(
            " CDX N b a m s k r M S V g\ncom,example)/file.txt {} http://example.com/file.txt text/plain - AAAA - - {} {} a.warc\n",
            TIMESTAMP, length, offset
        )
    );

    let (out, _) = index_warc(
        IndexerOptions {
            format: OutputFormat::Cdx09,
            ..IndexerOptions::default()
        },
        &warc,
        "a.warc",
    );
    assert_eq!(
        out,
        format!(
            " CDX N b a m s k r V g\ncom,example)/file.txt {} http://example.com/file.txt text/plain - AAAA - {} a.warc\n",
            TIMESTAMP, offset
        )
    );
}

#[test]
fn sorted_output_keeps_header_first_and_drops_duplicates() {
    let warc = Warc::plain()
        .push(Record::new("resource", "http://b.example.com/").block("b"))
        .push(Record::new("resource", "http://a.example.com/").block("a"));
    let options = IndexerOptions {
        format: OutputFormat::Cdx09,
        ..IndexerOptions::default()
    };

    let mut indexer = Indexer::new(options).unwrap();
    let mut sink = SortingWriter::new(PlainWriter::new(Vec::new()));
    let inputs = vec![
        Input::reader("same.warc", Cursor::new(warc.bytes().to_vec())),
        Input::reader("same.warc", Cursor::new(warc.bytes().to_vec())),
    ];
    indexer.run(inputs, &mut sink).unwrap();
    let out = String::from_utf8(sink.into_inner().into_inner()).unwrap();

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], " CDX N b a m s k r V g");
    assert!(lines[1].starts_with("com,example,a)/ "));
    assert!(lines[2].starts_with("com,example,b)/ "));
}

#[test]
fn forced_filename_is_recorded() {
    let warc = response_and_revisit();
    let options = IndexerOptions {
        filename: Some("renamed.warc.gz".into()),
        ..IndexerOptions::default()
    };
    let (out, _) = index_warc(options, &warc, "original.warc.gz");
    for line in out.lines() {
        assert_eq!(json_part(line)["filename"], "renamed.warc.gz");
    }
}

#[test]
fn arc_records_index_like_responses() {
    let filedesc = "filedesc://example.arc 0.0.0.0 20140216050221 text/plain 77\n\
1 0 Internet Archive\n\
URL IP-address Archive-date Content-type Archive-length\n\n";
    let block = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html>arc</html>";
    let record = format!(
        "http://example.com/ 93.184.216.119 20140216050221 text/html {}\n{}\n",
        block.len(),
        block
    );
    let data = format!("{}{}", filedesc, record).into_bytes();

    let mut indexer = Indexer::new(IndexerOptions::default()).unwrap();
    let mut sink = PlainWriter::new(Vec::new());
    indexer
        .run(vec![Input::reader("example.arc", Cursor::new(data))], &mut sink)
        .unwrap();
    let out = String::from_utf8(sink.into_inner()).unwrap();

    assert_eq!(
        out,
        format!(
            "com,example)/ 20140216050221 {{\"url\": \"http://example.com/\", \"mime\": \"text/html\", \"status\": \"200\", \"digest\": \"7U2C6H4RFWRFP5S7LIC2ITFM3UNXCQOA\", \"length\": \"{}\", \"offset\": \"{}\", \"filename\": \"example.arc\"}}\n",
            record.len(),
            filedesc.len()
        )
    );
}

struct FixedDigest;

impl DigestService for FixedDigest {
    fn payload_digest(&mut self, payload: &mut dyn Read) -> io::Result<String> {
        let mut body = Vec::new();
        payload.read_to_end(&mut body)?;
        Ok(format!("md5:LEN{}", body.len()))
    }
}

#[test]
fn custom_digest_service_is_built_once_and_only_when_needed() {
    let built = Rc::new(Cell::new(0));
    let counter = Rc::clone(&built);
    let mut indexer = Indexer::new(IndexerOptions {
        replace_fields: Some("url,digest".into()),
        ..IndexerOptions::default()
    })
    .unwrap()
    .with_digest_service(move || {
        counter.set(counter.get() + 1);
        Box::new(FixedDigest)
    });

    let warc = Warc::plain()
        .push(
            Record::new("resource", "http://example.com/a")
                .header("WARC-Payload-Digest", "sha1:KEPT")
                .block("aaa"),
        )
        .push(Record::new("resource", "http://example.com/b").block("bbbb"))
        .push(Record::new("resource", "http://example.com/c").block("cc"));

    let mut sink = PlainWriter::new(Vec::new());
    indexer
        .run(vec![Input::reader("a.warc", Cursor::new(warc.bytes().to_vec()))], &mut sink)
        .unwrap();
    let out = String::from_utf8(sink.into_inner()).unwrap();

    let digests: Vec<Value> = out.lines().map(|l| json_part(l)["digest"].clone()).collect();
    assert_eq!(digests, vec!["KEPT", "LEN4", "LEN2"]);
    assert_eq!(built.get(), 1);
}
