use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use harvest_logging::harvest_warn;

use crate::FetchOutput;

/// Decode a fetched page into UTF-8 markup.
///
/// Order of precedence: BOM, then the Content-Type charset, then chardetng.
/// Undecodable bytes become U+FFFD and the page is still returned.
pub fn decode_page(output: &FetchOutput) -> String {
    let encoding = sniff_encoding(&output.bytes, output.metadata.content_type.as_deref());
    let (text, _, had_errors) = encoding.decode(&output.bytes);
    if had_errors {
        harvest_warn!(
            "{} is not valid {}; replaced undecodable bytes",
            output.metadata.final_url,
            encoding.name()
        );
    }
    text.into_owned()
}

fn sniff_encoding(bytes: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if let Some(encoding) = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return encoding;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(['"', '\''].as_ref()))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchMetadata;

    fn output(bytes: &[u8], content_type: Option<&str>) -> FetchOutput {
        FetchOutput {
            bytes: bytes.to_vec(),
            metadata: FetchMetadata {
                original_url: "https://example.test/".into(),
                final_url: "https://example.test/".into(),
                redirect_count: 0,
                content_type: content_type.map(str::to_string),
                byte_len: bytes.len() as u64,
            },
        }
    }

    #[test]
    fn charset_header_wins_over_detection() {
        let page = output(b"caf\xe9", Some("text/html; Charset=\"ISO-8859-1\""));
        assert_eq!(decode_page(&page), "caf\u{e9}");
    }

    #[test]
    fn bom_wins_over_header() {
        let page = output(b"\xEF\xBB\xBFhello", Some("text/html; charset=ISO-8859-1"));
        assert_eq!(decode_page(&page), "hello");
    }

    #[test]
    fn invalid_bytes_become_replacement_chars() {
        let page = output(b"ok \xff\xfe\xfd", Some("text/html; charset=utf-8"));
        assert_eq!(decode_page(&page), "ok \u{fffd}\u{fffd}\u{fffd}");
    }
}
