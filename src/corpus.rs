/// Corpus ingestion — project-record parsing and markup cleanup.
///
/// The document feed serves JSON arrays of project records whose text
/// fields arrive HTML-encoded, sometimes doubly so, with stray `<br>` tags
/// inside pitches. Everything here normalizes that text down to the plain
/// strings the models train on.

use std::path::Path;
use thiserror::Error;

use crate::core::markov::MarkovModel;
use crate::schema::project::ProjectRecord;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a JSON array of project records.
pub fn parse_records(json: &str) -> Result<Vec<ProjectRecord>, CorpusError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads and parses a project-record file.
pub fn load_records(path: &Path) -> Result<Vec<ProjectRecord>, CorpusError> {
    let contents = std::fs::read_to_string(path)?;
    parse_records(&contents)
}

/// Counts from one `ingest` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub titles: usize,
    pub pitches: usize,
    /// Fields present but too short for their model's order.
    pub skipped: usize,
}

/// Decodes and feeds every record's text fields into the model pair.
///
/// Project names train the title model, elevator pitches the pitch model;
/// records may carry either field, both, or neither.
pub fn ingest(
    records: &[ProjectRecord],
    title_model: &mut MarkovModel,
    pitch_model: &mut MarkovModel,
) -> IngestStats {
    let title_stats = ingest_titles(records, title_model);
    let pitch_stats = ingest_pitches(records, pitch_model);
    IngestStats {
        titles: title_stats.titles,
        pitches: pitch_stats.pitches,
        skipped: title_stats.skipped + pitch_stats.skipped,
    }
}

/// Decodes and feeds project names only.
pub fn ingest_titles(records: &[ProjectRecord], title_model: &mut MarkovModel) -> IngestStats {
    let mut stats = IngestStats::default();
    for record in records {
        if let Some(name) = &record.project_name {
            match title_model.feed(&decode_entities(name)) {
                Ok(()) => stats.titles += 1,
                Err(e) => {
                    log::debug!("skipping title: {}", e);
                    stats.skipped += 1;
                }
            }
        }
    }
    stats
}

/// Normalizes and feeds elevator pitches only.
pub fn ingest_pitches(records: &[ProjectRecord], pitch_model: &mut MarkovModel) -> IngestStats {
    let mut stats = IngestStats::default();
    for record in records {
        if let Some(pitch) = &record.elevator_pitch {
            match pitch_model.feed(&normalize_pitch(pitch)) {
                Ok(()) => stats.pitches += 1,
                Err(e) => {
                    log::debug!("skipping pitch: {}", e);
                    stats.skipped += 1;
                }
            }
        }
    }
    stats
}

/// Decodes HTML entities: the named entities the scraped feed actually
/// produces (markup escapes, accented vowels, typographic punctuation)
/// plus `&#NN;` / `&#xHH;` numeric references. Anything unrecognized
/// passes through unchanged.
pub fn decode_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        result.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match decode_entity(rest) {
            Some((decoded, consumed)) => {
                result.push(decoded);
                rest = &rest[consumed..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Decodes one entity at the start of `s` (which begins with `&`).
/// Returns the decoded char and the byte length consumed.
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let end = s.find(';')?;
    // Entities are short; a distant semicolon means a bare ampersand.
    if end < 2 || end > 10 {
        return None;
    }
    let body = &s[1..end];
    let decoded = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "eacute" => 'é',
        "egrave" => 'è',
        "agrave" => 'à',
        "ccedil" => 'ç',
        "auml" => 'ä',
        "ouml" => 'ö',
        "uuml" => 'ü',
        "ntilde" => 'ñ',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "hellip" => '\u{2026}',
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)?
        }
    };
    Some((decoded, end + 1))
}

/// Full cleanup for elevator-pitch text: entity decoding plus `<br>` tags
/// collapsed to newlines.
pub fn normalize_pitch(text: &str) -> String {
    let decoded = decode_entities(text);
    // Doubly-encoded feeds leave a literal "&lt;br /&gt;" behind after one
    // decode pass; the scraped data contains these.
    let decoded = decoded.replace("&lt;br /&gt;", "\n");
    strip_br(&decoded)
}

/// Replaces `<br>`, `<br/>`, and `<br />` tags with newlines.
fn strip_br(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("<br") {
        result.push_str(&rest[..pos]);
        match rest[pos..].find('>') {
            Some(close) => {
                result.push('\n');
                rest = &rest[pos + close + 1..];
            }
            None => {
                // Unclosed tag at end of input; keep it verbatim.
                result.push_str(&rest[pos..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_entities() {
        assert_eq!(decode_entities("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(decode_entities("&lt;b&gt;bold&lt;/b&gt;"), "<b>bold</b>");
        assert_eq!(decode_entities("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(decode_entities("it&apos;s"), "it's");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(decode_entities("it&#39;s"), "it's");
        assert_eq!(decode_entities("caf&#233;"), "café");
        assert_eq!(decode_entities("&#x48;i"), "Hi");
    }

    #[test]
    fn decodes_accented_and_typographic_entities() {
        assert_eq!(decode_entities("caf&eacute;"), "café");
        assert_eq!(decode_entities("ma&ntilde;ana"), "mañana");
        assert_eq!(decode_entities("it&rsquo;s"), "it\u{2019}s");
        assert_eq!(
            decode_entities("art &mdash; and more&hellip;"),
            "art \u{2014} and more\u{2026}"
        );
    }

    #[test]
    fn leaves_bare_ampersands_alone() {
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
        assert_eq!(decode_entities("a & b"), "a & b");
    }

    #[test]
    fn single_decode_pass_only() {
        // Double-encoded input decodes one level, like the original feed
        // expects.
        assert_eq!(decode_entities("&amp;#39;"), "&#39;");
    }

    #[test]
    fn strips_br_variants() {
        assert_eq!(normalize_pitch("one<br>two"), "one\ntwo");
        assert_eq!(normalize_pitch("one<br/>two"), "one\ntwo");
        assert_eq!(normalize_pitch("one<br />two"), "one\ntwo");
    }

    #[test]
    fn strips_encoded_br_after_decoding() {
        assert_eq!(normalize_pitch("one&lt;br /&gt;two"), "one\ntwo");
        // Doubly-encoded break tags survive one decode pass as literals and
        // are still collapsed.
        assert_eq!(normalize_pitch("one&amp;lt;br /&amp;gt;two"), "one\ntwo");
    }

    #[test]
    fn keeps_unclosed_br_verbatim() {
        assert_eq!(normalize_pitch("trailing<br"), "trailing<br");
    }

    #[test]
    fn parses_records_ignoring_unknown_fields() {
        let json = r#"[
            {"project_name": "One", "elevator_pitch": "First pitch.", "venue_id": 9},
            {"project_name": "Two"},
            {"elevator_pitch": "Third pitch."},
            {"student_name": "nobody"}
        ]"#;
        let records = parse_records(json).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].project_name.as_deref(), Some("One"));
        assert_eq!(records[1].elevator_pitch, None);
        assert_eq!(records[2].elevator_pitch.as_deref(), Some("Third pitch."));
        assert_eq!(records[3].project_name, None);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_records("{not json"),
            Err(CorpusError::Json(_))
        ));
    }

    #[test]
    fn ingest_feeds_decoded_fields_and_counts_short_ones() {
        let records = vec![
            ProjectRecord {
                project_name: Some("Sound &amp; Vision".to_string()),
                elevator_pitch: Some("Looping video walls<br />driven by song.".to_string()),
            },
            ProjectRecord {
                // Too short for an order-4 title model.
                project_name: Some("AI".to_string()),
                elevator_pitch: None,
            },
        ];

        let mut title_model = MarkovModel::new(4, 40).unwrap();
        let mut pitch_model = MarkovModel::new(5, 100).unwrap();
        let stats = ingest(&records, &mut title_model, &mut pitch_model);

        assert_eq!(
            stats,
            IngestStats {
                titles: 1,
                pitches: 1,
                skipped: 1
            }
        );
        assert_eq!(title_model.starting_ngrams(), ["Soun"]);
        // The decoded ampersand reaches the transition table.
        assert!(title_model.transitions().contains_key("d & "));
        // The br tag became a newline inside the pitch text.
        assert!(pitch_model.transitions().keys().any(|k| k.contains('\n')));
    }

    #[test]
    fn single_field_passes_touch_only_their_model() {
        let records = vec![ProjectRecord {
            project_name: Some("Night Market".to_string()),
            elevator_pitch: Some("Street food stalls that trade in stories.".to_string()),
        }];

        let mut title_model = MarkovModel::new(4, 40).unwrap();
        let title_stats = ingest_titles(&records, &mut title_model);
        assert_eq!(title_stats.titles, 1);
        assert_eq!(title_stats.pitches, 0);
        assert!(title_model.is_trained());

        let mut pitch_model = MarkovModel::new(5, 100).unwrap();
        let pitch_stats = ingest_pitches(&records, &mut pitch_model);
        assert_eq!(pitch_stats.pitches, 1);
        assert_eq!(pitch_stats.titles, 0);
        assert!(pitch_model.is_trained());
    }
}
