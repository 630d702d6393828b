//! Placeholder substitution inside WordprocessingML parts
//!
//! A part (`word/document.xml`, `word/header1.xml`, ...) is scanned once
//! with quick-xml. Every paragraph (`<w:p>`, also the DrawingML `<a:p>` of
//! text boxes) becomes a text region whose text is the concatenation of its
//! `<w:t>` nodes. Paragraphs nested inside another paragraph (text boxes)
//! are separate regions.
//!
//! Replacement edits the original bytes in place: only the text nodes that
//! changed are rewritten, so a part without matches is returned untouched.
//! Line breaks and tabs in replacement text become `<w:br/>` and
//! `<w:tab/>` inside the same run.

use std::ops::Range;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};

/// Outcome of substituting placeholders in one part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSubstitution {
    /// Rewritten part, or `None` when no placeholder occurred
    pub xml: Option<Vec<u8>>,
    /// Number of paragraphs whose text changed
    pub paragraphs_changed: usize,
    /// Total number of placeholder occurrences replaced
    pub occurrences: usize,
}

/// A `<w:t>` text node belonging to a paragraph
#[derive(Debug)]
struct Segment {
    /// Byte range of the escaped text content in the part
    content: Range<usize>,
    /// Byte offset of the `>` closing the owning `<w:t ...>` start tag
    tag_end: usize,
    /// Whether the owning start tag already carries `xml:space`
    preserves_space: bool,
    /// Whether the node is a `w:t`, where breaks can be written as siblings
    breaks: bool,
    /// Unescaped text
    text: String,
}

/// A paragraph and the text nodes that belong directly to it
#[derive(Debug, Default)]
struct Region {
    segments: Vec<Segment>,
}

impl Region {
    fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Collect the text of every paragraph in a part, in document order
///
/// Paragraphs without any text node are skipped.
pub fn paragraph_texts(part: &str, xml: &[u8]) -> Result<Vec<String>> {
    Ok(scan_regions(part, xml)?
        .iter()
        .filter(|r| !r.segments.is_empty())
        .map(Region::text)
        .collect())
}

/// Replace every placeholder occurrence in every paragraph of a part
///
/// Placeholders are applied in slice order. For each paragraph, a
/// placeholder that occurs in the current paragraph text has ALL of its
/// non-overlapping occurrences replaced, left to right; inserted values are
/// not rescanned for the same placeholder. Empty placeholders are ignored.
pub fn substitute_part<K, V>(
    part: &str,
    xml: &[u8],
    replacements: &[(K, V)],
) -> Result<PartSubstitution>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let regions = scan_regions(part, xml)?;

    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut paragraphs_changed = 0;
    let mut occurrences = 0;

    for region in &regions {
        if region.segments.is_empty() {
            continue;
        }

        let mut texts: Vec<String> = region.segments.iter().map(|s| s.text.clone()).collect();
        let mut replaced = 0;
        for (placeholder, value) in replacements {
            replaced += replace_all(&mut texts, placeholder.as_ref(), value.as_ref());
        }
        if replaced == 0 {
            continue;
        }

        occurrences += replaced;
        paragraphs_changed += 1;

        for (segment, new_text) in region.segments.iter().zip(texts) {
            if segment.text == new_text {
                continue;
            }
            let new_text = if segment.breaks {
                new_text.replace("\r\n", "\n")
            } else {
                new_text
            };
            let first_piece = if segment.breaks {
                new_text.split(['\n', '\t']).next().unwrap_or_default()
            } else {
                new_text.as_str()
            };
            if !segment.preserves_space && needs_space_preserve(first_piece) {
                edits.push((
                    segment.tag_end..segment.tag_end,
                    r#" xml:space="preserve""#.to_string(),
                ));
            }
            edits.push((segment.content.clone(), render_content(&new_text, segment.breaks)));
        }
    }

    if edits.is_empty() {
        return Ok(PartSubstitution {
            xml: None,
            paragraphs_changed: 0,
            occurrences: 0,
        });
    }

    Ok(PartSubstitution {
        xml: Some(apply_edits(xml, edits)),
        paragraphs_changed,
        occurrences,
    })
}

/// Replace all occurrences of `placeholder` across the concatenated segments
///
/// Returns the number of occurrences replaced.
fn replace_all(segments: &mut [String], placeholder: &str, value: &str) -> usize {
    if placeholder.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut from = 0;
    loop {
        let full: String = segments.concat();
        let Some(pos) = full[from..].find(placeholder) else {
            break;
        };
        let start = from + pos;
        splice(segments, start..start + placeholder.len(), value);
        from = start + value.len();
        count += 1;
    }
    count
}

/// Replace `range` of the concatenated segments with `value`
///
/// The value lands in the segment where the range starts; the parts of the
/// range that spill into later segments are removed from them.
fn splice(segments: &mut [String], range: Range<usize>, value: &str) {
    let mut offset = 0;
    let mut inserted = false;

    for segment in segments.iter_mut() {
        let seg_start = offset;
        let seg_end = offset + segment.len();
        offset = seg_end;

        if seg_end <= range.start || seg_start >= range.end {
            continue;
        }

        let local_start = range.start.saturating_sub(seg_start);
        let local_end = (range.end - seg_start).min(segment.len());
        if inserted {
            segment.replace_range(local_start..local_end, "");
        } else {
            segment.replace_range(local_start..local_end, value);
            inserted = true;
        }
    }
}

/// Escaped content for a rewritten text node
///
/// With `breaks`, each `\n` or `\t` closes the text node, emits `<w:br/>`
/// or `<w:tab/>`, and opens a new space-preserving `<w:t>`.
fn render_content(text: &str, breaks: bool) -> String {
    if !breaks {
        return escape(text).into_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut piece_start = 0;
    for (i, c) in text.char_indices() {
        let marker = match c {
            '\n' => "<w:br/>",
            '\t' => "<w:tab/>",
            _ => continue,
        };
        out.push_str(&escape(&text[piece_start..i]));
        out.push_str("</w:t>");
        out.push_str(marker);
        out.push_str(r#"<w:t xml:space="preserve">"#);
        piece_start = i + c.len_utf8();
    }
    out.push_str(&escape(&text[piece_start..]));
    out
}

fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

fn apply_edits(xml: &[u8], mut edits: Vec<(Range<usize>, String)>) -> Vec<u8> {
    edits.sort_by_key(|(range, _)| (range.start, range.end));

    let mut out = Vec::with_capacity(xml.len() + 64);
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.extend_from_slice(&xml[cursor..range.start]);
        out.extend_from_slice(replacement.as_bytes());
        cursor = range.end;
    }
    out.extend_from_slice(&xml[cursor..]);
    out
}

/// Scan a part into paragraph regions
fn scan_regions(part: &str, xml: &[u8]) -> Result<Vec<Region>> {
    let mut reader = Reader::from_reader(xml);
    // Don't trim text - whitespace in runs is content
    reader.config_mut().trim_text(false);

    let mut regions: Vec<Region> = Vec::new();
    // Indices into `regions` of the currently open paragraphs
    let mut open: Vec<usize> = Vec::new();
    // (owning region, tag end offset, has xml:space, is w:t) while inside <w:t>
    let mut text_owner: Option<(usize, usize, bool, bool)> = None;

    loop {
        let before = position(&reader);
        let event = reader
            .read_event()
            .map_err(|e| OoxmlError::xml(part, e))?;
        let after = position(&reader);

        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"p" => {
                    regions.push(Region::default());
                    open.push(regions.len() - 1);
                }
                b"t" => {
                    if let Some(&owner) = open.last() {
                        let preserves_space = e
                            .attributes()
                            .filter_map(|a| a.ok())
                            .any(|a| a.key.as_ref() == b"xml:space");
                        let breaks = e.name().as_ref() == b"w:t";
                        text_owner = Some((owner, after - 1, preserves_space, breaks));
                    }
                }
                _ => {}
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"p" => {
                    open.pop();
                }
                b"t" => text_owner = None,
                _ => {}
            },
            Event::Text(ref e) => {
                if let Some((owner, tag_end, preserves_space, breaks)) = text_owner {
                    let text = e.unescape().map_err(|err| OoxmlError::xml(part, err))?;
                    regions[owner].segments.push(Segment {
                        content: before..after,
                        tag_end,
                        preserves_space,
                        breaks,
                        text: text.into_owned(),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(regions)
}

fn position(reader: &Reader<&[u8]>) -> usize {
    reader.buffer_position() as usize
}
