//! Streaming rewrite of `rhythmdb.xml` and `playlists.xml`.
//!
//! Only the text of `location` elements is touched. Everything else,
//! including whitespace, attributes and the declaration, is copied through
//! event by event.

use crate::rewrite::RewriteStats;
use crate::translate::PathTranslator;
use anyhow::{Context, Result};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::path::Path;
use tracing::debug;

const LOCATION: &[u8] = b"location";
const FILE_SCHEME: &str = "file://";

/// Which Rhythmbox document is being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `rhythmdb.xml`: `<entry><location>` direct children.
    Database,
    /// `playlists.xml`: any `<location>` nested below a `<playlist>`.
    Playlists,
}

impl DocumentKind {
    fn is_location(&self, stack: &[Vec<u8>]) -> bool {
        let Some((last, parents)) = stack.split_last() else {
            return false;
        };
        if last.as_slice() != LOCATION {
            return false;
        }
        match self {
            Self::Database => parents.last().is_some_and(|p| p.as_slice() == b"entry"),
            Self::Playlists => parents.iter().any(|p| p.as_slice() == b"playlist"),
        }
    }
}

/// Rewrite every `file://` location in `xml`.
pub fn rewrite_document(
    xml: &str,
    kind: DocumentKind,
    translator: &PathTranslator,
) -> Result<(String, RewriteStats)> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut stats = RewriteStats::default();

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Malformed XML at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(start) => {
                stack.push(start.name().as_ref().to_vec());
                writer.write_event(Event::Start(start))?;
            }
            Event::End(end) => {
                stack.pop();
                writer.write_event(Event::End(end))?;
            }
            Event::Text(text) if kind.is_location(&stack) => {
                let value = text.unescape()?;
                if !value.starts_with(FILE_SCHEME) {
                    stats.passed_through += 1;
                    writer.write_event(Event::Text(text))?;
                    continue;
                }
                let result = translator.translate(&value);
                stats.record(&result);
                if result.is_rewritten() {
                    let escaped = partial_escape(result.value()).into_owned();
                    writer.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
                } else {
                    writer.write_event(Event::Text(text))?;
                }
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    let out = String::from_utf8(writer.into_inner()).context("Rewritten XML is not UTF-8")?;
    Ok((out, stats))
}

/// Read `src`, rewrite it, and write the result to `dst`.
pub fn rewrite_document_file(
    src: &Path,
    dst: &Path,
    kind: DocumentKind,
    translator: &PathTranslator,
) -> Result<RewriteStats> {
    debug!("[Rewrite] Processing {} to update file paths", src.display());
    let xml = fs::read_to_string(src)
        .with_context(|| format!("Cannot read {}", src.display()))?;
    let (out, stats) = rewrite_document(&xml, kind, translator)
        .with_context(|| format!("Cannot rewrite {}", src.display()))?;
    fs::write(dst, out).with_context(|| format!("Cannot write {}", dst.display()))?;
    Ok(stats)
}
