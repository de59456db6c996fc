//! Collaborator count estimation with a fallback chain.
//!
//! Git authorship is tried first, then file ownership, then author fields in
//! office and PDF documents. A project nobody else touched is `Solo`.

use crate::contributors::parse_shortlog;
use crate::git::{GitCommand, SystemGit};
use artimine_discovery::IgnorePatterns;
use lopdf::{Document, Object};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Identities that never count as collaborators.
const BOT_IDENTITIES: &[&str] = &["github-classroom[bot]", "dependabot[bot]", "GitHub"];

/// Document author values that carry no identity.
const PLACEHOLDER_AUTHORS: &[&str] = &["Unknown", "None", "python-docx"];

const DOCX_CORE_PROPERTIES: &str = "docProps/core.xml";

/// Core-property elements naming a person.
const DOCX_AUTHOR_ELEMENTS: &[&[u8]] = &[b"dc:creator", b"cp:lastModifiedBy"];

/// PDFDocEncoding code points for bytes `0x80..=0xA0`; `0x9F` is undefined.
const PDF_DOC_HIGH: [char; 33] = [
    '\u{2022}', '\u{2020}', '\u{2021}', '\u{2026}', '\u{2014}', '\u{2013}', '\u{0192}', '\u{2044}',
    '\u{2039}', '\u{203A}', '\u{2212}', '\u{2030}', '\u{201E}', '\u{201C}', '\u{201D}', '\u{2018}',
    '\u{2019}', '\u{201A}', '\u{2122}', '\u{FB01}', '\u{FB02}', '\u{0141}', '\u{0152}', '\u{0160}',
    '\u{0178}', '\u{017D}', '\u{0131}', '\u{0142}', '\u{0153}', '\u{0161}', '\u{017E}', '\u{FFFD}',
    '\u{20AC}',
];

/// PDFDocEncoding code points for bytes `0x18..=0x1F`.
const PDF_DOC_ACCENTS: [char; 8] = [
    '\u{02D8}', '\u{02C7}', '\u{02C6}', '\u{02D9}', '\u{02DD}', '\u{02DB}', '\u{02DA}', '\u{02DC}',
];

/// Why a document's author fields could not be read.
#[derive(Debug, Error)]
enum DocumentError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("xml: {0}")]
    Xml(String),
    #[error("pdf: {0}")]
    Pdf(String),
}

/// Which signal produced a [`CollaboratorEstimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorSource {
    Git,
    FileOwnership,
    DocumentMetadata,
    Solo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollaboratorEstimate {
    pub count: usize,
    pub source: CollaboratorSource,
    /// Emails, names, `uid:N`/`gid:N` or document authors behind `count`.
    pub identities: Vec<String>,
}

impl CollaboratorEstimate {
    fn solo() -> Self {
        Self {
            count: 1,
            source: CollaboratorSource::Solo,
            identities: Vec::new(),
        }
    }
}

type Strategy<G> = fn(&CollabDetector<G>, &Path) -> Vec<String>;

/// Estimates how many people worked on a project.
#[derive(Debug, Clone)]
pub struct CollabDetector<G = SystemGit> {
    git: G,
    ignore: IgnorePatterns,
}

impl Default for CollabDetector<SystemGit> {
    fn default() -> Self {
        Self::new(SystemGit::default(), IgnorePatterns::default())
    }
}

impl<G: GitCommand> CollabDetector<G> {
    pub fn new(git: G, ignore: IgnorePatterns) -> Self {
        Self { git, ignore }
    }

    /// Walks the strategies in order; the first with more than one identity wins.
    pub fn estimate(&self, root: &Path) -> CollaboratorEstimate {
        let strategies: [(CollaboratorSource, Strategy<G>); 3] = [
            (CollaboratorSource::Git, Self::git_identities),
            (CollaboratorSource::FileOwnership, Self::ownership_identities),
            (CollaboratorSource::DocumentMetadata, Self::document_authors),
        ];
        for (source, strategy) in strategies {
            let identities = strategy(self, root);
            tracing::debug!(source = ?source, found = identities.len(), "collaborator strategy");
            if identities.len() > 1 {
                return CollaboratorEstimate {
                    count: identities.len(),
                    source,
                    identities,
                };
            }
        }
        CollaboratorEstimate::solo()
    }

    pub fn number_of_collaborators(&self, root: &Path) -> usize {
        self.estimate(root).count
    }

    /// Distinct shortlog authors, bots excluded, deduplicated by email then name.
    pub fn git_identities(&self, root: &Path) -> Vec<String> {
        if !self.git.is_work_tree(root) {
            return Vec::new();
        }
        let output = match self.git.run(root, &["shortlog", "-sne", "--all"]) {
            Ok(out) => out,
            Err(e) => {
                tracing::debug!(error = %e, root = %root.display(), "git shortlog failed");
                return Vec::new();
            }
        };
        let mut seen = BTreeSet::new();
        parse_shortlog(&output)
            .into_iter()
            .filter(|e| !BOT_IDENTITIES.contains(&e.name.as_str()))
            .filter_map(|e| {
                let key = if e.email.is_empty() {
                    e.name.to_lowercase()
                } else {
                    e.email.to_lowercase()
                };
                seen.insert(key.clone()).then_some(key)
            })
            .collect()
    }

    /// Distinct file owners: UIDs when more than one, else GIDs, else whichever exists.
    pub fn ownership_identities(&self, root: &Path) -> Vec<String> {
        let (uids, gids) = self.owner_ids(root);
        let uids: Vec<String> = uids.into_iter().map(|u| format!("uid:{u}")).collect();
        let gids: Vec<String> = gids.into_iter().map(|g| format!("gid:{g}")).collect();
        if uids.len() > 1 {
            uids
        } else if gids.len() > 1 {
            gids
        } else if !uids.is_empty() {
            uids
        } else {
            gids
        }
    }

    #[cfg(unix)]
    fn owner_ids(&self, root: &Path) -> (BTreeSet<u32>, BTreeSet<u32>) {
        use std::os::unix::fs::MetadataExt;
        let mut uids = BTreeSet::new();
        let mut gids = BTreeSet::new();
        for path in self.files(root) {
            match fs::metadata(&path) {
                Ok(meta) => {
                    uids.insert(meta.uid());
                    gids.insert(meta.gid());
                }
                Err(e) => {
                    tracing::debug!(error = %e, path = %path.display(), "skipping file without metadata")
                }
            }
        }
        (uids, gids)
    }

    #[cfg(not(unix))]
    fn owner_ids(&self, _root: &Path) -> (BTreeSet<u32>, BTreeSet<u32>) {
        (BTreeSet::new(), BTreeSet::new())
    }

    /// Distinct author names from `.docx` core properties and `.pdf` info dictionaries.
    pub fn document_authors(&self, root: &Path) -> Vec<String> {
        let mut authors = BTreeSet::new();
        for path in self.files(root) {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let found = match ext.as_str() {
                "docx" => docx_authors(&path),
                "pdf" => pdf_authors(&path),
                _ => continue,
            };
            match found {
                Ok(names) => authors.extend(names.into_iter().filter(|n| is_real_author(n))),
                Err(e) => {
                    tracing::debug!(error = %e, path = %path.display(), "skipping unreadable document")
                }
            }
        }
        authors.into_iter().collect()
    }

    fn files(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !self.ignore.contains(&e.file_name().to_string_lossy()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }
}

fn is_real_author(name: &str) -> bool {
    !name.is_empty() && !PLACEHOLDER_AUTHORS.contains(&name)
}

fn docx_authors(path: &Path) -> Result<Vec<String>, DocumentError> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    let mut xml = String::new();
    archive.by_name(DOCX_CORE_PROPERTIES)?.read_to_string(&mut xml)?;
    core_property_authors(&xml)
}

/// Text of the author elements in a `core.xml`, entities decoded.
fn core_property_authors(xml: &str) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut authors = Vec::new();
    let mut current: Option<String> = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = DOCX_AUTHOR_ELEMENTS
                    .contains(&e.name().as_ref())
                    .then(String::new);
            }
            Ok(Event::Text(t)) => {
                if let Some(text) = current.as_mut() {
                    let decoded = t.unescape().map_err(|e| DocumentError::Xml(e.to_string()))?;
                    text.push_str(&decoded);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(text) = current.take() {
                    authors.push(text.trim().to_string());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DocumentError::Xml(e.to_string())),
        }
    }
    Ok(authors)
}

/// `/Author` from the trailer's Info dictionary, wherever the parser found it.
fn pdf_authors(path: &Path) -> Result<Vec<String>, DocumentError> {
    let doc = Document::load(path).map_err(|e| DocumentError::Pdf(e.to_string()))?;
    let Some(info) = doc.trailer.get(b"Info").ok().and_then(|o| resolve(&doc, o)) else {
        return Ok(Vec::new());
    };
    let Ok(dict) = info.as_dict() else {
        return Ok(Vec::new());
    };
    let author = dict.get(b"Author").ok().and_then(|o| resolve(&doc, o));
    Ok(match author {
        Some(Object::String(bytes, _)) => vec![decode_pdf_text(bytes).trim().to_string()],
        _ => Vec::new(),
    })
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Decodes a PDF text string: UTF-16 or UTF-8 with a byte-order mark, else PDFDocEncoding.
fn decode_pdf_text(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => utf16(rest, u16::from_be_bytes),
        [0xFF, 0xFE, rest @ ..] => utf16(rest, u16::from_le_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => bytes.iter().map(|&b| pdf_doc_char(b)).collect(),
    }
}

fn utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]])).collect();
    String::from_utf16_lossy(&units)
}

fn pdf_doc_char(byte: u8) -> char {
    match byte {
        0x18..=0x1F => PDF_DOC_ACCENTS[usize::from(byte - 0x18)],
        0x80..=0xA0 => PDF_DOC_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::RecordingGit;
    use artimine_test_utils::ProjectFixture;
    use lopdf::StringFormat;

    fn core_xml(creator: &str, modified_by: &str) -> String {
        format!(
            "<?xml version=\"1.0\"?><cp:coreProperties><dc:creator>{creator}</dc:creator>\
             <cp:lastModifiedBy>{modified_by}</cp:lastModifiedBy></cp:coreProperties>"
        )
    }

    #[test]
    fn git_authors_exclude_bots_and_duplicates() {
        let git = RecordingGit::new().respond("rev-parse", "true\n").respond(
            "shortlog",
            "5\tAna <ana@example.com>\n3\tANA <Ana@Example.com>\n2\tdependabot[bot] <bot@github.com>\n1\tGitHub <noreply@github.com>\n4\tBo <bo@example.com>\n",
        );
        let detector = CollabDetector::new(&git, IgnorePatterns::default());
        let estimate = detector.estimate(Path::new("/repo"));
        assert_eq!(estimate.source, CollaboratorSource::Git);
        assert_eq!(estimate.count, 2);
        assert_eq!(estimate.identities, vec!["ana@example.com", "bo@example.com"]);
    }

    #[test]
    fn shortlog_is_skipped_outside_repositories() {
        let fixture = ProjectFixture::with_files(&[("a.txt", "")]).unwrap();
        let git = RecordingGit::new().respond("rev-parse", "false\n");
        let detector = CollabDetector::new(&git, IgnorePatterns::default());
        assert_eq!(detector.number_of_collaborators(fixture.root()), 1);
        assert!(!git.was_called("shortlog"));
    }

    fn write_pdf(path: &Path, author: Object) {
        use lopdf::dictionary;
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => Object::Integer(0),
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! { "Author" => author });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.save(path).unwrap();
    }

    fn literal(bytes: &[u8]) -> Object {
        Object::String(bytes.to_vec(), StringFormat::Literal)
    }

    #[test]
    fn document_metadata_counts_distinct_authors() {
        let fixture = ProjectFixture::new().unwrap();
        let xml = core_xml("Ana", "python-docx");
        fixture
            .write_zip("report.docx", &[(DOCX_CORE_PROPERTIES, xml.as_str())])
            .unwrap();
        write_pdf(&fixture.root().join("slides.pdf"), literal(b"Bo"));
        write_pdf(&fixture.root().join("anon.pdf"), literal(b"Unknown"));
        fixture.write("broken.docx", "not a zip").unwrap();
        fixture.write("broken.pdf", "%PDF-1.4\ngarbage").unwrap();

        let detector = CollabDetector::new(RecordingGit::new(), IgnorePatterns::default());
        assert_eq!(detector.document_authors(fixture.root()), vec!["Ana", "Bo"]);
    }

    #[test]
    fn docx_author_entities_are_decoded() {
        let xml = core_xml("Smith &amp; Sons", "Zo&#235; O&apos;Neil");
        assert_eq!(
            core_property_authors(&xml).unwrap(),
            vec!["Smith & Sons", "Zo\u{eb} O'Neil"]
        );
    }

    #[test]
    fn pdf_authors_decode_every_string_form() {
        let fixture = ProjectFixture::new().unwrap();
        let cases: [(&str, Object, &str); 4] = [
            (
                "utf16.pdf",
                literal(&[0xFE, 0xFF, 0x00, b'Z', 0x00, b'o', 0x00, 0xEB]),
                "Zo\u{eb}",
            ),
            (
                "hex.pdf",
                Object::String(
                    vec![0xFE, 0xFF, 0x00, b'B', 0x00, b'o'],
                    StringFormat::Hexadecimal,
                ),
                "Bo",
            ),
            ("parens.pdf", literal(b"O(Brien)"), "O(Brien)"),
            ("latin.pdf", literal(&[b'R', 0xE9, b'a']), "R\u{e9}a"),
        ];
        for (name, author, expected) in cases {
            let path = fixture.root().join(name);
            write_pdf(&path, author);
            assert_eq!(pdf_authors(&path).unwrap(), vec![expected], "{name}");
        }
    }

    #[test]
    fn pdf_text_strings_follow_byte_order_marks() {
        assert_eq!(decode_pdf_text(&[0xFE, 0xFF, 0x00, b'A', 0x01, 0x41]), "A\u{141}");
        assert_eq!(decode_pdf_text(&[0xFF, 0xFE, b'A', 0x00]), "A");
        assert_eq!(decode_pdf_text(&[0xEF, 0xBB, 0xBF, 0xC3, 0xA9]), "\u{e9}");
        assert_eq!(decode_pdf_text(&[0x93, b'x', 0xA0]), "\u{fb01}x\u{20ac}");
    }

    #[test]
    fn single_owner_and_single_author_is_solo() {
        let fixture = ProjectFixture::with_files(&[("main.py", ""), ("lib.py", "")]).unwrap();
        let detector = CollabDetector::new(RecordingGit::new(), IgnorePatterns::default());
        let estimate = detector.estimate(fixture.root());
        assert_eq!(estimate, CollaboratorEstimate::solo());
    }

    #[cfg(unix)]
    #[test]
    fn single_uid_reports_one_identity() {
        let fixture = ProjectFixture::with_files(&[("a.py", ""), ("b.py", "")]).unwrap();
        let detector = CollabDetector::new(RecordingGit::new(), IgnorePatterns::default());
        let ids = detector.ownership_identities(fixture.root());
        assert_eq!(ids.len(), 1);
        assert!(ids[0].starts_with("uid:"));
    }
}
