/*!
 * Word package (`.docx`) container handling.
 *
 * A package is a ZIP archive of parts. Only the main document part is
 * parsed; every other part is carried as bytes and written back unchanged,
 * in its original order and with its original compression method.
 */

use std::io::{Cursor, Read, Write};
use std::path::Path;

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::Event;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::model::Document;
use crate::errors::DocumentError;

/// Part name used when the package relationships do not name one
pub const DEFAULT_MAIN_PART: &str = "word/document.xml";

const PACKAGE_RELATIONSHIPS: &str = "_rels/.rels";
const OFFICE_DOCUMENT_RELATIONSHIP: &str = "/officeDocument";

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" "#,
    r#"ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    "</Types>"
);

const ROOT_RELATIONSHIPS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" "#,
    r#"Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" "#,
    r#"Target="word/document.xml"/>"#,
    "</Relationships>"
);

/// One entry of the archive
#[derive(Debug, Clone)]
struct PackagePart {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// An opened Word package with its parsed main document
#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<PackagePart>,
    main_part: String,
    document: Document,
}

impl DocxPackage {
    /// Read a package from its bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            // Sizes in the archive headers are not trusted for allocation
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            parts.push(PackagePart {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        let main_part = parts
            .iter()
            .find(|p| p.name == PACKAGE_RELATIONSHIPS)
            .and_then(|p| main_part_from_relationships(&p.data))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        let main = parts
            .iter()
            .find(|p| p.name == main_part)
            .ok_or_else(|| DocumentError::MissingPart(main_part.clone()))?;
        let xml = decode_part(&main_part, &main.data)?;
        let document = Document::from_xml(xml)?;

        debug!("Opened package with {} parts, main part {}", parts.len(), main_part);

        Ok(Self {
            parts,
            main_part,
            document,
        })
    }

    /// Read a package from a file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Wrap an in-memory document in a minimal package
    pub fn from_document(document: Document) -> Self {
        let part = |name: &str, data: &str| PackagePart {
            name: name.to_string(),
            data: data.as_bytes().to_vec(),
            compression: CompressionMethod::Deflated,
            is_dir: false,
        };
        Self {
            parts: vec![
                part("[Content_Types].xml", CONTENT_TYPES_XML),
                part(PACKAGE_RELATIONSHIPS, ROOT_RELATIONSHIPS_XML),
                part(DEFAULT_MAIN_PART, ""),
            ],
            main_part: DEFAULT_MAIN_PART.to_string(),
            document,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Name of the main document part
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Names of all parts in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Raw bytes of a part; the main part reflects the last read, not edits
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.iter().find(|p| p.name == name).map(|p| p.data.as_slice())
    }

    /// Serialize the package, regenerating the main document part
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let document_xml = self.document.to_xml()?;
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for part in &self.parts {
            let options = SimpleFileOptions::default().compression_method(writable_method(part.compression));
            if part.is_dir {
                zip.add_directory(part.name.as_str(), options)?;
                continue;
            }
            zip.start_file(part.name.as_str(), options)?;
            if part.name == self.main_part {
                zip.write_all(document_xml.as_bytes())?;
            } else {
                zip.write_all(&part.data)?;
            }
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Write the package to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}

/// Methods this build can write; anything else is recompressed
fn writable_method(method: CompressionMethod) -> CompressionMethod {
    match method {
        CompressionMethod::Stored => CompressionMethod::Stored,
        CompressionMethod::Deflated => CompressionMethod::Deflated,
        other => {
            warn!("Recompressing part stored with {:?} as deflate", other);
            CompressionMethod::Deflated
        }
    }
}

fn decode_part<'a>(name: &str, data: &'a [u8]) -> Result<&'a str, DocumentError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    std::str::from_utf8(data).map_err(|e| DocumentError::Encoding {
        part: name.to_string(),
        message: e.to_string(),
    })
}

/// Target of the officeDocument relationship in `_rels/.rels`
fn main_part_from_relationships(data: &[u8]) -> Option<String> {
    let xml = std::str::from_utf8(data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data)).ok()?;
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut rel_type = None;
                let mut target = None;
                for attr in e.attributes().filter_map(Result::ok) {
                    let value = attr.unescape_value().ok()?.into_owned();
                    match attr.key.as_ref() {
                        b"Type" => rel_type = Some(value),
                        b"Target" => target = Some(value),
                        _ => {}
                    }
                }
                if rel_type.is_some_and(|t| t.ends_with(OFFICE_DOCUMENT_RELATIONSHIP)) {
                    return target.map(|t| t.trim_start_matches('/').to_string());
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}
