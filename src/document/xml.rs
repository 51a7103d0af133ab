/*!
 * WordprocessingML body reader and writer.
 *
 * Parsing walks `word/document.xml` with quick-xml and keeps byte offsets so
 * that every element the model does not interpret is captured verbatim.
 * Writing reassembles the body from the model, re-emitting verbatim pieces
 * at their recorded positions and regenerating only runs whose text changed.
 */

use log::debug;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use super::model::{Alignment, BodyItem, Document, Fragments, Paragraph, Run, RunFormatting, Table, TableCell, TableRow};
use crate::errors::DocumentError;

/// Extract an attribute value by key from an element
fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(Result::ok)
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Read an on/off property such as `<w:b/>` or `<w:b w:val="0"/>`
fn toggle_value(e: &BytesStart) -> bool {
    !matches!(get_attr(e, b"w:val").as_deref(), Some("0" | "false" | "off"))
}

/// Parse the character formatting carried by a raw `w:rPr`
pub(crate) fn parse_run_formatting(xml: &str) -> RunFormatting {
    let mut formatting = RunFormatting::default();
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:b" => formatting.bold = Some(toggle_value(&e)),
                b"w:i" => formatting.italic = Some(toggle_value(&e)),
                b"w:strike" => formatting.strike = Some(toggle_value(&e)),
                b"w:u" => {
                    formatting.underline = Some(!matches!(get_attr(&e, b"w:val").as_deref(), Some("none")))
                }
                b"w:sz" => formatting.font_size_half_points = get_attr(&e, b"w:val").and_then(|v| v.parse().ok()),
                b"w:color" => formatting.color = get_attr(&e, b"w:val"),
                b"w:rFonts" => formatting.font = get_attr(&e, b"w:ascii"),
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    formatting
}

/// Parse alignment and style id from a raw `w:pPr`
fn parse_paragraph_properties(xml: &str) -> (Option<Alignment>, Option<String>) {
    let mut alignment = None;
    let mut style = None;
    let mut reader = Reader::from_str(xml);
    // Skip nested run properties (paragraph mark formatting)
    let mut in_rpr = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:rPr" => in_rpr = true,
            Ok(Event::End(e)) if e.name().as_ref() == b"w:rPr" => in_rpr = false,
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if !in_rpr => match e.name().as_ref() {
                b"w:jc" => alignment = get_attr(&e, b"w:val").map(|v| Alignment::from_val(&v)),
                b"w:pStyle" => style = get_attr(&e, b"w:val"),
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    (alignment, style)
}

/// Offset-tracking pull parser over the document part
struct BodyParser<'a> {
    xml: &'a str,
    reader: Reader<&'a [u8]>,
}

impl<'a> BodyParser<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            xml,
            reader: Reader::from_str(xml),
        }
    }

    /// Next event with the byte offset it starts at
    fn next(&mut self) -> Result<(usize, Event<'a>), DocumentError> {
        let start = self.reader.buffer_position();
        let event = self.reader.read_event()?;
        Ok((start, event))
    }

    fn position(&self) -> usize {
        self.reader.buffer_position()
    }

    /// Source text between `start` and the current position
    fn slice_from(&self, start: usize) -> String {
        self.xml[start..self.position()].to_string()
    }

    /// Skip the rest of an element whose start tag was just read
    fn capture_element(&mut self, start: usize, e: &BytesStart<'a>) -> Result<String, DocumentError> {
        self.reader.read_to_end(e.name())?;
        Ok(self.slice_from(start))
    }

    fn unexpected_eof(context: &str) -> DocumentError {
        DocumentError::Malformed(format!("unexpected end of document inside {}", context))
    }

    fn parse_document(mut self) -> Result<Document, DocumentError> {
        let mut document = Document::new();
        document.head.clear();
        document.tail.clear();

        // Everything up to and including <w:body> is kept as the head
        loop {
            let (start, event) = self.next()?;
            match event {
                Event::Start(e) if e.name().as_ref() == b"w:body" => {
                    document.head = self.xml[..self.position()].to_string();
                    break;
                }
                Event::Empty(e) if e.name().as_ref() == b"w:body" => {
                    document.head = format!("{}<w:body>", &self.xml[..start]);
                    document.tail = format!("</w:body>{}", &self.xml[self.position()..]);
                    return Ok(document);
                }
                Event::Eof => return Err(DocumentError::Malformed("document has no w:body element".to_string())),
                _ => {}
            }
        }

        loop {
            let (start, event) = self.next()?;
            match event {
                Event::Start(e) if e.name().as_ref() == b"w:p" => {
                    let tag = self.slice_from(start);
                    let paragraph = self.parse_paragraph(tag)?;
                    document.push_paragraph(paragraph);
                }
                Event::Empty(e) if e.name().as_ref() == b"w:p" => {
                    let paragraph = Paragraph {
                        tag: Some(self.slice_from(start)),
                        ..Paragraph::default()
                    };
                    document.push_paragraph(paragraph);
                }
                Event::Start(e) if e.name().as_ref() == b"w:tbl" => {
                    let tag = self.slice_from(start);
                    let table = self.parse_table(tag)?;
                    document.push_table(table);
                }
                Event::Start(e) => {
                    let raw = self.capture_element(start, &e)?;
                    document.layout.push(BodyItem::Raw(raw));
                }
                Event::End(e) if e.name().as_ref() == b"w:body" => {
                    document.tail = self.xml[start..].to_string();
                    break;
                }
                Event::End(_) => {
                    return Err(DocumentError::Malformed("unbalanced element inside w:body".to_string()));
                }
                Event::Eof => return Err(Self::unexpected_eof("w:body")),
                _ => {
                    let raw = self.slice_from(start);
                    document.layout.push(BodyItem::Raw(raw));
                }
            }
        }

        debug!(
            "Parsed document body: {} paragraphs, {} tables",
            document.paragraphs.len(),
            document.tables.len()
        );
        Ok(document)
    }

    /// Runs inside inline wrappers (links, tracked insertions, content
    /// controls) join the paragraph's run list; the wrapper tags are kept as
    /// fragments around them.
    fn parse_paragraph(&mut self, tag: String) -> Result<Paragraph, DocumentError> {
        let mut paragraph = Paragraph {
            tag: Some(tag),
            ..Paragraph::default()
        };
        let mut wrappers: Vec<Vec<u8>> = Vec::new();
        loop {
            let (start, event) = self.next()?;
            match event {
                Event::Start(e) if is_inline_wrapper(e.name().as_ref()) => {
                    wrappers.push(e.name().as_ref().to_vec());
                    paragraph.fragments.push(paragraph.runs.len(), self.slice_from(start));
                }
                Event::End(e) if wrappers.last().is_some_and(|name| name.as_slice() == e.name().as_ref()) => {
                    wrappers.pop();
                    paragraph.fragments.push(paragraph.runs.len(), self.slice_from(start));
                }
                Event::Start(e) if e.name().as_ref() == b"w:pPr" => {
                    let raw = self.capture_element(start, &e)?;
                    let (alignment, style) = parse_paragraph_properties(&raw);
                    paragraph.alignment = alignment;
                    paragraph.style = style;
                    paragraph.properties = Some(raw);
                }
                Event::Empty(e) if e.name().as_ref() == b"w:pPr" => {
                    paragraph.properties = Some(self.slice_from(start));
                }
                Event::Start(e) if e.name().as_ref() == b"w:r" => {
                    let tag = self.slice_from(start);
                    let run = self.parse_run(start, tag)?;
                    paragraph.runs.push(run);
                }
                Event::Empty(e) if e.name().as_ref() == b"w:r" => {
                    let raw = self.slice_from(start);
                    paragraph.runs.push(Run {
                        tag: Some(open_tag_of_empty(&raw)),
                        original: Some(raw),
                        ..Run::new("")
                    });
                }
                Event::Start(e) => {
                    let raw = self.capture_element(start, &e)?;
                    paragraph.fragments.push(paragraph.runs.len(), raw);
                }
                Event::End(e) if e.name().as_ref() == b"w:p" && wrappers.is_empty() => return Ok(paragraph),
                Event::End(_) => {
                    return Err(DocumentError::Malformed("unbalanced element inside w:p".to_string()));
                }
                Event::Eof => return Err(Self::unexpected_eof("w:p")),
                _ => {
                    let raw = self.slice_from(start);
                    paragraph.fragments.push(paragraph.runs.len(), raw);
                }
            }
        }
    }

    fn parse_run(&mut self, run_start: usize, tag: String) -> Result<Run, DocumentError> {
        let mut run = Run {
            tag: Some(tag),
            ..Run::new("")
        };
        let mut seen_text = false;
        loop {
            let (start, event) = self.next()?;
            match event {
                Event::Start(e) if e.name().as_ref() == b"w:rPr" => {
                    let raw = self.capture_element(start, &e)?;
                    run.formatting = parse_run_formatting(&raw);
                    run.properties = Some(raw);
                }
                Event::Empty(e) if e.name().as_ref() == b"w:rPr" => {
                    run.properties = Some(self.slice_from(start));
                }
                Event::Start(e) if e.name().as_ref() == b"w:t" => {
                    self.read_text_content(&mut run.text)?;
                    seen_text = true;
                }
                Event::Empty(e) if e.name().as_ref() == b"w:t" => {
                    seen_text = true;
                }
                Event::Empty(e) if e.name().as_ref() == b"w:tab" => {
                    run.text.push('\t');
                    seen_text = true;
                }
                Event::Empty(e) if e.name().as_ref() == b"w:cr" => {
                    run.text.push('\n');
                    seen_text = true;
                }
                Event::Empty(e)
                    if e.name().as_ref() == b"w:br"
                        && matches!(get_attr(&e, b"w:type").as_deref(), None | Some("textWrapping")) =>
                {
                    run.text.push('\n');
                    seen_text = true;
                }
                Event::Start(e) => {
                    let raw = self.capture_element(start, &e)?;
                    push_embedded(&mut run, seen_text, raw);
                }
                Event::Empty(_) => {
                    let raw = self.slice_from(start);
                    push_embedded(&mut run, seen_text, raw);
                }
                Event::End(e) if e.name().as_ref() == b"w:r" => {
                    run.original = Some(self.slice_from(run_start));
                    return Ok(run);
                }
                Event::End(_) => {
                    return Err(DocumentError::Malformed("unbalanced element inside w:r".to_string()));
                }
                Event::Eof => return Err(Self::unexpected_eof("w:r")),
                // Whitespace and comments between run children carry no content
                _ => {}
            }
        }
    }

    fn read_text_content(&mut self, text: &mut String) -> Result<(), DocumentError> {
        loop {
            let (_, event) = self.next()?;
            match event {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::End(e) if e.name().as_ref() == b"w:t" => return Ok(()),
                Event::Eof => return Err(Self::unexpected_eof("w:t")),
                _ => {}
            }
        }
    }

    fn parse_table(&mut self, tag: String) -> Result<Table, DocumentError> {
        let mut table = Table {
            tag: Some(tag),
            ..Table::new(Vec::new())
        };
        loop {
            let (start, event) = self.next()?;
            match event {
                Event::Start(e) if e.name().as_ref() == b"w:tr" => {
                    let tag = self.slice_from(start);
                    let row = self.parse_row(tag)?;
                    table.rows.push(row);
                }
                Event::Start(e) => {
                    let raw = self.capture_element(start, &e)?;
                    table.fragments.push(table.rows.len(), raw);
                }
                Event::End(e) if e.name().as_ref() == b"w:tbl" => return Ok(table),
                Event::End(_) => {
                    return Err(DocumentError::Malformed("unbalanced element inside w:tbl".to_string()));
                }
                Event::Eof => return Err(Self::unexpected_eof("w:tbl")),
                _ => {
                    let raw = self.slice_from(start);
                    table.fragments.push(table.rows.len(), raw);
                }
            }
        }
    }

    fn parse_row(&mut self, tag: String) -> Result<TableRow, DocumentError> {
        let mut row = TableRow {
            tag: Some(tag),
            ..TableRow::new(Vec::new())
        };
        loop {
            let (start, event) = self.next()?;
            match event {
                Event::Start(e) if e.name().as_ref() == b"w:tc" => {
                    let tag = self.slice_from(start);
                    let cell = self.parse_cell(tag)?;
                    row.cells.push(cell);
                }
                Event::Start(e) => {
                    let raw = self.capture_element(start, &e)?;
                    row.fragments.push(row.cells.len(), raw);
                }
                Event::End(e) if e.name().as_ref() == b"w:tr" => return Ok(row),
                Event::End(_) => {
                    return Err(DocumentError::Malformed("unbalanced element inside w:tr".to_string()));
                }
                Event::Eof => return Err(Self::unexpected_eof("w:tr")),
                _ => {
                    let raw = self.slice_from(start);
                    row.fragments.push(row.cells.len(), raw);
                }
            }
        }
    }

    fn parse_cell(&mut self, tag: String) -> Result<TableCell, DocumentError> {
        let mut cell = TableCell {
            tag: Some(tag),
            paragraphs: Vec::new(),
            fragments: Fragments::default(),
        };
        loop {
            let (start, event) = self.next()?;
            match event {
                Event::Start(e) if e.name().as_ref() == b"w:p" => {
                    let tag = self.slice_from(start);
                    let paragraph = self.parse_paragraph(tag)?;
                    cell.paragraphs.push(paragraph);
                }
                Event::Empty(e) if e.name().as_ref() == b"w:p" => {
                    cell.paragraphs.push(Paragraph {
                        tag: Some(self.slice_from(start)),
                        ..Paragraph::default()
                    });
                }
                // Nested tables are kept verbatim
                Event::Start(e) => {
                    let raw = self.capture_element(start, &e)?;
                    cell.fragments.push(cell.paragraphs.len(), raw);
                }
                Event::End(e) if e.name().as_ref() == b"w:tc" => return Ok(cell),
                Event::End(_) => {
                    return Err(DocumentError::Malformed("unbalanced element inside w:tc".to_string()));
                }
                Event::Eof => return Err(Self::unexpected_eof("w:tc")),
                _ => {
                    let raw = self.slice_from(start);
                    cell.fragments.push(cell.paragraphs.len(), raw);
                }
            }
        }
    }
}

/// Inline elements whose runs are part of the paragraph text
fn is_inline_wrapper(name: &[u8]) -> bool {
    matches!(
        name,
        b"w:hyperlink" | b"w:ins" | b"w:moveTo" | b"w:smartTag" | b"w:fldSimple" | b"w:sdt" | b"w:sdtContent" | b"w:customXml"
    )
}

fn push_embedded(run: &mut Run, seen_text: bool, raw: String) {
    if seen_text {
        run.trailing.push(raw);
    } else {
        run.leading.push(raw);
    }
}

/// Turn a self-closing tag (`<w:p w:rsidR="1"/>`) into an opening tag
fn open_tag_of_empty(raw: &str) -> String {
    let trimmed = raw.trim_end();
    match trimmed.strip_suffix("/>") {
        Some(head) => format!("{}>", head.trim_end()),
        None => trimmed.to_string(),
    }
}

/// Name of the element an opening tag belongs to
fn tag_name(open_tag: &str) -> &str {
    open_tag
        .trim_start_matches('<')
        .split(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .next()
        .unwrap_or_default()
}

/// Serializer for the document part
struct BodyWriter {
    writer: Writer<Vec<u8>>,
}

impl BodyWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn raw(&mut self, xml: &str) {
        self.writer.get_mut().extend_from_slice(xml.as_bytes());
    }

    fn open(&mut self, tag: Option<&str>, default: &'static str) -> String {
        let tag = tag.map(open_tag_of_empty).unwrap_or_else(|| default.to_string());
        self.raw(&tag);
        format!("</{}>", tag_name(&tag))
    }

    fn write_document(&mut self, document: &Document) -> Result<(), DocumentError> {
        self.raw(&document.head);
        for item in &document.layout {
            match item {
                BodyItem::Paragraph(index) => self.write_paragraph(&document.paragraphs[*index])?,
                BodyItem::Table(index) => self.write_table(&document.tables[*index])?,
                BodyItem::Raw(xml) => self.raw(xml),
            }
        }
        self.raw(&document.tail);
        Ok(())
    }

    fn write_paragraph(&mut self, paragraph: &Paragraph) -> Result<(), DocumentError> {
        // Self-closing source paragraphs that are still empty stay self-closing
        if let Some(tag) = paragraph.tag.as_deref().filter(|t| t.ends_with("/>")) {
            if paragraph.runs.is_empty() && paragraph.properties.is_none() && paragraph.fragments.is_empty() {
                self.raw(tag);
                return Ok(());
            }
        }
        let close = self.open(paragraph.tag.as_deref(), "<w:p>");
        if let Some(properties) = &paragraph.properties {
            self.raw(properties);
        }
        for (index, run) in paragraph.runs.iter().enumerate() {
            for xml in paragraph.fragments.before(index) {
                self.raw(xml);
            }
            self.write_run(run)?;
        }
        for xml in paragraph.fragments.trailing(paragraph.runs.len()) {
            self.raw(xml);
        }
        self.raw(&close);
        Ok(())
    }

    fn write_run(&mut self, run: &Run) -> Result<(), DocumentError> {
        if let Some(original) = &run.original {
            self.raw(original);
            return Ok(());
        }
        let close = self.open(run.tag.as_deref(), "<w:r>");
        if let Some(properties) = &run.properties {
            self.raw(properties);
        }
        for xml in &run.leading {
            self.raw(xml);
        }
        self.write_run_text(&run.text)?;
        for xml in &run.trailing {
            self.raw(xml);
        }
        self.raw(&close);
        Ok(())
    }

    /// Emit run text as `w:t` segments separated by tabs and breaks
    fn write_run_text(&mut self, text: &str) -> Result<(), DocumentError> {
        let mut segment = String::new();
        for ch in text.chars() {
            match ch {
                '\t' | '\n' => {
                    self.flush_segment(&mut segment)?;
                    let name = if ch == '\t' { "w:tab" } else { "w:br" };
                    self.writer.write_event(Event::Empty(BytesStart::new(name)))?;
                }
                '\r' => {}
                _ => segment.push(ch),
            }
        }
        self.flush_segment(&mut segment)
    }

    fn flush_segment(&mut self, segment: &mut String) -> Result<(), DocumentError> {
        if segment.is_empty() {
            return Ok(());
        }
        let start = BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]);
        self.writer.write_event(Event::Start(start))?;
        self.writer.write_event(Event::Text(BytesText::new(segment.as_str())))?;
        self.writer.write_event(Event::End(BytesEnd::new("w:t")))?;
        segment.clear();
        Ok(())
    }

    fn write_table(&mut self, table: &Table) -> Result<(), DocumentError> {
        let close = self.open(table.tag.as_deref(), "<w:tbl>");
        if table.tag.is_none() && table.fragments.is_empty() {
            self.raw(r#"<w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/></w:tblPr>"#);
            let columns = table.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
            self.raw("<w:tblGrid>");
            for _ in 0..columns {
                self.raw("<w:gridCol/>");
            }
            self.raw("</w:tblGrid>");
        }
        for (index, row) in table.rows.iter().enumerate() {
            for xml in table.fragments.before(index) {
                self.raw(xml);
            }
            self.write_row(row)?;
        }
        for xml in table.fragments.trailing(table.rows.len()) {
            self.raw(xml);
        }
        self.raw(&close);
        Ok(())
    }

    fn write_row(&mut self, row: &TableRow) -> Result<(), DocumentError> {
        let close = self.open(row.tag.as_deref(), "<w:tr>");
        for (index, cell) in row.cells.iter().enumerate() {
            for xml in row.fragments.before(index) {
                self.raw(xml);
            }
            self.write_cell(cell)?;
        }
        for xml in row.fragments.trailing(row.cells.len()) {
            self.raw(xml);
        }
        self.raw(&close);
        Ok(())
    }

    fn write_cell(&mut self, cell: &TableCell) -> Result<(), DocumentError> {
        let close = self.open(cell.tag.as_deref(), "<w:tc>");
        for (index, paragraph) in cell.paragraphs.iter().enumerate() {
            for xml in cell.fragments.before(index) {
                self.raw(xml);
            }
            self.write_paragraph(paragraph)?;
        }
        for xml in cell.fragments.trailing(cell.paragraphs.len()) {
            self.raw(xml);
        }
        self.raw(&close);
        Ok(())
    }

    fn finish(self) -> Result<String, DocumentError> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| DocumentError::Encoding {
            part: "document body".to_string(),
            message: e.to_string(),
        })
    }
}

impl Document {
    /// Parse the XML of a main document part
    pub fn from_xml(xml: &str) -> Result<Self, DocumentError> {
        BodyParser::new(xml).parse_document()
    }

    /// Serialize back to main document part XML
    pub fn to_xml(&self) -> Result<String, DocumentError> {
        let mut writer = BodyWriter::new();
        writer.write_document(self)?;
        writer.finish()
    }
}
