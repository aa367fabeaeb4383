//! Minimal PPTX packages assembled in memory for tests.

use crate::xml::{XmlDocument, XmlElement};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

enum SlideRel {
    Image(String),
    Hyperlink(String, String),
    Notes(String),
    SlideLink(String, usize),
    Chart(String),
}

/// Shapes and relationships of one fixture slide.
#[derive(Default)]
pub struct SlideBuilder {
    shapes: Vec<String>,
    rels: Vec<SlideRel>,
}

impl SlideBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> usize {
        self.shapes.len() + 2
    }

    fn next_rel(&self) -> String {
        format!("rId{}", self.rels.len() + 2)
    }

    /// A text box; `\n` separates paragraphs.
    pub fn text_shape(self, name: &str, text: &str) -> Self {
        self.text_shape_with(name, text, None, None)
    }

    /// A text box with an explicit autofit element and font size (hundredths of a point).
    pub fn text_shape_with(
        mut self,
        name: &str,
        text: &str,
        autofit: Option<&str>,
        size: Option<u32>,
    ) -> Self {
        let body_props = match autofit {
            Some(el) => format!("<a:bodyPr><a:{}/></a:bodyPr>", el),
            None => "<a:bodyPr/>".to_string(),
        };
        let size = size.map(|sz| format!(r#" sz="{}""#, sz)).unwrap_or_default();
        let paragraphs: String = text
            .split('\n')
            .map(|line| paragraph(line, &size))
            .collect();
        let xml = format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody>{}<a:lstStyle/>{}</p:txBody></p:sp>"#,
            self.next_id(),
            escape(name),
            body_props,
            paragraphs
        );
        self.shapes.push(xml);
        self
    }

    /// A text box with a single empty paragraph.
    pub fn empty_text_shape(self, name: &str) -> Self {
        self.text_shape(name, "")
    }

    /// A text box without a name.
    pub fn unnamed_text_shape(self, text: &str) -> Self {
        self.text_shape("", text)
    }

    pub fn table(mut self, name: &str, rows: &[&[&str]]) -> Self {
        self.shapes.push(table_xml(self.next_id(), name, rows));
        self
    }

    /// A picture with its own image part.
    pub fn picture(mut self, name: &str) -> Self {
        let rel = self.next_rel();
        self.shapes.push(format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="{}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr/></p:pic>"#,
            self.next_id(),
            escape(name),
            rel
        ));
        self.rels.push(SlideRel::Image(rel));
        self
    }

    /// An external hyperlink relationship.
    pub fn hyperlink(mut self, url: &str) -> Self {
        let rel = self.next_rel();
        self.rels.push(SlideRel::Hyperlink(rel, url.to_string()));
        self
    }

    /// A notes slide for this slide.
    pub fn notes(mut self) -> Self {
        let rel = self.next_rel();
        self.rels.push(SlideRel::Notes(rel));
        self
    }

    /// An internal link to another slide of the deck (1-based part number),
    /// as written for navigation buttons.
    pub fn slide_link(mut self, number: usize) -> Self {
        let rel = self.next_rel();
        self.rels.push(SlideRel::SlideLink(rel, number));
        self
    }

    /// A chart frame whose chart part embeds a workbook.
    pub fn chart(mut self, name: &str) -> Self {
        let rel = self.next_rel();
        self.shapes.push(format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{}" name="{}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="0"/><a:ext cx="6096000" cy="4064000"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="{}"/></a:graphicData></a:graphic></p:graphicFrame>"#,
            self.next_id(),
            escape(name),
            rel
        ));
        self.rels.push(SlideRel::Chart(rel));
        self
    }

    fn slide_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
            NS,
            self.shapes.concat()
        )
    }
}

fn paragraph(line: &str, size: &str) -> String {
    if line.is_empty() {
        format!(r#"<a:p><a:endParaRPr lang="en-US"{}/></a:p>"#, size)
    } else {
        format!(
            r#"<a:p><a:r><a:rPr lang="en-US"{} dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
            size,
            escape(line)
        )
    }
}

fn table_xml(id: usize, name: &str, rows: &[&[&str]]) -> String {
    let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let grid: String = (0..columns).map(|_| r#"<a:gridCol w="3048000"/>"#).collect();
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| {
                    format!(
                        r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/>{}</a:txBody><a:tcPr><a:solidFill><a:srgbClr val="EEEEEE"/></a:solidFill></a:tcPr></a:tc>"#,
                        paragraph(cell, "")
                    )
                })
                .collect();
            format!(r#"<a:tr h="370840">{}</a:tr>"#, cells)
        })
        .collect();
    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{}" name="{}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="0"/><a:ext cx="6096000" cy="1112520"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr firstRow="1" bandRow="1"/><a:tblGrid>{}</a:tblGrid>{}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
        id,
        escape(name),
        grid,
        body
    )
}

/// A parsed table graphic frame, for populator tests that need no package.
pub fn table_frame(name: &str, rows: &[&[&str]]) -> XmlElement {
    let xml = table_xml(2, name, rows);
    XmlDocument::parse(xml.as_bytes())
        .map(|doc| doc.root)
        .unwrap_or_else(|e| panic!("fixture table does not parse: {}", e))
}

/// A whole presentation package.
#[derive(Default)]
pub struct DeckBuilder {
    slides: Vec<SlideBuilder>,
    extras: Vec<(String, Vec<u8>)>,
    reverse: bool,
    without_presentation: bool,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, slide: SlideBuilder) -> Self {
        self.slides.push(slide);
        self
    }

    /// List the slide parts in `p:sldIdLst` in reverse part order.
    pub fn reverse_slide_list(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Leave out `ppt/presentation.xml`.
    pub fn without_presentation(mut self) -> Self {
        self.without_presentation = true;
        self
    }

    /// An arbitrary extra part, carried as-is.
    pub fn extra_part(mut self, name: &str, bytes: &[u8]) -> Self {
        self.extras.push((name.to_string(), bytes.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();
        let mut overrides = vec![
            ("/ppt/presentation.xml", "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml".to_string()),
            ("/ppt/slideMasters/slideMaster1.xml", "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml".to_string()),
            ("/ppt/slideLayouts/slideLayout1.xml", "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml".to_string()),
        ]
        .into_iter()
        .map(|(part, ct)| (part.to_string(), ct))
        .collect::<Vec<_>>();

        let mut images = 0;
        let mut notes = 0;
        let mut charts = 0;
        let mut slide_entries = Vec::new();
        let mut presentation_rels = vec![rel(
            "rId1",
            "slideMaster",
            "slideMasters/slideMaster1.xml",
            None,
        )];

        for (i, slide) in self.slides.iter().enumerate() {
            let number = i + 1;
            let part = format!("ppt/slides/slide{}.xml", number);
            overrides.push((
                format!("/{}", part),
                "application/vnd.openxmlformats-officedocument.presentationml.slide+xml".to_string(),
            ));

            let mut rels = vec![rel("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml", None)];
            for slide_rel in &slide.rels {
                match slide_rel {
                    SlideRel::Image(id) => {
                        images += 1;
                        let mut bytes = PNG_BYTES.to_vec();
                        bytes.push(images as u8);
                        parts.push((format!("ppt/media/image{}.png", images), bytes));
                        rels.push(rel(id, "image", &format!("../media/image{}.png", images), None));
                    }
                    SlideRel::Hyperlink(id, url) => {
                        rels.push(rel(id, "hyperlink", url, Some("External")));
                    }
                    SlideRel::Notes(id) => {
                        notes += 1;
                        let notes_part = format!("ppt/notesSlides/notesSlide{}.xml", notes);
                        parts.push((
                            notes_part.clone(),
                            format!(r#"<p:notes {}><p:cSld><p:spTree/></p:cSld></p:notes>"#, NS).into_bytes(),
                        ));
                        overrides.push((
                            format!("/{}", notes_part),
                            "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml".to_string(),
                        ));
                        rels.push(rel(id, "notesSlide", &format!("../notesSlides/notesSlide{}.xml", notes), None));
                    }
                    SlideRel::SlideLink(id, number) => {
                        rels.push(rel(id, "slide", &format!("slide{}.xml", number), None));
                    }
                    SlideRel::Chart(id) => {
                        charts += 1;
                        let chart_part = format!("ppt/charts/chart{}.xml", charts);
                        parts.push((
                            chart_part.clone(),
                            r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><c:externalData r:id="rId1"/></c:chartSpace>"#
                                .as_bytes()
                                .to_vec(),
                        ));
                        parts.push((
                            format!("ppt/charts/_rels/chart{}.xml.rels", charts),
                            rels_xml(&[rel(
                                "rId1",
                                "package",
                                &format!("../embeddings/Microsoft_Excel_Worksheet{}.xlsx", charts),
                                None,
                            )])
                            .into_bytes(),
                        ));
                        parts.push((
                            format!("ppt/embeddings/Microsoft_Excel_Worksheet{}.xlsx", charts),
                            vec![b'P', b'K', 3, 4, charts as u8],
                        ));
                        overrides.push((
                            format!("/{}", chart_part),
                            "application/vnd.openxmlformats-officedocument.drawingml.chart+xml".to_string(),
                        ));
                        rels.push(rel(id, "chart", &format!("../charts/chart{}.xml", charts), None));
                    }
                }
            }

            parts.push((part, slide.slide_xml().into_bytes()));
            parts.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", number),
                rels_xml(&rels).into_bytes(),
            ));

            let rel_id = format!("rId{}", number + 1);
            presentation_rels.push(rel(&rel_id, "slide", &format!("slides/slide{}.xml", number), None));
            slide_entries.push(format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 255 + number, rel_id));
        }

        if self.reverse {
            slide_entries.reverse();
        }
        let slide_list = if slide_entries.is_empty() {
            String::new()
        } else {
            format!("<p:sldIdLst>{}</p:sldIdLst>", slide_entries.concat())
        };

        let override_xml: String = overrides
            .iter()
            .map(|(part, ct)| format!(r#"<Override PartName="{}" ContentType="{}"/>"#, part, ct))
            .collect();
        let content_types = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="xlsx" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"/>{}</Types>"#,
            override_xml
        );

        let mut all = vec![
            ("[Content_Types].xml".to_string(), content_types.into_bytes()),
            (
                "_rels/.rels".to_string(),
                rels_xml(&[rel("rId1", "officeDocument", "ppt/presentation.xml", None)]).into_bytes(),
            ),
        ];
        if !self.without_presentation {
            all.push((
                "ppt/presentation.xml".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{}<p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
                    NS, slide_list
                )
                .into_bytes(),
            ));
            all.push((
                "ppt/_rels/presentation.xml.rels".to_string(),
                rels_xml(&presentation_rels).into_bytes(),
            ));
        }
        all.push((
            "ppt/slideMasters/slideMaster1.xml".to_string(),
            format!(r#"<p:sldMaster {}><p:cSld><p:spTree/></p:cSld></p:sldMaster>"#, NS).into_bytes(),
        ));
        all.push((
            "ppt/slideLayouts/slideLayout1.xml".to_string(),
            format!(r#"<p:sldLayout {}><p:cSld><p:spTree/></p:cSld></p:sldLayout>"#, NS).into_bytes(),
        ));
        all.extend(parts);
        all.extend(self.extras);

        zip_parts(&all)
    }
}

fn rel(id: &str, kind: &str, target: &str, mode: Option<&str>) -> String {
    let mode = mode
        .map(|m| format!(r#" TargetMode="{}""#, m))
        .unwrap_or_default();
    format!(
        r#"<Relationship Id="{}" Type="{}/{}" Target="{}"{}/>"#,
        id,
        REL_NS,
        kind,
        escape(target),
        mode
    )
}

fn rels_xml(rels: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        rels.concat()
    )
}

fn zip_parts(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in parts {
        writer
            .start_file(name.as_str(), FileOptions::default())
            .unwrap_or_else(|e| panic!("fixture zip entry {}: {}", name, e));
        writer
            .write_all(bytes)
            .unwrap_or_else(|e| panic!("fixture zip write {}: {}", name, e));
    }
    writer
        .finish()
        .unwrap_or_else(|e| panic!("fixture zip finish: {}", e))
        .into_inner()
}
