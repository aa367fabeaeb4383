//! Style Applicator: font profiles captured from template text and the runs
//! built from them.

use crate::xml::XmlElement;
use pptfill_core::FormattedSegment;

/// Baseline font attributes of a text body, taken from its first run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontProfile {
    /// Latin typeface, e.g. `Calibri`.
    pub family: Option<String>,
    /// East Asian typeface (`a:ea`).
    pub east_asian_family: Option<String>,
    /// Complex script typeface (`a:cs`).
    pub complex_script_family: Option<String>,
    /// Size in hundredths of a point (`sz`).
    pub size: Option<u32>,
    /// The `a:solidFill` element, kept whole (scheme or RGB colour).
    pub color: Option<XmlElement>,
    /// Language tag (`lang`).
    pub language: Option<String>,
}

impl FontProfile {
    /// Capture from the first run of a text body, falling back to the first
    /// paragraph's end-of-paragraph properties when there is no run.
    pub fn capture(tx_body: &XmlElement) -> Self {
        let first_run = tx_body
            .children_named("p")
            .flat_map(|p| p.children_named("r"))
            .find_map(|r| r.child("rPr"));
        let end_props = || tx_body.child("p").and_then(|p| p.child("endParaRPr"));

        first_run
            .or_else(end_props)
            .map(Self::from_run_properties)
            .unwrap_or_default()
    }

    fn from_run_properties(props: &XmlElement) -> Self {
        Self {
            family: typeface(props, "latin"),
            east_asian_family: typeface(props, "ea"),
            complex_script_family: typeface(props, "cs"),
            size: props.attr("sz").and_then(|sz| sz.parse().ok()),
            color: props.child("solidFill").cloned(),
            language: props.attr("lang").map(str::to_string),
        }
    }

    /// Size in points, if known.
    pub fn size_points(&self) -> Option<f64> {
        self.size.map(|sz| f64::from(sz) / 100.0)
    }

    /// `a:rPr` carrying the profile, plus absolute bold/italic/underline
    /// flags when a segment style is given.
    pub fn run_properties(&self, style: Option<&FormattedSegment>) -> XmlElement {
        let mut props = XmlElement::new("a:rPr");
        if let Some(language) = &self.language {
            props.set_attr("lang", language.as_str());
        }
        if let Some(size) = self.size {
            props.set_attr("sz", size.to_string());
        }
        if let Some(segment) = style {
            props.set_attr("b", flag(segment.bold));
            props.set_attr("i", flag(segment.italic));
            props.set_attr("u", if segment.underline { "sng" } else { "none" });
        }
        if let Some(color) = &self.color {
            props.push_child(color.clone());
        }
        let typefaces = [
            ("a:latin", &self.family),
            ("a:ea", &self.east_asian_family),
            ("a:cs", &self.complex_script_family),
        ];
        for (name, family) in typefaces {
            if let Some(family) = family {
                props.push_child(XmlElement::new(name).with_attr("typeface", family.as_str()));
            }
        }
        props
    }

    /// A run with the profile and no styling flags of its own.
    pub fn plain_run(&self, text: &str) -> XmlElement {
        run(self.run_properties(None), text)
    }

    /// One run per non-empty segment, flags set exactly to the segment's.
    pub fn styled_runs(&self, segments: &[FormattedSegment]) -> Vec<XmlElement> {
        segments
            .iter()
            .filter(|segment| !segment.text.is_empty())
            .map(|segment| run(self.run_properties(Some(segment)), &segment.text))
            .collect()
    }
}

fn typeface(props: &XmlElement, element: &str) -> Option<String> {
    props
        .child(element)
        .and_then(|font| font.attr("typeface"))
        .map(str::to_string)
}

fn flag(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}

fn run(props: XmlElement, text: &str) -> XmlElement {
    XmlElement::new("a:r")
        .with_child(props)
        .with_child(XmlElement::new("a:t").with_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;
    use pptfill_core::segment;

    const BODY: &str = r#"<p:txBody xmlns:a="urn:a" xmlns:p="urn:p"><a:bodyPr/><a:p><a:r><a:rPr lang="de-DE" sz="2400" b="1"><a:solidFill><a:srgbClr val="1F4E79"/></a:solidFill><a:latin typeface="Georgia"/></a:rPr><a:t>Old</a:t></a:r></a:p></p:txBody>"#;

    #[test]
    fn test_capture_from_first_run() {
        let doc = XmlDocument::parse(BODY.as_bytes()).unwrap();
        let profile = FontProfile::capture(&doc.root);
        assert_eq!(profile.family.as_deref(), Some("Georgia"));
        assert_eq!(profile.size, Some(2400));
        assert_eq!(profile.size_points(), Some(24.0));
        assert_eq!(profile.language.as_deref(), Some("de-DE"));
        let color = profile.color.unwrap();
        assert_eq!(color.child("srgbClr").unwrap().attr("val"), Some("1F4E79"));
    }

    #[test]
    fn test_capture_falls_back_to_end_paragraph_props() {
        let doc = XmlDocument::parse(
            br#"<p:txBody><a:p><a:endParaRPr lang="en-US" sz="1800"/></a:p></p:txBody>"#,
        )
        .unwrap();
        let profile = FontProfile::capture(&doc.root);
        assert_eq!(profile.size, Some(1800));
        assert_eq!(profile.family, None);
    }

    #[test]
    fn test_plain_run_does_not_set_flags() {
        let doc = XmlDocument::parse(BODY.as_bytes()).unwrap();
        let run = FontProfile::capture(&doc.root).plain_run("New");
        let props = run.child("rPr").unwrap();
        assert_eq!(props.attr("b"), None);
        assert_eq!(props.attr("sz"), Some("2400"));
        assert_eq!(run.child("t").unwrap().text(), "New");
    }

    #[test]
    fn test_styled_runs_use_absolute_flags() {
        let doc = XmlDocument::parse(BODY.as_bytes()).unwrap();
        let profile = FontProfile::capture(&doc.root);
        let runs = profile.styled_runs(&segment("plain **bold** __under__"));
        assert_eq!(runs.len(), 4);

        let props: Vec<_> = runs.iter().map(|r| r.child("rPr").unwrap()).collect();
        assert_eq!(props[0].attr("b"), Some("0"));
        assert_eq!(props[1].attr("b"), Some("1"));
        assert_eq!(props[1].attr("u"), Some("none"));
        assert_eq!(props[3].attr("u"), Some("sng"));
        assert_eq!(props[3].attr("i"), Some("0"));
        assert!(props.iter().all(|p| p.child("latin").is_some()));
    }

    #[test]
    fn test_east_asian_and_complex_script_typefaces_are_kept() {
        let doc = XmlDocument::parse(
            br#"<p:txBody><a:p><a:r><a:rPr lang="ja-JP"><a:latin typeface="Arial"/><a:ea typeface="Meiryo"/><a:cs typeface="Arial Unicode MS"/></a:rPr><a:t>Old</a:t></a:r></a:p></p:txBody>"#,
        )
        .unwrap();
        let profile = FontProfile::capture(&doc.root);
        assert_eq!(profile.east_asian_family.as_deref(), Some("Meiryo"));
        assert_eq!(profile.complex_script_family.as_deref(), Some("Arial Unicode MS"));

        for run in [profile.plain_run("新"), profile.styled_runs(&segment("**新**"))[0].clone()] {
            let props = run.child("rPr").unwrap();
            let fonts: Vec<_> = props.elements().map(|el| el.name.as_str()).collect();
            assert_eq!(fonts, vec!["a:latin", "a:ea", "a:cs"]);
            assert_eq!(props.child("ea").unwrap().attr("typeface"), Some("Meiryo"));
        }
    }

    #[test]
    fn test_empty_segments_emit_no_run() {
        let runs = FontProfile::default().styled_runs(&segment("****"));
        assert!(runs.is_empty());
    }
}
