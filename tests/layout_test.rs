//! Integration tests for the layout renderer's public API.
//!
//! Rendered bytes are parsed back with `lopdf` to check page geometry,
//! fonts, text order and pagination. No pdfium or LLM needed.

use edgequake_digest::layout::{
    render_pdf, render_pdf_with_styles, Document, LayoutConfig, PageSize, StyleTable, Tier,
    DEFAULT_TITLE,
};
use edgequake_digest::DigestError;
use lopdf::content::Content;
use lopdf::Object;

const CIRCULAR: &str = "## Scope\n\
This circular applies to all insurers.\n\
- Submit compliance report by 31-Mar-2024\n\
### Penalties\n\
1. Late filing: fine of INR 10,000";

/// One shown string per `Tj`, with the font resource active at the time.
#[derive(Debug)]
struct Shown {
    font: String,
    text: Vec<u8>,
    x: f32,
    word_spacing: f32,
}

fn parse(bytes: &[u8]) -> lopdf::Document {
    lopdf::Document::load_mem(bytes).expect("rendered PDF should parse")
}

fn shown_strings(doc: &lopdf::Document) -> Vec<Vec<Shown>> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let data = doc.get_page_content(page_id).unwrap();
            let content = Content::decode(&data).unwrap();
            let mut font = String::new();
            let mut x = 0.0;
            let mut word_spacing = 0.0;
            let mut out = Vec::new();
            for op in content.operations {
                match op.operator.as_str() {
                    "Tf" => font = String::from_utf8_lossy(op.operands[0].as_name().unwrap()).into_owned(),
                    "Td" => x = op.operands[0].as_float().unwrap(),
                    "Tw" => word_spacing = op.operands[0].as_float().unwrap(),
                    "Tj" => {
                        if let Object::String(ref s, _) = op.operands[0] {
                            out.push(Shown {
                                font: font.clone(),
                                text: s.clone(),
                                x,
                                word_spacing,
                            });
                        }
                    }
                    _ => {}
                }
            }
            out
        })
        .collect()
}

fn media_box(doc: &lopdf::Document) -> Vec<f32> {
    let (_, &page_id) = doc.get_pages().iter().next().unwrap();
    let page = doc.get_dictionary(page_id).unwrap();
    let parent = page.get(b"Parent").unwrap().as_reference().unwrap();
    doc.get_dictionary(parent)
        .unwrap()
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o.as_float().unwrap())
        .collect()
}

#[test]
fn circular_renders_in_order_on_one_page() {
    let bytes = render_pdf(CIRCULAR, &LayoutConfig::default()).unwrap();
    let doc = parse(&bytes);
    let pages = shown_strings(&doc);
    assert_eq!(pages.len(), 1);

    let texts: Vec<Vec<u8>> = pages[0].iter().map(|s| s.text.clone()).collect();
    assert_eq!(
        texts,
        vec![
            DEFAULT_TITLE.as_bytes().to_vec(),
            b"Scope".to_vec(),
            b"This circular applies to all insurers.".to_vec(),
            b"\x95 Submit compliance report by 31-Mar-2024".to_vec(),
            b"Penalties".to_vec(),
            b"1. Late filing: fine of INR 10,000".to_vec(),
        ]
    );
}

#[test]
fn headings_are_bold_and_body_is_regular() {
    let bytes = render_pdf(CIRCULAR, &LayoutConfig::default()).unwrap();
    let pages = shown_strings(&parse(&bytes));
    let fonts: Vec<&str> = pages[0].iter().map(|s| s.font.as_str()).collect();
    assert_eq!(fonts, vec!["F2", "F2", "F1", "F1", "F2", "F1"]);
}

#[test]
fn title_is_centered_and_lists_are_indented() {
    let layout = LayoutConfig::default();
    let bytes = render_pdf(CIRCULAR, &layout).unwrap();
    let page = &shown_strings(&parse(&bytes))[0];
    let margin = layout.margin;
    assert!(page[0].x > margin + 50.0, "title x = {}", page[0].x);
    assert!((page[1].x - margin).abs() < 0.01);
    assert!((page[2].x - margin).abs() < 0.01);
    assert!(page[3].x > margin);
    assert!(page[4].x > page[1].x, "H2 indented past H1");
}

#[test]
fn a4_and_letter_media_boxes() {
    let a4 = parse(&render_pdf(CIRCULAR, &LayoutConfig::default()).unwrap());
    let mb = media_box(&a4);
    assert!((mb[2] - 595.28).abs() < 0.01 && (mb[3] - 841.89).abs() < 0.01);

    let letter_layout = LayoutConfig {
        page_size: PageSize::Letter,
        ..LayoutConfig::default()
    };
    let letter = parse(&render_pdf(CIRCULAR, &letter_layout).unwrap());
    assert_eq!(media_box(&letter)[2..], [612.0, 792.0]);
}

#[test]
fn long_analysis_spans_pages_without_losing_lines() {
    let text: String = (1..=150)
        .map(|i| format!("{i}. Requirement number {i} for every registered insurer\n"))
        .collect();
    let bytes = render_pdf(&text, &LayoutConfig::default()).unwrap();
    let pages = shown_strings(&parse(&bytes));
    assert!(pages.len() >= 3, "got {} pages", pages.len());

    let shown: usize = pages.iter().map(Vec::len).sum();
    assert_eq!(shown, 151, "title plus one line per item");
}

#[test]
fn wrapped_body_lines_are_justified_except_the_last() {
    let para = "This circular applies to all insurers and insurance intermediaries registered \
                with the Authority and shall come into force with immediate effect. All \
                previous instructions on the subject stand withdrawn from the date of issue.";
    let bytes = render_pdf(para, &LayoutConfig::default()).unwrap();
    let page = &shown_strings(&parse(&bytes))[0];
    let body = &page[1..];
    assert!(body.len() >= 2);
    assert!(body[0].word_spacing > 0.0);
    assert_eq!(body.last().unwrap().word_spacing, 0.0);
}

#[test]
fn info_dictionary_has_the_title() {
    let layout = LayoutConfig {
        title: "Master Circular Review".into(),
        ..LayoutConfig::default()
    };
    let doc = parse(&render_pdf(CIRCULAR, &layout).unwrap());
    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let title = doc.get_dictionary(info_id).unwrap().get(b"Title").unwrap().as_str().unwrap();
    assert_eq!(title, b"Master Circular Review");
}

#[test]
fn identical_input_gives_identical_bytes() {
    let layout = LayoutConfig::default();
    assert_eq!(
        render_pdf(CIRCULAR, &layout).unwrap(),
        render_pdf(CIRCULAR, &layout).unwrap()
    );
}

#[test]
fn custom_style_table_is_honoured() {
    let mut styles = StyleTable::standard();
    styles.body.font_size = 14.0;
    let layout = LayoutConfig::default();
    let standard = render_pdf("Body text", &layout).unwrap();
    let custom = render_pdf_with_styles("Body text", &layout, &styles).unwrap();
    assert_ne!(standard, custom);
}

#[test]
fn unencodable_input_returns_no_bytes() {
    let text = "## परिपत्र\nBody";
    match render_pdf(text, &LayoutConfig::default()) {
        Err(DigestError::UnencodableCharacter { line, .. }) => assert_eq!(line, 1),
        other => panic!("expected an encoding error, got {other:?}"),
    }
}

#[test]
fn block_count_property() {
    let samples = [
        "",
        "A\n\n\nB",
        "#### A",
        "- item\n• item\n12. Renew license",
        CIRCULAR,
        "  \n\t\n## x\r\n\r\ny",
    ];
    for text in samples {
        let doc = Document::from_text(text, DEFAULT_TITLE);
        let non_blank = text.lines().filter(|l| !l.trim().is_empty()).count();
        assert_eq!(doc.body().len(), non_blank, "input {text:?}");
        assert_eq!(doc.blocks()[0].tier, Tier::Title);
    }
}
