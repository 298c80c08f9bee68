use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::ops::Range;
use std::path::PathBuf;

use super::PresetDocument;
use crate::control::ControlKind;
use crate::element::{Attribute, ElementNode};
use crate::utils::PresetError;

impl PresetDocument {
    /// 从源码解析文档
    ///
    /// 源码必须是格式良好的 XML：标签成对闭合、属性不重复、恰好一个根元素。
    pub fn parse(path: PathBuf, source: String) -> Result<Self, PresetError> {
        let (root_tag, elements) = match parse_controls(&source) {
            Ok(parsed) => parsed,
            Err(message) => return Err(PresetError::Parse { path, message }),
        };

        log::debug!(
            "解析完成: {} (根元素 <{}>, {} 个控件)",
            path.display(),
            root_tag,
            elements.len()
        );

        Ok(PresetDocument {
            path,
            source,
            root_tag,
            elements,
        })
    }
}

/// 扫描 XML 事件流，收集根元素名和所有控件元素
fn parse_controls(source: &str) -> Result<(String, Vec<ElementNode>), String> {
    let mut reader = Reader::from_str(source);
    let mut elements = Vec::new();
    let mut root_tag: Option<String> = None;
    let mut depth = 0usize;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| format!("XML 格式错误（字节 {}）: {}", reader.error_position(), e))?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                let tag = tag_name(&e)?;
                if depth == 0 {
                    set_root(&mut root_tag, &tag)?;
                }
                depth += 1;
                collect_control(source, &e, tag, start..end, false, &mut elements)?;
            }
            Event::Empty(e) => {
                let tag = tag_name(&e)?;
                if depth == 0 {
                    set_root(&mut root_tag, &tag)?;
                }
                collect_control(source, &e, tag, start..end, true, &mut elements)?;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
            }
            Event::Text(text) if depth == 0 => {
                let bytes = text.into_inner();
                let content = String::from_utf8_lossy(&bytes);
                if !content.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}').is_empty() {
                    return Err("根元素之外存在文本内容".to_string());
                }
            }
            Event::GeneralRef(_) if depth == 0 => {
                return Err("根元素之外存在实体引用".to_string());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(format!("文件意外结束: {} 个元素未闭合", depth));
    }

    let root_tag = root_tag.ok_or_else(|| "文档没有根元素".to_string())?;
    Ok((root_tag, elements))
}

fn set_root(root_tag: &mut Option<String>, tag: &str) -> Result<(), String> {
    if let Some(existing) = root_tag {
        return Err(format!("存在多个根元素: <{}> 和 <{}>", existing, tag));
    }
    *root_tag = Some(tag.to_string());
    Ok(())
}

fn tag_name(e: &BytesStart) -> Result<String, String> {
    std::str::from_utf8(e.name().as_ref())
        .map(|s| s.to_string())
        .map_err(|e| format!("元素名不是有效的 UTF-8: {}", e))
}

/// 若元素是控件则记录下来
fn collect_control(
    source: &str,
    e: &BytesStart,
    tag: String,
    span: Range<usize>,
    self_closing: bool,
    elements: &mut Vec<ElementNode>,
) -> Result<(), String> {
    let attributes = parse_attributes(e, &tag)?;

    let type_attr = attributes
        .iter()
        .find(|a| a.key == "type")
        .map(|a| a.value().into_owned());

    let Some((kind, type_name)) = ControlKind::classify(&tag, type_attr.as_deref()) else {
        return Ok(());
    };

    let span = tag_span(source, span);
    let index = elements.len();
    elements.push(ElementNode::new(
        index,
        tag,
        kind,
        type_name,
        span,
        self_closing,
        attributes,
    ));
    Ok(())
}

/// 解析属性（属性值保持原始转义形式）
fn parse_attributes(e: &BytesStart, tag: &str) -> Result<Vec<Attribute>, String> {
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| format!("<{}> 的属性无效: {}", tag, err))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| format!("<{}> 的属性名无效: {}", tag, err))?
            .to_string();
        let raw_value = String::from_utf8(attr.value.into_owned())
            .map_err(|err| format!("<{}> 的属性值无效: {}", tag, err))?;
        attributes.push(Attribute::from_raw(key, raw_value));
    }
    Ok(attributes)
}

/// 将事件范围收紧到 `<` ... `>`
fn tag_span(source: &str, span: Range<usize>) -> Range<usize> {
    let slice = &source[span.clone()];
    let mut start = span.start + slice.find('<').unwrap_or(0);
    if !source[start..].starts_with('<') {
        // 读取器可能已经越过了开头的 `<`
        if let Some(pos) = source[..start].rfind('<') {
            start = pos;
        }
    }
    let end = span.start + slice.rfind('>').map(|i| i + 1).unwrap_or(slice.len());
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DecentSampler minVersion="1.0.0">
  <!-- UI -->
  <ui width="812" height="375">
    <tab name="main">
      <labeled-knob x="10" y="20" width="90" label="Attack"/>
      <control type="button" x="100" y="40" width="60" height="30" id="power"></control>
      <label x="5" y="5" text="Hello &amp; welcome"/>
    </tab>
  </ui>
  <groups><group><sample path="a.wav"/></group></groups>
</DecentSampler>
"#;

    fn parse(source: &str) -> Result<PresetDocument, PresetError> {
        PresetDocument::parse(PathBuf::from("test.dspreset"), source.to_string())
    }

    #[test]
    fn test_parse_controls() {
        let document = parse(PRESET).unwrap();

        assert_eq!(document.root_tag(), "DecentSampler");
        assert_eq!(document.len(), 3);

        let kinds: Vec<_> = document.elements().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ControlKind::Knob, ControlKind::Button, ControlKind::Label]);

        let button = document.element(1).unwrap();
        assert_eq!(button.tag, "control");
        assert_eq!(button.type_name, "button");
        assert_eq!(button.display_name(), "power");
        assert!(!button.self_closing);

        let label = document.element(2).unwrap();
        assert_eq!(label.display_name(), "Hello & welcome");
        assert!(label.self_closing);
    }

    #[test]
    fn test_spans_cover_start_tags() {
        let document = parse(PRESET).unwrap();
        for element in document.elements() {
            let text = &document.source()[element.span.clone()];
            assert!(text.starts_with(&format!("<{}", element.tag)), "{}", text);
            assert!(text.ends_with('>'));
        }
        let knob = &document.source()[document.element(0).unwrap().span.clone()];
        assert_eq!(knob, r#"<labeled-knob x="10" y="20" width="90" label="Attack"/>"#);
    }

    #[test]
    fn test_non_control_elements_ignored() {
        let document = parse("<DecentSampler><ui><tab/></ui></DecentSampler>").unwrap();
        assert!(document.is_empty());
    }

    #[test]
    fn test_mismatched_tags() {
        let result = parse("<DecentSampler><ui></tab></DecentSampler>");
        assert!(matches!(result, Err(PresetError::Parse { .. })));
    }

    #[test]
    fn test_unclosed_root() {
        let result = parse("<DecentSampler><ui>");
        assert!(matches!(result, Err(PresetError::Parse { .. })));
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(parse(""), Err(PresetError::Parse { .. })));
        assert!(matches!(parse("   \n"), Err(PresetError::Parse { .. })));
    }

    #[test]
    fn test_multiple_roots() {
        let result = parse("<DecentSampler/><DecentSampler/>");
        assert!(matches!(result, Err(PresetError::Parse { .. })));
    }

    #[test]
    fn test_text_outside_root() {
        let result = parse("garbage<DecentSampler/>");
        assert!(matches!(result, Err(PresetError::Parse { .. })));
    }

    #[test]
    fn test_entity_outside_root() {
        assert!(matches!(parse("&amp;<DecentSampler/>"), Err(PresetError::Parse { .. })));
        assert!(matches!(parse("<DecentSampler/>&lt;"), Err(PresetError::Parse { .. })));

        // 根元素内部的实体不受影响
        let document = parse(r#"<DecentSampler><label text="a &amp; b"/>x &amp; y</DecentSampler>"#).unwrap();
        assert_eq!(document.element(0).unwrap().display_name(), "a & b");
    }

    #[test]
    fn test_duplicate_attribute() {
        let result = parse(r#"<DecentSampler><control type="knob" x="1" x="2"/></DecentSampler>"#);
        assert!(matches!(result, Err(PresetError::Parse { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = PresetDocument::load("/nonexistent/missing.dspreset");
        assert!(matches!(result, Err(PresetError::Parse { .. })));
    }
}
