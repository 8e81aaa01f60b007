use html::{child_count, parse, parse_bytes, serialize_to_json, tokenize, Document, DomError, HtmlParser, NodeData, Token};
use serde_json::Value;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn body_children(doc: &Document) -> Vec<u32> {
    let body = doc.body().expect("body element");
    doc.children(body).unwrap().to_vec()
}

fn count_objects(value: &Value) -> usize {
    match value {
        Value::Object(map) => {
            let own = usize::from(map.contains_key("type"));
            let children = map
                .get("children")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(count_objects).sum())
                .unwrap_or(0);
            own + children
        }
        _ => 0,
    }
}

#[test]
fn test_any_text_parses_with_html_root() {
    init_tracing();
    let inputs = [
        "",
        "plain text",
        "<",
        "</",
        "<<>>",
        "<div",
        "<!--",
        "<!DOCTYPE",
        "</html></body></head>",
        "<table><tr><td>cell</table>",
        "<b><i>x</b></i>",
        "\0\u{1}\u{7f}",
        "<script>",
        "<title>",
        "&&&;&#;&#x;&#99999999999;",
        "<head></head><template>x",
        "<head></head><template>",
        "<head></head><template><p>x",
        "<head></head><noscript>x",
        "<head></head><script>a</script>b",
        "<head></head><title>t</title>b",
        "<head></head><style>",
    ];
    for input in inputs {
        let doc = parse(input).unwrap();
        let html = doc.document_element().expect(input);
        assert_eq!(doc.tag_name(html), Some("html"), "{input:?}");

        let head = doc.head().expect(input);
        let body = doc.body().expect(input);
        for child in [head, body] {
            let parent = doc.parent(child).unwrap().map(|node| node.node_id);
            assert_eq!(parent, Some(html), "{input:?}");
        }
    }
}

#[test]
fn test_child_count_is_stable() {
    let input = "<!DOCTYPE html><!--top--><html><body><p>x</body></html><!--bottom-->";
    let first = child_count(&parse(input).unwrap());
    for _ in 0..5 {
        assert_eq!(child_count(&parse(input).unwrap()), first);
    }
    assert_eq!(first, 4);
}

#[test]
fn test_unclosed_div_and_p() {
    let doc = parse("<div><p>text").unwrap();
    let children = body_children(&doc);
    assert_eq!(children.len(), 1);

    let div = children[0];
    assert_eq!(doc.tag_name(div), Some("div"));
    let p = doc.children(div).unwrap()[0];
    assert_eq!(doc.tag_name(p), Some("p"));
    let text = doc.children(p).unwrap()[0];
    assert_eq!(doc.get(text).unwrap().as_text(), Some("text"));
}

#[test]
fn test_misnested_span_is_closed_with_div() {
    let doc = parse("<div><span></div>tail").unwrap();
    let children = body_children(&doc);
    assert_eq!(children.len(), 2);

    let div = children[0];
    let span = doc.children(div).unwrap()[0];
    assert_eq!(doc.tag_name(span), Some("span"));
    assert!(doc.children(span).unwrap().is_empty());
    assert_eq!(doc.get(children[1]).unwrap().as_text(), Some("tail"));
}

#[test]
fn test_duplicate_attribute_keeps_first() {
    let doc = parse("<a href='x' href='y'>link</a>").unwrap();
    let a = doc.find_by_tag("a")[0];
    assert_eq!(doc.attr(a, "href"), Some("x"));
    assert_eq!(doc.element(a).unwrap().attributes.len(), 1);
}

#[test]
fn test_comment_splits_text() {
    let doc = parse("a<!--c-->b").unwrap();
    let children = body_children(&doc);
    assert_eq!(children.len(), 3);
    assert_eq!(doc.get(children[0]).unwrap().as_text(), Some("a"));
    assert!(matches!(&doc.get(children[1]).unwrap().data, NodeData::Comment(c) if c == "c"));
    assert_eq!(doc.get(children[2]).unwrap().as_text(), Some("b"));

    let doc = parse("ab").unwrap();
    let children = body_children(&doc);
    assert_eq!(children.len(), 1);
    assert_eq!(doc.get(children[0]).unwrap().as_text(), Some("ab"));
}

#[test]
fn test_json_has_one_object_per_node() {
    let input = r#"<!DOCTYPE html><html lang="en"><head><title>T</title></head>
<body><!-- note --><div id="main" class="a b"><p>one<br>two</p><ul><li>x<li>y</ul></div></body></html>"#;
    let doc = parse(input).unwrap();
    let json = serialize_to_json(&doc).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(count_objects(&value), doc.node_count());
}

#[test]
fn test_json_shapes_and_order() {
    let doc = parse("<!DOCTYPE html><p b=2 a=1>x<!--c--></p>").unwrap();
    let json = serialize_to_json(&doc).unwrap();

    assert!(json.starts_with(
        r#"{"type":"document","children":[{"type":"doctype","name":"html","publicId":null,"systemId":null},{"type":"element","tagName":"html","attributes":{},"children":[{"type":"element","tagName":"head","attributes":{},"children":[]},"#
    ));
    assert!(json.contains(
        r#"{"type":"element","tagName":"p","attributes":{"b":"2","a":"1"},"children":[{"type":"text","content":"x"},{"type":"comment","content":"c"}]}"#
    ));
}

#[test]
fn test_json_escapes_text() {
    let doc = parse("<p>\"quoted\" \\ \n tab\t</p>").unwrap();
    let json = serialize_to_json(&doc).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    let p = &value["children"][0]["children"][1]["children"][0];
    assert_eq!(p["tagName"], "p");
    assert_eq!(p["children"][0]["content"], "\"quoted\" \\ \n tab\t");
}

#[test]
fn test_serialization_is_deterministic() {
    let input = "<div a=1 b=2 c=3><span>x</span>y<!--z--></div>";
    let first = serialize_to_json(&parse(input).unwrap()).unwrap();
    let second = serialize_to_json(&parse(input).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_doctype_node() {
    let doc = parse(r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#).unwrap();
    let doctype = doc.doctype().unwrap();
    match &doc.get(doctype).unwrap().data {
        NodeData::Doctype(dt) => {
            assert_eq!(dt.name, "html");
            assert_eq!(dt.public_id.as_deref(), Some("-//W3C//DTD XHTML 1.0 Strict//EN"));
            assert_eq!(
                dt.system_id.as_deref(),
                Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd")
            );
        }
        other => panic!("expected doctype, got {:?}", other),
    }
}

#[test]
fn test_script_and_style_are_raw_text() {
    let doc = parse("<style>p > a { color: red }</style><script>if (a < b && c) { x = '<p>'; }</script>").unwrap();
    let style = doc.find_by_tag("style")[0];
    let script = doc.find_by_tag("script")[0];

    assert_eq!(dom::utils::text_content(&doc, style).unwrap(), "p > a { color: red }");
    assert_eq!(
        dom::utils::text_content(&doc, script).unwrap(),
        "if (a < b && c) { x = '<p>'; }"
    );
    assert!(doc.find_by_tag("p").is_empty());
}

#[test]
fn test_title_decodes_references() {
    let doc = parse("<title>Fish &amp; Chips &copy; 2024</title>").unwrap();
    let title = doc.find_by_tag("title")[0];
    assert_eq!(
        dom::utils::text_content(&doc, title).unwrap(),
        "Fish & Chips \u{00A9} 2024"
    );
}

#[test]
fn test_parse_bytes_invalid_utf8() {
    let err = parse_bytes(&[b'<', b'p', b'>', 0xC3, 0x28]).unwrap_err();
    assert!(matches!(err, DomError::InputDecoding { valid_up_to: 3 }));
}

#[test]
fn test_deep_nesting_does_not_overflow() {
    let input = "<div>".repeat(2_000);
    let doc = parse(&input).unwrap();
    assert_eq!(doc.find_by_tag("div").len(), 2_000);

    let json = serialize_to_json(&doc).unwrap();
    assert_eq!(json.matches(r#""tagName":"div""#).count(), 2_000);
    assert_eq!(json.matches(r#""type":"#).count(), doc.node_count());
}

#[test]
fn test_parse_with_issues_reports_recovery() {
    let (doc, issues) = HtmlParser::new()
        .parse_with_issues("<p class=a class=b>x</div>")
        .unwrap();
    assert_eq!(doc.find_by_tag("p").len(), 1);
    assert!(issues.iter().any(|i| i.message.contains("duplicate attribute")));
    assert!(issues.iter().any(|i| i.message.contains("end tag")));
}

#[test]
fn test_tokenize_is_lazy_and_finite() {
    let mut tokens = tokenize("<p>a</p>");
    assert_eq!(tokens.next(), Some(Token::start_tag("p")));
    assert_eq!(tokens.position(), 3);

    let rest: Vec<Token> = tokens.collect();
    assert_eq!(rest, vec![Token::text("a"), Token::end_tag("p"), Token::EndOfInput]);
}

#[test]
fn test_independent_parses_on_threads() {
    let inputs: Vec<String> = (0..8)
        .map(|i| format!("<ul>{}</ul>", "<li>item".repeat(i + 1)))
        .collect();

    let handles: Vec<_> = inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            std::thread::spawn(move || {
                let doc = parse(&input).unwrap();
                assert_eq!(doc.find_by_tag("li").len(), i + 1);
                serialize_to_json(&doc).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let json = handle.join().unwrap();
        assert!(json.contains(r#""tagName":"ul""#));
    }
}

#[test]
fn test_real_world_page() {
    init_tracing();
    let input = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>Example Domain</title>
  <link rel=stylesheet href=/s.css>
</head>
<body>
  <h1>Example Domain</h1>
  <p>This domain is for use in illustrative examples.
  <p><a href="https://www.iana.org/domains/example">More information...</a>
</body>
</html>
"#;
    let doc = parse(input).unwrap();

    let head = doc.head().unwrap();
    let head_tags: Vec<_> = doc
        .children(head)
        .unwrap()
        .iter()
        .filter_map(|&id| doc.tag_name(id))
        .collect();
    assert_eq!(head_tags, vec!["meta", "title", "link"]);

    let paragraphs = doc.find_by_tag("p");
    assert_eq!(paragraphs.len(), 2);
    for p in paragraphs {
        assert_eq!(doc.parent(p).unwrap().unwrap().tag_name(), Some("body"));
    }

    let a = doc.find_by_tag("a")[0];
    assert_eq!(doc.attr(a, "href"), Some("https://www.iana.org/domains/example"));
}
