use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scribe_markdown::{parse, serialize};
use scribe_model::{MarkSpec, NodeSpec, Schema};
use serde_json::{json, Value};

fn schema() -> Schema {
    Schema::builder()
        .node(NodeSpec::new("doc").content("block+"))
        .node(NodeSpec::new("paragraph").content("inline*").group("block"))
        .node(
            NodeSpec::new("heading")
                .content("inline*")
                .group("block")
                .attr("level", json!(1)),
        )
        .node(NodeSpec::new("blockquote").content("block+").group("block"))
        .node(
            NodeSpec::new("code_block")
                .content("text*")
                .group("block")
                .code()
                .attr("language", Value::Null),
        )
        .node(NodeSpec::new("bullet_list").content("list_item+").group("block"))
        .node(NodeSpec::new("list_item").content("paragraph block*"))
        .node(NodeSpec::new("text").group("inline"))
        .mark(MarkSpec::new("bold"))
        .mark(MarkSpec::new("italic"))
        .mark(MarkSpec::new("code"))
        .mark(MarkSpec::new("link").required_attr("href").attr("title", Value::Null))
        .build()
        .unwrap()
}

fn document(sections: usize) -> String {
    let section = r#"## Section

Some **bold** text with *emphasis*, `inline code` and a [link](https://example.com).

- first item
- second item with **nested _marks_**

> a quote spanning
> two lines

```rust
fn main() {
    println!("hello");
}
```"#;
    vec![section; sections].join("\n\n")
}

fn parse_small_document(c: &mut Criterion) {
    let schema = schema();
    let source = document(1);

    c.bench_function("parse_small_document", |b| {
        b.iter(|| parse(black_box(&source), &schema))
    });
}

fn parse_large_document(c: &mut Criterion) {
    let schema = schema();
    let source = document(200);

    c.bench_function("parse_large_document", |b| {
        b.iter(|| parse(black_box(&source), &schema))
    });
}

fn serialize_large_document(c: &mut Criterion) {
    let schema = schema();
    let doc = parse(&document(200), &schema);

    c.bench_function("serialize_large_document", |b| {
        b.iter(|| serialize(black_box(&doc)))
    });
}

criterion_group!(
    benches,
    parse_small_document,
    parse_large_document,
    serialize_large_document
);
criterion_main!(benches);
