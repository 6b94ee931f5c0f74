//! Node, mark and attribute names with native markdown syntax.

pub const DOC: &str = "doc";
pub const PARAGRAPH: &str = "paragraph";
pub const HEADING: &str = "heading";
pub const BLOCKQUOTE: &str = "blockquote";
pub const CODE_BLOCK: &str = "code_block";
pub const BULLET_LIST: &str = "bullet_list";
pub const ORDERED_LIST: &str = "ordered_list";
pub const LIST_ITEM: &str = "list_item";
pub const HORIZONTAL_RULE: &str = "horizontal_rule";
pub const HARD_BREAK: &str = "hard_break";
pub const IMAGE: &str = "image";
pub const TEXT: &str = "text";

pub const BOLD: &str = "bold";
pub const ITALIC: &str = "italic";
pub const CODE: &str = "code";
pub const LINK: &str = "link";

pub const ATTR_LEVEL: &str = "level";
pub const ATTR_LANGUAGE: &str = "language";
pub const ATTR_ORDER: &str = "order";
pub const ATTR_SRC: &str = "src";
pub const ATTR_ALT: &str = "alt";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_HREF: &str = "href";

pub fn has_block_syntax(name: &str) -> bool {
    matches!(
        name,
        PARAGRAPH | HEADING | BLOCKQUOTE | CODE_BLOCK | BULLET_LIST | ORDERED_LIST | HORIZONTAL_RULE
    )
}

pub fn has_inline_syntax(name: &str) -> bool {
    matches!(name, TEXT | HARD_BREAK | IMAGE)
}

pub fn has_mark_syntax(name: &str) -> bool {
    matches!(name, BOLD | ITALIC | CODE | LINK)
}
