use crate::node::NodeData;
use crate::{Document, Node};

/// Creates a markup5ever QualName from a local name
#[macro_export]
macro_rules! qual_name {
    ($local:tt) => {
        $crate::QualName {
            prefix: None,
            ns: $crate::ns!(),
            local: $crate::local_name!($local),
        }
    };
}

/// Debug-print a subtree, one line per node
pub fn walk_tree(indent: usize, doc: &Document, node: &Node) {
    // Skip all-whitespace text nodes entirely
    if let NodeData::Text(data) = &node.data {
        if data.content.chars().all(|c| c.is_ascii_whitespace()) {
            return;
        }
    }

    print!("{}", " ".repeat(indent));
    let id = node.id;
    match &node.data {
        NodeData::Document => println!("#Document {id}"),
        NodeData::Text(data) => {
            println!("#text {id}: {}", data.content.trim().escape_default())
        }
        NodeData::Comment => println!("<!-- COMMENT {id} -->"),
        NodeData::Element(data) => {
            print!("<{} {id}", data.name.local);
            for attr in data.attrs.iter() {
                print!(" {}=\"{}\"", attr.name.local, attr.value);
            }
            if node.children.is_empty() {
                println!(" />");
            } else {
                println!(">");
            }
        }
    }

    if !node.children.is_empty() {
        for child_id in node.children.iter() {
            if let Some(child) = doc.get_node(*child_id) {
                walk_tree(indent + 2, doc, child);
            }
        }

        if let NodeData::Element(data) = &node.data {
            println!("{}</{}>", " ".repeat(indent), data.name.local);
        }
    }
}
