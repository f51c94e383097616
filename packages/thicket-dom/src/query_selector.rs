//! A small selector engine covering the constructs the utility functions
//! need: tag, `#id`, `.class`, `[attr]` and `[attr=value]` conditions,
//! compounds of those, descendant and `>` child combinators, and
//! comma-separated groups. Anything else fails to parse with a
//! [`SelectorError`].

use std::error::Error;
use std::fmt;

use smallvec::SmallVec;

use crate::Document;
use crate::node::ElementData;
use crate::traversal::TreeTraverser;

impl Document {
    /// Find the node with the specified id attribute (if one exists)
    pub fn get_element_by_id(&self, id: &str) -> Option<usize> {
        self.nodes_to_id.get(id).copied()
    }

    /// Find the first node that matches the selector specified as a string
    ///
    /// Returns:
    ///   - `Err(_)` if parsing the selector fails
    ///   - `Ok(None)` if nothing matches
    ///   - `Ok(Some(node_id))` with the first match in tree order otherwise
    pub fn query_selector(&self, selector: &str) -> Result<Option<usize>, SelectorError> {
        let selector_list = parse_selector_list(selector)?;
        Ok(self.query_selector_raw(&selector_list))
    }

    /// Find the first node that matches the selector(s) in `selector_list`
    pub fn query_selector_raw(&self, selector_list: &SelectorList) -> Option<usize> {
        TreeTraverser::new(self).find(|node_id| self.matches_selector_list(*node_id, selector_list))
    }

    /// Find all nodes that match the selector specified as a string
    pub fn query_selector_all(&self, selector: &str) -> Result<SmallVec<[usize; 32]>, SelectorError> {
        let selector_list = parse_selector_list(selector)?;
        Ok(self.query_selector_all_raw(&selector_list))
    }

    /// Find all nodes that match the selector(s) in `selector_list`
    pub fn query_selector_all_raw(&self, selector_list: &SelectorList) -> SmallVec<[usize; 32]> {
        TreeTraverser::new(self)
            .filter(|node_id| self.matches_selector_list(*node_id, selector_list))
            .collect()
    }

    /// Whether the node matches any chain in the list
    pub fn matches_selector_list(&self, node_id: usize, selector_list: &SelectorList) -> bool {
        selector_list
            .chains
            .iter()
            .any(|chain| self.matches_chain(node_id, chain))
    }

    /// Right-to-left chain matching: the rightmost step must match the node
    /// itself, and each earlier step must match an ancestor as its
    /// combinator requires.
    fn matches_chain(&self, node_id: usize, chain: &[SelectorPart]) -> bool {
        let Some(last) = chain.last() else {
            return false;
        };
        if !self.matches_step(node_id, &last.step) {
            return false;
        }

        let mut current = node_id;
        for idx in (1..chain.len()).rev() {
            let prev_step = &chain[idx - 1].step;
            let matched = match chain[idx].combinator {
                Combinator::Child => {
                    let Some(parent) = self.parent_of(current) else {
                        return false;
                    };
                    self.matches_step(parent, prev_step).then_some(parent)
                }
                Combinator::Descendant => {
                    let mut cursor = self.parent_of(current);
                    loop {
                        match cursor {
                            Some(parent) if self.matches_step(parent, prev_step) => {
                                break Some(parent);
                            }
                            Some(parent) => cursor = self.parent_of(parent),
                            None => break None,
                        }
                    }
                }
            };

            match matched {
                Some(ancestor) => current = ancestor,
                None => return false,
            }
        }

        true
    }

    fn matches_step(&self, node_id: usize, step: &SelectorStep) -> bool {
        self.get_node(node_id)
            .and_then(|node| node.element_data())
            .is_some_and(|element| step.matches(element))
    }

    fn parent_of(&self, node_id: usize) -> Option<usize> {
        self.get_node(node_id)?.parent
    }
}

/// A parsed selector: the comma-separated alternatives, each a chain of
/// compound steps joined by combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    chains: Vec<Vec<SelectorPart>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorPart {
    step: SelectorStep,
    /// Relation to the previous (left) part. Unused on the first part.
    combinator: Combinator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One compound selector: every present condition must hold on the element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SelectorStep {
    universal: bool,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

impl SelectorStep {
    fn matches(&self, element: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if !element.name.local.as_ref().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }
        self.attrs.iter().all(|attr| attr.matches(element))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrCondition {
    name: String,
    /// `None` is a bare `[attr]` existence check
    value: Option<String>,
}

impl AttrCondition {
    fn matches(&self, element: &ElementData) -> bool {
        let actual = element
            .attrs
            .iter()
            .find(|attr| attr.name.local.as_ref() == self.name)
            .map(|attr| attr.value.as_str());
        match (&self.value, actual) {
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
            (_, None) => false,
        }
    }
}

/// A selector string that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    selector: String,
    reason: &'static str,
}

impl SelectorError {
    fn new(selector: &str, reason: &'static str) -> Self {
        Self {
            selector: selector.to_string(),
            reason,
        }
    }
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid selector {:?}: {}", self.selector, self.reason)
    }
}

impl Error for SelectorError {}

/// Parses a comma-separated selector list
pub fn parse_selector_list(input: &str) -> Result<SelectorList, SelectorError> {
    let mut chains = Vec::new();
    for group in split_groups(input)? {
        chains.push(parse_chain(input, group)?);
    }
    Ok(SelectorList { chains })
}

/// Splits on top-level commas, honouring quotes and brackets
fn split_groups(input: &str) -> Result<Vec<&str>, SelectorError> {
    let mut groups = Vec::new();
    let mut start = 0usize;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (idx, ch) in input.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '[' => depth += 1,
                ']' => {
                    if depth == 0 {
                        return Err(SelectorError::new(input, "unbalanced ']'"));
                    }
                    depth -= 1;
                }
                ',' if depth == 0 => {
                    groups.push(&input[start..idx]);
                    start = idx + 1;
                }
                _ => {}
            },
        }
    }
    if quote.is_some() {
        return Err(SelectorError::new(input, "unterminated quote"));
    }
    if depth != 0 {
        return Err(SelectorError::new(input, "unbalanced '['"));
    }
    groups.push(&input[start..]);
    Ok(groups)
}

enum ChainToken {
    Compound(String),
    Child,
}

fn tokenize_chain(input: &str, chain: &str) -> Result<Vec<ChainToken>, SelectorError> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in chain.chars() {
        match quote {
            Some(q) => {
                buf.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    buf.push(ch);
                }
                '[' => {
                    depth += 1;
                    buf.push(ch);
                }
                ']' => {
                    depth = depth.saturating_sub(1);
                    buf.push(ch);
                }
                c if depth == 0 && c.is_ascii_whitespace() => {
                    if !buf.is_empty() {
                        tokens.push(ChainToken::Compound(std::mem::take(&mut buf)));
                    }
                }
                '>' if depth == 0 => {
                    if !buf.is_empty() {
                        tokens.push(ChainToken::Compound(std::mem::take(&mut buf)));
                    }
                    tokens.push(ChainToken::Child);
                }
                c => buf.push(c),
            },
        }
    }
    if quote.is_some() {
        return Err(SelectorError::new(input, "unterminated quote"));
    }
    if !buf.is_empty() {
        tokens.push(ChainToken::Compound(buf));
    }
    Ok(tokens)
}

fn parse_chain(input: &str, chain: &str) -> Result<Vec<SelectorPart>, SelectorError> {
    let mut parts: Vec<SelectorPart> = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize_chain(input, chain)? {
        match token {
            ChainToken::Child => {
                if parts.is_empty() || pending.is_some() {
                    return Err(SelectorError::new(input, "dangling '>' combinator"));
                }
                pending = Some(Combinator::Child);
            }
            ChainToken::Compound(compound) => {
                let step = parse_step(input, &compound)?;
                let combinator = pending.take().unwrap_or(Combinator::Descendant);
                parts.push(SelectorPart { step, combinator });
            }
        }
    }

    if pending.is_some() {
        return Err(SelectorError::new(input, "dangling '>' combinator"));
    }
    if parts.is_empty() {
        return Err(SelectorError::new(input, "empty selector"));
    }
    Ok(parts)
}

fn parse_step(input: &str, compound: &str) -> Result<SelectorStep, SelectorError> {
    let bytes = compound.as_bytes();
    let mut step = SelectorStep::default();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step != SelectorStep::default() {
                    return Err(SelectorError::new(input, "misplaced '*'"));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let (ident, next) = parse_ident(compound, i + 1)
                    .ok_or_else(|| SelectorError::new(input, "expected identifier after '#'"))?;
                if step.id.replace(ident).is_some() {
                    return Err(SelectorError::new(input, "duplicate id condition"));
                }
                i = next;
            }
            b'.' => {
                let (ident, next) = parse_ident(compound, i + 1)
                    .ok_or_else(|| SelectorError::new(input, "expected identifier after '.'"))?;
                step.classes.push(ident);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_attr_condition(input, compound, i)?;
                step.attrs.push(attr);
                i = next;
            }
            _ => {
                if step != SelectorStep::default() {
                    return Err(SelectorError::new(input, "unsupported selector syntax"));
                }
                let (ident, next) = parse_ident(compound, i)
                    .ok_or_else(|| SelectorError::new(input, "unsupported selector syntax"))?;
                step.tag = Some(ident.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if step == SelectorStep::default() {
        return Err(SelectorError::new(input, "empty compound selector"));
    }
    Ok(step)
}

/// An identifier: ASCII alphanumerics, `-` and `_`. Returns the identifier
/// and the byte offset just past it.
fn parse_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut end = start;
    while end < bytes.len() {
        let b = bytes[end];
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            end += 1;
        } else {
            break;
        }
    }
    (end > start).then(|| (src[start..end].to_string(), end))
}

/// Parses `[name]` or `[name=value]` starting at the `[`
fn parse_attr_condition(
    input: &str,
    compound: &str,
    start: usize,
) -> Result<(AttrCondition, usize), SelectorError> {
    let bytes = compound.as_bytes();
    let (name, mut i) = parse_ident(compound, start + 1)
        .ok_or_else(|| SelectorError::new(input, "expected attribute name"))?;
    let name = name.to_ascii_lowercase();

    match bytes.get(i).copied() {
        Some(b']') => Ok((AttrCondition { name, value: None }, i + 1)),
        Some(b'=') => {
            i += 1;
            let (value, next) = parse_attr_value(input, compound, i)?;
            i = next;
            match bytes.get(i).copied() {
                Some(b']') => Ok((
                    AttrCondition {
                        name,
                        value: Some(value),
                    },
                    i + 1,
                )),
                _ => Err(SelectorError::new(input, "expected ']'")),
            }
        }
        _ => Err(SelectorError::new(input, "expected '=' or ']'")),
    }
}

fn parse_attr_value(
    input: &str,
    compound: &str,
    start: usize,
) -> Result<(String, usize), SelectorError> {
    let bytes = compound.as_bytes();
    match bytes.get(start).copied() {
        Some(q @ (b'"' | b'\'')) => {
            let mut end = start + 1;
            while end < bytes.len() && bytes[end] != q {
                end += 1;
            }
            if end == bytes.len() {
                return Err(SelectorError::new(input, "unterminated quote"));
            }
            Ok((compound[start + 1..end].to_string(), end + 1))
        }
        Some(_) => {
            let mut end = start;
            while end < bytes.len() && bytes[end] != b']' {
                end += 1;
            }
            if end == start {
                return Err(SelectorError::new(input, "expected attribute value"));
            }
            Ok((compound[start..end].to_string(), end))
        }
        None => Err(SelectorError::new(input, "expected attribute value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Attribute;
    use crate::{DocumentConfig, QualName, qual_name};

    fn attr(name: QualName, value: &str) -> Attribute {
        Attribute {
            name,
            value: value.to_string(),
        }
    }

    /// <div id="sidebar" class="panel open">
    ///   <ul class="menu">
    ///     <li class="item"><a href="#">one</a></li>
    ///     <li class="item selected"><a href="#">two</a></li>
    ///   </ul>
    /// </div>
    /// <div class="panel"><a download>three</a></div>
    fn sample_doc() -> (Document, [usize; 8]) {
        let mut doc = Document::new(DocumentConfig::default());
        let sidebar = doc.create_element(
            qual_name!("div"),
            vec![
                attr(qual_name!("id"), "sidebar"),
                attr(qual_name!("class"), "panel open"),
            ],
        );
        let menu = doc.create_element(qual_name!("ul"), vec![attr(qual_name!("class"), "menu")]);
        let li1 = doc.create_element(qual_name!("li"), vec![attr(qual_name!("class"), "item")]);
        let a1 = doc.create_element(qual_name!("a"), vec![attr(qual_name!("href"), "#")]);
        let li2 = doc.create_element(
            qual_name!("li"),
            vec![attr(qual_name!("class"), "item selected")],
        );
        let a2 = doc.create_element(qual_name!("a"), vec![attr(qual_name!("href"), "#")]);
        let other = doc.create_element(qual_name!("div"), vec![attr(qual_name!("class"), "panel")]);
        let a3 = doc.create_element(qual_name!("a"), vec![attr(qual_name!("download"), "")]);

        doc.append(0, &[sidebar, other]);
        doc.append(sidebar, &[menu]);
        doc.append(menu, &[li1, li2]);
        doc.append(li1, &[a1]);
        doc.append(li2, &[a2]);
        doc.append(other, &[a3]);

        (doc, [sidebar, menu, li1, a1, li2, a2, other, a3])
    }

    #[test]
    fn matches_by_tag_class_and_id() {
        let (doc, [sidebar, menu, li1, _, li2, _, other, _]) = sample_doc();

        assert_eq!(doc.query_selector("ul").unwrap(), Some(menu));
        assert_eq!(doc.query_selector("#sidebar").unwrap(), Some(sidebar));
        assert_eq!(doc.query_selector(".selected").unwrap(), Some(li2));
        assert_eq!(doc.query_selector("li.item").unwrap(), Some(li1));
        assert_eq!(doc.query_selector("div.panel").unwrap(), Some(sidebar));
        assert_eq!(
            doc.query_selector_all("div.panel").unwrap().to_vec(),
            vec![sidebar, other]
        );
        assert_eq!(doc.query_selector(".missing").unwrap(), None);
    }

    #[test]
    fn matches_attribute_conditions() {
        let (doc, [_, _, _, a1, _, _, _, a3]) = sample_doc();

        assert_eq!(doc.query_selector("[download]").unwrap(), Some(a3));
        assert_eq!(doc.query_selector("a[href=\"#\"]").unwrap(), Some(a1));
        assert_eq!(doc.query_selector("a[href='#']").unwrap(), Some(a1));
        assert_eq!(doc.query_selector("a[href=missing]").unwrap(), None);
    }

    #[test]
    fn descendant_and_child_combinators() {
        let (doc, [_, _, _, a1, _, a2, _, _]) = sample_doc();

        assert_eq!(
            doc.query_selector_all("#sidebar a").unwrap().to_vec(),
            vec![a1, a2]
        );
        // The anchors are grandchildren of the menu, not children
        assert_eq!(doc.query_selector("ul.menu > a").unwrap(), None);
        assert_eq!(
            doc.query_selector("ul.menu > li.selected > a").unwrap(),
            Some(a2)
        );
        assert_eq!(doc.query_selector("div > ul a").unwrap(), Some(a1));
    }

    #[test]
    fn selector_groups_match_any_alternative() {
        let (doc, [sidebar, menu, ..]) = sample_doc();

        assert_eq!(doc.query_selector(".missing, ul").unwrap(), Some(menu));
        let all = doc.query_selector_all("#sidebar, .menu").unwrap();
        assert_eq!(all.to_vec(), vec![sidebar, menu]);
    }

    #[test]
    fn universal_selector_matches_every_element() {
        let (doc, ids) = sample_doc();
        let all = doc.query_selector_all("*").unwrap();
        // Every element, in tree order; the root document node never matches
        assert_eq!(all.len(), ids.len());
        assert_eq!(all.first().copied(), Some(ids[0]));
    }

    #[test]
    fn results_come_back_in_tree_order() {
        let (doc, [_, _, li1, a1, li2, a2, _, a3]) = sample_doc();
        let all = doc.query_selector_all("li, a").unwrap();
        assert_eq!(all.to_vec(), vec![li1, a1, li2, a2, a3]);
    }

    #[test]
    fn malformed_selectors_error() {
        let (doc, _) = sample_doc();

        assert!(doc.query_selector("").is_err());
        assert!(doc.query_selector("  ").is_err());
        assert!(doc.query_selector("div >").is_err());
        assert!(doc.query_selector("> div").is_err());
        assert!(doc.query_selector("div > > a").is_err());
        assert!(doc.query_selector("a:hover").is_err());
        assert!(doc.query_selector("[href").is_err());
        assert!(doc.query_selector("div,").is_err());
        assert!(doc.query_selector("#").is_err());
    }

    #[test]
    fn quoted_values_may_contain_separators() {
        let mut doc = Document::new(DocumentConfig::default());
        let el = doc.create_element(
            qual_name!("div"),
            vec![attr(qual_name!("title"), "a, b > c")],
        );
        doc.append(0, &[el]);

        assert_eq!(
            doc.query_selector("[title='a, b > c']").unwrap(),
            Some(el)
        );
    }

    #[test]
    fn get_element_by_id_uses_the_id_map() {
        let (doc, [sidebar, ..]) = sample_doc();
        assert_eq!(doc.get_element_by_id("sidebar"), Some(sidebar));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }
}
