use smallvec::SmallVec;
use thicket_dom::{AncestorTraverser, Document, SelectorError, local_name};

/// First node matching `selector`, in tree order. A selector that parses
/// but matches nothing is `Ok(None)`; only a malformed selector is an
/// error.
pub fn get(doc: &Document, selector: &str) -> Result<Option<usize>, SelectorError> {
    doc.query_selector(selector)
}

/// All nodes matching `selector`, in tree order
pub fn get_all(doc: &Document, selector: &str) -> Result<SmallVec<[usize; 32]>, SelectorError> {
    doc.query_selector_all(selector)
}

/// Nearest node, starting from `element` itself and walking up the parent
/// chain, whose class attribute contains a word-boundary match for
/// `class_name`. A single leading `.` on `class_name` is ignored, so
/// `closest(doc, el, ".foo")` and `closest(doc, el, "foo")` are the same
/// search.
pub fn closest(doc: &Document, element: usize, class_name: &str) -> Option<usize> {
    let class_name = class_name.strip_prefix('.').unwrap_or(class_name);

    std::iter::once(element)
        .chain(AncestorTraverser::new(doc, element))
        .find(|id| {
            doc.get_node(*id)
                .and_then(|node| node.attr(local_name!("class")))
                .is_some_and(|classes| word_boundary_match(classes, class_name))
        })
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Whether a word boundary falls at byte position `pos`: the characters on
/// either side disagree about being word characters, positions outside the
/// string counting as non-word.
fn is_boundary(bytes: &[u8], pos: usize) -> bool {
    let before = pos > 0 && is_word_byte(bytes[pos - 1]);
    let after = pos < bytes.len() && is_word_byte(bytes[pos]);
    before != after
}

/// Literal substring match where both ends of the occurrence fall on word
/// boundaries. `foo` matches in `foo-bar` but not in `foobar`.
fn word_boundary_match(haystack: &str, needle: &str) -> bool {
    let bytes = haystack.as_bytes();
    if needle.is_empty() {
        // An empty needle matches wherever any boundary exists
        return bytes.iter().copied().any(is_word_byte);
    }

    let advance = needle.chars().next().map(char::len_utf8).unwrap_or(1);
    let mut search_start = 0;
    while let Some(found) = haystack[search_start..].find(needle) {
        let start = search_start + found;
        let end = start + needle.len();
        if is_boundary(bytes, start) && is_boundary(bytes, end) {
            return true;
        }
        search_start = start + advance;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_boundaries_split_on_non_word_characters() {
        assert!(word_boundary_match("foo", "foo"));
        assert!(word_boundary_match("foo-bar", "foo"));
        assert!(word_boundary_match("bar foo baz", "foo"));
        assert!(word_boundary_match("bar.foo", "foo"));

        assert!(!word_boundary_match("foobar", "foo"));
        assert!(!word_boundary_match("barfoo", "foo"));
        assert!(!word_boundary_match("foo_bar", "foo"));
        assert!(!word_boundary_match("", "foo"));
    }

    #[test]
    fn later_occurrences_are_still_found() {
        assert!(word_boundary_match("foofoo foo", "foo"));
        assert!(word_boundary_match("xfoo foo", "foo"));
    }

    #[test]
    fn empty_needle_needs_a_boundary_in_the_haystack() {
        assert!(word_boundary_match("a", ""));
        assert!(!word_boundary_match("", ""));
        assert!(!word_boundary_match("---", ""));
    }
}
