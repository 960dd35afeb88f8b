//! Tag paths: persistent addressing from the root of a dataset down to a
//! nested element, item or sequence.
//!
//! A [`TagPath`] is a cons-list of steps built by appending to a shorter
//! path, sharing structure with whatever it was built from -- `previous`
//! is a cheap `Rc` clone, not a copy of the whole chain, matching the
//! "persistent linked structure" option the specification calls out.

use std::fmt;
use std::rc::Rc;

use crate::tag::Tag;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Step {
    /// A plain attribute, addressed directly from its enclosing trunk.
    Tag(Tag),
    /// A sequence attribute, not yet indexed into a particular item.
    Sequence(Tag),
    /// The `index`-th (1-based) item of the sequence named by `tag`.
    Item(Tag, u32),
}

#[derive(Debug)]
struct Node {
    step: Step,
    prev: Option<Rc<Node>>,
}

/// A path from the root of a dataset to a nested tag, sequence or item.
///
/// Paths are built by repeated calls to [`then_tag`](TagPath::then_tag),
/// [`then_sequence`](TagPath::then_sequence) and
/// [`then_item`](TagPath::then_item), alternating `Sequence` and `Item`
/// steps the way the wire format alternates sequence headers and item
/// headers. Two paths are equal when their step chains are equal,
/// regardless of how they were shared internally.
#[derive(Debug, Clone, Default)]
pub struct TagPath(Option<Rc<Node>>);

impl TagPath {
    /// The empty path, addressing the root of a dataset.
    pub fn empty() -> TagPath {
        TagPath(None)
    }

    /// Whether this is the empty, root path.
    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    /// Appends a plain attribute step.
    pub fn then_tag(&self, tag: Tag) -> TagPath {
        self.push(Step::Tag(tag))
    }

    /// Appends a sequence step (not yet indexed into an item).
    pub fn then_sequence(&self, tag: Tag) -> TagPath {
        self.push(Step::Sequence(tag))
    }

    /// Appends an item step. `index` is 1-based, per spec.md section 3.
    pub fn then_item(&self, tag: Tag, index: u32) -> TagPath {
        self.push(Step::Item(tag, index))
    }

    fn push(&self, step: Step) -> TagPath {
        TagPath(Some(Rc::new(Node {
            step,
            prev: self.0.clone(),
        })))
    }

    /// The path with its last step removed, or `None` if this path is
    /// already the root.
    pub fn previous(&self) -> Option<TagPath> {
        self.0.as_ref().map(|n| TagPath(n.prev.clone()))
    }

    /// The tag named by this path's last step, or `None` for the root.
    pub fn tag(&self) -> Option<Tag> {
        self.0.as_ref().map(|n| match n.step {
            Step::Tag(t) | Step::Sequence(t) | Step::Item(t, _) => t,
        })
    }

    /// Whether the last step is an item step, and if so its 1-based index.
    pub fn item_index(&self) -> Option<u32> {
        self.0.as_ref().and_then(|n| match n.step {
            Step::Item(_, i) => Some(i),
            _ => None,
        })
    }

    /// The chain of steps from the root down to this path, root first.
    fn steps(&self) -> Vec<Step> {
        let mut out = Vec::new();
        let mut cur = self.0.clone();
        while let Some(node) = cur {
            out.push(node.step.clone());
            cur = node.prev.clone();
        }
        out.reverse();
        out
    }

    /// Whether `self` is an ancestor of, or equal to, `other`: every step
    /// of `self` appears as a prefix of `other`'s steps.
    pub fn is_trunk_of(&self, other: &TagPath) -> bool {
        let mine = self.steps();
        let theirs = other.steps();
        theirs.len() >= mine.len() && theirs[..mine.len()] == mine[..]
    }

    /// Whether `other` is an ancestor of, or equal to, `self`.
    pub fn has_trunk(&self, other: &TagPath) -> bool {
        other.is_trunk_of(self)
    }
}

impl PartialEq for TagPath {
    fn eq(&self, other: &Self) -> bool {
        self.steps() == other.steps()
    }
}

impl Eq for TagPath {}

impl std::hash::Hash for TagPath {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.steps().hash(state);
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let steps = self.steps();
        if steps.is_empty() {
            return write!(f, "<root>");
        }
        for (i, step) in steps.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            match step {
                Step::Tag(t) => write!(f, "{}", t)?,
                Step::Sequence(t) => write!(f, "{}", t)?,
                Step::Item(t, idx) => write!(f, "{}[{}]", t, idx)?,
            }
        }
        Ok(())
    }
}

/// A whitelist of [`TagPath`]s, used by the collect flow (spec.md section
/// 4.6) to decide which parts of a stream to accumulate.
///
/// This is a flat set of entries rather than a literal nested tree --
/// spec.md's `hasTrunk`/`isTrunkOf` predicates only ever need to test a
/// candidate path against each whitelisted path in turn, which a `Vec`
/// does just as well as an explicit tree while being far simpler to
/// build and reason about.
#[derive(Debug, Clone, Default)]
pub struct TagTree {
    entries: Vec<TagPath>,
}

impl TagTree {
    /// Builds a tree from a set of whitelisted paths.
    pub fn from_paths(entries: impl IntoIterator<Item = TagPath>) -> TagTree {
        TagTree {
            entries: entries.into_iter().collect(),
        }
    }

    /// A tree whitelisting a single top-level tag.
    pub fn single_tag(tag: Tag) -> TagTree {
        TagTree::from_paths([TagPath::empty().then_tag(tag)])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `path` should be collected: some whitelist entry either
    /// has `path` as one of its trunks, or is itself a trunk of `path`.
    pub fn collects(&self, path: &TagPath) -> bool {
        self.entries
            .iter()
            .any(|t| t.has_trunk(path) || t.is_trunk_of(path))
    }

    /// The top-level tag of each whitelist entry.
    pub fn heads(&self) -> impl Iterator<Item = Tag> + '_ {
        self.entries.iter().filter_map(|t| t.steps().first().map(|s| match s {
            Step::Tag(t) | Step::Sequence(t) | Step::Item(t, _) => *t,
        }))
    }

    /// The largest top-level tag among the whitelist's entries, used by
    /// the default `stop` condition (spec.md section 4.6).
    pub fn max_head(&self) -> Option<Tag> {
        self.heads().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_strips_last_step() {
        let p = TagPath::empty().then_tag(Tag(0x0008, 0x0020));
        assert!(p.previous().unwrap().is_root());
    }

    #[test]
    fn trunk_relation() {
        let seq = Tag(0x0008, 0x1110);
        let root = TagPath::empty().then_sequence(seq).then_item(seq, 1);
        let leaf = root.then_tag(Tag(0x0020, 0x000D));
        assert!(root.is_trunk_of(&leaf));
        assert!(leaf.has_trunk(&root));
        assert!(!leaf.is_trunk_of(&root));
    }

    #[test]
    fn equality_ignores_sharing() {
        let seq = Tag(0x0008, 0x1110);
        let a = TagPath::empty().then_sequence(seq).then_item(seq, 1);
        let b = TagPath::empty().then_sequence(seq).then_item(seq, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn tree_collects_whitelisted_and_trunk_paths() {
        let tree = TagTree::single_tag(Tag(0x0008, 0x0020));
        assert!(tree.collects(&TagPath::empty().then_tag(Tag(0x0008, 0x0020))));
        assert!(!tree.collects(&TagPath::empty().then_tag(Tag(0x0010, 0x0010))));
        assert_eq!(tree.max_head(), Some(Tag(0x0008, 0x0020)));
    }
}
