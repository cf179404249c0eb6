//! Immutable logger context: the group prefixes and attributes bound ahead
//! of any particular record.
//!
//! Both [`GroupPath`] and [`Context`] are persistent singly linked lists of
//! `Arc` nodes. Extending one allocates exactly one node that points at the
//! old list, so a context handed to many derived loggers is shared, never
//! copied, and never changes underneath any of them.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::value::Attr;

struct GroupNode {
    parent: Option<Arc<GroupNode>>,
    name: Cow<'static, str>,
    depth: usize,
}

/// Ordered list of group names active for a binding, outermost first.
#[derive(Clone, Default)]
pub struct GroupPath(Option<Arc<GroupNode>>);

impl GroupPath {
    pub fn new() -> Self {
        GroupPath(None)
    }

    /// Returns a path with `name` appended; `self` is left untouched.
    pub fn push(&self, name: impl Into<Cow<'static, str>>) -> GroupPath {
        let depth = self.len() + 1;
        GroupPath(Some(Arc::new(GroupNode {
            parent: self.0.clone(),
            name: name.into(),
            depth,
        })))
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |node| node.depth)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Group name at `index`, counted from the outermost group.
    pub fn get(&self, index: usize) -> Option<&str> {
        let len = self.len();
        if index >= len {
            return None;
        }
        let mut node = self.0.as_deref()?;
        for _ in 0..(len - 1 - index) {
            node = node.parent.as_deref()?;
        }
        Some(node.name.as_ref())
    }

    /// Innermost group name.
    pub fn last(&self) -> Option<&str> {
        self.0.as_deref().map(|node| node.name.as_ref())
    }

    /// Group names, outermost first.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }

    /// Appends every group name followed by `.`.
    pub fn append_prefix(&self, buf: &mut Vec<u8>) {
        fn walk(node: &GroupNode, buf: &mut Vec<u8>) {
            if let Some(parent) = &node.parent {
                walk(parent, buf);
            }
            buf.extend_from_slice(node.name.as_bytes());
            buf.push(b'.');
        }
        if let Some(node) = &self.0 {
            walk(node, buf);
        }
    }

    /// True when both paths are the same list in memory.
    pub fn ptr_eq(&self, other: &GroupPath) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl PartialEq for GroupPath {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for GroupPath {}

impl fmt::Debug for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl<S: Into<Cow<'static, str>>> FromIterator<S> for GroupPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter()
            .fold(GroupPath::new(), |path, name| path.push(name))
    }
}

/// One `bind` call: the attributes it added and the path they were bound under.
struct Binding {
    prev: Option<Arc<Binding>>,
    groups: GroupPath,
    attrs: Box<[Attr]>,
}

/// Accumulated logger context.
///
/// Cloning is two reference count bumps. [`bind`](Context::bind) and
/// [`enter_group`](Context::enter_group) return new contexts and leave the
/// receiver unchanged, so a base context can be shared across threads and
/// extended independently by each holder.
#[derive(Clone, Default)]
pub struct Context {
    bindings: Option<Arc<Binding>>,
    groups: GroupPath,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    /// Returns a context with `attrs` bound under the current group path.
    ///
    /// Binding nothing returns a context sharing this one's nodes.
    pub fn bind(&self, attrs: Vec<Attr>) -> Context {
        if attrs.is_empty() {
            return self.clone();
        }
        Context {
            bindings: Some(Arc::new(Binding {
                prev: self.bindings.clone(),
                groups: self.groups.clone(),
                attrs: attrs.into_boxed_slice(),
            })),
            groups: self.groups.clone(),
        }
    }

    /// Returns a context whose future bindings and per-call attributes are
    /// qualified by one more group. An empty name returns a context sharing
    /// this one's nodes.
    pub fn enter_group(&self, name: impl Into<Cow<'static, str>>) -> Context {
        let name = name.into();
        if name.is_empty() {
            return self.clone();
        }
        Context {
            bindings: self.bindings.clone(),
            groups: self.groups.push(name),
        }
    }

    /// Group path applied to attributes supplied with a record.
    pub fn groups(&self) -> &GroupPath {
        &self.groups
    }

    /// Visits every bound attribute in binding order, with the group path
    /// that was active when it was bound.
    pub fn for_each_bound<F: FnMut(&GroupPath, &Attr)>(&self, mut f: F) {
        fn walk<F: FnMut(&GroupPath, &Attr)>(binding: &Binding, f: &mut F) {
            if let Some(prev) = &binding.prev {
                walk(prev, f);
            }
            for attr in binding.attrs.iter() {
                f(&binding.groups, attr);
            }
        }
        if let Some(binding) = &self.bindings {
            walk(binding, &mut f);
        }
    }

    /// Number of bound attributes.
    pub fn bound_len(&self) -> usize {
        let mut len = 0;
        let mut node = self.bindings.as_deref();
        while let Some(binding) = node {
            len += binding.attrs.len();
            node = binding.prev.as_deref();
        }
        len
    }

    /// True when both contexts share the same nodes.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        let same_bindings = match (&self.bindings, &other.bindings) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_bindings && self.groups.ptr_eq(&other.groups)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound = Vec::with_capacity(self.bound_len());
        self.for_each_bound(|groups, attr| bound.push((groups.to_string(), attr.clone())));
        f.debug_struct("Context")
            .field("bound", &bound)
            .field("groups", &self.groups)
            .finish()
    }
}
