//! # Nested Extractor
//!
//! Lazy search over a [`MetadataNode`] tree for every value stored under a
//! key containing a given substring, at any depth.
//!
//! The traversal is a depth-first walk in document order driven by an
//! explicit stack of slice iterators, so values are produced one at a time
//! and nothing beyond the current path is held in memory. A value whose key
//! matches is yielded as a whole and is not searched any further.

use std::iter::FusedIterator;
use std::slice::Iter;

use crate::metadata_tree::MetadataNode;

enum Frame<'a> {
    Entries(Iter<'a, (String, MetadataNode)>),
    Items(Iter<'a, MetadataNode>),
}

/// Iterator over the values found under keys containing `key`.
///
/// Created by [`MetadataNode::extract`]. Each call to `extract` walks the
/// tree again from the top.
pub struct Extract<'a> {
    key: &'a str,
    stack: Vec<Frame<'a>>,
}

impl<'a> Extract<'a> {
    pub fn new(node: &'a MetadataNode, key: &'a str) -> Self {
        let mut extract = Self {
            key,
            stack: Vec::new(),
        };
        extract.descend(node);
        extract
    }

    fn descend(&mut self, node: &'a MetadataNode) {
        match node {
            MetadataNode::Mapping(entries) => self.stack.push(Frame::Entries(entries.iter())),
            MetadataNode::Sequence(items) => self.stack.push(Frame::Items(items.iter())),
            MetadataNode::Scalar(_) => {}
        }
    }
}

impl<'a> Iterator for Extract<'a> {
    type Item = &'a MetadataNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.last_mut() {
            match frame {
                Frame::Entries(entries) => match entries.next() {
                    Some((name, value)) if name.contains(self.key) => return Some(value),
                    Some((_, value)) => self.descend(value),
                    None => {
                        self.stack.pop();
                    }
                },
                Frame::Items(items) => match items.next() {
                    Some(item) => self.descend(item),
                    None => {
                        self.stack.pop();
                    }
                },
            }
        }
        None
    }
}

impl FusedIterator for Extract<'_> {}

impl MetadataNode {
    /// Lazily yields every value stored under a key that contains `key`.
    ///
    /// Matching is by substring, so `"KeyDescriptor"` matches
    /// `"md:KeyDescriptor"`. An absent key yields an empty iterator.
    pub fn extract<'a>(&'a self, key: &'a str) -> Extract<'a> {
        Extract::new(self, key)
    }
}
