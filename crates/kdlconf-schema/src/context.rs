//! # Traversal Context
//!
//! A stack-based cursor that mirrors the deserializer's recursive descent.
//! It exists for two reasons only: rendering the location of a problem, and
//! collecting every problem found during one top-level call.
//!
//! ## Path Rendering
//!
//! ```text
//! top() > role[nth(0)] > user[nth(1)][val(1)]
//! ─┬───   ─────┬─────    ─────┬─────  ──┬───
//!  root     frame        frame      marker
//! ```
//!
//! Each frame carries the tag it was opened for and that tag's occurrence
//! index among its siblings, so repeated same-tag children are told apart.
//! At most one marker (`[prop(name)]`, `[val(i)]`, `[val(a..)]`,
//! `[val(a..b)]`) is active at a time.
//!
//! ## Ownership
//!
//! A context belongs to one top-level call and is mutated only by the call
//! stack that created it. It is never shared across threads.

use std::collections::HashMap;

use kdlconf_core::ConfigNode;

use crate::config::DeserializerConfig;
use crate::error::{DeserializeError, Issue, IssueKind, Issues};

/// One open child scope.
#[derive(Debug)]
struct Frame {
    tag: String,
    index: Option<usize>,
    /// Sibling tag → next occurrence index.
    allocated: HashMap<String, usize>,
}

impl Frame {
    fn new(tag: impl Into<String>, index: Option<usize>) -> Self {
        Self {
            tag: tag.into(),
            index,
            allocated: HashMap::new(),
        }
    }

    fn allocate(&mut self, tag: &str) -> usize {
        let next = self.allocated.entry(tag.to_string()).or_insert(0);
        let index = *next;
        *next += 1;
        index
    }

    fn has_allocated(&self, tag: &str) -> bool {
        self.allocated.contains_key(tag)
    }

    fn render(&self) -> String {
        match self.index {
            Some(i) => format!("{}[nth({i})]", self.tag),
            None => self.tag.clone(),
        }
    }
}

/// Transient location inside the current node.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker {
    Property(String),
    Value {
        single: bool,
        start: usize,
        end: Option<usize>,
    },
}

/// Path tracker and issue collector for one top-level deserialization call.
#[derive(Debug)]
pub struct TraversalContext {
    frames: Vec<Frame>,
    marker: Option<Marker>,
    issues: Vec<Issue>,
    report_unexpected_children: bool,
}

impl Default for TraversalContext {
    fn default() -> Self {
        Self::new(&DeserializerConfig::default())
    }
}

impl TraversalContext {
    /// A fresh context holding only the root frame.
    pub fn new(config: &DeserializerConfig) -> Self {
        Self {
            frames: vec![Frame::new(config.root_label.clone(), None)],
            marker: None,
            issues: Vec::new(),
            report_unexpected_children: config.report_unexpected_children,
        }
    }

    fn current(&mut self) -> &mut Frame {
        // The root frame is never popped.
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Number of open child scopes, not counting the root.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Open a scope for a child named `tag`.
    ///
    /// Allocates the next occurrence index for `tag` under the current
    /// frame and returns it.
    pub fn begin_child(&mut self, tag: &str) -> usize {
        let index = self.current().allocate(tag);
        self.frames.push(Frame::new(tag, Some(index)));
        index
    }

    /// Close the current scope.
    ///
    /// Every child present on `node` whose tag was never claimed by
    /// [`begin_child`](Self::begin_child) during the scope is recorded as an
    /// unexpected child.
    pub fn end_child(&mut self, node: &ConfigNode) {
        if self.report_unexpected_children {
            let unclaimed: Vec<String> = {
                let frame = self.current();
                node.children
                    .iter()
                    .filter(|c| !frame.has_allocated(&c.name))
                    .map(|c| c.name.clone())
                    .collect()
            };
            for name in unclaimed {
                self.add_error(IssueKind::UnexpectedChild, format!("Unexpected child {name}"));
            }
        }
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Mark the property being resolved. Clears any value marker.
    pub fn begin_property(&mut self, name: &str) {
        self.marker = Some(Marker::Property(name.to_string()));
    }

    /// Clear the property marker.
    pub fn end_property(&mut self) {
        if matches!(self.marker, Some(Marker::Property(_))) {
            self.marker = None;
        }
    }

    /// Mark the value slot or range being resolved. Clears any property
    /// marker. `length: None` renders as an open range.
    pub fn begin_value(&mut self, single: bool, start: usize, length: Option<usize>) {
        self.marker = Some(Marker::Value {
            single,
            start,
            end: length.map(|l| start.saturating_add(l)),
        });
    }

    /// Clear the value marker.
    pub fn end_value(&mut self) {
        if matches!(self.marker, Some(Marker::Value { .. })) {
            self.marker = None;
        }
    }

    /// The current location, rendered.
    pub fn path(&self) -> String {
        let mut path = self
            .frames
            .iter()
            .map(Frame::render)
            .collect::<Vec<_>>()
            .join(" > ");

        match &self.marker {
            Some(Marker::Property(name)) => {
                path.push_str(&format!("[prop({name})]"));
            }
            Some(Marker::Value { single: true, start, .. }) => {
                path.push_str(&format!("[val({start})]"));
            }
            Some(Marker::Value { start, end: None, .. }) => {
                path.push_str(&format!("[val({start}..)]"));
            }
            Some(Marker::Value { start, end: Some(end), .. }) => {
                path.push_str(&format!("[val({start}..{end})]"));
            }
            None => {}
        }
        path
    }

    /// Record an issue at the current location. Never fails.
    pub fn add_error(&mut self, kind: IssueKind, message: impl Into<String>) {
        let issue = Issue {
            kind,
            path: self.path(),
            message: message.into(),
        };
        tracing::trace!(path = %issue.path, message = %issue.message, "issue recorded");
        self.issues.push(issue);
    }

    /// Issues recorded so far.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Whether any issue has been recorded.
    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Surface the collected issues.
    ///
    /// Called once, by the top-level call that owns this context.
    ///
    /// # Errors
    ///
    /// Returns `DeserializeError::Failed` carrying every issue if at least
    /// one was recorded.
    pub fn finish(self) -> Result<(), DeserializeError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(DeserializeError::Failed(Issues::new(self.issues)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path() {
        let cx = TraversalContext::default();
        assert_eq!(cx.path(), "top()");
        assert_eq!(cx.depth(), 0);
    }

    #[test]
    fn test_sibling_occurrence_indices() {
        let mut cx = TraversalContext::default();
        let parent = ConfigNode::new("role");
        cx.begin_child("role");
        assert_eq!(cx.begin_child("path"), 0);
        assert_eq!(cx.path(), "top() > role[nth(0)] > path[nth(0)]");
        cx.end_child(&ConfigNode::new("path"));
        assert_eq!(cx.begin_child("path"), 1);
        assert_eq!(cx.path(), "top() > role[nth(0)] > path[nth(1)]");
        cx.end_child(&ConfigNode::new("path"));
        cx.end_child(&parent);
        assert_eq!(cx.path(), "top()");
        assert!(!cx.has_errors());
    }

    #[test]
    fn test_markers_are_exclusive() {
        let mut cx = TraversalContext::default();
        cx.begin_property("port");
        assert_eq!(cx.path(), "top()[prop(port)]");
        cx.begin_value(true, 2, None);
        assert_eq!(cx.path(), "top()[val(2)]");
        cx.end_property();
        assert_eq!(cx.path(), "top()[val(2)]");
        cx.end_value();
        assert_eq!(cx.path(), "top()");
    }

    #[test]
    fn test_value_range_rendering() {
        let mut cx = TraversalContext::default();
        cx.begin_value(false, 1, None);
        assert_eq!(cx.path(), "top()[val(1..)]");
        cx.begin_value(false, 1, Some(2));
        assert_eq!(cx.path(), "top()[val(1..3)]");
    }

    #[test]
    fn test_unclaimed_children_reported() {
        let mut cx = TraversalContext::default();
        let node = ConfigNode::new("server")
            .with_child(ConfigNode::new("port"))
            .with_child(ConfigNode::new("bogus"));
        cx.begin_child("server");
        cx.begin_child("port");
        cx.end_child(&ConfigNode::new("port"));
        cx.end_child(&node);

        assert_eq!(cx.issues().len(), 1);
        let issue = &cx.issues()[0];
        assert_eq!(issue.kind, IssueKind::UnexpectedChild);
        assert_eq!(issue.message, "Unexpected child bogus");
        assert_eq!(issue.path, "top() > server[nth(0)]");
    }

    #[test]
    fn test_unclaimed_children_can_be_ignored() {
        let cfg = DeserializerConfig {
            report_unexpected_children: false,
            ..DeserializerConfig::default()
        };
        let mut cx = TraversalContext::new(&cfg);
        cx.begin_child("server");
        cx.end_child(&ConfigNode::new("server").with_child(ConfigNode::new("bogus")));
        assert!(cx.finish().is_ok());
    }

    #[test]
    fn test_finish_surfaces_all_issues() {
        let mut cx = TraversalContext::default();
        cx.add_error(IssueKind::MissingMandatory, "a");
        cx.add_error(IssueKind::TypeMismatch, "b");
        let err = cx.finish().unwrap_err();
        assert_eq!(err.issues().map(Issues::len), Some(2));
    }

    #[test]
    fn test_root_frame_survives_extra_end() {
        let mut cx = TraversalContext::default();
        cx.end_child(&ConfigNode::empty());
        assert_eq!(cx.path(), "top()");
    }
}
