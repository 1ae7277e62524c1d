//! Recursive traversal of bound input looking for resolvers.
//!
//! After parameters and body are bound, the [`Walker`] visits the whole input
//! value depth-first. Any value whose [`Walk::resolver`] returns a
//! [`Resolve`] implementation is invoked with a [`ResolveScope`] rooted at
//! that value's location, before its children are visited.
//!
//! Path bookkeeping:
//!
//! | Container | Segment |
//! |-----------|---------|
//! | record field | `.name` |
//! | `Vec`, slice, `VecDeque` | `[i]` |
//! | `HashMap`, `BTreeMap` | `.key`, keys visited in sorted order |
//! | `Option`, `Box`, `Arc`, `Rc` | none |

use crate::{BindContext, ErrorDetail, ErrorSink};
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::Display;
use std::rc::Rc;
use std::sync::Arc;

/// User-supplied validation hook on a nested input value.
///
/// # Example
///
/// ```rust
/// use plinth_bind::{BindContext, ErrorDetail, Resolve, ResolveScope};
///
/// struct Choice {
///     one: String,
///     two: String,
/// }
///
/// impl Resolve for Choice {
///     fn resolve(&self, _ctx: &BindContext, errors: &mut ResolveScope<'_>) {
///         if !self.one.is_empty() && !self.two.is_empty() {
///             errors.add_error(ErrorDetail::new(
///                 "Only one of ['one', 'two'] is allowed.",
///                 "one",
///                 self.one.clone(),
///             ));
///         }
///     }
/// }
/// ```
pub trait Resolve {
    /// Inspects the value and records any problems.
    ///
    /// Locations passed to [`ResolveScope::add_error`] are relative to the
    /// value being resolved.
    fn resolve(&self, ctx: &BindContext, errors: &mut ResolveScope<'_>);
}

/// Values the walker can traverse.
///
/// Records normally get this from `#[derive(Walk)]`. Leaves (numbers, text,
/// timestamps, raw JSON) have no children and no resolver.
pub trait Walk {
    /// Returns the value's resolver, if it has one.
    fn resolver(&self) -> Option<&dyn Resolve> {
        None
    }

    /// Visits each child through `walker`.
    fn walk_children(&self, walker: &mut Walker<'_>);
}

/// Error sink handed to a resolver, scoped to the resolver's location.
pub struct ResolveScope<'a> {
    path: &'a str,
    sink: &'a mut ErrorSink,
}

impl ResolveScope<'_> {
    /// Returns the location of the value being resolved.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path
    }

    /// Records a problem; its location is appended to the scope's path.
    pub fn add_error(&mut self, mut detail: ErrorDetail) {
        detail.location = join_location(self.path, &detail.location);
        self.sink.add_error(detail);
    }
}

fn join_location(path: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        path.to_string()
    } else if path.is_empty() {
        suffix.to_string()
    } else if suffix.starts_with('[') {
        format!("{path}{suffix}")
    } else {
        format!("{path}.{suffix}")
    }
}

/// Depth-first, pre-order traversal state for one request.
pub struct Walker<'a> {
    ctx: &'a BindContext,
    sink: &'a mut ErrorSink,
    path: String,
    depth: usize,
    max_depth: usize,
    exceeded_at: Option<String>,
    resolved: usize,
}

impl<'a> Walker<'a> {
    /// Creates a walker rooted at the empty path.
    pub fn new(ctx: &'a BindContext, sink: &'a mut ErrorSink, max_depth: usize) -> Self {
        Self {
            ctx,
            sink,
            path: String::new(),
            depth: 0,
            max_depth,
            exceeded_at: None,
            resolved: 0,
        }
    }

    /// Returns the current location.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Visits `value` at the current location.
    ///
    /// Depth is unchanged: indirection such as `Option` or `Box` adds no
    /// path segment and does not count against the bound.
    pub fn visit(&mut self, value: &dyn Walk) {
        if self.exceeded_at.is_some() {
            return;
        }
        if let Some(resolver) = value.resolver() {
            let mut scope = ResolveScope {
                path: &self.path,
                sink: self.sink,
            };
            resolver.resolve(self.ctx, &mut scope);
            self.resolved += 1;
        }
        value.walk_children(self);
    }

    /// Visits a record field under `.name`.
    pub fn field(&mut self, name: &str, value: &dyn Walk) {
        let len = self.path.len();
        if !self.path.is_empty() {
            self.path.push('.');
        }
        self.path.push_str(name);
        self.descend(value);
        self.path.truncate(len);
    }

    /// Visits a sequence element under `[index]`.
    pub fn index(&mut self, index: usize, value: &dyn Walk) {
        let len = self.path.len();
        self.path.push('[');
        self.path.push_str(&index.to_string());
        self.path.push(']');
        self.descend(value);
        self.path.truncate(len);
    }

    /// Visits `value` one segment deeper than its parent.
    fn descend(&mut self, value: &dyn Walk) {
        if self.exceeded_at.is_some() {
            return;
        }
        if self.depth >= self.max_depth {
            self.exceeded_at = Some(self.path.clone());
            return;
        }
        self.depth += 1;
        self.visit(value);
        self.depth -= 1;
    }

    /// Visits a map value under `.key`.
    pub fn key(&mut self, key: &str, value: &dyn Walk) {
        self.field(key, value);
    }

    /// Returns how many resolvers ran, or the location where the depth
    /// bound was hit.
    pub fn finish(self) -> Result<usize, String> {
        match self.exceeded_at {
            Some(path) => Err(path),
            None => Ok(self.resolved),
        }
    }
}

macro_rules! impl_walk_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Walk for $ty {
                fn walk_children(&self, _walker: &mut Walker<'_>) {}
            }
        )*
    };
}

impl_walk_leaf!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    str,
    String,
    Bytes,
    serde_json::Value,
    chrono::DateTime<chrono::Utc>,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
);

impl<T: Walk> Walk for Option<T> {
    fn walk_children(&self, walker: &mut Walker<'_>) {
        if let Some(value) = self {
            walker.visit(value);
        }
    }
}

impl<T: Walk> Walk for Box<T> {
    fn walk_children(&self, walker: &mut Walker<'_>) {
        walker.visit(&**self);
    }
}

impl<T: Walk> Walk for Arc<T> {
    fn walk_children(&self, walker: &mut Walker<'_>) {
        walker.visit(&**self);
    }
}

impl<T: Walk> Walk for Rc<T> {
    fn walk_children(&self, walker: &mut Walker<'_>) {
        walker.visit(&**self);
    }
}

impl<T: Walk> Walk for Vec<T> {
    fn walk_children(&self, walker: &mut Walker<'_>) {
        self.as_slice().walk_children(walker);
    }
}

impl<T: Walk> Walk for [T] {
    fn walk_children(&self, walker: &mut Walker<'_>) {
        for (i, item) in self.iter().enumerate() {
            walker.index(i, item);
        }
    }
}

impl<T: Walk> Walk for VecDeque<T> {
    fn walk_children(&self, walker: &mut Walker<'_>) {
        for (i, item) in self.iter().enumerate() {
            walker.index(i, item);
        }
    }
}

impl<K: Display, V: Walk, S> Walk for HashMap<K, V, S> {
    fn walk_children(&self, walker: &mut Walker<'_>) {
        walk_sorted(self.iter(), walker);
    }
}

impl<K: Display, V: Walk> Walk for BTreeMap<K, V> {
    fn walk_children(&self, walker: &mut Walker<'_>) {
        walk_sorted(self.iter(), walker);
    }
}

/// Visits map values ordered by their rendered key.
fn walk_sorted<'v, K: Display + 'v, V: Walk + 'v>(
    entries: impl Iterator<Item = (&'v K, &'v V)>,
    walker: &mut Walker<'_>,
) {
    let mut entries: Vec<(String, &V)> = entries.map(|(k, v)| (k.to_string(), v)).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, value) in entries {
        walker.key(&key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BindContextBuilder;

    struct Flagged {
        bad: bool,
    }

    impl Resolve for Flagged {
        fn resolve(&self, _ctx: &BindContext, errors: &mut ResolveScope<'_>) {
            if self.bad {
                errors.add_error(ErrorDetail::new("flagged", "bad", true));
            }
        }
    }

    impl Walk for Flagged {
        fn resolver(&self) -> Option<&dyn Resolve> {
            Some(self)
        }

        fn walk_children(&self, walker: &mut Walker<'_>) {
            walker.field("bad", &self.bad);
        }
    }

    struct Holder {
        items: HashMap<String, Vec<Box<Flagged>>>,
        maybe: Option<Flagged>,
    }

    impl Walk for Holder {
        fn walk_children(&self, walker: &mut Walker<'_>) {
            walker.field("items", &self.items);
            walker.field("maybe", &self.maybe);
        }
    }

    struct Chain(Option<Box<Chain>>);

    impl Walk for Chain {
        fn walk_children(&self, walker: &mut Walker<'_>) {
            walker.field("next", &self.0);
        }
    }

    fn run(value: &dyn Walk, max_depth: usize) -> (ErrorSink, Result<usize, String>) {
        let ctx = BindContextBuilder::new().build();
        let mut sink = ErrorSink::new();
        let mut walker = Walker::new(&ctx, &mut sink, max_depth);
        walker.field("body", value);
        let outcome = walker.finish();
        (sink, outcome)
    }

    #[test]
    fn test_locations_through_maps_vectors_and_boxes() {
        let mut items = HashMap::new();
        items.insert(
            "b".to_string(),
            vec![Box::new(Flagged { bad: false }), Box::new(Flagged { bad: true })],
        );
        items.insert("a".to_string(), vec![Box::new(Flagged { bad: true })]);
        let holder = Holder {
            items,
            maybe: Some(Flagged { bad: true }),
        };

        let (sink, outcome) = run(&holder, 64);
        assert_eq!(outcome, Ok(4));
        let locations: Vec<&str> = sink.errors().iter().map(|e| e.location.as_str()).collect();
        assert_eq!(
            locations,
            vec![
                "body.items.a[0].bad",
                "body.items.b[1].bad",
                "body.maybe.bad",
            ]
        );
    }

    #[test]
    fn test_absent_option_is_skipped() {
        let holder = Holder {
            items: HashMap::new(),
            maybe: None,
        };
        let (sink, outcome) = run(&holder, 64);
        assert!(sink.is_empty());
        assert_eq!(outcome, Ok(0));
    }

    #[test]
    fn test_depth_bound_fails_closed() {
        let mut chain = Chain(None);
        for _ in 0..10 {
            chain = Chain(Some(Box::new(chain)));
        }

        let (_, outcome) = run(&chain, 8);
        assert!(outcome.unwrap_err().starts_with("body.next"));

        let (_, outcome) = run(&chain, 64);
        assert!(outcome.is_ok());
    }

    #[test]
    fn test_indirection_does_not_count_toward_depth() {
        let boxed: Option<Box<Option<Arc<Flagged>>>> =
            Some(Box::new(Some(Arc::new(Flagged { bad: true }))));

        // One segment for `body`, one for `bad`.
        let (sink, outcome) = run(&boxed, 2);
        assert_eq!(outcome, Ok(1));
        assert_eq!(sink.errors()[0].location, "body.bad");

        let (_, outcome) = run(&boxed, 1);
        assert_eq!(outcome, Err("body.bad".to_string()));
    }

    #[test]
    fn test_join_location() {
        assert_eq!(join_location("body.foo", "one"), "body.foo.one");
        assert_eq!(join_location("body.foo", "[1]"), "body.foo[1]");
        assert_eq!(join_location("body.foo", ""), "body.foo");
        assert_eq!(join_location("", "query.x"), "query.x");
    }

    #[test]
    fn test_btree_keys_sorted_as_text() {
        let mut map = BTreeMap::new();
        map.insert(10, Flagged { bad: true });
        map.insert(9, Flagged { bad: true });

        let (sink, _) = run(&map, 64);
        assert_eq!(sink.errors()[0].location, "body.10.bad");
        assert_eq!(sink.errors()[1].location, "body.9.bad");
    }
}
