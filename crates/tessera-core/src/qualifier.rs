//! Hierarchical names for lexical positions.
//!
//! A [`Qualifier`] is an ordered path of [`ScopeLabel`]s, for example
//! `m0.f2.b5` for the fifth block analyzed, nested in the second function
//! literal of the module. Every label carries an index minted by a dedicated
//! per-kind counter, so two syntactically identical anonymous constructs
//! always receive distinct paths.
//!
//! Qualifiers are interned in a [`QualifierTable`] and referred to by
//! [`QualifierId`]; the empty path is [`QualifierId::ROOT`], where built-in and
//! catalog types live.

use std::fmt;

use rustc_hash::FxHashMap;

/// The kind of construct that introduced a scope segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeKind {
    /// A compilation unit.
    Module,
    /// A function body.
    Func,
    /// A block expression.
    Block,
    /// A let-binding initializer.
    Let,
    /// A for-binding and its body.
    For,
    /// A while loop body.
    While,
    /// An aggregate literal (array/tuple components).
    Literal,
    /// A type annotation.
    Type,
    /// A receiver context.
    This,
}

impl ScopeKind {
    /// Short prefix used when rendering labels.
    pub fn prefix(self) -> &'static str {
        match self {
            ScopeKind::Module => "m",
            ScopeKind::Func => "f",
            ScopeKind::Block => "b",
            ScopeKind::Let => "let",
            ScopeKind::For => "for",
            ScopeKind::While => "w",
            ScopeKind::Literal => "lit",
            ScopeKind::Type => "ty",
            ScopeKind::This => "this",
        }
    }

    /// Whether the kind opens a loop that `break`/`continue` can target.
    pub fn is_loop(self) -> bool {
        matches!(self, ScopeKind::For | ScopeKind::While)
    }
}

/// One segment of a qualifier path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeLabel {
    /// The construct kind.
    pub kind: ScopeKind,
    /// Index minted by the per-kind counter.
    pub index: u32,
}

impl fmt::Display for ScopeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.index)
    }
}

/// An immutable path of scope labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Qualifier {
    segments: Vec<ScopeLabel>,
}

impl Qualifier {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a qualifier from explicit segments.
    pub fn from_segments(segments: Vec<ScopeLabel>) -> Self {
        Self { segments }
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> &[ScopeLabel] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// A new qualifier with one more segment.
    pub fn extend(&self, label: ScopeLabel) -> Qualifier {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(label);
        Qualifier { segments }
    }

    /// The qualifier without its innermost segment.
    pub fn parent(&self) -> Option<Qualifier> {
        let (_, rest) = self.segments.split_last()?;
        Some(Qualifier {
            segments: rest.to_vec(),
        })
    }

    /// The innermost segment, if any.
    pub fn last(&self) -> Option<ScopeLabel> {
        self.segments.last().copied()
    }

    /// Search innermost to outermost for the nearest segment of `kind`.
    pub fn last_scope(&self, kind: ScopeKind) -> Option<ScopeLabel> {
        self.segments.iter().rev().find(|s| s.kind == kind).copied()
    }

    /// Search innermost to outermost for the nearest segment whose kind is in `kinds`.
    pub fn last_scope_of(&self, kinds: &[ScopeKind]) -> Option<ScopeLabel> {
        self.segments
            .iter()
            .rev()
            .find(|s| kinds.contains(&s.kind))
            .copied()
    }

    /// The prefix that owns temporary storage: everything up to and including
    /// the innermost function segment, or the outermost segment when no
    /// function encloses this position.
    pub fn temp_root(&self) -> Qualifier {
        let end = match self
            .segments
            .iter()
            .rposition(|s| s.kind == ScopeKind::Func)
        {
            Some(pos) => pos + 1,
            None => self.segments.len().min(1),
        };
        Qualifier {
            segments: self.segments[..end].to_vec(),
        }
    }

    /// Whether `self` is `other` or a prefix of it.
    pub fn is_prefix_of(&self, other: &Qualifier) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

/// Interned handle to a [`Qualifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifierId(pub u32);

impl QualifierId {
    /// The empty path.
    pub const ROOT: QualifierId = QualifierId(0);
}

/// Interning table for qualifiers plus the per-kind label counters.
#[derive(Debug)]
pub struct QualifierTable {
    paths: Vec<Qualifier>,
    index: FxHashMap<Qualifier, QualifierId>,
    counters: FxHashMap<ScopeKind, u32>,
}

impl QualifierTable {
    /// Create a table holding only the root qualifier.
    pub fn new() -> Self {
        let mut table = Self {
            paths: Vec::new(),
            index: FxHashMap::default(),
            counters: FxHashMap::default(),
        };
        table.intern(Qualifier::root());
        table
    }

    /// Mint a fresh label of `kind`.
    pub fn mint(&mut self, kind: ScopeKind) -> ScopeLabel {
        let counter = self.counters.entry(kind).or_insert(0);
        let index = *counter;
        *counter += 1;
        ScopeLabel { kind, index }
    }

    /// Intern a qualifier, returning its id.
    pub fn intern(&mut self, qualifier: Qualifier) -> QualifierId {
        if let Some(&id) = self.index.get(&qualifier) {
            return id;
        }
        let id = QualifierId(self.paths.len() as u32);
        self.paths.push(qualifier.clone());
        self.index.insert(qualifier, id);
        id
    }

    /// Extend `parent` by a freshly minted label of `kind`.
    pub fn extend(&mut self, parent: QualifierId, kind: ScopeKind) -> QualifierId {
        let label = self.mint(kind);
        let qualifier = self.get(parent).extend(label);
        self.intern(qualifier)
    }

    /// Look up an interned qualifier.
    pub fn get(&self, id: QualifierId) -> &Qualifier {
        &self.paths[id.0 as usize]
    }

    /// The id of the parent qualifier.
    pub fn parent(&mut self, id: QualifierId) -> Option<QualifierId> {
        let parent = self.get(id).parent()?;
        Some(self.intern(parent))
    }

    /// The temporary-storage root of `id`.
    pub fn temp_root(&mut self, id: QualifierId) -> QualifierId {
        let root = self.get(id).temp_root();
        self.intern(root)
    }

    /// Render a qualifier for names and messages.
    pub fn render(&self, id: QualifierId) -> String {
        self.get(id).to_string()
    }

    /// Number of interned qualifiers.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether only the root is interned.
    pub fn is_empty(&self) -> bool {
        self.paths.len() <= 1
    }
}

impl Default for QualifierTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_per_kind() {
        let mut table = QualifierTable::new();
        let b0 = table.mint(ScopeKind::Block);
        let f0 = table.mint(ScopeKind::Func);
        let b1 = table.mint(ScopeKind::Block);
        assert_eq!(b0.index, 0);
        assert_eq!(f0.index, 0);
        assert_eq!(b1.index, 1);
    }

    #[test]
    fn identical_anonymous_blocks_get_distinct_paths() {
        let mut table = QualifierTable::new();
        let module = table.extend(QualifierId::ROOT, ScopeKind::Module);
        let first = table.extend(module, ScopeKind::Block);
        let second = table.extend(module, ScopeKind::Block);
        assert_ne!(first, second);
        assert_eq!(table.render(first), "m0.b0");
        assert_eq!(table.render(second), "m0.b1");
    }

    #[test]
    fn interning_is_by_full_path() {
        let mut table = QualifierTable::new();
        let q = Qualifier::from_segments(vec![ScopeLabel {
            kind: ScopeKind::Module,
            index: 0,
        }]);
        let a = table.intern(q.clone());
        let b = table.intern(q);
        assert_eq!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn last_scope_finds_innermost_of_kind() {
        let q = Qualifier::from_segments(vec![
            ScopeLabel { kind: ScopeKind::Module, index: 0 },
            ScopeLabel { kind: ScopeKind::Func, index: 1 },
            ScopeLabel { kind: ScopeKind::Block, index: 4 },
            ScopeLabel { kind: ScopeKind::Func, index: 2 },
            ScopeLabel { kind: ScopeKind::Block, index: 7 },
        ]);
        assert_eq!(
            q.last_scope(ScopeKind::Func),
            Some(ScopeLabel { kind: ScopeKind::Func, index: 2 })
        );
        assert_eq!(q.last_scope(ScopeKind::For), None);
    }

    #[test]
    fn temp_root_is_innermost_function() {
        let q = Qualifier::from_segments(vec![
            ScopeLabel { kind: ScopeKind::Module, index: 0 },
            ScopeLabel { kind: ScopeKind::Func, index: 3 },
            ScopeLabel { kind: ScopeKind::Block, index: 1 },
            ScopeLabel { kind: ScopeKind::Let, index: 0 },
        ]);
        assert_eq!(q.temp_root().to_string(), "m0.f3");
    }

    #[test]
    fn temp_root_outside_functions_is_module() {
        let q = Qualifier::from_segments(vec![
            ScopeLabel { kind: ScopeKind::Module, index: 0 },
            ScopeLabel { kind: ScopeKind::Block, index: 1 },
        ]);
        assert_eq!(q.temp_root().to_string(), "m0");
        assert_eq!(Qualifier::root().temp_root(), Qualifier::root());
    }

    #[test]
    fn parent_drops_innermost_segment() {
        let mut table = QualifierTable::new();
        let module = table.extend(QualifierId::ROOT, ScopeKind::Module);
        let block = table.extend(module, ScopeKind::Block);
        assert_eq!(table.parent(block), Some(module));
        assert_eq!(table.parent(QualifierId::ROOT), None);
    }
}
