//! JSON Pointer navigation over rooted trees
//!
//! Resolution semantics:
//! - Absolute pointers are `/`-delimited RFC 6901 paths; each segment is
//!   unescaped (`~1` → `/`, `~0` → `~`) before descending by property name
//!   or array index.
//! - The empty pointer resolves to the node itself.
//! - A missing segment yields `None` ("not found"), which is distinct from
//!   a present `null`. Resolution never panics; indexing through a scalar
//!   yields `None`.
//! - Relative pointers carry a leading decimal integer N. Evaluated at a
//!   node whose own pointer is P, `N/rest` strips the last N+1 segments of
//!   P and appends `rest`; a bare `N` re-appends P's final segment, so `0`
//!   alone denotes the current value. Running out of ancestors yields
//!   `None`.

use serde_json::Value;

/// The final key of a split pointer.
///
/// A non-negative-integer literal is coerced to an index; every other
/// segment stays a property name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Object property name (unescaped)
    Name(String),
    /// Array index
    Index(usize),
}

impl Key {
    /// Coerce a raw (unescaped) segment into a key.
    pub fn from_segment(segment: &str) -> Self {
        if is_index(segment) {
            // is_index guarantees the parse succeeds
            Key::Index(segment.parse().unwrap_or(0))
        } else {
            Key::Name(segment.to_string())
        }
    }

    /// Returns the key as a pointer segment string.
    pub fn as_segment(&self) -> String {
        match self {
            Key::Name(name) => name.clone(),
            Key::Index(i) => i.to_string(),
        }
    }
}

/// Returns true for a segment that is a non-negative-integer literal.
fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Unescape one pointer segment (`~1` → `/`, `~0` → `~`).
pub fn unescape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                Some(other) => {
                    // Invalid escape: keep the literal characters
                    out.push('~');
                    out.push(other);
                }
                None => out.push('~'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Escape one pointer segment (`~` → `~0`, `/` → `~1`).
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Returns true for an absolute pointer (empty, or `/`-prefixed).
pub fn is_absolute(pointer: &str) -> bool {
    pointer.is_empty() || pointer.starts_with('/')
}

/// Returns true for a relative pointer (leading decimal integer).
pub fn is_relative(pointer: &str) -> bool {
    pointer.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

/// Split an absolute pointer into raw (still escaped) segments.
///
/// Returns `None` for a malformed pointer (non-empty without a leading
/// slash). The empty pointer yields an empty segment list.
pub fn segments(pointer: &str) -> Option<Vec<String>> {
    if pointer.is_empty() {
        return Some(Vec::new());
    }
    let rest = pointer.strip_prefix('/')?;
    Some(rest.split('/').map(str::to_string).collect())
}

/// Join raw segments back into an absolute pointer.
pub fn join(segments: &[String]) -> String {
    if segments.is_empty() {
        String::new()
    } else {
        let mut out = String::new();
        for seg in segments {
            out.push('/');
            out.push_str(seg);
        }
        out
    }
}

/// Split an absolute pointer into (parent pointer, final key).
///
/// The final key is numeric-coerced when it is a non-negative-integer
/// literal. The root pointer has no parent and yields `None`.
pub fn split(pointer: &str) -> Option<(String, Key)> {
    let mut segs = segments(pointer)?;
    let last = segs.pop()?;
    Some((join(&segs), Key::from_segment(&unescape_segment(&last))))
}

/// Resolve an absolute pointer against a data root.
///
/// `None` means "not found" — a missing property, an out-of-range index,
/// or a descent through a scalar. A present `null` resolves to
/// `Some(&Value::Null)`.
pub fn resolve<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    let segs = segments(pointer)?;
    let mut current = root;
    for raw in &segs {
        let seg = unescape_segment(raw);
        current = match current {
            Value::Object(map) => map.get(&seg)?,
            Value::Array(items) => {
                if !is_index(&seg) {
                    return None;
                }
                items.get(seg.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable variant of [`resolve`].
pub fn resolve_mut<'a>(root: &'a mut Value, pointer: &str) -> Option<&'a mut Value> {
    let segs = segments(pointer)?;
    let mut current = root;
    for raw in &segs {
        let seg = unescape_segment(raw);
        current = match current {
            Value::Object(map) => map.get_mut(&seg)?,
            Value::Array(items) => {
                if !is_index(&seg) {
                    return None;
                }
                items.get_mut(seg.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Rewrite a relative pointer into an absolute one, evaluated at the node
/// whose own absolute pointer is `base`.
///
/// `N/rest` strips the last N+1 segments of `base` then appends `rest`;
/// a bare `N` re-appends the stripped final segment (so `0` is the
/// current value, `0/x` a sibling, `1/x` an aunt). Returns `None` when
/// the prefix is malformed or the base runs out of ancestors.
pub fn relative_to_absolute(base: &str, relative: &str) -> Option<String> {
    let digits_end = relative
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(relative.len());
    if digits_end == 0 {
        return None;
    }
    let levels: usize = relative[..digits_end].parse().ok()?;
    let rest = &relative[digits_end..];
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }

    let mut base_segs = segments(base)?;
    // Need the node's own segment plus `levels` ancestors to strip
    if base_segs.len() < levels + 1 {
        return None;
    }
    let own = base_segs[base_segs.len() - 1].clone();
    base_segs.truncate(base_segs.len() - 1 - levels);

    if rest.is_empty() {
        base_segs.push(own);
    } else {
        base_segs.extend(rest[1..].split('/').map(str::to_string));
    }
    Some(join(&base_segs))
}
