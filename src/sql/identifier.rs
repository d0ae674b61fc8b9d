//! Interned SQL identifiers.
//!
//! An [`Identifier`] is a small integer standing for a case-folded name.
//! Reserved keywords are negative, everything else is positive. Values never
//! change once they have been handed out, and every identifier maps back to
//! the text it was interned from.

use crate::error::TableLockError;
use crate::sql::keywords::{FIRST_USER_IDENTIFIER, KNOWN, RESERVED};
use crate::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Longest identifier text kept, in bytes. Longer input is truncated before
/// it is interned.
pub const MAX_IDENTIFIER: usize = 128;

const TAG_USER: u8 = 0;
const TAG_RESERVED: u8 = 1;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Identifier(i32);

impl Identifier {
    pub(crate) const fn from_raw(value: i32) -> Identifier {
        Identifier(value)
    }

    #[inline]
    pub(crate) fn raw(self) -> i32 {
        self.0
    }

    /// Interns `text` in the process-wide registry.
    ///
    /// Unquoted text is folded to lowercase and may resolve to a reserved
    /// keyword. Quoted text keeps its case and never does.
    pub fn new(text: &str, quoted: bool) -> Identifier {
        registry().intern(text, quoted)
    }

    #[inline]
    pub fn is_reserved(self) -> bool {
        self.0 < 0
    }

    /// Encodes as a tag byte followed by the UTF-8 display text.
    pub fn encode(self) -> Vec<u8> {
        registry().encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Identifier> {
        registry().decode(bytes)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match registry().name(*self) {
            Some(name) => f.write_str(&name),
            None => write!(f, "identifier#{}", self.0),
        }
    }
}

/// Maps text to identifiers and back.
///
/// Interning is safe from many threads at once: concurrent calls with the
/// same text agree on one identifier.
pub struct IdentifierRegistry {
    keywords: HashMap<String, Identifier>,
    ids: DashMap<String, Identifier>,
    names: DashMap<Identifier, Arc<str>>,
    next_id: AtomicI32,
}

impl Default for IdentifierRegistry {
    fn default() -> Self {
        IdentifierRegistry::new()
    }
}

impl IdentifierRegistry {
    /// Creates a registry seeded with the keyword table.
    pub fn new() -> IdentifierRegistry {
        let mut keywords = HashMap::with_capacity(RESERVED.len());
        let ids = DashMap::with_capacity(KNOWN.len());
        let names = DashMap::with_capacity(RESERVED.len() + KNOWN.len());

        for (name, id) in RESERVED {
            keywords.insert(name.to_lowercase(), *id);
            names.insert(*id, Arc::from(*name));
        }
        for (name, id) in KNOWN {
            let name = name.to_lowercase();
            names.insert(*id, Arc::from(name.as_str()));
            ids.insert(name, *id);
        }

        IdentifierRegistry {
            keywords,
            ids,
            names,
            next_id: AtomicI32::new(FIRST_USER_IDENTIFIER),
        }
    }

    pub fn intern(&self, text: &str, quoted: bool) -> Identifier {
        let text: Cow<str> = if quoted {
            Cow::Borrowed(truncate(text))
        } else {
            // fold before truncating: folding can change the byte length
            let mut folded = text.to_lowercase();
            let len = truncate(&folded).len();
            folded.truncate(len);
            if let Some(id) = self.keywords.get(&folded) {
                return *id;
            }
            Cow::Owned(folded)
        };

        if let Some(id) = self.ids.get(text.as_ref()) {
            return *id;
        }

        match self.ids.entry(text.into_owned()) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let id = Identifier(self.next_id.fetch_add(1, Ordering::Relaxed));
                // the reverse mapping must exist before the id is reachable
                self.names.insert(id, Arc::from(e.key().as_str()));
                e.insert(id);
                id
            }
        }
    }

    /// Display text of `id`: upper case for reserved keywords, the interned
    /// text otherwise.
    pub fn name(&self, id: Identifier) -> Option<Arc<str>> {
        self.names.get(&id).map(|name| name.value().clone())
    }

    pub fn encode(&self, id: Identifier) -> Vec<u8> {
        let name = self.name(id).unwrap_or_else(|| Arc::from(""));
        let mut buf = Vec::with_capacity(1 + name.len());
        buf.push(if id.is_reserved() {
            TAG_RESERVED
        } else {
            TAG_USER
        });
        buf.extend_from_slice(name.as_bytes());
        buf
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Identifier> {
        let (tag, text) = match bytes.split_first() {
            Some((tag, text)) => (*tag, text),
            None => {
                return Err(TableLockError::IdentifierDecode(
                    "identifier: empty input".to_owned(),
                ))
            }
        };
        let text = std::str::from_utf8(text).map_err(|e| {
            TableLockError::IdentifierDecode(format!("identifier: invalid utf-8: {}", e))
        })?;
        match tag {
            TAG_USER => Ok(self.intern(text, true)),
            TAG_RESERVED => Ok(self.intern(text, false)),
            t => Err(TableLockError::IdentifierDecode(format!(
                "identifier: unexpected tag {}",
                t
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Cuts `text` to at most [`MAX_IDENTIFIER`] bytes on a char boundary.
fn truncate(text: &str) -> &str {
    if text.len() <= MAX_IDENTIFIER {
        return text;
    }
    let mut end = MAX_IDENTIFIER;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

static REGISTRY: Lazy<IdentifierRegistry> = Lazy::new(IdentifierRegistry::new);

/// Initializes the process-wide registry. Calling it more than once is
/// harmless; the registry is never torn down.
pub fn init() {
    Lazy::force(&REGISTRY);
}

#[inline]
pub fn registry() -> &'static IdentifierRegistry {
    &REGISTRY
}
