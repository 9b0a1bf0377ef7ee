//! Domain types for heap dump analysis.
//!
//! A dump is a set of [`Record`]s, one per live object, each identified by
//! an [`Address`] and carrying the set of addresses it references.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// Record type of the pseudo-records naming GC roots.
pub const TYPE_ROOT: &str = "ROOT";

/// Record type of class objects.
pub const TYPE_CLASS: &str = "CLASS";

/// Record type of module objects.
pub const TYPE_MODULE: &str = "MODULE";

/// Record type of include/singleton indirection classes.
pub const TYPE_ICLASS: &str = "ICLASS";

/// Separator between a raw address and its generation counter.
pub const GENERATION_SEPARATOR: char = '#';

/// Identifier of a record within one dump.
///
/// Usually a hexadecimal memory location, or the name of a root
/// pseudo-record. Addresses reused across collections are qualified with
/// their generation (`0x7f01#12`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    /// Create a new address
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the address is empty (i.e. missing from its record).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Qualify this address with a generation counter.
    #[must_use]
    pub fn with_generation(&self, generation: u64) -> Self {
        Self(format!("{}{GENERATION_SEPARATOR}{generation}", self.0))
    }

    /// The address without its generation suffix.
    #[must_use]
    pub fn bare(&self) -> Self {
        Self(strip_generation(&self.0).to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for Address {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Strip a trailing `#<digits>` generation suffix.
///
/// Strings without such a suffix (including class names such as
/// `#<Class:Foo>`) are returned unchanged.
#[must_use]
pub fn strip_generation(s: &str) -> &str {
    match s.rsplit_once(GENERATION_SEPARATOR) {
        Some((base, suffix))
            if !base.is_empty()
                && !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => s,
    }
}

/// One object of a heap dump.
///
/// Known fields are typed; anything else the dumper emitted (`file`,
/// `line`, `memsize`, `flags`, ...) is preserved verbatim in
/// [`attributes`](Self::attributes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Address of the object. Defaulted from `root` for root pseudo-records.
    #[serde(default)]
    pub address: Address,

    /// Name of a root pseudo-record (`vm`, `machine_context`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Object type tag (`ROOT`, `CLASS`, `STRING`, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,

    /// Class of the object: an address as dumped, a name once resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    /// Original class address, kept when `class` holds a resolved name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_address: Option<Address>,

    /// Human name (classes and modules)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Sub-tag of DATA objects
    #[serde(rename = "struct", default, skip_serializing_if = "Option::is_none")]
    pub struct_type: Option<String>,

    /// GC generation, disambiguates reused addresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,

    /// Number of distinct addresses reachable from this record, when annotated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepalive_count: Option<usize>,

    /// Addresses this object references
    #[serde(default)]
    pub references: BTreeSet<Address>,

    /// Passthrough attributes, opaque to the analysis.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Record {
    /// Create a record with the given address and no references
    pub fn new(address: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Set the type tag
    #[must_use]
    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Set the class
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the generation
    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Replace the reference set
    #[must_use]
    pub fn with_references<I, A>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Address>,
    {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the record has the given type tag.
    #[must_use]
    pub fn is_type(&self, record_type: &str) -> bool {
        self.record_type.as_deref() == Some(record_type)
    }

    /// Key under which the record is counted in statistics.
    ///
    /// This is the class, falling back to the type and then the root name.
    #[must_use]
    pub fn stats_key(&self) -> Option<&str> {
        self.class
            .as_deref()
            .or(self.record_type.as_deref())
            .or(self.root.as_deref())
    }

    /// Keep only the references satisfying `keep`.
    pub fn retain_references(&mut self, mut keep: impl FnMut(&Address) -> bool) {
        self.references.retain(|r| keep(r));
    }
}
