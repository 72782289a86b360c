//! Primitive type sets for schema type inference
//!
//! A [`TypeSet`] is a small bit-set over the seven JSON-Schema primitive
//! types. Inference combines per-keyword-family sets with ordinary set
//! algebra (union, intersection, complement against the universal set).

use std::fmt;

use serde::{Deserialize, Serialize};

/// The single primitive type assigned to a schema node by inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Basetype {
    /// UTF-8 string
    String,
    /// Floating-point number
    Number,
    /// Integral number
    Integer,
    /// Boolean
    Boolean,
    /// Object with named properties
    Object,
    /// Array
    Array,
    /// Null only
    Null,
}

impl Basetype {
    /// Returns the JSON-Schema type name
    pub fn as_str(&self) -> &'static str {
        match self {
            Basetype::String => "string",
            Basetype::Number => "number",
            Basetype::Integer => "integer",
            Basetype::Boolean => "boolean",
            Basetype::Object => "object",
            Basetype::Array => "array",
            Basetype::Null => "null",
        }
    }

    /// Parse a JSON-Schema type name
    pub fn parse(name: &str) -> Option<Basetype> {
        match name {
            "string" => Some(Basetype::String),
            "number" => Some(Basetype::Number),
            "integer" => Some(Basetype::Integer),
            "boolean" => Some(Basetype::Boolean),
            "object" => Some(Basetype::Object),
            "array" => Some(Basetype::Array),
            "null" => Some(Basetype::Null),
            _ => None,
        }
    }

    fn bit(&self) -> u8 {
        match self {
            Basetype::String => 0x01,
            Basetype::Number => 0x02,
            Basetype::Integer => 0x04,
            Basetype::Boolean => 0x08,
            Basetype::Object => 0x10,
            Basetype::Array => 0x20,
            Basetype::Null => 0x40,
        }
    }

    const ALL: [Basetype; 7] = [
        Basetype::String,
        Basetype::Number,
        Basetype::Integer,
        Basetype::Boolean,
        Basetype::Object,
        Basetype::Array,
        Basetype::Null,
    ];
}

impl fmt::Display for Basetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A set of primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSet(u8);

impl TypeSet {
    /// The empty set
    pub const EMPTY: TypeSet = TypeSet(0);
    /// The universal set (all seven primitive types)
    pub const UNIVERSAL: TypeSet = TypeSet(0x7F);

    /// A singleton set
    pub fn of(t: Basetype) -> TypeSet {
        TypeSet(t.bit())
    }

    /// Membership test
    pub fn contains(&self, t: Basetype) -> bool {
        self.0 & t.bit() != 0
    }

    /// Insert a member, returning the new set
    pub fn with(self, t: Basetype) -> TypeSet {
        TypeSet(self.0 | t.bit())
    }

    /// Remove a member, returning the new set
    pub fn without(self, t: Basetype) -> TypeSet {
        TypeSet(self.0 & !t.bit())
    }

    /// Set union
    pub fn union(self, other: TypeSet) -> TypeSet {
        TypeSet(self.0 | other.0)
    }

    /// Set intersection
    pub fn intersect(self, other: TypeSet) -> TypeSet {
        TypeSet(self.0 & other.0)
    }

    /// Complement against the universal set
    pub fn complement(self) -> TypeSet {
        TypeSet(!self.0 & Self::UNIVERSAL.0)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Emptiness test
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in declaration order
    pub fn members(&self) -> Vec<Basetype> {
        Basetype::ALL
            .iter()
            .copied()
            .filter(|t| self.contains(*t))
            .collect()
    }

    /// Narrow `number` to `integer`: used when any contribution asserted
    /// integer, so integer wins ties with number in the final
    /// intersection.
    pub fn narrow_number_to_integer(self) -> TypeSet {
        if self.contains(Basetype::Number) {
            self.without(Basetype::Number).with(Basetype::Integer)
        } else {
            self
        }
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.members().iter().map(|t| t.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}
