use std::fmt;

/// Type tag of a [`crate::Value`].
///
/// The discriminants are stable wire codes: they are written into the
/// type side-channel that travels alongside encoded maps and arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ValueType {
    #[default]
    Undefined = 0,
    Boolean = 1,
    Integer = 2,
    Real = 3,
    String = 4,
    Uuid = 5,
    Date = 6,
    Uri = 7,
    Binary = 8,
    Map = 9,
    Array = 10,
}

impl ValueType {
    pub const ALL: [Self; 11] = [
        Self::Undefined,
        Self::Boolean,
        Self::Integer,
        Self::Real,
        Self::String,
        Self::Uuid,
        Self::Date,
        Self::Uri,
        Self::Binary,
        Self::Map,
        Self::Array,
    ];

    /// Wire code of this tag.
    pub const fn code(self) -> i64 {
        self as i64
    }

    /// Resolve a wire code. Unknown codes yield `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::String => "string",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::Uri => "uri",
            Self::Binary => "binary",
            Self::Map => "map",
            Self::Array => "array",
        }
    }

    /// Tags whose encoded form is a plain string that must be parsed back.
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::Uuid | Self::Date | Self::Uri)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A URI kept in its textual form.
///
/// No validation is applied: any string is an acceptable URI, matching how
/// chat records and scripts pass links around.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uri(String);

impl Uri {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Uri {
    fn from(s: String) -> Self {
        Self(s)
    }
}
