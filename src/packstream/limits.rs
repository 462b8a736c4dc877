//! Caller-configured size limits for dynamic reads.

/// Nesting depth allowed by default for lists, maps and structs.
///
/// Also bounds `skip` and `skip_value`, which take no limits.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Upper bounds applied while decoding untrusted [`Value`](crate::types::Value)s.
///
/// `None` leaves a kind unbounded apart from the implicit cap of
/// `i32::MAX` elements every length-prefixed read enforces. Nesting is
/// always bounded by `max_depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    pub max_string_length: Option<u64>,
    pub max_bytes_length: Option<u64>,
    pub max_list_length: Option<u64>,
    pub max_map_entries: Option<u64>,
    /// Containers (lists, maps and structs) that may enclose one another.
    pub max_depth: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl ReadLimits {
    /// No size limits, and the default nesting depth.
    pub const fn unbounded() -> Self {
        Self {
            max_string_length: None,
            max_bytes_length: None,
            max_list_length: None,
            max_map_entries: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Maximum encoded string length, in bytes.
    pub fn max_string_length(mut self, limit: u64) -> Self {
        self.max_string_length = Some(limit);
        self
    }

    pub fn max_bytes_length(mut self, limit: u64) -> Self {
        self.max_bytes_length = Some(limit);
        self
    }

    pub fn max_list_length(mut self, limit: u64) -> Self {
        self.max_list_length = Some(limit);
        self
    }

    pub fn max_map_entries(mut self, limit: u64) -> Self {
        self.max_map_entries = Some(limit);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
