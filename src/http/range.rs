//! HTTP Range request parsing module
//!
//! Single `bytes=start-end` ranges, parsed the lenient way media players expect:
//! unparsable numbers fall back to "whole file" instead of failing the request.

/// `Range` header value without the `bytes=` unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFormatError;

impl std::fmt::Display for RangeFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Range header invalid")
    }
}

impl std::error::Error for RangeFormatError {}

/// Validated byte span of a resource
///
/// `end` is inclusive. Values are signed so degenerate requests (start past end,
/// empty resource) keep their literal framing in `Content-Range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: i64,
    pub end: i64,
    pub total: i64,
}

impl RangeSpec {
    /// Number of bytes to send, never negative
    pub fn content_length(&self) -> u64 {
        u64::try_from(self.end - self.start + 1).unwrap_or(0)
    }

    /// Forward skip before the first byte
    pub fn skip(&self) -> u64 {
        u64::try_from(self.start).unwrap_or(0)
    }

    /// `Content-Range` header value
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Range header parse result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Serve this span with 206
    Satisfiable(RangeSpec),
    /// Start before 0 or end at/after the resource length - should return 416
    Unsatisfiable,
}

/// Parse an HTTP `Range` header value against a resource of `total_length` bytes
///
/// - `bytes=0-99` - bytes 0..=99
/// - `bytes=500-` - from 500 to the end (the empty end does not parse, start is kept)
/// - `bytes=abc-xyz`, `bytes=-500`, `bytes=42` - whole file
///
/// The end is checked against the length as written; only afterwards does an
/// absent end become `total_length - 1`.
///
/// # Examples
/// ```
/// use volserve::http::range::{parse_range_header, RangeOutcome};
///
/// let Ok(RangeOutcome::Satisfiable(range)) = parse_range_header("bytes=0-99", 1000) else {
///     panic!("expected a satisfiable range");
/// };
/// assert_eq!(range.content_length(), 100);
///
/// assert!(parse_range_header("items=0-1", 1000).is_err());
/// ```
pub fn parse_range_header(
    header: &str,
    total_length: u64,
) -> Result<RangeOutcome, RangeFormatError> {
    let spec = header.strip_prefix("bytes=").ok_or(RangeFormatError)?;
    let total = i64::try_from(total_length).unwrap_or(i64::MAX);

    let mut start: i64 = 0;
    let mut end: i64 = -1;

    if let Some(minus) = spec.find('-').filter(|&i| i > 0) {
        // Each bound is taken only if it parses; a bad end keeps a good start
        if let Ok(s) = spec[..minus].parse::<i64>() {
            start = s;
            if let Ok(e) = spec[minus + 1..].parse::<i64>() {
                end = e;
            }
        }
    }

    if start < 0 || end >= total {
        return Ok(RangeOutcome::Unsatisfiable);
    }

    if end < 0 {
        end = total - 1;
    }

    Ok(RangeOutcome::Satisfiable(RangeSpec { start, end, total }))
}
