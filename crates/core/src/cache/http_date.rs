//! HTTP date parsing and formatting.
//!
//! Three grammars are tried in order and the first one that consumes the
//! whole input wins:
//!
//! 1. RFC 1123: `Sun, 06 Nov 1994 08:49:37 GMT`
//! 2. RFC 850: `Sunday, 06-Nov-94 08:49:37 GMT`, also with a four-digit year
//! 3. asctime: `Sun Nov  6 08:49:37 1994`
//!
//! Weekday names may be abbreviated or full in every grammar. All dates are
//! interpreted as UTC.

use crate::Error;
use chrono::{DateTime, NaiveDateTime, Utc};

const RFC1123: &str = "%a, %d %b %Y %H:%M:%S GMT";
// Two-digit years first: `%Y` would read `15` as the year 15.
const RFC850_SHORT_YEAR: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const RFC850_FULL_YEAR: &str = "%A, %d-%b-%Y %H:%M:%S GMT";
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

const FORMATS: [&str; 4] = [RFC1123, RFC850_SHORT_YEAR, RFC850_FULL_YEAR, ASCTIME];

/// Parse an HTTP date header value.
///
/// Returns [`Error::Parse`] carrying the input when no grammar matches.
pub fn parse_http_date(date: &str) -> Result<DateTime<Utc>, Error> {
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(date, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::Parse(date.to_string()))
}

/// Format an instant as an RFC 1123 date.
pub fn format_http_date(instant: DateTime<Utc>) -> String {
    instant.format(RFC1123).to_string()
}
