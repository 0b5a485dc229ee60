use once_cell::sync::Lazy;
use regex::Regex;

/// Sortable key parsed from a snapshot filename suffix.
///
/// Variant order is the cross-convention ordering: dotted/`v` versions,
/// then incremental sequence numbers, then dates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderKey {
    Version(Vec<u32>),
    Sequence(u64),
    Date {
        year: u16,
        month: u8,
        day: u8,
        /// 0 = no letter, 1 = 'a', 2 = 'b', ...
        letter: u8,
        /// Trailing `_N` sub-suffix, 0 if absent.
        sub: u32,
    },
}

static DATE_COMPACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})(0[1-9]|1[0-2])(0[1-9]|[12]\d|3[01])([a-z]?)(?:_(\d+))?$").unwrap()
});
static DATE_SHORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})(0[1-9]|1[0-2])(0[1-9]|[12]\d|3[01])$").unwrap());
static DATE_SEPARATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[-_](\d{1,2})[-_](\d{2,4})$").unwrap());
static SEQUENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3,}$").unwrap());
static VERSION_DOTTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)+$").unwrap());
static VERSION_PREFIXED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[vV](\d+)$").unwrap());

/// Parse a filename suffix into an [`OrderKey`]. Returns `None` for
/// suffixes matching no known convention.
pub fn parse_suffix(suffix: &str) -> Option<OrderKey> {
    // YYYYMMDD with optional letter and optional _N sub-suffix,
    // e.g. "20250923", "20250923b", "20250909_1".
    if let Some(captures) = DATE_COMPACT.captures(suffix) {
        let letter = captures
            .get(4)
            .and_then(|m| m.as_str().bytes().next())
            .map_or(0, |b| b - b'a' + 1);
        let sub = captures
            .get(5)
            .map_or(Some(0), |m| m.as_str().parse().ok())?;
        return Some(OrderKey::Date {
            year: captures[1].parse().ok()?,
            month: captures[2].parse().ok()?,
            day: captures[3].parse().ok()?,
            letter,
            sub,
        });
    }

    // YYMMDD compact dates, e.g. "250507".
    if let Some(captures) = DATE_SHORT.captures(suffix) {
        return Some(OrderKey::Date {
            year: 2000 + captures[1].parse::<u16>().ok()?,
            month: captures[2].parse().ok()?,
            day: captures[3].parse().ok()?,
            letter: 0,
            sub: 0,
        });
    }

    // Separator dates: YY-MM-DD, MM-DD-YY, M-D-YY, underscore variants.
    if let Some(captures) = DATE_SEPARATED.captures(suffix) {
        let a: u16 = captures[1].parse().ok()?;
        let b: u16 = captures[2].parse().ok()?;
        let c: u16 = captures[3].parse().ok()?;
        return separated_date(a, b, c);
    }

    // Pure incremental numbers, 3+ digits so dates don't shadow them,
    // e.g. "0001", "0235".
    if SEQUENCE.is_match(suffix) {
        return Some(OrderKey::Sequence(suffix.parse().ok()?));
    }

    // Dotted versions, e.g. "0.1", "2.3.1".
    if VERSION_DOTTED.is_match(suffix) {
        let parts: Option<Vec<u32>> = suffix.split('.').map(|p| p.parse().ok()).collect();
        return Some(OrderKey::Version(parts?));
    }

    // v-prefixed versions, e.g. "v1", "v10".
    if let Some(captures) = VERSION_PREFIXED.captures(suffix) {
        return Some(OrderKey::Version(vec![captures[1].parse().ok()?]));
    }

    None
}

/// Disambiguate `a-b-c` separator dates.
///
/// The conventions seen in real archives: "22-08-01" is YY-MM-DD,
/// "02-27-21" is MM-DD-YY, "8-14-21" is M-DD-YY. A first segment above
/// 12 cannot be a month; a second segment above 12 cannot be a month's
/// day-position twin; a third segment above 23 is out of range as a
/// two-digit year. Anything still ambiguous defaults to MM-DD-YY.
fn separated_date(a: u16, b: u16, c: u16) -> Option<OrderKey> {
    let (year, month, day) = if c >= 100 {
        // MM-DD-YYYY
        (c, a, b)
    } else if a > 12 {
        // YY-MM-DD
        (2000 + a, b, c)
    } else if b > 12 {
        // MM-DD-YY: b can only be a day
        (2000 + c, a, b)
    } else if c > 23 {
        // YY-MM-DD: c is too large for a year in range, so it is a day
        (2000 + a, b, c)
    } else {
        // MM-DD-YY (US convention)
        (2000 + c, a, b)
    };

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) || !(2000..=2099).contains(&year) {
        return None;
    }
    Some(OrderKey::Date {
        year,
        month: month as u8,
        day: day as u8,
        letter: 0,
        sub: 0,
    })
}
