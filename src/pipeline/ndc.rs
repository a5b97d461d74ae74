//! NDC candidate enumeration for scanned barcodes.
//!
//! A scanned code rarely carries the NDC in a single canonical form: retail
//! UPC-A wraps a 10-digit NDC in a number-system digit and a checksum, label
//! printers pad or drop leading zeros, and registries accept several
//! labeler-product segmentations (4-4, 5-3, 5-4). Rather than guess the one
//! true form, this module enumerates every plausible candidate in priority
//! order and lets sequential resolution sort it out. Over-generation is
//! deliberate; no emitted variant is treated as canonical.

/// Ordered, deduplicated candidate list builder. Insertion order is priority
/// order: earlier candidates are tried first by the resolver.
struct CandidateList {
    inner: Vec<String>,
}

impl CandidateList {
    fn new() -> Self {
        Self { inner: Vec::new() }
    }

    fn push(&mut self, candidate: Option<String>) {
        if let Some(c) = candidate {
            if !self.inner.contains(&c) {
                self.inner.push(c);
            }
        }
    }
}

/// Labeler-product split: first 4 digits, next 4.
fn seg_4_4(d: &str) -> Option<String> {
    (d.len() >= 8).then(|| format!("{}-{}", &d[..4], &d[4..8]))
}

/// Labeler-product split: first 5 digits, next 3.
fn seg_5_3(d: &str) -> Option<String> {
    (d.len() >= 8).then(|| format!("{}-{}", &d[..5], &d[5..8]))
}

/// Labeler-product split: first 5 digits, next 4.
fn seg_5_4(d: &str) -> Option<String> {
    (d.len() >= 9).then(|| format!("{}-{}", &d[..5], &d[5..9]))
}

/// Labeler-product split: first 3 digits, next 4. Only used for the vendor
/// quirk variant of 12-digit retail codes.
fn seg_3_4(d: &str) -> Option<String> {
    (d.len() >= 7).then(|| format!("{}-{}", &d[..3], &d[3..7]))
}

/// Enumerate candidate NDC representations for a raw scanned code, most
/// likely first. Pure string transformation; no I/O.
///
/// Returns an empty list only when the input contains no digits at all
/// ("nothing scannable"); any input with four or more digits yields at least
/// one candidate, even if that candidate is just the bare digit string.
pub fn normalize(raw: &str) -> Vec<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Vec::new();
    }

    let mut candidates = CandidateList::new();

    // A hyphenated input is the scanner's own claim about segmentation; keep
    // its labeler-product prefix ahead of everything derived.
    if raw.contains('-') {
        let mut parts = raw.split('-');
        if let (Some(first), Some(second)) = (parts.next(), parts.next()) {
            if !first.is_empty() && !second.is_empty() {
                candidates.push(Some(format!("{first}-{second}")));
            }
        }
    }

    match digits.len() {
        12 => {
            // UPC-A: leading number-system digit, trailing checksum.
            let eleven = &digits[1..];
            let ten = &digits[1..11];
            candidates.push(seg_4_4(eleven));
            candidates.push(seg_5_3(eleven));
            candidates.push(seg_5_4(eleven));
            candidates.push(seg_4_4(ten));
            candidates.push(seg_5_3(ten));
            candidates.push(seg_5_4(ten));
            // Vendor quirk: some labelers re-encode a zero-padded 10-digit
            // NDC; keep a padded 4-4 and a bare 3-4 split of it.
            let padded = format!("0{ten}");
            candidates.push(seg_4_4(&padded));
            candidates.push(seg_3_4(ten));
        }
        11 => {
            candidates.push(seg_4_4(&digits));
            candidates.push(seg_5_3(&digits));
            candidates.push(seg_5_4(&digits));
            // Same value read as 10-digit NDC + check digit.
            let ten = &digits[..10];
            candidates.push(seg_4_4(ten));
            candidates.push(seg_5_3(ten));
            candidates.push(seg_5_4(ten));
        }
        10 => {
            let padded = format!("0{digits}");
            candidates.push(seg_4_4(&padded));
            candidates.push(seg_5_3(&padded));
            candidates.push(seg_5_4(&padded));
            candidates.push(seg_4_4(&digits));
            candidates.push(seg_5_3(&digits));
            candidates.push(seg_5_4(&digits));
        }
        9 => candidates.push(seg_5_4(&digits)),
        8 => candidates.push(seg_4_4(&digits)),
        _ => {}
    }

    // Retailers sometimes strip the NDC's leading zeros before re-encoding;
    // try the stripped value as a late fallback.
    let stripped = digits.trim_start_matches('0');
    if stripped.len() >= 8 {
        candidates.push(seg_4_4(stripped));
        candidates.push(seg_5_3(stripped));
    }

    // Unresolvable lengths still get one candidate so the caller receives a
    // clean "not found" from resolution instead of a silent skip.
    if candidates.inner.is_empty() && digits.len() >= 4 {
        candidates.push(Some(digits));
    }

    candidates.inner
}
