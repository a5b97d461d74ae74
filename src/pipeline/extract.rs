//! Free-text medication field extraction.
//!
//! Parses recognition engine text into one or more `DraftFields`. Each field
//! has its own ordered rule; rules run independently per field so one field's
//! match never blocks another. Matched byte spans are claimed, and whatever
//! text no rule claimed becomes the instructions remainder.
//!
//! Multi-record detection: a "medication anchor" is a capitalized token
//! directly followed by a number+dosage-unit token. One anchor (or none)
//! means the whole text is a single record; several anchors split the text
//! into per-anchor blocks, each extracted on its own. Ambiguous splits are
//! all emitted; scoring downgrades weak ones rather than this module
//! guessing.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::medication::DraftFields;

/// Byte range of a block claimed by a field match.
type Span = (usize, usize);

static DOSAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:mg|mcg|ml|iu|g|%)").unwrap());

static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*(?:tablets?|capsules?|tabs?|caps?|pills?)\b").unwrap()
});

/// Route vocabulary, abbreviations included, normalized to a display form.
/// Rule order is priority order.
static ROUTE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\bby mouth\b|\boral(?:ly)?\b|\bpo\b", "Oral"),
        (r"(?i)\bsublingual(?:ly)?\b|\bsl\b", "Sublingual"),
        (r"(?i)\btopical(?:ly)?\b", "Topical"),
        (r"(?i)\btransdermal\b", "Transdermal"),
        (r"(?i)\binhalation\b|\binhaled\b", "Inhalation"),
        (r"(?i)\bintravenous(?:ly)?\b|\biv\b", "IV"),
        (r"(?i)\binjection\b|\bintramuscular\b|\bim\b", "Injection"),
        (r"(?i)\brectal(?:ly)?\b|\bpr\b", "Rectal"),
    ]
    .into_iter()
    .map(|(pattern, normalized)| (Regex::new(pattern).unwrap(), normalized))
    .collect()
});

/// Clinical frequency shorthand normalized to human-readable phrases.
/// Longer phrases come before their substrings ("once daily" before "daily").
static FREQUENCY_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\bthree times daily\b|\btid\b", "Three times daily"),
        (r"(?i)\bfour times daily\b|\bqid\b", "Four times daily"),
        (r"(?i)\btwice daily\b|\bbid\b", "Twice daily"),
        (r"(?i)\bonce daily\b|\bqd\b", "Once daily"),
        (r"(?i)\bas needed\b|\bprn\b", "As needed"),
        (r"(?i)\bq4h\b|\bevery 4 hours\b", "Every 4 hours"),
        (r"(?i)\bq6h\b|\bevery 6 hours\b", "Every 6 hours"),
        (r"(?i)\bq8h\b|\bevery 8 hours\b", "Every 8 hours"),
        (r"(?i)\bq12h\b|\bevery 12 hours\b", "Every 12 hours"),
        (r"(?i)\bdaily\b", "Once daily"),
        (r"(?i)\bweekly\b", "Weekly"),
        (r"(?i)\bmonthly\b", "Monthly"),
    ]
    .into_iter()
    .map(|(pattern, normalized)| (Regex::new(pattern).unwrap(), normalized))
    .collect()
});

/// Prescriber label rules: keyword before (Dr., Prescriber:) or after (MD)
/// the name. The captured group is the name itself.
static PRESCRIBER_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\bDr\.?\s+([A-Z][A-Za-z'-]+(?:\s+[A-Z][A-Za-z'-]+)?)").unwrap(),
        Regex::new(r"(?i)\bprescriber:?\s*([A-Z][A-Za-z'-]+(?:\s+[A-Z][A-Za-z'-]+)?)").unwrap(),
        Regex::new(r"\b([A-Z][A-Za-z'-]+(?:\s+[A-Z][A-Za-z'-]+)?),?\s+M\.?D\.?(?:\b|$)").unwrap(),
    ]
});

/// Tokens that precede a medication name on labels but are not part of it.
const NAME_STOPWORDS: &[&str] = &["rx", "take", "give", "qty", "tablet", "capsule", "med"];

/// Parse recognized text into per-medication field sets.
///
/// Empty or whitespace-only text yields an empty vec ("nothing detected").
/// Fields with no match stay `None` so callers can distinguish "not found"
/// from "found empty".
pub fn extract(raw_text: &str) -> Vec<DraftFields> {
    if raw_text.trim().is_empty() {
        return Vec::new();
    }

    let anchors = find_anchors(raw_text);
    let blocks: Vec<&str> = if anchors.len() <= 1 {
        vec![raw_text]
    } else {
        split_at_anchors(raw_text, &anchors)
    };

    let extracted: Vec<DraftFields> = blocks
        .into_iter()
        .map(extract_block)
        .filter(|fields| !fields.is_empty())
        .collect();
    tracing::debug!(records = extracted.len(), "field extraction complete");
    extracted
}

/// Dosage-token matches with a manual trailing-boundary check (the unit set
/// includes `%`, which regex word boundaries cannot delimit).
fn dosage_matches(block: &str) -> Vec<Span> {
    DOSAGE_RE
        .find_iter(block)
        .filter(|m| {
            block[m.end()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric())
        })
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Byte offsets where a medication-name-like anchor starts: a capitalized
/// token whose next token is a dosage amount.
fn find_anchors(text: &str) -> Vec<usize> {
    let mut anchors = Vec::new();
    for (dosage_start, _) in dosage_matches(text) {
        if let Some((token_start, token)) = preceding_token(text, dosage_start) {
            let capitalized = token.chars().next().is_some_and(|c| c.is_uppercase())
                && token.chars().all(|c| c.is_alphabetic() || c == '-');
            if capitalized && !NAME_STOPWORDS.contains(&token.to_lowercase().as_str()) {
                anchors.push(token_start);
            }
        }
    }
    anchors
}

/// The whitespace-delimited token directly before `pos`, restricted to the
/// same line.
fn preceding_token(text: &str, pos: usize) -> Option<(usize, &str)> {
    let prefix = &text[..pos];
    let line_start = prefix.rfind('\n').map_or(0, |i| i + 1);
    let line = &prefix[line_start..];
    let token = line.split_whitespace().next_back()?;
    let token_start = line_start + line.rfind(token)?;
    Some((token_start, token))
}

/// Split text into per-anchor blocks. Leading text joins the first block so
/// nothing is dropped.
fn split_at_anchors<'a>(text: &'a str, anchors: &[usize]) -> Vec<&'a str> {
    let mut blocks = Vec::with_capacity(anchors.len());
    for i in 0..anchors.len() {
        let start = if i == 0 { 0 } else { anchors[i] };
        let end = anchors.get(i + 1).copied().unwrap_or(text.len());
        blocks.push(&text[start..end]);
    }
    blocks
}

/// Run every field rule over one block. Rules are independent; claimed spans
/// only feed the instructions remainder.
fn extract_block(block: &str) -> DraftFields {
    let mut claimed: Vec<Span> = Vec::new();
    let mut fields = DraftFields::default();

    let dosages = dosage_matches(block);

    if let Some((name, span)) = extract_name(block, &dosages) {
        fields.name = Some(name);
        claimed.push(span);
    }

    if let Some(&(start, end)) = dosages.first() {
        fields.dosage = Some(block[start..end].to_string());
        claimed.push((start, end));
    }

    for (pattern, normalized) in ROUTE_RULES.iter() {
        if let Some(m) = pattern.find(block) {
            fields.route = Some((*normalized).to_string());
            claimed.push((m.start(), m.end()));
            break;
        }
    }

    for (pattern, normalized) in FREQUENCY_RULES.iter() {
        if let Some(m) = pattern.find(block) {
            fields.frequency = Some((*normalized).to_string());
            claimed.push((m.start(), m.end()));
            break;
        }
    }

    if let Some(captures) = QUANTITY_RE.captures(block) {
        if let (Some(whole), Some(number)) = (captures.get(0), captures.get(1)) {
            fields.quantity = Some(number.as_str().to_string());
            claimed.push((whole.start(), whole.end()));
        }
    }

    for pattern in PRESCRIBER_RULES.iter() {
        if let Some(captures) = pattern.captures(block) {
            if let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) {
                fields.prescriber = Some(name.as_str().trim().to_string());
                claimed.push((whole.start(), whole.end()));
            }
            break;
        }
    }

    let remainder = unclaimed_remainder(block, &mut claimed);
    if !remainder.is_empty() {
        fields.instructions = Some(remainder);
    }

    fields
}

/// Token run directly before the first dosage token, same line, stopping at
/// stopwords and non-alphabetic tokens. Longest run wins, capped at three
/// tokens (label names are short; anything longer is instructions).
fn extract_name(block: &str, dosages: &[Span]) -> Option<(String, Span)> {
    let &(dosage_start, _) = dosages.first()?;
    let prefix = &block[..dosage_start];
    let line_start = prefix.rfind('\n').map_or(0, |i| i + 1);
    let line = &prefix[line_start..];

    let mut tokens: Vec<(usize, &str)> = Vec::new();
    let mut offset = 0;
    for token in line.split_whitespace() {
        let start = line_start + line[offset..].find(token).map(|i| i + offset)?;
        offset = start + token.len() - line_start;
        tokens.push((start, token));
    }

    let mut run: Vec<(usize, &str)> = Vec::new();
    for &(start, token) in tokens.iter().rev() {
        let alphabetic = token.chars().all(|c| c.is_alphabetic() || c == '-');
        if !alphabetic || NAME_STOPWORDS.contains(&token.to_lowercase().as_str()) {
            break;
        }
        run.push((start, token));
        if run.len() == 3 {
            break;
        }
    }
    run.reverse();

    let (first_start, _) = *run.first()?;
    let (last_start, last_token) = *run.last()?;
    let name = run
        .iter()
        .map(|(_, t)| *t)
        .collect::<Vec<_>>()
        .join(" ");
    Some((name, (first_start, last_start + last_token.len())))
}

/// Everything no field claimed, whitespace-collapsed. This is the
/// instructions rule: free remainder text, trimmed.
fn unclaimed_remainder(block: &str, claimed: &mut Vec<Span>) -> String {
    claimed.sort_unstable();

    let mut remainder = String::new();
    let mut cursor = 0;
    for &(start, end) in claimed.iter() {
        if start > cursor {
            remainder.push_str(&block[cursor..start]);
            remainder.push(' ');
        }
        cursor = cursor.max(end);
    }
    if cursor < block.len() {
        remainder.push_str(&block[cursor..]);
    }

    remainder
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string()
}
