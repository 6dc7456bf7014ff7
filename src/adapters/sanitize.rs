//! Log redaction for patient data and session credentials.
//!
//! Every formatted log line passes through [`SanitizingMakeWriter`] before it
//! reaches a sink. The rules cover what this application actually handles:
//! - contact details (emails, phone numbers)
//! - generated record identifiers
//! - the session credential and admin passkey
//! - insurance policy and identification numbers
//!
//! Typed redaction comes first (`PassKey` and `Attachment` never print their
//! contents); this module catches what slips into free-form messages.
//!
//! Input is capped at `CAREPULSE_SANITIZE_MAX_BYTES` (16 KiB by default).

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

static RULES: OnceLock<Rules> = OnceLock::new();

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Rules {
    set: RegexSet,
    rules: Vec<Rule>,
}

// Ordered: context-labelled values go first so their labels survive.
const RULE_SOURCES: &[(&str, &str)] = &[
    (
        r"(?i)\b(accessKey|pass_?key|passkey)(\s*[:=]\s*)[^\s,;]+",
        "${1}${2}[REDACTED-KEY]",
    ),
    (
        r"(?i)\b(insurance_?policy_?number|insurancePolicyNumber|policy)(\s*[:=]\s*)[^\s,;]+",
        "${1}${2}[REDACTED-POLICY]",
    ),
    (
        r"(?i)\b(identification_?number|identificationNumber)(\s*[:=]\s*)[^\s,;]+",
        "${1}${2}[REDACTED-ID]",
    ),
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[REDACTED-UUID]",
    ),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (r"\+\d{10,15}\b", "[REDACTED-PHONE]"),
    (
        r"\b\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b",
        "[REDACTED-PHONE]",
    ),
];

fn rules() -> &'static Rules {
    RULES.get_or_init(|| {
        let set = RegexSet::new(RULE_SOURCES.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = RULE_SOURCES
            .iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();
        Rules { set, rules }
    })
}

fn max_sanitize_bytes() -> usize {
    std::env::var("CAREPULSE_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

/// Longest prefix of `input` within `max_bytes` that ends on a char boundary.
fn clip(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact sensitive values in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let rules = rules();
    let (prefix, clipped) = clip(input, max_bytes);

    let mut out = prefix.to_string();
    for idx in rules.set.matches(prefix).into_iter() {
        let rule = &rules.rules[idx];
        out = rule.regex.replace_all(&out, rule.replacement).into_owned();
    }

    if clipped {
        out.push_str(" [TRUNCATED]");
        if input.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Whether `input` contains anything [`sanitize`] would redact.
#[must_use]
pub fn contains_pii(input: &str) -> bool {
    let (prefix, _) = clip(input, max_sanitize_bytes());
    rules().set.is_match(prefix)
}

/// `MakeWriter` that redacts each formatted line before the inner sink sees it.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
        }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    /// Sanitize and forward `bytes`; returns whether the output ended a line.
    fn emit(&mut self, bytes: &[u8]) -> std::io::Result<bool> {
        let text = String::from_utf8_lossy(bytes);
        let out = sanitize(&text);
        self.inner.write_all(out.as_bytes())?;
        Ok(out.ends_with('\n'))
    }

    fn drain_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);

        // A single line longer than twice the cap is flushed as-is (clipped).
        if self.pending.len() > max_sanitize_bytes().saturating_mul(2) {
            let line = std::mem::take(&mut self.pending);
            if !self.emit(&line)? {
                self.inner.write_all(b"\n")?;
            }
            return Ok(buf.len());
        }

        self.drain_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.drain_lines()?;
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
        }
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_redacts_record_ids() {
        let out = sanitize("Created patient 550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(out, "Created patient [REDACTED-UUID]");
    }

    #[test]
    fn test_redacts_contact_details() {
        let out = sanitize("ada@example.com called from +61412345678");
        assert!(out.contains("[REDACTED-EMAIL]"));
        assert!(out.contains("[REDACTED-PHONE]"));
        assert!(!out.contains("61412345678"));

        assert!(sanitize("call (555) 123-4567").contains("[REDACTED-PHONE]"));
    }

    #[test]
    fn test_redacts_credential_keeps_label() {
        let out = sanitize("restored accessKey=MTIzNA== from session");
        assert_eq!(out, "restored accessKey=[REDACTED-KEY] from session");
        assert!(sanitize("passkey: 123456").contains("[REDACTED-KEY]"));
    }

    #[test]
    fn test_redacts_policy_and_identification() {
        let out = sanitize("insurancePolicyNumber=ABC123456789, identificationNumber: X99");
        assert!(out.contains("[REDACTED-POLICY]"));
        assert!(out.contains("[REDACTED-ID]"));
        assert!(!out.contains("ABC123456789"));
    }

    #[test]
    fn test_contains_pii() {
        assert!(contains_pii("email ada@example.com"));
        assert!(!contains_pii("Appointment is now scheduled"));
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let out = sanitize_with_limit("héllo wörld", 2);
        assert_eq!(out, "h [TRUNCATED]");
    }

    #[test]
    fn test_truncation_keeps_line_ending() {
        assert_eq!(sanitize_with_limit("abcdef\n", 3), "abc [TRUNCATED]\n");
        assert_eq!(sanitize_with_limit("abcdef", 3), "abc [TRUNCATED]");
    }

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("sink lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_redacts_split_lines() {
        let sink = Sink::default();
        let make = SanitizingMakeWriter::new({
            let sink = sink.clone();
            move || sink.clone()
        });

        let mut writer = make.make_writer();
        writer.write_all(b"user ada@exa").expect("write");
        writer.write_all(b"mple.com signed up\n").expect("write");
        writer.flush().expect("flush");

        let written = String::from_utf8(sink.0.lock().expect("sink lock").clone()).expect("utf8");
        assert_eq!(written, "user [REDACTED-EMAIL] signed up\n");
    }

    fn written_lines(sink: &Sink) -> Vec<String> {
        let written = String::from_utf8(sink.0.lock().expect("sink lock").clone()).expect("utf8");
        written.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_writer_long_line_does_not_swallow_next() {
        let cap = max_sanitize_bytes();
        let sink = Sink::default();
        let make = SanitizingMakeWriter::new({
            let sink = sink.clone();
            move || sink.clone()
        });

        let mut writer = make.make_writer();
        let long = format!("{}\n", "a".repeat(cap + 10));
        writer.write_all(long.as_bytes()).expect("write");
        writer.write_all(b"next line\n").expect("write");
        writer.flush().expect("flush");

        let lines = written_lines(&sink);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" [TRUNCATED]"));
        assert_eq!(lines[1], "next line");
    }

    #[test]
    fn test_writer_oversize_buffer_ends_one_line() {
        let cap = max_sanitize_bytes();
        let sink = Sink::default();
        let make = SanitizingMakeWriter::new({
            let sink = sink.clone();
            move || sink.clone()
        });

        let mut writer = make.make_writer();
        let huge = format!("{}\n", "b".repeat(cap * 2 + 10));
        writer.write_all(huge.as_bytes()).expect("write");
        writer.write_all(b"after\n").expect("write");
        writer.flush().expect("flush");

        assert_eq!(written_lines(&sink).len(), 2);
        let written = String::from_utf8(sink.0.lock().expect("sink lock").clone()).expect("utf8");
        assert!(!written.contains("\n\n"));
    }
}
