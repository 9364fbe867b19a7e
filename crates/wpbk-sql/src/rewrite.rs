//! # Dump Rewriting
//!
//! Applies a rule set to a dump stream one line at a time. The first rule
//! that matches a line rewrites it; later rules never see the result. Lines
//! no rule matches are copied through byte for byte, line terminators
//! included, so a rewrite with no rules is an exact copy.

use std::borrow::Cow;
use std::io::{BufRead, Write};

use serde::Serialize;

use crate::catalog::TableCatalog;
use crate::codec::{Direction, IdentifierCodec, RewriteRule};
use crate::error::CodecError;

/// Line counts from one rewrite pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    /// Lines read.
    pub lines: u64,
    /// Lines changed by a rule.
    pub rewritten: u64,
}

/// Line-oriented rewriter over a fixed rule set.
#[derive(Debug, Clone, Default)]
pub struct DumpRewriter {
    rules: Vec<RewriteRule>,
}

impl DumpRewriter {
    /// Rewriter over explicit rules, tried in order.
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Rewriter for `direction` using the codec's identifier map.
    pub fn from_codec<C: TableCatalog>(
        codec: &IdentifierCodec<C>,
        direction: Direction,
    ) -> Result<Self, CodecError> {
        let rules = codec.rules(direction)?;
        tracing::debug!(rules = rules.len(), ?direction, "prepared dump rewriter");
        Ok(Self::new(rules))
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the rewriter copies input unchanged.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite a single line given without its terminator.
    pub fn rewrite_line<'a>(&self, line: &'a [u8]) -> Cow<'a, [u8]> {
        for rule in &self.rules {
            if let Some(out) = rule.apply(line) {
                return Cow::Owned(out);
            }
        }
        Cow::Borrowed(line)
    }

    /// Stream `input` to `output`, rewriting matching lines.
    pub fn rewrite<R: BufRead, W: Write>(
        &self,
        mut input: R,
        mut output: W,
    ) -> Result<RewriteStats, CodecError> {
        let mut stats = RewriteStats::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            stats.lines += 1;

            let (body, terminator) = split_terminator(&buf);
            let rewritten = self.rewrite_line(body);
            if let Cow::Owned(_) = rewritten {
                stats.rewritten += 1;
            }
            output.write_all(&rewritten)?;
            output.write_all(terminator)?;
        }
        output.flush()?;
        tracing::info!(
            lines = stats.lines,
            rewritten = stats.rewritten,
            "dump rewrite finished"
        );
        Ok(stats)
    }
}

/// Split a raw line into its body and its `\n` / `\r\n` terminator.
fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    let body_len = match line {
        [.., b'\r', b'\n'] => line.len() - 2,
        [.., b'\n'] => line.len() - 1,
        _ => line.len(),
    };
    line.split_at(body_len)
}
