//! Console backend: writes spans to a text stream.
//!
//! Stateless beyond sent/failed/byte counters. Useful for inspecting what
//! a sync pass would export and as the reference implementation of the
//! backend contract.

use crate::error::Result;
use crate::sync::span::{Backend, Span, SpanBatch, SpanKind, SyncContext};
use colored::Colorize;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Console backend configuration.
pub struct ConsoleConfig {
    /// Destination stream; stdout when `None`.
    pub writer: Option<Box<dyn Write + Send>>,
    /// Show full span details.
    pub verbose: bool,
    /// "text" or "json" (one JSON object per line).
    pub format: String,
    /// Disable colored output.
    pub no_color: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            writer: None,
            verbose: false,
            format: "text".to_string(),
            no_color: false,
        }
    }
}

/// Backend statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub spans_sent: u64,
    pub spans_failed: u64,
    pub bytes_sent: u64,
}

/// Writes spans to a text stream in human-readable or line-JSON form.
pub struct ConsoleBackend {
    writer: Mutex<Box<dyn Write + Send>>,
    verbose: bool,
    json: bool,
    no_color: bool,
    spans_sent: AtomicU64,
    spans_failed: AtomicU64,
    bytes_sent: AtomicU64,
}

impl ConsoleBackend {
    #[must_use]
    pub fn new(config: ConsoleConfig) -> Self {
        let writer = config
            .writer
            .unwrap_or_else(|| Box::new(std::io::stdout()));
        Self {
            writer: Mutex::new(writer),
            verbose: config.verbose,
            json: config.format == "json",
            no_color: config.no_color,
            spans_sent: AtomicU64::new(0),
            spans_failed: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> BackendStats {
        BackendStats {
            spans_sent: self.spans_sent.load(Ordering::Relaxed),
            spans_failed: self.spans_failed.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }

    fn send_json(&self, span: &Span) -> Result<()> {
        let data = match serde_json::to_string(span) {
            Ok(data) => data,
            Err(err) => {
                self.spans_failed.fetch_add(1, Ordering::Relaxed);
                return Err(err.into());
            }
        };

        let mut writer = self.lock_writer();
        writeln!(writer, "{data}")?;
        self.spans_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent
            .fetch_add(data.len() as u64 + 1, Ordering::Relaxed);
        Ok(())
    }

    fn send_text(&self, span: &Span) -> Result<()> {
        let paint = |s: &str, style: fn(&str) -> colored::ColoredString| {
            if self.no_color {
                s.to_string()
            } else {
                style(s).to_string()
            }
        };
        let kind = match span.kind {
            SpanKind::Generation => paint(span.kind.as_str(), |s| s.green()),
            SpanKind::Trace => paint(span.kind.as_str(), |s| s.yellow()),
            SpanKind::Span => paint(span.kind.as_str(), |s| s.cyan()),
        };

        let mut writer = self.lock_writer();
        writeln!(
            writer,
            "{} {} {}",
            paint("[SYNC]", |s| s.dimmed()),
            kind,
            paint(&span.name, |s| s.bold()),
        )?;
        writeln!(
            writer,
            "  {}: {}  {}: {}",
            paint("trace", |s| s.dimmed()),
            crate::paths::short_id(&span.trace_id),
            paint("span", |s| s.dimmed()),
            crate::paths::short_id(&span.id),
        )?;
        writeln!(
            writer,
            "  {}: {}",
            paint("time", |s| s.dimmed()),
            span.start_time.to_rfc3339(),
        )?;

        if self.verbose {
            if !span.input.is_empty() {
                writeln!(
                    writer,
                    "  {}: {}",
                    paint("input", |s| s.dimmed()),
                    truncate(&span.input, 200)
                )?;
            }
            if !span.output.is_empty() {
                writeln!(
                    writer,
                    "  {}: {}",
                    paint("output", |s| s.dimmed()),
                    truncate(&span.output, 200)
                )?;
            }
            if let Some(model) = &span.model {
                writeln!(writer, "  {}: {model}", paint("model", |s| s.dimmed()))?;
            }
            writeln!(
                writer,
                "  {}: {}:{}",
                paint("source", |s| s.dimmed()),
                span.source_file,
                span.source_line,
            )?;
        }
        writeln!(writer)?;

        self.spans_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, Box<dyn Write + Send>> {
        self.writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Backend for ConsoleBackend {
    fn name(&self) -> &str {
        "console"
    }

    fn send_span(&self, _ctx: &SyncContext, span: &Span) -> Result<()> {
        if self.json {
            self.send_json(span)
        } else {
            self.send_text(span)
        }
    }

    fn send_batch(&self, ctx: &SyncContext, batch: &SpanBatch) -> Result<()> {
        if self.json {
            for span in &batch.spans {
                self.send_span(ctx, span)?;
            }
            return Ok(());
        }

        {
            let paint_dim = |s: &str| {
                if self.no_color {
                    s.to_string()
                } else {
                    s.dimmed().to_string()
                }
            };
            let mut writer = self.lock_writer();
            writeln!(
                writer,
                "{} {} {} ({} spans)",
                paint_dim("[BATCH]"),
                crate::paths::short_id(&batch.trace_id),
                paint_dim(&batch.project),
                batch.spans.len(),
            )?;
            writeln!(writer)?;
        }

        for span in &batch.spans {
            self.send_span(ctx, span)?;
        }
        Ok(())
    }

    fn flush(&self, _ctx: &SyncContext) -> Result<()> {
        let mut writer = self.lock_writer();
        writer.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        // Flushing twice is harmless; close must stay idempotent.
        let mut writer = self.lock_writer();
        writer.flush()?;
        Ok(())
    }
}

/// Shorten a string to a single display line.
fn truncate(s: &str, max_len: usize) -> String {
    let mut flat = s.replace(['\n', '\t'], " ");
    if flat.len() > max_len && max_len > 3 {
        let mut cut = max_len - 3;
        while !flat.is_char_boundary(cut) {
            cut -= 1;
        }
        flat.truncate(cut);
        flat.push_str("...");
    }
    flat
}
