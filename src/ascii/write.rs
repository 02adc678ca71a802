//! Buffered writer for textual STL.

use std::{
    fmt::Write as _,
    io::{self, Write},
};

use crate::{
    error::Error,
    mesh::MeshSource,
    progress::ProgressController,
    DEFAULT_BUFFER_SIZE,
};


/// The solid name used when the caller didn't specify one.
const DEFAULT_SOLID_NAME: &str = "mesh";

/// Longest accepted solid name; longer names would not tokenize back in.
const SOLID_NAME_MAX_LEN: usize = 512;

/// Rough upper bound of one formatted facet in bytes, used to size batches.
const FACET_SIZE_HINT: usize = 512;

/// How a float coordinate is rendered.
///
/// `Shortest` picks the shortest representation that round-trips back to
/// the same `f32` (the configured precision is ignored for it). The
/// uppercase variants differ only in the exponent marker (`E` vs `e`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatTextFormat {
    DecimalLowercase,
    DecimalUppercase,
    ScientificLowercase,
    ScientificUppercase,
    ShortestLowercase,
    ShortestUppercase,
}

impl FloatTextFormat {
    fn uppercase(&self) -> bool {
        match self {
            FloatTextFormat::DecimalUppercase
            | FloatTextFormat::ScientificUppercase
            | FloatTextFormat::ShortestUppercase => true,
            _ => false,
        }
    }
}

impl Default for FloatTextFormat {
    fn default() -> Self {
        FloatTextFormat::DecimalLowercase
    }
}

/// Options for [`AsciiWriter`].
#[derive(Debug, Clone)]
pub struct AsciiWriteOptions {
    /// Name written after `solid` and `endsolid`. Must be plain ASCII
    /// without line breaks.
    pub solid_name: String,

    pub float_format: FloatTextFormat,

    /// Number of digits passed to the float formatter, in `1..=9`.
    pub precision: u8,

    /// Size of the batch buffer; one batch always holds a whole number of
    /// facets so a failed flush leaves the stream at a facet boundary.
    pub buffer_size: usize,

    /// Skips the `solid`/`endsolid` framing, emitting facets only. Useful
    /// when appending to an externally managed stream.
    pub write_triangles_only: bool,
}

impl Default for AsciiWriteOptions {
    fn default() -> Self {
        Self {
            solid_name: DEFAULT_SOLID_NAME.into(),
            float_format: FloatTextFormat::default(),
            precision: 9,
            buffer_size: DEFAULT_BUFFER_SIZE,
            write_triangles_only: false,
        }
    }
}

/// A buffered writer emitting one solid per [`write_from`] call.
///
/// Output is accumulated facet by facet and flushed in batches that always
/// end at a facet boundary. Progress is reported per batch as a percentage
/// of the total facet count; cancellation is honored between facets.
///
/// [`write_from`]: AsciiWriter::write_from
#[derive(Debug)]
pub struct AsciiWriter<W: Write> {
    writer: W,
    options: AsciiWriteOptions,
}

impl<W: Write> AsciiWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, AsciiWriteOptions::default())
    }

    pub fn with_options(writer: W, options: AsciiWriteOptions) -> Self {
        Self { writer, options }
    }

    /// Hands the underlying writer back, e.g. to emit further solids into
    /// the same stream with different options.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes all triangles of `source` as one solid.
    pub fn write_from<S: MeshSource + ?Sized>(&mut self, source: &S) -> Result<(), Error> {
        self.write_solids(&[source], &mut ProgressController::new())
    }

    /// Writes one solid per source, with a single progress range across the
    /// total facet count of all of them.
    pub fn write_solids<S: MeshSource + ?Sized>(
        &mut self,
        sources: &[&S],
        progress: &mut ProgressController,
    ) -> Result<(), Error> {
        self.check_options()?;

        let total: u64 = sources.iter().map(|s| s.triangle_count() as u64).sum();
        progress.set_range(0, total);

        let facets_per_batch = (self.options.buffer_size / FACET_SIZE_HINT).max(1) as u32;
        let mut batch = String::with_capacity(self.options.buffer_size);
        let mut written: u64 = 0;

        for source in sources {
            if !self.options.write_triangles_only {
                batch.push_str("solid ");
                batch.push_str(&self.options.solid_name);
                batch.push('\n');
            }

            let count = source.triangle_count();
            for index in 0..count {
                progress.poll_stop()?;

                let triangle = source.triangle(index);
                self.format_facet(&mut batch, &triangle);
                written += 1;

                if (index + 1) % facets_per_batch == 0 {
                    self.flush_batch(&mut batch)?;
                    progress.set_value(written);
                }
            }

            if !self.options.write_triangles_only {
                batch.push_str("endsolid ");
                batch.push_str(&self.options.solid_name);
                batch.push('\n');
            }
            self.flush_batch(&mut batch)?;
            progress.set_value(written);
        }

        progress.complete();
        Ok(())
    }

    fn check_options(&self) -> Result<(), Error> {
        let prec = self.options.precision;
        if prec < 1 || prec > 9 {
            return Err(Error::InvalidPrecision { prec });
        }

        let name = &self.options.solid_name;
        if name.len() > SOLID_NAME_MAX_LEN
            || !name.is_ascii()
            || name.bytes().any(|b| b == b'\n' || b == b'\r')
        {
            return Err(Error::InvalidSolidName);
        }

        Ok(())
    }

    fn flush_batch(&mut self, batch: &mut String) -> Result<(), Error> {
        if !batch.is_empty() {
            self.writer.write_all(batch.as_bytes())?;
            batch.clear();
        }
        Ok(())
    }

    fn format_facet(&self, out: &mut String, triangle: &crate::Triangle) {
        out.push_str("facet normal ");
        self.format_xyz(out, triangle.normal);
        out.push_str("\n outer loop\n");
        for vertex in &triangle.vertices {
            out.push_str("  vertex ");
            self.format_xyz(out, *vertex);
            out.push('\n');
        }
        out.push_str(" endloop\nendfacet\n");
    }

    fn format_xyz(&self, out: &mut String, [x, y, z]: [f32; 3]) {
        self.format_float(out, x);
        out.push(' ');
        self.format_float(out, y);
        out.push(' ');
        self.format_float(out, z);
    }

    fn format_float(&self, out: &mut String, value: f32) {
        format_float(
            out,
            value,
            self.options.float_format,
            self.options.precision,
        )
    }
}

/// Renders one coordinate according to format and precision.
fn format_float(out: &mut String, value: f32, format: FloatTextFormat, prec: u8) {
    let start = out.len();

    match format {
        FloatTextFormat::DecimalLowercase | FloatTextFormat::DecimalUppercase => {
            // Infallible; write! to a String cannot error.
            let _ = write!(out, "{:.*}", prec as usize, value);
        }
        FloatTextFormat::ScientificLowercase | FloatTextFormat::ScientificUppercase => {
            let _ = write!(out, "{:.*e}", prec as usize, value);
            add_exponent_sign(out, start);
        }
        FloatTextFormat::ShortestLowercase | FloatTextFormat::ShortestUppercase => {
            let _ = write!(out, "{}", value);
        }
    }

    if format.uppercase() {
        // Only the exponent marker can differ in case.
        if let Some(pos) = out[start..].find('e') {
            let pos = start + pos;
            out.replace_range(pos..pos + 1, "E");
        }
    }
}

/// `{:e}` omits the sign of non-negative exponents; STL tooling commonly
/// expects an explicit one.
fn add_exponent_sign(out: &mut String, start: usize) {
    if let Some(pos) = out[start..].find('e') {
        let after = start + pos + 1;
        if !out[after..].starts_with('-') {
            out.insert(after, '+');
        }
    }
}

/// Convenience: writes a single solid in default ASCII style to any
/// `io::Write`.
pub fn write_ascii<W: Write, S: MeshSource + ?Sized>(
    writer: W,
    source: &S,
) -> Result<(), io::Error> {
    AsciiWriter::new(writer)
        .write_from(source)
        .map_err(|e| match e {
            Error::Io(io) => io,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        })
}
