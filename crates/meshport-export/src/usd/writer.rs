//! Minimal USDA text emitter
//!
//! Handles indentation, prim blocks and value formatting. Output depends only
//! on its inputs, so equal scenes give byte-identical layers.

use std::fmt::Write as _;

const INDENT: &str = "    ";

/// Nesting beyond this level is written flush with it; USDA ignores whitespace
const MAX_INDENT_DEPTH: usize = 32;

/// Line-oriented builder for a `.usda` layer
#[derive(Debug, Default)]
pub struct UsdaWriter {
    out: String,
    depth: usize,
}

impl UsdaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one indented line
    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth.min(MAX_INDENT_DEPTH) {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// `def <type> "<name>" (<metadata>) {`
    pub fn open_prim(&mut self, type_name: &str, name: &str, metadata: &[String]) {
        if metadata.is_empty() {
            self.line(format!("def {} \"{}\"", type_name, name));
        } else {
            self.line(format!("def {} \"{}\" (", type_name, name));
            self.depth += 1;
            for entry in metadata {
                self.line(entry);
            }
            self.depth -= 1;
            self.line(")");
        }
        self.line("{");
        self.depth += 1;
    }

    pub fn close_prim(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    /// Attribute with per-attribute metadata such as `interpolation`
    pub fn attribute_with_metadata(&mut self, declaration: &str, value: &str, metadata: &[String]) {
        self.line(format!("{} = {} (", declaration, value));
        self.depth += 1;
        for entry in metadata {
            self.line(entry);
        }
        self.depth -= 1;
        self.line(")");
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Shortest round-trip decimal; non-finite values become 0
pub fn float(value: f32) -> String {
    if value.is_finite() {
        // Avoid "-0" in the output
        if value == 0.0 {
            "0".to_string()
        } else {
            format!("{}", value)
        }
    } else {
        "0".to_string()
    }
}

/// `(a, b, ...)`
pub fn tuple(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| float(*v)).collect();
    format!("({})", parts.join(", "))
}

/// `[(x, y, z), ...]`
pub fn tuple_array<const N: usize>(values: &[[f32; N]]) -> String {
    let mut out = String::with_capacity(values.len() * N * 6 + 2);
    out.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&tuple(v));
    }
    out.push(']');
    out
}

/// `[1, 2, 3]`
pub fn int_array<T: std::fmt::Display>(values: &[T]) -> String {
    let mut out = String::with_capacity(values.len() * 4 + 2);
    out.push('[');
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}", v);
    }
    out.push(']');
    out
}

/// Column-major glTF matrix as a USD `matrix4d` literal
///
/// USD multiplies row vectors, so each glTF column becomes a USD row.
pub fn matrix(m: &[[f32; 4]; 4]) -> String {
    let rows: Vec<String> = m.iter().map(|col| tuple(col)).collect();
    format!("( {} )", rows.join(", "))
}

/// `"text"` with quotes and backslashes escaped
pub fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
