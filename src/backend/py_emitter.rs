//! Python code emitter - builds host source text
//!
//! A buffer for well-formatted Python code with indentation-aware suites.

/// A buffer for building Python source code with proper indentation
#[derive(Debug, Default)]
pub struct PyEmitter {
    buffer: String,
    indent_level: usize,
}

const INDENT: &str = "    ";

impl PyEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the generated code
    pub fn finish(self) -> String {
        self.buffer
    }

    /// Write a line with current indentation
    pub fn line(&mut self, s: &str) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(INDENT);
        }
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write a blank line
    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    /// Increase indent level
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indent level
    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Write a `header:` suite with its body indented one level.
    pub fn suite<F>(&mut self, header: &str, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.line(&format!("{}:", header));
        self.indent();
        f(self);
        self.dedent();
    }
}

/// Quote a string as a Python single-quoted literal.
pub fn py_str_lit(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Render a real literal so the host reads the same value back.
pub fn py_real_lit(v: f64) -> String {
    // `{:?}` keeps a decimal point on whole values (1.0, not 1).
    format!("{:?}", v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_indentation() {
        let mut e = PyEmitter::new();
        e.suite("def subjecto()", |e| {
            e.line("pass");
        });
        assert_eq!(e.finish(), "def subjecto():\n    pass\n");
    }

    #[test]
    fn test_nested_suites() {
        let mut e = PyEmitter::new();
        e.suite("while True", |e| {
            e.suite("if x", |e| {
                e.line("break");
            });
        });
        assert_eq!(e.finish(), "while True:\n    if x:\n        break\n");
    }

    #[test]
    fn test_str_lit_quoting() {
        assert_eq!(py_str_lit("salve"), "'salve'");
        assert_eq!(py_str_lit("it's"), "'it\\'s'");
        assert_eq!(py_str_lit("a\nb"), "'a\\nb'");
        assert_eq!(py_str_lit("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_real_lit_keeps_point() {
        assert_eq!(py_real_lit(1.0), "1.0");
        assert_eq!(py_real_lit(3.14), "3.14");
    }
}
