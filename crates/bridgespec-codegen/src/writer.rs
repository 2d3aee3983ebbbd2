//! Line-oriented C text writer with block indentation.

/// Accumulates generated C, two spaces per indentation level.
#[derive(Debug, Default)]
pub struct CWriter {
    out: String,
    indent: usize,
}

impl CWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one indented line.
    pub fn line(&mut self, s: &str) {
        if !s.is_empty() {
            for _ in 0..self.indent {
                self.out.push_str("  ");
            }
            self.out.push_str(s);
        }
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// `head {` and indent.
    pub fn open_block(&mut self, head: &str) {
        if head.is_empty() {
            self.line("{");
        } else {
            self.line(&format!("{head} {{"));
        }
        self.indent += 1;
    }

    pub fn close_block(&mut self) {
        self.close_block_with("");
    }

    /// Dedent and write `}` followed by `tail`, e.g. `;` or ` else {`.
    pub fn close_block_with(&mut self, tail: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(&format!("}}{tail}"));
    }

    /// Lines at column zero, e.g. labels and preprocessor directives.
    pub fn raw(&mut self, s: &str) {
        self.out.push_str(s);
        self.out.push('\n');
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_indent() {
        let mut w = CWriter::new();
        w.open_block("int main(void)");
        w.open_block("if (x)");
        w.line("return 1;");
        w.close_block();
        w.raw("exit:");
        w.line("return 0;");
        w.close_block();
        assert_eq!(
            w.finish(),
            "int main(void) {\n  if (x) {\n    return 1;\n  }\nexit:\n  return 0;\n}\n"
        );
    }

    #[test]
    fn test_close_with_tail() {
        let mut w = CWriter::new();
        w.open_block("typedef enum e_t");
        w.line("E_A,");
        w.close_block_with(" e;");
        assert_eq!(w.finish(), "typedef enum e_t {\n  E_A,\n} e;\n");
    }
}
