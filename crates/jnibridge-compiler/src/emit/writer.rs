/// Line-oriented text builder with block indentation.
#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    depth: usize,
}

impl CodeWriter {
    const INDENT: &'static str = "    ";

    pub fn new() -> Self {
        Self::default()
    }

    /// Write one indented line.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(Self::INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Append `text` verbatim, ending it with a newline if it lacks one.
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
        if !text.is_empty() && !text.ends_with('\n') {
            self.out.push('\n');
        }
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Write `header {` and indent.
    pub fn open(&mut self, header: impl AsRef<str>) {
        self.line(format!("{} {{", header.as_ref()));
        self.depth += 1;
    }

    /// Dedent and write `}` followed by `trailer`.
    pub fn close(&mut self, trailer: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(format!("}}{trailer}"));
    }

    /// Dedent, write `} header {`, and indent again.
    pub fn reopen(&mut self, header: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(format!("}} {} {{", header.as_ref()));
        self.depth += 1;
    }

    pub fn finish(self) -> String {
        self.out
    }
}
