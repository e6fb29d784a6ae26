//! Common header scaffolding: provenance notes, include guards, and
//! section banners.

use hwdef_core::TextBlock;

pub const TOOL_NAME: &str = "hwdef";
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Accumulates the output header top to bottom. Blocks are separated by a
/// single blank line; the finished text ends with a newline.
#[derive(Debug, Default)]
pub struct Header {
    contents: String,
}

impl Header {
    pub fn new() -> Self {
        Header::default()
    }

    pub fn line(&mut self, line: &str) {
        self.contents.push_str(line);
        self.contents.push('\n');
    }

    /// A blank line followed by `text`.
    pub fn block(&mut self, text: &str) {
        self.line("");
        self.line(text);
    }

    /// The provenance note: tool identity plus the source file hash.
    pub fn provenance(&mut self, domain: &str, hash: &str) {
        self.line("// Do not edit!");
        self.line(&format!("// This is generated by {TOOL_NAME} {TOOL_VERSION}"));
        self.line(&format!("// {domain} hash({hash})"));
    }

    /// Free-form notes, one comment block.
    pub fn notes(&mut self, notes: &str) {
        if !notes.is_empty() {
            self.block(TextBlock::new(notes).prefixed("// ").as_str());
        }
    }

    pub fn open_guard(&mut self, guard: &str) {
        self.line("");
        self.line(&format!("#ifndef {guard}_H"));
        self.line(&format!("#define {guard}_H"));
    }

    pub fn include(&mut self, header: &str) {
        self.line(&format!("#include <{header}>"));
    }

    /// A `=`-framed, `// `-prefixed section banner.
    pub fn section(&mut self, title: &str) {
        self.block(TextBlock::new(title).framed('=').prefixed("// ").as_str());
    }

    pub fn close_guard(&mut self, guard: &str) {
        self.line("");
        self.line(&format!("#endif // {guard}_H"));
    }

    pub fn finish(self) -> String {
        self.contents
    }
}
