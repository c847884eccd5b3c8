//! Method documentation to prompt compilation.
//!
//! A method's doc text serves two audiences. Text between `<` and `>` is
//! the short description other agents see when this method is one of
//! their tools; everything else is the instruction prompt used when the
//! method itself runs as an agent.
//!
//! ```text
//! <Increase the counter by one.>
//! Increment the counter, then report the new value.
//! ```

/// The two views of a method's documentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledDoc {
    /// Instruction prompt, with every delimited fragment removed.
    pub instructions: String,
    /// Description used when the method is exposed as a tool.
    ///
    /// The first delimited fragment, or the first non-empty line of the
    /// doc when there is none. `None` for empty docs.
    pub tool_description: Option<String>,
}

impl CompiledDoc {
    /// Tool description, falling back to the method name.
    pub fn tool_description_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.tool_description.as_deref().unwrap_or(name)
    }
}

/// Split a doc string into instructions and tool description.
///
/// Unbalanced delimiters are treated as plain text.
pub fn compile_doc(doc: &str) -> CompiledDoc {
    let fragments = scan_fragments(doc);

    let mut instructions = String::with_capacity(doc.len());
    let mut copied = 0;
    for span in &fragments {
        instructions.push_str(&doc[copied..span.open]);
        copied = span.close + 1;
    }
    instructions.push_str(&doc[copied..]);
    let instructions = instructions.trim().to_string();

    let tool_description = fragments
        .iter()
        .map(|span| doc[span.open + 1..span.close].trim())
        .find(|text| !text.is_empty())
        .or_else(|| doc.lines().map(str::trim).find(|line| !line.is_empty()))
        .map(str::to_string);

    CompiledDoc {
        instructions,
        tool_description,
    }
}

/// Byte offsets of one `<...>` span (both delimiters included).
struct Span {
    open: usize,
    close: usize,
}

/// Find every innermost `<...>` span, left to right.
///
/// A `<` is only paired with the next `>`; an earlier unmatched `<` is
/// left in the text.
fn scan_fragments(doc: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut open = None;
    for (idx, c) in doc.char_indices() {
        match c {
            '<' => open = Some(idx),
            '>' => {
                if let Some(start) = open.take() {
                    spans.push(Span {
                        open: start,
                        close: idx,
                    });
                }
            }
            _ => {}
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_becomes_tool_description() {
        let doc = "<Increase the counter.>\nIncrement the counter and report it.";
        let compiled = compile_doc(doc);
        assert_eq!(
            compiled.tool_description.as_deref(),
            Some("Increase the counter.")
        );
        assert_eq!(compiled.instructions, "Increment the counter and report it.");
    }

    #[test]
    fn test_no_fragment_uses_first_line() {
        let doc = "\n  Summarize the notes.  \nKeep it short.";
        let compiled = compile_doc(doc);
        assert_eq!(
            compiled.tool_description.as_deref(),
            Some("Summarize the notes.")
        );
        assert_eq!(compiled.instructions, "Summarize the notes.  \nKeep it short.");
    }

    #[test]
    fn test_empty_doc() {
        let compiled = compile_doc("");
        assert_eq!(compiled, CompiledDoc::default());
        assert_eq!(compiled.tool_description_or("bump"), "bump");
    }

    #[test]
    fn test_fragment_in_middle_of_text() {
        let compiled = compile_doc("Write a poem <Writes a poem.> about the sea.");
        assert_eq!(compiled.tool_description.as_deref(), Some("Writes a poem."));
        assert_eq!(compiled.instructions, "Write a poem  about the sea.");
    }

    #[test]
    fn test_only_first_fragment_is_the_description() {
        let compiled = compile_doc("<first> body <second>");
        assert_eq!(compiled.tool_description.as_deref(), Some("first"));
        assert_eq!(compiled.instructions, "body");
    }

    #[test]
    fn test_unbalanced_delimiters_are_text() {
        let compiled = compile_doc("Return a < b as text");
        assert_eq!(compiled.instructions, "Return a < b as text");
        assert_eq!(
            compiled.tool_description.as_deref(),
            Some("Return a < b as text")
        );

        let compiled = compile_doc("keep a < b <tool>");
        assert_eq!(compiled.tool_description.as_deref(), Some("tool"));
        assert_eq!(compiled.instructions, "keep a < b");
    }

    #[test]
    fn test_fragment_only_doc_has_empty_instructions() {
        let compiled = compile_doc("<Just a tool.>");
        assert_eq!(compiled.instructions, "");
        assert_eq!(compiled.tool_description.as_deref(), Some("Just a tool."));
    }
}
