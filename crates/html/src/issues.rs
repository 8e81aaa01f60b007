//! Non-fatal parse issues.
//!
//! Malformed markup never fails a parse. Whatever the tokenizer or tree
//! builder had to recover from is recorded here instead, for callers that
//! want diagnostics.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Tokenizer,
    TreeBuilder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub stage: ParseStage,
    pub message: String,
    /// Byte offset into the input for tokenizer issues, index of the
    /// offending token for tree builder issues.
    pub position: usize,
}

impl ParseIssue {
    pub fn tokenizer(message: impl Into<String>, offset: usize) -> Self {
        Self {
            stage: ParseStage::Tokenizer,
            message: message.into(),
            position: offset,
        }
    }

    pub fn tree_builder(message: impl Into<String>, token_index: usize) -> Self {
        Self {
            stage: ParseStage::TreeBuilder,
            message: message.into(),
            position: token_index,
        }
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            ParseStage::Tokenizer => write!(f, "byte {}: {}", self.position, self.message),
            ParseStage::TreeBuilder => write!(f, "token {}: {}", self.position, self.message),
        }
    }
}
