//! Tokens produced by the tokenizer and consumed by the tree builder.

use dom::Attributes;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<name attr=value ...>` or `<name ... />`
    StartTag {
        name: String,
        attributes: Attributes,
        self_closing: bool,
    },
    /// `</name>`
    EndTag { name: String },
    /// A run of character data, already merged and reference-decoded
    Text { data: String },
    /// `<!-- data -->` or a bogus comment
    Comment { data: String },
    /// `<!DOCTYPE name PUBLIC "public_id" "system_id">`
    Doctype {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    /// Emitted exactly once, after the last character of input
    EndOfInput,
}

impl Token {
    pub fn start_tag(name: impl Into<String>) -> Self {
        Token::StartTag {
            name: name.into(),
            attributes: Attributes::new(),
            self_closing: false,
        }
    }

    pub fn end_tag(name: impl Into<String>) -> Self {
        Token::EndTag { name: name.into() }
    }

    pub fn text(data: impl Into<String>) -> Self {
        Token::Text { data: data.into() }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::StartTag { name, .. } => write!(f, "<{}>", name),
            Token::EndTag { name } => write!(f, "</{}>", name),
            Token::Text { data } => write!(f, "text({:?})", data),
            Token::Comment { .. } => f.write_str("comment"),
            Token::Doctype { name, .. } => write!(f, "<!DOCTYPE {}>", name),
            Token::EndOfInput => f.write_str("end of input"),
        }
    }
}
