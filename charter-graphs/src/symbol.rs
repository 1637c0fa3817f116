// SCIP symbol identifiers.
//
// A global symbol is `<scheme> <manager> <package-name> <version> <descriptor>+`.
// Header fields escape a literal space as two spaces; descriptor names that are
// not simple identifiers are wrapped in backticks (with "``" for a literal
// backtick). Local symbols (`local <id>`) are file-private and never parsed.

use std::fmt;

use serde::{Deserialize, Serialize};

const LOCAL_PREFIX: &str = "local ";

/// Recoverable failure parsing a symbol id. The occurrence carrying it is skipped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("empty symbol")]
    Empty,

    #[error("local symbol has no descriptors: {0}")]
    Local(String),

    #[error("missing {field} in symbol: {symbol}")]
    MissingField { field: &'static str, symbol: String },

    #[error("unterminated escaped name in symbol: {symbol}")]
    UnterminatedEscape { symbol: String },

    #[error("unexpected {found:?} at offset {offset} in symbol: {symbol}")]
    UnexpectedCharacter {
        found: Option<char>,
        offset: usize,
        symbol: String,
    },

    #[error("no descriptors found in symbol: {symbol}")]
    NoDescriptors { symbol: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorSuffix {
    Namespace,
    Type,
    Term,
    Method,
    TypeParameter,
    Parameter,
    Meta,
    Macro,
}

impl DescriptorSuffix {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Type => "type",
            Self::Term => "term",
            Self::Method => "method",
            Self::TypeParameter => "type_parameter",
            Self::Parameter => "parameter",
            Self::Meta => "meta",
            Self::Macro => "macro",
        }
    }

    /// Whether a reference to a symbol ending in this descriptor reads as a call.
    pub fn is_call_like(self) -> bool {
        matches!(self, Self::Method)
    }
}

impl fmt::Display for DescriptorSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    /// Method overload disambiguator, empty when absent.
    pub disambiguator: String,
    pub suffix: DescriptorSuffix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSymbol {
    pub scheme: String,
    pub manager: String,
    pub package_name: String,
    pub version: String,
    pub descriptors: Vec<Descriptor>,
}

impl ParsedSymbol {
    pub fn last_descriptor(&self) -> Option<&Descriptor> {
        self.descriptors.last()
    }
}

pub fn is_local_symbol(symbol: &str) -> bool {
    symbol.starts_with(LOCAL_PREFIX)
}

/// Parse a global symbol id into its package header and descriptor path.
pub fn parse_symbol(symbol: &str) -> Result<ParsedSymbol, SymbolError> {
    if symbol.is_empty() {
        return Err(SymbolError::Empty);
    }
    if is_local_symbol(symbol) {
        return Err(SymbolError::Local(symbol.to_string()));
    }

    let mut parser = SymbolParser::new(symbol);
    let scheme = parser.header_field("scheme")?;
    let manager = parser.header_field("package manager")?;
    let package_name = parser.header_field("package name")?;
    let version = parser.header_field("version")?;

    let mut descriptors = Vec::new();
    while !parser.at_end() {
        descriptors.push(parser.descriptor()?);
    }
    if descriptors.is_empty() {
        return Err(SymbolError::NoDescriptors {
            symbol: symbol.to_string(),
        });
    }

    Ok(ParsedSymbol {
        scheme,
        manager,
        package_name,
        version,
        descriptors,
    })
}

/// Suffix of the innermost descriptor, the part that says what the symbol is.
pub fn symbol_suffix(symbol: &str) -> Result<DescriptorSuffix, SymbolError> {
    let parsed = parse_symbol(symbol)?;
    parsed
        .last_descriptor()
        .map(|d| d.suffix)
        .ok_or_else(|| SymbolError::NoDescriptors {
            symbol: symbol.to_string(),
        })
}

// ── Parser ────────────────────────────────────────────────────────────

struct SymbolParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> SymbolParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn unexpected(&self) -> SymbolError {
        SymbolError::UnexpectedCharacter {
            found: self.peek(),
            offset: self.pos,
            symbol: self.source.to_string(),
        }
    }

    fn expect(&mut self, c: char) -> Result<(), SymbolError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn header_field(&mut self, field: &'static str) -> Result<String, SymbolError> {
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(SymbolError::MissingField {
                        field,
                        symbol: self.source.to_string(),
                    });
                }
                Some(' ') if self.chars.get(self.pos + 1) == Some(&' ') => {
                    value.push(' ');
                    self.pos += 2;
                }
                Some(' ') => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn descriptor(&mut self) -> Result<Descriptor, SymbolError> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let name = self.name()?;
                self.expect(')')?;
                Ok(descriptor(name, String::new(), DescriptorSuffix::Parameter))
            }
            Some('[') => {
                self.pos += 1;
                let name = self.name()?;
                self.expect(']')?;
                Ok(descriptor(name, String::new(), DescriptorSuffix::TypeParameter))
            }
            _ => {
                let name = self.name()?;
                let suffix = match self.peek() {
                    Some('/') => DescriptorSuffix::Namespace,
                    Some('#') => DescriptorSuffix::Type,
                    Some('.') => DescriptorSuffix::Term,
                    Some(':') => DescriptorSuffix::Meta,
                    Some('!') => DescriptorSuffix::Macro,
                    Some('(') => {
                        self.pos += 1;
                        let disambiguator = self.simple_identifier();
                        self.expect(')')?;
                        self.expect('.')?;
                        return Ok(descriptor(name, disambiguator, DescriptorSuffix::Method));
                    }
                    _ => return Err(self.unexpected()),
                };
                self.pos += 1;
                Ok(descriptor(name, String::new(), suffix))
            }
        }
    }

    fn name(&mut self) -> Result<String, SymbolError> {
        if self.peek() == Some('`') {
            return self.escaped_identifier();
        }
        let name = self.simple_identifier();
        if name.is_empty() {
            return Err(self.unexpected());
        }
        Ok(name)
    }

    fn simple_identifier(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_identifier_character) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn escaped_identifier(&mut self) -> Result<String, SymbolError> {
        self.pos += 1;
        let mut name = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(SymbolError::UnterminatedEscape {
                        symbol: self.source.to_string(),
                    });
                }
                Some('`') if self.chars.get(self.pos + 1) == Some(&'`') => {
                    name.push('`');
                    self.pos += 2;
                }
                Some('`') => {
                    self.pos += 1;
                    return Ok(name);
                }
                Some(c) => {
                    name.push(c);
                    self.pos += 1;
                }
            }
        }
    }
}

fn descriptor(name: String, disambiguator: String, suffix: DescriptorSuffix) -> Descriptor {
    Descriptor {
        name,
        disambiguator,
        suffix,
    }
}

// Any Unicode letter or digit: indexers write non-ASCII names unescaped.
fn is_identifier_character(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '+' | '-' | '$')
}
