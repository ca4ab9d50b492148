//! Typed JSON paths
//!
//! Suites write paths as text (`user.name`, `brands[id=3].brand`,
//! `products[*].price`); the text is parsed once into segments and the
//! segments are what gets evaluated.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::common::{Error, Result};
use crate::fixture::scalar_text;

/// One step of a JSON path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object member
    Field(String),
    /// First array element whose `key` member equals `equals` as text
    Find { key: String, equals: String },
    /// Every array element; the rest of the path is applied to each
    Each,
}

/// What a path found in a document
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Nothing matched
    Missing,
    Value(Value),
    /// Produced by an `Each` segment
    List(Vec<Value>),
}

impl Resolved {
    /// Missing or JSON null
    pub fn is_absent(&self) -> bool {
        matches!(self, Resolved::Missing | Resolved::Value(Value::Null))
    }
}

/// A parsed JSON path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// The empty path, selecting the whole document
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(Segment::Field(name.into()));
        self
    }

    pub fn find(mut self, key: impl Into<String>, equals: impl Into<String>) -> Self {
        self.segments.push(Segment::Find {
            key: key.into(),
            equals: equals.into(),
        });
        self
    }

    pub fn each(mut self) -> Self {
        self.segments.push(Segment::Each);
        self
    }

    /// Copy of the path with every field name, key and value passed through `f`
    pub fn map_text(&self, mut f: impl FnMut(&str) -> String) -> Self {
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Field(name) => Segment::Field(f(name)),
                Segment::Find { key, equals } => Segment::Find {
                    key: f(key),
                    equals: f(equals),
                },
                Segment::Each => Segment::Each,
            })
            .collect();
        Self { segments }
    }

    /// Evaluate the path against a document
    pub fn resolve(&self, doc: &Value) -> Resolved {
        resolve(&self.segments, doc)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Parser::new(text).parse()
    }
}

fn resolve(segments: &[Segment], value: &Value) -> Resolved {
    let Some((first, rest)) = segments.split_first() else {
        return Resolved::Value(value.clone());
    };

    match first {
        Segment::Field(name) => match value.get(name.as_str()) {
            Some(child) => resolve(rest, child),
            None => Resolved::Missing,
        },
        Segment::Find { key, equals } => {
            let found = value.as_array().and_then(|items| {
                items
                    .iter()
                    .find(|item| {
                        item.get(key.as_str()).map(scalar_text).as_deref() == Some(equals.as_str())
                    })
            });
            match found {
                Some(item) => resolve(rest, item),
                None => Resolved::Missing,
            }
        }
        Segment::Each => match value.as_array() {
            Some(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match resolve(rest, item) {
                        Resolved::Missing => out.push(Value::Null),
                        Resolved::Value(v) => out.push(v),
                        Resolved::List(vs) => out.extend(vs),
                    }
                }
                Resolved::List(out)
            }
            None => Resolved::Missing,
        },
    }
}

struct Parser<'a> {
    text: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().peekable(),
        }
    }

    fn error(&self, reason: impl fmt::Display) -> Error {
        Error::Config(format!("Invalid JSON path '{}': {}", self.text, reason))
    }

    fn parse(mut self) -> Result<JsonPath> {
        let mut path = JsonPath::root();
        let trimmed = self.text.trim();
        if trimmed.is_empty() || trimmed == "$" {
            return Ok(path);
        }

        let mut expect_field = true;
        loop {
            match self.chars.peek().copied() {
                None => break,
                Some((_, '[')) => {
                    self.chars.next();
                    path.segments.push(self.bracket()?);
                    expect_field = false;
                }
                Some((_, '.')) => {
                    self.chars.next();
                    if expect_field {
                        return Err(self.error("empty field name"));
                    }
                    expect_field = true;
                }
                Some((_, ']')) => return Err(self.error("unexpected ']'")),
                Some(_) => {
                    if !expect_field {
                        return Err(self.error("expected '.' or '[' after ']'"));
                    }
                    let name = self.take_while(|c| c != '.' && c != '[' && c != ']');
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(self.error("empty field name"));
                    }
                    path.segments.push(Segment::Field(name.to_string()));
                    expect_field = false;
                }
            }
        }

        if expect_field {
            return Err(self.error("path ends with '.'"));
        }
        Ok(path)
    }

    fn bracket(&mut self) -> Result<Segment> {
        let inner = self.take_while(|c| c != ']');
        if self.chars.next().is_none() {
            return Err(self.error("missing ']'"));
        }

        let inner = inner.trim();
        if inner == "*" {
            return Ok(Segment::Each);
        }
        let (key, value) = inner
            .split_once('=')
            .ok_or_else(|| self.error(format!("expected '*' or key=value in [{}]", inner)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(self.error("empty key in predicate"));
        }
        Ok(Segment::Find {
            key: key.to_string(),
            equals: unquote(value.trim()).to_string(),
        })
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

impl FromStr for JsonPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Segment::Find { key, equals } => write!(f, "[{}={}]", key, equals)?,
                Segment::Each => f.write_str("[*]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn brands() -> Value {
        json!({
            "responseCode": 200,
            "brands": [
                {"id": 1, "brand": "Polo"},
                {"id": 3, "brand": "H&M"},
                {"id": 4, "brand": "Madame"}
            ]
        })
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            JsonPath::parse("user.name").unwrap(),
            JsonPath::root().field("user").field("name")
        );
        assert_eq!(
            JsonPath::parse("brands[id=3].brand").unwrap(),
            JsonPath::root().field("brands").find("id", "3").field("brand")
        );
        assert_eq!(
            JsonPath::parse("products[*].category.usertype.usertype").unwrap(),
            JsonPath::root()
                .field("products")
                .each()
                .field("category")
                .field("usertype")
                .field("usertype")
        );
        assert_eq!(
            JsonPath::parse("users[email=\"k.h@example.com\"].name").unwrap(),
            JsonPath::root()
                .field("users")
                .find("email", "k.h@example.com")
                .field("name")
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(JsonPath::parse("user.").is_err());
        assert!(JsonPath::parse(".user").is_err());
        assert!(JsonPath::parse("brands[id=3").is_err());
        assert!(JsonPath::parse("brands[id]").is_err());
        assert!(JsonPath::parse("brands[*]name").is_err());
        assert!(JsonPath::parse("brands.  ").is_err());
        assert!(JsonPath::parse("user.  .name").is_err());
    }

    #[test]
    fn test_dollar_is_the_whole_document() {
        assert_eq!(JsonPath::parse("$").unwrap(), JsonPath::root());
        assert_eq!(JsonPath::parse(" $ ").unwrap().to_string(), "$");
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["user.name", "brands[id=3].brand", "products[*].price", "[*].id"] {
            assert_eq!(JsonPath::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_map_text_rewrites_names_and_values() {
        let path = JsonPath::parse("brands[id=${id}].brand").unwrap();
        let rendered = path.map_text(|s| s.replace("${id}", "3"));
        assert_eq!(rendered.to_string(), "brands[id=3].brand");
        assert_eq!(rendered.resolve(&brands()), Resolved::Value(json!("H&M")));
    }

    #[test]
    fn test_find_by_id_matches_numbers_as_text() {
        let path = JsonPath::parse("brands[id=3].brand").unwrap();
        assert_eq!(path.resolve(&brands()), Resolved::Value(json!("H&M")));

        let path = JsonPath::parse("brands[id=99].brand").unwrap();
        assert_eq!(path.resolve(&brands()), Resolved::Missing);
    }

    #[test]
    fn test_each_collects_list() {
        let path = JsonPath::parse("brands[*].id").unwrap();
        assert_eq!(
            path.resolve(&brands()),
            Resolved::List(vec![json!(1), json!(3), json!(4)])
        );
    }

    #[test]
    fn test_missing_field_and_shape_mismatch() {
        assert_eq!(
            JsonPath::parse("user.name").unwrap().resolve(&brands()),
            Resolved::Missing
        );
        assert_eq!(
            JsonPath::parse("responseCode[*]").unwrap().resolve(&brands()),
            Resolved::Missing
        );
        assert!(JsonPath::parse("user")
            .unwrap()
            .resolve(&json!({"user": null}))
            .is_absent());
    }
}
