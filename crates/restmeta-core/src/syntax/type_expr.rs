//! Type expressions as written in annotated source.
//!
//! A front end hands types over as source text (`Promise<Array<Person>>`);
//! [`TypeExpr::parse`] turns that text into a tree the type resolver can
//! walk. Only the declaration-level subset of the type grammar is
//! supported.

use std::fmt;

use serde::Deserialize;

use crate::Error;

/// Built-in keyword types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    String,
    Number,
    Boolean,
    Void,
    Any,
    Unknown,
    Object,
    Undefined,
    Null,
    Never,
    BigInt,
}

impl Keyword {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Keyword::String,
            "number" => Keyword::Number,
            "boolean" => Keyword::Boolean,
            "void" => Keyword::Void,
            "any" => Keyword::Any,
            "unknown" => Keyword::Unknown,
            "object" => Keyword::Object,
            "undefined" => Keyword::Undefined,
            "null" => Keyword::Null,
            "never" => Keyword::Never,
            "bigint" => Keyword::BigInt,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::String => "string",
            Keyword::Number => "number",
            Keyword::Boolean => "boolean",
            Keyword::Void => "void",
            Keyword::Any => "any",
            Keyword::Unknown => "unknown",
            Keyword::Object => "object",
            Keyword::Undefined => "undefined",
            Keyword::Null => "null",
            Keyword::Never => "never",
            Keyword::BigInt => "bigint",
        }
    }
}

/// Member of an inline object type
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySignature {
    pub name: String,
    pub optional: bool,
    pub type_expr: TypeExpr,
}

/// A parsed type expression
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub enum TypeExpr {
    Keyword(Keyword),
    /// Named type, possibly qualified (`Return.NewResource`), with arguments
    Reference {
        name: String,
        type_arguments: Vec<TypeExpr>,
    },
    Array(Box<TypeExpr>),
    Tuple(Vec<TypeExpr>),
    Union(Vec<TypeExpr>),
    Intersection(Vec<TypeExpr>),
    TypeLiteral(Vec<PropertySignature>),
    Function(Box<TypeExpr>),
    StringLiteral(String),
    NumberLiteral(String),
}

impl TypeExpr {
    /// Parse source text into a type expression.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let tokens = tokenize(text)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            source: text,
        };
        let expr = parser.parse_type()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expr)
    }

    /// Unqualified reference with no type arguments.
    pub fn reference<S: Into<String>>(name: S) -> Self {
        TypeExpr::Reference {
            name: name.into(),
            type_arguments: Vec::new(),
        }
    }

    /// Last segment of a reference name.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Reference { name, .. } => name.rsplit('.').next(),
            _ => None,
        }
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = Error;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        TypeExpr::parse(&text)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Keyword(k) => f.write_str(k.as_str()),
            TypeExpr::Reference {
                name,
                type_arguments,
            } => {
                f.write_str(name)?;
                if !type_arguments.is_empty() {
                    write!(f, "<{}>", join(type_arguments, ", "))?;
                }
                Ok(())
            }
            TypeExpr::Array(element) => match element.as_ref() {
                TypeExpr::Union(_) | TypeExpr::Intersection(_) | TypeExpr::Function(_) => {
                    write!(f, "({})[]", element)
                }
                _ => write!(f, "{}[]", element),
            },
            TypeExpr::Tuple(items) => write!(f, "[{}]", join(items, ", ")),
            TypeExpr::Union(items) => f.write_str(&join(items, " | ")),
            TypeExpr::Intersection(items) => f.write_str(&join(items, " & ")),
            TypeExpr::TypeLiteral(members) => {
                let members: Vec<String> = members
                    .iter()
                    .map(|m| {
                        format!(
                            "{}{}: {}",
                            m.name,
                            if m.optional { "?" } else { "" },
                            m.type_expr
                        )
                    })
                    .collect();
                write!(f, "{{ {} }}", members.join("; "))
            }
            TypeExpr::Function(ret) => write!(f, "(...) => {}", ret),
            TypeExpr::StringLiteral(s) => write!(f, "'{}'", s),
            TypeExpr::NumberLiteral(n) => f.write_str(n),
        }
    }
}

fn join(items: &[TypeExpr], sep: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(String),
    Arrow,
    Punct(char),
}

fn tokenize(text: &str) -> crate::Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' || c == '$' {
                    ident.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(ident));
        } else if c.is_ascii_digit() || c == '-' {
            let mut num = String::new();
            num.push(c);
            chars.next();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() || c == '.' {
                    num.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Num(num));
        } else if c == '\'' || c == '"' || c == '`' {
            chars.next();
            let mut s = String::new();
            loop {
                match chars.next() {
                    Some(q) if q == c => break,
                    Some('\\') => {
                        if let Some(escaped) = chars.next() {
                            s.push(escaped);
                        }
                    }
                    Some(other) => s.push(other),
                    None => {
                        return Err(Error::syntax(format!(
                            "unterminated string literal in type '{}'",
                            text
                        )))
                    }
                }
            }
            tokens.push(Token::Str(s));
        } else if c == '=' {
            chars.next();
            if chars.next() != Some('>') {
                return Err(Error::syntax(format!("expected '=>' in type '{}'", text)));
            }
            tokens.push(Token::Arrow);
        } else if "<>[](){}:;,|&?.".contains(c) {
            chars.next();
            tokens.push(Token::Punct(c));
        } else {
            return Err(Error::syntax(format!(
                "unexpected character '{}' in type '{}'",
                c, text
            )));
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl Parser<'_> {
    fn error(&self, msg: &str) -> Error {
        Error::syntax(format!("{} at token {} in type '{}'", msg, self.pos, self.source))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> crate::Result<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn parse_type(&mut self) -> crate::Result<TypeExpr> {
        self.eat_punct('|');
        let first = self.parse_intersection()?;
        if !self.peek_punct('|') {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat_punct('|') {
            members.push(self.parse_intersection()?);
        }
        Ok(TypeExpr::Union(members))
    }

    fn parse_intersection(&mut self) -> crate::Result<TypeExpr> {
        let first = self.parse_postfix()?;
        if !self.peek_punct('&') {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat_punct('&') {
            members.push(self.parse_postfix()?);
        }
        Ok(TypeExpr::Intersection(members))
    }

    fn parse_postfix(&mut self) -> crate::Result<TypeExpr> {
        let mut expr = self.parse_primary()?;
        while self.peek_punct('[') && self.tokens.get(self.pos + 1) == Some(&Token::Punct(']')) {
            self.pos += 2;
            expr = TypeExpr::Array(Box::new(expr));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> crate::Result<TypeExpr> {
        match self.peek().cloned() {
            Some(Token::Punct('(')) => {
                if self.is_function_start() {
                    self.skip_balanced('(', ')')?;
                    self.pos += 1;
                    return Ok(TypeExpr::Function(Box::new(self.parse_type()?)));
                }
                self.pos += 1;
                let inner = self.parse_type()?;
                self.expect_punct(')')?;
                Ok(inner)
            }
            Some(Token::Punct('{')) => self.parse_type_literal(),
            Some(Token::Punct('[')) => {
                self.pos += 1;
                let mut items = Vec::new();
                while !self.eat_punct(']') {
                    items.push(self.parse_type()?);
                    if !self.eat_punct(',') {
                        self.expect_punct(']')?;
                        break;
                    }
                }
                Ok(TypeExpr::Tuple(items))
            }
            Some(Token::Str(s)) => {
                self.pos += 1;
                Ok(TypeExpr::StringLiteral(s))
            }
            Some(Token::Num(n)) => {
                self.pos += 1;
                Ok(TypeExpr::NumberLiteral(n))
            }
            Some(Token::Ident(first)) => {
                self.pos += 1;
                let mut name = first;
                while self.peek_punct('.') {
                    self.pos += 1;
                    match self.peek().cloned() {
                        Some(Token::Ident(segment)) => {
                            self.pos += 1;
                            name.push('.');
                            name.push_str(&segment);
                        }
                        _ => return Err(self.error("expected identifier after '.'")),
                    }
                }
                let mut type_arguments = Vec::new();
                if self.eat_punct('<') {
                    loop {
                        type_arguments.push(self.parse_type()?);
                        if !self.eat_punct(',') {
                            break;
                        }
                    }
                    self.expect_punct('>')?;
                }
                if type_arguments.is_empty() {
                    if let Some(keyword) = Keyword::from_name(&name) {
                        return Ok(TypeExpr::Keyword(keyword));
                    }
                }
                Ok(TypeExpr::Reference {
                    name,
                    type_arguments,
                })
            }
            _ => Err(self.error("expected a type")),
        }
    }

    fn parse_type_literal(&mut self) -> crate::Result<TypeExpr> {
        self.expect_punct('{')?;
        let mut members = Vec::new();
        loop {
            while self.eat_punct(';') || self.eat_punct(',') {}
            if self.eat_punct('}') {
                break;
            }
            let name = match self.peek().cloned() {
                Some(Token::Ident(n)) | Some(Token::Str(n)) => {
                    self.pos += 1;
                    n
                }
                _ => return Err(self.error("expected member name")),
            };
            let optional = self.eat_punct('?');
            let type_expr = if self.peek_punct('(') {
                // method signature: name(args): ret
                self.skip_balanced('(', ')')?;
                let ret = if self.eat_punct(':') {
                    self.parse_type()?
                } else {
                    TypeExpr::Keyword(Keyword::Any)
                };
                TypeExpr::Function(Box::new(ret))
            } else {
                self.expect_punct(':')?;
                self.parse_type()?
            };
            members.push(PropertySignature {
                name,
                optional,
                type_expr,
            });
        }
        Ok(TypeExpr::TypeLiteral(members))
    }

    /// `(` starts a function type when its matching `)` is followed by `=>`.
    fn is_function_start(&self) -> bool {
        let mut depth = 0usize;
        for (offset, token) in self.tokens[self.pos..].iter().enumerate() {
            match token {
                Token::Punct('(') => depth += 1,
                Token::Punct(')') => {
                    depth -= 1;
                    if depth == 0 {
                        return self.tokens.get(self.pos + offset + 1) == Some(&Token::Arrow);
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn skip_balanced(&mut self, open: char, close: char) -> crate::Result<()> {
        self.expect_punct(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                Some(Token::Punct(c)) if *c == open => depth += 1,
                Some(Token::Punct(c)) if *c == close => depth -= 1,
                Some(_) => {}
                None => return Err(self.error(&format!("unbalanced '{}'", open))),
            }
            self.pos += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(name: &str, args: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::Reference {
            name: name.to_string(),
            type_arguments: args,
        }
    }

    #[test]
    fn test_parse_nested_generics() {
        let expr = TypeExpr::parse("Promise<Return.NewResource<Person>>").unwrap();
        assert_eq!(
            expr,
            reference(
                "Promise",
                vec![reference("Return.NewResource", vec![TypeExpr::reference("Person")])]
            )
        );
        assert_eq!(expr.to_string(), "Promise<Return.NewResource<Person>>");
    }

    #[test]
    fn test_parse_arrays_and_unions() {
        let expr = TypeExpr::parse("string | string[]").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Union(vec![
                TypeExpr::Keyword(Keyword::String),
                TypeExpr::Array(Box::new(TypeExpr::Keyword(Keyword::String))),
            ])
        );
        let expr = TypeExpr::parse("(A | B)[][]").unwrap();
        assert_eq!(expr.to_string(), "(A | B)[][]");
    }

    #[test]
    fn test_parse_type_literal_with_function_member() {
        let expr = TypeExpr::parse(
            "{ greeting: string; profile?: { name: string }, comparePassword: (candidate: string, cb: (err: any) => {}) => void; toJSON(): object }",
        )
        .unwrap();
        let TypeExpr::TypeLiteral(members) = expr else {
            panic!("expected a type literal");
        };
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["greeting", "profile", "comparePassword", "toJSON"]);
        assert!(members[1].optional);
        assert!(matches!(members[2].type_expr, TypeExpr::Function(_)));
        assert!(matches!(members[3].type_expr, TypeExpr::Function(_)));
    }

    #[test]
    fn test_parse_literal_unions_and_tuples() {
        let expr = TypeExpr::parse("'asc' | 'desc'").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Union(vec![
                TypeExpr::StringLiteral("asc".into()),
                TypeExpr::StringLiteral("desc".into()),
            ])
        );
        let expr = TypeExpr::parse("[string, number]").unwrap();
        assert!(matches!(expr, TypeExpr::Tuple(ref items) if items.len() == 2));
    }

    #[test]
    fn test_parse_errors() {
        assert!(TypeExpr::parse("Array<string").is_err());
        assert!(TypeExpr::parse("string string").is_err());
        assert!(TypeExpr::parse("#").is_err());
    }

    #[test]
    fn test_deserialize_from_string() {
        let expr: TypeExpr = serde_json::from_str("\"Array<number>\"").unwrap();
        assert_eq!(expr, reference("Array", vec![TypeExpr::Keyword(Keyword::Number)]));
    }
}
