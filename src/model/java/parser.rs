use log::trace;

use crate::model::TypeKind;

/// An `import` statement; static imports are not recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported name without the trailing `.*`
    pub name: String,

    /// Whether this is a `.*` import
    pub on_demand: bool,
}

/// A type declaration as written in a compilation unit
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedType {
    pub name: String,
    pub kind: TypeKind,
    pub super_class: Option<String>,
    pub super_interfaces: Vec<String>,
    pub members: Vec<ParsedType>,
    pub line: usize,
}

/// Declarations found in one compilation unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedUnit {
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub types: Vec<ParsedType>,
}

/// Syntax problem that prevents building the declaration tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Symbol(char),
    Literal,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
}

/// Extract package, imports and member type declarations from Java source.
///
/// Only declarations at compilation-unit or type-body level are reported;
/// local and anonymous classes live inside code blocks and are skipped.
pub fn parse_source(content: &str) -> Result<ParsedUnit, ParseError> {
    let tokens = tokenize(content)?;
    trace!("Tokenized {} tokens", tokens.len());
    DeclarationParser::new(&tokens).parse()
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn tokenize(content: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = content.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '\n' {
            line += 1;
            i += 1;
        } else if c.is_whitespace() {
            i += 1;
        } else if c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && next == Some('*') {
            let start = line;
            i += 2;
            loop {
                match chars.get(i) {
                    None => return Err(ParseError::new(start, "unterminated comment")),
                    Some('*') if chars.get(i + 1) == Some(&'/') => {
                        i += 2;
                        break;
                    }
                    Some('\n') => line += 1,
                    Some(_) => {}
                }
                i += 1;
            }
        } else if c == '"' && next == Some('"') && chars.get(i + 2) == Some(&'"') {
            let start = line;
            i += 3;
            loop {
                match chars.get(i) {
                    None => return Err(ParseError::new(start, "unterminated text block")),
                    Some('\\') => i += 1,
                    Some('"') if chars.get(i + 1) == Some(&'"') && chars.get(i + 2) == Some(&'"') => {
                        i += 3;
                        break;
                    }
                    Some('\n') => line += 1,
                    Some(_) => {}
                }
                i += 1;
            }
            tokens.push(Token { kind: TokenKind::Literal, line: start });
        } else if c == '"' || c == '\'' {
            i += 1;
            while i < chars.len() && chars[i] != c && chars[i] != '\n' {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i += 1;
            tokens.push(Token { kind: TokenKind::Literal, line });
        } else if c.is_ascii_digit() {
            while i < chars.len() && (is_ident_part(chars[i]) || chars[i] == '.') {
                i += 1;
            }
            tokens.push(Token { kind: TokenKind::Literal, line });
        } else if is_ident_start(c) {
            let start = i;
            while i < chars.len() && is_ident_part(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(Token { kind: TokenKind::Ident(word), line });
        } else {
            tokens.push(Token { kind: TokenKind::Symbol(c), line });
            i += 1;
        }
    }

    Ok(tokens)
}

struct DeclarationParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    open: Vec<(ParsedType, usize)>,
    unit: ParsedUnit,
}

impl<'a> DeclarationParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            open: Vec::new(),
            unit: ParsedUnit::default(),
        }
    }

    fn parse(mut self) -> Result<ParsedUnit, ParseError> {
        let tokens = self.tokens;
        while self.pos < tokens.len() {
            let token = &tokens[self.pos];
            match &token.kind {
                TokenKind::Symbol('{') => {
                    self.depth += 1;
                    self.pos += 1;
                }
                TokenKind::Symbol('}') => {
                    if self.depth == 0 {
                        return Err(ParseError::new(token.line, "unexpected '}'"));
                    }
                    self.depth -= 1;
                    self.pos += 1;
                    self.close_type_if_ended();
                }
                TokenKind::Ident(word) if self.depth == 0 && word == "package" => {
                    let (name, next) = self.qualified_name(self.pos + 1);
                    self.unit.package = Some(name);
                    self.pos = next;
                }
                TokenKind::Ident(word) if self.depth == 0 && word == "import" => self.import(),
                TokenKind::Symbol('@') => {
                    if self.at_member_level() && self.ident_at(self.pos + 1) == Some("interface") {
                        self.declaration(self.pos + 1, TypeKind::Annotation)?;
                    } else {
                        self.pos = self.skip_annotation(self.pos);
                    }
                }
                TokenKind::Ident(word) => {
                    let kind = TypeKind::from_keyword(word);
                    match kind {
                        Some(kind) if self.at_member_level() && self.starts_declaration(kind) => {
                            self.declaration(self.pos, kind)?;
                        }
                        _ => self.pos += 1,
                    }
                }
                _ => self.pos += 1,
            }
        }

        if let Some((unclosed, _)) = self.open.last() {
            return Err(ParseError::new(
                unclosed.line,
                format!("missing '}}' for type {}", unclosed.name),
            ));
        }
        if self.depth != 0 {
            let line = self.tokens.last().map(|t| t.line).unwrap_or(1);
            return Err(ParseError::new(line, "missing '}'"));
        }

        Ok(self.unit)
    }

    fn ident_at(&self, index: usize) -> Option<&str> {
        match self.tokens.get(index).map(|t| &t.kind) {
            Some(TokenKind::Ident(word)) => Some(word.as_str()),
            _ => None,
        }
    }

    fn symbol_at(&self, index: usize) -> Option<char> {
        match self.tokens.get(index).map(|t| &t.kind) {
            Some(TokenKind::Symbol(c)) => Some(*c),
            _ => None,
        }
    }

    fn at_member_level(&self) -> bool {
        let body_depth = self.open.last().map(|(_, depth)| *depth).unwrap_or(0);
        self.depth == body_depth
    }

    /// Filters out `Foo.class` literals and `record` used as a plain identifier
    fn starts_declaration(&self, kind: TypeKind) -> bool {
        if self.pos > 0 && self.symbol_at(self.pos - 1) == Some('.') {
            return false;
        }
        if self.ident_at(self.pos + 1).is_none() {
            return false;
        }
        match kind {
            TypeKind::Record => matches!(self.symbol_at(self.pos + 2), Some('(') | Some('<')),
            _ => true,
        }
    }

    fn close_type_if_ended(&mut self) {
        let ended = matches!(self.open.last(), Some((_, body_depth)) if *body_depth == self.depth + 1);
        if !ended {
            return;
        }
        if let Some((finished, _)) = self.open.pop() {
            trace!("Closed type {} at depth {}", finished.name, self.depth);
            match self.open.last_mut() {
                Some((enclosing, _)) => enclosing.members.push(finished),
                None => self.unit.types.push(finished),
            }
        }
    }

    fn import(&mut self) {
        let mut index = self.pos + 1;
        let is_static = self.ident_at(index) == Some("static");
        if is_static {
            index += 1;
        }

        let (name, mut next) = self.qualified_name(index);
        let on_demand = self.symbol_at(next) == Some('.') && self.symbol_at(next + 1) == Some('*');
        if on_demand {
            next += 2;
        }
        if !is_static && !name.is_empty() {
            self.unit.imports.push(Import { name, on_demand });
        }
        self.pos = next;
    }

    /// Parse a declaration whose keyword sits at `keyword`, up to and including its opening brace
    fn declaration(&mut self, keyword: usize, kind: TypeKind) -> Result<(), ParseError> {
        let line = self.tokens[keyword].line;
        let name = match self.ident_at(keyword + 1) {
            Some(name) => name.to_string(),
            None => return Err(ParseError::new(line, "expected a type name")),
        };

        let mut declared = ParsedType {
            name,
            kind,
            super_class: None,
            super_interfaces: Vec::new(),
            members: Vec::new(),
            line,
        };

        let mut index = keyword + 2;
        if self.symbol_at(index) == Some('<') {
            index = self.skip_balanced(index, '<', '>');
        }
        if kind == TypeKind::Record && self.symbol_at(index) == Some('(') {
            index = self.skip_balanced(index, '(', ')');
        }

        loop {
            match self.tokens.get(index).map(|t| &t.kind) {
                None => {
                    return Err(ParseError::new(line, format!("incomplete declaration of {}", declared.name)));
                }
                Some(TokenKind::Symbol('{')) => break,
                Some(TokenKind::Ident(word)) if word == "extends" => {
                    let (names, next) = self.type_list(index + 1);
                    index = next;
                    if kind == TypeKind::Interface {
                        declared.super_interfaces.extend(names);
                    } else {
                        declared.super_class = names.into_iter().next();
                    }
                }
                Some(TokenKind::Ident(word)) if word == "implements" => {
                    let (names, next) = self.type_list(index + 1);
                    index = next;
                    declared.super_interfaces.extend(names);
                }
                Some(TokenKind::Ident(word)) if word == "permits" => {
                    let (_, next) = self.type_list(index + 1);
                    index = next;
                }
                Some(_) => index += 1,
            }
        }

        trace!("Found {:?} {} on line {}", kind, declared.name, line);
        self.depth += 1;
        self.open.push((declared, self.depth));
        self.pos = index + 1;
        Ok(())
    }

    /// Comma separated type references; generic arguments and annotations are dropped
    fn type_list(&self, mut index: usize) -> (Vec<String>, usize) {
        let mut names = Vec::new();
        loop {
            while self.symbol_at(index) == Some('@') {
                index = self.skip_annotation(index);
            }

            let mut name = String::new();
            while let Some(segment) = self.ident_at(index) {
                name.push_str(segment);
                index += 1;
                if self.symbol_at(index) == Some('<') {
                    index = self.skip_balanced(index, '<', '>');
                }
                if self.symbol_at(index) == Some('.') && self.ident_at(index + 1).is_some() {
                    name.push('.');
                    index += 1;
                } else {
                    break;
                }
            }
            if !name.is_empty() {
                names.push(name);
            }

            if self.symbol_at(index) == Some(',') {
                index += 1;
            } else {
                return (names, index);
            }
        }
    }

    fn qualified_name(&self, mut index: usize) -> (String, usize) {
        let mut name = String::new();
        while let Some(segment) = self.ident_at(index) {
            name.push_str(segment);
            index += 1;
            if self.symbol_at(index) == Some('.') && self.ident_at(index + 1).is_some() {
                name.push('.');
                index += 1;
            } else {
                break;
            }
        }
        (name, index)
    }

    fn skip_annotation(&self, at: usize) -> usize {
        let (_, mut index) = self.qualified_name(at + 1);
        if self.symbol_at(index) == Some('(') {
            index = self.skip_balanced(index, '(', ')');
        }
        index.max(at + 1)
    }

    /// Index just past the symbol closing the group opened at `at`
    fn skip_balanced(&self, at: usize, open: char, close: char) -> usize {
        let mut level = 0usize;
        let mut index = at;
        while let Some(token) = self.tokens.get(index) {
            match token.kind {
                TokenKind::Symbol(c) if c == open => level += 1,
                TokenKind::Symbol(c) if c == close => {
                    level = level.saturating_sub(1);
                    if level == 0 {
                        return index + 1;
                    }
                }
                TokenKind::Symbol('{') | TokenKind::Symbol(';') if open == '<' => return index,
                _ => {}
            }
            index += 1;
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn names(types: &[ParsedType]) -> Vec<&str> {
        types.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn parses_package_imports_and_supertypes() {
        let unit = parse_source(r#"
            package com.example;

            import android.os.Parcel;
            import android.os.Parcelable;
            import com.example.util.*;
            import static java.util.Objects.requireNonNull;

            public final class Foo extends Base<String> implements Parcelable, Comparable<Foo> {
                private final String name = "class Fake {";
            }
        "#).unwrap();

        assert_eq!(unit.package.as_deref(), Some("com.example"));
        assert_eq!(unit.imports, vec![
            Import { name: "android.os.Parcel".into(), on_demand: false },
            Import { name: "android.os.Parcelable".into(), on_demand: false },
            Import { name: "com.example.util".into(), on_demand: true },
        ]);
        assert_eq!(names(&unit.types), vec!["Foo"]);
        let foo = &unit.types[0];
        assert_eq!(foo.super_class.as_deref(), Some("Base"));
        assert_eq!(foo.super_interfaces, vec!["Parcelable", "Comparable"]);
    }

    #[test]
    fn member_types_nest_but_local_and_anonymous_types_do_not() {
        let unit = parse_source(r#"
            class Outer implements android.os.Parcelable {
                static final Creator<Outer> CREATOR = new Creator<Outer>() {
                    public Outer createFromParcel(Parcel in) { return new Outer(); }
                };

                void work() {
                    class Local implements Runnable { public void run() {} }
                    Class<?> c = Outer.class;
                }

                static class Inner implements android.os.Parcelable {
                    interface Deep extends Marker, Other {}
                }

                enum Mode { A { void f() {} }, B; }
            }

            interface Trailing {}
        "#).unwrap();

        assert_eq!(names(&unit.types), vec!["Outer", "Trailing"]);
        let outer = &unit.types[0];
        assert_eq!(names(&outer.members), vec!["Inner", "Mode"]);
        let inner = &outer.members[0];
        assert_eq!(names(&inner.members), vec!["Deep"]);
        assert_eq!(inner.members[0].kind, TypeKind::Interface);
        assert_eq!(inner.members[0].super_interfaces, vec!["Marker", "Other"]);
        assert_eq!(outer.members[1].kind, TypeKind::Enum);
    }

    #[test_case("record Point(int x, int y) implements Parcelable {}", TypeKind::Record ; "record")]
    #[test_case("@Deprecated public enum Level implements Parcelable { LOW }", TypeKind::Enum ; "annotated enum")]
    #[test_case("class Box<T extends Comparable<T>> implements Parcelable {}", TypeKind::Class ; "generic class")]
    fn recognises_declaration_kinds(source: &str, kind: TypeKind) {
        let unit = parse_source(source).unwrap();
        assert_eq!(unit.types.len(), 1);
        assert_eq!(unit.types[0].kind, kind);
        assert_eq!(unit.types[0].super_interfaces, vec!["Parcelable"]);
    }

    #[test]
    fn annotation_type_declaration() {
        let unit = parse_source("public @interface Marker { String value() default \"}\"; }").unwrap();
        assert_eq!(names(&unit.types), vec!["Marker"]);
        assert_eq!(unit.types[0].kind, TypeKind::Annotation);
    }

    #[test]
    fn record_as_identifier_is_not_a_declaration() {
        let unit = parse_source("class Log { Record record; void f() { record.flush(); } }").unwrap();
        assert_eq!(names(&unit.types), vec!["Log"]);
        assert!(unit.types[0].members.is_empty());
    }

    #[test]
    fn missing_closing_brace_is_reported() {
        let err = parse_source("class Broken {\n  void f() {\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("Broken"));
    }

    #[test]
    fn stray_closing_brace_is_reported() {
        let err = parse_source("class A {}\n}\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn comments_and_text_blocks_are_ignored() {
        let unit = parse_source(r#"
            /* class Hidden { */
            // interface AlsoHidden {
            class Visible {
                String s = """
                    class NotReal {
                    """;
                char c = '{';
            }
        "#).unwrap();
        assert_eq!(names(&unit.types), vec!["Visible"]);
    }
}
