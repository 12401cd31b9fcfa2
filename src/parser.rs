use crate::ast::*;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::lexer::{Lexer, Spanned, Token};
use crate::span::{FileId, Span};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Expected {expected}, found {found}.")]
    Unexpected {
        found: String,
        expected: &'static str,
        span: Span,
    },
    #[error("List fields cannot be optional.")]
    InvalidFieldType { span: Span },
    #[error("Positional arguments must come before keyword arguments.")]
    PositionalAfterKeyword { span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Unexpected { span, .. }
            | ParseError::InvalidFieldType { span }
            | ParseError::PositionalAfterKeyword { span } => *span,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            ParseError::Unexpected { .. } => "Unexpected token",
            ParseError::InvalidFieldType { .. } => "Invalid field type",
            ParseError::PositionalAfterKeyword { .. } => "Invalid argument",
        }
    }

    fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::error(self.summary(), self.to_string(), self.span())
    }
}

type PResult<T> = Result<T, ParseError>;

/// Parses one source file into its top-level declarations.
pub fn parse(input: &str, file: FileId) -> (Vec<Top>, Diagnostics) {
    let mut parser = Parser::new(input, file);
    let tops = parser.parse();
    (tops, parser.into_diagnostics())
}

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    diagnostics: Diagnostics,
    pending_docs: Vec<String>,
}

impl Parser {
    pub fn new(input: &str, file: FileId) -> Self {
        let (tokens, lex_errors) = Lexer::new(input, file).tokenize();
        let mut diagnostics = Diagnostics::new();
        for (err, span) in lex_errors {
            diagnostics.error("Invalid syntax", err.to_string(), span);
        }
        Self {
            tokens,
            pos: 0,
            diagnostics,
            pending_docs: Vec::new(),
        }
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn span(&self) -> Span {
        match self.tokens.get(self.pos).or(self.tokens.last()) {
            Some(t) => t.span,
            None => Span::default(),
        }
    }

    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|p| self.tokens.get(p)) {
            Some(t) => t.span,
            None => self.span(),
        }
    }

    fn advance(&mut self) -> Spanned {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Spanned {
            token: Token::Eof,
            span: self.span(),
        });
        if tok.token != Token::Eof {
            self.pos += 1;
        }
        tok
    }

    fn unexpected<T>(&self, expected: &'static str) -> PResult<T> {
        Err(ParseError::Unexpected {
            found: self.peek().describe(),
            expected,
            span: self.span(),
        })
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> PResult<Span> {
        if *self.peek() == expected {
            Ok(self.advance().span)
        } else {
            self.unexpected(what)
        }
    }

    fn expect_ident(&mut self, what: &'static str) -> PResult<Ident> {
        match self.peek().clone() {
            Token::Ident(name) => {
                let span = self.advance().span;
                Ok(Ident { name, span })
            }
            _ => self.unexpected(what),
        }
    }

    /// IDENT ("." IDENT)*
    fn expect_qualident(&mut self, what: &'static str) -> PResult<Ident> {
        let mut ident = self.expect_ident(what)?;
        while *self.peek() == Token::Dot {
            self.advance();
            let part = self.expect_ident("identifier after '.'")?;
            ident.name.push('.');
            ident.name.push_str(&part.name);
            ident.span = ident.span.to(part.span);
        }
        Ok(ident)
    }

    fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s == name)
    }

    fn skip_newlines(&mut self) {
        while *self.peek() == Token::Newline {
            self.advance();
        }
    }

    /// Skips newlines, collecting doc comments for the next declaration.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek().clone() {
                Token::Newline => {
                    self.advance();
                }
                Token::DocComment(text) => {
                    self.advance();
                    self.pending_docs.push(text);
                }
                _ => break,
            }
        }
    }

    fn take_docs(&mut self) -> Option<String> {
        if self.pending_docs.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending_docs).join("\n"))
        }
    }

    fn report(&mut self, err: ParseError) {
        self.diagnostics.push(err.into_diagnostic());
    }

    /// Number of brackets opened and not yet closed between `from` and the
    /// current position.
    fn open_brackets_since(&self, from: usize) -> usize {
        let mut depth = 0usize;
        for tok in &self.tokens[from.min(self.pos)..self.pos] {
            match tok.token {
                Token::LBrace | Token::LParen | Token::LBracket => depth += 1,
                Token::RBrace | Token::RParen | Token::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
        }
        depth
    }

    /// Recovery inside a body: skip to the end of the current line, or past
    /// the closing bracket of anything opened on it. Stops before the `}`
    /// closing the body.
    fn recover_line(&mut self, line_start: usize) {
        let mut depth = self.open_brackets_since(line_start);
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::Newline if depth == 0 => {
                    self.advance();
                    break;
                }
                Token::RBrace if depth == 0 => break,
                Token::LBrace | Token::LParen | Token::LBracket => {
                    depth += 1;
                    self.advance();
                }
                Token::RBrace | Token::RParen | Token::RBracket => {
                    depth = depth.saturating_sub(1);
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Recovery at top level: skip past the `}` matching the declaration's
    /// opening brace, or to the end of the line when none was opened.
    fn recover_top(&mut self, decl_start: usize) {
        let mut depth = self.open_brackets_since(decl_start);
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::Newline if depth == 0 => {
                    self.advance();
                    break;
                }
                Token::LBrace | Token::LParen | Token::LBracket => {
                    depth += 1;
                    self.advance();
                }
                Token::RBrace | Token::RParen | Token::RBracket => {
                    self.advance();
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    pub fn parse(&mut self) -> Vec<Top> {
        let mut tops = Vec::new();

        loop {
            self.skip_trivia();
            if *self.peek() == Token::Eof {
                break;
            }
            let start = self.pos;
            match self.parse_top() {
                Ok(top) => tops.push(top),
                Err(err) => {
                    self.report(err);
                    self.pending_docs.clear();
                    self.recover_top(start);
                }
            }
        }

        tops
    }

    fn parse_top(&mut self) -> PResult<Top> {
        match self.peek() {
            Token::At => {
                if *self.peek_at(1) == Token::At {
                    return Err(ParseError::Unexpected {
                        found: "'@@'".into(),
                        expected: "declaration or directive",
                        span: self.span(),
                    });
                }
                self.pending_docs.clear();
                self.parse_directive().map(Top::Directive)
            }
            Token::Ident(_) => {
                if self.check_ident("model") && matches!(self.peek_at(1), Token::Ident(_)) {
                    self.parse_model().map(Top::Model)
                } else if self.check_ident("enum") && matches!(self.peek_at(1), Token::Ident(_)) {
                    self.parse_enum().map(Top::Enum)
                } else {
                    self.pending_docs.clear();
                    self.parse_block().map(Top::Block)
                }
            }
            _ => self.unexpected("model, enum, block or directive"),
        }
    }

    fn parse_directive(&mut self) -> PResult<Directive> {
        let start = self.expect(Token::At, "'@'")?;
        let name = self.expect_qualident("directive name")?;
        let args = if *self.peek() == Token::LParen {
            self.parse_args()?
        } else {
            Vec::new()
        };
        Ok(Directive {
            name,
            args,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_model(&mut self) -> PResult<Model> {
        let documentation = self.take_docs();
        let start = self.advance().span; // model
        let name = self.expect_ident("model name")?;
        self.expect(Token::LBrace, "'{'")?;

        let mut fields = Vec::new();
        let mut annotations = Vec::new();

        loop {
            self.skip_trivia();
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => {
                    self.pending_docs.clear();
                    return self.unexpected("'}'");
                }
                _ => {}
            }

            let line_start = self.pos;
            let result = if *self.peek() == Token::At {
                self.pending_docs.clear();
                self.parse_block_annotation().map(|a| annotations.push(a))
            } else {
                self.parse_field().map(|f| fields.push(f))
            };
            let result = result.and_then(|()| self.expect_line_end());
            if let Err(err) = result {
                self.report(err);
                self.pending_docs.clear();
                self.recover_line(line_start);
            }
        }

        Ok(Model {
            name,
            fields,
            annotations,
            documentation,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_enum(&mut self) -> PResult<Enum> {
        let documentation = self.take_docs();
        let start = self.advance().span; // enum
        let name = self.expect_ident("enum name")?;
        self.expect(Token::LBrace, "'{'")?;

        let mut values = Vec::new();
        let mut annotations = Vec::new();

        loop {
            self.skip_trivia();
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => {
                    self.pending_docs.clear();
                    return self.unexpected("'}'");
                }
                _ => {}
            }

            let line_start = self.pos;
            let result = if *self.peek() == Token::At {
                self.pending_docs.clear();
                self.parse_block_annotation().map(|a| annotations.push(a))
            } else {
                self.parse_enum_value().map(|v| values.push(v))
            };
            let result = result.and_then(|()| self.expect_line_end());
            if let Err(err) = result {
                self.report(err);
                self.pending_docs.clear();
                self.recover_line(line_start);
            }
        }

        Ok(Enum {
            name,
            values,
            annotations,
            documentation,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_block(&mut self) -> PResult<Block> {
        let kind = self.expect_ident("declaration kind")?;
        let name = self.expect_ident("block name")?;
        self.expect(Token::LBrace, "'{'")?;

        let mut properties = Vec::new();
        loop {
            self.skip_trivia();
            self.pending_docs.clear();
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => return self.unexpected("'}'"),
                _ => {}
            }

            let line_start = self.pos;
            let result = self
                .parse_property()
                .map(|p| properties.push(p))
                .and_then(|()| self.expect_line_end());
            if let Err(err) = result {
                self.report(err);
                self.recover_line(line_start);
            }
        }

        Ok(Block {
            span: kind.span.to(self.prev_span()),
            kind,
            name,
            properties,
        })
    }

    fn parse_property(&mut self) -> PResult<Property> {
        let key = self.expect_ident("property name")?;
        self.expect(Token::Eq, "'='")?;
        let value = self.parse_expr()?;
        Ok(Property {
            span: key.span.to(value.span()),
            key,
            value,
        })
    }

    /// A body line ends with a newline or the closing `}` of the body.
    fn expect_line_end(&mut self) -> PResult<()> {
        match self.peek() {
            Token::Newline => {
                self.advance();
                Ok(())
            }
            Token::RBrace | Token::Eof => Ok(()),
            _ => self.unexpected("new line"),
        }
    }

    fn parse_field(&mut self) -> PResult<Field> {
        let documentation = self.take_docs();
        let name = self.expect_ident("field name")?;
        let field_type = self.parse_field_type()?;

        let mut annotations = Vec::new();
        while *self.peek() == Token::At {
            if *self.peek_at(1) == Token::At {
                return self.unexpected("field annotation");
            }
            annotations.push(self.parse_annotation()?);
        }

        Ok(Field {
            span: name.span.to(self.prev_span()),
            name,
            field_type,
            annotations,
            documentation,
        })
    }

    fn parse_field_type(&mut self) -> PResult<FieldType> {
        let name = self.expect_qualident("field type")?;
        let mut arity = FieldArity::Required;

        if *self.peek() == Token::LBracket {
            self.advance();
            self.expect(Token::RBracket, "']'")?;
            arity = FieldArity::List;
        }
        if *self.peek() == Token::Question {
            let question = self.advance().span;
            if arity == FieldArity::List {
                return Err(ParseError::InvalidFieldType {
                    span: name.span.to(question),
                });
            }
            arity = FieldArity::Optional;
        }

        Ok(FieldType {
            span: name.span.to(self.prev_span()),
            name,
            arity,
        })
    }

    fn parse_enum_value(&mut self) -> PResult<EnumValue> {
        let documentation = self.take_docs();
        let name = self.expect_ident("enum value")?;

        let mut annotations = Vec::new();
        while *self.peek() == Token::At {
            if *self.peek_at(1) == Token::At {
                return self.unexpected("enum value annotation");
            }
            annotations.push(self.parse_annotation()?);
        }

        Ok(EnumValue {
            span: name.span.to(self.prev_span()),
            name,
            annotations,
            documentation,
        })
    }

    fn parse_annotation(&mut self) -> PResult<Annotation> {
        let start = self.expect(Token::At, "'@'")?;
        let name = self.expect_qualident("annotation name")?;
        let args = if *self.peek() == Token::LParen {
            self.parse_args()?
        } else {
            Vec::new()
        };
        Ok(Annotation {
            name,
            args,
            is_block: false,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_block_annotation(&mut self) -> PResult<Annotation> {
        let start = self.expect(Token::At, "'@@'")?;
        if *self.peek() != Token::At {
            return self.unexpected("'@@' block annotation or field");
        }
        self.advance();
        let mut annotation = self.parse_annotation_body()?;
        annotation.span = start.to(self.prev_span());
        Ok(annotation)
    }

    fn parse_annotation_body(&mut self) -> PResult<Annotation> {
        let name = self.expect_qualident("annotation name")?;
        let args = if *self.peek() == Token::LParen {
            self.parse_args()?
        } else {
            Vec::new()
        };
        Ok(Annotation {
            span: name.span,
            name,
            args,
            is_block: true,
        })
    }

    /// "(" args ")", newlines are insignificant inside.
    fn parse_args(&mut self) -> PResult<Vec<Arg>> {
        self.expect(Token::LParen, "'('")?;
        let mut args: Vec<Arg> = Vec::new();
        let mut seen_keyword = false;

        loop {
            self.skip_newlines();
            if *self.peek() == Token::RParen {
                self.advance();
                break;
            }

            let arg = self.parse_arg()?;
            if arg.name.is_some() {
                seen_keyword = true;
            } else if seen_keyword {
                return Err(ParseError::PositionalAfterKeyword { span: arg.span });
            }
            args.push(arg);

            self.skip_newlines();
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RParen => {
                    self.advance();
                    break;
                }
                _ => return self.unexpected("',' or ')'"),
            }
        }

        Ok(args)
    }

    fn parse_arg(&mut self) -> PResult<Arg> {
        let is_keyword =
            matches!(self.peek(), Token::Ident(_)) && *self.peek_at(1) == Token::Colon;
        if is_keyword {
            let name = self.expect_ident("argument name")?;
            self.advance(); // :
            self.skip_newlines();
            let value = self.parse_expr()?;
            Ok(Arg {
                span: name.span.to(value.span()),
                name: Some(name),
                value,
            })
        } else {
            let value = self.parse_expr()?;
            Ok(Arg {
                span: value.span(),
                name: None,
                value,
            })
        }
    }

    pub fn parse_expr(&mut self) -> PResult<Expr> {
        match self.peek().clone() {
            Token::Num(n) => Ok(Expr::Number(n, self.advance().span)),
            Token::Str(s) => Ok(Expr::Str(s, self.advance().span)),
            Token::Heredoc {
                strip_indent,
                lines,
            } => Ok(Expr::Heredoc {
                strip_indent,
                lines,
                span: self.advance().span,
            }),
            Token::Ident(word)
                if matches!(word.as_str(), "true" | "false" | "null")
                    && !matches!(self.peek_at(1), Token::Dot | Token::LParen) =>
            {
                let span = self.advance().span;
                Ok(match word.as_str() {
                    "true" => Expr::Bool(true, span),
                    "false" => Expr::Bool(false, span),
                    _ => Expr::Null(span),
                })
            }
            Token::Ident(_) => {
                let name = self.expect_qualident("expression")?;
                if *self.peek() == Token::LParen {
                    let args = self.parse_args()?;
                    Ok(Expr::Call {
                        span: name.span.to(self.prev_span()),
                        name,
                        args,
                    })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Token::Dollar => {
                let start = self.advance().span;
                let mut name = self.expect_qualident("variable name")?;
                name.span = start.to(name.span);
                Ok(Expr::Var(name))
            }
            Token::LBracket => self.parse_list(),
            Token::LBrace => self.parse_object(),
            _ => self.unexpected("expression"),
        }
    }

    fn parse_list(&mut self) -> PResult<Expr> {
        let start = self.expect(Token::LBracket, "'['")?;
        let mut items = Vec::new();

        loop {
            self.skip_newlines();
            if *self.peek() == Token::RBracket {
                self.advance();
                break;
            }
            items.push(self.parse_expr()?);
            self.skip_newlines();
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                Token::RBracket => {
                    self.advance();
                    break;
                }
                _ => return self.unexpected("',' or ']'"),
            }
        }

        Ok(Expr::List(items, start.to(self.prev_span())))
    }

    fn parse_object(&mut self) -> PResult<Expr> {
        let start = self.expect(Token::LBrace, "'{'")?;
        let mut entries = Vec::new();

        loop {
            self.skip_newlines();
            if *self.peek() == Token::RBrace {
                self.advance();
                break;
            }
            let key = self.expect_ident("object key")?;
            self.expect(Token::Eq, "'='")?;
            self.skip_newlines();
            let value = self.parse_expr()?;
            entries.push((key, value));
            match self.peek() {
                Token::Comma | Token::Newline => {
                    self.advance();
                }
                Token::RBrace => {
                    self.advance();
                    break;
                }
                _ => return self.unexpected("',', new line or '}'"),
            }
        }

        Ok(Expr::Object(entries, start.to(self.prev_span())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Vec<Top> {
        let (tops, diags) = parse(input, FileId(0));
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        tops
    }

    fn model(top: &Top) -> &Model {
        top.as_model().unwrap()
    }

    #[test]
    fn test_parse_model() {
        let input = r#"
/// A user account.
model User {
    id    int      @id @default(autoincrement())
    email string   @unique
    name  string?
    posts Post[]

    @@map("users")
}
"#;
        let tops = parse_ok(input);
        assert_eq!(tops.len(), 1);
        let user = model(&tops[0]);
        assert_eq!(user.name.name, "User");
        assert_eq!(user.documentation.as_deref(), Some("A user account."));
        assert_eq!(user.fields.len(), 4);
        assert_eq!(user.fields[0].annotations.len(), 2);
        assert_eq!(user.fields[2].arity(), FieldArity::Optional);
        assert_eq!(user.fields[3].arity(), FieldArity::List);
        assert_eq!(user.annotations.len(), 1);
        assert!(user.annotations[0].is_block);
        assert_eq!(user.annotations[0].name.name, "map");
    }

    #[test]
    fn test_parse_enum_and_directive() {
        let input = "@backend(postgres)\n\nenum Role {\n  ADMIN @map(\"admin\")\n  USER\n  @@map(\"roles\")\n}\n";
        let tops = parse_ok(input);
        assert_eq!(tops.len(), 2);
        let directive = tops[0].as_directive().unwrap();
        assert_eq!(directive.name.name, "backend");
        assert_eq!(directive.args.len(), 1);
        let role = tops[1].as_enum().unwrap();
        assert_eq!(role.values.len(), 2);
        assert_eq!(role.values[0].annotations.len(), 1);
        assert_eq!(role.annotations.len(), 1);
    }

    #[test]
    fn test_parse_block() {
        let input = "backend settings {\n  url = \"postgres://localhost\"\n  pool = { max = 5, min = 1 }\n}\n";
        let tops = parse_ok(input);
        let block = tops[0].as_block().unwrap();
        assert_eq!(block.kind.name, "backend");
        assert_eq!(block.name.name, "settings");
        assert_eq!(block.properties.len(), 2);
        assert!(matches!(block.properties[1].value, Expr::Object(ref entries, _) if entries.len() == 2));
    }

    #[test]
    fn test_parse_args_and_exprs() {
        let input = r#"model Post {
    author User @ref(name: "Posts", fields: [authorId(sort: Desc)], references: [id], onDelete: Cascade)
    authorId int @db.Integer
    title string @default($title)
}"#;
        let tops = parse_ok(input);
        let post = model(&tops[0]);
        let r = &post.fields[0].annotations[0];
        assert_eq!(r.name.name, "ref");
        assert_eq!(r.args.len(), 4);
        assert!(r.args.iter().all(|a| a.name.is_some()));
        match &r.args[1].value {
            Expr::List(items, _) => {
                assert!(matches!(&items[0], Expr::Call { name, args, .. } if name.name == "authorId" && args.len() == 1));
            }
            other => panic!("expected list, got {other:?}"),
        }
        assert_eq!(post.fields[1].annotations[0].name.name, "db.Integer");
        assert!(matches!(&post.fields[2].annotations[0].args[0].value, Expr::Var(v) if v.name == "title"));
    }

    #[test]
    fn test_multiline_args() {
        let input = "model A {\n  @@index(\n    fields: [a, b],\n    name: \"idx\"\n  )\n  a int\n  b int\n}\n";
        let tops = parse_ok(input);
        let a = model(&tops[0]);
        assert_eq!(a.annotations[0].args.len(), 2);
        assert_eq!(a.fields.len(), 2);
    }

    #[test]
    fn test_list_optional_is_invalid() {
        let (tops, diags) = parse("model A {\n  tags string[]?\n  id int @id\n}\n", FileId(0));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().summary, "Invalid field type");
        // recovery keeps the rest of the model
        let a = model(&tops[0]);
        assert_eq!(a.fields.len(), 1);
        assert_eq!(a.fields[0].name.name, "id");
    }

    #[test]
    fn test_positional_after_keyword() {
        let (_, diags) = parse("model A {\n  id int @id(name: \"x\", \"y\")\n}\n", FileId(0));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().summary, "Invalid argument");
    }

    #[test]
    fn test_one_bad_line_one_diagnostic() {
        let input = "model A {\n  id int @id(\n    = broken\n  )\n  name string\n}\nmodel B {\n  id int @id\n}\n";
        let (tops, diags) = parse(input, FileId(0));
        assert_eq!(diags.len(), 1);
        assert_eq!(tops.len(), 2);
        let a = model(&tops[0]);
        assert_eq!(a.fields.len(), 1);
        assert_eq!(a.fields[0].name.name, "name");
    }

    #[test]
    fn test_top_level_recovery() {
        let input = "model {\n  id int\n}\nmodel B {\n  id int @id\n}\n";
        let (tops, diags) = parse(input, FileId(0));
        assert_eq!(diags.len(), 1);
        assert_eq!(tops.len(), 1);
        assert_eq!(model(&tops[0]).name.name, "B");
    }

    #[test]
    fn test_lexer_errors_reach_diagnostics() {
        let mut parser = Parser::new("model A {\n  id int @map(\"a)\n}\n", FileId(0));
        parser.parse();
        let diags = parser.into_diagnostics();
        assert!(
            diags
                .with_summary("Invalid syntax")
                .any(|d| d.detail == "Unterminated string"),
            "{diags:?}"
        );
    }

    #[test]
    fn test_heredoc_property() {
        let input = "query q {\n  sql = <<-EOT\n    SELECT 1\n  EOT\n}\n";
        let tops = parse_ok(input);
        let block = tops[0].as_block().unwrap();
        assert!(matches!(block.properties[0].value, Expr::Heredoc { strip_indent: true, .. }));
    }
}
