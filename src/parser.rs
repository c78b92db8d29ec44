use std::mem;

use crate::error::{Diagnostic, ParseError};
use crate::expr::*;
use crate::literal::Literal;
use crate::stmt::*;
use crate::token::{Token, Type};

type ParseResult<T> = Result<T, ParseError>;

/// Returns `true`, and consumes the next token, if it matches any of the
/// given types.
macro_rules! matches {
    ( $self:ident, $( $type:expr ),+ ) => {
        {
            if $( $self.check($type) )||* {
                $self.advance();
                true
            } else {
                false
            }
        }
    }
}

/// Recursive-descent parser over a token stream. Builds the AST in one
/// left-to-right pass; a syntax error does not stop the parse, it throws a
/// diagnostic and resynchronizes at the next statement boundary so later
/// errors in the same source are also reported.
///
/// ```text
/// program    -> declaration* EOF
/// declaration-> classDecl | funDecl | varDecl | statement
/// classDecl  -> "class" IDENT ( "<" IDENT )? "{" function* "}"
/// funDecl    -> "fun" function
/// function   -> IDENT "(" params? ")" block
/// params     -> IDENT ( "," IDENT )*
/// varDecl    -> "var" IDENT ( "=" expression )? ";"
/// statement  -> exprStmt | printStmt | returnStmt | ifStmt
///             | whileStmt | forStmt | breakStmt | continueStmt | block
/// block      -> "{" declaration* "}"
/// expression -> assignment
/// assignment -> ( call "." )? IDENT "=" assignment | logic_or
/// logic_or   -> logic_and ( "or" logic_and )*
/// logic_and  -> equality ( "and" equality )*
/// equality   -> comparison ( ("!=" | "==") comparison )*
/// comparison -> term ( ("<" | "<=" | ">" | ">=") term )*
/// term       -> factor ( ("-" | "+") factor )*
/// factor     -> unary ( ("/" | "*") unary )*
/// unary      -> ("!" | "-") unary | call
/// call       -> primary ( "(" args? ")" | "." IDENT )*
/// args       -> expression ( "," expression )*
/// primary    -> NUMBER | STRING | "true" | "false" | "nil"
///             | "this" | IDENT | "(" expression ")" | "super" "." IDENT
/// ```
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: usize,
    loop_depth: usize,
}

const MAX_ARGS: usize = 255;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, current: 0, next_id: 0, loop_depth: 0 }
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Parses the whole token stream into a program. A failed declaration
    /// is skipped (not replaced with a placeholder); the caller is expected
    /// to check `had_compile_error` and not evaluate a partial tree.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        statements
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().r#type == Type::EOF
    }

    fn check(&self, r#type: Type) -> bool {
        !self.is_at_end() && self.peek().r#type == r#type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn consume(&mut self, r#type: Type, message: &str) -> ParseResult<Token> {
        if self.check(r#type) {
            return Ok(self.advance().clone());
        }

        Err(ParseError { token: self.peek().clone(), message: message.to_string() })
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let statement = if matches!(self, Type::Class) {
            self.class_declaration()
        } else if matches!(self, Type::Fun) {
            self.function("function").map(Stmt::Function)
        } else if matches!(self, Type::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match statement {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                error.throw();
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, "Expect class name.")?;

        let superclass = if matches!(self, Type::Less) {
            self.consume(Type::Identifier, "Expect superclass name.")?;
            Some(Expr::Variable(VariableData { id: self.next_id(), name: self.previous().clone() }))
        } else {
            None
        };

        self.consume(Type::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(Type::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(ClassData { name, superclass, methods }))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Type::Identifier, "Expect variable name.")?;

        let initializer = if matches!(self, Type::Equal) { Some(self.expression()?) } else { None };

        self.consume(Type::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(VarData { name, initializer }))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if matches!(self, Type::For) {
            return self.for_statement();
        }
        if matches!(self, Type::If) {
            return self.if_statement();
        }
        if matches!(self, Type::Print) {
            return self.print_statement();
        }
        if matches!(self, Type::Return) {
            return self.return_statement();
        }
        if matches!(self, Type::While) {
            return self.while_statement();
        }
        if matches!(self, Type::Break) {
            return self.break_statement();
        }
        if matches!(self, Type::Continue) {
            return self.continue_statement();
        }
        if matches!(self, Type::LeftBrace) {
            return Ok(Stmt::Block(BlockData { statements: self.block()? }));
        }

        self.expression_statement()
    }

    fn break_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        self.consume(Type::Semicolon, "Expect ';' after 'break'.")?;

        if self.loop_depth == 0 {
            return Err(ParseError { token: keyword, message: "Cannot use 'break' outside of a loop.".to_string() });
        }

        Ok(Stmt::Break)
    }

    fn continue_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        self.consume(Type::Semicolon, "Expect ';' after 'continue'.")?;

        if self.loop_depth == 0 {
            return Err(ParseError { token: keyword, message: "Cannot use 'continue' outside of a loop.".to_string() });
        }

        Ok(Stmt::Continue)
    }

    /// Desugars into a `while` carrying the increment as its own field
    /// rather than appending it to the body: a `continue` inside the body
    /// exits that statement early via a signal the enclosing block would
    /// otherwise stop at, so an increment appended *inside* the body's
    /// block would never run on that iteration. Keeping it out of the body
    /// lets the `while` executor run it unconditionally after every
    /// iteration, continued or not.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if matches!(self, Type::Semicolon) {
            None
        } else if matches!(self, Type::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(Type::Semicolon) { Some(self.expression()?) } else { None };
        self.consume(Type::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(Type::RightParen) { Some(self.expression()?) } else { None };
        self.consume(Type::RightParen, "Expect ')' after for clauses.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        let mut body = Stmt::While(WhileData {
            condition: condition.unwrap_or(Expr::Literal(LiteralData { id: self.next_id(), value: Literal::Bool(true) })),
            body: Box::new(body?),
            increment,
        });

        if let Some(initializer) = initializer {
            body = Stmt::Block(BlockData { statements: vec![initializer, body] });
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch =
            if matches!(self, Type::Else) { Some(Box::new(self.statement()?)) } else { None };

        Ok(Stmt::If(IfData { condition, then_branch, else_branch }))
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(PrintData { expr }))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if !self.check(Type::Semicolon) { Some(self.expression()?) } else { None };
        self.consume(Type::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(ReturnData { keyword, value }))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Type::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after condition.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        Ok(Stmt::While(WhileData { condition, body: Box::new(body?), increment: None }))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(ExpressionData { expr }))
    }

    fn function(&mut self, kind: &str) -> ParseResult<FunctionData> {
        let name = self.consume(Type::Identifier, &format!("Expect {kind} name."))?;
        self.consume(Type::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    ParseError {
                        token: self.peek().clone(),
                        message: format!("Cannot have more than {MAX_ARGS} parameters."),
                    }
                    .throw();
                }

                params.push(self.consume(Type::Identifier, "Expect parameter name.")?);

                if !matches!(self, Type::Comma) {
                    break;
                }
            }
        }

        self.consume(Type::RightParen, "Expect ')' after parameters.")?;
        self.consume(Type::LeftBrace, &format!("Expect '{{' before {kind} body."))?;

        // A function body starts its own loop nesting: a `break`/`continue`
        // cannot reach through a function boundary to a loop enclosing the
        // function's definition.
        let enclosing_loop_depth = mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = enclosing_loop_depth;

        Ok(FunctionData { name, params, body: body? })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(Type::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(Type::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if matches!(self, Type::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable(data) => {
                    Ok(Expr::Assign(AssignData { id: self.next_id(), name: data.name, value: Box::new(value) }))
                }
                Expr::Get(data) => Ok(Expr::Set(SetData {
                    id: self.next_id(),
                    object: data.object,
                    name: data.name,
                    value: Box::new(value),
                })),
                _ => {
                    ParseError { token: equals, message: "Invalid assignment target.".to_string() }.throw();
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while matches!(self, Type::Or) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical(LogicalData { id: self.next_id(), left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while matches!(self, Type::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical(LogicalData { id: self.next_id(), left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while matches!(self, Type::BangEqual, Type::EqualEqual) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary(BinaryData { id: self.next_id(), left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while matches!(self, Type::Greater, Type::GreaterEqual, Type::Less, Type::LessEqual) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary(BinaryData { id: self.next_id(), left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while matches!(self, Type::Minus, Type::Plus) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary(BinaryData { id: self.next_id(), left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while matches!(self, Type::Slash, Type::Star) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary(BinaryData { id: self.next_id(), left: Box::new(expr), operator, right: Box::new(right) });
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if matches!(self, Type::Bang, Type::Minus) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary(UnaryData { id: self.next_id(), operator, right: Box::new(right) }));
        }

        self.call()
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();

        if !self.check(Type::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    ParseError {
                        token: self.peek().clone(),
                        message: format!("Cannot have more than {MAX_ARGS} arguments."),
                    }
                    .throw();
                }

                arguments.push(self.expression()?);

                if !matches!(self, Type::Comma) {
                    break;
                }
            }
        }

        let paren = self.consume(Type::RightParen, "Expect ')' after arguments.")?;

        Ok(Expr::Call(CallData { id: self.next_id(), callee: Box::new(callee), paren, arguments }))
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if matches!(self, Type::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if matches!(self, Type::Dot) {
                let name = self.consume(Type::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get(GetData { id: self.next_id(), object: Box::new(expr), name });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if matches!(self, Type::False) {
            return Ok(Expr::Literal(LiteralData { id: self.next_id(), value: Literal::Bool(false) }));
        }
        if matches!(self, Type::True) {
            return Ok(Expr::Literal(LiteralData { id: self.next_id(), value: Literal::Bool(true) }));
        }
        if matches!(self, Type::Nil) {
            return Ok(Expr::Literal(LiteralData { id: self.next_id(), value: Literal::Nil }));
        }
        if matches!(self, Type::Number, Type::String) {
            let value = self.previous().literal.clone().expect("number or string token to carry a literal");
            return Ok(Expr::Literal(LiteralData { id: self.next_id(), value }));
        }
        if matches!(self, Type::Super) {
            let keyword = self.previous().clone();
            self.consume(Type::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(Type::Identifier, "Expect superclass method name.")?;
            return Ok(Expr::Super(SuperData { id: self.next_id(), keyword, method }));
        }
        if matches!(self, Type::This) {
            return Ok(Expr::This(ThisData { id: self.next_id(), keyword: self.previous().clone() }));
        }
        if matches!(self, Type::Identifier) {
            return Ok(Expr::Variable(VariableData { id: self.next_id(), name: self.previous().clone() }));
        }
        if matches!(self, Type::LeftParen) {
            let expr = self.expression()?;
            self.consume(Type::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(GroupingData { id: self.next_id(), expr: Box::new(expr) }));
        }

        Err(ParseError { token: self.peek().clone(), message: "Expect expression.".to_string() })
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().r#type == Type::Semicolon {
                return;
            }

            match self.peek().r#type {
                Type::Class | Type::Fun | Type::Var | Type::For | Type::If | Type::While | Type::Print | Type::Return => {
                    return
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        Parser::new(Scanner::new(source).scan_tokens()).parse()
    }

    #[test]
    fn parses_a_print_statement() {
        let statements = parse("print 1 + 2;");
        assert_eq!(statements.len(), 1);
        let Stmt::Print(_) = &statements[0] else { panic!("expected a print statement") };
    }

    #[test]
    fn assigns_left_associatively_as_an_expression() {
        let statements = parse("a = b = 3;");
        let Stmt::Expression(data) = &statements[0] else { panic!("expected an expression statement") };
        let Expr::Assign(_) = &data.expr else { panic!("expected an assignment expression") };
    }

    #[test]
    fn rejects_break_outside_a_loop() {
        crate::error::reset();
        parse("break;");
        assert!(crate::error::had_compile_error());
        crate::error::reset();
    }

    #[test]
    fn accepts_break_inside_a_while_loop() {
        crate::error::reset();
        let statements = parse("while (true) { break; }");
        assert!(!crate::error::had_compile_error());
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn each_literal_gets_a_distinct_node_id() {
        let statements = parse("1; 1;");
        let ids: Vec<NodeId> = statements
            .iter()
            .map(|stmt| {
                let Stmt::Expression(data) = stmt else { panic!("expected an expression statement") };
                data.expr.id()
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
    }
}
