use crate::expr::Expr;
use crate::stmt::{FunctionData, Stmt};

/// Renders an expression or statement tree as a canonical, fully
/// parenthesized S-expression. Used to test that parsing is idempotent:
/// printing a tree and re-parsing the result should produce the same tree.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(data) => data.value.to_string(),
            Expr::Grouping(data) => self.parenthesize("group", &[&data.expr]),
            Expr::Unary(data) => self.parenthesize(&data.operator.lexeme, &[&data.right]),
            Expr::Binary(data) => self.parenthesize(&data.operator.lexeme, &[&data.left, &data.right]),
            Expr::Logical(data) => self.parenthesize(&data.operator.lexeme, &[&data.left, &data.right]),
            Expr::Variable(data) => data.name.lexeme.clone(),
            Expr::Assign(data) => self.parenthesize(&format!("= {}", data.name.lexeme), &[&data.value]),
            Expr::Call(data) => {
                let mut parts: Vec<&Expr> = vec![&data.callee];
                parts.extend(data.arguments.iter());
                self.parenthesize("call", &parts)
            }
            Expr::Get(data) => self.parenthesize(&format!(". {}", data.name.lexeme), &[&data.object]),
            Expr::Set(data) => {
                self.parenthesize(&format!("=. {}", data.name.lexeme), &[&data.object, &data.value])
            }
            Expr::This(_) => "this".to_string(),
            Expr::Super(data) => format!("(super {})", data.method.lexeme),
        }
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(data) => self.parenthesize("expr", &[&data.expr]),
            Stmt::Print(data) => self.parenthesize("print", &[&data.expr]),
            Stmt::Var(data) => match &data.initializer {
                Some(initializer) => format!("(var {} {})", data.name.lexeme, self.print_expr(initializer)),
                None => format!("(var {})", data.name.lexeme),
            },
            Stmt::Block(data) => {
                let body = data.statements.iter().map(|s| self.print_stmt(s)).collect::<Vec<_>>().join(" ");
                format!("(block {body})")
            }
            Stmt::If(data) => {
                let mut string = format!(
                    "(if {} {}",
                    self.print_expr(&data.condition),
                    self.print_stmt(&data.then_branch)
                );
                if let Some(else_branch) = &data.else_branch {
                    string.push(' ');
                    string.push_str(&self.print_stmt(else_branch));
                }
                string.push(')');
                string
            }
            Stmt::While(data) => match &data.increment {
                Some(increment) => format!(
                    "(while {} {} {})",
                    self.print_expr(&data.condition),
                    self.print_stmt(&data.body),
                    self.print_expr(increment)
                ),
                None => format!("(while {} {})", self.print_expr(&data.condition), self.print_stmt(&data.body)),
            },
            Stmt::Function(data) => self.print_function(data),
            Stmt::Return(data) => match &data.value {
                Some(value) => format!("(return {})", self.print_expr(value)),
                None => "(return)".to_string(),
            },
            Stmt::Class(data) => {
                let mut string = format!("(class {}", data.name.lexeme);
                if let Some(Expr::Variable(super_data)) = &data.superclass {
                    string.push_str(&format!(" < {}", super_data.name.lexeme));
                }
                for method in &data.methods {
                    string.push(' ');
                    string.push_str(&self.print_function(method));
                }
                string.push(')');
                string
            }
            Stmt::Break => "(break)".to_string(),
            Stmt::Continue => "(continue)".to_string(),
        }
    }

    fn print_function(&self, function: &FunctionData) -> String {
        let params = function.params.iter().map(|p| p.lexeme.as_str()).collect::<Vec<_>>().join(" ");
        let body = function.body.iter().map(|s| self.print_stmt(s)).collect::<Vec<_>>().join(" ");
        format!("(fun {}({}) {})", function.name.lexeme, params, body)
    }

    fn parenthesize(&self, name: &str, exprs: &[&Expr]) -> String {
        let mut string = String::from("(");
        string.push_str(name);
        for expr in exprs {
            string.push(' ');
            string.push_str(&self.print_expr(expr));
        }
        string.push(')');
        string
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        Parser::new(Scanner::new(source).scan_tokens()).parse()
    }

    #[test]
    fn parenthesizes_a_binary_expression() {
        let statements = parse("1 + 2 * 3;");
        let Stmt::Expression(data) = &statements[0] else { panic!("expected an expression statement") };
        assert_eq!(AstPrinter.print_expr(&data.expr), "(+ 1 (* 2 3))");
    }

    #[test]
    fn prints_a_class_with_a_superclass_and_a_method() {
        let statements = parse("class A < B { greet() { print 1; } }");
        assert_eq!(AstPrinter.print_stmt(&statements[0]), "(class A < B (fun greet() (print 1)))");
    }
}
