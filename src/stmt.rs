use crate::expr::Expr;
use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionData {
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintData {
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarData {
    pub name: Token,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockData {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfData {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileData {
    pub condition: Expr,
    pub body: Box<Stmt>,
    /// Set only for a `while` desugared from a `for` loop's clauses. Run
    /// after the body on every iteration, including one that exits via
    /// `continue` — a plain `while` has no increment clause to preserve.
    pub increment: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionData {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnData {
    pub keyword: Token,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassData {
    pub name: Token,
    pub superclass: Option<Expr>,
    pub methods: Vec<FunctionData>,
}

/// A statement node. Unlike expressions, statements never participate in the
/// resolver side-table, so they carry no node identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(ExpressionData),
    Print(PrintData),
    Var(VarData),
    Block(BlockData),
    If(IfData),
    While(WhileData),
    Function(FunctionData),
    Return(ReturnData),
    Class(ClassData),
    Break,
    Continue,
}
