use std::fmt;

/// Package ecosystems whose dependencies can be queried by presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ecosystem {
    Npm,
    Pip,
    Go,
    Cargo,
    Composer,
    Gem,
    Pub,
    Maven,
    Gradle,
    Nuget,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 10] = [
        Ecosystem::Npm,
        Ecosystem::Pip,
        Ecosystem::Go,
        Ecosystem::Cargo,
        Ecosystem::Composer,
        Ecosystem::Gem,
        Ecosystem::Pub,
        Ecosystem::Maven,
        Ecosystem::Gradle,
        Ecosystem::Nuget,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pip => "pip",
            Ecosystem::Go => "go",
            Ecosystem::Cargo => "cargo",
            Ecosystem::Composer => "composer",
            Ecosystem::Gem => "gem",
            Ecosystem::Pub => "pub",
            Ecosystem::Maven => "maven",
            Ecosystem::Gradle => "gradle",
            Ecosystem::Nuget => "nuget",
        }
    }
}

/// The part of a fact before the first `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Presence of a dependency in an ecosystem's manifest.
    Dependency(Ecosystem),
    /// Existence of a file (glob patterns allowed).
    File,
    /// Existence of a directory (glob patterns allowed).
    Dir,
    /// Scalar field of the project's package manifest.
    Pkg,
    /// User-defined variable from configuration.
    Var,
    /// Anything else. Rejected at evaluation time.
    Unknown(String),
}

impl Namespace {
    pub fn parse(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if let Some(ecosystem) = Ecosystem::ALL.into_iter().find(|e| e.as_str() == lower) {
            return Namespace::Dependency(ecosystem);
        }
        match lower.as_str() {
            "file" => Namespace::File,
            "dir" => Namespace::Dir,
            "pkg" => Namespace::Pkg,
            "var" => Namespace::Var,
            _ => Namespace::Unknown(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Namespace::Dependency(ecosystem) => ecosystem.as_str(),
            Namespace::File => "file",
            Namespace::Dir => "dir",
            Namespace::Pkg => "pkg",
            Namespace::Var => "var",
            Namespace::Unknown(name) => name,
        }
    }

    /// Whether facts in this namespace are scalars that may be compared.
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Namespace::Pkg | Namespace::Var | Namespace::Unknown(_))
    }

    /// Every namespace name the evaluator understands.
    pub fn known() -> impl Iterator<Item = &'static str> + Clone {
        Ecosystem::ALL.iter().map(|e| e.as_str()).chain(["file", "dir", "pkg", "var"])
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespaced fact reference such as `npm:react`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    pub namespace: Namespace,
    pub key: String,
    /// Byte offset of the fact in the expression source.
    pub pos: usize,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.chars().any(|c| c.is_whitespace() || "&|!()=<>\"'".contains(c)) {
            write!(f, "{}:{:?}", self.namespace, self.key)
        } else {
            write!(f, "{}:{}", self.namespace, self.key)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    /// A numeric literal; `text` keeps the source spelling for exact matching.
    Number {
        value: f64,
        text: String,
    },
    Bool(bool),
}

impl Literal {
    /// The literal as text, for string comparison.
    pub fn as_text(&self) -> String {
        match self {
            Literal::String(value) => value.clone(),
            Literal::Number {
                text,
                ..
            } => text.clone(),
            Literal::Bool(value) => value.to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(value) => write!(f, "{value:?}"),
            Literal::Number {
                text,
                ..
            } => f.write_str(text),
            Literal::Bool(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// Truthiness of a fact.
    Fact(Fact),
    Compare {
        fact: Fact,
        op: CmpOp,
        value: Literal,
    },
}

impl Expr {
    /// Every fact referenced by the expression, left to right.
    pub fn facts(&self) -> Vec<&Fact> {
        let mut facts = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Expr::Or(left, right) | Expr::And(left, right) => {
                    stack.push(right);
                    stack.push(left);
                }
                Expr::Not(inner) => stack.push(inner),
                Expr::Fact(fact)
                | Expr::Compare {
                    fact,
                    ..
                } => facts.push(fact),
            }
        }
        facts
    }
}

/// Canonical, fully parenthesized rendering.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Or(left, right) => write!(f, "({left} || {right})"),
            Expr::And(left, right) => write!(f, "({left} && {right})"),
            Expr::Not(inner) => write!(f, "!{inner}"),
            Expr::Fact(fact) => write!(f, "{fact}"),
            Expr::Compare {
                fact,
                op,
                value,
            } => write!(f, "{fact} {} {value}", op.as_str()),
        }
    }
}
