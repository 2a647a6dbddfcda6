//! Token kinds for Compiscript source text.
//!
//! Keywords are matched before the identifier regex so they take precedence
//! (logos tries variants in declaration order for equal-length matches).

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum TokenKind {
    #[token("let")]
    Let,
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("function")]
    Function,
    #[token("class")]
    Class,
    #[token("constructor")]
    Constructor,
    #[token("init")]
    Init,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("foreach")]
    Foreach,
    #[token("in")]
    In,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("print")]
    Print,
    #[token("new")]
    New,
    #[token("this")]
    This,
    #[token("super")]
    Super,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("integer")]
    IntegerType,
    #[token("string")]
    StringType,
    #[token("boolean")]
    BooleanType,
    #[token("void")]
    VoidType,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
    #[regex(r"[0-9]+")]
    IntLiteral,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,

    #[token("=")]
    Equals,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("!")]
    Bang,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    Eof,
    Error,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            Let => "'let'",
            Var => "'var'",
            Const => "'const'",
            Function => "'function'",
            Class => "'class'",
            Constructor => "'constructor'",
            Init => "'init'",
            If => "'if'",
            Else => "'else'",
            While => "'while'",
            Do => "'do'",
            For => "'for'",
            Foreach => "'foreach'",
            In => "'in'",
            Switch => "'switch'",
            Case => "'case'",
            Default => "'default'",
            Break => "'break'",
            Continue => "'continue'",
            Return => "'return'",
            Try => "'try'",
            Catch => "'catch'",
            Print => "'print'",
            New => "'new'",
            This => "'this'",
            Super => "'super'",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            IntegerType => "'integer'",
            StringType => "'string'",
            BooleanType => "'boolean'",
            VoidType => "'void'",
            Identifier => "an identifier",
            IntLiteral => "an integer literal",
            StringLiteral => "a string literal",
            LParen => "'('",
            RParen => "')'",
            LBrace => "'{'",
            RBrace => "'}'",
            LBracket => "'['",
            RBracket => "']'",
            Comma => "','",
            Semicolon => "';'",
            Colon => "':'",
            Dot => "'.'",
            Question => "'?'",
            Equals => "'='",
            EqEq => "'=='",
            NotEq => "'!='",
            Bang => "'!'",
            Lt => "'<'",
            Le => "'<='",
            Gt => "'>'",
            Ge => "'>='",
            AndAnd => "'&&'",
            OrOr => "'||'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Eof => "end of file",
            Error => "an invalid token",
        }
    }
}
