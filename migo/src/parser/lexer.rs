use std::fmt;

use chumsky::prelude::*;

use crate::error::{ParseError, Position};

pub type Span = SimpleSpan;
pub type Spanned<T> = (T, Span);

type LexerExtra<'src> = extra::Err<Rich<'src, char>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token<'src> {
    Colon,
    Semicolon,
    Comma,
    LParen,
    RParen,
    Eq,
    Def,
    Call,
    Spawn,
    Case,
    Close,
    Else,
    EndIf,
    EndSelect,
    If,
    Let,
    NewChan,
    Select,
    Send,
    Recv,
    Tau,
    LetMem,
    Read,
    Write,
    LetSync,
    Mutex,
    RWMutex,
    Lock,
    Unlock,
    RLock,
    RUnlock,
    Ident(&'src str),
    Int(i64),
    /// A character that starts no token.
    Illegal(char),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Colon => ":",
            Self::Semicolon => ";",
            Self::Comma => ",",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Eq => "=",
            Self::Def => "def",
            Self::Call => "call",
            Self::Spawn => "spawn",
            Self::Case => "case",
            Self::Close => "close",
            Self::Else => "else",
            Self::EndIf => "endif",
            Self::EndSelect => "endselect",
            Self::If => "if",
            Self::Let => "let",
            Self::NewChan => "newchan",
            Self::Select => "select",
            Self::Send => "send",
            Self::Recv => "recv",
            Self::Tau => "tau",
            Self::LetMem => "letmem",
            Self::Read => "read",
            Self::Write => "write",
            Self::LetSync => "letsync",
            Self::Mutex => "mutex",
            Self::RWMutex => "rwmutex",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::RLock => "rlock",
            Self::RUnlock => "runlock",
            Self::Ident(name) => *name,
            Self::Int(num) => return write!(f, "{}", num),
            Self::Illegal(c) => return write!(f, "{}", c),
        };
        write!(f, "{}", text)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '#' | '/' | '$')
}

fn keyword_or_ident(word: &str) -> Token<'_> {
    match word {
        "def" => Token::Def,
        "call" => Token::Call,
        "spawn" => Token::Spawn,
        "case" => Token::Case,
        "close" => Token::Close,
        "else" => Token::Else,
        "endif" => Token::EndIf,
        "endselect" => Token::EndSelect,
        "if" => Token::If,
        "let" => Token::Let,
        "newchan" => Token::NewChan,
        "select" => Token::Select,
        "send" => Token::Send,
        "recv" => Token::Recv,
        "tau" => Token::Tau,
        "letmem" => Token::LetMem,
        "read" => Token::Read,
        "write" => Token::Write,
        "letsync" => Token::LetSync,
        "mutex" => Token::Mutex,
        "rwmutex" => Token::RWMutex,
        "lock" => Token::Lock,
        "unlock" => Token::Unlock,
        "rlock" => Token::RLock,
        "runlock" => Token::RUnlock,
        _ => word.parse().map_or(Token::Ident(word), Token::Int),
    }
}

/// Whitespace and `--` comments.
fn trivia<'src>() -> impl Parser<'src, &'src str, (), LexerExtra<'src>> + Clone {
    let comment = just("--").then(none_of('\n').repeated()).ignored();
    let whitespace = one_of(" \t\r\n").ignored();
    choice((comment, whitespace)).repeated()
}

pub fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<Spanned<Token<'src>>>, LexerExtra<'src>> {
    let word = any()
        .filter(|c: &char| is_ident_char(*c))
        .repeated()
        .at_least(1)
        .to_slice()
        .map(keyword_or_ident);

    let punct = choice((
        just(':').to(Token::Colon),
        just(';').to(Token::Semicolon),
        just(',').to(Token::Comma),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('=').to(Token::Eq),
    ));

    let illegal = any().map(Token::Illegal);

    choice((word, punct, illegal))
        .map_with(|tok, e| (tok, e.span()))
        .padded_by(trivia())
        .repeated()
        .collect::<Vec<Spanned<Token<'src>>>>()
        .padded_by(trivia())
        .then_ignore(end())
}

/// Splits `src` into tokens. Characters that start no token become
/// [`Token::Illegal`] and are left for the parser to reject.
pub fn lex<'src>(src: &'src str, lines: &LineIndex<'_>) -> Result<Vec<Spanned<Token<'src>>>, ParseError> {
    lexer().parse(src).into_result().map_err(|errors| {
        let span = errors
            .first()
            .map_or(src.len()..src.len(), |e| e.span().into_range());
        ParseError {
            pos: lines.position(span.end),
            span,
            message: "syntax error".to_owned(),
        }
    })
}

/// Maps byte offsets of a source text to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex<'src> {
    src: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    pub fn new(src: &'src str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { src, line_starts }
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.src.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let start = self.line_starts[line - 1];
        Position {
            line,
            column: self.src[start..offset].chars().count(),
        }
    }
}
