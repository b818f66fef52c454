mod lexer;

use chumsky::input::ValueInput;
use chumsky::prelude::*;
use log::debug;

use crate::error::ParseError;
use crate::{Function, Parameter, Program, Statement};

pub use crate::parser::lexer::{LineIndex, Span, Spanned, Token, lex, lexer};

type ParserExtra<'tokens, 'src> = extra::Err<Rich<'tokens, Token<'src>, Span>>;

const MAX_EXPECTED: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Report the unexpected token and what would have been accepted.
    pub verbose: bool,
}

pub fn parse(src: &str) -> Result<Program, ParseError> {
    parse_with(src, &ParseOptions::default())
}

pub fn parse_with(src: &str, options: &ParseOptions) -> Result<Program, ParseError> {
    let lines = LineIndex::new(src);
    let tokens = lex(src, &lines)?;
    debug!("lexed {} tokens", tokens.len());

    let eoi = Span::from(src.len()..src.len());
    let prog = program()
        .parse(tokens.as_slice().map(eoi, |(tok, span)| (tok, span)))
        .into_result()
        .map_err(|errors| match errors.first() {
            Some(error) => syntax_error(error, &lines, options),
            None => ParseError {
                pos: lines.position(src.len()),
                span: src.len()..src.len(),
                message: "syntax error".to_owned(),
            },
        })?;

    debug!("parsed {} functions", prog.len());
    Ok(prog)
}

fn syntax_error(
    error: &Rich<'_, Token<'_>, Span>,
    lines: &LineIndex<'_>,
    options: &ParseOptions,
) -> ParseError {
    let span = error.span().into_range();
    let message = if options.verbose {
        let found = error
            .found()
            .map_or_else(|| "end of input".to_owned(), |tok| format!("'{}'", tok));
        let mut expected: Vec<String> = error.expected().map(|pat| pat.to_string()).collect();
        expected.sort();
        expected.dedup();
        expected.truncate(MAX_EXPECTED);

        if expected.is_empty() {
            format!("syntax error: unexpected {}", found)
        } else {
            format!(
                "syntax error: unexpected {}, expecting {}",
                found,
                expected.join(" or ")
            )
        }
    } else {
        "syntax error".to_owned()
    };

    ParseError {
        pos: lines.position(span.end),
        span,
        message,
    }
}

fn ident<'tokens, 'src: 'tokens, I>()
-> impl Parser<'tokens, I, String, ParserExtra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    select! { Token::Ident(name) => name.to_owned() }.labelled("identifier")
}

fn number<'tokens, 'src: 'tokens, I>()
-> impl Parser<'tokens, I, i64, ParserExtra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    select! { Token::Int(num) => num }.labelled("number")
}

fn parameters<'tokens, 'src: 'tokens, I>()
-> impl Parser<'tokens, I, Vec<Parameter>, ParserExtra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    ident()
        .map(Parameter::plain)
        .separated_by(just(Token::Comma))
        .collect::<Vec<Parameter>>()
        .delimited_by(just(Token::LParen), just(Token::RParen))
}

fn statement<'tokens, 'src: 'tokens, I>()
-> impl Parser<'tokens, I, Statement, ParserExtra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    recursive(|stmt| {
        let block = stmt.repeated().at_least(1).collect::<Vec<Statement>>();

        let prefix = choice((
            just(Token::Send)
                .ignore_then(ident())
                .map(|chan| Statement::Send { chan }),
            just(Token::Recv)
                .ignore_then(ident())
                .map(|chan| Statement::Receive { chan }),
            just(Token::Tau).to(Statement::Silent),
        ));

        let new_chan = just(Token::Let)
            .ignore_then(ident())
            .then_ignore(just(Token::Eq))
            .then_ignore(just(Token::NewChan))
            .then(ident())
            .then_ignore(just(Token::Comma))
            .then(number())
            .map(|((name, label), capacity)| Statement::NewChannel {
                name,
                label,
                capacity,
            });

        let close = just(Token::Close)
            .ignore_then(ident())
            .map(|chan| Statement::Close { chan });

        let call = just(Token::Call)
            .ignore_then(ident())
            .then(parameters())
            .map(|(name, params)| Statement::Call { name, params });

        let spawn = just(Token::Spawn)
            .ignore_then(ident())
            .then(parameters())
            .map(|(name, params)| Statement::Spawn { name, params });

        let memory = choice((
            just(Token::LetMem)
                .ignore_then(ident())
                .map(|name| Statement::NewMemory { name }),
            just(Token::Read)
                .ignore_then(ident())
                .map(|name| Statement::MemoryRead { name }),
            just(Token::Write)
                .ignore_then(ident())
                .map(|name| Statement::MemoryWrite { name }),
        ));

        let new_sync = just(Token::LetSync)
            .ignore_then(ident())
            .then(choice((just(Token::Mutex), just(Token::RWMutex))))
            .map(|(name, kind)| match kind {
                Token::RWMutex => Statement::NewRWMutex { name },
                _ => Statement::NewMutex { name },
            });

        let lock = choice((
            just(Token::Lock)
                .ignore_then(ident())
                .map(|name| Statement::MutexLock { name }),
            just(Token::Unlock)
                .ignore_then(ident())
                .map(|name| Statement::MutexUnlock { name }),
            just(Token::RLock)
                .ignore_then(ident())
                .map(|name| Statement::RWMutexReadLock { name }),
            just(Token::RUnlock)
                .ignore_then(ident())
                .map(|name| Statement::RWMutexReadUnlock { name }),
        ));

        let if_ = just(Token::If)
            .ignore_then(block.clone())
            .then_ignore(just(Token::Else))
            .then(block.clone())
            .then_ignore(just(Token::EndIf))
            .map(|(then, else_)| Statement::If { then, else_ });

        let select = just(Token::Select)
            .ignore_then(
                just(Token::Case)
                    .ignore_then(block)
                    .repeated()
                    .collect::<Vec<Vec<Statement>>>(),
            )
            .then_ignore(just(Token::EndSelect))
            .map(|cases| Statement::Select { cases });

        choice((
            prefix, new_chan, close, call, spawn, memory, new_sync, lock, if_, select,
        ))
        .then_ignore(just(Token::Semicolon))
    })
}

fn function<'tokens, 'src: 'tokens, I>()
-> impl Parser<'tokens, I, Function, ParserExtra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    just(Token::Def)
        .ignore_then(ident())
        .then(parameters())
        .then_ignore(just(Token::Colon))
        .then(statement().repeated().at_least(1).collect::<Vec<Statement>>())
        .map(|((name, params), stmts)| Function::with_body(name, params, stmts))
}

fn program<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, Program, ParserExtra<'tokens, 'src>>
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    function()
        .repeated()
        .at_least(1)
        .collect::<Vec<Function>>()
        .then_ignore(end())
        .map(|funcs| {
            let mut prog = Program::new();
            for func in funcs {
                prog.add_function(func);
            }
            prog
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_and_pretty_prints() {
        let prog = parse("   def main(): let ch = newchan T, 0;\n\tsend ch;   ").unwrap();
        assert_eq!(
            prog.to_string(),
            "def main():\n    let ch = newchan T, 0;\n    send ch;\n"
        );
    }

    #[test]
    fn parses_spawn_with_parameters() {
        let src = "def main.main(): let ch = newchan ch, 0; spawn main.sndr(ch); recv ch;\n\
                   \tdef main.sndr(ch): send ch;";
        let prog = parse(src).unwrap();
        assert_eq!(
            prog.to_string(),
            "def main.main():\n    let ch = newchan ch, 0;\n    spawn main.sndr(ch);\n    recv ch;\n\
             def main.sndr(ch):\n    send ch;\n"
        );
    }

    #[test]
    fn parses_memory_statements() {
        let prog = parse("def main(): letmem x; read x; spawn f(); write x;\n    def f(): read x; write x;")
            .unwrap();
        assert_eq!(prog.len(), 2);

        let main = prog.function("main").unwrap();
        assert_eq!(
            main.stmts(),
            &[
                Statement::NewMemory { name: "x".to_owned() },
                Statement::MemoryRead { name: "x".to_owned() },
                Statement::Spawn {
                    name: "f".to_owned(),
                    params: vec![]
                },
                Statement::MemoryWrite { name: "x".to_owned() },
            ]
        );
    }

    #[test]
    fn round_trips_every_construct() {
        let src = "\
-- a comment before the first definition
def main.main():
    let ch = newchan main.t0, 1;
    letsync mu mutex;
    letsync rw rwmutex;
    lock mu;
    unlock mu;
    rlock rw;
    runlock rw;
    letmem x;
    if send ch; call work(ch, x); else tau; endif;
    select
      case recv ch; tau;
      case send ch;
      case tau; spawn work(ch, x);
    endselect;
    close ch;
def work(ch, x):
    read x;
    write x;
    select
    endselect;
    tau;
    tau;
";
        let prog = parse(src).unwrap();
        let want = src.lines().skip(1).collect::<Vec<_>>().join("\n") + "\n";
        assert_eq!(prog.to_string(), want);
    }

    #[test]
    fn collects_every_definition() {
        let prog = parse("def a(): send x; def b(): tau;").unwrap();
        assert_eq!(prog.len(), 2);
        assert_eq!(
            prog.function("a").map(Function::stmts),
            Some(&[Statement::Send { chan: "x".to_owned() }][..])
        );
        assert_eq!(
            prog.function("b").map(Function::stmts),
            Some(&[Statement::Silent][..])
        );

        let prog = parse("def f(a,b): tau;").unwrap();
        assert_eq!(prog.to_string(), "def f(a, b):\n    tau;\n");
    }

    #[test]
    fn duplicate_definitions_keep_the_first() {
        let prog = parse("def f(): send a; def f(): recv b;").unwrap();
        assert_eq!(prog.to_string(), "def f():\n    send a;\n");
    }

    #[test]
    fn reports_position_of_unexpected_token() {
        let err = parse("def main(): send;").unwrap_err();
        assert_eq!(err.to_string(), "Parse failed at 1:17: syntax error");
        assert_eq!(err.span, 16..17);
    }

    #[test]
    fn reports_end_of_input() {
        let err = parse("def main():\n    send x\n").unwrap_err();
        assert_eq!(err.to_string(), "Parse failed at 3:0: syntax error");
    }

    #[test]
    fn verbose_errors_name_the_tokens() {
        let options = ParseOptions { verbose: true };
        let err = parse_with("def main(): send;", &options).unwrap_err();
        assert!(
            err.message.starts_with("syntax error: unexpected ';', expecting "),
            "{}",
            err.message
        );
        assert!(err.message.contains("identifier"), "{}", err.message);

        let err = parse_with("def main():\n  send x", &options).unwrap_err();
        assert!(err.message.contains("unexpected end of input"), "{}", err.message);
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse("def main(): tau; )").unwrap_err();
        assert_eq!(err.pos.line, 1);
        assert_eq!(err.pos.column, 18);
    }

    #[test]
    fn rejects_illegal_characters() {
        let err = parse("def main(): send x; @").unwrap_err();
        assert_eq!(err.to_string(), "Parse failed at 1:21: syntax error");
    }

    #[test]
    fn rejects_input_without_definitions() {
        assert!(parse("").is_err());
        assert!(parse("  -- only a comment\n").is_err());
        assert!(parse("def main():").is_err());
    }
}
