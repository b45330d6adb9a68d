use crate::error::{Result, SymError};
use crate::expr::{BinOp, Expr, Num, UnOp};
use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::take_while;
use nom::character::complete::{alpha1, char, digit1, multispace0};
use nom::combinator::{all_consuming, map, map_opt, opt, recognize};
use nom::error::VerboseError;
use nom::multi::{fold_many0, separated_list0};
use nom::sequence::{delimited, pair, preceded};

type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub fn parse_expr(input: &str) -> Result<Expr> {
    match all_consuming(ws(parse_add_sub))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(e) => Err(SymError::Parse(format!("{e:?}"))),
    }
}

fn parse_add_sub(input: &str) -> PResult<'_, Expr> {
    let (rest, init) = parse_mul_div(input)?;
    fold_many0(
        pair(ws(alt((char('+'), char('-')))), parse_mul_div),
        move || init.clone(),
        |acc, (op, rhs)| {
            let op = if op == '+' { BinOp::Add } else { BinOp::Sub };
            Expr::Binary(op, acc.boxed(), rhs.boxed())
        },
    )(rest)
}

fn parse_mul_div(input: &str) -> PResult<'_, Expr> {
    let (rest, init) = parse_unary(input)?;
    fold_many0(
        pair(ws(alt((char('*'), char('/')))), parse_unary),
        move || init.clone(),
        |acc, (op, rhs)| {
            let op = if op == '*' { BinOp::Mul } else { BinOp::Div };
            Expr::Binary(op, acc.boxed(), rhs.boxed())
        },
    )(rest)
}

fn parse_unary(input: &str) -> PResult<'_, Expr> {
    if let Ok((rest, expr)) = preceded(ws(char('-')), parse_unary)(input) {
        return Ok((rest, negate_literal(expr)));
    }
    if let Ok((rest, expr)) = preceded(ws(char('+')), parse_unary)(input) {
        return Ok((rest, expr));
    }
    parse_primary(input)
}

/// A sign over a numeric literal folds into the literal, so the canonical
/// form of a negative number re-parses to a single node and the fixed-point
/// loop does not oscillate between unary and literal shapes.
fn negate_literal(expr: Expr) -> Expr {
    match expr {
        Expr::Number(n) => {
            let text = match n.text.strip_prefix('-') {
                Some(stripped) => stripped.to_string(),
                None => format!("-{}", n.text),
            };
            Expr::Number(Num {
                value: -n.value,
                text,
            })
        }
        other => Expr::Unary(UnOp::Minus, other.boxed()),
    }
}

fn parse_primary(input: &str) -> PResult<'_, Expr> {
    alt((parse_parens, parse_call, parse_number, parse_identifier))(input)
}

fn parse_parens(input: &str) -> PResult<'_, Expr> {
    delimited(ws(char('(')), parse_add_sub, ws(char(')')))(input)
}

fn parse_call(input: &str) -> PResult<'_, Expr> {
    map(
        pair(
            identifier,
            delimited(
                ws(char('(')),
                separated_list0(ws(char(',')), parse_add_sub),
                ws(char(')')),
            ),
        ),
        |(name, args)| Expr::Call(name.to_string(), args),
    )(input)
}

fn parse_number(input: &str) -> PResult<'_, Expr> {
    map_opt(
        ws(recognize(pair(digit1, opt(pair(char('.'), digit1))))),
        |s: &str| Expr::raw_number(s),
    )(input)
}

fn parse_identifier(input: &str) -> PResult<'_, Expr> {
    map(identifier, |s: &str| Expr::Ident(s.to_string()))(input)
}

fn identifier(input: &str) -> PResult<'_, &str> {
    ws(recognize(pair(
        alpha1,
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    )))(input)
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}
