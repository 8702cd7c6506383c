// Lexical building blocks shared by the command parsers

use crate::aes::AesValue;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::{map, map_res, recognize, value},
    multi::{many0_count, separated_list0},
    number::complete::double,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace.
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Identifier: a letter or underscore followed by letters, digits or underscores.
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        String::from,
    )(input)
}

/// Double-quoted string without escapes.
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        String::from,
    )(input)
}

pub fn number_literal(input: &str) -> IResult<&str, f64> {
    double(input)
}

pub fn usize_literal(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>)(input)
}

pub fn bool_literal(input: &str) -> IResult<&str, bool> {
    alt((value(true, tag("true")), value(false, tag("false"))))(input)
}

/// A string, a number, or `none`.
pub fn aes_value(input: &str) -> IResult<&str, AesValue> {
    alt((
        map(string_literal, AesValue::Str),
        value(AesValue::None, tag("none")),
        map(number_literal, AesValue::Num),
    ))(input)
}

/// `[a, b, c]`
pub fn identifier_list(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        ws(char('[')),
        separated_list0(ws(char(',')), ws(identifier)),
        ws(char(']')),
    )(input)
}

/// `["C0", 1.5, none]`
pub fn value_list(input: &str) -> IResult<&str, Vec<AesValue>> {
    delimited(
        ws(char('[')),
        separated_list0(ws(char(',')), ws(aes_value)),
        ws(char(']')),
    )(input)
}
