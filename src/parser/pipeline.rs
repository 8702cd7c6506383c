// Pipeline parser for the faceting DSL

use super::ast::{Command, FacetSpec, LayoutCommand, OptionsCommand};
use super::command::parse_command;
use super::lexer::ws;
use nom::{
    bytes::complete::tag,
    combinator::{eof, opt},
    error::{Error, ErrorKind},
    multi::separated_list1,
    IResult,
};

fn merge_options(into: &mut OptionsCommand, from: OptionsCommand) {
    into.squeeze = from.squeeze.or(into.squeeze);
    into.sharex = from.sharex.or(into.sharex);
    into.sharey = from.sharey.or(into.sharey);
    into.polar = from.polar.or(into.polar);
}

/// Parse a complete faceting pipeline
/// Format: command | command | ...
pub fn parse_facet_spec(input: &str) -> IResult<&str, FacetSpec> {
    // If input starts with "|", consume it
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, commands) = separated_list1(ws(tag("|")), parse_command)(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    let mut layout = None;
    let mut aes = Vec::new();
    let mut options = OptionsCommand::default();
    let mut preprocess = None;
    let mut visuals = Vec::new();

    for cmd in commands {
        match cmd {
            Command::Layout(l) => {
                // At most one layout per pipeline
                if layout.replace(l).is_some() {
                    return Err(nom::Err::Failure(Error::new(input, ErrorKind::Verify)));
                }
            }
            Command::Aes(a) => aes.push(a),
            Command::Options(o) => merge_options(&mut options, o),
            Command::Preprocess(p) => preprocess = Some(p),
            Command::Visual(v) => visuals.push(v),
        }
    }

    // Validation: Must have at least one visual
    if visuals.is_empty() {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }

    Ok((
        input,
        FacetSpec {
            layout: layout.unwrap_or(LayoutCommand::Wrap {
                cols: Vec::new(),
                col_wrap: None,
            }),
            aes,
            options,
            preprocess,
            visuals,
        },
    ))
}
