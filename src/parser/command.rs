// Command parsers for the faceting DSL

use super::ast::{
    AesCommand, Command, LayoutCommand, OptionsCommand, PreprocessCommand, Visual, VisualCommand,
};
use super::lexer::{
    aes_value, bool_literal, identifier, identifier_list, string_literal, usize_literal, value_list,
    ws,
};
use crate::aes::AesValue;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, opt},
    multi::separated_list0,
    sequence::{preceded, separated_pair, terminated},
    IResult,
};

/// Parse a wrap layout
/// Format: wrap() or wrap(cols: [team, __variable__], col_wrap: 3)
pub fn parse_wrap(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("wrap"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("cols:")), identifier_list), WrapArg::Cols),
            map(preceded(ws(tag("col_wrap:")), ws(usize_literal)), WrapArg::ColWrap),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut cols = Vec::new();
    let mut col_wrap = None;
    for arg in args {
        match arg {
            WrapArg::Cols(c) => cols = c,
            WrapArg::ColWrap(n) => col_wrap = Some(n),
        }
    }

    Ok((input, Command::Layout(LayoutCommand::Wrap { cols, col_wrap })))
}

/// Parse a grid layout
/// Format: grid(rows: [chain], cols: [team])
pub fn parse_grid(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("grid"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("rows:")), identifier_list), |r| ("rows", r)),
            map(preceded(ws(tag("cols:")), identifier_list), |c| ("cols", c)),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut rows = Vec::new();
    let mut cols = Vec::new();
    for (key, dims) in args {
        match key {
            "rows" => rows = dims,
            _ => cols = dims,
        }
    }

    Ok((input, Command::Layout(LayoutCommand::Grid { rows, cols })))
}

/// Parse an aesthetic mapping
/// Format: aes(color: [chain]) or aes(color: [chain], values: ["C0", "C1"])
pub fn parse_aes(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("aes"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, (key, dims)) =
        separated_pair(ws(identifier), ws(char(':')), identifier_list)(input)?;
    let (input, values) = opt(preceded(
        ws(char(',')),
        preceded(ws(tag("values:")), value_list),
    ))(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((
        input,
        Command::Aes(AesCommand {
            key,
            dims,
            values: values.unwrap_or_default(),
        }),
    ))
}

/// Parse grid options
/// Format: options(sharex: true, sharey: false, polar: false, squeeze: true)
pub fn parse_options(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("options"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        separated_pair(
            ws(alt((tag("squeeze"), tag("sharex"), tag("sharey"), tag("polar")))),
            ws(char(':')),
            ws(bool_literal),
        ),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut options = OptionsCommand::default();
    for (key, flag) in args {
        match key {
            "squeeze" => options.squeeze = Some(flag),
            "sharex" => options.sharex = Some(flag),
            "sharey" => options.sharey = Some(flag),
            _ => options.polar = Some(flag),
        }
    }

    Ok((input, Command::Options(options)))
}

/// Parse a preprocessing step
/// Format: preprocess() or preprocess(var: mu, dims: [chain, draw], grid_len: 256)
pub fn parse_preprocess(input: &str) -> IResult<&str, Command> {
    let (input, _) = ws(tag("preprocess"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("var:")), ws(identifier)), PreprocessArg::Var),
            map(preceded(ws(tag("dims:")), identifier_list), PreprocessArg::Dims),
            map(preceded(ws(tag("grid_len:")), ws(usize_literal)), PreprocessArg::GridLen),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut cmd = PreprocessCommand {
        var: None,
        dims: vec!["chain".to_string(), "draw".to_string()],
        grid_len: None,
    };
    for arg in args {
        match arg {
            PreprocessArg::Var(v) => cmd.var = Some(v),
            PreprocessArg::Dims(d) => cmd.dims = d,
            PreprocessArg::GridLen(n) => cmd.grid_len = Some(n),
        }
    }

    Ok((input, Command::Preprocess(cmd)))
}

enum WrapArg {
    Cols(Vec<String>),
    ColWrap(usize),
}

enum PreprocessArg {
    Var(String),
    Dims(Vec<String>),
    GridLen(usize),
}

enum VisualArg {
    Label(String),
    Ignore(Vec<String>),
    Preprocessed(bool),
    SubsetInfo(bool),
    Param(String, AesValue),
}

fn visual_name(input: &str) -> IResult<&str, Visual> {
    // point_label before point so the longer name wins
    alt((
        map(tag("kde"), |_| Visual::Kde),
        map(tag("interval"), |_| Visual::Interval),
        map(tag("point_label"), |_| Visual::PointLabel),
        map(tag("point"), |_| Visual::Point),
    ))(input)
}

/// Parse a mapped visual
/// Format: kde(color: "C1", linewidth: 2, ignore: [color], preprocessed: true, label: "dens")
pub fn parse_visual(input: &str) -> IResult<&str, Command> {
    let (input, visual) = ws(terminated(visual_name, ws(char('('))))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("label:")), ws(string_literal)), VisualArg::Label),
            map(preceded(ws(tag("ignore:")), identifier_list), VisualArg::Ignore),
            map(preceded(ws(tag("preprocessed:")), ws(bool_literal)), VisualArg::Preprocessed),
            map(preceded(ws(tag("subset_info:")), ws(bool_literal)), VisualArg::SubsetInfo),
            map(
                separated_pair(ws(identifier), ws(char(':')), ws(aes_value)),
                |(k, v)| VisualArg::Param(k, v),
            ),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut cmd = VisualCommand::new(visual);
    for arg in args {
        match arg {
            VisualArg::Label(l) => cmd.label = Some(l),
            VisualArg::Ignore(keys) => cmd.ignore = keys,
            VisualArg::Preprocessed(flag) => cmd.preprocessed = flag,
            VisualArg::SubsetInfo(flag) => cmd.subset_info = flag,
            VisualArg::Param(key, value) => cmd.params.push((key, value)),
        }
    }

    Ok((input, Command::Visual(cmd)))
}

/// Parse any command
pub fn parse_command(input: &str) -> IResult<&str, Command> {
    alt((
        parse_wrap,
        parse_grid,
        parse_aes,
        parse_options,
        parse_preprocess,
        parse_visual,
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrap() {
        let (_, cmd) = parse_wrap("wrap(cols: [team, __variable__], col_wrap: 3)").unwrap();
        assert_eq!(
            cmd,
            Command::Layout(LayoutCommand::Wrap {
                cols: vec!["team".to_string(), "__variable__".to_string()],
                col_wrap: Some(3),
            })
        );
    }

    #[test]
    fn test_parse_empty_wrap() {
        let (_, cmd) = parse_wrap("wrap()").unwrap();
        assert_eq!(
            cmd,
            Command::Layout(LayoutCommand::Wrap {
                cols: vec![],
                col_wrap: None
            })
        );
    }

    #[test]
    fn test_parse_grid() {
        let (_, cmd) = parse_grid("grid(rows: [chain], cols: [team])").unwrap();
        match cmd {
            Command::Layout(LayoutCommand::Grid { rows, cols }) => {
                assert_eq!(rows, vec!["chain"]);
                assert_eq!(cols, vec!["team"]);
            }
            _ => panic!("Expected Grid layout"),
        }
    }

    #[test]
    fn test_parse_aes() {
        let (_, cmd) = parse_aes(r#"aes(color: [chain], values: ["C0", "C1"])"#).unwrap();
        match cmd {
            Command::Aes(aes) => {
                assert_eq!(aes.key, "color");
                assert_eq!(aes.dims, vec!["chain"]);
                assert_eq!(aes.values, vec![AesValue::from("C0"), AesValue::from("C1")]);
            }
            _ => panic!("Expected Aes command"),
        }
    }

    #[test]
    fn test_parse_aes_without_values() {
        let (_, cmd) = parse_aes("aes(y: [])").unwrap();
        match cmd {
            Command::Aes(aes) => {
                assert!(aes.dims.is_empty());
                assert!(aes.values.is_empty());
            }
            _ => panic!("Expected Aes command"),
        }
    }

    #[test]
    fn test_parse_options() {
        let (_, cmd) = parse_options("options(sharex: true, polar: false)").unwrap();
        assert_eq!(
            cmd,
            Command::Options(OptionsCommand {
                sharex: Some(true),
                polar: Some(false),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_parse_preprocess_defaults() {
        let (_, cmd) = parse_preprocess("preprocess()").unwrap();
        match cmd {
            Command::Preprocess(p) => {
                assert_eq!(p.dims, vec!["chain", "draw"]);
                assert_eq!(p.var, None);
            }
            _ => panic!("Expected Preprocess command"),
        }
    }

    #[test]
    fn test_parse_visual() {
        let (_, cmd) = parse_visual(
            r#"kde(color: "C1", linewidth: 2, ignore: [color], preprocessed: true, label: "dens")"#,
        )
        .unwrap();
        match cmd {
            Command::Visual(v) => {
                assert_eq!(v.visual, Visual::Kde);
                assert_eq!(v.artifact_label(), "dens");
                assert_eq!(v.ignore, vec!["color"]);
                assert!(v.preprocessed);
                assert_eq!(
                    v.params,
                    vec![
                        ("color".to_string(), AesValue::from("C1")),
                        ("linewidth".to_string(), AesValue::Num(2.0)),
                    ]
                );
            }
            _ => panic!("Expected Visual command"),
        }
    }

    #[test]
    fn test_point_label_not_point() {
        let (_, cmd) = parse_command("point_label()").unwrap();
        match cmd {
            Command::Visual(v) => {
                assert_eq!(v.visual, Visual::PointLabel);
                assert_eq!(v.artifact_label(), "point_label");
            }
            _ => panic!("Expected Visual command"),
        }
    }
}
