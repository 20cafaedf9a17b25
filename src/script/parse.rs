//! Parse pest pairs into AST nodes

use std::rc::Rc;

use miette::{NamedSource, SourceSpan};
use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::{Pair, Pairs};

use super::ast::*;
use crate::errors::ScriptError;
use crate::{FigScriptParser, Rule};

/// A malformed tree, located by byte offset
struct Fault {
    message: String,
    offset: usize,
    len: usize,
}

impl Fault {
    fn at(pair: &Pair<Rule>, message: impl Into<String>) -> Self {
        let span = pair.as_span();
        Self {
            message: message.into(),
            offset: span.start(),
            len: span.end() - span.start(),
        }
    }
}

type Parsed<T> = Result<T, Fault>;

/// Parse script `source`, named `name` in diagnostics
pub fn parse(name: &str, source: &str) -> Result<Program, ScriptError> {
    let syntax = |message: String, offset: usize, len: usize| {
        let line = source[..offset.min(source.len())].matches('\n').count() + 1;
        ScriptError::Syntax {
            message: format!("{message} ({name}, line {line})"),
            src: NamedSource::new(name, source.to_string()),
            span: SourceSpan::new(offset.into(), len),
            stack: Vec::new(),
        }
    };

    let pairs = FigScriptParser::parse(Rule::program, source).map_err(|e| {
        let (offset, len) = match e.location {
            InputLocation::Pos(p) => (p, 0),
            InputLocation::Span((s, end)) => (s, end - s),
        };
        syntax(e.variant.message().into_owned(), offset, len)
    })?;

    let mut statements = Vec::new();
    for pair in pairs {
        if pair.as_rule() == Rule::program {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::statement {
                    let stmt = parse_statement(inner, name)
                        .map_err(|f| syntax(f.message, f.offset, f.len))?;
                    statements.push(stmt);
                }
            }
        }
    }
    Ok(Program { statements })
}

fn next<'i>(inner: &mut Pairs<'i, Rule>, parent: &Pair<'i, Rule>, what: &str) -> Parsed<Pair<'i, Rule>> {
    inner
        .next()
        .ok_or_else(|| Fault::at(parent, format!("expected {what}")))
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_def | Rule::kw_for | Rule::kw_in | Rule::kw_return | Rule::kw_let
    )
}

fn parse_block(pair: Pair<Rule>, source_name: &str) -> Parsed<Vec<Statement>> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::statement)
        .map(|p| parse_statement(p, source_name))
        .collect()
}

fn parse_statement(pair: Pair<Rule>, source_name: &str) -> Parsed<Statement> {
    let line = pair.as_span().start_pos().line_col().0;
    let stmt = pair.clone();
    let inner = next(&mut pair.into_inner(), &stmt, "statement")?;
    let span_pair = inner.clone();
    let mut parts = inner.clone().into_inner().filter(|p| !is_keyword(p.as_rule()));

    let kind = match inner.as_rule() {
        Rule::def_stmt => {
            let name = parts
                .next()
                .ok_or_else(|| Fault::at(&span_pair, "expected function name"))?
                .as_str()
                .to_string();
            let mut params = Vec::new();
            let mut body = Vec::new();
            for part in parts {
                match part.as_rule() {
                    Rule::params => params = part.into_inner().map(|p| p.as_str().to_string()).collect(),
                    Rule::block => body = parse_block(part, source_name)?,
                    _ => return Err(Fault::at(&part, "unexpected token in def")),
                }
            }
            StatementKind::Def(Rc::new(FunctionDef {
                name,
                params,
                body,
                source: source_name.to_string(),
            }))
        }
        Rule::for_stmt => {
            let var = parts
                .next()
                .ok_or_else(|| Fault::at(&span_pair, "expected loop variable"))?
                .as_str()
                .to_string();
            let iter = parse_expr(
                parts
                    .next()
                    .ok_or_else(|| Fault::at(&span_pair, "expected iterable"))?,
            )?;
            let body = parse_block(
                parts
                    .next()
                    .ok_or_else(|| Fault::at(&span_pair, "expected loop body"))?,
                source_name,
            )?;
            StatementKind::For { var, iter, body }
        }
        Rule::return_stmt => StatementKind::Return(parts.next().map(parse_expr).transpose()?),
        Rule::let_stmt => {
            let name = parts
                .next()
                .ok_or_else(|| Fault::at(&span_pair, "expected name"))?
                .as_str()
                .to_string();
            let value = parse_expr(
                parts
                    .next()
                    .ok_or_else(|| Fault::at(&span_pair, "expected value"))?,
            )?;
            StatementKind::Let { name, value }
        }
        Rule::expr_stmt => StatementKind::Expr(parse_expr(
            parts
                .next()
                .ok_or_else(|| Fault::at(&span_pair, "expected expression"))?,
        )?),
        _ => return Err(Fault::at(&inner, format!("unexpected rule in statement: {:?}", inner.as_rule()))),
    };
    Ok(Statement { line, kind })
}

fn parse_expr(pair: Pair<Rule>) -> Parsed<Expr> {
    match pair.as_rule() {
        Rule::expr | Rule::term => {
            let parent = pair.clone();
            let mut inner = pair.into_inner();
            let mut left = parse_expr(next(&mut inner, &parent, "operand")?)?;
            while let Some(op) = inner.next() {
                let op = parse_binary_op(&op)?;
                let right = parse_expr(next(&mut inner, &parent, "right operand")?)?;
                left = Expr::BinaryOp(Box::new(left), op, Box::new(right));
            }
            Ok(left)
        }
        Rule::unary => {
            let parent = pair.clone();
            let mut negations = 0;
            let mut operand = None;
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::neg => negations += 1,
                    _ => operand = Some(parse_expr(inner)?),
                }
            }
            let mut expr = operand.ok_or_else(|| Fault::at(&parent, "expected operand"))?;
            for _ in 0..negations {
                expr = Expr::Neg(Box::new(expr));
            }
            Ok(expr)
        }
        Rule::power => {
            let parent = pair.clone();
            let mut inner = pair.into_inner();
            let base = parse_expr(next(&mut inner, &parent, "operand")?)?;
            match inner.next() {
                Some(exponent) => Ok(Expr::BinaryOp(
                    Box::new(base),
                    BinaryOp::Pow,
                    Box::new(parse_expr(exponent)?),
                )),
                None => Ok(base),
            }
        }
        Rule::postfix => {
            let parent = pair.clone();
            let mut inner = pair.into_inner();
            let mut expr = parse_expr(next(&mut inner, &parent, "operand")?)?;
            for suffix in inner {
                expr = match suffix.as_rule() {
                    Rule::call_args => Expr::Call {
                        callee: Box::new(expr),
                        args: suffix.into_inner().map(parse_arg).collect::<Parsed<_>>()?,
                    },
                    Rule::index => {
                        let index_pair = suffix.clone();
                        Expr::Index {
                            target: Box::new(expr),
                            index: Box::new(parse_expr(next(&mut suffix.into_inner(), &index_pair, "index")?)?),
                        }
                    }
                    Rule::attr => {
                        let attr_pair = suffix.clone();
                        Expr::Attr {
                            target: Box::new(expr),
                            name: next(&mut suffix.into_inner(), &attr_pair, "attribute name")?
                                .as_str()
                                .to_string(),
                        }
                    }
                    _ => return Err(Fault::at(&suffix, "unexpected suffix")),
                };
            }
            Ok(expr)
        }
        Rule::primary => {
            let parent = pair.clone();
            parse_expr(next(&mut pair.into_inner(), &parent, "value")?)
        }
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|_| Fault::at(&pair, format!("invalid number: {}", pair.as_str()))),
        Rule::string => {
            let raw = pair
                .clone()
                .into_inner()
                .next()
                .map(|p| p.as_str())
                .unwrap_or("");
            Ok(Expr::Str(unescape(raw)))
        }
        Rule::list => Ok(Expr::List(pair.into_inner().map(parse_expr).collect::<Parsed<_>>()?)),
        Rule::boolean => Ok(Expr::Bool(matches!(pair.as_str(), "true" | "True"))),
        Rule::none => Ok(Expr::None),
        Rule::ident => Ok(Expr::Variable(pair.as_str().to_string())),
        _ => Err(Fault::at(&pair, format!("unexpected rule in expression: {:?}", pair.as_rule()))),
    }
}

fn parse_binary_op(pair: &Pair<Rule>) -> Parsed<BinaryOp> {
    match pair.as_str().trim() {
        "+" => Ok(BinaryOp::Add),
        "-" => Ok(BinaryOp::Sub),
        "*" => Ok(BinaryOp::Mul),
        "/" => Ok(BinaryOp::Div),
        "%" => Ok(BinaryOp::Rem),
        s => Err(Fault::at(pair, format!("invalid operator: {s}"))),
    }
}

fn parse_arg(pair: Pair<Rule>) -> Parsed<Arg> {
    let parent = pair.clone();
    let inner = next(&mut pair.into_inner(), &parent, "argument")?;
    match inner.as_rule() {
        Rule::kwarg => {
            let kw = inner.clone();
            let mut parts = inner.into_inner();
            let name = next(&mut parts, &kw, "keyword")?.as_str().to_string();
            let value = parse_expr(next(&mut parts, &kw, "keyword value")?)?;
            Ok(Arg::Keyword(name, value))
        }
        _ => Ok(Arg::Positional(parse_expr(inner)?)),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmts(src: &str) -> Vec<StatementKind> {
        parse("<test>", src)
            .unwrap()
            .statements
            .into_iter()
            .map(|s| s.kind)
            .collect()
    }

    #[test]
    fn precedence() {
        let kinds = stmts("let a = 1 + 2 * -3 ** 2");
        let StatementKind::Let { name, value } = &kinds[0] else {
            panic!("expected a let");
        };
        assert_eq!(name, "a");
        let expected = Expr::BinaryOp(
            Box::new(Expr::Number(1.0)),
            BinaryOp::Add,
            Box::new(Expr::BinaryOp(
                Box::new(Expr::Number(2.0)),
                BinaryOp::Mul,
                Box::new(Expr::Neg(Box::new(Expr::BinaryOp(
                    Box::new(Expr::Number(3.0)),
                    BinaryOp::Pow,
                    Box::new(Expr::Number(2.0)),
                )))),
            )),
        );
        assert_eq!(*value, expected);
    }

    #[test]
    fn calls_with_keywords_and_attributes() {
        let kinds = stmts(r#"plt.plot([1, 2], ys, "r--", label = 'it\'s')"#);
        let StatementKind::Expr(Expr::Call { callee, args }) = &kinds[0] else {
            panic!("expected a call");
        };
        assert_eq!(
            **callee,
            Expr::Attr {
                target: Box::new(Expr::Variable("plt".into())),
                name: "plot".into()
            }
        );
        assert_eq!(args.len(), 4);
        assert_eq!(args[3], Arg::Keyword("label".into(), Expr::Str("it's".into())));
    }

    #[test]
    fn statements_carry_lines() {
        let program = parse(
            "<test>",
            "# setup\nx = 1\n\ndef f(a, b) {\n  return a + b\n}\nfor i in range(3) { print(i) }\n",
        )
        .unwrap();
        let lines: Vec<usize> = program.statements.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 4, 7]);
        let StatementKind::Def(def) = &program.statements[1].kind else {
            panic!("expected def");
        };
        assert_eq!(def.params, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(def.body[0].line, 5);
        assert_eq!(def.source, "<test>");
    }

    #[test]
    fn keywords_prefix_identifiers() {
        let kinds = stmts("letter = 1\nreturned = none\ninput = True");
        assert!(matches!(&kinds[0], StatementKind::Let { name, .. } if name == "letter"));
        assert!(matches!(&kinds[1], StatementKind::Let { name, value: Expr::None } if name == "returned"));
        assert!(matches!(&kinds[2], StatementKind::Let { value: Expr::Bool(true), .. }));
    }

    #[test]
    fn syntax_errors_name_the_line() {
        let err = parse("<user_code>", "x = 1\nplot(1,,2)\n").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::SyntaxError);
        assert!(err.message().ends_with("(<user_code>, line 2)"), "{}", err.message());
    }
}
