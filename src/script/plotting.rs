//! The `plt` module: script bindings for the pyplot interface

use super::Raised;
use super::interp::{Args, Interpreter};
use super::value::Value;
use crate::figure::{
    BarOptions, LineOptions, LineStyle, Marker, PieOptions, Scale, ScatterOptions, Tick,
};

const FUNCTIONS: &[&str] = &[
    "figure", "subplot", "subplots", "sca", "plot", "scatter", "bar", "pie", "boxplot", "axhline",
    "axvline", "grid", "colorbar", "title", "suptitle", "xlabel", "ylabel", "xscale", "yscale",
    "xticks", "yticks", "xlim", "ylim", "legend", "text", "show", "close", "gcf",
];

/// Attribute `name` of the `plt` module
pub(crate) fn lookup(name: &str) -> Option<Value> {
    FUNCTIONS
        .iter()
        .copied()
        .find(|f| *f == name)
        .map(|f| Value::Builtin {
            module: Some("plt"),
            name: f,
        })
}

/// Parsed `plot` format string such as `"r--"` or `"o"`
#[derive(Debug, Default, PartialEq)]
pub(crate) struct FormatSpec {
    pub color: Option<String>,
    pub linestyle: Option<LineStyle>,
    pub marker: Option<Marker>,
}

pub(crate) fn parse_format(fmt: &str) -> Result<FormatSpec, Raised> {
    let mut spec = FormatSpec::default();
    let mut rest = fmt;
    while !rest.is_empty() {
        if let Some(style) = ["--", "-.", "-", ":"].iter().find(|s| rest.starts_with(**s)) {
            spec.linestyle = LineStyle::from_code(style);
            rest = &rest[style.len()..];
            continue;
        }
        let Some(c) = rest.chars().next() else { break };
        let code = &rest[..c.len_utf8()];
        if let Some(marker) = Marker::from_code(code) {
            spec.marker = Some(marker);
        } else if "bgrcmykw".contains(c) {
            spec.color = Some(code.to_string());
        } else {
            return Err(Raised::value(format!(
                "'{fmt}' is not a valid format string (unrecognized character '{c}')"
            )));
        }
        rest = &rest[c.len_utf8()..];
    }
    if spec.marker.is_some() && spec.linestyle.is_none() {
        spec.linestyle = Some(LineStyle::None);
    }
    Ok(spec)
}

fn opt_string(args: &Args, pos: usize, name: &str) -> Result<Option<String>, Raised> {
    args.opt(pos, name).map(|v| v.as_str().map(str::to_string)).transpose()
}

fn string_list(v: &Value) -> Vec<String> {
    match v {
        Value::List(items) => items.iter().map(Value::to_string).collect(),
        other => vec![other.to_string()],
    }
}

fn grid_dim(v: Option<&Value>, default: u32) -> Result<u32, Raised> {
    match v {
        Some(v) => {
            let n = v.as_int()?;
            u32::try_from(n).map_err(|_| Raised::value(format!("Number of rows/columns must be a positive integer, not {n}")))
        }
        None => Ok(default),
    }
}

fn figsize(args: &Args) -> Result<Option<(f64, f64)>, Raised> {
    match args.opt(usize::MAX, "figsize") {
        Some(v) => match v.as_f64_list()?.as_slice() {
            [w, h] if *w > 0.0 && *h > 0.0 => Ok(Some((*w, *h))),
            _ => Err(Raised::value("figsize must be a pair of positive numbers")),
        },
        None => Ok(None),
    }
}

/// `(lo, hi)` from `f(lo, hi)` or `f([lo, hi])`
fn limits(name: &str, args: &Args) -> Result<(f64, f64), Raised> {
    match args.positional.as_slice() {
        [Value::List(pair)] => match pair.as_slice() {
            [lo, hi] => Ok((lo.as_f64()?, hi.as_f64()?)),
            _ => Err(Raised::value(format!("{name}() expects a pair of limits"))),
        },
        _ => {
            let lo = args.require(name, 0, "left")?.as_f64()?;
            let hi = args.require(name, 1, "right")?.as_f64()?;
            Ok((lo, hi))
        }
    }
}

fn scale(v: &Value) -> Result<Scale, Raised> {
    let s = v.as_str()?;
    Scale::parse(s).ok_or_else(|| {
        Raised::value(format!(
            "'{s}' is not a valid value for scale; supported values are 'linear', 'log'"
        ))
    })
}

fn ticks(args: &Args, name: &str) -> Result<(Vec<Tick>, Option<Vec<String>>), Raised> {
    args.check(name, 2, &["ticks", "labels"])?;
    let ticks = args
        .require(name, 0, "ticks")?
        .as_f64_list()?
        .into_iter()
        .map(Tick::Value)
        .collect::<Vec<_>>();
    let labels = args.opt(1, "labels").map(string_list);
    if let Some(labels) = &labels {
        if labels.len() != ticks.len() {
            return Err(Raised::value(format!(
                "The number of FixedLocator locations ({}), usually from a call to set_ticks, \
                 does not match the number of labels ({}).",
                ticks.len(),
                labels.len()
            )));
        }
    }
    Ok((ticks, labels))
}

/// Run `plt.<name>`
pub(crate) fn call(interp: &mut Interpreter, name: &str, args: &Args) -> Result<Value, Raised> {
    let plt = interp.pyplot_mut();
    match name {
        "figure" => {
            args.check(name, 1, &["num", "figsize"])?;
            let num = match args.opt(0, "num") {
                Some(v) => Some(u32::try_from(v.as_int()?).map_err(|_| Raised::value("figure number must be positive"))?),
                None => None,
            };
            let n = plt.figure(num, figsize(args)?);
            Ok(Value::Number(n as f64))
        }
        "subplot" => {
            args.check(name, 3, &[])?;
            let (rows, cols, index) = match args.positional.as_slice() {
                [code] => {
                    let code = code.as_int()?;
                    if !(111..=999).contains(&code) {
                        return Err(Raised::value(format!(
                            "Integer subplot specification must be a three-digit number, not {code}"
                        )));
                    }
                    ((code / 100) as u32, (code / 10 % 10) as u32, (code % 10) as u32)
                }
                [r, c, i] => (grid_dim(Some(r), 1)?, grid_dim(Some(c), 1)?, grid_dim(Some(i), 1)?),
                _ => return Err(Raised::type_error("subplot() takes 1 or 3 positional arguments")),
            };
            plt.subplot(rows, cols, index)?;
            Ok(Value::None)
        }
        "subplots" => {
            args.check(name, 2, &["nrows", "ncols", "figsize"])?;
            let rows = grid_dim(args.get(0, "nrows"), 1)?;
            let cols = grid_dim(args.get(1, "ncols"), 1)?;
            let n = plt.subplots(rows, cols, figsize(args)?)?;
            Ok(Value::Number(n as f64))
        }
        "sca" => {
            args.check(name, 1, &["index"])?;
            // 1-based, like subplot numbering
            let index = args.require(name, 0, "index")?.as_int()?;
            if index < 1 {
                return Err(Raised::value(format!("axes index must be at least 1, not {index}")));
            }
            plt.sca(index as usize - 1)?;
            Ok(Value::None)
        }
        "plot" => {
            args.check(name, 3, &["label", "color", "linestyle", "marker"])?;
            let (x, y, fmt) = match args.positional.as_slice() {
                [y] => {
                    let y = y.as_f64_list()?;
                    ((0..y.len()).map(|i| i as f64).collect(), y, None)
                }
                [y, Value::Str(fmt)] => {
                    let y = y.as_f64_list()?;
                    ((0..y.len()).map(|i| i as f64).collect(), y, Some(fmt.as_str()))
                }
                [x, y] => (x.as_f64_list()?, y.as_f64_list()?, None),
                [x, y, fmt] => (x.as_f64_list()?, y.as_f64_list()?, Some(fmt.as_str()?)),
                _ => return Err(Raised::type_error("plot() missing required argument: 'y'")),
            };
            let spec = fmt.map(parse_format).transpose()?.unwrap_or_default();
            let linestyle = match opt_string(args, usize::MAX, "linestyle")? {
                Some(code) => Some(LineStyle::from_code(&code).ok_or_else(|| {
                    Raised::value(format!("'{code}' is not a valid value for ls"))
                })?),
                None => spec.linestyle,
            };
            let marker = match opt_string(args, usize::MAX, "marker")? {
                Some(code) => Some(Marker::from_code(&code).ok_or_else(|| {
                    Raised::value(format!("Unrecognized marker style '{code}'"))
                })?),
                None => spec.marker,
            };
            let opts = LineOptions {
                label: opt_string(args, usize::MAX, "label")?,
                color: opt_string(args, usize::MAX, "color")?.or(spec.color),
                linestyle,
                marker,
            };
            plt.gca().plot(x, y, opts)?;
            Ok(Value::None)
        }
        "scatter" => {
            args.check(name, 2, &["x", "y", "c", "s", "color", "label"])?;
            let x = args.require(name, 0, "x")?.as_f64_list()?;
            let y = args.require(name, 1, "y")?.as_f64_list()?;
            let (color, c) = match args.opt(usize::MAX, "c") {
                Some(Value::Str(s)) => (Some(s.clone()), None),
                Some(v) => (None, Some(v.as_f64_list()?)),
                None => (None, None),
            };
            let opts = ScatterOptions {
                label: opt_string(args, usize::MAX, "label")?,
                color: opt_string(args, usize::MAX, "color")?.or(color),
                c,
                size: args.opt(usize::MAX, "s").map(Value::as_f64).transpose()?,
            };
            plt.gca().scatter(x, y, opts)?;
            Ok(Value::None)
        }
        "bar" => {
            args.check(name, 3, &["x", "height", "width", "label", "color"])?;
            let positions = match args.require(name, 0, "x")? {
                Value::List(items) => items
                    .iter()
                    .map(|v| match v {
                        Value::Str(s) => Ok(Tick::Category(s.clone())),
                        other => other.as_f64().map(Tick::Value),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                Value::Str(s) => vec![Tick::Category(s.clone())],
                scalar => vec![Tick::Value(scalar.as_f64()?)],
            };
            let heights = args.require(name, 1, "height")?.as_f64_list()?;
            let opts = BarOptions {
                label: opt_string(args, usize::MAX, "label")?,
                color: opt_string(args, usize::MAX, "color")?,
                width: args.opt(2, "width").map(Value::as_f64).transpose()?,
            };
            plt.gca().bar(positions, heights, opts)?;
            Ok(Value::None)
        }
        "pie" => {
            args.check(name, 1, &["x", "labels", "autopct", "shadow", "startangle"])?;
            let values = args.require(name, 0, "x")?.as_f64_list()?;
            let opts = PieOptions {
                labels: args.opt(usize::MAX, "labels").map(string_list),
                autopct: opt_string(args, usize::MAX, "autopct")?,
                shadow: args.opt(usize::MAX, "shadow").is_some_and(Value::truthy),
                startangle: args
                    .opt(usize::MAX, "startangle")
                    .map(Value::as_f64)
                    .transpose()?
                    .unwrap_or(0.0),
            };
            plt.gca().pie(values, opts)?;
            Ok(Value::None)
        }
        "boxplot" => {
            args.check(name, 1, &["x", "labels", "tick_labels"])?;
            let datasets = match args.require(name, 0, "x")? {
                Value::List(items) if items.iter().any(|v| matches!(v, Value::List(_))) => items
                    .iter()
                    .map(Value::as_f64_list)
                    .collect::<Result<Vec<_>, _>>()?,
                flat => vec![flat.as_f64_list()?],
            };
            let labels = args
                .opt(usize::MAX, "tick_labels")
                .or_else(|| args.opt(usize::MAX, "labels"))
                .map(string_list);
            plt.gca().boxplot(datasets, labels)?;
            Ok(Value::None)
        }
        "axhline" | "axvline" => {
            let coord = if name == "axhline" { "y" } else { "x" };
            args.check(name, 1, &[coord, "color"])?;
            let at = args.opt(0, coord).map(Value::as_f64).transpose()?.unwrap_or(0.0);
            let color = opt_string(args, usize::MAX, "color")?;
            if name == "axhline" {
                plt.gca().axhline(at, color);
            } else {
                plt.gca().axvline(at, color);
            }
            Ok(Value::None)
        }
        "grid" => {
            args.check(name, 1, &["visible"])?;
            plt.gca().grid = args.get(0, "visible").is_none_or(Value::truthy);
            Ok(Value::None)
        }
        "colorbar" => {
            args.check(name, 0, &[])?;
            let fig = plt.gcf();
            let parent = match fig.current_axes_index() {
                Some(i) => i,
                None => {
                    return Err(Raised::new(
                        crate::errors::ErrorKind::RuntimeError,
                        "No mappable was found to use for colorbar creation.",
                    ));
                }
            };
            fig.add_colorbar(parent)?;
            Ok(Value::None)
        }
        "title" | "xlabel" | "ylabel" | "suptitle" => {
            args.check(name, 1, &["label", "t"])?;
            let text = args
                .get(0, "label")
                .or_else(|| args.keyword("t"))
                .map(Value::to_string)
                .ok_or_else(|| Raised::type_error(format!("{name}() missing required argument: 'label'")))?;
            match name {
                "title" => plt.gca().title = text,
                "xlabel" => plt.gca().xaxis.label = text,
                "ylabel" => plt.gca().yaxis.label = text,
                _ => plt.gcf().suptitle = Some(text),
            }
            Ok(Value::None)
        }
        "xscale" | "yscale" => {
            args.check(name, 1, &["value"])?;
            let s = scale(args.require(name, 0, "value")?)?;
            let axes = plt.gca();
            let axis = if name == "xscale" { &mut axes.xaxis } else { &mut axes.yaxis };
            axis.scale = s;
            Ok(Value::None)
        }
        "xticks" | "yticks" => {
            let (positions, labels) = ticks(args, name)?;
            let axes = plt.gca();
            let axis = if name == "xticks" { &mut axes.xaxis } else { &mut axes.yaxis };
            axis.ticks = Some(positions);
            axis.tick_labels = labels;
            Ok(Value::None)
        }
        "xlim" | "ylim" => {
            args.check(name, 2, &["left", "right"])?;
            let lim = limits(name, args)?;
            let axes = plt.gca();
            let axis = if name == "xlim" { &mut axes.xaxis } else { &mut axes.yaxis };
            axis.limits = Some(lim);
            Ok(Value::None)
        }
        "legend" => {
            args.check(name, 0, &["loc"])?;
            plt.gca().legend = true;
            Ok(Value::None)
        }
        "text" => {
            args.check(name, 3, &["x", "y", "s"])?;
            let x = args.require(name, 0, "x")?.as_f64()?;
            let y = args.require(name, 1, "y")?.as_f64()?;
            let s = args.require(name, 2, "s")?.to_string();
            plt.gca().text(x, y, s);
            Ok(Value::None)
        }
        "show" => {
            args.check(name, 0, &["block"])?;
            plt.show();
            Ok(Value::None)
        }
        "close" => {
            args.check(name, 1, &["fig"])?;
            match args.opt(0, "fig") {
                Some(Value::Str(s)) if s == "all" => plt.close_all(),
                Some(v) => {
                    let n = u32::try_from(v.as_int()?).map_err(|_| Raised::value("figure number must be positive"))?;
                    plt.close(Some(n));
                }
                None => {
                    plt.close(None);
                }
            }
            Ok(Value::None)
        }
        "gcf" => {
            args.check(name, 0, &[])?;
            Ok(Value::Number(plt.gcf().number as f64))
        }
        _ => Err(Raised::new(
            crate::errors::ErrorKind::AttributeError,
            format!("module 'plt' has no attribute '{name}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Artist;
    use crate::intercept::SharedWriter;

    fn run(src: &str) -> Interpreter {
        let mut interp = Interpreter::new(Box::new(SharedWriter::new(Vec::new())));
        interp.run("<user_code>", src).unwrap();
        interp
    }

    #[test]
    fn format_strings() {
        assert_eq!(
            parse_format("r--").unwrap(),
            FormatSpec {
                color: Some("r".into()),
                linestyle: Some(LineStyle::Dashed),
                marker: None
            }
        );
        assert_eq!(parse_format("o").unwrap().linestyle, Some(LineStyle::None));
        assert_eq!(parse_format("-o").unwrap().linestyle, Some(LineStyle::Solid));
        assert!(parse_format("q").is_err());
    }

    #[test]
    fn plot_calls_build_artists() {
        let interp = run(
            "plt.subplot(1, 2, 1)\n\
             plt.plot([1, 2, 3], \"g:\", label = \"a\")\n\
             plt.title(\"left\")\n\
             plt.subplot(122)\n\
             plt.bar([\"x\", \"y\"], [3, 4])\n\
             plt.xlabel(\"Cost (USD)\")\n",
        );
        let fig = interp.pyplot().get_figure(1).unwrap();
        assert_eq!(fig.axes.len(), 2);
        assert_eq!(fig.axes[0].title, "left");
        let Artist::Line2D(line) = &fig.axes[0].artists[0] else {
            panic!("expected a line");
        };
        assert_eq!(line.xdata, vec![0.0, 1.0, 2.0]);
        assert_eq!(line.linestyle, LineStyle::Dotted);
        assert_eq!(line.color, "g");
        assert_eq!(fig.axes[1].xaxis.label, "Cost (USD)");
    }

    #[test]
    fn colorbar_needs_a_mappable() {
        let mut interp = Interpreter::new(Box::new(SharedWriter::new(Vec::new())));
        let err = interp.run("<user_code>", "plt.plot([1, 2])\nplt.colorbar()").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::RuntimeError);

        let interp = run("plt.scatter([1, 2], [3, 4], c = [0.1, 0.9])\nplt.colorbar()");
        assert_eq!(interp.pyplot().get_figure(1).unwrap().axes.len(), 2);
    }

    #[test]
    fn unknown_attribute() {
        let mut interp = Interpreter::new(Box::new(SharedWriter::new(Vec::new())));
        let err = interp.run("<user_code>", "plt.savefig(\"x.png\")").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::AttributeError);
    }
}
