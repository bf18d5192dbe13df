//! XPath 1.0 Functions
//!
//! The core function library:
//!
//! Node Set Functions:
//! - position(), last(), count(), id(), local-name(), namespace-uri(), name()
//!
//! String Functions:
//! - string(), concat(), starts-with(), contains(), substring(),
//!   substring-before(), substring-after(), string-length(),
//!   normalize-space(), translate()
//!
//! Boolean Functions:
//! - boolean(), not(), true(), false(), lang()
//!
//! Number Functions:
//! - number(), sum(), floor(), ceiling(), round()

use super::eval::EvalContext;
use super::value::{string_to_number, XPathValue};
use crate::dom::{node_string_value, DocumentAccess, NodeId};
use crate::error::XPathError;

/// Evaluate a function call
pub fn call<D: DocumentAccess>(
    name: &str,
    args: Vec<XPathValue>,
    ctx: &EvalContext<'_, D>,
) -> Result<XPathValue, XPathError> {
    let doc = ctx.doc;
    let value = match name {
        // Node Set Functions
        "position" => {
            arity(name, &args, 0, 0)?;
            XPathValue::Number(ctx.position as f64)
        }
        "last" => {
            arity(name, &args, 0, 0)?;
            XPathValue::Number(ctx.size as f64)
        }
        "count" => {
            arity(name, &args, 1, 1)?;
            let count = match &args[0] {
                XPathValue::NodeSet(nodes) => nodes.len(),
                XPathValue::StringList(values) => values.len(),
                other => return Err(XPathError::Type(other.type_name())),
            };
            XPathValue::Number(count as f64)
        }
        "id" => {
            arity(name, &args, 1, 1)?;
            XPathValue::NodeSet(fn_id(doc, &args[0]))
        }
        "local-name" => {
            let node = optional_node(name, &args, ctx)?;
            name_string(node.and_then(|n| doc.node_local_name(n)))
        }
        "namespace-uri" => {
            let node = optional_node(name, &args, ctx)?;
            name_string(node.and_then(|n| doc.node_namespace_uri(n)))
        }
        "name" => {
            let node = optional_node(name, &args, ctx)?;
            name_string(node.and_then(|n| doc.node_name(n)))
        }

        // String Functions
        "string" => XPathValue::String(optional_string(name, &args, ctx)?),
        "concat" => {
            arity(name, &args, 2, usize::MAX)?;
            XPathValue::String(args.iter().map(|a| a.to_string_value(doc)).collect())
        }
        "starts-with" => {
            let (s, prefix) = two_strings(name, &args, ctx)?;
            XPathValue::Boolean(s.starts_with(&prefix))
        }
        "contains" => {
            let (s, pattern) = two_strings(name, &args, ctx)?;
            XPathValue::Boolean(s.contains(&pattern))
        }
        "substring-before" => {
            let (s, pattern) = two_strings(name, &args, ctx)?;
            let before = s.find(&pattern).map(|pos| &s[..pos]).unwrap_or("");
            XPathValue::from(before)
        }
        "substring-after" => {
            let (s, pattern) = two_strings(name, &args, ctx)?;
            let after = s
                .find(&pattern)
                .map(|pos| &s[pos + pattern.len()..])
                .unwrap_or("");
            XPathValue::from(after)
        }
        "substring" => {
            arity(name, &args, 2, 3)?;
            let s = args[0].to_string_value(doc);
            let start = args[1].to_number(doc);
            let length = args.get(2).map(|a| a.to_number(doc));
            XPathValue::String(substring(&s, start, length))
        }
        "string-length" => {
            let s = optional_string(name, &args, ctx)?;
            XPathValue::Number(s.chars().count() as f64)
        }
        "normalize-space" => {
            let s = optional_string(name, &args, ctx)?;
            XPathValue::String(s.split_ascii_whitespace().collect::<Vec<_>>().join(" "))
        }
        "translate" => {
            arity(name, &args, 3, 3)?;
            let s = args[0].to_string_value(doc);
            let from: Vec<char> = args[1].to_string_value(doc).chars().collect();
            let to: Vec<char> = args[2].to_string_value(doc).chars().collect();
            let translated = s
                .chars()
                .filter_map(|c| match from.iter().position(|&f| f == c) {
                    Some(pos) => to.get(pos).copied(),
                    None => Some(c),
                })
                .collect();
            XPathValue::String(translated)
        }

        // Boolean Functions
        "boolean" => {
            arity(name, &args, 1, 1)?;
            XPathValue::Boolean(args[0].to_boolean())
        }
        "not" => {
            arity(name, &args, 1, 1)?;
            XPathValue::Boolean(!args[0].to_boolean())
        }
        "true" => {
            arity(name, &args, 0, 0)?;
            XPathValue::Boolean(true)
        }
        "false" => {
            arity(name, &args, 0, 0)?;
            XPathValue::Boolean(false)
        }
        "lang" => {
            arity(name, &args, 1, 1)?;
            let target = args[0].to_string_value(doc);
            XPathValue::Boolean(fn_lang(doc, ctx.node, &target))
        }

        // Number Functions
        "number" => {
            let n = match args.first() {
                Some(arg) => {
                    arity(name, &args, 0, 1)?;
                    arg.to_number(doc)
                }
                None => string_to_number(&node_string_value(doc, ctx.node)),
            };
            XPathValue::Number(n)
        }
        "sum" => {
            arity(name, &args, 1, 1)?;
            let total: f64 = match &args[0] {
                XPathValue::NodeSet(nodes) => nodes
                    .iter()
                    .map(|&n| string_to_number(&node_string_value(doc, n)))
                    .sum(),
                XPathValue::StringList(values) => {
                    values.iter().map(|v| string_to_number(v)).sum()
                }
                other => return Err(XPathError::Type(other.type_name())),
            };
            XPathValue::Number(total)
        }
        "floor" => XPathValue::Number(one_number(name, &args, ctx)?.floor()),
        "ceiling" => XPathValue::Number(one_number(name, &args, ctx)?.ceil()),
        "round" => XPathValue::Number(round(one_number(name, &args, ctx)?)),

        _ => return Err(XPathError::UnknownFunction(name.to_string())),
    };
    Ok(value)
}

fn arity(name: &str, args: &[XPathValue], min: usize, max: usize) -> Result<(), XPathError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = match (min, max) {
        (min, max) if min == max => format!("exactly {}", min),
        (min, usize::MAX) => format!("at least {}", min),
        (min, max) => format!("{} to {}", min, max),
    };
    Err(XPathError::argument(
        name,
        format!("expects {} arguments, got {}", expected, args.len()),
    ))
}

/// First node of the optional node-set argument, or the context node
fn optional_node<D: DocumentAccess>(
    name: &str,
    args: &[XPathValue],
    ctx: &EvalContext<'_, D>,
) -> Result<Option<NodeId>, XPathError> {
    arity(name, args, 0, 1)?;
    match args.first() {
        None => Ok(Some(ctx.node)),
        Some(XPathValue::NodeSet(nodes)) => Ok(nodes.first().copied()),
        Some(other) => Err(XPathError::Type(other.type_name())),
    }
}

fn name_string(name: Option<&str>) -> XPathValue {
    XPathValue::from(name.unwrap_or_default())
}

/// The optional argument as a string, or the context node's string-value
fn optional_string<D: DocumentAccess>(
    name: &str,
    args: &[XPathValue],
    ctx: &EvalContext<'_, D>,
) -> Result<String, XPathError> {
    arity(name, args, 0, 1)?;
    Ok(match args.first() {
        Some(arg) => arg.to_string_value(ctx.doc),
        None => node_string_value(ctx.doc, ctx.node),
    })
}

fn two_strings<D: DocumentAccess>(
    name: &str,
    args: &[XPathValue],
    ctx: &EvalContext<'_, D>,
) -> Result<(String, String), XPathError> {
    arity(name, args, 2, 2)?;
    Ok((args[0].to_string_value(ctx.doc), args[1].to_string_value(ctx.doc)))
}

fn one_number<D: DocumentAccess>(
    name: &str,
    args: &[XPathValue],
    ctx: &EvalContext<'_, D>,
) -> Result<f64, XPathError> {
    arity(name, args, 1, 1)?;
    Ok(args[0].to_number(ctx.doc))
}

/// Elements whose ID is one of the whitespace-separated tokens of the
/// argument; a node-set contributes the tokens of every node
fn fn_id<D: DocumentAccess>(doc: &D, arg: &XPathValue) -> Vec<NodeId> {
    let tokens: Vec<String> = match arg {
        XPathValue::NodeSet(nodes) => nodes.iter().map(|&n| node_string_value(doc, n)).collect(),
        XPathValue::StringList(values) => values.clone(),
        other => vec![other.to_string_value(doc)],
    };
    let mut found: Vec<NodeId> = tokens
        .iter()
        .flat_map(|t| t.split_ascii_whitespace())
        .filter_map(|id| doc.element_by_id(id))
        .collect();
    found.sort_unstable();
    found.dedup();
    found
}

/// `xml:lang` of the nearest ancestor-or-self matches `target` or starts
/// with it followed by `-`, case-insensitively
fn fn_lang<D: DocumentAccess>(doc: &D, context: NodeId, target: &str) -> bool {
    let mut current = Some(context);
    while let Some(node) = current {
        if let Some(lang) = doc.get_attribute(node, "xml:lang") {
            let lang = lang.to_ascii_lowercase();
            let target = target.to_ascii_lowercase();
            return match lang.strip_prefix(&target) {
                Some(rest) => rest.is_empty() || rest.starts_with('-'),
                None => false,
            };
        }
        current = doc.parent_of(node);
    }
    false
}

/// XPath round(): halves go towards positive infinity
fn round(n: f64) -> f64 {
    if !n.is_finite() || n == 0.0 {
        return n;
    }
    let rounded = (n + 0.5).floor();
    if rounded == 0.0 && n < 0.0 {
        -0.0
    } else {
        rounded
    }
}

/// Characters at 1-based positions p with `round(start) <= p` and
/// `p < round(start) + round(length)`
fn substring(s: &str, start: f64, length: Option<f64>) -> String {
    let first = round(start);
    let end = length.map_or(f64::INFINITY, |len| first + round(len));
    s.chars()
        .enumerate()
        .filter(|&(i, _)| {
            let position = (i + 1) as f64;
            position >= first && position < end
        })
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;
    use crate::xpath::evaluate;
    use rstest::rstest;

    fn eval_string(doc: &XmlDocument, xpath: &str) -> String {
        evaluate(doc, xpath).unwrap().to_string_value(doc)
    }

    #[rstest]
    #[case("concat('a', 'b', 'c')", "abc")]
    #[case("substring('12345', 2, 3)", "234")]
    #[case("substring('12345', 1.5, 2.6)", "234")]
    #[case("substring('12345', 0, 3)", "12")]
    #[case("substring('12345', 0 div 0, 3)", "")]
    #[case("substring('12345', -42, 1 div 0)", "12345")]
    #[case("substring-before('1999/04/01', '/')", "1999")]
    #[case("substring-after('1999/04/01', '/')", "04/01")]
    #[case("normalize-space('  a  b \n c ')", "a b c")]
    #[case("translate('bar', 'abc', 'ABC')", "BAr")]
    #[case("translate('--aaa--', 'abc-', 'ABC')", "AAA")]
    #[case("string(round(2.5))", "3")]
    #[case("string(round(-2.5))", "-2")]
    #[case("string(1 div 0)", "Infinity")]
    #[case("name(/*)", "doc")]
    #[case("local-name(//p:item)", "item")]
    #[case("namespace-uri(//p:item)", "urn:p")]
    fn test_string_results(#[case] xpath: &str, #[case] expected: &str) {
        let doc = XmlDocument::parse(b"<doc xmlns:p='urn:p'><p:item/></doc>").unwrap();
        let mut ns = std::collections::HashMap::new();
        ns.insert("p".to_string(), "urn:p".to_string());
        let value = crate::xpath::evaluate_with(&doc, 0, xpath, &ns).unwrap();
        assert_eq!(value.to_string_value(&doc), expected);
    }

    #[test]
    fn test_id_function() {
        let doc = XmlDocument::parse(
            b"<r><a id='x'>A</a><b id='y'>B</b><c>y x missing</c></r>",
        )
        .unwrap();
        assert_eq!(eval_string(&doc, "id('y')"), "B");
        assert_eq!(
            evaluate(&doc, "count(id('x y x'))").unwrap(),
            XPathValue::Number(2.0)
        );
        // node-set argument: tokens come from each node's string-value
        assert_eq!(
            evaluate(&doc, "count(id(//c))").unwrap(),
            XPathValue::Number(2.0)
        );
        assert_eq!(
            evaluate(&doc, "count(id('nope'))").unwrap(),
            XPathValue::Number(0.0)
        );
    }

    #[test]
    fn test_lang() {
        let doc = XmlDocument::parse(
            b"<r xml:lang='en-US'><p/><q xml:lang='de'/></r>",
        )
        .unwrap();
        assert_eq!(
            evaluate(&doc, "count(//*[lang('en')])").unwrap(),
            XPathValue::Number(2.0)
        );
        assert_eq!(
            evaluate(&doc, "count(//*[lang('DE')])").unwrap(),
            XPathValue::Number(1.0)
        );
    }

    #[test]
    fn test_position_and_last() {
        let doc = XmlDocument::parse(b"<r><i>a</i><i>b</i><i>c</i></r>").unwrap();
        assert_eq!(eval_string(&doc, "//i[position() = last() - 1]"), "b");
        assert_eq!(
            evaluate(&doc, "string-length(//i[1])").unwrap(),
            XPathValue::Number(1.0)
        );
    }

    #[test]
    fn test_argument_errors() {
        let doc = XmlDocument::parse(b"<r/>").unwrap();
        assert!(matches!(
            evaluate(&doc, "concat('a')"),
            Err(XPathError::Argument { .. })
        ));
        assert!(matches!(
            evaluate(&doc, "count('a')"),
            Err(XPathError::Type("string"))
        ));
        assert_eq!(
            evaluate(&doc, "frobnicate()"),
            Err(XPathError::UnknownFunction("frobnicate".to_string()))
        );
    }
}
