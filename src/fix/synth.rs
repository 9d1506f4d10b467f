use crate::edit::{Edit, EditError};
use crate::fix::action::{CodeAction, Intent};
use crate::fix::FixError;
use crate::matcher;
use crate::source::{line_start, Node, NodeKind, SourceModel, Span};

/// Lowers a [`CodeAction`]'s intent to concrete edits.
///
/// Pure: the same (model, action) always yields the same edits, sorted by
/// position, all bound to `model`'s snapshot.
pub struct EditSynthesizer;

impl EditSynthesizer {
    pub fn synthesize(model: &SourceModel, action: &CodeAction) -> Result<Vec<Edit>, FixError> {
        if action.snapshot != model.id() {
            return Err(EditError::StaleSnapshot {
                expected: action.snapshot,
                found: model.id(),
            }
            .into());
        }

        let mut edits = match &action.intent {
            Intent::InsertAttribute {
                declaration,
                attribute,
            } => insert_attribute(model, declaration.resolve(model)?, attribute)?,
            Intent::RemoveAttributes { declaration, names } => {
                remove_attributes(model, declaration.resolve(model)?, names)?
            }
            Intent::UseGenericOverload {
                invocation,
                type_argument,
            } => use_generic_overload(model, invocation.resolve(model)?, type_argument)?,
            Intent::ReplaceNode { target, text } => {
                vec![Edit::replace(model, target.resolve(model)?.span(), text.clone())?]
            }
        };

        edits.sort_by_key(|e| (e.span.start, e.span.end));
        for edit in &edits {
            tracing::trace!(
                key = %action.equivalence_key,
                span = %edit.span,
                new_text = ?edit.new_text,
                "synthesized edit"
            );
        }
        Ok(edits)
    }
}

fn is_horizontal_space(text: &str) -> bool {
    text.chars().all(|c| c == ' ' || c == '\t')
}

fn insert_attribute(
    model: &SourceModel,
    declaration: &Node,
    attribute: &str,
) -> Result<Vec<Edit>, FixError> {
    let first_list = matcher::attribute_lists(declaration).next();
    let anchor = first_list.map_or(declaration.span().start, |list| list.span().start);
    let prefix = model
        .slice(Span::new(line_start(model.text(), anchor), anchor))
        .unwrap_or_default();

    // Own line when the anchor starts its line, inline otherwise
    let inserted = if is_horizontal_space(prefix) {
        format!("[{attribute}]{}{prefix}", model.newline())
    } else {
        format!("[{attribute}] ")
    };

    // The first list is rewritten, so any other edit to it overlaps this one
    match first_list {
        Some(list) => {
            let rewritten = format!("{inserted}{}", model.text_of(list));
            Ok(vec![Edit::replace(model, list.span(), rewritten)?])
        }
        None => Ok(vec![Edit::insert(model, anchor, inserted)?]),
    }
}

fn remove_attributes(
    model: &SourceModel,
    declaration: &Node,
    names: &[String],
) -> Result<Vec<Edit>, FixError> {
    let matches = |attr: &Node| {
        matcher::attribute_name(model, attr)
            .is_some_and(|name| names.iter().any(|n| matcher::attribute_name_matches(name, n)))
    };

    let mut edits = Vec::new();
    for list in matcher::attribute_lists(declaration) {
        let attrs: Vec<&Node> = matcher::attributes(list).collect();
        let kept: Vec<&Node> = attrs.iter().copied().filter(|a| !matches(a)).collect();
        if kept.len() == attrs.len() {
            continue;
        }

        if kept.is_empty() {
            edits.push(Edit::delete(model, list_removal_span(model, list))?);
            continue;
        }

        let mut rebuilt = String::from("[");
        let target_specifier = NodeKind::Other("attribute_target_specifier");
        if let Some(target) = list.first_child_of_kind(target_specifier) {
            rebuilt.push_str(model.text_of(target));
            rebuilt.push(' ');
        }
        let kept_text: Vec<&str> = kept.iter().map(|a| model.text_of(a)).collect();
        rebuilt.push_str(&kept_text.join(", "));
        rebuilt.push(']');
        edits.push(Edit::replace(model, list.span(), rebuilt)?);
    }
    Ok(edits)
}

/// Span removing an attribute list: its whole line when it stands alone on
/// the line, otherwise the list plus trailing horizontal whitespace.
fn list_removal_span(model: &SourceModel, list: &Node) -> Span {
    let text = model.text();
    let span = list.span();
    let begin = line_start(text, span.start);
    let before = &text[begin..span.start];
    let trailing = text[span.end..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    let after = span.end + trailing;
    let rest = &text[after..];

    if is_horizontal_space(before) {
        if rest.starts_with("\r\n") {
            return Span::new(begin, after + 2);
        }
        if rest.starts_with('\n') {
            return Span::new(begin, after + 1);
        }
    }
    Span::new(span.start, after)
}

fn use_generic_overload(
    model: &SourceModel,
    invocation: &Node,
    type_argument: &str,
) -> Result<Vec<Edit>, FixError> {
    let name = matcher::callee_name_node(invocation).ok_or(FixError::TargetNotFound {
        kind: NodeKind::Identifier,
        span: invocation.span(),
    })?;
    let arguments = matcher::arguments(invocation);
    let first = arguments.first().ok_or(FixError::TargetNotFound {
        kind: NodeKind::Argument,
        span: invocation.span(),
    })?;
    let removal = match arguments.get(1) {
        Some(second) => Span::new(first.span().start, second.span().start),
        None => first.span(),
    };

    Ok(vec![
        Edit::replace(
            model,
            name.span(),
            format!("{}<{}>", model.text_of(name), type_argument),
        )?,
        Edit::delete(model, removal)?,
    ])
}
