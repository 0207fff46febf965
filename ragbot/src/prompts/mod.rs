//! Chat prompt templates with `{name}` placeholders.
//!
//! `{{` and `}}` render literal braces.

use std::collections::HashMap;

use thiserror::Error;

use crate::message::Message;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("missing prompt variable: {0}")]
    MissingVariable(String),
    #[error("unclosed placeholder in template: {0}")]
    Unclosed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Ordered (role, template) pairs.
#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    parts: Vec<(Role, String)>,
}

/// Substitutes `{name}` placeholders in `template`.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
        } else {
            let end = tail
                .find('}')
                .ok_or_else(|| PromptError::Unclosed(tail.to_string()))?;
            let name = &tail[1..end];
            let value = vars
                .get(name)
                .ok_or_else(|| PromptError::MissingVariable(name.to_string()))?;
            out.push_str(value);
            rest = &tail[end + 1..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

impl ChatPromptTemplate {
    pub fn from_messages(parts: impl IntoIterator<Item = (Role, impl Into<String>)>) -> Self {
        Self {
            parts: parts.into_iter().map(|(r, t)| (r, t.into())).collect(),
        }
    }

    /// Renders every part into a message list.
    pub fn format_messages(
        &self,
        vars: &HashMap<&str, String>,
    ) -> Result<Vec<Message>, PromptError> {
        self.parts
            .iter()
            .map(|(role, template)| {
                let text = render(template, vars)?;
                Ok(match role {
                    Role::System => Message::System(text),
                    Role::User => Message::User(text),
                    Role::Assistant => Message::Assistant(text),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn renders_placeholders_and_escapes() {
        let out = render(
            "Q: {question} {{literal}} {question}",
            &vars(&[("question", "why?")]),
        )
        .unwrap();
        assert_eq!(out, "Q: why? {literal} why?");
    }

    #[test]
    fn missing_variable_is_an_error() {
        assert_eq!(
            render("{document}", &vars(&[])),
            Err(PromptError::MissingVariable("document".into()))
        );
        assert!(matches!(
            render("oops {open", &vars(&[])),
            Err(PromptError::Unclosed(_))
        ));
    }

    #[test]
    fn format_messages_keeps_roles_in_order() {
        let prompt = ChatPromptTemplate::from_messages([
            (Role::System, "You grade."),
            (Role::User, "Doc: {document}"),
        ]);
        let msgs = prompt
            .format_messages(&vars(&[("document", "d1")]))
            .unwrap();
        assert_eq!(
            msgs,
            vec![Message::system("You grade."), Message::user("Doc: d1")]
        );
    }
}
