//! Query template analysis.
//!
//! A fixture template is a GraphQL executable document. Analysis checks that
//! it parses and lists the variables its operations declare, which are the
//! capture names the template consumes.

use async_graphql_parser::parse_query;

/// A template that could not be parsed as a GraphQL document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Syntax Error{} {message}", location(.line, .column))]
pub struct TemplateSyntaxError {
    /// Parser message.
    pub message: String,
    /// 1-based line of the failure, when the parser reports one.
    pub line: Option<usize>,
    /// 1-based column of the failure, when the parser reports one.
    pub column: Option<usize>,
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" ({line}:{column})"),
        _ => ":".to_string(),
    }
}

impl From<async_graphql_parser::Error> for TemplateSyntaxError {
    fn from(err: async_graphql_parser::Error) -> Self {
        let pos = err.positions().next();
        Self {
            message: err.to_string(),
            line: pos.map(|p| p.line),
            column: pos.map(|p| p.column),
        }
    }
}

/// Parses a template and returns the variable names it declares.
///
/// Names come out in source order: operations are ordered by where they
/// start, and each operation's variables by declaration. A name declared by
/// more than one operation is listed once.
pub fn analyze(template: &str) -> Result<Vec<String>, TemplateSyntaxError> {
    let document = parse_query(template)?;

    let mut operations: Vec<_> = document
        .operations
        .iter()
        .map(|(_, operation)| operation)
        .collect();
    operations.sort_by_key(|operation| (operation.pos.line, operation.pos.column));

    let mut variables: Vec<String> = Vec::new();
    for operation in operations {
        for definition in &operation.node.variable_definitions {
            let name = definition.node.name.node.as_str();
            if !variables.iter().any(|v| v == name) {
                variables.push(name.to_string());
            }
        }
    }

    Ok(variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_variables() {
        let template = r#"
            mutation {
                insert_abc(objects: [{ name: "abc1" }, { name: "abc2" }]) {
                    returning { id }
                }
            }
        "#;

        assert_eq!(analyze(template).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_variables_in_declaration_order() {
        let template = r#"
            mutation ($name2: String, $name1: String!) {
                insert_abc(objects: [{ name: $name1 }, { name: $name2 }]) {
                    returning { id }
                }
            }
        "#;

        assert_eq!(analyze(template).unwrap(), vec!["name2", "name1"]);
    }

    #[test]
    fn test_named_operations_follow_source_order() {
        let template = r"
            query Second($b: Int) { b(id: $b) { id } }
            query First($a: Int, $b: Int) { a(id: $a) { id } }
        ";

        assert_eq!(analyze(template).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_syntax_error_has_position() {
        let template =
            "mutation ($id3: Int) { delete_xyz(where: { id: _eq: $id3 }) { affected_rows } }";

        let err = analyze(template).unwrap_err();

        assert_eq!(err.line, Some(1));
        assert!(err.column.is_some());
        assert!(err.to_string().starts_with("Syntax Error (1:"));
    }

    #[test]
    fn test_empty_template_is_rejected() {
        assert!(analyze("").is_err());
        assert!(analyze("   \n\t").is_err());
    }

    #[test]
    fn test_error_display() {
        let positioned = TemplateSyntaxError {
            message: "expected Name".to_string(),
            line: Some(3),
            column: Some(14),
        };
        let bare = TemplateSyntaxError {
            message: "unexpected end of input".to_string(),
            line: None,
            column: None,
        };

        assert_eq!(positioned.to_string(), "Syntax Error (3:14) expected Name");
        assert_eq!(bare.to_string(), "Syntax Error: unexpected end of input");
        let _: &dyn std::error::Error = &bare;
    }
}
