use crate::{
    bytecode::types::Type,
    syntax::{diagnostic::CompileError, position::Span},
};

use super::{Compiler, suggestions::find_similar_names};

fn with_suggestions(message: String, target: &str, candidates: &[String]) -> String {
    let suggestions = find_similar_names(target, candidates, 3);
    match suggestions.as_slice() {
        [] => message,
        [one] => format!("{message}, did you mean '{one}'?"),
        many => {
            let names = many
                .iter()
                .map(|s| format!("'{s}'"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{message}, did you mean one of: {names}?")
        }
    }
}

impl Compiler<'_> {
    pub(super) fn unknown_identifier_error(&self, name: &str, span: Span) -> CompileError {
        let mut candidates = self.variable_names();
        candidates.extend(self.schema.resource_names());
        if let Some((_, Type::Resource(res))) = &self.scope().self_binding
            && let Some(info) = self.schema.resource(res)
        {
            candidates.extend(info.field_names());
        }
        CompileError::new(
            span.start,
            with_suggestions(format!("unknown identifier '{name}'"), name, &candidates),
        )
    }

    pub(super) fn unknown_field_error(&self, resource: &str, field: &str, span: Span) -> CompileError {
        let candidates = self
            .schema
            .resource(resource)
            .map(|info| info.field_names())
            .unwrap_or_default();
        CompileError::new(
            span.start,
            with_suggestions(
                format!("unknown field '{field}' on resource '{resource}'"),
                field,
                &candidates,
            ),
        )
    }

    pub(super) fn unknown_method_error(
        &self,
        ty: &Type,
        method: &str,
        candidates: &[&str],
        span: Span,
    ) -> CompileError {
        let candidates: Vec<String> = candidates.iter().map(|s| s.to_string()).collect();
        CompileError::new(
            span.start,
            with_suggestions(
                format!("cannot call '{method}' on {}", ty.label()),
                method,
                &candidates,
            ),
        )
    }

    pub(super) fn arity_error(
        &self,
        name: &str,
        expected: &str,
        got: usize,
        span: Span,
    ) -> CompileError {
        CompileError::new(
            span.start,
            format!("{name}() expects {expected}, got {got}"),
        )
    }

    pub(super) fn type_mismatch_error(
        &self,
        operator: &str,
        left: &Type,
        right: &Type,
        span: Span,
    ) -> CompileError {
        CompileError::new(
            span.start,
            format!(
                "type mismatch: cannot apply '{operator}' to {} and {}",
                left.label(),
                right.label()
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::with_suggestions;

    #[test]
    fn appends_single_and_multiple_suggestions() {
        let candidates = vec!["version".to_string(), "build".to_string()];
        assert_eq!(
            with_suggestions("unknown field 'verison'".into(), "verison", &candidates),
            "unknown field 'verison', did you mean 'version'?"
        );
        assert_eq!(
            with_suggestions("unknown field 'zzz'".into(), "zzz", &candidates),
            "unknown field 'zzz'"
        );
    }
}
