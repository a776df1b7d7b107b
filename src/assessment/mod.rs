//! Pass/fail interpretation of the results of block 1 and of `@msg`
//! assertions in nested blocks. Works only on what the executor already
//! computed.

use serde::Serialize;

use crate::{
    bytecode::{
        chunk::{ChunkRef, Primitive},
        code_bundle::{Assertion, AssertionKind, CodeBundle},
        template::{MessageTemplate, TemplatePart},
        types::Type,
    },
    runtime::{
        resource::ResourceError,
        results::Execution,
        value::{BlockEntry, ItemDetail, RawData, Value},
    },
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub success: bool,
    /// The query source, used as the label of compound assessments.
    pub label: String,
    pub results: Vec<AssessmentItem>,
}

/// The judgement of one entrypoint of block 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentItem {
    pub entrypoint: ChunkRef,
    pub label: String,
    pub success: bool,
    pub is_assertion: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<RawData>,
    /// The compared value, the offending items of a quantifier, or the
    /// entrypoint's own value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<RawData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub offending: Vec<ItemDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResourceError>,
    /// Rendered `@msg` of a failed assertion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Assesses every entrypoint of block 1. Queries without any assertion
/// have nothing to assess and yield `None`.
pub fn assess(bundle: &CodeBundle, execution: &Execution) -> Option<Assessment> {
    let entrypoints = &bundle.block(1)?.entrypoints;
    if !entrypoints.iter().any(|r| bundle.assertions.contains_key(r)) {
        return None;
    }

    let results: Vec<AssessmentItem> = entrypoints
        .iter()
        .map(|r| judge(bundle, execution, *r))
        .collect();
    Some(Assessment {
        success: results.iter().all(|item| item.success),
        label: bundle.source.trim().to_string(),
        results,
    })
}

/// Where the evaluator reads computed values from: the results of a whole
/// execution, or one entry of a nested block together with its datapoints.
trait Computed {
    fn data(&self, r: ChunkRef) -> Option<RawData>;
    fn items(&self, r: ChunkRef) -> Vec<ItemDetail>;
}

impl Computed for Execution {
    fn data(&self, r: ChunkRef) -> Option<RawData> {
        self.result(r).map(|result| result.data.clone())
    }

    fn items(&self, r: ChunkRef) -> Vec<ItemDetail> {
        self.result(r)
            .map(|result| result.items.clone())
            .unwrap_or_default()
    }
}

impl Computed for BlockEntry {
    fn data(&self, r: ChunkRef) -> Option<RawData> {
        if r == self.reference {
            return Some(self.data.clone());
        }
        self.datapoints
            .iter()
            .find(|entry| entry.reference == r)
            .map(|entry| entry.data.clone())
    }

    fn items(&self, _r: ChunkRef) -> Vec<ItemDetail> {
        Vec::new()
    }
}

/// Judges an assertion inside an `if` or projection body. Entries that
/// are not assertions yield `None`.
pub fn assess_entry(bundle: &CodeBundle, entry: &BlockEntry) -> Option<AssessmentItem> {
    bundle.assertions.contains_key(&entry.reference).then(|| judge(bundle, entry, entry.reference))
}

fn judge(bundle: &CodeBundle, computed: &impl Computed, r: ChunkRef) -> AssessmentItem {
    let data = datapoint(bundle, computed, r);
    let mut item = AssessmentItem {
        entrypoint: r,
        label: bundle.label(r).to_string(),
        success: data.is_truthy(),
        is_assertion: false,
        operator: None,
        expected: None,
        actual: None,
        offending: Vec::new(),
        error: data.error_ref().cloned(),
        message: None,
    };

    let Some(assertion) = bundle.assertions.get(&r) else {
        item.success = item.error.is_none();
        item.actual = Some(data);
        return item;
    };
    item.is_assertion = true;

    match &assertion.kind {
        AssertionKind::Comparison {
            operator,
            actual,
            expected,
        } => {
            item.operator = Some(operator.clone());
            item.actual = Some(datapoint(bundle, computed, *actual));
            item.expected = Some(match expected {
                Primitive::Ref(expected) => datapoint(bundle, computed, *expected),
                literal => RawData::new(literal.ty(), literal_value(literal)),
            });
        }
        AssertionKind::Quantifier {
            offending, source, ..
        } => {
            item.actual = Some(datapoint(bundle, computed, *offending));
            item.expected = Some(datapoint(bundle, computed, *source));
            if offending != source {
                item.offending = computed.items(*offending);
            }
        }
        AssertionKind::Value => item.actual = Some(data),
    }

    if !item.success {
        item.message = message(assertion, &item);
    }
    item
}

fn datapoint(bundle: &CodeBundle, computed: &impl Computed, r: ChunkRef) -> RawData {
    computed.data(r).unwrap_or_else(|| not_computed(bundle, r))
}

/// Stand-in for a result the executor never reached, after cancellation.
fn not_computed(bundle: &CodeBundle, r: ChunkRef) -> RawData {
    let ty = bundle.chunk(r).map(|c| c.ty.clone()).unwrap_or(Type::Any);
    RawData::error(
        ty,
        ResourceError::Evaluation(format!("{r} was not computed")),
    )
}

fn literal_value(primitive: &Primitive) -> Value {
    match primitive {
        Primitive::Bool(b) => Value::Bool(*b),
        Primitive::Int(i) => Value::Int(*i),
        Primitive::Float(x) => Value::Float(*x),
        Primitive::String(s) => Value::String(s.clone()),
        Primitive::Regex(r) => Value::Regex(r.clone()),
        Primitive::Array { items, .. } => Value::Array(items.iter().map(literal_value).collect()),
        Primitive::Map { entries, .. } => Value::Map(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), literal_value(value)))
                .collect(),
        ),
        Primitive::Nil | Primitive::Ref(_) | Primitive::Block(_) | Primitive::Context(_) => {
            Value::Nil
        }
    }
}

fn message(assertion: &Assertion, item: &AssessmentItem) -> Option<String> {
    let template = assertion.message.as_ref()?;
    Some(render_message(
        template,
        item.actual.as_ref(),
        item.expected.as_ref(),
    ))
}

/// Substitutes `${...}` references: plain ones read the actual value,
/// `$expected` ones the expected value.
pub fn render_message(
    template: &MessageTemplate,
    actual: Option<&RawData>,
    expected: Option<&RawData>,
) -> String {
    let mut out = String::new();
    for part in &template.parts {
        match part {
            TemplatePart::Text(text) => out.push_str(text),
            TemplatePart::Value { expected: wants_expected, path } => {
                let root = if *wants_expected { expected } else { actual };
                out.push_str(&reference_text(root, path));
            }
        }
    }
    out
}

fn reference_text(root: Option<&RawData>, path: &[String]) -> String {
    let value = match root.map(|data| &data.value) {
        Some(Ok(value)) => value,
        Some(Err(err)) => return err.to_string(),
        None => return Value::Nil.to_text(),
    };
    match path.first().map(String::as_str) {
        None => value.to_text(),
        Some("length") => match value {
            Value::Array(items) => items.len().to_string(),
            Value::Map(entries) => entries.len().to_string(),
            Value::String(s) => s.chars().count().to_string(),
            Value::Nil => "0".to_string(),
            other => other.to_text(),
        },
        Some(_) => Value::Nil.to_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(len: i64) -> RawData {
        RawData::new(
            Type::array(Type::Int),
            Value::Array((0..len).map(Value::Int).collect()),
        )
    }

    #[test]
    fn renders_actual_and_expected_lengths() {
        let template =
            MessageTemplate::parse("Expected ${$expected.length} users but got ${length}").unwrap();
        assert_eq!(
            render_message(&template, Some(&array(1)), Some(&array(5))),
            "Expected 5 users but got 1"
        );
    }

    #[test]
    fn renders_plain_values_and_errors() {
        let template = MessageTemplate::parse("build is ${}").unwrap();
        let actual = RawData::new(Type::String, Value::String("development".into()));
        assert_eq!(
            render_message(&template, Some(&actual), None),
            "build is development"
        );

        let failed = RawData::error(Type::String, ResourceError::Provider("offline".into()));
        assert_eq!(render_message(&template, Some(&failed), None), "build is offline");
    }

    #[test]
    fn literals_become_values() {
        let list = Primitive::Array {
            element: Type::Int,
            items: vec![Primitive::Int(1), Primitive::Int(2)],
        };
        assert_eq!(
            literal_value(&list),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
    }
}
