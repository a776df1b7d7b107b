//! Human readable rendering of bundles, results and assessments.

use crate::{
    assessment::{Assessment, AssessmentItem, assess, assess_entry},
    bytecode::code_bundle::CodeBundle,
    runtime::{
        results::{Execution, RawResult},
        value::{BlockEntry, ItemDetail, RawData, Value},
    },
};

const INDENT: &str = "  ";

pub fn code_bundle(bundle: &CodeBundle) -> String {
    bundle.dump()
}

/// Renders an execution: the assessment when the query asserts anything,
/// otherwise the aggregated errors followed by one line per entrypoint.
pub fn results(bundle: &CodeBundle, execution: &Execution) -> String {
    let printer = Printer {
        bundle: Some(bundle),
    };
    if let Some(assessed) = assess(bundle, execution) {
        return printer.assessment(&assessed);
    }

    let mut out = String::new();
    if let Some(summary) = execution.error_summary() {
        out.push_str("error: ");
        out.push_str(&summary);
    }
    if let Some(err) = &execution.interrupted {
        out.push_str(&format!("error: {err}\n"));
    }
    let rendered: Vec<String> = execution
        .entrypoint_results(bundle)
        .map(|result| printer.labeled(&result.label, &result.data, 0))
        .collect();
    out.push_str(&rendered.join("\n"));
    out
}

pub fn result(result: &RawResult) -> String {
    Printer::default().labeled(&result.label, &result.data, 0)
}

pub fn assessment(assessment: &Assessment) -> String {
    Printer::default().assessment(assessment)
}

fn status(success: bool) -> &'static str {
    if success { "[ok]" } else { "[failed]" }
}

/// Rendering state. With a bundle at hand, failed `@msg` assertions inside
/// nested blocks print their message instead of their value.
#[derive(Default, Clone, Copy)]
struct Printer<'a> {
    bundle: Option<&'a CodeBundle>,
}

impl Printer<'_> {
    fn assessment(&self, assessment: &Assessment) -> String {
        if let [only] = assessment.results.as_slice() {
            return self.item(only, 0);
        }
        let mut out = format!("{} {}\n", status(assessment.success), assessment.label);
        for entry in &assessment.results {
            out.push_str(&self.item(entry, 1));
        }
        out
    }

    fn item(&self, item: &AssessmentItem, indent: usize) -> String {
        let pad = INDENT.repeat(indent);
        let detail = INDENT.repeat(indent + 1);

        if item.success {
            let value = item
                .actual
                .as_ref()
                .map(|data| self.data_text(data, indent))
                .unwrap_or_else(|| "true".to_string());
            return format!("{pad}[ok] value: {value}\n");
        }
        if let Some(message) = &item.message {
            return format!("{pad}[failed] {message}\n");
        }

        let mut out = format!("{pad}[failed] {}\n", item.label);
        if let Some(err) = &item.error {
            out.push_str(&format!("{detail}error: {err}\n"));
            return out;
        }
        if let Some(operator) = &item.operator {
            if let Some(expected) = &item.expected {
                out.push_str(&format!(
                    "{detail}expected: {operator} {}\n",
                    self.data_text(expected, indent + 1)
                ));
            }
            if let Some(actual) = &item.actual {
                out.push_str(&format!(
                    "{detail}actual:   {}\n",
                    self.data_text(actual, indent + 1)
                ));
            }
        } else if !item.offending.is_empty() {
            out.push_str(&format!("{detail}actual:   [\n"));
            let inner = INDENT.repeat(indent + 2);
            for (idx, offending) in item.offending.iter().enumerate() {
                out.push_str(&format!(
                    "{inner}{idx}: {}\n",
                    self.item_detail(offending, indent + 2)
                ));
            }
            out.push_str(&format!("{detail}]\n"));
        } else if item.expected.is_some()
            && let Some(actual) = &item.actual
        {
            // Quantifiers that reduce their collection directly.
            out.push_str(&format!(
                "{detail}actual:   {}\n",
                self.data_text(actual, indent + 1)
            ));
        }
        out
    }

    /// A kept item, showing only the fields its predicate read.
    fn item_detail(&self, detail: &ItemDetail, indent: usize) -> String {
        match &detail.item {
            Value::Resource(handle) if !detail.fields.is_empty() => {
                let mut out = format!("{} {{\n", handle.resource);
                let pad = INDENT.repeat(indent + 1);
                for field in &detail.fields {
                    out.push_str(&pad);
                    out.push_str(&self.labeled(&field.label, &field.data, indent + 1));
                    out.push('\n');
                }
                out.push_str(&INDENT.repeat(indent));
                out.push('}');
                out
            }
            other => self.value_text(other, indent),
        }
    }

    fn labeled(&self, label: &str, data: &RawData, indent: usize) -> String {
        let value = self.data_text(data, indent);
        if label.is_empty() {
            value
        } else {
            format!("{label}: {value}")
        }
    }

    /// One line of a nested block.
    fn block_entry(&self, entry: &BlockEntry, indent: usize) -> String {
        let failed_message = self
            .bundle
            .and_then(|bundle| assess_entry(bundle, entry))
            .and_then(|item| item.message);
        match failed_message {
            Some(message) => format!("[failed] {message}"),
            None => self.labeled(&entry.label, &entry.data, indent),
        }
    }

    fn data_text(&self, data: &RawData, indent: usize) -> String {
        match &data.value {
            Ok(value) => self.value_text(value, indent),
            Err(err) => format!("error: {err}"),
        }
    }

    fn value_text(&self, value: &Value, indent: usize) -> String {
        let pad = INDENT.repeat(indent + 1);
        let close = INDENT.repeat(indent);
        match value {
            Value::Array(items) if items.is_empty() => "[]".to_string(),
            Value::Array(items) => {
                let mut out = String::from("[\n");
                for (idx, item) in items.iter().enumerate() {
                    out.push_str(&format!("{pad}{idx}: {}\n", self.value_text(item, indent + 1)));
                }
                out.push_str(&close);
                out.push(']');
                out
            }
            Value::Map(entries) if entries.is_empty() => "{}".to_string(),
            Value::Map(entries) => {
                let mut out = String::from("{\n");
                for (key, item) in entries {
                    out.push_str(&format!("{pad}{key}: {}\n", self.value_text(item, indent + 1)));
                }
                out.push_str(&close);
                out.push('}');
                out
            }
            Value::Block(entries) if entries.is_empty() => "{}".to_string(),
            Value::Block(entries) => {
                let mut out = String::from("{\n");
                for entry in entries {
                    out.push_str(&pad);
                    out.push_str(&self.block_entry(entry, indent + 1));
                    out.push('\n');
                }
                out.push_str(&close);
                out.push('}');
                out
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::{
        bytecode::{chunk::ChunkRef, types::Type},
        runtime::{
            resource::{ResourceError, ResourceHandle},
            value::BlockEntry,
        },
    };

    fn entry(label: &str, chunk: u32, data: RawData) -> BlockEntry {
        BlockEntry {
            label: label.to_string(),
            reference: ChunkRef::new(2, chunk),
            data,
            datapoints: Vec::new(),
        }
    }

    fn raw(label: &str, data: RawData) -> RawResult {
        RawResult {
            code_ref: ChunkRef::new(1, 1),
            label: label.to_string(),
            data,
            items: Vec::new(),
        }
    }

    #[test]
    fn empty_collections_print_without_label() {
        let list = raw("", RawData::new(Type::array(Type::Any), Value::Array(vec![])));
        let map = raw("", RawData::new(Type::Dict, Value::Map(Default::default())));
        assert_eq!(result(&list), "[]");
        assert_eq!(result(&map), "{}");
    }

    #[test]
    fn nested_blocks_indent_by_two() {
        let split = RawData::new(
            Type::array(Type::String),
            Value::Array(vec![Value::String("1".into()), Value::String("2".into())]),
        );
        let projected = Value::Array(vec![Value::Block(vec![entry("split", 2, split)])]);
        let out = result(&raw("", RawData::new(Type::array(Type::Block), projected)));
        assert_snapshot!(out, @r#"
        [
          0: {
            split: [
              0: "1"
              1: "2"
            ]
          }
        ]
        "#);
    }

    #[test]
    fn errors_print_in_place_of_values() {
        let missing = ResourceError::NotFound {
            resource: "file".into(),
            id: "zzz".into(),
        };
        let block = Value::Block(vec![entry(
            "content",
            2,
            RawData::error(Type::String, missing),
        )]);
        let out = result(&raw("file", RawData::new(Type::Block, block)));
        assert_snapshot!(out, @r"
        file: {
          content: error: file not found: 'zzz' does not exist
        }
        ");
    }

    #[test]
    fn offending_items_show_touched_fields() {
        let offending = |name: &str, uid: i64| ItemDetail {
            item: Value::Resource(ResourceHandle::new("user", name)),
            fields: vec![entry("uid", 2, RawData::new(Type::Int, Value::Int(uid)))],
        };
        let assessed = Assessment {
            success: false,
            label: "users.all(uid < 1000)".into(),
            results: vec![AssessmentItem {
                entrypoint: ChunkRef::new(1, 4),
                label: "users.all()".into(),
                success: false,
                is_assertion: true,
                operator: None,
                expected: None,
                actual: None,
                offending: vec![offending("chris", 1000), offending("bin", 1002)],
                error: None,
                message: None,
            }],
        };
        assert_snapshot!(assessment(&assessed), @r"
        [failed] users.all()
          actual:   [
            0: user {
              uid: 1000
            }
            1: user {
              uid: 1002
            }
          ]
        ");
    }
}
