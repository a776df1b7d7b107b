use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::types::Type;

/// Address of a chunk: 1-based block and 1-based chunk within that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkRef {
    pub block: u32,
    pub chunk: u32,
}

impl ChunkRef {
    pub fn new(block: u32, chunk: u32) -> Self {
        Self { block, chunk }
    }
}

impl fmt::Display for ChunkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{},{}>", self.block, self.chunk)
    }
}

impl FromStr for ChunkRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(|| format!("invalid chunk reference `{s}`"))?;
        let (block, chunk) = inner
            .split_once(',')
            .ok_or_else(|| format!("invalid chunk reference `{s}`"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid chunk reference `{s}`"))
        };
        Ok(ChunkRef::new(parse(block)?, parse(chunk)?))
    }
}

// Serialized as `<b,c>` so chunk refs can key JSON maps.
impl Serialize for ChunkRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChunkRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Literal operand of a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Regex(String),
    Array {
        element: Type,
        items: Vec<Primitive>,
    },
    Map {
        value: Type,
        entries: BTreeMap<String, Primitive>,
    },
    /// Value of an earlier chunk.
    Ref(ChunkRef),
    /// A nested block, executed by the chunk that carries it.
    Block(u32),
    /// The self binding of a nested block, typed by what it binds to.
    Context(Type),
}

impl Primitive {
    pub fn ty(&self) -> Type {
        match self {
            Primitive::Nil => Type::Nil,
            Primitive::Bool(_) => Type::Bool,
            Primitive::Int(_) => Type::Int,
            Primitive::Float(_) => Type::Float,
            Primitive::String(_) => Type::String,
            Primitive::Regex(_) => Type::Regex,
            Primitive::Array { element, .. } => Type::array(element.clone()),
            Primitive::Map { value, .. } => Type::map(Type::String, value.clone()),
            Primitive::Ref(_) => Type::Ref,
            Primitive::Block(_) => Type::Block,
            Primitive::Context(ty) => ty.clone(),
        }
    }

    pub fn as_ref(&self) -> Option<ChunkRef> {
        match self {
            Primitive::Ref(r) => Some(*r),
            _ => None,
        }
    }

    /// Renders the primitive for the bytecode dump. Multi-line values are
    /// indented relative to `indent`.
    pub fn render(&self, indent: &str) -> String {
        match self {
            Primitive::Nil => "null".to_string(),
            Primitive::Bool(b) => b.to_string(),
            Primitive::Int(i) => i.to_string(),
            Primitive::Float(x) => x.to_string(),
            Primitive::String(s) => format!("{s:?}"),
            Primitive::Regex(r) => format!("/{r}/"),
            Primitive::Array { items, .. } => {
                if items.is_empty() {
                    return "[]".to_string();
                }
                let inner = format!("{indent}  ");
                let mut out = String::from("[\n");
                for (idx, item) in items.iter().enumerate() {
                    out.push_str(&format!("{inner}{idx}: {}\n", item.render(&inner)));
                }
                out.push_str(indent);
                out.push(']');
                out
            }
            Primitive::Map { entries, .. } => {
                if entries.is_empty() {
                    return "{}".to_string();
                }
                let inner = format!("{indent}  ");
                let mut out = String::from("{\n");
                for (key, value) in entries {
                    out.push_str(&format!("{inner}{key}: {}\n", value.render(&inner)));
                }
                out.push_str(indent);
                out.push('}');
                out
            }
            Primitive::Ref(r) => format!("ref{r}"),
            Primitive::Block(block) => format!("=> <{block},0>"),
            Primitive::Context(Type::Resource(name)) => format!("{name} id = context"),
            Primitive::Context(_) => "_".to_string(),
        }
    }
}

/// Call target and operands of a call chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Value the call is applied to; `None` for resource constructors and
    /// global calls such as `if`.
    pub binding: Option<ChunkRef>,
    pub args: Vec<Primitive>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChunkKind {
    Primitive(Primitive),
    Call {
        id: String,
        function: Option<Function>,
    },
}

/// One instruction of a block together with its static result type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub kind: ChunkKind,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl Chunk {
    pub fn primitive(value: Primitive) -> Self {
        let ty = value.ty();
        Self::typed_primitive(value, ty)
    }

    /// A primitive chunk whose static type is known by the caller, used for
    /// refs that carry the type of the chunk they point at.
    pub fn typed_primitive(value: Primitive, ty: Type) -> Self {
        Self {
            kind: ChunkKind::Primitive(value),
            ty,
        }
    }

    pub fn call(id: impl Into<String>, ty: Type, function: Option<Function>) -> Self {
        Self {
            kind: ChunkKind::Call {
                id: id.into(),
                function,
            },
            ty,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match &self.kind {
            ChunkKind::Call { id, .. } => Some(id),
            ChunkKind::Primitive(_) => None,
        }
    }

    pub fn function(&self) -> Option<&Function> {
        match &self.kind {
            ChunkKind::Call { function, .. } => function.as_ref(),
            ChunkKind::Primitive(_) => None,
        }
    }

    pub fn binding(&self) -> Option<ChunkRef> {
        self.function().and_then(|f| f.binding)
    }

    /// Every chunk this chunk reads: its binding and all referenced args,
    /// including refs nested inside array arguments.
    pub fn dependencies(&self) -> Vec<ChunkRef> {
        fn collect(p: &Primitive, out: &mut Vec<ChunkRef>) {
            match p {
                Primitive::Ref(r) => out.push(*r),
                Primitive::Array { items, .. } => items.iter().for_each(|i| collect(i, out)),
                Primitive::Map { entries, .. } => entries.values().for_each(|v| collect(v, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        match &self.kind {
            ChunkKind::Primitive(p) => collect(p, &mut out),
            ChunkKind::Call { function, .. } => {
                if let Some(function) = function {
                    out.extend(function.binding);
                    function.args.iter().for_each(|a| collect(a, &mut out));
                }
            }
        }
        out
    }

    /// Nested blocks opened by this chunk.
    pub fn blocks(&self) -> Vec<u32> {
        self.function()
            .map(|f| {
                f.args
                    .iter()
                    .filter_map(|a| match a {
                        Primitive::Block(b) => Some(*b),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn render(&self, indent: &str) -> String {
        match &self.kind {
            ChunkKind::Primitive(p) => p.render(indent),
            ChunkKind::Call { id, function } => {
                let mut out = format!("{id} ");
                if let Some(function) = function {
                    out.push_str(&format!(
                        "bind: {} type:{}",
                        function.binding.unwrap_or_default(),
                        self.ty.label()
                    ));
                    if !function.args.is_empty() {
                        let args: Vec<String> =
                            function.args.iter().map(|a| a.render(indent)).collect();
                        out.push_str(&format!(" ({})", args.join(", ")));
                    }
                }
                out
            }
        }
    }
}
