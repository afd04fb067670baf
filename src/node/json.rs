//! JSON interchange form of the node tree.
//!
//! Lets an external tokenizer hand its output to this crate (and the CLI)
//! without sharing Rust types:
//!
//! ```json
//! { "name": "Model", "properties": [100, "Cube\u0000\u0001Model", "Mesh"], "children": [] }
//! ```
//!
//! Untyped values map to `I64`/`F64`/`String`/`Bool` and numeric arrays to
//! `I64Array`/`F64Array`. Exact binary types can be kept with
//! `{"type": "<code>", "value": ...}` using the FBX type codes
//! (`C Y I L F D S R b i l f d`).

use std::path::Path;

use serde_json::{json, Map, Value};

use crate::util::{Error, Result};

use super::{Node, Property};

impl Node {
    /// Build a node tree from its JSON form.
    pub fn from_json(value: &Value) -> Result<Node> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::invalid("node must be a JSON object"))?;
        let name = obj.get("name").and_then(Value::as_str).unwrap_or_default();
        let mut node = Node::new(name);

        if let Some(props) = obj.get("properties") {
            let props = props
                .as_array()
                .ok_or_else(|| Error::invalid(format!("{}: properties must be an array", name)))?;
            for p in props {
                node.push_property(property_from_json(p)?);
            }
        }
        if let Some(children) = obj.get("children") {
            let children = children
                .as_array()
                .ok_or_else(|| Error::invalid(format!("{}: children must be an array", name)))?;
            for c in children {
                node.push_child(Node::from_json(c)?);
            }
        }
        Ok(node)
    }

    /// Typed JSON form; loads back to an identical tree.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".into(), Value::String(self.name().to_string()));
        if !self.properties().is_empty() {
            obj.insert(
                "properties".into(),
                Value::Array(self.properties().iter().map(property_to_json).collect()),
            );
        }
        if self.has_children() {
            obj.insert(
                "children".into(),
                Value::Array(self.children().iter().map(Node::to_json).collect()),
            );
        }
        Value::Object(obj)
    }
}

/// Load a node tree from a JSON file. The root may be a node or an array of top-level nodes.
pub fn load_json(path: impl AsRef<Path>) -> Result<Node> {
    let path = path.as_ref();
    let value: Value = parse_file(path)?;
    match value {
        Value::Array(items) => {
            let mut root = Node::new("");
            for item in &items {
                root.push_child(Node::from_json(item)?);
            }
            Ok(root)
        }
        other => Node::from_json(&other),
    }
}

#[cfg(feature = "mmap")]
fn parse_file(path: &Path) -> Result<Value> {
    let file = open(path)?;
    if file.metadata()?.len() == 0 {
        return Err(Error::invalid(format!("{} is empty", path.display())));
    }
    // Safety: the map is read-only and dropped before returning.
    let map = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
    Ok(serde_json::from_slice(&map)?)
}

#[cfg(not(feature = "mmap"))]
fn parse_file(path: &Path) -> Result<Value> {
    use std::io::Read;
    let mut bytes = Vec::new();
    open(path)?.read_to_end(&mut bytes)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })
}

fn property_from_json(value: &Value) -> Result<Property> {
    Ok(match value {
        Value::Bool(b) => Property::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Property::I64(i),
            None => Property::F64(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Property::String(s.clone()),
        Value::Array(items) => untyped_array(items)?,
        Value::Object(obj) => typed_property(obj)?,
        Value::Null => return Err(Error::property("null property value")),
    })
}

fn untyped_array(items: &[Value]) -> Result<Property> {
    if items.iter().all(Value::is_boolean) && !items.is_empty() {
        return Ok(Property::BoolArray(items.iter().filter_map(Value::as_bool).collect()));
    }
    if items.iter().all(|v| v.is_i64()) {
        return Ok(Property::I64Array(items.iter().filter_map(Value::as_i64).collect()));
    }
    items
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| Error::property(format!("non-numeric array element {}", v))))
        .collect::<Result<Vec<_>>>()
        .map(Property::F64Array)
}

fn typed_property(obj: &Map<String, Value>) -> Result<Property> {
    let code = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::property("typed property without \"type\""))?;
    let value = obj.get("value").unwrap_or(&Value::Null);
    let num = |v: &Value| v.as_f64().ok_or_else(|| Error::property(format!("expected number, got {}", v)));
    let list = |v: &Value| -> Result<Vec<f64>> {
        v.as_array()
            .ok_or_else(|| Error::property(format!("expected array, got {}", v)))?
            .iter()
            .map(num)
            .collect()
    };

    Ok(match code {
        "C" => match value.as_bool() {
            Some(b) => Property::Bool(b),
            None => Property::Bool(num(value)? != 0.0),
        },
        "Y" => Property::I16(num(value)? as i16),
        "I" => Property::I32(num(value)? as i32),
        "L" => Property::I64(value.as_i64().map_or_else(|| num(value).map(|f| f as i64), Ok)?),
        "F" => Property::F32(num(value)? as f32),
        "D" => Property::F64(num(value)?),
        "S" => Property::String(value.as_str().unwrap_or_default().to_string()),
        "R" => Property::Raw(list(value)?.into_iter().map(|b| b as u8).collect()),
        "b" => Property::BoolArray(list(value)?.into_iter().map(|b| b != 0.0).collect()),
        "i" => Property::I32Array(list(value)?.into_iter().map(|x| x as i32).collect()),
        "l" => Property::I64Array(
            value
                .as_array()
                .ok_or_else(|| Error::property("expected array for type l"))?
                .iter()
                .map(|v| v.as_i64().ok_or_else(|| Error::property(format!("expected integer, got {}", v))))
                .collect::<Result<Vec<_>>>()?,
        ),
        "f" => Property::F32Array(list(value)?.into_iter().map(|x| x as f32).collect()),
        "d" => Property::F64Array(list(value)?),
        other => return Err(Error::property(format!("unknown type code {:?}", other))),
    })
}

fn property_to_json(p: &Property) -> Value {
    let code = (p.type_code() as char).to_string();
    let value = match p {
        Property::Bool(b) => json!(b),
        Property::I16(v) => json!(v),
        Property::I32(v) => json!(v),
        Property::I64(v) => json!(v),
        Property::F32(v) => json!(v),
        Property::F64(v) => json!(v),
        Property::String(s) => json!(s),
        Property::Raw(v) => json!(v),
        Property::BoolArray(v) => json!(v.iter().map(|&b| b as u8).collect::<Vec<_>>()),
        Property::I32Array(v) => json!(v),
        Property::I64Array(v) => json!(v),
        Property::F32Array(v) => json!(v),
        Property::F64Array(v) => json!(v),
    };
    json!({ "type": code, "value": value })
}
