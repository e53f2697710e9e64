use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Credentials a connector accepts through `secrets/set`.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ConnectorConfigSchema {
    pub fields: Vec<Field>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum FieldType {
    Text,
    Secret,
}

impl ConnectorConfigSchema {
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let mut props = Map::new();
        let mut required: Vec<&str> = Vec::new();
        for f in &self.fields {
            let mut obj = Map::new();
            obj.insert("type".to_string(), json!("string"));
            if f.field_type == FieldType::Secret {
                obj.insert("format".to_string(), json!("password"));
            }
            obj.insert("title".to_string(), json!(f.label));
            if let Some(desc) = &f.description {
                obj.insert("description".to_string(), json!(desc));
            }
            props.insert(f.name.clone(), Value::Object(obj));
            if f.required {
                required.push(&f.name);
            }
        }

        let mut root = Map::new();
        root.insert("type".to_string(), json!("object"));
        root.insert("properties".to_string(), Value::Object(props));
        if !required.is_empty() {
            root.insert("required".to_string(), json!(required));
        }
        root
    }
}
