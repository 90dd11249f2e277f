use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use anyhow::Result;

use crate::errors::MCPError;

/// JSON Schema 定义
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Schema {
    Object(SchemaObject),
    String(SchemaString),
}

impl Schema {
    pub fn validate(&self, value: &Value) -> Result<()> {
        match self {
            Schema::Object(obj) => obj.validate(value),
            Schema::String(s) => s.validate(value),
        }
    }

    /// 转换为标准 JSON Schema 对象（tools/list 的 inputSchema 字段）
    pub fn to_json(&self) -> Value {
        match self {
            Schema::Object(obj) => {
                let properties: serde_json::Map<String, Value> = obj.properties.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                let mut schema = json!({
                    "type": "object",
                    "properties": properties,
                    "required": obj.required,
                });
                if let Some(desc) = &obj.description {
                    schema["description"] = json!(desc);
                }
                schema
            }
            Schema::String(s) => {
                let mut schema = json!({ "type": "string" });
                if let Some(desc) = &s.description {
                    schema["description"] = json!(desc);
                }
                if let Some(values) = &s.enum_values {
                    schema["enum"] = json!(values);
                }
                schema
            }
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SchemaObject {
    pub required: Vec<String>,
    pub properties: HashMap<String, Schema>,
    pub description: Option<String>,
}

impl SchemaObject {
    pub fn validate(&self, value: &Value) -> Result<()> {
        if !value.is_object() {
            return Err(MCPError::InvalidParameter("Expected object".to_string()).into());
        }

        for req in &self.required {
            if value.get(req).is_none() {
                return Err(MCPError::InvalidParameter(format!("Required property {} missing", req)).into());
            }
        }

        for (name, schema) in &self.properties {
            if let Some(prop) = value.get(name) {
                schema.validate(prop)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SchemaString {
    pub description: Option<String>,
    pub enum_values: Option<Vec<String>>,
}

impl SchemaString {
    pub fn validate(&self, value: &Value) -> Result<()> {
        let str_val = match value.as_str() {
            Some(s) => s,
            None => return Err(MCPError::InvalidParameter("Expected string".to_string()).into()),
        };

        if let Some(enum_values) = &self.enum_values {
            if !enum_values.iter().any(|v| v == str_val) {
                return Err(MCPError::InvalidParameter(format!(
                    "Value must be one of: {:?}", enum_values
                )).into());
            }
        }

        Ok(())
    }
}

/// 工具注解信息（用于工具发现和分类）
#[derive(Debug, Clone)]
pub struct ToolAnnotations {
    pub category: String,
    pub tags: Vec<String>,
    pub version: String,
}

// Tool 的基础 trait 定义
#[async_trait]
pub trait MCPTool: Send + Sync {
    /// 获取工具名称
    fn name(&self) -> &str;

    /// 获取工具描述
    fn description(&self) -> &str;

    /// 获取工具注解
    fn annotations(&self) -> &ToolAnnotations;

    /// 获取工具参数Schema
    fn parameters_schema(&self) -> &Schema;

    /// 执行工具
    async fn execute(&self, params: Value) -> Result<Value>;

    /// 验证输入参数
    fn validate_params(&self, params: &Value) -> Result<()> {
        self.parameters_schema().validate(params)
    }
}
