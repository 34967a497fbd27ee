//! 记录适配器
//!
//! 将原始记录与字段映射标准化为以字段名称为键的 `Record`。

use crate::error::{LabelError, Result};
use crate::models::{FieldMapping, Record};
use serde_json::{Map, Value};

/// 原始记录：字段标识 -> 值
pub type RawRecord = Map<String, Value>;

/// 记录来源
#[cfg_attr(test, mockall::automock)]
pub trait RecordSource {
    /// 返回原始记录与字段映射
    fn fields(&self) -> Result<(RawRecord, FieldMapping)>;
}

/// 映射形式的输入：`{"record": {...}, "field_mapping": {...}}`
#[derive(Debug, Clone)]
pub struct MappingRecordSource {
    value: Value,
}

impl MappingRecordSource {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl RecordSource for MappingRecordSource {
    fn fields(&self) -> Result<(RawRecord, FieldMapping)> {
        let object = self
            .value
            .as_object()
            .ok_or_else(|| LabelError::UnsupportedInput(type_name(&self.value).to_string()))?;

        let record = match object.get("record") {
            None | Some(Value::Null) => RawRecord::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(LabelError::UnsupportedInput(format!(
                    "record 应为对象，实际为 {}",
                    type_name(other)
                )));
            }
        };

        let field_mapping = match object.get("field_mapping") {
            None | Some(Value::Null) => FieldMapping::new(),
            Some(value) => parse_field_mapping(value)?,
        };

        Ok((record, field_mapping))
    }
}

/// 属性形式的输入：直接暴露 `record` 与 `field_mapping` 两个字段
#[derive(Debug, Clone, Default)]
pub struct AttributeRecordSource {
    pub record: RawRecord,
    pub field_mapping: FieldMapping,
}

impl AttributeRecordSource {
    pub fn new(record: RawRecord, field_mapping: FieldMapping) -> Self {
        Self {
            record,
            field_mapping,
        }
    }
}

impl RecordSource for AttributeRecordSource {
    fn fields(&self) -> Result<(RawRecord, FieldMapping)> {
        Ok((self.record.clone(), self.field_mapping.clone()))
    }
}

/// 适配器可接受的两种输入形式
#[derive(Debug, Clone)]
pub enum RecordInput {
    Mapping(MappingRecordSource),
    Attributes(AttributeRecordSource),
}

impl RecordSource for RecordInput {
    fn fields(&self) -> Result<(RawRecord, FieldMapping)> {
        match self {
            Self::Mapping(source) => source.fields(),
            Self::Attributes(source) => source.fields(),
        }
    }
}

impl TryFrom<Value> for RecordInput {
    type Error = LabelError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(_) => Ok(Self::Mapping(MappingRecordSource::new(value))),
            other => Err(LabelError::UnsupportedInput(type_name(&other).to_string())),
        }
    }
}

impl From<AttributeRecordSource> for RecordInput {
    fn from(source: AttributeRecordSource) -> Self {
        Self::Attributes(source)
    }
}

/// 标准化记录
pub fn normalize<S: RecordSource + ?Sized>(source: &S) -> Result<Record> {
    let (record, field_mapping) = source.fields()?;
    Ok(Record::from_raw(&record, &field_mapping))
}

impl Record {
    /// 按字段映射从原始记录中取值，缺失的字段标识取空字符串
    pub fn from_raw(raw: &RawRecord, mapping: &FieldMapping) -> Self {
        mapping
            .iter()
            .map(|(field_name, identifier)| {
                let value = raw.get(identifier).map(cell_text).unwrap_or_default();
                (field_name.clone(), value)
            })
            .collect()
    }
}

/// 解析字段映射，值必须为字符串
pub fn parse_field_mapping(value: &Value) -> Result<FieldMapping> {
    let object = value.as_object().ok_or_else(|| {
        LabelError::UnsupportedInput(format!("field_mapping 应为对象，实际为 {}", type_name(value)))
    })?;

    object
        .iter()
        .map(|(name, identifier)| match identifier {
            Value::String(s) => Ok((name.clone(), s.clone())),
            other => Err(LabelError::UnsupportedInput(format!(
                "字段 '{}' 的字段标识应为字符串，实际为 {}",
                name,
                type_name(other)
            ))),
        })
        .collect()
}

/// 标量转文本，去除首尾空白
fn cell_text(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };
    text.trim().to_string()
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
