use serde::Serialize;

/// A positional `?` binding value.
#[derive(Clone, Debug, PartialEq)]
pub enum BindingValue {
    Null,
    Bool(bool),

    Byte(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),

    UByte(u8),
    SmallUInt(u16),
    UInt(u32),
    BigUInt(u64),

    Float(f32),
    Double(f64),

    Char(char),
    String(String),
}

/// [Binding types](https://docs.snowflake.com/en/developer-guide/sql-api/submitting-requests#using-bind-variables-in-a-statement)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BindingType {
    Boolean,
    Fixed,
    Real,
    Text,
}

impl std::fmt::Display for BindingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BindingType::Boolean => "BOOLEAN",
            BindingType::Fixed => "FIXED",
            BindingType::Real => "REAL",
            BindingType::Text => "TEXT",
        })
    }
}

impl BindingValue {
    pub const fn to_type(&self) -> BindingType {
        match self {
            BindingValue::Bool(_) => BindingType::Boolean,
            BindingValue::Byte(_)
            | BindingValue::SmallInt(_)
            | BindingValue::Int(_)
            | BindingValue::BigInt(_)
            | BindingValue::UByte(_)
            | BindingValue::SmallUInt(_)
            | BindingValue::UInt(_)
            | BindingValue::BigUInt(_) => BindingType::Fixed,
            BindingValue::Float(_) | BindingValue::Double(_) => BindingType::Real,
            BindingValue::Null | BindingValue::Char(_) | BindingValue::String(_) => {
                BindingType::Text
            }
        }
    }
    /// Wire representation, `None` binds SQL `NULL`.
    pub fn to_value(&self) -> Option<String> {
        match self {
            BindingValue::Null => None,
            BindingValue::Bool(value) => Some(value.to_string()),
            BindingValue::Byte(value) => Some(value.to_string()),
            BindingValue::SmallInt(value) => Some(value.to_string()),
            BindingValue::Int(value) => Some(value.to_string()),
            BindingValue::BigInt(value) => Some(value.to_string()),
            BindingValue::UByte(value) => Some(value.to_string()),
            BindingValue::SmallUInt(value) => Some(value.to_string()),
            BindingValue::UInt(value) => Some(value.to_string()),
            BindingValue::BigUInt(value) => Some(value.to_string()),
            BindingValue::Float(value) => Some(value.to_string()),
            BindingValue::Double(value) => Some(value.to_string()),
            BindingValue::Char(value) => Some(value.to_string()),
            BindingValue::String(value) => Some(value.clone()),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Binding {
    #[serde(rename = "type")]
    value_type: BindingType,
    value: Option<String>,
}

impl From<BindingValue> for Binding {
    fn from(value: BindingValue) -> Self {
        Binding {
            value_type: value.to_type(),
            value: value.to_value(),
        }
    }
}

impl From<&str> for BindingValue {
    fn from(value: &str) -> Self {
        BindingValue::String(value.to_owned())
    }
}

impl<T: Into<BindingValue>> From<Option<T>> for BindingValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(BindingValue::Null, Into::into)
    }
}

macro_rules! impl_from_binding_value {
    ($ty: ty, $ex: expr) => {
        impl From<$ty> for BindingValue {
            fn from(value: $ty) -> Self {
                $ex(value)
            }
        }
    };
}
impl_from_binding_value!(bool, BindingValue::Bool);
impl_from_binding_value!(i8, BindingValue::Byte);
impl_from_binding_value!(i16, BindingValue::SmallInt);
impl_from_binding_value!(i32, BindingValue::Int);
impl_from_binding_value!(i64, BindingValue::BigInt);
impl_from_binding_value!(u8, BindingValue::UByte);
impl_from_binding_value!(u16, BindingValue::SmallUInt);
impl_from_binding_value!(u32, BindingValue::UInt);
impl_from_binding_value!(u64, BindingValue::BigUInt);
impl_from_binding_value!(f32, BindingValue::Float);
impl_from_binding_value!(f64, BindingValue::Double);
impl_from_binding_value!(char, BindingValue::Char);
impl_from_binding_value!(String, BindingValue::String);
