/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 构造参数的捕获：位置参数、关键字参数与声明的默认值合并为有序的命名参数集
 *
 * 每个节点类型声明一张有序的“参数名 → 默认值”表；
 * 位置参数按表的顺序依次匹配，关键字参数按名覆盖，其余参数取默认值。
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use super::NodeError;

/// 参数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// 仅非负整数可转为`usize`
    pub fn as_usize(&self) -> Option<usize> {
        self.as_int().and_then(|v| usize::try_from(v).ok())
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_value_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )+
    };
}

impl_value_from!(Bool: bool);
impl_value_from!(Int: i64, i32, u32, u8);
impl_value_from!(Float: f64, f32);
impl_value_from!(Str: String, &str);

/// 超出`i64`范围的值饱和为`i64::MAX`
impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

// ==================== 构造参数 ====================

/// 一次构造调用的实参：位置参数与关键字参数
///
/// # 使用示例
/// ```ignore
/// let args = Args::new().pos("conv1").pos(16).kw("p", "same");
/// // 等价于
/// let args = args!["conv1", 16, p = "same"];
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个位置参数（首个位置参数若为字符串，则被视为节点名）
    pub fn pos(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// 追加一个关键字参数（关键字`name`用于指定节点名）
    pub fn kw(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.keyword.push((key.to_string(), value.into()));
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &[(String, Value)] {
        &self.keyword
    }
}

/// 构造参数的便捷写法，位置参数与`键 = 值`可以混写
///
/// ```ignore
/// let args = args!["conv1", 16, k = 5, p = "same", act = None::<&str>];
/// ```
#[macro_export]
macro_rules! args {
    (@acc $acc:expr;) => { $acc };
    (@acc $acc:expr; $key:ident = $value:expr $(, $($rest:tt)*)?) => {
        $crate::args!(@acc $acc.kw(stringify!($key), $value); $($($rest)*)?)
    };
    (@acc $acc:expr; $value:expr $(, $($rest:tt)*)?) => {
        $crate::args!(@acc $acc.pos($value); $($($rest)*)?)
    };
    ($($tokens:tt)*) => {
        $crate::args!(@acc $crate::nn::Args::new(); $($tokens)*)
    };
}

// ==================== 捕获结果 ====================

/// 节点类型声明的有序参数表：参数名 → 默认值
pub type ParamTable = Vec<(&'static str, Value)>;

/// 捕获后的有序命名参数集
///
/// 键在捕获后不再变化；值可以在构建时被推导结果原地覆盖（如padding解析）。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeConfig {
    entries: Vec<(&'static str, Value)>,
}

impl NodeConfig {
    /// 按声明表捕获构造参数，返回节点名与参数集
    ///
    /// 节点名取自首个字符串位置参数或关键字`name`，否则回退为类型名。
    pub fn capture(
        type_name: &str,
        declared: ParamTable,
        args: Args,
    ) -> Result<(String, Self), NodeError> {
        let Args {
            mut positional,
            keyword,
        } = args;

        let positional_name = if matches!(positional.first(), Some(Value::Str(_))) {
            match positional.remove(0) {
                Value::Str(name) => Some(name),
                _ => None,
            }
        } else {
            None
        };

        let mut keyword_name = None;
        let mut keyword_params = Vec::with_capacity(keyword.len());
        for (key, value) in keyword {
            if key == "name" {
                let name = value
                    .as_str()
                    .ok_or_else(|| NodeError::config(format!("节点名须为字符串，实际为`{value}`")))?
                    .to_string();
                if keyword_name.replace(name).is_some() {
                    return Err(NodeError::config("关键字参数`name`被重复指定"));
                }
            } else {
                keyword_params.push((key, value));
            }
        }

        let name = match (positional_name, keyword_name) {
            (Some(_), Some(_)) => {
                return Err(NodeError::config(
                    "节点名同时以位置参数和关键字参数`name`指定",
                ));
            }
            (Some(name), None) | (None, Some(name)) => name,
            (None, None) => type_name.to_string(),
        };

        if positional.len() > declared.len() {
            return Err(NodeError::config(format!(
                "{type_name}至多接受{}个位置参数，实际传入{}个",
                declared.len(),
                positional.len()
            )));
        }

        let mut supplied: Vec<Option<Value>> = vec![None; declared.len()];
        for (slot, value) in supplied.iter_mut().zip(positional) {
            *slot = Some(value);
        }

        for (key, value) in keyword_params {
            let index = declared
                .iter()
                .position(|(param, _)| *param == key)
                .ok_or_else(|| NodeError::config(format!("{type_name}没有名为`{key}`的参数")))?;
            if supplied[index].is_some() {
                return Err(NodeError::config(format!(
                    "参数`{key}`被重复指定（位置参数与关键字参数冲突，或关键字重复）"
                )));
            }
            supplied[index] = Some(value);
        }

        let entries = declared
            .into_iter()
            .zip(supplied)
            .map(|((param, default), value)| (param, value.unwrap_or(default)))
            .collect();

        Ok((name, Self { entries }))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(param, _)| *param == key)
            .map(|(_, value)| value)
    }

    /// 覆盖已声明参数的值；参数集的键不会因此增减
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), NodeError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|(param, _)| *param == key)
            .ok_or_else(|| NodeError::config(format!("未声明的参数`{key}`")))?;
        slot.1 = value.into();
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.entries.iter().map(|(param, value)| (*param, value))
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(param, _)| *param).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 渲染为`key=value, key=value, ...`
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(param, value)| format!("{param}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 将该参数集还原为一组关键字参数（用于以相同配置新建节点）
    pub fn to_args(&self, name: &str) -> Args {
        self.entries
            .iter()
            .fold(Args::new().kw("name", name), |args, (param, value)| {
                args.kw(param, value.clone())
            })
    }
}

impl fmt::Display for NodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
