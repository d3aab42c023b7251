//! Module defining the parameter descriptors of fixture functions and how host-supplied arguments bind to them.
//!
//! A fixture function declares its parameters as an ordered [`Signature`]. Its first parameter usually receives the
//! loaded data; the compiled fixture advertises the remaining parameters to the host, which supplies them as
//! [`CallArgs`]. Binding follows the usual rules: positionals in order, then keywords by name, then defaults, with
//! variadic parameters collecting the surplus.

use std::{collections::HashSet, fmt};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Error;


/// Parameter names marking the leading parameter as the implicit data slot.
pub const DATA_SLOT_NAMES: [&str; 2] = ["data", "self"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Bound by position or by keyword
    Positional,
    /// Bound by keyword only
    KeywordOnly,
    /// Collects surplus positional arguments
    VarPositional,
    /// Collects surplus keyword arguments
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    default: Option<Value>,
}

impl Parameter {
    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Positional)
    }

    pub fn keyword_only(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::KeywordOnly)
    }

    pub fn var_positional(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::VarPositional)
    }

    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::VarKeyword)
    }

    fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Sets the default value. Ignored for variadic parameters when binding.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_variadic(&self) -> bool {
        matches!(
            self.kind,
            ParameterKind::VarPositional | ParameterKind::VarKeyword
        )
    }

    pub fn is_required(&self) -> bool {
        !self.is_variadic() && !self.has_default()
    }

    pub fn is_data_slot(&self) -> bool {
        DATA_SLOT_NAMES.contains(&self.name.as_str())
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParameterKind::VarPositional => write!(f, "*{}", self.name),
            ParameterKind::VarKeyword => write!(f, "**{}", self.name),
            ParameterKind::Positional | ParameterKind::KeywordOnly => match &self.default {
                Some(default) => write!(f, "{}={default}", self.name),
                None => write!(f, "{}", self.name),
            },
        }
    }
}

/// The ordered parameter list of a fixture function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    /// Builds a signature, checking that the parameters come in a callable order: positionals, the variadic
    /// positional, keyword-only parameters, the variadic keyword; names are unique and required positionals don't
    /// follow positionals with defaults.
    pub fn new(parameters: impl IntoIterator<Item = Parameter>) -> Result<Self, Error> {
        let parameters: Vec<Parameter> = parameters.into_iter().collect();
        validate(&parameters)?;
        Ok(Self { parameters })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(Parameter::name).collect()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// True if the first parameter is named as the implicit data slot.
    pub fn has_data_slot(&self) -> bool {
        self.parameters.first().is_some_and(Parameter::is_data_slot)
    }

    /// The signature the host gets to see: without the leading data slot if there is one, unchanged otherwise.
    pub fn without_data_slot(&self) -> Signature {
        let skip = usize::from(self.has_data_slot());
        Signature {
            parameters: self.parameters[skip..].to_vec(),
        }
    }

    /// Binds host-supplied arguments to the parameters, filling in defaults.
    pub fn bind(&self, args: CallArgs) -> Result<BoundArguments, Error> {
        let CallArgs {
            positional,
            mut keyword,
        } = args;
        let given = positional.len();
        let mut positional = positional.into_iter();
        let mut arguments = IndexMap::with_capacity(self.parameters.len());
        let mut missing = Vec::new();

        for param in &self.parameters {
            let name = param.name.clone();
            match param.kind {
                ParameterKind::Positional => {
                    if let Some(value) = positional.next() {
                        if keyword.contains_key(&name) {
                            return Err(Error::InvalidArgument(format!(
                                "multiple values for argument '{name}'"
                            )));
                        }
                        arguments.insert(name, value);
                    } else if let Some(value) = take_keyword_or_default(param, &mut keyword) {
                        arguments.insert(name, value);
                    } else {
                        missing.push(name);
                    }
                }
                ParameterKind::KeywordOnly => {
                    if let Some(value) = take_keyword_or_default(param, &mut keyword) {
                        arguments.insert(name, value);
                    } else {
                        missing.push(name);
                    }
                }
                ParameterKind::VarPositional => {
                    arguments.insert(name, Value::Array(positional.by_ref().collect()));
                }
                ParameterKind::VarKeyword => {
                    let collected: Map<String, Value> = keyword.drain(..).collect();
                    arguments.insert(name, Value::Object(collected));
                }
            }
        }

        if !missing.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "missing required argument(s): {}",
                quoted_list(&missing)
            )));
        }
        let surplus = positional.len();
        if surplus > 0 {
            return Err(Error::InvalidArgument(format!(
                "takes {} positional argument(s) but {given} were given",
                given - surplus
            )));
        }
        if !keyword.is_empty() {
            let unexpected: Vec<String> = keyword.into_keys().collect();
            return Err(Error::InvalidArgument(format!(
                "unexpected keyword argument(s): {}",
                quoted_list(&unexpected)
            )));
        }

        Ok(BoundArguments { arguments })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let mut keyword_marker_written = false;
        for (idx, param) in self.parameters.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            if param.kind == ParameterKind::KeywordOnly && !keyword_marker_written {
                let after_var_positional = self.parameters[..idx]
                    .iter()
                    .any(|p| p.kind == ParameterKind::VarPositional);
                if !after_var_positional {
                    write!(f, "*, ")?;
                }
                keyword_marker_written = true;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")
    }
}

fn take_keyword_or_default(param: &Parameter, keyword: &mut IndexMap<String, Value>) -> Option<Value> {
    keyword
        .shift_remove(&param.name)
        .or_else(|| param.default.clone())
}

fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn validate(parameters: &[Parameter]) -> Result<(), Error> {
    let mut seen = HashSet::new();
    let mut previous_rank: Option<u8> = None;
    let mut positional_default_seen = false;

    for param in parameters {
        if !seen.insert(param.name.as_str()) {
            return Err(Error::InvalidArgument(format!(
                "duplicate parameter '{}'",
                param.name
            )));
        }

        let rank = kind_rank(param.kind);
        if let Some(previous) = previous_rank {
            let repeated_variadic = param.is_variadic() && previous == rank;
            if rank < previous || repeated_variadic || previous == kind_rank(ParameterKind::VarKeyword) {
                return Err(Error::InvalidArgument(format!(
                    "parameter '{}' is out of order",
                    param.name
                )));
            }
        }
        previous_rank = Some(rank);

        if param.kind == ParameterKind::Positional {
            if param.has_default() {
                positional_default_seen = true;
            } else if positional_default_seen {
                return Err(Error::InvalidArgument(format!(
                    "required parameter '{}' follows a parameter with a default",
                    param.name
                )));
            }
        }
    }
    Ok(())
}

fn kind_rank(kind: ParameterKind) -> u8 {
    match kind {
        ParameterKind::Positional => 0,
        ParameterKind::VarPositional => 1,
        ParameterKind::KeywordOnly => 2,
        ParameterKind::VarKeyword => 3,
    }
}

/// Host-supplied arguments of a fixture invocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: IndexMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &IndexMap<String, Value> {
        &self.keyword
    }
}

/// Arguments bound to parameter names. Variadic parameters hold an array (positional) or an object (keyword).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundArguments {
    arguments: IndexMap<String, Value>,
}

impl BoundArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    /// Deserializes the argument bound to `name`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        let value = self
            .get(name)
            .ok_or_else(|| Error::InvalidArgument(format!("no argument named '{name}'")))?;
        serde_json::from_value(value.clone()).map_err(|e| {
            Error::TypeMismatch(format!("argument '{name}' has an unexpected type: {e}"))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.arguments.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}
