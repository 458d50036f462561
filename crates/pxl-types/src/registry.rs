//! Function, aggregate and table-function signature registry
//!
//! The analyzer only reads from the registry; it is built by the caller
//! before a compilation run and shared read-only for its duration.

use indexmap::IndexMap;
use thiserror::Error;

use crate::{DataType, Relation};

/// Registry lookup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No function of that name
    #[error("Could not find function '{name}'.")]
    UnknownFunction { name: String },

    /// Name exists but no overload accepts the argument types
    #[error("Could not find function '{name}' with arguments ({args}).")]
    NoMatchingOverload { name: String, args: String },

    /// No table function of that name
    #[error("Could not find table function '{name}'.")]
    UnknownTableFunction { name: String },
}

/// Whether a function maps rows or reduces them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Scalar,
    Aggregate,
}

/// A single overload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Argument types
    pub arg_types: Vec<DataType>,
    /// Return type
    pub return_type: DataType,
    /// Scalar or aggregate
    pub kind: FunctionKind,
    /// Aggregate can be split into partial and finalize stages
    pub supports_partial: bool,
}

impl FunctionSignature {
    /// Create a scalar signature
    pub fn scalar(name: impl Into<String>, arg_types: Vec<DataType>, return_type: DataType) -> Self {
        Self {
            name: name.into(),
            arg_types,
            return_type,
            kind: FunctionKind::Scalar,
            supports_partial: false,
        }
    }

    /// Create an aggregate signature
    pub fn aggregate(
        name: impl Into<String>,
        arg_types: Vec<DataType>,
        return_type: DataType,
        supports_partial: bool,
    ) -> Self {
        Self {
            name: name.into(),
            arg_types,
            return_type,
            kind: FunctionKind::Aggregate,
            supports_partial,
        }
    }

    /// Check if this signature matches given argument types exactly
    pub fn matches(&self, arg_types: &[DataType]) -> bool {
        self.arg_types.as_slice() == arg_types
    }

    pub fn arity(&self) -> usize {
        self.arg_types.len()
    }

    pub fn is_aggregate(&self) -> bool {
        self.kind == FunctionKind::Aggregate
    }
}

/// Registry of scalar functions, aggregates and table functions
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: IndexMap<String, Vec<FunctionSignature>>,
    table_functions: IndexMap<String, Relation>,
}

impl FunctionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an overload
    pub fn register(&mut self, signature: FunctionSignature) {
        self.functions
            .entry(signature.name.clone())
            .or_default()
            .push(signature);
    }

    /// Register a scalar overload
    pub fn register_scalar(&mut self, name: &str, arg_types: &[DataType], return_type: DataType) {
        self.register(FunctionSignature::scalar(name, arg_types.to_vec(), return_type));
    }

    /// Register an aggregate overload
    pub fn register_aggregate(
        &mut self,
        name: &str,
        arg_types: &[DataType],
        return_type: DataType,
        supports_partial: bool,
    ) {
        self.register(FunctionSignature::aggregate(
            name,
            arg_types.to_vec(),
            return_type,
            supports_partial,
        ));
    }

    /// Register a table function and the relation it produces
    pub fn register_table_function(&mut self, name: impl Into<String>, relation: Relation) {
        self.table_functions.insert(name.into(), relation);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Find the overload accepting `arg_types`
    pub fn lookup(&self, name: &str, arg_types: &[DataType]) -> Result<&FunctionSignature, RegistryError> {
        let overloads = self
            .functions
            .get(name)
            .ok_or_else(|| RegistryError::UnknownFunction {
                name: name.to_string(),
            })?;

        overloads
            .iter()
            .find(|sig| sig.matches(arg_types))
            .ok_or_else(|| RegistryError::NoMatchingOverload {
                name: name.to_string(),
                args: arg_types
                    .iter()
                    .map(DataType::name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// All overloads registered under a name
    pub fn overloads(&self, name: &str) -> &[FunctionSignature] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Relation produced by a table function
    pub fn table_function(&self, name: &str) -> Result<&Relation, RegistryError> {
        self.table_functions
            .get(name)
            .ok_or_else(|| RegistryError::UnknownTableFunction {
                name: name.to_string(),
            })
    }
}
