//! Remote execution framing.
//!
//! A submission is a list of argument requests plus an executable unit. The
//! unit is data, not code: either the name of an operation the service has
//! registered, or a portable elementwise expression over the positional
//! arguments. The service resolves every argument to its array, evaluates the
//! unit once, and returns only the result.

use std::ops;

use bytes::Bytes;
use dx_common::{DxError, DxResult, ExecArg, Extent, NDArray};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::array;

/// Version of the executable unit encoding.
pub const EXEC_FORMAT_VERSION: u32 = 1;

/// Multipart field carrying the argument requests.
pub const REQUESTS_FIELD: &str = "requests";
/// Multipart field carrying the encoded unit.
pub const FUNCTION_FIELD: &str = "fn";

// ============================================================================
// Argument requests
// ============================================================================

/// Wire form of one argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgRequest {
    pub name: String,
    pub version: u32,
    pub bounds: Vec<Extent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl From<&ExecArg> for ArgRequest {
    fn from(arg: &ExecArg) -> Self {
        Self {
            name: arg.object.name.clone(),
            version: arg.object.version,
            bounds: arg.region.bounds.clone(),
            namespace: arg.object.namespace.clone(),
        }
    }
}

/// `{"requests": [...]}`, in positional order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecRequests {
    pub requests: Vec<ArgRequest>,
}

impl ExecRequests {
    pub fn from_args(args: &[ExecArg]) -> Self {
        Self {
            requests: args.iter().map(ArgRequest::from).collect(),
        }
    }
}

// ============================================================================
// Executable units
// ============================================================================

/// Elementwise unary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Abs,
    Sqrt,
    Exp,
    Ln,
}

/// Elementwise binary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Min,
    Max,
}

impl BinaryOp {
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(b),
            BinaryOp::Min => a.min(b),
            BinaryOp::Max => a.max(b),
        }
    }
}

impl UnaryOp {
    pub fn apply(&self, a: f64) -> f64 {
        match self {
            UnaryOp::Neg => -a,
            UnaryOp::Abs => a.abs(),
            UnaryOp::Sqrt => a.sqrt(),
            UnaryOp::Exp => a.exp(),
            UnaryOp::Ln => a.ln(),
        }
    }
}

/// Portable elementwise expression over positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    /// The array bound to argument `index`.
    Arg { index: usize },
    /// A captured constant, broadcast against arrays.
    Const { value: f64 },
    Unary { func: UnaryOp, arg: Box<Expr> },
    Binary {
        func: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A function the service has registered under `name`.
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn arg(index: usize) -> Self {
        Expr::Arg { index }
    }

    pub fn constant(value: f64) -> Self {
        Expr::Const { value }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn unary(func: UnaryOp, arg: Expr) -> Self {
        Expr::Unary {
            func,
            arg: Box::new(arg),
        }
    }

    pub fn binary(func: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            func,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn pow(self, exponent: Expr) -> Self {
        Self::binary(BinaryOp::Pow, self, exponent)
    }

    pub fn min(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Min, self, other)
    }

    pub fn max(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Max, self, other)
    }

    pub fn abs(self) -> Self {
        Self::unary(UnaryOp::Abs, self)
    }

    pub fn sqrt(self) -> Self {
        Self::unary(UnaryOp::Sqrt, self)
    }

    pub fn exp(self) -> Self {
        Self::unary(UnaryOp::Exp, self)
    }

    pub fn ln(self) -> Self {
        Self::unary(UnaryOp::Ln, self)
    }

    /// Highest argument index referenced anywhere in the tree.
    pub fn max_arg(&self) -> Option<usize> {
        match self {
            Expr::Arg { index } => Some(*index),
            Expr::Const { .. } => None,
            Expr::Unary { arg, .. } => arg.max_arg(),
            Expr::Binary { lhs, rhs, .. } => lhs.max_arg().max(rhs.max_arg()),
            Expr::Call { args, .. } => args.iter().filter_map(Expr::max_arg).max(),
        }
    }

    fn check_calls(&self) -> DxResult<()> {
        match self {
            Expr::Arg { .. } | Expr::Const { .. } => Ok(()),
            Expr::Unary { arg, .. } => arg.check_calls(),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.check_calls()?;
                rhs.check_calls()
            }
            Expr::Call { name, args } => {
                if name.trim().is_empty() {
                    return Err(DxError::InvalidExecUnit(
                        "call without a function name".to_string(),
                    ));
                }
                args.iter().try_for_each(Expr::check_calls)
            }
        }
    }
}

macro_rules! impl_binary_ops {
    ($($trait:ident :: $method:ident => $op:ident),* $(,)?) => {
        $(
            impl ops::$trait for Expr {
                type Output = Expr;

                fn $method(self, rhs: Expr) -> Expr {
                    Expr::binary(BinaryOp::$op, self, rhs)
                }
            }

            impl ops::$trait<f64> for Expr {
                type Output = Expr;

                fn $method(self, rhs: f64) -> Expr {
                    Expr::binary(BinaryOp::$op, self, Expr::constant(rhs))
                }
            }
        )*
    };
}

impl_binary_ops!(
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
);

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

/// The unit of computation shipped to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecUnit {
    /// An operation registered on the service, invoked with all arguments.
    Named {
        op: String,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        params: Map<String, Value>,
    },
    /// An elementwise expression.
    Expr { expr: Expr },
}

impl ExecUnit {
    pub fn named(op: impl Into<String>) -> Self {
        ExecUnit::Named {
            op: op.into(),
            params: Map::new(),
        }
    }

    /// Attach a constant parameter to a named operation.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let ExecUnit::Named { params, .. } = &mut self {
            params.insert(key.into(), value.into());
        }
        self
    }

    pub fn expr(expr: Expr) -> Self {
        ExecUnit::Expr { expr }
    }

    /// Minimum number of arguments this unit binds, if knowable locally.
    pub fn min_args(&self) -> Option<usize> {
        match self {
            ExecUnit::Named { .. } => None,
            ExecUnit::Expr { expr } => Some(expr.max_arg().map_or(0, |i| i + 1)),
        }
    }

    /// Check the unit against the number of arguments it will receive.
    pub fn validate(&self, num_args: usize) -> DxResult<()> {
        match self {
            ExecUnit::Named { op, .. } => {
                if op.trim().is_empty() {
                    return Err(DxError::InvalidExecUnit(
                        "named operation is empty".to_string(),
                    ));
                }
            }
            ExecUnit::Expr { expr } => {
                expr.check_calls()?;
                if let Some(index) = expr.max_arg() {
                    if index >= num_args {
                        return Err(DxError::InvalidExecUnit(format!(
                            "expression uses argument {} but only {} supplied",
                            index, num_args
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl From<Expr> for ExecUnit {
    fn from(expr: Expr) -> Self {
        ExecUnit::expr(expr)
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format_version: u32,
    unit: ExecUnit,
}

/// Serialize a unit for the `fn` field.
pub fn encode_unit(unit: &ExecUnit) -> DxResult<Vec<u8>> {
    let envelope = Envelope {
        format_version: EXEC_FORMAT_VERSION,
        unit: unit.clone(),
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Parse a `fn` field, rejecting other format versions.
pub fn decode_unit(bytes: &[u8]) -> DxResult<ExecUnit> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    if envelope.format_version != EXEC_FORMAT_VERSION {
        return Err(DxError::InvalidExecUnit(format!(
            "unsupported format version {}",
            envelope.format_version
        )));
    }
    Ok(envelope.unit)
}

// ============================================================================
// Results
// ============================================================================

/// Result of a remote execution, returned as the service produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutput {
    /// A binary array result (array metadata headers were present).
    Array(NDArray),
    /// Any other serialized value, including nested lists of numbers.
    Value(Value),
}

impl ExecOutput {
    pub fn as_array(&self) -> Option<&NDArray> {
        match self {
            ExecOutput::Array(a) => Some(a),
            ExecOutput::Value(_) => None,
        }
    }

    pub fn into_array(self) -> Option<NDArray> {
        match self {
            ExecOutput::Array(a) => Some(a),
            ExecOutput::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ExecOutput::Value(v) => Some(v),
            ExecOutput::Array(_) => None,
        }
    }
}

/// Decode a successful exec response from its array headers (if any) and body.
pub fn decode_output(dims: Option<&str>, tag: Option<&str>, body: Bytes) -> DxResult<ExecOutput> {
    match (dims, tag) {
        (Some(dims), Some(tag)) => Ok(ExecOutput::Array(array::decode_with_headers(
            dims, tag, body,
        )?)),
        (None, None) if body.is_empty() => Ok(ExecOutput::Value(Value::Null)),
        (None, None) => Ok(ExecOutput::Value(serde_json::from_slice(&body)?)),
        _ => Err(DxError::malformed(
            "exec result carries only one of the array headers",
        )),
    }
}
