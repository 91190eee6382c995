//! Function-call nodes: built-in operators and user-defined functions.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::evaluator::EvalError;
use crate::node::Node;

/// The closed set of operators the engine evaluates itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Abs,
    Sqrt,
    Log,
    Log10,
    Exp,
    DbToLinear,
    LinearToDb,
    Min,
    Max,
    Average,
    WeightedAverage,
    Fuzzy,
    Trapezoid,
    SRemap,
    Mask,
    MaskMissingToMissing,
    Smooth,
    StdDev,
    Median,
}

/// How many arguments an operator accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Arity {
    Exactly(usize),
    AtLeast(usize),
    /// `1 + 2k` arguments with `k >= 1`.
    FieldThenPairs,
    /// `2k` arguments with `k >= 1`.
    Pairs,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 19] = [
        UnaryOp::Abs,
        UnaryOp::Sqrt,
        UnaryOp::Log,
        UnaryOp::Log10,
        UnaryOp::Exp,
        UnaryOp::DbToLinear,
        UnaryOp::LinearToDb,
        UnaryOp::Min,
        UnaryOp::Max,
        UnaryOp::Average,
        UnaryOp::WeightedAverage,
        UnaryOp::Fuzzy,
        UnaryOp::Trapezoid,
        UnaryOp::SRemap,
        UnaryOp::Mask,
        UnaryOp::MaskMissingToMissing,
        UnaryOp::Smooth,
        UnaryOp::StdDev,
        UnaryOp::Median,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Log => "log",
            UnaryOp::Log10 => "log10",
            UnaryOp::Exp => "exp",
            UnaryOp::DbToLinear => "db2linear",
            UnaryOp::LinearToDb => "linear2db",
            UnaryOp::Min => "min",
            UnaryOp::Max => "max",
            UnaryOp::Average => "average",
            UnaryOp::WeightedAverage => "weighted_average",
            UnaryOp::Fuzzy => "fuzzy",
            UnaryOp::Trapezoid => "trapezoid",
            UnaryOp::SRemap => "s_remap",
            UnaryOp::Mask => "mask",
            UnaryOp::MaskMissingToMissing => "mask_missing_to_missing",
            UnaryOp::Smooth => "smooth",
            UnaryOp::StdDev => "stddev",
            UnaryOp::Median => "median",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<UnaryOp> {
        UnaryOp::ALL.into_iter().find(|op| op.keyword() == keyword)
    }

    /// Call signature shown in help output.
    pub fn signature(self) -> &'static str {
        match self {
            UnaryOp::Abs => "abs(x)",
            UnaryOp::Sqrt => "sqrt(x)",
            UnaryOp::Log => "log(x)",
            UnaryOp::Log10 => "log10(x)",
            UnaryOp::Exp => "exp(x)",
            UnaryOp::DbToLinear => "db2linear(x)",
            UnaryOp::LinearToDb => "linear2db(x)",
            UnaryOp::Min => "min(x1, x2, ...)",
            UnaryOp::Max => "max(x1, x2, ...)",
            UnaryOp::Average => "average(x1, x2, ...)",
            UnaryOp::WeightedAverage => "weighted_average(x1, w1, x2, w2, ...)",
            UnaryOp::Fuzzy => "fuzzy(x, x0, y0, x1, y1, ...)",
            UnaryOp::Trapezoid => "trapezoid(x, a, b, c, d)",
            UnaryOp::SRemap => "s_remap(x, a, b)",
            UnaryOp::Mask => "mask(x, lo0, hi0, lo1, hi1, ...)",
            UnaryOp::MaskMissingToMissing => "mask_missing_to_missing(x, m)",
            UnaryOp::Smooth => "smooth(F, n)",
            UnaryOp::StdDev => "stddev(F, n)",
            UnaryOp::Median => "median(F, n)",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            UnaryOp::Abs => "Absolute value.",
            UnaryOp::Sqrt => "Square root; missing for negative input.",
            UnaryOp::Log => "Natural logarithm; missing for input <= 0.",
            UnaryOp::Log10 => "Base 10 logarithm; missing for input <= 0.",
            UnaryOp::Exp => "Exponential.",
            UnaryOp::DbToLinear => "Convert decibels to linear units, 10^(x/10).",
            UnaryOp::LinearToDb => "Convert linear units to decibels, 10*log10(x).",
            UnaryOp::Min => "Smallest of the arguments.",
            UnaryOp::Max => "Largest of the arguments.",
            UnaryOp::Average => "Arithmetic mean of the arguments.",
            UnaryOp::WeightedAverage => {
                "Weighted mean of value/weight pairs; missing when the weights sum to zero."
            }
            UnaryOp::Fuzzy => {
                "Piecewise linear remap through the (x, y) points, clamped to the end values."
            }
            UnaryOp::Trapezoid => {
                "Trapezoidal membership: 0 outside [a, d], 1 on [b, c], linear in between."
            }
            UnaryOp::SRemap => "S-shaped membership rising from 0 at a to 1 at b.",
            UnaryOp::Mask => "Missing where x lies inside any [lo, hi] range, x elsewhere.",
            UnaryOp::MaskMissingToMissing => "Missing where m is missing, x elsewhere.",
            UnaryOp::Smooth => {
                "Mean of field F over a centered window of n points, skipping missing points."
            }
            UnaryOp::StdDev => "Standard deviation of field F over a centered window of n points.",
            UnaryOp::Median => "Median of field F over a centered window of n points.",
        }
    }

    fn arity(self) -> Arity {
        match self {
            UnaryOp::Abs
            | UnaryOp::Sqrt
            | UnaryOp::Log
            | UnaryOp::Log10
            | UnaryOp::Exp
            | UnaryOp::DbToLinear
            | UnaryOp::LinearToDb => Arity::Exactly(1),
            UnaryOp::Min | UnaryOp::Max => Arity::AtLeast(2),
            UnaryOp::Average => Arity::AtLeast(1),
            UnaryOp::WeightedAverage => Arity::Pairs,
            UnaryOp::Fuzzy | UnaryOp::Mask => Arity::FieldThenPairs,
            UnaryOp::Trapezoid => Arity::Exactly(5),
            UnaryOp::SRemap => Arity::Exactly(3),
            UnaryOp::MaskMissingToMissing => Arity::Exactly(2),
            UnaryOp::Smooth | UnaryOp::StdDev | UnaryOp::Median => Arity::Exactly(2),
        }
    }

    /// Operators that read a whole field around each point.
    pub fn is_window(self) -> bool {
        matches!(self, UnaryOp::Smooth | UnaryOp::StdDev | UnaryOp::Median)
    }

    /// Check the argument list shape.
    pub fn check_args(self, args: &[Node]) -> Result<(), EvalError> {
        let n = args.len();
        let ok = match self.arity() {
            Arity::Exactly(k) => n == k,
            Arity::AtLeast(k) => n >= k,
            Arity::FieldThenPairs => n >= 3 && n % 2 == 1,
            Arity::Pairs => n >= 2 && n % 2 == 0,
        };
        if !ok {
            return Err(EvalError::bad_arguments(
                self.keyword(),
                format!("expected {}, got {} argument(s)", self.signature(), n),
            ));
        }
        if self.is_window() {
            if args[0].leaf_name().is_none() {
                return Err(EvalError::bad_arguments(
                    self.keyword(),
                    "first argument must name a field",
                ));
            }
            let width = args[1].constant_value()?;
            if !(width >= 1.0) {
                return Err(EvalError::bad_arguments(
                    self.keyword(),
                    format!("window length must be at least 1, got {}", width),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Which operator a [`UnaryNode`] calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnaryKind {
    Builtin(UnaryOp),
    /// A function the host application provides, identified by keyword.
    User(String),
}

/// A call `op(arg0, arg1, ...)`.
///
/// Decoding goes through the same argument check as [`UnaryNode::builtin`],
/// so a shipped tree cannot carry a call the evaluator cannot run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UnaryNodeRepr")]
pub struct UnaryNode {
    kind: UnaryKind,
    args: Vec<Node>,
}

/// Wire shape of [`UnaryNode`] before validation.
#[derive(Deserialize)]
struct UnaryNodeRepr {
    kind: UnaryKind,
    args: Vec<Node>,
}

impl TryFrom<UnaryNodeRepr> for UnaryNode {
    type Error = EvalError;

    fn try_from(repr: UnaryNodeRepr) -> Result<Self, Self::Error> {
        match repr.kind {
            UnaryKind::Builtin(op) => Self::builtin(op, repr.args),
            UnaryKind::User(keyword) => Ok(Self::user(keyword, repr.args)),
        }
    }
}

impl UnaryNode {
    /// A call to a built-in operator; the argument list is validated.
    pub fn builtin(op: UnaryOp, args: Vec<Node>) -> Result<Self, EvalError> {
        op.check_args(&args)?;
        Ok(Self {
            kind: UnaryKind::Builtin(op),
            args,
        })
    }

    /// A call to a host-provided function. The engine does not know its
    /// semantics; the scope resolves the keyword when the call runs.
    pub fn user(keyword: impl Into<String>, args: Vec<Node>) -> Self {
        Self {
            kind: UnaryKind::User(keyword.into()),
            args,
        }
    }

    /// A call by keyword: built-in if the keyword names one, user
    /// function otherwise.
    pub fn call(keyword: &str, args: Vec<Node>) -> Result<Self, EvalError> {
        match UnaryOp::from_keyword(keyword) {
            Some(op) => Self::builtin(op, args),
            None => Ok(Self::user(keyword, args)),
        }
    }

    pub fn kind(&self) -> &UnaryKind {
        &self.kind
    }

    pub fn builtin_op(&self) -> Option<UnaryOp> {
        match &self.kind {
            UnaryKind::Builtin(op) => Some(*op),
            UnaryKind::User(_) => None,
        }
    }

    pub fn is_user_function(&self) -> bool {
        matches!(self.kind, UnaryKind::User(_))
    }

    pub fn user_keyword(&self) -> Option<&str> {
        match &self.kind {
            UnaryKind::User(keyword) => Some(keyword),
            UnaryKind::Builtin(_) => None,
        }
    }

    /// The keyword this call was written with.
    pub fn keyword(&self) -> &str {
        match &self.kind {
            UnaryKind::Builtin(op) => op.keyword(),
            UnaryKind::User(keyword) => keyword,
        }
    }

    pub fn args(&self) -> &[Node] {
        &self.args
    }

    /// Field names read by the arguments, in first-mention order.
    pub fn inputs(&self) -> Vec<String> {
        let mut names = Vec::new();
        for arg in &self.args {
            arg.collect_inputs(&mut names);
        }
        names
    }

    /// Each argument printed as text, the form user functions usually want.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args.iter().map(|arg| arg.to_string()).collect()
    }
}

impl fmt::Display for UnaryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.keyword())?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}
