//! Type Mapping for LLVM IR Generation
//!
//! MIR-LIR-CODEGEN-DEV-001: Subtask 3
//! Implements SPEC.md 12.1 Type Mapping

use inkwell::context::Context;
use inkwell::types::{ArrayType, BasicTypeEnum, FloatType, IntType, PointerType, StructType};

/// Type mapping from Fax types to LLVM IR types
pub struct TypeMapper<'ctx> {
    pub context: &'ctx Context,
}

impl<'ctx> TypeMapper<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        Self { context }
    }

    /// Map a Fax type to LLVM basic type
    pub fn map_to_basic(&self, _ty: &Type) -> BasicTypeEnum<'ctx> {
        // Simplified: return i64 for all types for now
        self.context.i64_type().into()
    }
}

/// Placeholder Type enum for compilation
#[derive(Debug, Clone)]
pub enum Type {
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Float32,
    Float64,
    Bool,
    Char,
    String,
    Unit,
    Array(Box<Type>, usize),
    Tuple(Vec<Type>),
    Struct,
    Pointer(Box<Type>),
}
