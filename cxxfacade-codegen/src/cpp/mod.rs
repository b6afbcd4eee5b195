//! C++ member serializers and unit emitters.

pub mod fields;
pub mod header;
pub mod methods;
pub mod source;
pub mod type_state;

use crate::writer::CppWriter;
use cxxfacade_model::TypeRef;
use std::fmt::Display;

/// Baseline include providing primitive type aliases.
pub const TYPEDEFS_INCLUDE: &str = "facade/typedefs.hpp";

/// Baseline include providing the dynamic-invocation runtime facade.
pub const RUNTIME_INCLUDE: &str = "facade/runtime.hpp";

/// Maps well-known value types to their C++ aliases from the baseline
/// typedefs include.
#[must_use]
pub(crate) fn primitive_cpp(ty: &TypeRef) -> Option<&'static str> {
    if ty.namespace != "System" || ty.declaring.is_some() || ty.is_generic() {
        return None;
    }
    Some(match ty.name.as_str() {
        "Void" => "void",
        "Boolean" => "bool",
        "Char" => "char16_t",
        "SByte" => "int8_t",
        "Byte" => "uint8_t",
        "Int16" => "int16_t",
        "UInt16" => "uint16_t",
        "Int32" => "int32_t",
        "UInt32" => "uint32_t",
        "Int64" => "int64_t",
        "UInt64" => "uint64_t",
        "Single" => "float",
        "Double" => "double",
        "IntPtr" => "intptr_t",
        "UIntPtr" => "uintptr_t",
        _ => return None,
    })
}

/// Splits a reference into the original namespace and nested-path name
/// used by the runtime's by-name lookups and the registration macros
/// (e.g. `("Game", "Outer/Inner")`).
#[must_use]
pub(crate) fn original_parts(ty: &TypeRef) -> (String, String) {
    let ns = ty.root_namespace().to_string();
    let mut name = String::new();
    for d in ty.declaring_chain() {
        name.push_str(&d.name);
        name.push('/');
    }
    name.push_str(&ty.name);
    (ns, name)
}

/// Renders a failure as an inline comment block at the exact point of
/// failure. This is the only user-visible formatting of internal errors.
pub(crate) fn write_error_block(w: &mut CppWriter, err: &dyn Display) {
    w.write_comment("Unresolved type reference!");
    w.write_line("/*");
    w.write_line(&err.to_string());
    w.write_line("*/");
}
