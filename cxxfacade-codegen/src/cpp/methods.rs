//! Method emission.
//!
//! Declarations go to the header; definitions go to the source unit, or
//! inline into the header when the declaring type is a generic template.
//! Every definition body forwards the call to the runtime's
//! invoke-method-by-name protocol: the generated unit is a typed facade
//! over a dynamic call, not a reimplementation of the method body.

use crate::config::{GenConfig, OutputStyle, UnresolvedPolicy};
use crate::cpp::type_state::{MethodState, TypeState};
use crate::cpp::{original_parts, write_error_block};
use crate::error::{Error, ResolveError};
use crate::writer::CppWriter;
use cxxfacade_model::TypeRef;

/// Applies the configured method policy to an unresolved method
/// reference. A method with any unresolved type is only reported, never
/// partially emitted.
fn handle_unresolved(
    w: &mut CppWriter,
    owner: &TypeRef,
    missing: &TypeRef,
    config: &GenConfig,
) -> Result<(), Error> {
    let err = ResolveError::UnresolvedType {
        referencer: owner.clone(),
        missing: missing.clone(),
    };
    match config.unresolved.methods {
        UnresolvedPolicy::Annotate => {
            write_error_block(w, &err);
            Ok(())
        }
        UnresolvedPolicy::Skip => Ok(()),
        UnresolvedPolicy::Escalate => Err(err.into()),
    }
}

/// Builds the heading of a method declaration or definition.
///
/// Unqualified headings carry `static`/`virtual` and the pure-virtual
/// terminator; qualified headings prefix the declaring type for
/// out-of-line definitions.
fn method_heading(
    state: &TypeState,
    m: &MethodState,
    config: &GenConfig,
    qualified: bool,
) -> String {
    let mut pre = String::new();
    if !qualified {
        if m.is_static {
            pre.push_str("static ");
        }
        if state.pure_virtual {
            pre.push_str("virtual ");
        }
    }
    let ret = rendered_return(m, config.output_style);
    let scope = if qualified {
        format!("{}::", state.qualified_name)
    } else {
        String::new()
    };
    let params: Vec<String> = m
        .params
        .iter()
        .map(|p| format!("{} {}", p.cpp_ty.as_deref().unwrap_or(""), p.name))
        .collect();
    let terminator = if !qualified && state.pure_virtual {
        " = 0"
    } else {
        ""
    };
    format!(
        "{pre}{ret} {scope}{}({}){terminator}",
        m.cpp_name,
        params.join(", ")
    )
}

/// The rendered return type under the configured style.
fn rendered_return(m: &MethodState, style: OutputStyle) -> String {
    let raw = m.ret.as_deref().unwrap_or("void");
    if m.ret_ty.is_void() {
        return raw.to_string();
    }
    match style {
        OutputStyle::Normal => format!("std::optional<{raw}>"),
        OutputStyle::CrashUnless => raw.to_string(),
    }
}

/// Writes the body of a forwarded method definition.
fn write_forward_body(w: &mut CppWriter, m: &MethodState, owner: &TypeRef, style: OutputStyle) {
    let is_void = m.ret_ty.is_void();
    let innard = if is_void {
        String::new()
    } else {
        format!("<{}>", m.ret.as_deref().unwrap_or("void"))
    };
    let mut args = String::new();
    for p in &m.params {
        args.push_str(", ");
        args.push_str(&p.name);
    }
    let call = if m.is_static {
        let (ns, type_name) = original_parts(owner);
        format!(
            "::facade::run_method{innard}(\"{ns}\", \"{type_name}\", \"{}\"{args})",
            m.name
        )
    } else {
        format!("::facade::run_method{innard}(this, \"{}\"{args})", m.name)
    };
    let stmt = match (is_void, style) {
        (true, OutputStyle::Normal) => format!("{call};"),
        (true, OutputStyle::CrashUnless) => format!("CRASH_UNLESS({call});"),
        (false, OutputStyle::Normal) => format!("return {call};"),
        (false, OutputStyle::CrashUnless) => format!("return CRASH_UNLESS({call});"),
    };
    w.write_line(&stmt);
}

/// Writes one full method definition (comment, heading, forwarded body).
fn write_method_definition(
    w: &mut CppWriter,
    state: &TypeState,
    m: &MethodState,
    owner: &TypeRef,
    config: &GenConfig,
    qualified: bool,
) {
    if qualified {
        w.write_comment(&format!(
            "Autogenerated method: {}.{}",
            owner.qualified_name(),
            m.name
        ));
    }
    let heading = method_heading(state, m, config, qualified);
    w.open_definition(&heading);
    write_forward_body(w, m, owner, config.output_style);
    w.close_definition();
}

/// Writes the header-view method block: traceability comments plus either
/// pure declarations or, for header-only template units, inline
/// definitions.
pub(crate) fn write_method_declarations(
    w: &mut CppWriter,
    state: &TypeState,
    owner: &TypeRef,
    config: &GenConfig,
) -> Result<(), Error> {
    for m in &state.methods {
        if m.skipped {
            continue;
        }
        if let Some(missing) = m.unresolved_ref() {
            handle_unresolved(w, owner, missing, config)?;
            continue;
        }
        if m.suppressed {
            continue;
        }
        w.write_comment(&format!("{} // Offset: 0x{:X}", m.comment, m.offset));
        if let Some(from) = &m.implemented_from {
            w.write_comment(&format!("Implemented from: {}", from.qualified_name()));
        }
        let heading = method_heading(state, m, config, false);
        if m.aborted {
            w.write_comment("ABORTED: conflicts with another method.");
            w.write_line(&format!("// {heading};"));
            continue;
        }
        if state.need_def_in_header {
            write_method_definition(w, state, m, owner, config, false);
        } else {
            w.write_declaration(&heading);
        }
    }
    Ok(())
}

/// Writes the source-view method block: out-of-line definitions with
/// qualified names.
pub(crate) fn write_method_definitions(
    w: &mut CppWriter,
    state: &TypeState,
    owner: &TypeRef,
    config: &GenConfig,
) -> Result<(), Error> {
    if state.need_def_in_header {
        // Header-only unit: every definition already lives in the header.
        return Ok(());
    }
    for m in &state.methods {
        if m.skipped {
            continue;
        }
        if let Some(missing) = m.unresolved_ref() {
            handle_unresolved(w, owner, missing, config)?;
            continue;
        }
        if m.suppressed || m.aborted {
            continue;
        }
        write_method_definition(w, state, m, owner, config, true);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpp::type_state::ParamState;
    use std::collections::BTreeSet;

    fn base_state() -> TypeState {
        TypeState {
            type_name: "Player".into(),
            qualified_name: "Game::Player".into(),
            cpp_namespace: "Game".into(),
            specifiers: String::new(),
            parent_name: None,
            parent_unresolved: None,
            interfaces: Vec::new(),
            is_interface: false,
            pure_virtual: false,
            template_line: None,
            need_def_in_header: false,
            fields: Vec::new(),
            property_comments: Vec::new(),
            methods: Vec::new(),
            downgraded: BTreeSet::new(),
        }
    }

    fn method(name: &str, ret: Option<&str>, ret_ty: TypeRef) -> MethodState {
        MethodState {
            name: name.into(),
            cpp_name: name.into(),
            ret: ret.map(String::from),
            ret_ty,
            params: Vec::new(),
            is_static: false,
            offset: 0x1A0,
            comment: format!("public {name}()"),
            implemented_from: None,
            skipped: false,
            suppressed: false,
            aborted: false,
        }
    }

    #[test]
    fn test_declaration_wraps_return_in_optional() {
        let mut state = base_state();
        state
            .methods
            .push(method("GetScore", Some("int32_t"), TypeRef::new("System", "Int32")));
        let owner = TypeRef::new("Game", "Player");
        let mut w = CppWriter::new();
        write_method_declarations(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        let text = w.into_string();
        assert!(text.contains("std::optional<int32_t> GetScore();"));
        assert!(text.contains("// Offset: 0x1A0"));
    }

    #[test]
    fn test_void_return_not_wrapped() {
        let mut state = base_state();
        state.methods.push(method("Reset", Some("void"), TypeRef::void()));
        let owner = TypeRef::new("Game", "Player");
        let mut w = CppWriter::new();
        write_method_declarations(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        assert!(w.as_str().contains("void Reset();"));
    }

    #[test]
    fn test_definition_forwards_through_runtime() {
        let mut state = base_state();
        let mut m = method("GetScore", Some("int32_t"), TypeRef::new("System", "Int32"));
        m.params.push(ParamState {
            name: "bonus".into(),
            ty: TypeRef::new("System", "Int32"),
            cpp_ty: Some("int32_t".into()),
        });
        state.methods.push(m);
        let owner = TypeRef::new("Game", "Player");
        let mut w = CppWriter::new();
        write_method_definitions(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        let text = w.into_string();
        assert!(text.contains(
            "std::optional<int32_t> Game::Player::GetScore(int32_t bonus) {"
        ));
        assert!(text.contains(
            "return ::facade::run_method<int32_t>(this, \"GetScore\", bonus);"
        ));
    }

    #[test]
    fn test_static_definition_uses_type_names() {
        let mut state = base_state();
        let mut m = method("Create", Some("void"), TypeRef::void());
        m.is_static = true;
        state.methods.push(m);
        let owner = TypeRef::new("Game", "Player");
        let mut w = CppWriter::new();
        write_method_definitions(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        assert!(w.as_str().contains(
            "::facade::run_method(\"Game\", \"Player\", \"Create\");"
        ));
    }

    #[test]
    fn test_aborted_method_surfaces_only_as_comment() {
        let mut state = base_state();
        let mut m = method("Frob", Some("void"), TypeRef::void());
        m.aborted = true;
        state.methods.push(m);
        let owner = TypeRef::new("Game", "Player");
        let mut w = CppWriter::new();
        write_method_declarations(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        let text = w.into_string();
        assert!(text.contains("// ABORTED: conflicts with another method."));
        assert!(text.contains("// void Frob();"));
        assert!(!text.contains("\nvoid Frob();"), "must not compile as code");

        let mut w = CppWriter::new();
        write_method_definitions(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        assert!(!w.as_str().contains("Game::Player::Frob"));
    }

    #[test]
    fn test_pure_virtual_declaration() {
        let mut state = base_state();
        state.pure_virtual = true;
        state.methods.push(method("Tick", Some("void"), TypeRef::void()));
        let owner = TypeRef::new("Game", "IUpdatable");
        let mut w = CppWriter::new();
        write_method_declarations(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        assert!(w.as_str().contains("virtual void Tick() = 0;"));
    }

    #[test]
    fn test_crash_unless_style() {
        let mut state = base_state();
        state
            .methods
            .push(method("GetScore", Some("int32_t"), TypeRef::new("System", "Int32")));
        let owner = TypeRef::new("Game", "Player");
        let config = GenConfig::new().with_output_style(OutputStyle::CrashUnless);
        let mut w = CppWriter::new();
        write_method_definitions(&mut w, &state, &owner, &config).expect("emit");
        let text = w.into_string();
        assert!(text.contains("int32_t Game::Player::GetScore() {"));
        assert!(text.contains(
            "return CRASH_UNLESS(::facade::run_method<int32_t>(this, \"GetScore\"));"
        ));
    }

    #[test]
    fn test_template_unit_defines_inline() {
        let mut state = base_state();
        state.need_def_in_header = true;
        state
            .methods
            .push(method("First", Some("T"), TypeRef::new("", "T")));
        let owner = TypeRef::generic_template("Game", "Box", &["T"]);
        let mut w = CppWriter::new();
        write_method_declarations(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        let text = w.into_string();
        assert!(text.contains("std::optional<T> First() {"));
        assert!(text.contains("return ::facade::run_method<T>(this, \"First\");"));
    }
}
