//! Field and property emission.
//!
//! Instance fields emit direct storage with a traceability comment. Static
//! fields never emit storage: the output's object representation is
//! external, so they surface as a get/set accessor pair routed through the
//! runtime's read/write-field-by-name protocol. Properties surface as
//! traceability comments only.

use crate::config::{GenConfig, OutputStyle, UnresolvedPolicy};
use crate::cpp::type_state::{FieldState, TypeState};
use crate::cpp::{original_parts, write_error_block};
use crate::error::{Error, ResolveError};
use crate::writer::CppWriter;
use cxxfacade_model::TypeRef;

/// Applies the configured field policy to an unresolved field reference.
/// The member is dropped from the output unless the policy escalates.
fn handle_unresolved(
    w: &mut CppWriter,
    owner: &TypeRef,
    field: &FieldState,
    config: &GenConfig,
) -> Result<(), Error> {
    let err = ResolveError::UnresolvedType {
        referencer: owner.clone(),
        missing: field.ty.clone(),
    };
    match config.unresolved.fields {
        UnresolvedPolicy::Annotate => {
            write_error_block(w, &err);
            Ok(())
        }
        UnresolvedPolicy::Skip => Ok(()),
        UnresolvedPolicy::Escalate => Err(err.into()),
    }
}

/// Writes the header-view body content for fields and properties: property
/// comments, static accessor declarations first, then instance storage.
pub(crate) fn write_field_declarations(
    w: &mut CppWriter,
    state: &TypeState,
    owner: &TypeRef,
    config: &GenConfig,
) -> Result<(), Error> {
    for comment in &state.property_comments {
        w.write_comment(comment);
    }
    for field in state.fields.iter().filter(|f| f.is_static) {
        w.write_comment(&format!("{} // Offset: 0x{:X}", field.comment, field.offset));
        let Some(ty) = field.rendered_ty() else {
            handle_unresolved(w, owner, field, config)?;
            continue;
        };
        let get_ret = accessor_return(&ty, config.output_style);
        w.write_declaration(&format!("static {get_ret} _get_{}()", field.name));
        w.write_declaration(&format!("static void _set_{}({ty} value)", field.name));
    }
    for field in state.fields.iter().filter(|f| !f.is_static) {
        w.write_comment(&format!("{} // Offset: 0x{:X}", field.comment, field.offset));
        let Some(ty) = field.rendered_ty() else {
            handle_unresolved(w, owner, field, config)?;
            continue;
        };
        if field.downgraded {
            w.write_comment("stored as a pointer to break a definition cycle");
        }
        w.write_declaration(&format!("{ty} {}", field.name));
    }
    Ok(())
}

/// Writes the source-view accessor bodies for static fields, forwarding
/// through the runtime's by-name field protocol.
pub(crate) fn write_static_field_definitions(
    w: &mut CppWriter,
    state: &TypeState,
    owner: &TypeRef,
    config: &GenConfig,
) -> Result<(), Error> {
    let (ns, type_name) = original_parts(owner);
    for field in state.fields.iter().filter(|f| f.is_static) {
        let Some(ty) = field.rendered_ty() else {
            handle_unresolved(w, owner, field, config)?;
            continue;
        };
        w.write_comment(&format!(
            "Autogenerated static field accessor: {}.{}",
            owner.qualified_name(),
            field.name
        ));
        let get_ret = accessor_return(&ty, config.output_style);
        let qualified = &state.qualified_name;
        w.open_definition(&format!("{get_ret} {qualified}::_get_{}()", field.name));
        let get_call =
            format!("::facade::get_field_value<{ty}>(\"{ns}\", \"{type_name}\", \"{}\")", field.name);
        match config.output_style {
            OutputStyle::Normal => w.write_line(&format!("return {get_call};")),
            OutputStyle::CrashUnless => w.write_line(&format!("return CRASH_UNLESS({get_call});")),
        }
        w.close_definition();
        w.open_definition(&format!(
            "void {qualified}::_set_{}({ty} value)",
            field.name
        ));
        w.write_line(&format!(
            "::facade::set_field_value(\"{ns}\", \"{type_name}\", \"{}\", value);",
            field.name
        ));
        w.close_definition();
    }
    Ok(())
}

/// Return type of a generated getter under the configured style.
fn accessor_return(ty: &str, style: OutputStyle) -> String {
    match style {
        OutputStyle::Normal => format!("std::optional<{ty}>"),
        OutputStyle::CrashUnless => ty.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpp::type_state::FieldState;
    use cxxfacade_model::StorageKind;
    use std::collections::BTreeSet;

    fn state_with(fields: Vec<FieldState>) -> TypeState {
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
            fields,
            property_comments: Vec::new(),
            methods: Vec::new(),
            downgraded: BTreeSet::new(),
        }
    }

    fn field(name: &str, is_static: bool) -> FieldState {
        FieldState {
            name: name.into(),
            ty: TypeRef::new("System", "Int32"),
            canonical: None,
            cpp_ty: Some("int32_t".into()),
            storage: StorageKind::Value,
            offset: 0x20,
            is_static,
            comment: format!("public System.Int32 {name}"),
            downgraded: false,
        }
    }

    #[test]
    fn test_instance_field_declaration() {
        let state = state_with(vec![field("score", false)]);
        let owner = TypeRef::new("Game", "Player");
        let mut w = CppWriter::new();
        write_field_declarations(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        let text = w.into_string();
        assert!(text.contains("int32_t score;"));
        assert!(text.contains("// Offset: 0x20"));
    }

    #[test]
    fn test_static_field_becomes_accessor_pair() {
        let state = state_with(vec![field("counter", true)]);
        let owner = TypeRef::new("Game", "Player");
        let mut w = CppWriter::new();
        write_field_declarations(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        let text = w.into_string();
        assert!(text.contains("static std::optional<int32_t> _get_counter();"));
        assert!(text.contains("static void _set_counter(int32_t value);"));
        assert!(!text.contains("int32_t counter;"), "no storage for statics");
    }

    #[test]
    fn test_static_accessor_definitions_route_through_runtime() {
        let state = state_with(vec![field("counter", true)]);
        let owner = TypeRef::new("Game", "Player");
        let mut w = CppWriter::new();
        write_static_field_definitions(&mut w, &state, &owner, &GenConfig::default())
            .expect("emit");
        let text = w.into_string();
        assert!(text.contains(
            "::facade::get_field_value<int32_t>(\"Game\", \"Player\", \"counter\")"
        ));
        assert!(text.contains(
            "::facade::set_field_value(\"Game\", \"Player\", \"counter\", value);"
        ));
    }

    #[test]
    fn test_unresolved_field_annotated() {
        let mut broken = field("mystery", false);
        broken.cpp_ty = None;
        broken.ty = TypeRef::new("Missing", "M");
        let state = state_with(vec![broken]);
        let owner = TypeRef::new("Game", "Player");
        let mut w = CppWriter::new();
        write_field_declarations(&mut w, &state, &owner, &GenConfig::default()).expect("emit");
        let text = w.into_string();
        assert!(text.contains("Unresolved type reference!"));
        assert!(text.contains("Missing.M"));
    }

    #[test]
    fn test_unresolved_field_escalates() {
        let mut broken = field("mystery", false);
        broken.cpp_ty = None;
        let state = state_with(vec![broken]);
        let owner = TypeRef::new("Game", "Player");
        let config = GenConfig::new().with_unresolved_policy(UnresolvedPolicy::Escalate);
        let mut w = CppWriter::new();
        let err = write_field_declarations(&mut w, &state, &owner, &config)
            .expect_err("escalation must propagate");
        assert!(matches!(
            err,
            Error::Resolve(ResolveError::UnresolvedType { .. })
        ));
    }

    #[test]
    fn test_crash_unless_style_accessor() {
        let state = state_with(vec![field("counter", true)]);
        let owner = TypeRef::new("Game", "Player");
        let config = GenConfig::new().with_output_style(OutputStyle::CrashUnless);
        let mut w = CppWriter::new();
        write_static_field_definitions(&mut w, &state, &owner, &config).expect("emit");
        let text = w.into_string();
        assert!(text.contains("int32_t Game::Player::_get_counter()"));
        assert!(text.contains("return CRASH_UNLESS("));
    }
}
