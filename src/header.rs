// Runtime header the generated tables compile against

/// Contents of `struct_reflect.h`
pub const STRUCT_REFLECT_H: &str = include_str!("../runtime/struct_reflect.h");

/// Contents of `cinspect.h`, which defines the `CINSPECT_STRUCT` marker
pub const CINSPECT_H: &str = include_str!("../runtime/cinspect.h");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::type_tag::TypeTag;

    #[test]
    fn test_header_declares_every_type_tag_in_order() {
        let positions: Vec<usize> = TypeTag::ALL
            .iter()
            .map(|tag| {
                STRUCT_REFLECT_H
                    .find(&format!("{},", tag.c_enumerator()))
                    .unwrap_or_else(|| panic!("{} missing", tag))
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_header_declares_lookup_helper() {
        assert!(STRUCT_REFLECT_H.contains("struct_reflect_find"));
        assert!(STRUCT_REFLECT_H.contains("typedef struct StructInfo"));
    }

    #[test]
    fn test_marker_header_uses_default_annotation() {
        let config = crate::config::Config::default();
        assert!(CINSPECT_H.contains(&format!("#define {}", config.marker_macro)));
        assert!(CINSPECT_H.contains(&format!("annotate(\"{}\")", config.marker_annotation)));
    }
}
